//! Types d'erreurs pour le crate geojson-rows

use thiserror::Error;

/// Erreurs fatales pouvant survenir pendant une conversion
///
/// Les problèmes propres à une ligne ou à une propriété ne sont jamais des
/// erreurs : ils sont consignés dans le [`ConversionReport`](crate::ConversionReport).
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Erreur d'I/O lors de la lecture de la source ou de l'écriture du fichier
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fichier CSV illisible
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Colonne de coordonnées absente de l'en-tête
    #[error("Missing column '{column}' in {source_name}")]
    MissingColumn { column: String, source_name: String },

    /// Sérialisation JSON impossible
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConvertError {
    /// Crée une erreur de colonne manquante avec contexte
    pub fn missing_column(column: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
            source_name: source_name.into(),
        }
    }
}

/// Valeur qui ne peut pas être encodée en JSON (NaN, ±Infinity)
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("value {0} is not representable in JSON")]
pub struct NotRepresentable(pub f64);
