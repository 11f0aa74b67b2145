//! Rapport de conversion avec graceful degradation
//!
//! Les lignes ignorées et les propriétés corrigées sont consignées ici,
//! jamais remontées comme erreurs : une conversion va toujours au bout.

use std::path::Path;

use serde::Serialize;

/// Statut global de la conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConversionStatus {
    /// Toutes les lignes ont été converties sans correction
    Success,
    /// Des lignes ont été ignorées ou des valeurs corrigées
    PartialSuccess,
}

/// Raison pour laquelle une ligne n'a pas produit de feature
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Latitude ou longitude vide ou absente
    MissingCoordinates,
    /// Coordonnée non numérique
    UnparsableCoordinate { column: String, raw: String },
    /// Coordonnée NaN ou infinie
    NonFiniteCoordinates { latitude: f64, longitude: f64 },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingCoordinates => write!(f, "missing coordinates"),
            SkipReason::UnparsableCoordinate { column, raw } => {
                write!(f, "could not convert {} {:?} to float", column, raw)
            }
            SkipReason::NonFiniteCoordinates {
                latitude,
                longitude,
            } => write!(f, "invalid coordinates: lat={}, lng={}", latitude, longitude),
        }
    }
}

/// Ligne ignorée
#[derive(Debug, Clone, Serialize)]
pub struct SkippedRow {
    /// Numéro de ligne (1 = première ligne de données)
    pub row: usize,
    pub reason: SkipReason,
    /// Contenu brut de la ligne
    pub contents: String,
}

/// Nature d'un problème sur une propriété
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// NaN ou infini remplacé par null
    NonFinite,
    /// Texte d'allure numérique non convertible, conservé tel quel
    Unparsable,
    /// Valeur non sérialisable remplacée par null au moment de l'écriture
    Repaired,
}

/// Problème rencontré sur une propriété
#[derive(Debug, Clone, Serialize)]
pub struct PropertyIssue {
    pub row: usize,
    pub key: String,
    pub raw: String,
    pub kind: IssueKind,
}

/// Rapport complet de conversion
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    /// Statut global
    pub status: ConversionStatus,
    /// Nombre de lignes lues
    pub rows_read: usize,
    /// Nombre de features écrites
    pub features_written: usize,
    /// Features écartées par la passe de réparation
    pub features_dropped: usize,

    /// Lignes ignorées
    pub skipped: Vec<SkippedRow>,
    /// Propriétés corrigées ou signalées
    pub issues: Vec<PropertyIssue>,
}

impl Default for ConversionReport {
    fn default() -> Self {
        Self {
            status: ConversionStatus::Success,
            rows_read: 0,
            features_written: 0,
            features_dropped: 0,
            skipped: Vec::new(),
            issues: Vec::new(),
        }
    }
}

impl ConversionReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enregistre une ligne ignorée
    pub fn record_skip(&mut self, row: usize, reason: SkipReason, contents: String) {
        self.skipped.push(SkippedRow {
            row,
            reason,
            contents,
        });
    }

    /// Enregistre un problème de propriété
    pub fn record_issue(&mut self, row: usize, key: &str, raw: String, kind: IssueKind) {
        self.issues.push(PropertyIssue {
            row,
            key: key.to_string(),
            raw,
            kind,
        });
    }

    /// Enregistre une feature écartée à la réparation
    pub fn record_dropped(&mut self) {
        self.features_dropped += 1;
    }

    /// Nombre de propriétés remplacées par null pendant la réparation
    pub fn repaired_properties(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.kind == IssueKind::Repaired)
            .count()
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        let degraded =
            !self.skipped.is_empty() || !self.issues.is_empty() || self.features_dropped > 0;

        self.status = if degraded {
            ConversionStatus::PartialSuccess
        } else {
            ConversionStatus::Success
        };
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("CONVERSION REPORT");
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!(
            "Rows: {} read, {} skipped",
            self.rows_read,
            self.skipped.len()
        );
        println!(
            "Features: {} written, {} dropped",
            self.features_written, self.features_dropped
        );

        if !self.skipped.is_empty() {
            println!("\n--- SKIPPED ROWS ({}) ---", self.skipped.len());
            for s in self.skipped.iter().take(20) {
                println!("  row {}: {}", s.row, s.reason);
            }
            if self.skipped.len() > 20 {
                println!("  ... and {} more", self.skipped.len() - 20);
            }
        }

        if !self.issues.is_empty() {
            println!("\n--- PROPERTY ISSUES ({}) ---", self.issues.len());
            for i in self.issues.iter().take(20) {
                println!("  row {} [{}] {:?}: {}", i.row, i.key, i.kind, i.raw);
            }
            if self.issues.len() > 20 {
                println!("  ... and {} more", self.issues.len() - 20);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<(), crate::ConvertError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{} features from {} rows ({} skipped, {} property issues)",
            self.features_written,
            self.rows_read,
            self.skipped.len(),
            self.issues.len()
        )
    }
}
