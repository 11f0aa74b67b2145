//! # geojson-rows
//!
//! Conversion de lignes tabulaires (CSV, résultats de requête) en GeoJSON.
//!
//! ## Features
//!
//! - Extraction des coordonnées `[longitude, latitude]` avec rejet des lignes invalides
//! - Nettoyage des propriétés : NaN et infinis remplacés par `null`, nombres en texte convertis
//! - Réparation de la collection avant écriture (aucun `NaN` ne peut atteindre le fichier)
//! - Rapport de conversion détaillé (lignes ignorées, valeurs corrigées)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geojson_rows::{csv_to_geojson, CoordinateColumns};
//! use std::path::Path;
//!
//! let report = csv_to_geojson(
//!     Path::new("data/store_price_comparisons.csv"),
//!     Path::new("data/stores.geojson"),
//!     CoordinateColumns::default(),
//! )?;
//! println!("{}", report.summary());
//! ```

pub mod assemble;
pub mod coords;
pub mod error;
pub mod repair;
pub mod report;
pub mod sanitize;
pub mod source;
pub mod types;
pub mod writer;

pub use assemble::CollectionBuilder;
pub use error::{ConvertError, NotRepresentable};
pub use report::{ConversionReport, ConversionStatus, IssueKind, SkipReason};
pub use source::CsvSource;
pub use types::{
    ConvertOptions, CoordinateColumns, Feature, FeatureCollection, Properties, Row, TextPolicy,
    Value,
};

use std::path::Path;

/// Convertit une source de lignes en FeatureCollection validée.
///
/// Une erreur de la source interrompt la conversion ; les problèmes de
/// données sont seulement consignés dans le rapport.
pub fn convert<I, E>(
    rows: I,
    options: ConvertOptions,
) -> Result<(geojson::FeatureCollection, ConversionReport), E>
where
    I: IntoIterator<Item = Result<Row, E>>,
{
    let mut builder = CollectionBuilder::new(options);
    for row in rows {
        builder.push_row(&row?);
    }

    Ok(finish(builder))
}

/// Termine un assemblage incrémental : réparation puis statut final
pub fn finish(builder: CollectionBuilder) -> (geojson::FeatureCollection, ConversionReport) {
    let (collection, mut report) = builder.finish();
    let geojson = repair::repair_collection(collection, &mut report);
    report.features_written = geojson.features.len();
    report.finalize();
    (geojson, report)
}

/// Convertit un fichier CSV en fichier GeoJSON
pub fn csv_to_geojson(
    csv_path: &Path,
    output_path: &Path,
    columns: CoordinateColumns,
) -> Result<ConversionReport, ConvertError> {
    let source = CsvSource::open(csv_path, &columns)?;
    let options = ConvertOptions {
        columns,
        text_policy: TextPolicy::Coerce,
    };

    let (geojson, mut report) = convert(source, options)?;
    writer::write_geojson(geojson, output_path, &mut report)?;
    Ok(report)
}
