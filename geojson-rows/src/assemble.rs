//! Assemblage de la FeatureCollection ligne par ligne

use tracing::{debug, warn};

use crate::coords::extract_point;
use crate::report::{ConversionReport, SkipReason};
use crate::sanitize::sanitize_properties;
use crate::types::{ConvertOptions, Feature, FeatureCollection, Row};

/// Accumule les features dans l'ordre des lignes reçues.
///
/// Les lignes rejetées ne laissent aucune trace dans la collection, seulement
/// dans le rapport.
#[derive(Debug)]
pub struct CollectionBuilder {
    options: ConvertOptions,
    collection: FeatureCollection,
    report: ConversionReport,
}

impl CollectionBuilder {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            collection: FeatureCollection::default(),
            report: ConversionReport::new(),
        }
    }

    /// Traite une ligne ; renvoie `true` si elle a produit une feature
    pub fn push_row(&mut self, row: &Row) -> bool {
        self.report.rows_read += 1;
        let row_number = self.report.rows_read;

        let point = match extract_point(row, &self.options.columns) {
            Ok(point) => point,
            Err(reason) => {
                self.skip(row_number, reason, row);
                return false;
            }
        };

        let properties = sanitize_properties(
            row,
            row_number,
            &self.options.columns,
            self.options.text_policy,
            &mut self.report,
        );

        self.collection.features.push(Feature {
            row: row_number,
            point,
            properties,
        });
        true
    }

    fn skip(&mut self, row_number: usize, reason: SkipReason, row: &Row) {
        match &reason {
            SkipReason::MissingCoordinates => {
                warn!(row = row_number, "Skipping row with missing coordinates: {}", row)
            }
            SkipReason::UnparsableCoordinate { .. } => {
                warn!(row = row_number, "Skipping row due to error: {}", reason);
                warn!(row = row_number, "Problematic row: {}", row);
            }
            SkipReason::NonFiniteCoordinates { .. } => {
                warn!(row = row_number, "Skipping row with {}", reason)
            }
        }
        self.report.record_skip(row_number, reason, row.to_string());
    }

    /// Nombre de features acceptées jusqu'ici
    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    pub fn finish(self) -> (FeatureCollection, ConversionReport) {
        debug!(
            rows = self.report.rows_read,
            features = self.collection.len(),
            "Collection assembled"
        );
        (self.collection, self.report)
    }
}

/// Assemble une collection à partir de lignes déjà matérialisées
pub fn assemble<'a, I>(rows: I, options: ConvertOptions) -> (FeatureCollection, ConversionReport)
where
    I: IntoIterator<Item = &'a Row>,
{
    let mut builder = CollectionBuilder::new(options);
    for row in rows {
        builder.push_row(row);
    }
    builder.finish()
}
