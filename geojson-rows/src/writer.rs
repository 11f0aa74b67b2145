//! Écriture du fichier GeoJSON

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::report::ConversionReport;
use crate::ConvertError;

/// Sérialise la collection (indentation de 2 espaces, UTF-8 non échappé)
pub fn render(collection: &geojson::FeatureCollection) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(collection)
}

/// Écrit la collection dans `output_path`.
///
/// Si la sérialisation échoue malgré la réparation, seules les features
/// sérialisables individuellement sont conservées. Une erreur d'I/O reste
/// fatale.
pub fn write_geojson(
    mut collection: geojson::FeatureCollection,
    output_path: &Path,
    report: &mut ConversionReport,
) -> Result<(), ConvertError> {
    let bytes = match render(&collection) {
        Ok(bytes) => bytes,
        Err(e) if !e.is_io() => {
            warn!("Failed to write GeoJSON: {}", e);
            let before = collection.features.len();
            collection
                .features
                .retain(|f| serde_json::to_vec(f).is_ok());
            let dropped = before - collection.features.len();
            for _ in 0..dropped {
                report.record_dropped();
            }
            warn!(dropped, "Skipping invalid features");
            render(&collection)?
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(dir) = output_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&bytes)?;
    writer.flush()?;

    report.features_written = collection.features.len();
    report.finalize();

    info!(
        features = report.features_written,
        output = %output_path.display(),
        "Converted features to GeoJSON"
    );
    Ok(())
}
