//! Conversion vers les types `geojson` et réparation des valeurs non sérialisables
//!
//! Le nettoyage des propriétés garantit déjà des valeurs finies ; cette passe
//! revérifie la collection entière avant écriture. Une propriété non
//! représentable devient `null`, une feature dont la géométrie n'est pas
//! représentable est écartée.

use geojson::JsonObject;
use tracing::{info, warn};

use crate::error::NotRepresentable;
use crate::report::{ConversionReport, IssueKind};
use crate::types::{Feature, FeatureCollection, Properties, Value};

/// Convertit une feature, échoue à la première valeur non représentable
pub fn feature_to_geojson(feature: &Feature) -> Result<geojson::Feature, NotRepresentable> {
    for coord in [feature.point.x(), feature.point.y()] {
        if !coord.is_finite() {
            return Err(NotRepresentable(coord));
        }
    }

    let properties = properties_to_json(&feature.properties)?;
    let geometry = geojson::Geometry::new(geojson::Value::Point(vec![
        feature.point.x(),
        feature.point.y(),
    ]));

    Ok(geojson::Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

fn properties_to_json(properties: &Properties) -> Result<JsonObject, NotRepresentable> {
    let mut object = JsonObject::with_capacity(properties.len());
    for (key, value) in properties {
        object.insert(key.clone(), value.to_json()?);
    }
    Ok(object)
}

/// Convertit la collection entière sans réparation
pub fn collection_to_geojson(
    collection: &FeatureCollection,
) -> Result<geojson::FeatureCollection, NotRepresentable> {
    let features = collection
        .features
        .iter()
        .map(feature_to_geojson)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(wrap(features))
}

/// Valide la collection et la répare si nécessaire.
///
/// 1. conversion directe ; si elle réussit, rien à faire
/// 2. sinon, feature par feature : les propriétés fautives passent à `null`
/// 3. les features encore invalides (coordonnées) sont écartées
pub fn repair_collection(
    mut collection: FeatureCollection,
    report: &mut ConversionReport,
) -> geojson::FeatureCollection {
    match collection_to_geojson(&collection) {
        Ok(geojson) => {
            info!(features = geojson.features.len(), "GeoJSON validation successful");
            return geojson;
        }
        Err(e) => warn!("Invalid GeoJSON: {}", e),
    }

    let mut features = Vec::with_capacity(collection.features.len());
    for feature in collection.features.iter_mut() {
        if let Err(e) = feature_to_geojson(feature) {
            warn!(row = feature.row, "Problem in feature: {}", e);
            repair_properties(&mut feature.properties, feature.row, report);
        }

        match feature_to_geojson(feature) {
            Ok(f) => features.push(f),
            Err(e) => {
                warn!(row = feature.row, "Dropping unrepairable feature: {}", e);
                report.record_dropped();
            }
        }
    }

    wrap(features)
}

/// Remplace par `null` chaque propriété non représentable
fn repair_properties(properties: &mut Properties, row: usize, report: &mut ConversionReport) {
    for (key, value) in properties.iter_mut() {
        if value.to_json().is_err() {
            warn!(row, key = key.as_str(), value = %value, "Cleaning problematic property");
            report.record_issue(row, key.as_str(), value.to_string(), IssueKind::Repaired);
            *value = Value::Null;
        }
    }
}

fn wrap(features: Vec<geojson::Feature>) -> geojson::FeatureCollection {
    geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
