//! Extraction et validation des coordonnées d'une ligne

use geo::Point;

use crate::report::SkipReason;
use crate::types::{CoordinateColumns, Row, Value};

/// Extrait le point `(longitude, latitude)` d'une ligne.
///
/// Une valeur vide ou absente, non numérique, NaN ou infinie pour l'une des
/// deux colonnes rejette la ligne avec la raison correspondante.
pub fn extract_point(row: &Row, columns: &CoordinateColumns) -> Result<Point<f64>, SkipReason> {
    let lat_raw = row.get(&columns.latitude).unwrap_or(&Value::Null);
    let lng_raw = row.get(&columns.longitude).unwrap_or(&Value::Null);

    if lat_raw.is_blank() || lng_raw.is_blank() {
        return Err(SkipReason::MissingCoordinates);
    }

    let latitude = to_float(lat_raw, &columns.latitude)?;
    let longitude = to_float(lng_raw, &columns.longitude)?;

    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(SkipReason::NonFiniteCoordinates {
            latitude,
            longitude,
        });
    }

    Ok(Point::new(longitude, latitude))
}

/// Conversion d'une cellule en flottant (la finitude est vérifiée par l'appelant)
fn to_float(value: &Value, column: &str) -> Result<f64, SkipReason> {
    match value {
        Value::Int(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        Value::Text(s) => parse_float(s).ok_or_else(|| SkipReason::UnparsableCoordinate {
            column: column.to_string(),
            raw: s.clone(),
        }),
        Value::Null => Err(SkipReason::MissingCoordinates),
    }
}

/// Parse un flottant en tolérant les espaces autour
pub(crate) fn parse_float(s: &str) -> Option<f64> {
    fast_float::parse::<f64, _>(s.trim()).ok()
}
