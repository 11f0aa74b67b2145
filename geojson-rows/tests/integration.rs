//! Tests d'intégration CSV -> GeoJSON sur fichiers temporaires

use std::path::PathBuf;

use geojson_rows::{csv_to_geojson, ConversionStatus, CoordinateColumns, SkipReason};
use serde_json::{json, Value};

/// Répertoire de travail propre à un test
fn workdir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("geojson_rows_it_{}", name));
    std::fs::remove_dir_all(&dir).ok();
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn run(name: &str, csv: &str) -> (Value, String, geojson_rows::ConversionReport) {
    let dir = workdir(name);
    let input = dir.join("input.csv");
    let output = dir.join("stores.geojson");
    std::fs::write(&input, csv).unwrap();

    let report = csv_to_geojson(&input, &output, CoordinateColumns::default()).unwrap();
    let text = std::fs::read_to_string(&output).unwrap();
    let parsed = serde_json::from_str(&text).unwrap();

    std::fs::remove_dir_all(dir).ok();
    (parsed, text, report)
}

#[test]
fn test_example_row() {
    let (doc, _, report) = run(
        "example",
        "latitude,longitude,price,note\n32.05,34.78,12.5,NULL\n",
    );

    let feature = &doc["features"][0];
    assert_eq!(feature["type"], "Feature");
    assert_eq!(feature["geometry"]["type"], "Point");
    assert_eq!(feature["geometry"]["coordinates"], json!([34.78, 32.05]));
    assert_eq!(feature["properties"], json!({"price": 12.5, "note": null}));
    assert_eq!(report.status, ConversionStatus::Success);
}

#[test]
fn test_missing_latitude_excluded() {
    let (doc, _, report) = run(
        "missing",
        "latitude,longitude,price\n,34.78,1\n31.0,35.0,2\n",
    );

    let features = doc["features"].as_array().unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0]["properties"]["price"], 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].row, 1);
    assert_eq!(report.skipped[0].reason, SkipReason::MissingCoordinates);
}

#[test]
fn test_malformed_decimal_kept_as_text() {
    let (doc, _, report) = run(
        "malformed",
        "latitude,longitude,price\n32.0,34.0,abc.def\n",
    );

    assert_eq!(doc["features"][0]["properties"]["price"], "abc.def");
    assert_eq!(report.features_written, 1);
    assert_eq!(report.issues.len(), 1);
}

#[test]
fn test_zero_valid_rows() {
    let (doc, _, report) = run("empty", "latitude,longitude,price\n,,1\nx,y,2\n");

    assert_eq!(doc, json!({"type": "FeatureCollection", "features": []}));
    assert_eq!(report.rows_read, 2);
    assert_eq!(report.features_written, 0);
}

#[test]
fn test_header_only() {
    let (doc, _, report) = run("header_only", "latitude,longitude\n");
    assert_eq!(doc["features"], json!([]));
    assert_eq!(report.status, ConversionStatus::Success);
}

#[test]
fn test_no_nan_tokens() {
    let (doc, text, _) = run(
        "nan",
        "latitude,longitude,a,b,c,d\n32.0,34.0,NaN,1e999.0,-1.5e400,inf\n1.0,nan,1,2,3,4\n",
    );

    assert!(!text.contains("NaN"));
    assert!(!text.contains("Infinity"));
    let props = &doc["features"][0]["properties"];
    assert_eq!(props["a"], Value::Null);
    assert_eq!(props["c"], Value::Null);
    // "inf" sans point décimal reste du texte
    assert_eq!(props["d"], "inf");
    assert_eq!(doc["features"].as_array().unwrap().len(), 1);
}

#[test]
fn test_round_trip_and_idempotence() {
    let csv = "\u{feff}store_code,store_name,city,latitude,longitude,average_price_diff,popular_item_count\n\
               001,שופרסל,חיפה,32.79,34.99,-3.25,120\n\
               002,Yochananof,Rehovot,31.89,34.81,1.5,98\n";

    let (first_doc, first_text, _) = run("idem_a", csv);
    let (_, second_text, _) = run("idem_b", csv);

    assert_eq!(first_text, second_text);

    let reparsed: Value = serde_json::from_str(&serde_json::to_string(&first_doc).unwrap()).unwrap();
    assert_eq!(reparsed, first_doc);

    assert!(first_text.contains("שופרסל"));
    let props = &first_doc["features"][0]["properties"];
    assert_eq!(props["store_code"], 1);
    assert_eq!(props["popular_item_count"], 120);
    assert_eq!(props["average_price_diff"], -3.25);
    let keys: Vec<_> = props.as_object().unwrap().keys().cloned().collect();
    assert_eq!(
        keys,
        vec!["store_code", "store_name", "city", "average_price_diff", "popular_item_count"]
    );
}

#[test]
fn test_missing_coordinate_column_is_fatal() {
    let dir = workdir("no_column");
    let input = dir.join("input.csv");
    let output = dir.join("out.geojson");
    std::fs::write(&input, "lat,lng\n1,2\n").unwrap();

    let result = csv_to_geojson(&input, &output, CoordinateColumns::default());

    assert!(result.is_err());
    assert!(!output.exists());
    std::fs::remove_dir_all(dir).ok();
}
