//! Source de lignes CSV (en-tête obligatoire, BOM toléré)

use std::io::{Cursor, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecordsIntoIter};
use tracing::{debug, warn};

use crate::types::{CoordinateColumns, Row, Value};
use crate::ConvertError;

/// Itère les lignes d'un fichier CSV
pub struct CsvSource {
    headers: Vec<String>,
    records: StringRecordsIntoIter<Cursor<Vec<u8>>>,
}

impl CsvSource {
    /// Ouvre un fichier CSV et vérifie la présence des colonnes de coordonnées
    pub fn open(path: &Path, columns: &CoordinateColumns) -> Result<Self, ConvertError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, &path.display().to_string(), columns)
    }

    pub fn from_reader<R: Read>(
        mut reader: R,
        source_name: &str,
        columns: &CoordinateColumns,
    ) -> Result<Self, ConvertError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        let text = decode_utf8(&bytes, source_name);
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(Cursor::new(text.into_bytes()));

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        for column in [&columns.latitude, &columns.longitude] {
            if !headers.contains(column) {
                return Err(ConvertError::missing_column(column.as_str(), source_name));
            }
        }
        debug!(source = source_name, columns = headers.len(), "CSV header read");

        Ok(Self {
            headers,
            records: csv_reader.into_records(),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl Iterator for CsvSource {
    type Item = Result<Row, ConvertError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };

        // Cellules manquantes -> Null, cellules en trop ignorées
        let row: Row = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = record.get(i).map(Value::from).unwrap_or(Value::Null);
                (name.clone(), value)
            })
            .collect();
        Some(Ok(row))
    }
}

/// Décode en UTF-8 en retirant un éventuel BOM
fn decode_utf8(bytes: &[u8], source_name: &str) -> String {
    let (decoded, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
    if had_errors {
        warn!(source = source_name, "Invalid UTF-8 sequences replaced");
    }
    decoded.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(input: &[u8]) -> Vec<Row> {
        CsvSource::from_reader(input, "test.csv", &CoordinateColumns::default())
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_reads_rows_in_order() {
        let rows = rows(b"store,latitude,longitude\nA,32.0,34.0\nB,31.0,35.0\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("store"), Some(&Value::from("A")));
        assert_eq!(rows[1].get("longitude"), Some(&Value::from("35.0")));
    }

    #[test]
    fn test_bom_is_removed() {
        let rows = rows(b"\xEF\xBB\xBFlatitude,longitude\n32.0,34.0\n");
        assert_eq!(rows[0].get("latitude"), Some(&Value::from("32.0")));
    }

    #[test]
    fn test_short_record_gets_nulls() {
        let rows = rows(b"latitude,longitude,price\n32.0\n");
        assert_eq!(rows[0].get("longitude"), Some(&Value::Null));
        assert_eq!(rows[0].get("price"), Some(&Value::Null));
    }

    #[test]
    fn test_extra_cells_ignored() {
        let rows = rows(b"latitude,longitude\n32.0,34.0,extra\n");
        assert_eq!(rows[0].len(), 2);
    }

    #[test]
    fn test_missing_coordinate_column() {
        let err = CsvSource::from_reader(&b"lat,longitude\n1,2\n"[..], "x.csv", &CoordinateColumns::default())
            .err()
            .unwrap();
        assert!(matches!(err, ConvertError::MissingColumn { ref column, .. } if column == "latitude"));
    }

    #[test]
    fn test_quoted_fields() {
        let rows = rows(b"name,latitude,longitude\n\"Shop, Ltd\",32.0,34.0\n");
        assert_eq!(rows[0].get("name"), Some(&Value::from("Shop, Ltd")));
    }
}
