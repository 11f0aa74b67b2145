//! Types de données pour le crate geojson-rows

use std::fmt;

use geo::Point;

/// Valeur scalaire d'une cellule, typée dynamiquement
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    /// Entier ; au-delà de `i64`, écrit en JSON grâce à `arbitrary_precision`
    Int(i128),
    Float(f64),
    Text(String),
}

impl Value {
    /// Vrai pour `Null` et pour le texte vide
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Vrai si la valeur peut être écrite telle quelle en JSON
    pub fn is_json_representable(&self) -> bool {
        match self {
            Value::Float(f) => f.is_finite(),
            _ => true,
        }
    }

    /// Convertit en valeur JSON, échoue sur les flottants non finis
    pub fn to_json(&self) -> Result<serde_json::Value, crate::NotRepresentable> {
        Ok(match self {
            Value::Null => serde_json::Value::Null,
            Value::Int(i) => match i64::try_from(*i) {
                Ok(small) => serde_json::Value::from(small),
                Err(_) => serde_json::to_value(i).map_err(|_| crate::NotRepresentable(*i as f64))?,
            },
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .ok_or(crate::NotRepresentable(*f))?,
            Value::Text(s) => serde_json::Value::String(s.clone()),
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Une ligne tabulaire : colonnes dans l'ordre de la source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ajoute une colonne (une colonne de même nom est remplacée en place)
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.push(k, v);
        }
        row
    }
}

/// Rendu `{clé: valeur, ...}` utilisé dans les diagnostics
impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match v {
                Value::Text(s) => write!(f, "{}: {:?}", k, s)?,
                other => write!(f, "{}: {}", k, other)?,
            }
        }
        write!(f, "}}")
    }
}

/// Propriétés d'une feature, dans l'ordre des colonnes source
pub type Properties = Vec<(String, Value)>;

/// Une feature ponctuelle avec ses attributs
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Numéro de la ligne source (1-based, en-tête exclu)
    pub row: usize,

    /// Position (x = longitude, y = latitude)
    pub point: Point<f64>,

    /// Attributs nettoyés
    pub properties: Properties,
}

impl Feature {
    pub fn longitude(&self) -> f64 {
        self.point.x()
    }

    pub fn latitude(&self) -> f64 {
        self.point.y()
    }
}

/// Collection ordonnée de features, dans l'ordre des lignes acceptées
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Noms des colonnes portant les coordonnées
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateColumns {
    pub latitude: String,
    pub longitude: String,
}

impl Default for CoordinateColumns {
    fn default() -> Self {
        Self {
            latitude: "latitude".into(),
            longitude: "longitude".into(),
        }
    }
}

impl CoordinateColumns {
    pub fn contains(&self, name: &str) -> bool {
        name == self.latitude || name == self.longitude
    }
}

/// Traitement des cellules texte lors du nettoyage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextPolicy {
    /// Origine texte (CSV) : "NULL", "NaN" et les nombres écrits en texte sont convertis
    #[default]
    Coerce,
    /// Origine typée (base de données) : le texte est conservé tel quel
    Verbatim,
}

/// Options d'une conversion
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub columns: CoordinateColumns,
    pub text_policy: TextPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_keeps_column_order() {
        let row: Row = [("b", "1"), ("a", "2"), ("c", "3")].into_iter().collect();
        let names: Vec<_> = row.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_row_duplicate_column_overwrites() {
        let mut row = Row::new();
        row.push("price", "1");
        row.push("price", "2");
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("price"), Some(&Value::from("2")));
    }

    #[test]
    fn test_value_to_json() {
        assert_eq!(Value::Int(3).to_json().unwrap(), serde_json::json!(3));
        let big = Value::Int(12_345_678_901_234_567_890_123).to_json().unwrap();
        assert_eq!(serde_json::to_string(&big).unwrap(), "12345678901234567890123");
        assert_eq!(Value::Float(1.5).to_json().unwrap(), serde_json::json!(1.5));
        assert_eq!(Value::Null.to_json().unwrap(), serde_json::Value::Null);
        assert!(Value::Float(f64::NAN).to_json().is_err());
        assert!(Value::Float(f64::NEG_INFINITY).to_json().is_err());
    }

    #[test]
    fn test_row_display() {
        let row: Row = [("city", Value::from("Haifa")), ("n", Value::Int(2))]
            .into_iter()
            .collect();
        assert_eq!(row.to_string(), r#"{city: "Haifa", n: 2}"#);
    }

    #[test]
    fn test_value_blank() {
        assert!(Value::Null.is_blank());
        assert!(Value::from("").is_blank());
        assert!(!Value::from(" ").is_blank());
        assert!(!Value::Int(0).is_blank());
    }
}
