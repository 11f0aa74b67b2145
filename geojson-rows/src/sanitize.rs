//! Nettoyage des propriétés
//!
//! Aucune valeur NaN ou infinie ne sort de ce module : elles sont remplacées
//! par `Null` et signalées dans le rapport.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::coords::parse_float;
use crate::report::{ConversionReport, IssueKind};
use crate::types::{CoordinateColumns, Properties, Row, TextPolicy, Value};

/// Entier décimal ASCII, signe moins optionnel
static INTEGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?[0-9]+$").unwrap_or_else(|e| panic!("invalid integer pattern: {e}"))
});

/// Résultat du nettoyage d'une valeur
#[derive(Debug, Clone, PartialEq)]
pub struct Sanitized {
    pub value: Value,
    pub issue: Option<IssueKind>,
}

impl Sanitized {
    fn clean(value: Value) -> Self {
        Self { value, issue: None }
    }

    fn flagged(value: Value, issue: IssueKind) -> Self {
        Self {
            value,
            issue: Some(issue),
        }
    }
}

/// Nettoie une valeur de propriété selon la politique texte
pub fn sanitize_value(value: &Value, policy: TextPolicy) -> Sanitized {
    match value {
        Value::Null => Sanitized::clean(Value::Null),
        Value::Int(i) => Sanitized::clean(Value::Int(*i)),
        Value::Float(f) if f.is_finite() => Sanitized::clean(Value::Float(*f)),
        Value::Float(_) => Sanitized::flagged(Value::Null, IssueKind::NonFinite),
        Value::Text(s) => match policy {
            TextPolicy::Coerce => coerce_text(s),
            TextPolicy::Verbatim => Sanitized::clean(Value::Text(s.clone())),
        },
    }
}

/// Règles de conversion d'une cellule texte
fn coerce_text(s: &str) -> Sanitized {
    if s.is_empty() || s.eq_ignore_ascii_case("NULL") || s.eq_ignore_ascii_case("NaN") {
        return Sanitized::clean(Value::Null);
    }

    if memchr::memchr(b'.', s.as_bytes()).is_some() {
        return match parse_float(s) {
            Some(f) if f.is_finite() => Sanitized::clean(Value::Float(f)),
            Some(_) => Sanitized::flagged(Value::Null, IssueKind::NonFinite),
            None => Sanitized::flagged(Value::Text(s.to_string()), IssueKind::Unparsable),
        };
    }

    if INTEGER.is_match(s) {
        return match s.parse::<i128>() {
            Ok(i) => Sanitized::clean(Value::Int(i)),
            // Plus de 38 chiffres
            Err(_) => Sanitized::flagged(Value::Text(s.to_string()), IssueKind::Unparsable),
        };
    }

    Sanitized::clean(Value::Text(s.to_string()))
}

/// Construit les propriétés d'une ligne, colonnes de coordonnées exclues
pub fn sanitize_properties(
    row: &Row,
    row_number: usize,
    columns: &CoordinateColumns,
    policy: TextPolicy,
    report: &mut ConversionReport,
) -> Properties {
    let mut properties = Properties::with_capacity(row.len());

    for (key, raw) in row.iter() {
        if columns.contains(key) {
            continue;
        }

        let sanitized = sanitize_value(raw, policy);
        if let Some(kind) = sanitized.issue {
            warn!(row = row_number, key, value = %raw, ?kind, "Invalid property value");
            report.record_issue(row_number, key, raw.to_string(), kind);
        }
        properties.push((key.to_string(), sanitized.value));
    }

    enforce_finite(&mut properties, row_number, report);
    properties
}

/// Dernière passe : toute valeur non représentable en JSON devient `Null`
pub fn enforce_finite(properties: &mut Properties, row_number: usize, report: &mut ConversionReport) {
    for (key, value) in properties.iter_mut() {
        if !value.is_json_representable() {
            warn!(row = row_number, key = key.as_str(), value = %value, "Non-finite property value");
            report.record_issue(row_number, key.as_str(), value.to_string(), IssueKind::NonFinite);
            *value = Value::Null;
        }
    }
}
