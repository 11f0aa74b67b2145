//! Décodage des colonnes PostgreSQL (format binaire) vers `Value`
//!
//! Entiers et flottants restent numériques, `numeric` devient un flottant
//! (NaN et infinis compris, le nettoyage les remplace ensuite par null).
//! Dates, horodatages, uuid et json passent par `chrono`, `uuid` et
//! `serde_json` puis sont rendus en texte ; le reste en hexadécimal.

use std::error::Error;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use geojson_rows::Value;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tokio_postgres::types::{Date, FromSql, Kind, Timestamp, Type};
use tracing::warn;
use uuid::Uuid;

type BoxError = Box<dyn Error + Sync + Send>;

/// Mot de signe d'un `numeric` binaire pour les valeurs spéciales
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_POS_INF: u16 = 0xD000;
const NUMERIC_NEG_INF: u16 = 0xF000;

/// Valeur d'une colonne, quel que soit son type SQL
#[derive(Debug, Clone, PartialEq)]
pub struct PgValue(pub Value);

impl<'a> FromSql<'a> for PgValue {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        decode(ty, raw).map(PgValue)
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(PgValue(Value::Null))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

fn decode(ty: &Type, raw: &[u8]) -> Result<Value, BoxError> {
    let value = if *ty == Type::INT2 {
        Value::Int(i16::from_sql(ty, raw)?.into())
    } else if *ty == Type::INT4 {
        Value::Int(i32::from_sql(ty, raw)?.into())
    } else if *ty == Type::INT8 {
        Value::Int(i64::from_sql(ty, raw)?.into())
    } else if *ty == Type::OID {
        Value::Int(u32::from_sql(ty, raw)?.into())
    } else if *ty == Type::FLOAT4 {
        Value::Float(f32::from_sql(ty, raw)?.into())
    } else if *ty == Type::FLOAT8 {
        Value::Float(f64::from_sql(ty, raw)?)
    } else if *ty == Type::NUMERIC {
        decode_numeric(ty, raw)?
    } else if *ty == Type::BOOL {
        Value::Text(bool::from_sql(ty, raw)?.to_string())
    } else if *ty == Type::DATE {
        Value::Text(format_date(Date::<NaiveDate>::from_sql(ty, raw)?))
    } else if *ty == Type::TIMESTAMP {
        Value::Text(format_timestamp(Timestamp::<NaiveDateTime>::from_sql(ty, raw)?))
    } else if *ty == Type::TIMESTAMPTZ {
        Value::Text(format_timestamptz(Timestamp::<DateTime<Utc>>::from_sql(ty, raw)?))
    } else if *ty == Type::UUID {
        Value::Text(Uuid::from_sql(ty, raw)?.to_string())
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        Value::Text(serde_json::Value::from_sql(ty, raw)?.to_string())
    } else if is_textual(ty) {
        Value::Text(std::str::from_utf8(raw)?.to_string())
    } else {
        Value::Text(printable_or_hex(raw))
    };

    Ok(value)
}

fn is_textual(ty: &Type) -> bool {
    <&str as FromSql>::accepts(ty)
        || [Type::XML, Type::CHAR].contains(ty)
        || matches!(ty.kind(), Kind::Enum(_))
}

/// `numeric` : `rust_decimal` pour les valeurs finies ; NaN et infinis,
/// que `Decimal` ne représente pas, deviennent des flottants spéciaux
fn decode_numeric(ty: &Type, raw: &[u8]) -> Result<Value, BoxError> {
    let sign = raw
        .get(4..6)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or("truncated numeric value")?;

    let value = match sign {
        NUMERIC_NAN => Value::Float(f64::NAN),
        NUMERIC_POS_INF => Value::Float(f64::INFINITY),
        NUMERIC_NEG_INF => Value::Float(f64::NEG_INFINITY),
        _ => match Decimal::from_sql(ty, raw) {
            Ok(decimal) => decimal.to_f64().map(Value::Float).unwrap_or(Value::Null),
            Err(e) => {
                // Plus de 28 chiffres significatifs
                warn!("Numeric value stored as null: {}", e);
                Value::Null
            }
        },
    };

    Ok(value)
}

fn format_date(date: Date<NaiveDate>) -> String {
    match date {
        Date::PosInfinity => "infinity".into(),
        Date::NegInfinity => "-infinity".into(),
        Date::Value(d) => d.format("%Y-%m-%d").to_string(),
    }
}

fn format_timestamp(ts: Timestamp<NaiveDateTime>) -> String {
    match ts {
        Timestamp::PosInfinity => "infinity".into(),
        Timestamp::NegInfinity => "-infinity".into(),
        Timestamp::Value(t) => t.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
    }
}

fn format_timestamptz(ts: Timestamp<DateTime<Utc>>) -> String {
    match ts {
        Timestamp::PosInfinity => "infinity".into(),
        Timestamp::NegInfinity => "-infinity".into(),
        Timestamp::Value(t) => t.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string(),
    }
}

/// Types inconnus (domaines, types d'extension...) : texte s'il est lisible, sinon `\x...`
fn printable_or_hex(raw: &[u8]) -> String {
    match std::str::from_utf8(raw) {
        Ok(s) if !s.chars().any(char::is_control) => s.to_string(),
        _ => format!("\\x{}", hex::encode(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_postgres::types::ToSql;

    /// Encode une valeur au format binaire PostgreSQL
    fn encode<T: ToSql>(value: T, ty: &Type) -> Vec<u8> {
        let mut buf = bytes::BytesMut::new();
        value.to_sql(ty, &mut buf).unwrap();
        buf.to_vec()
    }

    /// En-tête d'un numeric spécial : ndigits, weight, sign, dscale
    fn special_numeric(sign: u16) -> Vec<u8> {
        [0u16, 0, sign, 0].iter().flat_map(|w| w.to_be_bytes()).collect()
    }

    #[test]
    fn test_decode_numeric() {
        let raw = encode(Decimal::new(125, 1), &Type::NUMERIC);
        assert_eq!(decode(&Type::NUMERIC, &raw).unwrap(), Value::Float(12.5));

        let raw = encode(Decimal::new(-31416, 0), &Type::NUMERIC);
        assert_eq!(decode(&Type::NUMERIC, &raw).unwrap(), Value::Float(-31416.0));

        let raw = encode(Decimal::new(5, 2), &Type::NUMERIC);
        assert_eq!(decode(&Type::NUMERIC, &raw).unwrap(), Value::Float(0.05));
    }

    #[test]
    fn test_decode_numeric_special() {
        let nan = decode(&Type::NUMERIC, &special_numeric(NUMERIC_NAN)).unwrap();
        assert!(matches!(nan, Value::Float(f) if f.is_nan()));
        assert_eq!(
            decode(&Type::NUMERIC, &special_numeric(NUMERIC_POS_INF)).unwrap(),
            Value::Float(f64::INFINITY)
        );
        assert_eq!(
            decode(&Type::NUMERIC, &special_numeric(NUMERIC_NEG_INF)).unwrap(),
            Value::Float(f64::NEG_INFINITY)
        );
        assert!(decode(&Type::NUMERIC, &[0, 1]).is_err());
    }

    #[test]
    fn test_decode_scalars() {
        assert_eq!(decode(&Type::INT4, &7i32.to_be_bytes()).unwrap(), Value::Int(7));
        assert_eq!(
            decode(&Type::INT8, &i64::MIN.to_be_bytes()).unwrap(),
            Value::Int(i64::MIN.into())
        );
        assert_eq!(
            decode(&Type::FLOAT8, &2.5f64.to_be_bytes()).unwrap(),
            Value::Float(2.5)
        );
        assert_eq!(decode(&Type::TEXT, b"Haifa").unwrap(), Value::from("Haifa"));
        assert_eq!(decode(&Type::BOOL, &[1]).unwrap(), Value::from("true"));
    }

    #[test]
    fn test_null() {
        assert_eq!(PgValue::from_sql_null(&Type::TEXT).unwrap(), PgValue(Value::Null));
    }

    #[test]
    fn test_decode_date() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let raw = encode(date, &Type::DATE);
        assert_eq!(decode(&Type::DATE, &raw).unwrap(), Value::from("2025-06-01"));

        let raw = encode(Date::<NaiveDate>::PosInfinity, &Type::DATE);
        assert_eq!(decode(&Type::DATE, &raw).unwrap(), Value::from("infinity"));
    }

    #[test]
    fn test_decode_date_before_common_era() {
        // Année astronomique -2 (3 av. J.-C.) : forme ISO-8601 étendue
        let date = NaiveDate::from_ymd_opt(-2, 12, 31).unwrap();
        let raw = encode(date, &Type::DATE);
        assert_eq!(decode(&Type::DATE, &raw).unwrap(), Value::from("-0002-12-31"));
    }

    #[test]
    fn test_decode_timestamps() {
        let t = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_milli_opt(1, 2, 3, 500)
            .unwrap();
        let raw = encode(t, &Type::TIMESTAMP);
        assert_eq!(
            decode(&Type::TIMESTAMP, &raw).unwrap(),
            Value::from("2000-01-01 01:02:03.500")
        );

        let raw = encode(t.and_utc(), &Type::TIMESTAMPTZ);
        assert_eq!(
            decode(&Type::TIMESTAMPTZ, &raw).unwrap(),
            Value::from("2000-01-01 01:02:03.500+00:00")
        );

        let whole = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        let raw = encode(whole, &Type::TIMESTAMP);
        assert_eq!(
            decode(&Type::TIMESTAMP, &raw).unwrap(),
            Value::from("1999-12-31 23:59:59")
        );
    }

    #[test]
    fn test_decode_uuid() {
        let raw: Vec<u8> = (0u8..16).collect();
        assert_eq!(
            decode(&Type::UUID, &raw).unwrap(),
            Value::from("00010203-0405-0607-0809-0a0b0c0d0e0f")
        );
        assert!(decode(&Type::UUID, &raw[..4]).is_err());
    }

    #[test]
    fn test_decode_jsonb() {
        let raw = encode(serde_json::json!({"chain": "Shufersal"}), &Type::JSONB);
        assert_eq!(
            decode(&Type::JSONB, &raw).unwrap(),
            Value::from(r#"{"chain":"Shufersal"}"#)
        );
    }

    #[test]
    fn test_unknown_type_fallback() {
        assert_eq!(printable_or_hex(b"abc"), "abc");
        assert_eq!(printable_or_hex(&[0, 255]), "\\x00ff");
    }
}
