//! Lenient field decoding for exported read-API documents
//!
//! The QC-washing exports are loosely typed: quantities arrive as numbers or
//! numeric strings, identifiers as strings, numbers or `{"$oid": ...}`, and
//! timestamps in several shapes. These helpers normalize each field at the
//! boundary so the core can work on plain Rust types.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Interpret a JSON value as a number
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Interpret a JSON value as an integer quantity (fractions are truncated)
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|v| v.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v.trunc() as i64))
        }
        _ => None,
    }
}

/// Interpret a JSON value as an identifier string
pub fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("$oid").and_then(value_as_id),
        _ => None,
    }
}

/// Interpret a JSON value as a UTC timestamp
pub fn value_as_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        Value::Object(map) => map.get("$date").and_then(|inner| match inner {
            Value::Object(nested) => nested.get("$numberLong").and_then(|v| {
                value_as_i64(v).and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            }),
            other => value_as_datetime(other),
        }),
        _ => None,
    }
}

/// Parse the timestamp shapes seen in exports
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }
    None
}

pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_f64))
}

pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_i64))
}

pub fn opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_id))
}

/// Identifier that falls back to an empty string
pub fn id_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_id(deserializer)?.unwrap_or_default())
}

/// Free text that tolerates numbers and null
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = text(deserializer)?;
    Ok(if s.trim().is_empty() { None } else { Some(s) })
}

pub fn opt_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_datetime))
}

pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_i64().is_some_and(|v| v != 0),
        _ => false,
    })
}

/// Sequence that treats null as empty
pub fn seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_from_strings() {
        assert_eq!(value_as_f64(&json!("10.5")), Some(10.5));
        assert_eq!(value_as_f64(&json!(0.125)), Some(0.125));
        assert_eq!(value_as_f64(&json!("abc")), None);
        assert_eq!(value_as_f64(&Value::Null), None);
        assert_eq!(value_as_i64(&json!("120")), Some(120));
        assert_eq!(value_as_i64(&json!(99.7)), Some(99));
        assert_eq!(value_as_i64(&json!(" 15.0 ")), Some(15));
    }

    #[test]
    fn test_ids() {
        assert_eq!(value_as_id(&json!("abc")), Some("abc".to_string()));
        assert_eq!(value_as_id(&json!(3)), Some("3".to_string()));
        assert_eq!(
            value_as_id(&json!({"$oid": "64f0c0ffee"})),
            Some("64f0c0ffee".to_string())
        );
        assert_eq!(value_as_id(&json!("  ")), None);
    }

    #[test]
    fn test_timestamps() {
        let a = value_as_datetime(&json!("2024-03-01T08:00:00.000Z")).unwrap();
        let b = value_as_datetime(&json!({"$date": "2024-03-01T08:00:00Z"})).unwrap();
        assert_eq!(a, b);

        let c = value_as_datetime(&json!(a.timestamp_millis())).unwrap();
        assert_eq!(a, c);

        let d = value_as_datetime(&json!("2024-03-01")).unwrap();
        assert_eq!(d.format("%Y-%m-%d %H:%M").to_string(), "2024-03-01 00:00");

        assert!(value_as_datetime(&json!("not a date")).is_none());
    }
}
