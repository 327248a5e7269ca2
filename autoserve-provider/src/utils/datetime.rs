//! Serde helpers for registrar timestamps.
//!
//! Cloudflare returns `created_on`/`modified_on` as RFC3339 strings, occasionally
//! with nanosecond precision. Missing or `null` values map to `None`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Serializes `Option<DateTime<Utc>>` as an optional RFC3339 string.
pub fn serialize<S>(dt: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
        None => serializer.serialize_none(),
    }
}

/// Deserializes an optional RFC3339 string.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<String>::deserialize(deserializer)? {
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| Error::custom(format!("Invalid RFC3339 timestamp: {e}"))),
        None => Ok(None),
    }
}

/// Parses a registrar timestamp, dropping values that are not valid RFC3339.
pub fn parse_lenient(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cloudflare_timestamp() {
        let dt = parse_lenient(Some("2024-01-15T10:30:00.123456Z"));
        assert!(dt.is_some());
    }

    #[test]
    fn drops_garbage() {
        assert_eq!(parse_lenient(Some("yesterday")), None);
        assert_eq!(parse_lenient(None), None);
    }
}
