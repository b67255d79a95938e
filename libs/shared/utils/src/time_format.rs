//! Wall-clock `HH:MM` (de)serialization for `NaiveTime` fields.
//!
//! Storage may hand back `HH:MM:SS`; both forms are accepted and the seconds dropped.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serializer};

pub const WIRE_FORMAT: &str = "%H:%M";

pub fn parse_hhmm(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, WIRE_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
}

pub fn format_hhmm(time: &NaiveTime) -> String {
    time.format(WIRE_FORMAT).to_string()
}

pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_hhmm(time))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_hhmm(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid time '{}', expected HH:MM", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Row {
        #[serde(with = "crate::time_format")]
        at: NaiveTime,
    }

    #[test]
    fn test_accepts_both_storage_forms() {
        assert_eq!(parse_hhmm("08:30"), NaiveTime::from_hms_opt(8, 30, 0));
        assert_eq!(parse_hhmm("08:30:45"), NaiveTime::from_hms_opt(8, 30, 0));
        assert_eq!(parse_hhmm("8h30"), None);
    }

    #[test]
    fn test_serializes_minute_precision() {
        let row: Row = serde_json::from_str(r#"{"at":"17:05:00"}"#).unwrap();
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"at":"17:05"}"#);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(serde_json::from_str::<Row>(r#"{"at":"noon"}"#).is_err());
    }
}
