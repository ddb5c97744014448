//! Timestamp decoding
//!
//! The EVS and NAT APIs report creation times without a timezone, either
//! ISO style (`2016-05-25T02:42:10.856332`) or with a space separator
//! (`2019-04-17 07:50:35.123456`). Empty strings mean "not reported".

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};

const FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an API timestamp
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

/// Serde helper for optional API timestamps
pub(crate) fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_timestamp(value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {value}"))),
    }
}
