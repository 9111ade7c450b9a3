//! Tolerant field decoding for snapshots written by other clients.
//!
//! One malformed field must not make the whole backlog unreadable: `null`
//! reads as the field's default, and an unrecognized status or priority
//! falls back to the default with a warning.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use super::item::{Priority, Status};

/// `null` (or a missing field, with `#[serde(default)]`) becomes `T::default()`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn parse_keyword<T>(raw: Option<Value>, field: &'static str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    match raw? {
        Value::Null => None,
        Value::String(s) => match s.parse::<T>() {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(field, value = %s, error = %err, "unrecognized value in snapshot; using default");
                None
            }
        },
        other => {
            warn!(field, value = %other, "non-string value in snapshot; using default");
            None
        }
    }
}

pub fn status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Status, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(parse_keyword(raw, "status").unwrap_or_default())
}

pub fn priority<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Priority, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(parse_keyword(raw, "priority").unwrap_or_default())
}

/// Unknown previous statuses are dropped; the pause itself is kept.
pub fn optional_status<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Status>, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(parse_keyword(raw, "pausedPreviousStatus"))
}
