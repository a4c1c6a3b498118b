//! Column decoding helpers shared by the row wrappers.

use std::fmt::Display;

use agora_domain::time::Timestamp;
use serde::de::DeserializeOwned;

pub(crate) fn error<E>(err: E) -> sqlx::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    sqlx::Error::Decode(err.into())
}

pub(crate) fn time(raw: &str) -> Result<Timestamp, sqlx::Error> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|time| time.to_utc())
        .map_err(error)
}

pub(crate) fn optional_time(raw: Option<String>) -> Result<Option<Timestamp>, sqlx::Error> {
    raw.as_deref().map(time).transpose()
}

pub(crate) fn json<T: DeserializeOwned>(raw: &str) -> Result<T, sqlx::Error> {
    serde_json::from_str(raw).map_err(error)
}

/// Parse a text column through `FromStr` implementations that report a
/// plain message.
pub(crate) fn parsed<T>(raw: &str) -> Result<T, sqlx::Error>
where
    T: std::str::FromStr,
    T::Err: Display,
{
    raw.parse().map_err(|err: T::Err| error(err.to_string()))
}
