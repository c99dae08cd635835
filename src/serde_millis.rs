//! `Duration` fields written as whole milliseconds.
//!
//! Reading also accepts a string with an `ms` or `s` suffix (`"250ms"`,
//! `"30s"`) so YAML files can spell timeouts out.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    serializer.serialize_u64(millis)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Millis(u64),
    Text(String),
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    match Raw::deserialize(deserializer)? {
        Raw::Millis(millis) => Ok(Duration::from_millis(millis)),
        Raw::Text(text) => parse(&text).map_err(D::Error::custom),
    }
}

fn parse(text: &str) -> Result<Duration, String> {
    let text = text.trim();
    let (digits, scale) = if let Some(n) = text.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = text.strip_suffix('s') {
        (n, 1000)
    } else {
        (text, 1)
    };
    digits
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(scale))
        .map(Duration::from_millis)
        .ok_or_else(|| format!("invalid duration `{text}`, expected milliseconds or `<n>ms` / `<n>s`"))
}
