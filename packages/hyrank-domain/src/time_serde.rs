//! RFC 3339 (de)serialization for corpus timestamps.

pub mod option;

use serde::{Deserialize, Deserializer, Serializer};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.serialize_str(&format(value).map_err(serde::ser::Error::custom)?)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;

	parse(&raw).map_err(serde::de::Error::custom)
}

pub fn parse(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
	OffsetDateTime::parse(raw.trim(), &Rfc3339)
}

pub fn format(value: &OffsetDateTime) -> Result<String, time::error::Format> {
	value.format(&Rfc3339)
}

/// Formats a timestamp for messages and logs, falling back to the debug form when RFC 3339 has no
/// representation for it.
pub fn display(value: &OffsetDateTime) -> String {
	format(value).unwrap_or_else(|_| format!("{value:?}"))
}
