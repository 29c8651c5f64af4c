use serde::{Deserialize as _, Deserializer, Serializer};
use time::OffsetDateTime;

pub fn serialize<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let Some(value) = value else {
		return serializer.serialize_none();
	};

	super::serialize(value, serializer)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
	D: Deserializer<'de>,
{
	Option::<String>::deserialize(deserializer)?
		.map(|raw| super::parse(&raw).map_err(serde::de::Error::custom))
		.transpose()
}
