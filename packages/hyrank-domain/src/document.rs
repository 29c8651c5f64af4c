use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Role a document plays inside its trap quartet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrapType {
	Winner,
	SemanticBait,
	KeywordBait,
	TemporalBait,
}
impl TrapType {
	pub const ALL: [TrapType; 4] =
		[Self::Winner, Self::SemanticBait, Self::KeywordBait, Self::TemporalBait];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Winner => "winner",
			Self::SemanticBait => "semantic_bait",
			Self::KeywordBait => "keyword_bait",
			Self::TemporalBait => "temporal_bait",
		}
	}

	/// Short label for reports, e.g. "Trapped by semantic".
	pub fn label(self) -> &'static str {
		match self {
			Self::Winner => "winner",
			Self::SemanticBait => "semantic",
			Self::KeywordBait => "keyword",
			Self::TemporalBait => "temporal",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|trap_type| trap_type.as_str() == raw)
	}
}
impl Display for TrapType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Storage identity of a document. The same `id` may exist in several time partitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocKey {
	pub id: String,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}
impl DocKey {
	pub fn new(id: impl Into<String>, created_at: OffsetDateTime) -> Self {
		Self { id: id.into(), created_at }
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
	pub id: String,
	pub title: String,
	pub body: String,
	#[serde(default)]
	pub category: Option<String>,
	#[serde(default)]
	pub version: Option<String>,
	/// Partitioning and filtering key.
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	/// Display only. Never used for eligibility.
	#[serde(default, with = "crate::time_serde::option")]
	pub published_date: Option<OffsetDateTime>,
	#[serde(default)]
	pub is_deprecated: bool,
	#[serde(default)]
	pub deprecation_note: Option<String>,
	#[serde(default)]
	pub tags: Vec<String>,
	pub embedding: Vec<f32>,
	#[serde(default)]
	pub trap_set: Option<String>,
	#[serde(default)]
	pub trap_type: Option<TrapType>,
}
impl Document {
	pub fn key(&self) -> DocKey {
		DocKey::new(self.id.clone(), self.created_at)
	}
}
