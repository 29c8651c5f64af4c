use time::OffsetDateTime;

use hyrank_domain::{Candidate, DemoQuery, Document, ExpectedOutcome, TrapType};

use crate::{Error, Result};

#[derive(Debug, sqlx::FromRow)]
pub struct DocumentRow {
	pub id: String,
	pub title: String,
	pub body: String,
	pub category: Option<String>,
	pub version: Option<String>,
	pub created_at: OffsetDateTime,
	pub published_date: Option<OffsetDateTime>,
	pub is_deprecated: bool,
	pub deprecation_note: Option<String>,
	pub tags: Vec<String>,
	/// pgvector text form, e.g. `[0.1,0.2]`.
	pub embedding: String,
	pub trap_set: Option<String>,
	pub trap_type: Option<String>,
}
impl TryFrom<DocumentRow> for Document {
	type Error = Error;

	fn try_from(row: DocumentRow) -> Result<Self> {
		let trap_type = match row.trap_type.as_deref() {
			Some(raw) => Some(TrapType::parse(raw).ok_or_else(|| {
				Error::InvalidArgument(format!("Document {} has unknown trap_type {raw:?}.", row.id))
			})?),
			None => None,
		};

		Ok(Self {
			embedding: parse_vector(&row.embedding)?,
			id: row.id,
			title: row.title,
			body: row.body,
			category: row.category,
			version: row.version,
			created_at: row.created_at,
			published_date: row.published_date,
			is_deprecated: row.is_deprecated,
			deprecation_note: row.deprecation_note,
			tags: row.tags,
			trap_set: row.trap_set,
			trap_type,
		})
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct CandidateRow {
	pub id: String,
	pub created_at: OffsetDateTime,
	pub score: f64,
}
impl From<CandidateRow> for Candidate {
	fn from(row: CandidateRow) -> Self {
		Self { doc_id: row.id, created_at: row.created_at, score: row.score }
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct DemoQueryRow {
	pub query_text: String,
	pub trap_set: String,
	pub embedding: String,
	pub expected_winner_id: String,
	pub semantic_bait_id: Option<String>,
	pub keyword_bait_id: Option<String>,
	pub temporal_bait_id: Option<String>,
}
impl TryFrom<DemoQueryRow> for DemoQuery {
	type Error = Error;

	fn try_from(row: DemoQueryRow) -> Result<Self> {
		Ok(Self {
			embedding: parse_vector(&row.embedding)?,
			query_text: row.query_text,
			trap_set: row.trap_set,
			expected: ExpectedOutcome {
				winner_id: row.expected_winner_id,
				semantic_bait_id: row.semantic_bait_id,
				keyword_bait_id: row.keyword_bait_id,
				temporal_bait_id: row.temporal_bait_id,
			},
		})
	}
}

/// Renders an embedding as a pgvector literal for a `::text::vector` cast.
pub fn vector_literal(embedding: &[f32]) -> String {
	let values = embedding.iter().map(|value| value.to_string()).collect::<Vec<_>>();

	format!("[{}]", values.join(","))
}

/// Parses pgvector's text output, which is a JSON array of numbers.
pub fn parse_vector(raw: &str) -> Result<Vec<f32>> {
	Ok(serde_json::from_str(raw)?)
}
