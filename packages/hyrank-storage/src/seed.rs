use serde_json::json;

use hyrank_domain::{Corpus, DemoQuery, Document};

use crate::{Error, Result, db::Db, models};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
	pub version: String,
	pub documents_inserted: u64,
	pub queries_inserted: u64,
	/// True when this corpus version was already present and nothing was written.
	pub already_seeded: bool,
}
impl SeedReport {
	pub fn to_json(&self) -> serde_json::Value {
		json!({
			"version": self.version,
			"documents_inserted": self.documents_inserted,
			"queries_inserted": self.queries_inserted,
			"already_seeded": self.already_seeded,
		})
	}
}

/// Writes a rebased corpus snapshot once per fixture version.
///
/// The version row is the guard: rebasing happens before seeding, so writing the same fixture at a
/// later instant would otherwise create second partitions of every document.
pub async fn seed_corpus(db: &Db, corpus: &Corpus, vector_dim: u32) -> Result<SeedReport> {
	if corpus.dimension() != vector_dim as usize {
		return Err(Error::InvalidArgument(format!(
			"Corpus embedding dimension {} does not match storage.vector_dim {vector_dim}.",
			corpus.dimension()
		)));
	}

	let mut tx = db.pool.begin().await?;
	let inserted = sqlx::query(
		"\
INSERT INTO corpus_versions (version, name, reference_time)
VALUES ($1, $2, $3)
ON CONFLICT (version) DO NOTHING",
	)
	.bind(corpus.version())
	.bind(corpus.name())
	.bind(corpus.reference_time())
	.execute(&mut *tx)
	.await?
	.rows_affected();

	if inserted == 0 {
		tx.rollback().await?;

		tracing::info!(version = corpus.version(), "Corpus version already seeded.");

		return Ok(SeedReport {
			version: corpus.version().to_string(),
			documents_inserted: 0,
			queries_inserted: 0,
			already_seeded: true,
		});
	}

	let mut documents_inserted = 0;
	let mut queries_inserted = 0;

	for doc in corpus.documents() {
		documents_inserted += insert_document(&mut *tx, doc).await?;
	}
	for query in corpus.queries() {
		queries_inserted += insert_demo_query(&mut *tx, query).await?;
	}

	tx.commit().await?;

	tracing::info!(
		version = corpus.version(),
		documents_inserted,
		queries_inserted,
		"Corpus seeded."
	);

	Ok(SeedReport {
		version: corpus.version().to_string(),
		documents_inserted,
		queries_inserted,
		already_seeded: false,
	})
}

async fn insert_document(tx: &mut sqlx::PgConnection, doc: &Document) -> Result<u64> {
	let result = sqlx::query(
		"\
INSERT INTO documents (
	id,
	title,
	body,
	category,
	version,
	created_at,
	published_date,
	is_deprecated,
	deprecation_note,
	tags,
	embedding,
	trap_set,
	trap_type
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11::text::vector, $12, $13)
ON CONFLICT (id, created_at) DO NOTHING",
	)
	.bind(doc.id.as_str())
	.bind(doc.title.as_str())
	.bind(doc.body.as_str())
	.bind(doc.category.as_deref())
	.bind(doc.version.as_deref())
	.bind(doc.created_at)
	.bind(doc.published_date)
	.bind(doc.is_deprecated)
	.bind(doc.deprecation_note.as_deref())
	.bind(&doc.tags)
	.bind(models::vector_literal(&doc.embedding))
	.bind(doc.trap_set.as_deref())
	.bind(doc.trap_type.map(|trap_type| trap_type.as_str()))
	.execute(tx)
	.await?;

	Ok(result.rows_affected())
}

async fn insert_demo_query(tx: &mut sqlx::PgConnection, query: &DemoQuery) -> Result<u64> {
	let result = sqlx::query(
		"\
INSERT INTO demo_queries (
	query_text,
	trap_set,
	embedding,
	expected_winner_id,
	semantic_bait_id,
	keyword_bait_id,
	temporal_bait_id
)
VALUES ($1, $2, $3::text::vector, $4, $5, $6, $7)
ON CONFLICT (query_text) DO NOTHING",
	)
	.bind(query.query_text.as_str())
	.bind(query.trap_set.as_str())
	.bind(models::vector_literal(&query.embedding))
	.bind(query.expected.winner_id.as_str())
	.bind(query.expected.semantic_bait_id.as_deref())
	.bind(query.expected.keyword_bait_id.as_deref())
	.bind(query.expected.temporal_bait_id.as_deref())
	.execute(tx)
	.await?;

	Ok(result.rows_affected())
}
