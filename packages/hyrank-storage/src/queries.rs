use std::collections::BTreeMap;

use hyrank_config::LexicalMatch;
use hyrank_domain::{Candidate, CorpusStats, DemoQuery, DocKey, Document, TimeRange};

use crate::{
	Result,
	db::Db,
	models::{self, CandidateRow, DemoQueryRow, DocumentRow},
};

const DOCUMENT_COLUMNS: &str = "\
id, title, body, category, version, created_at, published_date, is_deprecated, deprecation_note, \
tags, embedding::text AS embedding, trap_set, trap_type";

/// Nearest documents by cosine distance. `score` is the cosine similarity.
pub async fn nearest(db: &Db, embedding: &[f32], limit: u32) -> Result<Vec<Candidate>> {
	let rows: Vec<CandidateRow> = sqlx::query_as(
		"\
SELECT id, created_at, (1 - (embedding <=> $1::text::vector))::float8 AS score
FROM documents
ORDER BY embedding <=> $1::text::vector ASC, id ASC, created_at ASC
LIMIT $2",
	)
	.bind(models::vector_literal(embedding))
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows.into_iter().map(Candidate::from).collect())
}

/// Documents matching the query's lexemes, ranked by `ts_rank` over the weighted search vector.
/// `Any` ORs the lexemes together; `All` uses web-search semantics. A query the `english` parser
/// reduces to no lexemes matches nothing.
pub async fn lexical(
	db: &Db,
	query_text: &str,
	limit: u32,
	mode: LexicalMatch,
) -> Result<Vec<Candidate>> {
	let mode = match mode {
		LexicalMatch::Any => "any",
		LexicalMatch::All => "all",
	};
	let rows: Vec<CandidateRow> = sqlx::query_as(
		"\
WITH q AS (
	SELECT CASE
		WHEN $2 = 'all' THEN websearch_to_tsquery('english', $1)
		ELSE replace(plainto_tsquery('english', $1)::text, ' & ', ' | ')::tsquery
	END AS tsq
)
SELECT d.id, d.created_at, ts_rank(d.search_vector, q.tsq)::float8 AS score
FROM documents d, q
WHERE numnode(q.tsq) > 0 AND d.search_vector @@ q.tsq
ORDER BY score DESC, d.id ASC, d.created_at ASC
LIMIT $3",
	)
	.bind(query_text)
	.bind(mode)
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows.into_iter().map(Candidate::from).collect())
}

/// Keys of documents inside `range` and, when given, in `category`.
pub async fn eligible(
	db: &Db,
	range: Option<&TimeRange>,
	category: Option<&str>,
) -> Result<Vec<DocKey>> {
	let rows: Vec<(String, time::OffsetDateTime)> = sqlx::query_as(
		"\
SELECT id, created_at
FROM documents
WHERE ($1::timestamptz IS NULL OR created_at >= $1)
	AND ($2::timestamptz IS NULL OR created_at <= $2)
	AND ($3::text IS NULL OR category = $3)",
	)
	.bind(range.map(|range| range.start))
	.bind(range.map(|range| range.end))
	.bind(category)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows.into_iter().map(|(id, created_at)| DocKey::new(id, created_at)).collect())
}

/// Latest partition of a document id.
pub async fn get_document(db: &Db, id: &str) -> Result<Option<Document>> {
	let sql = format!(
		"SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1 ORDER BY created_at DESC LIMIT 1"
	);
	let row: Option<DocumentRow> =
		sqlx::query_as(sql.as_str()).bind(id).fetch_optional(&db.pool).await?;

	row.map(Document::try_from).transpose()
}

pub async fn trap_sets(db: &Db) -> Result<Vec<String>> {
	let sets = sqlx::query_scalar(
		"\
SELECT DISTINCT trap_set
FROM documents
WHERE trap_set IS NOT NULL
ORDER BY trap_set",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(sets)
}

/// Quartet members ordered winner, semantic, keyword, temporal.
pub async fn trap_quartet(db: &Db, trap_set: &str) -> Result<Vec<Document>> {
	let sql = format!(
		"\
SELECT {DOCUMENT_COLUMNS}
FROM documents
WHERE trap_set = $1
ORDER BY CASE trap_type
	WHEN 'winner' THEN 1
	WHEN 'semantic_bait' THEN 2
	WHEN 'keyword_bait' THEN 3
	WHEN 'temporal_bait' THEN 4
	ELSE 5
END, id"
	);
	let rows: Vec<DocumentRow> =
		sqlx::query_as(sql.as_str()).bind(trap_set).fetch_all(&db.pool).await?;

	rows.into_iter().map(Document::try_from).collect()
}

pub async fn demo_queries(db: &Db) -> Result<Vec<DemoQuery>> {
	let rows: Vec<DemoQueryRow> = sqlx::query_as(
		"\
SELECT
	query_text,
	trap_set,
	embedding::text AS embedding,
	expected_winner_id,
	semantic_bait_id,
	keyword_bait_id,
	temporal_bait_id
FROM demo_queries
ORDER BY trap_set, query_text",
	)
	.fetch_all(&db.pool)
	.await?;

	rows.into_iter().map(DemoQuery::try_from).collect()
}

pub async fn stats(db: &Db) -> Result<CorpusStats> {
	let documents: i64 =
		sqlx::query_scalar("SELECT count(*) FROM documents").fetch_one(&db.pool).await?;
	let trap_sets: i64 = sqlx::query_scalar(
		"SELECT count(DISTINCT trap_set) FROM documents WHERE trap_set IS NOT NULL",
	)
	.fetch_one(&db.pool)
	.await?;
	let queries: i64 =
		sqlx::query_scalar("SELECT count(*) FROM demo_queries").fetch_one(&db.pool).await?;
	let versions: Vec<(String, i64)> = sqlx::query_as(
		"\
SELECT COALESCE(version, 'unversioned') AS version, count(*)
FROM documents
GROUP BY 1
ORDER BY 1",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(CorpusStats {
		documents: count(documents),
		trap_sets: count(trap_sets),
		queries: count(queries),
		versions: versions
			.into_iter()
			.map(|(version, n)| (version, count(n)))
			.collect::<BTreeMap<_, _>>(),
	})
}

fn count(raw: i64) -> usize {
	usize::try_from(raw).unwrap_or(0)
}
