//! In-process document store over a corpus snapshot.
//!
//! Answers the same three queries as the Postgres store: exact cosine nearest neighbours, lexical
//! relevance over precomputed per-document lexeme counts, and creation-range eligibility.

use std::{cmp::Ordering, sync::Arc};

use hyrank_config::LexicalMatch;
use hyrank_domain::{
	Candidate, Corpus, DocKey, Document, TimeRange,
	lexeme::{self, LexicalVector},
};

use crate::{Error, Result};

pub struct MemoryStore {
	corpus: Arc<Corpus>,
	lexical: Vec<LexicalVector>,
}
impl MemoryStore {
	pub fn new(corpus: Arc<Corpus>) -> Self {
		let lexical =
			corpus.documents().iter().map(|doc| LexicalVector::new(&doc.title, &doc.body)).collect();

		Self { corpus, lexical }
	}

	pub fn corpus(&self) -> &Arc<Corpus> {
		&self.corpus
	}

	pub fn vector_dim(&self) -> usize {
		self.corpus.dimension()
	}

	/// Up to `limit` documents by descending cosine similarity, ties by id and then creation time.
	pub fn nearest(&self, embedding: &[f32], limit: u32) -> Result<Vec<Candidate>> {
		if embedding.len() != self.vector_dim() {
			return Err(Error::InvalidArgument(format!(
				"Query embedding has dimension {}; the store holds {}.",
				embedding.len(),
				self.vector_dim()
			)));
		}

		let mut hits = self
			.corpus
			.documents()
			.iter()
			.map(|doc| (doc, cosine_similarity(embedding, &doc.embedding)))
			.collect::<Vec<_>>();

		hits.sort_by(|(a_doc, a), (b_doc, b)| cmp_hits(a_doc, *a, b_doc, *b));

		Ok(take(hits, limit))
	}

	/// Up to `limit` documents with nonzero lexical relevance, best first.
	pub fn lexical(&self, query_text: &str, limit: u32, mode: LexicalMatch) -> Vec<Candidate> {
		let lexemes = lexeme::query_lexemes(query_text);

		if lexemes.is_empty() {
			return Vec::new();
		}

		let mut hits = self
			.corpus
			.documents()
			.iter()
			.zip(&self.lexical)
			.filter_map(|(doc, vector)| vector.relevance(&lexemes, mode).map(|score| (doc, score)))
			.filter(|(_, score)| *score > 0.0)
			.collect::<Vec<_>>();

		hits.sort_by(|(a_doc, a), (b_doc, b)| cmp_hits(a_doc, *a, b_doc, *b));

		take(hits, limit)
	}

	pub fn eligible(&self, range: Option<&TimeRange>, category: Option<&str>) -> Vec<DocKey> {
		self.corpus
			.documents()
			.iter()
			.filter(|doc| range.is_none_or(|range| range.contains(doc.created_at)))
			.filter(|doc| category.is_none_or(|category| doc.category.as_deref() == Some(category)))
			.map(Document::key)
			.collect()
	}
}

/// Cosine similarity in f64. A zero vector is orthogonal to everything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
	let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);

	for (x, y) in a.iter().zip(b) {
		let (x, y) = (f64::from(*x), f64::from(*y));

		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn cmp_hits(a_doc: &Document, a: f64, b_doc: &Document, b: f64) -> Ordering {
	b.total_cmp(&a)
		.then_with(|| a_doc.id.cmp(&b_doc.id))
		.then_with(|| a_doc.created_at.cmp(&b_doc.created_at))
}

fn take(hits: Vec<(&Document, f64)>, limit: u32) -> Vec<Candidate> {
	hits.into_iter()
		.take(limit as usize)
		.map(|(doc, score)| Candidate { doc_id: doc.id.clone(), created_at: doc.created_at, score })
		.collect()
}
