//! Vector and lexical retrievers: one bounded store call each, shaped into a ranked list.

use std::{cmp::Ordering, future::Future, time::Duration};

use hyrank_config::LexicalMatch;
use hyrank_domain::{Candidate, Method, RankedList};

use crate::{DocumentStore, RetrievalError, Stage, StoreResult};

/// Runs one store call under `timeout`, mapping failures to the stage that issued it.
pub(crate) async fn bounded<T, F>(
	stage: Stage,
	timeout: Duration,
	call: F,
) -> Result<T, RetrievalError>
where
	F: Future<Output = StoreResult<T>>,
{
	match tokio::time::timeout(timeout, call).await {
		Ok(Ok(value)) => Ok(value),
		Ok(Err(err)) => Err(RetrievalError::Store { stage, message: err.to_string() }),
		Err(_) => Err(RetrievalError::Timeout {
			stage,
			timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
		}),
	}
}

pub async fn vector(
	store: &dyn DocumentStore,
	embedding: &[f32],
	candidate_k: u32,
	timeout: Duration,
) -> Result<RankedList, RetrievalError> {
	let expected = store.vector_dim();

	if embedding.len() != expected {
		return Err(RetrievalError::DimensionMismatch { expected, actual: embedding.len() });
	}
	if embedding.iter().any(|value| !value.is_finite()) {
		return Err(RetrievalError::MalformedInput {
			stage: Stage::Vector,
			message: "query embedding contains a non-finite value".to_string(),
		});
	}

	let candidates = bounded(Stage::Vector, timeout, store.nearest(embedding, candidate_k)).await?;
	let list = rank_vector(candidates, candidate_k);

	tracing::debug!(candidates = list.len(), "Vector retrieval finished.");

	Ok(list)
}

/// Whether the query text has any searchable terms is up to the store's analyzer; text it reduces
/// to nothing comes back as an empty list.
pub async fn lexical(
	store: &dyn DocumentStore,
	query_text: &str,
	candidate_k: u32,
	mode: LexicalMatch,
	timeout: Duration,
) -> Result<RankedList, RetrievalError> {
	let candidates =
		bounded(Stage::Lexical, timeout, store.lexical(query_text, candidate_k, mode)).await?;
	let list = rank_lexical(candidates, candidate_k);

	tracing::debug!(candidates = list.len(), "Lexical retrieval finished.");

	Ok(list)
}

/// Orders store hits by similarity, breaking ties by id, and keeps the first `candidate_k`.
pub fn rank_vector(candidates: Vec<Candidate>, candidate_k: u32) -> RankedList {
	shape(Method::Vector, candidates.into_iter().filter(|hit| hit.score.is_finite()), candidate_k)
}

/// Like [`rank_vector`], but hits without positive relevance are dropped rather than ranked last.
pub fn rank_lexical(candidates: Vec<Candidate>, candidate_k: u32) -> RankedList {
	shape(
		Method::Lexical,
		candidates.into_iter().filter(|hit| hit.score.is_finite() && hit.score > 0.0),
		candidate_k,
	)
}

fn shape<I>(method: Method, candidates: I, candidate_k: u32) -> RankedList
where
	I: Iterator<Item = Candidate>,
{
	let mut candidates = candidates.collect::<Vec<_>>();

	candidates.sort_by(cmp_candidates);

	let mut list = RankedList::from_ordered(method, candidates);

	list.entries.truncate(candidate_k as usize);

	list
}

fn cmp_candidates(a: &Candidate, b: &Candidate) -> Ordering {
	b.score
		.total_cmp(&a.score)
		.then_with(|| a.doc_id.cmp(&b.doc_id))
		.then_with(|| a.created_at.cmp(&b.created_at))
}
