use std::{future::Future, time::Duration};

use serde::Serialize;
use time::OffsetDateTime;
use tokio::time::Instant;

use hyrank_domain::{Degradation, FusedResult, Method, RankedList, TimeRange, TimeWindow, fusion};

use crate::{HybridService, Result, RetrievalError, retrieval, temporal::TemporalFilter};

/// Which retrievers feed fusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethods {
	VectorOnly,
	LexicalOnly,
	#[default]
	Hybrid,
}
impl SearchMethods {
	pub fn uses(self, method: Method) -> bool {
		match self {
			Self::VectorOnly => method == Method::Vector,
			Self::LexicalOnly => method == Method::Lexical,
			Self::Hybrid => true,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
	pub query_text: String,
	pub embedding: Vec<f32>,
	/// Creation window ending at `as_of`. `None` leaves every document eligible.
	pub time_window: Option<TimeWindow>,
	/// Category constraint. Falls back to `temporal.category` when unset.
	pub category: Option<String>,
	/// Overrides `fusion.result_size`.
	pub result_size: Option<i64>,
	pub methods: SearchMethods,
	/// Instant the window is anchored at. Defaults to the current time.
	pub as_of: Option<OffsetDateTime>,
}
impl SearchRequest {
	pub fn new(query_text: impl Into<String>, embedding: Vec<f32>) -> Self {
		Self {
			query_text: query_text.into(),
			embedding,
			time_window: None,
			category: None,
			result_size: None,
			methods: SearchMethods::Hybrid,
			as_of: None,
		}
	}

	pub fn with_window(mut self, window: Option<TimeWindow>) -> Self {
		self.time_window = window;

		self
	}

	pub fn with_category(mut self, category: impl Into<String>) -> Self {
		self.category = Some(category.into());

		self
	}

	pub fn with_result_size(mut self, result_size: i64) -> Self {
		self.result_size = Some(result_size);

		self
	}

	pub fn with_methods(mut self, methods: SearchMethods) -> Self {
		self.methods = methods;

		self
	}

	pub fn as_of(mut self, now: OffsetDateTime) -> Self {
		self.as_of = Some(now);

		self
	}
}

/// Candidates per retriever before eligibility; `None` for a retriever that did not run or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CandidateCounts {
	pub vector: Option<usize>,
	pub lexical: Option<usize>,
}

/// Elapsed wall time per stage, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct StageTimings {
	pub vector_ms: f64,
	pub lexical_ms: f64,
	pub temporal_ms: f64,
	pub fusion_ms: f64,
	pub total_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
	pub trace_id: uuid::Uuid,
	pub methods: SearchMethods,
	pub result: FusedResult,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub window: Option<TimeRange>,
	/// Size of the eligibility set; `None` when unrestricted.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub eligible: Option<usize>,
	pub candidates: CandidateCounts,
	/// Retriever output before eligibility, in vector then lexical order.
	pub lists: Vec<RankedList>,
	pub timings: StageTimings,
}

impl HybridService {
	/// Runs the requested retrievers and the temporal filter concurrently, then fuses whatever
	/// survived.
	///
	/// A single failed retriever is recorded in `result.degraded` and the other list is fused
	/// alone. When every requested retriever fails the error is returned. A temporal filter
	/// failure is always an error.
	pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
		let started = Instant::now();
		let params = match request.result_size {
			Some(result_size) => self.params().with_result_size(result_size)?,
			None => *self.params(),
		};
		let now = request.as_of.unwrap_or_else(OffsetDateTime::now_utc);
		let category = request.category.clone().or_else(|| self.cfg.temporal.category.clone());
		let filter = TemporalFilter::new(request.time_window, category);
		let range = filter.range(now)?;
		let timeout = Duration::from_millis(self.cfg.retrieval.timeout_ms);
		let candidate_k = self.cfg.retrieval.candidate_k;
		let mode = self.cfg.retrieval.lexical_match;
		let store = self.store.as_ref();
		let vector = timed(async {
			if !request.methods.uses(Method::Vector) {
				return None;
			}

			Some(retrieval::vector(store, &request.embedding, candidate_k, timeout).await)
		});
		let lexical = timed(async {
			if !request.methods.uses(Method::Lexical) {
				return None;
			}

			Some(retrieval::lexical(store, &request.query_text, candidate_k, mode, timeout).await)
		});
		let eligibility = timed(filter.eligibility(store, range.as_ref(), timeout));
		let ((vector, vector_ms), (lexical, lexical_ms), (eligibility, temporal_ms)) =
			tokio::join!(vector, lexical, eligibility);
		let eligibility = eligibility?;
		let candidates = CandidateCounts {
			vector: successful_len(&vector),
			lexical: successful_len(&lexical),
		};
		let (lists, degraded) = settle(vector, lexical)?;
		let fusion_started = Instant::now();
		let mut result = fusion::fuse(&lists, &eligibility, &params);
		let fusion_ms = elapsed_ms(fusion_started);

		result.degraded = degraded;

		tracing::debug!(
			entries = result.entries.len(),
			eligible = eligibility.len(),
			degraded = result.degraded.len(),
			"Search finished."
		);

		Ok(SearchResponse {
			trace_id: uuid::Uuid::new_v4(),
			methods: request.methods,
			result,
			window: range,
			eligible: eligibility.len(),
			candidates,
			lists,
			timings: StageTimings {
				vector_ms,
				lexical_ms,
				temporal_ms,
				fusion_ms,
				total_ms: elapsed_ms(started),
			},
		})
	}
}

type Outcome = Option<Result<RankedList, RetrievalError>>;

/// Splits retriever outcomes into lists to fuse and degradations to report.
fn settle(
	vector: Outcome,
	lexical: Outcome,
) -> Result<(Vec<RankedList>, Vec<Degradation>), RetrievalError> {
	match (vector, lexical) {
		(Some(Err(vector)), Some(Err(lexical))) => Err(RetrievalError::AllMethodsFailed {
			vector: Box::new(vector),
			lexical: Box::new(lexical),
		}),
		(Some(Err(err)), None) | (None, Some(Err(err))) => Err(err),
		(vector, lexical) => {
			let mut lists = Vec::new();
			let mut degraded = Vec::new();

			for (method, outcome) in [(Method::Vector, vector), (Method::Lexical, lexical)] {
				match outcome {
					Some(Ok(list)) => lists.push(list),
					Some(Err(err)) => {
						tracing::warn!(
							method = %method,
							error = %err,
							"Retriever failed. Fusing the remaining list."
						);

						degraded.push(Degradation { method, reason: err.to_string() });
					},
					None => {},
				}
			}

			Ok((lists, degraded))
		},
	}
}

fn successful_len(outcome: &Outcome) -> Option<usize> {
	match outcome {
		Some(Ok(list)) => Some(list.len()),
		_ => None,
	}
}

async fn timed<F>(future: F) -> (F::Output, f64)
where
	F: Future,
{
	let started = Instant::now();
	let output = future.await;

	(output, elapsed_ms(started))
}

fn elapsed_ms(started: Instant) -> f64 {
	started.elapsed().as_secs_f64() * 1_000.0
}
