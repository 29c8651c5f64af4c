//! Reciprocal rank fusion over independently scaled ranked lists.

use std::{cmp::Ordering, collections::HashMap};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
	document::DocKey,
	error::ConfigurationError,
	ranked::{Eligibility, Method, RankedList},
};

pub const DEFAULT_RRF_K: f64 = 60.0;

/// Validated fusion parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionParams {
	k: f64,
	result_size: usize,
	vector_weight: f64,
	lexical_weight: f64,
}
impl FusionParams {
	pub fn new(k: f64, result_size: i64) -> Result<Self, ConfigurationError> {
		if !k.is_finite() || k <= 0.0 {
			return Err(ConfigurationError::InvalidRrfK(k));
		}

		Ok(Self {
			k,
			result_size: checked_result_size(result_size)?,
			vector_weight: 1.0,
			lexical_weight: 1.0,
		})
	}

	pub fn with_weights(
		mut self,
		vector_weight: f64,
		lexical_weight: f64,
	) -> Result<Self, ConfigurationError> {
		for (method, weight) in [(Method::Vector, vector_weight), (Method::Lexical, lexical_weight)] {
			if !weight.is_finite() || weight <= 0.0 {
				return Err(ConfigurationError::InvalidWeight { method: method.as_str(), weight });
			}
		}

		self.vector_weight = vector_weight;
		self.lexical_weight = lexical_weight;

		Ok(self)
	}

	pub fn with_result_size(self, result_size: i64) -> Result<Self, ConfigurationError> {
		Ok(Self { result_size: checked_result_size(result_size)?, ..self })
	}

	pub fn k(&self) -> f64 {
		self.k
	}

	pub fn result_size(&self) -> usize {
		self.result_size
	}

	pub fn weight(&self, method: Method) -> f64 {
		match method {
			Method::Vector => self.vector_weight,
			Method::Lexical => self.lexical_weight,
		}
	}

	/// Contribution of a single list position.
	pub fn term(&self, method: Method, rank: u32) -> f64 {
		self.weight(method) / (self.k + f64::from(rank))
	}
}
impl Default for FusionParams {
	fn default() -> Self {
		Self { k: DEFAULT_RRF_K, result_size: 5, vector_weight: 1.0, lexical_weight: 1.0 }
	}
}
impl TryFrom<&hyrank_config::Fusion> for FusionParams {
	type Error = ConfigurationError;

	fn try_from(cfg: &hyrank_config::Fusion) -> Result<Self, Self::Error> {
		Self::new(cfg.rrf_k, cfg.result_size)?.with_weights(cfg.vector_weight, cfg.lexical_weight)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
	pub method: Method,
	/// Rank inside the eligibility-restricted list.
	pub rank: u32,
	pub raw_score: f64,
	pub term: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedEntry {
	/// 1-based position in the fused output.
	pub rank: u32,
	pub doc_id: String,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	pub score: f64,
	pub contributions: Vec<Contribution>,
}
impl FusedEntry {
	pub fn contribution(&self, method: Method) -> Option<&Contribution> {
		self.contributions.iter().find(|contribution| contribution.method == method)
	}
}

/// Why a fused result came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
	/// No input list had any candidate.
	NoCandidates,
	/// Candidates existed, but the eligibility set removed all of them.
	ExcludedByWindow,
	/// The requested result size was zero.
	ZeroResultSize,
}

/// A retrieval method left out of fusion after it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degradation {
	pub method: Method,
	pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
	pub entries: Vec<FusedEntry>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub empty_reason: Option<EmptyReason>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub degraded: Vec<Degradation>,
}
impl FusedResult {
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn top(&self) -> Option<&FusedEntry> {
		self.entries.first()
	}

	pub fn rank_of(&self, doc_id: &str) -> Option<u32> {
		self.entries.iter().find(|entry| entry.doc_id == doc_id).map(|entry| entry.rank)
	}

	pub fn ids(&self) -> Vec<&str> {
		self.entries.iter().map(|entry| entry.doc_id.as_str()).collect()
	}
}

/// Fuses ranked lists with reciprocal rank fusion.
///
/// Each list is first restricted to `eligibility`, which renumbers the surviving entries from 1.
/// Documents are identified by `(doc_id, created_at)`, so two partitions of one id are scored
/// separately. A document's score is the sum of `weight / (k + rank)` over the lists it appears
/// in; absence from a list adds nothing. Output is ordered by score descending, then id
/// ascending, then creation time ascending, and cut to the configured result size. Scores accumulate in list order, so identical inputs produce
/// bit-identical output.
pub fn fuse(lists: &[RankedList], eligibility: &Eligibility, params: &FusionParams) -> FusedResult {
	let had_candidates = lists.iter().any(|list| !list.is_empty());
	let mut fused: HashMap<DocKey, FusedEntry> = HashMap::new();

	for list in lists {
		let restricted = list.restrict(eligibility);

		for entry in restricted.entries {
			let term = params.term(list.method, entry.rank);
			let contribution = Contribution {
				method: list.method,
				rank: entry.rank,
				raw_score: entry.raw_score,
				term,
			};
			let key = DocKey::new(entry.doc_id.clone(), entry.created_at);
			let slot = fused.entry(key).or_insert_with(|| FusedEntry {
				rank: 0,
				doc_id: entry.doc_id,
				created_at: entry.created_at,
				score: 0.0,
				contributions: Vec::new(),
			});

			slot.score += term;
			slot.contributions.push(contribution);
		}
	}

	let eligible_count = fused.len();
	let mut entries = fused.into_values().collect::<Vec<_>>();

	entries.sort_by(cmp_fused);
	entries.truncate(params.result_size());

	for (idx, entry) in entries.iter_mut().enumerate() {
		entry.rank = idx as u32 + 1;
	}

	let empty_reason = if !entries.is_empty() {
		None
	} else if !had_candidates {
		Some(EmptyReason::NoCandidates)
	} else if eligible_count == 0 {
		Some(EmptyReason::ExcludedByWindow)
	} else {
		Some(EmptyReason::ZeroResultSize)
	};

	FusedResult { entries, empty_reason, degraded: Vec::new() }
}

fn checked_result_size(result_size: i64) -> Result<usize, ConfigurationError> {
	usize::try_from(result_size).map_err(|_| ConfigurationError::NegativeResultSize(result_size))
}

fn cmp_fused(a: &FusedEntry, b: &FusedEntry) -> Ordering {
	b.score
		.total_cmp(&a.score)
		.then_with(|| a.doc_id.cmp(&b.doc_id))
		.then_with(|| a.created_at.cmp(&b.created_at))
}
