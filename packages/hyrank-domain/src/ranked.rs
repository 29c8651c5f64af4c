use std::{
	collections::HashSet,
	fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::document::DocKey;

/// Retrieval method that produced a ranked list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
	Vector,
	Lexical,
}
impl Method {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Vector => "vector",
			Self::Lexical => "lexical",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Unranked store hit. `score` is higher-is-better for both methods: cosine similarity for vector
/// hits and lexical relevance for lexical hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
	pub doc_id: String,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	pub score: f64,
}
impl Candidate {
	pub fn key(&self) -> DocKey {
		DocKey::new(self.doc_id.clone(), self.created_at)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
	pub doc_id: String,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	/// 1-based position in the list.
	pub rank: u32,
	pub raw_score: f64,
}

/// Ordered retriever output. Keys are unique and ranks run 1, 2, 3, ... without gaps. One id may
/// appear once per partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedList {
	pub method: Method,
	pub entries: Vec<RankedEntry>,
}
impl RankedList {
	pub fn empty(method: Method) -> Self {
		Self { method, entries: Vec::new() }
	}

	/// Builds a list from candidates that are already in rank order. Later duplicates of a
	/// `(doc_id, created_at)` key are dropped.
	pub fn from_ordered<I>(method: Method, candidates: I) -> Self
	where
		I: IntoIterator<Item = Candidate>,
	{
		let mut seen = HashSet::new();
		let mut entries = Vec::new();

		for candidate in candidates {
			if !seen.insert(candidate.key()) {
				continue;
			}

			let rank = entries.len() as u32 + 1;

			entries.push(RankedEntry {
				doc_id: candidate.doc_id,
				created_at: candidate.created_at,
				rank,
				raw_score: candidate.score,
			});
		}

		Self { method, entries }
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn rank_of(&self, doc_id: &str) -> Option<u32> {
		self.entries.iter().find(|entry| entry.doc_id == doc_id).map(|entry| entry.rank)
	}

	/// Keeps only eligible entries, preserving order and renumbering ranks from 1. Ranking the
	/// survivors this way matches a retriever that filtered before ranking.
	pub fn restrict(&self, eligibility: &Eligibility) -> Self {
		let entries = self
			.entries
			.iter()
			.filter(|entry| eligibility.admits(&entry.doc_id, entry.created_at))
			.cloned()
			.map(|entry| Candidate {
				doc_id: entry.doc_id,
				created_at: entry.created_at,
				score: entry.raw_score,
			});

		Self::from_ordered(self.method, entries)
	}
}

/// Documents allowed to contribute to fusion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Eligibility {
	/// No temporal or category constraint.
	#[default]
	All,
	Only(HashSet<DocKey>),
}
impl Eligibility {
	pub fn only<I>(keys: I) -> Self
	where
		I: IntoIterator<Item = DocKey>,
	{
		Self::Only(keys.into_iter().collect())
	}

	pub fn none() -> Self {
		Self::Only(HashSet::new())
	}

	pub fn admits(&self, doc_id: &str, created_at: OffsetDateTime) -> bool {
		match self {
			Self::All => true,
			Self::Only(keys) => keys.contains(&DocKey::new(doc_id, created_at)),
		}
	}

	/// Number of eligible keys, or `None` when unrestricted.
	pub fn len(&self) -> Option<usize> {
		match self {
			Self::All => None,
			Self::Only(keys) => Some(keys.len()),
		}
	}
}
