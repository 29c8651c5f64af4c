//! Immutable, versioned trap corpus loaded once and shared as a read-only snapshot.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
	document::{Document, TrapType},
	error::CorpusError,
	trap::ExpectedOutcome,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoQuery {
	pub query_text: String,
	pub trap_set: String,
	pub embedding: Vec<f32>,
	pub expected: ExpectedOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStats {
	pub documents: usize,
	pub trap_sets: usize,
	pub queries: usize,
	/// Document count per version label; unversioned documents are counted under "unversioned".
	pub versions: BTreeMap<String, usize>,
}

#[derive(Debug, Deserialize)]
struct FixtureFile {
	name: String,
	#[serde(with = "crate::time_serde")]
	reference_time: OffsetDateTime,
	documents: Vec<Document>,
	#[serde(default)]
	queries: Vec<DemoQuery>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
	name: String,
	version: String,
	reference_time: OffsetDateTime,
	documents: Vec<Document>,
	queries: Vec<DemoQuery>,
}
impl Corpus {
	/// Parses and validates a fixture. The version is the blake3 digest of the raw bytes, so it
	/// identifies the fixture independent of any later rebasing.
	pub fn from_json(raw: &str) -> Result<Self, CorpusError> {
		let fixture: FixtureFile = serde_json::from_str(raw)?;
		let corpus = Self {
			name: fixture.name,
			version: blake3::hash(raw.as_bytes()).to_hex().to_string(),
			reference_time: fixture.reference_time,
			documents: fixture.documents,
			queries: fixture.queries,
		};

		corpus.validate()?;

		Ok(corpus)
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn version(&self) -> &str {
		&self.version
	}

	pub fn reference_time(&self) -> OffsetDateTime {
		self.reference_time
	}

	pub fn documents(&self) -> &[Document] {
		&self.documents
	}

	pub fn queries(&self) -> &[DemoQuery] {
		&self.queries
	}

	/// Embedding dimension shared by every document and query.
	pub fn dimension(&self) -> usize {
		self.documents.first().map(|doc| doc.embedding.len()).unwrap_or(0)
	}

	/// Shifts every timestamp by `now - reference_time`, keeping the fixture's relative ages. The
	/// result's reference time is `now`, so rebasing twice to the same instant is a no-op.
	pub fn rebased(&self, now: OffsetDateTime) -> Result<Self, CorpusError> {
		let offset = now - self.reference_time;
		let overflow = || CorpusError::RebaseOverflow(crate::time_serde::display(&now));
		let mut documents = Vec::with_capacity(self.documents.len());

		for doc in &self.documents {
			let mut doc = doc.clone();

			doc.created_at = doc.created_at.checked_add(offset).ok_or_else(overflow)?;
			doc.published_date = match doc.published_date {
				Some(published) => Some(published.checked_add(offset).ok_or_else(overflow)?),
				None => None,
			};

			documents.push(doc);
		}

		Ok(Self {
			name: self.name.clone(),
			version: self.version.clone(),
			reference_time: now,
			documents,
			queries: self.queries.clone(),
		})
	}

	/// Latest partition of a document id.
	pub fn document(&self, id: &str) -> Option<&Document> {
		self.documents.iter().filter(|doc| doc.id == id).max_by_key(|doc| doc.created_at)
	}

	pub fn trap_sets(&self) -> Vec<&str> {
		let mut sets = self
			.documents
			.iter()
			.filter_map(|doc| doc.trap_set.as_deref())
			.collect::<Vec<_>>();

		sets.sort_unstable();
		sets.dedup();

		sets
	}

	/// Quartet members ordered winner, semantic, keyword, temporal.
	pub fn trap_quartet(&self, trap_set: &str) -> Vec<&Document> {
		let mut members = self
			.documents
			.iter()
			.filter(|doc| doc.trap_set.as_deref() == Some(trap_set))
			.collect::<Vec<_>>();

		members.sort_by_key(|doc| doc.trap_type);

		members
	}

	pub fn query(&self, query_text: &str) -> Option<&DemoQuery> {
		self.queries.iter().find(|query| query.query_text == query_text)
	}

	pub fn stats(&self) -> CorpusStats {
		let mut versions = BTreeMap::new();

		for doc in &self.documents {
			let version = doc.version.clone().unwrap_or_else(|| "unversioned".to_string());

			*versions.entry(version).or_insert(0) += 1;
		}

		CorpusStats {
			documents: self.documents.len(),
			trap_sets: self.trap_sets().len(),
			queries: self.queries.len(),
			versions,
		}
	}

	fn validate(&self) -> Result<(), CorpusError> {
		let Some(first) = self.documents.first() else {
			return Err(CorpusError::Empty);
		};
		let expected = first.embedding.len();
		let mut keys = HashSet::new();

		for doc in &self.documents {
			if !keys.insert(doc.key()) {
				return Err(CorpusError::DuplicateKey {
					id: doc.id.clone(),
					created_at: crate::time_serde::display(&doc.created_at),
				});
			}
			if doc.embedding.len() != expected || expected == 0 {
				return Err(CorpusError::DimensionMismatch {
					id: doc.id.clone(),
					expected,
					actual: doc.embedding.len(),
				});
			}
			if doc.trap_set.is_some() != doc.trap_type.is_some() {
				return Err(CorpusError::MalformedTrapSet {
					trap_set: doc.trap_set.clone().unwrap_or_default(),
					reason: format!("document {} must carry both trap_set and trap_type", doc.id),
				});
			}
		}

		for trap_set in self.trap_sets() {
			let members = self.trap_quartet(trap_set);
			let types = members.iter().filter_map(|doc| doc.trap_type).collect::<Vec<_>>();

			if types != TrapType::ALL {
				return Err(CorpusError::MalformedTrapSet {
					trap_set: trap_set.to_string(),
					reason: format!(
						"expected exactly one winner, semantic_bait, keyword_bait and temporal_bait; found {}",
						types.iter().map(|trap_type| trap_type.as_str()).collect::<Vec<_>>().join(", ")
					),
				});
			}
		}

		let mut texts = HashSet::new();

		for query in &self.queries {
			let malformed = |reason: String| CorpusError::MalformedQuery {
				query: query.query_text.clone(),
				reason,
			};

			if !texts.insert(query.query_text.as_str()) {
				return Err(malformed("query text is not unique".to_string()));
			}
			if query.embedding.len() != expected {
				return Err(malformed(format!(
					"embedding dimension {} does not match document dimension {expected}",
					query.embedding.len()
				)));
			}

			let members = self.trap_quartet(&query.trap_set);

			if members.is_empty() {
				return Err(malformed(format!("trap set {} does not exist", query.trap_set)));
			}

			for trap_type in TrapType::ALL {
				let Some(id) = query.expected.id_for(trap_type) else {
					continue;
				};

				if !members.iter().any(|doc| doc.id == id && doc.trap_type == Some(trap_type)) {
					return Err(malformed(format!(
						"{id} is not the {trap_type} of trap set {}",
						query.trap_set
					)));
				}
			}
		}

		Ok(())
	}
}
