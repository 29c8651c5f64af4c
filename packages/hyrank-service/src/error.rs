use std::fmt::{Display, Formatter};

use serde::Serialize;

use hyrank_domain::{ConfigurationError, CorpusError};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Retrieval stage that talks to the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
	Vector,
	Lexical,
	Temporal,
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			Self::Vector => "vector",
			Self::Lexical => "lexical",
			Self::Temporal => "temporal",
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetrievalError {
	#[error("{stage} retrieval timed out after {timeout_ms} ms.")]
	Timeout { stage: Stage, timeout_ms: u64 },
	#[error("Query embedding has dimension {actual}; the store expects {expected}.")]
	DimensionMismatch { expected: usize, actual: usize },
	#[error("Malformed {stage} input: {message}")]
	MalformedInput { stage: Stage, message: String },
	#[error("{stage} retrieval failed: {message}")]
	Store { stage: Stage, message: String },
	#[error("Every requested retriever failed. Vector: {vector} Lexical: {lexical}")]
	AllMethodsFailed { vector: Box<RetrievalError>, lexical: Box<RetrievalError> },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Retrieval(#[from] RetrievalError),
	#[error(transparent)]
	Configuration(#[from] ConfigurationError),
	#[error(transparent)]
	Corpus(#[from] CorpusError),
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<hyrank_storage::Error> for Error {
	fn from(err: hyrank_storage::Error) -> Self {
		match err {
			hyrank_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			hyrank_storage::Error::NotFound(message) => Self::NotFound { message },
			other => Self::Storage { message: other.to_string() },
		}
	}
}
