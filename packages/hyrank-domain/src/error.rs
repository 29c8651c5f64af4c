/// Invalid ranking parameters. Raised before any retrieval work starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
	#[error("RRF constant k must be a finite number greater than zero; got {0}.")]
	InvalidRrfK(f64),
	#[error("Result size must be zero or greater; got {0}.")]
	NegativeResultSize(i64),
	#[error("{method} fusion weight must be a finite number greater than zero; got {weight}.")]
	InvalidWeight { method: &'static str, weight: f64 },
	#[error("Invalid time window {input:?}: {reason}")]
	InvalidWindow { input: String, reason: String },
	#[error("storage.vector_dim is {configured}, but the store holds {store}-dimensional embeddings.")]
	VectorDimMismatch { configured: u32, store: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
	#[error("Failed to parse corpus fixture: {0}")]
	Parse(#[from] serde_json::Error),
	#[error("Corpus fixture contains no documents.")]
	Empty,
	#[error("Duplicate document key ({id}, {created_at}).")]
	DuplicateKey { id: String, created_at: String },
	#[error("Document {id} has embedding dimension {actual}; expected {expected}.")]
	DimensionMismatch { id: String, expected: usize, actual: usize },
	#[error("Trap set {trap_set} is malformed: {reason}")]
	MalformedTrapSet { trap_set: String, reason: String },
	#[error("Demo query {query:?} is malformed: {reason}")]
	MalformedQuery { query: String, reason: String },
	#[error("Rebasing the corpus to {0} overflows the supported time range.")]
	RebaseOverflow(String),
}
