pub mod retrieval;
pub mod search;
pub mod stores;
pub mod temporal;

mod error;

pub use error::{Error, Result, RetrievalError, Stage};
pub use search::{CandidateCounts, SearchMethods, SearchRequest, SearchResponse, StageTimings};
pub use stores::{Backend, PostgresStore, load_fixture, open_backend, seed_postgres};
pub use temporal::TemporalFilter;

use std::{future::Future, pin::Pin, sync::Arc};

use hyrank_config::{Config, LexicalMatch};
use hyrank_domain::{
	Candidate, CorpusStats, DemoQuery, DocKey, Document, ExpectedOutcome, FusedResult,
	FusionParams, TimeRange, TimeWindow, TrapVerdict, trap,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type StoreResult<T> = hyrank_storage::Result<T>;

/// The three read queries the ranking engine consumes from a document store.
pub trait DocumentStore
where
	Self: Send + Sync,
{
	/// Embedding dimension of stored documents.
	fn vector_dim(&self) -> usize;

	/// Up to `limit` hits ordered by increasing cosine distance. `score` is the similarity.
	fn nearest<'a>(
		&'a self,
		embedding: &'a [f32],
		limit: u32,
	) -> BoxFuture<'a, StoreResult<Vec<Candidate>>>;

	/// Up to `limit` hits with lexical overlap, ordered by decreasing relevance. Text that the
	/// store's analyzer reduces to no terms yields no hits rather than an error.
	fn lexical<'a>(
		&'a self,
		query_text: &'a str,
		limit: u32,
		mode: LexicalMatch,
	) -> BoxFuture<'a, StoreResult<Vec<Candidate>>>;

	/// Keys of documents created inside `range` (all documents when `None`), optionally restricted
	/// to one category.
	fn eligible<'a>(
		&'a self,
		range: Option<&'a TimeRange>,
		category: Option<&'a str>,
	) -> BoxFuture<'a, StoreResult<Vec<DocKey>>>;
}

/// Read-only fixture lookups used by the demo and evaluation drivers.
pub trait Catalog
where
	Self: Send + Sync,
{
	fn document<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Option<Document>>>;

	fn trap_sets(&self) -> BoxFuture<'_, StoreResult<Vec<String>>>;

	fn trap_quartet<'a>(&'a self, trap_set: &'a str) -> BoxFuture<'a, StoreResult<Vec<Document>>>;

	fn demo_queries(&self) -> BoxFuture<'_, StoreResult<Vec<DemoQuery>>>;

	fn stats(&self) -> BoxFuture<'_, StoreResult<CorpusStats>>;
}

pub struct HybridService {
	pub cfg: Config,
	pub store: Arc<dyn DocumentStore>,
	params: FusionParams,
	default_window: Option<TimeWindow>,
}
impl HybridService {
	/// Validates fusion parameters and the configured default window before any ranking happens.
	pub fn new(cfg: Config, store: Arc<dyn DocumentStore>) -> Result<Self> {
		let params = FusionParams::try_from(&cfg.fusion)?;
		let default_window =
			cfg.temporal.default_window.as_deref().map(str::parse::<TimeWindow>).transpose()?;

		if store.vector_dim() != cfg.storage.vector_dim as usize {
			return Err(Error::Configuration(hyrank_domain::ConfigurationError::VectorDimMismatch {
				configured: cfg.storage.vector_dim,
				store: store.vector_dim(),
			}));
		}

		Ok(Self { cfg, store, params, default_window })
	}

	pub fn params(&self) -> &FusionParams {
		&self.params
	}

	/// Window from `temporal.default_window`, used by the time-filtered search method.
	pub fn default_window(&self) -> Option<TimeWindow> {
		self.default_window
	}

	pub fn evaluate(&self, result: &FusedResult, expected: &ExpectedOutcome) -> TrapVerdict {
		trap::evaluate(result, expected)
	}
}
