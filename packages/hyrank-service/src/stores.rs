//! Store adapters behind [`DocumentStore`] and [`Catalog`], plus backend selection from config.

use std::{fs, sync::Arc};

use time::OffsetDateTime;

use hyrank_config::{Config, LexicalMatch, StorageBackend};
use hyrank_domain::{Candidate, Corpus, CorpusStats, DemoQuery, DocKey, Document, TimeRange};
use hyrank_storage::{
	db::Db,
	memory::MemoryStore,
	queries,
	seed::{self, SeedReport},
};

use crate::{BoxFuture, Catalog, DocumentStore, Error, Result, StoreResult};

impl DocumentStore for MemoryStore {
	fn vector_dim(&self) -> usize {
		MemoryStore::vector_dim(self)
	}

	fn nearest<'a>(
		&'a self,
		embedding: &'a [f32],
		limit: u32,
	) -> BoxFuture<'a, StoreResult<Vec<Candidate>>> {
		Box::pin(async move { MemoryStore::nearest(self, embedding, limit) })
	}

	fn lexical<'a>(
		&'a self,
		query_text: &'a str,
		limit: u32,
		mode: LexicalMatch,
	) -> BoxFuture<'a, StoreResult<Vec<Candidate>>> {
		Box::pin(async move { Ok(MemoryStore::lexical(self, query_text, limit, mode)) })
	}

	fn eligible<'a>(
		&'a self,
		range: Option<&'a TimeRange>,
		category: Option<&'a str>,
	) -> BoxFuture<'a, StoreResult<Vec<DocKey>>> {
		Box::pin(async move { Ok(MemoryStore::eligible(self, range, category)) })
	}
}

impl Catalog for MemoryStore {
	fn document<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Option<Document>>> {
		Box::pin(async move { Ok(self.corpus().document(id).cloned()) })
	}

	fn trap_sets(&self) -> BoxFuture<'_, StoreResult<Vec<String>>> {
		Box::pin(async move {
			Ok(self.corpus().trap_sets().into_iter().map(str::to_string).collect())
		})
	}

	fn trap_quartet<'a>(&'a self, trap_set: &'a str) -> BoxFuture<'a, StoreResult<Vec<Document>>> {
		Box::pin(async move {
			Ok(self.corpus().trap_quartet(trap_set).into_iter().cloned().collect())
		})
	}

	fn demo_queries(&self) -> BoxFuture<'_, StoreResult<Vec<DemoQuery>>> {
		Box::pin(async move { Ok(self.corpus().queries().to_vec()) })
	}

	fn stats(&self) -> BoxFuture<'_, StoreResult<CorpusStats>> {
		Box::pin(async move { Ok(self.corpus().stats()) })
	}
}

pub struct PostgresStore {
	pub db: Db,
	vector_dim: u32,
}
impl PostgresStore {
	/// Connects and applies the schema for `vector_dim`.
	pub async fn open(cfg: &hyrank_config::Postgres, vector_dim: u32) -> Result<Self> {
		let db = Db::connect(cfg).await?;

		db.ensure_schema(vector_dim).await?;

		Ok(Self { db, vector_dim })
	}

	pub async fn seed(&self, corpus: &Corpus) -> Result<SeedReport> {
		Ok(seed::seed_corpus(&self.db, corpus, self.vector_dim).await?)
	}
}
impl DocumentStore for PostgresStore {
	fn vector_dim(&self) -> usize {
		self.vector_dim as usize
	}

	fn nearest<'a>(
		&'a self,
		embedding: &'a [f32],
		limit: u32,
	) -> BoxFuture<'a, StoreResult<Vec<Candidate>>> {
		Box::pin(queries::nearest(&self.db, embedding, limit))
	}

	fn lexical<'a>(
		&'a self,
		query_text: &'a str,
		limit: u32,
		mode: LexicalMatch,
	) -> BoxFuture<'a, StoreResult<Vec<Candidate>>> {
		Box::pin(queries::lexical(&self.db, query_text, limit, mode))
	}

	fn eligible<'a>(
		&'a self,
		range: Option<&'a TimeRange>,
		category: Option<&'a str>,
	) -> BoxFuture<'a, StoreResult<Vec<DocKey>>> {
		Box::pin(queries::eligible(&self.db, range, category))
	}
}
impl Catalog for PostgresStore {
	fn document<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Option<Document>>> {
		Box::pin(queries::get_document(&self.db, id))
	}

	fn trap_sets(&self) -> BoxFuture<'_, StoreResult<Vec<String>>> {
		Box::pin(queries::trap_sets(&self.db))
	}

	fn trap_quartet<'a>(&'a self, trap_set: &'a str) -> BoxFuture<'a, StoreResult<Vec<Document>>> {
		Box::pin(queries::trap_quartet(&self.db, trap_set))
	}

	fn demo_queries(&self) -> BoxFuture<'_, StoreResult<Vec<DemoQuery>>> {
		Box::pin(queries::demo_queries(&self.db))
	}

	fn stats(&self) -> BoxFuture<'_, StoreResult<CorpusStats>> {
		Box::pin(queries::stats(&self.db))
	}
}

/// A configured store seen through both seams.
#[derive(Clone)]
pub struct Backend {
	pub store: Arc<dyn DocumentStore>,
	pub catalog: Arc<dyn Catalog>,
}

/// Reads the configured fixture and rebases it so its reference time lands on `now`.
pub fn load_fixture(cfg: &Config, now: OffsetDateTime) -> Result<Corpus> {
	let raw = fs::read_to_string(&cfg.storage.fixture).map_err(|err| Error::NotFound {
		message: format!("Failed to read fixture {}: {err}", cfg.storage.fixture.display()),
	})?;
	let corpus = Corpus::from_json(&raw)?.rebased(now)?;

	Ok(corpus)
}

/// Opens the configured backend. The memory backend rebases the fixture to `now`; the Postgres
/// backend serves whatever was seeded.
pub async fn open_backend(cfg: &Config, now: OffsetDateTime) -> Result<Backend> {
	match cfg.storage.backend {
		StorageBackend::Memory => {
			let corpus = load_fixture(cfg, now)?;
			let store = Arc::new(MemoryStore::new(Arc::new(corpus)));

			tracing::info!(documents = store.corpus().documents().len(), "Memory backend ready.");

			Ok(Backend { store: store.clone(), catalog: store })
		},
		StorageBackend::Postgres => {
			let store = Arc::new(open_postgres(cfg).await?);

			tracing::info!("Postgres backend ready.");

			Ok(Backend { store: store.clone(), catalog: store })
		},
	}
}

/// Seeds the Postgres backend from the configured fixture rebased to `now`.
pub async fn seed_postgres(cfg: &Config, now: OffsetDateTime) -> Result<SeedReport> {
	let store = open_postgres(cfg).await?;
	let corpus = load_fixture(cfg, now)?;

	store.seed(&corpus).await
}

async fn open_postgres(cfg: &Config) -> Result<PostgresStore> {
	let Some(postgres) = cfg.storage.postgres.as_ref() else {
		return Err(Error::InvalidRequest {
			message: "storage.postgres is required for the postgres backend.".to_string(),
		});
	};

	PostgresStore::open(postgres, cfg.storage.vector_dim).await
}
