use hyrank_domain::TrapType;
use hyrank_service::{
	Catalog, DocumentStore, HybridService, SearchRequest, open_backend, seed_postgres,
};
use hyrank_testkit::{TEST_NOW, TestDatabase};

const AUTH_QUERY: &str = "How do I configure SCRAM-SHA-256 authentication?";

fn fixture_path() -> String {
	format!("{}/../../fixtures/trap_corpus.json", env!("CARGO_MANIFEST_DIR"))
}

fn memory_config() -> hyrank_config::Config {
	let raw = format!(
		r#"
[service]
log_level = "warn"

[storage]
backend    = "memory"
vector_dim = 8
fixture    = "{}"
"#,
		fixture_path()
	);

	hyrank_config::parse(&raw).expect("Test config must parse.")
}

fn postgres_config(db: &TestDatabase) -> hyrank_config::Config {
	let raw = format!(
		r#"
[service]
log_level = "warn"

[storage]
backend    = "postgres"
vector_dim = 8
fixture    = "{}"

[storage.postgres]
dsn            = "{}"
pool_max_conns = 2

[temporal]
default_window = "12 months"
"#,
		fixture_path(),
		db.dsn()
	);

	hyrank_config::parse(&raw).expect("Test config must parse.")
}

#[tokio::test]
async fn memory_backend_serves_the_catalog() {
	let backend = open_backend(&memory_config(), TEST_NOW).await.expect("Backend must open.");
	let sets = backend.catalog.trap_sets().await.expect("Trap sets must load.");
	let quartet =
		backend.catalog.trap_quartet("authentication").await.expect("Quartet must load.");
	let stats = backend.catalog.stats().await.expect("Stats must load.");

	assert_eq!(sets, vec!["authentication", "connection_pooling", "debug_logging"]);
	assert_eq!(
		quartet.iter().filter_map(|doc| doc.trap_type).collect::<Vec<_>>(),
		TrapType::ALL.to_vec()
	);
	assert_eq!(stats.documents, 16);
	assert_eq!(stats.queries, 3);
	assert_eq!(backend.store.vector_dim(), 8);
}

#[tokio::test]
async fn memory_backend_rebases_to_the_open_time() {
	let backend = open_backend(&memory_config(), TEST_NOW).await.expect("Backend must open.");
	let newest = backend
		.catalog
		.document("ops-retention")
		.await
		.expect("Lookup must succeed.")
		.expect("Document must exist.");

	assert!(newest.created_at < TEST_NOW);
	assert!(TEST_NOW - newest.created_at < time::Duration::days(40));
}

#[tokio::test]
async fn missing_fixture_is_reported() {
	let mut cfg = memory_config();

	cfg.storage.fixture = "does/not/exist.json".into();

	let Err(err) = open_backend(&cfg, TEST_NOW).await else {
		panic!("Missing fixture must fail.");
	};

	assert!(matches!(err, hyrank_service::Error::NotFound { .. }));
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set HYRANK_PG_DSN to run."]
async fn postgres_backend_reproduces_the_trap_outcomes() {
	let Some(dsn) = hyrank_testkit::env_dsn() else {
		eprintln!("Skipping postgres_backend_reproduces_the_trap_outcomes; set HYRANK_PG_DSN.");

		return;
	};
	let db = TestDatabase::new(&dsn).await.expect("Failed to create test database.");
	let cfg = postgres_config(&db);
	let first = seed_postgres(&cfg, TEST_NOW).await.expect("Seeding must succeed.");
	let second = seed_postgres(&cfg, TEST_NOW).await.expect("Reseeding must succeed.");

	assert_eq!(first.documents_inserted, 16);
	assert!(second.already_seeded);

	let backend = open_backend(&cfg, TEST_NOW).await.expect("Backend must open.");
	let query = backend
		.catalog
		.demo_queries()
		.await
		.expect("Queries must load.")
		.into_iter()
		.find(|query| query.query_text == AUTH_QUERY)
		.expect("Auth query must be seeded.");
	let service = HybridService::new(cfg, backend.store).expect("Service must build.");
	let request = SearchRequest::new(query.query_text.clone(), query.embedding.clone())
		.as_of(TEST_NOW)
		.with_window(service.default_window());
	let response = service.search(&request).await.expect("Search must succeed.");

	assert!(service.evaluate(&response.result, &query.expected).passed);

	db.cleanup().await.expect("Failed to cleanup test database.");
}
