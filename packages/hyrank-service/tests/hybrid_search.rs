use std::sync::Arc;

use hyrank_domain::{ConfigurationError, Corpus, EmptyReason, Method, TimeWindow, TrapType};
use hyrank_service::{Error, HybridService, SearchMethods, SearchRequest};
use hyrank_storage::memory::MemoryStore;
use hyrank_testkit::{FIXTURE_JSON, TEST_NOW};

const CONFIG: &str = r#"
[service]
log_level = "warn"

[storage]
backend    = "memory"
vector_dim = 8
fixture    = "fixtures/trap_corpus.json"

[retrieval]
candidate_k = 20
timeout_ms  = 3000

[fusion]
rrf_k       = 60.0
result_size = 5

[temporal]
default_window = "12 months"
"#;

const AUTH_QUERY: &str = "How do I configure SCRAM-SHA-256 authentication?";
const AUTH_EMBEDDING: [f32; 8] = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];

fn config() -> hyrank_config::Config {
	hyrank_config::parse(CONFIG).expect("Test config must parse.")
}

fn memory_store() -> Arc<MemoryStore> {
	Arc::new(MemoryStore::new(Arc::new(
		hyrank_testkit::rebased_fixture().expect("Fixture must load."),
	)))
}

fn service() -> HybridService {
	HybridService::new(config(), memory_store()).expect("Service must build.")
}

fn partition(created_at: &str) -> String {
	format!(
		r#"{{
			"id": "dup",
			"title": "Archived maintenance note",
			"body": "Vacuum schedules for reporting replicas.",
			"created_at": "{created_at}",
			"tags": [],
			"embedding": [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
		}},"#
	)
}

/// Fixture plus two partitions of `dup`: one stale, one inside a 12-month window.
fn service_with_duplicated_id() -> HybridService {
	let anchor = "\"documents\": [";
	let stale = partition("2022-06-01T00:00:00Z");
	let fresh = partition("2025-05-01T00:00:00Z");
	let extra = format!("{anchor}{stale}{fresh}");

	assert!(FIXTURE_JSON.contains(anchor), "Fixture must contain {anchor:?}.");

	let corpus = Corpus::from_json(&FIXTURE_JSON.replacen(anchor, &extra, 1))
		.and_then(|corpus| corpus.rebased(TEST_NOW))
		.expect("Extended fixture must load.");

	HybridService::new(config(), Arc::new(MemoryStore::new(Arc::new(corpus))))
		.expect("Service must build.")
}

fn auth_request() -> SearchRequest {
	SearchRequest::new(AUTH_QUERY, AUTH_EMBEDDING.to_vec()).as_of(TEST_NOW)
}

fn auth_expected() -> hyrank_domain::ExpectedOutcome {
	hyrank_testkit::fixture_corpus()
		.expect("Fixture must load.")
		.query(AUTH_QUERY)
		.map(|query| query.expected.clone())
		.expect("Auth query must exist.")
}

#[tokio::test]
async fn windowed_hybrid_puts_the_winner_on_top() {
	let service = service();
	let request = auth_request().with_window(service.default_window());
	let response = service.search(&request).await.expect("Search must succeed.");
	let ids = response.result.ids();

	assert_eq!(&ids[..2], &["auth-winner", "auth-semantic"]);
	assert!(!ids.contains(&"auth-keyword"));
	assert!(!ids.contains(&"auth-temporal"));
	assert_eq!(response.eligible, Some(8));
	assert_eq!(response.window.map(|window| window.end), Some(TEST_NOW));

	let verdict = service.evaluate(&response.result, &auth_expected());

	assert!(verdict.passed);
	assert_eq!(verdict.summary(), "pass");
}

#[tokio::test]
async fn unwindowed_hybrid_falls_for_the_temporal_bait() {
	let service = service();
	let response = service.search(&auth_request()).await.expect("Search must succeed.");

	assert_eq!(
		response.result.ids(),
		vec!["auth-temporal", "auth-keyword", "auth-winner", "auth-semantic", "ops-retention"]
	);
	assert_eq!(response.eligible, None);

	let verdict = service.evaluate(&response.result, &auth_expected());

	assert!(!verdict.passed);
	assert_eq!(verdict.trapped_by, Some(TrapType::TemporalBait));
}

#[tokio::test]
async fn vector_only_falls_for_the_semantic_bait() {
	let service = service();
	let request = auth_request().with_methods(SearchMethods::VectorOnly);
	let response = service.search(&request).await.expect("Search must succeed.");
	let verdict = service.evaluate(&response.result, &auth_expected());

	assert_eq!(response.lists.len(), 1);
	assert_eq!(response.candidates.lexical, None);
	assert_eq!(verdict.trapped_by, Some(TrapType::SemanticBait));
}

#[tokio::test]
async fn lexical_only_falls_for_the_keyword_bait() {
	let service = service();
	let request = auth_request().with_methods(SearchMethods::LexicalOnly);
	let response = service.search(&request).await.expect("Search must succeed.");
	let top = response.result.top().expect("Lexical search must return hits.");

	assert_eq!(response.result.ids(), vec!["auth-keyword", "auth-temporal", "auth-winner"]);
	assert!((top.score - 1.0 / 61.0).abs() < 1e-12);
	assert_eq!(top.contributions.len(), 1);
	assert_eq!(top.contributions[0].method, Method::Lexical);

	let verdict = service.evaluate(&response.result, &auth_expected());

	assert_eq!(verdict.trapped_by, Some(TrapType::KeywordBait));
}

#[tokio::test]
async fn only_the_windowed_hybrid_passes_every_fixture_query() {
	let service = service();
	let corpus = hyrank_testkit::fixture_corpus().expect("Fixture must load.");

	for query in corpus.queries() {
		let base =
			SearchRequest::new(query.query_text.clone(), query.embedding.clone()).as_of(TEST_NOW);
		let windowed = base.clone().with_window(service.default_window());

		for (request, should_pass) in [
			(base.clone().with_methods(SearchMethods::VectorOnly), false),
			(base.clone().with_methods(SearchMethods::LexicalOnly), false),
			(base.clone(), false),
			(windowed, true),
		] {
			let response = service.search(&request).await.expect("Search must succeed.");
			let verdict = service.evaluate(&response.result, &query.expected);

			assert_eq!(
				verdict.passed, should_pass,
				"{} with {:?}: {}",
				query.query_text,
				request.methods,
				verdict.summary()
			);
		}
	}
}

#[tokio::test]
async fn window_with_no_documents_reports_exclusion() {
	let service = service();
	let request = auth_request().with_window(Some("1 hour".parse().expect("Window must parse.")));
	let response = service.search(&request).await.expect("Empty window is not an error.");

	assert!(response.result.is_empty());
	assert_eq!(response.result.empty_reason, Some(EmptyReason::ExcludedByWindow));
	assert_eq!(response.eligible, Some(0));
	assert_eq!(response.candidates.vector, Some(16));
}

#[tokio::test]
async fn category_applies_without_a_window() {
	let service = service();
	let request = auth_request().with_category("security");
	let response = service.search(&request).await.expect("Search must succeed.");

	assert_eq!(response.eligible, Some(3));
	assert_eq!(response.result.ids(), vec!["auth-temporal", "auth-winner", "auth-semantic"]);
}

#[tokio::test]
async fn stop_word_query_falls_back_to_vector_ranking() {
	let service = service();
	let request = SearchRequest::new("how do I the", AUTH_EMBEDDING.to_vec()).as_of(TEST_NOW);
	let response = service.search(&request).await.expect("Search must succeed.");

	assert_eq!(response.candidates.lexical, Some(0));
	assert!(response.result.degraded.is_empty());
	assert_eq!(response.result.top().map(|entry| entry.doc_id.as_str()), Some("auth-semantic"));
}

#[tokio::test]
async fn wrong_embedding_dimension_degrades_to_lexical() {
	let service = service();
	let request = SearchRequest::new(AUTH_QUERY, vec![1.0, 0.0, 0.0]).as_of(TEST_NOW);
	let response = service.search(&request).await.expect("Lexical list must survive.");

	assert_eq!(response.result.degraded.len(), 1);
	assert_eq!(response.result.degraded[0].method, Method::Vector);
	assert_eq!(response.result.top().map(|entry| entry.doc_id.as_str()), Some("auth-keyword"));
}

#[tokio::test]
async fn wrong_dimension_without_fallback_is_an_error() {
	let service = service();
	let request = SearchRequest::new(AUTH_QUERY, vec![1.0; 4])
		.as_of(TEST_NOW)
		.with_methods(SearchMethods::VectorOnly);
	let err = service.search(&request).await.expect_err("Vector-only search must fail.");

	assert!(matches!(
		err,
		Error::Retrieval(hyrank_service::RetrievalError::DimensionMismatch { expected: 8, actual: 4 })
	));
}

#[tokio::test]
async fn result_size_override_is_validated() {
	let service = service();
	let empty = service
		.search(&auth_request().with_result_size(0))
		.await
		.expect("Zero result size is allowed.");

	assert_eq!(empty.result.empty_reason, Some(EmptyReason::ZeroResultSize));

	let err = service
		.search(&auth_request().with_result_size(-1))
		.await
		.expect_err("Negative result size must fail.");

	assert!(matches!(err, Error::Configuration(ConfigurationError::NegativeResultSize(-1))));
}

#[tokio::test]
async fn repeated_searches_return_identical_results() {
	let service = service();
	let request = auth_request().with_window(Some(TimeWindow::months(12)));
	let first = service.search(&request).await.expect("Search must succeed.");
	let second = service.search(&request).await.expect("Search must succeed.");

	assert_eq!(first.result, second.result);
	assert_eq!(first.lists, second.lists);
}

#[tokio::test]
async fn in_window_partition_of_a_duplicated_id_is_ranked() {
	let service = service_with_duplicated_id();
	let request = auth_request()
		.with_methods(SearchMethods::VectorOnly)
		.with_window(Some(TimeWindow::months(12)));
	let response = service.search(&request).await.expect("Search must succeed.");
	let window = response.window.expect("Window must resolve.");
	let top = response.result.top().expect("Vector search must return hits.");

	assert_eq!(response.eligible, Some(9));
	assert_eq!(top.doc_id, "dup");
	assert!(window.contains(top.created_at));
	assert_eq!(response.result.entries.iter().filter(|entry| entry.doc_id == "dup").count(), 1);
}

#[tokio::test]
async fn unwindowed_search_keeps_both_partitions_of_a_duplicated_id() {
	let service = service_with_duplicated_id();
	let request = auth_request().with_methods(SearchMethods::VectorOnly);
	let response = service.search(&request).await.expect("Search must succeed.");
	let partitions = response
		.result
		.entries
		.iter()
		.filter(|entry| entry.doc_id == "dup")
		.map(|entry| entry.rank)
		.collect::<Vec<_>>();

	assert_eq!(partitions, vec![1, 2]);
	assert!(response.result.entries[0].created_at < response.result.entries[1].created_at);
}

#[test]
fn service_rejects_bad_fusion_parameters() {
	let mut cfg = config();

	cfg.fusion.rrf_k = 0.0;

	let Err(err) = HybridService::new(cfg, memory_store()) else {
		panic!("Zero rrf_k must be rejected.");
	};

	assert!(matches!(err, Error::Configuration(ConfigurationError::InvalidRrfK(_))));
}

#[test]
fn service_rejects_bad_default_window() {
	let mut cfg = config();

	cfg.temporal.default_window = Some("twelve months".to_string());

	let Err(err) = HybridService::new(cfg, memory_store()) else {
		panic!("Malformed window must be rejected.");
	};

	assert!(matches!(err, Error::Configuration(ConfigurationError::InvalidWindow { .. })));
}

#[test]
fn service_rejects_store_dimension_drift() {
	let mut cfg = config();

	cfg.storage.vector_dim = 16;

	let Err(err) = HybridService::new(cfg, memory_store()) else {
		panic!("Dimension drift must be rejected.");
	};

	assert!(matches!(
		err,
		Error::Configuration(ConfigurationError::VectorDimMismatch { configured: 16, store: 8 })
	));
}
