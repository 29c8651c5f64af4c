use time::{Duration, macros::datetime};

use hyrank_domain::{Corpus, CorpusError, TrapType};

const FIXTURE: &str = include_str!("../../../fixtures/trap_corpus.json");

fn fixture() -> Corpus {
	Corpus::from_json(FIXTURE).expect("Bundled fixture must be valid.")
}

fn replace_once(from: &str, to: &str) -> String {
	assert!(FIXTURE.contains(from), "Fixture must contain {from:?}.");

	FIXTURE.replacen(from, to, 1)
}

#[test]
fn bundled_fixture_is_valid() {
	let corpus = fixture();
	let stats = corpus.stats();

	assert_eq!(corpus.dimension(), 8);
	assert_eq!(stats.trap_sets, 3);
	assert_eq!(stats.queries, 3);
	assert_eq!(stats.documents, corpus.documents().len());
	assert_eq!(stats.versions.values().sum::<usize>(), stats.documents);
	assert_eq!(corpus.trap_sets(), vec!["authentication", "connection_pooling", "debug_logging"]);
}

#[test]
fn version_is_a_content_digest() {
	let corpus = fixture();

	assert_eq!(corpus.version(), blake3::hash(FIXTURE.as_bytes()).to_hex().as_str());
	assert_eq!(corpus.version().len(), 64);
}

#[test]
fn quartets_come_back_in_trap_order() {
	let corpus = fixture();
	let quartet = corpus.trap_quartet("authentication");
	let types = quartet.iter().filter_map(|doc| doc.trap_type).collect::<Vec<_>>();

	assert_eq!(types, TrapType::ALL);
	assert_eq!(quartet[0].id, "auth-winner");
}

#[test]
fn quartet_ages_straddle_a_twelve_month_window() {
	let corpus = fixture();
	let reference = corpus.reference_time();

	for trap_set in corpus.trap_sets() {
		for doc in corpus.trap_quartet(trap_set) {
			let age = reference - doc.created_at;
			let recent = age < Duration::days(365);

			match doc.trap_type {
				Some(TrapType::Winner | TrapType::SemanticBait) => assert!(recent, "{}", doc.id),
				Some(TrapType::KeywordBait | TrapType::TemporalBait) => assert!(!recent, "{}", doc.id),
				None => unreachable!(),
			}
		}
	}
}

#[test]
fn rebasing_preserves_relative_ages() {
	let corpus = fixture();
	let now = datetime!(2026-10-14 12:00 UTC);
	let rebased = corpus.rebased(now).expect("Rebase must succeed.");
	let offset = now - corpus.reference_time();

	assert_eq!(rebased.reference_time(), now);
	assert_eq!(rebased.version(), corpus.version());

	for (before, after) in corpus.documents().iter().zip(rebased.documents()) {
		assert_eq!(after.created_at - before.created_at, offset);
		assert_eq!(after.published_date.map(|at| at - offset), before.published_date);
	}

	assert_eq!(rebased.rebased(now).ok(), Some(rebased));
}

#[test]
fn rejects_duplicate_keys() {
	let corpus = fixture();
	let mut value: serde_json::Value =
		serde_json::from_str(FIXTURE).expect("Fixture must be JSON.");
	let documents = value["documents"].as_array_mut().expect("Documents must be an array.");
	let duplicate = documents[0].clone();

	documents.push(duplicate);

	let raw = serde_json::to_string(&value).expect("Fixture must serialize.");

	assert!(matches!(Corpus::from_json(&raw), Err(CorpusError::DuplicateKey { .. })));
	// The same id in another partition is allowed.
	let mut value: serde_json::Value =
		serde_json::from_str(FIXTURE).expect("Fixture must be JSON.");
	let documents = value["documents"].as_array_mut().expect("Documents must be an array.");
	let mut partition = documents[12].clone();

	partition["created_at"] = serde_json::Value::String("2019-05-01T08:00:00Z".to_string());
	documents.push(partition);

	let raw = serde_json::to_string(&value).expect("Fixture must serialize.");
	let reparsed = Corpus::from_json(&raw).expect("Distinct partitions must be accepted.");

	assert_eq!(reparsed.documents().len(), corpus.documents().len() + 1);
	assert_eq!(
		reparsed.document("ops-retention").map(|doc| doc.created_at),
		Some(datetime!(2025-05-01 08:00 UTC))
	);
}

#[test]
fn rejects_mismatched_embedding_dimensions() {
	let raw = replace_once("\t\t\t\t0.85,\n", "");

	assert!(matches!(Corpus::from_json(&raw), Err(CorpusError::DimensionMismatch { .. })));
}

#[test]
fn rejects_quartets_missing_a_role() {
	let raw = replace_once("\"trap_type\": \"keyword_bait\"", "\"trap_type\": \"semantic_bait\"");

	assert!(matches!(Corpus::from_json(&raw), Err(CorpusError::MalformedTrapSet { .. })));
}

#[test]
fn rejects_queries_pointing_at_the_wrong_document() {
	let raw = replace_once("\"winner_id\": \"auth-winner\"", "\"winner_id\": \"auth-keyword\"");

	assert!(matches!(Corpus::from_json(&raw), Err(CorpusError::MalformedQuery { .. })));
}

#[test]
fn rejects_empty_and_unparsable_fixtures() {
	let empty = r#"{"name": "x", "reference_time": "2025-01-01T00:00:00Z", "documents": []}"#;

	assert!(matches!(Corpus::from_json(empty), Err(CorpusError::Empty)));
	assert!(matches!(Corpus::from_json("{"), Err(CorpusError::Parse(_))));
}
