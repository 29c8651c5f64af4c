use time::{OffsetDateTime, macros::datetime};

use hyrank_domain::{
	Candidate, DocKey, Eligibility, EmptyReason, FusionParams, Method, RankedList, fusion,
};

const CREATED_AT: OffsetDateTime = datetime!(2025-01-01 00:00 UTC);

fn list(method: Method, ids: &[&str]) -> RankedList {
	RankedList::from_ordered(
		method,
		ids.iter().enumerate().map(|(idx, id)| Candidate {
			doc_id: id.to_string(),
			created_at: CREATED_AT,
			score: 10.0 - idx as f64,
		}),
	)
}

fn only(ids: &[&str]) -> Eligibility {
	Eligibility::only(ids.iter().map(|id| DocKey::new(*id, CREATED_AT)))
}

fn params(result_size: i64) -> FusionParams {
	FusionParams::new(60.0, result_size).expect("Fusion parameters must be valid.")
}

fn score_of(result: &hyrank_domain::FusedResult, id: &str) -> f64 {
	result
		.entries
		.iter()
		.find(|entry| entry.doc_id == id)
		.map(|entry| entry.score)
		.unwrap_or_else(|| panic!("{id} must be in the fused result."))
}

#[test]
fn scores_never_increase_along_the_output() {
	let vector = list(Method::Vector, &["a", "b", "c", "d", "e", "f"]);
	let lexical = list(Method::Lexical, &["f", "d", "g", "a"]);
	let result = fusion::fuse(&[vector, lexical], &Eligibility::All, &params(10));

	assert_eq!(result.entries.len(), 7);

	for pair in result.entries.windows(2) {
		assert!(pair[0].score >= pair[1].score);

		if pair[0].score == pair[1].score {
			assert!(pair[0].doc_id < pair[1].doc_id);
		}
	}
}

#[test]
fn fused_score_is_the_exact_sum_of_reciprocal_terms() {
	let vector = list(Method::Vector, &["a", "b", "c"]);
	let lexical = list(Method::Lexical, &["c", "d"]);
	let result = fusion::fuse(&[vector, lexical], &Eligibility::All, &params(10));

	assert_eq!(score_of(&result, "a"), 1.0 / (60.0 + 1.0));
	assert_eq!(score_of(&result, "b"), 1.0 / (60.0 + 2.0));
	assert_eq!(score_of(&result, "c"), 1.0 / (60.0 + 3.0) + 1.0 / (60.0 + 1.0));
	assert_eq!(score_of(&result, "d"), 1.0 / (60.0 + 2.0));
}

#[test]
fn improving_a_rank_strictly_increases_the_score() {
	let vector = list(Method::Vector, &["a", "b", "target"]);
	let before = fusion::fuse(
		&[vector.clone(), list(Method::Lexical, &["x", "y", "z", "target"])],
		&Eligibility::All,
		&params(10),
	);
	let after = fusion::fuse(
		&[vector, list(Method::Lexical, &["x", "target", "y", "z"])],
		&Eligibility::All,
		&params(10),
	);

	assert!(score_of(&after, "target") > score_of(&before, "target"));
}

#[test]
fn ineligible_documents_never_appear_even_at_rank_one() {
	let vector = list(Method::Vector, &["stale", "a", "b"]);
	let lexical = list(Method::Lexical, &["stale", "b"]);
	let result = fusion::fuse(&[vector, lexical], &only(&["a", "b"]), &params(10));

	assert_eq!(result.rank_of("stale"), None);
	assert_eq!(result.ids(), vec!["b", "a"]);
	// Both lists are renumbered after filtering: b is rank 2 in vector and rank 1 in lexical.
	assert_eq!(score_of(&result, "b"), 1.0 / 62.0 + 1.0 / 61.0);
}

#[test]
fn eligibility_is_keyed_by_id_and_created_at() {
	let vector = RankedList::from_ordered(
		Method::Vector,
		[Candidate {
			doc_id: "a".to_string(),
			created_at: datetime!(2019-01-01 00:00 UTC),
			score: 0.9,
		}],
	);
	let result = fusion::fuse(&[vector], &only(&["a"]), &params(10));

	assert!(result.is_empty());
	assert_eq!(result.empty_reason, Some(EmptyReason::ExcludedByWindow));
}

fn partitioned(method: Method, hits: &[(&str, OffsetDateTime)]) -> RankedList {
	RankedList::from_ordered(
		method,
		hits.iter().enumerate().map(|(idx, (id, created_at))| Candidate {
			doc_id: id.to_string(),
			created_at: *created_at,
			score: 10.0 - idx as f64,
		}),
	)
}

#[test]
fn newer_partition_survives_when_the_older_one_ranks_first() {
	let stale = datetime!(2022-06-01 00:00 UTC);
	let fresh = datetime!(2025-05-01 00:00 UTC);
	let vector = partitioned(Method::Vector, &[("dup", stale), ("dup", fresh), ("a", CREATED_AT)]);
	let eligibility = Eligibility::only([DocKey::new("dup", fresh), DocKey::new("a", CREATED_AT)]);
	let result = fusion::fuse(&[vector], &eligibility, &params(10));
	let top = result.top().expect("Fused result must not be empty.");

	assert_eq!(result.ids(), vec!["dup", "a"]);
	assert_eq!(top.created_at, fresh);
	assert_eq!(top.rank, 1);
	assert_eq!(top.score, 1.0 / 61.0);
}

#[test]
fn eligible_partitions_of_one_id_are_scored_separately() {
	let stale = datetime!(2022-06-01 00:00 UTC);
	let fresh = datetime!(2025-05-01 00:00 UTC);
	let vector = partitioned(Method::Vector, &[("dup", stale), ("dup", fresh)]);
	let lexical = partitioned(Method::Lexical, &[("dup", fresh)]);
	let result = fusion::fuse(&[vector, lexical], &Eligibility::All, &params(10));
	let keys = result
		.entries
		.iter()
		.map(|entry| (entry.doc_id.as_str(), entry.created_at, entry.score))
		.collect::<Vec<_>>();

	assert_eq!(keys, vec![("dup", fresh, 1.0 / 62.0 + 1.0 / 61.0), ("dup", stale, 1.0 / 61.0)]);
}

#[test]
fn equal_scores_on_one_id_break_ties_by_creation_time() {
	let stale = datetime!(2022-06-01 00:00 UTC);
	let fresh = datetime!(2025-05-01 00:00 UTC);
	let vector = partitioned(Method::Vector, &[("dup", fresh)]);
	let lexical = partitioned(Method::Lexical, &[("dup", stale)]);
	let result = fusion::fuse(&[vector, lexical], &Eligibility::All, &params(10));
	let created = result.entries.iter().map(|entry| entry.created_at).collect::<Vec<_>>();

	assert_eq!(created, vec![stale, fresh]);
}

#[test]
fn identical_inputs_give_bit_identical_output() {
	let lists = [
		list(Method::Vector, &["a", "b", "c", "d"]),
		list(Method::Lexical, &["d", "c", "e"]),
	];
	let first = fusion::fuse(&lists, &Eligibility::All, &params(5));
	let second = fusion::fuse(&lists, &Eligibility::All, &params(5));
	let bits = |result: &hyrank_domain::FusedResult| {
		result
			.entries
			.iter()
			.map(|entry| (entry.doc_id.clone(), entry.score.to_bits()))
			.collect::<Vec<_>>()
	};

	assert_eq!(first, second);
	assert_eq!(bits(&first), bits(&second));
}

#[test]
fn quartet_with_window_puts_winner_first() {
	let vector = list(Method::Vector, &["S", "T", "W", "K"]);
	let lexical = list(Method::Lexical, &["K", "T", "W"]);
	let result = fusion::fuse(&[vector, lexical], &only(&["W", "S"]), &params(5));

	assert_eq!(result.top().map(|entry| entry.doc_id.as_str()), Some("W"));
	assert_eq!(result.rank_of("K"), None);
	assert_eq!(result.rank_of("T"), None);
	assert!(result.rank_of("S").is_some_and(|rank| rank > 1));
}

#[test]
fn quartet_without_window_is_won_by_the_stale_bait() {
	let vector = list(Method::Vector, &["S", "T", "W", "K"]);
	let lexical = list(Method::Lexical, &["K", "T", "W"]);
	let result = fusion::fuse(&[vector, lexical], &Eligibility::All, &params(5));

	assert_eq!(result.ids(), vec!["T", "K", "W", "S"]);
}

#[test]
fn empty_lexical_list_yields_the_vector_ranking() {
	let vector = list(Method::Vector, &["c", "a", "b"]);
	let result = fusion::fuse(
		&[vector, RankedList::empty(Method::Lexical)],
		&Eligibility::All,
		&params(10),
	);

	assert_eq!(result.ids(), vec!["c", "a", "b"]);

	for entry in &result.entries {
		assert_eq!(entry.score, 1.0 / (60.0 + f64::from(entry.rank)));
	}
}

#[test]
fn equal_scores_break_ties_by_ascending_id() {
	for _ in 0..16 {
		let vector = list(Method::Vector, &["zeta", "beta"]);
		let lexical = list(Method::Lexical, &["alpha", "gamma"]);
		let result = fusion::fuse(&[vector, lexical], &Eligibility::All, &params(10));

		assert_eq!(result.ids(), vec!["alpha", "zeta", "beta", "gamma"]);
	}
}

#[test]
fn output_is_truncated_to_result_size() {
	let vector = list(Method::Vector, &["a", "b", "c", "d"]);
	let truncated = fusion::fuse(&[vector.clone()], &Eligibility::All, &params(2));
	let zero = fusion::fuse(&[vector], &Eligibility::All, &params(0));

	assert_eq!(truncated.ids(), vec!["a", "b"]);
	assert!(zero.is_empty());
	assert_eq!(zero.empty_reason, Some(EmptyReason::ZeroResultSize));
}

#[test]
fn empty_inputs_give_an_empty_result() {
	let result = fusion::fuse(&[], &Eligibility::All, &params(5));
	let both_empty = fusion::fuse(
		&[RankedList::empty(Method::Vector), RankedList::empty(Method::Lexical)],
		&only(&["a"]),
		&params(5),
	);

	assert!(result.is_empty());
	assert_eq!(result.empty_reason, Some(EmptyReason::NoCandidates));
	assert_eq!(both_empty.empty_reason, Some(EmptyReason::NoCandidates));
}

#[test]
fn window_excluding_everything_is_reported_as_such() {
	let vector = list(Method::Vector, &["a", "b"]);
	let lexical = list(Method::Lexical, &["b"]);
	let result = fusion::fuse(&[vector, lexical], &Eligibility::none(), &params(5));

	assert!(result.is_empty());
	assert_eq!(result.empty_reason, Some(EmptyReason::ExcludedByWindow));
}
