//! Trap quartet verification. Mismatches are reported as data, never as errors.

use serde::{Deserialize, Serialize};

use crate::{document::TrapType, fusion::FusedResult};

/// Expected-outcome labels attached to a demo query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedOutcome {
	pub winner_id: String,
	#[serde(default)]
	pub semantic_bait_id: Option<String>,
	#[serde(default)]
	pub keyword_bait_id: Option<String>,
	#[serde(default)]
	pub temporal_bait_id: Option<String>,
}
impl ExpectedOutcome {
	pub fn baits(&self) -> impl Iterator<Item = (TrapType, &str)> {
		[
			(TrapType::SemanticBait, self.semantic_bait_id.as_deref()),
			(TrapType::KeywordBait, self.keyword_bait_id.as_deref()),
			(TrapType::TemporalBait, self.temporal_bait_id.as_deref()),
		]
		.into_iter()
		.filter_map(|(trap_type, id)| id.map(|id| (trap_type, id)))
	}

	pub fn id_for(&self, trap_type: TrapType) -> Option<&str> {
		match trap_type {
			TrapType::Winner => Some(self.winner_id.as_str()),
			TrapType::SemanticBait => self.semantic_bait_id.as_deref(),
			TrapType::KeywordBait => self.keyword_bait_id.as_deref(),
			TrapType::TemporalBait => self.temporal_bait_id.as_deref(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "placement")]
pub enum BaitPlacement {
	/// Not in the fused result.
	Absent,
	/// Present, strictly below the winner.
	BelowWinner { rank: u32 },
	/// Present while the winner is ranked lower or missing.
	NotBelowWinner { rank: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaitVerdict {
	pub trap_type: TrapType,
	pub doc_id: String,
	#[serde(flatten)]
	pub placement: BaitPlacement,
	pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerVerdict {
	pub doc_id: String,
	pub rank: Option<u32>,
	pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapVerdict {
	pub top_id: Option<String>,
	pub winner: WinnerVerdict,
	pub baits: Vec<BaitVerdict>,
	/// Set when the top result is one of the query's baits.
	pub trapped_by: Option<TrapType>,
	pub passed: bool,
}
impl TrapVerdict {
	pub fn bait(&self, trap_type: TrapType) -> Option<&BaitVerdict> {
		self.baits.iter().find(|bait| bait.trap_type == trap_type)
	}

	/// One-line outcome, e.g. `pass` or `Trapped by keyword`.
	pub fn summary(&self) -> String {
		if self.passed {
			return "pass".to_string();
		}

		match (self.trapped_by, self.top_id.as_deref()) {
			(Some(trap_type), _) => format!("Trapped by {}", trap_type.label()),
			(None, None) => "No results".to_string(),
			(None, Some(_)) if !self.winner.passed => "Winner not on top".to_string(),
			(None, Some(_)) => "Bait ranked above winner".to_string(),
		}
	}
}

/// Checks a fused ranking against a query's expected outcome.
pub fn evaluate(result: &FusedResult, expected: &ExpectedOutcome) -> TrapVerdict {
	let top_id = result.top().map(|entry| entry.doc_id.clone());
	let winner_rank = result.rank_of(&expected.winner_id);
	let winner = WinnerVerdict {
		doc_id: expected.winner_id.clone(),
		rank: winner_rank,
		passed: winner_rank == Some(1),
	};
	let baits = expected
		.baits()
		.map(|(trap_type, doc_id)| {
			let placement = match (result.rank_of(doc_id), winner_rank) {
				(None, _) => BaitPlacement::Absent,
				(Some(rank), Some(winner)) if rank > winner => BaitPlacement::BelowWinner { rank },
				(Some(rank), _) => BaitPlacement::NotBelowWinner { rank },
			};
			let passed = !matches!(placement, BaitPlacement::NotBelowWinner { .. });

			BaitVerdict { trap_type, doc_id: doc_id.to_string(), placement, passed }
		})
		.collect::<Vec<_>>();
	let trapped_by = top_id.as_deref().and_then(|top| {
		expected.baits().find(|(_, doc_id)| *doc_id == top).map(|(trap_type, _)| trap_type)
	});
	let passed = winner.passed && baits.iter().all(|bait| bait.passed);

	TrapVerdict { top_id, winner, baits, trapped_by, passed }
}
