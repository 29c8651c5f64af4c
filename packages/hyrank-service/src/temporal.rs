use std::time::Duration;

use time::OffsetDateTime;

use hyrank_domain::{ConfigurationError, Eligibility, TimeRange, TimeWindow};

use crate::{DocumentStore, RetrievalError, Stage, retrieval};

/// Builds the eligibility set from a creation window and an optional category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemporalFilter {
	pub window: Option<TimeWindow>,
	pub category: Option<String>,
}
impl TemporalFilter {
	pub fn new(window: Option<TimeWindow>, category: Option<String>) -> Self {
		Self { window, category }
	}

	/// No window and no category: every document stays eligible.
	pub fn is_unrestricted(&self) -> bool {
		self.window.is_none() && self.category.is_none()
	}

	/// Creation range ending at `now`, if a window is set.
	pub fn range(&self, now: OffsetDateTime) -> Result<Option<TimeRange>, ConfigurationError> {
		self.window.map(|window| window.range_ending(now)).transpose()
	}

	/// Asks the store for the eligible keys. An unrestricted filter skips the store call.
	pub async fn eligibility(
		&self,
		store: &dyn DocumentStore,
		range: Option<&TimeRange>,
		timeout: Duration,
	) -> Result<Eligibility, RetrievalError> {
		if self.is_unrestricted() {
			return Ok(Eligibility::All);
		}

		let lookup = store.eligible(range, self.category.as_deref());
		let keys = retrieval::bounded(Stage::Temporal, timeout, lookup).await?;

		tracing::debug!(eligible = keys.len(), "Temporal filter resolved.");

		Ok(Eligibility::only(keys))
	}
}
