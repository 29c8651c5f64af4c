use std::{
	fmt::{Display, Formatter},
	str::FromStr,
	sync::LazyLock,
};

use regex::Regex;
use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month, OffsetDateTime};

use crate::error::ConfigurationError;

static WINDOW_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^(\d+)\s+(hour|day|week|month|year)s?$").expect("Window pattern must compile.")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowUnit {
	Hour,
	Day,
	Week,
	Month,
	Year,
}
impl WindowUnit {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Hour => "hour",
			Self::Day => "day",
			Self::Week => "week",
			Self::Month => "month",
			Self::Year => "year",
		}
	}
}

/// Look-back window such as `12 months`, anchored at the time a query runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
	pub amount: u32,
	pub unit: WindowUnit,
}
impl TimeWindow {
	pub fn new(amount: u32, unit: WindowUnit) -> Self {
		Self { amount, unit }
	}

	pub fn months(amount: u32) -> Self {
		Self::new(amount, WindowUnit::Month)
	}

	/// Earliest instant inside the window. Month and year steps keep the wall-clock time and clamp
	/// the day to the target month's length.
	pub fn start_from(&self, now: OffsetDateTime) -> Result<OffsetDateTime, ConfigurationError> {
		let amount = i64::from(self.amount);
		let start = match self.unit {
			WindowUnit::Hour => now.checked_sub(Duration::hours(amount)),
			WindowUnit::Day => now.checked_sub(Duration::days(amount)),
			WindowUnit::Week => now.checked_sub(Duration::weeks(amount)),
			WindowUnit::Month => months_before(now, amount),
			WindowUnit::Year => amount.checked_mul(12).and_then(|months| months_before(now, months)),
		};

		start.ok_or_else(|| ConfigurationError::InvalidWindow {
			input: self.to_string(),
			reason: "window reaches outside the supported date range".to_string(),
		})
	}

	pub fn range_ending(&self, now: OffsetDateTime) -> Result<TimeRange, ConfigurationError> {
		Ok(TimeRange { start: self.start_from(now)?, end: now })
	}
}
impl FromStr for TimeWindow {
	type Err = ConfigurationError;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		let invalid = |reason: &str| ConfigurationError::InvalidWindow {
			input: raw.to_string(),
			reason: reason.to_string(),
		};
		let normalized = raw.trim().to_lowercase();
		let Some(captures) = WINDOW_RE.captures(&normalized) else {
			return Err(invalid("expected \"<count> <hour|day|week|month|year>[s]\""));
		};
		let amount = captures[1]
			.parse::<u32>()
			.map_err(|_| invalid("count does not fit in 32 bits"))?;
		let unit = match &captures[2] {
			"hour" => WindowUnit::Hour,
			"day" => WindowUnit::Day,
			"week" => WindowUnit::Week,
			"month" => WindowUnit::Month,
			_ => WindowUnit::Year,
		};

		if amount == 0 {
			return Err(invalid("count must be greater than zero"));
		}

		Ok(Self { amount, unit })
	}
}
impl Display for TimeWindow {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		let plural = if self.amount == 1 { "" } else { "s" };

		write!(f, "{} {}{plural}", self.amount, self.unit.as_str())
	}
}

/// Closed creation-timestamp range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
	#[serde(with = "crate::time_serde")]
	pub start: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub end: OffsetDateTime,
}
impl TimeRange {
	pub fn contains(&self, at: OffsetDateTime) -> bool {
		self.start <= at && at <= self.end
	}
}

fn months_before(now: OffsetDateTime, months: i64) -> Option<OffsetDateTime> {
	let index = i64::from(now.year()) * 12 + i64::from(u8::from(now.month())) - 1 - months;
	let year = i32::try_from(index.div_euclid(12)).ok()?;
	let month = Month::try_from(u8::try_from(index.rem_euclid(12) + 1).ok()?).ok()?;
	let date = (28..=now.day())
		.rev()
		.find_map(|day| Date::from_calendar_date(year, month, day).ok())
		.or_else(|| Date::from_calendar_date(year, month, now.day()).ok())?;

	Some(now.replace_date(date))
}
