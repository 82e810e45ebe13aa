use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime, Time};

/// Participant hint that always refers to the authenticated user.
pub const SELF_PARTICIPANT: &str = "self";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
	#[default]
	General,
	ActionItems,
	Schedule,
	ParticipantLookup,
}
impl Intent {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::General => "general",
			Self::ActionItems => "action_items",
			Self::Schedule => "schedule",
			Self::ParticipantLookup => "participant_lookup",
		}
	}

	/// Lenient parse used for analyzer output; unknown labels are `None`.
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
			"general" => Some(Self::General),
			"action_items" | "action_item" | "tasks" => Some(Self::ActionItems),
			"schedule" | "calendar" => Some(Self::Schedule),
			"participant_lookup" | "participant" | "people" => Some(Self::ParticipantLookup),
			_ => None,
		}
	}
}

/// Inclusive range of calendar days. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
	#[serde(
		default,
		skip_serializing_if = "Option::is_none",
		with = "crate::time_serde::option_date"
	)]
	pub start: Option<Date>,
	#[serde(
		default,
		skip_serializing_if = "Option::is_none",
		with = "crate::time_serde::option_date"
	)]
	pub end: Option<Date>,
}
impl DateRange {
	pub fn new(start: Option<Date>, end: Option<Date>) -> Self {
		Self { start, end }
	}

	pub fn between(start: Date, end: Date) -> Self {
		if end < start { Self::new(Some(end), Some(start)) } else { Self::new(Some(start), Some(end)) }
	}

	pub fn is_unbounded(&self) -> bool {
		self.start.is_none() && self.end.is_none()
	}

	/// First instant covered by the range (UTC midnight of `start`).
	pub fn start_instant(&self) -> Option<OffsetDateTime> {
		self.start.map(|date| date.with_time(Time::MIDNIGHT).assume_utc())
	}

	/// First instant after the range (UTC midnight of the day after `end`).
	pub fn end_instant_exclusive(&self) -> Option<OffsetDateTime> {
		self.end.map(|date| date.with_time(Time::MIDNIGHT).assume_utc() + Duration::days(1))
	}

	pub fn contains(&self, instant: OffsetDateTime) -> bool {
		if let Some(start) = self.start_instant()
			&& instant < start
		{
			return false;
		}
		if let Some(end) = self.end_instant_exclusive()
			&& instant >= end
		{
			return false;
		}

		true
	}
}

/// Structured form of a natural-language query. Produced once per request by an analyzer and
/// never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedQuery {
	pub intent: Intent,
	#[serde(default)]
	pub keywords: Vec<String>,
	#[serde(default)]
	pub participants: BTreeSet<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub date_range: Option<DateRange>,
	/// Cue labels the analyzer matched, e.g. `schedule` or `date:last_week`.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub signals: Vec<String>,
}
impl AnalyzedQuery {
	/// Participant hints that name someone other than the authenticated user.
	pub fn counterparts(&self) -> Vec<String> {
		self.participants
			.iter()
			.map(|name| name.trim())
			.filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case(SELF_PARTICIPANT))
			.map(str::to_string)
			.collect()
	}

	pub fn has_signal(&self, signal: &str) -> bool {
		self.signals.iter().any(|value| value == signal)
	}

	/// Drops blank keywords, lower-cases the rest, and removes duplicates while keeping order.
	pub fn normalized(mut self) -> Self {
		let mut seen = BTreeSet::new();

		self.keywords = self
			.keywords
			.into_iter()
			.map(|keyword| keyword.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
			.filter(|keyword| !keyword.is_empty() && seen.insert(keyword.clone()))
			.collect();
		self.participants = self
			.participants
			.into_iter()
			.map(|name| name.trim().to_lowercase())
			.filter(|name| !name.is_empty())
			.collect();

		if self.date_range.is_some_and(|range| range.is_unbounded()) {
			self.date_range = None;
		}

		self
	}
}
