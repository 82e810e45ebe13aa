use time::OffsetDateTime;

use crate::{
	matching::{matched_keywords, searchable_text},
	query::{AnalyzedQuery, Intent},
	result::{Relevance, ResultType},
	strategy::{SearchStrategy, StrategyKind},
};

const TITLE_MATCH_WEIGHT: f32 = 3.0;
const SECONDARY_MATCH_WEIGHT: f32 = 1.0;
const PARTICIPANT_MATCH_WEIGHT: f32 = 2.0;
const DATE_RANGE_BONUS: f32 = 1.5;
const INTENT_BONUS: f32 = 1.0;
const RECENCY_WEIGHT: f32 = 0.5;
const RECENCY_TAU_DAYS: f32 = 30.0;

/// Normalized view of one source record, enough to score it.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
	pub result_type: ResultType,
	pub title: &'a str,
	/// Decisions, action items, descriptions, session titles.
	pub secondary: Vec<&'a str>,
	pub participants: &'a [String],
	pub timestamp: OffsetDateTime,
}

/// Scores `candidate` for `query` as retrieved by `strategy`.
///
/// Title hits outweigh secondary-field hits for the same keyword, and the date bonus only applies
/// to date-driven strategies. `now` anchors the recency term, which is capped well below any
/// single match weight so it only separates otherwise equal records.
pub fn calculate_relevance(
	candidate: &Candidate<'_>,
	query: &AnalyzedQuery,
	strategy: &SearchStrategy,
	now: OffsetDateTime,
) -> Relevance {
	let mut score = strategy_base(strategy.kind());
	let mut notes = vec![format!("{} strategy", strategy.kind().as_str())];
	let title_hits = matched_keywords(candidate.title, &query.keywords);
	let secondary = searchable_text(candidate.secondary.iter().copied());
	let secondary_hits = matched_keywords(&secondary, &query.keywords)
		.into_iter()
		.filter(|keyword| !title_hits.contains(keyword))
		.collect::<Vec<_>>();

	if !title_hits.is_empty() {
		score += TITLE_MATCH_WEIGHT * title_hits.len() as f32;

		notes.push(format!("title matches {}", quote_all(&title_hits)));
	}
	if !secondary_hits.is_empty() {
		score += SECONDARY_MATCH_WEIGHT * secondary_hits.len() as f32;

		notes.push(format!("details match {}", quote_all(&secondary_hits)));
	}

	let counterparts = query.counterparts();
	let participant_hits = matched_participants(candidate.participants, &counterparts);

	if !participant_hits.is_empty() {
		score += PARTICIPANT_MATCH_WEIGHT * participant_hits.len() as f32;

		notes.push(format!("with {}", participant_hits.join(", ")));
	}
	if strategy.rewards_date_match()
		&& let Some(range) = strategy.date_range().or(query.date_range.as_ref())
		&& range.contains(candidate.timestamp)
	{
		score += DATE_RANGE_BONUS;

		notes.push("within date range".to_string());
	}

	match (query.intent, candidate.result_type) {
		(Intent::ActionItems, ResultType::ActionItem) => {
			score += INTENT_BONUS;

			notes.push("open action item".to_string());
		},
		(Intent::Schedule, ResultType::CalendarEvent) if candidate.timestamp >= now => {
			score += INTENT_BONUS;

			notes.push("upcoming event".to_string());
		},
		_ => {},
	}

	let age_days = age_in_days(candidate.timestamp, now);
	let recency = RECENCY_WEIGHT * (-age_days / RECENCY_TAU_DAYS).exp();

	score += recency;

	notes.push(format!("recency {recency:.2}"));

	Relevance { score: if score.is_finite() { score } else { 0.0 }, explanation: notes.join("; ") }
}

fn strategy_base(kind: StrategyKind) -> f32 {
	match kind {
		StrategyKind::Participant => 1.0,
		StrategyKind::Hybrid => 1.0,
		StrategyKind::Topic => 0.8,
		StrategyKind::Temporal => 0.6,
		StrategyKind::Entity => 0.4,
	}
}

fn matched_participants<'a>(participants: &[String], hints: &'a [String]) -> Vec<&'a str> {
	hints
		.iter()
		.filter(|hint| {
			let hint = hint.to_lowercase();

			participants.iter().any(|name| name.to_lowercase().contains(hint.as_str()))
		})
		.map(String::as_str)
		.collect()
}

fn age_in_days(timestamp: OffsetDateTime, now: OffsetDateTime) -> f32 {
	let seconds = (now - timestamp).whole_seconds().unsigned_abs();

	seconds as f32 / 86_400.0
}

fn quote_all(values: &[&str]) -> String {
	values.iter().map(|value| format!("\"{value}\"")).collect::<Vec<_>>().join(", ")
}
