//! Runs one strategy against every applicable record source and scores what comes back.

use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use huddle_domain::{
	AnalyzedQuery, Candidate, DateRange, Intent, ResultType, SearchResult, SearchStrategy,
	analyzer::SIGNAL_SCHEDULE, calculate_relevance, matching,
};
use huddle_storage::{
	models::{ActionItem, CalendarEvent, MeetingSummary},
	queries::{ActionItemFilter, CalendarFilter, MeetingFilter, TimeWindow},
};

use crate::RecordStore;

/// Keywords that make a non-schedule query worth checking the calendar for.
const SCHEDULING_TERMS: &[&str] =
	&["meeting", "schedule", "calendar", "upcoming", "call", "event", "agenda"];

#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext<'a> {
	pub user_id: Uuid,
	pub query: &'a AnalyzedQuery,
	/// Request clock: anchors calendar defaults and recency.
	pub now: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct StepOutcome {
	/// Meetings first, then action items, then calendar events, each in store order.
	pub results: Vec<SearchResult>,
	pub failed_sources: Vec<ResultType>,
}

/// What one strategy asks of the stores, independent of variant.
struct Scope<'a> {
	keywords: &'a [String],
	participants: Option<&'a [String]>,
	date_range: Option<DateRange>,
	limit: u32,
}

pub fn routes_calendar(query: &AnalyzedQuery) -> bool {
	query.intent == Intent::Schedule
		|| query.has_signal(SIGNAL_SCHEDULE)
		|| query.keywords.iter().any(|keyword| {
			SCHEDULING_TERMS.iter().any(|term| keyword.contains(term))
		})
}

/// Queries the sources concurrently. A failing source is logged and contributes nothing; the
/// other sources still count.
pub async fn execute_strategy(
	store: &dyn RecordStore,
	ctx: ExecutionContext<'_>,
	strategy: &SearchStrategy,
) -> StepOutcome {
	let scope = match strategy {
		SearchStrategy::Temporal { date_range, limit } => Scope {
			keywords: &[],
			participants: None,
			date_range: Some(*date_range),
			limit: *limit,
		},
		SearchStrategy::Topic { keywords, limit } | SearchStrategy::Entity { keywords, limit } =>
			Scope { keywords, participants: None, date_range: None, limit: *limit },
		SearchStrategy::Hybrid { keywords, date_range, limit } =>
			Scope { keywords, participants: None, date_range: *date_range, limit: *limit },
		SearchStrategy::Participant { participants, limit } => Scope {
			keywords: &[],
			participants: Some(participants.as_slice()),
			date_range: None,
			limit: *limit,
		},
	};
	let hints = scope.participants.map(counterpart_hints);

	// A participant lookup with nobody left to look for matches nothing.
	if hints.as_ref().is_some_and(Vec::is_empty) {
		return StepOutcome::default();
	}

	let hints = hints.unwrap_or_default();
	let window = scope.date_range.map(|range| window_of(&range)).unwrap_or_default();
	let calendar_window = TimeWindow::new(
		scope.date_range.and_then(|range| range.start_instant()).or(Some(ctx.now)),
		scope.date_range.and_then(|range| range.end_instant_exclusive()),
	);
	let meeting_filter = MeetingFilter { window, participants: hints.clone(), limit: scope.limit };
	let action_filter = ActionItemFilter { window, assignees: hints.clone(), limit: scope.limit };
	let calendar_filter =
		CalendarFilter { window: calendar_window, attendees: hints, limit: scope.limit };
	let calendar = async {
		if routes_calendar(ctx.query) {
			Some(store.list_calendar_events(ctx.user_id, &calendar_filter).await)
		} else {
			None
		}
	};
	let (meetings, action_items, events) = tokio::join!(
		store.list_meetings(ctx.user_id, &meeting_filter),
		store.list_action_items(ctx.user_id, &action_filter),
		calendar,
	);
	let mut outcome = StepOutcome::default();
	let buckets = matching::split_keywords(scope.keywords);

	match meetings {
		Ok(meetings) =>
			for meeting in meetings.iter().filter(|meeting| {
				matching::matches_buckets(&meeting_text(meeting), &buckets)
			}) {
				outcome.results.push(meeting_result(meeting, ctx, strategy));
			},
		Err(err) => {
			warn!(
				error = %err,
				strategy = strategy.kind().as_str(),
				source = "meetings",
				"Source lookup failed."
			);

			outcome.failed_sources.push(ResultType::Meeting);
		},
	}
	match action_items {
		Ok(items) =>
			for item in items
				.iter()
				.filter(|item| matching::matches_buckets(&action_item_text(item), &buckets))
			{
				outcome.results.push(action_item_result(item, ctx, strategy));
			},
		Err(err) => {
			warn!(
				error = %err,
				strategy = strategy.kind().as_str(),
				source = "action_items",
				"Source lookup failed."
			);

			outcome.failed_sources.push(ResultType::ActionItem);
		},
	}
	match events {
		Some(Ok(events)) =>
			for event in events
				.iter()
				.filter(|event| matching::matches_buckets(&calendar_text(event), &buckets))
			{
				outcome.results.push(calendar_result(event, ctx, strategy));
			},
		Some(Err(err)) => {
			warn!(
				error = %err,
				strategy = strategy.kind().as_str(),
				source = "calendar_events",
				"Source lookup failed."
			);

			outcome.failed_sources.push(ResultType::CalendarEvent);
		},
		None => {},
	}

	outcome
}

fn counterpart_hints(participants: &[String]) -> Vec<String> {
	AnalyzedQuery { participants: participants.iter().cloned().collect(), ..Default::default() }
		.counterparts()
}

fn window_of(range: &DateRange) -> TimeWindow {
	TimeWindow::new(range.start_instant(), range.end_instant_exclusive())
}

fn meeting_secondary(meeting: &MeetingSummary) -> Vec<&str> {
	meeting.decisions.iter().chain(meeting.action_items.iter()).map(String::as_str).collect()
}

fn meeting_text(meeting: &MeetingSummary) -> String {
	matching::searchable_text(
		std::iter::once(meeting.session_title.as_str()).chain(meeting_secondary(meeting)),
	)
}

fn action_item_secondary(item: &ActionItem) -> Vec<&str> {
	item.description.as_deref().into_iter().chain([item.session_title.as_str()]).collect()
}

fn action_item_text(item: &ActionItem) -> String {
	matching::searchable_text(std::iter::once(item.title.as_str()).chain(action_item_secondary(item)))
}

fn calendar_secondary(event: &CalendarEvent) -> Vec<&str> {
	event.description.as_deref().into_iter().chain(event.location.as_deref()).collect()
}

fn calendar_text(event: &CalendarEvent) -> String {
	matching::searchable_text(std::iter::once(event.title.as_str()).chain(calendar_secondary(event)))
}

fn meeting_result(
	meeting: &MeetingSummary,
	ctx: ExecutionContext<'_>,
	strategy: &SearchStrategy,
) -> SearchResult {
	let candidate = Candidate {
		result_type: ResultType::Meeting,
		title: &meeting.session_title,
		secondary: meeting_secondary(meeting),
		participants: &meeting.participants,
		timestamp: meeting.created_at,
	};
	let mut metadata = base_metadata(strategy);

	metadata.insert("session_id".to_string(), Value::String(meeting.session_id.to_string()));
	metadata.insert("status".to_string(), Value::String(meeting.status.clone()));

	if !meeting.decisions.is_empty() {
		metadata.insert("decisions".to_string(), Value::from(meeting.decisions.clone()));
	}

	SearchResult {
		id: ResultType::Meeting.result_id(meeting.summary_id),
		result_type: ResultType::Meeting,
		title: meeting.session_title.clone(),
		summary: non_empty(&meeting.summary),
		date: meeting.created_at,
		participants: (!meeting.participants.is_empty()).then(|| meeting.participants.clone()),
		relevance: calculate_relevance(&candidate, ctx.query, strategy, ctx.now),
		metadata: Some(metadata),
	}
}

fn action_item_result(
	item: &ActionItem,
	ctx: ExecutionContext<'_>,
	strategy: &SearchStrategy,
) -> SearchResult {
	let assignees = item.assignee.iter().cloned().collect::<Vec<_>>();
	let candidate = Candidate {
		result_type: ResultType::ActionItem,
		title: &item.title,
		secondary: action_item_secondary(item),
		participants: &assignees,
		timestamp: item.session_created_at,
	};
	let mut metadata = base_metadata(strategy);

	metadata.insert("session_id".to_string(), Value::String(item.session_id.to_string()));
	metadata.insert("session_title".to_string(), Value::String(item.session_title.clone()));
	metadata.insert("status".to_string(), Value::String(item.status.clone()));

	if let Some(due_date) = item.due_date {
		metadata.insert("due_date".to_string(), Value::String(due_date.to_string()));
	}

	SearchResult {
		id: ResultType::ActionItem.result_id(item.action_item_id),
		result_type: ResultType::ActionItem,
		title: item.title.clone(),
		summary: item.description.as_deref().and_then(non_empty),
		date: item.session_created_at,
		relevance: calculate_relevance(&candidate, ctx.query, strategy, ctx.now),
		participants: (!assignees.is_empty()).then_some(assignees),
		metadata: Some(metadata),
	}
}

fn calendar_result(
	event: &CalendarEvent,
	ctx: ExecutionContext<'_>,
	strategy: &SearchStrategy,
) -> SearchResult {
	let people =
		event.organizer.iter().chain(event.attendees.iter()).cloned().collect::<Vec<_>>();
	let candidate = Candidate {
		result_type: ResultType::CalendarEvent,
		title: &event.title,
		secondary: calendar_secondary(event),
		participants: &people,
		timestamp: event.start_time,
	};
	let mut metadata = base_metadata(strategy);

	if let Some(url) = &event.meeting_url {
		metadata.insert("meeting_url".to_string(), Value::String(url.clone()));
	}
	if let Some(location) = &event.location {
		metadata.insert("location".to_string(), Value::String(location.clone()));
	}
	if let Some(organizer) = &event.organizer {
		metadata.insert("organizer".to_string(), Value::String(organizer.clone()));
	}
	if let Some(end_time) = event.end_time
		&& let Ok(formatted) = end_time.format(&time::format_description::well_known::Rfc3339)
	{
		metadata.insert("end_time".to_string(), Value::String(formatted));
	}

	SearchResult {
		id: ResultType::CalendarEvent.result_id(event.event_id),
		result_type: ResultType::CalendarEvent,
		title: event.title.clone(),
		summary: event.description.as_deref().and_then(non_empty),
		date: event.start_time,
		relevance: calculate_relevance(&candidate, ctx.query, strategy, ctx.now),
		participants: (!people.is_empty()).then_some(people),
		metadata: Some(metadata),
	}
}

fn base_metadata(strategy: &SearchStrategy) -> Map<String, Value> {
	let mut metadata = Map::new();

	metadata.insert("strategy".to_string(), Value::String(strategy.kind().as_str().to_string()));

	metadata
}

fn non_empty(value: &str) -> Option<String> {
	let trimmed = value.trim();

	(!trimmed.is_empty()).then(|| trimmed.to_string())
}
