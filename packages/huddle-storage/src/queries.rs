//! Per-user record lookups and the insert helpers used for seeding.
//!
//! Every lookup is scoped to one `user_id`, bounded by a [`TimeWindow`], and limited. Keyword
//! filtering is not done here; callers match keywords on the returned rows.

use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Error, Result,
	db::Db,
	models::{ActionItem, CalendarEvent, MeetingSummary, Session},
};

pub const MEETING_STATUS_COMPLETED: &str = "completed";
pub const OPEN_ACTION_ITEM_STATUSES: [&str; 3] = ["pending", "in_progress", "todo"];

/// Half-open instant window `[from, before)`. A missing bound does not narrow the lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
	pub from: Option<OffsetDateTime>,
	pub before: Option<OffsetDateTime>,
}
impl TimeWindow {
	pub fn new(from: Option<OffsetDateTime>, before: Option<OffsetDateTime>) -> Self {
		Self { from, before }
	}

	pub fn contains(&self, instant: OffsetDateTime) -> bool {
		self.from.is_none_or(|from| instant >= from)
			&& self.before.is_none_or(|before| instant < before)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeetingFilter {
	pub window: TimeWindow,
	/// Case-insensitive substrings; a meeting matches when any participant contains any hint.
	pub participants: Vec<String>,
	pub limit: u32,
}
impl MeetingFilter {
	pub fn admits(&self, meeting: &MeetingSummary) -> bool {
		meeting.status == MEETING_STATUS_COMPLETED
			&& self.window.contains(meeting.created_at)
			&& (self.participants.is_empty()
				|| any_contains(meeting.participants.iter().map(String::as_str), &self.participants))
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionItemFilter {
	/// Applied to the parent session's creation time.
	pub window: TimeWindow,
	pub assignees: Vec<String>,
	pub limit: u32,
}
impl ActionItemFilter {
	pub fn admits(&self, item: &ActionItem) -> bool {
		is_open_status(&item.status)
			&& self.window.contains(item.session_created_at)
			&& (self.assignees.is_empty()
				|| any_contains(item.assignee.as_deref(), &self.assignees))
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarFilter {
	/// Applied to the event start time.
	pub window: TimeWindow,
	/// Matched against the organizer and every attendee.
	pub attendees: Vec<String>,
	pub limit: u32,
}
impl CalendarFilter {
	pub fn admits(&self, event: &CalendarEvent) -> bool {
		let people =
			event.organizer.as_deref().into_iter().chain(event.attendees.iter().map(String::as_str));

		self.window.contains(event.start_time)
			&& (self.attendees.is_empty() || any_contains(people, &self.attendees))
	}
}

pub fn is_open_status(status: &str) -> bool {
	OPEN_ACTION_ITEM_STATUSES.contains(&status)
}

/// `ILIKE` pattern matching `hint` anywhere, with `%`, `_` and `\` taken literally.
pub fn like_pattern(hint: &str) -> String {
	let hint = hint.trim();
	let mut out = String::with_capacity(hint.len() + 2);

	out.push('%');

	for ch in hint.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			out.push('\\');
		}

		out.push(ch);
	}

	out.push('%');

	out
}

/// Completed meeting summaries, newest first.
pub async fn list_meeting_summaries(
	db: &Db,
	user_id: Uuid,
	window: TimeWindow,
	limit: u32,
) -> Result<Vec<MeetingSummary>> {
	let limit = checked_limit(limit)?;
	let mut builder = meeting_select(user_id);

	push_window(&mut builder, "ms.created_at", window);
	builder.push(" ORDER BY ms.created_at DESC LIMIT ").push_bind(limit);

	Ok(builder.build_query_as::<MeetingSummary>().fetch_all(&db.pool).await?)
}

/// Completed meeting summaries with at least one participant containing one of `participants`.
/// An empty hint list matches nothing.
pub async fn list_meeting_summaries_by_participants(
	db: &Db,
	user_id: Uuid,
	participants: &[String],
	window: TimeWindow,
	limit: u32,
) -> Result<Vec<MeetingSummary>> {
	let limit = checked_limit(limit)?;
	let patterns = like_patterns(participants);

	if patterns.is_empty() {
		return Ok(Vec::new());
	}

	let mut builder = meeting_select(user_id);

	push_window(&mut builder, "ms.created_at", window);
	builder
		.push(" AND EXISTS (SELECT 1 FROM unnest(ms.participants) AS p(name) WHERE p.name ILIKE ANY(")
		.push_bind(patterns)
		.push("))")
		.push(" ORDER BY ms.created_at DESC LIMIT ")
		.push_bind(limit);

	Ok(builder.build_query_as::<MeetingSummary>().fetch_all(&db.pool).await?)
}

/// Action items in a non-terminal status, newest session first.
pub async fn list_open_action_items(
	db: &Db,
	user_id: Uuid,
	filter: &ActionItemFilter,
) -> Result<Vec<ActionItem>> {
	let limit = checked_limit(filter.limit)?;
	let statuses =
		OPEN_ACTION_ITEM_STATUSES.iter().map(|status| status.to_string()).collect::<Vec<_>>();
	let mut builder = QueryBuilder::<Postgres>::new(
		"\
SELECT
	ai.action_item_id,
	ai.session_id,
	ai.user_id,
	s.title AS session_title,
	s.created_at AS session_created_at,
	ai.title,
	ai.description,
	ai.assignee,
	ai.status,
	ai.due_date,
	ai.created_at
FROM action_items ai
JOIN sessions s ON s.session_id = ai.session_id
WHERE ai.user_id = ",
	);

	builder.push_bind(user_id).push(" AND ai.status = ANY(").push_bind(statuses).push(")");
	push_window(&mut builder, "s.created_at", filter.window);

	let patterns = like_patterns(&filter.assignees);

	if !patterns.is_empty() {
		builder.push(" AND ai.assignee ILIKE ANY(").push_bind(patterns).push(")");
	}

	builder.push(" ORDER BY s.created_at DESC, ai.created_at DESC LIMIT ").push_bind(limit);

	Ok(builder.build_query_as::<ActionItem>().fetch_all(&db.pool).await?)
}

/// Calendar events ordered by start time, soonest first.
pub async fn list_calendar_events(
	db: &Db,
	user_id: Uuid,
	filter: &CalendarFilter,
) -> Result<Vec<CalendarEvent>> {
	let limit = checked_limit(filter.limit)?;
	let mut builder = QueryBuilder::<Postgres>::new(
		"\
SELECT
	event_id,
	user_id,
	title,
	description,
	organizer,
	attendees,
	start_time,
	end_time,
	meeting_url,
	location,
	created_at
FROM calendar_events
WHERE user_id = ",
	);

	builder.push_bind(user_id);
	push_window(&mut builder, "start_time", filter.window);

	let patterns = like_patterns(&filter.attendees);

	if !patterns.is_empty() {
		builder
			.push(" AND (organizer ILIKE ANY(")
			.push_bind(patterns.clone())
			.push(") OR EXISTS (SELECT 1 FROM unnest(attendees) AS a(name) WHERE a.name ILIKE ANY(")
			.push_bind(patterns)
			.push(")))");
	}

	builder.push(" ORDER BY start_time ASC LIMIT ").push_bind(limit);

	Ok(builder.build_query_as::<CalendarEvent>().fetch_all(&db.pool).await?)
}

pub async fn insert_session(db: &Db, session: &Session) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO sessions (session_id, user_id, title, status, created_at)
VALUES ($1, $2, $3, $4, $5)",
	)
	.bind(session.session_id)
	.bind(session.user_id)
	.bind(session.title.as_str())
	.bind(session.status.as_str())
	.bind(session.created_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// `session_title` is read from the parent session and ignored here.
pub async fn insert_meeting_summary(db: &Db, meeting: &MeetingSummary) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO meeting_summaries (
	summary_id,
	session_id,
	user_id,
	summary,
	decisions,
	action_items,
	participants,
	status,
	created_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
	)
	.bind(meeting.summary_id)
	.bind(meeting.session_id)
	.bind(meeting.user_id)
	.bind(meeting.summary.as_str())
	.bind(&meeting.decisions)
	.bind(&meeting.action_items)
	.bind(&meeting.participants)
	.bind(meeting.status.as_str())
	.bind(meeting.created_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// `session_title` and `session_created_at` are read from the parent session and ignored here.
pub async fn insert_action_item(db: &Db, item: &ActionItem) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO action_items (
	action_item_id,
	session_id,
	user_id,
	title,
	description,
	assignee,
	status,
	due_date,
	created_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
	)
	.bind(item.action_item_id)
	.bind(item.session_id)
	.bind(item.user_id)
	.bind(item.title.as_str())
	.bind(item.description.as_deref())
	.bind(item.assignee.as_deref())
	.bind(item.status.as_str())
	.bind(item.due_date)
	.bind(item.created_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn insert_calendar_event(db: &Db, event: &CalendarEvent) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO calendar_events (
	event_id,
	user_id,
	title,
	description,
	organizer,
	attendees,
	start_time,
	end_time,
	meeting_url,
	location,
	created_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
	)
	.bind(event.event_id)
	.bind(event.user_id)
	.bind(event.title.as_str())
	.bind(event.description.as_deref())
	.bind(event.organizer.as_deref())
	.bind(&event.attendees)
	.bind(event.start_time)
	.bind(event.end_time)
	.bind(event.meeting_url.as_deref())
	.bind(event.location.as_deref())
	.bind(event.created_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

fn meeting_select(user_id: Uuid) -> QueryBuilder<'static, Postgres> {
	let mut builder = QueryBuilder::<Postgres>::new(
		"\
SELECT
	ms.summary_id,
	ms.session_id,
	ms.user_id,
	s.title AS session_title,
	ms.summary,
	ms.decisions,
	ms.action_items,
	ms.participants,
	ms.status,
	ms.created_at
FROM meeting_summaries ms
JOIN sessions s ON s.session_id = ms.session_id
WHERE ms.user_id = ",
	);

	builder.push_bind(user_id).push(" AND ms.status = ").push_bind(MEETING_STATUS_COMPLETED);

	builder
}

fn push_window(builder: &mut QueryBuilder<'_, Postgres>, column: &str, window: TimeWindow) {
	if let Some(from) = window.from {
		builder.push(format!(" AND {column} >= ")).push_bind(from);
	}
	if let Some(before) = window.before {
		builder.push(format!(" AND {column} < ")).push_bind(before);
	}
}

fn checked_limit(limit: u32) -> Result<i64> {
	if limit == 0 {
		return Err(Error::InvalidArgument("limit must be greater than zero.".to_string()));
	}

	Ok(i64::from(limit))
}

fn like_patterns(hints: &[String]) -> Vec<String> {
	hints.iter().filter(|hint| !hint.trim().is_empty()).map(|hint| like_pattern(hint)).collect()
}

fn any_contains<'a>(values: impl IntoIterator<Item = &'a str>, hints: &[String]) -> bool {
	values.into_iter().any(|value| {
		let value = value.to_lowercase();

		hints.iter().any(|hint| {
			let hint = hint.trim().to_lowercase();

			!hint.is_empty() && value.contains(hint.as_str())
		})
	})
}
