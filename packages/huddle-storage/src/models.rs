use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
	pub session_id: Uuid,
	pub user_id: Uuid,
	pub title: String,
	pub status: String,
	pub created_at: OffsetDateTime,
}

/// Summary of one recorded session, joined with its session title.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MeetingSummary {
	pub summary_id: Uuid,
	pub session_id: Uuid,
	pub user_id: Uuid,
	pub session_title: String,
	pub summary: String,
	pub decisions: Vec<String>,
	pub action_items: Vec<String>,
	pub participants: Vec<String>,
	pub status: String,
	pub created_at: OffsetDateTime,
}

/// Action item joined with the session it came out of.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActionItem {
	pub action_item_id: Uuid,
	pub session_id: Uuid,
	pub user_id: Uuid,
	pub session_title: String,
	pub session_created_at: OffsetDateTime,
	pub title: String,
	pub description: Option<String>,
	pub assignee: Option<String>,
	pub status: String,
	pub due_date: Option<Date>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CalendarEvent {
	pub event_id: Uuid,
	pub user_id: Uuid,
	pub title: String,
	pub description: Option<String>,
	pub organizer: Option<String>,
	pub attendees: Vec<String>,
	pub start_time: OffsetDateTime,
	pub end_time: Option<OffsetDateTime>,
	pub meeting_url: Option<String>,
	pub location: Option<String>,
	pub created_at: OffsetDateTime,
}
