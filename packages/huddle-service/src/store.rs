use std::cmp::Reverse;

use uuid::Uuid;

use huddle_storage::{
	db::Db,
	models::{ActionItem, CalendarEvent, MeetingSummary},
	queries::{self, ActionItemFilter, CalendarFilter, MeetingFilter},
};

use crate::{BoxFuture, RecordStore, Result};

pub struct PgRecordStore {
	db: Db,
}
impl PgRecordStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}
impl RecordStore for PgRecordStore {
	fn list_meetings<'a>(
		&'a self,
		user_id: Uuid,
		filter: &'a MeetingFilter,
	) -> BoxFuture<'a, Result<Vec<MeetingSummary>>> {
		Box::pin(async move {
			let meetings = if filter.participants.is_empty() {
				queries::list_meeting_summaries(&self.db, user_id, filter.window, filter.limit).await?
			} else {
				queries::list_meeting_summaries_by_participants(
					&self.db,
					user_id,
					&filter.participants,
					filter.window,
					filter.limit,
				)
				.await?
			};

			Ok(meetings)
		})
	}

	fn list_action_items<'a>(
		&'a self,
		user_id: Uuid,
		filter: &'a ActionItemFilter,
	) -> BoxFuture<'a, Result<Vec<ActionItem>>> {
		Box::pin(async move { Ok(queries::list_open_action_items(&self.db, user_id, filter).await?) })
	}

	fn list_calendar_events<'a>(
		&'a self,
		user_id: Uuid,
		filter: &'a CalendarFilter,
	) -> BoxFuture<'a, Result<Vec<CalendarEvent>>> {
		Box::pin(async move { Ok(queries::list_calendar_events(&self.db, user_id, filter).await?) })
	}
}

/// Record store held in memory, with the same filtering and ordering rules as the Postgres
/// queries. Used for tests and local demos.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
	pub meetings: Vec<MeetingSummary>,
	pub action_items: Vec<ActionItem>,
	pub calendar_events: Vec<CalendarEvent>,
}
impl RecordStore for InMemoryStore {
	fn list_meetings<'a>(
		&'a self,
		user_id: Uuid,
		filter: &'a MeetingFilter,
	) -> BoxFuture<'a, Result<Vec<MeetingSummary>>> {
		let mut meetings = self
			.meetings
			.iter()
			.filter(|meeting| meeting.user_id == user_id && filter.admits(meeting))
			.cloned()
			.collect::<Vec<_>>();

		meetings.sort_by_key(|meeting| Reverse(meeting.created_at));
		meetings.truncate(filter.limit as usize);

		Box::pin(async move { Ok(meetings) })
	}

	fn list_action_items<'a>(
		&'a self,
		user_id: Uuid,
		filter: &'a ActionItemFilter,
	) -> BoxFuture<'a, Result<Vec<ActionItem>>> {
		let mut items = self
			.action_items
			.iter()
			.filter(|item| item.user_id == user_id && filter.admits(item))
			.cloned()
			.collect::<Vec<_>>();

		items.sort_by_key(|item| (Reverse(item.session_created_at), Reverse(item.created_at)));
		items.truncate(filter.limit as usize);

		Box::pin(async move { Ok(items) })
	}

	fn list_calendar_events<'a>(
		&'a self,
		user_id: Uuid,
		filter: &'a CalendarFilter,
	) -> BoxFuture<'a, Result<Vec<CalendarEvent>>> {
		let mut events = self
			.calendar_events
			.iter()
			.filter(|event| event.user_id == user_id && filter.admits(event))
			.cloned()
			.collect::<Vec<_>>();

		events.sort_by_key(|event| event.start_time);
		events.truncate(filter.limit as usize);

		Box::pin(async move { Ok(events) })
	}
}
