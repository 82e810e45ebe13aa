use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
	Meeting,
	ActionItem,
	CalendarEvent,
}
impl ResultType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Meeting => "meeting",
			Self::ActionItem => "action_item",
			Self::CalendarEvent => "calendar_event",
		}
	}

	/// Deduplication key shared by every copy of the same source record.
	pub fn result_id(self, source_id: impl std::fmt::Display) -> String {
		format!("{}_{source_id}", self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relevance {
	pub score: f32,
	pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
	pub id: String,
	#[serde(rename = "type")]
	pub result_type: ResultType,
	pub title: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub summary: Option<String>,
	#[serde(with = "crate::time_serde")]
	pub date: OffsetDateTime,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub participants: Option<Vec<String>>,
	pub relevance: Relevance,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<Map<String, Value>>,
}
