pub mod analyzer;
pub mod executor;
pub mod search;
pub mod store;

mod error;

pub use analyzer::{LlmAnalyzer, RuleAnalyzer, parse_analyzed_query};
pub use error::{Error, Result};
pub use search::{SearchRequest, SearchResponse};
pub use store::{InMemoryStore, PgRecordStore};

use std::{future::Future, pin::Pin, sync::Arc};

use time::Date;
use uuid::Uuid;

use huddle_config::{ANALYZER_MODE_LLM, Config};
use huddle_domain::AnalyzedQuery;
use huddle_storage::{
	db::Db,
	models::{ActionItem, CalendarEvent, MeetingSummary},
	queries::{ActionItemFilter, CalendarFilter, MeetingFilter},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Turns a raw query into its structured form. Any failure is fatal for the request.
pub trait QueryAnalyzer
where
	Self: Send + Sync,
{
	fn analyze<'a>(
		&'a self,
		raw_query: &'a str,
		today: Date,
	) -> BoxFuture<'a, Result<AnalyzedQuery>>;
}

/// Per-user record lookups backing every strategy.
pub trait RecordStore
where
	Self: Send + Sync,
{
	fn list_meetings<'a>(
		&'a self,
		user_id: Uuid,
		filter: &'a MeetingFilter,
	) -> BoxFuture<'a, Result<Vec<MeetingSummary>>>;

	fn list_action_items<'a>(
		&'a self,
		user_id: Uuid,
		filter: &'a ActionItemFilter,
	) -> BoxFuture<'a, Result<Vec<ActionItem>>>;

	fn list_calendar_events<'a>(
		&'a self,
		user_id: Uuid,
		filter: &'a CalendarFilter,
	) -> BoxFuture<'a, Result<Vec<CalendarEvent>>>;
}

pub struct HuddleService {
	pub cfg: Config,
	pub store: Arc<dyn RecordStore>,
	pub analyzer: Arc<dyn QueryAnalyzer>,
}
impl HuddleService {
	/// Postgres-backed service using the analyzer selected by `analyzer.mode`.
	pub fn new(cfg: Config, db: Db) -> Result<Self> {
		let analyzer = analyzer_from_config(&cfg)?;

		Ok(Self { cfg, store: Arc::new(PgRecordStore::new(db)), analyzer })
	}

	pub fn with_parts(
		cfg: Config,
		store: Arc<dyn RecordStore>,
		analyzer: Arc<dyn QueryAnalyzer>,
	) -> Self {
		Self { cfg, store, analyzer }
	}
}

pub fn analyzer_from_config(cfg: &Config) -> Result<Arc<dyn QueryAnalyzer>> {
	if cfg.analyzer.mode != ANALYZER_MODE_LLM {
		return Ok(Arc::new(RuleAnalyzer));
	}

	let Some(llm) = cfg.analyzer.llm.clone() else {
		return Err(Error::Provider {
			message: "analyzer.llm must be configured when analyzer.mode is llm.".to_string(),
		});
	};

	Ok(Arc::new(LlmAnalyzer::new(llm)))
}
