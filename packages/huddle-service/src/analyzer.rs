use std::collections::BTreeSet;

use serde_json::Value;
use time::Date;

use huddle_config::LlmProviderConfig;
use huddle_domain::{AnalyzedQuery, DateRange, Intent, time_serde::date};

use crate::{BoxFuture, Error, QueryAnalyzer, Result};

/// Deterministic analyzer backed by the cue-word rules in `huddle_domain::analyzer`.
pub struct RuleAnalyzer;
impl QueryAnalyzer for RuleAnalyzer {
	fn analyze<'a>(
		&'a self,
		raw_query: &'a str,
		today: Date,
	) -> BoxFuture<'a, Result<AnalyzedQuery>> {
		let query = huddle_domain::analyzer::analyze(raw_query, today);

		Box::pin(async move { Ok(query) })
	}
}

pub struct LlmAnalyzer {
	cfg: LlmProviderConfig,
}
impl LlmAnalyzer {
	pub fn new(cfg: LlmProviderConfig) -> Self {
		Self { cfg }
	}
}
impl QueryAnalyzer for LlmAnalyzer {
	fn analyze<'a>(
		&'a self,
		raw_query: &'a str,
		today: Date,
	) -> BoxFuture<'a, Result<AnalyzedQuery>> {
		Box::pin(async move {
			let value = huddle_providers::analyzer::analyze_query(&self.cfg, raw_query, today)
				.await
				.map_err(|err| Error::AnalysisFailed { message: err.to_string() })?;

			parse_analyzed_query(&value)
		})
	}
}

/// Reads the analyzer JSON contract: `{intent, keywords, participants, date_range: {start, end}}`.
///
/// Missing fields are empty, unknown intents are `general`, and unparseable date bounds are
/// dropped. Anything other than a JSON object is an analysis failure.
pub fn parse_analyzed_query(value: &Value) -> Result<AnalyzedQuery> {
	let Some(object) = value.as_object() else {
		return Err(Error::AnalysisFailed {
			message: "Analyzer output must be a JSON object.".to_string(),
		});
	};
	let intent = object
		.get("intent")
		.and_then(Value::as_str)
		.and_then(Intent::parse)
		.unwrap_or_default();
	let keywords = strings(object.get("keywords"));
	let participants = strings(object.get("participants")).into_iter().collect::<BTreeSet<_>>();
	let date_range = object.get("date_range").or_else(|| object.get("dateRange")).and_then(|range| {
		let start = range.get("start").and_then(Value::as_str).and_then(|raw| date::parse(raw).ok());
		let end = range.get("end").and_then(Value::as_str).and_then(|raw| date::parse(raw).ok());

		match (start, end) {
			(Some(start), Some(end)) => Some(DateRange::between(start, end)),
			(start, end) => Some(DateRange::new(start, end)),
		}
	});

	Ok(AnalyzedQuery { intent, keywords, participants, date_range, signals: Vec::new() }
		.normalized())
}

fn strings(value: Option<&Value>) -> Vec<String> {
	value
		.and_then(Value::as_array)
		.map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
		.unwrap_or_default()
}
