//! LLM-backed query analysis over an OpenAI-compatible chat completion endpoint.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use time::Date;

use crate::{Error, Result};

const MAX_ATTEMPTS: usize = 3;
const SYSTEM_PROMPT: &str = "\
You turn a user's search over their meetings, action items, and calendar into JSON. \
Reply with one JSON object and nothing else, shaped as \
{\"intent\": \"general\" | \"action_items\" | \"schedule\" | \"participant_lookup\", \
\"keywords\": [string], \"participants\": [string], \
\"date_range\": {\"start\": \"YYYY-MM-DD\" | null, \"end\": \"YYYY-MM-DD\" | null} | null}. \
Keywords are lower-case topic words or quoted phrases; leave out filler words. \
Use \"self\" in participants when the user refers to themselves. \
Resolve relative dates against the provided date; \"last month\" means the 30 days ending today.";

pub fn build_messages(raw_query: &str, today: Date) -> Vec<Value> {
	vec![
		serde_json::json!({ "role": "system", "content": SYSTEM_PROMPT }),
		serde_json::json!({
			"role": "user",
			"content": format!("Today is {today}.\nQuery: {raw_query}"),
		}),
	]
}

/// Returns the JSON object the model produced for `raw_query`.
///
/// Transport and HTTP status errors fail immediately. Replies without parseable JSON content are
/// retried, up to three requests in total.
pub async fn analyze_query(
	cfg: &huddle_config::LlmProviderConfig,
	raw_query: &str,
	today: Date,
) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base.trim_end_matches('/'), cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": build_messages(raw_query, today),
	});
	let mut last_err = None;

	for _ in 0..MAX_ATTEMPTS {
		let res = client
			.post(&url)
			.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		match parse_content_json(json) {
			Ok(parsed) => return Ok(parsed),
			Err(err) => last_err = Some(err),
		}
	}

	Err(last_err.unwrap_or_else(|| Error::InvalidResponse {
		message: "Analyzer returned no response.".to_string(),
	}))
}

fn parse_content_json(json: Value) -> Result<Value> {
	if let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
	{
		let parsed: Value = serde_json::from_str(strip_code_fence(content)).map_err(|_| {
			Error::InvalidResponse { message: "Analyzer content is not valid JSON.".to_string() }
		})?;

		if !parsed.is_object() {
			return Err(Error::InvalidResponse {
				message: "Analyzer content must be a JSON object.".to_string(),
			});
		}

		return Ok(parsed);
	}

	Err(Error::InvalidResponse { message: "Analyzer response is missing JSON content.".to_string() })
}

fn strip_code_fence(content: &str) -> &str {
	let trimmed = content.trim();
	let Some(inner) = trimmed.strip_prefix("```") else { return trimmed };
	let inner = inner.strip_prefix("json").unwrap_or(inner);

	inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
	use time::macros::date;

	use super::*;

	fn reply(content: &str) -> Value {
		serde_json::json!({ "choices": [{ "message": { "content": content } }] })
	}

	#[test]
	fn parses_choice_content_json() {
		let parsed = parse_content_json(reply("{\"intent\": \"general\", \"keywords\": [\"acme\"]}"))
			.expect("Failed to parse content.");

		assert_eq!(parsed["keywords"][0], "acme");
	}

	#[test]
	fn accepts_fenced_json() {
		let parsed = parse_content_json(reply("```json\n{\"intent\": \"schedule\"}\n```"))
			.expect("Failed to parse fenced content.");

		assert_eq!(parsed["intent"], "schedule");
	}

	#[test]
	fn rejects_prose_and_non_objects() {
		assert!(parse_content_json(reply("Sure! Here you go.")).is_err());
		assert!(parse_content_json(reply("[1, 2]")).is_err());
		assert!(parse_content_json(serde_json::json!({ "id": "x" })).is_err());
	}

	#[test]
	fn messages_carry_the_reference_date() {
		let messages = build_messages("acme last month", date!(2025 - 05 - 15));

		assert_eq!(messages.len(), 2);
		assert_eq!(messages[0]["role"], "system");
		assert_eq!(messages[1]["content"], "Today is 2025-05-15.\nQuery: acme last month");
	}
}
