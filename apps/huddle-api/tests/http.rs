use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::Value;
use time::{Duration, OffsetDateTime};
use tower::util::ServiceExt;
use uuid::Uuid;

use huddle_api::{routes, state::AppState};
use huddle_domain::AnalyzedQuery;
use huddle_service::{
	BoxFuture, Error, HuddleService, InMemoryStore, QueryAnalyzer, Result, RuleAnalyzer,
};
use huddle_storage::models::MeetingSummary;

struct UnreachableAnalyzer;
impl QueryAnalyzer for UnreachableAnalyzer {
	fn analyze<'a>(
		&'a self,
		_raw_query: &'a str,
		_today: time::Date,
	) -> BoxFuture<'a, Result<AnalyzedQuery>> {
		Box::pin(async move {
			Err(Error::AnalysisFailed { message: "LLM returned unparseable content.".to_string() })
		})
	}
}

fn test_config(api_auth_token: Option<&str>) -> huddle_config::Config {
	let token_line =
		api_auth_token.map(|token| format!("api_auth_token = \"{token}\"")).unwrap_or_default();
	let raw = format!(
		r#"
[service]
http_bind = "127.0.0.1:0"
log_level = "info"

[storage.postgres]
dsn            = "postgres://localhost/huddle"
pool_max_conns = 1

[security]
bind_localhost_only = true
{token_line}
"#
	);

	huddle_config::parse(&raw, "http-tests").expect("Test config must be valid.")
}

fn meeting(user_id: Uuid, title: &str, days_ago: i64) -> MeetingSummary {
	MeetingSummary {
		summary_id: Uuid::new_v4(),
		session_id: Uuid::new_v4(),
		user_id,
		session_title: title.to_string(),
		summary: format!("Notes from {title}."),
		decisions: vec!["Ship the pilot in June".to_string()],
		action_items: Vec::new(),
		participants: vec!["Sarah Chen".to_string()],
		status: "completed".to_string(),
		created_at: OffsetDateTime::now_utc() - Duration::days(days_ago),
	}
}

fn app_with(
	store: InMemoryStore,
	analyzer: Arc<dyn QueryAnalyzer>,
	api_auth_token: Option<&str>,
) -> Router {
	let service =
		HuddleService::with_parts(test_config(api_auth_token), Arc::new(store), analyzer);

	routes::router(AppState::from_service(service))
}

fn app(store: InMemoryStore) -> Router {
	app_with(store, Arc::new(RuleAnalyzer), None)
}

fn search_request(user_id: Option<&str>, body: Value) -> Request<Body> {
	let mut builder = Request::builder()
		.method("POST")
		.uri("/search")
		.header("content-type", "application/json");

	if let Some(user_id) = user_id {
		builder = builder.header("X-Huddle-User-Id", user_id);
	}

	builder.body(Body::from(body.to_string())).expect("Failed to build request.")
}

fn health_request() -> Request<Body> {
	Request::builder().uri("/health").body(Body::empty()).expect("Failed to build request.")
}

async fn json_body(response: axum::response::Response) -> Value {
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");

	serde_json::from_slice(&bytes).expect("Failed to parse response.")
}

#[tokio::test]
async fn health_ok() {
	let response = app(InMemoryStore::default())
		.oneshot(health_request())
		.await
		.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn search_returns_ranked_results() {
	let user_id = Uuid::new_v4();
	let store = InMemoryStore {
		meetings: vec![
			meeting(user_id, "Acme kickoff", 2),
			meeting(user_id, "Globex sync", 1),
			meeting(Uuid::new_v4(), "Acme for another user", 1),
		],
		..Default::default()
	};
	let response = app(store)
		.oneshot(search_request(
			Some(&user_id.to_string()),
			serde_json::json!({ "query": "acme", "maxResults": 5 }),
		))
		.await
		.expect("Failed to call /search.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["query"]["intent"], "general");
	assert_eq!(json["query"]["keywords"][0], "acme");
	assert_eq!(json["searchPlan"]["strategies"][0]["type"], "topic");
	assert_eq!(json["searchPlan"]["fallbackStrategy"]["type"], "entity");
	assert_eq!(json["totalFound"], 1);
	assert_eq!(json["executedStrategies"], 2);
	assert_eq!(json["results"][0]["type"], "meeting");
	assert_eq!(json["results"][0]["title"], "Acme kickoff");
	assert!(json["results"][0]["id"].as_str().is_some_and(|id| id.starts_with("meeting_")));
	assert!(json["results"][0]["relevance"]["score"].as_f64().is_some_and(|score| score > 0.0));
}

#[tokio::test]
async fn empty_results_are_ok() {
	let response = app(InMemoryStore::default())
		.oneshot(search_request(
			Some(&Uuid::new_v4().to_string()),
			serde_json::json!({ "query": "quarterly roadmap" }),
		))
		.await
		.expect("Failed to call /search.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["results"], serde_json::json!([]));
	assert_eq!(json["totalFound"], 0);
}

#[tokio::test]
async fn missing_or_malformed_user_header_is_rejected() {
	for user_id in [None, Some("not-a-uuid")] {
		let response = app(InMemoryStore::default())
			.oneshot(search_request(user_id, serde_json::json!({ "query": "acme" })))
			.await
			.expect("Failed to call /search.");

		assert_eq!(response.status(), StatusCode::BAD_REQUEST);

		let json = json_body(response).await;

		assert_eq!(json["error_code"], "INVALID_REQUEST");
		assert_eq!(json["fields"][0], routes::HEADER_USER_ID);
	}
}

#[tokio::test]
async fn invalid_bodies_are_rejected() {
	let user_id = Uuid::new_v4().to_string();

	for body in [
		serde_json::json!({ "query": "  " }),
		serde_json::json!({ "query": "acme", "maxResults": 0 }),
		serde_json::json!({ "query": "acme", "timeoutMs": 0 }),
		serde_json::json!({ "maxResults": 5 }),
	] {
		let response = app(InMemoryStore::default())
			.oneshot(search_request(Some(&user_id), body))
			.await
			.expect("Failed to call /search.");

		assert_eq!(response.status(), StatusCode::BAD_REQUEST);

		let json = json_body(response).await;

		assert_eq!(json["error_code"], "INVALID_REQUEST");
	}
}

#[tokio::test]
async fn analyzer_failure_is_bad_gateway() {
	let response = app_with(InMemoryStore::default(), Arc::new(UnreachableAnalyzer), None)
		.oneshot(search_request(
			Some(&Uuid::new_v4().to_string()),
			serde_json::json!({ "query": "acme" }),
		))
		.await
		.expect("Failed to call /search.");

	assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

	let json = json_body(response).await;

	assert_eq!(json["error_code"], "ANALYSIS_FAILED");
	assert!(json.get("results").is_none());
}

#[tokio::test]
async fn bearer_token_guards_search_but_not_health() {
	let user_id = Uuid::new_v4().to_string();
	let app = app_with(InMemoryStore::default(), Arc::new(RuleAnalyzer), Some("s3cret"));
	let health = app
		.clone()
		.oneshot(health_request())
		.await
		.expect("Failed to call /health.");

	assert_eq!(health.status(), StatusCode::OK);

	let anonymous = app
		.clone()
		.oneshot(search_request(Some(&user_id), serde_json::json!({ "query": "acme" })))
		.await
		.expect("Failed to call /search.");

	assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(json_body(anonymous).await["error_code"], "UNAUTHORIZED");

	let mut authorized = search_request(Some(&user_id), serde_json::json!({ "query": "acme" }));

	authorized.headers_mut().insert(
		axum::http::header::AUTHORIZATION,
		axum::http::HeaderValue::from_static("Bearer s3cret"),
	);

	let response = app.oneshot(authorized).await.expect("Failed to call /search.");

	assert_eq!(response.status(), StatusCode::OK);
}
