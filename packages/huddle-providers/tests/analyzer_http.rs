use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use axum::{Json, Router, extract::State, http::HeaderMap, routing::post};
use serde_json::{Map, Value};
use time::macros::date;
use tokio::net::TcpListener;

use huddle_config::LlmProviderConfig;
use huddle_providers::{Error, analyzer};

#[derive(Clone)]
struct Stub {
	calls: Arc<AtomicUsize>,
	replies: Arc<Vec<String>>,
}

async fn chat(State(stub): State<Stub>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
	let call = stub.calls.fetch_add(1, Ordering::SeqCst);
	let content = stub.replies.get(call).or(stub.replies.last()).cloned().unwrap_or_default();

	assert_eq!(headers.get("authorization").and_then(|v| v.to_str().ok()), Some("Bearer test-key"));
	assert_eq!(body["model"], "m");

	Json(serde_json::json!({ "choices": [{ "message": { "content": content } }] }))
}

async fn serve(replies: &[&str]) -> (LlmProviderConfig, Arc<AtomicUsize>) {
	let calls = Arc::new(AtomicUsize::new(0));
	let stub = Stub {
		calls: calls.clone(),
		replies: Arc::new(replies.iter().map(|reply| reply.to_string()).collect()),
	};
	let app = Router::new().route("/v1/chat/completions", post(chat)).with_state(stub);
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind stub server.");
	let addr = listener.local_addr().expect("Failed to read stub address.");

	tokio::spawn(async move {
		let _ = axum::serve(listener, app).await;
	});

	let cfg = LlmProviderConfig {
		provider_id: "stub".to_string(),
		api_base: format!("http://{addr}"),
		api_key: "test-key".to_string(),
		path: "/v1/chat/completions".to_string(),
		model: "m".to_string(),
		temperature: 0.0,
		timeout_ms: 2_000,
		default_headers: Map::new(),
	};

	(cfg, calls)
}

#[tokio::test]
async fn retries_until_content_parses() {
	let (cfg, calls) =
		serve(&["not json", "{\"intent\": \"general\", \"keywords\": [\"acme\"]}"]).await;
	let value = analyzer::analyze_query(&cfg, "acme", date!(2025 - 05 - 15))
		.await
		.expect("Analyzer must recover on the second attempt.");

	assert_eq!(value["keywords"][0], "acme");
	assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn gives_up_after_three_unparseable_replies() {
	let (cfg, calls) = serve(&["nope"]).await;
	let err = analyzer::analyze_query(&cfg, "acme", date!(2025 - 05 - 15))
		.await
		.expect_err("Analyzer must fail on persistent garbage.");

	assert!(matches!(err, Error::InvalidResponse { .. }));
	assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn builds_bearer_auth_header() {
	let mut extra = Map::new();

	extra.insert("x-org".to_string(), Value::String("huddle".to_string()));

	let headers = huddle_providers::auth_headers("secret", &extra).expect("Failed to build headers.");

	assert_eq!(headers.get("authorization").expect("Missing authorization header."), "Bearer secret");
	assert_eq!(headers.get("x-org").expect("Missing default header."), "huddle");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut extra = Map::new();

	extra.insert("x-retries".to_string(), Value::from(3));

	assert!(matches!(
		huddle_providers::auth_headers("secret", &extra),
		Err(Error::InvalidConfig { .. })
	));
}
