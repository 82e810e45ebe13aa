use axum::{
	Json, Router,
	body::Body,
	extract::{State, rejection::JsonRejection},
	http::{HeaderMap, Request, StatusCode, header::AUTHORIZATION},
	middleware::{self, Next},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use huddle_service::{Error as ServiceError, SearchRequest, SearchResponse};

use crate::state::AppState;

/// Identifies the already-authenticated caller. Header names are case-insensitive.
pub const HEADER_USER_ID: &str = "x-huddle-user-id";

/// Wire body of `POST /search`. The user comes from [`HEADER_USER_ID`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBody {
	pub query: String,
	#[serde(default)]
	pub max_results: Option<u32>,
	#[serde(default)]
	pub timeout_ms: Option<u64>,
}

pub fn router(state: AppState) -> Router {
	let search_routes = Router::new()
		.route("/search", post(search))
		.route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

	Router::new().route("/health", get(health)).merge(search_routes).with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	headers: HeaderMap,
	payload: Result<Json<SearchBody>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
	let user_id = read_user_id(&headers)?;
	let Json(body) = payload.map_err(|err| {
		json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", err.body_text(), None)
	})?;
	let response = state
		.service
		.search(SearchRequest {
			user_id,
			query: body.query,
			max_results: body.max_results,
			timeout_ms: body.timeout_ms,
		})
		.await?;

	Ok(Json(response))
}

async fn auth_middleware(
	State(state): State<AppState>,
	req: Request<Body>,
	next: Next,
) -> Response {
	if let Some(expected) = state.auth_token.as_deref()
		&& read_bearer_token(req.headers()) != Some(expected)
	{
		return json_error(
			StatusCode::UNAUTHORIZED,
			"UNAUTHORIZED",
			"A valid Bearer token is required.",
			None,
		)
		.into_response();
	}

	next.run(req).await
}

fn read_bearer_token(headers: &HeaderMap) -> Option<&str> {
	let raw = headers.get(AUTHORIZATION)?;
	let value = raw.to_str().ok()?.trim();
	let token = value.strip_prefix("Bearer ")?.trim();

	if token.is_empty() { None } else { Some(token) }
}

fn read_user_id(headers: &HeaderMap) -> Result<Uuid, ApiError> {
	let invalid = |message: &str| {
		json_error(
			StatusCode::BAD_REQUEST,
			"INVALID_REQUEST",
			message,
			Some(vec![HEADER_USER_ID.to_string()]),
		)
	};
	let Some(raw) = headers.get(HEADER_USER_ID) else {
		return Err(invalid("X-Huddle-User-Id header is required."));
	};
	let raw = raw.to_str().map_err(|_| invalid("X-Huddle-User-Id must be a UUID."))?;

	Uuid::parse_str(raw.trim()).map_err(|_| invalid("X-Huddle-User-Id must be a UUID."))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, None),
			ServiceError::AnalysisFailed { message } =>
				json_error(StatusCode::BAD_GATEWAY, "ANALYSIS_FAILED", message, None),
			ServiceError::Provider { message } =>
				json_error(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", message, None),
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Storage failure while serving a request.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"STORAGE_ERROR",
					"Storage is unavailable.",
					None,
				)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}
