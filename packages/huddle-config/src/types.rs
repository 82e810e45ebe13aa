use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub analyzer: Analyzer,
	pub security: Security,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Search {
	/// Used when a request omits `maxResults`.
	pub default_max_results: u32,
	/// Requests asking for more results are clamped to this value.
	pub max_results_limit: u32,
	/// Upper bound for each strategy's per-source limit.
	pub strategy_limit_cap: u32,
	/// Minimum distinct yield below which the fallback strategy runs.
	pub min_yield: u32,
	pub fallback_limit_multiplier: u32,
	/// Keyword counts at or below this value are considered sparse for participant routing.
	pub sparse_keyword_threshold: u32,
	pub default_timeout_ms: u64,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			default_max_results: 10,
			max_results_limit: 50,
			strategy_limit_cap: 20,
			min_yield: 5,
			fallback_limit_multiplier: 2,
			sparse_keyword_threshold: 1,
			default_timeout_ms: 10_000,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Analyzer {
	#[serde(default = "default_analyzer_mode")]
	pub mode: String,
	pub llm: Option<LlmProviderConfig>,
}
impl Default for Analyzer {
	fn default() -> Self {
		Self { mode: default_analyzer_mode(), llm: None }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
	pub api_auth_token: Option<String>,
}

fn default_analyzer_mode() -> String {
	"rules".to_string()
}
