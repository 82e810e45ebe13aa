use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use huddle_config::{Config, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_value() -> Value {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.")
}

fn set_key(value: &mut Value, section: &[&str], key: &str, new_value: Value) {
	let mut table = value.as_table_mut().expect("Template config must be a table.");

	for name in section {
		table = table
			.get_mut(*name)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{name}]."));
	}

	table.insert(key.to_string(), new_value);
}

fn remove_key(value: &mut Value, section: &[&str], key: &str) {
	let mut table = value.as_table_mut().expect("Template config must be a table.");

	for name in section {
		table = table
			.get_mut(*name)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{name}]."));
	}

	table.remove(key);
}

fn render(value: &Value) -> String {
	toml::to_string(value).expect("Failed to render template config.")
}

fn parse(value: &Value) -> huddle_config::Result<Config> {
	huddle_config::parse(&render(value), "test")
}

fn validation_message(result: huddle_config::Result<Config>) -> String {
	match result {
		Err(Error::Validation { message }) => message,
		Err(other) => panic!("Expected a validation error, got {other:?}."),
		Ok(_) => panic!("Expected a validation error, got a valid config."),
	}
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be after the UNIX epoch.")
		.as_nanos();
	let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
	let mut path = env::temp_dir();

	path.push(format!("huddle_config_test_{nanos}_{seq}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

#[test]
fn loads_sample_config_from_disk() {
	let path = write_temp_config(SAMPLE_CONFIG_TEMPLATE_TOML.to_string());
	let cfg = huddle_config::load(&path).expect("Sample config must load.");

	fs::remove_file(&path).expect("Failed to remove test config.");

	assert_eq!(cfg.service.http_bind, "127.0.0.1:8080");
	assert_eq!(cfg.search.min_yield, 5);
	assert_eq!(cfg.search.fallback_limit_multiplier, 2);
	assert_eq!(cfg.analyzer.mode, huddle_config::ANALYZER_MODE_RULES);
}

#[test]
fn missing_file_reports_read_error() {
	let path = env::temp_dir().join("huddle_config_test_does_not_exist.toml");
	let result = huddle_config::load(&path);

	assert!(matches!(result, Err(Error::ReadConfig { .. })));
}

#[test]
fn malformed_toml_reports_parse_error() {
	let result = huddle_config::parse("[service\nhttp_bind = ", "inline");

	assert!(matches!(result, Err(Error::ParseConfig { ref origin, .. }) if origin == "inline"));
}

#[test]
fn empty_api_auth_token_is_normalized_to_none() {
	let cfg = parse(&sample_value()).expect("Sample config must be valid.");

	assert!(cfg.security.api_auth_token.is_none());
}

#[test]
fn search_section_falls_back_to_defaults() {
	let mut value = sample_value();

	value.as_table_mut().expect("Template config must be a table.").remove("search");

	let cfg = parse(&value).expect("Config without [search] must be valid.");

	assert_eq!(cfg.search.default_max_results, 10);
	assert_eq!(cfg.search.strategy_limit_cap, 20);
	assert_eq!(cfg.search.min_yield, 5);
	assert_eq!(cfg.search.default_timeout_ms, 10_000);
}

#[test]
fn analyzer_mode_is_normalized() {
	let mut value = sample_value();

	set_key(&mut value, &["analyzer"], "mode", Value::String(" LLM ".to_string()));

	let cfg = parse(&value).expect("Upper-case mode must be accepted.");

	assert_eq!(cfg.analyzer.mode, huddle_config::ANALYZER_MODE_LLM);
}

#[test]
fn rejects_unknown_analyzer_mode() {
	let mut value = sample_value();

	set_key(&mut value, &["analyzer"], "mode", Value::String("oracle".to_string()));

	assert_eq!(validation_message(parse(&value)), "analyzer.mode must be one of rules or llm.");
}

#[test]
fn llm_mode_requires_llm_block() {
	let mut value = sample_value();

	set_key(&mut value, &["analyzer"], "mode", Value::String("llm".to_string()));
	remove_key(&mut value, &["analyzer"], "llm");

	assert_eq!(
		validation_message(parse(&value)),
		"analyzer.llm must be configured when analyzer.mode is llm."
	);
}

#[test]
fn llm_mode_requires_api_key() {
	let mut value = sample_value();

	set_key(&mut value, &["analyzer"], "mode", Value::String("llm".to_string()));
	set_key(&mut value, &["analyzer", "llm"], "api_key", Value::String("  ".to_string()));

	assert_eq!(validation_message(parse(&value)), "analyzer.llm.api_key must be non-empty.");
}

#[test]
fn rules_mode_ignores_incomplete_llm_block() {
	let mut value = sample_value();

	set_key(&mut value, &["analyzer", "llm"], "api_key", Value::String(String::new()));

	assert!(parse(&value).is_ok());
}

#[test]
fn rejects_zero_limits() {
	for key in
		["default_max_results", "max_results_limit", "strategy_limit_cap", "fallback_limit_multiplier"]
	{
		let mut value = sample_value();

		set_key(&mut value, &["search"], key, Value::Integer(0));

		assert_eq!(
			validation_message(parse(&value)),
			format!("search.{key} must be greater than zero.")
		);
	}
}

#[test]
fn rejects_strategy_cap_above_result_limit() {
	let mut value = sample_value();

	set_key(&mut value, &["search"], "strategy_limit_cap", Value::Integer(80));

	assert_eq!(
		validation_message(parse(&value)),
		"search.strategy_limit_cap must not exceed search.max_results_limit."
	);
}

#[test]
fn rejects_default_results_above_result_limit() {
	let mut value = sample_value();

	set_key(&mut value, &["search"], "default_max_results", Value::Integer(51));

	assert_eq!(
		validation_message(parse(&value)),
		"search.default_max_results must not exceed search.max_results_limit."
	);
}

#[test]
fn rejects_empty_dsn() {
	let mut value = sample_value();

	set_key(&mut value, &["storage", "postgres"], "dsn", Value::String(String::new()));

	assert_eq!(validation_message(parse(&value)), "storage.postgres.dsn must be non-empty.");
}
