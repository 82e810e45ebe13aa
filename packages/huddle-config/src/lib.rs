mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Analyzer, Config, LlmProviderConfig, Postgres, Search, Security, Service, Storage};

use std::{fs, path::Path};

pub const ANALYZER_MODE_RULES: &str = "rules";
pub const ANALYZER_MODE_LLM: &str = "llm";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw, &path.display().to_string())
}

/// Parses, normalizes, and validates a TOML document. `origin` is only used in error messages.
pub fn parse(raw: &str, origin: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { origin: origin.to_string(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	validate_search(cfg)?;
	validate_analyzer(cfg)?;

	Ok(())
}

fn validate_search(cfg: &Config) -> Result<()> {
	let search = &cfg.search;

	for (label, value) in [
		("search.default_max_results", search.default_max_results),
		("search.max_results_limit", search.max_results_limit),
		("search.strategy_limit_cap", search.strategy_limit_cap),
		("search.fallback_limit_multiplier", search.fallback_limit_multiplier),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if search.default_max_results > search.max_results_limit {
		return Err(Error::Validation {
			message: "search.default_max_results must not exceed search.max_results_limit."
				.to_string(),
		});
	}
	if search.strategy_limit_cap > search.max_results_limit {
		return Err(Error::Validation {
			message: "search.strategy_limit_cap must not exceed search.max_results_limit."
				.to_string(),
		});
	}
	if search.default_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "search.default_timeout_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn validate_analyzer(cfg: &Config) -> Result<()> {
	let mode = cfg.analyzer.mode.as_str();

	if !matches!(mode, ANALYZER_MODE_RULES | ANALYZER_MODE_LLM) {
		return Err(Error::Validation {
			message: "analyzer.mode must be one of rules or llm.".to_string(),
		});
	}
	if mode != ANALYZER_MODE_LLM {
		return Ok(());
	}

	let Some(llm) = cfg.analyzer.llm.as_ref() else {
		return Err(Error::Validation {
			message: "analyzer.llm must be configured when analyzer.mode is llm.".to_string(),
		});
	};

	for (label, value) in [
		("analyzer.llm.api_base", &llm.api_base),
		("analyzer.llm.api_key", &llm.api_key),
		("analyzer.llm.model", &llm.model),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if !llm.temperature.is_finite() || llm.temperature < 0.0 {
		return Err(Error::Validation {
			message: "analyzer.llm.temperature must be a finite number, zero or greater."
				.to_string(),
		});
	}
	if llm.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "analyzer.llm.timeout_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.security.api_auth_token.as_deref().map(|token| token.trim().is_empty()).unwrap_or(false)
	{
		cfg.security.api_auth_token = None;
	}

	cfg.analyzer.mode = cfg.analyzer.mode.trim().to_ascii_lowercase();
}
