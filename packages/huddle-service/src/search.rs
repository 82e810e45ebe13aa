use std::{
	collections::HashSet,
	time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, error, warn};
use uuid::Uuid;

use huddle_domain::{
	AnalyzedQuery, PlannerOptions, SearchPlan, SearchResult, SearchStrategy, create_search_plan,
};

use crate::{
	Error, HuddleService, Result,
	executor::{self, ExecutionContext},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
	pub user_id: Uuid,
	pub query: String,
	pub max_results: Option<u32>,
	pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
	pub query: AnalyzedQuery,
	pub search_plan: SearchPlan,
	pub results: Vec<SearchResult>,
	/// Distinct results gathered before truncation to `max_results`.
	pub total_found: usize,
	/// Strategies started, fallback included. A strategy cut off by the budget still counts.
	pub executed_strategies: usize,
}

/// Distinct results in plan order. The first copy of an id wins.
#[derive(Debug)]
struct Accumulator {
	seen: HashSet<String>,
	results: Vec<SearchResult>,
	executed: usize,
	max_results: usize,
	min_yield: usize,
}
impl Accumulator {
	fn new(max_results: usize, min_yield: usize) -> Self {
		Self { seen: HashSet::new(), results: Vec::new(), executed: 0, max_results, min_yield }
	}

	fn has_enough_results(&self) -> bool {
		self.results.len() >= self.max_results
	}

	fn needs_fallback(&self) -> bool {
		self.results.len() < self.min_yield
	}

	fn absorb(&mut self, results: Vec<SearchResult>) -> usize {
		let before = self.results.len();

		for result in results {
			if self.seen.insert(result.id.clone()) {
				self.results.push(result);
			}
		}

		self.results.len() - before
	}

	fn finish(mut self) -> (Vec<SearchResult>, usize, usize) {
		self.results.sort_by(|a, b| b.relevance.score.total_cmp(&a.relevance.score));

		let total_found = self.results.len();

		self.results.truncate(self.max_results);

		(self.results, total_found, self.executed)
	}
}

impl HuddleService {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		self.search_at(req, OffsetDateTime::now_utc()).await
	}

	/// Same as [`HuddleService::search`] with an explicit request clock.
	pub async fn search_at(
		&self,
		req: SearchRequest,
		now: OffsetDateTime,
	) -> Result<SearchResponse> {
		let raw_query = req.query.trim();

		if raw_query.is_empty() {
			return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
		}
		if req.max_results == Some(0) {
			return Err(Error::InvalidRequest {
				message: "maxResults must be greater than zero.".to_string(),
			});
		}
		if req.timeout_ms == Some(0) {
			return Err(Error::InvalidRequest {
				message: "timeoutMs must be greater than zero.".to_string(),
			});
		}

		let search_cfg = &self.cfg.search;
		let max_results = req
			.max_results
			.unwrap_or(search_cfg.default_max_results)
			.min(search_cfg.max_results_limit)
			.max(1);
		let budget =
			Duration::from_millis(req.timeout_ms.unwrap_or(search_cfg.default_timeout_ms));
		let query = self.analyzer.analyze(raw_query, now.date()).await.map_err(|err| {
			error!(error = %err, "Query analysis failed.");

			match err {
				Error::AnalysisFailed { .. } => err,
				other => Error::AnalysisFailed { message: other.to_string() },
			}
		})?;
		let options = PlannerOptions::new(max_results, search_cfg.strategy_limit_cap)
			.with_fallback_limit_multiplier(search_cfg.fallback_limit_multiplier)
			.with_sparse_keyword_threshold(search_cfg.sparse_keyword_threshold as usize);
		let plan = create_search_plan(&query, &options);
		let ctx = ExecutionContext { user_id: req.user_id, query: &query, now };
		let mut acc = Accumulator::new(max_results as usize, search_cfg.min_yield as usize);

		if tokio::time::timeout(budget, self.execute_plan(ctx, &plan, &mut acc)).await.is_err() {
			warn!(
				budget_ms = budget.as_millis() as u64,
				executed_strategies = acc.executed,
				yield_so_far = acc.results.len(),
				"Search budget exhausted; returning partial results."
			);
		}

		let (results, total_found, executed_strategies) = acc.finish();

		Ok(SearchResponse { query, search_plan: plan, results, total_found, executed_strategies })
	}

	async fn execute_plan(
		&self,
		ctx: ExecutionContext<'_>,
		plan: &SearchPlan,
		acc: &mut Accumulator,
	) {
		for strategy in &plan.strategies {
			if acc.has_enough_results() {
				break;
			}

			self.run_step(ctx, strategy, acc, false).await;
		}

		if acc.needs_fallback()
			&& let Some(fallback) = &plan.fallback_strategy
		{
			self.run_step(ctx, fallback, acc, true).await;
		}
	}

	async fn run_step(
		&self,
		ctx: ExecutionContext<'_>,
		strategy: &SearchStrategy,
		acc: &mut Accumulator,
		fallback: bool,
	) {
		let started = Instant::now();

		acc.executed += 1;

		let outcome = executor::execute_strategy(self.store.as_ref(), ctx, strategy).await;
		let added = acc.absorb(outcome.results);

		if !outcome.failed_sources.is_empty() {
			warn!(
				strategy = strategy.kind().as_str(),
				fallback,
				failed_sources = ?outcome.failed_sources,
				"Strategy completed with failed sources."
			);
		}

		debug!(
			strategy = strategy.kind().as_str(),
			fallback,
			added,
			yield_so_far = acc.results.len(),
			elapsed_ms = started.elapsed().as_millis() as u64,
			"Strategy executed."
		);
	}
}
