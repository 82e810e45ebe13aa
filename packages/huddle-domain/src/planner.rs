use crate::{
	query::{AnalyzedQuery, Intent},
	strategy::{SearchPlan, SearchStrategy},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerOptions {
	/// Per-source limit of every primary strategy.
	pub limit: u32,
	pub fallback_limit_multiplier: u32,
	/// Keyword counts at or below this value leave participant hints in charge of the plan.
	pub sparse_keyword_threshold: usize,
}
impl PlannerOptions {
	pub fn new(max_results: u32, strategy_limit_cap: u32) -> Self {
		Self {
			limit: max_results.min(strategy_limit_cap).max(1),
			fallback_limit_multiplier: 2,
			sparse_keyword_threshold: 1,
		}
	}

	pub fn with_fallback_limit_multiplier(mut self, multiplier: u32) -> Self {
		self.fallback_limit_multiplier = multiplier;

		self
	}

	pub fn with_sparse_keyword_threshold(mut self, threshold: usize) -> Self {
		self.sparse_keyword_threshold = threshold;

		self
	}

	fn fallback_limit(&self) -> u32 {
		self.limit.saturating_mul(self.fallback_limit_multiplier.max(1)).max(self.limit)
	}
}

/// Turns an analyzed query into an ordered plan. Pure and deterministic.
///
/// Participant hints come first when they dominate the query, followed by the date/keyword
/// strategy the remaining signals call for. Queries with no usable signal get a single bare
/// `entity` strategy and no fallback; every narrower plan gets a keyword-only `entity` fallback
/// with a larger limit.
pub fn create_search_plan(query: &AnalyzedQuery, options: &PlannerOptions) -> SearchPlan {
	let limit = options.limit.max(1);
	let counterparts = query.counterparts();
	let keywords = &query.keywords;
	let sparse_keywords = keywords.len() <= options.sparse_keyword_threshold;
	let mut strategies = Vec::new();

	if !counterparts.is_empty()
		&& (query.intent == Intent::ParticipantLookup || sparse_keywords)
	{
		strategies.push(SearchStrategy::Participant { participants: counterparts, limit });
	}

	match (keywords.is_empty(), query.date_range) {
		(true, Some(date_range)) => strategies.push(SearchStrategy::Temporal { date_range, limit }),
		(false, None) => strategies.push(SearchStrategy::Topic { keywords: keywords.clone(), limit }),
		(false, Some(date_range)) => strategies.push(SearchStrategy::Hybrid {
			keywords: keywords.clone(),
			date_range: Some(date_range),
			limit,
		}),
		(true, None) => {},
	}

	if strategies.is_empty() {
		return SearchPlan {
			strategies: vec![SearchStrategy::Entity { keywords: Vec::new(), limit }],
			fallback_strategy: None,
		};
	}

	let fallback = SearchStrategy::Entity {
		keywords: keywords.clone(),
		limit: options.fallback_limit(),
	};

	SearchPlan { strategies, fallback_strategy: Some(fallback) }
}

#[cfg(test)]
mod tests {
	use time::macros::date;

	use super::*;
	use crate::{
		query::{DateRange, SELF_PARTICIPANT},
		strategy::StrategyKind,
	};

	fn options() -> PlannerOptions {
		PlannerOptions::new(10, 20)
	}

	fn kinds(plan: &SearchPlan) -> Vec<StrategyKind> {
		plan.strategies.iter().map(SearchStrategy::kind).collect()
	}

	fn last_month() -> DateRange {
		DateRange::between(date!(2025 - 04 - 15), date!(2025 - 05 - 15))
	}

	#[test]
	fn limit_is_capped_by_strategy_cap() {
		assert_eq!(PlannerOptions::new(50, 20).limit, 20);
		assert_eq!(PlannerOptions::new(5, 20).limit, 5);
		assert_eq!(PlannerOptions::new(0, 20).limit, 1);
	}

	#[test]
	fn keywords_without_range_plan_topic() {
		let query = AnalyzedQuery { keywords: vec!["pricing".to_string()], ..Default::default() };
		let plan = create_search_plan(&query, &options());

		assert_eq!(kinds(&plan), vec![StrategyKind::Topic]);
		assert_eq!(plan.strategies[0].keywords(), ["pricing".to_string()]);
	}

	#[test]
	fn range_without_keywords_plans_temporal() {
		let query = AnalyzedQuery { date_range: Some(last_month()), ..Default::default() };
		let plan = create_search_plan(&query, &options());

		assert_eq!(kinds(&plan), vec![StrategyKind::Temporal]);
		assert_eq!(plan.strategies[0].date_range(), Some(&last_month()));
	}

	#[test]
	fn keywords_and_range_plan_hybrid_with_keyword_fallback() {
		let query = AnalyzedQuery {
			keywords: vec!["acme".to_string()],
			date_range: Some(last_month()),
			..Default::default()
		};
		let plan = create_search_plan(&query, &options());

		assert_eq!(kinds(&plan), vec![StrategyKind::Hybrid]);

		let fallback = plan.fallback_strategy.expect("Hybrid plans must carry a fallback.");

		assert_eq!(fallback.kind(), StrategyKind::Entity);
		assert_eq!(fallback.keywords(), ["acme".to_string()]);
		assert!(fallback.date_range().is_none());
		assert!(fallback.participants().is_empty());
		assert_eq!(fallback.limit(), 20);
	}

	#[test]
	fn participant_lookup_plans_participant_without_self() {
		let query = AnalyzedQuery {
			intent: Intent::ParticipantLookup,
			participants: [SELF_PARTICIPANT.to_string(), "sarah".to_string()].into_iter().collect(),
			..Default::default()
		};
		let plan = create_search_plan(&query, &options());

		assert_eq!(kinds(&plan), vec![StrategyKind::Participant]);
		assert_eq!(plan.strategies[0].participants(), ["sarah".to_string()]);
		assert!(plan.fallback_strategy.is_some());
	}

	#[test]
	fn ambiguous_participant_and_keywords_emit_both_strategies() {
		let query = AnalyzedQuery {
			keywords: vec!["sarah".to_string()],
			participants: ["sarah".to_string()].into_iter().collect(),
			..Default::default()
		};
		let plan = create_search_plan(&query, &options());

		assert_eq!(kinds(&plan), vec![StrategyKind::Participant, StrategyKind::Topic]);
	}

	#[test]
	fn dense_keywords_outrank_participant_hints() {
		let query = AnalyzedQuery {
			keywords: vec!["roadmap".to_string(), "pricing".to_string()],
			participants: ["sarah".to_string()].into_iter().collect(),
			..Default::default()
		};
		let plan = create_search_plan(&query, &options());

		assert_eq!(kinds(&plan), vec![StrategyKind::Topic]);
	}

	#[test]
	fn self_only_participants_do_not_plan_participant_strategy() {
		let query = AnalyzedQuery {
			intent: Intent::ParticipantLookup,
			participants: [SELF_PARTICIPANT.to_string()].into_iter().collect(),
			..Default::default()
		};
		let plan = create_search_plan(&query, &options());

		assert_eq!(kinds(&plan), vec![StrategyKind::Entity]);
		assert!(plan.fallback_strategy.is_none());
	}

	#[test]
	fn no_signal_plans_bare_entity_without_fallback() {
		let query = AnalyzedQuery { intent: Intent::ActionItems, ..Default::default() };
		let plan = create_search_plan(&query, &options());

		assert_eq!(kinds(&plan), vec![StrategyKind::Entity]);
		assert!(plan.strategies[0].filters() == Default::default());
		assert!(plan.fallback_strategy.is_none());
	}

	#[test]
	fn fallback_limit_never_drops_below_primary() {
		let query = AnalyzedQuery { keywords: vec!["acme".to_string()], ..Default::default() };
		let plan =
			create_search_plan(&query, &options().with_fallback_limit_multiplier(0));

		assert_eq!(plan.fallback_strategy.map(|fallback| fallback.limit()), Some(10));
	}

	#[test]
	fn planning_is_deterministic() {
		let query = AnalyzedQuery {
			keywords: vec!["acme".to_string(), "renewal".to_string()],
			participants: ["sarah".to_string(), "self".to_string()].into_iter().collect(),
			date_range: Some(last_month()),
			..Default::default()
		};

		assert_eq!(create_search_plan(&query, &options()), create_search_plan(&query, &options()));
	}
}
