pub mod analyzer;
pub mod matching;
pub mod planner;
pub mod query;
pub mod relevance;
pub mod result;
pub mod strategy;
pub mod time_serde;

pub use planner::{PlannerOptions, create_search_plan};
pub use query::{AnalyzedQuery, DateRange, Intent, SELF_PARTICIPANT};
pub use relevance::{Candidate, calculate_relevance};
pub use result::{Relevance, ResultType, SearchResult};
pub use strategy::{SearchPlan, SearchStrategy, StrategyFilters, StrategyKind};
