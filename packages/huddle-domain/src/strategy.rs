use serde::{Deserialize, Serialize};

use crate::query::DateRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
	Temporal,
	Topic,
	Entity,
	Hybrid,
	Participant,
}
impl StrategyKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Temporal => "temporal",
			Self::Topic => "topic",
			Self::Entity => "entity",
			Self::Hybrid => "hybrid",
			Self::Participant => "participant",
		}
	}
}

/// One retrieval step. Each variant carries exactly the filters it understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "StrategyWire", try_from = "StrategyWire")]
pub enum SearchStrategy {
	Temporal { date_range: DateRange, limit: u32 },
	Topic { keywords: Vec<String>, limit: u32 },
	Entity { keywords: Vec<String>, limit: u32 },
	/// `date_range` may be partially specified; a missing bound never narrows the search.
	Hybrid { keywords: Vec<String>, date_range: Option<DateRange>, limit: u32 },
	Participant { participants: Vec<String>, limit: u32 },
}
impl SearchStrategy {
	pub fn kind(&self) -> StrategyKind {
		match self {
			Self::Temporal { .. } => StrategyKind::Temporal,
			Self::Topic { .. } => StrategyKind::Topic,
			Self::Entity { .. } => StrategyKind::Entity,
			Self::Hybrid { .. } => StrategyKind::Hybrid,
			Self::Participant { .. } => StrategyKind::Participant,
		}
	}

	pub fn limit(&self) -> u32 {
		match self {
			Self::Temporal { limit, .. }
			| Self::Topic { limit, .. }
			| Self::Entity { limit, .. }
			| Self::Hybrid { limit, .. }
			| Self::Participant { limit, .. } => *limit,
		}
	}

	pub fn keywords(&self) -> &[String] {
		match self {
			Self::Topic { keywords, .. }
			| Self::Entity { keywords, .. }
			| Self::Hybrid { keywords, .. } => keywords,
			Self::Temporal { .. } | Self::Participant { .. } => &[],
		}
	}

	pub fn participants(&self) -> &[String] {
		match self {
			Self::Participant { participants, .. } => participants,
			_ => &[],
		}
	}

	pub fn date_range(&self) -> Option<&DateRange> {
		match self {
			Self::Temporal { date_range, .. } => Some(date_range),
			Self::Hybrid { date_range, .. } => date_range.as_ref(),
			_ => None,
		}
	}

	/// Whether in-range records earn a date bonus when scored.
	pub fn rewards_date_match(&self) -> bool {
		matches!(self.kind(), StrategyKind::Temporal | StrategyKind::Hybrid)
	}

	pub fn filters(&self) -> StrategyFilters {
		let keywords = self.keywords();
		let participants = self.participants();

		StrategyFilters {
			keywords: (!keywords.is_empty()).then(|| keywords.to_vec()),
			participants: (!participants.is_empty()).then(|| participants.to_vec()),
			date_range: self.date_range().copied(),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyFilters {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub keywords: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub participants: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub date_range: Option<DateRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPlan {
	pub strategies: Vec<SearchStrategy>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fallback_strategy: Option<SearchStrategy>,
}
impl SearchPlan {
	/// Total number of strategies the plan could run, fallback included.
	pub fn len(&self) -> usize {
		self.strategies.len() + usize::from(self.fallback_strategy.is_some())
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StrategyWire {
	#[serde(rename = "type")]
	kind: StrategyKind,
	#[serde(default)]
	filters: StrategyFilters,
	limit: u32,
}

impl From<SearchStrategy> for StrategyWire {
	fn from(strategy: SearchStrategy) -> Self {
		Self { kind: strategy.kind(), filters: strategy.filters(), limit: strategy.limit() }
	}
}

impl TryFrom<StrategyWire> for SearchStrategy {
	type Error = String;

	fn try_from(wire: StrategyWire) -> Result<Self, Self::Error> {
		if wire.limit == 0 {
			return Err("Strategy limit must be greater than zero.".to_string());
		}

		let StrategyFilters { keywords, participants, date_range } = wire.filters;
		let keywords = keywords.unwrap_or_default();
		let limit = wire.limit;

		Ok(match wire.kind {
			StrategyKind::Temporal => {
				let Some(date_range) = date_range else {
					return Err("Temporal strategies require a date range.".to_string());
				};

				Self::Temporal { date_range, limit }
			},
			StrategyKind::Topic => Self::Topic { keywords, limit },
			StrategyKind::Entity => Self::Entity { keywords, limit },
			StrategyKind::Hybrid => Self::Hybrid { keywords, date_range, limit },
			StrategyKind::Participant =>
				Self::Participant { participants: participants.unwrap_or_default(), limit },
		})
	}
}
