use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a suggested value came from, strongest to weakest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionSource {
    /// Exact per-transaction memory hit (hash key).
    Memory,
    /// Generalized memory hit (description + rounded amount key).
    MemorySecondary,
    /// Matched a category keyword rule.
    Keyword,
    /// Derived from the description tokens.
    Heuristic,
    /// Sentinel emitted when nothing else resolved.
    Fallback,
}

impl fmt::Display for SuggestionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestionSource::Memory => write!(f, "memory"),
            SuggestionSource::MemorySecondary => write!(f, "memory-secondary"),
            SuggestionSource::Keyword => write!(f, "keyword"),
            SuggestionSource::Heuristic => write!(f, "heuristic"),
            SuggestionSource::Fallback => write!(f, "fallback"),
        }
    }
}

impl std::str::FromStr for SuggestionSource {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(SuggestionSource::Memory),
            "memory-secondary" => Ok(SuggestionSource::MemorySecondary),
            "keyword" => Ok(SuggestionSource::Keyword),
            "heuristic" => Ok(SuggestionSource::Heuristic),
            "fallback" => Ok(SuggestionSource::Fallback),
            other => Err(format!("Unknown suggestion source: '{other}'")),
        }
    }
}

/// A suggested payee or category value with its confidence (0.0–1.0).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    pub value: String,
    pub confidence: f64,
    pub source: SuggestionSource,
}

impl Suggestion {
    pub fn new(value: impl Into<String>, confidence: f64, source: SuggestionSource) -> Self {
        Self { value: value.into(), confidence: confidence.clamp(0.0, 1.0), source }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == SuggestionSource::Fallback
    }

    pub fn from_memory(&self) -> bool {
        self.source == SuggestionSource::Memory
    }
}

/// Weighted payee/category/duplicate contributions before rounding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreComponents {
    pub payee: f64,
    pub category: f64,
    pub duplicate_penalty: f64,
}

/// Composite curation confidence: the rounded value plus its raw components.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Score {
    pub value: f64,
    pub components: ScoreComponents,
}
