use serde::{Deserialize, Serialize};
use std::fmt;

/// Which signals pushed a pair over the duplicate threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchReason {
    AmountMatch,
    AmountNear,
    DateExact,
    DateNear,
    DescSimilarity,
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchReason::AmountMatch => write!(f, "amount-match"),
            MatchReason::AmountNear => write!(f, "amount-near"),
            MatchReason::DateExact => write!(f, "date-exact"),
            MatchReason::DateNear => write!(f, "date-near"),
            MatchReason::DescSimilarity => write!(f, "desc-similarity"),
        }
    }
}

/// Outcome of scanning a candidate against the duplicate window.
///
/// `confidence` is the best pair score (2 dp) even when below the threshold;
/// `matched_hash` stays an explicit null for non-duplicates so consumers can
/// rely on the field being present. `evaluated` is the number of window
/// entries actually scanned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateResult {
    pub is_duplicate: bool,
    pub matched_hash: Option<String>,
    pub confidence: f64,
    pub reasons: Vec<MatchReason>,
    pub evaluated: usize,
}
