use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::duplicate::DuplicateResult;
use super::issue::IssueKind;
use super::suggestion::{Score, Suggestion};

/// A transaction exactly as the upstream statement parsers hand it over.
/// Every field is untrusted: dates and amounts arrive in Spanish bank
/// formats (`DD/MM/YYYY`, comma decimals) or already machine-shaped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawTransaction {
    pub date: String,
    pub description: String,
    pub amount: RawAmount,
}

/// Amounts arrive either as locale text (`"-23,10"`, `"1.234,56"`) or as a
/// plain JSON number. Variant order matters: strings must stay text so the
/// comma-decimal rewrite is applied uniformly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawAmount {
    Text(String),
    Number(Decimal),
}

impl RawAmount {
    /// True when there is nothing to parse at all (empty or blank text).
    pub fn is_blank(&self) -> bool {
        matches!(self, RawAmount::Text(s) if s.trim().is_empty())
    }
}

impl From<&str> for RawAmount {
    fn from(s: &str) -> Self {
        RawAmount::Text(s.to_string())
    }
}

impl From<Decimal> for RawAmount {
    fn from(d: Decimal) -> Self {
        RawAmount::Number(d)
    }
}

/// The canonical form every downstream stage works from: ISO date (verbatim
/// passthrough when unparseable), canonical decimal amount, cleaned
/// description, and the 24-hex-char content hash over all three.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedTransaction {
    pub date: String,
    pub amount: Decimal,
    pub normalized_description: String,
    pub hash: String,
}

impl NormalizedTransaction {
    /// The date as a calendar value, when normalization produced valid ISO.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }
}

/// One input record with every curation stage that could be computed for it.
/// Stages after normalization are absent when normalization failed; `issues`
/// carries the taxonomy entries raised along the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedTransaction {
    pub raw: RawTransaction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<NormalizedTransaction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee: Option<Suggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Suggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate: Option<DuplicateResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<IssueKind>,
}

impl EnrichedTransaction {
    pub fn hash(&self) -> Option<&str> {
        self.normalized.as_ref().map(|n| n.hash.as_str())
    }
}
