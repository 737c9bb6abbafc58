pub mod duplicate;
pub mod issue;
pub mod record;
pub mod report;
pub mod suggestion;

pub use duplicate::{DuplicateResult, MatchReason};
pub use issue::{IssueKind, ISSUE_TAXONOMY};
pub use record::{EnrichedTransaction, NormalizedTransaction, RawAmount, RawTransaction};
pub use report::{BatchMetrics, CurationReport};
pub use suggestion::{Score, ScoreComponents, Suggestion, SuggestionSource};
