use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed anomaly taxonomy. Downstream consumers and persisted reports
/// depend on these exact tokens; extend only by appending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    InvalidDate,
    InvalidAmount,
    HashCollision,
    MissingRequiredField,
    NormalizationFailure,
}

/// Every issue a report can carry, in stable order. Embedded in each
/// `CurationReport` so consumers can validate against it.
pub const ISSUE_TAXONOMY: &[IssueKind] = &[
    IssueKind::InvalidDate,
    IssueKind::InvalidAmount,
    IssueKind::HashCollision,
    IssueKind::MissingRequiredField,
    IssueKind::NormalizationFailure,
];

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::InvalidDate => write!(f, "invalid_date"),
            IssueKind::InvalidAmount => write!(f, "invalid_amount"),
            IssueKind::HashCollision => write!(f, "hash_collision"),
            IssueKind::MissingRequiredField => write!(f, "missing_required_field"),
            IssueKind::NormalizationFailure => write!(f, "normalization_failure"),
        }
    }
}

impl std::str::FromStr for IssueKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invalid_date" => Ok(IssueKind::InvalidDate),
            "invalid_amount" => Ok(IssueKind::InvalidAmount),
            "hash_collision" => Ok(IssueKind::HashCollision),
            "missing_required_field" => Ok(IssueKind::MissingRequiredField),
            "normalization_failure" => Ok(IssueKind::NormalizationFailure),
            other => Err(format!("Unknown issue kind: '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn taxonomy_is_complete_and_stable() {
        assert_eq!(ISSUE_TAXONOMY.len(), 5);
        assert_eq!(ISSUE_TAXONOMY[0], IssueKind::InvalidDate);
        assert_eq!(ISSUE_TAXONOMY[4], IssueKind::NormalizationFailure);
    }

    #[test]
    fn issue_roundtrip() {
        for issue in ISSUE_TAXONOMY {
            assert_eq!(IssueKind::from_str(&issue.to_string()).unwrap(), *issue);
        }
        assert!(IssueKind::from_str("bad_vibes").is_err());
    }

    #[test]
    fn issue_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(IssueKind::MissingRequiredField).unwrap(),
            serde_json::json!("missing_required_field")
        );
    }
}
