use serde::{Deserialize, Serialize};

use super::issue::IssueKind;
use super::record::EnrichedTransaction;

/// Aggregate counters over one curated batch.
///
/// Suggestion counters only count non-fallback sources; the memory counters
/// only count exact (hash-key) memory hits. `avg_score` is rounded to 4 dp
/// and zero for empty batches. `collisions` lists each hash seen more than
/// once, in first-seen order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchMetrics {
    pub total: usize,
    pub normalized: usize,
    pub with_payee_suggestion: usize,
    pub with_category_suggestion: usize,
    pub duplicates: usize,
    pub from_memory_payee: usize,
    pub from_memory_category: usize,
    pub avg_score: f64,
    pub collisions: Vec<String>,
}

/// Everything one batch run produces, in input order. The serialized form is
/// the wire contract consumed downstream, hence the camelCase field names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurationReport {
    pub identity: String,
    pub total: usize,
    pub metrics: BatchMetrics,
    pub enriched: Vec<EnrichedTransaction>,
    pub issues_global: Vec<IssueKind>,
    pub issue_taxonomy: Vec<IssueKind>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::ISSUE_TAXONOMY;

    #[test]
    fn report_serializes_camel_case() {
        let report = CurationReport {
            identity: "demo".to_string(),
            total: 0,
            metrics: BatchMetrics::default(),
            enriched: vec![],
            issues_global: vec![IssueKind::HashCollision],
            issue_taxonomy: ISSUE_TAXONOMY.to_vec(),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["issuesGlobal"][0], "hash_collision");
        assert_eq!(value["metrics"]["avgScore"], 0.0);
        assert_eq!(value["issueTaxonomy"].as_array().unwrap().len(), 5);
    }
}
