use std::collections::HashMap;

use criba_core::{BatchMetrics, EnrichedTransaction, IssueKind};

use crate::util::round_to;

/// Single-pass batch statistics plus the global issues they imply.
///
/// Fallback suggestions do not count as suggestions, and only the exact
/// memory tier counts as memory-sourced. The average score divides by the
/// full batch size, so records that never reached scoring pull it down.
pub fn aggregate(enriched: &[EnrichedTransaction]) -> (BatchMetrics, Vec<IssueKind>) {
    let mut metrics = BatchMetrics { total: enriched.len(), ..Default::default() };
    let mut score_sum = 0.0;
    let mut hash_counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();

    for tx in enriched {
        if let Some(normalized) = &tx.normalized {
            metrics.normalized += 1;
            let count = hash_counts.entry(normalized.hash.as_str()).or_insert(0);
            if *count == 0 {
                first_seen.push(normalized.hash.as_str());
            }
            *count += 1;
        }
        if let Some(payee) = &tx.payee {
            if !payee.is_fallback() {
                metrics.with_payee_suggestion += 1;
            }
            if payee.from_memory() {
                metrics.from_memory_payee += 1;
            }
        }
        if let Some(category) = &tx.category {
            if !category.is_fallback() {
                metrics.with_category_suggestion += 1;
            }
            if category.from_memory() {
                metrics.from_memory_category += 1;
            }
        }
        if tx.duplicate.as_ref().is_some_and(|d| d.is_duplicate) {
            metrics.duplicates += 1;
        }
        if let Some(score) = &tx.score {
            score_sum += score.value;
        }
    }

    // Collisions surface in the order the offending hash first appeared.
    metrics.collisions = first_seen
        .into_iter()
        .filter(|hash| hash_counts[hash] > 1)
        .map(String::from)
        .collect();
    if !enriched.is_empty() {
        metrics.avg_score = round_to(score_sum / enriched.len() as f64, 4);
    }

    let mut issues_global = Vec::new();
    if !metrics.collisions.is_empty() {
        issues_global.push(IssueKind::HashCollision);
    }
    (metrics, issues_global)
}
