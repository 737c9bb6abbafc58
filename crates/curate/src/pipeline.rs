use tracing::info;

use criba_core::{
    CurationReport, EnrichedTransaction, IssueKind, NormalizedTransaction, RawTransaction,
    ISSUE_TAXONOMY,
};
use criba_memory::{MemoryStore, UserMemory};

use crate::dedup::DuplicateDetector;
use crate::metrics;
use crate::normalize::{self, NormalizeError};
use crate::score::composite_score;
use crate::suggest::{suggest_category, suggest_payee, KeywordEngine};

/// Batch orchestrator. Reads memory once per run, enriches records in input
/// order, then aggregates metrics over the finished batch.
pub struct CurationPipeline<S: MemoryStore> {
    store: S,
    keywords: KeywordEngine,
    detector: DuplicateDetector,
}

impl<S: MemoryStore> CurationPipeline<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            keywords: KeywordEngine::default_rules(),
            detector: DuplicateDetector::default(),
        }
    }

    pub fn with_keywords(store: S, keywords: KeywordEngine) -> Self {
        Self { store, keywords, detector: DuplicateDetector::default() }
    }

    /// Runs one batch for `identity`. `prior` seeds the duplicate window;
    /// every record normalized in this batch joins the window for the records
    /// after it, so input order decides who gets flagged.
    pub fn run(
        &self,
        identity: &str,
        batch: &[RawTransaction],
        prior: &[NormalizedTransaction],
    ) -> CurationReport {
        info!(identity, total = batch.len(), prior = prior.len(), "Curating batch");
        let memory = self.store.get(identity);

        let mut window: Vec<NormalizedTransaction> = prior.to_vec();
        let mut enriched: Vec<EnrichedTransaction> = Vec::with_capacity(batch.len());
        for raw in batch {
            let record = self.enrich(raw, &memory, &window);
            if let Some(normalized) = &record.normalized {
                window.push(normalized.clone());
            }
            enriched.push(record);
        }

        let (batch_metrics, issues_global) = metrics::aggregate(&enriched);
        tag_collisions(&mut enriched, &batch_metrics.collisions);

        CurationReport {
            identity: identity.to_string(),
            total: enriched.len(),
            metrics: batch_metrics,
            enriched,
            issues_global,
            issue_taxonomy: ISSUE_TAXONOMY.to_vec(),
        }
    }

    fn enrich(
        &self,
        raw: &RawTransaction,
        memory: &UserMemory,
        window: &[NormalizedTransaction],
    ) -> EnrichedTransaction {
        let mut issues = Vec::new();

        // 1. Essential fields present?
        if raw.date.trim().is_empty()
            || raw.description.trim().is_empty()
            || raw.amount.is_blank()
        {
            issues.push(IssueKind::MissingRequiredField);
        }

        // 2. Normalize. An unparsable amount keeps the raw record in the
        //    output with no enrichment stages; a blank amount was already
        //    reported as missing.
        let normalized = match normalize::normalize(raw) {
            Ok(normalized) => normalized,
            Err(NormalizeError::InvalidAmount(_)) => {
                if !raw.amount.is_blank() {
                    issues.push(IssueKind::InvalidAmount);
                }
                return EnrichedTransaction {
                    raw: raw.clone(),
                    normalized: None,
                    payee: None,
                    category: None,
                    duplicate: None,
                    score: None,
                    issues,
                };
            }
        };
        if !raw.date.trim().is_empty() && normalized.parsed_date().is_none() {
            issues.push(IssueKind::InvalidDate);
        }

        // 3. Suggestions, payee first so the category tier can see it.
        let payee = suggest_payee(memory, &normalized);
        let category = suggest_category(memory, &normalized, &self.keywords, Some(&payee));

        // 4. Duplicate detection against everything normalized before this
        //    record. Sub-threshold similarity does not penalize the score.
        let duplicate = self.detector.detect(&normalized, window);
        let duplicate_confidence = if duplicate.is_duplicate { duplicate.confidence } else { 0.0 };

        // 5. Composite score.
        let score = composite_score(payee.confidence, category.confidence, duplicate_confidence);

        EnrichedTransaction {
            raw: raw.clone(),
            normalized: Some(normalized),
            payee: Some(payee),
            category: Some(category),
            duplicate: Some(duplicate),
            score: Some(score),
            issues,
        }
    }
}

fn tag_collisions(enriched: &mut [EnrichedTransaction], collisions: &[String]) {
    if collisions.is_empty() {
        return;
    }
    for tx in enriched {
        let colliding = tx.normalized.as_ref().is_some_and(|n| collisions.contains(&n.hash));
        if colliding && !tx.issues.contains(&IssueKind::HashCollision) {
            tx.issues.push(IssueKind::HashCollision);
        }
    }
}
