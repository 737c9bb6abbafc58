use criba_core::{DuplicateResult, MatchReason, NormalizedTransaction};
use rust_decimal::Decimal;

use crate::util::round_to;

/// Most recent prior transactions considered per candidate.
pub const WINDOW_MAX: usize = 200;
/// Best-candidate score at or above which the record is flagged.
pub const DUPLICATE_THRESHOLD: f64 = 0.75;

/// Heuristic duplicate matcher. Scores a candidate against each prior
/// transaction in a window and flags it when the best score clears the
/// threshold. Annotates only; nothing is removed.
pub struct DuplicateDetector {
    threshold: f64,
    window_max: usize,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self { threshold: DUPLICATE_THRESHOLD, window_max: WINDOW_MAX }
    }
}

impl DuplicateDetector {
    pub fn new(threshold: f64, window_max: usize) -> Self {
        Self { threshold, window_max }
    }

    /// Compares `candidate` against the most recent `window_max` entries of
    /// `window`. Confidence is the best candidate score rounded to two
    /// decimals whether or not it clears the threshold; the matched hash and
    /// reasons are only reported for an actual flag. Ties keep the earliest
    /// prior transaction.
    pub fn detect(
        &self,
        candidate: &NormalizedTransaction,
        window: &[NormalizedTransaction],
    ) -> DuplicateResult {
        let recent = &window[window.len().saturating_sub(self.window_max)..];

        let mut best_score = 0.0;
        let mut best: Option<(&NormalizedTransaction, Vec<MatchReason>)> = None;
        for prior in recent {
            let (score, reasons) = score_pair(candidate, prior);
            if score > best_score {
                best_score = score;
                best = Some((prior, reasons));
            }
        }

        match best {
            Some((winner, reasons)) if best_score >= self.threshold => DuplicateResult {
                is_duplicate: true,
                matched_hash: Some(winner.hash.clone()),
                confidence: round_to(best_score, 2),
                reasons,
                evaluated: recent.len(),
            },
            _ => DuplicateResult {
                is_duplicate: false,
                matched_hash: None,
                confidence: round_to(best_score, 2),
                reasons: Vec::new(),
                evaluated: recent.len(),
            },
        }
    }
}

/// Weighted similarity of one candidate/prior pair.
///
/// Amount: exact 0.5, within 2% relative tolerance 0.35 (exact takes
/// precedence). Date: same day 0.3, one day apart 0.15; unparseable dates
/// contribute nothing. Description: up to 0.2, scaled by common prefix
/// length over the shorter description.
fn score_pair(
    candidate: &NormalizedTransaction,
    prior: &NormalizedTransaction,
) -> (f64, Vec<MatchReason>) {
    let mut score = 0.0;
    let mut reasons = Vec::new();

    if prior.amount == candidate.amount {
        score += 0.5;
        reasons.push(MatchReason::AmountMatch);
    } else {
        let tolerance = Decimal::new(2, 2) * Decimal::ONE.max(candidate.amount.abs());
        if (prior.amount - candidate.amount).abs() <= tolerance {
            score += 0.35;
            reasons.push(MatchReason::AmountNear);
        }
    }

    if let (Some(a), Some(b)) = (candidate.parsed_date(), prior.parsed_date()) {
        let days = (a - b).num_days().abs();
        if days == 0 {
            score += 0.3;
            reasons.push(MatchReason::DateExact);
        } else if days == 1 {
            score += 0.15;
            reasons.push(MatchReason::DateNear);
        }
    }

    let similarity =
        prefix_similarity(&candidate.normalized_description, &prior.normalized_description);
    let desc_component = 0.2 * similarity.min(1.0);
    if desc_component > 0.0 {
        reasons.push(MatchReason::DescSimilarity);
    }
    score += desc_component;

    (score, reasons)
}

fn prefix_similarity(a: &str, b: &str) -> f64 {
    let prefix = a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count();
    let shorter = a.chars().count().min(b.chars().count());
    prefix as f64 / shorter.max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn tx(hash: &str, date: &str, amount: &str, desc: &str) -> NormalizedTransaction {
        NormalizedTransaction {
            date: date.to_string(),
            amount: Decimal::from_str(amount).unwrap(),
            normalized_description: desc.to_string(),
            hash: hash.to_string(),
        }
    }

    #[test]
    fn empty_window_is_never_a_duplicate() {
        let result = DuplicateDetector::default()
            .detect(&tx("a", "2025-08-26", "-23.1", "mercadona"), &[]);
        assert!(!result.is_duplicate);
        assert_eq!(result.matched_hash, None);
        assert_eq!(result.confidence, 0.0);
        assert!(result.reasons.is_empty());
        assert_eq!(result.evaluated, 0);
    }

    #[test]
    fn identical_transaction_scores_full_confidence() {
        let prior = tx("p1", "2025-08-26", "-23.1", "mercadona compra tarjeta");
        let candidate = tx("c1", "2025-08-26", "-23.1", "mercadona compra tarjeta");

        let result = DuplicateDetector::default().detect(&candidate, &[prior]);
        assert!(result.is_duplicate);
        assert_eq!(result.matched_hash.as_deref(), Some("p1"));
        assert_eq!(result.confidence, 1.0);
        assert_eq!(
            result.reasons,
            vec![MatchReason::AmountMatch, MatchReason::DateExact, MatchReason::DescSimilarity]
        );
        assert_eq!(result.evaluated, 1);
    }

    #[test]
    fn near_amount_within_two_percent_flags() {
        // -23.50 vs -23.10 is a 0.40 delta against a 0.47 tolerance.
        let prior = tx("p1", "2025-08-26", "-23.10", "mercadona compra tarjeta");
        let candidate = tx("c1", "2025-08-26", "-23.50", "mercadona compra tarjeta");

        let result = DuplicateDetector::default().detect(&candidate, &[prior]);
        assert!(result.is_duplicate);
        assert_eq!(result.confidence, 0.85);
        assert!(result.reasons.contains(&MatchReason::AmountNear));
        assert!(!result.reasons.contains(&MatchReason::AmountMatch));
    }

    #[test]
    fn one_day_apart_flags_with_date_near() {
        let prior = tx("p1", "2025-08-25", "-23.1", "mercadona compra tarjeta");
        let candidate = tx("c1", "2025-08-26", "-23.1", "mercadona compra tarjeta");

        let result = DuplicateDetector::default().detect(&candidate, &[prior]);
        assert!(result.is_duplicate);
        assert_eq!(result.confidence, 0.85);
        assert!(result.reasons.contains(&MatchReason::DateNear));
    }

    #[test]
    fn partial_prefix_scales_description_credit() {
        // Shared prefix "taxi aeropuerto " is 16 of the shorter 22 chars.
        let prior = tx("p1", "2025-08-26", "-30", "taxi aeropuerto madrid");
        let candidate = tx("c1", "2025-08-26", "-30", "taxi aeropuerto barajas");

        let result = DuplicateDetector::default().detect(&candidate, &[prior]);
        assert!(result.is_duplicate);
        assert_eq!(result.confidence, 0.95);
    }

    #[test]
    fn below_threshold_reports_score_but_no_match() {
        // Same amount only: 0.5 stays under the 0.75 bar.
        let prior = tx("p1", "2025-01-01", "-23.1", "xyz");
        let candidate = tx("c1", "2025-08-26", "-23.1", "abc");

        let result = DuplicateDetector::default().detect(&candidate, &[prior]);
        assert!(!result.is_duplicate);
        assert_eq!(result.matched_hash, None);
        assert_eq!(result.confidence, 0.5);
        assert!(result.reasons.is_empty());
        assert_eq!(result.evaluated, 1);
    }

    #[test]
    fn unparseable_dates_earn_no_date_credit() {
        let prior = tx("p1", "99/99/2025", "-23.1", "mercadona compra tarjeta");
        let candidate = tx("c1", "99/99/2025", "-23.1", "mercadona compra tarjeta");

        // 0.5 + 0.2 only, despite the raw date strings being equal.
        let result = DuplicateDetector::default().detect(&candidate, &[prior]);
        assert!(!result.is_duplicate);
        assert_eq!(result.confidence, 0.7);
    }

    #[test]
    fn ties_keep_the_earliest_prior() {
        let first = tx("p1", "2025-08-26", "-23.1", "mercadona");
        let second = tx("p2", "2025-08-26", "-23.1", "mercadona");
        let candidate = tx("c1", "2025-08-26", "-23.1", "mercadona");

        let result = DuplicateDetector::default().detect(&candidate, &[first, second]);
        assert_eq!(result.matched_hash.as_deref(), Some("p1"));
    }

    #[test]
    fn closer_candidates_never_score_lower() {
        let candidate = tx("c1", "2025-08-26", "-100", "cena restaurante");
        let far = tx("p1", "2025-01-01", "-500", "xyz");
        let near_amount = tx("p2", "2025-01-01", "-101", "xyz");
        let exact_amount = tx("p3", "2025-01-01", "-100", "xyz");
        let plus_date = tx("p4", "2025-08-25", "-100", "xyz");
        let plus_desc = tx("p5", "2025-08-25", "-100", "cena restaurante");

        let detector = DuplicateDetector::default();
        let scores: Vec<f64> = [far, near_amount, exact_amount, plus_date, plus_desc]
            .iter()
            .map(|prior| detector.detect(&candidate, std::slice::from_ref(prior)).confidence)
            .collect();
        for pair in scores.windows(2) {
            assert!(pair[1] >= pair[0], "scores {scores:?} should be non-decreasing");
        }
    }

    #[test]
    fn window_is_capped_to_the_most_recent_entries() {
        // The only real match is the oldest entry; with a cap of 2 it falls
        // out of the window.
        let matching = tx("p0", "2025-08-26", "-23.1", "mercadona");
        let filler1 = tx("p1", "2025-01-01", "-900", "xyz");
        let filler2 = tx("p2", "2025-01-02", "-901", "zzz");
        let candidate = tx("c1", "2025-08-26", "-23.1", "mercadona");

        let detector = DuplicateDetector::new(DUPLICATE_THRESHOLD, 2);
        let result = detector.detect(&candidate, &[matching, filler1, filler2]);
        assert!(!result.is_duplicate);
        assert_eq!(result.evaluated, 2);
    }
}
