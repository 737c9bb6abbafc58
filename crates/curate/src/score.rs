use criba_core::{Score, ScoreComponents};

use crate::util::round_to;

pub const PAYEE_WEIGHT: f64 = 0.4;
pub const CATEGORY_WEIGHT: f64 = 0.4;
pub const DUPLICATE_WEIGHT: f64 = 0.2;

/// Composite confidence for one enriched record.
///
/// `duplicate_confidence` is the confidence that the record *is* a duplicate,
/// so a clean record earns the full duplicate weight. The weights sum to 1,
/// which keeps the value in [0, 1] for inputs in [0, 1]. The value is rounded
/// to three decimals; the components stay raw.
pub fn composite_score(
    payee_confidence: f64,
    category_confidence: f64,
    duplicate_confidence: f64,
) -> Score {
    let components = ScoreComponents {
        payee: PAYEE_WEIGHT * payee_confidence,
        category: CATEGORY_WEIGHT * category_confidence,
        duplicate_penalty: DUPLICATE_WEIGHT * (1.0 - duplicate_confidence),
    };
    let value = round_to(components.payee + components.category + components.duplicate_penalty, 3);
    Score { value, components }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_combine_and_round_to_three_decimals() {
        let score = composite_score(0.8, 0.5, 0.2);
        assert_eq!(score.value, 0.68);
    }

    #[test]
    fn components_are_kept_unrounded() {
        let score = composite_score(0.8, 0.5, 0.2);
        assert_eq!(score.components.payee, 0.4 * 0.8);
        assert_eq!(score.components.category, 0.2);
        assert_eq!(score.components.duplicate_penalty, 0.2 * 0.8);
    }

    #[test]
    fn clean_record_with_full_memory_scores_one() {
        assert_eq!(composite_score(1.0, 1.0, 0.0).value, 1.0);
    }

    #[test]
    fn duplicate_confidence_eats_into_the_reward() {
        assert_eq!(composite_score(1.0, 0.5, 0.85).value, 0.63);
    }

    #[test]
    fn fallback_suggestions_on_a_clean_record() {
        assert_eq!(composite_score(0.1, 0.1, 0.0).value, 0.28);
    }

    #[test]
    fn certain_duplicate_with_no_suggestions_scores_zero() {
        assert_eq!(composite_score(0.0, 0.0, 1.0).value, 0.0);
    }
}
