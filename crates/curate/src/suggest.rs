use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use criba_core::{NormalizedTransaction, Suggestion, SuggestionSource};
use criba_memory::UserMemory;

/// Payee sentinel when nothing resolves.
pub const PAYEE_FALLBACK: &str = "UNKNOWN";
/// Category for records with a payee but no matching rule or memory.
pub const CATEGORY_CATCH_ALL: &str = "OTROS";
/// Category for records nothing could be said about.
pub const CATEGORY_UNCLASSIFIED: &str = "SIN_CLASIFICAR";

/// Tokens that carry no payee signal.
const STOP_WORDS: &[&str] = &["de", "el", "la", "en", "para", "por", "a", "the", "and"];

// ── Memory tiers ─────────────────────────────────────────────────────────────

/// Key that generalizes a memory hit across same-description transactions:
/// `"<normalized description>::<amount rounded to whole units>"`. Midpoints
/// round away from zero; `-0` prints as `0`.
pub fn secondary_key(normalized_description: &str, amount: Decimal) -> String {
    let bucket = amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    format!("{normalized_description}::{bucket}")
}

// Both suggesters resolve through the same two memory tiers before their own
// weaker sources.
fn memory_exact(map: &HashMap<String, String>, hash: &str) -> Option<Suggestion> {
    map.get(hash)
        .map(|value| Suggestion::new(value.clone(), 1.0, SuggestionSource::Memory))
}

fn memory_secondary(map: &HashMap<String, String>, key: &str) -> Option<Suggestion> {
    map.get(key)
        .map(|value| Suggestion::new(value.clone(), 0.85, SuggestionSource::MemorySecondary))
}

// ── Payee ────────────────────────────────────────────────────────────────────

/// Suggests a payee for one normalized transaction.
///
/// Resolution order, first hit wins: exact memory (1.0) → generalized memory
/// (0.85) → description heuristic (0.4) → `UNKNOWN` (0.1).
pub fn suggest_payee(memory: &UserMemory, tx: &NormalizedTransaction) -> Suggestion {
    let key = secondary_key(&tx.normalized_description, tx.amount);
    memory_exact(&memory.payee_map, &tx.hash)
        .or_else(|| memory_secondary(&memory.payee_map, &key))
        .or_else(|| heuristic_payee(&tx.normalized_description))
        .unwrap_or_else(|| Suggestion::new(PAYEE_FALLBACK, 0.1, SuggestionSource::Fallback))
}

/// First three meaningful tokens, upper-cased. Stop words and pure-numeric
/// tokens carry no signal and are skipped.
fn heuristic_payee(normalized_description: &str) -> Option<Suggestion> {
    let tokens: Vec<&str> = normalized_description
        .split_whitespace()
        .filter(|t| !STOP_WORDS.contains(t))
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .take(3)
        .collect();
    if tokens.is_empty() {
        return None;
    }
    Some(Suggestion::new(tokens.join(" ").to_uppercase(), 0.4, SuggestionSource::Heuristic))
}

// ── Category ─────────────────────────────────────────────────────────────────

/// Suggests a category. Resolution order: exact memory (1.0) → generalized
/// memory (0.85) → keyword rule (0.5) → catch-all.
///
/// The catch-all depends on whether a payee was already resolved for this
/// record: a real payee keeps it classifiable (`OTROS`, 0.3); a missing or
/// sentinel payee means there is nothing to classify by (`SIN_CLASIFICAR`,
/// 0.1).
pub fn suggest_category(
    memory: &UserMemory,
    tx: &NormalizedTransaction,
    keywords: &KeywordEngine,
    payee: Option<&Suggestion>,
) -> Suggestion {
    let payee_resolved = payee.is_some_and(|p| !p.is_fallback());
    let key = secondary_key(&tx.normalized_description, tx.amount);
    memory_exact(&memory.category_map, &tx.hash)
        .or_else(|| memory_secondary(&memory.category_map, &key))
        .or_else(|| {
            keywords
                .lookup(&tx.normalized_description)
                .map(|category| Suggestion::new(category, 0.5, SuggestionSource::Keyword))
        })
        .unwrap_or_else(|| {
            if payee_resolved {
                Suggestion::new(CATEGORY_CATCH_ALL, 0.3, SuggestionSource::Fallback)
            } else {
                Suggestion::new(CATEGORY_UNCLASSIFIED, 0.1, SuggestionSource::Fallback)
            }
        })
}

// ── Keyword rules ────────────────────────────────────────────────────────────

/// Built-in Spanish merchant keywords, checked in table order.
pub const DEFAULT_KEYWORDS: &[(&str, &[&str])] = &[
    ("SUPERMERCADO", &["mercadona", "carrefour", "supermercado", "aldi", "lidl"]),
    ("RESTAURANTE", &["restaurante", "bar ", "cafeter", "burger", "sushi"]),
    ("TRANSPORTE", &["uber", "cabify", "metro", "bus", "taxi", "renfe"]),
    ("SUSCRIPCION", &["netflix", "spotify", "amazon prime", "icloud", "youtube"]),
    ("ALQUILER", &["alquiler", "rent"]),
    ("SERVICIOS", &["luz", "agua", "electricidad", "gas", "internet", "movil"]),
    ("SALUD", &["farmacia", "dent", "clinic", "medic"]),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRule {
    pub category: String,
    pub patterns: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct KeywordConfig {
    rules: Vec<KeywordRule>,
}

/// Ordered substring rules mapping descriptions to categories. The first
/// rule with any matching pattern wins, so broader rules belong later.
pub struct KeywordEngine {
    rules: Vec<KeywordRule>,
}

impl KeywordEngine {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        Self { rules }
    }

    /// The built-in Spanish table.
    pub fn default_rules() -> Self {
        Self::new(
            DEFAULT_KEYWORDS
                .iter()
                .map(|(category, patterns)| KeywordRule {
                    category: category.to_string(),
                    patterns: patterns.iter().map(|p| p.to_string()).collect(),
                })
                .collect(),
        )
    }

    /// Loads `[[rules]]` tables, each with `category` and `patterns` keys.
    pub fn from_toml(toml_content: &str) -> Result<Self, String> {
        let config: KeywordConfig =
            toml::from_str(toml_content).map_err(|e| format!("Failed to parse TOML: {e}"))?;
        Ok(Self::new(config.rules))
    }

    /// Patterns match as lowercase substrings of the normalized description.
    pub fn lookup(&self, normalized_description: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| {
                rule.patterns
                    .iter()
                    .any(|p| normalized_description.contains(p.to_lowercase().as_str()))
            })
            .map(|rule| rule.category.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for KeywordEngine {
    fn default() -> Self {
        Self::default_rules()
    }
}
