use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use criba_core::{NormalizedTransaction, RawAmount, RawTransaction};

use crate::hash;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_labeled_ref, r"\b(ref|codigo)\s+([0-9a-z]{4,})\b");
re!(re_code_token, r"\b[0-9a-z]{6,}\b");

// ── Description pipeline ─────────────────────────────────────────────────────

/// Folds the accented Latin letters Spanish bank feeds emit down to their
/// base letters (`ñ` → `n`); anything else passes through unchanged.
pub fn fold_diacritics(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            c => c,
        })
        .collect()
}

/// Drops bank reference noise from an already lowercased string.
///
/// A `ref`/`codigo` label followed by a digit-bearing token of ≥4 chars keeps
/// only the label; standalone alphanumeric tokens of ≥6 chars containing a
/// digit disappear entirely. Tokens without digits are never touched. Labels
/// can chain (`ref 1234 5678`), so the label pass runs to a fixpoint.
pub fn strip_reference_tokens(s: &str) -> String {
    let mut text = s.to_string();
    loop {
        let next = re_labeled_ref().replace_all(&text, |caps: &regex::Captures| {
            if caps[2].bytes().any(|b| b.is_ascii_digit()) {
                caps[1].to_string()
            } else {
                caps[0].to_string()
            }
        });
        if next == text.as_str() {
            break;
        }
        text = next.into_owned();
    }
    re_code_token()
        .replace_all(&text, |caps: &regex::Captures| {
            if caps[0].bytes().any(|b| b.is_ascii_digit()) {
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Collapses whitespace runs to single spaces and trims the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The full description cleanup, in fixed order: lowercase, fold diacritics,
/// strip reference tokens, collapse whitespace. Idempotent: applying it to
/// its own output changes nothing.
pub fn normalize_description(raw: &str) -> String {
    collapse_whitespace(&strip_reference_tokens(&fold_diacritics(&raw.to_lowercase())))
}

// ── Dates ────────────────────────────────────────────────────────────────────

/// Converts Spanish `DD/MM/YYYY` to ISO `YYYY-MM-DD` and re-emits valid ISO
/// canonically. Anything else — unknown layout, impossible calendar date —
/// passes through verbatim for the batch layer to flag.
pub fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    for fmt in ["%d/%m/%Y", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    trimmed.to_string()
}

// ── Amounts ──────────────────────────────────────────────────────────────────

/// Parses the Spanish bank convention: dots are thousands separators, the
/// comma is the decimal point. Euro signs and blanks are stripped first.
/// Numeric amounts pass through untouched.
pub fn parse_amount(raw: &RawAmount) -> Result<Decimal, NormalizeError> {
    match raw {
        RawAmount::Number(d) => Ok(*d),
        RawAmount::Text(s) => {
            let cleaned = s
                .trim()
                .replace(['€', ' ', '\u{a0}'], "")
                .replace('.', "")
                .replace(',', ".");
            Decimal::from_str(cleaned.trim_start_matches('+'))
                .map_err(|_| NormalizeError::InvalidAmount(s.trim().to_string()))
        }
    }
}

/// Two decimal places, trailing zeros stripped, `-0` collapsed to `0`, so
/// equal amounts always print — and therefore hash — identically.
pub fn canonical_amount(amount: Decimal) -> Decimal {
    amount.round_dp(2).normalize()
}

// ── Entry point ──────────────────────────────────────────────────────────────

/// Produces the canonical transaction every downstream stage works from.
///
/// The amount is the only hard failure; a date that cannot be converted
/// passes through verbatim so the batch layer can flag the record without
/// dropping it.
pub fn normalize(raw: &RawTransaction) -> Result<NormalizedTransaction, NormalizeError> {
    let date = normalize_date(&raw.date);
    let amount = canonical_amount(parse_amount(&raw.amount)?);
    let normalized_description = normalize_description(&raw.description);
    let hash = hash::tx_hash(&date, amount, &normalized_description);
    Ok(NormalizedTransaction { date, amount, normalized_description, hash })
}
