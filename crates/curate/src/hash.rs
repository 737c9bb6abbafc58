use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

/// Length of the transaction hash, in hex characters.
pub const TX_HASH_LEN: usize = 24;

/// Content identity of a normalized transaction: SHA-256 over
/// `"{date}|{amount}|{description}"`, hex-encoded, truncated to 24 chars.
///
/// Deterministic by construction. Records that normalize to the same three
/// fields collide by definition; the metrics pass surfaces those instead of
/// this function preventing them.
pub fn tx_hash(date: &str, amount: Decimal, normalized_description: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{date}|{amount}|{normalized_description}"));
    let digest: [u8; 32] = hasher.finalize().into();
    let mut hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex.truncate(TX_HASH_LEN);
    hex
}
