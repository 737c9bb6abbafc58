use super::store::{MemoryError, MemoryStore, UpsertOutcome};

/// Records one user correction against a transaction hash.
///
/// Corrections are additive and only influence future batches: the next
/// memory read for this identity sees the updated maps, and any transaction
/// hashing to `tx_hash` then resolves at full confidence. Secondary
/// (description + amount) keys are never written by corrections.
pub fn apply_correction<S: MemoryStore + ?Sized>(
    store: &S,
    identity: &str,
    tx_hash: &str,
    new_payee: Option<&str>,
    new_category: Option<&str>,
) -> Result<UpsertOutcome, MemoryError> {
    if tx_hash.trim().is_empty() {
        return Err(MemoryError::MissingHash);
    }
    store.upsert(identity, tx_hash, new_payee, new_category)
}
