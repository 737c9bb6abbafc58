use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current memory schema version. Bumped only alongside a migration story.
pub const HISTORY_VERSION: u32 = 1;

/// Per-identity learned state.
///
/// The serialized field names (`payeeMap`, `categoryMap`, `corrections`,
/// `historyVersion`) are a frozen file contract; existing files must keep
/// deserializing, including files written before a field existed. Map keys
/// are either a transaction hash or a secondary key of the form
/// `"<normalized description>::<rounded amount>"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserMemory {
    pub payee_map: HashMap<String, String>,
    pub category_map: HashMap<String, String>,
    pub corrections: Vec<CorrectionRecord>,
    pub history_version: u32,
}

impl Default for UserMemory {
    fn default() -> Self {
        UserMemory {
            payee_map: HashMap::new(),
            category_map: HashMap::new(),
            corrections: Vec::new(),
            history_version: HISTORY_VERSION,
        }
    }
}

impl UserMemory {
    pub fn is_empty(&self) -> bool {
        self.payee_map.is_empty() && self.category_map.is_empty() && self.corrections.is_empty()
    }

    /// Applies one correction in place: hash keys are overwritten whole, and
    /// exactly one audit record is appended.
    pub fn apply_correction(
        &mut self,
        tx_hash: &str,
        new_payee: Option<&str>,
        new_category: Option<&str>,
        timestamp: i64,
    ) -> UpsertOutcome {
        let payee_applied = match new_payee {
            Some(payee) => {
                self.payee_map.insert(tx_hash.to_string(), payee.to_string());
                true
            }
            None => false,
        };
        let category_applied = match new_category {
            Some(category) => {
                self.category_map.insert(tx_hash.to_string(), category.to_string());
                true
            }
            None => false,
        };
        self.corrections.push(CorrectionRecord {
            tx_hash: tx_hash.to_string(),
            new_payee: new_payee.map(str::to_string),
            new_category: new_category.map(str::to_string),
            timestamp,
        });
        UpsertOutcome {
            updated: true,
            payee_applied,
            category_applied,
            total_corrections: self.corrections.len(),
        }
    }
}

/// One applied correction, kept as an append-only audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionRecord {
    pub tx_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_payee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_category: Option<String>,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

/// What one upsert changed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpsertOutcome {
    pub updated: bool,
    pub payee_applied: bool,
    pub category_applied: bool,
    pub total_corrections: usize,
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Invalid identity: '{0}'")]
    InvalidIdentity(String),
    #[error("Correction must set a payee or a category")]
    EmptyCorrection,
    #[error("Correction requires a transaction hash")]
    MissingHash,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Memory encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Repository port for per-identity curation memory.
///
/// `get` is infallible by contract: callers always receive usable memory,
/// with any storage problem degraded to the empty default. `upsert` is the
/// only mutation and performs a full read-modify-write per call.
pub trait MemoryStore: Send + Sync {
    fn get(&self, identity: &str) -> UserMemory;

    fn upsert(
        &self,
        identity: &str,
        tx_hash: &str,
        new_payee: Option<&str>,
        new_category: Option<&str>,
    ) -> Result<UpsertOutcome, MemoryError>;
}

/// Identities become file names, so the alphabet is restricted up front.
pub(crate) fn validate_identity(identity: &str) -> Result<(), MemoryError> {
    let ok = !identity.is_empty()
        && identity
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if ok {
        Ok(())
    } else {
        Err(MemoryError::InvalidIdentity(identity.to_string()))
    }
}

/// Blank strings count as absent; a correction must carry at least one value.
pub(crate) fn normalize_correction<'a>(
    new_payee: Option<&'a str>,
    new_category: Option<&'a str>,
) -> Result<(Option<&'a str>, Option<&'a str>), MemoryError> {
    let new_payee = new_payee.filter(|p| !p.trim().is_empty());
    let new_category = new_category.filter(|c| !c.trim().is_empty());
    if new_payee.is_none() && new_category.is_none() {
        return Err(MemoryError::EmptyCorrection);
    }
    Ok((new_payee, new_category))
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// HashMap-backed store for tests and for embedding without persistence.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, UserMemory>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever is stored for `identity`.
    pub fn seed(&self, identity: &str, memory: UserMemory) {
        self.entries.lock().unwrap().insert(identity.to_string(), memory);
    }
}

impl MemoryStore for InMemoryStore {
    fn get(&self, identity: &str) -> UserMemory {
        self.entries
            .lock()
            .unwrap()
            .get(identity)
            .cloned()
            .unwrap_or_default()
    }

    fn upsert(
        &self,
        identity: &str,
        tx_hash: &str,
        new_payee: Option<&str>,
        new_category: Option<&str>,
    ) -> Result<UpsertOutcome, MemoryError> {
        validate_identity(identity)?;
        let (new_payee, new_category) = normalize_correction(new_payee, new_category)?;
        let mut entries = self.entries.lock().unwrap();
        let memory = entries.entry(identity.to_string()).or_default();
        Ok(memory.apply_correction(tx_hash, new_payee, new_category, now_millis()))
    }
}
