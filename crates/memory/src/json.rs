use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use super::store::{
    normalize_correction, now_millis, validate_identity, MemoryError, MemoryStore, UpsertOutcome,
    UserMemory,
};

/// Default per-identity memory location, relative to the working directory.
pub const DEFAULT_MEMORY_DIR: &str = "data/memory";

/// One JSON file per identity under a root directory.
///
/// Reads never fail: a missing file means a fresh identity, and an unreadable
/// or corrupt file degrades to the empty default with a warning. Every upsert
/// holds a per-identity lock across the whole read-modify-write cycle and
/// replaces the file via temp-write + rename, so a reader observes either the
/// old memory or the new one, never a torn write.
pub struct JsonFileStore {
    root: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), locks: Mutex::new(HashMap::new()) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, identity: &str) -> PathBuf {
        self.root.join(format!("{identity}.json"))
    }

    fn lock_for(&self, identity: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks.entry(identity.to_string()).or_default().clone()
    }

    fn load(&self, identity: &str) -> UserMemory {
        let path = self.path_for(identity);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No memory file for '{identity}', starting empty");
                return UserMemory::default();
            }
            Err(e) => {
                warn!("Failed to read memory file {}: {e}", path.display());
                return UserMemory::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(memory) => memory,
            Err(e) => {
                warn!("Corrupt memory file {}: {e}", path.display());
                UserMemory::default()
            }
        }
    }

    // Temp filename carries the PID so two processes cannot clobber each
    // other's in-flight write.
    fn save(&self, identity: &str, memory: &UserMemory) -> Result<(), MemoryError> {
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(identity);
        let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
        fs::write(&tmp, serde_json::to_string_pretty(memory)?)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_DIR)
    }
}

impl MemoryStore for JsonFileStore {
    fn get(&self, identity: &str) -> UserMemory {
        if validate_identity(identity).is_err() {
            warn!("Invalid identity '{identity}', returning empty memory");
            return UserMemory::default();
        }
        self.load(identity)
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
        let lock = self.lock_for(identity);
        let _guard = lock.lock().unwrap();
        let mut memory = self.load(identity);
        let outcome = memory.apply_correction(tx_hash, new_payee, new_category, now_millis());
        self.save(identity, &memory)?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, JsonFileStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("memory"));
        (dir, store)
    }

    #[test]
    fn get_unknown_identity_is_empty() {
        let (_dir, store) = store();
        assert!(store.get("fresh").is_empty());
    }

    #[test]
    fn upsert_creates_file_and_persists() {
        let (_dir, store) = store();
        store.upsert("demo", "h1", Some("MERCADONA"), Some("SUPERMERCADO")).unwrap();

        let path = store.root().join("demo.json");
        assert!(path.exists());

        let memory = store.get("demo");
        assert_eq!(memory.payee_map.get("h1").map(String::as_str), Some("MERCADONA"));
        assert_eq!(memory.corrections.len(), 1);
    }

    #[test]
    fn reopened_store_reads_same_file() {
        let (_dir, store) = store();
        store.upsert("demo", "h1", Some("BAR PEPE"), None).unwrap();

        let reopened = JsonFileStore::new(store.root());
        let memory = reopened.get("demo");
        assert_eq!(memory.payee_map.get("h1").map(String::as_str), Some("BAR PEPE"));
        assert_eq!(memory.history_version, 1);
    }

    #[test]
    fn corrupt_file_degrades_to_default() {
        let (_dir, store) = store();
        fs::create_dir_all(store.root()).unwrap();
        fs::write(store.root().join("demo.json"), "{not json").unwrap();
        assert!(store.get("demo").is_empty());
    }

    #[test]
    fn upsert_over_corrupt_file_starts_fresh() {
        let (_dir, store) = store();
        fs::create_dir_all(store.root()).unwrap();
        fs::write(store.root().join("demo.json"), "[]").unwrap();

        let outcome = store.upsert("demo", "h1", None, Some("OTROS")).unwrap();
        assert_eq!(outcome.total_corrections, 1);
        let memory = store.get("demo");
        assert_eq!(memory.category_map.get("h1").map(String::as_str), Some("OTROS"));
    }

    #[test]
    fn corrections_accumulate_across_upserts() {
        let (_dir, store) = store();
        store.upsert("demo", "h1", Some("A"), None).unwrap();
        store.upsert("demo", "h2", None, Some("SALUD")).unwrap();
        let outcome = store.upsert("demo", "h1", Some("B"), None).unwrap();
        assert_eq!(outcome.total_corrections, 3);

        let memory = store.get("demo");
        assert_eq!(memory.payee_map.get("h1").map(String::as_str), Some("B"));
        assert_eq!(memory.payee_map.len(), 1);
        assert_eq!(memory.category_map.len(), 1);
    }

    #[test]
    fn invalid_identity_never_touches_disk() {
        let (_dir, store) = store();
        assert!(matches!(
            store.upsert("../../etc/passwd", "h1", Some("X"), None),
            Err(MemoryError::InvalidIdentity(_))
        ));
        // get degrades instead of erroring
        assert!(store.get("../../etc/passwd").is_empty());
        assert!(!store.root().exists());
    }

    #[test]
    fn identities_are_isolated() {
        let (_dir, store) = store();
        store.upsert("ana", "h1", Some("MERCADONA"), None).unwrap();
        store.upsert("ben", "h1", Some("LIDL"), None).unwrap();

        assert_eq!(store.get("ana").payee_map.get("h1").map(String::as_str), Some("MERCADONA"));
        assert_eq!(store.get("ben").payee_map.get("h1").map(String::as_str), Some("LIDL"));
    }
}
