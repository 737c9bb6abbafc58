pub mod feedback;
pub mod json;
pub mod store;

pub use feedback::apply_correction;
pub use json::{JsonFileStore, DEFAULT_MEMORY_DIR};
pub use store::{
    CorrectionRecord, InMemoryStore, MemoryError, MemoryStore, UpsertOutcome, UserMemory,
    HISTORY_VERSION,
};
