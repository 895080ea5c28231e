// crates/t2-core/src/preferences.rs - Persisted key/value state (read side)

use async_trait::async_trait;
use thiserror::Error;

/// Key under which the last deployed entry point is remembered
pub const ENTRY_POINT_KEY: &str = "run.entryPoint";

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed preferences file {file}: {error}")]
    Malformed { file: String, error: String },
}

/// Read access to persisted preferences
///
/// The dispatch layer never writes preferences; collaborators that own a
/// setting (deploy, crash reporter, key registration) write through their
/// concrete store.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Value stored under `key`, `None` when unset
    async fn read(&self, key: &str) -> Result<Option<String>, PreferenceError>;
}
