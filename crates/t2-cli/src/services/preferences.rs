// crates/t2-cli/src/services/preferences.rs - preferences.json store
//
// A flat JSON object of string keys to string values. A missing file reads
// as empty; writes rewrite the whole file.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use t2_core::{PreferenceError, PreferenceStore};
use tokio::fs;

pub struct JsonPreferences {
    path: PathBuf,
}

impl JsonPreferences {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, PreferenceError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| PreferenceError::Malformed {
            file: self.path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Store `value` under `key`, creating the file if needed
    pub async fn write(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut values = self.load().await?;
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&values).map_err(|e| PreferenceError::Malformed {
            file: self.path.display().to_string(),
            error: e.to_string(),
        })?;
        fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for JsonPreferences {
    async fn read(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.load().await?.remove(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_reads_none() {
        let dir = TempDir::new().unwrap();
        let prefs = JsonPreferences::new(dir.path().join("preferences.json"));
        assert_eq!(prefs.read("run.entryPoint").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let prefs = JsonPreferences::new(dir.path().join("nested").join("preferences.json"));
        prefs.write("run.entryPoint", "index.js").await.unwrap();
        prefs.write("crash.enabled", "false").await.unwrap();

        assert_eq!(prefs.read("run.entryPoint").await.unwrap().as_deref(), Some("index.js"));
        assert_eq!(prefs.read("crash.enabled").await.unwrap().as_deref(), Some("false"));
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "{not json").unwrap();
        let prefs = JsonPreferences::new(path);
        assert!(matches!(
            prefs.read("anything").await,
            Err(PreferenceError::Malformed { .. })
        ));
    }
}
