// crates/t2-cli/src/services/crash.rs - Crash report spool
//
// Reports are JSON files under <home>/crash-reports/, one per report,
// named by a v4 uuid. The on/off switch lives in preferences.json so it
// survives config rewrites.

use anyhow::Context as AnyhowContext;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use std::path::PathBuf;
use t2_core::{CrashReporter, OpResult, PreferenceStore};
use tracing::info;
use uuid::Uuid;

use super::JsonPreferences;

pub const CRASH_ENABLED_KEY: &str = "crash.enabled";

pub struct FileCrashReporter<'a> {
    preferences: &'a JsonPreferences,
    dir: PathBuf,
    enabled_by_default: bool,
}

impl<'a> FileCrashReporter<'a> {
    pub fn new(preferences: &'a JsonPreferences, dir: PathBuf, enabled_by_default: bool) -> Self {
        Self {
            preferences,
            dir,
            enabled_by_default,
        }
    }

    async fn enabled(&self) -> anyhow::Result<bool> {
        let stored = self.preferences.read(CRASH_ENABLED_KEY).await?;
        Ok(match stored.as_deref() {
            Some("false") => false,
            Some("true") => true,
            _ => self.enabled_by_default,
        })
    }

    async fn set_enabled(&self, enabled: bool) -> OpResult {
        self.preferences
            .write(CRASH_ENABLED_KEY, if enabled { "true" } else { "false" })
            .await
            .map_err(anyhow::Error::from)?;
        Ok(())
    }
}

#[async_trait]
impl CrashReporter for FileCrashReporter<'_> {
    async fn status(&self) -> OpResult {
        let state = if self.enabled().await? { "on" } else { "off" };
        info!("Crash reporter is {}", state);
        Ok(())
    }

    async fn on(&self) -> OpResult {
        self.set_enabled(true).await?;
        info!("Crash reporter enabled");
        Ok(())
    }

    async fn off(&self) -> OpResult {
        self.set_enabled(false).await?;
        info!("Crash reporter disabled");
        Ok(())
    }

    async fn test(&self) -> OpResult {
        self.post(json!({
            "message": "Testing the crash reporter",
            "test": true,
        }))
        .await
    }

    async fn post(&self, report: Value) -> OpResult {
        if !self.enabled().await? {
            info!("Crash reporter is off; report discarded");
            return Ok(());
        }

        let id = Uuid::new_v4();
        let envelope = json!({
            "id": id.to_string(),
            "timestamp": Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION"),
            "report": report,
        });

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Cannot create {}", self.dir.display()))?;
        let path = self.dir.join(format!("{}.json", id));
        let body = serde_json::to_string_pretty(&envelope).context("Cannot encode crash report")?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("Cannot write {}", path.display()))?;

        info!("Crash report saved: {}", path.display());
        Ok(())
    }

    async fn submit(&self, path: &str) -> OpResult {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Cannot read crash report {}", path))?;
        let report: Value = serde_json::from_str(&content)
            .with_context(|| format!("Crash report {} is not valid JSON", path))?;
        self.post(report).await
    }
}
