// crates/t2-cli/src/services/keys.rs - Local access key

use anyhow::{Context as AnyhowContext, Result};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Outcome of `ensure_key`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStatus {
    Created(PathBuf),
    Existing(PathBuf),
}

/// Create the key file at `path` unless one is already there
pub async fn ensure_key(path: &Path) -> Result<KeyStatus> {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Ok(KeyStatus::Existing(path.to_path_buf()));
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Cannot create {}", parent.display()))?;
    }

    let material = format!(
        "t2-key {}{}\n",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    );
    tokio::fs::write(path, material)
        .await
        .with_context(|| format!("Cannot write key {}", path.display()))?;
    restrict_permissions(path).await?;

    Ok(KeyStatus::Created(path.to_path_buf()))
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .await
        .with_context(|| format!("Cannot restrict permissions on {}", path.display()))
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
