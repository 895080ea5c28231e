// crates/t2-cli/src/services/project.rs - `t2 init` project scaffolding
//
// Creates the smallest project a device can run. Nothing is written when
// any target file already exists.

use anyhow::{Context as AnyhowContext, Result, bail};
use regex::Regex;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    JavaScript,
    Rust,
}

impl Language {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "js" | "javascript" => Ok(Self::JavaScript),
            "rs" | "rust" => Ok(Self::Rust),
            other => bail!("Unsupported language: {} (expected js or rs)", other),
        }
    }
}

/// Package name derived from the directory name
fn package_name(dir: &Path) -> String {
    let base = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let name = invalid_name_chars().map(|re| re.replace_all(&base, "-").trim_matches('-').to_string());
    match name {
        Some(name) if !name.is_empty() => name,
        _ => "t2-project".to_string(),
    }
}

fn invalid_name_chars() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9_-]+").ok()).as_ref()
}

fn files_for(lang: Language, name: &str) -> Vec<(PathBuf, String)> {
    match lang {
        Language::JavaScript => {
            let manifest = json!({
                "name": name,
                "version": "0.0.1",
                "description": "t2 project",
                "main": "index.js",
                "license": "MIT",
            });
            vec![
                (
                    PathBuf::from("package.json"),
                    format!("{:#}\n", manifest),
                ),
                (
                    PathBuf::from("index.js"),
                    "'use strict';\n\nconsole.log('Hello from your device!');\n".to_string(),
                ),
            ]
        }
        Language::Rust => vec![
            (
                PathBuf::from("Cargo.toml"),
                format!(
                    "[package]\nname = \"{}\"\nversion = \"0.1.0\"\nedition = \"2021\"\n\n[dependencies]\n",
                    name
                ),
            ),
            (
                PathBuf::from("src").join("main.rs"),
                "fn main() {\n    println!(\"Hello from your device!\");\n}\n".to_string(),
            ),
        ],
    }
}

/// Write a new project into `dir`, returning the created paths
pub fn scaffold(dir: &Path, lang: Language) -> Result<Vec<PathBuf>> {
    let absolute = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Cannot determine current directory")?
            .join(dir)
    };
    let files = files_for(lang, &package_name(&absolute));

    for (relative, _) in &files {
        let path = absolute.join(relative);
        if path.exists() {
            bail!("{} already exists, refusing to overwrite", path.display());
        }
    }

    let mut created = Vec::with_capacity(files.len());
    for (relative, content) in files {
        let path = absolute.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Cannot write {}", path.display()))?;
        created.push(path);
    }
    Ok(created)
}
