use anyhow::{bail, Context, Result};
use elidx_core::Language;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Queries run against the index; must not be empty.
    #[serde(default)]
    pub mentions: Vec<String>,
    #[serde(default = "default_language")]
    pub language: Language,
    #[serde(default)]
    pub index_dir: Option<String>,
}

fn default_data_dir() -> String { "./data".into() }
fn default_language() -> Language { Language::Russian }

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("config file not found: {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("bad config {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let cfg: AppConfig = serde_json::from_str(raw).context("config is not valid JSON for this schema")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.mentions.iter().all(|m| m.trim().is_empty()) {
            bail!("`mentions` must contain at least one non-empty query");
        }
        if self.data_dir.trim().is_empty() {
            bail!("`data_dir` must not be empty");
        }
        Ok(())
    }

    pub fn index_dir(&self) -> PathBuf {
        match &self.index_dir {
            Some(dir) => PathBuf::from(dir),
            None => Path::new(&self.data_dir).join("index"),
        }
    }
}
