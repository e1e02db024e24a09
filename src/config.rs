use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::catalog::CatalogSources;
use crate::tabular::SourceLocation;

const SHEET_BASE: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vQa_KVpvPbKTZgFqcrWqB04fXVEsS6Y0d7XzDzwA37DEGAW3qZ4rPwJbuRqNsAyRmX7c2kheEoGlRIJ/pub";

fn sheet_url(gid: &str) -> String {
    format!("{}?gid={}&single=true&output=csv", SHEET_BASE, gid)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourcesConfig {
    pub standards: String,
    pub questions: String,
    pub accommodations: String,
    pub videos: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            standards: sheet_url("0"),
            questions: sheet_url("1354885292"),
            accommodations: sheet_url("421890709"),
            videos: sheet_url("2107013241"),
        }
    }
}

impl SourcesConfig {
    pub fn locations(&self) -> CatalogSources {
        CatalogSources {
            standards: SourceLocation::parse(&self.standards),
            questions: SourceLocation::parse(&self.questions),
            accommodations: SourceLocation::parse(&self.accommodations),
            videos: SourceLocation::parse(&self.videos),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub generate_url: String,
    pub generate_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub default_class_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: SourcesConfig::default(),
            generate_url: "http://localhost:8888/.netlify/functions/generateAiContent".to_string(),
            generate_timeout_secs: 30,
            fetch_timeout_secs: 30,
            default_class_size: 25,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.to_string_lossy()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.to_string_lossy()))
    }

    /// File (if any), then `ARTPLANNER_*` environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn apply_env<F>(&mut self, var: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(v) = text("ARTPLANNER_STANDARDS_SOURCE") {
            self.sources.standards = v;
        }
        if let Some(v) = text("ARTPLANNER_QUESTIONS_SOURCE") {
            self.sources.questions = v;
        }
        if let Some(v) = text("ARTPLANNER_ACCOMMODATIONS_SOURCE") {
            self.sources.accommodations = v;
        }
        if let Some(v) = text("ARTPLANNER_VIDEOS_SOURCE") {
            self.sources.videos = v;
        }
        if let Some(v) = text("ARTPLANNER_GENERATE_URL") {
            self.generate_url = v;
        }
        if let Some(v) = text("ARTPLANNER_GENERATE_TIMEOUT_SECS") {
            self.generate_timeout_secs = v
                .parse()
                .with_context(|| format!("ARTPLANNER_GENERATE_TIMEOUT_SECS: invalid value {}", v))?;
        }
        if let Some(v) = text("ARTPLANNER_FETCH_TIMEOUT_SECS") {
            self.fetch_timeout_secs = v
                .parse()
                .with_context(|| format!("ARTPLANNER_FETCH_TIMEOUT_SECS: invalid value {}", v))?;
        }
        if let Some(v) = text("ARTPLANNER_DEFAULT_CLASS_SIZE") {
            self.default_class_size = v
                .parse()
                .with_context(|| format!("ARTPLANNER_DEFAULT_CLASS_SIZE: invalid value {}", v))?;
        }
        Ok(())
    }

    pub fn generate_timeout(&self) -> Duration {
        Duration::from_secs(self.generate_timeout_secs.max(1))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}
