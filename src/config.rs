use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::scrapers::context::ScrapeContext;
use crate::scrapers::selectors::{CompiledLayout, SiteLayout};
use crate::scrapers::types::ScrapeSettings;

/// How pages are fetched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Fetcher {
    /// Headless Chrome; needed for lazy loading and the review feed
    #[default]
    Browser,
    /// Plain HTTP; only sees server-rendered markup
    Http,
}

/// Settings file contents. Every field is optional in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    pub base_url: String,
    pub metro_id: u32,
    pub output_dir: PathBuf,
    pub fetcher: Fetcher,
    pub headless: bool,
    pub settings: ScrapeSettings,
    pub layout: SiteLayout,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.opentable.com".to_string(),
            metro_id: 8,
            output_dir: PathBuf::from("."),
            fetcher: Fetcher::Browser,
            headless: true,
            settings: ScrapeSettings::default(),
            layout: SiteLayout::default(),
        }
    }
}

impl ScoutConfig {
    /// Read a JSON settings file, or fall back to defaults when none is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded settings from {}", path.display());
        Ok(config)
    }

    pub fn into_context(self) -> Result<ScrapeContext> {
        let layout = CompiledLayout::compile(self.layout).context("Invalid selector in site layout")?;
        Ok(ScrapeContext {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            metro_id: self.metro_id,
            output_dir: self.output_dir,
            settings: self.settings,
            layout,
        })
    }
}
