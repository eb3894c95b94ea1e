use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::controller::{EndOfListPolicy, LoadOptions};
use crate::error::{PagewalkError, Result};

pub const DEFAULT_ENDPOINT: &str = "https://api.disneyapi.dev/character";
const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_END_THRESHOLD: usize = 3;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub endpoint: String,
    pub title: Option<String>,
    /// No deadline unless set
    pub timeout_secs: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            title: None,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    pub page_size: u32,
    pub end_policy: EndOfListPolicy,
    pub report_load_more_errors: bool,
    /// Rows from the bottom at which the next page is requested
    pub end_threshold: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            end_policy: EndOfListPolicy::default(),
            report_load_more_errors: false,
            end_threshold: DEFAULT_END_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub list: ListConfig,
}

fn config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("pagewalk").join("config.toml"))
}

impl Config {
    /// Read the user config, falling back to defaults when it is missing or
    /// cannot be parsed.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Config::default();
        };

        let Ok(content) = std::fs::read_to_string(&path) else {
            return Config::default();
        };

        match Self::parse(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring invalid config");
                Config::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| PagewalkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.source.endpoint.trim().is_empty() {
            return Err(PagewalkError::Config("source.endpoint is empty".to_string()));
        }
        if self.list.page_size == 0 {
            return Err(PagewalkError::Config(
                "list.page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            end_policy: self.list.end_policy,
            report_load_more_errors: self.list.report_load_more_errors,
            ..LoadOptions::new(self.list.page_size)
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.source.timeout_secs.map(Duration::from_secs)
    }

    /// Header text for the list screen
    pub fn title(&self) -> String {
        self.source
            .title
            .clone()
            .unwrap_or_else(|| self.source.endpoint.clone())
    }
}
