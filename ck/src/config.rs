//! Configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bibliography::{Bibliography, DEFAULT_SEARCH_LIMIT};
use crate::tools::{ToolBridge, ToolEnvironment, ToolPrograms};

/// Main citekit configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    pub bibliography: BibliographyConfig,

    pub tools: ToolsConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: ./citekit.yml
        let local_config = PathBuf::from("citekit.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/citekit/citekit.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("citekit").join("citekit.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        tracing::debug!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Bibliography location and search defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BibliographyConfig {
    /// Bibliography JSON file; falls back to `BIB_JSON`, then `~/endnote/phd_biblio.json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Results returned by `search` when no limit is given
    #[serde(rename = "search-limit")]
    pub search_limit: usize,

    /// Drop matches scoring below this; unset returns every match
    #[serde(rename = "min-score", skip_serializing_if = "Option::is_none")]
    pub min_score: Option<u32>,
}

impl Default for BibliographyConfig {
    fn default() -> Self {
        Self {
            path: None,
            search_limit: DEFAULT_SEARCH_LIMIT,
            min_score: None,
        }
    }
}

impl BibliographyConfig {
    /// Build an unloaded bibliography; `path_override` wins over the configured path
    pub fn bibliography(&self, path_override: Option<PathBuf>) -> Bibliography {
        Bibliography::new(path_override.or_else(|| self.path.clone())).with_min_score(self.min_score)
    }
}

/// External tool settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Exported to the tools as `PAPERS_DIR`
    #[serde(rename = "papers-dir", skip_serializing_if = "Option::is_none")]
    pub papers_dir: Option<PathBuf>,

    /// Timeout for query calls in milliseconds; unset waits indefinitely
    #[serde(rename = "timeout-ms", skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    pub programs: ToolPrograms,
}

impl ToolsConfig {
    /// Build a bridge over `env`; `papers_dir_override` wins over the configured directory
    pub fn bridge(&self, env: ToolEnvironment, papers_dir_override: Option<PathBuf>) -> ToolBridge {
        let env = match papers_dir_override.or_else(|| self.papers_dir.clone()) {
            Some(dir) => env.with_papers_dir(dir),
            None => env,
        };
        ToolBridge::new(env)
            .with_programs(self.programs.clone())
            .with_timeout(self.timeout_ms.map(Duration::from_millis))
    }
}
