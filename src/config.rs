use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = ".enhancements-report.toml";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_ORG: &str = "openshift";
pub const DEFAULT_REPO: &str = "enhancements";
pub const DEFAULT_STALE_AFTER_DAYS: u32 = 90;

const DEFAULT_PRIORITY_LABELS: &[&str] = &["priority/critical-urgent", "priority/important-soon"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid pull request number {0:?} in [groups]")]
    InvalidGroupKey(String),
}

/// Top-level configuration loaded from .enhancements-report.toml.
/// All fields are optional; the tool works with zero config as long as a
/// token is available from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub stats: StatsConfig,

    /// Static group assignments keyed by pull request number.
    #[serde(default)]
    pub groups: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
    pub api_url: Option<String>,
    pub org: Option<String>,
    pub repo: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsConfig {
    pub stale_after_days: Option<u32>,

    #[serde(default)]
    pub dev_mode: bool,

    /// Labels that mark a pull request as prioritized. Empty means the defaults.
    #[serde(default)]
    pub priority_labels: Vec<String>,
}

impl Config {
    /// Load configuration from .enhancements-report.toml in the current directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load from a specific path. An explicitly named file must exist.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for key in self.groups.keys() {
            if key.parse::<u64>().is_err() {
                return Err(ConfigError::InvalidGroupKey(key.clone()));
            }
        }
        Ok(())
    }

    /// Resolve the GitHub token: config file value takes precedence,
    /// falls back to GITHUB_TOKEN env var.
    pub fn github_token(&self) -> Option<String> {
        self.token_or(std::env::var("GITHUB_TOKEN").ok())
    }

    fn token_or(&self, fallback: Option<String>) -> Option<String> {
        self.github.token.clone().or(fallback)
    }

    pub fn api_url(&self) -> &str {
        self.github.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn org(&self) -> &str {
        self.github.org.as_deref().unwrap_or(DEFAULT_ORG)
    }

    pub fn repo(&self) -> &str {
        self.github.repo.as_deref().unwrap_or(DEFAULT_REPO)
    }

    pub fn stale_after_days(&self) -> u32 {
        self.stats.stale_after_days.unwrap_or(DEFAULT_STALE_AFTER_DAYS)
    }

    pub fn priority_labels(&self) -> Vec<String> {
        if self.stats.priority_labels.is_empty() {
            DEFAULT_PRIORITY_LABELS.iter().map(|l| l.to_string()).collect()
        } else {
            self.stats.priority_labels.clone()
        }
    }

    /// Static group assignments with their keys parsed as pull request numbers.
    pub fn group_overrides(&self) -> BTreeMap<u64, String> {
        self.groups
            .iter()
            .filter_map(|(k, v)| k.parse::<u64>().ok().map(|n| (n, v.clone())))
            .collect()
    }
}
