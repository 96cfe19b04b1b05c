use config::{Config, ConfigError, Environment, File};
use projections::DisplayFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = r#"
[api]
base_url = "http://localhost:5000"
timeout_secs = 30
# Listing endpoints are paginated; the console asks for everything in one page
page_limit = 1000

[display]
currency_symbol = "₹"
date_format = "%d/%m/%Y"

[contributions]
# Fallback when the backend has no current amount configured
# monthly_amount = 600
page_size = 10

[session]
# path = "/path/to/session.json"
"#;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub display: DisplayFormat,
    #[serde(default)]
    pub contributions: ContributionSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
}

fn default_timeout() -> u64 {
    30
}

fn default_page_limit() -> u32 {
    1000
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: default_timeout(),
            page_limit: default_page_limit(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ContributionSettings {
    pub monthly_amount: Option<f64>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    10
}

impl Default for ContributionSettings {
    fn default() -> Self {
        Self {
            monthly_amount: None,
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SessionSettings {
    pub path: Option<PathBuf>,
}

impl ConsoleConfig {
    /// Loads the config from the default location, writing a commented default file first
    /// if none exists.
    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        let config_path = get_config_path();
        Self::load_from(&config_path).map(|config| (config, config_path))
    }

    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            std::fs::write(config_path, DEFAULT_CONFIG).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.to_path_buf()))
            .add_source(Environment::with_prefix("COOP_LEDGER").separator("__"))
            .build()?;

        builder.try_deserialize()
    }

    pub fn session_path(&self) -> PathBuf {
        if let Some(path) = &self.session.path {
            return path.clone();
        }

        match dirs::data_local_dir() {
            Some(data_dir) => data_dir.join("coop-ledger").join("session.json"),
            None => PathBuf::from("coop-ledger-session.json"),
        }
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("coop-ledger").join("console.toml")
    } else {
        PathBuf::from("console.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_is_written_and_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("console.toml");

        let config = ConsoleConfig::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.api.base_url, "http://localhost:5000");
        assert_eq!(config.api.page_limit, 1000);
        assert_eq!(config.display, DisplayFormat::default());
        assert_eq!(config.contributions.monthly_amount, None);
        assert_eq!(config.contributions.page_size, 10);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.toml");
        std::fs::write(
            &path,
            "[api]\nbase_url = \"https://society.example\"\n\n[contributions]\nmonthly_amount = 750.0\n",
        )
        .unwrap();

        let config = ConsoleConfig::load_from(&path).unwrap();
        assert_eq!(config.api.base_url, "https://society.example");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.contributions.monthly_amount, Some(750.0));
        assert_eq!(config.display.currency_symbol, "₹");
    }

    #[test]
    fn test_session_path_override() {
        let config = ConsoleConfig {
            session: SessionSettings {
                path: Some(PathBuf::from("/tmp/session.json")),
            },
            ..Default::default()
        };
        assert_eq!(config.session_path(), PathBuf::from("/tmp/session.json"));
    }
}
