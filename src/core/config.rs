use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

fn default_timeout_secs() -> u64 {
    5
}

fn default_enabled() -> bool {
    true
}

fn default_retry_delay_ms() -> u64 {
    500
}

/// Settings every HTTP rate source shares.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FetchSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra attempts after a transport failure. Zero means a single attempt.
    #[serde(default)]
    pub retries: usize,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        FetchSettings {
            enabled: true,
            timeout_secs: default_timeout_secs(),
            retries: 0,
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CentralBankProviderConfig {
    pub url: String,
    #[serde(flatten)]
    pub fetch: FetchSettings,
}

impl Default for CentralBankProviderConfig {
    fn default() -> Self {
        CentralBankProviderConfig {
            url: "https://www.tcmb.gov.tr/kurlar/today.xml".to_string(),
            fetch: FetchSettings::default(),
        }
    }
}

fn default_sell_field() -> String {
    "satis".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AggregatorProviderConfig {
    pub url: String,
    #[serde(default = "default_sell_field")]
    pub sell_field: String,
    #[serde(flatten)]
    pub fetch: FetchSettings,
}

impl Default for AggregatorProviderConfig {
    fn default() -> Self {
        AggregatorProviderConfig {
            url: "https://api.genelpara.com/embed/para-birimleri.json".to_string(),
            sell_field: default_sell_field(),
            fetch: FetchSettings::default(),
        }
    }
}

fn default_attribute() -> String {
    "data-last-price".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ScrapeProviderConfig {
    /// Page URL with `{from}` and `{to}` placeholders.
    pub url_template: String,
    #[serde(default = "default_attribute")]
    pub attribute: String,
    #[serde(flatten)]
    pub fetch: FetchSettings,
}

impl Default for ScrapeProviderConfig {
    fn default() -> Self {
        ScrapeProviderConfig {
            url_template: "https://www.google.com/finance/quote/{from}-{to}".to_string(),
            attribute: default_attribute(),
            fetch: FetchSettings::default(),
        }
    }
}

/// Rate sources in priority order. A missing section falls back to defaults.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ProvidersConfig {
    pub central_bank: Option<CentralBankProviderConfig>,
    pub aggregator: Option<AggregatorProviderConfig>,
    pub scrape: Option<ScrapeProviderConfig>,
}

fn default_currency() -> String {
    "TRY".to_string()
}

fn default_owner() -> String {
    "default".to_string()
}

fn default_watchlist() -> Vec<String> {
    vec!["USD".to_string(), "EUR".to_string(), "GBP".to_string()]
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Target currency every amount is converted into.
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_owner")]
    pub owner: String,
    #[serde(default = "default_watchlist")]
    pub watchlist: Vec<String>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            currency: default_currency(),
            owner: default_owner(),
            watchlist: default_watchlist(),
            providers: ProvidersConfig::default(),
            data_path: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "fintrack", "fintrack")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "fintrack", "fintrack")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
