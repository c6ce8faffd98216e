use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::chart::time::{TimeNormalizer, DEFAULT_LABEL_FORMAT, DEFAULT_UTC_OFFSET_MINUTES};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub chart: ChartConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_minute_data_path")]
    pub minute_data_path: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(skip)]
    pub api_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartConfig {
    pub stock_code: String,
    /// Trading day to chart, `YYYY-MM-DD`. Empty means the backend's default.
    #[serde(default)]
    pub trade_date: String,
    #[serde(default = "default_utc_offset_minutes")]
    pub display_utc_offset_minutes: i32,
    #[serde(default = "default_label_format")]
    pub label_format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    pub refresh_rate_ms: u64,
    /// Seconds between automatic refetches; 0 disables.
    #[serde(default)]
    pub auto_refresh_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

fn default_minute_data_path() -> String {
    "/stock-minute-data".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_utc_offset_minutes() -> i32 {
    DEFAULT_UTC_OFFSET_MINUTES
}

fn default_label_format() -> String {
    DEFAULT_LABEL_FORMAT.to_string()
}

impl ChartConfig {
    pub fn normalizer(&self) -> Result<TimeNormalizer> {
        TimeNormalizer::new(self.display_utc_offset_minutes, &self.label_format).with_context(|| {
            format!(
                "invalid chart display settings: offset {} min, label format '{}'",
                self.display_utc_offset_minutes, self.label_format
            )
        })
    }

    pub fn trade_date(&self) -> Result<Option<chrono::NaiveDate>> {
        let s = self.trade_date.trim();
        if s.is_empty() {
            return Ok(None);
        }
        chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .with_context(|| format!("invalid chart.trade_date '{}': expected YYYY-MM-DD", s))
    }
}

/// `AUTOTRADE_CONFIG_PATH`, else `config/default.toml`.
pub fn config_path() -> PathBuf {
    std::env::var("AUTOTRADE_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config/default.toml"))
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::load_from_path(&config_path())?;
        config.backend.api_token = std::env::var("AUTOTRADE_API_TOKEN").ok();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            bail!("backend.base_url must not be empty");
        }
        if self.backend.request_timeout_ms == 0 {
            bail!("backend.request_timeout_ms must be > 0");
        }
        if self.chart.stock_code.trim().is_empty() {
            bail!("chart.stock_code must not be empty");
        }
        if self.ui.refresh_rate_ms == 0 {
            bail!("ui.refresh_rate_ms must be > 0");
        }
        self.chart.normalizer()?;
        self.chart.trade_date()?;
        Ok(())
    }
}
