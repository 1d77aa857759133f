use config::builder::DefaultState;
use config::{Config as ConfigLoader, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::admission::{RateLimit, WindowUnit};
use crate::error::{AppError, Result};
use crate::http::HttpSettings;

pub const DEFAULT_API_URL: &str = "https://ismp.crpt.ru/api/v3/";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // General
    pub log_level: String,

    // Registration API
    pub api_url: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,

    // Rate limit: at most `request_limit` calls per `window_count` x `window_unit`
    pub request_limit: i64,
    pub window_unit: WindowUnit,
    pub window_count: u32,

    /// Bounded wait for a permit; unset means wait indefinitely.
    pub admission_timeout_ms: Option<u64>,
}

impl Config {
    /// Defaults, then `crpt.{toml,json,yaml,...}` if present, then `.env`
    /// and `CRPT_*` environment variables.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let loader = Self::defaults()?
            .add_source(File::with_name("crpt").required(false))
            .add_source(Environment::with_prefix("CRPT").try_parsing(true))
            .build()?;

        Self::finish(loader)
    }

    /// Defaults overlaid with a TOML document. Environment is not consulted.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let loader = Self::defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;

        Self::finish(loader)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        let builder = ConfigLoader::builder()
            .set_default("log_level", "info")?
            .set_default("api_url", DEFAULT_API_URL)?
            .set_default("connect_timeout_ms", 2_000)?
            .set_default("request_timeout_ms", 10_000)?
            .set_default("request_limit", 10)?
            .set_default("window_unit", "minute")?
            .set_default("window_count", 1)?;
        Ok(builder)
    }

    fn finish(loader: ConfigLoader) -> Result<Self> {
        let config: Self = loader.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.api_url)?;
        self.rate_limit()?;

        if self.connect_timeout_ms == 0 || self.request_timeout_ms == 0 {
            return Err(AppError::Init("HTTP timeouts must be greater than zero".into()));
        }
        if self.admission_timeout_ms == Some(0) {
            return Err(AppError::Init("admission_timeout_ms must be greater than zero".into()));
        }

        Ok(())
    }

    pub fn window(&self) -> Duration {
        self.window_unit.duration() * self.window_count
    }

    pub fn rate_limit(&self) -> Result<RateLimit> {
        Ok(RateLimit::new(self.window(), self.request_limit)?)
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }

    pub fn admission_timeout(&self) -> Option<Duration> {
        self.admission_timeout_ms.map(Duration::from_millis)
    }
}
