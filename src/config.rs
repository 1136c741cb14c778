use anyhow::{Context, Result};
use bigdecimal::BigDecimal;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::FeeSchedule;

pub const DEFAULT_RETURN_LOCATION: &str = "/my-bookings";

const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_BREAKER_FAILURES: u32 = 3;
const DEFAULT_BREAKER_RESET_SECS: u64 = 60;
const DEFAULT_PAYMENT_PROVIDER: &str = "gateway";
const DEFAULT_REDIRECT_DELAY_MS: u64 = 3000;
const MIN_TIMEOUT_SECS: u64 = 1;
const MAX_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: u16,
    pub backend_base_url: String,
    pub backend_api_token: Option<String>,
    pub backend_timeout_secs: u64,
    pub breaker_failure_threshold: u32,
    pub breaker_reset_secs: u64,
    pub payment_provider: String,
    pub fees: FeeSchedule,
    pub return_redirect_delay_ms: u64,
    pub default_return_location: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    /// Defaults for everything except the backend location.
    pub fn new(backend_base_url: impl Into<String>) -> Self {
        Config {
            server_port: DEFAULT_SERVER_PORT,
            backend_base_url: backend_base_url.into(),
            backend_api_token: None,
            backend_timeout_secs: DEFAULT_TIMEOUT_SECS,
            breaker_failure_threshold: DEFAULT_BREAKER_FAILURES,
            breaker_reset_secs: DEFAULT_BREAKER_RESET_SECS,
            payment_provider: DEFAULT_PAYMENT_PROVIDER.to_string(),
            fees: FeeSchedule::default(),
            return_redirect_delay_ms: DEFAULT_REDIRECT_DELAY_MS,
            default_return_location: DEFAULT_RETURN_LOCATION.to_string(),
            log_format: LogFormat::Text,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        let fees = FeeSchedule::new(
            parse_amount("CLEANING_FEE", &env::var("CLEANING_FEE").unwrap_or_else(|_| "50.00".to_string()))?,
            parse_amount("SERVICE_FEE_RATE", &env::var("SERVICE_FEE_RATE").unwrap_or_else(|_| "0.10".to_string()))?,
            parse_amount("TAX_RATE", &env::var("TAX_RATE").unwrap_or_else(|_| "0.18".to_string()))?,
        );

        let backend_timeout_secs: u64 = match env::var("BACKEND_TIMEOUT_SECS") {
            Ok(raw) => raw.parse()?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Config {
            server_port: match env::var("SERVER_PORT") {
                Ok(raw) => raw.parse()?,
                Err(_) => DEFAULT_SERVER_PORT,
            },
            backend_base_url: env::var("BACKEND_BASE_URL").context("BACKEND_BASE_URL is required")?,
            backend_api_token: env::var("BACKEND_API_TOKEN").ok().filter(|t| !t.is_empty()),
            backend_timeout_secs: backend_timeout_secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS),
            breaker_failure_threshold: match env::var("BACKEND_BREAKER_FAILURES") {
                Ok(raw) => raw.parse()?,
                Err(_) => DEFAULT_BREAKER_FAILURES,
            },
            breaker_reset_secs: match env::var("BACKEND_BREAKER_RESET_SECS") {
                Ok(raw) => raw.parse()?,
                Err(_) => DEFAULT_BREAKER_RESET_SECS,
            },
            payment_provider: env::var("PAYMENT_PROVIDER")
                .unwrap_or_else(|_| DEFAULT_PAYMENT_PROVIDER.to_string()),
            fees,
            return_redirect_delay_ms: match env::var("RETURN_REDIRECT_DELAY_MS") {
                Ok(raw) => raw.parse()?,
                Err(_) => DEFAULT_REDIRECT_DELAY_MS,
            },
            default_return_location: env::var("DEFAULT_RETURN_LOCATION")
                .unwrap_or_else(|_| DEFAULT_RETURN_LOCATION.to_string()),
            log_format: parse_log_format(&env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()))?,
        })
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs)
    }

    pub fn return_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.return_redirect_delay_ms)
    }
}

fn parse_amount(name: &str, raw: &str) -> anyhow::Result<BigDecimal> {
    let value = BigDecimal::from_str(raw.trim())
        .map_err(|e| anyhow::anyhow!("{} must be a decimal number: {}", name, e))?;

    if value < BigDecimal::from(0) {
        anyhow::bail!("{} must not be negative", name);
    }

    Ok(value)
}

fn parse_log_format(raw: &str) -> Result<LogFormat> {
    match raw.trim().to_lowercase().as_str() {
        "text" | "" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => anyhow::bail!("LOG_FORMAT must be 'text' or 'json', got '{}'", other),
    }
}
