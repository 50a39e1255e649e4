use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CURRENCY: &str = "ron";
const DEFAULT_CATALOG_PATH: &str = "data/menu.json";
const DEFAULT_WEBHOOK_TOLERANCE_SECS: u64 = 300;
const CONFIG_DIR: &str = "config";

/// Application configuration with validation.
///
/// Values come from `config/{profile}.toml` files overlaid with `APP__*`
/// environment variables. Secrets (the payment provider API key and the
/// webhook signing secret) have no defaults and are expected from the
/// environment.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment ("development", "production", ...)
    #[serde(default = "default_env")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Secret API key for the hosted payment provider.
    /// Checkout session creation fails without it.
    #[serde(default)]
    pub stripe_secret_key: Option<String>,

    /// Signing secret for inbound payment webhooks.
    /// The webhook endpoint refuses to process events without it.
    #[serde(default)]
    pub stripe_webhook_secret: Option<String>,

    /// Allowed clock skew for webhook signature timestamps, in seconds
    #[serde(default = "default_webhook_tolerance_secs")]
    pub webhook_tolerance_secs: u64,

    /// Three-letter ISO currency code used for checkout line items
    #[serde(default = "default_currency")]
    #[validate(custom = "validate_currency")]
    pub currency: String,

    /// Path to the static menu catalog document
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// CORS: comma-separated list of allowed origins; unset means permissive
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Emit user-facing cart notices through the notification channel
    #[serde(default = "default_true")]
    pub cart_notifications: bool,
}

fn validate_currency(currency: &str) -> Result<(), ValidationError> {
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("currency");
        err.message = Some("Currency must be a 3-letter ISO code".into());
        Err(err)
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_env() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}
fn default_catalog_path() -> String {
    DEFAULT_CATALOG_PATH.to_string()
}
fn default_webhook_tolerance_secs() -> u64 {
    DEFAULT_WEBHOOK_TOLERANCE_SECS
}
fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_env(),
            log_level: default_log_level(),
            log_json: false,
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            webhook_tolerance_secs: default_webhook_tolerance_secs(),
            currency: default_currency(),
            catalog_path: default_catalog_path(),
            cors_allowed_origins: None,
            cart_notifications: true,
        }
    }
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Loads configuration from `config/` profile files and `APP__*` environment
/// variables, then validates it.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let cfg: AppConfig = Config::builder()
        .add_source(File::with_name(&format!("{CONFIG_DIR}/default")).required(false))
        .add_source(File::with_name(&format!("{CONFIG_DIR}/{run_env}")).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?
        .try_deserialize()?;

    cfg.validate()?;
    Ok(cfg)
}

/// Initializes the global tracing subscriber.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("cantina_api={level},tower_http=debug");
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::try_new(filter_directive)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.currency, "ron");
        assert_eq!(cfg.webhook_tolerance_secs, 300);
        assert!(!cfg.is_production());
    }

    #[test]
    fn currency_must_be_three_letter_code() {
        let mut cfg = AppConfig::default();
        cfg.currency = "lei!".to_string();
        assert!(cfg.validate().is_err());

        cfg.currency = "eur".to_string();
        assert!(cfg.validate().is_ok());
    }
}
