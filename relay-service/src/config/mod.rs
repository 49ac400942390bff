use secrecy::{ExposeSecret, Secret};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

pub const DEFAULT_INFERENCE_URL: &str =
    "https://api-inference.huggingface.co/models/google/flan-t5-base";

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub common: core_config::Config,
    pub scrape: ScrapeConfig,
    pub inference: InferenceConfig,
    pub smtp: SmtpConfig,
    /// When set, spans are exported to this OTLP collector.
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub api_url: String,
    pub api_key: Option<Secret<String>>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret<String>,
    pub from_email: String,
    pub from_name: String,
    pub timeout_secs: u64,
}

impl ScrapeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl InferenceConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SmtpConfig {
    /// Credentials are operator-supplied; without both there is nothing to send with.
    pub fn has_credentials(&self) -> bool {
        !self.user.trim().is_empty() && !self.password.expose_secret().trim().is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let smtp_user = first_env(&["SMTP_USER", "EMAIL_USER"]).unwrap_or_default();

        Ok(RelayConfig {
            common: common_config,
            scrape: ScrapeConfig {
                timeout_secs: parse_env("SCRAPE_TIMEOUT_SECS", 30)?,
            },
            inference: InferenceConfig {
                api_url: get_env("INFERENCE_API_URL", DEFAULT_INFERENCE_URL),
                api_key: first_env(&["INFERENCE_API_KEY", "HF_API_KEY"]).map(Secret::new),
                timeout_secs: parse_env("INFERENCE_TIMEOUT_SECS", 10)?,
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", "smtp.gmail.com"),
                port: parse_env("SMTP_PORT", 587)?,
                password: Secret::new(
                    first_env(&["SMTP_PASSWORD", "EMAIL_PASSWORD"]).unwrap_or_default(),
                ),
                from_email: first_env(&["SMTP_FROM_EMAIL"]).unwrap_or_else(|| smtp_user.clone()),
                from_name: get_env("SMTP_FROM_NAME", "E-Invoicing Monitor"),
                user: smtp_user,
                timeout_secs: parse_env("SMTP_TIMEOUT_SECS", 30)?,
            },
            otlp_endpoint: first_env(&["OTLP_ENDPOINT"]),
        })
    }
}

fn get_env(key: &str, default: &str) -> String {
    first_env(&[key]).unwrap_or_else(|| default.to_string())
}

/// First non-empty value among `keys`.
fn first_env(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| env::var(key).ok())
        .find(|val| !val.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match first_env(&[key]) {
        Some(raw) => raw.trim().parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e))
        }),
        None => Ok(default),
    }
}
