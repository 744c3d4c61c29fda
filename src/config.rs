use std::env;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub base_url: String,
    pub secret_key: String,
    /// Shared secret the provider echoes in `x-callback-token`.
    pub webhook_token: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub payment: PaymentConfig,
}

impl Config {
    /// Reads configuration from the process environment. Call
    /// `dotenv().ok()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let or_default =
            |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let port = or_default("PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: e.to_string(),
            })?;

        let timeout_secs = or_default("PAYMENT_TIMEOUT_SECS", "15")
            .parse::<u64>()
            .map_err(|e| ConfigError::Invalid {
                name: "PAYMENT_TIMEOUT_SECS",
                reason: e.to_string(),
            })?;

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            host: or_default("HOST", "127.0.0.1"),
            port,
            frontend_url: or_default("FRONTEND_URL", "http://localhost:5173")
                .trim_end_matches('/')
                .to_string(),
            payment: PaymentConfig {
                base_url: or_default("XENDIT_BASE_URL", "https://api.xendit.co")
                    .trim_end_matches('/')
                    .to_string(),
                secret_key: required("XENDIT_SECRET_KEY")?,
                webhook_token: required("XENDIT_WEBHOOK_TOKEN")?,
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "sqlite://hotel.db"),
        ("XENDIT_SECRET_KEY", "xnd_development_key"),
        ("XENDIT_WEBHOOK_TOKEN", "callback-token"),
    ];

    #[test]
    fn defaults_fill_optional_values() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.frontend_url, "http://localhost:5173");
        assert_eq!(config.payment.base_url, "https://api.xendit.co");
        assert_eq!(config.payment.webhook_token, "callback-token");
        assert_eq!(config.payment.timeout, Duration::from_secs(15));
    }

    #[test]
    fn missing_webhook_token_is_rejected() {
        let err = Config::from_lookup(lookup(&REQUIRED[..2])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("XENDIT_WEBHOOK_TOKEN"));
    }

    #[test]
    fn blank_secret_counts_as_missing() {
        let mut vars = REQUIRED.to_vec();
        vars[1] = ("XENDIT_SECRET_KEY", "  ");
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert_eq!(err, ConfigError::Missing("XENDIT_SECRET_KEY"));
    }

    #[test]
    fn bad_port_is_reported() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PORT", "eighty"));
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("FRONTEND_URL", "https://hotels.example.com/"));
        vars.push(("XENDIT_BASE_URL", "http://localhost:9000/"));
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.frontend_url, "https://hotels.example.com");
        assert_eq!(config.payment.base_url, "http://localhost:9000");
    }
}
