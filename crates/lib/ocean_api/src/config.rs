//! API server configuration.

use std::fmt;
use std::time::Duration;

use ocean_core::auth::jwt::{DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL};
use thiserror::Error;

/// Default frontend origin, used for CORS and for links in emails.
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";

/// Secrets that are refused outright.
const INSECURE_SECRETS: &[&str] = &["secret"];

/// Configuration errors. Any of these prevents startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set")]
    MissingSecret,

    #[error("JWT_SECRET is set to an insecure placeholder value")]
    InsecureSecret,

    #[error("{var} is not a valid duration: {source}")]
    InvalidDuration {
        var: &'static str,
        #[source]
        source: humantime::DurationError,
    },

    #[error("{var} is not a valid port: {value}")]
    InvalidPort { var: &'static str, value: String },

    #[error("{var} must be true or false, got {value}")]
    InvalidFlag { var: &'static str, value: String },
}

/// Outbound mail settings handed to the mailer.
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub from_email: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".into(),
            port: 587,
            user: None,
            from_email: "no-reply@oceaninsight.com".into(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Interface to bind (e.g. "0.0.0.0").
    pub bind_addr: String,
    pub port: u16,
    /// PostgreSQL connection URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// JWT signing secret.
    pub jwt_secret: String,
    pub jwt_expiry: Duration,
    pub refresh_token_expiry: Duration,
    /// CORS origin and base for links embedded in emails.
    pub frontend_url: String,
    pub smtp: SmtpConfig,
    pub rate_limit_enabled: bool,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("port", &self.port)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expiry", &self.jwt_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .field("frontend_url", &self.frontend_url)
            .field("smtp", &self.smtp)
            .field("rate_limit_enabled", &self.rate_limit_enabled)
            .finish()
    }
}

impl ApiConfig {
    /// Defaults for everything except the secret. Used by tests and embedders.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: "0.0.0.0".into(),
            port: 4000,
            database_url: None,
            jwt_secret: jwt_secret.into(),
            jwt_expiry: DEFAULT_ACCESS_TTL,
            refresh_token_expiry: DEFAULT_REFRESH_TTL,
            frontend_url: DEFAULT_FRONTEND_URL.into(),
            smtp: SmtpConfig::default(),
            rate_limit_enabled: true,
        }
    }

    /// Reads configuration from environment variables.
    ///
    /// | Variable               | Default                 |
    /// |------------------------|-------------------------|
    /// | `JWT_SECRET`           | required                |
    /// | `JWT_EXPIRY`           | `1h`                    |
    /// | `REFRESH_TOKEN_EXPIRY` | `7d`                    |
    /// | `DATABASE_URL`         | unset (in-memory store) |
    /// | `FRONTEND_URL`         | `http://localhost:5173` |
    /// | `BIND_ADDR` / `PORT`   | `0.0.0.0` / `4000`      |
    /// | `SMTP_*`               | see [`SmtpConfig`]      |
    /// | `RATE_LIMIT_ENABLED`   | `true`                  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ApiConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::MissingSecret)?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if INSECURE_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::InsecureSecret);
        }

        let mut config = Self::new(jwt_secret);
        if let Some(v) = var("JWT_EXPIRY") {
            config.jwt_expiry = parse_duration("JWT_EXPIRY", &v)?;
        }
        if let Some(v) = var("REFRESH_TOKEN_EXPIRY") {
            config.refresh_token_expiry = parse_duration("REFRESH_TOKEN_EXPIRY", &v)?;
        }
        config.database_url = var("DATABASE_URL");
        if let Some(v) = var("FRONTEND_URL") {
            config.frontend_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = var("BIND_ADDR") {
            config.bind_addr = v;
        }
        if let Some(v) = var("PORT") {
            config.port = parse_port("PORT", &v)?;
        }
        if let Some(v) = var("SMTP_HOST") {
            config.smtp.host = v;
        }
        if let Some(v) = var("SMTP_PORT") {
            config.smtp.port = parse_port("SMTP_PORT", &v)?;
        }
        config.smtp.user = var("SMTP_USER");
        if let Some(v) = var("SMTP_FROM_EMAIL") {
            config.smtp.from_email = v;
        }
        if let Some(v) = var("RATE_LIMIT_ENABLED") {
            config.rate_limit_enabled = parse_flag("RATE_LIMIT_ENABLED", &v)?;
        }
        Ok(config)
    }

    /// `host:port` for the listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn parse_duration(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim())
        .map_err(|source| ConfigError::InvalidDuration { var, source })
}

fn parse_port(var: &'static str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidPort {
        var,
        value: value.to_string(),
    })
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            var,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn secret_is_mandatory() {
        assert!(matches!(config_from(&[]), Err(ConfigError::MissingSecret)));
        assert!(matches!(
            config_from(&[("JWT_SECRET", "  ")]),
            Err(ConfigError::MissingSecret)
        ));
        assert!(matches!(
            config_from(&[("JWT_SECRET", "secret")]),
            Err(ConfigError::InsecureSecret)
        ));
    }

    #[test]
    fn defaults_apply() {
        let config = config_from(&[("JWT_SECRET", "a-long-random-value")]).unwrap();
        assert_eq!(config.jwt_expiry, Duration::from_secs(3600));
        assert_eq!(config.refresh_token_expiry, Duration::from_secs(7 * 86400));
        assert_eq!(config.port, 4000);
        assert_eq!(config.frontend_url, DEFAULT_FRONTEND_URL);
        assert!(config.database_url.is_none());
        assert!(config.rate_limit_enabled);
        assert_eq!(config.listen_addr(), "0.0.0.0:4000");
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("JWT_SECRET", "k"),
            ("JWT_EXPIRY", "15m"),
            ("REFRESH_TOKEN_EXPIRY", "30d"),
            ("PORT", "8080"),
            ("FRONTEND_URL", "https://ocean.example/"),
            ("DATABASE_URL", "postgres://localhost/ocean"),
            ("RATE_LIMIT_ENABLED", "false"),
        ])
        .unwrap();
        assert_eq!(config.jwt_expiry, Duration::from_secs(900));
        assert_eq!(config.refresh_token_expiry, Duration::from_secs(30 * 86400));
        assert_eq!(config.port, 8080);
        assert_eq!(config.frontend_url, "https://ocean.example");
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/ocean"));
        assert!(!config.rate_limit_enabled);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            config_from(&[("JWT_SECRET", "k"), ("JWT_EXPIRY", "soon")]),
            Err(ConfigError::InvalidDuration { var: "JWT_EXPIRY", .. })
        ));
        assert!(matches!(
            config_from(&[("JWT_SECRET", "k"), ("PORT", "99999")]),
            Err(ConfigError::InvalidPort { .. })
        ));
    }

    #[test]
    fn debug_redacts_secret() {
        let config = ApiConfig::new("super-secret-value");
        assert!(!format!("{config:?}").contains("super-secret-value"));
    }
}
