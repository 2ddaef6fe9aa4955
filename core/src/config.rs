//! Client configuration.
//!
//! - `HASS_URL`: base address (default `http://homeassistant.local:8123`)
//! - `HASS_TOKEN`: long-lived access token (required)
//! - `HASS_TIMEOUT_MS`: per-request deadline in milliseconds (default 10000)
//! - `HASS_VALIDATE_SSL`: `false` / `0` disables certificate validation
//!
//! The core treats the address and token as opaque strings; `validate` is
//! for the boundary that collects them.

use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://homeassistant.local:8123";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

const MIN_TIMEOUT: Duration = Duration::from_millis(1_000);
const MAX_TIMEOUT: Duration = Duration::from_millis(60_000);

/// Immutable connection settings for a `HassClient`.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    token: String,
    timeout: Duration,
    validate_tls: bool,
}

impl ClientConfig {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            timeout: DEFAULT_TIMEOUT,
            validate_tls: true,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_tls_validation(mut self, validate: bool) -> Self {
        self.validate_tls = validate;
        self
    }

    /// Read the configuration from `HASS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("HASS_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let token = std::env::var("HASS_TOKEN").map_err(|_| ConfigError::Missing("HASS_TOKEN"))?;
        let mut config = Self::new(&base_url, &token);

        if let Ok(raw) = std::env::var("HASS_TIMEOUT_MS") {
            let ms: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "HASS_TIMEOUT_MS",
                reason: format!("'{raw}' is not a number of milliseconds"),
            })?;
            config = config.with_timeout(Duration::from_millis(ms));
        }
        if let Ok(raw) = std::env::var("HASS_VALIDATE_SSL") {
            let validate = !matches!(raw.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no");
            config = config.with_tls_validation(validate);
        }
        Ok(config)
    }

    /// Check every setting and report all problems together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        match reqwest::Url::parse(&self.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(_) => problems.push("URL must use http or https protocol".to_string()),
            Err(_) => problems.push("Invalid URL format".to_string()),
        }
        if self.token.trim().is_empty() {
            problems.push("Access token must not be empty".to_string());
        }
        if self.timeout < MIN_TIMEOUT {
            problems.push("Request timeout should be at least 1000ms".to_string());
        }
        if self.timeout > MAX_TIMEOUT {
            problems.push("Request timeout should not exceed 60000ms".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Rejected(problems))
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn validate_tls(&self) -> bool {
        self.validate_tls
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("validate_tls", &self.validate_tls)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        let config = ClientConfig::new("http://ha.local:8123/", "token-value");
        assert_eq!(config.base_url(), "http://ha.local:8123");
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::new("http://ha.local:8123", "token-value");
        assert_eq!(config.timeout(), Duration::from_millis(10_000));
        assert!(config.validate_tls());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn debug_redacts_token() {
        let config = ClientConfig::new("http://ha.local:8123", "super-secret-token");
        let printed = format!("{config:?}");
        assert!(!printed.contains("super-secret-token"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn validate_rejects_non_http_scheme() {
        let err = ClientConfig::new("ftp://ha.local", "token-value").validate().unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn validate_collects_every_problem() {
        let err = ClientConfig::new("not a url", "")
            .with_timeout(Duration::from_millis(10))
            .validate()
            .unwrap_err();
        match err {
            ConfigError::Rejected(problems) => assert_eq!(problems.len(), 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn validate_rejects_timeout_above_limit() {
        let err = ClientConfig::new("https://ha.local", "token-value")
            .with_timeout(Duration::from_secs(120))
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("60000ms"));
    }

    /// `from_env` reads process-global state; tests touching `HASS_*` hold this.
    static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

    const VARS: [&str; 4] = ["HASS_URL", "HASS_TOKEN", "HASS_TIMEOUT_MS", "HASS_VALIDATE_SSL"];

    fn with_env<R>(vars: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        for name in VARS {
            std::env::remove_var(name);
        }
        for (name, value) in vars {
            std::env::set_var(name, value);
        }
        let out = f();
        for name in VARS {
            std::env::remove_var(name);
        }
        out
    }

    #[test]
    fn from_env_requires_token() {
        let err = with_env(&[("HASS_URL", "http://ha.local:8123")], ClientConfig::from_env).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("HASS_TOKEN")));
    }

    #[test]
    fn from_env_defaults_url_and_timeout() {
        let config = with_env(&[("HASS_TOKEN", "env-token")], ClientConfig::from_env).unwrap();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.token(), "env-token");
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert!(config.validate_tls());
    }

    #[test]
    fn from_env_reads_every_setting() {
        let config = with_env(
            &[
                ("HASS_URL", "https://ha.example.com/"),
                ("HASS_TOKEN", "env-token"),
                ("HASS_TIMEOUT_MS", " 2500 "),
                ("HASS_VALIDATE_SSL", "FALSE"),
            ],
            ClientConfig::from_env,
        )
        .unwrap();
        assert_eq!(config.base_url(), "https://ha.example.com");
        assert_eq!(config.timeout(), Duration::from_millis(2500));
        assert!(!config.validate_tls());
    }

    #[test]
    fn from_env_rejects_non_numeric_timeout() {
        let err = with_env(
            &[("HASS_TOKEN", "env-token"), ("HASS_TIMEOUT_MS", "soon")],
            ClientConfig::from_env,
        )
        .unwrap_err();
        match err {
            ConfigError::Invalid { name, reason } => {
                assert_eq!(name, "HASS_TIMEOUT_MS");
                assert!(reason.contains("'soon'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn from_env_tls_flag_values() {
        for (raw, expected) in [("0", false), ("no", false), ("false", false), ("true", true), ("1", true)] {
            let config = with_env(
                &[("HASS_TOKEN", "env-token"), ("HASS_VALIDATE_SSL", raw)],
                ClientConfig::from_env,
            )
            .unwrap();
            assert_eq!(config.validate_tls(), expected, "HASS_VALIDATE_SSL={raw}");
        }
    }
}
