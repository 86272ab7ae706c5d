//! Configuration for the session client

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix, e.g. `NOMDOC_API_BASE_URL` or `NOMDOC_COOKIE__DOMAIN`
pub const ENV_PREFIX: &str = "NOMDOC";

/// Main session client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Base URL of the API, without trailing slash
    pub api_base_url: String,

    /// The only path that gets access tokens attached and refreshed
    pub protected_path: String,

    /// Token exchange endpoint
    pub token_path: String,

    /// Login-token request endpoint
    pub authorize_path: String,

    /// Refresh token revocation endpoint
    pub revoke_path: String,

    /// Account registration endpoint
    pub register_path: String,

    /// Request timeout in seconds (0 disables the timeout)
    pub timeout_secs: u64,

    /// Optional user agent override
    pub user_agent: Option<String>,

    /// Refresh token cookie settings used by server-side rendering
    pub cookie: CookieConfig,
}

/// Refresh token cookie settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Cookie domain
    pub domain: String,

    /// Lifetime in seconds
    pub max_age_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:4000".to_string(),
            protected_path: "/graph".to_string(),
            token_path: "/oauth/token".to_string(),
            authorize_path: "/oauth/authorize".to_string(),
            revoke_path: "/oauth/revoke".to_string(),
            register_path: "/accounts".to_string(),
            timeout_secs: 30,
            user_agent: None,
            cookie: CookieConfig::default(),
        }
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            domain: "localhost".to_string(),
            max_age_secs: 30 * 24 * 60 * 60, // 30 days
        }
    }
}

impl SessionConfig {
    /// Load configuration from file, overridden by `NOMDOC_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read, parsed or validated
    pub fn from_file<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with defaults and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables cannot be parsed
    pub fn from_env() -> CoreResult<Self> {
        let defaults = Self::default();

        let settings = config::Config::builder()
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default("protected_path", defaults.protected_path)?
            .set_default("token_path", defaults.token_path)?
            .set_default("authorize_path", defaults.authorize_path)?
            .set_default("revoke_path", defaults.revoke_path)?
            .set_default("register_path", defaults.register_path)?
            .set_default("timeout_secs", defaults.timeout_secs)?
            .set_default("cookie.domain", defaults.cookie.domain)?
            .set_default("cookie.max_age_secs", defaults.cookie.max_age_secs)?
            .add_source(environment())
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the client relies on
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] describing the first violation
    pub fn validate(&self) -> CoreResult<()> {
        url::Url::parse(&self.api_base_url).map_err(|e| {
            CoreError::invalid_config(format!("api_base_url {:?}: {e}", self.api_base_url))
        })?;

        for (name, path) in [
            ("protected_path", &self.protected_path),
            ("token_path", &self.token_path),
            ("authorize_path", &self.authorize_path),
            ("revoke_path", &self.revoke_path),
            ("register_path", &self.register_path),
        ] {
            if !path.starts_with('/') {
                return Err(CoreError::invalid_config(format!(
                    "{name} must start with '/', got {path:?}"
                )));
            }
        }
        Ok(())
    }

    /// Request timeout, `None` when disabled
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.protected_path, "/graph");
        assert_eq!(config.cookie.max_age_secs, 2_592_000);
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_zero_timeout_disables() {
        let config = SessionConfig {
            timeout_secs: 0,
            ..SessionConfig::default()
        };
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_validate_rejects_relative_path() {
        let config = SessionConfig {
            protected_path: "graph".to_string(),
            ..SessionConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("protected_path"));
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let config = SessionConfig {
            api_base_url: "not a url".to_string(),
            ..SessionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_from_file_fills_missing_fields() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "api_base_url = \"https://api.nomdoc.com\"\ntimeout_secs = 5\n\n[cookie]\ndomain = \"nomdoc.com\""
        )
        .unwrap();

        let config = SessionConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api_base_url, "https://api.nomdoc.com");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.cookie.domain, "nomdoc.com");
        assert_eq!(config.cookie.max_age_secs, 2_592_000);
        assert_eq!(config.token_path, "/oauth/token");
    }
}
