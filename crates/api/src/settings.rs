//! Server configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! TOML file, then `CHARGE_PREDICTOR__*` environment variables
//! (e.g. `CHARGE_PREDICTOR__AUTH__SECRET`).

use crate::predictor::MissPolicy;
use crate::rate_limit::RateLimitConfig;
use data_validator::ValidationConfig;
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "CHARGE_PREDICTOR_CONFIG";

/// Config file used when [`CONFIG_PATH_ENV`] is unset
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Signing secret used when none is configured. Fine for local runs only.
pub const DEV_SECRET: &str = "2FABF43CA4C11CA916817BB689461";

/// Top-level settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub artifacts: ArtifactSettings,
    pub auth: AuthSettings,
    pub encoding: EncodingSettings,
    pub validation: ValidationConfig,
    pub logging: LoggingSettings,
    pub rate_limit: RateLimitConfig,
    pub metrics: MetricsSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listen address
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Paths of the trained artifacts, loaded once at startup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactSettings {
    /// JSON object mapping column name to position
    pub feature_index: PathBuf,
    /// JSON model artifact or `.onnx` graph
    pub model: PathBuf,
}

impl Default for ArtifactSettings {
    fn default() -> Self {
        Self {
            feature_index: PathBuf::from("artifacts/feature_index.json"),
            model: PathBuf::from("artifacts/model.json"),
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub username: String,
    pub password: String,
    /// HMAC key for session tokens
    pub secret: String,
    pub session_ttl_seconds: i64,
    /// Add `Secure` to the session cookie (serve over HTTPS)
    pub secure_cookie: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            username: "test".to_string(),
            password: "test".to_string(),
            secret: DEV_SECRET.to_string(),
            session_ttl_seconds: 3600,
            secure_cookie: false,
        }
    }
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("username", &self.username)
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("secure_cookie", &self.secure_cookie)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EncodingSettings {
    /// What to do when a submitted field does not reach the feature vector
    pub miss_policy: MissPolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Max level: trace, debug, info, warn, error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Install the Prometheus recorder and serve `/metrics`
    pub enabled: bool,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Settings {
    /// Load settings from the file named by [`CONFIG_PATH_ENV`] (or the
    /// default path) and the environment. A missing file is not an error.
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("CHARGE_PREDICTOR")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// True when the signing secret was never changed from the built-in one
    pub fn uses_dev_secret(&self) -> bool {
        self.auth.secret == DEV_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.bind, "0.0.0.0:8080");
        assert_eq!(settings.auth.username, "test");
        assert_eq!(settings.encoding.miss_policy, MissPolicy::Warn);
        assert!(settings.uses_dev_secret());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = Settings::load_from("/nonexistent/charge-predictor").unwrap();
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.artifacts.model, PathBuf::from("artifacts/model.json"));
    }

    #[test]
    fn test_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
bind = "127.0.0.1:9000"

[encoding]
miss_policy = "reject"

[validation]
age_range = [18.0, 64.0]

[rate_limit]
enabled = false
"#
        )
        .unwrap();

        let settings = Settings::load_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(settings.server.bind, "127.0.0.1:9000");
        assert_eq!(settings.encoding.miss_policy, MissPolicy::Reject);
        assert_eq!(settings.validation.age_range, (18.0, 64.0));
        assert!(!settings.rate_limit.enabled);
        assert_eq!(settings.auth.password, "test");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let printed = format!("{:?}", Settings::default());
        assert!(!printed.contains(DEV_SECRET));
    }
}
