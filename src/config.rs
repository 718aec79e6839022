use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_API_PORT: u16 = 3333;

/// Prefix for environment overrides, e.g. `ROUTECORE__API_PORT=8080` or
/// `ROUTECORE__TLS__DECODE_BASE64_WRAPPED=false`.
pub const ENV_PREFIX: &str = "ROUTECORE";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Port handed to the management endpoint.
    pub api_port: u16,
    pub tls: TlsValidationConfig,
    pub health: HealthConfig,
    pub logging: LoggingConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            api_port: DEFAULT_API_PORT,
            tls: TlsValidationConfig::default(),
            health: HealthConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsValidationConfig {
    /// Let opaque keys reach their modulus through their textual description.
    pub allow_textual_modulus_fallback: bool,
    /// Accept base64-wrapped PEM as delivered by the control plane.
    pub decode_base64_wrapped: bool,
}

impl Default for TlsValidationConfig {
    fn default() -> Self {
        Self {
            allow_textual_modulus_fallback: true,
            decode_base64_wrapped: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub config_stale_after_secs: u64,
    pub certificates_stale_after_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            config_stale_after_secs: 300,      // 5 minutes
            certificates_stale_after_secs: 3600, // 1 hour
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl RouterConfig {
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::error::RouterError::Config(e.to_string()))
    }

    /// Layer `ROUTECORE__*` environment variables over an optional TOML file,
    /// then validate the result.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).format(::config::FileFormat::Toml));
        }
        let config: RouterConfig = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.api_port == 0 {
            return Err(crate::error::RouterError::InvalidConfig(
                "api_port must be greater than 0".to_string(),
            ));
        }
        if self.health.config_stale_after_secs == 0 {
            return Err(crate::error::RouterError::InvalidConfig(
                "health.config_stale_after_secs must be greater than 0".to_string(),
            ));
        }
        if self.health.certificates_stale_after_secs == 0 {
            return Err(crate::error::RouterError::InvalidConfig(
                "health.certificates_stale_after_secs must be greater than 0".to_string(),
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(crate::error::RouterError::InvalidConfig(format!(
                "logging.level '{}' is not one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}
