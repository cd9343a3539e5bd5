/*
[INPUT]:  Built-in defaults, optional YAML file, UPKEEP__* environment variables
[OUTPUT]: Validated client settings
[POS]:    Configuration layer - startup settings
[UPDATE]: When adding new configuration options
*/

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use upkeep_adapter::ClientConfig;
use upkeep_adapter::http::DEFAULT_BASE_URL;

use crate::urgency::{DEFAULT_NO_HISTORY_FRACTION, UrgencyPolicy};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "upkeep.yaml";

/// Prefix of environment overrides, e.g. `UPKEEP__API__BASE_URL`
pub const ENV_PREFIX: &str = "UPKEEP";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("failed to render settings template: {0}")]
    Template(#[from] serde_yaml::Error),

    #[error("failed to write settings template: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level client settings
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub session: SessionSettings,
    pub urgency: UrgencySettings,
    pub wizard: WizardSettings,
    pub logging: LoggingSettings,
}

/// Maintenance API endpoint
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionSettings {
    /// JSON file holding token, selected equipment and counter readings
    pub path: PathBuf,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UrgencySettings {
    /// Share of the interval assumed elapsed for tasks never completed
    pub no_history_fraction: f64,
}

impl Default for UrgencySettings {
    fn default() -> Self {
        Self {
            no_history_fraction: DEFAULT_NO_HISTORY_FRACTION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WizardSettings {
    /// Offer the skip-to-details shortcut unless the session flag says otherwise
    pub skip_enabled: bool,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self { skip_enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    /// Daily rolling log files go here when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

fn default_session_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("upkeep")
        .join("session.json")
}

impl Settings {
    /// Layer defaults, the YAML file and the environment. An explicit `path`
    /// must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Yaml).required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false),
        };
        let settings: Settings = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a YAML string on top of the defaults.
    pub fn from_yaml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from_str(content, FileFormat::Yaml))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let base_url = self.api.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(SettingsError::Invalid {
                key: "api.base_url",
                reason: format!("expected an http(s) URL, got {base_url:?}"),
            });
        }
        if self.api.timeout_secs == 0 {
            return Err(SettingsError::Invalid {
                key: "api.timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        let fraction = self.urgency.no_history_fraction;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(SettingsError::Invalid {
                key: "urgency.no_history_fraction",
                reason: format!("must be within [0, 1], got {fraction}"),
            });
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.api.timeout_secs),
            connect_timeout: Duration::from_secs(self.api.connect_timeout_secs),
        }
    }

    pub fn urgency_policy(&self) -> UrgencyPolicy {
        UrgencyPolicy::with_no_history_fraction(self.urgency.no_history_fraction)
    }

    pub fn to_yaml(&self) -> Result<String, SettingsError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write these settings as a YAML file, creating parent directories.
    pub fn write_template(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }
}
