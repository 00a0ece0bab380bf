use chrono::TimeDelta;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::ConfigError;

pub const DEFAULT_OWM_ENDPOINT: &str =
    "https://api.openweathermap.org/data/2.5/weather?appid={api-key}&units=metric";
pub const DEFAULT_GITHUB_ENDPOINT: &str = "https://api.github.com/graphql";
pub const DEFAULT_GITHUB_CLIENT_ID: &str = "github/weather";
pub const DEFAULT_EXPIRATION_MINUTES: u32 = 30;
pub const DEFAULT_RECENCY_WINDOW_SECS: u64 = 60;

/// OpenWeather section of the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwmConfig {
    pub api_key: String,
    /// URL template; `{api-key}` is replaced with `api_key`.
    pub endpoint: String,
    pub query: String,
}

/// GitHub section of the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub token: String,
    pub endpoint: String,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    pub limited_availability: bool,
    /// Maximum age of the acknowledged `updatedAt`; 0 turns the check off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recency_window_secs: Option<u64>,
}

/// Configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// expiration_time = 30
///
/// [owm]
/// api_key = "..."
/// query = "Berlin,DE"
///
/// [github]
/// token = "..."
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Status lifetime in minutes.
    pub expiration_time: u32,
    /// Per-request timeout applied to both API calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    pub owm: OwmConfig,
    pub github: GithubConfig,
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub owm_api_key: Option<String>,
    pub github_token: Option<String>,
    pub query: Option<String>,
    pub expiration_time: Option<u32>,
}

/// Validated, immutable settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub expiration: TimeDelta,
    pub timeout: Option<Duration>,
    pub weather: WeatherSettings,
    pub status: StatusSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSettings {
    pub endpoint: String,
    pub api_key: String,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusSettings {
    pub endpoint: String,
    pub token: String,
    pub client_id: String,
    pub organization_id: Option<String>,
    pub limited_availability: bool,
    /// `None` disables the staleness check.
    pub recency_window: Option<TimeDelta>,
}

impl Config {
    /// Load config from `path`, or from the platform default location.
    ///
    /// A missing file at the default location is not an error; an explicit
    /// path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::config_file_path()?;
                if !path.exists() {
                    // First run: no config file, return empty.
                    return Ok(Self::default());
                }
                Self::load_from(&path)
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let toml = toml::to_string_pretty(self)?;

        fs::write(path, toml).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("dev", "weather-status", "weather-status")
            .ok_or(ConfigError::NoConfigDir)?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(key) = overrides.owm_api_key {
            self.owm.api_key = key;
        }
        if let Some(token) = overrides.github_token {
            self.github.token = token;
        }
        if let Some(query) = overrides.query {
            self.owm.query = query;
        }
        if let Some(minutes) = overrides.expiration_time {
            self.expiration_time = minutes;
        }
    }

    /// Fill defaults and validate required credentials.
    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        if self.owm.api_key.trim().is_empty() {
            return Err(ConfigError::MissingWeatherApiKey);
        }
        if self.github.token.trim().is_empty() {
            return Err(ConfigError::MissingStatusToken);
        }

        let minutes = match self.expiration_time {
            0 => DEFAULT_EXPIRATION_MINUTES,
            n => n,
        };
        let recency_secs = self
            .github
            .recency_window_secs
            .unwrap_or(DEFAULT_RECENCY_WINDOW_SECS);

        let recency_window = match recency_secs {
            0 => None,
            secs => Some(
                i64::try_from(secs)
                    .ok()
                    .and_then(TimeDelta::try_seconds)
                    .ok_or(ConfigError::InvalidRecencyWindow(secs))?,
            ),
        };

        Ok(Settings {
            expiration: TimeDelta::minutes(i64::from(minutes)),
            timeout: self.timeout_secs.filter(|s| *s > 0).map(Duration::from_secs),
            weather: WeatherSettings {
                endpoint: or_default(self.owm.endpoint, DEFAULT_OWM_ENDPOINT),
                api_key: self.owm.api_key,
                query: self.owm.query,
            },
            status: StatusSettings {
                endpoint: or_default(self.github.endpoint, DEFAULT_GITHUB_ENDPOINT),
                token: self.github.token,
                client_id: or_default(self.github.client_id, DEFAULT_GITHUB_CLIENT_ID),
                organization_id: self.github.organization_id.filter(|id| !id.is_empty()),
                limited_availability: self.github.limited_availability,
                recency_window,
            },
        })
    }
}

fn or_default(value: String, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value
    }
}
