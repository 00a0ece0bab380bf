use chrono::{DateTime, Utc};
use std::{fmt, path::PathBuf};

/// Failures while reading, writing or validating the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine platform config directory")]
    NoConfigDir,

    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize configuration to TOML")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config file {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("github.recency_window_secs = {0} is out of range")]
    InvalidRecencyWindow(u64),

    #[error(
        "owm api key is empty.\n\
         Hint: set `owm.api_key`, pass --owm-api-key or run `weather-status configure`."
    )]
    MissingWeatherApiKey,

    #[error(
        "github api token is empty.\n\
         Hint: set `github.token`, pass --github-token or run `weather-status configure`."
    )]
    MissingStatusToken,
}

/// Failures of the weather lookup.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("weather API request failed, query {query:?}")]
    Transport {
        query: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode weather API response, query {query:?}")]
    Decode {
        query: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("weather API bad response for {query:?}: cod {cod}: {body}")]
    BadStatus { query: String, cod: i64, body: String },

    #[error("weather request cancelled")]
    Cancelled,
}

/// Failures of the status mutation.
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("github API request failed")]
    Transport(#[source] reqwest::Error),

    #[error("github API responded with {status}: {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to encode github API request")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode github API response")]
    Decode(#[source] serde_json::Error),

    #[error("github API returned errors: {}", .0.join("; "))]
    Graphql(Vec<String>),

    #[error("github API response carried no status")]
    Empty,

    #[error("status not updated: github acknowledged update at {updated_at}, checked at {checked_at}")]
    Stale {
        updated_at: DateTime<Utc>,
        checked_at: DateTime<Utc>,
    },

    #[error("status request cancelled")]
    Cancelled,
}

/// Pipeline stage, used to report where a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadConfig,
    FetchWeather,
    SubmitStatus,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::LoadConfig => "load config",
            Stage::FetchWeather => "fetch weather",
            Stage::SubmitStatus => "submit status",
        })
    }
}

/// Top-level error of one run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error(transparent)]
    Status(#[from] StatusError),
}

impl Error {
    pub fn stage(&self) -> Stage {
        match self {
            Error::Config(_) => Stage::LoadConfig,
            Error::Weather(_) => Stage::FetchWeather,
            Error::Status(_) => Stage::SubmitStatus,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Error::Weather(WeatherError::Cancelled) | Error::Status(StatusError::Cancelled)
        )
    }
}

/// Keeps diagnostic bodies readable in error messages.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
