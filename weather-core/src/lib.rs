//! Core library for the `weather-status` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client and the GitHub status client
//! - Mapping of weather conditions to an emoji and a short message
//! - The pipeline that ties them together for one run
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod classify;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod shutdown;
pub mod status;

#[cfg(test)]
mod test_support;

use std::time::Duration;

pub use classify::{classify, short_label};
pub use config::{Config, Overrides, Settings};
pub use error::{ConfigError, Error, Stage, StatusError, WeatherError};
pub use model::{StatusUpdateRequest, StatusUpdateResult, WeatherObservation};
pub use pipeline::{Pipeline, Report};
pub use provider::{OpenWeatherProvider, WeatherProvider};
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use status::{GithubStatusClient, StatusPublisher};

/// HTTP client shared by both API clients, with an optional per-request timeout.
pub fn http_client(timeout: Option<Duration>) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}
