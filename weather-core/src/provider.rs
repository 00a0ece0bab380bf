use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::WeatherError, model::WeatherObservation, shutdown::Shutdown};

pub mod openweather;

pub use openweather::{OpenWeatherProvider, parse_observation};

/// Source of the current weather for a location query.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch one observation. Returns [`WeatherError::Cancelled`] if
    /// `shutdown` fires while the request is in flight.
    async fn get_weather(
        &self,
        query: &str,
        shutdown: &Shutdown,
    ) -> Result<WeatherObservation, WeatherError>;
}
