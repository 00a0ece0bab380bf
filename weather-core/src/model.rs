use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// `cod` value of a successful OpenWeather response.
pub const WEATHER_OK: i64 = 200;

/// Current weather as returned by the OpenWeather "current weather" endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    /// Response status; error bodies send it as a string.
    #[serde(deserialize_with = "de_status_code")]
    pub cod: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub main: Measurements,
}

/// One entry of the `weather` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Condition code; a missing id reads as 0.
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
    /// Icon id such as `01d`; the trailing letter is `d` by day and `n` by night.
    #[serde(default)]
    pub icon: String,
}

impl Condition {
    pub fn is_night(&self) -> bool {
        self.icon.ends_with('n')
    }
}

/// Temperatures in Celsius (the request asks for metric units).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Measurements {
    pub temp: f64,
    pub feels_like: f64,
}

impl WeatherObservation {
    pub fn is_ok(&self) -> bool {
        self.cod == WEATHER_OK
    }
}

fn de_status_code<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Int(i64),
        Str(String),
    }

    match Code::deserialize(deserializer)? {
        Code::Int(n) => Ok(n),
        Code::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Input of the `changeUserStatus` mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_mutation_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub emoji: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub limited_availability: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

/// Status as acknowledged by GitHub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateResult {
    #[serde(default)]
    pub id: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}
