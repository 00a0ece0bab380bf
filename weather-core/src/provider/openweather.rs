use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::{
    error::{WeatherError, truncate_body},
    model::WeatherObservation,
    shutdown::Shutdown,
};

use super::WeatherProvider;

/// Placeholder substituted with the API key in the endpoint template.
pub const API_KEY_PLACEHOLDER: &str = "{api-key}";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_url: String,
    http: Client,
    log_protocol: bool,
}

impl OpenWeatherProvider {
    /// `endpoint` is a URL template carrying [`API_KEY_PLACEHOLDER`].
    pub fn new(http: Client, endpoint: &str, api_key: &str) -> Self {
        Self {
            api_url: endpoint.replacen(API_KEY_PLACEHOLDER, api_key, 1),
            http,
            log_protocol: false,
        }
    }

    /// Log raw request and response bodies on the `protocol` target.
    pub fn with_protocol_log(mut self, enabled: bool) -> Self {
        self.log_protocol = enabled;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn fetch(&self, query: &str) -> Result<WeatherObservation, WeatherError> {
        let transport = |source| WeatherError::Transport {
            query: query.to_string(),
            source,
        };

        let req = self
            .http
            .get(&self.api_url)
            .query(&[("q", query)])
            .build()
            .map_err(transport)?;

        if self.log_protocol {
            debug!(target: "protocol", ">> GET {}", redact(req.url().as_str()));
        }

        let res = self.http.execute(req).await.map_err(transport)?;
        let status = res.status();
        let body = res.text().await.map_err(transport)?;

        if self.log_protocol {
            debug!(target: "protocol", "<< {status} {body}");
        }

        parse_observation(query, &body)
    }
}

/// Decode a response body and enforce the `cod == 200` rule.
pub fn parse_observation(query: &str, body: &str) -> Result<WeatherObservation, WeatherError> {
    let obs: WeatherObservation =
        serde_json::from_str(body).map_err(|source| WeatherError::Decode {
            query: query.to_string(),
            source,
        })?;

    if !obs.is_ok() {
        return Err(WeatherError::BadStatus {
            query: query.to_string(),
            cod: obs.cod,
            body: truncate_body(body),
        });
    }

    Ok(obs)
}

fn redact(url: &str) -> String {
    match url.find("appid=") {
        Some(start) => {
            let value = start + "appid=".len();
            let end = url[value..].find('&').map_or(url.len(), |i| value + i);
            format!("{}***{}", &url[..value], &url[end..])
        }
        None => url.to_string(),
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self, shutdown))]
    async fn get_weather(
        &self,
        query: &str,
        shutdown: &Shutdown,
    ) -> Result<WeatherObservation, WeatherError> {
        shutdown.guard(self.fetch(query), WeatherError::Cancelled).await
    }
}
