//! One run: fetch the weather, turn it into a status, publish it.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{
    classify::{classify, short_label},
    config::Settings,
    error::Error,
    model::{StatusUpdateRequest, StatusUpdateResult, WeatherObservation},
    provider::WeatherProvider,
    shutdown::Shutdown,
    status::StatusPublisher,
};

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct Report {
    pub observation: WeatherObservation,
    pub request: StatusUpdateRequest,
    pub result: StatusUpdateResult,
}

pub struct Pipeline<'a> {
    settings: &'a Settings,
    weather: &'a dyn WeatherProvider,
    status: &'a dyn StatusPublisher,
    shutdown: Shutdown,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        settings: &'a Settings,
        weather: &'a dyn WeatherProvider,
        status: &'a dyn StatusPublisher,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            settings,
            weather,
            status,
            shutdown,
        }
    }

    /// Runs every stage once and stops at the first failure.
    pub async fn run(&self) -> Result<Report, Error> {
        let query = &self.settings.weather.query;

        let observation = self.weather.get_weather(query, &self.shutdown).await?;
        info!(
            name = %observation.name,
            temp = observation.main.temp,
            feels_like = observation.main.feels_like,
            conditions = ?observation.weather,
            "got owm response"
        );

        let request = build_status_request(&observation, self.settings, Utc::now());
        debug!(?request, "built status request");

        let result = self.status.update_status(&request, &self.shutdown).await?;
        info!(
            id = ?result.id,
            updated_at = %result.updated_at,
            expires_at = ?result.expires_at,
            "set gh status"
        );

        Ok(Report {
            observation,
            request,
            result,
        })
    }
}

/// Status request for `observation`, expiring `settings.expiration` after `now`.
pub fn build_status_request(
    observation: &WeatherObservation,
    settings: &Settings,
    now: DateTime<Utc>,
) -> StatusUpdateRequest {
    StatusUpdateRequest {
        client_mutation_id: settings.status.client_id.clone(),
        emoji: classify(observation).to_string(),
        message: short_label(observation),
        expires_at: now + settings.expiration,
        limited_availability: settings.status.limited_availability,
        organization_id: settings.status.organization_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classify::SUNNY,
        config::Config,
        error::{StatusError, WeatherError},
        model::{Condition, Measurements},
        shutdown,
    };
    use async_trait::async_trait;
    use chrono::{TimeDelta, TimeZone};
    use std::sync::Mutex;

    #[derive(Debug)]
    struct FakeWeather {
        observation: WeatherObservation,
    }

    #[async_trait]
    impl WeatherProvider for FakeWeather {
        async fn get_weather(
            &self,
            query: &str,
            _shutdown: &Shutdown,
        ) -> Result<WeatherObservation, WeatherError> {
            let body = serde_json::to_string(&self.observation).unwrap();
            crate::provider::parse_observation(query, &body)
        }
    }

    #[derive(Debug, Default)]
    struct RecordingStatus {
        sent: Mutex<Vec<StatusUpdateRequest>>,
        updated_at: Option<DateTime<Utc>>,
    }

    #[async_trait]
    impl StatusPublisher for RecordingStatus {
        async fn update_status(
            &self,
            request: &StatusUpdateRequest,
            _shutdown: &Shutdown,
        ) -> Result<StatusUpdateResult, StatusError> {
            self.sent.lock().unwrap().push(request.clone());
            let result = StatusUpdateResult {
                id: Some("status-1".into()),
                updated_at: self.updated_at.unwrap_or_else(Utc::now),
                expires_at: Some(request.expires_at),
            };
            crate::status::ensure_recent(&result, Utc::now(), Some(TimeDelta::seconds(60)))?;
            Ok(result)
        }
    }

    #[derive(Debug)]
    struct HangingWeather;

    #[async_trait]
    impl WeatherProvider for HangingWeather {
        async fn get_weather(
            &self,
            _query: &str,
            shutdown: &Shutdown,
        ) -> Result<WeatherObservation, WeatherError> {
            shutdown
                .guard(std::future::pending(), WeatherError::Cancelled)
                .await
        }
    }

    fn settings() -> Settings {
        let mut cfg = Config::default();
        cfg.owm.api_key = "K".into();
        cfg.owm.query = "Berlin,DE".into();
        cfg.github.token = "T".into();
        cfg.into_settings().unwrap()
    }

    fn berlin(cod: i64) -> WeatherObservation {
        WeatherObservation {
            cod,
            name: "Berlin".into(),
            weather: vec![Condition {
                id: 800,
                main: "Clear".into(),
                description: "clear sky".into(),
                icon: "01d".into(),
            }],
            main: Measurements {
                temp: 9.07,
                feels_like: 6.24,
            },
        }
    }

    #[test]
    fn status_request_from_observation() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let req = build_status_request(&berlin(200), &settings(), now);

        assert_eq!(req.emoji, SUNNY);
        assert_eq!(req.message, "Berlin, +9°");
        assert_eq!(req.client_mutation_id, "github/weather");
        assert_eq!(req.expires_at, Utc.with_ymd_and_hms(2026, 10, 19, 12, 30, 0).unwrap());
        assert!(!req.limited_availability);
        assert_eq!(req.organization_id, None);
    }

    #[tokio::test]
    async fn publishes_weather_status() {
        let settings = settings();
        let weather = FakeWeather {
            observation: berlin(200),
        };
        let status = RecordingStatus::default();

        let before = Utc::now();
        let report = Pipeline::new(&settings, &weather, &status, Shutdown::never())
            .run()
            .await
            .expect("run must succeed");
        let after = Utc::now();

        let sent = status.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].emoji, SUNNY);
        assert_eq!(sent[0].message, "Berlin, +9°");
        assert!(sent[0].expires_at >= before + TimeDelta::minutes(30));
        assert!(sent[0].expires_at <= after + TimeDelta::minutes(30));
        assert_eq!(report.result.id.as_deref(), Some("status-1"));
        assert_eq!(report.observation.name, "Berlin");
    }

    #[tokio::test]
    async fn bad_weather_status_short_circuits() {
        let settings = settings();
        let weather = FakeWeather {
            observation: berlin(401),
        };
        let status = RecordingStatus::default();

        let err = Pipeline::new(&settings, &weather, &status, Shutdown::never())
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Weather(WeatherError::BadStatus { cod: 401, .. })));
        assert_eq!(err.stage(), crate::error::Stage::FetchWeather);
        assert!(status.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_acknowledgement_fails_the_run() {
        let settings = settings();
        let weather = FakeWeather {
            observation: berlin(200),
        };
        let status = RecordingStatus {
            updated_at: Some(Utc::now() - TimeDelta::seconds(120)),
            ..Default::default()
        };

        let err = Pipeline::new(&settings, &weather, &status, Shutdown::never())
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Status(StatusError::Stale { .. })));
        assert_eq!(err.stage(), crate::error::Stage::SubmitStatus);
    }

    #[tokio::test]
    async fn shutdown_cancels_in_flight_fetch() {
        let settings = settings();
        let status = RecordingStatus::default();
        let (trigger, shutdown) = shutdown::channel();

        let run = Pipeline::new(&settings, &HangingWeather, &status, shutdown);
        let (res, ()) = tokio::join!(run.run(), async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            trigger.trigger();
        });

        let err = res.unwrap_err();
        assert!(err.is_cancelled());
        assert!(status.sent.lock().unwrap().is_empty());
    }
}
