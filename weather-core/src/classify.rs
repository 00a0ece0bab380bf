//! Weather condition → emoji mapping and the short status message.

use crate::model::WeatherObservation;

pub const ZAP: &str = ":zap:";
pub const FULL_MOON: &str = ":full_moon:";
pub const SUNNY: &str = ":sunny:";
pub const FEW_CLOUDS: &str = "🌤️";
pub const CLOUD: &str = ":cloud:";
pub const PARTLY_SUNNY: &str = ":partly_sunny:";
pub const FOGGY: &str = ":foggy:";
pub const SNOWFLAKE: &str = ":snowflake:";
pub const LIGHT_RAIN: &str = "🌦️";
pub const SLEET: &str = "🌨️";
pub const RAIN: &str = "☔";
pub const THUNDERSTORM: &str = "⛈️";

/// Maps the first reported condition to an emoji.
/// See <https://openweathermap.org/weather-conditions>.
pub fn classify(observation: &WeatherObservation) -> &'static str {
    let Some(condition) = observation.weather.first() else {
        return ZAP;
    };

    match condition.id {
        800 if condition.is_night() => FULL_MOON,
        800 => SUNNY,
        801 => FEW_CLOUDS,
        802 => CLOUD,
        801.. => PARTLY_SUNNY,
        700..=799 => FOGGY,
        600..=699 => SNOWFLAKE,
        500 => LIGHT_RAIN,
        511..=599 => SLEET,
        501..=510 => RAIN,
        300..=499 => LIGHT_RAIN,
        200..=299 => THUNDERSTORM,
        _ => ZAP,
    }
}

/// `"<name>, <temp>°"` with the temperature rounded half away from zero and
/// a `+` only when the rounded value is above zero.
pub fn short_label(observation: &WeatherObservation) -> String {
    let degrees = observation.main.temp.round() as i64;
    if degrees > 0 {
        format!("{}, +{degrees}°", observation.name)
    } else {
        format!("{}, {degrees}°", observation.name)
    }
}
