//! Upstream response shapes, exactly as OpenWeather sends them.
//!
//! Every field is optional: a missing field must never fail deserialization,
//! the normalizer decides the default.

use serde::Deserialize;

/// A raw upstream response in one of the two supported shapes.
#[derive(Debug, Clone)]
pub enum RawPayload {
    /// Single call carrying current conditions and a daily array.
    Extended(ExtendedPayload),
    /// Current conditions plus the 3-hour samples of the forecast call.
    /// `forecast` is empty when the forecast call failed.
    Legacy {
        current: LegacyCurrent,
        forecast: Vec<LegacySample>,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCondition {
    pub id: Option<u32>,
    pub main: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

// Extended shape

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtendedPayload {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub timezone: Option<String>,
    pub current: Option<ExtendedCurrent>,
    pub daily: Vec<ExtendedDaily>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtendedCurrent {
    pub dt: Option<i64>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
    pub clouds: Option<f64>,
    pub visibility: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_deg: Option<f64>,
    pub weather: Vec<RawCondition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DailyTemperatures {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub day: Option<f64>,
    pub night: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtendedDaily {
    pub dt: Option<i64>,
    pub temp: Option<DailyTemperatures>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub clouds: Option<f64>,
    /// Daily rain volume in mm.
    pub rain: Option<f64>,
    /// Probability of precipitation, 0.0 to 1.0.
    pub pop: Option<f64>,
    pub weather: Vec<RawCondition>,
}

// Legacy shape

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMain {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawWind {
    pub speed: Option<f64>,
    pub deg: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawClouds {
    pub all: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSys {
    pub country: Option<String>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCoord {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Accumulated rain volume, keyed by the accumulation window.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRain {
    #[serde(rename = "1h")]
    pub one_hour: Option<f64>,
    #[serde(rename = "3h")]
    pub three_hours: Option<f64>,
}

impl RawRain {
    /// The reported volume, preferring the 3-hour window the forecast uses.
    pub fn volume(&self) -> Option<f64> {
        self.three_hours.or(self.one_hour)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LegacyCurrent {
    pub name: Option<String>,
    pub dt: Option<i64>,
    pub coord: Option<RawCoord>,
    pub sys: Option<RawSys>,
    pub main: Option<RawMain>,
    pub weather: Vec<RawCondition>,
    pub wind: Option<RawWind>,
    pub clouds: Option<RawClouds>,
    /// Meters.
    pub visibility: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LegacySample {
    pub dt: Option<i64>,
    pub main: Option<RawMain>,
    pub weather: Vec<RawCondition>,
    pub wind: Option<RawWind>,
    pub clouds: Option<RawClouds>,
    pub rain: Option<RawRain>,
    pub pop: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LegacyForecast {
    pub list: Vec<LegacySample>,
}

/// One entry of the geocoding response array.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGeoMatch {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// Body returned alongside error statuses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct UpstreamMessage {
    #[serde(default)]
    pub message: Option<String>,
}
