use crate::{
    Config,
    error::WeatherError,
    model::{Coordinates, GeoLocation, LocationQuery},
    payload::{ExtendedPayload, LegacyCurrent, LegacyForecast},
    provider::openweather::OpenWeatherSource,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Network side of the engine: returns upstream payloads untouched.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    /// Resolve a free-text city name to its single best match.
    async fn geocode(&self, city: &str) -> Result<GeoLocation, WeatherError>;

    /// Current conditions and daily forecast in one call.
    ///
    /// `Ok(None)` means the credential is not entitled to this endpoint and
    /// the caller should fall back to the legacy calls.
    async fn fetch_extended(
        &self,
        coords: Coordinates,
    ) -> Result<Option<ExtendedPayload>, WeatherError>;

    async fn fetch_legacy_current(
        &self,
        query: &LocationQuery,
    ) -> Result<LegacyCurrent, WeatherError>;

    async fn fetch_legacy_forecast(
        &self,
        query: &LocationQuery,
    ) -> Result<LegacyForecast, WeatherError>;
}

/// Construct the OpenWeather source from config.
pub fn source_from_config(config: &Config) -> anyhow::Result<OpenWeatherSource> {
    let api_key = config.resolved_api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured.\n\
                 Hint: run `clima configure` or set OPENWEATHER_API_KEY."
        )
    })?;

    Ok(OpenWeatherSource::from_config(api_key, config))
}
