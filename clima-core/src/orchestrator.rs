//! Drives one weather request from a city name or coordinates to a
//! [`WeatherReport`].
//!
//! A request starts in the configured [`SourceMode`]. In Extended mode the
//! single-call endpoint is tried once; if it reports the mode as unsupported
//! the request downgrades to Legacy and issues the current and forecast calls
//! concurrently. The mode lives on the stack of the request, never on the
//! orchestrator.

use chrono::{Local, Utc};
use tracing::instrument;

use crate::{
    aggregate::daily_forecasts,
    error::WeatherError,
    model::{Coordinates, LocationQuery, SourceMode, WeatherReport},
    normalize::{LocationLabel, current_observation},
    payload::RawPayload,
    provider::WeatherSource,
};

#[derive(Debug, Clone)]
pub struct Orchestrator<S> {
    source: S,
    initial_mode: SourceMode,
}

impl<S: WeatherSource> Orchestrator<S> {
    pub fn new(source: S) -> Self {
        Self::with_mode(source, SourceMode::Extended)
    }

    pub fn with_mode(source: S, initial_mode: SourceMode) -> Self {
        Self { source, initial_mode }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Weather for a free-text city name.
    #[instrument(skip(self), level = "info")]
    pub async fn by_city(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::InvalidInput(
                "Introduce el nombre de una ciudad".to_string(),
            ));
        }

        let mut mode = self.initial_mode;

        if mode == SourceMode::Extended {
            let location =
                self.source.geocode(city).await.map_err(|e| e.wrap("Error en geocoding"))?;

            match self.source.fetch_extended(location.coordinates).await? {
                Some(payload) => {
                    let label = LocationLabel::known(location.name, location.country);
                    return Ok(finish(RawPayload::Extended(payload), &label, mode));
                }
                None => mode = mode.downgrade(),
            }
        }

        self.legacy(LocationQuery::City(city.to_string()), LocationLabel::default(), mode).await
    }

    /// Weather for coordinates. `name` labels the result when the caller
    /// already knows the place; the extended payload carries no name.
    #[instrument(skip(self), level = "info")]
    pub async fn by_coords(
        &self,
        coords: Coordinates,
        name: Option<&str>,
    ) -> Result<WeatherReport, WeatherError> {
        let mut mode = self.initial_mode;
        let label = LocationLabel { name: name.map(str::to_string), country: None };

        if mode == SourceMode::Extended {
            match self.source.fetch_extended(coords).await? {
                Some(payload) => return Ok(finish(RawPayload::Extended(payload), &label, mode)),
                None => mode = mode.downgrade(),
            }
        }

        self.legacy(LocationQuery::Coords(coords), label, mode).await
    }

    async fn legacy(
        &self,
        query: LocationQuery,
        label: LocationLabel,
        mode: SourceMode,
    ) -> Result<WeatherReport, WeatherError> {
        tracing::debug!(%query, "Fetching legacy current conditions and forecast");

        let (current, forecast) = tokio::join!(
            self.source.fetch_legacy_current(&query),
            self.source.fetch_legacy_forecast(&query),
        );

        let current = current?;
        let forecast = match forecast {
            Ok(f) => f.list,
            Err(e) => {
                tracing::warn!(kind = e.kind(), "Forecast unavailable, continuing without it: {e}");
                Vec::new()
            }
        };

        Ok(finish(RawPayload::Legacy { current, forecast }, &label, mode))
    }
}

fn finish(payload: RawPayload, label: &LocationLabel, mode: SourceMode) -> WeatherReport {
    let current = current_observation(&payload, label, Utc::now());
    let forecast = daily_forecasts(&payload, &Local);

    tracing::info!(
        city = %current.city,
        %mode,
        days = forecast.len(),
        "Weather request completed"
    );

    WeatherReport { current, forecast, mode }
}
