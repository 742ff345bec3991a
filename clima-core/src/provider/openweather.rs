use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::{
    config::{Config, Endpoints},
    error::{MSG_INVALID_KEY, MSG_RATE_LIMITED, MSG_UPSTREAM, WeatherError},
    model::{Coordinates, GeoLocation, LocationQuery},
    payload::{ExtendedPayload, LegacyCurrent, LegacyForecast, RawGeoMatch, UpstreamMessage},
};

use super::WeatherSource;

const EXTENDED_EXCLUDE: &str = "minutely,alerts";

#[derive(Debug, Clone)]
pub struct OpenWeatherSource {
    api_key: String,
    units: String,
    lang: String,
    endpoints: Endpoints,
    http: Client,
}

impl OpenWeatherSource {
    pub fn new(api_key: String) -> Self {
        Self::with_endpoints(api_key, Endpoints::default())
    }

    pub fn with_endpoints(api_key: String, endpoints: Endpoints) -> Self {
        Self {
            api_key,
            units: crate::config::DEFAULT_UNITS.to_string(),
            lang: crate::config::DEFAULT_LANG.to_string(),
            endpoints,
            http: Client::new(),
        }
    }

    pub fn from_config(api_key: String, config: &Config) -> Self {
        Self {
            api_key,
            units: config.units.clone(),
            lang: config.lang.clone(),
            endpoints: config.endpoints.clone(),
            http: Client::new(),
        }
    }

    /// GET `url` and return the status and body text.
    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<(StatusCode, String), WeatherError> {
        let res = self.http.get(url).query(query).send().await?;

        let status = res.status();
        let body = res.text().await?;

        tracing::debug!(%status, bytes = body.len(), "OpenWeather responded");
        Ok((status, body))
    }

    fn localized(&self, mut query: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        query.extend([
            ("appid", self.api_key.clone()),
            ("units", self.units.clone()),
            ("lang", self.lang.clone()),
        ]);
        query
    }

    fn legacy_url(&self, resource: &str) -> String {
        format!("{}/{resource}", self.endpoints.base_url.trim_end_matches('/'))
    }
}

fn location_params(query: &LocationQuery) -> Vec<(&'static str, String)> {
    match query {
        LocationQuery::City(name) => vec![("q", name.clone())],
        LocationQuery::Coords(c) => vec![("lat", c.lat.to_string()), ("lon", c.lon.to_string())],
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, WeatherError> {
    Ok(serde_json::from_str(body)?)
}

/// Map a non-2xx status to the error taxonomy. `not_found` is the message
/// used for 404, which differs between by-name and by-coordinate lookups.
fn status_error(status: StatusCode, body: &str, not_found: String) -> WeatherError {
    match status {
        StatusCode::UNAUTHORIZED => WeatherError::Auth(MSG_INVALID_KEY.to_string()),
        StatusCode::NOT_FOUND => WeatherError::NotFound(not_found),
        StatusCode::TOO_MANY_REQUESTS => WeatherError::RateLimited(MSG_RATE_LIMITED.to_string()),
        _ => {
            let message = serde_json::from_str::<UpstreamMessage>(body)
                .ok()
                .and_then(|m| m.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| MSG_UPSTREAM.to_string());
            WeatherError::Upstream { status: status.as_u16(), message }
        }
    }
}

fn not_found_message(query: &LocationQuery) -> String {
    match query {
        LocationQuery::City(name) => {
            format!("Ciudad \"{name}\" no encontrada. Intenta con otro nombre.")
        }
        LocationQuery::Coords(_) => "Datos no encontrados para esta ubicación".to_string(),
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherSource {
    #[instrument(skip(self), level = "info")]
    async fn geocode(&self, city: &str) -> Result<GeoLocation, WeatherError> {
        let query = vec![
            ("q", city.to_string()),
            ("limit", "1".to_string()),
            ("appid", self.api_key.clone()),
        ];
        let (status, body) = self.get(&self.endpoints.geocoding_url, &query).await?;

        if !status.is_success() {
            return Err(status_error(status, &body, format!("Ciudad \"{city}\" no encontrada")));
        }

        let matches: Vec<RawGeoMatch> = decode(&body)?;
        let best = matches
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::NotFound(format!("Ciudad \"{city}\" no encontrada")))?;

        tracing::info!(name = %best.name, country = %best.country, "Geocoded city");

        Ok(GeoLocation {
            coordinates: Coordinates::new(best.lat, best.lon),
            name: best.name,
            country: best.country,
            state: best.state,
        })
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch_extended(
        &self,
        coords: Coordinates,
    ) -> Result<Option<ExtendedPayload>, WeatherError> {
        let query = self.localized(vec![
            ("lat", coords.lat.to_string()),
            ("lon", coords.lon.to_string()),
            ("exclude", EXTENDED_EXCLUDE.to_string()),
        ]);
        let (status, body) = self.get(&self.endpoints.one_call_url, &query).await?;

        if status == StatusCode::UNAUTHORIZED {
            tracing::info!("Extended endpoint rejected the credential, legacy mode required");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error(
                status,
                &body,
                not_found_message(&LocationQuery::Coords(coords)),
            ));
        }

        decode(&body).map(Some)
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch_legacy_current(
        &self,
        query: &LocationQuery,
    ) -> Result<LegacyCurrent, WeatherError> {
        let params = self.localized(location_params(query));
        let (status, body) = self.get(&self.legacy_url("weather"), &params).await?;

        if !status.is_success() {
            return Err(status_error(status, &body, not_found_message(query)));
        }

        decode(&body)
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch_legacy_forecast(
        &self,
        query: &LocationQuery,
    ) -> Result<LegacyForecast, WeatherError> {
        let params = self.localized(location_params(query));
        let (status, body) = self.get(&self.legacy_url("forecast"), &params).await?;

        if !status.is_success() {
            return Err(status_error(status, &body, not_found_message(query)));
        }

        decode(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let nf = || "missing".to_string();

        assert!(matches!(status_error(StatusCode::UNAUTHORIZED, "", nf()), WeatherError::Auth(_)));
        assert_eq!(status_error(StatusCode::NOT_FOUND, "", nf()), WeatherError::NotFound(nf()));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "", nf()),
            WeatherError::RateLimited(_)
        ));
    }

    #[test]
    fn upstream_message_is_carried() {
        let err = status_error(
            StatusCode::BAD_REQUEST,
            r#"{"cod": "400", "message": "wrong latitude"}"#,
            String::new(),
        );
        assert_eq!(err, WeatherError::Upstream { status: 400, message: "wrong latitude".into() });
    }

    #[test]
    fn upstream_without_message_gets_generic_text() {
        let err = status_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>", String::new());
        assert_eq!(err, WeatherError::Upstream { status: 502, message: MSG_UPSTREAM.into() });
    }

    #[test]
    fn by_name_not_found_mentions_city() {
        let msg = not_found_message(&LocationQuery::City("Xyzzyville".into()));
        assert!(msg.contains("\"Xyzzyville\" no encontrada"));
    }

    #[test]
    fn legacy_urls_join_base() {
        let mut endpoints = Endpoints::default();
        endpoints.base_url = "http://localhost:9000/data/2.5/".into();
        let source = OpenWeatherSource::with_endpoints("k".into(), endpoints);
        assert_eq!(source.legacy_url("forecast"), "http://localhost:9000/data/2.5/forecast");
    }

    #[test]
    fn coordinate_params() {
        let params = location_params(&LocationQuery::Coords(Coordinates::new(40.4, -3.7)));
        assert_eq!(params, vec![("lat", "40.4".to_string()), ("lon", "-3.7".to_string())]);
    }
}
