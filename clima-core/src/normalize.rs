//! Raw payload to [`CurrentObservation`].
//!
//! Each canonical field has its own resolver below. A resolver names every
//! upstream source it reads and the default it falls back to, so precedence
//! can be read (and tested) one field at a time.

use chrono::{DateTime, Utc};

use crate::{
    model::{Coordinates, CurrentObservation, DEFAULT_LOCATION_NAME},
    payload::{ExtendedCurrent, LegacyCurrent, RawCondition, RawPayload},
};

/// Name and country the caller already knows, e.g. from geocoding.
/// When set they take precedence over whatever the payload carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationLabel {
    pub name: Option<String>,
    pub country: Option<String>,
}

impl LocationLabel {
    pub fn known(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self { name: Some(name.into()), country: Some(country.into()) }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), country: None }
    }
}

/// Map either payload shape to a canonical observation stamped `captured_at`.
pub fn current_observation(
    payload: &RawPayload,
    label: &LocationLabel,
    captured_at: DateTime<Utc>,
) -> CurrentObservation {
    let condition = condition(payload);

    CurrentObservation {
        city: city(payload, label),
        country: country(payload, label),
        temperature: round_half_up(temperature(payload)),
        feels_like: round_half_up(feels_like(payload)),
        condition_id: condition.and_then(|c| c.id),
        condition_main: text(condition.and_then(|c| c.main.as_deref())),
        description: text(condition.and_then(|c| c.description.as_deref())),
        icon: text(condition.and_then(|c| c.icon.as_deref())),
        humidity: percent(humidity(payload)),
        wind_speed: wind_speed(payload),
        pressure: pressure(payload),
        visibility_km: visibility_km(payload),
        clouds: percent(clouds(payload)),
        sunrise: sunrise(payload).and_then(instant),
        sunset: sunset(payload).and_then(instant),
        coordinates: coordinates(payload),
        captured_at,
    }
}

/// Timezone-region heuristic for the extended shape: `"Europe/Madrid"` gives
/// `"Madrid"`. This is a place fragment, not an ISO country code, and is only
/// used when nothing better is known.
pub fn country_from_timezone(timezone: &str) -> String {
    timezone.split('/').nth(1).unwrap_or_default().to_string()
}

/// Round to the nearest integer, halves towards positive infinity.
pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

/// Clamp an upstream percentage into `0..=100`.
pub(crate) fn percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

pub(crate) fn text(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

pub(crate) fn instant(ts: i64) -> Option<DateTime<Utc>> {
    if ts == 0 {
        return None;
    }
    DateTime::from_timestamp(ts, 0)
}

fn extended_current(payload: &RawPayload) -> Option<&ExtendedCurrent> {
    match payload {
        RawPayload::Extended(p) => p.current.as_ref(),
        RawPayload::Legacy { .. } => None,
    }
}

fn legacy_current(payload: &RawPayload) -> Option<&LegacyCurrent> {
    match payload {
        RawPayload::Extended(_) => None,
        RawPayload::Legacy { current, .. } => Some(current),
    }
}

/// Label name; else legacy `name`; else the generic "current location" label.
fn city(payload: &RawPayload, label: &LocationLabel) -> String {
    label
        .name
        .clone()
        .or_else(|| legacy_current(payload).and_then(|c| c.name.clone()))
        .unwrap_or_else(|| DEFAULT_LOCATION_NAME.to_string())
}

/// Label country; else legacy `sys.country` or extended `timezone` heuristic; else "".
fn country(payload: &RawPayload, label: &LocationLabel) -> String {
    if let Some(country) = &label.country {
        return country.clone();
    }
    match payload {
        RawPayload::Extended(p) => p.timezone.as_deref().map(country_from_timezone).unwrap_or_default(),
        RawPayload::Legacy { current, .. } => {
            text(current.sys.as_ref().and_then(|s| s.country.as_deref()))
        }
    }
}

/// First entry of `weather[]` (extended `current.weather`, legacy `weather`).
fn condition(payload: &RawPayload) -> Option<&RawCondition> {
    match payload {
        RawPayload::Extended(p) => p.current.as_ref().and_then(|c| c.weather.first()),
        RawPayload::Legacy { current, .. } => current.weather.first(),
    }
}

/// Extended `current.temp` / legacy `main.temp`; 0.
fn temperature(payload: &RawPayload) -> f64 {
    match payload {
        RawPayload::Extended(_) => extended_current(payload).and_then(|c| c.temp),
        RawPayload::Legacy { current, .. } => current.main.as_ref().and_then(|m| m.temp),
    }
    .unwrap_or(0.0)
}

/// Extended `current.feels_like` / legacy `main.feels_like`; 0.
fn feels_like(payload: &RawPayload) -> f64 {
    match payload {
        RawPayload::Extended(_) => extended_current(payload).and_then(|c| c.feels_like),
        RawPayload::Legacy { current, .. } => current.main.as_ref().and_then(|m| m.feels_like),
    }
    .unwrap_or(0.0)
}

/// Extended `current.humidity` / legacy `main.humidity`; 0.
fn humidity(payload: &RawPayload) -> f64 {
    match payload {
        RawPayload::Extended(_) => extended_current(payload).and_then(|c| c.humidity),
        RawPayload::Legacy { current, .. } => current.main.as_ref().and_then(|m| m.humidity),
    }
    .unwrap_or(0.0)
}

/// Extended `current.pressure` / legacy `main.pressure`; 0.
fn pressure(payload: &RawPayload) -> f64 {
    match payload {
        RawPayload::Extended(_) => extended_current(payload).and_then(|c| c.pressure),
        RawPayload::Legacy { current, .. } => current.main.as_ref().and_then(|m| m.pressure),
    }
    .unwrap_or(0.0)
}

/// Extended `current.wind_speed` / legacy `wind.speed`; 0.
fn wind_speed(payload: &RawPayload) -> f64 {
    match payload {
        RawPayload::Extended(_) => extended_current(payload).and_then(|c| c.wind_speed),
        RawPayload::Legacy { current, .. } => current.wind.as_ref().and_then(|w| w.speed),
    }
    .unwrap_or(0.0)
}

/// Extended `current.clouds` / legacy `clouds.all`; 0.
fn clouds(payload: &RawPayload) -> f64 {
    match payload {
        RawPayload::Extended(_) => extended_current(payload).and_then(|c| c.clouds),
        RawPayload::Legacy { current, .. } => current.clouds.as_ref().and_then(|c| c.all),
    }
    .unwrap_or(0.0)
}

/// Extended `current.visibility` / legacy `visibility`, meters to km at one
/// decimal; 0. Never negative.
fn visibility_km(payload: &RawPayload) -> f64 {
    let meters = match payload {
        RawPayload::Extended(_) => extended_current(payload).and_then(|c| c.visibility),
        RawPayload::Legacy { current, .. } => current.visibility,
    }
    .unwrap_or(0.0);

    ((meters / 1000.0) * 10.0).round().max(0.0) / 10.0
}

/// Extended `current.sunrise` / legacy `sys.sunrise`.
fn sunrise(payload: &RawPayload) -> Option<i64> {
    match payload {
        RawPayload::Extended(_) => extended_current(payload).and_then(|c| c.sunrise),
        RawPayload::Legacy { current, .. } => current.sys.as_ref().and_then(|s| s.sunrise),
    }
}

/// Extended `current.sunset` / legacy `sys.sunset`.
fn sunset(payload: &RawPayload) -> Option<i64> {
    match payload {
        RawPayload::Extended(_) => extended_current(payload).and_then(|c| c.sunset),
        RawPayload::Legacy { current, .. } => current.sys.as_ref().and_then(|s| s.sunset),
    }
}

/// Extended top-level `lat`/`lon` / legacy `coord`; each 0.
fn coordinates(payload: &RawPayload) -> Coordinates {
    let (lat, lon) = match payload {
        RawPayload::Extended(p) => (p.lat, p.lon),
        RawPayload::Legacy { current, .. } => {
            let coord = current.coord.as_ref();
            (coord.and_then(|c| c.lat), coord.and_then(|c| c.lon))
        }
    };
    Coordinates::new(lat.unwrap_or(0.0), lon.unwrap_or(0.0))
}
