//! Core library for the `clima` CLI.
//!
//! This crate defines:
//! - The canonical weather model shared by every consumer
//! - The OpenWeather source adapter (extended and legacy endpoints)
//! - Normalization, daily aggregation and scene classification
//! - The orchestrator that ties a request together, with extended to legacy fallback
//! - Configuration and the local favorites/history store
//!
//! It is used by `clima-cli`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod orchestrator;
pub mod payload;
pub mod provider;
pub mod store;

pub use classify::{Background, Conditions, SceneCategory, classify};
pub use config::{Config, Endpoints};
pub use error::WeatherError;
pub use model::{
    Coordinates, CurrentObservation, DailyForecast, GeoLocation, LocationQuery, SourceMode,
    TemperatureRange, WeatherReport,
};
pub use orchestrator::Orchestrator;
pub use provider::{WeatherSource, openweather::OpenWeatherSource, source_from_config};
pub use store::{City, LocalStore};
