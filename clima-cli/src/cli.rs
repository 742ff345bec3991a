use anyhow::Context;
use clap::{Parser, Subcommand};
use clima_core::{
    City, Config, Coordinates, LocalStore, Orchestrator, SourceMode, WeatherReport,
    source_from_config,
};
use inquire::{Password, PasswordDisplayMode, Select};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "clima", version, about = "Clima: tiempo actual y pronóstico de 5 días")]
pub struct Cli {
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and preferred mode.
    Configure,

    /// Show weather for a city.
    Show {
        /// City name, e.g. "Madrid" or "Buenos Aires".
        city: String,

        #[command(flatten)]
        opts: ShowOpts,
    },

    /// Show weather for coordinates.
    Coords {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Label to show instead of the generic "current location".
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        opts: ShowOpts,
    },

    /// Manage favorite cities.
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },

    /// List recent searches, most recent first.
    History,
}

#[derive(Debug, clap::Args)]
pub struct ShowOpts {
    /// Starting mode: "extended" or "legacy". Defaults to the configured mode.
    #[arg(long)]
    mode: Option<String>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,

    /// Also save the displayed city, with its coordinates, as a favorite.
    #[arg(long)]
    favorite: bool,
}

#[derive(Debug, Subcommand)]
pub enum FavoritesAction {
    List,
    Add {
        city: String,
        #[arg(long, default_value = "")]
        country: String,

        #[arg(long, allow_hyphen_values = true, requires = "lon")]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lon: Option<f64>,
    },
    Remove {
        /// Id as shown by `clima favorites list`.
        id: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config)?,
            Command::Show { city, opts } => {
                let orch = orchestrator(&config, opts.mode.as_deref())?;
                let report = orch.by_city(&city).await?;

                let mut store = LocalStore::open_default(config.max_history)?;
                after_report(&mut store, &report, &opts)?;
                print_report(&report, &store, opts.json)?;
            }
            Command::Coords { lat, lon, name, opts } => {
                let orch = orchestrator(&config, opts.mode.as_deref())?;
                let report = orch.by_coords(Coordinates::new(lat, lon), name.as_deref()).await?;

                let mut store = LocalStore::open_default(config.max_history)?;
                after_report(&mut store, &report, &opts)?;
                print_report(&report, &store, opts.json)?;
            }
            Command::Favorites { action } => {
                let mut store = LocalStore::open_default(config.max_history)?;
                favorites(&mut store, action)?;
            }
            Command::History => {
                let store = LocalStore::open_default(config.max_history)?;
                print!("{}", output::history(store.history()));
            }
        }

        Ok(())
    }
}

fn orchestrator(
    config: &Config,
    mode: Option<&str>,
) -> anyhow::Result<Orchestrator<clima_core::OpenWeatherSource>> {
    let mode = match mode {
        Some(m) => SourceMode::try_from(m)?,
        None => config.source_mode()?,
    };
    let source = source_from_config(config)?;
    Ok(Orchestrator::with_mode(source, mode))
}

/// History is recorded for every successful report; a failure there is only logged.
fn after_report(store: &mut LocalStore, report: &WeatherReport, opts: &ShowOpts) -> anyhow::Result<()> {
    let current = &report.current;
    if let Err(e) = store.record_search(&current.city, &current.country) {
        tracing::warn!("Could not record search history: {e:#}");
    }

    if opts.favorite {
        let city = City::new(&current.city, &current.country, Some(current.coordinates));
        if store.add_favorite(city)? {
            eprintln!("Añadido a favoritos: {}", current.full_name());
        }
    }
    Ok(())
}

fn print_report(report: &WeatherReport, store: &LocalStore, json: bool) -> anyhow::Result<()> {
    if json {
        let text = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
        println!("{text}");
        return Ok(());
    }

    let favorite = store.is_favorite(&report.current.city, &report.current.country);
    print!("{}", output::report(report, favorite, chrono::Local::now()));
    Ok(())
}

fn favorites(store: &mut LocalStore, action: FavoritesAction) -> anyhow::Result<()> {
    match action {
        FavoritesAction::List => print!("{}", output::favorites(store.favorites())),
        FavoritesAction::Add { city, country, lat, lon } => {
            let coordinates = lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon));
            let city = City::new(city.trim(), country.trim(), coordinates);
            let label = city.full_name();
            if store.add_favorite(city)? {
                println!("Añadido a favoritos: {label}");
            } else {
                println!("{label} ya está en favoritos");
            }
        }
        FavoritesAction::Remove { id } => {
            if store.remove_favorite(&id)? {
                println!("Favorito eliminado");
            } else {
                anyhow::bail!("No favorite with id '{id}'. Run `clima favorites list` to see ids.");
            }
        }
    }
    Ok(())
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    if config.is_configured() {
        println!("An API key is already configured; entering a new one replaces it.");
    }

    let key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if key.trim().is_empty() {
        anyhow::bail!("API key must not be empty");
    }
    config.set_api_key(key.trim().to_string());

    let modes: Vec<&str> = SourceMode::all().iter().map(SourceMode::as_str).collect();
    let mode = Select::new("Preferred mode:", modes).prompt().context("Failed to read mode")?;
    config.set_source_mode(SourceMode::try_from(mode)?);

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_negative_coordinates() {
        let cli = Cli::try_parse_from(["clima", "coords", "--lat", "40.4", "--lon", "-3.7", "--json"])
            .expect("valid args");

        match cli.command {
            Command::Coords { lat, lon, name, opts } => {
                assert_eq!((lat, lon), (40.4, -3.7));
                assert!(name.is_none());
                assert!(opts.json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_favorite_with_coordinates() {
        let cli = Cli::try_parse_from([
            "clima", "favorites", "add", "Quito", "--country", "EC", "--lat", "-0.22", "--lon", "-78.5",
        ])
        .expect("valid args");

        match cli.command {
            Command::Favorites { action: FavoritesAction::Add { city, country, lat, lon } } => {
                assert_eq!((city.as_str(), country.as_str()), ("Quito", "EC"));
                assert_eq!((lat, lon), (Some(-0.22), Some(-78.5)));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn favorite_latitude_requires_longitude() {
        assert!(Cli::try_parse_from(["clima", "favorites", "add", "Quito", "--lat", "-0.22"]).is_err());
    }

    #[test]
    fn coords_report_records_history_and_favorite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = LocalStore::open(dir.path().join("store.json"), 10).expect("open");
        let report = sample_report();
        let opts = ShowOpts { mode: None, json: false, favorite: true };

        after_report(&mut store, &report, &opts).expect("after report");

        assert_eq!(store.history()[0].name, "Ubicación actual");
        assert_eq!(store.favorites().len(), 1);
        assert_eq!(store.favorites()[0].coordinates, Some(Coordinates::new(40.4, -3.7)));
    }

    #[test]
    fn report_without_favorite_flag_only_records_history() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = LocalStore::open(dir.path().join("store.json"), 10).expect("open");
        let opts = ShowOpts { mode: None, json: false, favorite: false };

        after_report(&mut store, &sample_report(), &opts).expect("after report");

        assert_eq!(store.history().len(), 1);
        assert!(store.favorites().is_empty());
    }

    fn sample_report() -> WeatherReport {
        serde_json::from_value(serde_json::json!({
            "current": {
                "city": "Ubicación actual", "country": "", "temperature": 20, "feels_like": 19,
                "condition_id": 800, "condition_main": "Clear", "description": "cielo claro",
                "icon": "01d", "humidity": 40, "wind_speed": 1.0, "pressure": 1015.0,
                "visibility_km": 10.0, "clouds": 0, "sunrise": null, "sunset": null,
                "coordinates": {"lat": 40.4, "lon": -3.7},
                "captured_at": "2026-10-19T12:00:00Z"
            },
            "forecast": [],
            "mode": "extended"
        }))
        .expect("report fixture")
    }

    #[test]
    fn parses_show_with_mode() {
        let cli = Cli::try_parse_from(["clima", "show", "Buenos Aires", "--mode", "legacy"])
            .expect("valid args");

        match cli.command {
            Command::Show { city, opts } => {
                assert_eq!(city, "Buenos Aires");
                assert_eq!(opts.mode.as_deref(), Some("legacy"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
