use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Label used for coordinate lookups when the caller knows no place name.
pub const DEFAULT_LOCATION_NAME: &str = "Ubicación actual";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Best geocoding match for a free-text city name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub coordinates: Coordinates,
    pub name: String,
    pub country: String,
    pub state: Option<String>,
}

/// How a legacy request addresses its location.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    City(String),
    Coords(Coordinates),
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationQuery::City(name) => f.write_str(name),
            LocationQuery::Coords(c) => write!(f, "{:.4},{:.4}", c.lat, c.lon),
        }
    }
}

/// Upstream mode used by one orchestration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    #[default]
    Extended,
    Legacy,
}

impl SourceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceMode::Extended => "extended",
            SourceMode::Legacy => "legacy",
        }
    }

    pub const fn all() -> &'static [SourceMode] {
        &[SourceMode::Extended, SourceMode::Legacy]
    }

    /// The only transition a request may take: Extended to Legacy.
    pub fn downgrade(self) -> Self {
        SourceMode::Legacy
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SourceMode {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        match lower.as_str() {
            "extended" => Ok(SourceMode::Extended),
            "legacy" => Ok(SourceMode::Legacy),
            _ => Err(anyhow::anyhow!(
                "Unknown source mode '{value}'. Supported modes: extended, legacy."
            )),
        }
    }
}

/// Current conditions for one location, in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentObservation {
    pub city: String,
    /// May be empty, and in extended mode without geocoding it is a timezone
    /// fragment rather than an ISO code.
    pub country: String,
    pub temperature: i32,
    pub feels_like: i32,
    pub condition_id: Option<u32>,
    pub condition_main: String,
    pub description: String,
    pub icon: String,
    pub humidity: u8,
    /// m/s
    pub wind_speed: f64,
    /// hPa
    pub pressure: f64,
    /// km, one decimal
    pub visibility_km: f64,
    pub clouds: u8,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub coordinates: Coordinates,
    pub captured_at: DateTime<Utc>,
}

impl CurrentObservation {
    pub fn icon_url(&self) -> String {
        icon_url(&self.icon)
    }

    pub fn full_name(&self) -> String {
        if self.country.is_empty() {
            self.city.clone()
        } else {
            format!("{}, {}", self.city, self.country)
        }
    }

    /// Wind speed converted to km/h for display.
    pub fn wind_speed_kmh(&self) -> f64 {
        self.wind_speed * 3.6
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemperatureRange {
    pub min: i32,
    pub max: i32,
    pub day: i32,
    pub night: i32,
}

/// One calendar day of forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temperature: TemperatureRange,
    pub description: String,
    pub icon: String,
    pub humidity: u8,
    pub wind_speed: f64,
    /// Rain volume when upstream reports one, otherwise probability of
    /// precipitation scaled to 0-100.
    pub precipitation: f64,
    pub clouds: u8,
}

impl DailyForecast {
    /// "Hoy", "Mañana" or the weekday name, relative to `today`.
    pub fn day_label(&self, today: NaiveDate) -> &'static str {
        let weekday = self.date.weekday();
        if weekday == today.weekday() {
            "Hoy"
        } else if weekday == today.weekday().succ() {
            "Mañana"
        } else {
            weekday_name(weekday)
        }
    }

    /// Short day-month rendering, e.g. "19 oct".
    pub fn formatted_date(&self) -> String {
        format!("{} {}", self.date.day(), month_abbrev(self.date.month()))
    }
}

/// Everything one orchestration produced, tagged with the mode that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub current: CurrentObservation,
    pub forecast: Vec<DailyForecast>,
    pub mode: SourceMode,
}

pub fn icon_url(icon: &str) -> String {
    format!("{ICON_BASE_URL}/{icon}@2x.png")
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Lunes",
        Weekday::Tue => "Martes",
        Weekday::Wed => "Miércoles",
        Weekday::Thu => "Jueves",
        Weekday::Fri => "Viernes",
        Weekday::Sat => "Sábado",
        Weekday::Sun => "Domingo",
    }
}

fn month_abbrev(month: u32) -> &'static str {
    match month {
        1 => "ene",
        2 => "feb",
        3 => "mar",
        4 => "abr",
        5 => "may",
        6 => "jun",
        7 => "jul",
        8 => "ago",
        9 => "sept",
        10 => "oct",
        11 => "nov",
        _ => "dic",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast_on(date: NaiveDate) -> DailyForecast {
        DailyForecast {
            date,
            temperature: TemperatureRange { min: 10, max: 15, day: 12, night: 12 },
            description: "nubes".into(),
            icon: "04d".into(),
            humidity: 60,
            wind_speed: 3.0,
            precipitation: 0.0,
            clouds: 75,
        }
    }

    #[test]
    fn source_mode_as_str_roundtrip() {
        for mode in SourceMode::all() {
            let parsed = SourceMode::try_from(mode.as_str()).expect("roundtrip should succeed");
            assert_eq!(*mode, parsed);
        }
    }

    #[test]
    fn unknown_source_mode_error() {
        let err = SourceMode::try_from("onecall").unwrap_err();
        assert!(err.to_string().contains("Unknown source mode"));
    }

    #[test]
    fn downgrade_always_lands_on_legacy() {
        assert_eq!(SourceMode::Extended.downgrade(), SourceMode::Legacy);
        assert_eq!(SourceMode::Legacy.downgrade(), SourceMode::Legacy);
    }

    #[test]
    fn icon_url_uses_2x_asset() {
        assert_eq!(icon_url("01d"), "https://openweathermap.org/img/wn/01d@2x.png");
    }

    #[test]
    fn day_label_relative_to_today() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date"); // Monday
        let tomorrow = today.succ_opt().expect("valid date");
        let thursday = NaiveDate::from_ymd_opt(2026, 10, 22).expect("valid date");

        assert_eq!(forecast_on(today).day_label(today), "Hoy");
        assert_eq!(forecast_on(tomorrow).day_label(today), "Mañana");
        assert_eq!(forecast_on(thursday).day_label(today), "Jueves");
    }

    #[test]
    fn formatted_date_is_short_spanish() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date");
        assert_eq!(forecast_on(date).formatted_date(), "19 oct");
    }

    #[test]
    fn location_query_display() {
        assert_eq!(LocationQuery::City("Madrid".into()).to_string(), "Madrid");
        assert_eq!(
            LocationQuery::Coords(Coordinates::new(40.4, -3.7)).to_string(),
            "40.4000,-3.7000"
        );
    }
}
