//! Plain-text rendering of reports, favorites and history.

use chrono::{DateTime, Local, Timelike};
use clima_core::{
    Background, City, WeatherReport,
    store::HistoryEntry,
};
use std::fmt::Write;

pub fn report(report: &WeatherReport, favorite: bool, now: DateTime<Local>) -> String {
    let c = &report.current;
    let scene = c.scene_at(now.hour());
    let mut out = String::new();

    let star = if favorite { " ★" } else { "" };
    let _ = writeln!(out, "{}{star}", c.full_name());
    let _ = writeln!(out, "  {}°C (sensación {}°C), {}", c.temperature, c.feels_like, c.description);
    let _ = writeln!(out, "  Humedad      {}%", c.humidity);
    let _ = writeln!(out, "  Viento       {:.1} km/h", c.wind_speed_kmh());
    let _ = writeln!(out, "  Presión      {} hPa", c.pressure);
    let _ = writeln!(out, "  Visibilidad  {:.1} km", c.visibility_km);
    let _ = writeln!(out, "  Nubosidad    {}%", c.clouds);
    if let (Some(rise), Some(set)) = (c.sunrise, c.sunset) {
        let _ = writeln!(
            out,
            "  Sol          {} - {}",
            rise.with_timezone(&Local).format("%H:%M"),
            set.with_timezone(&Local).format("%H:%M"),
        );
    }

    let background = match scene.background() {
        Background::Video(_) => "vídeo",
        Background::Gradient => "degradado",
    };
    let _ = writeln!(out, "  Escena       {} [{}, {background}]", scene.label(), scene.theme_class());
    let _ = writeln!(out, "  Icono        {}", c.icon_url());
    let _ = writeln!(out, "  Fuente       {}", report.mode);

    if report.forecast.is_empty() {
        let _ = writeln!(out, "\nPronóstico no disponible");
        return out;
    }

    let _ = writeln!(out, "\nPronóstico");
    let today = now.date_naive();
    for day in &report.forecast {
        let _ = writeln!(
            out,
            "  {:<10} {:>7}  {:>3}° / {:>3}°  {:>5.0}% precip.  {}",
            day.day_label(today),
            day.formatted_date(),
            day.temperature.min,
            day.temperature.max,
            day.precipitation,
            day.description,
        );
    }

    out
}

pub fn favorites(cities: &[City]) -> String {
    if cities.is_empty() {
        return "No hay favoritos\n".to_string();
    }

    let mut out = String::new();
    for city in cities {
        let _ = writeln!(out, "{:<28} {}", city.full_name(), city.id);
    }
    out
}

pub fn history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "Sin búsquedas recientes\n".to_string();
    }

    let mut out = String::new();
    for entry in entries {
        let when = entry.timestamp.with_timezone(&Local).format("%d/%m %H:%M");
        let name = if entry.country.is_empty() {
            entry.name.clone()
        } else {
            format!("{}, {}", entry.name, entry.country)
        };
        let _ = writeln!(out, "{when}  {name}");
    }
    out
}
