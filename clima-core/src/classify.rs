//! Scene classification: observation attributes to a [`SceneCategory`].
//!
//! Rules live in [`RULES`] and are evaluated strictly in table order; the
//! first rule whose predicate holds decides the category. When none holds,
//! [`KEYWORD_FALLBACK`] is consulted the same way, and finally the day/night
//! default applies.

use chrono::{Local, Timelike};
use serde::{Deserialize, Serialize};
use std::{fmt, ops::RangeInclusive};

use crate::model::CurrentObservation;

const DAY_HOURS: std::ops::Range<u32> = 6..20;
const MILD_TEMPERATURE: RangeInclusive<f64> = 15.0..=25.0;
const MILD_HUMIDITY: RangeInclusive<f64> = 40.0..=75.0;
const MILD_CLOUDS: RangeInclusive<f64> = 20.0..=60.0;

const STORM_WORDS: &[&str] = &["tormenta", "thunderstorm", "trueno"];
const RAIN_WORDS: &[&str] = &["lluvia", "rain", "drizzle"];
const RAIN_FALLBACK_WORDS: &[&str] = &["lluvia", "lluvioso", "rain", "drizzle"];
const SNOW_WORDS: &[&str] = &["nieve", "snow"];
/// Stem shared by "nevada", "nevando", "nevisca".
const SNOW_ROOT: &[&str] = &["nev"];
const CLEAR_WORDS: &[&str] = &["despejado", "clear", "soleado", "sunny"];
const NOT_TEMPERATE_WORDS: &[&str] = &["tormenta", "lluvia", "soleado", "despejado"];
const WET_WORDS: &[&str] = &["lluvia", "rain"];
const CLOUD_WORDS: &[&str] = &["nublado", "cloud", "niebla", "neblina"];

const VIDEO_NORMAL: &str = "https://cdn.pixabay.com/video/2023/04/11/158384-816637349_large.mp4";
const VIDEO_RAINY: &str = "https://cdn.pixabay.com/video/2023/08/07/174996-852559033_large.mp4";
const VIDEO_TEMPERATE: &str = "https://cdn.pixabay.com/video/2021/02/10/64767-510850921_large.mp4";
const VIDEO_SUNNY: &str = "https://cdn.pixabay.com/video/2021/03/03/66823-520427407_large.mp4";
const VIDEO_STORM: &str = "https://cdn.pixabay.com/video/2025/06/03/283428_large.mp4";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SceneCategory {
    Storm,
    Rainy,
    Snowy,
    Temperate,
    Sunny,
    ClearNight,
    Cloudy,
    DefaultDay,
    DefaultNight,
}

/// What the presentation layer paints behind a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    Video(&'static str),
    /// No video; the theme gradient alone.
    Gradient,
}

impl SceneCategory {
    pub fn theme_class(&self) -> &'static str {
        match self {
            Self::Storm => "storm",
            Self::Rainy => "rainy",
            Self::Snowy => "snowy",
            Self::Temperate => "temperate",
            Self::Sunny => "sunny",
            Self::ClearNight => "clear-night",
            Self::Cloudy => "cloudy",
            Self::DefaultDay => "default-day",
            Self::DefaultNight => "default-night",
        }
    }

    pub fn background(&self) -> Background {
        match self {
            Self::Storm => Background::Video(VIDEO_STORM),
            Self::Rainy => Background::Video(VIDEO_RAINY),
            Self::Temperate => Background::Video(VIDEO_TEMPERATE),
            Self::Sunny => Background::Video(VIDEO_SUNNY),
            Self::ClearNight => Background::Gradient,
            Self::Snowy | Self::Cloudy | Self::DefaultDay | Self::DefaultNight => {
                Background::Video(VIDEO_NORMAL)
            }
        }
    }

    /// Spanish label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Storm => "Tormenta",
            Self::Rainy => "Lluvioso",
            Self::Snowy => "Nevado",
            Self::Temperate => "Templado",
            Self::Sunny => "Soleado",
            Self::ClearNight => "Noche despejada",
            Self::Cloudy => "Nublado",
            Self::DefaultDay => "Día",
            Self::DefaultNight => "Noche",
        }
    }
}

impl fmt::Display for SceneCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.theme_class())
    }
}

/// Snapshot of the attributes the rules look at.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditions {
    pub condition_id: Option<u32>,
    /// Lower-cased.
    pub main: String,
    /// Lower-cased.
    pub description: String,
    pub hour: u32,
    pub temperature: f64,
    pub clouds: f64,
    pub humidity: f64,
}

impl Conditions {
    pub fn new(
        condition_id: Option<u32>,
        main: &str,
        description: &str,
        hour: u32,
        temperature: f64,
        clouds: f64,
        humidity: f64,
    ) -> Self {
        Self {
            condition_id,
            main: main.to_lowercase(),
            description: description.to_lowercase(),
            hour,
            temperature,
            clouds,
            humidity,
        }
    }

    pub fn is_day(&self) -> bool {
        DAY_HOURS.contains(&self.hour)
    }

    fn id_in(&self, range: RangeInclusive<u32>) -> bool {
        self.condition_id.is_some_and(|id| range.contains(&id))
    }

    fn mentions(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.description.contains(w))
    }

    fn mild(&self) -> bool {
        MILD_TEMPERATURE.contains(&self.temperature)
    }

    fn mild_and_comfortable(&self) -> bool {
        self.mild() && MILD_HUMIDITY.contains(&self.humidity)
    }

    fn day_or_night(&self, day: SceneCategory, night: SceneCategory) -> SceneCategory {
        if self.is_day() { day } else { night }
    }
}

/// One row of the rule table.
pub struct Rule {
    pub name: &'static str,
    pub applies: fn(&Conditions) -> bool,
    pub resolve: fn(&Conditions) -> SceneCategory,
}

impl Rule {
    /// The category this rule assigns, or `None` if it does not apply.
    pub fn evaluate(&self, c: &Conditions) -> Option<SceneCategory> {
        (self.applies)(c).then(|| (self.resolve)(c))
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

pub const RULES: &[Rule] = &[
    Rule {
        name: "storm",
        applies: |c| c.id_in(200..=299) || c.mentions(STORM_WORDS),
        resolve: |_| SceneCategory::Storm,
    },
    Rule {
        name: "rain",
        applies: |c| {
            c.id_in(300..=599)
                || c.mentions(RAIN_WORDS)
                || (c.humidity > 75.0 && c.clouds > 60.0 && c.main == "rain")
        },
        resolve: |_| SceneCategory::Rainy,
    },
    Rule {
        name: "snow",
        applies: |c| {
            c.id_in(600..=699)
                || c.mentions(SNOW_WORDS)
                || (c.temperature < 3.0 && (c.main == "snow" || c.mentions(SNOW_ROOT)))
        },
        resolve: |_| SceneCategory::Snowy,
    },
    Rule {
        name: "temperate",
        applies: |c| {
            c.mild_and_comfortable()
                && MILD_CLOUDS.contains(&c.clouds)
                && !c.mentions(NOT_TEMPERATE_WORDS)
                && c.id_in(801..=803)
        },
        resolve: |_| SceneCategory::Temperate,
    },
    Rule {
        name: "clear",
        applies: |c| {
            c.condition_id == Some(800)
                || c.main == "clear"
                || (c.clouds < 25.0 && c.is_day() && c.temperature > 20.0 && c.mentions(CLEAR_WORDS))
        },
        resolve: |c| c.day_or_night(SceneCategory::Sunny, SceneCategory::ClearNight),
    },
    Rule {
        name: "clouds",
        applies: |c| {
            c.id_in(801..=804) || c.main == "clouds" || (c.clouds > 50.0 && !c.mentions(WET_WORDS))
        },
        resolve: |c| {
            if c.mild_and_comfortable() { SceneCategory::Temperate } else { SceneCategory::Cloudy }
        },
    },
    Rule {
        name: "atmosphere",
        applies: |c| c.id_in(700..=799),
        resolve: |_| SceneCategory::Cloudy,
    },
    Rule {
        name: "hot-day",
        applies: |c| c.temperature > 25.0 && c.is_day() && c.clouds < 40.0,
        resolve: |_| SceneCategory::Sunny,
    },
    Rule {
        name: "mild-day",
        applies: |c| c.mild() && c.is_day(),
        resolve: |_| SceneCategory::Temperate,
    },
];

/// Keyword-only pass used when the main table found nothing, typically because
/// the observation has no condition id.
pub const KEYWORD_FALLBACK: &[Rule] = &[
    Rule {
        name: "storm-words",
        applies: |c| c.mentions(STORM_WORDS),
        resolve: |_| SceneCategory::Storm,
    },
    Rule {
        name: "rain-words",
        applies: |c| c.mentions(RAIN_FALLBACK_WORDS),
        resolve: |_| SceneCategory::Rainy,
    },
    Rule {
        name: "clear-words",
        applies: |c| c.mentions(CLEAR_WORDS),
        resolve: |c| c.day_or_night(SceneCategory::Sunny, SceneCategory::ClearNight),
    },
    Rule {
        name: "cloud-words",
        applies: |c| c.mentions(CLOUD_WORDS),
        resolve: |c| if c.mild() { SceneCategory::Temperate } else { SceneCategory::Cloudy },
    },
];

pub fn classify(conditions: &Conditions) -> SceneCategory {
    RULES
        .iter()
        .chain(KEYWORD_FALLBACK)
        .find_map(|rule| rule.evaluate(conditions))
        .unwrap_or_else(|| default_scene(conditions))
}

fn default_scene(c: &Conditions) -> SceneCategory {
    if c.mild() && c.is_day() {
        SceneCategory::Temperate
    } else {
        c.day_or_night(SceneCategory::DefaultDay, SceneCategory::DefaultNight)
    }
}

impl CurrentObservation {
    pub fn conditions_at(&self, hour: u32) -> Conditions {
        Conditions::new(
            self.condition_id,
            &self.condition_main,
            &self.description,
            hour,
            f64::from(self.temperature),
            f64::from(self.clouds),
            f64::from(self.humidity),
        )
    }

    pub fn scene_at(&self, hour: u32) -> SceneCategory {
        classify(&self.conditions_at(hour))
    }

    /// Scene for the host's current local hour.
    pub fn scene(&self) -> SceneCategory {
        self.scene_at(Local::now().hour())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOON: u32 = 12;
    const MIDNIGHT: u32 = 0;

    fn cond(id: Option<u32>, main: &str, desc: &str, hour: u32, temp: f64, clouds: f64, humidity: f64) -> Conditions {
        Conditions::new(id, main, desc, hour, temp, clouds, humidity)
    }

    fn rule(name: &str) -> &'static Rule {
        RULES.iter().chain(KEYWORD_FALLBACK).find(|r| r.name == name).expect("rule exists")
    }

    #[test]
    fn storm_outranks_rain() {
        let c = cond(Some(201), "Thunderstorm", "tormenta con lluvia", NOON, 18.0, 90.0, 85.0);
        assert_eq!(classify(&c), SceneCategory::Storm);

        let c = cond(Some(201), "Thunderstorm", "lluvia", NOON, 18.0, 90.0, 85.0);
        assert_eq!(classify(&c), SceneCategory::Storm);
    }

    #[test]
    fn storm_by_keyword_without_id() {
        let c = cond(None, "", "Truenos a lo lejos", NOON, 18.0, 10.0, 30.0);
        assert_eq!(classify(&c), SceneCategory::Storm);
    }

    #[test]
    fn rain_rule_variants() {
        let r = rule("rain");
        assert!((r.applies)(&cond(Some(520), "", "", NOON, 10.0, 0.0, 0.0)));
        assert!((r.applies)(&cond(None, "", "llovizna y drizzle", NOON, 10.0, 0.0, 0.0)));
        assert!((r.applies)(&cond(None, "Rain", "", NOON, 10.0, 61.0, 76.0)));
        assert!(!(r.applies)(&cond(None, "Rain", "", NOON, 10.0, 60.0, 76.0)));
    }

    #[test]
    fn snow_rule_variants() {
        let r = rule("snow");
        assert!((r.applies)(&cond(Some(601), "", "", NOON, 5.0, 0.0, 0.0)));
        assert!((r.applies)(&cond(None, "", "Nieve ligera", NOON, 5.0, 0.0, 0.0)));
        assert!((r.applies)(&cond(None, "", "nevadas", NOON, 1.0, 0.0, 0.0)));
        assert!(!(r.applies)(&cond(None, "", "nevadas", NOON, 3.0, 0.0, 0.0)));
        assert!((r.applies)(&cond(None, "Snow", "", NOON, 2.0, 0.0, 0.0)));
    }

    #[test]
    fn temperate_window() {
        let c = cond(Some(802), "Clouds", "nubes dispersas", NOON, 20.0, 40.0, 60.0);
        assert_eq!(classify(&c), SceneCategory::Temperate);

        // clouds window closed: falls to the clouds rule, still temperate by its re-check
        let c = cond(Some(802), "Clouds", "nubes dispersas", NOON, 20.0, 70.0, 60.0);
        assert!(!(rule("temperate").applies)(&c));
        assert_eq!(classify(&c), SceneCategory::Temperate);

        // humidity outside: cloudy
        let c = cond(Some(802), "Clouds", "nubes dispersas", NOON, 20.0, 40.0, 90.0);
        assert_eq!(classify(&c), SceneCategory::Cloudy);
    }

    #[test]
    fn temperate_blocked_by_clear_words() {
        let c = cond(Some(801), "Clouds", "mayormente despejado", NOON, 20.0, 30.0, 50.0);
        assert!(!(rule("temperate").applies)(&c));
    }

    #[test]
    fn clear_is_sunny_by_day_and_clear_night_otherwise() {
        let day = cond(Some(800), "Clear", "cielo claro", NOON, 22.0, 0.0, 35.0);
        let night = cond(Some(800), "Clear", "cielo claro", MIDNIGHT, 22.0, 0.0, 35.0);

        assert_eq!(classify(&day), SceneCategory::Sunny);
        assert_eq!(classify(&night), SceneCategory::ClearNight);
        assert_eq!(SceneCategory::ClearNight.background(), Background::Gradient);
    }

    #[test]
    fn day_window_is_half_open() {
        assert!(cond(None, "", "", 6, 0.0, 0.0, 0.0).is_day());
        assert!(cond(None, "", "", 19, 0.0, 0.0, 0.0).is_day());
        assert!(!cond(None, "", "", 20, 0.0, 0.0, 0.0).is_day());
        assert!(!cond(None, "", "", 5, 0.0, 0.0, 0.0).is_day());
    }

    #[test]
    fn overcast_cold_is_cloudy() {
        let c = cond(Some(804), "Clouds", "nubes", NOON, 8.0, 100.0, 80.0);
        assert_eq!(classify(&c), SceneCategory::Cloudy);
    }

    #[test]
    fn fog_is_cloudy() {
        let c = cond(Some(741), "Fog", "niebla", NOON, 8.0, 10.0, 95.0);
        assert_eq!(classify(&c), SceneCategory::Cloudy);
    }

    #[test]
    fn numeric_fallbacks() {
        let hot = cond(None, "", "", NOON, 30.0, 10.0, 30.0);
        assert_eq!(classify(&hot), SceneCategory::Sunny);

        let mild = cond(None, "", "", NOON, 18.0, 45.0, 30.0);
        assert_eq!(classify(&mild), SceneCategory::Temperate);
    }

    #[test]
    fn keyword_fallback_and_defaults() {
        let misty = cond(None, "", "neblina", MIDNIGHT, 10.0, 10.0, 90.0);
        assert_eq!(classify(&misty), SceneCategory::Cloudy);

        let mild_misty_night = cond(None, "", "neblina", MIDNIGHT, 18.0, 10.0, 90.0);
        assert_eq!(classify(&mild_misty_night), SceneCategory::Temperate);

        let plain_day = cond(None, "", "", NOON, 5.0, 10.0, 50.0);
        assert_eq!(classify(&plain_day), SceneCategory::DefaultDay);

        let plain_night = cond(None, "", "", MIDNIGHT, 18.0, 10.0, 50.0);
        assert_eq!(classify(&plain_night), SceneCategory::DefaultNight);
    }

    #[test]
    fn classification_is_pure() {
        let c = cond(Some(803), "Clouds", "nubes rotas", 21, 14.0, 75.0, 70.0);
        let first = classify(&c);
        for _ in 0..100 {
            assert_eq!(classify(&c), first);
        }
    }

    #[test]
    fn rule_names_are_unique() {
        let mut names: Vec<_> = RULES.iter().chain(KEYWORD_FALLBACK).map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), RULES.len() + KEYWORD_FALLBACK.len());
    }

    #[test]
    fn themes_and_backgrounds() {
        assert_eq!(SceneCategory::ClearNight.theme_class(), "clear-night");
        assert_eq!(SceneCategory::DefaultDay.to_string(), "default-day");
        assert_eq!(SceneCategory::Snowy.background(), Background::Video(VIDEO_NORMAL));
        assert_eq!(SceneCategory::Storm.background(), Background::Video(VIDEO_STORM));
    }
}
