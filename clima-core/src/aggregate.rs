//! Reduce upstream forecast data to at most [`MAX_FORECAST_DAYS`] daily entries.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeZone};

use crate::{
    model::{DailyForecast, TemperatureRange},
    normalize::{percent, round_half_up, text},
    payload::{ExtendedDaily, LegacySample, RawCondition, RawPayload},
};

pub const MAX_FORECAST_DAYS: usize = 5;

/// Daily forecast for either payload shape. Calendar days are cut in `tz`.
pub fn daily_forecasts<Tz: TimeZone>(payload: &RawPayload, tz: &Tz) -> Vec<DailyForecast> {
    match payload {
        RawPayload::Extended(p) => from_daily(&p.daily, tz),
        RawPayload::Legacy { forecast, .. } => from_samples(forecast, tz),
    }
}

/// Map the extended daily array entry by entry.
pub fn from_daily<Tz: TimeZone>(days: &[ExtendedDaily], tz: &Tz) -> Vec<DailyForecast> {
    let mut out: Vec<DailyForecast> = Vec::with_capacity(MAX_FORECAST_DAYS);

    for day in days {
        let Some(date) = local_date(day.dt, tz) else {
            tracing::debug!(dt = ?day.dt, "Skipping daily entry without a valid timestamp");
            continue;
        };
        if out.last().is_some_and(|prev| prev.date >= date) {
            continue;
        }

        let temp = day.temp.clone().unwrap_or_default();
        let condition = day.weather.first();
        let rain = day.rain.filter(|mm| *mm != 0.0);

        out.push(DailyForecast {
            date,
            temperature: TemperatureRange {
                min: round_half_up(temp.min.unwrap_or(0.0)),
                max: round_half_up(temp.max.unwrap_or(0.0)),
                day: round_half_up(temp.day.unwrap_or(0.0)),
                night: round_half_up(temp.night.unwrap_or(0.0)),
            },
            description: description(condition),
            icon: icon(condition),
            humidity: percent(day.humidity.unwrap_or(0.0)),
            wind_speed: day.wind_speed.unwrap_or(0.0),
            precipitation: rain.unwrap_or_else(|| day.pop.unwrap_or(0.0) * 100.0),
            clouds: percent(day.clouds.unwrap_or(0.0)),
        });

        if out.len() == MAX_FORECAST_DAYS {
            break;
        }
    }

    out
}

/// Bucket 3-hour samples by local calendar date and reduce each bucket.
///
/// Representative values (description, icon, humidity, wind, clouds, and the
/// day/night temperatures) come from the sample at index `len / 2` of the
/// bucket, in input order. This is a selection, not an average.
pub fn from_samples<Tz: TimeZone>(samples: &[LegacySample], tz: &Tz) -> Vec<DailyForecast> {
    let mut buckets: BTreeMap<NaiveDate, Vec<&LegacySample>> = BTreeMap::new();

    for sample in samples {
        match local_date(sample.dt, tz) {
            Some(date) => buckets.entry(date).or_default().push(sample),
            None => tracing::debug!(dt = ?sample.dt, "Skipping sample without a valid timestamp"),
        }
    }

    buckets
        .into_iter()
        .take(MAX_FORECAST_DAYS)
        .map(|(date, bucket)| reduce_bucket(date, &bucket))
        .collect()
}

fn reduce_bucket(date: NaiveDate, bucket: &[&LegacySample]) -> DailyForecast {
    let (min, max) = bucket
        .iter()
        .map(|s| sample_temp(s))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| (lo.min(t), hi.max(t)));

    let middle = bucket[bucket.len() / 2];
    let condition = middle.weather.first();

    let mean_pop = bucket.iter().map(|s| s.pop.unwrap_or(0.0)).sum::<f64>() / bucket.len() as f64;
    let rain = bucket.iter().find_map(|s| s.rain.as_ref().and_then(|r| r.volume()));

    let representative = round_half_up(sample_temp(middle));

    DailyForecast {
        date,
        temperature: TemperatureRange {
            min: round_half_up(min),
            max: round_half_up(max),
            day: representative,
            night: representative,
        },
        description: description(condition),
        icon: icon(condition),
        humidity: percent(middle.main.as_ref().and_then(|m| m.humidity).unwrap_or(0.0)),
        wind_speed: middle.wind.as_ref().and_then(|w| w.speed).unwrap_or(0.0),
        precipitation: rain.unwrap_or(mean_pop * 100.0),
        clouds: percent(middle.clouds.as_ref().and_then(|c| c.all).unwrap_or(0.0)),
    }
}

fn sample_temp(sample: &LegacySample) -> f64 {
    sample.main.as_ref().and_then(|m| m.temp).unwrap_or(0.0)
}

fn description(condition: Option<&RawCondition>) -> String {
    text(condition.and_then(|c| c.description.as_deref()))
}

fn icon(condition: Option<&RawCondition>) -> String {
    text(condition.and_then(|c| c.icon.as_deref()))
}

/// `None` when the timestamp is absent or out of range; such entries are dropped.
fn local_date<Tz: TimeZone>(ts: Option<i64>, tz: &Tz) -> Option<NaiveDate> {
    ts.and_then(|ts| DateTime::from_timestamp(ts, 0)).map(|utc| utc.with_timezone(tz).date_naive())
}
