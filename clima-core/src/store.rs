//! Favorites and search history, kept in one JSON file.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::model::Coordinates;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    pub created_at: DateTime<Utc>,
}

impl City {
    pub fn new(name: &str, country: &str, coordinates: Option<Coordinates>) -> Self {
        let created_at = Utc::now();
        Self {
            id: city_id(name, created_at),
            name: name.to_string(),
            country: country.to_string(),
            coordinates,
            created_at,
        }
    }

    pub fn full_name(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }

    fn same_place(&self, name: &str, country: &str) -> bool {
        same_place(&self.name, &self.country, name, country)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub name: String,
    #[serde(default)]
    pub country: String,
    pub timestamp: DateTime<Utc>,
}

/// In-memory view of the store file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreData {
    pub favorites: Vec<City>,
    /// Most recent first.
    pub history: Vec<HistoryEntry>,
}

impl StoreData {
    /// Add unless a favorite with the same name (any case) and country exists.
    /// Returns whether anything was added.
    pub fn add_favorite(&mut self, city: City) -> bool {
        if self.is_favorite(&city.name, &city.country) {
            return false;
        }
        self.favorites.push(city);
        true
    }

    pub fn remove_favorite(&mut self, id: &str) -> bool {
        let before = self.favorites.len();
        self.favorites.retain(|c| c.id != id);
        self.favorites.len() != before
    }

    pub fn is_favorite(&self, name: &str, country: &str) -> bool {
        self.favorites.iter().any(|c| c.same_place(name, country))
    }

    /// Move (or insert) the place to the front, keeping at most `max` entries.
    pub fn record_search(&mut self, name: &str, country: &str, max: usize) {
        self.history.retain(|e| !same_place(&e.name, &e.country, name, country));
        self.history.insert(
            0,
            HistoryEntry { name: name.to_string(), country: country.to_string(), timestamp: Utc::now() },
        );
        self.history.truncate(max);
    }
}

/// File-backed store. Every mutation is written through immediately.
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    max_history: usize,
    data: StoreData,
}

impl LocalStore {
    /// Open the store at `path`. A missing file is an empty store; an
    /// unreadable one is logged and treated as empty too.
    pub fn open(path: impl Into<PathBuf>, max_history: usize) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read store file: {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("Ignoring corrupt store file {}: {e}", path.display());
                StoreData::default()
            })
        } else {
            StoreData::default()
        };

        Ok(Self { path, max_history, data })
    }

    /// Open the store in the platform data directory.
    pub fn open_default(max_history: usize) -> Result<Self> {
        Self::open(crate::Config::store_file_path()?, max_history)
    }

    pub fn favorites(&self) -> &[City] {
        &self.data.favorites
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.data.history
    }

    pub fn is_favorite(&self, name: &str, country: &str) -> bool {
        self.data.is_favorite(name, country)
    }

    pub fn add_favorite(&mut self, city: City) -> Result<bool> {
        let added = self.data.add_favorite(city);
        if added {
            self.save()?;
        }
        Ok(added)
    }

    pub fn remove_favorite(&mut self, id: &str) -> Result<bool> {
        let removed = self.data.remove_favorite(id);
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    pub fn record_search(&mut self, name: &str, country: &str) -> Result<()> {
        self.data.record_search(name, country, self.max_history);
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create data directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(&self.data).context("Failed to serialize store")?;

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write store file: {}", self.path.display()))
    }
}

fn same_place(a_name: &str, a_country: &str, b_name: &str, b_country: &str) -> bool {
    a_name.to_lowercase() == b_name.to_lowercase() && a_country == b_country
}

fn city_id(name: &str, at: DateTime<Utc>) -> String {
    let slug = name.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-");
    format!("{slug}-{}", at.timestamp_millis())
}
