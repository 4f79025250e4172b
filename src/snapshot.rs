use crate::models::StockRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub name: String,
    pub stocks: Vec<StockRecord>,
}

/// Market id to market data, serialized as a JSON object in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketMap(Vec<(String, MarketSnapshot)>);

impl MarketMap {
    /// Replaces an existing entry in place so the original position is kept.
    pub fn insert(&mut self, id: impl Into<String>, market: MarketSnapshot) {
        let id = id.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, slot)) => *slot = market,
            None => self.0.push((id, market)),
        }
    }

    pub fn get(&self, id: &str) -> Option<&MarketSnapshot> {
        self.0
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, market)| market)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MarketSnapshot)> {
        self.0.iter().map(|(id, market)| (id.as_str(), market))
    }

    pub fn ids(&self) -> Vec<&str> {
        self.0.iter().map(|(id, _)| id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for MarketMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.0.iter().map(|(id, market)| (id, market)))
    }
}

impl<'de> Deserialize<'de> for MarketMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MarketMapVisitor;

        impl<'de> Visitor<'de> for MarketMapVisitor {
            type Value = MarketMap;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of market id to market data")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut markets = MarketMap::default();
                while let Some((id, market)) = access.next_entry::<String, MarketSnapshot>()? {
                    markets.insert(id, market);
                }
                Ok(markets)
            }
        }

        deserializer.deserialize_map(MarketMapVisitor)
    }
}

/// The document the static site renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub updated: String,
    pub markets: MarketMap,
}

impl Snapshot {
    pub fn new(updated_at: DateTime<Utc>) -> Self {
        Self {
            updated: format_timestamp(updated_at),
            markets: MarketMap::default(),
        }
    }

    pub fn total_stocks(&self) -> usize {
        self.markets.iter().map(|(_, market)| market.stocks.len()).sum()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize snapshot")
    }

    /// Writes compact JSON to a temp file beside `path`, then renames it into place.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create snapshot directory {}", parent.display())
                })?;
            }
        }

        let temp_path = temp_path_for(path);
        let file = File::create(&temp_path).with_context(|| {
            format!("Unable to create snapshot file at {}", temp_path.display())
        })?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(self.to_json()?.as_bytes())
            .with_context(|| format!("Failed to write snapshot to {}", temp_path.display()))?;
        writer
            .flush()
            .with_context(|| format!("Failed to flush snapshot to {}", temp_path.display()))?;
        drop(writer);

        fs::rename(&temp_path, path).with_context(|| {
            format!(
                "Failed to move snapshot from {} to {}",
                temp_path.display(),
                path.display()
            )
        })?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open snapshot at {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Snapshot decode failed for {}", path.display()))
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot.json".to_string());
    path.with_file_name(format!(".{}.tmp", file_name))
}
