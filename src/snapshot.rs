use crate::error::ChronosError;
use crate::models::{Candle, FeatureRow};
use chrono::{DateTime, Utc};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Bumped whenever a persisted frame layout changes. Loading an older frame
/// fails cleanly instead of deserializing garbage.
pub const FRAME_VERSION: u32 = 1;

/// Raw candle archive for one symbol/interval pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandleFrame {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub symbol: String,
    pub interval: String,
    pub rows: Vec<Candle>,
}

impl CandleFrame {
    pub fn new(symbol: &str, interval: &str, rows: Vec<Candle>) -> Self {
        Self {
            version: FRAME_VERSION,
            generated_at: Utc::now(),
            symbol: symbol.to_string(),
            interval: interval.to_string(),
            rows,
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ChronosError> {
        write_bincode(path, self)
    }

    pub fn load(path: &Path) -> Result<Self, ChronosError> {
        let frame: Self = read_bincode(path)?;
        check_version(frame.version, path)?;
        Ok(frame)
    }
}

/// Feature table for one symbol, tagged with the window it was built from so
/// a settings change is detectable against a stale artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFrame {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub symbol: String,
    pub interval: String,
    pub window: usize,
    pub rows: Vec<FeatureRow>,
}

impl FeatureFrame {
    pub fn new(symbol: &str, interval: &str, window: usize, rows: Vec<FeatureRow>) -> Self {
        Self {
            version: FRAME_VERSION,
            generated_at: Utc::now(),
            symbol: symbol.to_string(),
            interval: interval.to_string(),
            window,
            rows,
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ChronosError> {
        write_bincode(path, self)
    }

    pub fn load(path: &Path) -> Result<Self, ChronosError> {
        let frame: Self = read_bincode(path)?;
        check_version(frame.version, path)?;
        Ok(frame)
    }
}

fn check_version(found: u32, path: &Path) -> Result<(), ChronosError> {
    if found != FRAME_VERSION {
        return Err(ChronosError::Persistence(format!(
            "{} has frame version {found}, expected {FRAME_VERSION}; delete it and refetch",
            path.display()
        )));
    }
    Ok(())
}

pub(crate) fn write_bincode<T: Serialize>(path: &Path, value: &T) -> Result<(), ChronosError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            ChronosError::Persistence(format!("creating {}: {err}", parent.display()))
        })?;
    }
    let file = fs::File::create(path)
        .map_err(|err| ChronosError::Persistence(format!("creating {}: {err}", path.display())))?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, value)
        .map_err(|err| ChronosError::Persistence(format!("writing {}: {err}", path.display())))?;
    writer
        .flush()
        .map_err(|err| ChronosError::Persistence(format!("flushing {}: {err}", path.display())))?;
    debug!("wrote {}", path.display());
    Ok(())
}

pub(crate) fn read_bincode<T: DeserializeOwned>(path: &Path) -> Result<T, ChronosError> {
    let file = fs::File::open(path)
        .map_err(|err| ChronosError::Persistence(format!("opening {}: {err}", path.display())))?;
    let reader = BufReader::new(file);
    bincode::deserialize_from(reader)
        .map_err(|err| ChronosError::Persistence(format!("reading {}: {err}", path.display())))
}
