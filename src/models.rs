use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Feature vector order shared by training and inference. Both stages index
/// into this schema; changing it invalidates any persisted model.
pub const FEATURE_COLUMNS: [&str; 3] = ["zscore", "rsi", "vol"];

/// One OHLCV bar as normalized from the exchange payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A candle extended with the derived indicator columns. Every value is
/// computed from a fully populated trailing window, so no NaN can appear here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRow {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub zscore: f64,
    pub rsi: f64,
    pub vol: f64,
}

impl FeatureRow {
    /// Values in [`FEATURE_COLUMNS`] order.
    pub fn feature_vector(&self) -> [f64; 3] {
        [self.zscore, self.rsi, self.vol]
    }
}

/// A training example. Built only inside the training step from historical
/// data; inference has no lookahead close and must never construct one.
#[derive(Debug, Clone)]
pub struct LabeledRow {
    pub features: [f64; 3],
    pub target: u8,
}
