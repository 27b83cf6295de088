use crate::error::ChronosError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Per-request kline cap enforced by the exchange.
pub const EXCHANGE_LIMIT_MAX: u32 = 1000;

/// Process-wide settings, loaded once at startup and passed by reference to
/// each command. There is no ambient global lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub data: DataSettings,
    pub paths: PathSettings,
    pub symbols: SymbolSettings,
    #[serde(default)]
    pub features: FeatureSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataSettings {
    /// Kline endpoint URL, e.g. https://api.binance.com/api/v3/klines
    pub crypto_api: String,
    pub interval: String,
    pub limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathSettings {
    /// Directory for raw candle archives.
    pub raw_crypto: PathBuf,
    #[serde(default = "default_processed_dir")]
    pub processed: PathBuf,
    #[serde(default = "default_models_dir")]
    pub models: PathBuf,
    #[serde(default = "default_reports_dir")]
    pub reports: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SymbolSettings {
    pub crypto: Vec<String>,
}

/// Indicator tunables. The defaults match the values the pipeline was
/// designed around; they must stay consistent between training and inference.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeatureSettings {
    pub window: usize,
    pub horizon: usize,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            window: 14,
            horizon: 5,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_processed_dir() -> PathBuf {
    PathBuf::from("data/processed")
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl Settings {
    /// Reads and validates the YAML settings document. A missing file is a
    /// fatal startup error by design.
    pub fn load(path: &Path) -> Result<Self, ChronosError> {
        if !path.exists() {
            return Err(ChronosError::ConfigMissing(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)
            .map_err(|err| ChronosError::Config(format!("{}: {err}", path.display())))?;
        let settings: Settings =
            serde_yaml::from_str(&raw).map_err(|err| ChronosError::Config(err.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ChronosError> {
        if self.symbols.crypto.is_empty() {
            return Err(ChronosError::Config(
                "symbols.crypto must list at least one ticker".to_string(),
            ));
        }
        if self.symbols.crypto.iter().any(|s| s.trim().is_empty()) {
            return Err(ChronosError::Config(
                "symbols.crypto must not contain empty tickers".to_string(),
            ));
        }
        if self.data.limit == 0 || self.data.limit > EXCHANGE_LIMIT_MAX {
            return Err(ChronosError::Config(format!(
                "data.limit must be within 1..={EXCHANGE_LIMIT_MAX} (value: {})",
                self.data.limit
            )));
        }
        if self.data.interval.trim().is_empty() {
            return Err(ChronosError::Config(
                "data.interval must not be empty".to_string(),
            ));
        }
        if self.features.window < 2 {
            return Err(ChronosError::Config(format!(
                "features.window must be at least 2 (value: {})",
                self.features.window
            )));
        }
        if self.features.horizon == 0 {
            return Err(ChronosError::Config(
                "features.horizon must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// First configured symbol; the bootstrap path works on this one.
    pub fn default_symbol(&self) -> &str {
        &self.symbols.crypto[0]
    }

    pub fn raw_file(&self, symbol: &str) -> PathBuf {
        self.paths
            .raw_crypto
            .join(format!("{}_{}.bin", symbol, self.data.interval))
    }

    pub fn features_file(&self, symbol: &str) -> PathBuf {
        self.paths.processed.join(format!("{symbol}_features.bin"))
    }

    pub fn model_file(&self) -> PathBuf {
        self.paths.models.join("logistic_model.bin")
    }

    pub fn report_file(&self) -> PathBuf {
        self.paths.reports.join("dashboard.html")
    }
}
