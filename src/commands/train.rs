use crate::config::Settings;
use crate::error::ChronosError;
use crate::features::generate_features;
use crate::model::{self, UpsideModel};
use crate::snapshot::{CandleFrame, FeatureFrame};
use anyhow::{Context, Result};
use log::info;

/// Trains (or reloads) the upside classifier for the default symbol. The
/// feature table is derived on demand from the raw archive when no processed
/// frame exists yet.
pub fn run(settings: &Settings) -> Result<()> {
    let symbol = settings.default_symbol();
    let frame = ensure_features(settings, symbol)?;
    let model = model::train_or_load(&settings.model_file(), &frame, settings.features.horizon)
        .with_context(|| format!("training on {symbol} features"))?;
    info!(
        "model ready: weights {:?}, intercept {:.6}",
        model.weights, model.intercept
    );
    Ok(())
}

/// Loads the processed feature frame for `symbol`, deriving and persisting it
/// from the raw candle archive when absent. A missing raw archive means the
/// fetch step has not run yet.
pub fn ensure_features(settings: &Settings, symbol: &str) -> Result<FeatureFrame, ChronosError> {
    let features_path = settings.features_file(symbol);
    if features_path.exists() {
        let frame = FeatureFrame::load(&features_path)?;
        if frame.window == settings.features.window {
            return Ok(frame);
        }
        info!(
            "feature frame at {} was built with window {}, rebuilding with {}",
            features_path.display(),
            frame.window,
            settings.features.window
        );
    }

    let raw_path = settings.raw_file(symbol);
    if !raw_path.exists() {
        return Err(ChronosError::TrainingData(format!(
            "no candle archive at {}; run the fetch step first",
            raw_path.display()
        )));
    }

    let candles = CandleFrame::load(&raw_path)?;
    let rows = generate_features(&candles.rows, settings.features.window);
    info!(
        "derived {} feature rows from {} candles (window {})",
        rows.len(),
        candles.rows.len(),
        settings.features.window
    );

    let frame = FeatureFrame::new(symbol, &settings.data.interval, settings.features.window, rows);
    frame.save(&features_path)?;
    Ok(frame)
}

/// Loads the persisted model, failing with guidance when it is missing.
pub fn load_model(settings: &Settings) -> Result<UpsideModel, ChronosError> {
    let path = settings.model_file();
    if !path.exists() {
        return Err(ChronosError::Persistence(format!(
            "no model at {}; run the train step first",
            path.display()
        )));
    }
    UpsideModel::load(&path)
}
