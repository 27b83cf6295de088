use crate::binance::ExchangeClient;
use crate::commands::{fetch, train};
use crate::config::Settings;
use crate::model;
use crate::report::render_dashboard;
use anyhow::{Context, Result};
use log::info;
use std::fs;

/// What the on-disk artifacts say the pipeline still needs for the default
/// symbol. Each state requires the previous one to have completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No processed feature frame yet.
    NeedsData,
    /// Features exist but no trained model.
    NeedsModel,
    /// Both artifacts present.
    Ready,
}

impl PipelineState {
    pub fn detect(settings: &Settings, symbol: &str) -> Self {
        if !settings.features_file(symbol).exists() {
            PipelineState::NeedsData
        } else if !settings.model_file().exists() {
            PipelineState::NeedsModel
        } else {
            PipelineState::Ready
        }
    }
}

/// Renders the dashboard for the default symbol, bootstrapping any missing
/// stage first: fetch and derive features when there is no data, train when
/// there is no model, then score every row and write the report.
pub fn run(settings: &Settings) -> Result<()> {
    let symbol = settings.default_symbol();
    let state = PipelineState::detect(settings, symbol);
    info!("pipeline state for {symbol}: {state:?}");

    if state == PipelineState::NeedsData {
        let client = ExchangeClient::new(&settings.data.crypto_api)?;
        fetch::archive(settings, &client, symbol)?;
    }

    let frame = train::ensure_features(settings, symbol)?;

    let model = match PipelineState::detect(settings, symbol) {
        PipelineState::Ready => train::load_model(settings)?,
        _ => model::train_or_load(&settings.model_file(), &frame, settings.features.horizon)?,
    };

    let probs: Vec<f64> = frame
        .rows
        .iter()
        .map(|row| model.predict_proba(&row.feature_vector()))
        .collect();

    let html = render_dashboard(symbol, &frame.interval, &frame.rows, &probs);
    let path = settings.report_file();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(&path, html).with_context(|| format!("writing {}", path.display()))?;
    info!(
        "dashboard for {symbol} written to {} ({} rows scored)",
        path.display(),
        frame.rows.len()
    );
    Ok(())
}
