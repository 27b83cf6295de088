use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Failure taxonomy for the pipeline. Nothing is retried; every variant
/// propagates to the command layer, which reports it and halts the run.
#[derive(Debug, Error)]
pub enum ChronosError {
    #[error("configuration file not found at {0}")]
    ConfigMissing(PathBuf),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("exchange request failed with status {status}: {body}")]
    RemoteFetch { status: StatusCode, body: String },

    #[error("exchange request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed kline payload: {0}")]
    InvalidResponse(String),

    #[error("not enough rows to train: {0}")]
    TrainingData(String),

    #[error("persisted artifact unreadable: {0}")]
    Persistence(String),
}
