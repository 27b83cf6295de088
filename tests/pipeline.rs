use chronosedge::commands::dashboard::{self, PipelineState};
use chronosedge::commands::train;
use chronosedge::config::{
    DataSettings, FeatureSettings, LoggingSettings, PathSettings, Settings, SymbolSettings,
};
use chronosedge::features::generate_features;
use chronosedge::model;
use chronosedge::models::Candle;
use chronosedge::snapshot::CandleFrame;
use chrono::{Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::Path;

fn build_settings(root: &Path) -> Settings {
    Settings {
        logging: LoggingSettings {
            level: "warn".to_string(),
        },
        data: DataSettings {
            // Never dialed in these tests; every artifact is pre-seeded.
            crypto_api: "http://127.0.0.1:9/klines".to_string(),
            interval: "1m".to_string(),
            limit: 1000,
        },
        paths: PathSettings {
            raw_crypto: root.join("raw"),
            processed: root.join("processed"),
            models: root.join("models"),
            reports: root.join("reports"),
        },
        symbols: SymbolSettings {
            crypto: vec!["BTCUSDT".to_string()],
        },
        features: FeatureSettings {
            window: 14,
            horizon: 5,
        },
    }
}

/// Random-walk minute candles, deterministic under the seed.
fn synthetic_candles(count: usize, seed: u64) -> Vec<Candle> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let mut close = 60_000.0;

    (0..count)
        .map(|idx| {
            let drift: f64 = rng.gen_range(-30.0..32.0);
            let open = close;
            close = (close + drift).max(1.0);
            let high = open.max(close) + rng.gen_range(0.0..10.0);
            let low = open.min(close) - rng.gen_range(0.0..10.0);
            Candle {
                open_time: start + Duration::minutes(idx as i64),
                open,
                high,
                low,
                close,
                volume: rng.gen_range(0.5..25.0),
            }
        })
        .collect()
}

fn seed_raw_archive(settings: &Settings, candles: Vec<Candle>) {
    let frame = CandleFrame::new("BTCUSDT", "1m", candles);
    frame
        .save(&settings.raw_file("BTCUSDT"))
        .expect("seed raw archive");
}

#[test]
fn features_derive_once_and_reload_identically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = build_settings(dir.path());
    seed_raw_archive(&settings, synthetic_candles(1000, 7));

    let first = train::ensure_features(&settings, "BTCUSDT").expect("derive features");
    assert_eq!(first.rows.len(), 1000 - 14 + 1);
    assert!(settings.features_file("BTCUSDT").exists());

    // Second call must read the processed frame back, not recompute.
    let second = train::ensure_features(&settings, "BTCUSDT").expect("reload features");
    assert_eq!(second.generated_at, first.generated_at);
    assert_eq!(second.rows.len(), first.rows.len());
    assert_eq!(second.rows[0].zscore, first.rows[0].zscore);
}

#[test]
fn training_is_idempotent_across_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = build_settings(dir.path());
    seed_raw_archive(&settings, synthetic_candles(1000, 11));

    let frame = train::ensure_features(&settings, "BTCUSDT").expect("derive features");
    let first = model::train_or_load(&settings.model_file(), &frame, 5).expect("train");
    let second = model::train_or_load(&settings.model_file(), &frame, 5).expect("reload");

    assert_eq!(first.trained_at, second.trained_at);
    assert_eq!(first.weights, second.weights);
    assert_eq!(first.intercept, second.intercept);

    let probe = frame.rows[0].feature_vector();
    assert_eq!(first.predict_proba(&probe), second.predict_proba(&probe));
}

#[test]
fn scoring_is_deterministic_for_a_fixed_archive() {
    let dir_a = tempfile::tempdir().expect("tempdir");
    let dir_b = tempfile::tempdir().expect("tempdir");
    let settings_a = build_settings(dir_a.path());
    let settings_b = build_settings(dir_b.path());

    // Same seed, two independent pipelines.
    seed_raw_archive(&settings_a, synthetic_candles(800, 42));
    seed_raw_archive(&settings_b, synthetic_candles(800, 42));

    let frame_a = train::ensure_features(&settings_a, "BTCUSDT").expect("features a");
    let frame_b = train::ensure_features(&settings_b, "BTCUSDT").expect("features b");
    let model_a = model::train_or_load(&settings_a.model_file(), &frame_a, 5).expect("train a");
    let model_b = model::train_or_load(&settings_b.model_file(), &frame_b, 5).expect("train b");

    for (row_a, row_b) in frame_a.rows.iter().zip(&frame_b.rows) {
        let p_a = model_a.predict_proba(&row_a.feature_vector());
        let p_b = model_b.predict_proba(&row_b.feature_vector());
        assert_eq!(p_a, p_b);
        assert!((0.0..=1.0).contains(&p_a));
    }
}

#[test]
fn dashboard_bootstraps_from_a_seeded_archive() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = build_settings(dir.path());
    let candles = synthetic_candles(1000, 99);
    seed_raw_archive(&settings, candles.clone());

    // Features exist but no model: the dashboard trains then renders.
    train::ensure_features(&settings, "BTCUSDT").expect("derive features");
    assert_eq!(
        PipelineState::detect(&settings, "BTCUSDT"),
        PipelineState::NeedsModel
    );

    dashboard::run(&settings).expect("dashboard run");

    assert_eq!(
        PipelineState::detect(&settings, "BTCUSDT"),
        PipelineState::Ready
    );
    let html = fs::read_to_string(settings.report_file()).expect("report exists");
    assert!(html.contains("BTCUSDT"));
    assert!(html.contains("<polyline"));

    let expected_rows = generate_features(&candles, 14).len();
    assert!(html.contains(&format!(">{expected_rows}<")));

    // A second run reuses every artifact and rewrites the same report.
    dashboard::run(&settings).expect("second dashboard run");
}

#[test]
fn fresh_directory_reports_needs_data() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = build_settings(dir.path());
    assert_eq!(
        PipelineState::detect(&settings, "BTCUSDT"),
        PipelineState::NeedsData
    );
}
