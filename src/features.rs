use crate::models::{Candle, FeatureRow, LabeledRow};

/// Derives the indicator columns from a candle table using a trailing window
/// of `window` closes (inclusive of the current bar).
///
/// Rows without a full window are dropped rather than padded, so the output
/// holds exactly `len - window + 1` rows and carries no NaN. Tables with fewer
/// than `window + 1` rows yield an empty output.
pub fn generate_features(candles: &[Candle], window: usize) -> Vec<FeatureRow> {
    if window < 2 || candles.len() < window + 1 {
        return Vec::new();
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let mut rows = Vec::with_capacity(candles.len() - window + 1);

    for i in (window - 1)..candles.len() {
        let slice = &closes[i + 1 - window..=i];
        let (mean, std_dev) = mean_and_std(slice);
        let zscore = if std_dev > 0.0 {
            (closes[i] - mean) / std_dev
        } else {
            0.0
        };

        let candle = &candles[i];
        rows.push(FeatureRow {
            open_time: candle.open_time,
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            volume: candle.volume,
            zscore,
            rsi: window_rsi(slice),
            vol: std_dev,
        });
    }

    rows
}

/// Builds the binary upside target: 1 iff the close `horizon` rows ahead
/// exceeds the current close. The trailing `horizon` rows have no lookahead
/// value and are dropped.
///
/// This is a lookahead label. It exists only for supervised training on
/// historical data; inference has no future close and must never call this.
pub fn label_upside(rows: &[FeatureRow], horizon: usize) -> Vec<LabeledRow> {
    if horizon == 0 || rows.len() <= horizon {
        return Vec::new();
    }

    (0..rows.len() - horizon)
        .map(|i| LabeledRow {
            features: rows[i].feature_vector(),
            target: u8::from(rows[i + horizon].close > rows[i].close),
        })
        .collect()
}

/// Mean and sample standard deviation of a fully populated window.
fn mean_and_std(window: &[f64]) -> (f64, f64) {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window
        .iter()
        .map(|value| {
            let diff = value - mean;
            diff * diff
        })
        .sum::<f64>()
        / (n - 1.0);
    (mean, variance.max(0.0).sqrt())
}

/// RSI over the deltas inside the window, from average gain vs. average loss.
fn window_rsi(window: &[f64]) -> f64 {
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    for pair in window.windows(2) {
        let delta = pair[1] - pair[0];
        if delta >= 0.0 {
            gain_sum += delta;
        } else {
            loss_sum += -delta;
        }
    }

    let deltas = (window.len() - 1) as f64;
    rsi_from_avgs(gain_sum / deltas, loss_sum / deltas)
}

fn rsi_from_avgs(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}
