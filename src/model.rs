use crate::error::ChronosError;
use crate::features::label_upside;
use crate::models::{LabeledRow, FEATURE_COLUMNS};
use crate::snapshot::{self, FeatureFrame};
use chrono::{DateTime, Utc};
use log::info;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MODEL_VERSION: u32 = 1;
const LEARNING_RATE: f64 = 0.1;
const EPOCHS: usize = 500;

/// Binary logistic classifier over the fixed feature columns, persisted with
/// the standardization statistics it was trained under so inference applies
/// the exact same transform.
///
/// Training is full-batch gradient descent from a zero initialization: the
/// same training frame always yields the same weights, bit for bit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsideModel {
    pub version: u32,
    pub trained_at: DateTime<Utc>,
    pub feature_names: Vec<String>,
    pub feature_means: Vec<f64>,
    pub feature_stds: Vec<f64>,
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl UpsideModel {
    /// Fits the classifier on labeled rows. An empty training set is a hard
    /// error; the caller decides whether that means "fetch more data".
    pub fn fit(rows: &[LabeledRow]) -> Result<Self, ChronosError> {
        if rows.is_empty() {
            return Err(ChronosError::TrainingData(
                "no labeled rows to fit on".to_string(),
            ));
        }

        let n = rows.len();
        let dims = FEATURE_COLUMNS.len();

        let mut means = vec![0.0; dims];
        for row in rows {
            for (d, value) in row.features.iter().enumerate() {
                means[d] += value;
            }
        }
        for mean in &mut means {
            *mean /= n as f64;
        }

        let mut stds = vec![0.0; dims];
        for row in rows {
            for (d, value) in row.features.iter().enumerate() {
                let diff = value - means[d];
                stds[d] += diff * diff;
            }
        }
        for std in &mut stds {
            *std = (*std / n as f64).sqrt();
            // A constant column standardizes to zero rather than dividing by
            // zero.
            if *std == 0.0 {
                *std = 1.0;
            }
        }

        let mut x = Array2::<f64>::zeros((n, dims));
        let mut y = Array1::<f64>::zeros(n);
        for (i, row) in rows.iter().enumerate() {
            for (d, value) in row.features.iter().enumerate() {
                x[[i, d]] = (value - means[d]) / stds[d];
            }
            y[i] = f64::from(row.target);
        }

        let mut weights = Array1::<f64>::zeros(dims);
        let mut intercept = 0.0;
        let scale = 1.0 / n as f64;
        for _ in 0..EPOCHS {
            let predictions = (x.dot(&weights) + intercept).mapv(sigmoid);
            let errors = &predictions - &y;
            let weight_grad = x.t().dot(&errors) * scale;
            let intercept_grad = errors.sum() * scale;
            weights = weights - weight_grad * LEARNING_RATE;
            intercept -= LEARNING_RATE * intercept_grad;
        }

        Ok(Self {
            version: MODEL_VERSION,
            trained_at: Utc::now(),
            feature_names: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
            feature_means: means,
            feature_stds: stds,
            weights: weights.to_vec(),
            intercept,
        })
    }

    /// Probability of the upside class for one feature vector, in
    /// [`FEATURE_COLUMNS`] order.
    pub fn predict_proba(&self, features: &[f64; 3]) -> f64 {
        let mut logit = self.intercept;
        for (d, value) in features.iter().enumerate() {
            let standardized = (value - self.feature_means[d]) / self.feature_stds[d];
            logit += self.weights[d] * standardized;
        }
        sigmoid(logit)
    }

    pub fn save(&self, path: &Path) -> Result<(), ChronosError> {
        snapshot::write_bincode(path, self)
    }

    pub fn load(path: &Path) -> Result<Self, ChronosError> {
        let model: Self = snapshot::read_bincode(path)?;
        if model.version != MODEL_VERSION {
            return Err(ChronosError::Persistence(format!(
                "{} has model version {}, expected {MODEL_VERSION}; delete it and retrain",
                path.display(),
                model.version
            )));
        }
        if model.feature_names != FEATURE_COLUMNS {
            return Err(ChronosError::Persistence(format!(
                "{} was trained on columns {:?}, expected {:?}",
                path.display(),
                model.feature_names,
                FEATURE_COLUMNS
            )));
        }
        Ok(model)
    }
}

/// Loads the persisted model if present, otherwise labels the frame and fits
/// a fresh one, saving it before returning. Running this twice on unchanged
/// inputs is a no-op the second time.
pub fn train_or_load(
    path: &Path,
    frame: &FeatureFrame,
    horizon: usize,
) -> Result<UpsideModel, ChronosError> {
    if path.exists() {
        info!("loading existing model from {}", path.display());
        return UpsideModel::load(path);
    }

    let labeled = label_upside(&frame.rows, horizon);
    if labeled.is_empty() {
        return Err(ChronosError::TrainingData(format!(
            "{} feature rows cannot support a {horizon}-bar lookahead",
            frame.rows.len()
        )));
    }

    info!(
        "training upside classifier on {} rows ({} features, horizon {horizon})",
        labeled.len(),
        FEATURE_COLUMNS.len()
    );
    let model = UpsideModel::fit(&labeled)?;
    model.save(path)?;
    info!("saved model to {}", path.display());
    Ok(model)
}

/// Numerically stable logistic function.
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable_rows() -> Vec<LabeledRow> {
        // Upside whenever zscore is positive; rsi and vol are noise-free
        // constants so only the first weight has to do any work.
        let mut rows = Vec::new();
        for i in 0..50 {
            let z = 0.5 + (i % 10) as f64 * 0.1;
            rows.push(LabeledRow {
                features: [z, 55.0, 1.0],
                target: 1,
            });
            rows.push(LabeledRow {
                features: [-z, 45.0, 1.0],
                target: 0,
            });
        }
        rows
    }

    #[test]
    fn fit_separates_a_linearly_separable_set() {
        let model = UpsideModel::fit(&separable_rows()).expect("fit");
        assert!(model.predict_proba(&[1.0, 55.0, 1.0]) > 0.9);
        assert!(model.predict_proba(&[-1.0, 45.0, 1.0]) < 0.1);
    }

    #[test]
    fn fit_is_deterministic() {
        let rows = separable_rows();
        let a = UpsideModel::fit(&rows).expect("fit");
        let b = UpsideModel::fit(&rows).expect("fit");
        assert_eq!(a.weights, b.weights);
        assert_eq!(a.intercept, b.intercept);
    }

    #[test]
    fn predictions_stay_within_probability_bounds() {
        let model = UpsideModel::fit(&separable_rows()).expect("fit");
        for z in [-100.0, -1.0, 0.0, 1.0, 100.0] {
            let p = model.predict_proba(&[z, 50.0, 1.0]);
            assert!((0.0..=1.0).contains(&p), "p={p}");
        }
    }

    #[test]
    fn constant_columns_do_not_divide_by_zero() {
        let rows: Vec<LabeledRow> = (0..20)
            .map(|i| LabeledRow {
                features: [0.0, 50.0, 0.0],
                target: u8::from(i % 2 == 0),
            })
            .collect();
        let model = UpsideModel::fit(&rows).expect("fit");
        let p = model.predict_proba(&[0.0, 50.0, 0.0]);
        assert!(p.is_finite());
        // An uninformative set settles at the base rate.
        assert!((p - 0.5).abs() < 1e-6);
    }

    #[test]
    fn save_then_load_preserves_predictions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("model.bin");

        let model = UpsideModel::fit(&separable_rows()).expect("fit");
        model.save(&path).expect("save");
        let loaded = UpsideModel::load(&path).expect("load");

        let probe = [0.7, 52.0, 1.0];
        assert_eq!(model.predict_proba(&probe), loaded.predict_proba(&probe));
        assert_eq!(model.weights, loaded.weights);
    }

    #[test]
    fn empty_training_set_is_a_training_data_error() {
        let err = UpsideModel::fit(&[]).unwrap_err();
        assert!(matches!(err, ChronosError::TrainingData(_)));
    }
}
