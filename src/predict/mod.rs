//! Trend extrapolation: fit a regression model to an `(x, y)` series and
//! project it forward along the spacing of the last observed interval.

use std::time::Duration;

use serde::Serialize;

use crate::error::{DaplotError, Result};

pub mod method;
pub mod metrics;
pub mod models;

pub use method::Method;
pub use metrics::Metrics;
use models::{FitBudget, ModelError};

/// Fewest samples any method is fitted on.
pub const MIN_POINTS: usize = 3;

/// Default ceiling on the number of forecast steps.
pub const DEFAULT_MAX_STEPS: usize = 100;

/// Fitted parameters of a model, in a shape that depends on the method.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelInfo {
    Linear {
        slope: f64,
        intercept: f64,
    },
    Polynomial {
        degree: usize,
        n_features: usize,
        /// Lowest power first.
        coefficients: Vec<f64>,
    },
    Svr {
        kernel: String,
        c: f64,
        epsilon: f64,
        gamma: f64,
        support_vectors: usize,
    },
    RandomForest {
        n_estimators: usize,
        max_depth: usize,
        feature_importance: f64,
    },
    NeuralNetwork {
        hidden_layer_sizes: Vec<usize>,
        alpha: f64,
        iterations: usize,
        final_loss: f64,
    },
    Xgboost {
        implemented_as: String,
        n_estimators: usize,
        max_depth: usize,
        feature_importance: f64,
    },
    Lstm {
        implemented_as: String,
        sequence_length: usize,
        degree: usize,
    },
}

/// A forecast plus the fit quality of the model that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub future_x: Vec<f64>,
    pub predictions: Vec<f64>,
    pub method: Method,
    pub steps: usize,
    /// In-sample: computed on the training inputs.
    pub metrics: Metrics,
    pub model_info: ModelInfo,
}

/// `steps` x-values continuing past the last sample, spaced like the last
/// two samples (or by 1.0 with a single sample). Even spacing of the input
/// is assumed, not checked.
pub fn future_x(x: &[f64], steps: usize) -> Vec<f64> {
    let Some(&last) = x.last() else {
        return Vec::new();
    };
    let step_size = if x.len() >= 2 {
        last - x[x.len() - 2]
    } else {
        1.0
    };
    (1..=steps).map(|i| last + step_size * i as f64).collect()
}

/// Fits models and produces forecasts.
#[derive(Debug, Clone)]
pub struct PredictionEngine {
    time_limit: Option<Duration>,
    max_steps: usize,
}

impl Default for PredictionEngine {
    fn default() -> Self {
        Self {
            time_limit: None,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl PredictionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject requests for more than `max_steps` forecast points.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Abort fitting that runs longer than `limit`.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Predict with a method given by its tag.
    pub fn predict(
        &self,
        x: &[f64],
        y: &[f64],
        method: &str,
        steps: usize,
    ) -> Result<PredictionResult> {
        let method: Method = method.parse()?;
        self.predict_with(x, y, method, steps)
    }

    /// Fit `method` to `(x, y)`, score it in-sample and forecast `steps` points.
    ///
    /// `steps` must lie in `1..=max_steps`. Validation happens before any
    /// fitting; every failure inside the model becomes `ModelTrainingFailed`
    /// and no partial result is returned.
    pub fn predict_with(
        &self,
        x: &[f64],
        y: &[f64],
        method: Method,
        steps: usize,
    ) -> Result<PredictionResult> {
        if x.len() != y.len() {
            return Err(DaplotError::InvalidFormat(format!(
                "x has {} values but y has {}",
                x.len(),
                y.len()
            )));
        }
        if x.len() < MIN_POINTS {
            return Err(DaplotError::InsufficientData {
                required: MIN_POINTS,
                actual: x.len(),
            });
        }
        if steps == 0 || steps > self.max_steps {
            return Err(DaplotError::InvalidFormat(format!(
                "steps must be between 1 and {}, got {steps}",
                self.max_steps
            )));
        }

        log::info!(
            "Predicting with {method}: {} samples, {steps} steps",
            x.len()
        );

        self.fit_and_forecast(x, y, method, steps).map_err(|e| {
            log::error!("{method} failed: {e}");
            DaplotError::ModelTrainingFailed(e.to_string())
        })
    }

    fn fit_and_forecast(
        &self,
        x: &[f64],
        y: &[f64],
        method: Method,
        steps: usize,
    ) -> std::result::Result<PredictionResult, ModelError> {
        if x.iter().chain(y).any(|v| !v.is_finite()) {
            return Err(ModelError::NonFiniteInput);
        }

        let budget = match self.time_limit {
            Some(limit) => FitBudget::with_limit(limit),
            None => FitBudget::unlimited(),
        };

        let mut model = method.regressor();
        model.fit(x, y, &budget)?;

        let fitted = model.predict(x)?;
        let future_x = future_x(x, steps);
        let predictions = model.predict(&future_x)?;
        if fitted.iter().chain(&predictions).any(|v| !v.is_finite()) {
            return Err(ModelError::Numerical("model produced non-finite output".into()));
        }

        Ok(PredictionResult {
            future_x,
            predictions,
            method,
            steps,
            metrics: Metrics::in_sample(y, &fitted),
            model_info: model.info(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn future_x_follows_last_interval() {
        assert_eq!(future_x(&[0.0, 1.0, 3.0], 3), vec![5.0, 7.0, 9.0]);
        assert_eq!(future_x(&[4.0], 2), vec![5.0, 6.0]);
        assert!(future_x(&[], 2).is_empty());
    }

    #[test]
    fn linear_on_quadratic_is_imperfect() {
        let engine = PredictionEngine::new();
        let result = engine
            .predict(
                &[0.0, 1.0, 2.0, 3.0, 4.0],
                &[0.0, 1.0, 4.0, 9.0, 16.0],
                "linear",
                2,
            )
            .unwrap();
        assert_eq!(result.future_x, vec![5.0, 6.0]);
        assert_eq!(result.predictions.len(), 2);
        assert!(result.metrics.r2_score > 0.0 && result.metrics.r2_score < 1.0);
        assert_eq!(result.metrics.training_samples, 5);
        assert_eq!(
            result.model_info,
            ModelInfo::Linear {
                slope: 4.0,
                intercept: -2.0
            }
        );
    }

    #[test]
    fn two_points_are_insufficient() {
        let err = PredictionEngine::new()
            .predict(&[0.0, 1.0], &[0.0, 1.0], "linear", 1)
            .unwrap_err();
        assert_eq!(
            err,
            DaplotError::InsufficientData {
                required: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn three_points_work_for_every_method() {
        let engine = PredictionEngine::new();
        for method in Method::ALL {
            let result = engine
                .predict_with(&[1.0, 2.0, 3.0], &[2.0, 4.0, 5.0], method, 3)
                .unwrap_or_else(|e| panic!("{method}: {e}"));
            assert_eq!(result.predictions.len(), 3);
            assert_eq!(result.future_x, vec![4.0, 5.0, 6.0]);
            assert_eq!(result.method, method);
        }
    }

    #[test]
    fn unknown_method_is_unsupported() {
        let err = PredictionEngine::new()
            .predict(&[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0], "unknown", 1)
            .unwrap_err();
        assert_eq!(err, DaplotError::UnsupportedMethod("unknown".into()));
    }

    #[test]
    fn mismatched_lengths_and_zero_steps_are_rejected() {
        let engine = PredictionEngine::new();
        assert!(matches!(
            engine.predict(&[0.0, 1.0, 2.0], &[0.0, 1.0], "linear", 1),
            Err(DaplotError::InvalidFormat(_))
        ));
        assert!(matches!(
            engine.predict(&[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0], "linear", 0),
            Err(DaplotError::InvalidFormat(_))
        ));
    }

    #[test]
    fn steps_above_ceiling_are_rejected() {
        let x = [0.0, 1.0, 2.0];
        let engine = PredictionEngine::new();
        assert!(matches!(
            engine.predict(&x, &x, "linear", usize::MAX),
            Err(DaplotError::InvalidFormat(_))
        ));
        assert!(engine.predict(&x, &x, "linear", DEFAULT_MAX_STEPS).is_ok());

        let narrow = PredictionEngine::new().with_max_steps(2);
        assert!(matches!(
            narrow.predict(&x, &x, "linear", 3),
            Err(DaplotError::InvalidFormat(_))
        ));
    }

    #[test]
    fn non_finite_input_fails_training() {
        let err = PredictionEngine::new()
            .predict(&[0.0, 1.0, f64::NAN], &[0.0, 1.0, 2.0], "linear", 1)
            .unwrap_err();
        assert!(matches!(err, DaplotError::ModelTrainingFailed(_)));
    }

    #[test]
    fn expired_time_limit_fails_training() {
        let engine = PredictionEngine::new().with_time_limit(Duration::ZERO);
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        std::thread::sleep(Duration::from_millis(1));
        let err = engine
            .predict_with(&x, &x, Method::NeuralNetwork, 1)
            .unwrap_err();
        assert!(matches!(err, DaplotError::ModelTrainingFailed(msg) if msg.contains("time limit")));
    }

    #[test]
    fn result_serializes_with_tagged_model_info() {
        let result = PredictionEngine::new()
            .predict(&[0.0, 1.0, 2.0], &[1.0, 3.0, 5.0], "linear", 1)
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["method"], "linear");
        assert_eq!(json["model_info"]["model"], "linear");
        assert_eq!(json["future_x"][0], 3.0);
    }
}
