//! Regression models behind the prediction methods.
//!
//! Every model fits a single input feature `x` to a target `y` and can then
//! evaluate arbitrary `x` values. Models report their fitted parameters as a
//! [`ModelInfo`].

use std::time::{Duration, Instant};

use thiserror::Error;

use super::ModelInfo;

pub mod forest;
pub mod linear;
pub mod lstsq;
pub mod mlp;
pub mod polynomial;
pub mod substitutes;
pub mod svr;

/// Failures raised inside a model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("model has not been fitted")]
    NotFitted,

    #[error("input contains non-finite values")]
    NonFiniteInput,

    #[error("numerical failure: {0}")]
    Numerical(String),

    #[error("training exceeded the time limit of {0:?}")]
    TimeLimit(Duration),
}

/// Wall-clock ceiling for iterative fitting. Models call [`FitBudget::check`]
/// between iterations.
#[derive(Debug, Clone, Copy, Default)]
pub struct FitBudget {
    limit: Option<(Instant, Duration)>,
}

impl FitBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: Duration) -> Self {
        Self {
            limit: Some((Instant::now() + limit, limit)),
        }
    }

    pub fn check(&self) -> Result<(), ModelError> {
        match self.limit {
            Some((deadline, limit)) if Instant::now() > deadline => {
                Err(ModelError::TimeLimit(limit))
            }
            _ => Ok(()),
        }
    }
}

/// A one-feature regression model.
pub trait Regressor {
    /// Fit to paired samples. `x` and `y` have equal length.
    fn fit(&mut self, x: &[f64], y: &[f64], budget: &FitBudget) -> Result<(), ModelError>;

    /// Evaluate the fitted model at each `x`.
    fn predict(&self, x: &[f64]) -> Result<Vec<f64>, ModelError>;

    /// Human-readable description of the fitted parameters.
    fn info(&self) -> ModelInfo;
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance.
pub(crate) fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}
