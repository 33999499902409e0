//! Ordinary least-squares line.

use super::{FitBudget, ModelError, Regressor, mean};
use crate::predict::ModelInfo;

/// Fits `y = intercept + slope * x`.
#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    slope: f64,
    intercept: f64,
    fitted: bool,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &[f64], y: &[f64], _budget: &FitBudget) -> Result<(), ModelError> {
        let mean_x = mean(x);
        let mean_y = mean(y);

        let sxx: f64 = x.iter().map(|&xi| (xi - mean_x).powi(2)).sum();
        let sxy: f64 = x
            .iter()
            .zip(y)
            .map(|(&xi, &yi)| (xi - mean_x) * (yi - mean_y))
            .sum();

        // A constant x carries no slope information.
        self.slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
        self.intercept = mean_y - self.slope * mean_x;

        if !self.slope.is_finite() || !self.intercept.is_finite() {
            return Err(ModelError::Numerical("line coefficients are not finite".into()));
        }
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, x: &[f64]) -> Result<Vec<f64>, ModelError> {
        if !self.fitted {
            return Err(ModelError::NotFitted);
        }
        Ok(x.iter().map(|&xi| self.intercept + self.slope * xi).collect())
    }

    fn info(&self) -> ModelInfo {
        ModelInfo::Linear {
            slope: self.slope,
            intercept: self.intercept,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_exact_line() {
        let mut model = LinearRegression::new();
        model
            .fit(&[1.0, 2.0, 3.0], &[12.0, 14.0, 16.0], &FitBudget::unlimited())
            .unwrap();
        assert!((model.slope() - 2.0).abs() < 1e-12);
        assert!((model.intercept() - 10.0).abs() < 1e-12);
        assert_eq!(model.predict(&[4.0]).unwrap(), vec![18.0]);
    }

    #[test]
    fn constant_x_predicts_mean() {
        let mut model = LinearRegression::new();
        model
            .fit(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0], &FitBudget::unlimited())
            .unwrap();
        assert_eq!(model.slope(), 0.0);
        assert_eq!(model.predict(&[9.0]).unwrap(), vec![2.0]);
    }

    #[test]
    fn predict_before_fit_fails() {
        assert_eq!(
            LinearRegression::new().predict(&[1.0]),
            Err(ModelError::NotFitted)
        );
    }
}
