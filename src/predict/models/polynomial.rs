//! Polynomial basis expansion fed into ordinary least squares.

use super::{FitBudget, ModelError, Regressor, lstsq, mean, variance};
use crate::predict::ModelInfo;

/// Highest degree used for the `polynomial` method.
pub const MAX_DEGREE: usize = 3;

/// Fits `y = c0 + c1 x + ... + cd x^d`.
///
/// The degree is capped at `n - 1` for `n` samples. Powers are built on the
/// standardized input so large x values (years, timestamps) stay well
/// conditioned; the reported coefficients are converted back to raw `x`.
#[derive(Debug, Clone)]
pub struct PolynomialRegression {
    max_degree: usize,
    degree: usize,
    center: f64,
    scale: f64,
    /// Coefficients on the standardized input, lowest power first.
    coef: Vec<f64>,
    fitted: bool,
}

impl PolynomialRegression {
    pub fn new(max_degree: usize) -> Self {
        Self {
            max_degree,
            degree: 0,
            center: 0.0,
            scale: 1.0,
            coef: Vec::new(),
            fitted: false,
        }
    }

    /// Degree actually fitted, after capping by sample count.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Number of expanded features, bias column included.
    pub fn n_features(&self) -> usize {
        self.degree + 1
    }

    /// Coefficients in powers of raw `x`, lowest power first.
    pub fn raw_coefficients(&self) -> Vec<f64> {
        to_raw_basis(&self.coef, self.center, self.scale)
    }

    fn standardize(&self, x: f64) -> f64 {
        (x - self.center) / self.scale
    }

    fn expand(&self, x: f64) -> Vec<f64> {
        let z = self.standardize(x);
        let mut row = Vec::with_capacity(self.degree + 1);
        let mut power = 1.0;
        for _ in 0..=self.degree {
            row.push(power);
            power *= z;
        }
        row
    }
}

impl Regressor for PolynomialRegression {
    fn fit(&mut self, x: &[f64], y: &[f64], _budget: &FitBudget) -> Result<(), ModelError> {
        self.degree = self.max_degree.min(x.len().saturating_sub(1));
        self.center = mean(x);
        let std = variance(x).sqrt();
        self.scale = if std > 0.0 { std } else { 1.0 };

        let rows: Vec<Vec<f64>> = x.iter().map(|&xi| self.expand(xi)).collect();
        self.coef = lstsq::solve(&rows, y)?;
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, x: &[f64]) -> Result<Vec<f64>, ModelError> {
        if !self.fitted {
            return Err(ModelError::NotFitted);
        }
        Ok(x
            .iter()
            .map(|&xi| {
                self.expand(xi)
                    .iter()
                    .zip(&self.coef)
                    .map(|(f, c)| f * c)
                    .sum::<f64>()
            })
            .collect())
    }

    fn info(&self) -> ModelInfo {
        ModelInfo::Polynomial {
            degree: self.degree,
            n_features: self.n_features(),
            coefficients: self.raw_coefficients(),
        }
    }
}

/// Rewrite `Σ c_k ((x - m) / s)^k` as `Σ r_j x^j`.
fn to_raw_basis(coef: &[f64], m: f64, s: f64) -> Vec<f64> {
    let mut raw = vec![0.0; coef.len()];
    for (k, &c) in coef.iter().enumerate() {
        let scaled = c / s.powi(k as i32);
        // (x - m)^k = Σ_j C(k, j) x^j (-m)^(k-j)
        let mut binom = 1.0;
        for j in 0..=k {
            raw[j] += scaled * binom * (-m).powi((k - j) as i32);
            binom = binom * (k - j) as f64 / (j + 1) as f64;
        }
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted(x: &[f64], y: &[f64], max_degree: usize) -> PolynomialRegression {
        let mut model = PolynomialRegression::new(max_degree);
        model.fit(x, y, &FitBudget::unlimited()).unwrap();
        model
    }

    #[test]
    fn recovers_quadratic() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [0.0, 1.0, 4.0, 9.0, 16.0];
        let model = fitted(&x, &y, MAX_DEGREE);
        assert_eq!(model.degree(), 3);
        assert_eq!(model.n_features(), 4);
        let pred = model.predict(&[5.0]).unwrap();
        assert!((pred[0] - 25.0).abs() < 1e-6);

        let raw = model.raw_coefficients();
        assert!(raw[0].abs() < 1e-6);
        assert!(raw[1].abs() < 1e-6);
        assert!((raw[2] - 1.0).abs() < 1e-6);
        assert!(raw[3].abs() < 1e-6);
    }

    #[test]
    fn degree_capped_by_sample_count() {
        let model = fitted(&[1.0, 2.0, 3.0], &[2.0, 1.0, 2.0], MAX_DEGREE);
        assert_eq!(model.degree(), 2);
        let pred = model.predict(&[1.0, 2.0, 3.0]).unwrap();
        for (p, t) in pred.iter().zip([2.0, 1.0, 2.0]) {
            assert!((p - t).abs() < 1e-8);
        }
    }

    #[test]
    fn large_x_stays_conditioned() {
        let x: Vec<f64> = (2000..2010).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 0.5 * (v - 2000.0).powi(2) + 3.0).collect();
        let model = fitted(&x, &y, MAX_DEGREE);
        let pred = model.predict(&[2010.0]).unwrap();
        assert!((pred[0] - 53.0).abs() < 1e-6);
    }

    #[test]
    fn raw_basis_expansion() {
        // 2 + 3 * ((x - 1) / 2) = 0.5 + 1.5 x
        let raw = to_raw_basis(&[2.0, 3.0], 1.0, 2.0);
        assert!((raw[0] - 0.5).abs() < 1e-12);
        assert!((raw[1] - 1.5).abs() < 1e-12);
    }
}
