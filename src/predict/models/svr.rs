//! Epsilon support-vector regression with a radial-basis kernel.

use super::{FitBudget, ModelError, Regressor, variance};
use crate::predict::ModelInfo;

/// Regularization constant.
pub const C: f64 = 1.0;
/// Width of the insensitive tube.
pub const EPSILON: f64 = 0.1;
const TOLERANCE: f64 = 1e-3;
const MAX_SWEEPS: usize = 1000;
const SUPPORT_THRESHOLD: f64 = 1e-8;

/// RBF-kernel SVR trained by coordinate descent on the dual.
///
/// The bias is folded into the kernel (`K(a, b) + 1`), which removes the
/// equality constraint of the dual and leaves a box-constrained problem in
/// `β = α - α*` with `β_i ∈ [-C, C]`:
///
/// `min ½ βᵀKβ - yᵀβ + ε Σ|β_i|`
///
/// Kernel width follows the "scale" rule: `γ = 1 / var(x)`.
#[derive(Debug, Clone, Default)]
pub struct SupportVectorRegression {
    gamma: f64,
    support: Vec<f64>,
    beta: Vec<f64>,
    fitted: bool,
}

impl SupportVectorRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn support_vector_count(&self) -> usize {
        self.beta
            .iter()
            .filter(|b| b.abs() > SUPPORT_THRESHOLD)
            .count()
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    fn kernel(&self, a: f64, b: f64) -> f64 {
        (-self.gamma * (a - b).powi(2)).exp() + 1.0
    }
}

impl Regressor for SupportVectorRegression {
    fn fit(&mut self, x: &[f64], y: &[f64], budget: &FitBudget) -> Result<(), ModelError> {
        let n = x.len();
        let var = variance(x);
        self.gamma = if var > 0.0 { 1.0 / var } else { 1.0 };

        let k: Vec<Vec<f64>> = x
            .iter()
            .map(|&a| x.iter().map(|&b| self.kernel(a, b)).collect())
            .collect();

        let mut beta = vec![0.0; n];
        // grad_i = (Kβ)_i - y_i
        let mut grad: Vec<f64> = y.iter().map(|&yi| -yi).collect();

        let mut sweeps = 0;
        while sweeps < MAX_SWEEPS {
            budget.check()?;
            sweeps += 1;

            let mut max_step: f64 = 0.0;
            for i in 0..n {
                let kii = k[i][i];
                let z = kii * beta[i] - grad[i];
                let shrunk = z.signum() * (z.abs() - EPSILON).max(0.0);
                let updated = (shrunk / kii).clamp(-C, C);
                let step = updated - beta[i];
                if step == 0.0 {
                    continue;
                }
                beta[i] = updated;
                for (g, kj) in grad.iter_mut().zip(&k[i]) {
                    *g += step * kj;
                }
                max_step = max_step.max(step.abs());
            }

            if max_step < TOLERANCE {
                break;
            }
        }

        if beta.iter().any(|b| !b.is_finite()) {
            return Err(ModelError::Numerical("dual coefficients are not finite".into()));
        }

        log::debug!("SVR converged after {sweeps} sweeps");
        self.support = x.to_vec();
        self.beta = beta;
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, x: &[f64]) -> Result<Vec<f64>, ModelError> {
        if !self.fitted {
            return Err(ModelError::NotFitted);
        }
        Ok(x.iter()
            .map(|&xi| {
                self.support
                    .iter()
                    .zip(&self.beta)
                    .map(|(&s, &b)| b * self.kernel(s, xi))
                    .sum::<f64>()
            })
            .collect())
    }

    fn info(&self) -> ModelInfo {
        ModelInfo::Svr {
            kernel: "rbf".into(),
            c: C,
            epsilon: EPSILON,
            gamma: self.gamma,
            support_vectors: self.support_vector_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_smooth_curve() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.25).collect();
        let y: Vec<f64> = x.iter().map(|v| v.sin()).collect();
        let mut model = SupportVectorRegression::new();
        model.fit(&x, &y, &FitBudget::unlimited()).unwrap();

        let pred = model.predict(&x).unwrap();
        let worst = pred
            .iter()
            .zip(&y)
            .map(|(p, t)| (p - t).abs())
            .fold(0.0, f64::max);
        // inside the tube plus a little slack
        assert!(worst < 0.35, "worst residual {worst}");
        assert!(model.support_vector_count() > 0);
    }

    #[test]
    fn flat_data_inside_tube_needs_no_support() {
        let mut model = SupportVectorRegression::new();
        model
            .fit(&[0.0, 1.0, 2.0], &[0.05, -0.05, 0.0], &FitBudget::unlimited())
            .unwrap();
        assert_eq!(model.support_vector_count(), 0);
        assert_eq!(model.predict(&[5.0]).unwrap(), vec![0.0]);
    }

    #[test]
    fn constant_x_uses_unit_gamma() {
        let mut model = SupportVectorRegression::new();
        model
            .fit(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0], &FitBudget::unlimited())
            .unwrap();
        assert_eq!(model.gamma(), 1.0);
        assert!(model.predict(&[1.0]).unwrap()[0].is_finite());
    }
}
