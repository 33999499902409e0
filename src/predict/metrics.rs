use serde::Serialize;

/// Fit quality of a model re-evaluated on its own training inputs.
///
/// These are in-sample figures: they say how well the model reproduces the
/// data it was fitted to, not how accurate the forecast will be.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub mse: f64,
    pub rmse: f64,
    pub r2_score: f64,
    pub training_samples: usize,
}

impl Metrics {
    pub fn in_sample(actual: &[f64], predicted: &[f64]) -> Self {
        let mse = mean_squared_error(actual, predicted);
        Self {
            mse,
            rmse: mse.sqrt(),
            r2_score: r2_score(actual, predicted),
            training_samples: actual.len(),
        }
    }
}

pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64
}

/// Coefficient of determination. A constant target scores 1.0 when
/// reproduced exactly and 0.0 otherwise.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
