//! Stand-ins for methods that are offered by name but not implemented as
//! such: `xgboost` runs a larger random forest, `lstm` runs a low-degree
//! polynomial. Both report what they actually are.

use super::forest::RandomForest;
use super::polynomial::PolynomialRegression;
use super::{FitBudget, ModelError, Regressor};
use crate::predict::ModelInfo;

/// `xgboost`: a 200-tree, depth-6 random forest. No gradient boosting.
#[derive(Debug, Clone)]
pub struct BoostedTreesSubstitute {
    forest: RandomForest,
}

impl BoostedTreesSubstitute {
    pub const N_ESTIMATORS: usize = 200;
    pub const MAX_DEPTH: usize = 6;

    pub fn new() -> Self {
        Self {
            forest: RandomForest::new(Self::N_ESTIMATORS, Self::MAX_DEPTH),
        }
    }
}

impl Default for BoostedTreesSubstitute {
    fn default() -> Self {
        Self::new()
    }
}

impl Regressor for BoostedTreesSubstitute {
    fn fit(&mut self, x: &[f64], y: &[f64], budget: &FitBudget) -> Result<(), ModelError> {
        self.forest.fit(x, y, budget)
    }

    fn predict(&self, x: &[f64]) -> Result<Vec<f64>, ModelError> {
        self.forest.predict(x)
    }

    fn info(&self) -> ModelInfo {
        ModelInfo::Xgboost {
            implemented_as: "random_forest".into(),
            n_estimators: self.forest.n_estimators(),
            max_depth: self.forest.max_depth(),
            feature_importance: self.forest.feature_importance(),
        }
    }
}

/// `lstm`: polynomial regression of degree at most 2. No recurrence.
#[derive(Debug, Clone)]
pub struct SequenceModelSubstitute {
    poly: PolynomialRegression,
    sequence_length: usize,
}

impl SequenceModelSubstitute {
    pub const MAX_DEGREE: usize = 2;
    /// Window length a recurrent model would look back over; reported only.
    pub const NOMINAL_SEQUENCE_LENGTH: usize = 10;

    pub fn new() -> Self {
        Self {
            poly: PolynomialRegression::new(Self::MAX_DEGREE),
            sequence_length: 0,
        }
    }
}

impl Default for SequenceModelSubstitute {
    fn default() -> Self {
        Self::new()
    }
}

impl Regressor for SequenceModelSubstitute {
    fn fit(&mut self, x: &[f64], y: &[f64], budget: &FitBudget) -> Result<(), ModelError> {
        self.sequence_length = Self::NOMINAL_SEQUENCE_LENGTH.min(x.len());
        self.poly.fit(x, y, budget)
    }

    fn predict(&self, x: &[f64]) -> Result<Vec<f64>, ModelError> {
        self.poly.predict(x)
    }

    fn info(&self) -> ModelInfo {
        ModelInfo::Lstm {
            implemented_as: "polynomial".into(),
            sequence_length: self.sequence_length,
            degree: self.poly.degree(),
        }
    }
}
