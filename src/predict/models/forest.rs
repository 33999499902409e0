//! Bagged ensemble of regression trees.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{FitBudget, ModelError, Regressor, mean};
use crate::predict::ModelInfo;

/// Seed shared by every seeded model, so repeated runs give identical forecasts.
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// One variance-reduction regression tree over a single feature.
#[derive(Debug, Clone, Default)]
struct Tree {
    nodes: Vec<Node>,
    /// Total weighted impurity decrease over all splits.
    impurity_decrease: f64,
}

impl Tree {
    /// Grow a tree on `samples`, which must be sorted by x.
    fn grow(x: &[f64], y: &[f64], samples: &[usize], max_depth: usize) -> Self {
        let mut tree = Tree::default();
        let total = samples.len() as f64;
        tree.build(x, y, samples, 0, max_depth, total);
        tree
    }

    fn build(
        &mut self,
        x: &[f64],
        y: &[f64],
        samples: &[usize],
        depth: usize,
        max_depth: usize,
        total: f64,
    ) -> usize {
        let idx = self.nodes.len();
        let values: Vec<f64> = samples.iter().map(|&i| y[i]).collect();
        self.nodes.push(Node::Leaf(mean(&values)));

        if depth >= max_depth || samples.len() < 2 {
            return idx;
        }
        let Some((cut, decrease)) = best_split(x, &values, samples) else {
            return idx;
        };

        self.impurity_decrease += decrease / total;
        let threshold = (x[samples[cut - 1]] + x[samples[cut]]) / 2.0;
        let left = self.build(x, y, &samples[..cut], depth + 1, max_depth, total);
        let right = self.build(x, y, &samples[cut..], depth + 1, max_depth, total);
        self.nodes[idx] = Node::Split {
            threshold,
            left,
            right,
        };
        idx
    }

    fn predict(&self, x: f64) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf(v) => return *v,
                Node::Split {
                    threshold,
                    left,
                    right,
                } => idx = if x <= *threshold { *left } else { *right },
            }
        }
    }
}

/// Best cut position in x-sorted `samples`, with its sum-of-squares decrease.
/// Cuts only fall between distinct x values.
fn best_split(x: &[f64], values: &[f64], samples: &[usize]) -> Option<(usize, f64)> {
    let n = values.len();
    let total_sum: f64 = values.iter().sum();
    let total_sq: f64 = values.iter().map(|v| v * v).sum();
    let parent_sse = total_sq - total_sum * total_sum / n as f64;

    let mut best: Option<(usize, f64)> = None;
    let (mut left_sum, mut left_sq) = (0.0, 0.0);
    for cut in 1..n {
        let v = values[cut - 1];
        left_sum += v;
        left_sq += v * v;
        if x[samples[cut - 1]] == x[samples[cut]] {
            continue;
        }
        let (nl, nr) = (cut as f64, (n - cut) as f64);
        let right_sum = total_sum - left_sum;
        let right_sq = total_sq - left_sq;
        let sse = (left_sq - left_sum * left_sum / nl) + (right_sq - right_sum * right_sum / nr);
        let decrease = parent_sse - sse;
        if decrease > 1e-12 && best.map_or(true, |(_, d)| decrease > d) {
            best = Some((cut, decrease));
        }
    }
    best
}

/// Random forest regressor: bootstrap samples, fully random-seeded.
#[derive(Debug, Clone)]
pub struct RandomForest {
    n_estimators: usize,
    max_depth: usize,
    trees: Vec<Tree>,
}

impl RandomForest {
    pub fn new(n_estimators: usize, max_depth: usize) -> Self {
        Self {
            n_estimators,
            max_depth,
            trees: Vec::new(),
        }
    }

    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Normalized impurity-based importance of the (only) input feature.
    /// All decrease belongs to it, so this is 1 once any tree splits.
    pub fn feature_importance(&self) -> f64 {
        if self.trees.iter().any(|t| t.impurity_decrease > 0.0) {
            1.0
        } else {
            0.0
        }
    }
}

impl Regressor for RandomForest {
    fn fit(&mut self, x: &[f64], y: &[f64], budget: &FitBudget) -> Result<(), ModelError> {
        let n = x.len();
        let mut rng = StdRng::seed_from_u64(DEFAULT_SEED);
        self.trees.clear();

        for _ in 0..self.n_estimators {
            budget.check()?;
            let mut samples: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            samples.sort_by(|&a, &b| x[a].total_cmp(&x[b]));
            self.trees.push(Tree::grow(x, y, &samples, self.max_depth));
        }
        Ok(())
    }

    fn predict(&self, x: &[f64]) -> Result<Vec<f64>, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        let n = self.trees.len() as f64;
        Ok(x.iter()
            .map(|&xi| self.trees.iter().map(|t| t.predict(xi)).sum::<f64>() / n)
            .collect())
    }

    fn info(&self) -> ModelInfo {
        ModelInfo::RandomForest {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            feature_importance: self.feature_importance(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_data() -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..40).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|&v| if v < 20.0 { 1.0 } else { 5.0 }).collect();
        (x, y)
    }

    #[test]
    fn single_tree_finds_step() {
        let (x, y) = step_data();
        let samples: Vec<usize> = (0..x.len()).collect();
        let tree = Tree::grow(&x, &y, &samples, 10);
        assert_eq!(tree.predict(5.0), 1.0);
        assert_eq!(tree.predict(30.0), 5.0);
        assert!(matches!(tree.nodes[0], Node::Split { threshold, .. } if threshold == 19.5));
    }

    #[test]
    fn depth_zero_is_a_single_leaf() {
        let (x, y) = step_data();
        let samples: Vec<usize> = (0..x.len()).collect();
        let tree = Tree::grow(&x, &y, &samples, 0);
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.predict(0.0), 3.0);
    }

    #[test]
    fn forest_is_reproducible() {
        let (x, y) = step_data();
        let mut a = RandomForest::new(20, 6);
        let mut b = RandomForest::new(20, 6);
        a.fit(&x, &y, &FitBudget::unlimited()).unwrap();
        b.fit(&x, &y, &FitBudget::unlimited()).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
        assert_eq!(a.feature_importance(), 1.0);
    }

    #[test]
    fn forest_approximates_step() {
        let (x, y) = step_data();
        let mut forest = RandomForest::new(100, 10);
        forest.fit(&x, &y, &FitBudget::unlimited()).unwrap();
        let pred = forest.predict(&[2.0, 38.0]).unwrap();
        assert!((pred[0] - 1.0).abs() < 0.5);
        assert!((pred[1] - 5.0).abs() < 0.5);
    }

    #[test]
    fn constant_target_never_splits() {
        let mut forest = RandomForest::new(5, 10);
        forest
            .fit(&[1.0, 2.0, 3.0], &[7.0, 7.0, 7.0], &FitBudget::unlimited())
            .unwrap();
        assert_eq!(forest.feature_importance(), 0.0);
        assert_eq!(forest.predict(&[10.0]).unwrap(), vec![7.0]);
    }
}
