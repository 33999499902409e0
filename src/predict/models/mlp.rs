//! Small feed-forward network regressor trained with Adam.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::forest::DEFAULT_SEED;
use super::{FitBudget, ModelError, Regressor};
use crate::predict::ModelInfo;

const LEARNING_RATE: f64 = 1e-3;
const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const ADAM_EPS: f64 = 1e-8;
const MAX_BATCH: usize = 200;
const TOLERANCE: f64 = 1e-4;
const PATIENCE: usize = 10;

/// Dense layer with row-major weights (`n_out × n_in`) and its Adam moments.
#[derive(Debug, Clone)]
struct Dense {
    n_in: usize,
    n_out: usize,
    w: Vec<f64>,
    b: Vec<f64>,
    m_w: Vec<f64>,
    v_w: Vec<f64>,
    m_b: Vec<f64>,
    v_b: Vec<f64>,
}

impl Dense {
    /// Glorot-uniform initialisation.
    fn new(n_in: usize, n_out: usize, rng: &mut StdRng) -> Self {
        let bound = (6.0 / (n_in + n_out) as f64).sqrt();
        let mut draw = |len: usize| -> Vec<f64> {
            (0..len).map(|_| rng.gen_range(-bound..bound)).collect()
        };
        let w = draw(n_in * n_out);
        let b = draw(n_out);
        Self {
            n_in,
            n_out,
            w,
            b,
            m_w: vec![0.0; n_in * n_out],
            v_w: vec![0.0; n_in * n_out],
            m_b: vec![0.0; n_out],
            v_b: vec![0.0; n_out],
        }
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        (0..self.n_out)
            .map(|o| {
                let row = &self.w[o * self.n_in..(o + 1) * self.n_in];
                self.b[o] + row.iter().zip(input).map(|(w, a)| w * a).sum::<f64>()
            })
            .collect()
    }

    fn squared_norm(&self) -> f64 {
        self.w.iter().map(|w| w * w).sum()
    }
}

/// Gradients for one layer, accumulated over a batch.
#[derive(Debug, Clone)]
struct Grads {
    w: Vec<f64>,
    b: Vec<f64>,
}

/// Multi-layer perceptron: ReLU hidden layers, identity output, squared loss
/// with L2 penalty `alpha`.
///
/// Training stops after `max_iter` epochs, or once the epoch loss has failed
/// to improve by at least `1e-4` for more than ten consecutive epochs.
#[derive(Debug, Clone)]
pub struct NeuralNetwork {
    hidden: Vec<usize>,
    max_iter: usize,
    alpha: f64,
    layers: Vec<Dense>,
    iterations: usize,
    final_loss: f64,
}

impl NeuralNetwork {
    pub fn new(hidden: Vec<usize>, max_iter: usize, alpha: f64) -> Self {
        Self {
            hidden,
            max_iter,
            alpha,
            layers: Vec::new(),
            iterations: 0,
            final_loss: f64::NAN,
        }
    }

    /// Epochs actually run by the last fit.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Activations of every layer, input first.
    fn activations(&self, x: f64) -> Vec<Vec<f64>> {
        let mut acts = vec![vec![x]];
        for (i, layer) in self.layers.iter().enumerate() {
            let mut out = layer.forward(&acts[i]);
            if i + 1 < self.layers.len() {
                for v in &mut out {
                    *v = v.max(0.0);
                }
            }
            acts.push(out);
        }
        acts
    }

    fn output(&self, x: f64) -> f64 {
        self.activations(x)
            .last()
            .and_then(|out| out.first().copied())
            .unwrap_or(f64::NAN)
    }

    /// One Adam step on a batch; returns the batch loss.
    fn train_batch(&mut self, x: &[f64], y: &[f64], batch: &[usize], t: i32) -> f64 {
        let mut grads: Vec<Grads> = self
            .layers
            .iter()
            .map(|l| Grads {
                w: vec![0.0; l.w.len()],
                b: vec![0.0; l.b.len()],
            })
            .collect();

        let mut loss = 0.0;
        for &i in batch {
            let acts = self.activations(x[i]);
            let pred = acts[acts.len() - 1][0];
            let err = pred - y[i];
            loss += err * err;

            let mut delta = vec![err];
            for l in (0..self.layers.len()).rev() {
                let layer = &self.layers[l];
                let input = &acts[l];
                for o in 0..layer.n_out {
                    grads[l].b[o] += delta[o];
                    for (k, a) in input.iter().enumerate() {
                        grads[l].w[o * layer.n_in + k] += delta[o] * a;
                    }
                }
                if l == 0 {
                    break;
                }
                // back through the weights, then the ReLU of the layer below
                delta = (0..layer.n_in)
                    .map(|k| {
                        if input[k] <= 0.0 {
                            return 0.0;
                        }
                        (0..layer.n_out)
                            .map(|o| layer.w[o * layer.n_in + k] * delta[o])
                            .sum()
                    })
                    .collect();
            }
        }

        let m = batch.len() as f64;
        let penalty: f64 = self.layers.iter().map(Dense::squared_norm).sum();
        loss = loss / (2.0 * m) + 0.5 * self.alpha * penalty / m;

        let bias1 = 1.0 - BETA1.powi(t);
        let bias2 = 1.0 - BETA2.powi(t);
        let step = LEARNING_RATE * bias2.sqrt() / bias1;
        for (layer, g) in self.layers.iter_mut().zip(&grads) {
            for j in 0..layer.w.len() {
                let grad = g.w[j] / m + self.alpha * layer.w[j] / m;
                layer.m_w[j] = BETA1 * layer.m_w[j] + (1.0 - BETA1) * grad;
                layer.v_w[j] = BETA2 * layer.v_w[j] + (1.0 - BETA2) * grad * grad;
                layer.w[j] -= step * layer.m_w[j] / (layer.v_w[j].sqrt() + ADAM_EPS);
            }
            for j in 0..layer.b.len() {
                let grad = g.b[j] / m;
                layer.m_b[j] = BETA1 * layer.m_b[j] + (1.0 - BETA1) * grad;
                layer.v_b[j] = BETA2 * layer.v_b[j] + (1.0 - BETA2) * grad * grad;
                layer.b[j] -= step * layer.m_b[j] / (layer.v_b[j].sqrt() + ADAM_EPS);
            }
        }
        loss
    }
}

impl Regressor for NeuralNetwork {
    fn fit(&mut self, x: &[f64], y: &[f64], budget: &FitBudget) -> Result<(), ModelError> {
        let n = x.len();
        let mut rng = StdRng::seed_from_u64(DEFAULT_SEED);

        let mut sizes = vec![1];
        sizes.extend(&self.hidden);
        sizes.push(1);
        self.layers = sizes
            .windows(2)
            .map(|pair| Dense::new(pair[0], pair[1], &mut rng))
            .collect();

        let batch_size = n.clamp(1, MAX_BATCH);
        let mut order: Vec<usize> = (0..n).collect();
        let mut best_loss = f64::INFINITY;
        let mut stale = 0;
        let mut t = 0;
        self.iterations = 0;

        for _ in 0..self.max_iter {
            budget.check()?;
            order.shuffle(&mut rng);

            let mut epoch_loss = 0.0;
            for batch in order.chunks(batch_size) {
                t += 1;
                let batch_loss = self.train_batch(x, y, batch, t);
                epoch_loss += batch_loss * batch.len() as f64;
            }
            epoch_loss /= n as f64;
            self.iterations += 1;
            self.final_loss = epoch_loss;

            if !epoch_loss.is_finite() {
                return Err(ModelError::Numerical(format!(
                    "training loss diverged at epoch {}",
                    self.iterations
                )));
            }

            if epoch_loss > best_loss - TOLERANCE {
                stale += 1;
            } else {
                stale = 0;
            }
            best_loss = best_loss.min(epoch_loss);
            if stale > PATIENCE {
                break;
            }
        }

        log::debug!(
            "Neural network stopped after {} epochs, loss {:.6}",
            self.iterations,
            self.final_loss
        );
        Ok(())
    }

    fn predict(&self, x: &[f64]) -> Result<Vec<f64>, ModelError> {
        if self.layers.is_empty() {
            return Err(ModelError::NotFitted);
        }
        Ok(x.iter().map(|&xi| self.output(xi)).collect())
    }

    fn info(&self) -> ModelInfo {
        ModelInfo::NeuralNetwork {
            hidden_layer_sizes: self.hidden.clone(),
            alpha: self.alpha,
            iterations: self.iterations,
            final_loss: self.final_loss,
        }
    }
}
