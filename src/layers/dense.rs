use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{activation::activation::ActivationFunction, math::matrix::Matrix};
use crate::error::{Error, Result};
use crate::layers::{dropout::Dropout, mode::Mode};

/// Fully connected layer: `a = activation(x·W + b)`, optionally followed by
/// dropout.
///
/// Weights are `(input_size, size)` and biases `(1, size)`, so a batch of
/// inputs `(n, input_size)` maps to `(n, size)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub size: usize,
    pub input_size: usize,
    pub(crate) weights: Matrix,
    pub(crate) biases: Matrix,
    pub activator: ActivationFunction,
    #[serde(default)]
    pub dropout: Option<Dropout>,
}

/// Values from one tracked forward pass that the backward pass needs.
#[derive(Debug, Clone)]
pub struct LayerCache {
    input: Matrix,
    pre_activation: Matrix,
    activation: Matrix,
    dropout_mask: Option<Matrix>,
}

impl Layer {
    /// He init for ReLU-family layers, Xavier for everything else. Biases
    /// start at zero.
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        dropout: Option<Dropout>,
        rng: &mut R,
    ) -> Layer {
        let weights = match activation {
            ActivationFunction::ReLU | ActivationFunction::LeakyReLU { .. } => {
                Matrix::he(input_size, size, rng)
            }
            _ => Matrix::xavier(input_size, size, rng),
        };

        Layer {
            size,
            input_size,
            weights,
            biases: Matrix::zeros(1, size),
            activator: activation,
            dropout,
        }
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    pub fn biases(&self) -> &Matrix {
        &self.biases
    }

    /// Checks that the parameter buffers agree with `size`/`input_size` and
    /// that the dropout probability is valid. Deserialized layers are not
    /// checked otherwise.
    pub fn check(&self) -> Result<()> {
        let expected = [(self.input_size, self.size), (1, self.size)];
        for ((name, m), shape) in [("layer weights", &self.weights), ("layer biases", &self.biases)]
            .into_iter()
            .zip(expected)
        {
            if m.shape() != shape || m.data.len() != m.rows * m.cols {
                return Err(Error::shape(
                    name,
                    format!("{:?} with {} values", shape, shape.0 * shape.1),
                    format!("{:?} with {} values", m.shape(), m.data.len()),
                ));
            }
        }
        if let Some(dropout) = self.dropout {
            Dropout::new(dropout.prob())?;
        }
        Ok(())
    }

    pub fn param_count(&self) -> usize {
        self.weights.data.len() + self.biases.data.len()
    }

    /// Forward pass over a batch. The returned cache is only kept by the
    /// caller when gradient tracking is on.
    pub fn feed_forward<R: Rng + ?Sized>(
        &self,
        input: &Matrix,
        mode: Mode,
        rng: &mut R,
    ) -> (Matrix, LayerCache) {
        let z = (input * &self.weights).add_row_broadcast(&self.biases);
        let a = self.activator.forward(&z);

        let (output, dropout_mask) = match &self.dropout {
            Some(dropout) => dropout.forward(a.clone(), mode, rng),
            None => (a.clone(), None),
        };

        let cache = LayerCache {
            input: input.clone(),
            pre_activation: z,
            activation: a,
            dropout_mask,
        };
        (output, cache)
    }

    /// Given `∂L/∂output` for this layer, returns
    /// `(weights_grad, biases_grad, ∂L/∂input)`.
    pub fn compute_gradients(&self, cache: &LayerCache, grad_output: &Matrix) -> (Matrix, Matrix, Matrix) {
        let grad_a = match &cache.dropout_mask {
            Some(mask) => grad_output.hadamard(mask),
            None => grad_output.clone(),
        };
        let grad_z = self.activator.backward(&cache.pre_activation, &cache.activation, &grad_a);

        let weights_grad = &cache.input.transpose() * &grad_z;
        let biases_grad = grad_z.sum_rows();
        let grad_input = &grad_z * &self.weights.transpose();

        (weights_grad, biases_grad, grad_input)
    }

    /// Subtracts precomputed parameter deltas. Only optimizers call this.
    pub(crate) fn apply_update(&mut self, weights_delta: &Matrix, biases_delta: &Matrix) {
        self.weights = &self.weights - weights_delta;
        self.biases = &self.biases - biases_delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn loss_of(layer: &Layer, x: &Matrix) -> f64 {
        let mut rng = StdRng::seed_from_u64(0);
        let (out, _) = layer.feed_forward(x, Mode::Eval, &mut rng);
        out.map(|v| v * v).sum() * 0.5
    }

    #[test]
    fn weight_gradient_matches_finite_differences() {
        let mut rng = StdRng::seed_from_u64(3);
        let layer = Layer::new(3, 4, ActivationFunction::Tanh, None, &mut rng);
        let x = Matrix::from_rows(&[vec![0.1, -0.2, 0.3, 0.4], vec![-0.5, 0.6, 0.0, 0.2]]);

        let (out, cache) = layer.feed_forward(&x, Mode::Train, &mut rng);
        // L = 0.5 * sum(out^2)  =>  ∂L/∂out = out
        let (w_grad, b_grad, _) = layer.compute_gradients(&cache, &out);

        let h = 1e-6;
        for (i, j) in [(0, 0), (2, 1), (3, 2)] {
            let mut plus = layer.clone();
            plus.weights.set(i, j, layer.weights.get(i, j) + h);
            let mut minus = layer.clone();
            minus.weights.set(i, j, layer.weights.get(i, j) - h);
            let numeric = (loss_of(&plus, &x) - loss_of(&minus, &x)) / (2.0 * h);
            assert_abs_diff_eq!(w_grad.get(i, j), numeric, epsilon = 1e-6);
        }

        let mut plus = layer.clone();
        plus.biases.set(0, 1, layer.biases.get(0, 1) + h);
        let mut minus = layer.clone();
        minus.biases.set(0, 1, layer.biases.get(0, 1) - h);
        let numeric = (loss_of(&plus, &x) - loss_of(&minus, &x)) / (2.0 * h);
        assert_abs_diff_eq!(b_grad.get(0, 1), numeric, epsilon = 1e-6);
    }

    #[test]
    fn dropped_units_receive_no_gradient() {
        let mut rng = StdRng::seed_from_u64(11);
        let dropout = Dropout::new(0.5).unwrap();
        let layer = Layer::new(8, 4, ActivationFunction::Identity, Some(dropout), &mut rng);
        let x = Matrix::filled(1, 4, 1.0);

        let (out, cache) = layer.feed_forward(&x, Mode::Train, &mut rng);
        let (w_grad, _, _) = layer.compute_gradients(&cache, &Matrix::filled(1, 8, 1.0));
        for j in 0..8 {
            if out.get(0, j) == 0.0 && cache.activation.get(0, j) != 0.0 {
                for i in 0..4 {
                    assert_eq!(w_grad.get(i, j), 0.0);
                }
            }
        }
    }
}
