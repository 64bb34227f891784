use serde::{Serialize, Deserialize};
use std::f64::consts::E;

use crate::math::matrix::Matrix;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    Identity,
    Tanh,
    LeakyReLU { alpha: f64 },
    /// Row-wise `z - log(sum(exp(z)))`. Vector-valued, so it is applied per
    /// row in `forward()` and its backward pass uses the full Jacobian.
    LogSoftmax,
}

impl ActivationFunction {
    /// Element-wise activation. `LogSoftmax` is not element-wise; use
    /// `forward()` for it.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity => x,
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
            ActivationFunction::LogSoftmax => {
                unreachable!("LogSoftmax is applied row-wise by ActivationFunction::forward")
            }
        }
    }

    /// Element-wise derivative evaluated at the pre-activation `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => {
                let fx = self.function(x);
                fx * (1.0 - fx)
            }
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Identity => 1.0,
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { 1.0 } else { *alpha },
            ActivationFunction::LogSoftmax => {
                unreachable!("LogSoftmax gradient is computed row-wise by ActivationFunction::backward")
            }
        }
    }

    /// Applies the activation to a whole `(batch, size)` pre-activation matrix.
    pub fn forward(&self, z: &Matrix) -> Matrix {
        match self {
            ActivationFunction::LogSoftmax => {
                let mut out = z.clone();
                for r in 0..out.rows {
                    let row = out.row_mut(r);
                    let lse = log_sum_exp(row);
                    row.iter_mut().for_each(|x| *x -= lse);
                }
                out
            }
            _ => z.map(|x| self.function(x)),
        }
    }

    /// Maps `∂L/∂a` to `∂L/∂z` given the cached pre-activation `z` and
    /// activation `a` of the same forward pass.
    pub fn backward(&self, z: &Matrix, a: &Matrix, grad_a: &Matrix) -> Matrix {
        match self {
            ActivationFunction::LogSoftmax => {
                // ∂L/∂z = g - softmax(z) * sum(g), and softmax(z) = exp(a).
                let mut out = grad_a.clone();
                for r in 0..out.rows {
                    let g_sum: f64 = grad_a.row(r).iter().sum();
                    for (g, y) in out.row_mut(r).iter_mut().zip(a.row(r)) {
                        *g -= y.exp() * g_sum;
                    }
                }
                out
            }
            _ => grad_a.hadamard(&z.map(|x| self.derivative(x))),
        }
    }
}

/// Numerically stable `log(sum(exp(xs)))`.
pub fn log_sum_exp(xs: &[f64]) -> f64 {
    let max = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max.is_infinite() {
        return max;
    }
    max + xs.iter().map(|x| (x - max).exp()).sum::<f64>().ln()
}

/// Row-wise softmax of raw logits.
pub fn softmax(xs: &[f64]) -> Vec<f64> {
    let lse = log_sum_exp(xs);
    xs.iter().map(|x| (x - lse).exp()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn log_softmax_rows_exponentiate_to_one() {
        let z = Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![-50.0, 0.0, 50.0]]);
        let a = ActivationFunction::LogSoftmax.forward(&z);
        for row in a.rows_iter() {
            let total: f64 = row.iter().map(|x| x.exp()).sum();
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn log_softmax_backward_matches_finite_differences() {
        let z = Matrix::from_rows(&[vec![0.3, -1.2, 2.0, 0.0]]);
        // L = sum(w * log_softmax(z)) for fixed weights w.
        let w = Matrix::from_rows(&[vec![0.5, -1.0, 2.0, 0.25]]);
        let act = ActivationFunction::LogSoftmax;
        let a = act.forward(&z);
        let analytic = act.backward(&z, &a, &w);

        let h = 1e-6;
        for j in 0..z.cols {
            let mut plus = z.clone();
            plus.set(0, j, z.get(0, j) + h);
            let mut minus = z.clone();
            minus.set(0, j, z.get(0, j) - h);
            let lp = act.forward(&plus).hadamard(&w).sum();
            let lm = act.forward(&minus).hadamard(&w).sum();
            assert_abs_diff_eq!(analytic.get(0, j), (lp - lm) / (2.0 * h), epsilon = 1e-6);
        }
    }

    #[test]
    fn relu_gates_gradient_on_pre_activation() {
        let z = Matrix::from_rows(&[vec![-1.0, 2.0]]);
        let act = ActivationFunction::ReLU;
        let a = act.forward(&z);
        assert_eq!(a.data, vec![0.0, 2.0]);
        let g = act.backward(&z, &a, &Matrix::filled(1, 2, 1.0));
        assert_eq!(g.data, vec![0.0, 1.0]);
    }

    #[test]
    fn softmax_is_shift_invariant() {
        let a = softmax(&[1.0, 2.0, 3.0]);
        let b = softmax(&[1001.0, 1002.0, 1003.0]);
        for (x, y) in a.iter().zip(&b) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-12);
        }
    }
}
