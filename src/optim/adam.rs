use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::optim::optimizer::{apply_with, Optimizer};

/// Per-parameter moment estimates for one layer.
struct Moments {
    m_w: Matrix,
    v_w: Matrix,
    m_b: Matrix,
    v_b: Matrix,
}

/// Adam optimizer.
///
/// m_t = β1·m + (1-β1)·g
/// v_t = β2·v + (1-β2)·g²
/// θ  -= lr · m̂_t / (√v̂_t + ε)
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    t: u64,
    moments: Vec<Moments>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Adam {
        Adam::with_params(learning_rate, 0.9, 0.999, 1e-8)
    }

    pub fn with_params(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Adam {
        Adam { learning_rate, beta1, beta2, epsilon, t: 0, moments: Vec::new() }
    }

    pub fn step_count(&self) -> u64 {
        self.t
    }
}

fn update_moments(m: &mut Matrix, v: &mut Matrix, g: &Matrix, beta1: f64, beta2: f64) {
    for ((mi, vi), gi) in m.data.iter_mut().zip(v.data.iter_mut()).zip(&g.data) {
        *mi = beta1 * *mi + (1.0 - beta1) * gi;
        *vi = beta2 * *vi + (1.0 - beta2) * gi * gi;
    }
}

fn corrected_delta(m: &Matrix, v: &Matrix, lr: f64, bc1: f64, bc2: f64, eps: f64) -> Matrix {
    let data = m
        .data
        .iter()
        .zip(&v.data)
        .map(|(mi, vi)| lr * (mi / bc1) / ((vi / bc2).sqrt() + eps))
        .collect();
    Matrix::from_vec(m.rows, m.cols, data)
}

impl Optimizer for Adam {
    fn step(&mut self, network: &mut Network) -> Result<()> {
        if network.gradients().is_empty() {
            return Err(Error::NoGradients);
        }
        self.t += 1;

        let (lr, beta1, beta2, eps) = (self.learning_rate, self.beta1, self.beta2, self.epsilon);
        let bc1 = 1.0 - beta1.powi(self.t as i32);
        let bc2 = 1.0 - beta2.powi(self.t as i32);
        let moments = &mut self.moments;

        apply_with(network, |i, w, b| {
            if moments.len() <= i {
                moments.push(Moments {
                    m_w: Matrix::zeros(w.rows, w.cols),
                    v_w: Matrix::zeros(w.rows, w.cols),
                    m_b: Matrix::zeros(b.rows, b.cols),
                    v_b: Matrix::zeros(b.rows, b.cols),
                });
            }
            let st = &mut moments[i];
            update_moments(&mut st.m_w, &mut st.v_w, w, beta1, beta2);
            update_moments(&mut st.m_b, &mut st.v_b, b, beta1, beta2);
            (
                corrected_delta(&st.m_w, &st.v_w, lr, bc1, bc2, eps),
                corrected_delta(&st.m_b, &st.v_b, lr, bc1, bc2, eps),
            )
        })
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::layers::mode::Mode;
    use crate::loss::{loss_fn::Loss, loss_type::LossType};
    use crate::network::spec::{LayerSpec, NetworkSpec};
    use approx::assert_abs_diff_eq;

    #[test]
    fn first_step_moves_each_parameter_by_about_lr() {
        let spec = NetworkSpec {
            name: "tiny".to_owned(),
            layers: vec![LayerSpec::new(3, 2, ActivationFunction::Identity)],
            loss: LossType::CrossEntropy,
            metadata: None,
        };
        let mut net = Network::from_spec(&spec, 8).unwrap();
        let x = Matrix::from_rows(&[vec![0.7, -0.3]]);
        let out = net.forward(&x, Mode::Train).unwrap();
        net.zero_grad();
        net.backward(&LossType::CrossEntropy.backward(&out, &[0]).unwrap()).unwrap();

        let before = net.layers[0].weights().clone();
        let grad = net.gradients().layer(0).weights.clone();
        let mut adam = Adam::new(0.01);
        adam.step(&mut net).unwrap();
        assert_eq!(adam.step_count(), 1);

        // Bias-corrected first step is lr * sign(g) for non-negligible g.
        for k in 0..before.data.len() {
            let moved = before.data[k] - net.layers[0].weights().data[k];
            assert_abs_diff_eq!(moved, 0.01 * grad.data[k].signum(), epsilon = 1e-6);
        }
    }
}
