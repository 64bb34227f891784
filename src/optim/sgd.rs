use crate::error::Result;
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::optim::optimizer::{apply_with, Optimizer};

/// Stochastic gradient descent with optional classical momentum.
pub struct Sgd {
    pub learning_rate: f64,
    pub momentum: f64,
    velocities: Vec<(Matrix, Matrix)>,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd::with_momentum(learning_rate, 0.0)
    }

    pub fn with_momentum(learning_rate: f64, momentum: f64) -> Sgd {
        Sgd { learning_rate, momentum, velocities: Vec::new() }
    }
}

impl Optimizer for Sgd {
    /// `p -= lr * g`, or with momentum `v = μ·v + g; p -= lr * v`.
    fn step(&mut self, network: &mut Network) -> Result<()> {
        let lr = self.learning_rate;
        if self.momentum == 0.0 {
            return apply_with(network, |_, w, b| (w.scale(lr), b.scale(lr)));
        }

        let mu = self.momentum;
        let velocities = &mut self.velocities;
        apply_with(network, |i, w, b| {
            if velocities.len() <= i {
                velocities.push((Matrix::zeros(w.rows, w.cols), Matrix::zeros(b.rows, b.cols)));
            }
            let (vw, vb) = &mut velocities[i];
            *vw = &vw.scale(mu) + w;
            *vb = &vb.scale(mu) + b;
            (vw.scale(lr), vb.scale(lr))
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
    use crate::error::Error;
    use crate::layers::mode::Mode;
    use crate::loss::{loss_fn::Loss, loss_type::LossType};
    use crate::network::spec::{LayerSpec, NetworkSpec};
    use approx::assert_abs_diff_eq;

    fn tiny() -> Network {
        let spec = NetworkSpec {
            name: "tiny".to_owned(),
            layers: vec![LayerSpec::new(3, 2, ActivationFunction::Identity)],
            loss: LossType::CrossEntropy,
            metadata: None,
        };
        Network::from_spec(&spec, 4).unwrap()
    }

    #[test]
    fn step_without_gradients_is_refused() {
        let mut net = tiny();
        let before = net.layers[0].weights().clone();
        assert!(matches!(Sgd::new(0.1).step(&mut net), Err(Error::NoGradients)));
        assert_eq!(net.layers[0].weights(), &before);
    }

    #[test]
    fn plain_step_moves_against_the_gradient() {
        let mut net = tiny();
        let x = Matrix::from_rows(&[vec![1.0, -2.0]]);
        let out = net.forward(&x, Mode::Train).unwrap();
        net.zero_grad();
        net.backward(&LossType::CrossEntropy.backward(&out, &[1]).unwrap()).unwrap();

        let before = net.layers[0].weights().clone();
        let grad = net.gradients().layer(0).weights.clone();
        Sgd::new(0.5).step(&mut net).unwrap();

        for k in 0..before.data.len() {
            assert_abs_diff_eq!(net.layers[0].weights().data[k], before.data[k] - 0.5 * grad.data[k], epsilon = 1e-12);
        }
    }
}
