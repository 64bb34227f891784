use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::layers::mode::Mode;
use crate::math::matrix::Matrix;

/// Inverted dropout.
///
/// In `Mode::Train` every activation is zeroed with probability `prob` and
/// the survivors are scaled by `1 / (1 - prob)`, so the expected activation is
/// unchanged. In `Mode::Eval` it is the identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dropout {
    prob: f64,
}

impl Dropout {
    pub fn new(prob: f64) -> Result<Dropout> {
        if !(0.0..1.0).contains(&prob) {
            return Err(Error::InvalidConfig(format!(
                "dropout probability must lie in [0, 1), got {}",
                prob
            )));
        }
        Ok(Dropout { prob })
    }

    pub fn prob(&self) -> f64 {
        self.prob
    }

    /// Returns the dropped-out activations and, when dropout was active, the
    /// scaled keep-mask needed by the backward pass.
    pub fn forward<R: Rng + ?Sized>(
        &self,
        input: Matrix,
        mode: Mode,
        rng: &mut R,
    ) -> (Matrix, Option<Matrix>) {
        if !mode.is_train() || self.prob == 0.0 {
            return (input, None);
        }

        let keep_scale = 1.0 / (1.0 - self.prob);
        let mask_data = (0..input.rows * input.cols)
            .map(|_| if rng.gen::<f64>() < self.prob { 0.0 } else { keep_scale })
            .collect();
        let mask = Matrix::from_vec(input.rows, input.cols, mask_data);

        (input.hadamard(&mask), Some(mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn rejects_out_of_range_probability() {
        assert!(Dropout::new(1.0).is_err());
        assert!(Dropout::new(-0.1).is_err());
        assert!(Dropout::new(0.2).is_ok());
    }

    #[test]
    fn eval_mode_is_identity() {
        let dropout = Dropout::new(0.5).unwrap();
        let input = Matrix::filled(10, 10, 1.0);
        let (out, mask) = dropout.forward(input.clone(), Mode::Eval, &mut StdRng::seed_from_u64(1));
        assert_eq!(out, input);
        assert!(mask.is_none());
    }

    #[test]
    fn train_mode_zeroes_and_rescales() {
        let dropout = Dropout::new(0.2).unwrap();
        let input = Matrix::filled(100, 100, 1.0);
        let (out, mask) = dropout.forward(input, Mode::Train, &mut StdRng::seed_from_u64(1));
        assert!(mask.is_some());

        let zeros = out.data.iter().filter(|&&x| x == 0.0).count();
        assert!(out.data.iter().all(|&x| x == 0.0 || (x - 1.25).abs() < 1e-12));
        // 10_000 Bernoulli(0.2) draws: well within 1500..2500.
        assert!((1500..2500).contains(&zeros), "dropped {} of 10000", zeros);
    }
}
