use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::{softmax, ActivationFunction};
use crate::autograd::{Gradients, NoGrad, Tape};
use crate::error::{Error, Result};
use crate::layers::{dense::Layer, dropout::Dropout, mode::Mode};
use crate::math::matrix::Matrix;
use crate::metric::accuracy::argmax;
use crate::network::metadata::ModelMetadata;
use crate::network::spec::NetworkSpec;

/// What the output layer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Raw unnormalized scores.
    Logits,
    /// Natural log of per-class probabilities.
    LogProbabilities,
}

/// A multilayer perceptron together with its gradient bookkeeping.
///
/// Only `layers` and `metadata` are persisted. The tape, gradient store,
/// tracking flag and dropout RNG are runtime state.
#[derive(Debug, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
    #[serde(skip)]
    grads: Gradients,
    #[serde(skip)]
    tape: Option<Tape>,
    #[serde(skip, default = "tracking_on")]
    grad_enabled: bool,
    #[serde(skip, default = "fresh_rng")]
    rng: StdRng,
}

fn tracking_on() -> bool {
    true
}

fn fresh_rng() -> StdRng {
    StdRng::from_entropy()
}

impl Network {
    /// Builds and initializes a network from a validated spec. The same seed
    /// yields the same initial parameters and the same dropout masks.
    pub fn from_spec(spec: &NetworkSpec, seed: u64) -> Result<Network> {
        spec.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);

        let mut layers = Vec::with_capacity(spec.layers.len());
        for layer in &spec.layers {
            let dropout = layer.dropout.map(Dropout::new).transpose()?;
            layers.push(Layer::new(layer.size, layer.input_size, layer.activation, dropout, &mut rng));
        }

        let grads = Gradients::zeros_like(&layers);
        Ok(Network {
            layers,
            metadata: spec.metadata.clone(),
            grads,
            tape: None,
            grad_enabled: true,
            rng,
        })
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |l| l.input_size)
    }

    pub fn n_classes(&self) -> usize {
        self.layers.last().map_or(0, |l| l.size)
    }

    pub fn param_count(&self) -> usize {
        self.layers.iter().map(Layer::param_count).sum()
    }

    pub fn output_kind(&self) -> OutputKind {
        match self.layers.last().map(|l| l.activator) {
            Some(ActivationFunction::LogSoftmax) => OutputKind::LogProbabilities,
            _ => OutputKind::Logits,
        }
    }

    /// Batched forward pass, `(n, input_size)` → `(n, n_classes)`.
    ///
    /// With tracking on, the pass is recorded for the next `backward`,
    /// replacing any unconsumed recording.
    pub fn forward(&mut self, input: &Matrix, mode: Mode) -> Result<Matrix> {
        if input.cols != self.input_size() {
            return Err(Error::shape(
                "network input",
                format!("{} features", self.input_size()),
                format!("{} features", input.cols),
            ));
        }

        let mut caches = Vec::with_capacity(self.layers.len());
        let mut current = input.clone();
        for layer in &self.layers {
            let (output, cache) = layer.feed_forward(&current, mode, &mut self.rng);
            if self.grad_enabled {
                caches.push(cache);
            }
            current = output;
        }

        self.tape = if self.grad_enabled {
            Some(Tape::new(caches, current.shape()))
        } else {
            None
        };
        Ok(current)
    }

    /// Reverse-mode pass from `∂L/∂output` of the last tracked forward.
    ///
    /// Parameter gradients are added to the store; call `zero_grad` first
    /// unless accumulation across passes is intended.
    pub fn backward(&mut self, grad_output: &Matrix) -> Result<()> {
        let tape = self.tape.take().ok_or(Error::NoTape)?;
        if grad_output.shape() != tape.output_shape() {
            return Err(Error::shape(
                "backward gradient",
                format!("{:?}", tape.output_shape()),
                format!("{:?}", grad_output.shape()),
            ));
        }
        if !self.grads.matches(&self.layers) {
            self.grads = Gradients::zeros_like(&self.layers);
        }

        let mut delta = grad_output.clone();
        for (i, (layer, cache)) in self.layers.iter().zip(&tape.caches).enumerate().rev() {
            let (w_grad, b_grad, grad_input) = layer.compute_gradients(cache, &delta);
            self.grads.accumulate(i, &w_grad, &b_grad);
            delta = grad_input;
        }
        self.grads.finish_pass();
        Ok(())
    }

    /// Clears the gradient store.
    pub fn zero_grad(&mut self) {
        if self.grads.matches(&self.layers) {
            self.grads.zero();
        } else {
            self.grads = Gradients::zeros_like(&self.layers);
        }
    }

    pub fn gradients(&self) -> &Gradients {
        &self.grads
    }

    pub fn is_grad_enabled(&self) -> bool {
        self.grad_enabled
    }

    /// Sets the tracking flag and returns the previous value. Disabling
    /// drops any pending tape.
    pub(crate) fn set_grad_enabled(&mut self, enabled: bool) -> bool {
        let previous = self.grad_enabled;
        self.grad_enabled = enabled;
        if !enabled {
            self.tape = None;
        }
        previous
    }

    /// Disables gradient tracking until the returned guard is dropped.
    pub fn no_grad(&mut self) -> NoGrad<'_> {
        NoGrad::new(self)
    }

    pub(crate) fn apply_update(&mut self, layer: usize, weights_delta: &Matrix, biases_delta: &Matrix) {
        self.layers[layer].apply_update(weights_delta, biases_delta);
    }

    /// Full class-probability vector for a single example, computed in eval
    /// mode without tracking.
    pub fn predict_proba(&mut self, example: &[f64]) -> Result<Vec<f64>> {
        let kind = self.output_kind();
        let input = Matrix::row_vector(example);
        let output = {
            let mut scope = self.no_grad();
            scope.forward(&input, Mode::Eval)?
        };

        let row = output.row(0);
        Ok(match kind {
            OutputKind::LogProbabilities => row.iter().map(|x| x.exp()).collect(),
            OutputKind::Logits => softmax(row),
        })
    }

    /// Predicted class (first maximal index) and the full probability vector.
    pub fn predict(&mut self, example: &[f64]) -> Result<(usize, Vec<f64>)> {
        let probs = self.predict_proba(example)?;
        Ok((argmax(&probs), probs))
    }

    /// Serializes the network weights to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    ///
    /// Parameter shapes, layer chaining and dropout probabilities are
    /// validated, so a malformed file fails here instead of in `forward`.
    pub fn load_json(path: &str) -> Result<Network> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let mut network: Network = serde_json::from_reader(reader)?;
        network.check_layers()?;
        network.grads = Gradients::zeros_like(&network.layers);
        Ok(network)
    }

    fn check_layers(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(Error::InvalidConfig("network has no layers".to_owned()));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            layer.check()?;
            if i > 0 && layer.input_size != self.layers[i - 1].size {
                return Err(Error::shape(
                    "layer chain",
                    format!("layer {} to take {} inputs", i, self.layers[i - 1].size),
                    format!("{} inputs", layer.input_size),
                ));
            }
        }
        Ok(())
    }
}
