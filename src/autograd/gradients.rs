use crate::layers::dense::Layer;
use crate::math::matrix::Matrix;

/// Gradients of the loss with respect to one layer's parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerGrads {
    pub weights: Matrix,
    pub biases: Matrix,
}

/// Explicitly owned gradient accumulator.
///
/// Every backward pass adds into the store; nothing clears it except
/// [`Gradients::zero`]. `passes()` counts the backward passes accumulated
/// since the last zeroing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gradients {
    layers: Vec<LayerGrads>,
    passes: usize,
}

impl Gradients {
    pub fn zeros_like(layers: &[Layer]) -> Gradients {
        Gradients {
            layers: layers
                .iter()
                .map(|layer| LayerGrads {
                    weights: Matrix::zeros(layer.input_size, layer.size),
                    biases: Matrix::zeros(1, layer.size),
                })
                .collect(),
            passes: 0,
        }
    }

    /// True when the store was allocated for exactly these layers.
    pub(crate) fn matches(&self, layers: &[Layer]) -> bool {
        self.layers.len() == layers.len()
            && self.layers.iter().zip(layers).all(|(g, l)| {
                g.weights.shape() == (l.input_size, l.size) && g.biases.shape() == (1, l.size)
            })
    }

    pub fn zero(&mut self) {
        for grads in &mut self.layers {
            grads.weights.data.iter_mut().for_each(|x| *x = 0.0);
            grads.biases.data.iter_mut().for_each(|x| *x = 0.0);
        }
        self.passes = 0;
    }

    pub(crate) fn accumulate(&mut self, layer: usize, weights: &Matrix, biases: &Matrix) {
        self.layers[layer].weights.add_assign(weights);
        self.layers[layer].biases.add_assign(biases);
    }

    pub(crate) fn finish_pass(&mut self) {
        self.passes += 1;
    }

    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn is_empty(&self) -> bool {
        self.passes == 0
    }

    pub fn layer(&self, index: usize) -> &LayerGrads {
        &self.layers[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayerGrads> {
        self.layers.iter()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }
}
