use serde::{Serialize, Deserialize};
use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::loss::loss_type::LossType;
use crate::network::metadata::ModelMetadata;

/// Describes one layer in a network specification.
///
/// Fields:
/// - `size`      : number of neurons in this layer
/// - `input_size`: output size of the previous layer, or the raw input
///                  dimension for the first layer
/// - `activation`: activation function applied after the affine transform
/// - `dropout`   : optional dropout probability applied after the activation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub input_size: usize,
    pub activation: ActivationFunction,
    #[serde(default)]
    pub dropout: Option<f64>,
}

impl LayerSpec {
    pub fn new(size: usize, input_size: usize, activation: ActivationFunction) -> LayerSpec {
        LayerSpec { size, input_size, activation, dropout: None }
    }

    pub fn with_dropout(mut self, prob: f64) -> LayerSpec {
        self.dropout = Some(prob);
        self
    }
}

/// A fully serializable description of a network architecture plus the loss
/// it is trained with and optional metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name used as the model file stem.
    pub name: String,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    /// Loss function to pair with this network during training.
    pub loss: LossType,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl NetworkSpec {
    /// 784 → 128 → 64 → 10 with ReLU, raw logits out, cross-entropy loss.
    pub fn mnist() -> NetworkSpec {
        NetworkSpec {
            name: "mnist".to_owned(),
            layers: vec![
                LayerSpec::new(128, 784, ActivationFunction::ReLU),
                LayerSpec::new(64, 128, ActivationFunction::ReLU),
                LayerSpec::new(10, 64, ActivationFunction::Identity),
            ],
            loss: LossType::CrossEntropy,
            metadata: Some(ModelMetadata::digits()),
        }
    }

    /// 784 → 256 → 128 → 64 → 10 with ReLU and dropout on every hidden
    /// layer, log-probabilities out, NLL loss.
    pub fn fashion_mnist(dropout: f64) -> NetworkSpec {
        NetworkSpec {
            name: "fashion_mnist".to_owned(),
            layers: vec![
                LayerSpec::new(256, 784, ActivationFunction::ReLU).with_dropout(dropout),
                LayerSpec::new(128, 256, ActivationFunction::ReLU).with_dropout(dropout),
                LayerSpec::new(64, 128, ActivationFunction::ReLU).with_dropout(dropout),
                LayerSpec::new(10, 64, ActivationFunction::LogSoftmax),
            ],
            loss: LossType::Nll,
            metadata: Some(ModelMetadata::fashion()),
        }
    }

    /// Checks the layer chain and the output/loss pairing.
    pub fn validate(&self) -> Result<()> {
        let last = self.layers.last().ok_or_else(|| {
            Error::InvalidConfig(format!("network '{}' has no layers", self.name))
        })?;

        for (i, layer) in self.layers.iter().enumerate() {
            if layer.size == 0 || layer.input_size == 0 {
                return Err(Error::InvalidConfig(format!("layer {} has a zero dimension", i)));
            }
            if i > 0 && layer.input_size != self.layers[i - 1].size {
                return Err(Error::InvalidConfig(format!(
                    "layer {} expects {} inputs but layer {} produces {}",
                    i, layer.input_size, i - 1, self.layers[i - 1].size
                )));
            }
            if layer.activation == ActivationFunction::LogSoftmax && i + 1 != self.layers.len() {
                return Err(Error::InvalidConfig(format!(
                    "LogSoftmax is only valid on the output layer (found on layer {})",
                    i
                )));
            }
        }

        let pairing_ok = match self.loss {
            LossType::Nll => last.activation == ActivationFunction::LogSoftmax,
            LossType::CrossEntropy => last.activation == ActivationFunction::Identity,
        };
        if !pairing_ok {
            return Err(Error::InvalidConfig(format!(
                "{:?} loss cannot consume a {:?} output layer",
                self.loss, last.activation
            )));
        }
        if last.dropout.is_some() {
            return Err(Error::InvalidConfig("dropout on the output layer is not supported".to_owned()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        NetworkSpec::mnist().validate().unwrap();
        NetworkSpec::fashion_mnist(0.2).validate().unwrap();
    }

    #[test]
    fn broken_chain_is_rejected() {
        let mut spec = NetworkSpec::mnist();
        spec.layers[1].input_size = 100;
        assert!(matches!(spec.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn loss_must_match_output_convention() {
        let mut spec = NetworkSpec::mnist();
        spec.loss = LossType::Nll;
        assert!(spec.validate().is_err());
    }

    #[test]
    fn json_roundtrip_keeps_dropout() {
        let spec = NetworkSpec::fashion_mnist(0.2);
        let json = serde_json::to_string(&spec).unwrap();
        let back: NetworkSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
        assert_eq!(back.layers[0].dropout, Some(0.2));
    }
}
