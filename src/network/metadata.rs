use serde::{Deserialize, Serialize};

use crate::data::dataset::Normalize;

/// Optional annotations attached to a saved Network.
/// All fields are Option<> so bare models deserialize cleanly.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ModelMetadata {
    pub description: Option<String>,
    /// Human-readable class names for the output layer, index-aligned.
    pub class_names: Option<Vec<String>>,
    /// Input normalization the network was trained with.
    #[serde(default)]
    pub normalize: Option<Normalize>,
}

impl ModelMetadata {
    pub fn digits() -> ModelMetadata {
        ModelMetadata {
            description: Some("MNIST handwritten digits".to_owned()),
            class_names: Some((0..10).map(|d| d.to_string()).collect()),
            normalize: None,
        }
    }

    pub fn fashion() -> ModelMetadata {
        let names = [
            "T-shirt/top", "Trouser", "Pullover", "Dress", "Coat",
            "Sandal", "Shirt", "Sneaker", "Bag", "Ankle boot",
        ];
        ModelMetadata {
            description: Some("Fashion-MNIST clothing articles".to_owned()),
            class_names: Some(names.iter().map(|s| s.to_string()).collect()),
            normalize: None,
        }
    }

    /// Name of class `index`, falling back to the index itself.
    pub fn class_name(&self, index: usize) -> String {
        self.class_names
            .as_ref()
            .and_then(|names| names.get(index).cloned())
            .unwrap_or_else(|| index.to_string())
    }
}
