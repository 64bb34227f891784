//! Error type shared by every fallible operation in the crate.

use thiserror::Error;

/// Everything that can go wrong while building, training or evaluating a
/// network.
#[derive(Debug, Error)]
pub enum Error {
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: String,
        actual: String,
    },

    #[error("label {label} at batch position {index} is out of range for {n_classes} classes")]
    LabelOutOfRange {
        index: usize,
        label: usize,
        n_classes: usize,
    },

    #[error("batch is empty")]
    EmptyBatch,

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("backward called without a tracked forward pass")]
    NoTape,

    #[error("optimizer step requested but no gradients were computed since the last zero_grad")]
    NoGradients,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed IDX file: {0}")]
    Idx(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn shape(
        context: &'static str,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Error {
        Error::ShapeMismatch {
            context,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}
