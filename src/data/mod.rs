//! Labeled image datasets and the batch source the training loop consumes.

pub mod dataset;
pub mod idx;
pub mod loader;

pub use dataset::{Dataset, Normalize, Split};
pub use idx::parse_idx_pair;
pub use loader::{Batch, Batches, DataLoader};
