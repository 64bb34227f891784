pub mod dense;
pub mod dropout;
pub mod mode;

pub use dense::{Layer, LayerCache};
pub use dropout::Dropout;
pub use mode::Mode;
