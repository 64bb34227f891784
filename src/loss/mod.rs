pub mod cross_entropy;
pub mod loss_fn;
pub mod loss_type;
pub mod nll;

pub use cross_entropy::CrossEntropyLoss;
pub use loss_fn::Loss;
pub use loss_type::LossType;
pub use nll::NllLoss;
