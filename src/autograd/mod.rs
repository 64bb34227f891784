//! Gradient bookkeeping for `Network`.
//!
//! A tracked forward pass records a [`Tape`]; `Network::backward` consumes it
//! and adds into the network's [`Gradients`] store, which only
//! `Network::zero_grad` clears. [`NoGrad`] disables tracking for a scope.

pub mod gradients;
pub mod no_grad;
pub mod tape;

pub use gradients::{Gradients, LayerGrads};
pub use no_grad::NoGrad;
pub use tape::Tape;
