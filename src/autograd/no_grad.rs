use crate::error::Result;
use crate::layers::mode::Mode;
use crate::math::matrix::Matrix;
use crate::network::network::Network;

/// Scoped region with gradient tracking disabled.
///
/// Acquired through [`Network::no_grad`]. While the guard lives, forward
/// passes record no tape, and the network is reachable only through the
/// guard, which hands out shared references. Parameters therefore cannot be
/// stepped inside the scope. Dropping the guard restores the previous
/// tracking state on every exit path.
pub struct NoGrad<'a> {
    network: &'a mut Network,
    previous: bool,
}

impl<'a> NoGrad<'a> {
    pub(crate) fn new(network: &'a mut Network) -> NoGrad<'a> {
        let previous = network.set_grad_enabled(false);
        NoGrad { network, previous }
    }

    /// Untracked forward pass.
    pub fn forward(&mut self, input: &Matrix, mode: Mode) -> Result<Matrix> {
        self.network.forward(input, mode)
    }

    pub fn network(&self) -> &Network {
        self.network
    }
}

impl Drop for NoGrad<'_> {
    fn drop(&mut self) {
        self.network.set_grad_enabled(self.previous);
    }
}
