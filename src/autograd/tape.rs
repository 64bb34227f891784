use crate::layers::dense::LayerCache;

/// Per-layer caches of a single tracked forward pass, input to output.
#[derive(Debug, Clone)]
pub struct Tape {
    pub(crate) caches: Vec<LayerCache>,
    pub(crate) output_shape: (usize, usize),
}

impl Tape {
    pub(crate) fn new(caches: Vec<LayerCache>, output_shape: (usize, usize)) -> Tape {
        Tape { caches, output_shape }
    }

    pub fn output_shape(&self) -> (usize, usize) {
        self.output_shape
    }

    pub fn len(&self) -> usize {
        self.caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
}
