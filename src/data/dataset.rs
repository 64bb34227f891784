use std::path::Path;

use log::info;
use serde::{Serialize, Deserialize};

use crate::data::idx::{parse_idx_pair, IdxImages};
use crate::error::{Error, Result};

/// Per-pixel normalization applied after scaling u8 pixels to `[0, 1]`:
/// `x' = (x - mean) / std`. The default maps pixels to `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalize {
    pub mean: f64,
    pub std: f64,
}

impl Default for Normalize {
    fn default() -> Self {
        Normalize { mean: 0.5, std: 0.5 }
    }
}

impl Normalize {
    pub fn identity() -> Normalize {
        Normalize { mean: 0.0, std: 1.0 }
    }

    #[inline]
    pub fn pixel(&self, raw: u8) -> f64 {
        (raw as f64 / 255.0 - self.mean) / self.std
    }
}

/// Which half of an MNIST-style dataset directory to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    fn file_names(self) -> (&'static str, &'static str) {
        match self {
            Split::Train => ("train-images-idx3-ubyte", "train-labels-idx1-ubyte"),
            Split::Test => ("t10k-images-idx3-ubyte", "t10k-labels-idx1-ubyte"),
        }
    }
}

/// In-memory labeled examples with flattened feature vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Vec<f64>,
    labels: Vec<usize>,
    n_features: usize,
    n_classes: usize,
}

impl Dataset {
    /// Builds a dataset from already flattened examples.
    pub fn from_examples(inputs: &[Vec<f64>], labels: &[usize], n_classes: usize) -> Result<Dataset> {
        if inputs.len() != labels.len() {
            return Err(Error::shape(
                "dataset",
                format!("{} labels", inputs.len()),
                format!("{} labels", labels.len()),
            ));
        }
        let n_features = inputs.first().map_or(0, |x| x.len());
        let mut features = Vec::with_capacity(inputs.len() * n_features);
        for (i, x) in inputs.iter().enumerate() {
            if x.len() != n_features {
                return Err(Error::shape(
                    "dataset example",
                    format!("{} features", n_features),
                    format!("{} features at example {}", x.len(), i),
                ));
            }
            features.extend_from_slice(x);
        }
        if let Some((index, &label)) = labels.iter().enumerate().find(|(_, l)| **l >= n_classes) {
            return Err(Error::LabelOutOfRange { index, label, n_classes });
        }
        Ok(Dataset { features, labels: labels.to_vec(), n_features, n_classes })
    }

    fn from_idx(images: IdxImages, labels: Vec<usize>, n_classes: usize, normalize: Normalize) -> Dataset {
        Dataset {
            features: images.pixels.iter().map(|&p| normalize.pixel(p)).collect(),
            labels,
            n_features: images.rows * images.cols,
            n_classes,
        }
    }

    /// Decodes an IDX image/label byte pair.
    pub fn from_idx_bytes(
        image_bytes: &[u8],
        label_bytes: &[u8],
        n_classes: usize,
        normalize: Normalize,
    ) -> Result<Dataset> {
        let (images, labels) = parse_idx_pair(image_bytes, label_bytes, n_classes)?;
        Ok(Dataset::from_idx(images, labels, n_classes, normalize))
    }

    /// Reads the standard MNIST file names for `split` from `dir`.
    pub fn load_dir(dir: impl AsRef<Path>, split: Split, normalize: Normalize) -> Result<Dataset> {
        let dir = dir.as_ref();
        let (images_name, labels_name) = split.file_names();
        let image_bytes = std::fs::read(dir.join(images_name))?;
        let label_bytes = std::fs::read(dir.join(labels_name))?;

        let dataset = Dataset::from_idx_bytes(&image_bytes, &label_bytes, 10, normalize)?;
        info!(
            "loaded {:?} split from {}: {} examples of {} features",
            split,
            dir.display(),
            dataset.len(),
            dataset.n_features()
        );
        Ok(dataset)
    }

    /// Keeps only the first `n` examples.
    pub fn truncate(&mut self, n: usize) {
        if n < self.len() {
            self.labels.truncate(n);
            self.features.truncate(n * self.n_features);
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn features(&self, index: usize) -> &[f64] {
        &self.features[index * self.n_features..(index + 1) * self.n_features]
    }

    pub fn label(&self, index: usize) -> usize {
        self.labels[index]
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Number of examples per class.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &label in &self.labels {
            counts[label] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::idx::tests::{image_file, label_file};

    #[test]
    fn default_normalization_maps_pixels_to_unit_interval_around_zero() {
        let n = Normalize::default();
        assert_eq!(n.pixel(0), -1.0);
        assert_eq!(n.pixel(255), 1.0);
        assert_eq!(Normalize::identity().pixel(255), 1.0);
    }

    #[test]
    fn decodes_idx_bytes_into_flat_examples() {
        let images = image_file(2, 1, 3, &[0, 255, 0, 255, 255, 255]);
        let labels = label_file(&[4, 9]);
        let ds = Dataset::from_idx_bytes(&images, &labels, 10, Normalize::identity()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.n_features(), 3);
        assert_eq!(ds.features(0), &[0.0, 1.0, 0.0]);
        assert_eq!(ds.features(1), &[1.0, 1.0, 1.0]);
        assert_eq!(ds.labels(), &[4, 9]);
    }

    #[test]
    fn load_dir_reads_standard_file_names() {
        let dir = std::env::temp_dir().join(format!("mlp-classify-idx-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("t10k-images-idx3-ubyte"), image_file(1, 2, 2, &[0, 0, 0, 255])).unwrap();
        std::fs::write(dir.join("t10k-labels-idx1-ubyte"), label_file(&[2])).unwrap();

        let ds = Dataset::load_dir(&dir, Split::Test, Normalize::default()).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(ds.len(), 1);
        assert_eq!(ds.features(0), &[-1.0, -1.0, -1.0, 1.0]);
        assert_eq!(ds.label(0), 2);
    }

    #[test]
    fn missing_files_surface_as_io_errors() {
        let err = Dataset::load_dir("/definitely/not/here", Split::Train, Normalize::default()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn from_examples_validates_labels_and_widths() {
        assert!(Dataset::from_examples(&[vec![0.0, 1.0]], &[3], 3).is_err());
        assert!(Dataset::from_examples(&[vec![0.0, 1.0], vec![1.0]], &[0, 1], 3).is_err());
        let mut ds = Dataset::from_examples(&[vec![0.0], vec![1.0], vec![2.0]], &[0, 1, 1], 2).unwrap();
        assert_eq!(ds.class_counts(), vec![1, 2]);
        ds.truncate(2);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.features(1), &[1.0]);
    }
}
