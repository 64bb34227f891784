use std::fs;
use std::path::PathBuf;

use mlp_classify::{DataLoader, Dataset, Error, Normalize, Split};

fn image_file(count: u32, rows: u32, cols: u32, pixels: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0x00, 0x00, 0x08, 0x03];
    bytes.extend_from_slice(&count.to_be_bytes());
    bytes.extend_from_slice(&rows.to_be_bytes());
    bytes.extend_from_slice(&cols.to_be_bytes());
    bytes.extend_from_slice(pixels);
    bytes
}

fn label_file(labels: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0x00, 0x00, 0x08, 0x01];
    bytes.extend_from_slice(&(labels.len() as u32).to_be_bytes());
    bytes.extend_from_slice(labels);
    bytes
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mlp-classify-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn loads_both_splits_from_a_directory() {
    let dir = scratch_dir("splits");
    let train_pixels: Vec<u8> = (0..5 * 4).map(|i| (i * 12) as u8).collect();
    fs::write(dir.join("train-images-idx3-ubyte"), image_file(5, 2, 2, &train_pixels)).unwrap();
    fs::write(dir.join("train-labels-idx1-ubyte"), label_file(&[0, 1, 2, 3, 9])).unwrap();
    fs::write(dir.join("t10k-images-idx3-ubyte"), image_file(2, 2, 2, &[255; 8])).unwrap();
    fs::write(dir.join("t10k-labels-idx1-ubyte"), label_file(&[4, 4])).unwrap();

    let mut train = Dataset::load_dir(&dir, Split::Train, Normalize::default()).unwrap();
    let test = Dataset::load_dir(&dir, Split::Test, Normalize::default()).unwrap();
    fs::remove_dir_all(&dir).ok();

    assert_eq!((train.len(), train.n_features(), train.n_classes()), (5, 4, 10));
    assert_eq!(train.features(0)[0], -1.0);
    assert_eq!(train.labels(), &[0, 1, 2, 3, 9]);
    assert!(test.features(1).iter().all(|&x| x == 1.0));

    train.truncate(3);
    assert_eq!(train.len(), 3);
    let mut loader = DataLoader::new(&train, 2, true, 7).unwrap();
    let sizes: Vec<usize> = loader.batches().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![2, 1]);
}

#[test]
fn missing_files_are_io_errors() {
    let dir = scratch_dir("missing");
    let err = Dataset::load_dir(&dir, Split::Test, Normalize::default()).unwrap_err();
    fs::remove_dir_all(&dir).ok();
    assert!(matches!(err, Error::Io(_)));
}
