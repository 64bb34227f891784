//! Parse a pair of IDX binary files (image + label) as used by MNIST and its
//! derivatives (Fashion-MNIST, EMNIST, …).
//!
//! # IDX3 image file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x03        (number of dimensions = 3)
//! bytes  4-7:   N           (number of images, big-endian u32)
//! bytes  8-11:  rows        (image height in pixels, big-endian u32)
//! bytes 12-15:  cols        (image width in pixels, big-endian u32)
//! bytes 16..:   N * rows * cols bytes, row-major, uint8
//! ```
//!
//! # IDX1 label file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x01        (number of dimensions = 1)
//! bytes  4-7:   N           (number of labels, big-endian u32)
//! bytes  8..:   N bytes, each a class index in [0, n_classes)
//! ```

use crate::error::{Error, Result};

/// Raw decoded image file: `count` images of `rows × cols` u8 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct IdxImages {
    pub count: usize,
    pub rows: usize,
    pub cols: usize,
    pub pixels: Vec<u8>,
}

fn be_u32(bytes: &[u8], at: usize) -> usize {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as usize
}

fn check_magic(bytes: &[u8], dims: u8, what: &str) -> Result<()> {
    if bytes[0] != 0x00 || bytes[1] != 0x00 {
        return Err(Error::Idx(format!(
            "{} file: bytes 0-1 must be 0x00 0x00 (reserved), got 0x{:02X} 0x{:02X}",
            what, bytes[0], bytes[1]
        )));
    }
    if bytes[2] != 0x08 {
        return Err(Error::Idx(format!(
            "{} file: byte 2 (dtype) must be 0x08 (uint8), got 0x{:02X}",
            what, bytes[2]
        )));
    }
    if bytes[3] != dims {
        return Err(Error::Idx(format!(
            "{} file: byte 3 (dimensions) must be {}, got {}",
            what, dims, bytes[3]
        )));
    }
    Ok(())
}

pub fn parse_idx_images(image_bytes: &[u8]) -> Result<IdxImages> {
    if image_bytes.len() < 16 {
        return Err(Error::Idx(format!(
            "image file too short: expected at least 16 header bytes, got {}",
            image_bytes.len()
        )));
    }
    check_magic(image_bytes, 0x03, "image")?;

    let count = be_u32(image_bytes, 4);
    let rows = be_u32(image_bytes, 8);
    let cols = be_u32(image_bytes, 12);

    let n_pixels = rows.checked_mul(cols).ok_or_else(|| {
        Error::Idx(format!("image file: rows * cols overflows (rows={}, cols={})", rows, cols))
    })?;
    let data_len = count.checked_mul(n_pixels).ok_or_else(|| {
        Error::Idx(format!("image file: count * pixels overflows (count={}, pixels={})", count, n_pixels))
    })?;

    if image_bytes.len() < 16 + data_len {
        return Err(Error::Idx(format!(
            "image file too short: header declares {} images of {}×{} pixels \
             ({} data bytes), but file is only {} bytes total",
            count, rows, cols, data_len, image_bytes.len()
        )));
    }

    Ok(IdxImages {
        count,
        rows,
        cols,
        pixels: image_bytes[16..16 + data_len].to_vec(),
    })
}

pub fn parse_idx_labels(label_bytes: &[u8], n_classes: usize) -> Result<Vec<usize>> {
    if label_bytes.len() < 8 {
        return Err(Error::Idx(format!(
            "label file too short: expected at least 8 header bytes, got {}",
            label_bytes.len()
        )));
    }
    check_magic(label_bytes, 0x01, "label")?;

    let count = be_u32(label_bytes, 4);
    if label_bytes.len() < 8 + count {
        return Err(Error::Idx(format!(
            "label file too short: header declares {} labels but file is only {} bytes",
            count, label_bytes.len()
        )));
    }

    label_bytes[8..8 + count]
        .iter()
        .enumerate()
        .map(|(i, &class)| {
            let class = class as usize;
            if class >= n_classes {
                Err(Error::Idx(format!(
                    "label at index {}: class {} is out of range for {} classes",
                    i, class, n_classes
                )))
            } else {
                Ok(class)
            }
        })
        .collect()
}

/// Decodes and cross-checks an image/label file pair.
pub fn parse_idx_pair(
    image_bytes: &[u8],
    label_bytes: &[u8],
    n_classes: usize,
) -> Result<(IdxImages, Vec<usize>)> {
    if n_classes < 2 {
        return Err(Error::InvalidConfig(format!("n_classes must be at least 2, got {}", n_classes)));
    }
    let images = parse_idx_images(image_bytes)?;
    let labels = parse_idx_labels(label_bytes, n_classes)?;

    if labels.len() != images.count {
        return Err(Error::Idx(format!(
            "file mismatch: image file declares {} items but label file declares {}",
            images.count,
            labels.len()
        )));
    }
    Ok((images, labels))
}
