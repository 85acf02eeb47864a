//! Raw image files
//!
//! An image is every page of the array in row order, each page being the
//! main area followed by the OOB, like a raw NAND dump.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::vec;

use snand_core::chip::NandChip;
use thiserror::Error;

use crate::DummyNand;

/// Errors that can occur when loading or saving an image
#[derive(Debug, Error)]
pub enum ImageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Image size does not match the chip
    #[error("image is {actual} bytes, chip needs {expected}")]
    SizeMismatch {
        /// Size of a raw dump of the chip
        expected: u64,
        /// Size of the file
        actual: u64,
    },
}

impl DummyNand {
    /// Size in bytes of a raw image of this chip
    pub fn image_size(&self) -> u64 {
        self.total_rows() as u64 * self.raw_page_size() as u64
    }

    /// Create a chip whose array is loaded from `path`
    pub fn from_image(chip: NandChip, path: &Path) -> Result<Self, ImageError> {
        let mut nand = Self::new(chip);
        nand.load_image(path)?;
        Ok(nand)
    }

    /// Replace the array with the contents of `path`
    pub fn load_image(&mut self, path: &Path) -> Result<(), ImageError> {
        let file = File::open(path)?;
        let actual = file.metadata()?.len();
        let expected = self.image_size();
        if actual != expected {
            return Err(ImageError::SizeMismatch { expected, actual });
        }

        let mut reader = BufReader::new(file);
        let mut page = vec![0u8; self.raw_page_size()];
        self.array.clear();
        for row in 0..self.total_rows() {
            reader.read_exact(&mut page)?;
            if page.iter().any(|&b| b != 0xFF) {
                self.array.insert(row, page.clone());
            }
        }

        log::debug!(
            "loaded {} ({} programmed pages)",
            path.display(),
            self.array.len()
        );
        Ok(())
    }

    /// Write the array to `path`
    pub fn save_image(&self, path: &Path) -> Result<(), ImageError> {
        let mut writer = BufWriter::new(File::create(path)?);
        let erased = vec![0xFFu8; self.raw_page_size()];
        for row in 0..self.total_rows() {
            let page = self.array.get(&row).map_or(&erased[..], |p| &p[..]);
            writer.write_all(page)?;
        }
        writer.flush()?;
        Ok(())
    }
}
