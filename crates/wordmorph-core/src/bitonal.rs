//! Bitonal word-image container
//!
//! `BitonalImage` is the image type every other crate in the workspace
//! operates on. Pixels are stored as one byte each in row-major order;
//! ink is the zero byte and background is any non-zero byte (0xFF when
//! written by this library).
//!
//! Word metadata (binarization threshold, transcription label, page number,
//! author id) travels on the image itself so that training and test sets can
//! be shuffled through the pipeline without a side table.
//!
//! # Ownership model
//!
//! Images are immutable for the duration of a comparison; the matching
//! engines only ever borrow `&BitonalImage`. The `&mut` builder methods
//! exist for loaders and test fixtures, not for mid-comparison mutation.

use crate::error::{Error, Result};

/// Pixel value used for ink (foreground).
pub const INK: u8 = 0x00;

/// Pixel value used for background when this library writes pixels.
pub const BACKGROUND: u8 = 0xFF;

/// A bitonal word image with optional word metadata.
#[derive(Debug, Clone)]
pub struct BitonalImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
    threshold: Option<u32>,
    label: Option<String>,
    page: Option<u32>,
    author_id: Option<String>,
}

impl BitonalImage {
    /// Create a new image filled with background.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if width or height is 0.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        Ok(BitonalImage {
            width,
            height,
            data: vec![BACKGROUND; width as usize * height as usize],
            threshold: None,
            label: None,
            page: None,
            author_id: None,
        })
    }

    /// Create an image from a raw row-major pixel buffer.
    ///
    /// Any non-zero byte is treated as background. The buffer length must be
    /// exactly `width * height`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] for zero dimensions and
    /// [`Error::BufferSizeMismatch`] for a wrong-sized buffer.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(BitonalImage {
            width,
            height,
            data,
            threshold: None,
            label: None,
            page: None,
            author_id: None,
        })
    }

    /// Get the image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get raw access to the pixel buffer (row-major, one byte per pixel).
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the pixel value at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        assert!(x < self.width && y < self.height);
        self.data[(y * self.width + x) as usize]
    }

    /// Check whether the pixel at (x, y) is ink.
    #[inline]
    pub fn is_ink(&self, x: u32, y: u32) -> bool {
        self.pixel(x, y) == INK
    }

    /// Set a single pixel. Builder/fixture helper.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] for out-of-range coordinates.
    pub fn set_pixel(&mut self, x: u32, y: u32, value: u8) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::IndexOutOfBounds {
                index: (y as usize) * self.width as usize + x as usize,
                len: self.data.len(),
            });
        }
        self.data[(y * self.width + x) as usize] = value;
        Ok(())
    }

    /// Fill a rectangle with a pixel value, clipped to the image bounds.
    /// Builder/fixture helper.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, value: u8) {
        let x1 = (x + w).min(self.width);
        let y1 = (y + h).min(self.height);
        for yy in y.min(self.height)..y1 {
            let row = (yy * self.width) as usize;
            for xx in x..x1 {
                self.data[row + xx as usize] = value;
            }
        }
    }

    /// Count the ink pixels in the image.
    pub fn ink_count(&self) -> usize {
        self.data.iter().filter(|&&p| p == INK).count()
    }

    /// Verify that every pixel is either [`INK`] or [`BACKGROUND`].
    ///
    /// Loaders call this after thresholding; the matching engines assume it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotBitonal`] naming the first offending pixel.
    pub fn check_bitonal(&self) -> Result<()> {
        for (i, &p) in self.data.iter().enumerate() {
            if p != INK && p != BACKGROUND {
                return Err(Error::NotBitonal {
                    x: (i % self.width as usize) as u32,
                    y: (i / self.width as usize) as u32,
                    value: p,
                });
            }
        }
        Ok(())
    }

    /// Get the binarization threshold, if recorded.
    #[inline]
    pub fn threshold(&self) -> Option<u32> {
        self.threshold
    }

    /// Set the binarization threshold.
    pub fn set_threshold(&mut self, threshold: Option<u32>) {
        self.threshold = threshold;
    }

    /// Get the transcription label, if recorded.
    #[inline]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Set the transcription label.
    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    /// Get the source page number, if recorded.
    #[inline]
    pub fn page(&self) -> Option<u32> {
        self.page
    }

    /// Set the source page number.
    pub fn set_page(&mut self, page: Option<u32>) {
        self.page = page;
    }

    /// Get the author id, if recorded.
    #[inline]
    pub fn author_id(&self) -> Option<&str> {
        self.author_id.as_deref()
    }

    /// Set the author id.
    pub fn set_author_id(&mut self, author_id: Option<String>) {
        self.author_id = author_id;
    }

    /// Get the transcription label or fail with a [`Error::MissingMetadata`]
    /// naming the image by `image_id`.
    ///
    /// The classification pipeline requires every training and test word to
    /// carry a label; this is the fail-fast accessor it uses.
    pub fn require_label(&self, image_id: &str) -> Result<&str> {
        self.label.as_deref().ok_or_else(|| Error::MissingMetadata {
            image: image_id.to_string(),
            field: "label".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_fills_background() {
        let img = BitonalImage::new(10, 5).unwrap();
        assert_eq!(img.width(), 10);
        assert_eq!(img.height(), 5);
        assert_eq!(img.ink_count(), 0);
        assert!(!img.is_ink(3, 2));
    }

    #[test]
    fn test_new_invalid() {
        assert!(BitonalImage::new(0, 5).is_err());
        assert!(BitonalImage::new(5, 0).is_err());
    }

    #[test]
    fn test_from_raw_size_check() {
        assert!(BitonalImage::from_raw(4, 4, vec![0u8; 15]).is_err());
        assert!(BitonalImage::from_raw(4, 4, vec![0u8; 16]).is_ok());
    }

    #[test]
    fn test_fill_rect_and_ink_count() {
        let mut img = BitonalImage::new(20, 10).unwrap();
        img.fill_rect(2, 3, 5, 4, INK);
        assert_eq!(img.ink_count(), 20);
        assert!(img.is_ink(2, 3));
        assert!(img.is_ink(6, 6));
        assert!(!img.is_ink(7, 3));
        // clipping
        img.fill_rect(18, 8, 10, 10, INK);
        assert_eq!(img.ink_count(), 20 + 4);
    }

    #[test]
    fn test_check_bitonal() {
        let mut img = BitonalImage::new(4, 4).unwrap();
        assert!(img.check_bitonal().is_ok());
        img.set_pixel(1, 2, 128).unwrap();
        match img.check_bitonal() {
            Err(Error::NotBitonal { x, y, value }) => {
                assert_eq!((x, y, value), (1, 2, 128));
            }
            other => panic!("expected NotBitonal, got {other:?}"),
        }
    }

    #[test]
    fn test_require_label() {
        let mut img = BitonalImage::new(4, 4).unwrap();
        assert!(img.require_label("w_00000001").is_err());
        img.set_label(Some("orders".to_string()));
        assert_eq!(img.require_label("w_00000001").unwrap(), "orders");
    }
}
