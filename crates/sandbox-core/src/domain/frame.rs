//! The greyscale raster projected onto the sand.
//!
//! Dimensions are configured once at startup and never change afterwards.
//! Pixels are stored row-major, one byte per pixel (`0` = black, `255` = white).

use thiserror::Error;

/// Errors produced when constructing a [`Frame`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Width or height is zero.
    #[error("frame dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// The pixel buffer does not hold exactly `width * height` bytes.
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    PixelCountMismatch { expected: usize, actual: usize },
}

/// A fixed-resolution single-channel image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    /// Creates an all-black frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::InvalidDimensions`] if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Result<Self, FrameError> {
        let len = pixel_count(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![0; len],
        })
    }

    /// Wraps an existing pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::InvalidDimensions`] for zero dimensions and
    /// [`FrameError::PixelCountMismatch`] if `pixels.len() != width * height`.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, FrameError> {
        let expected = pixel_count(width, height)?;
        if pixels.len() != expected {
            return Err(FrameError::PixelCountMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major pixel bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Returns the pixel at `(x, y)`, or `None` outside the frame.
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).copied()
    }

    /// Sets the pixel at `(x, y)`.  Writes outside the frame are ignored.
    pub fn set(&mut self, x: u32, y: u32, value: u8) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.index(x, y);
        self.pixels[i] = value;
    }

    /// Sets every pixel to `value`.
    pub fn fill(&mut self, value: u8) {
        self.pixels.fill(value);
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

fn pixel_count(width: u32, height: u32) -> Result<usize, FrameError> {
    if width == 0 || height == 0 {
        return Err(FrameError::InvalidDimensions { width, height });
    }
    Ok(width as usize * height as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_frame_is_black() {
        let frame = Frame::new(4, 3).expect("valid dimensions");
        assert_eq!(frame.pixels().len(), 12);
        assert!(frame.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_new_frame_rejects_zero_dimension() {
        assert_eq!(
            Frame::new(0, 1080),
            Err(FrameError::InvalidDimensions {
                width: 0,
                height: 1080
            })
        );
    }

    #[test]
    fn test_from_pixels_rejects_wrong_length() {
        // Arrange / Act
        let result = Frame::from_pixels(2, 2, vec![0; 3]);

        // Assert
        assert_eq!(
            result,
            Err(FrameError::PixelCountMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_set_and_get_use_row_major_layout() {
        // Arrange
        let mut frame = Frame::new(3, 2).unwrap();

        // Act
        frame.set(2, 1, 200);

        // Assert
        assert_eq!(frame.get(2, 1), Some(200));
        assert_eq!(frame.pixels()[5], 200);
    }

    #[test]
    fn test_out_of_bounds_access_is_ignored() {
        let mut frame = Frame::new(2, 2).unwrap();
        frame.set(5, 5, 1);
        assert_eq!(frame.get(2, 0), None);
        assert!(frame.pixels().iter().all(|&p| p == 0));
    }
}
