//! 8-bit RGB image buffer.
//!
//! # Memory Layout
//!
//! Pixels are stored **row-major**, top-to-bottom, channels interleaved:
//!
//! ```text
//! Memory: [R G B R G B R G B ...]  <- Row 0
//!         [R G B R G B R G B ...]  <- Row 1
//!         ...
//! ```
//!
//! # Usage
//!
//! ```rust
//! use fblur_core::{Channel, RgbImage};
//!
//! let mut img = RgbImage::filled(64, 64, [128, 128, 128]);
//! img.set_channel(3, 4, Channel::Red, 255);
//!
//! assert_eq!(img.pixel(3, 4), [255, 128, 128]);
//! assert_eq!(img.channel(3, 4, Channel::Green), 128);
//! ```

use crate::{Error, Result};

/// Number of channels per pixel.
pub const CHANNELS: usize = 3;

/// Color channel selector.
///
/// The discriminant is the channel's offset inside a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Red channel (offset 0)
    Red = 0,
    /// Green channel (offset 1)
    Green = 1,
    /// Blue channel (offset 2)
    Blue = 2,
}

impl Channel {
    /// All channels in storage order.
    pub const ALL: [Channel; CHANNELS] = [Channel::Red, Channel::Green, Channel::Blue];

    /// Offset of this channel inside a pixel.
    #[inline]
    pub const fn offset(self) -> usize {
        self as usize
    }

    /// Short lowercase name, used in log output.
    pub const fn name(self) -> &'static str {
        match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
        }
    }
}

/// Owned 8-bit RGB image.
///
/// The dimensions are fixed for the lifetime of the buffer; only pixel
/// contents may change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl RgbImage {
    /// Creates a black image.
    ///
    /// # Panics
    ///
    /// Panics if `width * height * 3` overflows `usize` or the buffer
    /// cannot be allocated. Use [`RgbImage::from_raw`] for a fallible
    /// constructor.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0, 0, 0])
    }

    /// Creates an image with every pixel set to `pixel`.
    ///
    /// ```rust
    /// use fblur_core::RgbImage;
    ///
    /// let gray = RgbImage::filled(4, 2, [10, 20, 30]);
    /// assert_eq!(gray.pixel(3, 1), [10, 20, 30]);
    /// ```
    ///
    /// # Panics
    ///
    /// Same conditions as [`RgbImage::new`].
    pub fn filled(width: u32, height: u32, pixel: [u8; CHANNELS]) -> Self {
        // saturates so that `repeat` reports the overflow
        let count = (width as usize).saturating_mul(height as usize);
        let data = pixel.repeat(count);
        Self {
            data,
            width,
            height,
        }
    }

    /// Wraps an interleaved RGB buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferSize`] if `data.len() != width * height * 3`,
    /// or [`Error::InvalidDimensions`] if that product overflows.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(CHANNELS))
            .ok_or_else(|| Error::invalid_dimensions(width, height, "buffer size overflows"))?;
        if data.len() != expected {
            return Err(Error::BufferSize {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Raw interleaved pixel data.
    #[inline]
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    /// Returns the pixel at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if (x, y) is out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; CHANNELS] {
        let o = self.offset(x, y);
        [self.data[o], self.data[o + 1], self.data[o + 2]]
    }

    /// Sets the pixel at (x, y).
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: [u8; CHANNELS]) {
        let o = self.offset(x, y);
        self.data[o..o + CHANNELS].copy_from_slice(&pixel);
    }

    /// Reads a single channel value.
    #[inline]
    pub fn channel(&self, x: u32, y: u32, channel: Channel) -> u8 {
        self.data[self.offset(x, y) + channel.offset()]
    }

    /// Writes a single channel value, leaving the other channels untouched.
    #[inline]
    pub fn set_channel(&mut self, x: u32, y: u32, channel: Channel, value: u8) {
        let o = self.offset(x, y) + channel.offset();
        self.data[o] = value;
    }
}
