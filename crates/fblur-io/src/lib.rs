//! # fblur-io
//!
//! Loading and saving of 8-bit RGB images.
//!
//! | Format | Read | Write | Input depths |
//! |--------|------|-------|--------------|
//! | PNG | Yes | Yes | 1-16 bit gray, gray+alpha, RGB, RGBA, palette |
//! | JPEG | Yes | Yes | 8 bit RGB, 8/16 bit gray, CMYK |
//!
//! Alpha channels are dropped on load. Output is always 8-bit RGB.
//!
//! # Example
//!
//! ```rust,ignore
//! use fblur_io::{read, write};
//!
//! let image = read("image.jpg")?;
//! write("blurred.png", &image)?;
//! ```
//!
//! # Feature Flags
//!
//! - `png` - PNG support (default)
//! - `jpeg` - JPEG support (default)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod detect;
mod error;

#[cfg(feature = "png")]
pub mod png;

#[cfg(feature = "jpeg")]
pub mod jpeg;

pub use detect::Format;
pub use error::{IoError, IoResult};

use fblur_core::RgbImage;
use std::path::Path;
use tracing::debug;

/// Reads an image, detecting the format from magic bytes, then extension.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, the format is not
/// supported or the data is corrupted.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<RgbImage> {
    let path = path.as_ref();
    let format = Format::detect(path)?;
    debug!(path = %path.display(), ?format, "reading image");

    match format {
        #[cfg(feature = "png")]
        Format::Png => png::read(path),

        #[cfg(feature = "jpeg")]
        Format::Jpeg => jpeg::read(path),

        _ => Err(unsupported(path)),
    }
}

/// Encoder settings for [`write_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// JPEG quality 1-100, ignored for PNG. Default: 90.
    pub quality: u8,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { quality: 90 }
    }
}

/// Writes an image, choosing the format from the file extension.
pub fn write<P: AsRef<Path>>(path: P, image: &RgbImage) -> IoResult<()> {
    write_with_options(path, image, &WriteOptions::default())
}

/// Like [`write`], with explicit encoder settings.
pub fn write_with_options<P: AsRef<Path>>(
    path: P,
    image: &RgbImage,
    options: &WriteOptions,
) -> IoResult<()> {
    let path = path.as_ref();
    let format = Format::from_extension(path);
    debug!(
        path = %path.display(),
        ?format,
        width = image.width(),
        height = image.height(),
        "writing image"
    );

    #[cfg(not(feature = "jpeg"))]
    let _ = options;

    match format {
        #[cfg(feature = "png")]
        Format::Png => png::write(path, image),

        #[cfg(feature = "jpeg")]
        Format::Jpeg => jpeg::write_with_options(
            path,
            image,
            &jpeg::JpegWriterOptions {
                quality: options.quality,
            },
        ),

        _ => Err(unsupported(path)),
    }
}

fn unsupported(path: &Path) -> IoError {
    IoError::UnsupportedFormat(
        path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or("unknown")
            .to_string(),
    )
}
