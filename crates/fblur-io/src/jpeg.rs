//! JPEG format support.
//!
//! Decoding handles RGB, 8 and 16 bit grayscale and CMYK input, all
//! converted to 8-bit RGB. Encoding always writes RGB at the configured
//! quality.

use crate::{IoError, IoResult};
use fblur_core::RgbImage;
use std::io::BufReader;
use std::path::Path;

/// Options for writing JPEG files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegWriterOptions {
    /// Quality level 1-100. Default: 90.
    pub quality: u8,
}

impl Default for JpegWriterOptions {
    fn default() -> Self {
        Self { quality: 90 }
    }
}

/// Reads a JPEG file as 8-bit RGB.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<RgbImage> {
    let bytes = std::fs::read(path.as_ref())?;
    read_from_memory(&bytes)
}

/// Decodes JPEG bytes as 8-bit RGB.
pub fn read_from_memory(data: &[u8]) -> IoResult<RgbImage> {
    let mut decoder = jpeg_decoder::Decoder::new(BufReader::new(data));
    let pixels = decoder
        .decode()
        .map_err(|e| IoError::DecodeError(e.to_string()))?;
    let info = decoder
        .info()
        .ok_or_else(|| IoError::DecodeError("missing JPEG info".into()))?;

    let rgb: Vec<u8> = match info.pixel_format {
        jpeg_decoder::PixelFormat::RGB24 => pixels,
        jpeg_decoder::PixelFormat::L8 => pixels.iter().flat_map(|&g| [g, g, g]).collect(),
        jpeg_decoder::PixelFormat::L16 => rgb_from_l16(&pixels),
        jpeg_decoder::PixelFormat::CMYK32 => rgb_from_cmyk(&pixels),
    };

    Ok(RgbImage::from_raw(info.width as u32, info.height as u32, rgb)?)
}

/// Big-endian 16-bit luminance to RGB, keeping the high byte.
fn rgb_from_l16(pixels: &[u8]) -> Vec<u8> {
    pixels
        .chunks_exact(2)
        .flat_map(|l16| [l16[0], l16[0], l16[0]])
        .collect()
}

/// Plain (non-inverted) CMYK to RGB.
fn rgb_from_cmyk(pixels: &[u8]) -> Vec<u8> {
    pixels
        .chunks_exact(4)
        .flat_map(|cmyk| {
            let k = 1.0 - cmyk[3] as f32 / 255.0;
            let ink = |v: u8| ((1.0 - v as f32 / 255.0) * k * 255.0).round() as u8;
            [ink(cmyk[0]), ink(cmyk[1]), ink(cmyk[2])]
        })
        .collect()
}

/// Writes an image as JPEG.
pub fn write_with_options<P: AsRef<Path>>(
    path: P,
    image: &RgbImage,
    options: &JpegWriterOptions,
) -> IoResult<()> {
    let data = write_to_memory(image, options)?;
    std::fs::write(path.as_ref(), data)?;
    Ok(())
}

/// Encodes an image to JPEG bytes.
pub fn write_to_memory(image: &RgbImage, options: &JpegWriterOptions) -> IoResult<Vec<u8>> {
    let (width, height) = image.dimensions();
    let (w, h) = match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(IoError::EncodeError(format!(
                "{}x{} exceeds JPEG limit of 65535 pixels per side",
                width, height
            )))
        }
    };

    let mut buffer = Vec::new();
    let encoder = jpeg_encoder::Encoder::new(&mut buffer, options.quality);
    encoder
        .encode(image.as_raw(), w, h, jpeg_encoder::ColorType::Rgb)
        .map_err(|e: jpeg_encoder::EncodingError| IoError::EncodeError(e.to_string()))?;
    Ok(buffer)
}
