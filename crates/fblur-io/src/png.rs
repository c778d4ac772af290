//! PNG format support.
//!
//! Reading accepts 8 and 16 bit gray, gray+alpha, RGB and RGBA, plus
//! palette and low bit depth images (expanded by the decoder). Alpha is
//! dropped, gray is replicated to RGB and 16 bit samples keep their high
//! byte. Writing produces 8 bit RGB with an sRGB chunk.
//!
//! # Example
//!
//! ```rust,ignore
//! use fblur_io::png::{read, write};
//!
//! let image = read("input.png")?;
//! write("output.png", &image)?;
//! ```

use crate::{IoError, IoResult};
use fblur_core::RgbImage;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Reads a PNG file as 8-bit RGB.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<RgbImage> {
    let file = File::open(path.as_ref())?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(png::Transformations::EXPAND);
    let mut reader = decoder
        .read_info()
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("cannot determine output buffer size".into()))?;
    let mut buf = vec![0u8; buf_size];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;
    let raw = &buf[..info.buffer_size()];

    let bytes_per_sample = match info.bit_depth {
        png::BitDepth::Eight => 1,
        png::BitDepth::Sixteen => 2,
        depth => {
            return Err(IoError::UnsupportedBitDepth(format!(
                "{:?} {:?}",
                info.color_type, depth
            )))
        }
    };
    let samples_per_pixel = match info.color_type {
        png::ColorType::Grayscale => 1,
        png::ColorType::GrayscaleAlpha => 2,
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        color_type => {
            return Err(IoError::UnsupportedBitDepth(format!(
                "{:?} {:?}",
                color_type, info.bit_depth
            )))
        }
    };

    // 16-bit samples are big-endian: the first byte is the high byte.
    let stride = samples_per_pixel * bytes_per_sample;
    let sample = |px: &[u8], i: usize| px[i * bytes_per_sample];
    let rgb: Vec<u8> = raw
        .chunks_exact(stride)
        .flat_map(|px| {
            if samples_per_pixel < 3 {
                let g = sample(px, 0);
                [g, g, g]
            } else {
                [sample(px, 0), sample(px, 1), sample(px, 2)]
            }
        })
        .collect();

    Ok(RgbImage::from_raw(info.width, info.height, rgb)?)
}

/// Writes an image as 8-bit RGB PNG.
pub fn write<P: AsRef<Path>>(path: P, image: &RgbImage) -> IoResult<()> {
    let file = File::create(path.as_ref())?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::default());
    encoder.set_source_srgb(png::SrgbRenderingIntent::Perceptual);

    let mut png_writer = encoder
        .write_header()
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    png_writer
        .write_image_data(image.as_raw())
        .map_err(|e| IoError::EncodeError(e.to_string()))?;

    Ok(())
}
