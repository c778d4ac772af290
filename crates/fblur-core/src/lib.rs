//! # fblur-core
//!
//! Core types shared by the fblur crates.
//!
//! - [`RgbImage`] - 8-bit, three channel image buffer
//! - [`Channel`] - channel selector (red, green, blue)
//! - [`Error`] / [`Result`] - error type for buffer operations
//!
//! ## Crate Structure
//!
//! ```text
//! fblur-core (this crate)
//!    ^
//!    +-- fblur-ops (frequency-domain convolution)
//!    +-- fblur-io  (PNG / JPEG)
//!    +-- fblur-cli (the `fblur` binary)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod image;

pub use error::{Error, Result};
pub use image::{Channel, RgbImage};
