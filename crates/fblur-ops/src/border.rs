//! Border handling for the convolution canvas.
//!
//! Frequency-domain convolution is circular: a wide kernel near the right
//! edge picks up pixels from the left edge. [`BorderPolicy::Reflect`] pads
//! the working canvas on every side and fills the padding with a mirrored
//! copy of the image, so the wrapped samples come from nearby content
//! instead of the opposite edge.
//!
//! ```text
//!   canvas x:   0 .. b-1 | b .. b+w-1 | b+w .. w+2b-1
//!   source x:   b .. 1   | 0 .. w-1   | w-1 .. w-b
//! ```
//!
//! The near edge mirrors around the first pixel (the edge pixel is not
//! repeated), the far edge mirrors with the edge pixel repeated.
//! [`BorderPolicy::None`] is used for small kernels where wraparound error
//! is negligible: the canvas equals the image.

use crate::{OpsError, OpsResult};

/// Default padding for wide-support kernels.
pub const DEFAULT_BORDER: usize = 100;

/// How the working canvas is extended beyond the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderPolicy {
    /// Canvas equals the image; edges wrap around.
    None,
    /// Canvas is padded by `size` on every side with mirrored pixels.
    Reflect {
        /// Padding on each side, in pixels
        size: usize,
    },
}

impl Default for BorderPolicy {
    fn default() -> Self {
        BorderPolicy::Reflect {
            size: DEFAULT_BORDER,
        }
    }
}

impl BorderPolicy {
    /// Padding on each side.
    #[inline]
    pub fn size(&self) -> usize {
        match *self {
            BorderPolicy::None => 0,
            BorderPolicy::Reflect { size } => size,
        }
    }

    /// Canvas dimensions for an image of `width x height`.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidDimensions`] for a zero-area image or if the
    /// padded size overflows.
    pub fn canvas_size(&self, width: usize, height: usize) -> OpsResult<(usize, usize)> {
        if width == 0 || height == 0 {
            return Err(OpsError::InvalidDimensions(format!(
                "image {}x{} has zero area",
                width, height
            )));
        }
        let pad = self
            .size()
            .checked_mul(2)
            .ok_or_else(|| OpsError::InvalidDimensions("border size overflows".into()))?;
        let grow = |n: usize| {
            n.checked_add(pad)
                .filter(|&v| v <= isize::MAX as usize)
                .ok_or_else(|| {
                    OpsError::InvalidDimensions(format!(
                        "image {}x{} with border {} overflows",
                        width,
                        height,
                        self.size()
                    ))
                })
        };
        Ok((grow(width)?, grow(height)?))
    }

    /// Resolves one canvas coordinate to a source coordinate along an axis
    /// of `len` image pixels.
    ///
    /// For a border wider than the image, the mirror is applied repeatedly
    /// until the coordinate lands inside `0..len`.
    ///
    /// ```rust
    /// use fblur_ops::BorderPolicy;
    ///
    /// let policy = BorderPolicy::Reflect { size: 3 };
    /// // canvas 0..16 for a 10 pixel axis
    /// let mapped: Vec<usize> = (0..16).map(|x| policy.resolve_axis(x, 10)).collect();
    /// assert_eq!(mapped, [3, 2, 1, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 9, 8, 7]);
    /// ```
    pub fn resolve_axis(&self, coord: usize, len: usize) -> usize {
        debug_assert!(len > 0);
        match *self {
            BorderPolicy::None => coord.min(len - 1),
            BorderPolicy::Reflect { size } => {
                let b = size as isize;
                let len = len as isize;
                let canvas = len + 2 * b;
                let c = coord as isize;

                let mut n = c - b;
                if c < b {
                    n = (c - b).abs();
                }
                if c > canvas - 1 - b {
                    n = 2 * canvas - 3 * b - 1 - c;
                }
                // Borders wider than the image need more than one fold.
                while n < 0 || n >= len {
                    n = if n < 0 { -n } else { 2 * len - 1 - n };
                }
                n as usize
            }
        }
    }
}

/// Precomputed per-axis source lookup for one image size.
///
/// Built once per pipeline and indexed per canvas row and column during
/// population.
#[derive(Debug, Clone)]
pub struct BorderMap {
    policy: BorderPolicy,
    xs: Vec<u32>,
    ys: Vec<u32>,
}

impl BorderMap {
    /// Builds the lookup tables for an image of `width x height`.
    pub fn new(policy: BorderPolicy, width: u32, height: u32) -> OpsResult<Self> {
        let (w, h) = (width as usize, height as usize);
        let (cw, ch) = policy.canvas_size(w, h)?;
        let xs = (0..cw).map(|x| policy.resolve_axis(x, w) as u32).collect();
        let ys = (0..ch).map(|y| policy.resolve_axis(y, h) as u32).collect();
        Ok(Self {
            policy,
            xs,
            ys,
        })
    }

    /// Padding on each side.
    #[inline]
    pub fn border(&self) -> usize {
        self.policy.size()
    }

    /// Canvas dimensions.
    #[inline]
    pub fn canvas_size(&self) -> (usize, usize) {
        (self.xs.len(), self.ys.len())
    }

    /// Source column for a canvas column.
    #[inline]
    pub fn source_x(&self, x: usize) -> u32 {
        self.xs[x]
    }

    /// Source row for a canvas row.
    #[inline]
    pub fn source_y(&self, y: usize) -> u32 {
        self.ys[y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_around_near_edge() {
        for b in [1usize, 5, 100] {
            let policy = BorderPolicy::Reflect { size: b };
            let len = 300;
            assert_eq!(
                policy.resolve_axis(b - 1, len),
                policy.resolve_axis(b + 1, len)
            );
            assert_eq!(policy.resolve_axis(b, len), 0);
        }
    }

    #[test]
    fn test_far_edge_formula() {
        let b = 4;
        let len = 10;
        let canvas = len + 2 * b;
        let policy = BorderPolicy::Reflect { size: b };
        for x in canvas - b..canvas {
            let expected = 2 * canvas - 3 * b - 1 - x;
            assert_eq!(policy.resolve_axis(x, len), expected);
        }
        assert_eq!(policy.resolve_axis(canvas - b, len), len - 1);
    }

    #[test]
    fn test_interior_is_shifted_identity() {
        let policy = BorderPolicy::Reflect { size: 7 };
        for x in 0..20 {
            assert_eq!(policy.resolve_axis(x + 7, 20), x);
        }
    }

    #[test]
    fn test_wide_border_stays_in_bounds() {
        let policy = BorderPolicy::Reflect { size: 100 };
        let (cw, ch) = policy.canvas_size(8, 3).unwrap();
        assert_eq!((cw, ch), (208, 203));
        for x in 0..cw {
            assert!(policy.resolve_axis(x, 8) < 8);
        }
        for y in 0..ch {
            assert!(policy.resolve_axis(y, 3) < 3);
        }
        let single = BorderPolicy::Reflect { size: 9 };
        for x in 0..19 {
            assert_eq!(single.resolve_axis(x, 1), 0);
        }
    }

    #[test]
    fn test_none_is_identity() {
        let policy = BorderPolicy::None;
        assert_eq!(policy.canvas_size(12, 9).unwrap(), (12, 9));
        for x in 0..12 {
            assert_eq!(policy.resolve_axis(x, 12), x);
        }
        assert_eq!(policy.resolve_axis(40, 12), 11);
    }

    #[test]
    fn test_border_map_matches_policy() {
        let policy = BorderPolicy::Reflect { size: 6 };
        let map = BorderMap::new(policy, 20, 11).unwrap();
        assert_eq!(map.canvas_size(), (32, 23));
        assert_eq!(map.border(), 6);
        for x in 0..32 {
            assert_eq!(map.source_x(x) as usize, policy.resolve_axis(x, 20));
        }
        for y in 0..23 {
            assert_eq!(map.source_y(y) as usize, policy.resolve_axis(y, 11));
        }
    }

    #[test]
    fn test_zero_area_rejected() {
        assert!(BorderPolicy::default().canvas_size(0, 10).is_err());
    }
}
