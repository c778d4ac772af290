//! Complex sample fields with toroidal indexing.
//!
//! A [`ComplexField`] is a flat `width * height` buffer of [`Complex32`]
//! addressed through [`circular_index`]: signed coordinates wrap around both
//! axes, so a kernel centered on `(0, 0)` lands its peak on offset 0 and the
//! negative half of its support lands at the far edges. Kernel construction
//! and image population both go through the same mapping, which keeps the
//! two aligned in phase.

use crate::{OpsError, OpsResult};
use rustfft::num_complex::Complex32;

/// Maps a signed coordinate to a linear offset with wraparound.
///
/// `((x mod width) + (y mod height) * width)` using Euclidean remainder, so
/// any magnitude is accepted. `circular_index(0, 0, ..)` is always 0.
///
/// ```rust
/// use fblur_ops::field::circular_index;
///
/// assert_eq!(circular_index(0, 0, 8, 4), 0);
/// assert_eq!(circular_index(-1, 0, 8, 4), 7);
/// assert_eq!(circular_index(0, -1, 8, 4), 24);
/// assert_eq!(circular_index(9, 5, 8, 4), 9);
/// ```
#[inline]
pub fn circular_index(x: isize, y: isize, width: usize, height: usize) -> usize {
    let wx = x.rem_euclid(width as isize) as usize;
    let wy = y.rem_euclid(height as isize) as usize;
    wx + wy * width
}

/// Flat buffer of complex samples with wraparound 2D indexing.
///
/// The buffer is allocated once and never resized; transform plans rely on
/// its length staying fixed.
#[derive(Debug, Clone)]
pub struct ComplexField {
    data: Vec<Complex32>,
    width: usize,
    height: usize,
}

impl ComplexField {
    /// Allocates a zeroed field.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidDimensions`] for zero or overflowing sizes,
    /// [`OpsError::AllocationFailed`] if the buffer cannot be reserved.
    pub fn new(width: usize, height: usize) -> OpsResult<Self> {
        let len = Self::check_size(width, height)?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|e| OpsError::AllocationFailed {
                requested: len,
                reason: e.to_string(),
            })?;
        data.resize(len, Complex32::new(0.0, 0.0));

        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Validates a field size and returns its sample count.
    pub fn check_size(width: usize, height: usize) -> OpsResult<usize> {
        if width == 0 || height == 0 {
            return Err(OpsError::InvalidDimensions(format!(
                "field {}x{} has zero area",
                width, height
            )));
        }
        width
            .checked_mul(height)
            .filter(|&n| n <= isize::MAX as usize / std::mem::size_of::<Complex32>())
            .ok_or_else(|| {
                OpsError::InvalidDimensions(format!("field {}x{} overflows", width, height))
            })
    }

    /// Field width.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Field height.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of samples (`width * height`).
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always `false`; fields have non-zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Linear offset of a signed, wrapped coordinate.
    #[inline]
    pub fn index(&self, x: isize, y: isize) -> usize {
        circular_index(x, y, self.width, self.height)
    }

    /// Sample at a signed, wrapped coordinate.
    #[inline]
    pub fn get(&self, x: isize, y: isize) -> Complex32 {
        self.data[self.index(x, y)]
    }

    /// Mutable sample at a signed, wrapped coordinate.
    #[inline]
    pub fn at_mut(&mut self, x: isize, y: isize) -> &mut Complex32 {
        let i = self.index(x, y);
        &mut self.data[i]
    }

    /// Zeroes real and imaginary parts of every sample.
    pub fn clear(&mut self) {
        self.data.fill(Complex32::new(0.0, 0.0));
    }

    /// Samples in row-major order.
    #[inline]
    pub fn as_slice(&self) -> &[Complex32] {
        &self.data
    }

    /// Mutable samples in row-major order.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Complex32] {
        &mut self.data
    }

    /// Sum of the real parts, accumulated in `f64`.
    pub fn real_sum(&self) -> f64 {
        self.data.iter().map(|c| c.re as f64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_first_sample() {
        for (w, h) in [(1, 1), (5, 3), (64, 64), (264, 200)] {
            assert_eq!(circular_index(0, 0, w, h), 0);
        }
    }

    #[test]
    fn test_wraparound() {
        let (w, h) = (10, 6);
        assert_eq!(circular_index(-1, -1, w, h), 9 + 5 * 10);
        assert_eq!(circular_index(10, 6, w, h), 0);
        assert_eq!(circular_index(-25, 13, w, h), 5 + 10);
        assert_eq!(circular_index(3, 2, w, h), 23);
    }

    #[test]
    fn test_field_indexing() {
        let mut field = ComplexField::new(4, 3).unwrap();
        field.at_mut(-1, -1).re = 2.5;
        assert_eq!(field.as_slice()[11].re, 2.5);
        assert_eq!(field.get(3, 2).re, 2.5);
        assert_eq!(field.real_sum(), 2.5);

        field.clear();
        assert!(field.as_slice().iter().all(|c| c.re == 0.0 && c.im == 0.0));
    }

    #[test]
    fn test_zero_area_rejected() {
        assert!(matches!(
            ComplexField::new(0, 8),
            Err(OpsError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_overflow_rejected() {
        assert!(ComplexField::new(usize::MAX, 2).is_err());
    }
}
