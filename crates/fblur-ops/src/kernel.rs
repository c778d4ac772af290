//! Spatial-domain filter construction.
//!
//! Kernels are written into a [`ComplexField`] centered on the origin, with
//! negative offsets wrapped to the far edges by [`circular_index`]. The
//! imaginary part is always zero.
//!
//! Two kernel families are supported:
//!
//! - [`KernelSpec::Gaussian`] - `a * exp(-(x^2 + y^2) / (2 sigma^2))` with
//!   `a = 1 / (2 pi sigma^2)`, evaluated over the whole canvas
//! - [`KernelSpec::Fixed`] - a small odd-sized literal [`WeightTable`]
//!
//! # Example
//!
//! ```rust
//! use fblur_ops::{ComplexField, KernelSpec, kernel::build_kernel};
//!
//! let mut field = ComplexField::new(128, 128).unwrap();
//! build_kernel(&mut field, &KernelSpec::gaussian(4.0).unwrap());
//! assert!((field.real_sum() - 1.0).abs() < 1e-4);
//! ```
//!
//! [`circular_index`]: crate::field::circular_index

use crate::{ComplexField, OpsError, OpsResult};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Smallest accepted Gaussian sigma.
pub const SIGMA_MIN: f32 = 1.0;
/// Largest accepted Gaussian sigma.
pub const SIGMA_MAX: f32 = 100.0;

/// Largest side accepted for [`WeightTable::binomial`].
///
/// Keeps every partial sum of the table exactly representable in `f32`.
pub const BINOMIAL_MAX: usize = 11;

/// Which filter to build.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelSpec {
    /// Isotropic Gaussian with full-canvas support.
    Gaussian {
        /// Standard deviation in pixels
        sigma: f32,
    },
    /// Literal weight table with small support.
    Fixed(WeightTable),
}

impl KernelSpec {
    /// Gaussian kernel.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] unless `sigma` is finite and within
    /// [`SIGMA_MIN`]`..=`[`SIGMA_MAX`].
    pub fn gaussian(sigma: f32) -> OpsResult<Self> {
        if !sigma.is_finite() || !(SIGMA_MIN..=SIGMA_MAX).contains(&sigma) {
            return Err(OpsError::InvalidParameter(format!(
                "sigma {} outside [{}, {}]",
                sigma, SIGMA_MIN, SIGMA_MAX
            )));
        }
        Ok(KernelSpec::Gaussian { sigma })
    }

    /// Fixed weight table kernel.
    pub fn fixed(table: WeightTable) -> Self {
        KernelSpec::Fixed(table)
    }

    /// Side of the kernel support, or `None` for full-canvas support.
    pub fn support(&self) -> Option<usize> {
        match self {
            KernelSpec::Gaussian { .. } => None,
            KernelSpec::Fixed(table) => Some(table.size()),
        }
    }
}

impl fmt::Display for KernelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelSpec::Gaussian { sigma } => write!(f, "gaussian(sigma={})", sigma),
            KernelSpec::Fixed(table) => write!(f, "fixed({}x{})", table.size(), table.size()),
        }
    }
}

/// Odd-sized square table of kernel weights, row-major.
///
/// Row and column `i` of the table correspond to offset `i - size / 2`
/// from the kernel center. Weights are expected to sum to 1 so the blur
/// preserves mean brightness; this is not checked at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    size: usize,
    weights: Vec<f32>,
}

impl WeightTable {
    /// Wraps literal weights.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] if `size` is even or zero, or if
    /// `weights.len() != size * size`.
    pub fn from_weights(size: usize, weights: Vec<f32>) -> OpsResult<Self> {
        if size == 0 || size % 2 == 0 {
            return Err(OpsError::InvalidParameter(format!(
                "weight table side must be odd, got {}",
                size
            )));
        }
        if weights.len() != size * size {
            return Err(OpsError::InvalidParameter(format!(
                "weight table {}x{} needs {} weights, got {}",
                size,
                size,
                size * size,
                weights.len()
            )));
        }
        Ok(Self { size, weights })
    }

    /// Binomial table: outer product of a Pascal row with itself.
    ///
    /// The denominator is a power of two, so the weights and their sum are
    /// exact in `f32`.
    ///
    /// ```rust
    /// use fblur_ops::WeightTable;
    ///
    /// let t = WeightTable::binomial(3).unwrap();
    /// assert_eq!(t.weights(), &[
    ///     1.0 / 16.0, 2.0 / 16.0, 1.0 / 16.0,
    ///     2.0 / 16.0, 4.0 / 16.0, 2.0 / 16.0,
    ///     1.0 / 16.0, 2.0 / 16.0, 1.0 / 16.0,
    /// ]);
    /// ```
    pub fn binomial(size: usize) -> OpsResult<Self> {
        if size == 0 || size % 2 == 0 || size > BINOMIAL_MAX {
            return Err(OpsError::InvalidParameter(format!(
                "binomial table side must be odd and <= {}, got {}",
                BINOMIAL_MAX, size
            )));
        }
        let mut row = vec![1u64; size];
        for i in 1..size {
            row[i] = row[i - 1] * (size - i) as u64 / i as u64;
        }
        let denom = (1u64 << (size - 1)) as f32;
        let denom = denom * denom;

        let mut weights = Vec::with_capacity(size * size);
        for &ry in &row {
            for &rx in &row {
                weights.push((ry * rx) as f32 / denom);
            }
        }
        Ok(Self { size, weights })
    }

    /// Side length.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Offset of the outermost row/column from the center.
    #[inline]
    pub fn radius(&self) -> isize {
        (self.size / 2) as isize
    }

    /// Row-major weights.
    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Weight at a center-relative offset.
    ///
    /// # Panics
    ///
    /// Panics if the offset lies outside the table.
    #[inline]
    pub fn weight(&self, dx: isize, dy: isize) -> f32 {
        let r = self.radius();
        assert!(dx.abs() <= r && dy.abs() <= r, "offset outside weight table");
        self.weights[((dy + r) as usize) * self.size + (dx + r) as usize]
    }

    /// Sum of all weights.
    pub fn sum(&self) -> f32 {
        self.weights.iter().sum()
    }
}

impl FromStr for WeightTable {
    type Err = OpsError;

    /// Parses a table name: `binomial3`, `binomial5`, ... `binomial11`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let size = lower
            .strip_prefix("binomial")
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or_else(|| OpsError::InvalidParameter(format!("unknown weight table '{}'", s)))?;
        WeightTable::binomial(size)
    }
}

/// Rebuilds `field` as the spatial kernel described by `spec`.
///
/// The field is zeroed first; content from a previous call never leaks.
pub fn build_kernel(field: &mut ComplexField, spec: &KernelSpec) {
    field.clear();
    match spec {
        KernelSpec::Gaussian { sigma } => build_gaussian(field, *sigma),
        KernelSpec::Fixed(table) => build_fixed(field, table),
    }
}

/// Offsets `-(n / 2) ..` covering each of the `n` cells of an axis once.
fn centered_range(n: usize) -> std::ops::Range<isize> {
    let start = -((n / 2) as isize);
    start..start + n as isize
}

fn build_gaussian(field: &mut ComplexField, sigma: f32) {
    let sigma = sigma as f64;
    let a = 1.0 / (2.0 * PI * sigma * sigma);
    let denom = 2.0 * sigma * sigma;

    // exp(-(x^2 + y^2) / d) = exp(-x^2 / d) * exp(-y^2 / d)
    let gx: Vec<f64> = centered_range(field.width())
        .map(|x| (-((x * x) as f64) / denom).exp())
        .collect();
    let gy: Vec<f64> = centered_range(field.height())
        .map(|y| (-((y * y) as f64) / denom).exp())
        .collect();

    for (y, wy) in centered_range(field.height()).zip(&gy) {
        let ay = a * wy;
        for (x, wx) in centered_range(field.width()).zip(&gx) {
            field.at_mut(x, y).re = (ay * wx) as f32;
        }
    }
}

fn build_fixed(field: &mut ComplexField, table: &WeightTable) {
    let r = table.radius();
    for dy in -r..=r {
        for dx in -r..=r {
            field.at_mut(dx, dy).re = table.weight(dx, dy);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_gaussian_normalized() {
        let mut field = ComplexField::new(1024, 1024).unwrap();
        for sigma in [1.0f32, 10.0, 50.0, 100.0] {
            build_kernel(&mut field, &KernelSpec::gaussian(sigma).unwrap());
            assert_abs_diff_eq!(field.real_sum(), 1.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_gaussian_peak_at_origin() {
        let mut field = ComplexField::new(64, 48).unwrap();
        build_kernel(&mut field, &KernelSpec::gaussian(3.0).unwrap());
        let peak = field.as_slice()[0].re;
        assert!(field.as_slice().iter().all(|c| c.re <= peak));
        assert_abs_diff_eq!(peak, 1.0 / (2.0 * std::f32::consts::PI * 9.0), epsilon = 1e-6);
    }

    #[test]
    fn test_gaussian_point_symmetry() {
        for (w, h) in [(32, 32), (33, 21)] {
            let mut field = ComplexField::new(w, h).unwrap();
            build_kernel(&mut field, &KernelSpec::gaussian(2.5).unwrap());
            for y in -(h as isize)..h as isize {
                for x in -(w as isize)..w as isize {
                    assert_eq!(field.get(x, y), field.get(-x, -y), "at ({}, {})", x, y);
                }
            }
        }
    }

    #[test]
    fn test_fixed_point_symmetry() {
        let mut field = ComplexField::new(16, 16).unwrap();
        build_kernel(&mut field, &KernelSpec::fixed(WeightTable::binomial(5).unwrap()));
        for y in -8..8 {
            for x in -8..8 {
                assert_eq!(field.get(x, y), field.get(-x, -y));
            }
        }
        assert_eq!(field.get(0, 0).re, 36.0 / 256.0);
        assert_eq!(field.get(-2, -2).re, 1.0 / 256.0);
        assert_eq!(field.get(3, 0).re, 0.0);
    }

    #[test]
    fn test_builtin_tables_sum_exactly_to_one() {
        for size in (1..=BINOMIAL_MAX).step_by(2) {
            let table = WeightTable::binomial(size).unwrap();
            assert_eq!(table.sum(), 1.0, "binomial{}", size);
        }
    }

    #[test]
    fn test_rebuild_clears_previous_kernel() {
        let mut field = ComplexField::new(40, 40).unwrap();
        build_kernel(&mut field, &KernelSpec::gaussian(20.0).unwrap());
        build_kernel(&mut field, &KernelSpec::fixed(WeightTable::binomial(3).unwrap()));
        let nonzero = field.as_slice().iter().filter(|c| c.re != 0.0).count();
        assert_eq!(nonzero, 9);
        assert!(field.as_slice().iter().all(|c| c.im == 0.0));
    }

    #[test]
    fn test_sigma_domain() {
        assert!(KernelSpec::gaussian(1.0).is_ok());
        assert!(KernelSpec::gaussian(100.0).is_ok());
        assert!(KernelSpec::gaussian(0.5).is_err());
        assert!(KernelSpec::gaussian(100.5).is_err());
        assert!(KernelSpec::gaussian(f32::NAN).is_err());
    }

    #[test]
    fn test_table_validation() {
        assert!(WeightTable::from_weights(3, vec![0.0; 9]).is_ok());
        assert!(WeightTable::from_weights(4, vec![0.0; 16]).is_err());
        assert!(WeightTable::from_weights(3, vec![0.0; 8]).is_err());
        assert!(WeightTable::binomial(13).is_err());
    }

    #[test]
    fn test_table_from_str() {
        let t: WeightTable = "Binomial5".parse().unwrap();
        assert_eq!(t.size(), 5);
        assert!("box3".parse::<WeightTable>().is_err());
        assert!("binomial4".parse::<WeightTable>().is_err());
    }
}
