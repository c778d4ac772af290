//! Frequency-domain convolution of RGB images.
//!
//! A [`ConvolutionPipeline`] is initialized once for an image size and then
//! recomputes the blur for any [`KernelSpec`] on demand, reusing the same
//! fields and plans on every call:
//!
//! 1. build the spatial kernel into the filter field and transform it
//! 2. for red, green and blue in turn:
//!    - fill the input field from the source channel through the border map
//!    - forward transform into the output field
//!    - multiply by the kernel spectrum
//!    - backward transform
//!    - divide by the canvas area, round, clamp and store into the destination
//!
//! Channels share the three fields and therefore run one after another; the
//! transforms themselves run on the engine's pool.
//!
//! # Example
//!
//! ```rust
//! use fblur_core::RgbImage;
//! use fblur_ops::{ConvolutionPipeline, KernelSpec, PipelineConfig};
//!
//! let source = RgbImage::filled(32, 32, [200, 100, 50]);
//! let mut blurred = RgbImage::new(32, 32);
//!
//! let spec = KernelSpec::gaussian(3.0)?;
//! let mut pipeline = ConvolutionPipeline::initialize(32, 32, PipelineConfig::for_kernel(&spec))?;
//! pipeline.compute(&source, &mut blurred, &spec)?;
//! pipeline.shutdown();
//!
//! assert_eq!(blurred.pixel(0, 0), [200, 100, 50]);
//! # Ok::<(), fblur_ops::OpsError>(())
//! ```

use crate::border::{BorderMap, BorderPolicy};
use crate::engine::{EngineConfig, TransformEngine};
use crate::kernel::{build_kernel, KernelSpec};
use crate::{OpsError, OpsResult};
use fblur_core::{Channel, RgbImage};
use std::time::Instant;
use tracing::{debug, debug_span, info};

/// Pipeline construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineConfig {
    /// Canvas extension around the image.
    pub border: BorderPolicy,
    /// Transform engine options.
    pub engine: EngineConfig,
}

impl PipelineConfig {
    /// Border policy suited to `spec`: mirrored padding for the
    /// full-support Gaussian, plain wraparound for small fixed tables.
    pub fn for_kernel(spec: &KernelSpec) -> Self {
        let border = match spec {
            KernelSpec::Gaussian { .. } => BorderPolicy::default(),
            KernelSpec::Fixed(_) => BorderPolicy::None,
        };
        Self {
            border,
            ..Default::default()
        }
    }

    /// Replaces the border policy.
    pub fn with_border(mut self, border: BorderPolicy) -> Self {
        self.border = border;
        self
    }

    /// Replaces the engine options.
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }
}

/// Reusable blur pipeline bound to one image size.
pub struct ConvolutionPipeline {
    engine: TransformEngine,
    border: BorderMap,
    image_width: u32,
    image_height: u32,
}

impl ConvolutionPipeline {
    /// Builds the border map, fields, plans and worker pool for images of
    /// `width x height`.
    ///
    /// # Errors
    ///
    /// Any failure here is fatal for the pipeline: zero or overflowing
    /// sizes, allocation failure or a worker pool that cannot start.
    pub fn initialize(width: u32, height: u32, config: PipelineConfig) -> OpsResult<Self> {
        let start = Instant::now();
        let border = BorderMap::new(config.border, width, height)?;
        let (cw, ch) = border.canvas_size();
        let engine = TransformEngine::new(cw, ch, &config.engine)?;

        info!(
            width,
            height,
            canvas_width = cw,
            canvas_height = ch,
            border = border.border(),
            threads = engine.threads(),
            elapsed = ?start.elapsed(),
            "pipeline initialized"
        );

        Ok(Self {
            engine,
            border,
            image_width: width,
            image_height: height,
        })
    }

    /// Image dimensions the pipeline accepts.
    pub fn image_size(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    /// Working canvas dimensions (image plus border on every side).
    pub fn canvas_size(&self) -> (usize, usize) {
        self.border.canvas_size()
    }

    /// Border size on each side.
    pub fn border_size(&self) -> usize {
        self.border.border()
    }

    /// The transform engine.
    pub fn engine(&self) -> &TransformEngine {
        &self.engine
    }

    /// Blurs `source` into `destination` with `spec`.
    ///
    /// Both images must have the size given at initialization. A fixed
    /// weight table may not be larger than the canvas. These are checked
    /// before any state is touched; once the computation starts it always
    /// runs to completion.
    pub fn compute(
        &mut self,
        source: &RgbImage,
        destination: &mut RgbImage,
        spec: &KernelSpec,
    ) -> OpsResult<()> {
        self.check_preconditions(source, destination, spec)?;

        let _span = debug_span!("compute", kernel = %spec).entered();
        let start = Instant::now();

        build_kernel(self.engine.filter_mut(), spec);
        self.engine.forward_filter();
        debug!(elapsed = ?start.elapsed(), "kernel spectrum ready");

        for channel in Channel::ALL {
            let t = Instant::now();
            self.populate_input(source, channel);
            self.engine.forward_image();
            self.multiply_spectrum();
            self.engine.backward_image();
            self.write_channel(destination, channel);
            debug!(channel = channel.name(), elapsed = ?t.elapsed(), "channel done");
        }

        debug!(elapsed = ?start.elapsed(), "compute done");
        Ok(())
    }

    /// Releases plans, fields and the worker pool.
    pub fn shutdown(self) {
        debug!(
            width = self.image_width,
            height = self.image_height,
            "pipeline shut down"
        );
    }

    fn check_preconditions(
        &self,
        source: &RgbImage,
        destination: &RgbImage,
        spec: &KernelSpec,
    ) -> OpsResult<()> {
        let expected = self.image_size();
        for (what, image) in [("source", source), ("destination", destination)] {
            if image.dimensions() != expected {
                return Err(OpsError::SizeMismatch(format!(
                    "{} is {}x{}, pipeline expects {}x{}",
                    what,
                    image.width(),
                    image.height(),
                    expected.0,
                    expected.1
                )));
            }
        }
        if let Some(side) = spec.support() {
            let (cw, ch) = self.canvas_size();
            if side > cw || side > ch {
                return Err(OpsError::InvalidParameter(format!(
                    "{}x{} weight table exceeds {}x{} canvas",
                    side, side, cw, ch
                )));
            }
        }
        Ok(())
    }

    /// Fills the input field's real parts from one source channel.
    fn populate_input(&mut self, source: &RgbImage, channel: Channel) {
        let (cw, ch) = self.border.canvas_size();
        let border = &self.border;
        let input = self.engine.input_mut();
        input.clear();
        for y in 0..ch {
            let sy = border.source_y(y);
            for x in 0..cw {
                let sx = border.source_x(x);
                input.at_mut(x as isize, y as isize).re = source.channel(sx, sy, channel) as f32;
            }
        }
    }

    /// `output *= filter`, sample by sample.
    fn multiply_spectrum(&mut self) {
        let (output, filter) = self.engine.output_and_filter();
        for (o, f) in output.as_mut_slice().iter_mut().zip(filter.as_slice()) {
            // (a + bi)(c + di) = (ac - bd) + (ad + bc)i
            *o *= *f;
        }
    }

    /// Normalizes the non-border part of the output into one channel.
    fn write_channel(&self, destination: &mut RgbImage, channel: Channel) {
        let output = self.engine.output();
        let scale = output.len() as f64;
        let b = self.border.border() as isize;
        for y in 0..self.image_height {
            for x in 0..self.image_width {
                let sample = output.get(x as isize + b, y as isize + b).re;
                destination.set_channel(x, y, channel, normalize(sample, scale));
            }
        }
    }
}

/// Undoes the `width * height` gain of an unnormalized transform pair.
///
/// Divides in floating point, then rounds, then clamps to `0..=255`.
#[inline]
fn normalize(sample: f32, scale: f64) -> u8 {
    (sample as f64 / scale).round().clamp(0.0, 255.0) as u8
}

/// One-shot blur: initializes a pipeline for `source`, computes once into a
/// new image and shuts the pipeline down.
pub fn blur_image(
    source: &RgbImage,
    spec: &KernelSpec,
    config: &PipelineConfig,
) -> OpsResult<RgbImage> {
    let (w, h) = source.dimensions();
    let mut pipeline = ConvolutionPipeline::initialize(w, h, *config)?;
    let mut destination = RgbImage::new(w, h);
    pipeline.compute(source, &mut destination, spec)?;
    pipeline.shutdown();
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PlanEffort;
    use crate::kernel::WeightTable;

    fn config(border: BorderPolicy) -> PipelineConfig {
        PipelineConfig {
            border,
            engine: EngineConfig {
                threads: 2,
                effort: PlanEffort::Estimate,
            },
        }
    }

    #[test]
    fn test_normalize_divides_before_rounding() {
        // 150 / 100 = 1.5 rounds to 2; integer division would give 1.
        assert_eq!(normalize(150.0, 100.0), 2);
        assert_eq!(normalize(128.0 * 4096.0, 4096.0), 128);
        assert_eq!(normalize(-3.0, 1.0), 0);
        assert_eq!(normalize(1e9, 1.0), 255);
    }

    #[test]
    fn test_for_kernel_picks_border() {
        let g = PipelineConfig::for_kernel(&KernelSpec::gaussian(2.0).unwrap());
        assert_eq!(g.border, BorderPolicy::Reflect { size: 100 });
        let f = PipelineConfig::for_kernel(&KernelSpec::fixed(WeightTable::binomial(5).unwrap()));
        assert_eq!(f.border, BorderPolicy::None);
    }

    #[test]
    fn test_canvas_includes_border() {
        let p = ConvolutionPipeline::initialize(30, 20, config(BorderPolicy::Reflect { size: 5 }))
            .unwrap();
        assert_eq!(p.canvas_size(), (40, 30));
        assert_eq!(p.engine().size(), (40, 30));
        assert_eq!(p.border_size(), 5);
    }

    #[test]
    fn test_size_mismatch_leaves_destination_alone() {
        let mut p = ConvolutionPipeline::initialize(16, 16, config(BorderPolicy::None)).unwrap();
        let source = RgbImage::filled(16, 8, [9, 9, 9]);
        let mut dest = RgbImage::filled(16, 16, [1, 2, 3]);
        let err = p
            .compute(&source, &mut dest, &KernelSpec::gaussian(1.0).unwrap())
            .unwrap_err();
        assert!(matches!(err, OpsError::SizeMismatch(_)));
        assert_eq!(dest, RgbImage::filled(16, 16, [1, 2, 3]));

        let source = RgbImage::filled(16, 16, [9, 9, 9]);
        let mut small = RgbImage::new(4, 4);
        assert!(p
            .compute(&source, &mut small, &KernelSpec::gaussian(1.0).unwrap())
            .is_err());
    }

    #[test]
    fn test_table_larger_than_canvas_rejected() {
        let mut p = ConvolutionPipeline::initialize(4, 4, config(BorderPolicy::None)).unwrap();
        let source = RgbImage::new(4, 4);
        let mut dest = RgbImage::new(4, 4);
        let spec = KernelSpec::fixed(WeightTable::binomial(5).unwrap());
        assert!(matches!(
            p.compute(&source, &mut dest, &spec),
            Err(OpsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_zero_sized_image_rejected() {
        assert!(ConvolutionPipeline::initialize(0, 10, config(BorderPolicy::None)).is_err());
    }
}
