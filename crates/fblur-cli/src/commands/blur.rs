//! Blur command
//!
//! One-shot blur with a Gaussian of a given sigma or a fixed weight table.

use super::GlobalOpts;
use crate::BlurArgs;
use anyhow::{Context, Result};
use fblur_core::RgbImage;
use fblur_ops::{ConvolutionPipeline, KernelSpec, WeightTable};
use std::time::Instant;
use tracing::{debug, info, trace};

/// Default sigma when neither `--sigma` nor `--kernel` is given.
const DEFAULT_SIGMA: f32 = 1.0;

pub fn run(args: BlurArgs, opts: &GlobalOpts) -> Result<()> {
    trace!(input = %args.input.display(), output = %args.output.display(), "blur::run");

    let spec = kernel_spec(args.sigma, args.kernel.as_deref())?;
    let image = super::load_image(&args.input)?;
    let (w, h) = image.dimensions();
    debug!(w, h, "loaded");

    let config = super::pipeline_config(&spec, args.border, opts);
    let mut pipeline =
        ConvolutionPipeline::initialize(w, h, config).context("Failed to initialize pipeline")?;
    debug!(canvas = ?pipeline.canvas_size(), border = pipeline.border_size(), "pipeline ready");
    super::warn_if_truncated(&spec, pipeline.canvas_size());

    let start = Instant::now();
    let mut blurred = RgbImage::new(w, h);
    pipeline
        .compute(&image, &mut blurred, &spec)
        .with_context(|| format!("Failed to blur {}", args.input.display()))?;
    info!(kernel = %spec, elapsed = ?start.elapsed(), "blurred");
    pipeline.shutdown();

    super::save_image(&args.output, &blurred, opts)?;
    info!(output = %args.output.display(), "saved");
    Ok(())
}

/// Kernel from the `--sigma`/`--kernel` pair; a named table wins.
fn kernel_spec(sigma: Option<f32>, kernel: Option<&str>) -> Result<KernelSpec> {
    match kernel {
        Some(name) => {
            let table = name
                .parse::<WeightTable>()
                .with_context(|| format!("Unknown kernel: {}", name))?;
            Ok(KernelSpec::fixed(table))
        }
        None => {
            let sigma = sigma.unwrap_or(DEFAULT_SIGMA);
            KernelSpec::gaussian(sigma).with_context(|| format!("Invalid sigma: {}", sigma))
        }
    }
}
