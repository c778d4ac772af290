//! Sweep command
//!
//! Simulates dragging the sigma slider: one pipeline is initialized for
//! the image, then every sigma in the range is computed in turn on the
//! same fields and plans and saved as a numbered frame.

use super::GlobalOpts;
use crate::SweepArgs;
use anyhow::{bail, Context, Result};
use fblur_core::RgbImage;
use fblur_ops::{ConvolutionPipeline, KernelSpec};
use std::fs;
use std::time::{Duration, Instant};
use tracing::{info, trace};

/// Upper bound on the number of frames one sweep may produce.
const MAX_FRAMES: usize = 10_000;

pub fn run(args: SweepArgs, opts: &GlobalOpts) -> Result<()> {
    trace!(input = %args.input.display(), from = args.from, to = args.to, step = args.step, "sweep::run");

    let sigmas = sigma_steps(args.from, args.to, args.step)?;
    let specs = sigmas
        .iter()
        .map(|&s| KernelSpec::gaussian(s).with_context(|| format!("Invalid sigma: {}", s)))
        .collect::<Result<Vec<_>>>()?;

    let image = super::load_image(&args.input)?;
    let (w, h) = image.dimensions();
    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create: {}", args.output.display()))?;

    let config = super::pipeline_config(&specs[0], args.border, opts);
    let mut pipeline =
        ConvolutionPipeline::initialize(w, h, config).context("Failed to initialize pipeline")?;
    let mut blurred = RgbImage::new(w, h);
    let mut total = Duration::ZERO;

    for (sigma, spec) in sigmas.iter().zip(&specs) {
        super::warn_if_truncated(spec, pipeline.canvas_size());
        let start = Instant::now();
        pipeline
            .compute(&image, &mut blurred, spec)
            .with_context(|| format!("Failed to blur at sigma {}", sigma))?;
        let elapsed = start.elapsed();
        total += elapsed;

        let path = args.output.join(frame_name(*sigma));
        super::save_image(&path, &blurred, opts)?;
        info!(sigma, elapsed = ?elapsed, path = %path.display(), "frame");
    }

    pipeline.shutdown();
    info!(
        frames = sigmas.len(),
        total = ?total,
        mean = ?(total / sigmas.len() as u32),
        "sweep done"
    );
    Ok(())
}

/// `from, from + step, ...` up to and including `to`.
fn sigma_steps(from: f32, to: f32, step: f32) -> Result<Vec<f32>> {
    if !(step.is_finite() && step > 0.0) {
        bail!("Step must be positive, got {}", step);
    }
    if !(from.is_finite() && to.is_finite()) || from > to {
        bail!("Empty sigma range {}..={}", from, to);
    }
    // Each value is from + i * step in f64, never a running sum.
    let (from, to, step) = (from as f64, to as f64, step as f64);
    let frames = ((to - from) / step + 1e-6).floor() + 1.0;
    if frames > MAX_FRAMES as f64 {
        bail!(
            "Step {} over {}..={} gives {} frames, limit is {}",
            step, from, to, frames, MAX_FRAMES
        );
    }
    let count = frames as usize;
    Ok((0..count).map(|i| (from + i as f64 * step) as f32).collect())
}

/// `blur_sigma_012.png` for whole sigmas, `blur_sigma_012.50.png` otherwise.
fn frame_name(sigma: f32) -> String {
    if sigma.fract() == 0.0 {
        format!("blur_sigma_{:03}.png", sigma as u32)
    } else {
        format!("blur_sigma_{:06.2}.png", sigma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigma_steps_inclusive() {
        assert_eq!(sigma_steps(1.0, 5.0, 2.0).unwrap(), vec![1.0, 3.0, 5.0]);
        assert_eq!(sigma_steps(1.0, 6.0, 2.0).unwrap(), vec![1.0, 3.0, 5.0]);
        assert_eq!(sigma_steps(4.0, 4.0, 1.0).unwrap(), vec![4.0]);
    }

    #[test]
    fn test_sigma_steps_fractional_reaches_end() {
        let steps = sigma_steps(1.0, 2.0, 0.1).unwrap();
        assert_eq!(steps.len(), 11);
        assert!((steps[10] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_sigma_steps_rejects_bad_ranges() {
        assert!(sigma_steps(1.0, 5.0, 0.0).is_err());
        assert!(sigma_steps(1.0, 5.0, -1.0).is_err());
        assert!(sigma_steps(5.0, 1.0, 1.0).is_err());
        assert!(sigma_steps(f32::NAN, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_sigma_steps_rejects_tiny_step() {
        assert!(sigma_steps(1.0, 100.0, 1e-30).is_err());
        assert!(sigma_steps(1.0, 100.0, 1e-12).is_err());
        assert!(sigma_steps(1.0, 100.0, f32::MIN_POSITIVE).is_err());
        assert!(sigma_steps(1.0, 100.0, 0.009).is_err());
        assert_eq!(sigma_steps(1.0, 100.0, 0.01).unwrap().len(), 9901);
    }

    #[test]
    fn test_frame_name() {
        assert_eq!(frame_name(7.0), "blur_sigma_007.png");
        assert_eq!(frame_name(100.0), "blur_sigma_100.png");
        assert_eq!(frame_name(2.5), "blur_sigma_002.50.png");
    }

    #[test]
    fn test_run_writes_one_frame_per_sigma() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("source.png");
        let frames = dir.path().join("frames");
        let mut image = RgbImage::new(20, 12);
        image.set_pixel(10, 6, [255, 255, 255]);
        fblur_io::write(&input, &image).unwrap();

        let args = SweepArgs {
            input,
            output: frames.clone(),
            from: 1.0,
            to: 6.0,
            step: 2.0,
            border: Some(4),
        };
        let opts = GlobalOpts {
            threads: 1,
            effort: fblur_ops::PlanEffort::Estimate,
            quality: 90,
        };
        run(args, &opts).unwrap();

        let mut names: Vec<String> = fs::read_dir(&frames)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            ["blur_sigma_001.png", "blur_sigma_003.png", "blur_sigma_005.png"]
        );
        let first = fblur_io::read(frames.join("blur_sigma_001.png")).unwrap();
        let last = fblur_io::read(frames.join("blur_sigma_005.png")).unwrap();
        assert_eq!(first.dimensions(), (20, 12));
        assert_eq!(last.dimensions(), (20, 12));
        assert!(last.pixel(10, 6)[0] < first.pixel(10, 6)[0]);
    }
}
