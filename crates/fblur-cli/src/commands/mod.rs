//! CLI command implementations

pub mod blur;
pub mod interactive;
pub mod sweep;

use anyhow::{Context, Result};
use fblur_core::RgbImage;
use fblur_io::WriteOptions;
use fblur_ops::{BorderPolicy, EngineConfig, KernelSpec, PipelineConfig, PlanEffort};
use std::path::Path;
use tracing::warn;

/// Flags shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct GlobalOpts {
    pub threads: usize,
    pub effort: PlanEffort,
    pub quality: u8,
}

impl GlobalOpts {
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            threads: self.threads,
            effort: self.effort,
        }
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            quality: self.quality,
        }
    }
}

/// Load image from path
pub fn load_image(path: &Path) -> Result<RgbImage> {
    fblur_io::read(path).with_context(|| format!("Failed to load: {}", path.display()))
}

/// Save image to path
pub fn save_image(path: &Path, image: &RgbImage, opts: &GlobalOpts) -> Result<()> {
    fblur_io::write_with_options(path, image, &opts.write_options())
        .with_context(|| format!("Failed to save: {}", path.display()))
}

/// Pipeline options for `spec`, with an optional `--border` override
/// (0 disables padding).
pub fn pipeline_config(spec: &KernelSpec, border: Option<usize>, opts: &GlobalOpts) -> PipelineConfig {
    let config = PipelineConfig::for_kernel(spec).with_engine(opts.engine());
    match border {
        Some(0) => config.with_border(BorderPolicy::None),
        Some(size) => config.with_border(BorderPolicy::Reflect { size }),
        None => config,
    }
}

/// Warns when a Gaussian is wider than the canvas can hold.
///
/// The kernel is not renormalized; on a canvas narrower than about six
/// sigma its tails wrap around onto the opposite edge.
pub fn warn_if_truncated(spec: &KernelSpec, canvas: (usize, usize)) {
    if let KernelSpec::Gaussian { sigma } = spec {
        let sigma = *sigma;
        let needed = (6.0 * sigma).ceil() as usize;
        let side = canvas.0.min(canvas.1);
        if side < needed {
            warn!(
                sigma,
                canvas_width = canvas.0,
                canvas_height = canvas.1,
                "canvas narrower than 6 sigma, kernel tails wrap around"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fblur_ops::WeightTable;

    fn opts() -> GlobalOpts {
        GlobalOpts {
            threads: 3,
            effort: PlanEffort::Estimate,
            quality: 90,
        }
    }

    #[test]
    fn test_pipeline_config_border_override() {
        let gaussian = KernelSpec::gaussian(4.0).unwrap();
        assert_eq!(
            pipeline_config(&gaussian, None, &opts()).border,
            BorderPolicy::default()
        );
        assert_eq!(
            pipeline_config(&gaussian, Some(0), &opts()).border,
            BorderPolicy::None
        );

        let table = KernelSpec::fixed(WeightTable::binomial(3).unwrap());
        let config = pipeline_config(&table, Some(8), &opts());
        assert_eq!(config.border, BorderPolicy::Reflect { size: 8 });
        assert_eq!(config.engine.threads, 3);
        assert_eq!(config.engine.effort, PlanEffort::Estimate);
    }
}
