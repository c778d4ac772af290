//! # fblur-ops
//!
//! Image blur by frequency-domain convolution.
//!
//! The image and a spatial kernel are transformed with a 2D discrete
//! Fourier transform, multiplied sample by sample and transformed back.
//! For wide kernels this is far cheaper than direct convolution.
//!
//! # Modules
//!
//! - [`field`] - complex sample buffers with wraparound indexing
//! - [`border`] - canvas padding by mirrored edges
//! - [`kernel`] - Gaussian and fixed-table kernel construction
//! - [`engine`] - three fields with their precomputed 2D plans
//! - [`pipeline`] - the per-channel convolution
//!
//! # Example
//!
//! ```rust,ignore
//! use fblur_ops::{ConvolutionPipeline, KernelSpec, PipelineConfig};
//!
//! let spec = KernelSpec::gaussian(10.0)?;
//! let mut pipeline = ConvolutionPipeline::initialize(w, h, PipelineConfig::for_kernel(&spec))?;
//!
//! // once per slider step
//! pipeline.compute(&source, &mut blurred, &spec)?;
//!
//! pipeline.shutdown();
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod border;
pub mod engine;
pub mod field;
pub mod kernel;
pub mod pipeline;

pub use border::{BorderMap, BorderPolicy, DEFAULT_BORDER};
pub use engine::{EngineConfig, PlanEffort, TransformEngine};
pub use error::{OpsError, OpsResult};
pub use field::ComplexField;
pub use kernel::{KernelSpec, WeightTable, SIGMA_MAX, SIGMA_MIN};
pub use pipeline::{blur_image, ConvolutionPipeline, PipelineConfig};
