//! Planned 2D transforms over three owned fields.
//!
//! The [`TransformEngine`] owns the *input*, *filter* and *output* fields,
//! each paired with the 2D plan that executes on it:
//!
//! | field  | plan                               |
//! |--------|------------------------------------|
//! | input  | forward, input -> output           |
//! | filter | forward, in place                  |
//! | output | backward, in place                 |
//!
//! Plans are built once, at construction, for the fixed field size. A new
//! size means a new engine. Transforms are unnormalized: a forward pass
//! followed by a backward pass scales every sample by `width * height`.
//!
//! # Execution
//!
//! A 2D transform is a 1D transform over every row, then over every
//! column. Columns are handled by transposing into the plan's own buffer,
//! transforming its rows and transposing back. Both passes are split across
//! the engine's thread pool.
//!
//! # Plan effort
//!
//! [`PlanEffort::Measure`] times the SIMD-dispatching and scalar `rustfft`
//! planners on a scratch buffer for each axis length and keeps the faster
//! one. Construction is slower but every later transform benefits, which
//! pays off when the same engine runs once per slider step.

use crate::{ComplexField, OpsError, OpsResult};
use rayon::prelude::*;
use rayon::ThreadPool;
use rustfft::num_complex::Complex32;
use rustfft::{Fft, FftDirection, FftPlanner, FftPlannerScalar, Length};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Timed runs per candidate in [`PlanEffort::Measure`].
const MEASURE_ROUNDS: usize = 3;

/// Samples processed per timed run (rounded to whole transforms).
const MEASURE_SAMPLES: usize = 1 << 15;

/// How much work plan construction may spend choosing an algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanEffort {
    /// Take the planner's default choice.
    Estimate,
    /// Time candidate plans and keep the fastest.
    #[default]
    Measure,
}

/// Engine construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineConfig {
    /// Transform worker threads; 0 uses the available hardware parallelism.
    pub threads: usize,
    /// Plan construction effort.
    pub effort: PlanEffort,
}

/// Chooses and caches 1D plans per (length, direction).
struct AxisPlanner {
    effort: PlanEffort,
    simd: FftPlanner<f32>,
    scalar: FftPlannerScalar<f32>,
    chosen: HashMap<(usize, bool), Arc<dyn Fft<f32>>>,
}

impl AxisPlanner {
    fn new(effort: PlanEffort) -> Self {
        Self {
            effort,
            simd: FftPlanner::new(),
            scalar: FftPlannerScalar::new(),
            chosen: HashMap::new(),
        }
    }

    fn plan(&mut self, len: usize, direction: FftDirection) -> Arc<dyn Fft<f32>> {
        let key = (len, direction == FftDirection::Forward);
        if let Some(fft) = self.chosen.get(&key) {
            return Arc::clone(fft);
        }

        let auto = self.simd.plan_fft(len, direction);
        let fft = match self.effort {
            PlanEffort::Estimate => auto,
            PlanEffort::Measure => {
                let scalar = self.scalar.plan_fft(len, direction);
                let t_auto = time_plan(&*auto);
                let t_scalar = time_plan(&*scalar);
                trace!(len, ?direction, ?t_auto, ?t_scalar, "measured axis plans");
                if t_scalar < t_auto { scalar } else { auto }
            }
        };
        self.chosen.insert(key, Arc::clone(&fft));
        fft
    }
}

/// Best-of-N wall time of one batch through `fft`.
fn time_plan(fft: &dyn Fft<f32>) -> Duration {
    let len = fft.len();
    let batch = (MEASURE_SAMPLES / len).max(1);
    let mut buffer = vec![Complex32::new(1.0, 0.0); len * batch];
    let mut scratch = vec![Complex32::new(0.0, 0.0); fft.get_inplace_scratch_len()];

    // Warm-up run: first touch of twiddles and buffers.
    fft.process_with_scratch(&mut buffer, &mut scratch);
    (0..MEASURE_ROUNDS)
        .map(|_| {
            let start = Instant::now();
            fft.process_with_scratch(&mut buffer, &mut scratch);
            start.elapsed()
        })
        .min()
        .unwrap_or_default()
}

/// Precomputed 2D transform for one field size and direction.
pub struct Plan2d {
    width: usize,
    height: usize,
    direction: FftDirection,
    row: Arc<dyn Fft<f32>>,
    col: Arc<dyn Fft<f32>>,
    transpose: Vec<Complex32>,
}

impl Plan2d {
    fn new(
        planner: &mut AxisPlanner,
        width: usize,
        height: usize,
        direction: FftDirection,
    ) -> OpsResult<Self> {
        let len = width * height;
        let mut transpose = Vec::new();
        transpose
            .try_reserve_exact(len)
            .map_err(|e| OpsError::AllocationFailed {
                requested: len,
                reason: e.to_string(),
            })?;
        transpose.resize(len, Complex32::new(0.0, 0.0));

        Ok(Self {
            width,
            height,
            direction,
            row: planner.plan(width, direction),
            col: planner.plan(height, direction),
            transpose,
        })
    }

    /// Transform direction.
    pub fn direction(&self) -> FftDirection {
        self.direction
    }

    /// `(width, height)` the plan was built for.
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Transforms `data` (row-major, `width * height`) in place.
    fn execute(&mut self, data: &mut [Complex32], pool: &ThreadPool) {
        debug_assert_eq!(data.len(), self.width * self.height);
        let Plan2d {
            width,
            height,
            row,
            col,
            transpose,
            ..
        } = self;
        let (w, h) = (*width, *height);
        let (row, col): (&dyn Fft<f32>, &dyn Fft<f32>) = (&**row, &**col);

        pool.install(|| {
            process_rows(row, data, w);
            transpose_into(data, transpose, w, h);
            process_rows(col, transpose, h);
            transpose_into(transpose, data, h, w);
        });
    }
}

/// Runs `fft` over every `len`-sample row of `data` in parallel.
fn process_rows(fft: &dyn Fft<f32>, data: &mut [Complex32], len: usize) {
    let scratch_len = fft.get_inplace_scratch_len();
    data.par_chunks_exact_mut(len).for_each_init(
        || vec![Complex32::new(0.0, 0.0); scratch_len],
        |scratch, row| fft.process_with_scratch(row, scratch),
    );
}

/// Writes the transpose of `src` (`rows` rows of `cols`) into `dst`.
fn transpose_into(src: &[Complex32], dst: &mut [Complex32], cols: usize, rows: usize) {
    dst.par_chunks_exact_mut(rows)
        .enumerate()
        .for_each(|(x, out)| {
            for (y, v) in out.iter_mut().enumerate() {
                *v = src[y * cols + x];
            }
        });
}

/// A field and the plan bound to it, built and dropped together.
pub struct PlannedField {
    field: ComplexField,
    plan: Plan2d,
}

impl PlannedField {
    fn new(
        planner: &mut AxisPlanner,
        width: usize,
        height: usize,
        direction: FftDirection,
    ) -> OpsResult<Self> {
        let field = ComplexField::new(width, height)?;
        let plan = Plan2d::new(planner, width, height, direction)?;
        Ok(Self { field, plan })
    }

    /// The field.
    pub fn field(&self) -> &ComplexField {
        &self.field
    }

    /// The plan.
    pub fn plan(&self) -> &Plan2d {
        &self.plan
    }
}

/// Owner of the three working fields, their plans and the worker pool.
pub struct TransformEngine {
    input: PlannedField,
    filter: PlannedField,
    output: PlannedField,
    // Declared last so it is dropped after every plan.
    pool: ThreadPool,
}

impl TransformEngine {
    /// Allocates the fields, starts the pool and builds all three plans.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidDimensions`] for zero or overflowing sizes,
    /// [`OpsError::AllocationFailed`] if a buffer cannot be reserved,
    /// [`OpsError::ThreadPool`] if the worker pool cannot start.
    pub fn new(width: usize, height: usize, config: &EngineConfig) -> OpsResult<Self> {
        let start = Instant::now();

        // Reject bad sizes before spawning any thread.
        ComplexField::check_size(width, height)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("fblur-fft-{}", i))
            .build()
            .map_err(|e| OpsError::ThreadPool(e.to_string()))?;

        let mut planner = AxisPlanner::new(config.effort);
        let input = PlannedField::new(&mut planner, width, height, FftDirection::Forward)?;
        let filter = PlannedField::new(&mut planner, width, height, FftDirection::Forward)?;
        let output = PlannedField::new(&mut planner, width, height, FftDirection::Inverse)?;

        debug!(
            width,
            height,
            threads = pool.current_num_threads(),
            effort = ?config.effort,
            elapsed = ?start.elapsed(),
            "transform engine ready"
        );

        Ok(Self {
            input,
            filter,
            output,
            pool,
        })
    }

    /// Field dimensions.
    #[inline]
    pub fn size(&self) -> (usize, usize) {
        (self.input.field().width(), self.input.field().height())
    }

    /// Worker threads in the pool.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Input field.
    pub fn input(&self) -> &ComplexField {
        self.input.field()
    }

    /// Mutable input field.
    pub fn input_mut(&mut self) -> &mut ComplexField {
        &mut self.input.field
    }

    /// Filter field.
    pub fn filter(&self) -> &ComplexField {
        self.filter.field()
    }

    /// Mutable filter field.
    pub fn filter_mut(&mut self) -> &mut ComplexField {
        &mut self.filter.field
    }

    /// Output field.
    pub fn output(&self) -> &ComplexField {
        self.output.field()
    }

    /// Output (mutable) and filter (shared) at once, for spectrum products.
    pub fn output_and_filter(&mut self) -> (&mut ComplexField, &ComplexField) {
        (&mut self.output.field, &self.filter.field)
    }

    /// Forward transform of the filter field, in place.
    pub fn forward_filter(&mut self) {
        let PlannedField { field, plan } = &mut self.filter;
        plan.execute(field.as_mut_slice(), &self.pool);
    }

    /// Forward transform of the input field into the output field.
    ///
    /// The input field is left untouched.
    pub fn forward_image(&mut self) {
        let out = self.output.field.as_mut_slice();
        out.copy_from_slice(self.input.field.as_slice());
        self.input.plan.execute(out, &self.pool);
    }

    /// Backward transform of the output field, in place.
    pub fn backward_image(&mut self) {
        let PlannedField { field, plan } = &mut self.output;
        plan.execute(field.as_mut_slice(), &self.pool);
    }
}
