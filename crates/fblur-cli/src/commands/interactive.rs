//! Interactive command
//!
//! Line-driven stand-in for a sigma slider. The pipeline is initialized
//! once and each request recomputes the whole image synchronously before
//! the next line is read.
//!
//! ```text
//! sigma[1]> 12      recompute with sigma 12
//! sigma[12]> s       save the current result (an empty line does the same)
//! sigma[12]> q       quit (EOF too)
//! ```

use super::GlobalOpts;
use crate::InteractiveArgs;
use anyhow::{Context, Result};
use fblur_core::RgbImage;
use fblur_ops::{ConvolutionPipeline, KernelSpec, SIGMA_MAX, SIGMA_MIN};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, trace};

/// Sigma shown before the first request.
const INITIAL_SIGMA: u32 = 1;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Request {
    Sigma(i64),
    Save,
    Quit,
    Unknown(String),
}

impl Request {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        match line.to_ascii_lowercase().as_str() {
            "" | "s" | "save" => Request::Save,
            "q" | "quit" | "exit" => Request::Quit,
            other => match other.parse::<i64>() {
                Ok(value) => Request::Sigma(value),
                Err(_) => Request::Unknown(line.to_string()),
            },
        }
    }
}

/// Blurred image plus the sigma it was computed with.
struct Session {
    pipeline: ConvolutionPipeline,
    source: RgbImage,
    blurred: RgbImage,
    sigma: u32,
}

impl Session {
    fn recompute(&mut self, sigma: u32) -> Result<()> {
        let spec = KernelSpec::gaussian(sigma as f32)?;
        super::warn_if_truncated(&spec, self.pipeline.canvas_size());
        let start = Instant::now();
        self.pipeline.compute(&self.source, &mut self.blurred, &spec)?;
        self.sigma = sigma;
        info!(sigma, elapsed = ?start.elapsed(), "recomputed");
        Ok(())
    }
}

pub fn run(args: InteractiveArgs, opts: &GlobalOpts) -> Result<()> {
    trace!(input = %args.input.display(), output = %args.output.display(), "interactive::run");

    let source = super::load_image(&args.input)?;
    let (w, h) = source.dimensions();
    let first = KernelSpec::gaussian(INITIAL_SIGMA as f32)?;
    let config = super::pipeline_config(&first, args.border, opts);
    let pipeline =
        ConvolutionPipeline::initialize(w, h, config).context("Failed to initialize pipeline")?;

    let mut session = Session {
        pipeline,
        source,
        blurred: RgbImage::new(w, h),
        sigma: INITIAL_SIGMA,
    };
    session.recompute(INITIAL_SIGMA)?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    drive(&mut session, &args.output, opts, stdin.lock(), stdout.lock())?;

    session.pipeline.shutdown();
    Ok(())
}

/// Reads requests until `quit` or end of input.
fn drive<R: BufRead, W: Write>(
    session: &mut Session,
    output: &Path,
    opts: &GlobalOpts,
    input: R,
    mut out: W,
) -> Result<()> {
    let (lo, hi) = (SIGMA_MIN as i64, SIGMA_MAX as i64);
    writeln!(
        out,
        "sigma {}..={} | s/save or empty line: save to {} | q/quit",
        lo,
        hi,
        output.display()
    )?;
    prompt(&mut out, session.sigma)?;

    for line in input.lines() {
        let line = line.context("Failed to read stdin")?;
        match Request::parse(&line) {
            Request::Quit => break,
            Request::Save => {
                super::save_image(output, &session.blurred, opts)?;
                writeln!(out, "saved {} (sigma {})", output.display(), session.sigma)?;
            }
            Request::Sigma(value) if (lo..=hi).contains(&value) => {
                session.recompute(value as u32)?;
            }
            Request::Sigma(value) => {
                writeln!(out, "sigma {} out of range {}..={}, ignored", value, lo, hi)?;
            }
            Request::Unknown(text) => {
                debug!(input = %text, "unrecognized request");
                writeln!(out, "unrecognized input '{}'", text)?;
            }
        }
        prompt(&mut out, session.sigma)?;
    }
    writeln!(out)?;
    Ok(())
}

fn prompt<W: Write>(out: &mut W, sigma: u32) -> io::Result<()> {
    write!(out, "sigma[{}]> ", sigma)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fblur_ops::{BorderPolicy, PipelineConfig, PlanEffort};
    use std::io::Cursor;

    const OPTS: GlobalOpts = GlobalOpts {
        threads: 1,
        effort: PlanEffort::Estimate,
        quality: 90,
    };

    fn session(w: u32, h: u32) -> Session {
        let config = PipelineConfig::default()
            .with_border(BorderPolicy::Reflect { size: 4 })
            .with_engine(OPTS.engine());
        let mut source = RgbImage::new(w, h);
        source.set_pixel(w / 2, h / 2, [255, 255, 255]);
        Session {
            pipeline: ConvolutionPipeline::initialize(w, h, config).unwrap(),
            source,
            blurred: RgbImage::new(w, h),
            sigma: INITIAL_SIGMA,
        }
    }

    #[test]
    fn test_parse_requests() {
        assert_eq!(Request::parse("12\n"), Request::Sigma(12));
        assert_eq!(Request::parse("  -3 "), Request::Sigma(-3));
        assert_eq!(Request::parse(""), Request::Save);
        assert_eq!(Request::parse("SAVE"), Request::Save);
        assert_eq!(Request::parse("q"), Request::Quit);
        assert_eq!(Request::parse("2.5"), Request::Unknown("2.5".into()));
    }

    #[test]
    fn test_out_of_range_sigma_is_ignored() {
        let mut s = session(16, 16);
        let mut out = Vec::new();
        let input = Cursor::new("0\n101\n3\nquit\n");
        drive(&mut s, Path::new("unused.png"), &OPTS, input, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("sigma 0 out of range"));
        assert!(text.contains("sigma 101 out of range"));
        assert_eq!(s.sigma, 3);
    }

    #[test]
    fn test_save_writes_current_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("current.png");

        let mut s = session(12, 10);
        s.recompute(2).unwrap();
        drive(&mut s, &path, &OPTS, Cursor::new("\n"), io::sink()).unwrap();

        let saved = fblur_io::read(&path).unwrap();
        assert_eq!(saved, s.blurred);
    }
}
