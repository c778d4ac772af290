//! fblur - frequency-domain image blur
//!
//! One-shot blur, sigma sweeps and an interactive sigma session on top of
//! the reusable convolution pipeline.

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use fblur_ops::PlanEffort;
use std::path::PathBuf;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "fblur")]
#[command(author, version, about = "Frequency-domain Gaussian blur")]
#[command(long_about = "
Blurs RGB images by multiplying their 2D Fourier transform with the
transform of a Gaussian (or a small fixed weight table).

Examples:
  fblur blur image.jpg -o blurred.png --sigma 12
  fblur blur image.jpg -o soft.png --kernel binomial5
  fblur sweep image.jpg -o frames --from 1 --to 40 --step 3
  fblur interactive image.jpg -o blurred.png
  fblur -vv --log-file fblur.log blur image.jpg -o out.png
  fblur blur image.jpg -o blurred.jpg --quality 75
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of transform threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Transform planning effort
    #[arg(long, global = true, value_enum, default_value = "measure")]
    plan: PlanArg,

    /// JPEG output quality (1-100)
    #[arg(long, global = true, default_value = "90",
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Blur one image and save the result
    #[command(visible_alias = "b")]
    Blur(BlurArgs),

    /// Blur one image for a range of sigma values, reusing one pipeline
    Sweep(SweepArgs),

    /// Read sigma values from stdin and recompute on each one
    #[command(visible_alias = "i")]
    Interactive(InteractiveArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PlanArg {
    /// Default planner, no timing
    Estimate,
    /// Time candidate plans and keep the fastest
    Measure,
}

impl From<PlanArg> for PlanEffort {
    fn from(arg: PlanArg) -> Self {
        match arg {
            PlanArg::Estimate => PlanEffort::Estimate,
            PlanArg::Measure => PlanEffort::Measure,
        }
    }
}

#[derive(Args)]
struct BlurArgs {
    /// Input image
    #[arg(default_value = "image.jpg")]
    input: PathBuf,

    /// Output image (.png or .jpg)
    #[arg(short, long, default_value = "blurred.png")]
    output: PathBuf,

    /// Gaussian standard deviation in pixels (1-100)
    #[arg(short, long, conflicts_with = "kernel")]
    sigma: Option<f32>,

    /// Fixed weight table instead of a Gaussian: binomial3, binomial5, binomial7
    #[arg(short, long)]
    kernel: Option<String>,

    /// Mirrored border in pixels (0 disables; default 100 for Gaussian, 0 for tables)
    #[arg(long)]
    border: Option<usize>,
}

#[derive(Args)]
struct SweepArgs {
    /// Input image
    input: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// First sigma
    #[arg(long, default_value = "1")]
    from: f32,

    /// Last sigma (inclusive)
    #[arg(long, default_value = "100")]
    to: f32,

    /// Sigma increment
    #[arg(long, default_value = "1")]
    step: f32,

    /// Mirrored border in pixels (0 disables)
    #[arg(long)]
    border: Option<usize>,
}

#[derive(Args)]
struct InteractiveArgs {
    /// Input image
    #[arg(default_value = "image.jpg")]
    input: PathBuf,

    /// Where `save` writes the current result
    #[arg(short, long, default_value = "blurred.png")]
    output: PathBuf,

    /// Mirrored border in pixels (0 disables)
    #[arg(long)]
    border: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = logging::init(cli.verbose, cli.log_file.as_deref())?;

    let opts = commands::GlobalOpts {
        threads: cli.threads,
        effort: cli.plan.into(),
        quality: cli.quality,
    };

    match cli.command {
        Commands::Blur(args) => commands::blur::run(args, &opts),
        Commands::Sweep(args) => commands::sweep::run(args, &opts),
        Commands::Interactive(args) => commands::interactive::run(args, &opts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_blur_defaults() {
        let cli = Cli::try_parse_from(["fblur", "blur"]).unwrap();
        assert_eq!(cli.plan, PlanArg::Measure);
        assert_eq!(cli.threads, 0);
        assert_eq!(cli.quality, 90);
        match cli.command {
            Commands::Blur(args) => {
                assert_eq!(args.input, PathBuf::from("image.jpg"));
                assert_eq!(args.output, PathBuf::from("blurred.png"));
                assert!(args.sigma.is_none());
                assert!(args.kernel.is_none());
            }
            _ => panic!("expected blur"),
        }
    }

    #[test]
    fn test_sigma_conflicts_with_kernel() {
        assert!(Cli::try_parse_from([
            "fblur", "blur", "--sigma", "3", "--kernel", "binomial3"
        ])
        .is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "fblur", "sweep", "in.png", "-o", "out", "-vv", "-j", "4", "--plan", "estimate",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.threads, 4);
        assert_eq!(PlanEffort::from(cli.plan), PlanEffort::Estimate);
    }

    #[test]
    fn test_quality_range() {
        let cli = Cli::try_parse_from(["fblur", "blur", "-o", "out.jpg", "--quality", "75"]).unwrap();
        assert_eq!(cli.quality, 75);
        assert!(Cli::try_parse_from(["fblur", "blur", "--quality", "0"]).is_err());
        assert!(Cli::try_parse_from(["fblur", "blur", "--quality", "101"]).is_err());
    }
}
