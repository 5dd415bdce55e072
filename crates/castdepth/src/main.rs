//! castdepth command line.
//!
//! # Usage
//!
//! - `castdepth --target Down --reference Up --output depth90`
//! - `castdepth --config batch.json`
//!
//! Flags given alongside `--config` override the file's render options.
//! `--backend software` forces the CPU rasterizer.
//! Set `RUST_LOG=debug` to see camera parameters per pair.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use castdepth::{run_batch, BatchConfig, Framing, RenderBackend};
use clap::{Parser, ValueEnum};

/// Rasterizer choice on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// GPU when an adapter is available, CPU otherwise
    Auto,
    /// GPU only; fail without an adapter
    Gpu,
    /// CPU software Z-buffer
    Software,
}

impl From<Backend> for RenderBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Auto => Self::Auto,
            Backend::Gpu => Self::Gpu,
            Backend::Software => Self::Software,
        }
    }
}

/// Depth-map training images from paired dental casts
#[derive(Parser, Debug)]
#[command(name = "castdepth")]
#[command(about = "Render depth maps of matching upper/lower cast pairs", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON batch configuration file
    #[arg(short, long, conflicts_with_all = ["target", "reference"])]
    config: Option<PathBuf>,

    /// Directory of casts to rotate and render
    #[arg(short, long, requires = "reference")]
    target: Option<PathBuf>,

    /// Directory of opposing casts, matched by file name
    #[arg(short, long, requires = "target")]
    reference: Option<PathBuf>,

    /// Output directory for the PNG depth maps
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Image width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Alignment rotation about the target's centroid, in degrees
    #[arg(long, allow_hyphen_values = true)]
    angle: Option<f32>,

    /// Also draw the reference cast into the depth map
    #[arg(long)]
    include_reference: bool,

    /// Lay each cast flat on its oriented bounding box before rotating
    #[arg(long)]
    obb_framing: bool,

    /// Fill enclosed background holes and blank spans between cast walls
    #[arg(long)]
    fill_holes: bool,

    /// Rasterizer to use
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Continue with the next pair when one fails
    #[arg(long)]
    keep_going: bool,
}

impl Cli {
    /// Builds the batch configuration from the config file and/or flags.
    fn into_config(self) -> Result<BatchConfig> {
        let mut config = match (&self.config, &self.target, &self.reference) {
            (Some(path), _, _) => BatchConfig::from_json_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            (None, Some(target), Some(reference)) => {
                let Some(output) = &self.output else {
                    bail!("--output is required with --target/--reference");
                };
                BatchConfig::single(target, reference, output)
            }
            _ => bail!("either --config or --target/--reference must be given"),
        };

        if let Some(output) = self.output {
            config.output_dir = output;
        }
        if let Some(width) = self.width {
            config.render.width = width;
        }
        if let Some(height) = self.height {
            config.render.height = height;
        }
        if let Some(angle) = self.angle {
            config.render.rotation.degrees = angle;
        }
        config.render.include_reference |= self.include_reference;
        config.render.fill_holes |= self.fill_holes;
        if self.obb_framing {
            config.render.framing = Framing::ObbAligned;
        }
        if let Some(backend) = self.backend {
            config.render.backend = backend.into();
        }
        config.keep_going |= self.keep_going;

        if config.render.width == 0 || config.render.height == 0 {
            bail!(
                "image size must be non-zero, got {}x{}",
                config.render.width,
                config.render.height
            );
        }
        Ok(config)
    }
}

fn run(cli: Cli) -> Result<bool> {
    let config = cli.into_config()?;
    let report = run_batch(&config).context("batch failed")?;
    if !report.is_success() {
        log::error!("{} pair(s) failed: {:?}", report.failed.len(), report.failed);
    }
    Ok(report.is_success())
}

fn main() -> ExitCode {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
