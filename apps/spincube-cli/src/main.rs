use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use spincube_assets::ShaderPair;
use spincube_backend::{RecordingBackend, RecordingOptions, SurfaceSize};
use spincube_harness::{
    CancellationToken, FaultFlag, HarnessConfig, HarnessError, RenderLoop, RunSummary,
    ShaderInputs,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spincube", about = "Spinning-cube backend stress harness")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print harness version and crate info
    Info,
    /// Print the default configuration as JSON
    DefaultConfig,
    /// Drive the cube through the headless recording backend
    Run {
        /// Stop after this many frames; 0 runs until killed
        #[arg(short, long, default_value = "600")]
        frames: u64,
        /// JSON config file; missing fields take defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Native surface width reported by the backend
        #[arg(long, default_value = "800")]
        width: u32,
        /// Native surface height reported by the backend
        #[arg(long, default_value = "480")]
        height: u32,
        /// Raise the fault signal so the clear colour pulses
        #[arg(long)]
        fault: bool,
        /// Precompiled vertex shader binary
        #[arg(long, requires = "fragment_binary")]
        vertex_binary: Option<PathBuf>,
        /// Precompiled fragment shader binary
        #[arg(long, requires = "vertex_binary")]
        fragment_binary: Option<PathBuf>,
    },
}

struct RunArgs {
    frames: u64,
    config: Option<PathBuf>,
    native_size: SurfaceSize,
    fault: bool,
    binaries: Option<(PathBuf, PathBuf)>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match dispatch(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<HarnessError>() {
            Some(harness) => {
                tracing::error!(error = %harness, status = harness.exit_code(), "harness failed");
                ExitCode::from(exit_status(harness.exit_code()))
            }
            None => {
                eprintln!("Error: {err:#}");
                ExitCode::FAILURE
            }
        },
    }
}

/// Fold a driver status into the 8 bits a process can report, never
/// collapsing a failure into success.
fn exit_status(code: i32) -> u8 {
    match (code & 0xFF) as u8 {
        0 => 1,
        status => status,
    }
}

fn dispatch(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Info => {
            println!("spincube v{}", env!("CARGO_PKG_VERSION"));
            println!("math: {}", spincube_math::crate_info());
            println!("backend: {}", spincube_backend::crate_info());
            println!("assets: {}", spincube_assets::crate_info());
            println!("harness: {}", spincube_harness::crate_info());
        }
        Commands::DefaultConfig => {
            let json = serde_json::to_string_pretty(&HarnessConfig::default())?;
            println!("{json}");
        }
        Commands::Run {
            frames,
            config,
            width,
            height,
            fault,
            vertex_binary,
            fragment_binary,
        } => {
            let args = RunArgs {
                frames,
                config,
                native_size: SurfaceSize { width, height },
                fault,
                binaries: vertex_binary.zip(fragment_binary),
            };
            let summary = run(args)?;
            println!(
                "Presented {} frames (counter={}, avg frame {:?}, p95 frame {:?}, max frame {:?})",
                summary.frames_presented,
                summary.final_counter,
                summary.average_frame_time,
                summary.p95_frame_time,
                summary.max_frame_time
            );
        }
    }

    Ok(())
}

fn run(args: RunArgs) -> anyhow::Result<RunSummary> {
    let config = match &args.config {
        Some(path) => HarnessConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => HarnessConfig::default(),
    };

    let mut shaders = ShaderInputs::default();
    let mut options = RecordingOptions {
        native_size: args.native_size,
        record_calls: false,
        ..RecordingOptions::default()
    };
    if let Some((vertex, fragment)) = &args.binaries {
        shaders.binary = Some(
            ShaderPair::load_binaries(vertex, fragment).context("loading shader binaries")?,
        );
        options.accepts_binary = true;
    }

    let flag = FaultFlag::new();
    if args.fault {
        flag.raise();
    }

    let cancel = if args.frames == 0 {
        CancellationToken::never()
    } else {
        CancellationToken::after_frames(args.frames)
    };

    let backend = RecordingBackend::new(options);
    let log = backend.log();
    let mut render_loop = RenderLoop::new(backend, config)
        .with_shaders(shaders)
        .with_fault_signal(flag);

    let summary = render_loop.run(&cancel)?;
    let stats = log.stats();
    tracing::debug!(
        draws = stats.draws,
        flushes = stats.flushes,
        presents = stats.presents,
        "backend counters"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_status_keeps_low_byte() {
        assert_eq!(exit_status(3), 3);
        assert_eq!(exit_status(-1), 255);
        assert_eq!(exit_status(-5), 251);
    }

    #[test]
    fn exit_status_never_reports_success() {
        assert_eq!(exit_status(256), 1);
        assert_eq!(exit_status(-256), 1);
    }

    #[test]
    fn harness_error_survives_anyhow() {
        let err = anyhow::Error::from(HarnessError::NoUsableShaders);
        let harness = err.downcast_ref::<HarnessError>().unwrap();
        assert_eq!(exit_status(harness.exit_code()), 2);
    }
}
