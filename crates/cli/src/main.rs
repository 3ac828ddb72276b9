#![deny(unsafe_code)]
//! CLI for the framelight capture pipeline.
//!
//! Subcommands:
//! - `strategies`: report which capture strategies a described GL context offers
//! - `reduce <image>`: run the capture pipeline over an image and print the grid

mod error;
mod host;
mod report;

use clap::{Parser, Subcommand};
use error::CliError;
use framelight_capture::CaptureDriver;
use framelight_core::{
    available_strategies, ApiVersion, CaptureConfig, CaptureError, Capabilities, SoftwareBackend,
};
use std::path::PathBuf;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "framelight", about = "Framebuffer capture and color reduction")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the capture strategies a GL context would support.
    Strategies {
        /// Context version as MAJOR.MINOR.
        #[arg(long, default_value = "3.0")]
        gl_version: String,

        /// The context is OpenGL ES.
        #[arg(long)]
        es: bool,

        /// Advertised extension (repeatable).
        #[arg(long = "ext")]
        extensions: Vec<String>,

        /// Framebuffer objects are unsupported or disabled by the host.
        #[arg(long)]
        no_framebuffer: bool,
    },
    /// Capture an image as if it were the host framebuffer and reduce it.
    Reduce {
        /// PNG image to use as the host framebuffer.
        image: PathBuf,

        /// Reduction dimension N (clamped to 2..=64).
        #[arg(short, long)]
        dim: Option<i64>,

        /// Number of frames to capture.
        #[arg(short, long, default_value_t = 1)]
        frames: usize,

        /// Enable debug mode (overlay plus per-frame average logging).
        #[arg(long)]
        debug: bool,

        /// Treat the host framebuffer as multisampled with this many samples.
        #[arg(long, default_value_t = 1)]
        samples: u32,

        /// Capture configuration as a JSON string.
        #[arg(long, default_value = "{}")]
        config: String,
    },
}

fn parse_version(s: &str, embedded: bool) -> Result<ApiVersion, CliError> {
    let invalid = || CliError::Input(format!("invalid --gl-version '{s}': expected MAJOR.MINOR"));
    let (major, minor) = s.split_once('.').ok_or_else(invalid)?;
    let major = major.trim().parse().map_err(|_| invalid())?;
    let minor = minor.trim().parse().map_err(|_| invalid())?;
    Ok(if embedded {
        ApiVersion::embedded(major, minor)
    } else {
        ApiVersion::desktop(major, minor)
    })
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Strategies {
            gl_version,
            es,
            extensions,
            no_framebuffer,
        } => {
            let version = parse_version(&gl_version, es)?;
            let caps = Capabilities {
                framebuffer_supported: !no_framebuffer,
                framebuffer_enabled: !no_framebuffer,
                version,
                extensions: extensions.into_iter().collect(),
            };
            let strategies = available_strategies(&caps);
            if cli.json {
                let info = report::strategies_json(&version.to_string(), &strategies);
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else if strategies.is_empty() {
                println!("No capture strategies available for {version}");
            } else {
                println!("Strategies for {version}:");
                for s in &strategies {
                    println!("  {s}");
                }
            }
        }
        Command::Reduce {
            image,
            dim,
            frames,
            debug,
            samples,
            config,
        } => {
            let params: serde_json::Value = serde_json::from_str(&config)
                .map_err(|e| CliError::Input(format!("invalid --config JSON: {e}")))?;
            let mut config = CaptureConfig::from_json(&params);
            if let Some(n) = dim {
                config.reduction_dimension = n;
            }
            config.debug |= debug;

            let host = host::load_image(&image)?;
            let mut backend = SoftwareBackend::new(host.width, host.height);
            backend.set_host_samples(samples);
            let mut driver = CaptureDriver::new(backend);
            driver.apply_config(config)?;

            for _ in 0..frames {
                // The host redraws every frame; the debug overlay must not
                // leak into the next capture.
                driver
                    .context_mut()
                    .backend_mut()
                    .set_host_image(host.width, host.height, &host.rgba)?;
                driver.on_frame();
            }

            let ctx = driver.context();
            if let Some(reason) = ctx.blit_engine().failure() {
                return Err(CliError::Capture(CaptureError::CaptureFailure(
                    reason.to_string(),
                )));
            }
            let (Some(grid), Some(average)) = (ctx.color_map(), ctx.average()) else {
                return Err(CliError::Capture(CaptureError::NotInitialized));
            };
            info!(frames, average = %average, "reduction finished");

            if cli.json {
                let info = report::reduction_json(
                    &image.display().to_string(),
                    (host.width, host.height),
                    frames,
                    average,
                    grid,
                );
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!(
                    "{} ({}x{}) -> {}x{} grid, average {average}",
                    image.display(),
                    host.width,
                    host.height,
                    grid.width(),
                    grid.height()
                );
                println!("{}", report::grid_text(grid));
            }
            driver.shutdown()?;
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_version_accepts_major_minor() {
        let v = parse_version("3.2", false).unwrap();
        assert_eq!(v, ApiVersion::desktop(3, 2));
        let es = parse_version("3.0", true).unwrap();
        assert!(es.embedded);
    }

    #[test]
    fn parse_version_rejects_garbage() {
        for bad in ["3", "three.zero", "", "3.x"] {
            let err = parse_version(bad, false).err().unwrap();
            assert_eq!(err.exit_code(), 12, "accepted {bad:?}");
        }
    }

    #[test]
    fn cli_parses_reduce_arguments() {
        let cli = Cli::try_parse_from([
            "framelight", "--json", "reduce", "shot.png", "--dim", "8", "--frames", "3", "--debug",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Command::Reduce { dim, frames, debug, .. } => {
                assert_eq!(dim, Some(8));
                assert_eq!(frames, 3);
                assert!(debug);
            }
            Command::Strategies { .. } => panic!("expected reduce"),
        }
    }
}
