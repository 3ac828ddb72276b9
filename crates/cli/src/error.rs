//! Structured CLI errors with meaningful exit codes.
//!
//! Exit code scheme:
//! - 0:  success
//! - 2:  clap arg parse error (automatic, before our code runs)
//! - 10: capture error (unavailable strategy, failed blit or readback)
//! - 11: I/O error (image read)
//! - 12: input error (bad GL version, bad JSON config, undecodable image)
//! - 13: serialization error

use framelight_core::CaptureError;
use std::fmt;

/// Errors produced by CLI operations, each mapped to a distinct exit code.
#[derive(Debug)]
pub enum CliError {
    /// A capture-level error.
    Capture(CaptureError),
    /// An I/O error (image read).
    Io(String),
    /// A user input error (bad version string, bad JSON config).
    Input(String),
    /// A serialization error (JSON output failure).
    Serialization(String),
}

impl CliError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Capture(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Capture(e) => write!(f, "{e}"),
            CliError::Io(msg) => write!(f, "{msg}"),
            CliError::Input(msg) => write!(f, "{msg}"),
            CliError::Serialization(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<CaptureError> for CliError {
    fn from(e: CaptureError) -> Self {
        match e {
            CaptureError::ConfigurationOutOfRange { .. } => CliError::Input(e.to_string()),
            other => CliError::Capture(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}

impl From<image::ImageError> for CliError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::IoError(io) => CliError::Io(io.to_string()),
            other => CliError::Input(other.to_string()),
        }
    }
}
