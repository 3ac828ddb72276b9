//! Error types for the framelight capture pipeline.

use crate::backend::TargetId;
use crate::strategy::Strategy;
use thiserror::Error;

/// Errors produced by capture operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The requested capture strategy is not supported by the current graphics context.
    #[error("capture strategy '{0}' is not available in this graphics context")]
    UnavailableStrategy(Strategy),

    /// `setup` was called on a provider that is already active.
    #[error("capture provider is already initialized")]
    AlreadyInitialized,

    /// An operation that needs an active provider was called before `setup`.
    #[error("capture provider is not initialized")]
    NotInitialized,

    /// A blit or readback failed on the GPU side.
    #[error("capture failed: {0}")]
    CaptureFailure(String),

    /// The reduction dimension is outside the supported range.
    #[error("reduction dimension {value} out of range [{min}, {max}]")]
    ConfigurationOutOfRange { value: i64, min: u32, max: u32 },

    /// A GPU-touching operation was invoked off the thread that owns the context.
    #[error("'{operation}' called from a thread that does not own the graphics context")]
    WrongThread { operation: &'static str },

    /// Width or height was zero when creating a grid or render target.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// A pixel buffer is smaller than the grid it is reduced into.
    #[error("pixel buffer holds {actual} bytes, {needed} needed")]
    BufferTooSmall { needed: usize, actual: usize },

    /// A target handle did not refer to a live render target.
    #[error("unknown render target {0}")]
    UnknownTarget(TargetId),

    /// The graphics backend refused an operation (allocation, completeness check).
    #[error("graphics backend error: {0}")]
    Backend(String),
}
