#![deny(unsafe_code)]
//! Core types and traits for the framelight capture pipeline.
//!
//! Provides the `Color`/`ColorGrid` data model, the `PixelReducer` that
//! turns an RGBA8 readback into a grid plus an average, `CaptureConfig`,
//! capability-gated `Strategy` detection, the `GraphicsBackend` trait, and
//! an in-memory `SoftwareBackend`. The `render` feature adds a `glow`
//! implementation of the backend.

pub mod backend;
pub mod color;
pub mod config;
pub mod error;
pub mod grid;
pub mod params;
pub mod reduce;
pub mod software;
pub mod strategy;

#[cfg(feature = "render")]
pub mod render;

pub use backend::{Filter, GraphicsBackend, Surface, SurfaceInfo, TargetId};
pub use color::Color;
pub use config::CaptureConfig;
pub use error::CaptureError;
pub use grid::ColorGrid;
pub use reduce::{PixelBuffer, PixelReducer};
pub use software::SoftwareBackend;
pub use strategy::{available_strategies, ApiVersion, Capabilities, Strategy, StrategySet};
