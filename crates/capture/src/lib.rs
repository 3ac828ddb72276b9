#![deny(unsafe_code)]
//! Capture providers, the blit engine, and the owning capture context.
//!
//! Hosts either drive a [`CaptureContext`] directly or hand their stored
//! [`CaptureConfig`](framelight_core::CaptureConfig) to a
//! [`CaptureDriver`], which keeps the context in line with it. Both work
//! against any [`GraphicsBackend`](framelight_core::GraphicsBackend).

pub mod affinity;
pub mod blit;
pub mod context;
pub mod driver;
pub mod provider;
pub mod target;

pub use affinity::ThreadAffinity;
pub use blit::BlitEngine;
pub use context::CaptureContext;
pub use driver::CaptureDriver;
pub use provider::{BlitProvider, CaptureProvider, NullProvider, ProviderKind};
pub use target::{ReductionTarget, REDUCTION_FILTER};
