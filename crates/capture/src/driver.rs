//! Host glue between a stored `CaptureConfig` and a `CaptureContext`.
//!
//! The driver is what a host wires into its lifecycle: `apply_config`
//! whenever settings load or change, `on_frame` once per rendered frame,
//! and `shutdown` when the graphics context goes away.

use crate::context::CaptureContext;
use crate::provider::CaptureProvider;
use framelight_core::backend::GraphicsBackend;
use framelight_core::config::CaptureConfig;
use framelight_core::error::CaptureError;
use tracing::{debug, info, warn};

/// Applies configuration to a capture context and drives it per frame.
#[derive(Debug)]
pub struct CaptureDriver<B: GraphicsBackend> {
    context: CaptureContext<B>,
    config: CaptureConfig,
}

impl<B: GraphicsBackend> CaptureDriver<B> {
    /// Wraps a fresh context around `backend`. Nothing is captured until
    /// [`apply_config`](Self::apply_config) runs.
    pub fn new(backend: B) -> Self {
        Self {
            context: CaptureContext::new(backend),
            config: CaptureConfig::default(),
        }
    }

    /// Brings the context in line with `config`.
    ///
    /// An out-of-range dimension is clamped with a warning. If the
    /// configured strategy is not available, capture stays off and this
    /// still returns `Ok`.
    pub fn apply_config(&mut self, config: CaptureConfig) -> Result<(), CaptureError> {
        if let Err(e) = config.validate() {
            warn!(error = %e, clamped = config.effective_dimension(), "reduction dimension clamped");
        }
        let dimension = config.effective_dimension();
        self.config = config;

        if !self.config.enable {
            debug!("capture disabled");
            return self.context.teardown();
        }

        let strategy = self.config.strategy;
        if !self.context.available_strategies().contains(&strategy) {
            info!(%strategy, "capture unavailable on this graphics context");
            return self.context.teardown();
        }
        if self.context.current().strategy() != Some(strategy) {
            self.context.select(strategy)?;
        }
        self.context.set_debug(self.config.debug);

        if !self.context.is_valid() {
            self.context.setup(dimension, dimension)
        } else {
            self.context.set_dimensions(dimension, dimension)
        }
    }

    /// Per-frame hook. Never fails.
    pub fn on_frame(&mut self) {
        self.context.tick();
    }

    /// Releases every capture resource.
    pub fn shutdown(&mut self) -> Result<(), CaptureError> {
        self.context.shutdown()
    }

    pub fn context(&self) -> &CaptureContext<B> {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut CaptureContext<B> {
        &mut self.context
    }

    /// The most recently applied configuration, as given (unclamped).
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }
}
