//! The owning capture context.
//!
//! `CaptureContext` holds the graphics backend, the blit engine, and the
//! one active provider. Hosts construct it on the render thread and drive
//! it from there; nothing in here is global.

use crate::affinity::ThreadAffinity;
use crate::blit::BlitEngine;
use crate::provider::{CaptureProvider, ProviderKind};
use framelight_core::backend::GraphicsBackend;
use framelight_core::color::Color;
use framelight_core::error::CaptureError;
use framelight_core::grid::ColorGrid;
use framelight_core::strategy::{Strategy, StrategySet};
use tracing::{debug, error, info};

/// Owns everything needed to capture from one graphics context.
#[derive(Debug)]
pub struct CaptureContext<B: GraphicsBackend> {
    backend: B,
    blitter: BlitEngine,
    provider: ProviderKind,
    affinity: ThreadAffinity,
}

impl<B: GraphicsBackend> CaptureContext<B> {
    /// Wraps `backend` with a null provider installed. The calling thread
    /// becomes the owning render thread.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            blitter: BlitEngine::new(),
            provider: ProviderKind::null(),
            affinity: ThreadAffinity::current(),
        }
    }

    /// Strategies the backend currently supports. Empty means capture is
    /// simply unavailable, not an error.
    pub fn available_strategies(&self) -> StrategySet {
        self.backend.available_strategies()
    }

    /// Tears down the active provider and installs a fresh one for
    /// `strategy`.
    ///
    /// On `UnavailableStrategy` the active provider is left untouched.
    pub fn select(&mut self, strategy: Strategy) -> Result<(), CaptureError> {
        self.affinity.check("select")?;
        if !self.available_strategies().contains(&strategy) {
            return Err(CaptureError::UnavailableStrategy(strategy));
        }
        self.provider.teardown(&mut self.backend);
        self.provider = ProviderKind::for_strategy(strategy);
        info!(%strategy, "capture strategy selected");
        Ok(())
    }

    /// The active provider.
    pub fn current(&self) -> &ProviderKind {
        &self.provider
    }

    pub fn current_mut(&mut self) -> &mut ProviderKind {
        &mut self.provider
    }

    pub fn setup(&mut self, width: u32, height: u32) -> Result<(), CaptureError> {
        self.affinity.check("setup")?;
        self.provider
            .setup(&mut self.backend, &mut self.blitter, width, height)
    }

    /// Releases the active provider's resources. Safe to call repeatedly.
    pub fn teardown(&mut self) -> Result<(), CaptureError> {
        self.affinity.check("teardown")?;
        self.provider.teardown(&mut self.backend);
        Ok(())
    }

    /// Captures one frame, returning any failure.
    pub fn update(&mut self) -> Result<(), CaptureError> {
        self.affinity.check("update")?;
        self.provider.update(&mut self.backend, &mut self.blitter)
    }

    /// Render-loop entry point: like [`update`](Self::update), but failures
    /// are logged and dropped so the frame always continues.
    pub fn tick(&mut self) {
        if let Err(e) = self.update() {
            error!(error = %e, "capture update failed; keeping previous frame");
        }
    }

    pub fn set_dimensions(&mut self, width: u32, height: u32) -> Result<(), CaptureError> {
        self.affinity.check("set_dimensions")?;
        self.provider.set_dimensions(&mut self.backend, width, height)
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.provider.set_debug(debug);
    }

    pub fn color_map(&self) -> Option<&ColorGrid> {
        self.provider.color_map()
    }

    pub fn average(&self) -> Option<Color> {
        self.provider.average()
    }

    pub fn is_valid(&self) -> bool {
        self.provider.is_valid()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn blit_engine(&self) -> &BlitEngine {
        &self.blitter
    }

    /// Clears a failed blit engine so the next setup re-checks the context.
    pub fn reset_blit_engine(&mut self) {
        self.blitter.reset();
    }

    /// Tears down the provider, frees the blit engine's resources, and
    /// reinstalls the null provider.
    pub fn shutdown(&mut self) -> Result<(), CaptureError> {
        self.affinity.check("shutdown")?;
        self.provider.teardown(&mut self.backend);
        self.blitter.release(&mut self.backend);
        self.provider = ProviderKind::null();
        debug!("capture context shut down");
        Ok(())
    }

    /// Gives the backend back, releasing capture resources first.
    pub fn into_backend(mut self) -> Result<B, CaptureError> {
        self.shutdown()?;
        Ok(self.backend)
    }
}
