//! GPU copy-with-resize from the host framebuffer into a reduction target.
//!
//! `BlitEngine` holds the one-time state a blit needs: whether the context
//! supports it at all, and an intermediate resolve target. A multisampled
//! source cannot be resampled in one step, so it is first copied 1:1 into
//! the resolve target (recreated whenever the source size changes) and
//! then resampled from there.
//!
//! Every blit re-binds whatever surface was bound before it, on success
//! and on failure, so the host's next draw lands where it expects. A
//! failed blit moves the engine to `Failed`; `is_valid()` then reports
//! `false` until [`BlitEngine::reset`] is called. Nothing retries on its own.

use framelight_core::backend::{Filter, GraphicsBackend, Surface, SurfaceInfo, TargetId};
use framelight_core::error::CaptureError;
use framelight_core::strategy::Strategy;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
enum EngineState {
    Uninitialized,
    Ready,
    Failed(String),
}

/// Performs blits between surfaces of possibly different sizes.
#[derive(Debug)]
pub struct BlitEngine {
    state: EngineState,
    resolve: Option<(TargetId, SurfaceInfo)>,
}

impl BlitEngine {
    /// Creates an engine in the uninitialized state. No GPU work happens
    /// until [`ensure_ready`](Self::ensure_ready).
    pub fn new() -> Self {
        Self {
            state: EngineState::Uninitialized,
            resolve: None,
        }
    }

    /// One-time initialization; later calls return the cached outcome.
    ///
    /// Returns `true` if the engine can blit on this backend.
    pub fn ensure_ready(&mut self, backend: &dyn GraphicsBackend) -> bool {
        if self.state == EngineState::Uninitialized {
            if backend.available_strategies().contains(&Strategy::Blit) {
                debug!("blit engine ready");
                self.state = EngineState::Ready;
            } else {
                let reason = "context does not support framebuffer blits".to_string();
                warn!(%reason, "blit engine unavailable");
                self.state = EngineState::Failed(reason);
            }
        }
        self.is_valid()
    }

    /// Returns `true` if the engine is initialized and no blit has failed.
    pub fn is_valid(&self) -> bool {
        self.state == EngineState::Ready
    }

    /// Why the engine stopped, if it did.
    pub fn failure(&self) -> Option<&str> {
        match &self.state {
            EngineState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Returns the engine to the uninitialized state so the next
    /// [`ensure_ready`](Self::ensure_ready) re-checks the context.
    pub fn reset(&mut self) {
        self.state = EngineState::Uninitialized;
    }

    /// Copies all of `src` into all of `dst`, resampling with `filter`.
    ///
    /// Restores the previously bound surface before returning. Any failure
    /// leaves the engine invalid and is returned as `CaptureFailure`.
    pub fn blit(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        src: Surface,
        dst: Surface,
        filter: Filter,
    ) -> Result<(), CaptureError> {
        if !self.is_valid() {
            return Err(CaptureError::CaptureFailure(format!(
                "blit engine is not ready: {}",
                self.failure().unwrap_or("not initialized")
            )));
        }
        let previous = backend.bound_surface();
        let copied = self.copy(backend, src, dst, filter);
        let restored = backend.bind_surface(previous);
        match copied.and(restored) {
            Ok(()) => Ok(()),
            Err(e) => {
                let reason = e.to_string();
                warn!(%reason, "blit failed; engine disabled");
                self.state = EngineState::Failed(reason.clone());
                Err(match e {
                    CaptureError::CaptureFailure(_) => e,
                    _ => CaptureError::CaptureFailure(reason),
                })
            }
        }
    }

    /// Frees the resolve target. The owning context calls this on shutdown.
    pub fn release(&mut self, backend: &mut dyn GraphicsBackend) {
        if let Some((id, _)) = self.resolve.take() {
            backend.delete_target(id);
        }
    }

    /// Whether a resolve target is currently allocated.
    pub fn holds_resolve_target(&self) -> bool {
        self.resolve.is_some()
    }

    fn copy(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        src: Surface,
        dst: Surface,
        filter: Filter,
    ) -> Result<(), CaptureError> {
        let src_info = backend.surface_info(src)?;
        let dst_info = backend.surface_info(dst)?;
        if src_info.is_multisampled() && !src_info.same_size(&dst_info) {
            let resolve = self.resolve_target(backend, &src_info)?;
            backend.blit(src, resolve, Filter::Nearest)?;
            backend.blit(resolve, dst, filter)
        } else {
            backend.blit(src, dst, filter)
        }
    }

    fn resolve_target(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        src_info: &SurfaceInfo,
    ) -> Result<Surface, CaptureError> {
        match self.resolve {
            Some((id, info)) if info.same_size(src_info) => return Ok(Surface::Target(id)),
            Some((id, _)) => {
                backend.delete_target(id);
                self.resolve = None;
            }
            None => {}
        }
        let id = backend.create_target(src_info.width, src_info.height, Filter::Nearest)?;
        debug!(width = src_info.width, height = src_info.height, "resolve target created");
        self.resolve = Some((id, SurfaceInfo::new(src_info.width, src_info.height)));
        Ok(Surface::Target(id))
    }
}

impl Default for BlitEngine {
    fn default() -> Self {
        Self::new()
    }
}
