//! The `CaptureProvider` trait and its implementations.
//!
//! A provider owns one reduction target and turns the host framebuffer
//! into a [`ColorGrid`] plus an average [`Color`] once per frame. The
//! trait is object-safe; [`ProviderKind`] is the closed set the capture
//! context swaps between.
//!
//! Lifecycle: `setup` allocates (fails with `AlreadyInitialized` if
//! already active), `teardown` releases and is always safe to call,
//! `set_dimensions` resizes an active provider. `update` on an inactive
//! provider does nothing.

use crate::blit::BlitEngine;
use crate::target::{ReductionTarget, REDUCTION_FILTER};
use framelight_core::backend::{GraphicsBackend, Surface};
use framelight_core::color::Color;
use framelight_core::error::CaptureError;
use framelight_core::grid::ColorGrid;
use framelight_core::reduce::PixelReducer;
use framelight_core::strategy::Strategy;
use tracing::{debug, warn};

/// Size of the on-screen debug overlay, in host pixels.
pub const DEBUG_OVERLAY_SIZE: u32 = 200;

/// Captures the host framebuffer into a reduced color grid.
///
/// Every method that touches GPU state takes the backend explicitly;
/// providers never hold on to it.
pub trait CaptureProvider {
    /// The strategy this provider implements, `None` for the null provider.
    fn strategy(&self) -> Option<Strategy>;

    /// Allocates the reduction target and buffers at `width` x `height`.
    fn setup(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        blitter: &mut BlitEngine,
        width: u32,
        height: u32,
    ) -> Result<(), CaptureError>;

    /// Releases everything `setup` allocated. Idempotent.
    fn teardown(&mut self, backend: &mut dyn GraphicsBackend);

    /// Captures and reduces one frame.
    ///
    /// On error the previous grid and average are left untouched.
    fn update(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        blitter: &mut BlitEngine,
    ) -> Result<(), CaptureError>;

    /// Recreates the reduction target at a new size. No-op if unchanged.
    fn set_dimensions(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        width: u32,
        height: u32,
    ) -> Result<(), CaptureError>;

    /// Reduction target width, 0 when inactive.
    fn width(&self) -> u32;

    /// Reduction target height, 0 when inactive.
    fn height(&self) -> u32;

    /// The grid from the most recent successful update.
    fn color_map(&self) -> Option<&ColorGrid>;

    /// The average from the most recent successful update.
    fn average(&self) -> Option<Color>;

    fn set_debug(&mut self, debug: bool);

    fn is_debug(&self) -> bool;

    /// `true` iff a reduction target is currently held.
    fn is_valid(&self) -> bool;
}

/// The provider installed when capture is disabled or unavailable.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NullProvider {
    debug: bool,
}

impl NullProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaptureProvider for NullProvider {
    fn strategy(&self) -> Option<Strategy> {
        None
    }

    fn setup(
        &mut self,
        _backend: &mut dyn GraphicsBackend,
        _blitter: &mut BlitEngine,
        _width: u32,
        _height: u32,
    ) -> Result<(), CaptureError> {
        Ok(())
    }

    fn teardown(&mut self, _backend: &mut dyn GraphicsBackend) {}

    fn update(
        &mut self,
        _backend: &mut dyn GraphicsBackend,
        _blitter: &mut BlitEngine,
    ) -> Result<(), CaptureError> {
        Ok(())
    }

    fn set_dimensions(
        &mut self,
        _backend: &mut dyn GraphicsBackend,
        _width: u32,
        _height: u32,
    ) -> Result<(), CaptureError> {
        Ok(())
    }

    fn width(&self) -> u32 {
        0
    }

    fn height(&self) -> u32 {
        0
    }

    fn color_map(&self) -> Option<&ColorGrid> {
        None
    }

    fn average(&self) -> Option<Color> {
        None
    }

    fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    fn is_debug(&self) -> bool {
        self.debug
    }

    fn is_valid(&self) -> bool {
        false
    }
}

/// Captures by blitting the host framebuffer straight into a small target.
///
/// The GPU does the downsampling; the CPU only reads back `width * height`
/// texels and reduces them.
#[derive(Debug, Default)]
pub struct BlitProvider {
    target: Option<ReductionTarget>,
    reducer: Option<PixelReducer>,
    debug: bool,
}

impl BlitProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes held by the readback staging buffer, 0 before the first setup.
    pub fn buffer_capacity(&self) -> usize {
        self.reducer.as_ref().map_or(0, PixelReducer::buffer_capacity)
    }

    /// Grows or reallocates the reducer to match the target. A repeated
    /// setup at the same size clears stale data instead.
    fn fit_reducer(&mut self, width: u32, height: u32) -> Result<(), CaptureError> {
        let (w, h) = (width as usize, height as usize);
        match &mut self.reducer {
            Some(reducer) => {
                if !reducer.resize(w, h)? {
                    reducer.clear();
                }
            }
            None => self.reducer = Some(PixelReducer::new(w, h)?),
        }
        Ok(())
    }
}

/// One blit, optional overlay, one readback, one reduction.
fn capture_frame(
    target: &ReductionTarget,
    reducer: &mut PixelReducer,
    debug: bool,
    backend: &mut dyn GraphicsBackend,
    blitter: &mut BlitEngine,
) -> Result<Color, CaptureError> {
    blitter.blit(backend, Surface::Host, target.surface(), REDUCTION_FILTER)?;
    if debug {
        let host = backend.surface_info(Surface::Host)?;
        if host.is_multisampled() {
            debug!(samples = host.samples, "debug overlay skipped on multisampled host");
        } else {
            backend.draw_overlay(target.id(), DEBUG_OVERLAY_SIZE, DEBUG_OVERLAY_SIZE)?;
        }
    }
    backend.read_pixels(target.id(), reducer.staging_mut()?)?;
    reducer.reduce()
}

impl CaptureProvider for BlitProvider {
    fn strategy(&self) -> Option<Strategy> {
        Some(Strategy::Blit)
    }

    fn setup(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        blitter: &mut BlitEngine,
        width: u32,
        height: u32,
    ) -> Result<(), CaptureError> {
        if self.target.is_some() {
            return Err(CaptureError::AlreadyInitialized);
        }
        if !blitter.ensure_ready(backend) {
            warn!("blit engine is not valid; updates will be skipped");
        }
        let target = ReductionTarget::create(backend, width, height)?;
        if let Err(e) = self.fit_reducer(width, height) {
            target.destroy(backend);
            return Err(e);
        }
        debug!(width, height, target = %target.id(), "blit provider set up");
        self.target = Some(target);
        Ok(())
    }

    fn teardown(&mut self, backend: &mut dyn GraphicsBackend) {
        if let Some(target) = self.target.take() {
            debug!(target = %target.id(), "blit provider torn down");
            target.destroy(backend);
        }
    }

    fn update(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        blitter: &mut BlitEngine,
    ) -> Result<(), CaptureError> {
        let (Some(target), Some(reducer)) = (&self.target, &mut self.reducer) else {
            return Ok(());
        };
        if !blitter.is_valid() {
            return Ok(());
        }
        let previous = backend.bound_surface();
        let captured = capture_frame(target, reducer, self.debug, backend, blitter);
        let restored = backend.bind_surface(previous);
        let average = captured?;
        restored?;
        if self.debug {
            debug!(average = %average, "frame captured");
        }
        Ok(())
    }

    fn set_dimensions(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        width: u32,
        height: u32,
    ) -> Result<(), CaptureError> {
        let Some(current) = self.target.take() else {
            return Err(CaptureError::NotInitialized);
        };
        if current.has_dimensions(width, height) {
            self.target = Some(current);
            return Ok(());
        }
        if width == 0 || height == 0 {
            self.target = Some(current);
            return Err(CaptureError::InvalidDimensions);
        }
        current.destroy(backend);
        let target = ReductionTarget::create(backend, width, height)?;
        if let Err(e) = self.fit_reducer(width, height) {
            target.destroy(backend);
            return Err(e);
        }
        debug!(width, height, target = %target.id(), "reduction target resized");
        self.target = Some(target);
        Ok(())
    }

    fn width(&self) -> u32 {
        self.target.as_ref().map_or(0, ReductionTarget::width)
    }

    fn height(&self) -> u32 {
        self.target.as_ref().map_or(0, ReductionTarget::height)
    }

    fn color_map(&self) -> Option<&ColorGrid> {
        self.target.as_ref()?;
        self.reducer.as_ref().map(PixelReducer::grid)
    }

    fn average(&self) -> Option<Color> {
        self.target.as_ref()?;
        self.reducer.as_ref().map(PixelReducer::average)
    }

    fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    fn is_debug(&self) -> bool {
        self.debug
    }

    fn is_valid(&self) -> bool {
        self.target.is_some()
    }
}

/// The closed set of providers a capture context can hold.
///
/// Delegates every `CaptureProvider` method to the wrapped provider.
#[derive(Debug)]
pub enum ProviderKind {
    Null(NullProvider),
    Blit(BlitProvider),
}

impl ProviderKind {
    /// A fresh, uninitialized provider for `strategy`.
    pub fn for_strategy(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Blit => ProviderKind::Blit(BlitProvider::new()),
        }
    }

    pub fn null() -> Self {
        ProviderKind::Null(NullProvider::new())
    }

    fn inner(&self) -> &dyn CaptureProvider {
        match self {
            ProviderKind::Null(p) => p,
            ProviderKind::Blit(p) => p,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn CaptureProvider {
        match self {
            ProviderKind::Null(p) => p,
            ProviderKind::Blit(p) => p,
        }
    }
}

impl Default for ProviderKind {
    fn default() -> Self {
        Self::null()
    }
}

impl CaptureProvider for ProviderKind {
    fn strategy(&self) -> Option<Strategy> {
        self.inner().strategy()
    }

    fn setup(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        blitter: &mut BlitEngine,
        width: u32,
        height: u32,
    ) -> Result<(), CaptureError> {
        self.inner_mut().setup(backend, blitter, width, height)
    }

    fn teardown(&mut self, backend: &mut dyn GraphicsBackend) {
        self.inner_mut().teardown(backend)
    }

    fn update(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        blitter: &mut BlitEngine,
    ) -> Result<(), CaptureError> {
        self.inner_mut().update(backend, blitter)
    }

    fn set_dimensions(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        width: u32,
        height: u32,
    ) -> Result<(), CaptureError> {
        self.inner_mut().set_dimensions(backend, width, height)
    }

    fn width(&self) -> u32 {
        self.inner().width()
    }

    fn height(&self) -> u32 {
        self.inner().height()
    }

    fn color_map(&self) -> Option<&ColorGrid> {
        self.inner().color_map()
    }

    fn average(&self) -> Option<Color> {
        self.inner().average()
    }

    fn set_debug(&mut self, debug: bool) {
        self.inner_mut().set_debug(debug)
    }

    fn is_debug(&self) -> bool {
        self.inner().is_debug()
    }

    fn is_valid(&self) -> bool {
        self.inner().is_valid()
    }
}
