//! The graphics API surface the capture pipeline drives.
//!
//! The trait is object-safe so providers can take `&mut dyn GraphicsBackend`
//! and run unchanged against the `glow` backend (feature `render`) or the
//! in-memory [`SoftwareBackend`](crate::software::SoftwareBackend).
//!
//! All calls must happen on the thread that owns the graphics context.

use crate::error::CaptureError;
use crate::strategy::{self, Capabilities, StrategySet};
use std::fmt;

/// Opaque handle to an off-screen render target created by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u32);

impl TargetId {
    /// Wraps a raw backend handle.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw backend handle.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something that can be bound, blitted from, or blitted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// The host's main render target. Capture only reads from it.
    Host,
    /// An off-screen target owned by the capture pipeline.
    Target(TargetId),
}

/// Size and sample count of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceInfo {
    pub width: u32,
    pub height: u32,
    /// 1 for single-sampled surfaces.
    pub samples: u32,
}

impl SurfaceInfo {
    /// A single-sampled surface of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            samples: 1,
        }
    }

    /// Returns `true` if the surface holds more than one sample per pixel.
    pub fn is_multisampled(&self) -> bool {
        self.samples > 1
    }

    /// Returns `true` if both surfaces have the same width and height.
    pub fn same_size(&self, other: &SurfaceInfo) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// Texture sampling filter used when resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    Nearest,
    Linear,
}

/// GPU operations needed to capture and reduce the host framebuffer.
///
/// `blit` and `read_pixels` may change the bound surface; callers that
/// must leave the host's binding intact re-bind it afterwards.
/// `create_target` leaves the binding as it found it, and `delete_target`
/// rebinds the host if the deleted target was bound.
pub trait GraphicsBackend {
    /// Capabilities of the underlying context.
    fn capabilities(&self) -> Capabilities;

    /// Strategies the context supports. Never fails; empty means disabled.
    fn available_strategies(&self) -> StrategySet {
        strategy::available_strategies(&self.capabilities())
    }

    /// Creates an RGBA8 off-screen target of the given size.
    fn create_target(
        &mut self,
        width: u32,
        height: u32,
        filter: Filter,
    ) -> Result<TargetId, CaptureError>;

    /// Releases a target. Deleting an unknown handle is a no-op.
    fn delete_target(&mut self, target: TargetId);

    /// Size and sample count of a surface.
    fn surface_info(&self, surface: Surface) -> Result<SurfaceInfo, CaptureError>;

    /// The surface currently bound for drawing.
    fn bound_surface(&self) -> Surface;

    /// Binds a surface for drawing and sets the viewport to cover it.
    fn bind_surface(&mut self, surface: Surface) -> Result<(), CaptureError>;

    /// Copies all of `src` into all of `dst`, resampling with `filter`.
    ///
    /// Fails if `src` is multisampled and the sizes differ.
    fn blit(&mut self, src: Surface, dst: Surface, filter: Filter) -> Result<(), CaptureError>;

    /// Reads a target's pixels as RGBA8, row-major, bottom row first.
    ///
    /// `out` must hold exactly `width * height * 4` bytes.
    fn read_pixels(&mut self, target: TargetId, out: &mut [u8]) -> Result<(), CaptureError>;

    /// Draws a target onto the host surface, scaled to `width` x `height`
    /// at the lower-left corner. Used for on-screen debugging.
    ///
    /// Fails if the host is multisampled, since a blit cannot write into
    /// a multisampled framebuffer.
    fn draw_overlay(&mut self, target: TargetId, width: u32, height: u32)
        -> Result<(), CaptureError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::software::SoftwareBackend;

    #[test]
    fn backend_trait_is_object_safe() {
        let backend: Box<dyn GraphicsBackend> = Box::new(SoftwareBackend::new(4, 4));
        assert_eq!(backend.bound_surface(), Surface::Host);
    }

    #[test]
    fn default_available_strategies_uses_capabilities() {
        let backend = SoftwareBackend::new(4, 4);
        let dyn_ref: &dyn GraphicsBackend = &backend;
        assert_eq!(
            dyn_ref.available_strategies(),
            strategy::available_strategies(&backend.capabilities())
        );
    }

    #[test]
    fn target_id_round_trips_raw_value() {
        assert_eq!(TargetId::from_raw(42).raw(), 42);
        assert_eq!(TargetId::from_raw(3).to_string(), "#3");
    }

    #[test]
    fn surface_info_helpers() {
        let a = SurfaceInfo::new(16, 16);
        let b = SurfaceInfo {
            samples: 4,
            ..SurfaceInfo::new(16, 16)
        };
        assert!(!a.is_multisampled());
        assert!(b.is_multisampled());
        assert!(a.same_size(&b));
        assert!(!a.same_size(&SurfaceInfo::new(16, 8)));
    }

    #[test]
    fn default_filter_is_nearest() {
        assert_eq!(Filter::default(), Filter::Nearest);
    }
}
