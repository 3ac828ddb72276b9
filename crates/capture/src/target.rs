//! The owned off-screen target the host frame is reduced into.

use framelight_core::backend::{Filter, GraphicsBackend, Surface, TargetId};
use framelight_core::error::CaptureError;

/// Sampling filter for reduction targets.
pub const REDUCTION_FILTER: Filter = Filter::Nearest;

/// An N×M render target owned by exactly one provider.
///
/// There is no `Drop` impl because releasing needs the backend;
/// [`destroy`](Self::destroy) consumes the target so it cannot be freed
/// twice, and providers call it on teardown and before recreating.
#[derive(Debug, PartialEq, Eq)]
pub struct ReductionTarget {
    id: TargetId,
    width: u32,
    height: u32,
}

impl ReductionTarget {
    /// Allocates a target of the given size through the backend.
    ///
    /// Returns `CaptureError::InvalidDimensions` if either dimension is zero.
    pub fn create(
        backend: &mut dyn GraphicsBackend,
        width: u32,
        height: u32,
    ) -> Result<Self, CaptureError> {
        if width == 0 || height == 0 {
            return Err(CaptureError::InvalidDimensions);
        }
        let id = backend.create_target(width, height, REDUCTION_FILTER)?;
        Ok(Self { id, width, height })
    }

    /// The backend handle.
    pub fn id(&self) -> TargetId {
        self.id
    }

    /// This target as a blit/bind surface.
    pub fn surface(&self) -> Surface {
        Surface::Target(self.id)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `true` if the target is already `width` x `height`.
    pub fn has_dimensions(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }

    /// Releases the GPU resources.
    pub fn destroy(self, backend: &mut dyn GraphicsBackend) {
        backend.delete_target(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framelight_core::SoftwareBackend;

    #[test]
    fn create_allocates_one_target_with_nearest_filter() {
        let mut backend = SoftwareBackend::new(8, 8);
        let target = ReductionTarget::create(&mut backend, 4, 2).unwrap();
        assert_eq!(backend.live_targets(), 1);
        assert_eq!((target.width(), target.height()), (4, 2));
        assert_eq!(backend.target_filter(target.id()), Some(Filter::Nearest));
        assert_eq!(target.surface(), Surface::Target(target.id()));
    }

    #[test]
    fn destroy_releases_the_target() {
        let mut backend = SoftwareBackend::new(8, 8);
        let target = ReductionTarget::create(&mut backend, 4, 4).unwrap();
        target.destroy(&mut backend);
        assert_eq!(backend.live_targets(), 0);
    }

    #[test]
    fn create_rejects_zero_dimensions_without_allocating() {
        let mut backend = SoftwareBackend::new(8, 8);
        assert!(matches!(
            ReductionTarget::create(&mut backend, 0, 4),
            Err(CaptureError::InvalidDimensions)
        ));
        assert_eq!(backend.live_targets(), 0);
    }

    #[test]
    fn has_dimensions_compares_both_axes() {
        let mut backend = SoftwareBackend::new(8, 8);
        let target = ReductionTarget::create(&mut backend, 4, 2).unwrap();
        assert!(target.has_dimensions(4, 2));
        assert!(!target.has_dimensions(2, 4));
    }
}
