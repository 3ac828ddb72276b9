//! GPU context wrapper implementing [`GraphicsBackend`] over `glow`.
//!
//! `GpuContext` wraps a `glow::Context`, queries framebuffer and blit
//! support at initialization, owns every reduction-side render target,
//! and tracks which surface is bound. The host's framebuffer is
//! registered explicitly with [`GpuContext::set_host_framebuffer`]
//! because the current binding cannot be queried the same way on
//! native GL and WebGL2.
//!
//! Readback uses `glReadPixels`, which exists on desktop GL, GLES 3 and
//! WebGL2 alike.

use super::target::{gl_filter, RenderTarget};
use crate::backend::{Filter, GraphicsBackend, Surface, SurfaceInfo, TargetId};
use crate::error::CaptureError;
use crate::reduce::frame_len;
use crate::strategy::{ApiVersion, Capabilities};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Extensions that provide framebuffer objects on pre-3.0 contexts.
const FRAMEBUFFER_EXTENSIONS: &[&str] = &["GL_ARB_framebuffer_object", "GL_EXT_framebuffer_object"];

/// Wraps a `glow::Context` with detected capabilities and owned targets.
pub struct GpuContext {
    gl: glow::Context,
    capabilities: Capabilities,
    targets: HashMap<TargetId, RenderTarget>,
    next_id: u32,
    host: Option<glow::Framebuffer>,
    host_info: SurfaceInfo,
    bound: Surface,
}

impl GpuContext {
    /// Creates a new `GpuContext` by wrapping the given GL context
    /// and querying its version and extensions.
    ///
    /// The host surface defaults to the default framebuffer at
    /// `width` x `height`, single-sampled.
    pub fn new(gl: glow::Context, width: u32, height: u32) -> Self {
        use glow::HasContext;

        let version = gl.version();
        let extensions: BTreeSet<String> = gl.supported_extensions().iter().cloned().collect();
        let api = ApiVersion {
            major: version.major,
            minor: version.minor,
            embedded: version.is_embedded,
        };
        let framebuffer_supported =
            api.at_least(3, 0) || FRAMEBUFFER_EXTENSIONS.iter().any(|e| extensions.contains(*e));
        debug!(version = %api, extensions = extensions.len(), framebuffer_supported, "gpu context created");

        Self {
            gl,
            capabilities: Capabilities {
                framebuffer_supported,
                framebuffer_enabled: true,
                version: api,
                extensions,
            },
            targets: HashMap::new(),
            next_id: 1,
            host: None,
            host_info: SurfaceInfo::new(width, height),
            bound: Surface::Host,
        }
    }

    /// Returns a reference to the underlying `glow::Context`.
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    /// Registers the host's main framebuffer (`None` for the default one).
    ///
    /// Call whenever the host recreates or resizes its framebuffer.
    pub fn set_host_framebuffer(&mut self, fbo: Option<glow::Framebuffer>, info: SurfaceInfo) {
        self.host = fbo;
        self.host_info = info;
    }

    /// Lets the host switch off-screen framebuffer use on or off.
    pub fn set_framebuffers_enabled(&mut self, enabled: bool) {
        self.capabilities.framebuffer_enabled = enabled;
    }

    /// Deletes every target still owned by this context.
    fn destroy_all(&mut self) {
        if !self.targets.is_empty() {
            debug!(count = self.targets.len(), "deleting leftover render targets");
        }
        for (_, target) in self.targets.drain() {
            target.destroy(&self.gl);
        }
    }

    fn fbo_for(&self, surface: Surface) -> Result<Option<glow::Framebuffer>, CaptureError> {
        match surface {
            Surface::Host => Ok(self.host),
            Surface::Target(id) => self
                .targets
                .get(&id)
                .map(|t| Some(t.fbo()))
                .ok_or(CaptureError::UnknownTarget(id)),
        }
    }

    #[allow(unsafe_code)]
    fn check_error(&self, operation: &str) -> Result<(), CaptureError> {
        use glow::HasContext;

        // SAFETY: glGetError has no preconditions.
        let err = unsafe { self.gl.get_error() };
        if err == glow::NO_ERROR {
            Ok(())
        } else {
            Err(CaptureError::CaptureFailure(format!(
                "{operation} raised GL error 0x{err:04X}"
            )))
        }
    }

    #[allow(unsafe_code)]
    fn blit_region(
        &mut self,
        src: Surface,
        dst: Surface,
        dst_size: (u32, u32),
        filter: Filter,
    ) -> Result<(), CaptureError> {
        use glow::HasContext;

        let src_info = self.surface_info(src)?;
        let (read, draw) = (self.fbo_for(src)?, self.fbo_for(dst)?);
        // SAFETY: both framebuffer handles are live (checked above) and the
        // rectangles lie within their attachments.
        unsafe {
            self.gl.bind_framebuffer(glow::READ_FRAMEBUFFER, read);
            self.gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, draw);
            self.gl.blit_framebuffer(
                0,
                0,
                src_info.width as i32,
                src_info.height as i32,
                0,
                0,
                dst_size.0 as i32,
                dst_size.1 as i32,
                glow::COLOR_BUFFER_BIT,
                gl_filter(filter),
            );
        }
        self.bound = dst;
        self.check_error("blit")
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        self.destroy_all();
    }
}

impl GraphicsBackend for GpuContext {
    fn capabilities(&self) -> Capabilities {
        self.capabilities.clone()
    }

    fn create_target(&mut self, width: u32, height: u32, filter: Filter) -> Result<TargetId, CaptureError> {
        if width == 0 || height == 0 {
            return Err(CaptureError::InvalidDimensions);
        }
        let previous = self.bound;
        let target = RenderTarget::new(&self.gl, width, height, filter);
        // RenderTarget::new leaves framebuffer 0 bound even when it fails,
        // which is not the host's surface once an FBO is registered.
        let target = match target {
            Ok(target) => target,
            Err(e) => {
                self.bind_surface(previous)?;
                return Err(CaptureError::Backend(e));
            }
        };
        let id = TargetId::from_raw(self.next_id);
        self.next_id += 1;
        self.targets.insert(id, target);
        self.bind_surface(previous)?;
        Ok(id)
    }

    fn delete_target(&mut self, target: TargetId) {
        let Some(t) = self.targets.remove(&target) else {
            return;
        };
        t.destroy(&self.gl);
        // Deleting the bound FBO reverts GL to framebuffer 0.
        if self.bound == Surface::Target(target) {
            if let Err(e) = self.bind_surface(Surface::Host) {
                warn!(error = %e, "could not rebind host framebuffer after delete");
            }
        }
    }

    fn surface_info(&self, surface: Surface) -> Result<SurfaceInfo, CaptureError> {
        match surface {
            Surface::Host => Ok(self.host_info),
            Surface::Target(id) => self
                .targets
                .get(&id)
                .map(|t| SurfaceInfo::new(t.width(), t.height()))
                .ok_or(CaptureError::UnknownTarget(id)),
        }
    }

    fn bound_surface(&self) -> Surface {
        self.bound
    }

    #[allow(unsafe_code)]
    fn bind_surface(&mut self, surface: Surface) -> Result<(), CaptureError> {
        use glow::HasContext;

        let fbo = self.fbo_for(surface)?;
        let info = self.surface_info(surface)?;
        // SAFETY: fbo is the host framebuffer or a live target.
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, fbo);
            self.gl.viewport(0, 0, info.width as i32, info.height as i32);
        }
        self.bound = surface;
        Ok(())
    }

    fn blit(&mut self, src: Surface, dst: Surface, filter: Filter) -> Result<(), CaptureError> {
        let (src_info, dst_info) = (self.surface_info(src)?, self.surface_info(dst)?);
        if src_info.is_multisampled() && !src_info.same_size(&dst_info) {
            return Err(CaptureError::CaptureFailure(format!(
                "cannot resample a {}x multisampled source",
                src_info.samples
            )));
        }
        self.blit_region(src, dst, (dst_info.width, dst_info.height), filter)
    }

    #[allow(unsafe_code)]
    fn read_pixels(&mut self, target: TargetId, out: &mut [u8]) -> Result<(), CaptureError> {
        use glow::HasContext;

        let info = self.surface_info(Surface::Target(target))?;
        let needed = frame_len(info.width as usize, info.height as usize)
            .ok_or(CaptureError::InvalidDimensions)?;
        if out.len() != needed {
            return Err(CaptureError::BufferTooSmall {
                needed,
                actual: out.len(),
            });
        }
        let fbo = self.fbo_for(Surface::Target(target))?;
        // SAFETY: fbo is a live RGBA8 target and `out` holds exactly one
        // width x height RGBA8 frame.
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, fbo);
            self.gl.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
            self.gl.read_pixels(
                0,
                0,
                info.width as i32,
                info.height as i32,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(Some(out)),
            );
        }
        self.bound = Surface::Target(target);
        self.check_error("readback")
    }

    fn draw_overlay(&mut self, target: TargetId, width: u32, height: u32) -> Result<(), CaptureError> {
        let filter = self
            .targets
            .get(&target)
            .map(RenderTarget::filter)
            .ok_or(CaptureError::UnknownTarget(target))?;
        if self.host_info.is_multisampled() {
            return Err(CaptureError::CaptureFailure(format!(
                "cannot blit into a {}x multisampled host",
                self.host_info.samples
            )));
        }
        self.blit_region(Surface::Target(target), Surface::Host, (width, height), filter)
    }
}
