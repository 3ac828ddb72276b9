//! In-memory [`GraphicsBackend`] with RGBA8 surfaces.
//!
//! `SoftwareBackend` behaves like a GL context closely enough to drive the
//! whole capture pipeline without a GPU: surfaces are stored bottom row
//! first, blits resample deterministically, multisampled sources refuse
//! cross-sized blits, a multisampled host refuses the debug overlay, and
//! blit/readback move the bound surface the way
//! `glBindFramebuffer` would. It also counts live targets and can inject
//! blit and readback failures for tests.
//!
//! Resampling maps destination texel `d` to source texel
//! `floor((d + 0.5) * src_len / dst_len)` for [`Filter::Nearest`], and
//! bilinearly interpolates between the four nearest texel centers
//! (clamped at the edges, rounded to nearest) for [`Filter::Linear`].

use crate::backend::{Filter, GraphicsBackend, Surface, SurfaceInfo, TargetId};
use crate::color::Color;
use crate::error::CaptureError;
use crate::reduce::{frame_len, BYTES_PER_PIXEL};
use crate::strategy::{ApiVersion, Capabilities};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct SoftSurface {
    info: SurfaceInfo,
    filter: Filter,
    pixels: Vec<u8>,
}

impl SoftSurface {
    fn new(width: u32, height: u32, filter: Filter) -> Result<Self, CaptureError> {
        if width == 0 || height == 0 {
            return Err(CaptureError::InvalidDimensions);
        }
        let len = frame_len(width as usize, height as usize).ok_or(CaptureError::InvalidDimensions)?;
        Ok(Self {
            info: SurfaceInfo::new(width, height),
            filter,
            pixels: vec![0; len],
        })
    }

    fn texel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.info.width as usize + x) * BYTES_PER_PIXEL;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

/// Maps destination texel `d` to the nearest source texel.
fn nearest(d: usize, dst_len: usize, src_len: usize) -> usize {
    ((2 * d + 1) * src_len / (2 * dst_len)).min(src_len - 1)
}

/// Samples `src` at the center of destination texel `(dx, dy)`.
fn sample(src: &SoftSurface, dx: usize, dy: usize, dw: usize, dh: usize, filter: Filter) -> [u8; 4] {
    let (sw, sh) = (src.info.width as usize, src.info.height as usize);
    match filter {
        Filter::Nearest => src.texel(nearest(dx, dw, sw), nearest(dy, dh, sh)),
        Filter::Linear => {
            let fx = ((dx as f64 + 0.5) * sw as f64 / dw as f64 - 0.5).clamp(0.0, (sw - 1) as f64);
            let fy = ((dy as f64 + 0.5) * sh as f64 / dh as f64 - 0.5).clamp(0.0, (sh - 1) as f64);
            let (x0, y0) = (fx.floor() as usize, fy.floor() as usize);
            let (x1, y1) = ((x0 + 1).min(sw - 1), (y0 + 1).min(sh - 1));
            let (tx, ty) = (fx - x0 as f64, fy - y0 as f64);
            let (a, b, c, d) = (src.texel(x0, y0), src.texel(x1, y0), src.texel(x0, y1), src.texel(x1, y1));
            std::array::from_fn(|k| {
                let top = a[k] as f64 * (1.0 - tx) + b[k] as f64 * tx;
                let bottom = c[k] as f64 * (1.0 - tx) + d[k] as f64 * tx;
                (top * (1.0 - ty) + bottom * ty).round() as u8
            })
        }
    }
}

/// Resamples all of `src` into the `dw` x `dh` region at the origin of `dst`.
fn resample_into(src: &SoftSurface, dst: &mut SoftSurface, dw: usize, dh: usize, filter: Filter) {
    let dst_width = dst.info.width as usize;
    let (cw, ch) = (dw.min(dst_width), dh.min(dst.info.height as usize));
    for dy in 0..ch {
        for dx in 0..cw {
            let texel = sample(src, dx, dy, dw, dh, filter);
            let i = (dy * dst_width + dx) * BYTES_PER_PIXEL;
            dst.pixels[i..i + BYTES_PER_PIXEL].copy_from_slice(&texel);
        }
    }
}

/// A CPU-side stand-in for a GL context.
#[derive(Debug, Clone)]
pub struct SoftwareBackend {
    caps: Capabilities,
    host: SoftSurface,
    targets: BTreeMap<TargetId, SoftSurface>,
    next_id: u32,
    bound: Surface,
    fail_blits: bool,
    fail_readbacks: bool,
    peak_live: usize,
}

impl SoftwareBackend {
    /// Creates a backend whose host surface is a black `width` x `height`
    /// image, advertising a desktop GL 3.3 context with framebuffers enabled.
    /// Zero dimensions are raised to 1.
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let host = SoftSurface {
            info: SurfaceInfo::new(width, height),
            filter: Filter::Nearest,
            pixels: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
        };
        Self {
            caps: Capabilities {
                framebuffer_supported: true,
                framebuffer_enabled: true,
                version: ApiVersion::desktop(3, 3),
                extensions: Default::default(),
            },
            host,
            targets: BTreeMap::new(),
            next_id: 1,
            bound: Surface::Host,
            fail_blits: false,
            fail_readbacks: false,
            peak_live: 0,
        }
    }

    /// Replaces the advertised capabilities.
    pub fn with_capabilities(mut self, caps: Capabilities) -> Self {
        self.caps = caps;
        self
    }

    /// Replaces the advertised capabilities in place.
    pub fn set_capabilities(&mut self, caps: Capabilities) {
        self.caps = caps;
    }

    /// Loads an RGBA8 image into the host surface.
    ///
    /// `rgba` is in image order (top row first) and is flipped into the
    /// bottom-row-first layout a GPU framebuffer uses.
    pub fn set_host_image(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<(), CaptureError> {
        let mut host = SoftSurface::new(width, height, Filter::Nearest)?;
        if rgba.len() != host.pixels.len() {
            return Err(CaptureError::BufferTooSmall {
                needed: host.pixels.len(),
                actual: rgba.len(),
            });
        }
        let row = width as usize * BYTES_PER_PIXEL;
        for (dst, src) in host.pixels.chunks_exact_mut(row).zip(rgba.chunks_exact(row).rev()) {
            dst.copy_from_slice(src);
        }
        host.info.samples = self.host.info.samples;
        self.host = host;
        Ok(())
    }

    /// Fills the whole host surface with one opaque color.
    pub fn fill_host(&mut self, color: Color) {
        for texel in self.host.pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            texel.copy_from_slice(&[color.r, color.g, color.b, 255]);
        }
    }

    /// Declares the host surface multisampled with `samples` per pixel.
    pub fn set_host_samples(&mut self, samples: u32) {
        self.host.info.samples = samples.max(1);
    }

    /// Makes every subsequent blit fail until cleared.
    pub fn fail_blits(&mut self, fail: bool) {
        self.fail_blits = fail;
    }

    /// Makes every subsequent readback fail until cleared.
    pub fn fail_readbacks(&mut self, fail: bool) {
        self.fail_readbacks = fail;
    }

    /// Number of targets currently allocated.
    pub fn live_targets(&self) -> usize {
        self.targets.len()
    }

    /// Highest number of targets ever allocated at the same time.
    pub fn peak_live_targets(&self) -> usize {
        self.peak_live
    }

    /// Host pixels, bottom row first.
    pub fn host_pixels(&self) -> &[u8] {
        &self.host.pixels
    }

    /// A target's pixels, bottom row first.
    pub fn target_pixels(&self, target: TargetId) -> Option<&[u8]> {
        self.targets.get(&target).map(|s| s.pixels.as_slice())
    }

    /// A target's filter mode.
    pub fn target_filter(&self, target: TargetId) -> Option<Filter> {
        self.targets.get(&target).map(|s| s.filter)
    }

    fn surface(&self, surface: Surface) -> Result<&SoftSurface, CaptureError> {
        match surface {
            Surface::Host => Ok(&self.host),
            Surface::Target(id) => self.targets.get(&id).ok_or(CaptureError::UnknownTarget(id)),
        }
    }

    fn surface_mut(&mut self, surface: Surface) -> Result<&mut SoftSurface, CaptureError> {
        match surface {
            Surface::Host => Ok(&mut self.host),
            Surface::Target(id) => self
                .targets
                .get_mut(&id)
                .ok_or(CaptureError::UnknownTarget(id)),
        }
    }
}

impl GraphicsBackend for SoftwareBackend {
    fn capabilities(&self) -> Capabilities {
        self.caps.clone()
    }

    fn create_target(&mut self, width: u32, height: u32, filter: Filter) -> Result<TargetId, CaptureError> {
        if !self.caps.framebuffers_usable() {
            return Err(CaptureError::Backend("framebuffers are not available".into()));
        }
        let surface = SoftSurface::new(width, height, filter)?;
        let id = TargetId::from_raw(self.next_id);
        self.next_id += 1;
        self.targets.insert(id, surface);
        self.peak_live = self.peak_live.max(self.targets.len());
        Ok(id)
    }

    fn delete_target(&mut self, target: TargetId) {
        self.targets.remove(&target);
        if self.bound == Surface::Target(target) {
            self.bound = Surface::Host;
        }
    }

    fn surface_info(&self, surface: Surface) -> Result<SurfaceInfo, CaptureError> {
        self.surface(surface).map(|s| s.info)
    }

    fn bound_surface(&self) -> Surface {
        self.bound
    }

    fn bind_surface(&mut self, surface: Surface) -> Result<(), CaptureError> {
        self.surface(surface)?;
        self.bound = surface;
        Ok(())
    }

    fn blit(&mut self, src: Surface, dst: Surface, filter: Filter) -> Result<(), CaptureError> {
        if self.fail_blits {
            return Err(CaptureError::CaptureFailure("injected blit failure".into()));
        }
        let source = self.surface(src)?.clone();
        let target = self.surface_mut(dst)?;
        if source.info.is_multisampled() && !source.info.same_size(&target.info) {
            return Err(CaptureError::CaptureFailure(format!(
                "cannot resample a {}x multisampled source",
                source.info.samples
            )));
        }
        let (dw, dh) = (target.info.width as usize, target.info.height as usize);
        resample_into(&source, target, dw, dh, filter);
        self.bound = dst;
        Ok(())
    }

    fn read_pixels(&mut self, target: TargetId, out: &mut [u8]) -> Result<(), CaptureError> {
        if self.fail_readbacks {
            return Err(CaptureError::CaptureFailure("injected readback failure".into()));
        }
        let surface = self.surface(Surface::Target(target))?;
        if out.len() != surface.pixels.len() {
            return Err(CaptureError::BufferTooSmall {
                needed: surface.pixels.len(),
                actual: out.len(),
            });
        }
        out.copy_from_slice(&surface.pixels);
        self.bound = Surface::Target(target);
        Ok(())
    }

    fn draw_overlay(&mut self, target: TargetId, width: u32, height: u32) -> Result<(), CaptureError> {
        let source = self.surface(Surface::Target(target))?.clone();
        if self.host.info.is_multisampled() {
            return Err(CaptureError::CaptureFailure(format!(
                "cannot blit into a {}x multisampled host",
                self.host.info.samples
            )));
        }
        let filter = source.filter;
        resample_into(&source, &mut self.host, width as usize, height as usize, filter);
        self.bound = Surface::Host;
        Ok(())
    }
}
