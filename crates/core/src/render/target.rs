//! GL render targets: an FBO with one RGBA8 color attachment.
//!
//! Both reduction targets and the blit engine's resolve target are
//! `RenderTarget`s. RGBA8 keeps readback a straight byte copy.

use crate::backend::Filter;
use glow::HasContext;

/// Maps a [`Filter`] to its GL enum.
pub fn gl_filter(filter: Filter) -> u32 {
    match filter {
        Filter::Nearest => glow::NEAREST,
        Filter::Linear => glow::LINEAR,
    }
}

/// Allocates an uninitialized `width` x `height` RGBA8 texture sampled with
/// `filter` and clamped at the edges. Leaves no texture bound.
#[allow(unsafe_code)]
fn allocate_color_texture(
    gl: &glow::Context,
    width: u32,
    height: u32,
    filter: Filter,
) -> Result<glow::Texture, String> {
    let gl_filter = gl_filter(filter) as i32;
    // SAFETY: the texture is freshly created and every parameter is a valid
    // enum for TEXTURE_2D.
    unsafe {
        let texture = gl.create_texture()?;
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        for (pname, value) in [
            (glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32),
            (glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32),
            (glow::TEXTURE_MIN_FILTER, gl_filter),
            (glow::TEXTURE_MAG_FILTER, gl_filter),
        ] {
            gl.tex_parameter_i32(glow::TEXTURE_2D, pname, value);
        }
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RGBA8 as i32,
            width as i32,
            height as i32,
            0,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            glow::PixelUnpackData::Slice(None),
        );
        gl.bind_texture(glow::TEXTURE_2D, None);
        Ok(texture)
    }
}

/// An off-screen framebuffer and the texture it renders into.
pub struct RenderTarget {
    fbo: glow::Framebuffer,
    texture: glow::Texture,
    width: u32,
    height: u32,
    filter: Filter,
}

impl RenderTarget {
    /// Creates a complete framebuffer at `width` x `height`.
    ///
    /// Everything allocated is released again on failure. Leaves the
    /// default framebuffer bound either way.
    ///
    /// # Errors
    ///
    /// Returns the driver's message if allocation fails, or the status
    /// code if the framebuffer is incomplete.
    #[allow(unsafe_code)]
    pub fn new(gl: &glow::Context, width: u32, height: u32, filter: Filter) -> Result<Self, String> {
        let texture = allocate_color_texture(gl, width, height, filter)?;

        // SAFETY: `texture` is live; the framebuffer is created, checked and
        // either returned or deleted before leaving this block.
        unsafe {
            let fbo = match gl.create_framebuffer() {
                Ok(fbo) => fbo,
                Err(e) => {
                    gl.delete_texture(texture);
                    return Err(e);
                }
            };
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(texture),
                0,
            );
            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);

            if status != glow::FRAMEBUFFER_COMPLETE {
                gl.delete_framebuffer(fbo);
                gl.delete_texture(texture);
                return Err(format!("framebuffer incomplete: status 0x{status:04X}"));
            }

            Ok(Self {
                fbo,
                texture,
                width,
                height,
                filter,
            })
        }
    }

    pub fn fbo(&self) -> glow::Framebuffer {
        self.fbo
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// Deletes the framebuffer and its texture. Consuming `self` rules out
    /// a double delete.
    #[allow(unsafe_code)]
    pub fn destroy(self, gl: &glow::Context) {
        // SAFETY: both handles came from `new` and are deleted exactly once.
        unsafe {
            gl.delete_framebuffer(self.fbo);
            gl.delete_texture(self.texture);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_maps_to_gl_enums() {
        assert_eq!(gl_filter(Filter::Nearest), glow::NEAREST);
        assert_eq!(gl_filter(Filter::Linear), glow::LINEAR);
    }

    #[test]
    fn render_target_exposes_its_handles() {
        // Compile-time check; a live target needs a GL context.
        fn _assert_api(rt: &RenderTarget) {
            let _: glow::Framebuffer = rt.fbo();
            let _: (u32, u32) = (rt.width(), rt.height());
            let _: Filter = rt.filter();
        }
    }

    #[test]
    #[ignore = "requires GL context"]
    fn new_creates_complete_rgba8_target() {
        // Would test: RenderTarget::new(gl, 16, 16, Filter::Nearest) succeeds
        // and reports 16x16 with the Nearest filter.
    }

    #[test]
    #[ignore = "requires GL context"]
    fn destroy_releases_framebuffer_and_texture() {
        // Would test: after destroy(), gl.is_framebuffer(fbo) is false.
    }
}
