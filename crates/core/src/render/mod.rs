//! OpenGL / WebGL2 backend over `glow`.
//!
//! Only built with the `render` feature. [`GpuContext`] implements
//! [`GraphicsBackend`](crate::backend::GraphicsBackend) on a live GL
//! context; [`RenderTarget`] is the FBO + RGBA8 texture pair it hands out
//! as target handles.

pub mod context;
pub mod target;

pub use context::GpuContext;
pub use target::{gl_filter, RenderTarget};
