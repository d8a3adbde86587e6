//! Renderer backends.
//!
//! The drawing-request queue never talks to OpenGL or to pixel buffers
//! directly; it dispatches through the [`RenderBackend`] trait. One
//! implementation is selected at startup: the hardware path
//! ([`opengl::GlBackend`], compiled in with the `opengl` feature) or the
//! software blitting path ([`software::SoftwareBackend`]).
//! [`trace::TraceBackend`] records dispatches for tests and headless runs.

pub mod glutil;
#[cfg(feature = "opengl")]
pub mod opengl;
pub mod software;
pub mod trace;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::VideoOptions;
use crate::error::VideoResult;
use crate::math::Rectf;
use crate::video::color::{Blend, Color};
use crate::video::texture::{SavedTexture, TextureId};

/// One fully-parameterized textured quad.
///
/// `src` is a texel rectangle within the texture, `dst` a rectangle in
/// logical screen coordinates. Flips are passed as independent booleans so
/// a surface-level horizontal flip and a transform-level flip compose.
#[derive(Debug, Clone, Copy)]
pub struct TextureQuad {
    pub src: Rectf,
    pub dst: Rectf,
    pub hflip: bool,
    pub vflip: bool,
    pub alpha: f32,
    /// Rotation in degrees around the destination center. Only the
    /// hardware path rotates; the software path draws unrotated.
    pub angle: f32,
    pub color: Color,
    pub blend: Blend,
}

/// Capability set every backend provides.
///
/// All methods are synchronous; a single logical thread owns the backend
/// for the duration of a frame.
pub trait RenderBackend {
    fn name(&self) -> &'static str;

    /// Logical screen size in pixels.
    fn screen_size(&self) -> (u32, u32);

    /// Upload RGBA pixel data into a new texture.
    fn upload_texture(&mut self, pixels: &[u8], width: u32, height: u32)
        -> VideoResult<TextureId>;

    /// Allocate an uninitialized texture.
    fn allocate_texture(&mut self, width: u32, height: u32) -> VideoResult<TextureId>;

    /// Copy a texture's pixel data and sampling parameters into host memory.
    fn download_texture(&mut self, id: TextureId) -> VideoResult<SavedTexture>;

    /// Recreate a texture from a host-memory snapshot, preserving its
    /// sampling parameters. The returned handle may differ from the one the
    /// snapshot was taken from.
    fn restore_texture(&mut self, saved: &SavedTexture) -> VideoResult<TextureId>;

    fn destroy_texture(&mut self, id: TextureId);

    /// Number of live backend textures. Diagnostic.
    fn live_texture_count(&self) -> usize;

    fn draw_texture(&mut self, id: TextureId, quad: &TextureQuad);

    /// Full-screen vertical gradient.
    fn draw_gradient(&mut self, top: Color, bottom: Color);

    fn fill_rect(&mut self, rect: Rectf, color: Color);

    /// Start rendering into the offscreen lightmap buffer, cleared to the
    /// ambient color. Subsequent draws accumulate light until
    /// [`finish_lightmap`](Self::finish_lightmap).
    fn begin_lightmap(&mut self, width: u32, height: u32, ambient: Color);

    /// Copy the lightmap buffer into `target` and return to the screen
    /// buffer.
    fn finish_lightmap(&mut self, target: TextureId, width: u32, height: u32);

    /// Multiply-blend the lightmap texture over the whole frame.
    fn composite_lightmap(&mut self, id: TextureId, uv_right: f32, uv_bottom: f32);

    /// Sample the color at a logical screen position in the active buffer
    /// (the lightmap buffer while a lightmap pass is open).
    fn read_pixel(&mut self, x: f32, y: f32) -> Color;

    /// Apply a display-mode change. Callers must have saved all textures
    /// out of the backend beforehand and reload them afterwards.
    fn reconfigure(&mut self, options: &VideoOptions) -> VideoResult<()>;

    /// Present the finished frame (swap buffers).
    fn present(&mut self);
}

/// Shared, lockable backend handle.
pub type SharedBackend = Arc<Mutex<dyn RenderBackend + Send>>;

/// Wrap a backend for shared ownership.
pub fn shared(backend: impl RenderBackend + Send + 'static) -> SharedBackend {
    Arc::new(Mutex::new(backend))
}
