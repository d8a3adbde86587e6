//! Texture objects: backend handles plus the bookkeeping around them.

use std::ops::Deref;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{VideoError, VideoResult};
use crate::video::backend::SharedBackend;

/// Opaque backend texture handle.
///
/// Zero is the "lost" sentinel used while a texture's pixel data lives in
/// host memory between `save_textures()` and `reload_textures()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureId(pub u32);

impl TextureId {
    pub const NONE: Self = Self(0);

    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u32 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Host-memory snapshot of a texture, used for context-loss recovery.
///
/// Captures pixel content and the sampling parameters so a reload restores
/// the texture exactly, even though the backend handle value may differ.
#[derive(Debug, Clone)]
pub struct SavedTexture {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub linear_filter: bool,
    pub clamp: bool,
}

/// Round up to the next power of two.
pub fn next_power_of_two(value: u32) -> u32 {
    let mut result = 1;
    while result < value {
        result *= 2;
    }
    result
}

fn is_power_of_two(value: u32) -> bool {
    value != 0 && value & (value - 1) == 0
}

/// A backend texture with padded power-of-two dimensions.
///
/// The handle is interior-mutable because it is swapped out during
/// context-loss recovery. The texture owns its backend resource and
/// destroys it on drop.
pub struct Texture {
    handle: AtomicU32,
    width: u32,
    height: u32,
    backend: SharedBackend,
}

impl Texture {
    /// Allocate a blank texture. Width and height must be powers of two.
    pub fn new(backend: &SharedBackend, width: u32, height: u32) -> VideoResult<Self> {
        if !is_power_of_two(width) || !is_power_of_two(height) {
            return Err(VideoError::NotPowerOfTwo { width, height });
        }
        let id = backend.lock().allocate_texture(width, height)?;
        Ok(Self {
            handle: AtomicU32::new(id.id()),
            width,
            height,
            backend: backend.clone(),
        })
    }

    /// Upload pixel data into a new texture. Dimensions must be powers of
    /// two and `pixels` must hold `width * height` RGBA bytes.
    pub fn from_pixels(
        backend: &SharedBackend,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> VideoResult<Self> {
        if !is_power_of_two(width) || !is_power_of_two(height) {
            return Err(VideoError::NotPowerOfTwo { width, height });
        }
        let id = backend.lock().upload_texture(pixels, width, height)?;
        Ok(Self {
            handle: AtomicU32::new(id.id()),
            width,
            height,
            backend: backend.clone(),
        })
    }

    pub fn handle(&self) -> TextureId {
        TextureId::new(self.handle.load(Ordering::Acquire))
    }

    pub(crate) fn set_handle(&self, id: TextureId) {
        self.handle.store(id.id(), Ordering::Release);
    }

    /// Padded (allocated) width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Padded (allocated) height.
    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        let id = self.handle();
        if !id.is_none() {
            self.backend.lock().destroy_texture(id);
        }
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("handle", &self.handle())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// A texture created from an image file.
///
/// Tracks the *logical* image size separately from the padded backing
/// dimensions: UV/clip math must use the logical size, allocation math the
/// padded one.
#[derive(Debug)]
pub struct ImageTexture {
    texture: Texture,
    filename: PathBuf,
    image_width: f32,
    image_height: f32,
}

impl ImageTexture {
    pub(crate) fn new(
        texture: Texture,
        filename: PathBuf,
        image_width: u32,
        image_height: u32,
    ) -> Self {
        Self {
            texture,
            filename,
            image_width: image_width as f32,
            image_height: image_height as f32,
        }
    }

    pub fn filename(&self) -> &PathBuf {
        &self.filename
    }

    /// Logical (non-padded) image width.
    pub fn image_width(&self) -> f32 {
        self.image_width
    }

    /// Logical (non-padded) image height.
    pub fn image_height(&self) -> f32 {
        self.image_height
    }

    /// UV coordinate of the right edge of the logical image.
    pub fn uv_right(&self) -> f32 {
        self.image_width / self.texture.width() as f32
    }

    /// UV coordinate of the bottom edge of the logical image.
    pub fn uv_bottom(&self) -> f32 {
        self.image_height / self.texture.height() as f32
    }
}

impl Deref for ImageTexture {
    type Target = Texture;

    fn deref(&self) -> &Texture {
        &self.texture
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::backend::{shared, trace::TraceBackend};

    #[test]
    fn next_power_of_two_rounds_up() {
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(2), 2);
        assert_eq!(next_power_of_two(3), 4);
        assert_eq!(next_power_of_two(640), 1024);
        assert_eq!(next_power_of_two(1024), 1024);
    }

    #[test]
    fn non_power_of_two_rejected() {
        let backend = shared(TraceBackend::new(800, 600));
        let result = Texture::new(&backend, 100, 64);
        assert!(matches!(
            result,
            Err(VideoError::NotPowerOfTwo {
                width: 100,
                height: 64
            })
        ));
    }

    #[test]
    fn blank_texture_allocates_handle() {
        let backend = shared(TraceBackend::new(800, 600));
        let texture = Texture::new(&backend, 128, 64).unwrap();
        assert!(!texture.handle().is_none());
        assert_eq!(texture.width(), 128);
        assert_eq!(texture.height(), 64);
    }

    #[test]
    fn image_texture_uv_uses_logical_size() {
        let backend = shared(TraceBackend::new(800, 600));
        let texture = Texture::new(&backend, 128, 128).unwrap();
        let image = ImageTexture::new(texture, PathBuf::from("img.png"), 100, 60);
        assert_eq!(image.image_width(), 100.0);
        assert_eq!(image.uv_right(), 100.0 / 128.0);
        assert_eq!(image.uv_bottom(), 60.0 / 128.0);
    }

    #[test]
    fn drop_releases_handle() {
        let backend = shared(TraceBackend::new(800, 600));
        {
            let _texture = Texture::new(&backend, 64, 64).unwrap();
        }
        assert_eq!(backend.lock().live_texture_count(), 0);
    }
}
