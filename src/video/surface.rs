//! Drawable image regions.
//!
//! A `Surface` is a lightweight view into a shared [`ImageTexture`]: a
//! rectangle in logical image pixels plus a horizontal-flip flag. Cloning
//! a surface is cheap and never duplicates pixel data.

use std::path::Path;
use std::sync::Arc;

use crate::error::VideoResult;
use crate::math::{Rectf, Sizef, Vector};
use crate::video::texture::ImageTexture;
use crate::video::texture_manager::TextureManager;

#[derive(Debug, Clone)]
pub struct Surface {
    texture: Arc<ImageTexture>,
    /// Region in logical image pixels (not padded texture pixels).
    region: Rectf,
    flipx: bool,
}

impl Surface {
    /// A surface covering the whole image.
    pub fn from_file(manager: &TextureManager, path: &Path) -> VideoResult<Self> {
        let texture = manager.get(path)?;
        let region = Rectf::from_xywh(
            0.0,
            0.0,
            texture.image_width(),
            texture.image_height(),
        );
        Ok(Self {
            texture,
            region,
            flipx: false,
        })
    }

    /// A surface covering a sub-rectangle of the image.
    pub fn from_file_part(
        manager: &TextureManager,
        path: &Path,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> VideoResult<Self> {
        let texture = manager.get(path)?;
        debug_assert!(x >= 0.0 && y >= 0.0);
        debug_assert!(x + width <= texture.image_width());
        debug_assert!(y + height <= texture.image_height());
        Ok(Self {
            texture,
            region: Rectf::from_xywh(x, y, width, height),
            flipx: false,
        })
    }

    /// Toggle horizontal mirroring. Composes with a transform-level flip:
    /// flipping a flipped surface draws it upright again.
    pub fn hflip(&mut self) {
        self.flipx = !self.flipx;
    }

    /// True when both surfaces view the same underlying texture.
    pub fn shares_texture(&self, other: &Surface) -> bool {
        Arc::ptr_eq(&self.texture, &other.texture)
    }

    pub fn get_width(&self) -> f32 {
        self.region.size.width
    }

    pub fn get_height(&self) -> f32 {
        self.region.size.height
    }

    pub fn get_size(&self) -> Sizef {
        self.region.size
    }

    pub(crate) fn texture(&self) -> &Arc<ImageTexture> {
        &self.texture
    }

    pub(crate) fn region(&self) -> Rectf {
        self.region
    }

    pub(crate) fn flipx(&self) -> bool {
        self.flipx
    }

    /// Region offset by `source` and shrunk to `size`, for partial draws.
    pub(crate) fn sub_region(&self, source: Vector, size: Sizef) -> Rectf {
        Rectf::new(self.region.pos + source, size)
    }

    /// Build a surface around an already-loaded texture, bypassing disk.
    #[cfg(test)]
    pub(crate) fn test_from_image(texture: Arc<ImageTexture>) -> Self {
        let region = Rectf::from_xywh(
            0.0,
            0.0,
            texture.image_width(),
            texture.image_height(),
        );
        Self {
            texture,
            region,
            flipx: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::backend::{shared, trace::TraceBackend};
    use crate::video::texture::{ImageTexture, Texture};
    use std::path::PathBuf;

    fn test_surface(flip: bool) -> Surface {
        let backend = shared(TraceBackend::new(800, 600));
        let texture = Texture::new(&backend, 128, 64).unwrap();
        let image = Arc::new(ImageTexture::new(
            texture,
            PathBuf::from("img.png"),
            100,
            50,
        ));
        let mut surface = Surface {
            texture: image,
            region: Rectf::from_xywh(0.0, 0.0, 100.0, 50.0),
            flipx: false,
        };
        if flip {
            surface.hflip();
        }
        surface
    }

    #[test]
    fn size_reports_logical_region() {
        let surface = test_surface(false);
        assert_eq!(surface.get_width(), 100.0);
        assert_eq!(surface.get_height(), 50.0);
    }

    #[test]
    fn hflip_toggles() {
        let mut surface = test_surface(false);
        assert!(!surface.flipx());
        surface.hflip();
        assert!(surface.flipx());
        surface.hflip();
        assert!(!surface.flipx());
    }

    #[test]
    fn clone_shares_texture() {
        let surface = test_surface(false);
        let copy = surface.clone();
        assert!(Arc::ptr_eq(surface.texture(), copy.texture()));
    }

    #[test]
    fn sub_region_offsets_into_region() {
        let surface = test_surface(false);
        let sub = surface.sub_region(Vector::new(10.0, 5.0), Sizef::new(20.0, 15.0));
        assert_eq!(sub.pos, Vector::new(10.0, 5.0));
        assert_eq!(sub.size, Sizef::new(20.0, 15.0));
    }
}
