//! Recording backend for tests.
//!
//! Performs no rendering; every dispatched operation is appended to a
//! shared log that tests inspect to assert on ordering and parameters.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::VideoOptions;
use crate::error::{VideoError, VideoResult};
use crate::math::Rectf;
use crate::video::backend::{RenderBackend, TextureQuad};
use crate::video::color::{Blend, Color};
use crate::video::texture::{SavedTexture, TextureId};

/// One recorded backend operation.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceOp {
    Texture {
        id: u32,
        dst: Rectf,
        hflip: bool,
        vflip: bool,
        alpha: f32,
        color: Color,
        blend: Blend,
    },
    Gradient {
        top: Color,
        bottom: Color,
    },
    FillRect {
        rect: Rectf,
        color: Color,
    },
    BeginLightmap {
        width: u32,
        height: u32,
        ambient: Color,
    },
    FinishLightmap {
        target: u32,
    },
    CompositeLightmap {
        id: u32,
    },
    ReadPixel {
        x: f32,
        y: f32,
    },
    Present,
}

/// Shared handle to a trace log; grab it before wrapping the backend in a
/// [`SharedBackend`](crate::video::backend::SharedBackend) so it stays
/// readable from outside the trait object.
pub type TraceLog = Arc<Mutex<Vec<TraceOp>>>;

pub struct TraceBackend {
    screen_width: u32,
    screen_height: u32,
    ops: TraceLog,
    next_id: u32,
    textures: HashMap<u32, (u32, u32)>,
    saved: HashMap<u32, SavedTexture>,
    /// What [`RenderBackend::read_pixel`] reports. Settable so tests can
    /// simulate any accumulated light value.
    pub light_result: Color,
}

impl TraceBackend {
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            screen_width,
            screen_height,
            ops: Arc::new(Mutex::new(Vec::new())),
            next_id: 1,
            textures: HashMap::new(),
            saved: HashMap::new(),
            light_result: Color::BLACK,
        }
    }

    /// The shared operation log.
    pub fn log(&self) -> TraceLog {
        self.ops.clone()
    }

    fn alloc(&mut self, width: u32, height: u32) -> TextureId {
        let id = self.next_id;
        self.next_id += 1;
        self.textures.insert(id, (width, height));
        TextureId::new(id)
    }
}

impl RenderBackend for TraceBackend {
    fn name(&self) -> &'static str {
        "trace"
    }

    fn screen_size(&self) -> (u32, u32) {
        (self.screen_width, self.screen_height)
    }

    fn upload_texture(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> VideoResult<TextureId> {
        let expected = (width * height * 4) as usize;
        if pixels.len() != expected {
            return Err(VideoError::Backend(format!(
                "texture upload of {}x{} expected {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        let id = self.alloc(width, height);
        self.saved.insert(
            id.id(),
            SavedTexture {
                pixels: pixels.to_vec(),
                width,
                height,
                linear_filter: false,
                clamp: true,
            },
        );
        Ok(id)
    }

    fn allocate_texture(&mut self, width: u32, height: u32) -> VideoResult<TextureId> {
        Ok(self.alloc(width, height))
    }

    fn download_texture(&mut self, id: TextureId) -> VideoResult<SavedTexture> {
        if let Some(saved) = self.saved.get(&id.id()) {
            return Ok(saved.clone());
        }
        let (width, height) = self
            .textures
            .get(&id.id())
            .copied()
            .ok_or(VideoError::UnknownTexture(id.id()))?;
        Ok(SavedTexture {
            pixels: vec![0; (width * height * 4) as usize],
            width,
            height,
            linear_filter: false,
            clamp: true,
        })
    }

    fn restore_texture(&mut self, saved: &SavedTexture) -> VideoResult<TextureId> {
        let id = self.alloc(saved.width, saved.height);
        self.saved.insert(id.id(), saved.clone());
        Ok(id)
    }

    fn destroy_texture(&mut self, id: TextureId) {
        self.textures.remove(&id.id());
        self.saved.remove(&id.id());
    }

    fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    fn draw_texture(&mut self, id: TextureId, quad: &TextureQuad) {
        self.ops.lock().push(TraceOp::Texture {
            id: id.id(),
            dst: quad.dst,
            hflip: quad.hflip,
            vflip: quad.vflip,
            alpha: quad.alpha,
            color: quad.color,
            blend: quad.blend,
        });
    }

    fn draw_gradient(&mut self, top: Color, bottom: Color) {
        self.ops.lock().push(TraceOp::Gradient { top, bottom });
    }

    fn fill_rect(&mut self, rect: Rectf, color: Color) {
        self.ops.lock().push(TraceOp::FillRect { rect, color });
    }

    fn begin_lightmap(&mut self, width: u32, height: u32, ambient: Color) {
        self.ops.lock().push(TraceOp::BeginLightmap {
            width,
            height,
            ambient,
        });
    }

    fn finish_lightmap(&mut self, target: TextureId, _width: u32, _height: u32) {
        self.ops
            .lock()
            .push(TraceOp::FinishLightmap { target: target.id() });
    }

    fn composite_lightmap(&mut self, id: TextureId, _uv_right: f32, _uv_bottom: f32) {
        self.ops
            .lock()
            .push(TraceOp::CompositeLightmap { id: id.id() });
    }

    fn read_pixel(&mut self, x: f32, y: f32) -> Color {
        self.ops.lock().push(TraceOp::ReadPixel { x, y });
        self.light_result
    }

    fn reconfigure(&mut self, options: &VideoOptions) -> VideoResult<()> {
        options.validate()?;
        self.screen_width = options.screen_width;
        self.screen_height = options.screen_height;
        Ok(())
    }

    fn present(&mut self) {
        self.ops.lock().push(TraceOp::Present);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_operations_in_order() {
        let mut backend = TraceBackend::new(800, 600);
        let log = backend.log();
        backend.draw_gradient(Color::BLACK, Color::WHITE);
        backend.present();
        let ops = log.lock();
        assert_eq!(ops.len(), 2);
        assert!(matches!(ops[0], TraceOp::Gradient { .. }));
        assert!(matches!(ops[1], TraceOp::Present));
    }

    #[test]
    fn tracks_texture_lifecycle() {
        let mut backend = TraceBackend::new(800, 600);
        let id = backend.allocate_texture(64, 64).unwrap();
        assert_eq!(backend.live_texture_count(), 1);
        backend.destroy_texture(id);
        assert_eq!(backend.live_texture_count(), 0);
    }

    #[test]
    fn download_restore_keeps_pixels() {
        let mut backend = TraceBackend::new(800, 600);
        let pixels = vec![7u8; 4 * 4 * 4];
        let id = backend.upload_texture(&pixels, 4, 4).unwrap();
        let saved = backend.download_texture(id).unwrap();
        assert_eq!(saved.pixels, pixels);
        let id2 = backend.restore_texture(&saved).unwrap();
        assert_ne!(id, id2);
        assert_eq!(backend.download_texture(id2).unwrap().pixels, pixels);
    }
}
