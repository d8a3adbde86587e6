//! Deferred, layer-ordered 2D rendering.
//!
//! [`VideoSystem`] owns the three pieces: a backend (hardware or
//! software), the texture cache, and the drawing-request queue. Create
//! one at startup, hand its [`DrawingContext`] to the frame loop, and call
//! `do_drawing()` once per frame.

pub mod backend;
pub mod color;
pub mod drawing_context;
pub mod font;
pub mod request;
pub mod surface;
pub mod texture;
pub mod texture_manager;

use std::sync::Arc;

use log::{info, warn};

use crate::config::VideoOptions;
use crate::error::VideoResult;
use backend::{shared, SharedBackend};
use texture_manager::TextureManager;

pub use color::{Blend, BlendFactor, Color};
pub use drawing_context::DrawingContext;
pub use font::{Font, FontAlignment};
pub use request::{DrawingEffect, LightSlot, Target};
pub use surface::Surface;

/// The rendering subsystem: backend, texture cache, drawing queue.
pub struct VideoSystem {
    backend: SharedBackend,
    textures: Arc<TextureManager>,
    context: DrawingContext,
}

fn create_backend(options: &VideoOptions) -> SharedBackend {
    #[cfg(feature = "opengl")]
    if options.use_opengl {
        match backend::opengl::GlBackend::new(options) {
            Ok(gl) => return shared(gl),
            Err(err) => {
                warn!("OpenGL initialization failed ({err}), falling back to software rendering");
            }
        }
    }
    #[cfg(not(feature = "opengl"))]
    if options.use_opengl {
        warn!("OpenGL support not compiled in, falling back to software rendering");
    }
    shared(backend::software::SoftwareBackend::new(options))
}

impl VideoSystem {
    pub fn new(options: &VideoOptions) -> VideoResult<Self> {
        options.validate()?;
        let backend = create_backend(options);
        info!("video system using the {} backend", backend.lock().name());
        Self::with_backend(backend)
    }

    /// Build on an already-created backend. Tests use this to inject a
    /// recording backend.
    pub fn with_backend(backend: SharedBackend) -> VideoResult<Self> {
        let textures = Arc::new(TextureManager::new(backend.clone()));
        let context = DrawingContext::new(backend.clone(), textures.clone())?;
        Ok(Self {
            backend,
            textures,
            context,
        })
    }

    pub fn context(&mut self) -> &mut DrawingContext {
        &mut self.context
    }

    pub fn textures(&self) -> &Arc<TextureManager> {
        &self.textures
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    /// Change resolution, window size or fullscreen state without losing
    /// texture contents: every live texture is saved to host memory,
    /// the backend reconfigured, and the textures restored.
    pub fn apply_mode_change(&mut self, options: &VideoOptions) -> VideoResult<()> {
        options.validate()?;
        self.textures.save_textures()?;
        self.backend.lock().reconfigure(options)?;
        self.textures.reload_textures()?;
        // The lightmap is sized from the screen, so the context is rebuilt.
        self.context = DrawingContext::new(self.backend.clone(), self.textures.clone())?;
        info!(
            "mode change applied: {}x{} logical, fullscreen={}",
            options.screen_width, options.screen_height, options.fullscreen
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::backend::trace::TraceBackend;

    #[test]
    fn with_backend_builds_context() {
        let mut system = VideoSystem::with_backend(shared(TraceBackend::new(800, 600))).unwrap();
        assert_eq!(system.context().screen_width(), 800.0);
        assert_eq!(system.context().screen_height(), 600.0);
    }

    #[test]
    fn mode_change_keeps_texture_count() {
        let mut system = VideoSystem::with_backend(shared(TraceBackend::new(800, 600))).unwrap();
        let before = system.backend().lock().live_texture_count();

        let options = VideoOptions {
            screen_width: 640,
            screen_height: 480,
            window_width: 640,
            window_height: 480,
            ..VideoOptions::default()
        };
        system.apply_mode_change(&options).unwrap();

        // Old lightmap replaced by the new one.
        assert_eq!(system.backend().lock().live_texture_count(), before);
        assert_eq!(system.context().screen_width(), 640.0);
    }

    #[test]
    fn invalid_options_rejected() {
        let mut system = VideoSystem::with_backend(shared(TraceBackend::new(800, 600))).unwrap();
        let options = VideoOptions {
            screen_width: 0,
            ..VideoOptions::default()
        };
        assert!(system.apply_mode_change(&options).is_err());
    }
}
