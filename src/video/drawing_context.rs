//! The deferred drawing queue.
//!
//! Game code submits draw calls at any point during a frame; nothing
//! touches the backend until [`DrawingContext::do_drawing`] flushes. The
//! flush runs the lightmap pass first (when the ambient color darkens the
//! scene), then sorts the screen queue by layer and dispatches it in
//! order. Submission order is preserved within a layer.

use std::sync::Arc;

use log::{debug, warn};

use crate::math::{Rectf, Sizef, Vector};
use crate::video::backend::{RenderBackend, SharedBackend, TextureQuad};
use crate::video::color::{Blend, Color};
use crate::video::font::{Font, FontAlignment};
use crate::video::request::{
    DrawingEffect, DrawingRequest, LightSlot, RequestKind, Target, Transform, LAYER_GUI,
    LAYER_HUD,
};
use crate::video::surface::Surface;
use crate::video::texture::{next_power_of_two, Texture};
use crate::video::texture_manager::TextureManager;
use crate::error::VideoResult;

/// The lightmap renders at this fraction of the screen resolution.
const LIGHTMAP_DIV: u32 = 4;

pub struct DrawingContext {
    backend: SharedBackend,
    manager: Arc<TextureManager>,
    screen_width: f32,
    screen_height: f32,
    transform: Transform,
    transform_stack: Vec<Transform>,
    target: Target,
    target_stack: Vec<Target>,
    drawing_requests: Vec<DrawingRequest>,
    lightmap_requests: Vec<DrawingRequest>,
    ambient_color: Color,
    lightmap: Arc<Texture>,
    lightmap_width: u32,
    lightmap_height: u32,
    lightmap_uv_right: f32,
    lightmap_uv_bottom: f32,
}

impl DrawingContext {
    pub fn new(backend: SharedBackend, manager: Arc<TextureManager>) -> VideoResult<Self> {
        let (screen_width, screen_height) = backend.lock().screen_size();
        let lightmap_width = screen_width / LIGHTMAP_DIV;
        let lightmap_height = screen_height / LIGHTMAP_DIV;
        let padded_width = next_power_of_two(lightmap_width);
        let padded_height = next_power_of_two(lightmap_height);
        let lightmap = Arc::new(Texture::new(&backend, padded_width, padded_height)?);
        manager.register_texture(&lightmap);

        Ok(Self {
            backend,
            manager,
            screen_width: screen_width as f32,
            screen_height: screen_height as f32,
            transform: Transform::default(),
            transform_stack: Vec::new(),
            target: Target::Screen,
            target_stack: Vec::new(),
            drawing_requests: Vec::new(),
            lightmap_requests: Vec::new(),
            ambient_color: Color::WHITE,
            lightmap_uv_right: lightmap_width as f32 / padded_width as f32,
            lightmap_uv_bottom: lightmap_height as f32 / padded_height as f32,
            lightmap,
            lightmap_width,
            lightmap_height,
        })
    }

    pub fn screen_width(&self) -> f32 {
        self.screen_width
    }

    pub fn screen_height(&self) -> f32 {
        self.screen_height
    }

    // --- submission -------------------------------------------------------

    /// Queue a surface draw. Requests that land fully off-screen are
    /// dropped here rather than at dispatch.
    pub fn draw_surface(&mut self, surface: &Surface, pos: Vector, layer: i32) {
        self.draw_surface_ext(surface, pos, layer, 0.0, Color::WHITE, Blend::default());
    }

    /// Queue a surface draw with rotation, tint and a custom blend mode.
    pub fn draw_surface_ext(
        &mut self,
        surface: &Surface,
        pos: Vector,
        layer: i32,
        angle: f32,
        color: Color,
        blend: Blend,
    ) {
        let pos = self.transform.apply(pos);
        if pos.x >= self.screen_width
            || pos.y >= self.screen_height
            || pos.x + surface.get_width() < 0.0
            || pos.y + surface.get_height() < 0.0
        {
            return;
        }

        let request = DrawingRequest {
            kind: RequestKind::Surface {
                surface: surface.clone(),
            },
            pos,
            layer,
            alpha: self.transform.alpha,
            angle,
            color,
            blend,
            effect: self.transform.effect,
        };
        self.requests().push(request);
    }

    /// Queue a partial surface draw. A destination that hangs off the
    /// top or left screen edge is clipped by shrinking the source region.
    pub fn draw_surface_part(
        &mut self,
        surface: &Surface,
        source: Vector,
        size: Sizef,
        pos: Vector,
        layer: i32,
    ) {
        let mut pos = self.transform.apply(pos);
        let mut source = source;
        let mut size = size;

        if pos.x < 0.0 {
            source.x -= pos.x;
            size.width += pos.x;
            pos.x = 0.0;
        }
        if pos.y < 0.0 {
            source.y -= pos.y;
            size.height += pos.y;
            pos.y = 0.0;
        }
        if size.is_empty() {
            return;
        }

        let request = DrawingRequest {
            kind: RequestKind::SurfacePart {
                surface: surface.clone(),
                source,
                size,
            },
            pos,
            layer,
            alpha: self.transform.alpha,
            angle: 0.0,
            color: Color::WHITE,
            blend: Blend::default(),
            effect: self.transform.effect,
        };
        self.requests().push(request);
    }

    pub fn draw_text(
        &mut self,
        font: &Arc<Font>,
        text: &str,
        pos: Vector,
        alignment: FontAlignment,
        layer: i32,
    ) {
        let request = DrawingRequest {
            kind: RequestKind::Text {
                font: font.clone(),
                text: text.to_string(),
                alignment,
            },
            pos: self.transform.apply(pos),
            layer,
            alpha: self.transform.alpha,
            angle: 0.0,
            color: Color::WHITE,
            blend: Blend::default(),
            effect: self.transform.effect,
        };
        self.requests().push(request);
    }

    /// Text centered around the middle of the screen; `pos.x` offsets from
    /// center and the camera translation applies as usual.
    pub fn draw_center_text(&mut self, font: &Arc<Font>, text: &str, pos: Vector, layer: i32) {
        self.draw_text(
            font,
            text,
            Vector::new(pos.x + self.screen_width / 2.0, pos.y),
            FontAlignment::Center,
            layer,
        );
    }

    pub fn draw_gradient(&mut self, top: Color, bottom: Color, layer: i32) {
        let request = DrawingRequest {
            kind: RequestKind::Gradient { top, bottom },
            pos: Vector::ZERO,
            layer,
            alpha: self.transform.alpha,
            angle: 0.0,
            color: Color::WHITE,
            blend: Blend::default(),
            effect: DrawingEffect::NoEffect,
        };
        self.requests().push(request);
    }

    pub fn draw_filled_rect(&mut self, pos: Vector, size: Sizef, color: Color, layer: i32) {
        // The transform alpha folds into the color at submission so the
        // dispatch path treats fills uniformly.
        let request = DrawingRequest {
            kind: RequestKind::FillRect {
                size,
                color: color.multiply_alpha(self.transform.alpha),
            },
            pos: self.transform.apply(pos),
            layer,
            alpha: self.transform.alpha,
            angle: 0.0,
            color: Color::WHITE,
            blend: Blend::default(),
            effect: DrawingEffect::NoEffect,
        };
        self.requests().push(request);
    }

    pub fn draw_filled_rect_rect(&mut self, rect: Rectf, color: Color, layer: i32) {
        self.draw_filled_rect(rect.pos, rect.size, color, layer);
    }

    /// Query the accumulated light at a world position. The slot is filled
    /// during the flush; with a pure-white ambient color the answer is
    /// known immediately and nothing is queued.
    pub fn get_light(&mut self, pos: Vector, slot: &LightSlot) {
        if self.ambient_color.rgb_is_white() {
            slot.set(Color::WHITE);
            return;
        }

        let request = DrawingRequest {
            kind: RequestKind::GetLight { slot: slot.clone() },
            pos: self.transform.apply(pos),
            // Highest layer: samples after all light has accumulated.
            layer: LAYER_GUI,
            alpha: 1.0,
            angle: 0.0,
            color: Color::WHITE,
            blend: Blend::default(),
            effect: DrawingEffect::NoEffect,
        };
        self.lightmap_requests.push(request);
    }

    fn requests(&mut self) -> &mut Vec<DrawingRequest> {
        match self.target {
            Target::Screen => &mut self.drawing_requests,
            Target::Lightmap => &mut self.lightmap_requests,
        }
    }

    // --- transform and target state ---------------------------------------

    pub fn push_transform(&mut self) {
        self.transform_stack.push(self.transform);
    }

    pub fn pop_transform(&mut self) {
        debug_assert!(!self.transform_stack.is_empty(), "transform stack underflow");
        if let Some(transform) = self.transform_stack.pop() {
            self.transform = transform;
        }
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.transform.alpha = alpha;
    }

    pub fn get_alpha(&self) -> f32 {
        self.transform.alpha
    }

    pub fn set_drawing_effect(&mut self, effect: DrawingEffect) {
        self.transform.effect = effect;
    }

    pub fn get_drawing_effect(&self) -> DrawingEffect {
        self.transform.effect
    }

    pub fn set_translation(&mut self, offset: Vector) {
        self.transform.offset = offset;
    }

    pub fn get_translation(&self) -> Vector {
        self.transform.offset
    }

    pub fn push_target(&mut self) {
        self.target_stack.push(self.target);
    }

    pub fn pop_target(&mut self) {
        debug_assert!(!self.target_stack.is_empty(), "target stack underflow");
        if let Some(target) = self.target_stack.pop() {
            self.target = target;
        }
    }

    pub fn set_target(&mut self, target: Target) {
        self.target = target;
    }

    pub fn set_ambient_color(&mut self, color: Color) {
        self.ambient_color = color;
    }

    pub fn get_ambient_color(&self) -> Color {
        self.ambient_color
    }

    // --- flush -------------------------------------------------------------

    /// Render the frame: lightmap pass, layer-sorted screen pass, present.
    /// Both queues are empty afterwards.
    pub fn do_drawing(&mut self) {
        debug_assert!(
            self.transform_stack.is_empty(),
            "unbalanced push_transform at frame end"
        );
        debug_assert!(
            self.target_stack.is_empty(),
            "unbalanced push_target at frame end"
        );
        self.transform_stack.clear();
        self.target_stack.clear();

        if !self.ambient_color.rgb_is_white() {
            let mut requests = std::mem::take(&mut self.lightmap_requests);
            requests.sort_by_key(|request| request.layer);

            {
                let mut backend = self.backend.lock();
                backend.begin_lightmap(
                    self.lightmap_width,
                    self.lightmap_height,
                    self.ambient_color,
                );
                for request in &requests {
                    self.dispatch(&mut *backend, request);
                }
                backend.finish_lightmap(
                    self.lightmap.handle(),
                    self.lightmap_width,
                    self.lightmap_height,
                );
            }
            // A request can hold the last reference to a texture, and
            // freeing a texture re-locks the backend: the queue must not
            // be dropped while the guard is held.
            drop(requests);

            // Composite just below the HUD: world content is lit, UI is not.
            self.drawing_requests.push(DrawingRequest {
                kind: RequestKind::LightmapComposite,
                pos: Vector::ZERO,
                layer: LAYER_HUD - 1,
                alpha: 1.0,
                angle: 0.0,
                color: Color::WHITE,
                blend: Blend::default(),
                effect: DrawingEffect::NoEffect,
            });
        } else if !self.lightmap_requests.is_empty() {
            debug!(
                "dropping {} lightmap requests: ambient color is white",
                self.lightmap_requests.len()
            );
            for request in self.lightmap_requests.drain(..) {
                // Pending light queries still get the short-circuit answer.
                if let RequestKind::GetLight { slot } = &request.kind {
                    slot.set(Color::WHITE);
                }
            }
        }

        let mut requests = std::mem::take(&mut self.drawing_requests);
        // Stable sort: within a layer, submission order wins.
        requests.sort_by_key(|request| request.layer);

        {
            let mut backend = self.backend.lock();
            for request in &requests {
                self.dispatch(&mut *backend, request);
            }
            backend.present();
        }
        // Same constraint as the lightmap queue: release the guard before
        // the requests free their textures.
        drop(requests);
    }

    fn dispatch(&self, backend: &mut dyn RenderBackend, request: &DrawingRequest) {
        match &request.kind {
            RequestKind::Surface { surface } => {
                self.dispatch_surface(backend, request, surface, surface.region());
            }
            RequestKind::SurfacePart {
                surface,
                source,
                size,
            } => {
                self.dispatch_surface(backend, request, surface, surface.sub_region(*source, *size));
            }
            RequestKind::Text {
                font,
                text,
                alignment,
            } => {
                font.draw(
                    backend,
                    text,
                    request.pos,
                    *alignment,
                    request.effect,
                    request.alpha,
                );
            }
            RequestKind::Gradient { top, bottom } => {
                backend.draw_gradient(
                    top.multiply_alpha(request.alpha),
                    bottom.multiply_alpha(request.alpha),
                );
            }
            RequestKind::FillRect { size, color } => {
                backend.fill_rect(Rectf::new(request.pos, *size), *color);
            }
            RequestKind::LightmapComposite => {
                backend.composite_lightmap(
                    self.lightmap.handle(),
                    self.lightmap_uv_right,
                    self.lightmap_uv_bottom,
                );
            }
            RequestKind::GetLight { slot } => {
                slot.set(backend.read_pixel(request.pos.x, request.pos.y));
            }
        }
    }

    fn dispatch_surface(
        &self,
        backend: &mut dyn RenderBackend,
        request: &DrawingRequest,
        surface: &Surface,
        src: Rectf,
    ) {
        let handle = surface.texture().handle();
        if handle.is_none() {
            // Texture lost (mid mode-change); draw degrades to a skip.
            warn!("surface texture has no backend handle, skipping draw");
            return;
        }

        let (mut hflip, vflip) = request.effect.flips();
        hflip ^= surface.flipx();

        let quad = TextureQuad {
            src,
            dst: Rectf::new(request.pos, src.size),
            hflip,
            vflip,
            alpha: request.alpha,
            angle: request.angle,
            color: request.color,
            blend: request.blend,
        };
        backend.draw_texture(handle, &quad);
    }
}

impl Drop for DrawingContext {
    fn drop(&mut self) {
        self.manager.remove_texture(&self.lightmap);
    }
}
