//! Software blitting backend.
//!
//! Keeps every texture's pixel data in host memory and renders into a
//! plain RGBA framebuffer, so it works headless (tests, servers without a
//! GPU) and can never lose its graphics context. The embedding platform
//! layer installs a present hook to get finished frames onto an actual
//! window.

use std::collections::HashMap;

use log::{debug, warn};

use crate::config::VideoOptions;
use crate::error::{VideoError, VideoResult};
use crate::math::Rectf;
use crate::video::backend::{RenderBackend, TextureQuad};
use crate::video::color::Color;
use crate::video::texture::{SavedTexture, TextureId};

/// Called with the finished frame on present: pixels, width, height.
pub type PresentHook = Box<dyn FnMut(&[u8], u32, u32) + Send>;

struct SoftTexture {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    linear_filter: bool,
    clamp: bool,
}

/// An RGBA pixel buffer we can blit into.
struct PixelBuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![0; (width * height * 4) as usize],
            width,
            height,
        }
    }

    fn fill(&mut self, color: Color) {
        let rgba = color.to_rgba8();
        for pixel in self.pixels.chunks_exact_mut(4) {
            pixel.copy_from_slice(&rgba);
        }
    }

    fn get(&self, x: i32, y: i32) -> Color {
        let offset = ((y as u32 * self.width + x as u32) * 4) as usize;
        Color::from_rgba8([
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
            self.pixels[offset + 3],
        ])
    }

    fn set(&mut self, x: i32, y: i32, color: Color) {
        let offset = ((y as u32 * self.width + x as u32) * 4) as usize;
        self.pixels[offset..offset + 4].copy_from_slice(&color.to_rgba8());
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }
}

/// Which buffer draws currently land in.
#[derive(Clone, Copy)]
enum DrawTarget {
    Frame,
    Lightmap,
}

pub struct SoftwareBackend {
    screen_width: u32,
    screen_height: u32,
    frame: PixelBuffer,
    textures: HashMap<u32, SoftTexture>,
    next_id: u32,
    /// Lazily flipped whole-texture pixel variants, at most one per
    /// texture and flip combination.
    flip_cache: HashMap<(u32, bool, bool), Vec<u8>>,
    lightmap: Option<PixelBuffer>,
    target: DrawTarget,
    linear_filtering: bool,
    present_hook: Option<PresentHook>,
    frames_presented: u64,
}

impl SoftwareBackend {
    pub fn new(options: &VideoOptions) -> Self {
        Self {
            screen_width: options.screen_width,
            screen_height: options.screen_height,
            frame: PixelBuffer::new(options.screen_width, options.screen_height),
            textures: HashMap::new(),
            next_id: 1,
            flip_cache: HashMap::new(),
            lightmap: None,
            target: DrawTarget::Frame,
            linear_filtering: options.linear_filtering,
            present_hook: None,
            frames_presented: 0,
        }
    }

    /// Install a hook that receives the finished frame on every present.
    pub fn set_present_hook(&mut self, hook: PresentHook) {
        self.present_hook = Some(hook);
    }

    /// The current frame contents (RGBA, row-major).
    pub fn frame_pixels(&self) -> &[u8] {
        &self.frame.pixels
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    /// Scale factors from logical screen coordinates into the active
    /// target buffer. The lightmap buffer is smaller than the screen, so
    /// draws during a lightmap pass shrink accordingly.
    fn target_scale(&self) -> (f32, f32) {
        match (self.target, self.lightmap.as_ref()) {
            (DrawTarget::Lightmap, Some(lightmap)) => (
                lightmap.width as f32 / self.screen_width as f32,
                lightmap.height as f32 / self.screen_height as f32,
            ),
            _ => (1.0, 1.0),
        }
    }

    fn target_buffer(&mut self) -> &mut PixelBuffer {
        match (self.target, self.lightmap.as_mut()) {
            (DrawTarget::Lightmap, Some(lightmap)) => lightmap,
            (_, _) => &mut self.frame,
        }
    }

    /// Make sure the flipped whole-texture variant for `key` exists.
    fn ensure_flip_variant(&mut self, key: (u32, bool, bool)) {
        if self.flip_cache.contains_key(&key) {
            return;
        }
        if let Some(texture) = self.textures.get(&key.0) {
            let flipped = flip_pixels(
                &texture.pixels,
                texture.width,
                texture.height,
                key.1,
                key.2,
            );
            self.flip_cache.insert(key, flipped);
        }
    }
}

fn flip_pixels(pixels: &[u8], width: u32, height: u32, hflip: bool, vflip: bool) -> Vec<u8> {
    let mut out = vec![0u8; pixels.len()];
    let row_bytes = (width * 4) as usize;
    for y in 0..height as usize {
        let src_y = if vflip { height as usize - 1 - y } else { y };
        for x in 0..width as usize {
            let src_x = if hflip { width as usize - 1 - x } else { x };
            let src_off = src_y * row_bytes + src_x * 4;
            let dst_off = y * row_bytes + x * 4;
            out[dst_off..dst_off + 4].copy_from_slice(&pixels[src_off..src_off + 4]);
        }
    }
    out
}

fn blend_pixel(dst: Color, src: Color, blend: crate::video::color::Blend) -> Color {
    let sa = src.alpha;
    Color::new(
        (src.red * blend.sfactor.apply(sa, dst.red) + dst.red * blend.dfactor.apply(sa, dst.red))
            .clamp(0.0, 1.0),
        (src.green * blend.sfactor.apply(sa, dst.green)
            + dst.green * blend.dfactor.apply(sa, dst.green))
        .clamp(0.0, 1.0),
        (src.blue * blend.sfactor.apply(sa, dst.blue)
            + dst.blue * blend.dfactor.apply(sa, dst.blue))
        .clamp(0.0, 1.0),
        (sa + dst.alpha * (1.0 - sa)).clamp(0.0, 1.0),
    )
}

impl RenderBackend for SoftwareBackend {
    fn name(&self) -> &'static str {
        "software"
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
        let id = self.alloc_id();
        self.textures.insert(
            id,
            SoftTexture {
                pixels: pixels.to_vec(),
                width,
                height,
                linear_filter: self.linear_filtering,
                clamp: true,
            },
        );
        Ok(TextureId::new(id))
    }

    fn allocate_texture(&mut self, width: u32, height: u32) -> VideoResult<TextureId> {
        let id = self.alloc_id();
        self.textures.insert(
            id,
            SoftTexture {
                pixels: vec![0; (width * height * 4) as usize],
                width,
                height,
                linear_filter: self.linear_filtering,
                clamp: true,
            },
        );
        Ok(TextureId::new(id))
    }

    fn download_texture(&mut self, id: TextureId) -> VideoResult<SavedTexture> {
        let texture = self
            .textures
            .get(&id.id())
            .ok_or(VideoError::UnknownTexture(id.id()))?;
        Ok(SavedTexture {
            pixels: texture.pixels.clone(),
            width: texture.width,
            height: texture.height,
            linear_filter: texture.linear_filter,
            clamp: texture.clamp,
        })
    }

    fn restore_texture(&mut self, saved: &SavedTexture) -> VideoResult<TextureId> {
        let id = self.alloc_id();
        self.textures.insert(
            id,
            SoftTexture {
                pixels: saved.pixels.clone(),
                width: saved.width,
                height: saved.height,
                linear_filter: saved.linear_filter,
                clamp: saved.clamp,
            },
        );
        Ok(TextureId::new(id))
    }

    fn destroy_texture(&mut self, id: TextureId) {
        self.textures.remove(&id.id());
        self.flip_cache.retain(|(tex, _, _), _| *tex != id.id());
    }

    fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    fn draw_texture(&mut self, id: TextureId, quad: &TextureQuad) {
        if quad.angle != 0.0 {
            // Rotation is only supported by the hardware path.
            debug!("software backend ignores rotation angle {}", quad.angle);
        }
        let (sx, sy) = self.target_scale();

        let Some((tex_width, tex_height)) = self
            .textures
            .get(&id.id())
            .map(|texture| (texture.width, texture.height))
        else {
            warn!("no pixel data for texture {}, skipping draw", id.id());
            return;
        };

        // Flips mirror the whole padded texture, so the source rectangle
        // mirrors with it.
        let mut src = quad.src;
        if quad.hflip {
            src.pos.x = tex_width as f32 - src.pos.x - src.size.width;
        }
        if quad.vflip {
            src.pos.y = tex_height as f32 - src.pos.y - src.size.height;
        }

        let key = (id.id(), quad.hflip, quad.vflip);
        let flipped = quad.hflip || quad.vflip;
        if flipped {
            self.ensure_flip_variant(key);
        }

        // Field-level split: the source pixels live in the texture store /
        // flip cache, the destination in the frame or lightmap buffer.
        let target = match (self.target, self.lightmap.as_mut()) {
            (DrawTarget::Lightmap, Some(lightmap)) => lightmap,
            _ => &mut self.frame,
        };
        let pixels: &[u8] = if flipped {
            match self.flip_cache.get(&key) {
                Some(pixels) => pixels,
                None => return,
            }
        } else {
            match self.textures.get(&id.id()) {
                Some(texture) => &texture.pixels,
                None => return,
            }
        };

        let out_x = (quad.dst.pos.x * sx).floor() as i32;
        let out_y = (quad.dst.pos.y * sy).floor() as i32;
        let out_w = (quad.dst.size.width * sx).round().max(0.0) as i32;
        let out_h = (quad.dst.size.height * sy).round().max(0.0) as i32;
        if out_w == 0 || out_h == 0 {
            return;
        }

        let tint = quad.color;
        let alpha = quad.alpha;
        let blend = quad.blend;
        let row_bytes = (tex_width * 4) as usize;

        for oy in 0..out_h {
            let ty = out_y + oy;
            let src_y =
                (src.pos.y + (oy as f32 + 0.5) / out_h as f32 * src.size.height).floor() as i32;
            if src_y < 0 || src_y >= tex_height as i32 {
                continue;
            }
            for ox in 0..out_w {
                let tx = out_x + ox;
                if !target.contains(tx, ty) {
                    continue;
                }
                let src_x =
                    (src.pos.x + (ox as f32 + 0.5) / out_w as f32 * src.size.width).floor() as i32;
                if src_x < 0 || src_x >= tex_width as i32 {
                    continue;
                }
                let offset = src_y as usize * row_bytes + src_x as usize * 4;
                let texel = Color::from_rgba8([
                    pixels[offset],
                    pixels[offset + 1],
                    pixels[offset + 2],
                    pixels[offset + 3],
                ]);
                let src_color = Color::new(
                    texel.red * tint.red,
                    texel.green * tint.green,
                    texel.blue * tint.blue,
                    texel.alpha * tint.alpha * alpha,
                );
                let dst_color = target.get(tx, ty);
                target.set(tx, ty, blend_pixel(dst_color, src_color, blend));
            }
        }
    }

    fn draw_gradient(&mut self, top: Color, bottom: Color) {
        let target = self.target_buffer();
        let height = target.height.max(1);
        for y in 0..target.height as i32 {
            let t = y as f32 / height as f32;
            let row = Color::new(
                top.red + (bottom.red - top.red) * t,
                top.green + (bottom.green - top.green) * t,
                top.blue + (bottom.blue - top.blue) * t,
                top.alpha + (bottom.alpha - top.alpha) * t,
            );
            for x in 0..target.width as i32 {
                let dst = target.get(x, y);
                target.set(x, y, blend_pixel(dst, row, crate::video::color::Blend::default()));
            }
        }
    }

    fn fill_rect(&mut self, rect: Rectf, color: Color) {
        let (sx, sy) = self.target_scale();
        let x0 = (rect.pos.x * sx).floor() as i32;
        let y0 = (rect.pos.y * sy).floor() as i32;
        let x1 = ((rect.pos.x + rect.size.width) * sx).ceil() as i32;
        let y1 = ((rect.pos.y + rect.size.height) * sy).ceil() as i32;
        let target = self.target_buffer();
        for y in y0..y1 {
            for x in x0..x1 {
                if !target.contains(x, y) {
                    continue;
                }
                let dst = target.get(x, y);
                target.set(
                    x,
                    y,
                    blend_pixel(dst, color, crate::video::color::Blend::default()),
                );
            }
        }
    }

    fn begin_lightmap(&mut self, width: u32, height: u32, ambient: Color) {
        let mut buffer = PixelBuffer::new(width, height);
        buffer.fill(Color::new(ambient.red, ambient.green, ambient.blue, 1.0));
        self.lightmap = Some(buffer);
        self.target = DrawTarget::Lightmap;
    }

    fn finish_lightmap(&mut self, target: TextureId, width: u32, height: u32) {
        let Some(lightmap) = self.lightmap.take() else {
            warn!("finish_lightmap without an open lightmap pass");
            return;
        };
        self.target = DrawTarget::Frame;
        let Some(texture) = self.textures.get_mut(&target.id()) else {
            warn!("lightmap texture {} is missing", target.id());
            return;
        };
        let rows = height.min(lightmap.height).min(texture.height);
        let cols = width.min(lightmap.width).min(texture.width);
        for y in 0..rows as usize {
            let src_off = y * (lightmap.width * 4) as usize;
            let dst_off = y * (texture.width * 4) as usize;
            texture.pixels[dst_off..dst_off + cols as usize * 4]
                .copy_from_slice(&lightmap.pixels[src_off..src_off + cols as usize * 4]);
        }
        self.flip_cache
            .retain(|(tex, _, _), _| *tex != target.id());
    }

    fn composite_lightmap(&mut self, id: TextureId, uv_right: f32, uv_bottom: f32) {
        let Some(texture) = self.textures.get(&id.id()) else {
            warn!("lightmap texture {} is missing, skipping composite", id.id());
            return;
        };
        let used_w = ((texture.width as f32 * uv_right).round() as u32).max(1);
        let used_h = ((texture.height as f32 * uv_bottom).round() as u32).max(1);
        let row_bytes = (texture.width * 4) as usize;

        let mut samples = vec![0u8; (used_w * used_h * 4) as usize];
        for y in 0..used_h as usize {
            let src = y * row_bytes;
            let dst = y * (used_w * 4) as usize;
            samples[dst..dst + (used_w * 4) as usize]
                .copy_from_slice(&texture.pixels[src..src + (used_w * 4) as usize]);
        }

        for y in 0..self.frame.height as i32 {
            let ly = (y as u32 * used_h / self.frame.height).min(used_h - 1);
            for x in 0..self.frame.width as i32 {
                let lx = (x as u32 * used_w / self.frame.width).min(used_w - 1);
                let offset = (ly * used_w + lx) as usize * 4;
                let light = Color::from_rgba8([
                    samples[offset],
                    samples[offset + 1],
                    samples[offset + 2],
                    samples[offset + 3],
                ]);
                let dst = self.frame.get(x, y);
                self.frame.set(
                    x,
                    y,
                    Color::new(
                        dst.red * light.red,
                        dst.green * light.green,
                        dst.blue * light.blue,
                        dst.alpha,
                    ),
                );
            }
        }
    }

    fn read_pixel(&mut self, x: f32, y: f32) -> Color {
        let (sx, sy) = self.target_scale();
        let px = (x * sx).floor() as i32;
        let py = (y * sy).floor() as i32;
        let buffer = match (self.target, self.lightmap.as_ref()) {
            (DrawTarget::Lightmap, Some(lightmap)) => lightmap,
            _ => &self.frame,
        };
        if buffer.contains(px, py) {
            buffer.get(px, py)
        } else {
            Color::BLACK
        }
    }

    fn reconfigure(&mut self, options: &VideoOptions) -> VideoResult<()> {
        options.validate().map_err(|err| {
            VideoError::ModeChange(format!("software backend reconfigure: {err}"))
        })?;
        self.screen_width = options.screen_width;
        self.screen_height = options.screen_height;
        self.linear_filtering = options.linear_filtering;
        self.frame = PixelBuffer::new(options.screen_width, options.screen_height);
        Ok(())
    }

    fn present(&mut self) {
        self.frames_presented += 1;
        if let Some(hook) = self.present_hook.as_mut() {
            hook(&self.frame.pixels, self.frame.width, self.frame.height);
        }
    }
}
