//! Fixed-cell bitmap font rendering.
//!
//! A font is a glyph-sheet surface holding a grid of equally sized cells,
//! laid out in ASCII order starting at `first_char`. Characters outside
//! the covered range draw as blanks.

use std::path::Path;
use std::sync::Arc;

use crate::error::VideoResult;
use crate::math::{Rectf, Sizef, Vector};
use crate::video::backend::{RenderBackend, TextureQuad};
use crate::video::color::{Blend, Color};
use crate::video::request::DrawingEffect;
use crate::video::surface::Surface;
use crate::video::texture_manager::TextureManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontAlignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug)]
pub struct Font {
    glyphs: Surface,
    glyph_width: f32,
    glyph_height: f32,
    first_char: u8,
    chars_per_line: u32,
}

impl Font {
    pub fn new(
        manager: &TextureManager,
        path: &Path,
        glyph_width: u32,
        glyph_height: u32,
        first_char: u8,
    ) -> VideoResult<Arc<Self>> {
        let glyphs = Surface::from_file(manager, path)?;
        let chars_per_line = (glyphs.get_width() as u32 / glyph_width).max(1);
        Ok(Arc::new(Self {
            glyphs,
            glyph_width: glyph_width as f32,
            glyph_height: glyph_height as f32,
            first_char,
            chars_per_line,
        }))
    }

    /// Build a font around an already-loaded glyph sheet, bypassing disk.
    #[cfg(test)]
    pub(crate) fn test_new(
        glyphs: Surface,
        glyph_width: f32,
        glyph_height: f32,
        first_char: u8,
        chars_per_line: u32,
    ) -> Self {
        Self {
            glyphs,
            glyph_width,
            glyph_height,
            first_char,
            chars_per_line,
        }
    }

    pub fn get_text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.glyph_width
    }

    pub fn get_height(&self) -> f32 {
        self.glyph_height
    }

    fn glyph_source(&self, ch: char) -> Option<Vector> {
        let code = u32::from(ch);
        let first = u32::from(self.first_char);
        if code < first {
            return None;
        }
        let index = code - first;
        let rows = (self.glyphs.get_height() / self.glyph_height) as u32;
        if index >= self.chars_per_line * rows {
            return None;
        }
        Some(Vector::new(
            (index % self.chars_per_line) as f32 * self.glyph_width,
            (index / self.chars_per_line) as f32 * self.glyph_height,
        ))
    }

    /// Draw one line of text directly to the backend. Called during the
    /// queue flush, not at submission time.
    pub(crate) fn draw(
        &self,
        backend: &mut dyn RenderBackend,
        text: &str,
        pos: Vector,
        alignment: FontAlignment,
        effect: DrawingEffect,
        alpha: f32,
    ) {
        let width = self.get_text_width(text);
        let start_x = match alignment {
            FontAlignment::Left => pos.x,
            FontAlignment::Center => pos.x - width / 2.0,
            FontAlignment::Right => pos.x - width,
        };

        let handle = self.glyphs.texture().handle();
        if handle.is_none() {
            return;
        }
        let (hflip, vflip) = effect.flips();

        for (i, ch) in text.chars().enumerate() {
            let Some(source) = self.glyph_source(ch) else {
                continue;
            };
            let quad = TextureQuad {
                src: Rectf::new(source, Sizef::new(self.glyph_width, self.glyph_height)),
                dst: Rectf::new(
                    Vector::new(start_x + i as f32 * self.glyph_width, pos.y),
                    Sizef::new(self.glyph_width, self.glyph_height),
                ),
                hflip,
                vflip,
                alpha,
                angle: 0.0,
                color: Color::WHITE,
                blend: Blend::default(),
            };
            backend.draw_texture(handle, &quad);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::backend::{shared, trace::TraceBackend};
    use crate::video::texture::{ImageTexture, Texture};
    use std::path::PathBuf;

    fn test_font() -> Font {
        // 16x8 grid of 8x12 glyphs starting at space.
        let backend = shared(TraceBackend::new(800, 600));
        let texture = Texture::new(&backend, 128, 128).unwrap();
        let image = Arc::new(ImageTexture::new(
            texture,
            PathBuf::from("font.png"),
            128,
            96,
        ));
        Font {
            glyphs: Surface::test_from_image(image),
            glyph_width: 8.0,
            glyph_height: 12.0,
            first_char: b' ',
            chars_per_line: 16,
        }
    }

    #[test]
    fn text_width_is_monospace() {
        let font = test_font();
        assert_eq!(font.get_text_width(""), 0.0);
        assert_eq!(font.get_text_width("abc"), 24.0);
        assert_eq!(font.get_height(), 12.0);
    }

    #[test]
    fn glyph_source_walks_the_grid() {
        let font = test_font();
        assert_eq!(font.glyph_source(' '), Some(Vector::ZERO));
        assert_eq!(font.glyph_source('!'), Some(Vector::new(8.0, 0.0)));
        // 16 glyphs per line: code 48 ('0') lands at row 1.
        assert_eq!(font.glyph_source('0'), Some(Vector::new(0.0, 12.0)));
    }

    #[test]
    fn out_of_range_chars_are_skipped() {
        let font = test_font();
        assert_eq!(font.glyph_source('\x08'), None);
        assert_eq!(font.glyph_source('\u{1F600}'), None);
    }
}
