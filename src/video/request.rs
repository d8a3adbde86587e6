//! Deferred drawing requests.
//!
//! Nothing renders at submission time; every draw call appends one of
//! these to a queue, tagged with its layer and a snapshot of the active
//! transform. The flush sorts by layer and dispatches to the backend.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::math::{Sizef, Vector};
use crate::video::color::{Blend, Color};
use crate::video::font::{Font, FontAlignment};
use crate::video::surface::Surface;

// Conventional layer values, background to front.
pub const LAYER_BACKGROUND0: i32 = -300;
pub const LAYER_BACKGROUND1: i32 = -200;
pub const LAYER_BACKGROUNDTILES: i32 = -100;
pub const LAYER_TILES: i32 = 0;
pub const LAYER_OBJECTS: i32 = 50;
pub const LAYER_FLOATINGOBJECTS: i32 = 150;
pub const LAYER_FOREGROUNDTILES: i32 = 200;
pub const LAYER_FOREGROUND0: i32 = 300;
pub const LAYER_FOREGROUND1: i32 = 400;
pub const LAYER_HUD: i32 = 500;
pub const LAYER_GUI: i32 = 600;

/// Mirroring applied by the active transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawingEffect {
    #[default]
    NoEffect,
    HorizontalFlip,
    VerticalFlip,
}

impl DrawingEffect {
    /// Decompose into (hflip, vflip).
    pub fn flips(self) -> (bool, bool) {
        match self {
            Self::NoEffect => (false, false),
            Self::HorizontalFlip => (true, false),
            Self::VerticalFlip => (false, true),
        }
    }
}

/// Which queue subsequent submissions go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    Screen,
    Lightmap,
}

/// Snapshot of drawing state captured with each request.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    pub alpha: f32,
    pub effect: DrawingEffect,
    /// Camera offset; world positions have it subtracted.
    pub offset: Vector,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            effect: DrawingEffect::NoEffect,
            offset: Vector::ZERO,
        }
    }
}

impl Transform {
    /// World position to screen position.
    pub fn apply(&self, v: Vector) -> Vector {
        v - self.offset
    }
}

/// Deferred result cell for a light query.
///
/// Filled in during the flush; readable once the frame has been drawn.
#[derive(Debug, Clone, Default)]
pub struct LightSlot(Arc<Mutex<Color>>);

impl LightSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Color {
        *self.0.lock()
    }

    pub(crate) fn set(&self, color: Color) {
        *self.0.lock() = color;
    }
}

#[derive(Debug, Clone)]
pub enum RequestKind {
    Surface {
        surface: Surface,
    },
    SurfacePart {
        surface: Surface,
        source: Vector,
        size: Sizef,
    },
    Text {
        font: Arc<Font>,
        text: String,
        alignment: FontAlignment,
    },
    Gradient {
        top: Color,
        bottom: Color,
    },
    FillRect {
        size: Sizef,
        color: Color,
    },
    /// Multiply the finished lightmap over the frame. Injected by the
    /// flush itself, never submitted by callers.
    LightmapComposite,
    GetLight {
        slot: LightSlot,
    },
}

#[derive(Debug, Clone)]
pub struct DrawingRequest {
    pub kind: RequestKind,
    /// Screen position (transform already applied).
    pub pos: Vector,
    pub layer: i32,
    pub alpha: f32,
    pub angle: f32,
    pub color: Color,
    pub blend: Blend,
    pub effect: DrawingEffect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_transform_is_identity() {
        let transform = Transform::default();
        assert_eq!(transform.alpha, 1.0);
        assert_eq!(transform.effect, DrawingEffect::NoEffect);
        let v = Vector::new(12.0, 34.0);
        assert_eq!(transform.apply(v), v);
    }

    #[test]
    fn transform_subtracts_offset() {
        let transform = Transform {
            offset: Vector::new(10.0, 20.0),
            ..Transform::default()
        };
        assert_eq!(
            transform.apply(Vector::new(15.0, 25.0)),
            Vector::new(5.0, 5.0)
        );
    }

    #[test]
    fn effect_flips() {
        assert_eq!(DrawingEffect::NoEffect.flips(), (false, false));
        assert_eq!(DrawingEffect::HorizontalFlip.flips(), (true, false));
        assert_eq!(DrawingEffect::VerticalFlip.flips(), (false, true));
    }

    #[test]
    fn light_slot_shares_value() {
        let slot = LightSlot::new();
        let clone = slot.clone();
        slot.set(Color::rgb(0.25, 0.5, 0.75));
        assert_eq!(clone.get(), Color::rgb(0.25, 0.5, 0.75));
    }
}
