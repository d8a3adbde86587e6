//! RGBA colors and blend modes.

/// RGBA color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub const fn rgb(red: f32, green: f32, blue: f32) -> Self {
        Self::new(red, green, blue, 1.0)
    }

    /// True when the color channels (alpha ignored) are all fully white.
    ///
    /// Used for the ambient-light short circuit: a pure-white ambient color
    /// means no darkening is in effect.
    pub fn rgb_is_white(&self) -> bool {
        self.red == 1.0 && self.green == 1.0 && self.blue == 1.0
    }

    /// Return the color with its alpha multiplied by `factor`.
    pub fn multiply_alpha(&self, factor: f32) -> Self {
        Self::new(self.red, self.green, self.blue, self.alpha * factor)
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            channel_to_u8(self.red),
            channel_to_u8(self.green),
            channel_to_u8(self.blue),
            channel_to_u8(self.alpha),
        ]
    }

    pub fn from_rgba8(rgba: [u8; 4]) -> Self {
        Self::new(
            f32::from(rgba[0]) / 255.0,
            f32::from(rgba[1]) / 255.0,
            f32::from(rgba[2]) / 255.0,
            f32::from(rgba[3]) / 255.0,
        )
    }
}

fn channel_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// A blend equation factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
}

impl BlendFactor {
    /// Evaluate the factor for one channel.
    ///
    /// `src_alpha` is the effective source alpha, `dst` the destination
    /// channel value the factor may depend on.
    pub fn apply(self, src_alpha: f32, dst: f32) -> f32 {
        match self {
            Self::Zero => 0.0,
            Self::One => 1.0,
            Self::SrcAlpha => src_alpha,
            Self::OneMinusSrcAlpha => 1.0 - src_alpha,
            Self::DstColor => dst,
        }
    }
}

/// Source/destination blend factor pair.
///
/// The default is standard alpha blending. Additive blending
/// (`SrcAlpha`/`One`) is what light sprites use when accumulating into the
/// lightmap; the lightmap composite itself multiplies with
/// `DstColor`/`Zero`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Blend {
    pub sfactor: BlendFactor,
    pub dfactor: BlendFactor,
}

impl Blend {
    pub const fn new(sfactor: BlendFactor, dfactor: BlendFactor) -> Self {
        Self { sfactor, dfactor }
    }

    pub const fn additive() -> Self {
        Self::new(BlendFactor::SrcAlpha, BlendFactor::One)
    }
}

impl Default for Blend {
    fn default() -> Self {
        Self::new(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_detection_ignores_alpha() {
        assert!(Color::WHITE.rgb_is_white());
        assert!(Color::new(1.0, 1.0, 1.0, 0.5).rgb_is_white());
        assert!(!Color::rgb(1.0, 0.9, 1.0).rgb_is_white());
    }

    #[test]
    fn multiply_alpha_leaves_channels() {
        let c = Color::new(0.2, 0.4, 0.6, 0.8).multiply_alpha(0.5);
        assert_eq!(c.red, 0.2);
        assert_eq!(c.alpha, 0.4);
    }

    #[test]
    fn rgba8_roundtrip() {
        let c = Color::from_rgba8([255, 128, 0, 64]);
        let bytes = c.to_rgba8();
        assert_eq!(bytes, [255, 128, 0, 64]);
    }

    #[test]
    fn rgba8_clamps() {
        let c = Color::new(2.0, -1.0, 0.5, 1.0);
        let bytes = c.to_rgba8();
        assert_eq!(bytes[0], 255);
        assert_eq!(bytes[1], 0);
    }

    #[test]
    fn blend_factor_apply() {
        assert_eq!(BlendFactor::Zero.apply(0.3, 0.7), 0.0);
        assert_eq!(BlendFactor::One.apply(0.3, 0.7), 1.0);
        assert_eq!(BlendFactor::SrcAlpha.apply(0.3, 0.7), 0.3);
        assert_eq!(BlendFactor::OneMinusSrcAlpha.apply(0.3, 0.7), 0.7);
        assert_eq!(BlendFactor::DstColor.apply(0.3, 0.7), 0.7);
    }

    #[test]
    fn default_blend_is_alpha() {
        let blend = Blend::default();
        assert_eq!(blend.sfactor, BlendFactor::SrcAlpha);
        assert_eq!(blend.dfactor, BlendFactor::OneMinusSrcAlpha);
    }
}
