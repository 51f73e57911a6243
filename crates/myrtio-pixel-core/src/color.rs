//! Pixel color model and RGB <-> HSB conversion
//!
//! [`Color`] carries four independent channels. RGB and white are mutually
//! exclusive only by convention: the control parser maps gray input to the
//! white channel, the type itself does not enforce it.

use smart_leds::RGB8;

/// Four channel pixel color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub w: u8,
}

impl Color {
    /// All channels off
    pub const BLACK: Color = Color::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, w: u8) -> Self {
        Self { r, g, b, w }
    }

    /// Color with the white channel off
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0)
    }

    /// Color driving only the white channel
    pub const fn white(w: u8) -> Self {
        Self::new(0, 0, 0, w)
    }

    /// Create a color from a packed `0xRRGGBB` value
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_rgb24(value: u32) -> Self {
        Self::rgb(
            ((value >> 16) & 0xFF) as u8,
            ((value >> 8) & 0xFF) as u8,
            (value & 0xFF) as u8,
        )
    }

    /// Pack the RGB channels as `0xRRGGBB`
    pub const fn rgb24(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Whether the RGB channels are equal (gray, black or white)
    pub const fn is_achromatic(self) -> bool {
        self.r == self.g && self.g == self.b
    }

    /// Convert to a three channel wire color.
    ///
    /// Strips without a dedicated white emitter get the white channel
    /// added to each of R, G and B.
    pub const fn to_rgb8(self) -> RGB8 {
        RGB8 {
            r: self.r.saturating_add(self.w),
            g: self.g.saturating_add(self.w),
            b: self.b.saturating_add(self.w),
        }
    }
}

/// Convert an RGB triple to normalized hue, saturation and brightness.
///
/// Every component of the result lies in `[0, 1]`. Hue is `0` for
/// achromatic input.
pub fn rgb_to_hsb(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);

    let brightness = f32::from(max) / 255.0;
    let saturation = if max == 0 {
        0.0
    } else {
        f32::from(max - min) / f32::from(max)
    };

    if saturation == 0.0 {
        return (0.0, saturation, brightness);
    }

    let range = f32::from(max - min);
    let red_c = f32::from(max - r) / range;
    let green_c = f32::from(max - g) / range;
    let blue_c = f32::from(max - b) / range;

    let mut hue = if r == max {
        blue_c - green_c
    } else if g == max {
        2.0 + red_c - blue_c
    } else {
        4.0 + green_c - red_c
    };
    hue /= 6.0;
    if hue < 0.0 {
        hue += 1.0;
    }

    (hue, saturation, brightness)
}

/// Convert normalized hue, saturation and brightness to a packed
/// `0xRRGGBB` value.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::many_single_char_names
)]
pub fn hsb_to_rgb(hue: f32, saturation: f32, brightness: f32) -> u32 {
    let channel = |value: f32| -> u32 { (value.clamp(0.0, 1.0) * 255.0 + 0.5) as u32 };

    if saturation == 0.0 {
        let v = channel(brightness);
        return v << 16 | v << 8 | v;
    }

    let h = (hue - libm::floorf(hue)) * 6.0;
    let f = h - libm::floorf(h);
    let p = brightness * (1.0 - saturation);
    let q = brightness * (1.0 - saturation * f);
    let t = brightness * (1.0 - saturation * (1.0 - f));

    let (r, g, b) = match h as u8 {
        0 => (brightness, t, p),
        1 => (q, brightness, p),
        2 => (p, brightness, t),
        3 => (p, q, brightness),
        4 => (t, p, brightness),
        _ => (brightness, p, q),
    };

    channel(r) << 16 | channel(g) << 8 | channel(b)
}
