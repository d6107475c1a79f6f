//! Colors
//!
//! Byte-channel RGBA colors. Channels are straight (not premultiplied);
//! alpha is applied when drawing.

use crate::error::{CoreError, Result};

/// RGBA color with byte channels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const CYAN: Color = Color::rgb(0, 255, 255);
    pub const MAGENTA: Color = Color::rgb(255, 0, 255);
    pub const GRAY: Color = Color::rgb(128, 128, 128);
    pub const LIGHT_GRAY: Color = Color::rgb(211, 211, 211);
    pub const DARK_GRAY: Color = Color::rgb(64, 64, 64);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build from an `0xAARRGGBB` value
    pub const fn from_argb(argb: u32) -> Self {
        Self {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    /// Pack into an `0xAARRGGBB` value
    pub const fn to_argb(&self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Build from an opaque `0xRRGGBB` value
    pub const fn from_rgb_hex(hex: u32) -> Self {
        Self::rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.is_ascii() {
            return Err(CoreError::InvalidArgument(format!(
                "invalid hex color: {}",
                hex
            )));
        }
        let parse = |s: &str| {
            u8::from_str_radix(s, 16)
                .map_err(|_| CoreError::InvalidArgument(format!("invalid hex color: {}", hex)))
        };
        match digits.len() {
            3 => {
                let r = parse(&digits[0..1])?;
                let g = parse(&digits[1..2])?;
                let b = parse(&digits[2..3])?;
                Ok(Self::rgb(r * 17, g * 17, b * 17))
            }
            6 => Ok(Self::rgb(
                parse(&digits[0..2])?,
                parse(&digits[2..4])?,
                parse(&digits[4..6])?,
            )),
            8 => Ok(Self::rgba(
                parse(&digits[0..2])?,
                parse(&digits[2..4])?,
                parse(&digits[4..6])?,
                parse(&digits[6..8])?,
            )),
            _ => Err(CoreError::InvalidArgument(format!(
                "invalid hex color: {}",
                hex
            ))),
        }
    }

    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.a = alpha;
        self
    }

    /// Scale alpha by a factor in `[0, 1]`
    pub fn with_alpha_factor(mut self, factor: f32) -> Self {
        self.a = (self.a as f32 * factor.clamp(0.0, 1.0)).round() as u8;
        self
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Channels as floats in `[0, 1]`
    pub fn to_f32_array(&self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }

    /// Linear interpolation between two colors
    pub fn lerp(a: &Color, b: &Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
        Color {
            r: mix(a.r, b.r),
            g: mix(a.g, b.g),
            b: mix(a.b, b.b),
            a: mix(a.a, b.a),
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Hue/saturation/value color
///
/// `h` is in degrees `[0, 360)`, `s` and `v` in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
    pub a: u8,
}

impl Hsv {
    pub fn new(h: f32, s: f32, v: f32) -> Self {
        Self {
            h: h.rem_euclid(360.0),
            s: s.clamp(0.0, 1.0),
            v: v.clamp(0.0, 1.0),
            a: 255,
        }
    }

    pub fn from_rgb(color: Color) -> Self {
        let r = color.r as f32 / 255.0;
        let g = color.g as f32 / 255.0;
        let b = color.b as f32 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let h = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        let s = if max == 0.0 { 0.0 } else { delta / max };

        Self {
            h,
            s,
            v: max,
            a: color.a,
        }
    }

    pub fn to_rgb(&self) -> Color {
        let c = self.v * self.s;
        let h = self.h.rem_euclid(360.0) / 60.0;
        let x = c * (1.0 - (h.rem_euclid(2.0) - 1.0).abs());
        let m = self.v - c;

        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        let to_byte = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Color::rgba(to_byte(r), to_byte(g), to_byte(b), self.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argb_round_trip() {
        let samples = [
            Color::rgba(1, 2, 3, 4),
            Color::WHITE,
            Color::TRANSPARENT,
            Color::rgba(255, 128, 0, 17),
        ];
        for c in samples {
            assert_eq!(Color::from_argb(c.to_argb()), c);
        }
        assert_eq!(Color::rgba(0x11, 0x22, 0x33, 0x44).to_argb(), 0x44112233);
    }

    #[test]
    fn test_hsv_round_trip_within_one_unit() {
        for r in (0..=255).step_by(17) {
            for g in (0..=255).step_by(51) {
                for b in (0..=255).step_by(85) {
                    let c = Color::rgb(r as u8, g as u8, b as u8);
                    let back = Hsv::from_rgb(c).to_rgb();
                    assert!((back.r as i32 - c.r as i32).abs() <= 1, "{:?} -> {:?}", c, back);
                    assert!((back.g as i32 - c.g as i32).abs() <= 1, "{:?} -> {:?}", c, back);
                    assert!((back.b as i32 - c.b as i32).abs() <= 1, "{:?} -> {:?}", c, back);
                }
            }
        }
    }

    #[test]
    fn test_hsv_primaries() {
        let red = Hsv::from_rgb(Color::RED);
        assert_eq!(red.h, 0.0);
        assert_eq!(red.s, 1.0);
        assert_eq!(red.v, 1.0);

        let blue = Hsv::new(240.0, 1.0, 1.0).to_rgb();
        assert_eq!(blue, Color::BLUE);
    }

    #[test]
    fn test_from_hex() {
        assert_eq!(Color::from_hex("#ff0000").unwrap(), Color::RED);
        assert_eq!(Color::from_hex("fff").unwrap(), Color::WHITE);
        assert_eq!(
            Color::from_hex("#00000080").unwrap(),
            Color::rgba(0, 0, 0, 0x80)
        );
        assert!(Color::from_hex("#12").is_err());
        assert!(Color::from_hex("#zzzzzz").is_err());
    }

    #[test]
    fn test_lerp() {
        let mid = Color::lerp(&Color::BLACK, &Color::WHITE, 0.5);
        assert_eq!(mid, Color::rgb(128, 128, 128));
    }
}
