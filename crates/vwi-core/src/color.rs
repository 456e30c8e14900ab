//! Linear color helpers for gizmo and snap grid visuals.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

/// Linear RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearColor {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Default for LinearColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl LinearColor {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Opaque yellow.
    pub const YELLOW: Self = Self::rgb(1.0, 1.0, 0.0);

    /// Creates a color from all four channels.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Returns a copy with a different alpha.
    pub fn with_opacity(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Converts to `(hue degrees, saturation, value, alpha)`.
    pub fn to_hsv(self) -> [f32; 4] {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        let range = max - min;

        let hue = if range == 0.0 {
            0.0
        } else if max == self.r {
            (((self.g - self.b) / range) * 60.0 + 360.0) % 360.0
        } else if max == self.g {
            ((self.b - self.r) / range) * 60.0 + 120.0
        } else {
            ((self.r - self.g) / range) * 60.0 + 240.0
        };
        let saturation = if max == 0.0 { 0.0 } else { range / max };

        [hue, saturation, max, self.a]
    }

    /// Builds a color from `(hue degrees, saturation, value, alpha)`.
    pub fn from_hsv(hsv: [f32; 4]) -> Self {
        let [hue, saturation, value, alpha] = hsv;
        let hue_div = hue.rem_euclid(360.0) / 60.0;
        let sector = hue_div.floor();
        let frac = hue_div - sector;

        let p = value * (1.0 - saturation);
        let q = value * (1.0 - saturation * frac);
        let t = value * (1.0 - saturation * (1.0 - frac));

        let (r, g, b) = match sector as i32 {
            0 => (value, t, p),
            1 => (q, value, p),
            2 => (p, value, t),
            3 => (p, q, value),
            4 => (t, p, value),
            _ => (value, p, q),
        };
        Self::new(r, g, b, alpha)
    }

    /// Interpolates in HSV space, taking the shorter way around the hue circle.
    pub fn lerp_using_hsv(from: Self, to: Self, progress: f32) -> Self {
        let from = from.to_hsv();
        let to = to.to_hsv();

        let mut from_hue = from[0];
        let mut to_hue = to[0];
        if (from_hue - to_hue).abs() > 180.0 {
            if to_hue > from_hue {
                from_hue += 360.0;
            } else {
                to_hue += 360.0;
            }
        }

        let lerp = |a: f32, b: f32| a + (b - a) * progress;
        let mut hue = lerp(from_hue, to_hue);
        if hue < 0.0 {
            hue += 360.0;
        }
        hue %= 360.0;

        Self::from_hsv([hue, lerp(from[1], to[1]), lerp(from[2], to[2]), lerp(from[3], to[3])])
    }
}

/// Oscillates between 0 and 1 at `frequency` Hz, starting at 1 when `phase` is zero.
pub fn make_pulsating_value(time: f64, frequency: f32, phase: f32) -> f32 {
    let t = time as f32;
    0.5 + 0.5 * ((0.25 + phase) * TAU + t * TAU * frequency).sin()
}
