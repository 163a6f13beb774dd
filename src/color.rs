// src/color.rs

//! Value types shared by the rain engine: pixel coordinates (`Point`),
//! per-column glyph colors (`Color`), and the packed `Rgba` pixel format
//! used by surfaces and glyph bitmaps.

use serde::{Deserialize, Serialize};

/// An integer pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Foreground color of one rain column.
///
/// Channels are kept as `i32` rather than `u8`: the decay rule can lift a
/// channel back up after it falls, and the value is only narrowed to a pixel
/// byte when the glyph is rasterized (see [`Color::to_rgba`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: i32,
    pub g: i32,
    pub b: i32,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const BRIGHT_GREEN: Color = Color::new(180, 255, 180);

    pub const fn new(r: i32, g: i32, b: i32) -> Self {
        Self { r, g, b }
    }

    /// One decay step: red and blue carry over, green drops by one and
    /// snaps back to `reset` once it is at or below `floor`.
    ///
    /// The reset (rather than a clamp) is what makes every column pulse
    /// forever instead of settling on a dim constant.
    pub fn decayed(self, floor: i32, reset: i32) -> Color {
        let g = if self.g > floor { self.g - 1 } else { reset };
        Color::new(self.r, g, self.b)
    }

    /// Narrow to an opaque pixel, saturating each channel into `0..=255`.
    pub fn to_rgba(self) -> Rgba {
        Rgba::opaque(channel(self.r), channel(self.g), channel(self.b))
    }
}

fn channel(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// RGBA color in 32-bit format (8 bits per channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Convert to RGBA byte array
    pub fn to_bytes(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        color.to_rgba()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_decay_steps_green_down_by_one() {
        // Contract: above the floor, only green changes, by exactly one
        let c = Color::new(3, 100, 7).decayed(10, 190);
        assert_eq!(c, Color::new(3, 99, 7));
    }

    #[test]
    fn test_decay_resets_at_floor() {
        // Contract: at or below the floor green snaps to the reset value
        assert_eq!(Color::new(0, 11, 0).decayed(10, 190).g, 10);
        assert_eq!(Color::new(0, 10, 0).decayed(10, 190).g, 190);
        assert_eq!(Color::new(0, -4, 0).decayed(10, 190).g, 190);
    }

    #[test]
    fn test_decay_cycle_length() {
        // Contract: a column starting at the reset value returns to it after
        // a full pulse of 181 steps (190 down to 10, then the reset).
        let mut c = Color::new(0, 190, 0);
        let mut steps = 0;
        loop {
            c = c.decayed(10, 190);
            steps += 1;
            if c.g == 190 {
                break;
            }
        }
        assert_eq!(steps, 181);
    }

    #[test]
    fn test_to_rgba_saturates() {
        let px = Color::new(-5, 300, 42).to_rgba();
        assert_eq!(px.to_bytes(), [0, 255, 42, 255]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_decay_stays_in_pulse_range(start in 10i32..190, steps in 0usize..2000) {
            let mut c = Color::new(0, start, 0);
            for _ in 0..steps {
                c = c.decayed(10, 190);
                prop_assert!(c.g > 0 && c.g <= 199);
                prop_assert!((10..=190).contains(&c.g));
                prop_assert_eq!((c.r, c.b), (0, 0));
            }
        }
    }
}
