//! App bar colors

use std::fmt;

use serde::{Deserialize, Serialize};

use donations_settings::Theme;

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    /// Linear interpolation towards `other`; `fraction` is clamped to `0..=1`
    pub fn lerp(self, other: Color, fraction: f32) -> Color {
        let t = fraction.clamp(0.0, 1.0);
        let mix = |from: u8, to: u8| -> u8 {
            (from as f32 + (to as f32 - from as f32) * t).round() as u8
        };
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
    }
}

/// Container colors of the top app bar at rest and with content under it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppBarColors {
    pub container: Color,
    pub scrolled_container: Color,
    pub title: Color,
}

impl AppBarColors {
    pub const LIGHT: AppBarColors = AppBarColors {
        container: Color::rgb(0xFB, 0xFC, 0xFF),
        scrolled_container: Color::rgb(0xE9, 0xEE, 0xF6),
        title: Color::rgb(0x1B, 0x1B, 0x1D),
    };

    pub const DARK: AppBarColors = AppBarColors {
        container: Color::rgb(0x1B, 0x1B, 0x1D),
        scrolled_container: Color::rgb(0x2A, 0x2C, 0x32),
        title: Color::rgb(0xE2, 0xE2, 0xE6),
    };

    /// Colors for `theme`; `System` follows `system_dark`
    pub fn for_theme(theme: Theme, system_dark: bool) -> Self {
        match theme {
            Theme::Light => Self::LIGHT,
            Theme::Dark => Self::DARK,
            Theme::System if system_dark => Self::DARK,
            Theme::System => Self::LIGHT,
        }
    }

    /// Container color for an overlapped fraction in `0..=1`
    pub fn container_at(&self, overlapped_fraction: f32) -> Color {
        self.container.lerp(self.scrolled_container, overlapped_fraction)
    }
}

impl Default for AppBarColors {
    fn default() -> Self {
        Self::LIGHT
    }
}
