//! Pipeline settings: watermark appearance and thumbnail options.
//!
//! Watermark settings live in a flat `settings.toml` under the storage root
//! and are read per request — there is no on-disk cache for watermarked
//! output, so a settings change takes effect immediately without any
//! invalidation. Loading is tolerant: a missing or unparsable file yields
//! the defaults rather than an error.
//!
//! All numeric settings are clamped on construction, so a hand-edited file
//! with out-of-range values degrades to the nearest valid configuration
//! instead of producing surprising renders.

use crate::imaging::Quality;
use serde::Deserialize;
use std::path::Path;

/// Name of the settings file within the storage root.
pub const SETTINGS_FILENAME: &str = "settings.toml";

pub const DEFAULT_WATERMARK_TEXT: &str = "gallery.example.com";
pub const DEFAULT_WATERMARK_BRIGHTNESS: u32 = 35;
pub const DEFAULT_WATERMARK_ANGLE: i32 = -28;

const BRIGHTNESS_RANGE: std::ops::RangeInclusive<u32> = 5..=100;
const ANGLE_RANGE: std::ops::RangeInclusive<i32> = -75..=75;

/// Watermark appearance, read per render.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WatermarkSettings {
    /// Overlay text; the default site identifier when empty.
    #[serde(rename = "watermark_text", default = "default_text")]
    pub text: String,
    /// Brightness 5–100; drives overlay opacity.
    #[serde(rename = "watermark_brightness", default = "default_brightness")]
    pub brightness: u32,
    /// Tilt in degrees, −75–75.
    #[serde(rename = "watermark_angle", default = "default_angle")]
    pub angle_degrees: i32,
}

fn default_text() -> String {
    DEFAULT_WATERMARK_TEXT.to_string()
}

fn default_brightness() -> u32 {
    DEFAULT_WATERMARK_BRIGHTNESS
}

fn default_angle() -> i32 {
    DEFAULT_WATERMARK_ANGLE
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            text: default_text(),
            brightness: default_brightness(),
            angle_degrees: default_angle(),
        }
    }
}

impl WatermarkSettings {
    /// Build settings with all values clamped into their valid ranges.
    pub fn new(text: impl Into<String>, brightness: u32, angle_degrees: i32) -> Self {
        let text = text.into();
        Self {
            text: if text.trim().is_empty() {
                default_text()
            } else {
                text
            },
            brightness: brightness.clamp(*BRIGHTNESS_RANGE.start(), *BRIGHTNESS_RANGE.end()),
            angle_degrees: angle_degrees.clamp(*ANGLE_RANGE.start(), *ANGLE_RANGE.end()),
        }
    }

    /// Load from `<root>/settings.toml`. Returns the defaults if the file
    /// doesn't exist or can't be parsed; out-of-range values are clamped.
    pub fn load(root: &Path) -> Self {
        let path = root.join(SETTINGS_FILENAME);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match toml::from_str::<Self>(&content) {
            Ok(raw) => Self::new(raw.text, raw.brightness, raw.angle_degrees),
            Err(_) => Self::default(),
        }
    }

    /// Overlay opacity derived from brightness: `brightness / 160`, clamped
    /// to a visible-but-unobtrusive `0.05..=0.60`. The default brightness of
    /// 35 lands at ~0.22.
    pub fn opacity(&self) -> f32 {
        (self.brightness as f32 / 160.0).clamp(0.05, 0.60)
    }
}

/// Thumbnail generation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbOptions {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: Quality,
}

impl Default for ThumbOptions {
    fn default() -> Self {
        Self {
            max_width: 520,
            max_height: 360,
            quality: Quality::new(82),
        }
    }
}
