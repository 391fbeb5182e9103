//! Parameter types for pixel operations.
//!
//! These types describe *what* to do, not *how* to do it. They are the
//! interface between the pipeline modules (which decide what renditions to
//! produce) and the [`backend`](super::backend) (which does the actual pixel
//! work). This separation allows swapping backends (e.g. for testing with a
//! mock) without changing pipeline logic.

use image::ImageFormat;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(82)
    }
}

/// A quarter-turn rotation, as requested by the admin rotate action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// Counter-clockwise (−90°).
    Left90,
    /// Clockwise (+90°).
    Right90,
}

impl Rotation {
    /// Maps the degree values accepted at the interface boundary.
    /// Anything other than ±90 is rejected.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees {
            -90 => Some(Self::Left90),
            90 => Some(Self::Right90),
            _ => None,
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Self::Left90 => -90,
            Self::Right90 => 90,
        }
    }
}

/// The raster formats the pipeline accepts as sources.
///
/// Derived artifacts are always JPEG; this type exists so rotation can
/// re-encode a source in the format it arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl SourceFormat {
    /// Narrow a sniffed format to the supported set.
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::WebP => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Gif => ImageFormat::Gif,
            Self::Webp => ImageFormat::WebP,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }
}

/// Full specification for a tiled text overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    pub text: String,
    /// Opacity fraction in `0.0..=1.0`.
    pub opacity: f32,
    /// Tilt applied to the whole tile grid, clockwise for positive values.
    pub angle_degrees: f32,
}
