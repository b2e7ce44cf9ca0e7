//! Pixel format definitions
//!
//! `YUV420P` is the canonical output layout of every pipeline in this crate;
//! the remaining variants describe source imagery a decoder or caller may
//! hand us. Formats listed here are representable; whether the scaler can
//! convert one is decided by `swscale::ScalerContext`.

use std::fmt;

/// Pixel format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGB24 - 8 bits per component, packed
    RGB24,
    /// RGBA - RGB with alpha channel
    RGBA,
    /// BGR24 - BGR format
    BGR24,
    /// BGRA - BGR with alpha
    BGRA,
    /// YUV420P - Planar YUV 4:2:0 (the canonical format)
    YUV420P,
    /// YUV422P - Planar YUV 4:2:2
    YUV422P,
    /// YUV444P - Planar YUV 4:4:4
    YUV444P,
    /// YUV420P10LE - 10-bit YUV 4:2:0, two bytes per sample
    YUV420P10LE,
    /// NV12 - Y plane + interleaved UV plane, the usual hardware download layout
    NV12,
    /// GRAY8 - 8-bit grayscale
    GRAY8,
    /// GRAY16 - 16-bit grayscale
    GRAY16,
    /// Unknown format
    Unknown,
}

impl PixelFormat {
    /// Get the number of color components in this pixel format
    pub fn num_components(&self) -> usize {
        match self {
            PixelFormat::RGB24 | PixelFormat::BGR24 => 3,
            PixelFormat::RGBA | PixelFormat::BGRA => 4,
            PixelFormat::YUV420P
            | PixelFormat::YUV422P
            | PixelFormat::YUV444P
            | PixelFormat::YUV420P10LE
            | PixelFormat::NV12 => 3,
            PixelFormat::GRAY8 | PixelFormat::GRAY16 => 1,
            PixelFormat::Unknown => 0,
        }
    }

    /// Get the number of distinct planes image data is stored in
    pub fn plane_count(&self) -> usize {
        match self {
            PixelFormat::RGB24 | PixelFormat::RGBA | PixelFormat::BGR24 | PixelFormat::BGRA => 1,
            PixelFormat::YUV420P
            | PixelFormat::YUV422P
            | PixelFormat::YUV444P
            | PixelFormat::YUV420P10LE => 3,
            PixelFormat::NV12 => 2,
            PixelFormat::GRAY8 | PixelFormat::GRAY16 => 1,
            PixelFormat::Unknown => 0,
        }
    }

    /// Get the average bits per pixel for this format
    pub fn bits_per_pixel(&self) -> usize {
        match self {
            PixelFormat::RGB24 | PixelFormat::BGR24 => 24,
            PixelFormat::RGBA | PixelFormat::BGRA => 32,
            PixelFormat::YUV420P | PixelFormat::NV12 => 12,
            PixelFormat::YUV422P => 16,
            PixelFormat::YUV444P => 24,
            PixelFormat::YUV420P10LE => 24,
            PixelFormat::GRAY8 => 8,
            PixelFormat::GRAY16 => 16,
            PixelFormat::Unknown => 0,
        }
    }

    /// Check if this is a planar format
    pub fn is_planar(&self) -> bool {
        self.plane_count() > 1
    }

    /// Check if this is a YUV format
    pub fn is_yuv(&self) -> bool {
        matches!(
            self,
            PixelFormat::YUV420P
                | PixelFormat::YUV422P
                | PixelFormat::YUV444P
                | PixelFormat::YUV420P10LE
                | PixelFormat::NV12
        )
    }

    /// Check if this is an RGB format
    pub fn is_rgb(&self) -> bool {
        matches!(
            self,
            PixelFormat::RGB24 | PixelFormat::RGBA | PixelFormat::BGR24 | PixelFormat::BGRA
        )
    }

    /// Tight (stride, rows) layout of each plane of a `width` x `height`
    /// image in this format. Chroma dimensions round up so odd sizes stay
    /// representable.
    pub fn plane_dimensions(&self, width: u32, height: u32) -> Vec<(usize, usize)> {
        let w = width as usize;
        let h = height as usize;
        let cw = (w + 1) / 2;
        let ch = (h + 1) / 2;
        match self {
            PixelFormat::RGB24 | PixelFormat::BGR24 => vec![(w * 3, h)],
            PixelFormat::RGBA | PixelFormat::BGRA => vec![(w * 4, h)],
            PixelFormat::YUV420P => vec![(w, h), (cw, ch), (cw, ch)],
            PixelFormat::YUV422P => vec![(w, h), (cw, h), (cw, h)],
            PixelFormat::YUV444P => vec![(w, h), (w, h), (w, h)],
            PixelFormat::YUV420P10LE => vec![(w * 2, h), (cw * 2, ch), (cw * 2, ch)],
            PixelFormat::NV12 => vec![(w, h), (cw * 2, ch)],
            PixelFormat::GRAY8 => vec![(w, h)],
            PixelFormat::GRAY16 => vec![(w * 2, h)],
            PixelFormat::Unknown => Vec::new(),
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::RGB24 => "rgb24",
            PixelFormat::RGBA => "rgba",
            PixelFormat::BGR24 => "bgr24",
            PixelFormat::BGRA => "bgra",
            PixelFormat::YUV420P => "yuv420p",
            PixelFormat::YUV422P => "yuv422p",
            PixelFormat::YUV444P => "yuv444p",
            PixelFormat::YUV420P10LE => "yuv420p10le",
            PixelFormat::NV12 => "nv12",
            PixelFormat::GRAY8 => "gray8",
            PixelFormat::GRAY16 => "gray16",
            PixelFormat::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

impl Default for PixelFormat {
    fn default() -> Self {
        PixelFormat::Unknown
    }
}
