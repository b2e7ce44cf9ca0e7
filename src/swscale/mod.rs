//! Pixel format conversion to the canonical planar 4:2:0 layout
//!
//! Every pipeline in this crate hands frames downstream as tightly packed
//! 8-bit YUV420P. `ScalerContext` performs one conversion for one fixed
//! source layout; `PixelNormalizer` owns a context plus the output frame and
//! rebuilds the context whenever the source layout changes.
//!
//! RGB sources are converted with BT.601 limited-range integer kernels
//! (Y: 16-235, U/V: 16-240). Chroma subsampling is point sampling of the
//! top-left pixel of each 2x2 block.

use tracing::debug;

use crate::codec::{FrameView, VideoFrame};
use crate::error::{Error, Result};
use crate::util::PixelFormat;

/// Converts frames of one fixed source layout into canonical YUV420P.
///
/// A context is cheap to build; it exists so that per-frame calls skip
/// format validation and so callers can tell when the source layout
/// changed (`matches`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalerContext {
    width: u32,
    height: u32,
    src_format: PixelFormat,
}

impl ScalerContext {
    /// Build a context for converting `src_format` images of the given size.
    ///
    /// Fails with `Error::Unsupported` when no kernel exists for the source
    /// format and with `Error::InvalidInput` for empty dimensions.
    pub fn new(width: u32, height: u32, src_format: PixelFormat) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_input(format!(
                "cannot scale {}x{} image",
                width, height
            )));
        }
        match src_format {
            PixelFormat::YUV420P
            | PixelFormat::YUV422P
            | PixelFormat::YUV444P
            | PixelFormat::YUV420P10LE
            | PixelFormat::NV12
            | PixelFormat::RGB24
            | PixelFormat::BGR24
            | PixelFormat::RGBA
            | PixelFormat::BGRA
            | PixelFormat::GRAY8 => {}
            other => {
                return Err(Error::unsupported(format!(
                    "no conversion from {} to yuv420p",
                    other
                )));
            }
        }
        Ok(ScalerContext {
            width,
            height,
            src_format,
        })
    }

    /// Source width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Source height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Source pixel format
    pub fn src_format(&self) -> PixelFormat {
        self.src_format
    }

    /// Whether this context was built for the given source layout
    pub fn matches(&self, width: u32, height: u32, src_format: PixelFormat) -> bool {
        self.width == width && self.height == height && self.src_format == src_format
    }

    /// Convert one image into `dst` as tightly packed YUV420P.
    ///
    /// The destination keeps its allocation when the layout already fits.
    /// The source pts is carried over; the keyframe flag is left to the
    /// caller.
    pub fn convert(&self, src: &FrameView<'_>, dst: &mut VideoFrame) -> Result<()> {
        if !self.matches(src.width, src.height, src.format) {
            return Err(Error::invalid_input(format!(
                "source is {}x{} {}, context converts {}x{} {}",
                src.width, src.height, src.format, self.width, self.height, self.src_format
            )));
        }
        src.check_plane_bounds()?;
        dst.ensure_layout(self.width, self.height, PixelFormat::YUV420P)?;
        dst.pts = src.pts;

        let w = self.width as usize;
        let h = self.height as usize;
        let (y, u, v) = canonical_planes_mut(dst)?;

        match self.src_format {
            PixelFormat::YUV420P => planar_420_to_canonical(src, y, u, v, w, h),
            PixelFormat::YUV422P => planar_422_to_canonical(src, y, u, v, w, h),
            PixelFormat::YUV444P => planar_444_to_canonical(src, y, u, v, w, h),
            PixelFormat::YUV420P10LE => ten_bit_420_to_canonical(src, y, u, v, w, h),
            PixelFormat::NV12 => nv12_to_canonical(src, y, u, v, w, h),
            PixelFormat::RGB24 => packed_rgb_to_canonical(src, 3, [0, 1, 2], w, h, (y, u, v)),
            PixelFormat::BGR24 => packed_rgb_to_canonical(src, 3, [2, 1, 0], w, h, (y, u, v)),
            PixelFormat::RGBA => packed_rgb_to_canonical(src, 4, [0, 1, 2], w, h, (y, u, v)),
            PixelFormat::BGRA => packed_rgb_to_canonical(src, 4, [2, 1, 0], w, h, (y, u, v)),
            PixelFormat::GRAY8 => gray_to_canonical(src, y, u, v, w, h),
            other => {
                return Err(Error::unsupported(format!(
                    "no conversion from {} to yuv420p",
                    other
                )));
            }
        }
        Ok(())
    }
}

/// Keeps one `ScalerContext` and one output frame, rebuilding the context
/// only when the source layout changes.
///
/// The output frame is reused across calls; the returned borrow is valid
/// until the next `normalize_*` call.
#[derive(Debug)]
pub struct PixelNormalizer {
    ctx: Option<ScalerContext>,
    out: VideoFrame,
}

impl PixelNormalizer {
    /// Create a normalizer with no cached context
    pub fn new() -> Self {
        PixelNormalizer {
            ctx: None,
            out: VideoFrame::new(0, 0, PixelFormat::YUV420P),
        }
    }

    /// Convert a borrowed image to canonical YUV420P
    pub fn normalize_view(&mut self, src: &FrameView<'_>) -> Result<&VideoFrame> {
        self.ensure_context(src.width, src.height, src.format)?;
        let ctx = self
            .ctx
            .as_ref()
            .ok_or_else(|| Error::invalid_state("scaler context missing after rebuild"))?;
        ctx.convert(src, &mut self.out)?;
        self.out.keyframe = false;
        Ok(&self.out)
    }

    /// Convert an owned frame to canonical YUV420P, carrying its keyframe flag
    pub fn normalize_frame(&mut self, src: &VideoFrame) -> Result<&VideoFrame> {
        let view = src.as_view();
        self.ensure_context(view.width, view.height, view.format)?;
        let ctx = self
            .ctx
            .as_ref()
            .ok_or_else(|| Error::invalid_state("scaler context missing after rebuild"))?;
        ctx.convert(&view, &mut self.out)?;
        self.out.keyframe = src.keyframe;
        Ok(&self.out)
    }

    /// Single rebuild path: compare the cached context's key against the
    /// incoming layout and replace it only on a mismatch.
    fn ensure_context(&mut self, width: u32, height: u32, format: PixelFormat) -> Result<()> {
        let up_to_date = self
            .ctx
            .as_ref()
            .map_or(false, |c| c.matches(width, height, format));
        if !up_to_date {
            debug!("Rebuilding scaler context for {}x{} {} input", width, height, format);
            self.ctx = Some(ScalerContext::new(width, height, format)?);
        }
        Ok(())
    }
}

impl Default for PixelNormalizer {
    fn default() -> Self {
        PixelNormalizer::new()
    }
}

fn canonical_planes_mut(
    frame: &mut VideoFrame,
) -> Result<(&mut [u8], &mut [u8], &mut [u8])> {
    if frame.data.len() < 3 {
        return Err(Error::invalid_state("canonical frame is missing planes"));
    }
    let (y, rest) = frame.data.split_at_mut(1);
    let (u, v) = rest.split_at_mut(1);
    Ok((y[0].as_mut(), u[0].as_mut(), v[0].as_mut()))
}

fn copy_plane(src: &[u8], src_stride: usize, dst: &mut [u8], width: usize, rows: usize) {
    for row in 0..rows {
        let s = &src[row * src_stride..row * src_stride + width];
        dst[row * width..(row + 1) * width].copy_from_slice(s);
    }
}

fn planar_420_to_canonical(
    src: &FrameView<'_>,
    y: &mut [u8],
    u: &mut [u8],
    v: &mut [u8],
    w: usize,
    h: usize,
) {
    let cw = (w + 1) / 2;
    let ch = (h + 1) / 2;
    copy_plane(src.planes[0], src.strides[0], y, w, h);
    copy_plane(src.planes[1], src.strides[1], u, cw, ch);
    copy_plane(src.planes[2], src.strides[2], v, cw, ch);
}

fn planar_422_to_canonical(
    src: &FrameView<'_>,
    y: &mut [u8],
    u: &mut [u8],
    v: &mut [u8],
    w: usize,
    h: usize,
) {
    let cw = (w + 1) / 2;
    let ch = (h + 1) / 2;
    copy_plane(src.planes[0], src.strides[0], y, w, h);
    // chroma is full height in the source; keep every other row
    for (plane, dst) in [(1usize, u), (2usize, v)] {
        let s = src.planes[plane];
        let stride = src.strides[plane];
        for row in 0..ch {
            let line = &s[row * 2 * stride..row * 2 * stride + cw];
            dst[row * cw..(row + 1) * cw].copy_from_slice(line);
        }
    }
}

fn planar_444_to_canonical(
    src: &FrameView<'_>,
    y: &mut [u8],
    u: &mut [u8],
    v: &mut [u8],
    w: usize,
    h: usize,
) {
    let cw = (w + 1) / 2;
    let ch = (h + 1) / 2;
    copy_plane(src.planes[0], src.strides[0], y, w, h);
    // chroma is full resolution in the source; keep every other sample
    for (plane, dst) in [(1usize, u), (2usize, v)] {
        let s = src.planes[plane];
        let stride = src.strides[plane];
        for row in 0..ch {
            let line = &s[row * 2 * stride..];
            let d = &mut dst[row * cw..(row + 1) * cw];
            for (col, out) in d.iter_mut().enumerate() {
                *out = line[col * 2];
            }
        }
    }
}

fn ten_bit_plane(src: &[u8], src_stride: usize, dst: &mut [u8], width: usize, rows: usize) {
    for row in 0..rows {
        let s = &src[row * src_stride..];
        let d = &mut dst[row * width..(row + 1) * width];
        for (col, out) in d.iter_mut().enumerate() {
            let sample = u16::from_le_bytes([s[col * 2], s[col * 2 + 1]]);
            *out = (sample >> 2).min(255) as u8;
        }
    }
}

fn ten_bit_420_to_canonical(
    src: &FrameView<'_>,
    y: &mut [u8],
    u: &mut [u8],
    v: &mut [u8],
    w: usize,
    h: usize,
) {
    let cw = (w + 1) / 2;
    let ch = (h + 1) / 2;
    ten_bit_plane(src.planes[0], src.strides[0], y, w, h);
    ten_bit_plane(src.planes[1], src.strides[1], u, cw, ch);
    ten_bit_plane(src.planes[2], src.strides[2], v, cw, ch);
}

fn nv12_to_canonical(
    src: &FrameView<'_>,
    y: &mut [u8],
    u: &mut [u8],
    v: &mut [u8],
    w: usize,
    h: usize,
) {
    let cw = (w + 1) / 2;
    let ch = (h + 1) / 2;
    copy_plane(src.planes[0], src.strides[0], y, w, h);
    let uv = src.planes[1];
    let uv_stride = src.strides[1];
    for row in 0..ch {
        let line = &uv[row * uv_stride..row * uv_stride + cw * 2];
        let u_row = &mut u[row * cw..(row + 1) * cw];
        let v_row = &mut v[row * cw..(row + 1) * cw];
        for col in 0..cw {
            u_row[col] = line[col * 2];
            v_row[col] = line[col * 2 + 1];
        }
    }
}

fn gray_to_canonical(
    src: &FrameView<'_>,
    y: &mut [u8],
    u: &mut [u8],
    v: &mut [u8],
    w: usize,
    h: usize,
) {
    copy_plane(src.planes[0], src.strides[0], y, w, h);
    u.fill(128);
    v.fill(128);
}

/// BT.601 limited-range fixed-point RGB kernel. `order` holds the byte
/// offsets of R, G and B inside one `bpp`-byte pixel. The luma pass and
/// the subsampled chroma pass run in parallel.
fn packed_rgb_to_canonical(
    view: &FrameView<'_>,
    bpp: usize,
    order: [usize; 3],
    w: usize,
    h: usize,
    dst: (&mut [u8], &mut [u8], &mut [u8]),
) {
    let src = view.planes[0];
    let stride = view.strides[0];
    let (y, u, v) = dst;
    let cw = (w + 1) / 2;
    let ch = (h + 1) / 2;
    rayon::join(
        || {
            for row in 0..h {
                let line = &src[row * stride..];
                let d = &mut y[row * w..(row + 1) * w];
                for (col, out) in d.iter_mut().enumerate() {
                    let p = &line[col * bpp..col * bpp + bpp];
                    let r = p[order[0]] as i32;
                    let g = p[order[1]] as i32;
                    let b = p[order[2]] as i32;
                    *out = (((66 * r + 129 * g + 25 * b + 128) >> 8) + 16) as u8;
                }
            }
        },
        || {
            for row in 0..ch {
                let line = &src[row * 2 * stride..];
                let u_row = &mut u[row * cw..(row + 1) * cw];
                let v_row = &mut v[row * cw..(row + 1) * cw];
                for col in 0..cw {
                    let p = &line[col * 2 * bpp..col * 2 * bpp + bpp];
                    let r = p[order[0]] as i32;
                    let g = p[order[1]] as i32;
                    let b = p[order[2]] as i32;
                    u_row[col] = (((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128) as u8;
                    v_row[col] = (((112 * r - 94 * g - 18 * b + 128) >> 8) + 128) as u8;
                }
            }
        },
    );
}
