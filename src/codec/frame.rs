//! Frame representation for uncompressed video data

use crate::error::{Error, Result};
use crate::util::{PixelFormat, PlaneBuf, Timestamp};

/// Maximum plane slots a frame view carries (Y, U, V)
pub const MAX_PLANES: usize = 3;

/// An uncompressed video frame owning its plane storage.
///
/// Pipelines keep frames alive across calls and hand out `&VideoFrame`
/// borrows; the borrow ends before the next call on the same pipeline can
/// run. `Clone` deep-copies the planes and is the supported way to keep a
/// frame beyond that window.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Frame data, one buffer per plane
    pub data: Vec<PlaneBuf>,

    /// Line sizes for each plane
    pub linesize: Vec<usize>,

    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Pixel format
    pub format: PixelFormat,

    /// Presentation timestamp
    pub pts: Timestamp,

    /// Is keyframe
    pub keyframe: bool,
}

impl VideoFrame {
    /// Create a new frame without plane storage
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        VideoFrame {
            data: Vec::new(),
            linesize: Vec::new(),
            width,
            height,
            format,
            pts: Timestamp::none(),
            keyframe: false,
        }
    }

    /// Create a frame with zero-filled planes tightly packed for
    /// `width` x `height` in `format`
    pub fn alloc(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let mut frame = VideoFrame::new(width, height, format);
        frame.ensure_layout(width, height, format)?;
        Ok(frame)
    }

    /// Make the frame's plane storage match (`width`, `height`, `format`),
    /// reusing existing allocations when the layout already fits. Plane
    /// contents are unspecified afterwards; callers overwrite them.
    pub fn ensure_layout(&mut self, width: u32, height: u32, format: PixelFormat) -> Result<()> {
        let planes = format.plane_dimensions(width, height);
        if planes.is_empty() {
            return Err(Error::invalid_input(format!(
                "cannot lay out planes for format {}",
                format
            )));
        }
        if self.width == width
            && self.height == height
            && self.format == format
            && self.data.len() == planes.len()
        {
            return Ok(());
        }

        self.data.resize(planes.len(), PlaneBuf::new());
        self.linesize.resize(planes.len(), 0);
        for (i, (stride, rows)) in planes.iter().enumerate() {
            self.data[i].resize_zeroed(stride * rows);
            self.linesize[i] = *stride;
        }
        self.width = width;
        self.height = height;
        self.format = format;
        Ok(())
    }

    /// Get the number of planes
    pub fn num_planes(&self) -> usize {
        self.data.len()
    }

    /// Get a plane's bytes by index
    pub fn plane(&self, index: usize) -> Option<&[u8]> {
        self.data.get(index).map(|p| p.as_slice())
    }

    /// Get a plane's bytes mutably by index
    pub fn plane_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        self.data.get_mut(index).map(|p| p.as_mut())
    }

    /// Borrow the frame as a plane view
    pub fn as_view(&self) -> FrameView<'_> {
        let mut planes: [&[u8]; MAX_PLANES] = [&[]; MAX_PLANES];
        let mut strides = [0usize; MAX_PLANES];
        for i in 0..self.data.len().min(MAX_PLANES) {
            planes[i] = self.data[i].as_slice();
            strides[i] = self.linesize[i];
        }
        FrameView {
            width: self.width,
            height: self.height,
            format: self.format,
            planes,
            strides,
            pts: self.pts,
        }
    }
}

/// A borrowed view of raw frame data supplied by a caller.
///
/// Binds up to three plane slices and their strides without copying;
/// unused slots hold empty slices.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format of the bound planes
    pub format: PixelFormat,
    /// Plane data
    pub planes: [&'a [u8]; MAX_PLANES],
    /// Line size per plane
    pub strides: [usize; MAX_PLANES],
    /// Presentation timestamp
    pub pts: Timestamp,
}

impl<'a> FrameView<'a> {
    /// Bind caller planes into a view
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        planes: [&'a [u8]; MAX_PLANES],
        strides: [usize; MAX_PLANES],
    ) -> Self {
        FrameView {
            width,
            height,
            format,
            planes,
            strides,
            pts: Timestamp::none(),
        }
    }

    /// Set the presentation timestamp
    pub fn with_pts(mut self, pts: Timestamp) -> Self {
        self.pts = pts;
        self
    }

    /// Copy the view into an owned frame
    pub fn to_frame(&self) -> Result<VideoFrame> {
        self.check_plane_bounds()?;
        let mut frame = VideoFrame::alloc(self.width, self.height, self.format)?;
        let dims = self.format.plane_dimensions(self.width, self.height);
        for (i, (stride, rows)) in dims.iter().enumerate() {
            let src = self.planes[i];
            let src_stride = self.strides[i];
            let dst = frame
                .plane_mut(i)
                .ok_or_else(|| Error::invalid_input("plane index out of range"))?;
            for row in 0..*rows {
                let s = &src[row * src_stride..row * src_stride + stride];
                dst[row * stride..(row + 1) * stride].copy_from_slice(s);
            }
        }
        frame.pts = self.pts;
        Ok(frame)
    }

    /// Verify every plane slice covers its nominal rows at the bound stride
    pub fn check_plane_bounds(&self) -> Result<()> {
        let dims = self.format.plane_dimensions(self.width, self.height);
        if dims.is_empty() {
            return Err(Error::invalid_input(format!(
                "cannot bind planes for format {}",
                self.format
            )));
        }
        for (i, (stride, rows)) in dims.iter().enumerate() {
            let src = self.planes[i];
            let src_stride = self.strides[i];
            if src_stride < *stride {
                return Err(Error::invalid_input(format!(
                    "plane {} stride {} below row width {}",
                    i, src_stride, stride
                )));
            }
            let need = if *rows == 0 {
                0
            } else {
                (rows - 1) * src_stride + stride
            };
            if src.len() < need {
                return Err(Error::invalid_input(format!(
                    "plane {} holds {} bytes, needs {}",
                    i,
                    src.len(),
                    need
                )));
            }
        }
        Ok(())
    }
}
