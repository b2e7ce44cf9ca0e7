//! Transcoding pipeline: pixel format conversion without codecs

use crate::codec::{FrameView, VideoFrame, MAX_PLANES};
use crate::error::Result;
use crate::swscale::PixelNormalizer;
use crate::util::PixelFormat;

/// Converts caller-supplied raw images to the canonical format.
///
/// Owns one normalizer whose conversion context is keyed on the most
/// recently seen (width, height, source format) and rebuilt only when that
/// key changes. No engine, no device; always initialized.
pub struct TranscoderPipeline {
    normalizer: PixelNormalizer,
}

impl TranscoderPipeline {
    /// Create a transcoder with an empty conversion cache
    pub fn new() -> Self {
        TranscoderPipeline {
            normalizer: PixelNormalizer::new(),
        }
    }

    /// Convert one image to canonical YUV420P.
    ///
    /// The returned frame is owned by this pipeline and valid until the
    /// next `scale` call; `Clone` it to keep it longer.
    pub fn scale(
        &mut self,
        planes: [&[u8]; MAX_PLANES],
        strides: [usize; MAX_PLANES],
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<&VideoFrame> {
        let view = FrameView::new(width, height, format, planes, strides);
        self.normalizer.normalize_view(&view)
    }
}

impl Default for TranscoderPipeline {
    fn default() -> Self {
        TranscoderPipeline::new()
    }
}
