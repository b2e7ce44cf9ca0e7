//! Software H.264 decode engine backed by OpenH264

use std::collections::VecDeque;

use openh264::decoder::{DecodedYUV, Decoder as OpenH264Decoder, DecoderConfig};
use openh264::formats::YUVSource;
use openh264::OpenH264API;

use crate::codec::h264::nal;
use crate::codec::{CodecId, Decoder, DecoderParams, PacketRef, VideoFrame};
use crate::error::{Error, Result};
use crate::util::{PixelFormat, Timestamp};

/// Software H.264 decode engine.
///
/// OpenH264 decodes synchronously, so every packet that produces output
/// is decoded on submit and queued until retrieved. Output is always
/// planar 4:2:0; keyframes are tagged by classifying the submitted
/// bitstream.
pub struct H264Decoder {
    decoder: OpenH264Decoder,
    pending: VecDeque<VideoFrame>,
    draining: bool,
}

impl H264Decoder {
    /// Create a new H.264 decode engine
    pub fn new() -> Result<Self> {
        let decoder =
            OpenH264Decoder::with_api_config(OpenH264API::from_source(), DecoderConfig::new())
                .map_err(|e| Error::codec(format!("failed to create OpenH264 decoder: {}", e)))?;

        Ok(H264Decoder {
            decoder,
            pending: VecDeque::new(),
            draining: false,
        })
    }

    fn frame_from_yuv(yuv: &DecodedYUV<'_>, pts: Timestamp, keyframe: bool) -> Result<VideoFrame> {
        let (width, height) = yuv.dimensions();
        let mut frame = VideoFrame::alloc(width as u32, height as u32, PixelFormat::YUV420P)?;
        frame.pts = pts;
        frame.keyframe = keyframe;

        let dims = PixelFormat::YUV420P.plane_dimensions(frame.width, frame.height);
        let (sy, su, sv) = yuv.strides();
        let planes = [(yuv.y(), sy), (yuv.u(), su), (yuv.v(), sv)];
        for (i, (src, src_stride)) in planes.into_iter().enumerate() {
            let (stride, rows) = dims[i];
            if rows > 0 && src.len() < (rows - 1) * src_stride + stride {
                return Err(Error::codec(format!(
                    "decoder returned a short plane: {} bytes for {} rows at stride {}",
                    src.len(),
                    rows,
                    src_stride
                )));
            }
            let dst = frame
                .plane_mut(i)
                .ok_or_else(|| Error::codec("decoded frame is missing a plane"))?;
            for row in 0..rows {
                let s = &src[row * src_stride..row * src_stride + stride];
                dst[row * stride..(row + 1) * stride].copy_from_slice(s);
            }
        }
        Ok(frame)
    }
}

impl Decoder for H264Decoder {
    fn open(&mut self, params: &DecoderParams) -> Result<()> {
        if params.codec != CodecId::H264 {
            return Err(Error::unsupported(format!(
                "OpenH264 engine cannot decode {}",
                params.codec
            )));
        }
        if params.hw.is_some() {
            return Err(Error::unsupported(
                "OpenH264 engine decodes to system memory only",
            ));
        }
        Ok(())
    }

    fn send_packet(&mut self, packet: PacketRef<'_>) -> Result<()> {
        if self.draining {
            return Err(Error::invalid_state("packet submitted after flush"));
        }
        match self.decoder.decode(packet.data) {
            Ok(Some(yuv)) => {
                let keyframe = packet.keyframe || nal::is_key_frame(packet.data);
                let frame = Self::frame_from_yuv(&yuv, packet.pts, keyframe)?;
                self.pending.push_back(frame);
                Ok(())
            }
            // parameter sets and partial input buffer up without output
            Ok(None) => Ok(()),
            Err(e) => Err(Error::codec(format!("H.264 decode failed: {}", e))),
        }
    }

    fn receive_frame(&mut self, frame: &mut VideoFrame) -> Result<()> {
        match self.pending.pop_front() {
            Some(decoded) => {
                *frame = decoded;
                Ok(())
            }
            None if self.draining => Err(Error::EndOfStream),
            None => Err(Error::TryAgain),
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.draining = true;
        Ok(())
    }
}
