//! Software H.264 encode engine backed by OpenH264

use std::collections::VecDeque;

use openh264::encoder::{Encoder as OpenH264Encoder, EncoderConfig};
use openh264::formats::YUVSource;
use openh264::OpenH264API;

use crate::codec::h264::nal;
use crate::codec::{CodecId, Encoder, EncoderParams, FrameView, PacketBuf};
use crate::error::{Error, Result};
use crate::util::PixelFormat;

/// Borrowed planar 4:2:0 planes presented to OpenH264 without copying
struct PlanarYuv<'a> {
    planes: [&'a [u8]; 3],
    strides: (usize, usize, usize),
    dimensions: (usize, usize),
}

impl YUVSource for PlanarYuv<'_> {
    fn dimensions(&self) -> (usize, usize) {
        self.dimensions
    }

    fn strides(&self) -> (usize, usize, usize) {
        self.strides
    }

    fn y(&self) -> &[u8] {
        self.planes[0]
    }

    fn u(&self) -> &[u8] {
        self.planes[1]
    }

    fn v(&self) -> &[u8] {
        self.planes[2]
    }
}

/// Software H.264 encode engine.
///
/// OpenH264 encodes synchronously; accepted frames produce their packet
/// on submit, queued until retrieved. The backend runs its own GOP and
/// parameter-set decisions, so of the submitted policy it honors bit rate
/// and frame rate and treats the rest as advisory.
pub struct H264Encoder {
    encoder: Option<OpenH264Encoder>,
    width: u32,
    height: u32,
    pending: VecDeque<(Vec<u8>, bool)>,
    draining: bool,
}

impl H264Encoder {
    /// Create a new H.264 encode engine
    pub fn new() -> Result<Self> {
        Ok(H264Encoder {
            encoder: None,
            width: 0,
            height: 0,
            pending: VecDeque::new(),
            draining: false,
        })
    }
}

impl Encoder for H264Encoder {
    fn open(&mut self, params: &EncoderParams) -> Result<()> {
        if params.codec != CodecId::H264 {
            return Err(Error::unsupported(format!(
                "OpenH264 engine cannot encode {}",
                params.codec
            )));
        }
        if params.format != PixelFormat::YUV420P {
            return Err(Error::unsupported(format!(
                "OpenH264 engine encodes yuv420p input, not {}",
                params.format
            )));
        }
        if params.hw.is_some() {
            return Err(Error::unsupported(
                "OpenH264 engine takes system-memory frames only",
            ));
        }

        let config = EncoderConfig::new()
            .set_bitrate_bps(params.bit_rate.min(u32::MAX as u64) as u32)
            .max_frame_rate(params.framerate as f32);
        let encoder = OpenH264Encoder::with_api_config(OpenH264API::from_source(), config)
            .map_err(|e| Error::codec(format!("failed to create OpenH264 encoder: {}", e)))?;

        self.encoder = Some(encoder);
        self.width = params.width;
        self.height = params.height;
        Ok(())
    }

    fn send_frame(&mut self, frame: FrameView<'_>) -> Result<()> {
        if self.draining {
            return Err(Error::invalid_state("frame submitted after flush"));
        }
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| Error::invalid_state("encoder not opened"))?;

        if frame.format != PixelFormat::YUV420P {
            return Err(Error::unsupported(format!(
                "OpenH264 engine encodes yuv420p input, not {}",
                frame.format
            )));
        }
        if frame.width != self.width || frame.height != self.height {
            return Err(Error::invalid_input(format!(
                "frame is {}x{}, encoder opened for {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }
        frame.check_plane_bounds()?;

        let source = PlanarYuv {
            planes: frame.planes,
            strides: (frame.strides[0], frame.strides[1], frame.strides[2]),
            dimensions: (frame.width as usize, frame.height as usize),
        };
        let bitstream = encoder
            .encode(&source)
            .map_err(|e| Error::codec(format!("H.264 encode failed: {}", e)))?;

        let data = bitstream.to_vec();
        if !data.is_empty() {
            // rate control may swallow a frame entirely; only queue real output
            let keyframe = nal::is_key_frame(&data);
            self.pending.push_back((data, keyframe));
        }
        Ok(())
    }

    fn receive_packet(&mut self, packet: &mut PacketBuf) -> Result<()> {
        match self.pending.pop_front() {
            Some((data, keyframe)) => {
                packet.set_data(&data);
                packet.keyframe = keyframe;
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
