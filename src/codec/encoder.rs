//! Encode engine boundary

use super::{CodecId, FrameView, PacketBuf};
use crate::error::{Error, Result};
use crate::hwaccel::{HwAccelType, HwFormatBinding};
use crate::util::PixelFormat;

/// An encode engine producing one elementary stream.
///
/// Same transient-signal contract as [`super::Decoder`]: `TryAgain` /
/// `EndOfStream` on submit/retrieve mean "nothing right now", not failure.
pub trait Encoder {
    /// Open the engine. Called exactly once before any submit/retrieve.
    fn open(&mut self, params: &EncoderParams) -> Result<()>;

    /// Submit one raw frame
    fn send_frame(&mut self, frame: FrameView<'_>) -> Result<()>;

    /// Write the next encoded packet into `packet`
    fn receive_packet(&mut self, packet: &mut PacketBuf) -> Result<()>;

    /// Signal end of input so remaining packets can drain
    fn flush(&mut self) -> Result<()>;
}

/// Open parameters for an encode engine, carrying the rate-control and GOP
/// policy the pipeline was configured with.
#[derive(Debug, Clone)]
pub struct EncoderParams {
    /// Codec the engine is expected to produce
    pub codec: CodecId,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format of submitted frames
    pub format: PixelFormat,
    /// Target bit rate in bits per second
    pub bit_rate: u64,
    /// Frames per second; the stream time base is its reciprocal
    pub framerate: u32,
    /// Keyframe interval in frames
    pub gop_size: u32,
    /// Maximum consecutive B-frames
    pub max_b_frames: u32,
    /// Quantizer floor
    pub qmin: u32,
    /// Quantizer ceiling
    pub qmax: u32,
    /// Speed/quality preset name
    pub preset: String,
    /// Bitstream profile name
    pub profile: String,
    /// Tuning name
    pub tune: String,
    /// Negotiated hardware binding; when set, submitted frames live in
    /// device memory in the bound format
    pub hw: Option<HwFormatBinding>,
}

impl EncoderParams {
    /// Parameters with the stock rate-control policy: 400 kbps at 25 fps,
    /// one keyframe per second, no B-frames, full quantizer range, tuned
    /// for low-latency baseline output.
    pub fn new(codec: CodecId, width: u32, height: u32, format: PixelFormat) -> Self {
        EncoderParams {
            codec,
            width,
            height,
            format,
            bit_rate: 400_000,
            framerate: 25,
            gop_size: 25,
            max_b_frames: 0,
            qmin: 10,
            qmax: 51,
            preset: "ultrafast".to_string(),
            profile: "baseline".to_string(),
            tune: "zerolatency".to_string(),
            hw: None,
        }
    }
}

/// Create an encode engine for the given codec.
///
/// `backend` requests a hardware-flavored engine for that backend; `None`
/// selects the software engine. No hardware-flavored engine ships with this
/// crate, so backend requests fail and the encoder pipeline falls back to
/// software; embedders with real device engines inject them at pipeline
/// construction instead.
pub fn create_encoder(codec: CodecId, backend: Option<HwAccelType>) -> Result<Box<dyn Encoder>> {
    if let Some(backend) = backend {
        return Err(Error::unsupported(format!(
            "No {} encoder available for codec: {}",
            backend, codec
        )));
    }
    match codec {
        #[cfg(feature = "h264")]
        CodecId::H264 => {
            use crate::codec::h264::H264Encoder;
            Ok(Box::new(H264Encoder::new()?))
        }
        other => Err(Error::unsupported(format!(
            "No encoder available for codec: {}",
            other
        ))),
    }
}
