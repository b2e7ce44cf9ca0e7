//! Decode engine boundary

use super::{CodecId, PacketRef, VideoFrame};
use crate::error::{Error, Result};
use crate::hwaccel::{HwConfig, HwFormatBinding};

/// A decode engine driving one elementary stream.
///
/// Engines follow the submit/retrieve protocol: `send_packet` may fail with
/// `Error::TryAgain` when internal queues are full, `receive_frame` fails
/// with `Error::TryAgain` until output is ready and `Error::EndOfStream`
/// once drained. Both signals are transient; everything else is a real
/// error.
pub trait Decoder {
    /// Hardware configurations this engine declares support for.
    /// The default is software-only.
    fn hw_configs(&self) -> &[HwConfig] {
        &[]
    }

    /// Open the engine. Called exactly once before any submit/retrieve.
    fn open(&mut self, params: &DecoderParams) -> Result<()>;

    /// Submit one compressed packet
    fn send_packet(&mut self, packet: PacketRef<'_>) -> Result<()>;

    /// Decode the next frame into `frame`, reusing its plane storage where
    /// the layout allows
    fn receive_frame(&mut self, frame: &mut VideoFrame) -> Result<()>;

    /// Signal end of input so remaining frames can drain
    fn flush(&mut self) -> Result<()>;
}

/// Open parameters for a decode engine
#[derive(Debug, Clone)]
pub struct DecoderParams {
    /// Codec the engine is expected to decode
    pub codec: CodecId,
    /// Worker thread hint for slice-parallel decoding
    pub threads: usize,
    /// Negotiated hardware binding; `None` means software output.
    /// When set, the engine decodes into frames tagged with the bound
    /// hardware format and the pipeline downloads them.
    pub hw: Option<HwFormatBinding>,
}

impl DecoderParams {
    /// Parameters with the default thread hint and no hardware binding
    pub fn new(codec: CodecId) -> Self {
        DecoderParams {
            codec,
            threads: 4,
            hw: None,
        }
    }
}

/// Create a decode engine for the given codec
pub fn create_decoder(codec: CodecId) -> Result<Box<dyn Decoder>> {
    match codec {
        #[cfg(feature = "h264")]
        CodecId::H264 => {
            use crate::codec::h264::H264Decoder;
            Ok(Box::new(H264Decoder::new()?))
        }
        other => Err(Error::unsupported(format!(
            "No decoder available for codec: {}",
            other
        ))),
    }
}
