//! Codec engine boundary: identifiers, frame/packet data model, engine
//! traits and the engine registry.

pub mod decoder;
pub mod encoder;
pub mod frame;
pub mod h264;
pub mod packet;

pub use decoder::{create_decoder, Decoder, DecoderParams};
pub use encoder::{create_encoder, Encoder, EncoderParams};
pub use frame::{FrameView, VideoFrame, MAX_PLANES};
pub use packet::{EncodedPacket, PacketBuf, PacketRef};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Video codec identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodecId {
    /// H.264 / AVC / MPEG-4 part 10
    H264,
    /// H.265 / HEVC
    Hevc,
    /// On2 VP8
    Vp8,
    /// Google VP9
    Vp9,
    /// AOMedia Video 1
    Av1,
}

impl CodecId {
    /// Short codec name, as used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            CodecId::H264 => "h264",
            CodecId::Hevc => "hevc",
            CodecId::Vp8 => "vp8",
            CodecId::Vp9 => "vp9",
            CodecId::Av1 => "av1",
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CodecId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "h264" | "avc" => Ok(CodecId::H264),
            "h265" | "hevc" => Ok(CodecId::Hevc),
            "vp8" => Ok(CodecId::Vp8),
            "vp9" => Ok(CodecId::Vp9),
            "av1" => Ok(CodecId::Av1),
            other => Err(Error::unsupported(format!("unknown codec id: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_id_round_trip() {
        for id in [
            CodecId::H264,
            CodecId::Hevc,
            CodecId::Vp8,
            CodecId::Vp9,
            CodecId::Av1,
        ] {
            assert_eq!(id.name().parse::<CodecId>().unwrap(), id);
        }
    }

    #[test]
    fn test_codec_id_aliases() {
        assert_eq!("avc".parse::<CodecId>().unwrap(), CodecId::H264);
        assert_eq!("h265".parse::<CodecId>().unwrap(), CodecId::Hevc);
        assert!("mp3".parse::<CodecId>().is_err());
    }
}
