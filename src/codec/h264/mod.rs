//! H.264/AVC bitstream handling and software codec engines
//!
//! NAL unit scanning works on raw Annex B bytes and needs no codec library
//! behind it. The encode/decode engines wrap Cisco's OpenH264 and compile
//! in with the `h264` feature.
//!
//! ## Patent Notice
//! H.264/AVC is covered by patents. Cisco's OpenH264 binary releases carry
//! Cisco's patent license; building from source provides no patent
//! coverage. Commercial use may require additional licensing.

pub mod nal;

#[cfg(feature = "h264")]
pub mod decoder;
#[cfg(feature = "h264")]
pub mod encoder;

#[cfg(feature = "h264")]
pub use decoder::H264Decoder;
#[cfg(feature = "h264")]
pub use encoder::H264Encoder;
