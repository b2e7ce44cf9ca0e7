//! High-level media pipelines
//!
//! Three synchronous, blocking pipelines built on the codec engine and
//! hardware acceleration layers: [`DecoderPipeline`] (compressed packets
//! in, canonical frames out), [`EncoderPipeline`] (raw planes in, encoded
//! packets out) and [`TranscoderPipeline`] (format conversion only).
//!
//! Callers serialize access per instance; every mutating operation takes
//! `&mut self`. Distinct instances are fully independent, including their
//! negotiated hardware formats. Returned frame and packet references stay
//! valid until the next call on the same pipeline.

pub mod decoder;
pub mod encoder;
pub mod transcoder;

pub use decoder::{DecoderConfig, DecoderPipeline, HwPreference};
pub use encoder::{EncoderConfig, EncoderPipeline};
pub use transcoder::TranscoderPipeline;
