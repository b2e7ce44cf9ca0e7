//! Common test utilities for vidpipe integration tests
//!
//! Scripted codec engines, scripted hardware devices and frame builders
//! shared by the pipeline test suites.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use vidpipe::codec::{
    Decoder, DecoderParams, Encoder, EncoderParams, FrameView, PacketBuf, PacketRef, VideoFrame,
    MAX_PLANES,
};
use vidpipe::error::{Error, Result};
use vidpipe::hwaccel::{HwAccelType, HwConfig, HwDevice, HwDeviceFactory};
use vidpipe::util::{PixelFormat, Timestamp};

// ============================================================================
// Frame builders
// ============================================================================

/// Allocate a frame and fill each plane with a deterministic pattern
pub fn patterned_frame(width: u32, height: u32, format: PixelFormat, pts: i64) -> VideoFrame {
    let mut frame = VideoFrame::alloc(width, height, format).unwrap();
    for index in 0..frame.num_planes() {
        let plane = frame.plane_mut(index).unwrap();
        for (i, value) in plane.iter_mut().enumerate() {
            *value = ((i + index * 64) % 251) as u8;
        }
    }
    frame.pts = Timestamp::new(pts);
    frame.keyframe = pts == 0;
    frame
}

/// Borrow a frame's planes the way pipeline callers pass them in
pub fn plane_views(frame: &VideoFrame) -> ([&[u8]; MAX_PLANES], [usize; MAX_PLANES]) {
    let view = frame.as_view();
    (view.planes, view.strides)
}

/// Build an Annex-B stream of `(nal_type, payload_len)` units with four-byte
/// start codes. Payload bytes avoid accidental start codes.
pub fn annexb(units: &[(u8, usize)]) -> Vec<u8> {
    let mut out = Vec::new();
    for &(nal_type, len) in units {
        out.extend_from_slice(&[0, 0, 0, 1]);
        out.push((3 << 5) | (nal_type & 0x1F));
        out.extend(std::iter::repeat(0xAB).take(len));
    }
    out
}

// ============================================================================
// Scripted decode engine
// ============================================================================

/// Observable state of a [`ScriptedDecoder`], shared with the test body
#[derive(Default)]
pub struct DecoderScript {
    /// Parameters captured from `open`
    pub opened: Option<DecoderParams>,
    /// Submitted packets as (payload, pts, keyframe)
    pub sent: Vec<(Vec<u8>, i64, bool)>,
    /// Frames to emit, one per `receive_frame`
    pub frames: VecDeque<VideoFrame>,
    /// Set by `flush`
    pub draining: bool,
    /// Make `send_packet` report a full input queue
    pub input_full: bool,
}

/// A decode engine driven entirely by its script
pub struct ScriptedDecoder {
    configs: Vec<HwConfig>,
    /// Shared script handle; clone it before boxing the engine
    pub script: Rc<RefCell<DecoderScript>>,
}

impl ScriptedDecoder {
    pub fn new() -> Self {
        ScriptedDecoder {
            configs: Vec::new(),
            script: Rc::new(RefCell::new(DecoderScript::default())),
        }
    }

    /// Declare hardware configurations for the selector to find
    pub fn with_hw_configs(mut self, configs: Vec<HwConfig>) -> Self {
        self.configs = configs;
        self
    }
}

impl Decoder for ScriptedDecoder {
    fn hw_configs(&self) -> &[HwConfig] {
        &self.configs
    }

    fn open(&mut self, params: &DecoderParams) -> Result<()> {
        self.script.borrow_mut().opened = Some(params.clone());
        Ok(())
    }

    fn send_packet(&mut self, packet: PacketRef<'_>) -> Result<()> {
        let mut script = self.script.borrow_mut();
        if script.input_full {
            return Err(Error::TryAgain);
        }
        script
            .sent
            .push((packet.data.to_vec(), packet.pts.value, packet.keyframe));
        Ok(())
    }

    fn receive_frame(&mut self, frame: &mut VideoFrame) -> Result<()> {
        let mut script = self.script.borrow_mut();
        match script.frames.pop_front() {
            Some(next) => {
                *frame = next;
                Ok(())
            }
            None if script.draining => Err(Error::EndOfStream),
            None => Err(Error::TryAgain),
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.script.borrow_mut().draining = true;
        Ok(())
    }
}

// ============================================================================
// Scripted encode engine
// ============================================================================

/// Observable state of a [`ScriptedEncoder`], shared with the test body
#[derive(Default)]
pub struct EncoderScript {
    /// Parameters captured from `open`; the last open wins
    pub opened: Option<EncoderParams>,
    /// Submitted frames, copied out of the caller's view
    pub frames: Vec<VideoFrame>,
    /// Packets to emit as (payload, keyframe)
    pub packets: VecDeque<(Vec<u8>, bool)>,
    /// Set by `flush`
    pub draining: bool,
    /// Make `open` fail when the params carry a hardware binding
    pub reject_hw_open: bool,
    /// Make every `open` fail
    pub reject_open: bool,
}

/// An encode engine driven entirely by its script
pub struct ScriptedEncoder {
    /// Shared script handle; clone it before boxing the engine
    pub script: Rc<RefCell<EncoderScript>>,
}

impl ScriptedEncoder {
    pub fn new() -> Self {
        ScriptedEncoder {
            script: Rc::new(RefCell::new(EncoderScript::default())),
        }
    }
}

impl Encoder for ScriptedEncoder {
    fn open(&mut self, params: &EncoderParams) -> Result<()> {
        let mut script = self.script.borrow_mut();
        if script.reject_open {
            return Err(Error::init("scripted open failure"));
        }
        if script.reject_hw_open && params.hw.is_some() {
            return Err(Error::hardware("scripted hardware rejection"));
        }
        script.opened = Some(params.clone());
        Ok(())
    }

    fn send_frame(&mut self, frame: FrameView<'_>) -> Result<()> {
        let copied = frame.to_frame()?;
        self.script.borrow_mut().frames.push(copied);
        Ok(())
    }

    fn receive_packet(&mut self, packet: &mut PacketBuf) -> Result<()> {
        let mut script = self.script.borrow_mut();
        match script.packets.pop_front() {
            Some((data, keyframe)) => {
                packet.set_data(&data);
                packet.keyframe = keyframe;
                Ok(())
            }
            None if script.draining => Err(Error::EndOfStream),
            None => Err(Error::TryAgain),
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.script.borrow_mut().draining = true;
        Ok(())
    }
}

// ============================================================================
// Scripted hardware devices
// ============================================================================

/// A device whose transfers are plain copies between host buffers
pub struct MirrorDevice {
    backend: HwAccelType,
    fail_download: bool,
}

impl HwDevice for MirrorDevice {
    fn backend(&self) -> HwAccelType {
        self.backend
    }

    fn upload(&mut self, src: &FrameView<'_>, dst: &mut VideoFrame) -> Result<()> {
        *dst = src.to_frame()?;
        Ok(())
    }

    fn download(&mut self, src: &VideoFrame, dst: &mut VideoFrame) -> Result<()> {
        if self.fail_download {
            return Err(Error::hardware("scripted download failure"));
        }
        dst.clone_from(src);
        Ok(())
    }
}

/// Factory that brings up [`MirrorDevice`]s for a fixed set of backends
pub struct ScriptedFactory {
    working: Vec<HwAccelType>,
    fail_download: bool,
}

impl ScriptedFactory {
    pub fn new(working: Vec<HwAccelType>) -> Self {
        ScriptedFactory {
            working,
            fail_download: false,
        }
    }

    /// Devices come up but every download fails
    pub fn with_failing_downloads(mut self) -> Self {
        self.fail_download = true;
        self
    }
}

impl HwDeviceFactory for ScriptedFactory {
    fn create(&self, backend: HwAccelType) -> Result<Box<dyn HwDevice>> {
        if self.working.contains(&backend) {
            Ok(Box::new(MirrorDevice {
                backend,
                fail_download: self.fail_download,
            }))
        } else {
            Err(Error::hardware(format!("{} did not come up", backend)))
        }
    }
}
