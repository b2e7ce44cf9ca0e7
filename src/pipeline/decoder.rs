//! Decoding pipeline: compressed packets in, canonical frames out

use tracing::{debug, info, warn};

use crate::codec::h264::nal;
use crate::codec::{create_decoder, CodecId, Decoder, DecoderParams, PacketRef, VideoFrame};
use crate::error::{Error, Result};
use crate::hwaccel::{
    HwAccelType, HwDeviceFactory, HwDeviceSelector, HwSession, PlatformDeviceFactory,
    DEFAULT_PRIORITY,
};
use crate::swscale::PixelNormalizer;
use crate::util::{PixelFormat, Timestamp};

/// How eagerly a decoder pipeline goes after hardware acceleration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwPreference {
    /// Fail initialization when no hardware device comes up
    RequireHw,
    /// Use hardware when available, software otherwise
    PreferHw,
    /// Never touch the hardware subsystem
    SoftwareOnly,
}

/// Decoder pipeline configuration
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Hardware acceleration preference
    pub hw: HwPreference,
    /// Backend trial order for the selector
    pub priorities: Vec<HwAccelType>,
    /// Worker thread hint handed to the engine
    pub threads: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            hw: HwPreference::PreferHw,
            priorities: DEFAULT_PRIORITY.to_vec(),
            threads: 4,
        }
    }
}

/// Everything one decoding session owns.
///
/// Field declaration order is release order: frame slots, then the
/// normalizer and its scratch, then the hardware session, the engine last.
struct DecoderState {
    host_frame: VideoFrame,
    device_frame: Option<VideoFrame>,
    normalizer: PixelNormalizer,
    hw: Option<HwSession>,
    engine: Box<dyn Decoder>,
    codec: CodecId,
}

/// Turns an elementary stream into canonical YUV420P frames.
///
/// `init` resolves and opens an engine, running hardware selection per the
/// configured preference; `send`/`receive` follow the submit/retrieve
/// protocol with transient engine signals absorbed into empty results.
/// Frames come back as `&VideoFrame` borrows valid until the next call.
pub struct DecoderPipeline {
    config: DecoderConfig,
    selector: HwDeviceSelector,
    state: Option<DecoderState>,
}

impl DecoderPipeline {
    /// Pipeline with the default configuration and the stock device factory
    pub fn new() -> Self {
        DecoderPipeline::with_config(DecoderConfig::default())
    }

    /// Pipeline with the given configuration and the stock device factory
    pub fn with_config(config: DecoderConfig) -> Self {
        DecoderPipeline::with_device_factory(config, Box::new(PlatformDeviceFactory::new()))
    }

    /// Pipeline served by a caller-supplied device factory
    pub fn with_device_factory(config: DecoderConfig, factory: Box<dyn HwDeviceFactory>) -> Self {
        let selector = HwDeviceSelector::new(config.priorities.clone(), factory);
        DecoderPipeline {
            config,
            selector,
            state: None,
        }
    }

    /// Resolve an engine for `codec` and initialize with it.
    ///
    /// Any previous session is torn down first, whether or not this init
    /// succeeds.
    pub fn init(&mut self, codec: CodecId) -> Result<()> {
        self.state = None;
        let engine = create_decoder(codec)?;
        self.init_with_engine(codec, engine)
    }

    /// Initialize around a caller-supplied engine.
    ///
    /// Runs hardware selection against the engine's declared
    /// configurations, opens the engine and allocates the frame slots. On
    /// any failure the partially built session is dropped and the pipeline
    /// stays uninitialized.
    pub fn init_with_engine(&mut self, codec: CodecId, mut engine: Box<dyn Decoder>) -> Result<()> {
        self.state = None;

        let hw = match self.config.hw {
            HwPreference::SoftwareOnly => None,
            HwPreference::PreferHw | HwPreference::RequireHw => {
                self.selector.select(engine.hw_configs())
            }
        };
        match (&hw, self.config.hw) {
            (None, HwPreference::RequireHw) => {
                return Err(Error::hardware(format!(
                    "no hardware decoder device available for {}",
                    codec
                )));
            }
            (None, HwPreference::PreferHw) => {
                info!("Decoding {} in software", codec);
            }
            _ => {}
        }

        let mut params = DecoderParams::new(codec);
        params.threads = self.config.threads;
        params.hw = hw.as_ref().map(|session| session.binding());
        engine.open(&params)?;

        let device_frame = hw
            .as_ref()
            .map(|session| VideoFrame::new(0, 0, session.format.to_pixel_format()));
        self.state = Some(DecoderState {
            host_frame: VideoFrame::new(0, 0, PixelFormat::YUV420P),
            device_frame,
            normalizer: PixelNormalizer::new(),
            hw,
            engine,
            codec,
        });
        debug!(
            "Initialized {} decoder pipeline ({} threads)",
            codec, self.config.threads
        );
        Ok(())
    }

    /// True once `init` has succeeded and `close` has not run
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// True iff initialized and the open codec matches `codec`
    pub fn validate(&self, codec: CodecId) -> bool {
        self.state.as_ref().map_or(false, |s| s.codec == codec)
    }

    /// True when this session decodes through a hardware device
    pub fn hardware_available(&self) -> bool {
        self.state.as_ref().map_or(false, |s| s.hw.is_some())
    }

    /// Submit one compressed packet.
    ///
    /// H.264 payloads are tagged as keyframes by scanning for an IDR unit.
    /// A transient engine signal means the packet was not consumed yet and
    /// maps to `Ok(())`; the caller keeps retrieving.
    pub fn send(&mut self, data: &[u8], timestamp: i64) -> Result<()> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| Error::invalid_state("decoder pipeline not initialized"))?;
        let keyframe = state.codec == CodecId::H264 && nal::is_key_frame(data);
        let packet = PacketRef::new(data, Timestamp::new(timestamp)).with_keyframe(keyframe);
        match state.engine.send_packet(packet) {
            Ok(()) => Ok(()),
            Err(e) if e.is_transient() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Retrieve the next decoded frame in canonical YUV420P, or `None`
    /// when the engine has nothing ready (or is drained).
    ///
    /// With hardware active the frame is downloaded to host memory first;
    /// a failed download drops that frame and yields `None`. The returned
    /// borrow is valid until the next call on this pipeline.
    pub fn receive(&mut self) -> Result<Option<&VideoFrame>> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| Error::invalid_state("decoder pipeline not initialized"))?;

        let received = match state.device_frame.as_mut() {
            Some(device) => state.engine.receive_frame(device),
            None => state.engine.receive_frame(&mut state.host_frame),
        };
        match received {
            Ok(()) => {}
            Err(e) if e.is_transient() => return Ok(None),
            Err(e) => return Err(e),
        }

        if let (Some(session), Some(device)) = (state.hw.as_mut(), state.device_frame.as_ref()) {
            if let Err(e) = session.device.download(device, &mut state.host_frame) {
                warn!("Hardware frame download failed: {}", e);
                return Ok(None);
            }
        }

        if state.host_frame.format == PixelFormat::YUV420P {
            Ok(Some(&state.host_frame))
        } else {
            let frame = state.normalizer.normalize_frame(&state.host_frame)?;
            Ok(Some(frame))
        }
    }

    /// Signal end of input; subsequent `receive` calls drain buffered
    /// frames and then yield `None`
    pub fn flush(&mut self) -> Result<()> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| Error::invalid_state("decoder pipeline not initialized"))?;
        state.engine.flush()
    }

    /// Tear the session down. Also happens on drop and on re-init.
    pub fn close(&mut self) {
        if self.state.take().is_some() {
            debug!("Decoder pipeline closed");
        }
    }
}

impl Default for DecoderPipeline {
    fn default() -> Self {
        DecoderPipeline::new()
    }
}
