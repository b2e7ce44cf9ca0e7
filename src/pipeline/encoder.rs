//! Encoding pipeline: raw planes in, encoded packets out

use tracing::{debug, warn};

use crate::codec::{
    create_encoder, CodecId, EncodedPacket, Encoder, EncoderParams, FrameView, PacketBuf,
    VideoFrame, MAX_PLANES,
};
use crate::error::{Error, Result};
use crate::hwaccel::{
    HwAccelType, HwDeviceFactory, HwFramePool, HwPixelFormat, HwSession, PlatformDeviceFactory,
};
use crate::util::{PixelFormat, Timestamp};

/// Encoder pipeline configuration.
///
/// The defaults are a low-latency profile: constant target bit rate, one
/// keyframe per second at 25 fps, no B-frames, baseline bitstream. Every
/// field is overridable.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Codec to encode
    pub codec: CodecId,
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
    /// Capacity of the `receive_all` accumulation buffer in bytes
    pub buffer_capacity: usize,
    /// Hardware encoder backend; `None` encodes in software
    pub hw_backend: Option<HwAccelType>,
    /// Device frame pool size when a hardware backend is active
    pub hw_pool_size: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            codec: CodecId::H264,
            bit_rate: 400_000,
            framerate: 25,
            gop_size: 25,
            max_b_frames: 0,
            qmin: 10,
            qmax: 51,
            preset: "ultrafast".to_string(),
            profile: "baseline".to_string(),
            tune: "zerolatency".to_string(),
            buffer_capacity: 1024 * 256,
            hw_backend: None,
            hw_pool_size: 20,
        }
    }
}

/// Everything one encoding session owns.
///
/// Field declaration order is release order: packet slot and accumulation
/// buffer, then the working device frame and its pool, then the hardware
/// session, the engine last.
struct EncoderState {
    packet: PacketBuf,
    accumulator: Vec<u8>,
    capacity: usize,
    device_frame: Option<VideoFrame>,
    pool: Option<HwFramePool>,
    hw: Option<HwSession>,
    engine: Box<dyn Encoder>,
    width: u32,
    height: u32,
    format: PixelFormat,
    next_pts: i64,
}

/// Turns raw frames into an encoded elementary stream.
///
/// When a hardware backend is configured, `init` tries to bring up the
/// device path; any hardware failure falls back to software encoding with
/// no error, observable only through `hardware_available()`. Packets come
/// back as borrows valid until the next call on this pipeline.
pub struct EncoderPipeline {
    config: EncoderConfig,
    factory: Box<dyn HwDeviceFactory>,
    state: Option<EncoderState>,
}

impl EncoderPipeline {
    /// Pipeline with the default configuration and the stock device factory
    pub fn new() -> Self {
        EncoderPipeline::with_config(EncoderConfig::default())
    }

    /// Pipeline with the given configuration and the stock device factory
    pub fn with_config(config: EncoderConfig) -> Self {
        EncoderPipeline::with_device_factory(config, Box::new(PlatformDeviceFactory::new()))
    }

    /// Pipeline served by a caller-supplied device factory
    pub fn with_device_factory(config: EncoderConfig, factory: Box<dyn HwDeviceFactory>) -> Self {
        EncoderPipeline {
            config,
            factory,
            state: None,
        }
    }

    /// Resolve an engine and initialize for the given frame layout.
    ///
    /// With a hardware backend configured, a backend-flavored engine is
    /// tried first; any failure on that path retries the whole init in
    /// software. Any previous session is torn down first.
    pub fn init(&mut self, width: u32, height: u32, format: PixelFormat) -> Result<()> {
        self.state = None;
        if let Some(backend) = self.config.hw_backend {
            let attempt = create_encoder(self.config.codec, Some(backend))
                .and_then(|engine| self.build_state(width, height, format, engine, true));
            match attempt {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(
                        "Hardware {} encoder unavailable for {}: {}; encoding in software",
                        backend, self.config.codec, e
                    );
                }
            }
        }
        let engine = create_encoder(self.config.codec, None)?;
        self.build_state(width, height, format, engine, false)
    }

    /// Initialize around a caller-supplied engine.
    ///
    /// The device path is still attempted when a hardware backend is
    /// configured; if it cannot be brought up the same engine is opened in
    /// software mode instead.
    pub fn init_with_engine(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
        engine: Box<dyn Encoder>,
    ) -> Result<()> {
        self.build_state(width, height, format, engine, true)
    }

    fn build_state(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
        mut engine: Box<dyn Encoder>,
        allow_hw: bool,
    ) -> Result<()> {
        self.state = None;
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(Error::invalid_input(format!(
                "encoder needs even non-zero dimensions, got {}x{}",
                width, height
            )));
        }

        let mut hw = None;
        let mut pool = None;
        let mut device_frame = None;
        if allow_hw {
            if let Some(backend) = self.config.hw_backend {
                match self.open_device(backend, width, height) {
                    Ok((session, frame_pool, frame)) => {
                        hw = Some(session);
                        pool = Some(frame_pool);
                        device_frame = Some(frame);
                    }
                    Err(e) => {
                        warn!(
                            "Hardware encoder setup on {} failed: {}; encoding in software",
                            backend, e
                        );
                    }
                }
            }
        }

        let mut params = EncoderParams::new(self.config.codec, width, height, format);
        params.bit_rate = self.config.bit_rate;
        params.framerate = self.config.framerate;
        params.gop_size = self.config.gop_size;
        params.max_b_frames = self.config.max_b_frames;
        params.qmin = self.config.qmin;
        params.qmax = self.config.qmax;
        params.preset = self.config.preset.clone();
        params.profile = self.config.profile.clone();
        params.tune = self.config.tune.clone();
        params.hw = hw.as_ref().map(|session| session.binding());

        if let Err(e) = engine.open(&params) {
            if hw.is_some() {
                warn!(
                    "Encoder rejected hardware surfaces: {}; encoding in software",
                    e
                );
                hw = None;
                pool = None;
                device_frame = None;
                params.hw = None;
                engine.open(&params)?;
            } else {
                return Err(e);
            }
        }

        let capacity = self.config.buffer_capacity;
        self.state = Some(EncoderState {
            packet: PacketBuf::new(),
            accumulator: Vec::with_capacity(capacity),
            capacity,
            device_frame,
            pool,
            hw,
            engine,
            width,
            height,
            format,
            next_pts: 0,
        });
        debug!(
            "Initialized {} encoder pipeline {}x{} {}",
            self.config.codec, width, height, format
        );
        Ok(())
    }

    /// Bring up the device context and frame pool for one hardware attempt
    fn open_device(
        &self,
        backend: HwAccelType,
        width: u32,
        height: u32,
    ) -> Result<(HwSession, HwFramePool, VideoFrame)> {
        let device = self.factory.create(backend)?;
        let session = HwSession {
            device,
            format: HwPixelFormat::YUV420P,
        };
        let mut pool = HwFramePool::new(
            width,
            height,
            PixelFormat::YUV420P,
            self.config.hw_pool_size,
        );
        pool.preallocate(self.config.hw_pool_size)?;
        let frame = pool.acquire()?;
        Ok((session, pool, frame))
    }

    /// True once `init` has succeeded and `close` has not run
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// True when this session encodes through a hardware device
    pub fn hardware_available(&self) -> bool {
        self.state.as_ref().map_or(false, |s| s.hw.is_some())
    }

    /// Submit one raw frame without copying its planes.
    ///
    /// The frame is stamped with the next monotonically increasing pts.
    /// With hardware active the planes are uploaded into the working
    /// device frame first; upload or submit failure fails this call and
    /// leaves the pipeline usable.
    pub fn send(
        &mut self,
        width: u32,
        height: u32,
        planes: [&[u8]; MAX_PLANES],
        strides: [usize; MAX_PLANES],
    ) -> Result<()> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| Error::invalid_state("encoder pipeline not initialized"))?;
        if width != state.width || height != state.height {
            return Err(Error::invalid_input(format!(
                "frame is {}x{}, encoder opened for {}x{}",
                width, height, state.width, state.height
            )));
        }

        let pts = Timestamp::new(state.next_pts);
        let view = FrameView::new(width, height, state.format, planes, strides).with_pts(pts);
        if let (Some(session), Some(device)) = (state.hw.as_mut(), state.device_frame.as_mut()) {
            session.device.upload(&view, device)?;
            device.pts = pts;
            state.engine.send_frame(device.as_view())?;
        } else {
            state.engine.send_frame(view)?;
        }
        state.next_pts += 1;
        Ok(())
    }

    /// Retrieve the next encoded packet, or `None` when the engine has
    /// nothing ready (or is drained). Dropping the returned packet
    /// releases the slot for the next retrieval.
    pub fn receive_packet(&mut self) -> Result<Option<EncodedPacket<'_>>> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| Error::invalid_state("encoder pipeline not initialized"))?;
        state.packet.clear();
        match state.engine.receive_packet(&mut state.packet) {
            Ok(()) => Ok(Some(state.packet.as_packet())),
            Err(e) if e.is_transient() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Drain every packet the engine has ready into the accumulation
    /// buffer and return the concatenation, in retrieval order.
    ///
    /// Fails with `Error::BufferTooSmall` before copying a packet that
    /// would exceed the configured capacity. The returned slice is
    /// overwritten by the next call.
    pub fn receive_all(&mut self) -> Result<&[u8]> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| Error::invalid_state("encoder pipeline not initialized"))?;
        state.accumulator.clear();
        loop {
            state.packet.clear();
            match state.engine.receive_packet(&mut state.packet) {
                Ok(()) => {
                    let need = state.accumulator.len() + state.packet.len();
                    if need > state.capacity {
                        return Err(Error::BufferTooSmall {
                            need,
                            have: state.capacity,
                        });
                    }
                    state.accumulator.extend_from_slice(&state.packet.data);
                }
                Err(e) if e.is_transient() => break,
                Err(e) => return Err(e),
            }
        }
        Ok(&state.accumulator)
    }

    /// Signal end of input; subsequent retrievals drain buffered packets
    /// and then yield `None`
    pub fn flush(&mut self) -> Result<()> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| Error::invalid_state("encoder pipeline not initialized"))?;
        state.engine.flush()
    }

    /// Tear the session down. Also happens on drop and on re-init.
    pub fn close(&mut self) {
        if self.state.take().is_some() {
            debug!("Encoder pipeline closed");
        }
    }
}

impl Default for EncoderPipeline {
    fn default() -> Self {
        EncoderPipeline::new()
    }
}
