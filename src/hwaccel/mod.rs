//! Hardware acceleration selection and device plumbing
//!
//! Pipelines in this crate never talk to GPU APIs themselves. A codec
//! engine declares which acceleration backends it can decode or encode
//! through ([`HwConfig`]); the [`HwDeviceSelector`] walks a priority list,
//! asks a [`HwDeviceFactory`] for a device context for the first declared
//! backend it can bring up, and hands the pipeline an [`HwSession`]. When
//! no backend comes up, pipelines run software-only and report it through
//! `hardware_available()` rather than failing.
//!
//! The negotiated surface format travels inside the session and is passed
//! to the engine as an explicit open parameter ([`HwFormatBinding`]). Two
//! pipeline instances can hold different bindings at the same time.
//!
//! Real device contexts (D3D11, CUDA, VA-API and friends) are the
//! embedder's business: implement [`HwDevice`] and [`HwDeviceFactory`] and
//! inject the factory at pipeline construction. The built-in
//! [`PlatformDeviceFactory`] ships with no platform drivers and turns
//! every request down.

pub mod pool;

pub use pool::HwFramePool;

use tracing::{debug, info};

use crate::codec::{FrameView, VideoFrame};
use crate::error::Result;
use crate::util::PixelFormat;

/// Hardware acceleration backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum HwAccelType {
    /// Direct3D 11 Video Acceleration (Windows)
    D3D11VA,
    /// NVIDIA CUDA
    CUDA,
    /// Video Decode and Presentation API for Unix
    VDPAU,
    /// Video Acceleration API (Linux)
    VAAPI,
    /// DirectX Video Acceleration 2
    DXVA2,
    /// Intel Quick Sync Video
    QSV,
    /// Apple VideoToolbox
    VideoToolbox,
    /// Vulkan Video
    Vulkan,
}

impl HwAccelType {
    /// Get a human-readable name for this backend
    pub fn name(&self) -> &'static str {
        match self {
            HwAccelType::D3D11VA => "D3D11VA",
            HwAccelType::CUDA => "CUDA",
            HwAccelType::VDPAU => "VDPAU",
            HwAccelType::VAAPI => "VA-API",
            HwAccelType::DXVA2 => "DXVA2",
            HwAccelType::QSV => "Intel Quick Sync",
            HwAccelType::VideoToolbox => "Apple VideoToolbox",
            HwAccelType::Vulkan => "Vulkan Video",
        }
    }
}

impl std::fmt::Display for HwAccelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Backend trial order used when a pipeline config does not override it
pub const DEFAULT_PRIORITY: [HwAccelType; 8] = [
    HwAccelType::D3D11VA,
    HwAccelType::CUDA,
    HwAccelType::VDPAU,
    HwAccelType::VAAPI,
    HwAccelType::DXVA2,
    HwAccelType::QSV,
    HwAccelType::VideoToolbox,
    HwAccelType::Vulkan,
];

/// Surface formats device memory is exposed in.
///
/// Every variant maps to a software layout the pixel normalizer can take
/// to the canonical format, so a downloaded frame is always convertible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HwPixelFormat {
    /// Y plane + interleaved UV, the usual 8-bit download layout
    NV12,
    /// 10-bit NV12-style layout
    P010,
    /// Planar 4:2:0, surfaces that match the canonical format directly
    YUV420P,
    /// Packed BGRA surfaces
    BGRA,
    /// Packed RGBA surfaces
    RGBA,
}

impl HwPixelFormat {
    /// The software pixel layout a download of this surface format
    /// arrives in
    pub fn to_pixel_format(&self) -> PixelFormat {
        match self {
            HwPixelFormat::NV12 => PixelFormat::NV12,
            HwPixelFormat::P010 => PixelFormat::YUV420P10LE,
            HwPixelFormat::YUV420P => PixelFormat::YUV420P,
            HwPixelFormat::BGRA => PixelFormat::BGRA,
            HwPixelFormat::RGBA => PixelFormat::RGBA,
        }
    }
}

impl std::fmt::Display for HwPixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HwPixelFormat::NV12 => "NV12",
            HwPixelFormat::P010 => "P010",
            HwPixelFormat::YUV420P => "YUV420P",
            HwPixelFormat::BGRA => "BGRA",
            HwPixelFormat::RGBA => "RGBA",
        };
        write!(f, "{}", name)
    }
}

/// One (backend, surface format) pair a codec engine declares support for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwConfig {
    /// Acceleration backend
    pub backend: HwAccelType,
    /// Surface format the engine produces or consumes on that backend
    pub format: HwPixelFormat,
}

/// The negotiated (backend, surface format) pair one pipeline instance
/// opened its engine with. Travels in the open parameters; never shared
/// between instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwFormatBinding {
    /// Selected backend
    pub backend: HwAccelType,
    /// Bound surface format
    pub format: HwPixelFormat,
}

/// A hardware device context owned by one pipeline.
///
/// `upload` moves caller planes into a device frame; `download` moves a
/// device frame into host memory in the session's surface layout. Both
/// reuse the destination frame's storage where the layout allows.
pub trait HwDevice {
    /// Backend this device belongs to
    fn backend(&self) -> HwAccelType;

    /// Copy a raw frame into device memory
    fn upload(&mut self, src: &FrameView<'_>, dst: &mut VideoFrame) -> Result<()>;

    /// Copy a device frame into host memory
    fn download(&mut self, src: &VideoFrame, dst: &mut VideoFrame) -> Result<()>;
}

/// Creates device contexts for acceleration backends.
///
/// Pipelines take the factory at construction, so embedders with real
/// device support swap it without touching pipeline code.
pub trait HwDeviceFactory {
    /// Bring up a device context for `backend`
    fn create(&self, backend: HwAccelType) -> Result<Box<dyn HwDevice>>;
}

/// The stock factory. No platform driver is compiled into this crate, so
/// every request fails and pipelines built with it run software-only.
#[derive(Debug, Default)]
pub struct PlatformDeviceFactory;

impl PlatformDeviceFactory {
    /// Create the stock factory
    pub fn new() -> Self {
        PlatformDeviceFactory
    }
}

impl HwDeviceFactory for PlatformDeviceFactory {
    fn create(&self, backend: HwAccelType) -> Result<Box<dyn HwDevice>> {
        Err(crate::error::Error::unsupported(format!(
            "no {} device driver compiled into this build",
            backend
        )))
    }
}

/// An established hardware session: the device context plus the surface
/// format negotiated for it. At most one per pipeline instance; dropped on
/// teardown or re-init.
pub struct HwSession {
    /// Device context
    pub device: Box<dyn HwDevice>,
    /// Negotiated surface format
    pub format: HwPixelFormat,
}

impl HwSession {
    /// The binding handed to the engine's open parameters
    pub fn binding(&self) -> HwFormatBinding {
        HwFormatBinding {
            backend: self.device.backend(),
            format: self.format,
        }
    }
}

impl std::fmt::Debug for HwSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HwSession")
            .field("backend", &self.device.backend())
            .field("format", &self.format)
            .finish()
    }
}

/// Walks a backend priority list against a codec engine's declared
/// configurations and brings up the first device that works.
pub struct HwDeviceSelector {
    priorities: Vec<HwAccelType>,
    factory: Box<dyn HwDeviceFactory>,
}

impl HwDeviceSelector {
    /// Build a selector over `priorities`, served by `factory`
    pub fn new(priorities: Vec<HwAccelType>, factory: Box<dyn HwDeviceFactory>) -> Self {
        HwDeviceSelector {
            priorities,
            factory,
        }
    }

    /// Selector with the default priority order and the stock factory
    pub fn with_defaults() -> Self {
        HwDeviceSelector::new(DEFAULT_PRIORITY.to_vec(), Box::new(PlatformDeviceFactory))
    }

    /// Try each backend in priority order against the engine's declared
    /// configurations. First device the factory brings up wins; when none
    /// does, the caller runs software-only. Runs once per pipeline init,
    /// never mid-stream.
    pub fn select(&self, configs: &[HwConfig]) -> Option<HwSession> {
        for backend in &self.priorities {
            let config = match configs.iter().find(|c| c.backend == *backend) {
                Some(config) => config,
                None => continue,
            };
            match self.factory.create(*backend) {
                Ok(device) => {
                    info!(
                        "Selected {} hardware acceleration with {} surfaces",
                        backend, config.format
                    );
                    return Some(HwSession {
                        device,
                        format: config.format,
                    });
                }
                Err(e) => {
                    debug!("Hardware backend {} unavailable: {}", backend, e);
                }
            }
        }
        None
    }
}
