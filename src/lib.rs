//! vidpipe - hardware-aware video pipeline library
//!
//! vidpipe turns elementary video streams into frames and frames into
//! streams, normalizing everything that leaves a pipeline to planar 8-bit
//! YUV 4:2:0. Hardware acceleration is selected at initialization and
//! silently degrades to software.
//!
//! # Architecture
//!
//! - `codec`: codec identifiers, frame/packet data model, engine traits
//!   and the H.264 NAL bitstream scanner
//! - `hwaccel`: acceleration backend selection, device plumbing and the
//!   device frame pool
//! - `swscale`: pixel format conversion to the canonical layout
//! - `pipeline`: decode, encode and transcode pipelines
//! - `util`: common utilities (pixel formats, buffers, timestamps)

pub mod codec;
pub mod error;
pub mod hwaccel;
pub mod pipeline;
pub mod swscale;
pub mod util;

pub use error::{Error, Result};

/// vidpipe version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 1;
pub const VERSION_PATCH: u32 = 0;

/// Configuration for the vidpipe library
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of threads to use for parallel processing
    pub max_threads: Option<usize>,
    /// Enable verbose logging
    pub verbose: bool,
    /// Enable debug output
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_threads: None,
            verbose: false,
            debug: false,
        }
    }
}

/// Initialize the vidpipe library with the given configuration.
///
/// Sizes the global rayon pool when `max_threads` is set and installs a
/// tracing subscriber when logging is requested. Library code never
/// installs a subscriber on its own, so embedders with their own logging
/// setup simply skip this.
pub fn init(config: Config) -> Result<()> {
    if let Some(threads) = config.max_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(|e| Error::init(format!("Failed to initialize thread pool: {}", e)))?;
    }

    if config.verbose || config.debug {
        let level = if config.debug { "debug" } else { "info" };
        tracing_subscriber::fmt()
            .with_env_filter(level)
            .try_init()
            .map_err(|e| Error::init(format!("Failed to install tracing subscriber: {}", e)))?;
    }

    Ok(())
}
