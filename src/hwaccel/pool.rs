//! Reusable frame pool for hardware sessions
//!
//! Device-backed pipelines cycle frames at frame rate; the pool keeps a
//! bounded set of released frames so steady-state operation allocates
//! nothing. Frames carry the software-side layout of the session's
//! surfaces, fixed at pool construction.

use crate::codec::VideoFrame;
use crate::error::Result;
use crate::util::PixelFormat;

/// Bounded pool of uniformly laid out frames
pub struct HwFramePool {
    available: Vec<VideoFrame>,
    width: u32,
    height: u32,
    format: PixelFormat,
    capacity: usize,
}

impl HwFramePool {
    /// Create a pool of `capacity` frames laid out for
    /// `width` x `height` in `format`
    pub fn new(width: u32, height: u32, format: PixelFormat, capacity: usize) -> Self {
        HwFramePool {
            available: Vec::with_capacity(capacity),
            width,
            height,
            format,
            capacity,
        }
    }

    /// Take a frame from the pool, allocating a fresh one when empty
    pub fn acquire(&mut self) -> Result<VideoFrame> {
        match self.available.pop() {
            Some(frame) => Ok(frame),
            None => VideoFrame::alloc(self.width, self.height, self.format),
        }
    }

    /// Return a frame to the pool. Frames that no longer match the pool
    /// layout, or that would exceed capacity, are dropped instead.
    pub fn release(&mut self, frame: VideoFrame) {
        if self.available.len() < self.capacity
            && frame.width == self.width
            && frame.height == self.height
            && frame.format == self.format
        {
            self.available.push(frame);
        }
    }

    /// Number of frames currently held
    pub fn available(&self) -> usize {
        self.available.len()
    }

    /// Fill the pool up to `count` frames (bounded by capacity)
    pub fn preallocate(&mut self, count: usize) -> Result<()> {
        let target = count.min(self.capacity);
        while self.available.len() < target {
            let frame = VideoFrame::alloc(self.width, self.height, self.format)?;
            self.available.push(frame);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_release_cycle() {
        let mut pool = HwFramePool::new(64, 48, PixelFormat::YUV420P, 4);
        assert_eq!(pool.available(), 0);

        let frame = pool.acquire().unwrap();
        assert_eq!(frame.width, 64);
        assert_eq!(frame.num_planes(), 3);

        pool.release(frame);
        assert_eq!(pool.available(), 1);

        // reacquire hands back the pooled frame instead of allocating
        let again = pool.acquire().unwrap();
        assert_eq!(pool.available(), 0);
        pool.release(again);
    }

    #[test]
    fn test_release_respects_capacity() {
        let mut pool = HwFramePool::new(16, 16, PixelFormat::NV12, 2);
        pool.preallocate(2).unwrap();
        assert_eq!(pool.available(), 2);

        let extra = VideoFrame::alloc(16, 16, PixelFormat::NV12).unwrap();
        pool.release(extra);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_release_drops_mismatched_layout() {
        let mut pool = HwFramePool::new(16, 16, PixelFormat::NV12, 4);
        let wrong = VideoFrame::alloc(32, 32, PixelFormat::YUV420P).unwrap();
        pool.release(wrong);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_preallocate_bounded_by_capacity() {
        let mut pool = HwFramePool::new(8, 8, PixelFormat::YUV420P, 3);
        pool.preallocate(10).unwrap();
        assert_eq!(pool.available(), 3);
    }
}
