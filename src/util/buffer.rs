//! Buffer management for frame planes and packet payloads

use bytes::BytesMut;

/// A mutable byte buffer backing one frame plane or one packet slot.
///
/// Pipelines keep these alive across calls and rewrite them in place, so
/// retrieval paths can hand out borrows without reallocating per frame.
/// `Clone` performs a deep copy and is the sanctioned way to take an owned
/// snapshot of borrowed output.
#[derive(Debug, Clone, Default)]
pub struct PlaneBuf {
    data: BytesMut,
}

impl PlaneBuf {
    /// Create an empty buffer
    pub fn new() -> Self {
        PlaneBuf {
            data: BytesMut::new(),
        }
    }

    /// Create a buffer with reserved capacity
    pub fn with_capacity(capacity: usize) -> Self {
        PlaneBuf {
            data: BytesMut::with_capacity(capacity),
        }
    }

    /// Create a buffer holding `len` zero bytes
    pub fn zeroed(len: usize) -> Self {
        PlaneBuf {
            data: BytesMut::zeroed(len),
        }
    }

    /// Create a buffer from a vector
    pub fn from_vec(vec: Vec<u8>) -> Self {
        PlaneBuf {
            data: BytesMut::from(&vec[..]),
        }
    }

    /// Get the length of the buffer
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Resize to `len` bytes, zero-filling any growth
    pub fn resize_zeroed(&mut self, len: usize) {
        self.data.resize(len, 0);
    }

    /// Clear the contents, keeping the allocation
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Append data
    pub fn extend_from_slice(&mut self, slice: &[u8]) {
        self.data.extend_from_slice(slice);
    }

    /// Replace the contents with `slice`
    pub fn copy_from_slice(&mut self, slice: &[u8]) {
        self.data.clear();
        self.data.extend_from_slice(slice);
    }

    /// Get immutable access to the buffer
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get mutable access to the buffer
    pub fn as_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl AsRef<[u8]> for PlaneBuf {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_and_resize() {
        let mut buf = PlaneBuf::zeroed(4);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.as_slice(), &[0, 0, 0, 0]);

        buf.as_mut()[1] = 7;
        buf.resize_zeroed(6);
        assert_eq!(buf.as_slice(), &[0, 7, 0, 0, 0, 0]);

        buf.resize_zeroed(2);
        assert_eq!(buf.as_slice(), &[0, 7]);
    }

    #[test]
    fn test_copy_from_slice_reuses() {
        let mut buf = PlaneBuf::with_capacity(16);
        buf.copy_from_slice(&[1, 2, 3]);
        assert_eq!(buf.as_slice(), &[1, 2, 3]);
        buf.copy_from_slice(&[9]);
        assert_eq!(buf.as_slice(), &[9]);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut a = PlaneBuf::from_vec(vec![1, 2, 3]);
        let b = a.clone();
        a.as_mut()[0] = 42;
        assert_eq!(b.as_slice(), &[1, 2, 3]);
    }
}
