//! Compressed packet data model
//!
//! Submission packets are borrowed views over caller bytes, built per call
//! and never retained. Retrieval goes through a pipeline-owned `PacketBuf`
//! slot that engines rewrite in place; callers see it as an
//! `EncodedPacket` borrow whose drop releases the slot for the next
//! retrieval.

use bytes::BytesMut;

use crate::util::Timestamp;

/// A compressed packet submitted for decoding. Borrows the caller's bytes.
#[derive(Debug, Clone, Copy)]
pub struct PacketRef<'a> {
    /// Packet payload
    pub data: &'a [u8],
    /// Presentation timestamp
    pub pts: Timestamp,
    /// Keyframe flag
    pub keyframe: bool,
}

impl<'a> PacketRef<'a> {
    /// Wrap caller bytes as a submission packet
    pub fn new(data: &'a [u8], pts: Timestamp) -> Self {
        PacketRef {
            data,
            pts,
            keyframe: false,
        }
    }

    /// Set the keyframe flag
    pub fn with_keyframe(mut self, keyframe: bool) -> Self {
        self.keyframe = keyframe;
        self
    }
}

/// Reusable storage an encoder engine writes one packet into.
#[derive(Debug, Default)]
pub struct PacketBuf {
    /// Packet payload
    pub data: BytesMut,
    /// Keyframe flag
    pub keyframe: bool,
}

impl PacketBuf {
    /// Create an empty slot
    pub fn new() -> Self {
        PacketBuf {
            data: BytesMut::new(),
            keyframe: false,
        }
    }

    /// Reset the slot, keeping the allocation
    pub fn clear(&mut self) {
        self.data.clear();
        self.keyframe = false;
    }

    /// Replace the payload
    pub fn set_data(&mut self, data: &[u8]) {
        self.data.clear();
        self.data.extend_from_slice(data);
    }

    /// Payload length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the slot holds no payload
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the slot contents as an encoded packet
    pub fn as_packet(&self) -> EncodedPacket<'_> {
        EncodedPacket {
            data: &self.data,
            keyframe: self.keyframe,
        }
    }
}

/// One encoded packet borrowed from a pipeline's packet slot.
///
/// Valid until dropped; dropping it is the release that lets the next
/// retrieval reuse the slot. `to_vec` is the copy-out.
#[derive(Debug, Clone, Copy)]
pub struct EncodedPacket<'a> {
    /// Packet payload
    pub data: &'a [u8],
    /// Keyframe flag
    pub keyframe: bool,
}

impl<'a> EncodedPacket<'a> {
    /// Payload length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the packet carries no payload
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Copy the payload out into owned storage
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.to_vec()
    }
}
