//! NAL (Network Abstraction Layer) unit scanning for H.264/AVC
//!
//! Works directly on Annex B byte streams: start codes (`00 00 01`, or
//! `00 00 00 01` with a leading zero) delimit NAL units. The scanner finds
//! start codes a machine word at a time; the iterator built on it walks a
//! buffer yielding borrowed unit views without copying.
//!
//! ## NAL header
//!
//! The first byte after a start code:
//!
//! ```text
//! |0|1 2|3 4 5 6 7|
//! |F|NRI|Type     |
//! ```
//!
//! - `F`: forbidden_zero_bit, zero in valid streams
//! - `NRI`: nal_ref_idc, the reference importance indicator
//! - `Type`: nal_unit_type, five bits
//!
//! Common types: non-IDR slice 1, IDR slice 5 (keyframe), SEI 6, SPS 7,
//! PPS 8, access unit delimiter 9. An I slice is not necessarily an IDR;
//! only type 5 is a refresh point.

/// Non-IDR coded slice (P/B frame, or an I frame that is not a refresh point)
pub const NAL_TYPE_SLICE: u8 = 1;
/// IDR coded slice (keyframe)
pub const NAL_TYPE_IDR: u8 = 5;
/// Supplemental enhancement information
pub const NAL_TYPE_SEI: u8 = 6;
/// Sequence parameter set
pub const NAL_TYPE_SPS: u8 = 7;
/// Picture parameter set
pub const NAL_TYPE_PPS: u8 = 8;
/// Access unit delimiter
pub const NAL_TYPE_AUD: u8 = 9;

/// Find the first Annex B start code in `data`.
///
/// Returns the index of the `00 00 01` sequence, stepping back one byte
/// when the preceding byte is zero so the 4-byte form reports its leading
/// zero. Returns `data.len()` when no start code is present; buffers
/// shorter than 4 bytes always report not-found. A found position is
/// always followed by at least one byte beyond the 3-byte code, so the
/// NAL header behind it is in bounds.
pub fn find_start_code(data: &[u8]) -> usize {
    let pos = find_start_code_inner(data);
    if pos > 0 && pos < data.len() && data[pos - 1] == 0 {
        pos - 1
    } else {
        pos
    }
}

/// `00 00 01` search: unaligned prefix, then four candidate offsets per
/// 32-bit word, then a byte suffix. The word test
/// `(w - 0x01010101) & !w & 0x80808080` is nonzero iff some byte of `w`
/// is zero; the explicit lane checks then locate the match, including the
/// two candidates straddling into the next word.
fn find_start_code_inner(data: &[u8]) -> usize {
    let len = data.len();
    if len < 4 {
        return len;
    }
    // last index a code may start at and still leave a byte after itself
    let limit = len - 3;

    let mut i = 0;
    let align = data.as_ptr().align_offset(4).min(limit);
    while i < align {
        if data[i] == 0 && data[i + 1] == 0 && data[i + 2] == 1 {
            return i;
        }
        i += 1;
    }

    // the straddling lanes read up to i + 5, hence the 6-byte margin
    let body_end = len.saturating_sub(6);
    while i < body_end {
        let word = u32::from_ne_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);
        if word.wrapping_sub(0x0101_0101) & !word & 0x8080_8080 != 0 {
            if data[i + 1] == 0 {
                if data[i] == 0 && data[i + 2] == 1 {
                    return i;
                }
                if data[i + 2] == 0 && data[i + 3] == 1 {
                    return i + 1;
                }
            }
            if data[i + 3] == 0 {
                if data[i + 2] == 0 && data[i + 4] == 1 {
                    return i + 2;
                }
                if data[i + 4] == 0 && data[i + 5] == 1 {
                    return i + 3;
                }
            }
        }
        i += 4;
    }

    while i < limit {
        if data[i] == 0 && data[i + 1] == 0 && data[i + 2] == 1 {
            return i;
        }
        i += 1;
    }

    len
}

/// A NAL unit located in a caller's buffer.
///
/// `data` spans the header byte up to the next start code (its leading
/// zero) or the end of the buffer; the start code itself is excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalUnit<'a> {
    /// Index of the header byte in the scanned buffer
    pub offset: usize,
    /// Header byte through the last byte before the next start code
    pub data: &'a [u8],
    /// nal_unit_type, five bits
    pub nal_type: u8,
    /// nal_ref_idc, two bits
    pub nal_ref_idc: u8,
}

impl<'a> NalUnit<'a> {
    /// Check if this is a coded slice (type 1 or 5)
    pub fn is_slice(&self) -> bool {
        self.nal_type == NAL_TYPE_SLICE || self.nal_type == NAL_TYPE_IDR
    }

    /// Check if this is an IDR slice (keyframe)
    pub fn is_idr(&self) -> bool {
        self.nal_type == NAL_TYPE_IDR
    }

    /// Check if this is a parameter set (SPS or PPS)
    pub fn is_parameter_set(&self) -> bool {
        self.nal_type == NAL_TYPE_SPS || self.nal_type == NAL_TYPE_PPS
    }

    /// End index (exclusive) of this unit in the scanned buffer
    pub fn end(&self) -> usize {
        self.offset + self.data.len()
    }
}

/// Lazy walk over the NAL units of an Annex B buffer.
///
/// Zero bytes between a start code and the header (4-byte codes, padding
/// runs) are consumed and never yielded as units. A start code with no
/// byte after it terminates the walk without yielding.
#[derive(Debug, Clone)]
pub struct NalUnitIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> NalUnitIter<'a> {
    /// Start a walk over `data`
    pub fn new(data: &'a [u8]) -> Self {
        NalUnitIter {
            data,
            pos: find_start_code(data),
        }
    }
}

impl<'a> Iterator for NalUnitIter<'a> {
    type Item = NalUnit<'a>;

    fn next(&mut self) -> Option<NalUnit<'a>> {
        let len = self.data.len();

        // consume the zero run and the terminating 01 of the start code
        while self.pos < len {
            let b = self.data[self.pos];
            self.pos += 1;
            if b != 0 {
                break;
            }
        }
        if self.pos >= len {
            return None;
        }

        let offset = self.pos;
        let header = self.data[offset];
        let end = offset + find_start_code(&self.data[offset..]);
        self.pos = end;

        Some(NalUnit {
            offset,
            data: &self.data[offset..end],
            nal_type: header & 0x1F,
            nal_ref_idc: (header >> 5) & 0x03,
        })
    }
}

/// Decide whether a buffer starts a keyframe.
///
/// The first coded slice unit (type 1 or 5) settles the answer; parameter
/// sets and SEI before it are stepped over. Used on the submission hot
/// path, so it returns without locating the deciding unit's end.
pub fn is_key_frame(data: &[u8]) -> bool {
    let len = data.len();
    let mut pos = find_start_code(data);

    loop {
        while pos < len {
            let b = data[pos];
            pos += 1;
            if b != 0 {
                break;
            }
        }
        if pos >= len {
            return false;
        }

        let ty = data[pos] & 0x1F;
        if ty == NAL_TYPE_IDR || ty == NAL_TYPE_SLICE {
            return ty == NAL_TYPE_IDR;
        }
        pos += find_start_code(&data[pos..]);
    }
}

/// Count IDR slice units in a buffer (full scan)
pub fn count_key_frames(data: &[u8]) -> usize {
    NalUnitIter::new(data).filter(|u| u.is_idr()).count()
}

/// Count NAL units of any type in a buffer (full scan)
pub fn count_frames(data: &[u8]) -> usize {
    NalUnitIter::new(data).count()
}
