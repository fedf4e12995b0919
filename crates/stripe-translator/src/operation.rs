//! Per-object operations emitted by the translators.
//!
//! These mirror the shape of `osdclient::OSDOp` (an opcode plus an extent
//! plus a payload) but are specialised to the one thing this crate does:
//! ship or receive a contiguous byte range of a single object on a single
//! OSD, as part of a stripe line.

use crate::buffer::OpBuffer;

/// A single per-object write, either carrying user data or synthesized
/// parity.
#[derive(Debug)]
pub struct WriteOperation<'a> {
    /// Logical object number. For parity operations this is the first
    /// (base) data object number of the line — matching the original
    /// translator's actual placement arithmetic even where its prose
    /// describes it differently (see `SPEC_FULL.md` §4.1).
    pub object_number: u64,
    /// The OSD this operation targets, as a singleton list to match the
    /// source's `osd_offsets` shape (kept as a `Vec` so a dispatcher can
    /// treat write and read operations uniformly).
    pub osd_offsets: Vec<u32>,
    /// Byte extent inside the object.
    pub req_size: u32,
    pub req_offset: u32,
    /// User bytes or synthesized parity.
    pub data: OpBuffer<'a>,
    /// True for the parity operation of a line.
    pub is_parity: bool,
}

impl<'a> WriteOperation<'a> {
    pub fn data_op(object_number: u64, osd: u32, req_offset: u32, data: &'a [u8]) -> Self {
        Self {
            object_number,
            osd_offsets: vec![osd],
            req_size: data.len() as u32,
            req_offset,
            data: OpBuffer::Borrowed(data),
            is_parity: false,
        }
    }

    pub fn parity_op(object_number: u64, osd: u32, req_size: u32, data: Box<[u8]>) -> Self {
        Self {
            object_number,
            osd_offsets: vec![osd],
            req_size,
            req_offset: 0,
            data: OpBuffer::Owned(data),
            is_parity: true,
        }
    }
}

/// A single per-object read, destined either for the caller's buffer
/// (data) or for reconciler-owned scratch space (precursor / parity).
#[derive(Debug)]
pub struct ReadOperation<'a> {
    pub object_number: u64,
    pub osd_offsets: Vec<u32>,
    pub req_size: u32,
    pub req_offset: u32,
    pub data: OpBuffer<'a>,
    /// True for the parity operation of a line.
    pub is_parity: bool,
    /// True for a precursor read: a data object preceding the requested
    /// range that is only fetched so reconstruction has it available.
    pub is_precursor: bool,
}

impl<'a> ReadOperation<'a> {
    pub fn data_into(
        object_number: u64,
        osd: u32,
        req_offset: u32,
        dest: &'a mut [u8],
    ) -> Self {
        Self {
            object_number,
            osd_offsets: vec![osd],
            req_size: dest.len() as u32,
            req_offset,
            data: OpBuffer::BorrowedMut(dest),
            is_parity: false,
            is_precursor: false,
        }
    }

    pub fn precursor_scratch(object_number: u64, osd: u32, stripe_size: u64) -> Self {
        Self {
            object_number,
            osd_offsets: vec![osd],
            req_size: stripe_size as u32,
            req_offset: 0,
            data: OpBuffer::owned_zeroed(stripe_size as usize),
            is_parity: false,
            is_precursor: true,
        }
    }

    pub fn parity_scratch(object_number: u64, osd: u32, req_size: u32, scratch_len: u64) -> Self {
        Self {
            object_number,
            osd_offsets: vec![osd],
            req_size,
            req_offset: 0,
            data: OpBuffer::owned_zeroed(scratch_len as usize),
            is_parity: true,
            is_precursor: false,
        }
    }
}
