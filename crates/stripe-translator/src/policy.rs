//! Stripe policy: the immutable geometry shared by the write translator,
//! the read translator and the reconciler.

use crate::error::{Result, StripeError};

/// Describes how a file is fragmented across a group of OSDs.
///
/// A line is `width` sequential objects wide, of which the first
/// `data_width` hold user data and the trailing `parity_width` hold XOR
/// parity. `StripePolicy` only captures the geometry; it owns no OSD
/// addresses and no connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripePolicy {
    stripe_size_bytes: u64,
    width: u32,
    parity_width: u32,
}

impl StripePolicy {
    /// Build a policy, validating the invariants every translator relies on.
    ///
    /// `stripe_size_bytes` must be a positive multiple of 1024, `width` must
    /// be at least 2, and `parity_width` must be strictly less than `width`.
    pub fn new(stripe_size_bytes: u64, width: u32, parity_width: u32) -> Result<Self> {
        if stripe_size_bytes == 0 || stripe_size_bytes % 1024 != 0 {
            return Err(StripeError::InvalidPolicy(format!(
                "stripe_size_bytes ({stripe_size_bytes}) must be a positive multiple of 1024"
            )));
        }
        if width < 2 {
            return Err(StripeError::InvalidPolicy(format!(
                "width ({width}) must be at least 2"
            )));
        }
        if parity_width == 0 || parity_width >= width {
            return Err(StripeError::InvalidPolicy(format!(
                "parity_width ({parity_width}) must be in [1, width-1], width={width}"
            )));
        }
        Ok(Self {
            stripe_size_bytes,
            width,
            parity_width,
        })
    }

    #[inline]
    pub fn stripe_size_bytes(&self) -> u64 {
        self.stripe_size_bytes
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn parity_width(&self) -> u32 {
        self.parity_width
    }

    /// Number of data objects per line: `width - parity_width`.
    #[inline]
    pub fn data_width(&self) -> u32 {
        self.width - self.parity_width
    }

    /// Number of bytes spanned by a full stripe line (data objects only).
    #[inline]
    pub fn line_bytes(&self) -> u64 {
        self.stripe_size_bytes * self.data_width() as u64
    }

    /// The OSD index a physical object number lands on.
    #[inline]
    pub fn osd_index(&self, real_object_number: u64) -> u32 {
        (real_object_number % self.width as u64) as u32
    }

    /// Physical (all-slots) object number for logical data object `n`.
    #[inline]
    pub fn real_object_number(&self, logical_data_object: u64) -> u64 {
        let data_width = self.data_width() as u64;
        logical_data_object + (logical_data_object / data_width) * self.parity_width as u64
    }

    /// Index of the line that logical data object `n` belongs to.
    #[inline]
    pub fn line_of_object(&self, logical_data_object: u64) -> u64 {
        logical_data_object / self.data_width() as u64
    }

    /// Within-line index (0..data_width) of logical data object `n`.
    #[inline]
    pub fn index_in_line(&self, logical_data_object: u64) -> u32 {
        (logical_data_object % self.data_width() as u64) as u32
    }

    /// First logical data object of the line that `logical_data_object` is in.
    #[inline]
    pub fn line_base_object(&self, logical_data_object: u64) -> u64 {
        logical_data_object - self.index_in_line(logical_data_object) as u64
    }
}
