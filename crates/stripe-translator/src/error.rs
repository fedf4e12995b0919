//! Error types for stripe translation

use thiserror::Error;

/// Errors that can occur while translating or reconciling stripe operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StripeError {
    /// A write offset was not aligned to a full stripe line
    #[error("offset {offset} is not aligned to a stripe line of {line_bytes} bytes")]
    InvalidOffset { offset: u64, line_bytes: u64 },

    /// More than `parity_width` operations failed in a single stripe line
    #[error("line {line} lost {failed} operations, more than parity_width ({parity_width}) can tolerate")]
    TooManyFailures {
        line: usize,
        failed: usize,
        parity_width: u32,
    },

    /// A `StripePolicy` was constructed with an inconsistent combination of fields
    #[error("invalid stripe policy: {0}")]
    InvalidPolicy(String),
}

/// Result type alias for stripe translation operations
pub type Result<T> = std::result::Result<T, StripeError>;
