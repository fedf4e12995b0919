//! Write translation: turn a contiguous user buffer into per-object writes,
//! synthesizing XOR parity for every stripe line the write touches.

use tracing::debug;

use crate::error::{Result, StripeError};
use crate::operation::WriteOperation;
use crate::policy::StripePolicy;

/// Translate a stripe-line-aligned write into data and parity operations.
///
/// `offset` must be a multiple of `policy.line_bytes()`; unaligned offsets
/// fail with [`StripeError::InvalidOffset`]. The caller is expected to
/// quantize writes to line boundaries (see `SPEC_FULL.md` §9 for the
/// known read-modify-write gap this leaves).
pub fn translate_write<'a>(
    buf: &'a [u8],
    size: usize,
    offset: u64,
    policy: &StripePolicy,
) -> Result<Vec<WriteOperation<'a>>> {
    if size == 0 {
        return Ok(Vec::new());
    }

    let line_bytes = policy.line_bytes();
    if offset % line_bytes != 0 {
        return Err(StripeError::InvalidOffset { offset, line_bytes });
    }

    let stripe_size = policy.stripe_size_bytes() as usize;
    let data_width = policy.data_width() as u64;
    let parity_osd = data_width as u32;

    let mut line = offset / line_bytes;
    let mut cursor = 0usize;
    let mut ops = Vec::new();

    debug!(
        offset,
        size, line_bytes, "translating write into per-object operations"
    );

    while cursor < size {
        let line_base = line * data_width;
        let data_start_idx = ops.len();

        for idx_in_line in 0..data_width {
            if cursor >= size {
                break;
            }
            let logical_obj = line_base + idx_in_line;
            let osd = policy.osd_index(policy.real_object_number(logical_obj));
            let req_size = std::cmp::min(size - cursor, stripe_size);
            ops.push(WriteOperation::data_op(
                logical_obj,
                osd,
                0,
                &buf[cursor..cursor + req_size],
            ));
            cursor += req_size;
        }

        let data_ops = &ops[data_start_idx..];
        let parity = if data_ops.len() == 1 {
            // Single object written in this line: parity is just a copy,
            // sized to that object's own extent (the XOR of one operand is
            // that operand).
            let only = &data_ops[0];
            (only.data.as_slice().to_vec().into_boxed_slice(), only.req_size)
        } else {
            let mut parity = vec![0u8; stripe_size];
            for op in data_ops {
                for (p, b) in parity.iter_mut().zip(op.data.as_slice()) {
                    *p ^= *b;
                }
            }
            (parity.into_boxed_slice(), stripe_size as u32)
        };

        ops.push(WriteOperation::parity_op(
            line_base,
            parity_osd,
            parity.1,
            parity.0,
        ));

        line += 1;
    }

    Ok(ops)
}
