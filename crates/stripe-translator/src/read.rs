//! Read translation: turn a requested byte range into per-object reads,
//! including whatever precursor and parity reads reconstruction might need.

use tracing::debug;

use crate::operation::ReadOperation;
use crate::policy::StripePolicy;

/// Translate a read request into data, precursor and parity operations.
///
/// Returns the operation list together with the count of non-parity
/// (precursor + data) operations at the front of the list — the
/// `user_visible_op_count` the caller uses to size its own bookkeeping.
/// Parity operations always sit at the tail, one per line, matching the
/// layout [`crate::reconcile::process_reads`] assumes.
pub fn translate_read<'a>(
    buf: &'a mut [u8],
    size: usize,
    offset: u64,
    policy: &StripePolicy,
) -> (Vec<ReadOperation<'a>>, usize) {
    let stripe_size = policy.stripe_size_bytes();
    let data_width = policy.data_width() as u64;
    let parity_osd = data_width as u32;

    let obj_offset = offset / stripe_size;
    let mut line = obj_offset / data_width;
    let mut idx_in_line = (obj_offset % data_width) as u32;
    let intra_offset = (offset % stripe_size) as u32;

    debug!(
        offset,
        size, line, idx_in_line, "translating read into per-object operations"
    );

    let mut ops: Vec<ReadOperation<'a>> = Vec::new();

    // Front-pad precursor reads: earlier data objects of the first line,
    // fetched purely so reconstruction has them if the line later needs it.
    for i in 0..idx_in_line {
        let logical_obj = line * data_width + i as u64;
        let osd = policy.osd_index(policy.real_object_number(logical_obj));
        ops.push(ReadOperation::precursor_scratch(logical_obj, osd, stripe_size));
    }
    let user_visible_op_count_base = ops.len();

    let mut parity_ops: Vec<ReadOperation<'a>> = Vec::new();
    let mut data_op_count = 0usize;
    let mut rest = buf;
    let mut cursor = 0usize;
    let mut first_data_op = true;

    while cursor < size {
        let line_base = line * data_width;
        let mut line_data_ops = 0u32;
        let mut last_req_size = 0u32;

        while idx_in_line < data_width as u32 && cursor < size {
            let logical_obj = line_base + idx_in_line as u64;
            let osd = policy.osd_index(policy.real_object_number(logical_obj));
            let req_offset = if first_data_op { intra_offset } else { 0 };
            let remaining_in_object = stripe_size - req_offset as u64;
            let req_size = std::cmp::min((size - cursor) as u64, remaining_in_object) as usize;

            let (chunk, tail) = rest.split_at_mut(req_size);
            rest = tail;
            ops.push(ReadOperation::data_into(logical_obj, osd, req_offset, chunk));

            cursor += req_size;
            first_data_op = false;
            idx_in_line += 1;
            line_data_ops += 1;
            last_req_size = req_size as u32;
            data_op_count += 1;
        }

        let parity_req_size = if line_data_ops == 1 {
            last_req_size
        } else {
            stripe_size as u32
        };
        let scratch_len = parity_req_size as u64;
        parity_ops.push(ReadOperation::parity_scratch(
            line_base,
            parity_osd,
            parity_req_size,
            scratch_len,
        ));

        line += 1;
        idx_in_line = 0;
    }

    ops.append(&mut parity_ops);

    (ops, user_visible_op_count_base + data_op_count)
}
