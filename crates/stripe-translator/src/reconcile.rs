//! Read reconciliation: turn per-object completion status into either the
//! unmodified byte count (fast path) or a reconstructed data object per
//! affected line (XOR of the survivors).

use tracing::{debug, warn};

use crate::error::{Result, StripeError};
use crate::operation::ReadOperation;
use crate::policy::StripePolicy;

/// Reconcile the outcome of the operations produced by
/// [`crate::read::translate_read`].
///
/// `received_bytes` is the dispatcher's own tally of bytes it actually read
/// off the wire. Parity ops are fetched lazily — only once some op in the
/// request has failed — so that tally includes parity bytes precisely when
/// `successful` records at least one failure, and excludes them otherwise.
/// Getting this wrong does not corrupt the fast path (it is a pure subtract)
/// but will desync the tail-truncation math in the reconstruction path.
///
/// `ops` is consumed: every scratch buffer it owns (precursor and parity
/// reads) is freed when this function returns, because the `Vec` and its
/// `OpBuffer::Owned` contents simply go out of scope. Data-op buffers are
/// borrowed from the caller and are untouched by that drop.
pub fn process_reads(
    mut ops: Vec<ReadOperation<'_>>,
    successful: &[bool],
    policy: &StripePolicy,
    received_bytes: u64,
    offset: u64,
) -> Result<usize> {
    assert_eq!(
        ops.len(),
        successful.len(),
        "completion bitmap must have one bit per operation"
    );

    let width = policy.width() as usize;
    let data_width = policy.data_width() as usize;
    let lines = 1 + (ops.len() - 1) / width;
    let tail_start = ops.len() - lines;

    debug!(ops = ops.len(), lines, "reconciling read completion");

    let subtract_extra_reads = |received: u64| -> usize {
        let stripe_size = policy.stripe_size_bytes();
        if offset < stripe_size {
            received as usize
        } else {
            let obj_offset = offset / stripe_size;
            let line_offset = obj_offset % policy.data_width() as u64;
            (received - stripe_size * line_offset) as usize
        }
    };

    if successful[..tail_start].iter().all(|&ok| ok) {
        debug!("all data reads succeeded, nothing to reconstruct");
        return Ok(subtract_extra_reads(received_bytes));
    }

    let mut real_size_of_last_read: i64 = received_bytes as i64;
    let mut received_bytes_adj = received_bytes;

    for line_idx in 0..lines {
        let line_start = line_idx * data_width;
        let line_end = std::cmp::min(line_start + data_width, tail_start);
        let parity_idx = tail_start + line_idx;

        let mut failed_data_idx = None;
        let mut failed_count = 0usize;
        let mut succ_data_indices = Vec::with_capacity(data_width);

        for j in line_start..line_end {
            if successful[j] {
                succ_data_indices.push(j);
                real_size_of_last_read -= ops[j].req_size as i64;
            } else {
                failed_data_idx = Some(j);
                failed_count += 1;
            }
        }
        if !successful[parity_idx] {
            failed_count += 1;
        }
        real_size_of_last_read -= ops[parity_idx].req_size as i64;

        if failed_count >= 2 {
            warn!(line = line_idx, failed_count, "too many failures in line");
            return Err(StripeError::TooManyFailures {
                line: line_idx,
                failed: failed_count,
                parity_width: policy.parity_width(),
            });
        }

        let Some(failed_idx) = failed_data_idx else {
            // All data ops for this line succeeded; the parity bit alone
            // may be clear, but there is nothing to rebuild.
            continue;
        };

        warn!(line = line_idx, object = ops[failed_idx].object_number, "reconstructing line from parity");

        let m = ops[failed_idx].req_size as usize;
        let o = ops[failed_idx].req_offset;
        received_bytes_adj -= o as u64;

        let mut contributors = succ_data_indices;
        contributors.push(parity_idx);
        let n = contributors.len();

        let mut recovered = vec![0u8; m];
        for (ci, &j) in contributors.iter().enumerate() {
            let req_offset_j = ops[j].req_offset;
            // A contributor's own buffer starts at `req_offset_j`, which is
            // only ever nonzero for the very first data op of a read. When
            // that op is the contributor (not the one being recovered), its
            // range can start after `o` — `start`/`skip` split the overlap
            // instead of assuming `req_offset_j <= o`.
            let (start, skip) = if o >= req_offset_j {
                ((o - req_offset_j) as usize, 0usize)
            } else {
                (0usize, (req_offset_j - o) as usize)
            };
            let avail = (ops[j].req_size as usize).saturating_sub(start);
            let mut op_size = std::cmp::min(m.saturating_sub(skip), avail);

            if ci < n - 1 && real_size_of_last_read < 0 {
                let deficit = (-real_size_of_last_read) as usize;
                op_size = op_size.saturating_sub(deficit);
            }

            let src = ops[j].data.as_slice();
            for k in 0..op_size {
                recovered[skip + k] ^= src[k + start];
            }
        }

        ops[failed_idx].data.as_mut_slice()[..m].copy_from_slice(&recovered);
    }

    Ok(subtract_extra_reads(received_bytes_adj))
}
