//! Property-based tests for the quantified invariants.

use std::collections::HashMap;

use proptest::prelude::*;
use stripe_translator::{process_reads, translate_read, translate_write, ReadOperation, StripePolicy, WriteOperation};

const STRIPE_SIZE: u64 = 1024;

fn policy_strategy() -> impl Strategy<Value = StripePolicy> {
    (2u32..=5).prop_map(|width| StripePolicy::new(STRIPE_SIZE, width, 1).unwrap())
}

/// A write offset aligned to the policy's line size, plus a buffer spanning
/// up to a few lines (with a partial tail so edge cases show up often).
fn aligned_write_strategy(policy: StripePolicy) -> impl Strategy<Value = (u64, Vec<u8>)> {
    let line_bytes = policy.line_bytes();
    (0u64..3, 1usize..(3 * line_bytes as usize))
        .prop_map(move |(line, len)| (line * line_bytes, pattern(len)))
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

fn xor_into(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d ^= s;
    }
}

/// Stores every write op into an in-memory object table keyed by
/// (osd, object_number), and fills read ops back out of it.
struct FakeOsds {
    objects: HashMap<(u32, u64), Vec<u8>>,
}

impl FakeOsds {
    fn new() -> Self {
        Self {
            objects: HashMap::new(),
        }
    }

    fn store(&mut self, ops: &[WriteOperation]) {
        for op in ops {
            let key = (op.osd_offsets[0], op.object_number);
            let needed = op.req_offset as usize + op.req_size as usize;
            let obj = self.objects.entry(key).or_default();
            if obj.len() < needed {
                obj.resize(needed, 0);
            }
            obj[op.req_offset as usize..needed].copy_from_slice(op.data.as_slice());
        }
    }

    fn fill(&self, ops: &mut [ReadOperation], fail: &[usize]) -> Vec<bool> {
        let mut successful = vec![true; ops.len()];
        for (i, op) in ops.iter_mut().enumerate() {
            if fail.contains(&i) {
                successful[i] = false;
                continue;
            }
            let key = (op.osd_offsets[0], op.object_number);
            if let Some(obj) = self.objects.get(&key) {
                let start = op.req_offset as usize;
                let end = start + op.req_size as usize;
                let len = op.data.as_mut_slice().len().min(obj.len().saturating_sub(start));
                let len = len.min(end - start);
                op.data.as_mut_slice()[..len].copy_from_slice(&obj[start..start + len]);
            }
        }
        successful
    }
}

fn received_bytes(ops: &[ReadOperation], successful: &[bool], tail_start: usize) -> u64 {
    let any_failure = successful.iter().any(|&ok| !ok);
    ops.iter()
        .enumerate()
        .filter(|(i, _)| successful[*i] && (any_failure || *i < tail_start))
        .map(|(_, op)| op.req_size as u64)
        .sum()
}

proptest! {
    /// I3: concatenating the data ops of a write reproduces the input exactly.
    #[test]
    fn data_reproduction((policy, (offset, buf)) in policy_strategy().prop_flat_map(|p| (Just(p), aligned_write_strategy(p)))) {
        let ops = translate_write(&buf, buf.len(), offset, &policy).unwrap();
        let recombined: Vec<u8> = ops.iter().filter(|op| !op.is_parity).flat_map(|op| op.data.as_slice().to_vec()).collect();
        prop_assert_eq!(recombined, buf);
    }

    /// I2: the XOR of a line's data buffers (zero-padded) equals its parity buffer.
    #[test]
    fn xor_parity_invariant((policy, (offset, buf)) in policy_strategy().prop_flat_map(|p| (Just(p), aligned_write_strategy(p)))) {
        let ops = translate_write(&buf, buf.len(), offset, &policy).unwrap();
        let mut idx = 0;
        while idx < ops.len() {
            let line_start = idx;
            while !ops[idx].is_parity {
                idx += 1;
            }
            let data_ops = &ops[line_start..idx];
            let parity_op = &ops[idx];
            idx += 1;

            let mut expected = vec![0u8; policy.stripe_size_bytes() as usize];
            for op in data_ops {
                xor_into(&mut expected, op.data.as_slice());
            }
            prop_assert_eq!(&expected[..parity_op.req_size as usize], parity_op.data.as_slice());
        }
    }

    /// Round trip with no failures reproduces the written buffer byte-for-byte.
    #[test]
    fn round_trip_no_failures((policy, (offset, buf)) in policy_strategy().prop_flat_map(|p| (Just(p), aligned_write_strategy(p)))) {
        let write_ops = translate_write(&buf, buf.len(), offset, &policy).unwrap();
        let mut osds = FakeOsds::new();
        osds.store(&write_ops);

        let mut out = vec![0u8; buf.len()];
        let (mut read_ops, count) = translate_read(&mut out, buf.len(), offset, &policy);
        let successful = osds.fill(&mut read_ops, &[]);
        let received = received_bytes(&read_ops, &successful, count);

        let n = process_reads(read_ops, &successful, &policy, received, offset).unwrap();
        prop_assert_eq!(n, buf.len());
        prop_assert_eq!(out, buf);
    }

    /// Any single op failure per line still reconstructs byte-identical output.
    #[test]
    fn single_failure_tolerance((policy, (offset, buf)) in policy_strategy().prop_flat_map(|p| (Just(p), aligned_write_strategy(p))), seed in any::<u64>()) {
        let write_ops = translate_write(&buf, buf.len(), offset, &policy).unwrap();
        let mut osds = FakeOsds::new();
        osds.store(&write_ops);

        let mut out = vec![0u8; buf.len()];
        let (mut read_ops, count) = translate_read(&mut out, buf.len(), offset, &policy);

        // Deterministically pick one op per line to fail, from the seed.
        let width = policy.width() as usize;
        let lines = 1 + (read_ops.len() - 1) / width;
        let tail_start = read_ops.len() - lines;
        let mut fail_indices = Vec::new();
        for line in 0..lines {
            let line_start = line * policy.data_width() as usize;
            let line_end = std::cmp::min(line_start + policy.data_width() as usize, tail_start);
            if line_end <= line_start {
                continue;
            }
            let span = line_end - line_start;
            let pick = line_start + ((seed as usize).wrapping_add(line) % span);
            fail_indices.push(pick);
        }

        let successful = osds.fill(&mut read_ops, &fail_indices);
        let received = received_bytes(&read_ops, &successful, count);

        let n = process_reads(read_ops, &successful, &policy, received, offset).unwrap();
        prop_assert_eq!(n, buf.len());
        prop_assert_eq!(out, buf);
    }

    /// Two failures in the same line are rejected.
    #[test]
    fn failure_threshold((policy, (offset, buf)) in policy_strategy().prop_flat_map(|p| (Just(p), aligned_write_strategy(p)))) {
        // Only meaningful when a line has at least two data ops.
        prop_assume!(policy.data_width() >= 2);
        let write_ops = translate_write(&buf, buf.len(), offset, &policy).unwrap();
        let mut osds = FakeOsds::new();
        osds.store(&write_ops);

        let mut out = vec![0u8; buf.len()];
        let (mut read_ops, _count) = translate_read(&mut out, buf.len(), offset, &policy);
        prop_assume!(read_ops.len() >= 2 && !read_ops[0].is_parity && !read_ops[1].is_parity);

        let successful = osds.fill(&mut read_ops, &[0, 1]);
        let err = process_reads(read_ops, &successful, &policy, 0, offset).unwrap_err();
        let is_too_many_failures = matches!(err, stripe_translator::StripeError::TooManyFailures { .. });
        prop_assert!(is_too_many_failures);
    }

    /// Purity: identical inputs produce structurally identical op lists.
    #[test]
    fn purity((policy, (offset, buf)) in policy_strategy().prop_flat_map(|p| (Just(p), aligned_write_strategy(p)))) {
        let ops1 = translate_write(&buf, buf.len(), offset, &policy).unwrap();
        let ops2 = translate_write(&buf, buf.len(), offset, &policy).unwrap();
        prop_assert_eq!(ops1.len(), ops2.len());
        for (a, b) in ops1.iter().zip(ops2.iter()) {
            prop_assert_eq!(a.object_number, b.object_number);
            prop_assert_eq!(&a.osd_offsets, &b.osd_offsets);
            prop_assert_eq!(a.req_size, b.req_size);
            prop_assert_eq!(a.req_offset, b.req_offset);
            prop_assert_eq!(a.is_parity, b.is_parity);
            prop_assert_eq!(a.data.as_slice(), b.data.as_slice());
        }
    }
}
