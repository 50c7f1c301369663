use log::debug;
use pcc_core::{BitSize, INIT_SEQUENCE, INIT_SEQ_SIZE};

use crate::segment::Segment;

/// Bit-size perturbations tried when the default sizes yield a bad frame.
/// One inserted or dropped bit per segment is the usual failure.
const REPAIR_OFFSETS: [f64; 4] = [-3.0, -1.0, 1.0, 3.0];

/// Expand segments to bits and truncate to `frame_len`.
/// Shorter output is returned as is; frame decoding rejects it.
pub fn bits_from_segments(segments: &[Segment], bit_size: BitSize, frame_len: usize) -> Vec<u8> {
    let mut bits = Vec::with_capacity(frame_len);
    for seg in segments {
        let n = seg.bits(bit_size);
        bits.extend(core::iter::repeat(seg.bit).take(n));
        if bits.len() >= frame_len {
            break;
        }
    }
    bits.truncate(frame_len);
    bits
}

pub fn init_intact(bits: &[u8]) -> bool {
    bits.len() >= INIT_SEQ_SIZE && bits[..INIT_SEQ_SIZE] == INIT_SEQUENCE
}

/// Extract a frame, searching nearby bit sizes when `accept` rejects the
/// default result.
///
/// The search only runs when the header survived; a broken header means the
/// sync itself is wrong and no resizing will fix it. Falls back to the
/// default bits when nothing is accepted.
pub fn extract_with_repair<F>(
    segments: &[Segment],
    bit_size: BitSize,
    frame_len: usize,
    mut accept: F,
) -> Vec<u8>
where
    F: FnMut(&[u8]) -> bool,
{
    let default_bits = bits_from_segments(segments, bit_size, frame_len);
    if accept(&default_bits) || !init_intact(&default_bits) {
        return default_bits;
    }

    for d0 in REPAIR_OFFSETS {
        for d1 in REPAIR_OFFSETS {
            let trial = BitSize::new(bit_size.zero + d0, bit_size.one + d1);
            if trial.zero <= 0.0 || trial.one <= 0.0 {
                continue;
            }
            let bits = bits_from_segments(segments, trial, frame_len);
            if accept(&bits) {
                debug!("Repair: accepted with bit size {:.1}/{:.1}", trial.zero, trial.one);
                return bits;
            }
        }
    }

    default_bits
}
