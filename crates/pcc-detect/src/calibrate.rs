use pcc_core::BitSize;

use crate::segment::Segment;

/// Channel parameters recovered from the `101` head of a preamble.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub threshold: f64,
    pub bit_size: BitSize,
}

/// Calibrate from three segments believed to be `1, 0, 1`.
///
/// Only the first three preamble bits are used: the fourth may already be
/// fused with whatever follows it.
pub fn calibrate(s0: &Segment, s1: &Segment, s2: &Segment) -> Calibration {
    let threshold = (s0.level() + 2.0 * s1.level() + s2.level()) / 4.0;
    let bit_size = BitSize::new(
        s1.point_count as f64,
        (s0.point_count + s2.point_count) as f64 / 2.0,
    );
    Calibration { threshold, bit_size }
}

/// Calibrate from the head of `segments`, if it has at least three.
pub fn calibrate_head(segments: &[Segment]) -> Option<Calibration> {
    match segments {
        [s0, s1, s2, ..] => Some(calibrate(s0, s1, s2)),
        _ => None,
    }
}
