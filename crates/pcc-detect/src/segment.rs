use pcc_core::BitSize;

/// A run of consecutive detector points carrying the same bit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub bit: u8,
    pub point_count: usize,
    /// Sum of the raw values, so the mean level survives merges.
    pub level_sum: f64,
}

impl Segment {
    /// A fresh segment holding a single point.
    pub fn open(bit: u8, value: f64) -> Self {
        Self { bit, point_count: 1, level_sum: value }
    }

    pub fn with_level(bit: u8, point_count: usize, level: f64) -> Self {
        Self { bit, point_count, level_sum: level * point_count as f64 }
    }

    pub fn push(&mut self, value: f64) {
        self.point_count += 1;
        self.level_sum += value;
    }

    /// Fold `other` into this segment. The bit stays ours.
    pub fn absorb(&mut self, other: &Segment) {
        self.point_count += other.point_count;
        self.level_sum += other.level_sum;
    }

    pub fn level(&self) -> f64 {
        if self.point_count == 0 {
            f64::NAN
        } else {
            self.level_sum / self.point_count as f64
        }
    }

    /// How many bits this segment spans: `max(1, round(count / size))`.
    pub fn bits(&self, bit_size: BitSize) -> usize {
        let n = (self.point_count as f64 / bit_size.get(self.bit)).round();
        if n.is_finite() && n >= 1.0 { n as usize } else { 1 }
    }
}
