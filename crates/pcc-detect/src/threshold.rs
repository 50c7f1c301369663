use log::{debug, info};
use pcc_core::{BitSize, ChannelConfig, Polarity, ThresholdParams};

use crate::calibrate::calibrate_head;
use crate::segment::Segment;

/// Points between bit recounts while a segment keeps growing. A frame
/// ending in zeros never closes its last segment, so this is what ends it.
const RECOUNT_EVERY: usize = 100;

/// Threshold detector: splits the stream into runs of one bit, finds the
/// `101` preamble head and counts bits from there.
#[derive(Debug, Clone)]
pub struct ThresholdSegmenter {
    params: ThresholdParams,
    polarity: Polarity,
    threshold: f64,
    bit_size: BitSize,
    segments: Vec<Segment>,
    preamble_found: bool,
    bit_count: usize,
}

impl ThresholdSegmenter {
    pub fn new(params: ThresholdParams, polarity: Polarity, bit_size: BitSize) -> Self {
        Self {
            params,
            polarity,
            threshold: params.jmp_threshold,
            bit_size,
            segments: Vec::new(),
            preamble_found: false,
            bit_count: 0,
        }
    }

    pub fn from_config(config: &ChannelConfig) -> Self {
        Self::new(config.threshold, config.polarity, config.initial_bit_size)
    }

    #[inline]
    pub fn classify(&self, value: f64) -> u8 {
        self.polarity.bit_for(value, self.threshold)
    }

    pub fn push(&mut self, value: f64) {
        let bit = self.classify(value);

        if let Some(open) = self.segments.last_mut() {
            if open.bit == bit {
                open.push(value);
                if self.preamble_found && open.point_count % RECOUNT_EVERY == 0 {
                    self.recount();
                }
                return;
            }
        }

        // Bit flip: the open segment closes here.
        self.smoothen();
        if !self.preamble_found {
            self.detect_preamble();
        }
        self.segments.push(Segment::open(bit, value));
        if self.preamble_found {
            self.recount();
        }
    }

    /// Fold a spike (the last closed segment, if short enough) and the
    /// segment after it into the segment before it.
    fn smoothen(&mut self) {
        let len = self.segments.len();
        if len < 3 || self.segments[len - 2].point_count > self.params.merge_spike {
            return;
        }

        let (Some(open), Some(spike)) = (self.segments.pop(), self.segments.pop()) else {
            return;
        };
        let target = len - 3;
        self.segments[target].absorb(&spike);
        self.segments[target].absorb(&open);
        debug!("Smoothing: folded {}-point spike into segment {}", spike.point_count, target);

        if self.preamble_found && target < 3 {
            self.recalibrate();
        }
    }

    fn detect_preamble(&mut self) {
        let len = self.segments.len();
        if len < 3 {
            return;
        }
        let head = &self.segments[len - 3..];
        let pattern = head[0].bit == 1 && head[1].bit == 0 && head[2].bit == 1;
        let in_bounds = head
            .iter()
            .all(|s| s.point_count >= self.params.min_spike && s.point_count <= self.params.max_spike);
        if !(pattern && in_bounds) {
            return;
        }

        self.segments.drain(..len - 3);
        self.preamble_found = true;
        self.recalibrate();
        info!(
            "Preamble found: threshold {:.1}, bit size {:.1}/{:.1}",
            self.threshold, self.bit_size.zero, self.bit_size.one
        );
    }

    fn recalibrate(&mut self) {
        if let Some(cal) = calibrate_head(&self.segments) {
            if cal.bit_size.is_usable() && cal.threshold.is_finite() {
                self.threshold = cal.threshold;
                self.bit_size = cal.bit_size;
            }
        }
    }

    fn recount(&mut self) {
        let bit_size = self.bit_size;
        self.bit_count = self.segments.iter().map(|s| s.bits(bit_size)).sum();
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn bit_size(&self) -> BitSize {
        self.bit_size
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn preamble_found(&self) -> bool {
        self.preamble_found
    }

    /// Bits seen since the preamble, open segment included.
    pub fn bit_count(&self) -> usize {
        self.bit_count
    }
}
