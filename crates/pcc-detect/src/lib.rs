//! Latency stream to bits: segmentation, calibration and extraction.

pub mod calibrate;
pub mod extract;
pub mod filter;
pub mod segment;
pub mod stream;
pub mod threshold;

pub use calibrate::{calibrate, calibrate_head, Calibration};
pub use extract::{bits_from_segments, extract_with_repair, init_intact};
pub use filter::MedianFilter;
pub use segment::Segment;
pub use stream::DenStreamDetector;
pub use threshold::ThresholdSegmenter;

use pcc_core::{BitSize, ChannelConfig, DetectorKind, PcResult, Sample};

/// A streaming segmenter the link layer can listen with.
/// Samples must arrive in index order.
pub trait Detector: Send {
    fn observe(&mut self, sample: Sample);

    fn preamble_found(&self) -> bool;

    /// Bits counted since the preamble; 0 before it.
    fn bit_count(&self) -> usize;

    /// Segments from the preamble on, trailing open segment included.
    fn segments(&self) -> Vec<Segment>;

    fn bit_size(&self) -> BitSize;

    fn threshold(&self) -> f64;
}

impl Detector for ThresholdSegmenter {
    fn observe(&mut self, sample: Sample) {
        self.push(sample.value);
    }

    fn preamble_found(&self) -> bool {
        ThresholdSegmenter::preamble_found(self)
    }

    fn bit_count(&self) -> usize {
        ThresholdSegmenter::bit_count(self)
    }

    fn segments(&self) -> Vec<Segment> {
        ThresholdSegmenter::segments(self).to_vec()
    }

    fn bit_size(&self) -> BitSize {
        ThresholdSegmenter::bit_size(self)
    }

    fn threshold(&self) -> f64 {
        ThresholdSegmenter::threshold(self)
    }
}

impl Detector for DenStreamDetector {
    fn observe(&mut self, sample: Sample) {
        self.push(sample);
    }

    fn preamble_found(&self) -> bool {
        DenStreamDetector::preamble_found(self)
    }

    fn bit_count(&self) -> usize {
        DenStreamDetector::bit_count(self)
    }

    fn segments(&self) -> Vec<Segment> {
        DenStreamDetector::segments(self)
    }

    fn bit_size(&self) -> BitSize {
        DenStreamDetector::bit_size(self)
    }

    fn threshold(&self) -> f64 {
        DenStreamDetector::threshold(self)
    }
}

/// Fresh detector of the configured kind. One per listening window.
pub fn build_detector(config: &ChannelConfig) -> PcResult<Box<dyn Detector>> {
    Ok(match config.detector {
        DetectorKind::Threshold => Box::new(ThresholdSegmenter::from_config(config)),
        DetectorKind::DenStream => Box::new(DenStreamDetector::from_config(config)?),
    })
}
