#![forbid(unsafe_code)]

use pcc_core::Sample;

/// Collapses every `window` raw samples into their median.
/// Output samples are re-indexed from 0 so the detector sees a dense ordinal.
#[derive(Debug, Clone)]
pub struct MedianFilter {
    window: usize,
    buf: Vec<f64>,
    next_index: u64,
}

impl MedianFilter {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self { window, buf: Vec::with_capacity(window), next_index: 0 }
    }

    /// Feed one raw sample; yields a filtered one once the window is full.
    pub fn push(&mut self, sample: Sample) -> Option<Sample> {
        self.buf.push(sample.value);
        if self.buf.len() < self.window {
            return None;
        }

        self.buf.sort_by(|a, b| a.total_cmp(b));
        let mid = self.buf.len() / 2;
        let median = if self.buf.len() % 2 == 1 {
            self.buf[mid]
        } else {
            (self.buf[mid - 1] + self.buf[mid]) / 2.0
        };
        self.buf.clear();

        let out = Sample::new(self.next_index, median);
        self.next_index += 1;
        Some(out)
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn reset(&mut self) {
        self.buf.clear();
        self.next_index = 0;
    }
}
