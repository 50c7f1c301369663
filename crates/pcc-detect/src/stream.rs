use log::{debug, info};
use pcc_cluster::{MicroCluster, StreamClusterer};
use pcc_core::{BitSize, ChannelConfig, DenStreamParams, PcResult, Polarity, Sample};

use crate::calibrate::calibrate;
use crate::segment::Segment;

/// Size of the pre-sync window searched for the `101` head.
const WINDOW: usize = 3;

/// Segments the stream with DenStream instead of a fixed threshold.
///
/// Each time a new potential cluster appears, the one before it is treated
/// as complete. Before sync, completed clusters slide through a three-slot
/// window until it reads `1, 0, 1`; afterwards they are appended to the
/// frame, fusing neighbours that carry the same bit.
#[derive(Debug, Clone)]
pub struct DenStreamDetector {
    clusterer: StreamClusterer,
    params: DenStreamParams,
    polarity: Polarity,
    window: Vec<MicroCluster>,
    clusters: Vec<MicroCluster>,
    synced: bool,
    threshold: f64,
    bit_size: BitSize,
    bit_count: usize,
}

impl DenStreamDetector {
    pub fn new(
        params: DenStreamParams,
        polarity: Polarity,
        threshold: f64,
        bit_size: BitSize,
    ) -> PcResult<Self> {
        Ok(Self {
            clusterer: StreamClusterer::new(&params)?,
            params,
            polarity,
            window: Vec::with_capacity(WINDOW),
            clusters: Vec::new(),
            synced: false,
            threshold,
            bit_size,
            bit_count: 0,
        })
    }

    pub fn from_config(config: &ChannelConfig) -> PcResult<Self> {
        Self::new(
            config.denstream,
            config.polarity,
            config.threshold.jmp_threshold,
            config.initial_bit_size,
        )
    }

    pub fn push(&mut self, sample: Sample) {
        if !self.clusterer.observe(sample, 1.0) {
            return;
        }
        let potential = self.clusterer.potential();
        if potential.len() < 2 {
            return;
        }
        let done = potential[potential.len() - 2].clone();
        self.update(done);
        if !self.synced {
            self.check_preamble();
        }
    }

    fn update(&mut self, cluster: MicroCluster) {
        if self.synced {
            self.append(cluster);
            self.recalibrate();
        } else {
            self.slide(cluster);
        }
    }

    fn append(&mut self, cluster: MicroCluster) {
        let Some(last) = self.clusters.last() else {
            self.bit_count += self.bits_of(&cluster);
            self.clusters.push(cluster);
            return;
        };
        // The same cluster can be reported twice; x centres tell them apart.
        if last.center()[0] == cluster.center()[0] {
            return;
        }

        if self.bit_of(last) == self.bit_of(&cluster) {
            let merged = last.merge(&cluster);
            self.bit_count = self.bit_count.saturating_sub(self.bits_of(last)) + self.bits_of(&merged);
            let idx = self.clusters.len() - 1;
            self.clusters[idx] = merged;
        } else {
            self.bit_count += self.bits_of(&cluster);
            self.clusters.push(cluster);
        }
    }

    fn slide(&mut self, cluster: MicroCluster) {
        if self.window.len() < WINDOW {
            self.window.push(cluster);
            return;
        }

        let last = &self.window[WINDOW - 1];
        let ratio = self.params.merge_ratio;
        let split = cluster.level() < last.level() * ratio && cluster.level() > last.level() / ratio;
        if split {
            if cluster.center()[0] != last.center()[0] {
                self.window[WINDOW - 1] = last.merge(&cluster);
            }
        } else {
            self.window.remove(0);
            self.window.push(cluster);
        }
    }

    fn check_preamble(&mut self) {
        if self.window.len() < WINDOW {
            return;
        }
        let (l0, l1, l2) = (self.window[0].level(), self.window[1].level(), self.window[2].level());
        let jump = self.params.jump_ratio;
        if !(self.polarity.separates(l0, l1, jump) && self.polarity.separates(l2, l1, jump)) {
            return;
        }

        self.clusters = core::mem::take(&mut self.window);
        self.synced = true;
        self.bit_count = WINDOW;
        self.recalibrate();
        info!(
            "Preamble found (denstream): threshold {:.1}, bit size {:.1}/{:.1}",
            self.threshold, self.bit_size.zero, self.bit_size.one
        );
    }

    fn recalibrate(&mut self) {
        if let [c0, c1, c2, ..] = self.clusters.as_slice() {
            let cal = calibrate(&self.as_segment(c0), &self.as_segment(c1), &self.as_segment(c2));
            if cal.bit_size.is_usable() && cal.threshold.is_finite() {
                self.threshold = cal.threshold;
                self.bit_size = cal.bit_size;
            } else {
                debug!("Calibration rejected: {:?}", cal);
            }
        }
    }

    fn bit_of(&self, cluster: &MicroCluster) -> u8 {
        self.polarity.bit_for(cluster.level(), self.threshold)
    }

    fn bits_of(&self, cluster: &MicroCluster) -> usize {
        self.as_segment(cluster).bits(self.bit_size)
    }

    fn as_segment(&self, cluster: &MicroCluster) -> Segment {
        Segment::with_level(self.bit_of(cluster), cluster.point_count(), cluster.level())
    }

    /// The newest potential cluster, if it has not been taken in yet.
    fn open_cluster(&self) -> Option<&MicroCluster> {
        if !self.synced {
            return None;
        }
        let open = self.clusterer.potential().last()?;
        match self.clusters.last() {
            Some(last) if last.center()[0] == open.center()[0] => None,
            _ => Some(open),
        }
    }

    /// Completed segments followed by the open one.
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments: Vec<Segment> = self.clusters.iter().map(|c| self.as_segment(c)).collect();
        if let Some(open) = self.open_cluster() {
            let tail = self.as_segment(open);
            match segments.last_mut() {
                Some(last) if last.bit == tail.bit => last.absorb(&tail),
                _ => segments.push(tail),
            }
        }
        segments
    }

    /// Bits since sync, open cluster included.
    pub fn bit_count(&self) -> usize {
        let Some(open) = self.open_cluster() else {
            return self.bit_count;
        };
        match self.clusters.last() {
            Some(last) if self.bit_of(last) == self.bit_of(open) => {
                let mut fused = self.as_segment(last);
                fused.absorb(&self.as_segment(open));
                self.bit_count.saturating_sub(self.bits_of(last)) + fused.bits(self.bit_size)
            }
            _ => self.bit_count + self.bits_of(open),
        }
    }

    pub fn preamble_found(&self) -> bool {
        self.synced
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn bit_size(&self) -> BitSize {
        self.bit_size
    }

    pub fn clusterer(&self) -> &StreamClusterer {
        &self.clusterer
    }
}
