#![forbid(unsafe_code)]

use pcc_core::Sample;

/// Decayed sufficient statistics of a micro-cluster over 2-D points.
/// `Copy` on purpose: trial insertions run on a stack copy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterStats {
    pub center: [f64; 2],
    pub variance: [f64; 2],
    pub weight: f64,
}

impl ClusterStats {
    pub const EMPTY: Self = Self { center: [0.0; 2], variance: [0.0; 2], weight: 0.0 };

    /// Single-pass weighted mean/variance update.
    /// `decay` is 2^(-λ), applied to the prior weight first.
    pub fn insert(&mut self, point: [f64; 2], weight: f64, decay: f64) {
        if self.weight == 0.0 {
            self.center = point;
            self.variance = [0.0; 2];
            self.weight = weight;
            return;
        }

        let old_weight = self.weight;
        let new_weight = old_weight * decay + weight;
        let old_center = self.center;

        for i in 0..2 {
            self.center[i] = old_center[i] + (weight / new_weight) * (point[i] - old_center[i]);
        }
        for i in 0..2 {
            self.variance[i] = self.variance[i] * ((new_weight - weight) / old_weight)
                + weight * (point[i] - self.center[i]) * (point[i] - old_center[i]);
        }
        self.weight = new_weight;
    }

    /// ‖√(variance / weight)‖₂. NaN for an empty cluster, so any `< eps`
    /// test against it fails.
    pub fn radius(&self) -> f64 {
        if self.weight > 0.0 {
            let rx = (self.variance[0] / self.weight).sqrt();
            let ry = (self.variance[1] / self.weight).sqrt();
            rx.hypot(ry)
        } else {
            f64::NAN
        }
    }
}

/// A DenStream micro-cluster. Keeps its raw points so the detector can
/// count how many measurements a segment spans.
#[derive(Debug, Clone, PartialEq)]
pub struct MicroCluster {
    stats: ClusterStats,
    lambda: f64,
    decay: f64,
    creation_time: f64,
    point_count: usize,
    points: Vec<Sample>,
}

impl MicroCluster {
    pub fn new(lambda: f64, creation_time: f64) -> Self {
        Self {
            stats: ClusterStats::EMPTY,
            lambda,
            decay: 2f64.powf(-lambda),
            creation_time,
            point_count: 0,
            points: Vec::new(),
        }
    }

    /// Insert a point whose clustering coordinates are `point`; `raw` is
    /// the measurement it came from.
    pub fn insert(&mut self, point: [f64; 2], raw: Sample, weight: f64) {
        self.stats.insert(point, weight, self.decay);
        self.point_count += 1;
        self.points.push(raw);
    }

    /// Radius this cluster would have after absorbing `point`.
    /// The cluster itself is left untouched.
    pub fn trial_radius(&self, point: [f64; 2], weight: f64) -> f64 {
        let mut trial = self.stats;
        trial.insert(point, weight, self.decay);
        trial.radius()
    }

    pub fn radius(&self) -> f64 {
        self.stats.radius()
    }

    /// Combine two clusters that the detector decided are one segment.
    pub fn merge(&self, other: &MicroCluster) -> MicroCluster {
        let lambda = (self.lambda + other.lambda) / 2.0;
        let mut points = Vec::with_capacity(self.points.len() + other.points.len());
        points.extend_from_slice(&self.points);
        points.extend_from_slice(&other.points);

        MicroCluster {
            stats: ClusterStats {
                center: [
                    (self.stats.center[0] + other.stats.center[0]) / 2.0,
                    (self.stats.center[1] + other.stats.center[1]) / 2.0,
                ],
                variance: [
                    (self.stats.variance[0] + other.stats.variance[0]) / 2.0,
                    (self.stats.variance[1] + other.stats.variance[1]) / 2.0,
                ],
                weight: self.stats.weight + other.stats.weight,
            },
            lambda,
            decay: 2f64.powf(-lambda),
            creation_time: (self.creation_time + other.creation_time) / 2.0,
            point_count: self.point_count + other.point_count,
            points,
        }
    }

    pub fn center(&self) -> [f64; 2] {
        self.stats.center
    }

    /// Latency level of the cluster (the y axis).
    pub fn level(&self) -> f64 {
        self.stats.center[1]
    }

    pub fn weight(&self) -> f64 {
        self.stats.weight
    }

    pub fn variance(&self) -> [f64; 2] {
        self.stats.variance
    }

    pub fn stats(&self) -> &ClusterStats {
        &self.stats
    }

    pub fn creation_time(&self) -> f64 {
        self.creation_time
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    pub fn points(&self) -> &[Sample] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.point_count == 0
    }
}
