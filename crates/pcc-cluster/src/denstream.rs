#![forbid(unsafe_code)]

use pcc_core::{DenStreamParams, PcError, PcResult, Sample};

use crate::micro::MicroCluster;

/// Online DenStream clusterer (Cao et al., "Density-Based Clustering over an
/// Evolving Data Stream with Noise").
///
/// Time is synthetic: one tick per observed sample. Potential clusters are
/// kept in promotion order, which the detector relies on to find the most
/// recently completed segment.
#[derive(Debug, Clone)]
pub struct StreamClusterer {
    potential: Vec<MicroCluster>,
    outlier: Vec<MicroCluster>,
    t: u64,
    lambda: f64,
    eps: f64,
    beta: f64,
    mu: f64,
    index_scale: f64,
    tp: u64,
}

impl StreamClusterer {
    pub fn new(params: &DenStreamParams) -> PcResult<Self> {
        params.validate()?;
        let bm = params.beta * params.mu;
        let tp = if params.lambda > 0.0 {
            ((bm / (bm - 1.0)).ln() / params.lambda).ceil().max(1.0) as u64
        } else {
            u64::MAX
        };

        Ok(Self {
            potential: Vec::new(),
            outlier: Vec::new(),
            t: 0,
            lambda: params.lambda,
            eps: params.eps,
            beta: params.beta,
            mu: params.mu,
            index_scale: params.index_scale,
            tp,
        })
    }

    /// Feed one sample. Returns true if a new potential cluster appeared.
    pub fn observe(&mut self, sample: Sample, weight: f64) -> bool {
        let point = [sample.index as f64 * self.index_scale, sample.value];
        let promoted = self.merge_point(point, sample, weight);

        if self.lambda > 0.0 && self.t % self.tp == 0 {
            self.maintenance();
        }
        self.t += 1;
        promoted
    }

    /// Feed a batch. `weights`, when given, must match `samples` one to one;
    /// a mismatch is rejected before any state changes.
    /// Returns how many potential clusters appeared.
    pub fn observe_batch(&mut self, samples: &[Sample], weights: Option<&[f64]>) -> PcResult<usize> {
        if let Some(w) = weights {
            if w.len() != samples.len() {
                return Err(PcError::ShapeMismatch);
            }
        }

        let mut appeared = 0;
        for (i, s) in samples.iter().enumerate() {
            let w = weights.map_or(1.0, |w| w[i]);
            if self.observe(*s, w) {
                appeared += 1;
            }
        }
        Ok(appeared)
    }

    fn merge_point(&mut self, point: [f64; 2], raw: Sample, weight: f64) -> bool {
        // 1. Nearest potential cluster
        if let Some(idx) = nearest(&self.potential, point) {
            if self.potential[idx].trial_radius(point, weight) < self.eps {
                self.potential[idx].insert(point, raw, weight);
                return false;
            }
        }

        // 2. Nearest outlier cluster, promoted once heavy enough
        if let Some(idx) = nearest(&self.outlier, point) {
            if self.outlier[idx].trial_radius(point, weight) < self.eps {
                self.outlier[idx].insert(point, raw, weight);
                if self.outlier[idx].weight() > self.beta * self.mu {
                    let cluster = self.outlier.remove(idx);
                    self.potential.push(cluster);
                    return true;
                }
                return false;
            }
        }

        // 3. Nobody wants it
        let mut cluster = MicroCluster::new(self.lambda, self.t as f64);
        cluster.insert(point, raw, weight);
        self.outlier.push(cluster);
        false
    }

    fn decay(&self, t: f64) -> f64 {
        2f64.powf(-self.lambda * t)
    }

    fn maintenance(&mut self) {
        let floor = self.beta * self.mu;
        self.potential.retain(|c| c.weight() >= floor);

        // ξ: the weight an outlier born at `created` must have reached by now.
        let t = self.t as f64;
        let tp = self.tp as f64;
        let lambda = self.lambda;
        let denom = self.decay(tp) - 1.0;
        self.outlier.retain(|c| {
            let xi = (2f64.powf(-lambda * (t - c.creation_time() + tp)) - 1.0) / denom;
            c.weight() >= xi
        });
    }

    pub fn potential(&self) -> &[MicroCluster] {
        &self.potential
    }

    pub fn outlier(&self) -> &[MicroCluster] {
        &self.outlier
    }

    /// Samples seen so far.
    pub fn tick(&self) -> u64 {
        self.t
    }

    pub fn maintenance_period(&self) -> u64 {
        self.tp
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }
}

/// Index of the cluster whose center is closest to `point`.
/// Strictly-smaller wins, so ties keep the first one found.
fn nearest(clusters: &[MicroCluster], point: [f64; 2]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, c) in clusters.iter().enumerate() {
        let center = c.center();
        let d = (center[0] - point[0]).hypot(center[1] - point[1]);
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}
