use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use log::{info, warn};

use pcc_core::{PcError, Sample};
use pcc_hal::TimingSource;

use crate::spam::contend;

/// Kernel rounds per measurement.
pub const DEFAULT_BATCH: usize = 256;

fn run_batch(batch: usize) -> u64 {
    let mut acc = 0u64;
    for _ in 0..batch {
        acc = contend(acc);
    }
    acc
}

/// Times a fixed batch of the contention kernel with `Instant`.
/// Values are nanoseconds; they grow while the sender spams.
pub struct SpamTimer {
    batch: usize,
    index: u64,
    sink: u64,
}

impl SpamTimer {
    pub fn new(batch: usize) -> Self {
        Self { batch: batch.max(1), index: 0, sink: 0 }
    }
}

impl Default for SpamTimer {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH)
    }
}

impl TimingSource for SpamTimer {
    fn sample(&mut self) -> nb::Result<Sample, PcError> {
        let start = Instant::now();
        self.sink ^= run_batch(self.batch);
        let value = start.elapsed().as_nanos() as f64;

        let s = Sample::new(self.index, value);
        self.index += 1;
        Ok(s)
    }
}

/// Times the kernel against a counting thread instead of the system clock,
/// for hosts where the clock is too coarse. Values are counter ticks.
pub struct CounterTimer {
    ticks: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    batch: usize,
    index: u64,
    sink: u64,
}

impl CounterTimer {
    /// Start the counter, pinned to `core` when given.
    pub fn start(batch: usize, core: Option<usize>) -> anyhow::Result<Self> {
        let ticks = Arc::new(AtomicU64::new(0));
        let running = Arc::new(AtomicBool::new(true));

        let pin = match core {
            Some(id) => {
                let ids = core_affinity::get_core_ids()
                    .ok_or_else(|| anyhow::anyhow!("core ids unavailable"))?;
                Some(
                    ids.into_iter()
                        .find(|c| c.id == id)
                        .ok_or_else(|| anyhow::anyhow!("no core {}", id))?,
                )
            }
            None => None,
        };

        let t = ticks.clone();
        let r = running.clone();
        let worker = thread::Builder::new().name("pcc-counter".into()).spawn(move || {
            if let Some(core) = pin {
                if !core_affinity::set_for_current(core) {
                    warn!("CounterTimer: could not pin to core {}", core.id);
                }
            }
            while r.load(Ordering::Relaxed) {
                t.fetch_add(1, Ordering::Relaxed);
            }
        })?;
        info!("CounterTimer: started (batch {})", batch);

        Ok(Self { ticks, running, worker: Some(worker), batch: batch.max(1), index: 0, sink: 0 })
    }
}

impl TimingSource for CounterTimer {
    fn sample(&mut self) -> nb::Result<Sample, PcError> {
        let before = self.ticks.load(Ordering::Acquire);
        self.sink ^= run_batch(self.batch);
        let after = self.ticks.load(Ordering::Acquire);

        let s = Sample::new(self.index, after.wrapping_sub(before) as f64);
        self.index += 1;
        Ok(s)
    }
}

impl Drop for CounterTimer {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
