use std::hint::black_box;
use std::thread;
use std::time::{Duration, Instant};

use core_affinity::CoreId;
use log::{debug, warn};

use pcc_hal::Spammer;

/// Rounds of the contention kernel between two clock reads.
const ROUNDS_PER_CHECK: usize = 64;

/// One round of dependent integer multiplies. They all issue on the same
/// execution port, which is what the listener times.
#[inline(always)]
pub fn contend(seed: u64) -> u64 {
    let mut x = seed | 1;
    for _ in 0..8 {
        x = black_box(x.wrapping_mul(0x9e37_79b9_7f4a_7c15));
    }
    x
}

/// Busy-waits for `duration`, running the kernel when `spam` is set.
/// Zero bits busy-wait too, so every bit costs the same clock reads.
fn hold(duration: Duration, spam: bool) -> u64 {
    let start = Instant::now();
    let mut acc = 0u64;
    while start.elapsed() < duration {
        if spam {
            for _ in 0..ROUNDS_PER_CHECK {
                acc = contend(acc);
            }
        } else {
            std::hint::spin_loop();
        }
    }
    acc
}

/// Single-thread spammer on the calling core.
#[derive(Debug, Default)]
pub struct SpinSpammer {
    sink: u64,
}

impl SpinSpammer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Spammer for SpinSpammer {
    fn spam_for(&mut self, duration: Duration) {
        self.sink ^= hold(duration, true);
    }

    fn idle_for(&mut self, duration: Duration) {
        hold(duration, false);
    }
}

/// One spammer per core, each pinned before it starts. The listener can sit
/// on any sibling thread and still see the contention.
pub struct PinnedSpammer {
    cores: Vec<CoreId>,
    local: SpinSpammer,
}

impl PinnedSpammer {
    /// Pin to every core the OS reports, or the first `limit` of them.
    pub fn new(limit: Option<usize>) -> anyhow::Result<Self> {
        let mut cores = core_affinity::get_core_ids()
            .ok_or_else(|| anyhow::anyhow!("core ids unavailable"))?;
        if let Some(n) = limit {
            cores.truncate(n.max(1));
        }
        debug!("PinnedSpammer: {} cores", cores.len());
        Ok(Self { cores, local: SpinSpammer::new() })
    }

    pub fn cores(&self) -> usize {
        self.cores.len()
    }
}

impl Spammer for PinnedSpammer {
    fn spam_for(&mut self, duration: Duration) {
        self.local.spam_for(duration);
    }

    fn idle_for(&mut self, duration: Duration) {
        self.local.idle_for(duration);
    }

    fn transmit(&mut self, bits: &[u8], bit_duration: Duration) {
        thread::scope(|s| {
            for &core in &self.cores {
                s.spawn(move || {
                    if !core_affinity::set_for_current(core) {
                        warn!("PinnedSpammer: could not pin to core {}", core.id);
                    }
                    SpinSpammer::new().transmit(bits, bit_duration);
                });
            }
        });
    }
}
