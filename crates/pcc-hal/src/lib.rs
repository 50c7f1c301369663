#![no_std]
#![forbid(unsafe_code)]

use core::time::Duration;
use pcc_core::{PcError, Sample};

/// Producer of latency measurements.
/// INVARIANT: Must be Non-Blocking. `index` strictly increases across calls.
///
/// Units are whatever the backend measures (ns, counter ticks); calibration
/// normalises against them empirically.
pub trait TimingSource: Send {
    fn sample(&mut self) -> nb::Result<Sample, PcError>;
}

/// Creates (or withholds) contention for a bounded wall-clock duration.
pub trait Spammer: Send {
    /// Hammer the shared execution port for roughly `duration` (a 1 bit).
    fn spam_for(&mut self, duration: Duration);

    /// Stay quiet for roughly `duration` (a 0 bit).
    fn idle_for(&mut self, duration: Duration);

    /// Send a whole bit sequence, one `bit_duration` per bit, no early exit.
    // Default: scalar loop. Multi-core backends override this.
    fn transmit(&mut self, bits: &[u8], bit_duration: Duration) {
        for &bit in bits {
            if bit == 1 {
                self.spam_for(bit_duration);
            } else {
                self.idle_for(bit_duration);
            }
        }
    }
}

/// Monotonic clock used for protocol timeouts and session statistics.
pub trait PlatformClock: Send + Sync {
    fn now_us(&self) -> u64;
}
