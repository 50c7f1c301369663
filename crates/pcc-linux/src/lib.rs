use std::time::Instant;

use pcc_hal::PlatformClock;

pub mod replay;
pub mod spam;
pub mod timer;

pub use replay::ReplaySource;
pub use spam::{PinnedSpammer, SpinSpammer};
pub use timer::{CounterTimer, SpamTimer};

pub struct LinuxClock(Instant);
impl LinuxClock { pub fn new() -> Self { Self(Instant::now()) } }
impl Default for LinuxClock { fn default() -> Self { Self::new() } }
impl PlatformClock for LinuxClock {
    fn now_us(&self) -> u64 { self.0.elapsed().as_micros() as u64 }
}
