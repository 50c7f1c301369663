use core::time::Duration;

use log::trace;
use pcc_core::{PcError, PcResult};
use pcc_detect::{extract_with_repair, Detector, MedianFilter};
use pcc_hal::{PlatformClock, TimingSource};

/// One answer window: how many bits to wait for and for how long.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub frame_len: usize,
    pub timeout: Duration,
    pub median_window: usize,
}

/// Feed `detector` until it counts `window.frame_len` bits.
///
/// Polls the source without blocking; `WouldBlock` is simply retried until
/// the deadline. Returns the number of filtered points consumed.
pub fn listen(
    source: &mut dyn TimingSource,
    clock: &dyn PlatformClock,
    detector: &mut dyn Detector,
    window: Window,
) -> PcResult<usize> {
    let deadline = clock.now_us().saturating_add(window.timeout.as_micros() as u64);
    let mut filter = MedianFilter::new(window.median_window);
    let mut points = 0;

    while detector.bit_count() < window.frame_len {
        if clock.now_us() >= deadline {
            trace!("Listen: timeout after {} points", points);
            return Err(PcError::Timeout);
        }
        match source.sample() {
            Ok(raw) => {
                if let Some(point) = filter.push(raw) {
                    detector.observe(point);
                    points += 1;
                }
            }
            Err(nb::Error::WouldBlock) => core::hint::spin_loop(),
            Err(nb::Error::Other(e)) => return Err(e),
        }
    }
    Ok(points)
}

/// Listen, then extract a frame with bit-size repair judged by `accept`.
pub fn receive_bits<F>(
    source: &mut dyn TimingSource,
    clock: &dyn PlatformClock,
    detector: &mut dyn Detector,
    window: Window,
    accept: F,
) -> PcResult<Vec<u8>>
where
    F: FnMut(&[u8]) -> bool,
{
    listen(source, clock, detector, window)?;
    Ok(extract_with_repair(&detector.segments(), detector.bit_size(), window.frame_len, accept))
}
