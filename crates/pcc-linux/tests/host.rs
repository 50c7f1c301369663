use std::time::{Duration, Instant};

use pcc_hal::{PlatformClock, Spammer, TimingSource};
use pcc_linux::{CounterTimer, LinuxClock, ReplaySource, SpamTimer, SpinSpammer};

#[test]
fn test_replay_parses_and_drains() {
    let mut src = ReplaySource::parse("900 910.5\n1500\t 1490\n").unwrap();
    assert_eq!(src.len(), 4);

    let mut seen = Vec::new();
    while let Ok(s) = src.sample() {
        seen.push((s.index, s.value));
    }
    assert_eq!(seen, vec![(0, 900.0), (1, 910.5), (2, 1500.0), (3, 1490.0)]);
    assert_eq!(src.remaining(), 0);
    assert!(matches!(src.sample(), Err(nb::Error::WouldBlock)));
}

#[test]
fn test_replay_rejects_garbage() {
    let err = ReplaySource::parse("900 nine 1500").unwrap_err();
    assert!(format!("{:#}", err).contains("token 1"));
    assert!(ReplaySource::parse("").unwrap().is_empty());
}

#[test]
fn test_replay_missing_file() {
    assert!(ReplaySource::open("/nonexistent/timings.txt").is_err());
}

#[test]
fn test_clock_is_monotonic() {
    let clock = LinuxClock::new();
    let a = clock.now_us();
    std::thread::sleep(Duration::from_millis(2));
    let b = clock.now_us();
    assert!(b >= a + 1_000);
}

#[test]
fn test_spinner_holds_for_duration() {
    let mut spammer = SpinSpammer::new();
    let start = Instant::now();
    spammer.transmit(&[1, 0, 1], Duration::from_millis(1));
    assert!(start.elapsed() >= Duration::from_millis(3));
}

#[test]
fn test_timers_produce_indexed_samples() {
    let mut timer = SpamTimer::new(16);
    let a = timer.sample().unwrap();
    let b = timer.sample().unwrap();
    assert_eq!((a.index, b.index), (0, 1));
    assert!(a.value >= 0.0);

    let mut counter = CounterTimer::start(16, None).unwrap();
    let c = counter.sample().unwrap();
    assert_eq!(c.index, 0);
    assert!(c.value >= 0.0);
}
