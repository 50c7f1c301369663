use core::time::Duration;
use pcc_core::{PcError, Sample};
use pcc_hal::{PlatformClock, Spammer, TimingSource};

struct Silent {
    next: u64,
}

impl TimingSource for Silent {
    fn sample(&mut self) -> nb::Result<Sample, PcError> {
        if self.next == 0 {
            self.next += 1;
            return Err(nb::Error::WouldBlock);
        }
        let s = Sample::new(self.next, 900.0);
        self.next += 1;
        Ok(s)
    }
}

#[derive(Default)]
struct Recorder {
    log: Vec<(u8, Duration)>,
}

impl Spammer for Recorder {
    fn spam_for(&mut self, duration: Duration) {
        self.log.push((1, duration));
    }
    fn idle_for(&mut self, duration: Duration) {
        self.log.push((0, duration));
    }
}

struct Frozen(u64);
impl PlatformClock for Frozen {
    fn now_us(&self) -> u64 {
        self.0
    }
}

#[test]
fn test_trait_object_safety() {
    let mut src = Silent { next: 0 };
    let obj: &mut dyn TimingSource = &mut src;
    assert!(matches!(obj.sample(), Err(nb::Error::WouldBlock)));
    let a = obj.sample().unwrap();
    let b = obj.sample().unwrap();
    assert!(b.index > a.index);

    let clock: Box<dyn PlatformClock> = Box::new(Frozen(42));
    assert_eq!(clock.now_us(), 42);
}

#[test]
fn test_default_transmit_walks_bits() {
    let mut rec = Recorder::default();
    let bit = Duration::from_millis(1);
    {
        let obj: &mut dyn Spammer = &mut rec;
        obj.transmit(&[1, 0, 1, 0], bit);
    }
    let bits: Vec<u8> = rec.log.iter().map(|(b, _)| *b).collect();
    assert_eq!(bits, vec![1, 0, 1, 0]);
    assert!(rec.log.iter().all(|(_, d)| *d == bit));
}
