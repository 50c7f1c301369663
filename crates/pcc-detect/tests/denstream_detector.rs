use pcc_core::{BitSize, ChannelConfig, DenStreamParams, DetectorKind, Polarity, Sample, DATA_FRAME_SIZE};
use pcc_detect::{bits_from_segments, build_detector, DenStreamDetector, Detector};

const ONE: f64 = 1500.0;
const ZERO: f64 = 900.0;
// Long enough that same-level runs one bit apart never share a cluster.
const PTS: usize = 12;

const FRAME: &str = "101001100110010101000";

fn frame_bits() -> Vec<u8> {
    FRAME.bytes().map(|c| c - b'0').collect()
}

fn stream(bits: &[u8], lead: usize, tail: usize) -> Vec<Sample> {
    let mut values = vec![ZERO; lead];
    for &b in bits {
        let level = if b == 1 { ONE } else { ZERO };
        values.extend(std::iter::repeat(level).take(PTS));
    }
    values.extend(std::iter::repeat(ZERO).take(tail));
    values.into_iter().enumerate().map(|(i, v)| Sample::new(i as u64, v)).collect()
}

fn detector() -> DenStreamDetector {
    DenStreamDetector::new(DenStreamParams::default(), Polarity::AboveIsOne, 1200.0, BitSize::default())
        .unwrap()
}

#[test]
fn test_idle_line_never_syncs() {
    let mut det = detector();
    for s in stream(&[], 400, 0) {
        det.push(s);
    }
    assert!(!det.preamble_found());
    assert_eq!(det.bit_count(), 0);
    assert!(det.segments().is_empty());
    // The line still got clustered.
    assert!(det.clusterer().potential().len() > 1);
}

#[test]
fn test_preamble_calibrates() {
    let mut det = detector();
    // Idle, then 1 0 1 0 and one more bit worth of the fourth.
    for s in stream(&[1, 0, 1, 0], 40, PTS) {
        det.push(s);
    }
    assert!(det.preamble_found());
    assert_eq!(det.threshold(), 1200.0);
    assert_eq!(det.bit_size(), BitSize::new(PTS as f64, PTS as f64));

    let segs = det.segments();
    assert_eq!(segs[0].bit, 1);
    assert_eq!(segs[1].bit, 0);
    assert_eq!(segs[2].bit, 1);
    assert!(det.bit_count() >= 3);
}

#[test]
fn test_clean_frame_decodes() {
    let mut det = detector();
    let mut bits = None;
    for s in stream(&frame_bits(), 40, 200) {
        det.push(s);
        if det.bit_count() >= DATA_FRAME_SIZE {
            bits = Some(bits_from_segments(&det.segments(), det.bit_size(), DATA_FRAME_SIZE));
            break;
        }
    }
    assert_eq!(bits, Some(frame_bits()));
}

#[test]
fn test_factory_honours_kind() {
    let mut config = ChannelConfig::default();
    config.detector = DetectorKind::DenStream;
    let det: Box<dyn Detector> = build_detector(&config).unwrap();
    assert!(!det.preamble_found());

    config.denstream.beta = 0.1;
    assert!(build_detector(&config).is_err());

    config.detector = DetectorKind::Threshold;
    let det = build_detector(&config).unwrap();
    assert_eq!(det.threshold(), config.threshold.jmp_threshold);
}
