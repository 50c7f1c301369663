use pcc_core::{BitSize, Sample};
use pcc_detect::{
    bits_from_segments, calibrate, calibrate_head, extract_with_repair, init_intact, MedianFilter,
    Segment,
};

/// Runs of equal bits, each `size` points per bit.
fn segments_for(bits: &[u8], size: BitSize, one: f64, zero: f64) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    for &b in bits {
        let n = size.get(b) as usize;
        let level = if b == 1 { one } else { zero };
        match out.last_mut() {
            Some(last) if last.bit == b => last.absorb(&Segment::with_level(b, n, level)),
            _ => out.push(Segment::with_level(b, n, level)),
        }
    }
    out
}

#[test]
fn test_calibration_round_trip() {
    let truth = BitSize::new(13.0, 7.0);
    let bits = [1, 0, 1, 0, 0, 1, 1, 1, 0, 1, 0, 0, 0];
    let segs = segments_for(&bits, truth, 2000.0, 1000.0);

    let cal = calibrate(&segs[0], &segs[1], &segs[2]);
    assert_eq!(cal.threshold, 1500.0);
    assert_eq!(cal.bit_size, truth);
    assert_eq!(calibrate_head(&segs), Some(cal));
    assert_eq!(calibrate_head(&segs[..2]), None);

    assert_eq!(bits_from_segments(&segs, cal.bit_size, bits.len()), bits.to_vec());
}

#[test]
fn test_uneven_preamble_averages_one_size() {
    let segs = [
        Segment::with_level(1, 8, 1500.0),
        Segment::with_level(0, 10, 900.0),
        Segment::with_level(1, 9, 1400.0),
    ];
    let cal = calibrate(&segs[0], &segs[1], &segs[2]);
    assert_eq!(cal.bit_size, BitSize::new(10.0, 8.5));
    assert_eq!(cal.threshold, (1500.0 + 1800.0 + 1400.0) / 4.0);
}

#[test]
fn test_extraction_rounds_and_floors_at_one() {
    let size = BitSize::new(10.0, 8.0);
    let segs = [
        Segment::with_level(1, 2, 1500.0),  // round(0.25) = 0 -> 1
        Segment::with_level(0, 14, 900.0),  // 1.4 -> 1
        Segment::with_level(1, 12, 1500.0), // 1.5 -> 2
        Segment::with_level(0, 26, 900.0),  // 2.6 -> 3
    ];
    assert_eq!(bits_from_segments(&segs, size, 21), vec![1, 0, 1, 1, 0, 0, 0]);
    assert_eq!(bits_from_segments(&segs, size, 4), vec![1, 0, 1, 1]);
    assert!(bits_from_segments(&[], size, 21).is_empty());
}

#[test]
fn test_repair_finds_resized_frame() {
    let truth = BitSize::new(10.0, 8.0);
    let frame = [1, 0, 1, 0, 0, 1, 1, 0, 0, 0];
    let segs = segments_for(&frame, truth, 1500.0, 900.0);

    // Zero size too large: the `00` run collapses to one bit.
    let skewed = BitSize::new(14.0, 8.0);
    assert_ne!(bits_from_segments(&segs, skewed, frame.len()), frame.to_vec());

    let mut calls = 0;
    let bits = extract_with_repair(&segs, skewed, frame.len(), |b| {
        calls += 1;
        b == frame
    });
    assert_eq!(bits, frame.to_vec());
    // default, then (-3,-3), then (-3,-1)
    assert_eq!(calls, 3);
}

#[test]
fn test_repair_skipped_without_header() {
    let segs = [Segment::with_level(0, 40, 900.0), Segment::with_level(1, 20, 1500.0)];
    let mut calls = 0;
    let bits = extract_with_repair(&segs, BitSize::new(10.0, 10.0), 21, |_| {
        calls += 1;
        false
    });
    assert_eq!(calls, 1);
    assert_eq!(bits, vec![0, 0, 0, 0, 1, 1]);
    assert!(!init_intact(&bits));
}

#[test]
fn test_repair_skips_nonpositive_sizes_and_falls_back() {
    let size = BitSize::new(1.0, 1.0);
    let segs = segments_for(&[1, 0, 1, 0], size, 1500.0, 900.0);
    let mut calls = 0;
    let bits = extract_with_repair(&segs, size, 4, |_| {
        calls += 1;
        false
    });
    // Only +1 and +3 keep both sizes positive.
    assert_eq!(calls, 1 + 4);
    assert_eq!(bits, vec![1, 0, 1, 0]);
}

#[test]
fn test_median_filter_rejects_outliers() {
    let mut f = MedianFilter::new(3);
    let raw = [900.0, 5000.0, 910.0, 1500.0, 1490.0, 20.0, 7.0];
    let out: Vec<Sample> = raw
        .iter()
        .enumerate()
        .filter_map(|(i, v)| f.push(Sample::new(100 + i as u64, *v)))
        .collect();
    assert_eq!(out, vec![Sample::new(0, 910.0), Sample::new(1, 1490.0)]);

    f.reset();
    assert_eq!(f.push(Sample::new(0, 1.0)), None);
    assert_eq!(f.push(Sample::new(1, 1.0)), None);
    assert_eq!(f.push(Sample::new(2, 1.0)), Some(Sample::new(0, 1.0)));
}

#[test]
fn test_median_filter_even_and_unit_windows() {
    let mut even = MedianFilter::new(2);
    assert_eq!(even.push(Sample::new(0, 10.0)), None);
    assert_eq!(even.push(Sample::new(1, 20.0)), Some(Sample::new(0, 15.0)));

    let mut unit = MedianFilter::new(0);
    assert_eq!(unit.window(), 1);
    assert_eq!(unit.push(Sample::new(42, 3.0)), Some(Sample::new(0, 3.0)));
    assert_eq!(unit.push(Sample::new(43, 4.0)), Some(Sample::new(1, 4.0)));
}
