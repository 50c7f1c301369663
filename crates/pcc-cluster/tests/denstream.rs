use pcc_cluster::{MicroCluster, StreamClusterer};
use pcc_core::{DenStreamParams, PcError, Sample};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn pt(s: &Sample) -> [f64; 2] {
    [s.index as f64, s.value]
}

#[test]
fn test_weight_and_count_invariants() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for lambda in [0.0, 0.01, 0.5, 2.0] {
        let mut c = MicroCluster::new(lambda, 0.0);
        for i in 0..200u64 {
            let s = Sample::new(i, rng.gen_range(800.0..1600.0));
            let w = rng.gen_range(0.1..3.0);
            c.insert(pt(&s), s, w);
            assert!(c.weight() >= 0.0);
            assert_eq!(c.point_count(), (i + 1) as usize);
            assert_eq!(c.points().len(), c.point_count());
        }
    }
}

#[test]
fn test_copy_is_isolated() {
    let mut original = MicroCluster::new(0.01, 3.0);
    for i in 0..5u64 {
        let s = Sample::new(i, 1000.0 + i as f64);
        original.insert(pt(&s), s, 1.0);
    }
    let snapshot = original.clone();

    let mut copy = original.clone();
    let s = Sample::new(99, 5000.0);
    copy.insert(pt(&s), s, 1.0);

    assert_eq!(original, snapshot);
    assert_ne!(copy.center(), original.center());
    assert_eq!(copy.point_count(), original.point_count() + 1);

    // Trial insertion never touches the cluster either.
    let r = original.trial_radius([100.0, 9000.0], 1.0);
    assert!(r > original.radius());
    assert_eq!(original, snapshot);
}

#[test]
fn test_empty_radius_is_nan() {
    let c = MicroCluster::new(0.01, 0.0);
    assert!(c.radius().is_nan());
    assert!(c.is_empty());
    // NaN never passes an eps test.
    assert!(!(c.radius() < 1.0e9));
}

#[test]
fn test_undecayed_statistics() {
    // λ = 0: plain weighted mean and sum of squared deviations.
    let mut c = MicroCluster::new(0.0, 0.0);
    c.insert([0.0, 0.0], Sample::new(0, 0.0), 1.0);
    c.insert([2.0, 0.0], Sample::new(1, 0.0), 1.0);
    assert_eq!(c.center(), [1.0, 0.0]);
    assert_eq!(c.variance(), [2.0, 0.0]);
    assert_eq!(c.weight(), 2.0);
    assert!((c.radius() - 1.0).abs() < 1e-12);
}

#[test]
fn test_decay_applies_to_prior_weight() {
    let mut c = MicroCluster::new(1.0, 0.0);
    c.insert([0.0, 0.0], Sample::new(0, 0.0), 1.0);
    c.insert([0.0, 0.0], Sample::new(1, 0.0), 1.0);
    assert!((c.weight() - 1.5).abs() < 1e-12);
    c.insert([0.0, 0.0], Sample::new(2, 0.0), 1.0);
    assert!((c.weight() - 1.75).abs() < 1e-12);
}

#[test]
fn test_merge_combines_history() {
    let mut a = MicroCluster::new(0.02, 10.0);
    let mut b = MicroCluster::new(0.04, 20.0);
    for i in 0..4u64 {
        let s = Sample::new(i, 900.0);
        a.insert([i as f64, 900.0], s, 1.0);
    }
    for i in 4..7u64 {
        let s = Sample::new(i, 1000.0);
        b.insert([i as f64, 1000.0], s, 1.0);
    }
    let m = a.merge(&b);
    assert_eq!(m.point_count(), 7);
    assert_eq!(m.points().len(), 7);
    assert!((m.lambda() - 0.03).abs() < 1e-12);
    assert_eq!(m.creation_time(), 15.0);
    assert_eq!(m.level(), 950.0);
    assert!((m.weight() - (a.weight() + b.weight())).abs() < 1e-12);
    assert_eq!(m.points()[4].index, 4);
}

#[test]
fn test_committed_radius_never_exceeds_eps() {
    let mut rng = ChaCha8Rng::seed_from_u64(1234);
    for eps in [5.0, 40.0, 100.0, 250.0] {
        let params = DenStreamParams { eps, ..DenStreamParams::default() };
        let mut clusterer = StreamClusterer::new(&params).unwrap();
        for i in 0..600u64 {
            let level = if (i / 25) % 2 == 0 { 900.0 } else { 1500.0 };
            let s = Sample::new(i, level + rng.gen_range(-60.0..60.0));
            clusterer.observe(s, 1.0);
            for c in clusterer.potential().iter().chain(clusterer.outlier()) {
                assert!(c.radius() < eps, "radius {} >= eps {}", c.radius(), eps);
            }
        }
    }
}

#[test]
fn test_two_levels_promote_two_clusters() {
    let mut clusterer = StreamClusterer::new(&DenStreamParams::default()).unwrap();
    assert_eq!(clusterer.maintenance_period(), 110);

    let mut appeared = 0;
    for i in 0..10u64 {
        if clusterer.observe(Sample::new(i, 900.0), 1.0) {
            appeared += 1;
        }
    }
    for i in 10..20u64 {
        if clusterer.observe(Sample::new(i, 1500.0), 1.0) {
            appeared += 1;
        }
    }

    assert_eq!(appeared, 2);
    assert_eq!(clusterer.potential().len(), 2);
    assert!(clusterer.outlier().is_empty());
    assert_eq!(clusterer.potential()[0].level(), 900.0);
    assert_eq!(clusterer.potential()[1].level(), 1500.0);
    let total: usize = clusterer.potential().iter().map(|c| c.point_count()).sum();
    assert_eq!(total, 20);
    assert_eq!(clusterer.tick(), 20);
}

#[test]
fn test_batch_shape_mismatch_is_rejected() {
    let mut clusterer = StreamClusterer::new(&DenStreamParams::default()).unwrap();
    let samples = [Sample::new(0, 900.0), Sample::new(1, 900.0)];
    let res = clusterer.observe_batch(&samples, Some(&[1.0]));
    assert_eq!(res, Err(PcError::ShapeMismatch));
    assert_eq!(clusterer.tick(), 0);

    assert_eq!(clusterer.observe_batch(&samples, None), Ok(1));
    assert_eq!(clusterer.tick(), 2);
}

#[test]
fn test_zero_lambda_disables_maintenance() {
    let params = DenStreamParams { lambda: 0.0, ..DenStreamParams::default() };
    let mut clusterer = StreamClusterer::new(&params).unwrap();
    assert_eq!(clusterer.maintenance_period(), u64::MAX);
    // Isolated points stay as outliers forever.
    for i in 0..5u64 {
        clusterer.observe(Sample::new(i * 1000, 900.0 + 5000.0 * i as f64), 1.0);
    }
    assert_eq!(clusterer.outlier().len(), 5);
}

#[test]
fn test_maintenance_drops_stale_outlier() {
    let params = DenStreamParams { index_scale: 0.0, ..DenStreamParams::default() };
    let mut clusterer = StreamClusterer::new(&params).unwrap();
    assert_eq!(clusterer.maintenance_period(), 110);

    let is_spike = |c: &MicroCluster| c.level() == 5000.0;
    clusterer.observe(Sample::new(0, 5000.0), 1.0);
    for i in 1..110u64 {
        clusterer.observe(Sample::new(i, 1000.0), 1.0);
    }
    // Survives the t=0 pass: ξ is exactly its weight at birth.
    assert_eq!(clusterer.tick(), 110);
    assert!(clusterer.outlier().iter().any(is_spike));

    // The t=110 pass wants ξ ≈ 1.47 from it.
    clusterer.observe(Sample::new(110, 1000.0), 1.0);
    assert!(!clusterer.outlier().iter().any(is_spike));
    assert_eq!(clusterer.potential().len(), 1);
    assert_eq!(clusterer.potential()[0].level(), 1000.0);
}

#[test]
fn test_maintenance_drops_light_potential_cluster() {
    let params = DenStreamParams { lambda: 0.5, index_scale: 0.0, ..DenStreamParams::default() };
    let floor = params.beta * params.mu;

    for (weight, survives) in [(0.05, false), (1.0, true)] {
        let mut clusterer = StreamClusterer::new(&params).unwrap();
        assert_eq!(clusterer.maintenance_period(), 3);

        clusterer.observe(Sample::new(0, 1000.0), 1.0);
        assert!(clusterer.observe(Sample::new(1, 1000.0), 1.0));
        clusterer.observe(Sample::new(2, 1000.0), weight);
        assert_eq!(clusterer.potential().len(), 1);

        clusterer.observe(Sample::new(3, 1000.0), weight);
        if survives {
            assert_eq!(clusterer.potential().len(), 1);
            assert!(clusterer.potential()[0].weight() >= floor);
        } else {
            assert!(clusterer.potential().is_empty());
        }
        assert!(clusterer.outlier().is_empty());
    }
}
