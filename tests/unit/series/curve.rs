use super::*;

fn pairs(p: &[(f64, f64)]) -> Curve {
    Curve::from_input(CurveInput::Pairs(p.to_vec()))
}

#[test]
fn empty_curve_samples_zero() {
    let c = Curve::default();
    assert_eq!(c.sample(0.0), 0.0);
    assert_eq!(c.sample(12.5), 0.0);
}

#[test]
fn dense_input_spreads_over_unit_time() {
    let c = Curve::from_input(CurveInput::Dense(vec![3.0, 1.0, 4.0, 1.0, 5.0]));
    let ts: Vec<f64> = c.keys().iter().map(|k| k.t).collect();
    assert_eq!(ts, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    let vs: Vec<f64> = c.keys().iter().map(|k| k.v).collect();
    assert_eq!(vs, vec![3.0, 1.0, 4.0, 1.0, 5.0]);
}

#[test]
fn dense_single_value_sits_at_zero() {
    let c = Curve::from_input(CurveInput::Dense(vec![0.7]));
    assert_eq!(c.keys(), &[Keyframe::new(0.0, 0.7)]);
    assert_eq!(c.sample(-1.0), 0.7);
    assert_eq!(c.sample(5.0), 0.7);
}

#[test]
fn pairs_are_sorted_by_time() {
    let c = pairs(&[(2.0, 20.0), (0.0, 0.0), (1.0, 10.0)]);
    let ts: Vec<f64> = c.keys().iter().map(|k| k.t).collect();
    assert_eq!(ts, vec![0.0, 1.0, 2.0]);
}

#[test]
fn sampling_clamps_at_boundaries() {
    let c = pairs(&[(1.0, 4.0), (3.0, 8.0)]);
    assert_eq!(c.sample(0.0), 4.0);
    assert_eq!(c.sample(1.0), 4.0);
    assert_eq!(c.sample(3.0), 8.0);
    assert_eq!(c.sample(100.0), 8.0);
}

#[test]
fn interior_samples_interpolate_linearly_and_stay_bracketed() {
    let c = pairs(&[(0.0, 1.0), (1.0, -1.0), (2.0, 5.0)]);
    assert!((c.sample(0.5) - 0.0).abs() < 1e-12);
    assert!((c.sample(1.5) - 2.0).abs() < 1e-12);

    for i in 1..100 {
        let t = i as f64 / 50.0;
        let v = c.sample(t);
        let (v0, v1): (f64, f64) = if t < 1.0 { (1.0, -1.0) } else { (-1.0, 5.0) };
        assert!(v >= v0.min(v1) - 1e-12 && v <= v0.max(v1) + 1e-12, "t={t} v={v}");
    }
}

#[test]
fn degenerate_time_delta_does_not_divide_by_zero() {
    let c = pairs(&[(0.0, 0.0), (1.0, 1.0), (1.0, 3.0), (2.0, 3.0)]);
    let v = c.sample(1.0 - 1e-9);
    assert!(v.is_finite());
    assert!(c.sample(1.5).is_finite());
}

#[test]
fn non_finite_inputs_are_sanitized() {
    let c = pairs(&[(f64::NAN, 1.0), (0.0, f64::INFINITY), (1.0, 2.0)]);
    assert_eq!(c.keys().len(), 2);
    assert_eq!(c.sample(0.0), 0.0);
    assert_eq!(c.sample(f64::NAN), 0.0);
}

#[test]
fn resample_covers_span_inclusive() {
    let c = pairs(&[(0.0, 0.0), (10.0, 100.0)]);
    let pts = c.resample(4, 10.0);
    assert_eq!(pts.len(), 5);
    assert_eq!(pts[0], (0.0, 0.0));
    assert_eq!(pts[2], (0.5, 50.0));
    assert_eq!(pts[4], (1.0, 100.0));
}

#[test]
fn dense_curves_sample_over_track_progress() {
    let c = Curve::from_input(CurveInput::Dense(vec![0.0, 1.0, 0.0]));
    assert_eq!(c.time_base(), TimeBase::Normalized);
    assert!((c.sample_secs(0.5, 2.0) - 0.5).abs() < 1e-12);
    assert!((c.sample_secs(1.0, 2.0) - 1.0).abs() < 1e-12);
    assert_eq!(c.sample_secs(3.0, 2.0), 0.0);
    assert_eq!(c.sample_secs(1.0, 0.0), 0.0);

    let pairs = pairs(&[(0.0, 0.0), (2.0, 2.0)]);
    assert_eq!(pairs.time_base(), TimeBase::Seconds);
    assert_eq!(pairs.sample_secs(1.0, 100.0), 1.0);
}
