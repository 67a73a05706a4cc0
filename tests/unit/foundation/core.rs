use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn fps_ceil_covers_duration() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.secs_to_frames_ceil(2.0), 60);
    assert_eq!(fps.secs_to_frames_ceil(2.01), 61);
    assert_eq!(fps.secs_to_frames_ceil(0.0), 0);
    assert_eq!(fps.secs_to_frames_ceil(f64::NAN), 0);
}

#[test]
fn with_alpha_clamps_and_handles_nan() {
    assert_eq!(Rgba8::WHITE.with_alpha(2.0).a, 255);
    assert_eq!(Rgba8::WHITE.with_alpha(0.5).a, 128);
    assert_eq!(Rgba8::WHITE.with_alpha(f64::NAN).a, 0);
}

#[test]
fn canvas_min_side() {
    let c = Canvas {
        width: 800,
        height: 420,
    };
    assert_eq!(c.min_side(), 420.0);
}
