use super::*;
use serde_json::json;

fn parse(v: serde_json::Value) -> DescriptorDef {
    serde_json::from_value(v).unwrap()
}

#[test]
fn empty_object_resolves_to_defaults() {
    let d = parse(json!({}));
    assert_eq!(d.duration_secs(), 0.0);
    assert!(d.beat_times().is_empty());
    assert!(d.section_inputs().is_empty());
    assert_eq!(d.palette_input(), PaletteInput::Missing);
    assert_eq!(d.loudness_input(), CurveInput::Pairs(vec![]));
    assert_eq!(d.pitch_input(), CurveInput::Pairs(vec![]));
    assert_eq!(d.point_color.0, None);
    assert_eq!(d.audio_url.0, None);
}

#[test]
fn non_object_document_is_rejected() {
    assert!(DescriptorDef::from_json_str("[1,2,3]").is_err());
    assert!(DescriptorDef::from_json_str("not json").is_err());
    assert!(DescriptorDef::from_json_str("42").is_err());

    // Structs would otherwise accept a positional array.
    let err = DescriptorDef::from_json_str("[5, [1.0, 2.0]]").unwrap_err();
    assert!(matches!(err, VizError::Descriptor(_)), "{err:?}");
    assert!(DescriptorDef::from_value(json!(null)).is_err());
}

#[test]
fn wrongly_typed_fields_degrade_to_defaults() {
    let d = parse(json!({
        "duration": "12.5",
        "beats": "nope",
        "sections": 4,
        "palette": 17,
        "point_color": false,
        "rms": "loud",
        "pitch": {"t": 1},
        "audio_url": ["x"]
    }));
    assert_eq!(d.duration_secs(), 12.5);
    assert!(d.beat_times().is_empty());
    assert!(d.section_inputs().is_empty());
    assert_eq!(d.palette_input(), PaletteInput::Missing);
    assert_eq!(d.loudness_input(), CurveInput::Pairs(vec![]));
    assert_eq!(d.pitch_input(), CurveInput::Pairs(vec![]));
    assert_eq!(d.point_color.0, None);
    assert_eq!(d.audio_url.0, None);
}

#[test]
fn negative_duration_reads_as_zero() {
    assert_eq!(parse(json!({"duration": -3})).duration_secs(), 0.0);
}

#[test]
fn beats_are_sorted_and_invalid_entries_dropped() {
    let d = parse(json!({"beats": [2.0, "1.5", null, 0.5, "x"]}));
    assert_eq!(d.beat_times(), vec![0.5, 1.5, 2.0]);
}

#[test]
fn dense_and_pair_loudness_shapes_are_distinguished() {
    let d = parse(json!({"rms": [0, 1, 0]}));
    assert_eq!(d.loudness_input(), CurveInput::Dense(vec![0.0, 1.0, 0.0]));

    let d = parse(json!({"rms": [{"t": 1.0, "v": 0.2}, {"t": 0.0, "v": 0.1}, {"v": 9}]}));
    assert_eq!(
        d.loudness_input(),
        CurveInput::Pairs(vec![(1.0, 0.2), (0.0, 0.1)])
    );
}

#[test]
fn pitch_reads_hz_with_zero_default() {
    let d = parse(json!({"pitch": [{"t": 0.5, "hz": 220}, {"t": 1.0}]}));
    assert_eq!(
        d.pitch_input(),
        CurveInput::Pairs(vec![(0.5, 220.0), (1.0, 0.0)])
    );
}

#[test]
fn section_shapes_preserve_start_presence() {
    let d = parse(json!({"sections": [{"end": 1}, {"end": 2}]}));
    let s = d.section_inputs();
    assert_eq!(s, vec![SectionInput::end_only(1.0), SectionInput::end_only(2.0)]);

    let d = parse(json!({"sections": [{"start": 0, "end": 3, "label": "intro"}]}));
    let s = d.section_inputs();
    assert_eq!(s[0].start, Some(0.0));
    assert_eq!(s[0].label.as_deref(), Some("intro"));
}

#[test]
fn palette_shapes_are_distinguished() {
    let d = parse(json!({"palette": ["#111", 5, "#222"]}));
    assert_eq!(
        d.palette_input(),
        PaletteInput::List(vec!["#111".into(), "#222".into()])
    );

    let d = parse(json!({"palette": {"1": "#bbb", "0": "#aaa"}}));
    let PaletteInput::Keyed(entries) = d.palette_input() else {
        panic!("expected keyed palette");
    };
    assert_eq!(entries.len(), 2);
}
