use super::*;

fn assert_contiguous(sections: &[Section], duration: f64) {
    for w in sections.windows(2) {
        assert_eq!(w[0].end, w[1].start);
    }
    assert_eq!(sections.last().map(|s| s.end), Some(duration));
}

#[test]
fn empty_input_yields_no_sections() {
    assert!(normalize_sections(&[], 10.0).is_empty());
}

#[test]
fn end_only_entries_become_contiguous_labeled_sections() {
    let raw = vec![
        SectionInput::end_only(3.0),
        SectionInput::end_only(7.5),
        SectionInput::end_only(12.0),
    ];
    let s = normalize_sections(&raw, 12.0);
    assert_eq!(s.len(), 3);
    assert_eq!(s[0].start, 0.0);
    assert_eq!(
        s.iter().map(|x| x.label.as_str()).collect::<Vec<_>>(),
        vec!["A", "B", "C"]
    );
    assert_contiguous(&s, 12.0);
}

#[test]
fn short_final_boundary_is_extended_to_duration() {
    let raw = vec![SectionInput::end_only(1.0), SectionInput::end_only(1.9)];
    let s = normalize_sections(&raw, 2.0);
    assert_contiguous(&s, 2.0);
}

#[test]
fn contiguity_holds_for_many_boundary_sets() {
    for n in 1..40usize {
        let duration = n as f64 * 1.5;
        let raw: Vec<SectionInput> = (1..=n)
            .map(|i| SectionInput::end_only(i as f64 * 1.5 - 0.01 * (i % 3) as f64))
            .collect();
        let s = normalize_sections(&raw, duration);
        assert_eq!(s.len(), n);
        assert_contiguous(&s, duration);
    }
}

#[test]
fn entries_with_start_pass_through() {
    let raw = vec![
        SectionInput {
            start: Some(0.0),
            end: Some(4.0),
            label: Some("intro".into()),
        },
        SectionInput {
            start: Some(4.0),
            end: Some(9.0),
            label: Some("drop".into()),
        },
    ];
    let s = normalize_sections(&raw, 20.0);
    assert_eq!(
        s,
        vec![
            Section {
                start: 0.0,
                end: 4.0,
                label: "intro".into()
            },
            Section {
                start: 4.0,
                end: 9.0,
                label: "drop".into()
            },
        ]
    );
}

#[test]
fn missing_end_boundary_collapses_to_previous() {
    let raw = vec![
        SectionInput::end_only(2.0),
        SectionInput::default(),
        SectionInput::end_only(5.0),
    ];
    let s = normalize_sections(&raw, 5.0);
    assert_eq!((s[1].start, s[1].end), (2.0, 2.0));
    assert_contiguous(&s, 5.0);
}

#[test]
fn labels_continue_past_z() {
    assert_eq!(alpha_label(0), "A");
    assert_eq!(alpha_label(25), "Z");
    assert_eq!(alpha_label(26), "AA");
    assert_eq!(alpha_label(27), "AB");
    assert_eq!(alpha_label(52), "BA");
}
