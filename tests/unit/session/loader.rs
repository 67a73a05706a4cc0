use super::*;

fn temp_descriptor(name: &str, body: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("beatglow-loader-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn source_parse_distinguishes_urls_and_paths() {
    assert_eq!(
        DescriptorSource::parse("https://host/result.json"),
        DescriptorSource::Url("https://host/result.json".to_owned())
    );
    assert_eq!(
        DescriptorSource::parse(" HTTP://host/x "),
        DescriptorSource::Url("HTTP://host/x".to_owned())
    );
    assert_eq!(
        DescriptorSource::parse("data/song.json"),
        DescriptorSource::Path(PathBuf::from("data/song.json"))
    );
    assert_eq!(
        DescriptorSource::parse("httpdocs/a.json"),
        DescriptorSource::Path(PathBuf::from("httpdocs/a.json"))
    );
}

#[test]
fn load_model_reads_local_file() {
    let path = temp_descriptor("ok.json", r#"{"duration": 4, "beats": [1, 2]}"#);
    let m = load_model(&DescriptorSource::Path(path), &ModelOptions::default()).unwrap();
    assert_eq!(m.duration(), 4.0);
    assert_eq!(m.beats(), &[1.0, 2.0]);
}

#[test]
fn missing_file_is_a_fetch_error() {
    let err = fetch_descriptor(&DescriptorSource::Path(PathBuf::from(
        "/no/such/beatglow/descriptor.json",
    )))
    .unwrap_err();
    assert!(matches!(err, VizError::Fetch(_)), "{err:?}");
}

#[test]
fn publish_respects_liveness() {
    let slot = ModelSlot::new();
    let alive = AtomicBool::new(false);
    let model = || Ok(VisualizationModel::from_descriptor(&DescriptorDef::default(), &ModelOptions::default()));

    assert!(!publish_if_alive(&slot, &alive, model()));
    assert!(slot.load().is_none());

    alive.store(true, Ordering::Release);
    assert!(publish_if_alive(&slot, &alive, model()));
    assert!(slot.load().is_some());

    assert!(!publish_if_alive(&slot, &alive, Err(VizError::fetch("boom"))));
    assert!(slot.load().is_some());

    slot.clear();
    assert!(slot.load().is_none());
}

#[test]
fn retract_only_removes_the_given_model() {
    let slot = ModelSlot::new();
    let build = || {
        Arc::new(VisualizationModel::from_descriptor(
            &DescriptorDef::default(),
            &ModelOptions::default(),
        ))
    };
    let stale = build();
    let fresh = build();

    slot.publish(Arc::clone(&stale));
    slot.publish(Arc::clone(&fresh));
    assert!(!slot.retract(&stale));
    assert!(Arc::ptr_eq(&slot.load().unwrap(), &fresh));

    assert!(slot.retract(&fresh));
    assert!(slot.load().is_none());
    assert!(!slot.retract(&fresh));
}

#[test]
fn spawned_fetch_publishes_into_slot() {
    let path = temp_descriptor("spawn.json", r#"{"duration": 3}"#);
    let slot = ModelSlot::new();
    let alive = Arc::new(AtomicBool::new(true));
    let handle = spawn_fetch(
        DescriptorSource::Path(path),
        ModelOptions::default(),
        slot.clone(),
        alive,
    )
    .unwrap();
    handle.join().unwrap();
    assert_eq!(slot.load().map(|m| m.duration()), Some(3.0));
}

#[test]
fn spawned_fetch_failure_leaves_slot_empty() {
    let slot = ModelSlot::new();
    let handle = spawn_fetch(
        DescriptorSource::Path(PathBuf::from("/no/such/beatglow/x.json")),
        ModelOptions::default(),
        slot.clone(),
        Arc::new(AtomicBool::new(true)),
    )
    .unwrap();
    handle.join().unwrap();
    assert!(slot.load().is_none());
}

#[test]
fn late_fetch_after_teardown_is_discarded() {
    let path = temp_descriptor("late.json", r#"{"duration": 3}"#);
    let slot = ModelSlot::new();
    let handle = spawn_fetch(
        DescriptorSource::Path(path),
        ModelOptions::default(),
        slot.clone(),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();
    handle.join().unwrap();
    assert!(slot.load().is_none());
}
