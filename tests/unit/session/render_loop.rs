use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::foundation::error::VizError;
use crate::model::ModelOptions;
use crate::render::compile::IDLE_BACKGROUND;
use crate::render::cpu::CpuBackend;
use crate::schema::descriptor::DescriptorDef;

#[derive(Default)]
struct RecordingHost {
    next: u64,
    pending: Vec<FrameRequestId>,
    cancelled: Vec<FrameRequestId>,
    subs: Vec<ResizeSubscription>,
    presented: Vec<FrameRGBA>,
}

impl FrameHost for RecordingHost {
    fn request_frame(&mut self) -> FrameRequestId {
        self.next += 1;
        let id = FrameRequestId(self.next);
        self.pending.push(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameRequestId) {
        self.pending.retain(|p| *p != id);
        self.cancelled.push(id);
    }

    fn subscribe_resize(&mut self) -> ResizeSubscription {
        self.next += 1;
        let sub = ResizeSubscription(self.next);
        self.subs.push(sub);
        sub
    }

    fn unsubscribe_resize(&mut self, sub: ResizeSubscription) {
        self.subs.retain(|s| *s != sub);
    }

    fn present(&mut self, frame: &FrameRGBA) {
        self.presented.push(frame.clone());
    }
}

#[derive(Default)]
struct RecordingBackend {
    plans: Vec<FramePlan>,
    fail: bool,
}

impl RenderBackend for RecordingBackend {
    fn render_plan(&mut self, plan: &FramePlan) -> VizResult<FrameRGBA> {
        if self.fail {
            return Err(VizError::render("synthetic failure"));
        }
        self.plans.push(plan.clone());
        Ok(FrameRGBA {
            width: plan.canvas.width,
            height: plan.canvas.height,
            data: Vec::new(),
            premultiplied: true,
        })
    }
}

type Clock = Box<dyn Fn() -> Option<f64>>;

fn clock() -> (Rc<Cell<f64>>, Clock) {
    let pos = Rc::new(Cell::new(0.0));
    let p = Rc::clone(&pos);
    (pos, Box::new(move || Some(p.get())))
}

fn small_config() -> RenderConfig {
    RenderConfig {
        surface: SurfaceConfig {
            css_width: 40.0,
            css_height: 20.0,
            device_pixel_ratio: 1.0,
        },
        ..RenderConfig::default()
    }
}

fn model(json: &str) -> Arc<VisualizationModel> {
    let def = DescriptorDef::from_json_str(json).unwrap();
    Arc::new(VisualizationModel::from_descriptor(
        &def,
        &ModelOptions::default(),
    ))
}

/// Grant the host's pending request and run the callback.
fn pump<C: PlaybackClock, B: RenderBackend>(lp: &mut RenderLoop<RecordingHost, C, B>, ts_ms: f64) {
    lp.host_mut().pending.pop();
    lp.on_frame(ts_ms);
}

#[test]
fn idle_frame_is_rendered_without_a_model() {
    let (_, clock) = clock();
    let mut lp = RenderLoop::new(
        RecordingHost::default(),
        clock,
        CpuBackend::new(),
        small_config(),
        ModelSlot::new(),
    );
    lp.start();
    assert_eq!(lp.host().pending.len(), 1);
    assert_eq!(lp.host().subs.len(), 1);

    pump(&mut lp, 0.0);
    let frame = &lp.host().presented[0];
    assert_eq!((frame.width, frame.height), (40, 20));
    assert!(
        frame
            .data
            .chunks_exact(4)
            .all(|px| px == [IDLE_BACKGROUND.r, IDLE_BACKGROUND.g, IDLE_BACKGROUND.b, 255])
    );
    assert_eq!(lp.stats().idle_frames, 1);
    assert_eq!(lp.host().pending.len(), 1, "idle loop keeps scheduling");
}

#[test]
fn teardown_leaves_no_callbacks_behind() {
    let (_, clock) = clock();
    let mut lp = RenderLoop::new(
        RecordingHost::default(),
        clock,
        RecordingBackend::default(),
        small_config(),
        ModelSlot::new(),
    );
    lp.start();
    pump(&mut lp, 0.0);
    pump(&mut lp, 16.0);
    let alive = lp.liveness();
    assert!(alive.load(Ordering::Acquire));

    lp.teardown();
    assert!(lp.host().pending.is_empty());
    assert!(lp.host().subs.is_empty());
    assert_eq!(lp.host().cancelled.len(), 1);
    assert!(!alive.load(Ordering::Acquire));
    assert_eq!(lp.state(), LoopState::TornDown);

    lp.on_frame(32.0);
    lp.on_resize(SurfaceConfig::default());
    assert_eq!(lp.host().presented.len(), 2);
    assert!(lp.host().pending.is_empty());
    assert!(!lp.has_pending_frame());

    lp.teardown();
    assert_eq!(lp.host().cancelled.len(), 1);
}

#[test]
fn frame_callbacks_before_start_are_ignored() {
    let (_, clock) = clock();
    let mut lp = RenderLoop::new(
        RecordingHost::default(),
        clock,
        RecordingBackend::default(),
        small_config(),
        ModelSlot::new(),
    );
    lp.on_frame(0.0);
    assert!(lp.host().presented.is_empty());
    assert!(lp.host().pending.is_empty());
}

#[test]
fn beats_fire_once_across_backward_seeks() {
    let (pos, clock) = clock();
    let slot = ModelSlot::new();
    slot.publish(model(r#"{"duration": 10, "beats": [0.5, 1.0, 1.1]}"#));
    let mut lp = RenderLoop::new(
        RecordingHost::default(),
        clock,
        RecordingBackend::default(),
        small_config(),
        slot,
    );
    lp.start();

    let mut fired = Vec::new();
    for (i, t) in [0.0, 0.5, 1.2, 1.2, 0.9].into_iter().enumerate() {
        pos.set(t);
        pump(&mut lp, i as f64 * 16.0);
        fired.push(lp.stats().beats_fired);
    }
    assert_eq!(fired, vec![0, 1, 3, 3, 3]);
}

#[test]
fn model_replacement_resets_effects() {
    let (pos, clock) = clock();
    let json = r#"{"duration": 4, "beats": [1.0]}"#;
    let slot = ModelSlot::new();
    slot.publish(model(json));
    let mut lp = RenderLoop::new(
        RecordingHost::default(),
        clock,
        RecordingBackend::default(),
        small_config(),
        slot.clone(),
    );
    lp.start();
    pos.set(2.0);
    pump(&mut lp, 0.0);
    assert_eq!(lp.stats().beats_fired, 1);
    assert_eq!(lp.simulator().cursor().position(), 1);

    pump(&mut lp, 16.0);
    assert_eq!(lp.stats().beats_fired, 1);

    slot.publish(model(json));
    pump(&mut lp, 32.0);
    assert_eq!(lp.stats().model_swaps, 2);
    assert_eq!(lp.stats().beats_fired, 2);
}

#[test]
fn unloading_the_model_returns_to_idle() {
    let (_, clock) = clock();
    let slot = ModelSlot::new();
    slot.publish(model(r##"{"duration": 4, "palette": ["#ff0000"]}"##));
    let mut lp = RenderLoop::new(
        RecordingHost::default(),
        clock,
        RecordingBackend::default(),
        small_config(),
        slot.clone(),
    );
    lp.start();
    pump(&mut lp, 0.0);
    slot.clear();
    pump(&mut lp, 16.0);

    let plans = &lp.backend.plans;
    assert_eq!(plans[0].background(), Some(crate::foundation::core::Rgba8::rgb(255, 0, 0)));
    assert_eq!(plans[1].background(), Some(IDLE_BACKGROUND));
    assert_eq!(lp.stats().idle_frames, 1);
}

#[test]
fn collections_stay_within_caps() {
    let (pos, clock) = clock();
    let beats: Vec<String> = (0..50).map(|i| format!("{}", i as f64 * 0.1)).collect();
    let slot = ModelSlot::new();
    slot.publish(model(&format!(
        r#"{{"duration": 5, "rms": [1, 1], "beats": [{}]}}"#,
        beats.join(",")
    )));
    let cfg = RenderConfig {
        max_particles: 40,
        max_rings: 3,
        ..small_config()
    };
    let mut lp = RenderLoop::new(
        RecordingHost::default(),
        clock,
        RecordingBackend::default(),
        cfg,
        slot,
    );
    lp.start();
    for i in 0..60 {
        pos.set(i as f64 * 0.1);
        pump(&mut lp, i as f64 * 100.0);
        assert!(lp.simulator().particles().len() <= 40);
        assert!(lp.simulator().rings().len() <= 3);
        assert!(lp.simulator().particles().all(|p| p.life > 0.0));
    }
}

#[test]
fn tick_errors_are_swallowed_and_scheduling_continues() {
    let (_, clock) = clock();
    let mut lp = RenderLoop::new(
        RecordingHost::default(),
        clock,
        RecordingBackend {
            plans: Vec::new(),
            fail: true,
        },
        small_config(),
        ModelSlot::new(),
    );
    lp.start();
    pump(&mut lp, 0.0);
    pump(&mut lp, 16.0);
    assert_eq!(lp.stats().errors, 2);
    assert_eq!(lp.stats().frames, 0);
    assert_eq!(lp.host().pending.len(), 1);
}

#[test]
fn resize_updates_backing_store() {
    let (_, clock) = clock();
    let mut lp = RenderLoop::new(
        RecordingHost::default(),
        clock,
        RecordingBackend::default(),
        small_config(),
        ModelSlot::new(),
    );
    lp.start();
    lp.on_resize(SurfaceConfig {
        css_width: 10.0,
        css_height: 7.0,
        device_pixel_ratio: 2.0,
    });
    pump(&mut lp, 0.0);
    assert_eq!(
        lp.canvas(),
        Canvas {
            width: 20,
            height: 14
        }
    );
    let f = &lp.host().presented[0];
    assert_eq!((f.width, f.height), (20, 14));
}

#[test]
fn unknown_positions_read_as_zero() {
    assert_eq!(read_position(&|| None::<f64>), 0.0);
    assert_eq!(read_position(&|| Some(f64::NAN)), 0.0);
    assert_eq!(read_position(&|| Some(f64::INFINITY)), 0.0);
    assert_eq!(read_position(&|| Some(2.5)), 2.5);
}
