use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::{RenderConfig, SurfaceConfig};
use crate::effects::simulator::{EffectSimulator, SpawnContext, step_secs};
use crate::foundation::core::Canvas;
use crate::foundation::error::VizResult;
use crate::model::VisualizationModel;
use crate::render::backend::{FrameRGBA, RenderBackend};
use crate::render::compile::{FramePlan, FrameSample, compile_frame, compile_idle};
use crate::session::loader::ModelSlot;

/// Handle for a pending frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameRequestId(pub u64);

/// Handle for a resize subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResizeSubscription(pub u64);

/// The environment that schedules frames and displays them.
///
/// A host calls [`RenderLoop::on_frame`] once per granted request and
/// [`RenderLoop::on_resize`] while a resize subscription is active.
pub trait FrameHost {
    /// Ask for one frame callback.
    fn request_frame(&mut self) -> FrameRequestId;
    /// Withdraw a pending frame callback.
    fn cancel_frame(&mut self, id: FrameRequestId);
    /// Start delivering resize notifications.
    fn subscribe_resize(&mut self) -> ResizeSubscription;
    /// Stop delivering resize notifications.
    fn unsubscribe_resize(&mut self, sub: ResizeSubscription);
    /// Display a finished frame.
    fn present(&mut self, frame: &FrameRGBA);
}

/// Source of the current playback position in seconds.
pub trait PlaybackClock {
    /// `None` while no position is known.
    fn position_secs(&self) -> Option<f64>;
}

impl<F> PlaybackClock for F
where
    F: Fn() -> Option<f64>,
{
    fn position_secs(&self) -> Option<f64> {
        self()
    }
}

/// Playback position with unknown, NaN or infinite values read as `0`.
pub fn read_position(clock: &dyn PlaybackClock) -> f64 {
    match clock.position_secs() {
        Some(t) if t.is_finite() => t,
        _ => 0.0,
    }
}

/// Lifecycle of a [`RenderLoop`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Constructed; nothing is subscribed on the host yet.
    Created,
    /// Started; a frame request and a resize subscription are held.
    Running,
    /// Torn down; frame and resize callbacks are ignored.
    TornDown,
}

/// Counters accumulated over the loop's lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Frames rendered and presented.
    pub frames: u64,
    /// Frames drawn with no model loaded.
    pub idle_frames: u64,
    /// Ticks whose render failed and were skipped.
    pub errors: u64,
    /// Beats fired across all frames.
    pub beats_fired: u64,
    /// Times the model in the slot changed and effects were reset.
    pub model_swaps: u64,
}

/// Per-frame orchestration: sample the model, advance effects, draw, and reschedule.
///
/// The loop owns its frame and resize subscriptions. After [`RenderLoop::teardown`] no
/// subscription remains on the host and late callbacks are ignored.
pub struct RenderLoop<H: FrameHost, C: PlaybackClock, B: RenderBackend> {
    host: H,
    clock: C,
    backend: B,
    cfg: RenderConfig,
    slot: ModelSlot,
    alive: Arc<AtomicBool>,
    canvas: Canvas,
    sim: EffectSimulator,
    current: Option<Arc<VisualizationModel>>,
    prev_ts_ms: Option<f64>,
    pending: Option<FrameRequestId>,
    resize_sub: Option<ResizeSubscription>,
    state: LoopState,
    stats: LoopStats,
}

impl<H: FrameHost, C: PlaybackClock, B: RenderBackend> RenderLoop<H, C, B> {
    /// Build a loop in the [`LoopState::Created`] state; call [`RenderLoop::start`] to run it.
    pub fn new(host: H, clock: C, backend: B, cfg: RenderConfig, slot: ModelSlot) -> Self {
        let sim = EffectSimulator::new(cfg.effect_params(), cfg.seed);
        let canvas = cfg.surface.pixel_canvas();
        Self {
            host,
            clock,
            backend,
            cfg,
            slot,
            alive: Arc::new(AtomicBool::new(true)),
            canvas,
            sim,
            current: None,
            prev_ts_ms: None,
            pending: None,
            resize_sub: None,
            state: LoopState::Created,
            stats: LoopStats::default(),
        }
    }

    /// Subscribe to resizes and request the first frame. Calling it again is a no-op.
    pub fn start(&mut self) {
        if self.state != LoopState::Created {
            return;
        }
        self.resize_sub = Some(self.host.subscribe_resize());
        self.pending = Some(self.host.request_frame());
        self.state = LoopState::Running;
        tracing::debug!(
            width = self.canvas.width,
            height = self.canvas.height,
            "render loop started"
        );
    }

    /// Run one tick for a frame callback at host timestamp `ts_ms`.
    ///
    /// Errors are logged and counted; the next frame is always requested while running.
    pub fn on_frame(&mut self, ts_ms: f64) {
        if self.state != LoopState::Running {
            tracing::debug!(state = ?self.state, "ignoring frame callback");
            return;
        }
        self.pending = None;

        match self.tick(ts_ms) {
            Ok(frame) => {
                self.host.present(&frame);
                self.stats.frames += 1;
            }
            Err(e) => {
                self.stats.errors += 1;
                tracing::warn!(error = %e, "frame tick failed");
            }
        }

        self.pending = Some(self.host.request_frame());
    }

    /// Apply a new surface size. Ignored after teardown.
    pub fn on_resize(&mut self, surface: SurfaceConfig) {
        if self.state == LoopState::TornDown {
            return;
        }
        self.cfg.surface = surface;
        self.canvas = surface.pixel_canvas();
        tracing::debug!(
            width = self.canvas.width,
            height = self.canvas.height,
            "surface resized"
        );
    }

    /// Cancel the pending frame and the resize subscription, then release the model.
    ///
    /// Clears the liveness flag so in-flight fetches are discarded. Idempotent.
    pub fn teardown(&mut self) {
        if self.state == LoopState::TornDown {
            return;
        }
        if let Some(id) = self.pending.take() {
            self.host.cancel_frame(id);
        }
        if let Some(sub) = self.resize_sub.take() {
            self.host.unsubscribe_resize(sub);
        }
        self.alive.store(false, Ordering::Release);
        self.state = LoopState::TornDown;
        self.current = None;
        self.sim.reset();
        tracing::debug!(frames = self.stats.frames, "render loop torn down");
    }

    fn tick(&mut self, ts_ms: f64) -> VizResult<FrameRGBA> {
        let dt = step_secs(self.prev_ts_ms, ts_ms);
        self.prev_ts_ms = Some(ts_ms);

        let model = self.slot.load();
        let swapped = match (&self.current, &model) {
            (Some(a), Some(b)) => !Arc::ptr_eq(a, b),
            (None, None) => false,
            _ => true,
        };
        if swapped {
            self.sim.reset();
            self.current = model.clone();
            self.stats.model_swaps += 1;
            tracing::info!(loaded = model.is_some(), "model replaced; effects reset");
        }

        let plan = match model.as_deref() {
            Some(m) => self.plan_model_frame(m, dt),
            None => {
                self.stats.idle_frames += 1;
                compile_idle(self.canvas)
            }
        };
        self.backend.render_plan(&plan)
    }

    fn plan_model_frame(&mut self, model: &VisualizationModel, dt: f64) -> FramePlan {
        let t = read_position(&self.clock);
        let sample = FrameSample::at(model, t, self.cfg.sensitivity);
        let ctx = SpawnContext {
            canvas: self.canvas,
            dpr: self.cfg.surface.dpr(),
            duration: model.duration(),
            palette: model.palette(),
        };
        let fired = self.sim.fire_beats(model.beats(), t, &ctx);
        self.stats.beats_fired += fired as u64;
        self.sim.spawn_ambient(sample.loudness, &ctx);
        self.sim.step(dt);
        compile_frame(model, &sample, &self.sim, &self.cfg, self.canvas)
    }

    /// Flag cleared on teardown; hand it to [`spawn_fetch`](crate::spawn_fetch).
    pub fn liveness(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.alive)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Counters so far.
    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Backing store size in device pixels.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Active configuration, including the latest surface size.
    pub fn config(&self) -> &RenderConfig {
        &self.cfg
    }

    /// Live particle and ring state.
    pub fn simulator(&self) -> &EffectSimulator {
        &self.sim
    }

    /// Slot the loop reads its model from.
    pub fn slot(&self) -> &ModelSlot {
        &self.slot
    }

    /// Whether a frame callback is outstanding.
    pub fn has_pending_frame(&self) -> bool {
        self.pending.is_some()
    }

    /// The frame host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the frame host, e.g. to deliver a granted callback.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Mutable access to the playback clock.
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}

impl<H: FrameHost, C: PlaybackClock, B: RenderBackend> Drop for RenderLoop<H, C, B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/render_loop.rs"]
mod tests;
