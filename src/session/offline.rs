use std::sync::Arc;

use crate::config::RenderConfig;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{VizError, VizResult};
use crate::model::VisualizationModel;
use crate::render::backend::FrameRGBA;
use crate::render::cpu::CpuBackend;
use crate::session::loader::ModelSlot;
use crate::session::render_loop::{
    FrameHost, FrameRequestId, PlaybackClock, RenderLoop, ResizeSubscription,
};

/// A frame host with no display: it grants one callback at a time and keeps the last frame.
#[derive(Debug, Default)]
pub struct OfflineHost {
    next_id: u64,
    pending: Option<FrameRequestId>,
    resize: Option<ResizeSubscription>,
    last: Option<FrameRGBA>,
}

impl OfflineHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the outstanding request, if any, so its callback can be delivered.
    pub fn grant(&mut self) -> Option<FrameRequestId> {
        self.pending.take()
    }

    /// Take the most recently presented frame.
    pub fn take_frame(&mut self) -> Option<FrameRGBA> {
        self.last.take()
    }

    /// Whether any frame request or resize subscription is still registered.
    pub fn has_subscriptions(&self) -> bool {
        self.pending.is_some() || self.resize.is_some()
    }
}

impl FrameHost for OfflineHost {
    fn request_frame(&mut self) -> FrameRequestId {
        self.next_id += 1;
        let id = FrameRequestId(self.next_id);
        self.pending = Some(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameRequestId) {
        if self.pending == Some(id) {
            self.pending = None;
        }
    }

    fn subscribe_resize(&mut self) -> ResizeSubscription {
        self.next_id += 1;
        let sub = ResizeSubscription(self.next_id);
        self.resize = Some(sub);
        sub
    }

    fn unsubscribe_resize(&mut self, sub: ResizeSubscription) {
        if self.resize == Some(sub) {
            self.resize = None;
        }
    }

    fn present(&mut self, frame: &FrameRGBA) {
        self.last = Some(frame.clone());
    }
}

/// A playback clock positioned explicitly by the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimelineClock {
    position: f64,
}

impl TimelineClock {
    pub fn set(&mut self, secs: f64) {
        self.position = secs;
    }
}

impl PlaybackClock for TimelineClock {
    fn position_secs(&self) -> Option<f64> {
        Some(self.position)
    }
}

/// Summary of an offline render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimelineStats {
    pub frames: u64,
    pub beats_fired: u64,
    pub peak_particles: usize,
    pub peak_rings: usize,
}

type OfflineLoop = RenderLoop<OfflineHost, TimelineClock, CpuBackend>;

struct OfflineDriver {
    lp: OfflineLoop,
    fps: Fps,
    peak_particles: usize,
    peak_rings: usize,
}

impl OfflineDriver {
    fn new(model: Arc<VisualizationModel>, cfg: &RenderConfig, fps: Fps) -> Self {
        let slot = ModelSlot::new();
        slot.publish(model);
        let mut lp = RenderLoop::new(
            OfflineHost::new(),
            TimelineClock::default(),
            CpuBackend::new(),
            cfg.clone(),
            slot,
        );
        lp.start();
        Self {
            lp,
            fps,
            peak_particles: 0,
            peak_rings: 0,
        }
    }

    /// Deliver the callback for frame `idx` and return its pixels.
    fn frame(&mut self, idx: u64) -> VizResult<FrameRGBA> {
        let t = self.fps.frames_to_secs(idx);
        self.lp.clock_mut().set(t);
        if self.lp.host_mut().grant().is_none() {
            return Err(VizError::render("render loop has no pending frame request"));
        }
        self.lp.on_frame(t * 1000.0);

        let sim = self.lp.simulator();
        self.peak_particles = self.peak_particles.max(sim.particles().len());
        self.peak_rings = self.peak_rings.max(sim.rings().len());

        self.lp
            .host_mut()
            .take_frame()
            .ok_or_else(|| VizError::render(format!("frame {idx} failed to render")))
    }

    fn finish(mut self) -> TimelineStats {
        let stats = TimelineStats {
            frames: self.lp.stats().frames,
            beats_fired: self.lp.stats().beats_fired,
            peak_particles: self.peak_particles,
            peak_rings: self.peak_rings,
        };
        self.lp.teardown();
        stats
    }
}

/// Time after the end of the track by which every spawned effect has died out.
const SETTLE_SECS: f64 = 2.0;

/// Number of frames covering the model's duration at `fps` (at least one).
pub fn timeline_frames(model: &VisualizationModel, fps: Fps) -> u64 {
    fps.secs_to_frames_ceil(model.duration()).max(1)
}

/// Render the whole track frame by frame into `sink`.
///
/// The effect simulation runs at exactly `1 / fps` per frame (capped like live playback), so the
/// output is reproducible for a given config seed.
#[tracing::instrument(skip_all, fields(fps = fps.as_f64(), duration = model.duration()))]
pub fn render_timeline(
    model: Arc<VisualizationModel>,
    cfg: &RenderConfig,
    fps: Fps,
    sink: &mut dyn FrameSink,
) -> VizResult<TimelineStats> {
    cfg.validate()?;
    let canvas = cfg.surface.pixel_canvas();
    let total = timeline_frames(&model, fps);

    sink.begin(SinkConfig {
        width: canvas.width,
        height: canvas.height,
        fps,
    })?;

    let mut driver = OfflineDriver::new(model, cfg, fps);
    for idx in 0..total {
        let frame = driver.frame(idx)?;
        sink.push_frame(FrameIndex(idx), &frame)?;
        if idx > 0 && idx % 300 == 0 {
            tracing::info!(frame = idx, total, "rendering");
        }
    }
    sink.end()?;

    let stats = driver.finish();
    tracing::info!(
        frames = stats.frames,
        beats = stats.beats_fired,
        peak_particles = stats.peak_particles,
        "timeline rendered"
    );
    Ok(stats)
}

/// Frames simulated before the one shown at `t`.
///
/// Past the end of the track no beat can fire, so the warm-up stops once the last burst has
/// settled.
pub(crate) fn warmup_frames(model: &VisualizationModel, fps: Fps, t: f64) -> u64 {
    let limit = timeline_frames(model, fps) + fps.secs_to_frames_ceil(SETTLE_SECS);
    ((t * fps.as_f64()).floor() as u64).min(limit)
}

/// Render the frame shown at `t` seconds, simulating effects from the start of the track.
pub fn render_frame_at(
    model: Arc<VisualizationModel>,
    cfg: &RenderConfig,
    fps: Fps,
    t: f64,
) -> VizResult<FrameRGBA> {
    cfg.validate()?;
    let t = if t.is_finite() { t.max(0.0) } else { 0.0 };
    let target = warmup_frames(&model, fps, t);

    let mut driver = OfflineDriver::new(model, cfg, fps);
    for idx in 0..target {
        driver.frame(idx)?;
    }
    driver.lp.clock_mut().set(t);
    if driver.lp.host_mut().grant().is_none() {
        return Err(VizError::render("render loop has no pending frame request"));
    }
    driver.lp.on_frame(t * 1000.0);
    let frame = driver
        .lp
        .host_mut()
        .take_frame()
        .ok_or_else(|| VizError::render(format!("frame at {t}s failed to render")))?;
    driver.finish();
    Ok(frame)
}

#[cfg(test)]
#[path = "../../tests/unit/session/offline.rs"]
mod tests;
