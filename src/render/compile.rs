use std::f64::consts::TAU;

use kurbo::Shape as _;

use crate::config::RenderConfig;
use crate::effects::simulator::EffectSimulator;
use crate::foundation::core::{BezPath, Canvas, Circle, Point, Rect, Rgba8};
use crate::model::VisualizationModel;
use crate::render::blur::shadow_blur_params;

/// Background painted while no model is loaded.
pub const IDLE_BACKGROUND: Rgba8 = Rgba8::rgb(0x11, 0x11, 0x11);

const SPOKES: usize = 42;
const BARS: usize = 28;
const PITCH_SEGMENTS: usize = 200;
const PITCH_FULL_SCALE_HZ: f64 = 1000.0;
const GLOW_MAX_RADIUS: u32 = 64;
const CIRCLE_TOLERANCE: f64 = 0.1;

/// A single vector drawing operation in surface pixels.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    FillRect {
        rect: Rect,
        color: Rgba8,
    },
    FillPath {
        path: BezPath,
        color: Rgba8,
    },
    StrokePath {
        path: BezPath,
        width: f64,
        color: Rgba8,
    },
}

/// Blur applied to a copy of the effects layer before it is added under the sharp effects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlowPass {
    pub radius_px: u32,
    pub sigma: f32,
    pub color: Rgba8,
}

/// Everything a backend needs to produce one frame.
///
/// `base` is drawn source-over onto an empty surface. `effects` is drawn onto a transparent layer
/// that is composited additively on top, optionally preceded by its blurred `glow`.
#[derive(Clone, Debug, PartialEq)]
pub struct FramePlan {
    pub canvas: Canvas,
    pub base: Vec<DrawOp>,
    pub effects: Vec<DrawOp>,
    pub glow: Option<GlowPass>,
}

impl FramePlan {
    /// Background color of the frame, taken from the leading full-surface fill.
    pub fn background(&self) -> Option<Rgba8> {
        match self.base.first() {
            Some(DrawOp::FillRect { color, .. }) => Some(*color),
            _ => None,
        }
    }
}

/// Per-frame values sampled from the model at a playback position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSample {
    /// Playback position in seconds.
    pub t: f64,
    /// Loudness after sensitivity, clamped to `[0, 1]`.
    pub loudness: f64,
    /// Pitch in Hz.
    pub pitch_hz: f64,
}

impl FrameSample {
    /// Sample the model at `t` seconds.
    pub fn at(model: &VisualizationModel, t: f64, sensitivity: f64) -> Self {
        Self {
            t,
            loudness: clamp01(model.loudness_at(t) * sensitivity),
            pitch_hz: model.pitch_at(t),
        }
    }
}

/// The frame shown while no model is available.
pub fn compile_idle(canvas: Canvas) -> FramePlan {
    FramePlan {
        canvas,
        base: vec![background(canvas, IDLE_BACKGROUND)],
        effects: Vec::new(),
        glow: None,
    }
}

/// Build the draw list for one frame of a loaded model.
pub fn compile_frame(
    model: &VisualizationModel,
    sample: &FrameSample,
    sim: &EffectSimulator,
    cfg: &RenderConfig,
    canvas: Canvas,
) -> FramePlan {
    let dpr = cfg.surface.dpr();
    let mut base = Vec::with_capacity(2 + SPOKES + BARS);
    base.push(background(canvas, model.background_at(sample.t).rgba()));
    push_spokes(&mut base, canvas, dpr, sample.loudness);
    push_pitch(&mut base, model, canvas, dpr, sample);
    push_bars(&mut base, canvas, dpr, sample, cfg.speed);

    let mut effects = Vec::with_capacity(sim.particles().len() + sim.rings().len());
    for p in sim.particles() {
        effects.push(DrawOp::FillPath {
            path: circle_path(p.pos, p.radius),
            color: p.color.with_alpha(p.alpha()),
        });
    }
    for r in sim.rings() {
        effects.push(DrawOp::StrokePath {
            path: circle_path(r.center, r.radius),
            width: r.width,
            color: r.color.with_alpha(r.alpha(cfg.glow)),
        });
    }

    let glow = if effects.is_empty() {
        None
    } else {
        shadow_blur_params(24.0 * cfg.glow * dpr, GLOW_MAX_RADIUS).map(|(radius_px, sigma)| {
            GlowPass {
                radius_px,
                sigma,
                color: Rgba8::WHITE.with_alpha(0.85),
            }
        })
    };

    FramePlan {
        canvas,
        base,
        effects,
        glow,
    }
}

fn background(canvas: Canvas, color: Rgba8) -> DrawOp {
    DrawOp::FillRect {
        rect: Rect::new(0.0, 0.0, canvas.w(), canvas.h()),
        color,
    }
}

fn push_spokes(ops: &mut Vec<DrawOp>, canvas: Canvas, dpr: f64, loudness: f64) {
    let center = Point::new(canvas.w() * 0.5, canvas.h() * 0.52);
    let r = canvas.min_side() * 0.22;
    let inner = r * 0.7;
    let outer = r + r * (0.35 + 0.55 * loudness);
    let color = Rgba8::WHITE.with_alpha(0.6);
    for i in 0..SPOKES {
        let ang = i as f64 / SPOKES as f64 * TAU;
        let (s, c) = ang.sin_cos();
        let mut path = BezPath::new();
        path.move_to((center.x + c * inner, center.y + s * inner));
        path.line_to((center.x + c * outer, center.y + s * outer));
        ops.push(DrawOp::StrokePath {
            path,
            width: 1.5 * dpr,
            color,
        });
    }
}

fn pitch_y(canvas: Canvas, hz: f64) -> f64 {
    canvas.h() * (0.75 - clamp01(hz / PITCH_FULL_SCALE_HZ) * 0.4)
}

fn push_pitch(
    ops: &mut Vec<DrawOp>,
    model: &VisualizationModel,
    canvas: Canvas,
    dpr: f64,
    sample: &FrameSample,
) {
    let duration = model.duration();
    if duration <= 0.0 {
        return;
    }

    if !model.pitch().is_empty() {
        let mut path = BezPath::new();
        for (i, (u, hz)) in model
            .pitch()
            .resample(PITCH_SEGMENTS, duration)
            .into_iter()
            .enumerate()
        {
            let p = Point::new(u * canvas.w(), pitch_y(canvas, hz));
            if i == 0 {
                path.move_to(p);
            } else {
                path.line_to(p);
            }
        }
        ops.push(DrawOp::StrokePath {
            path,
            width: 2.0 * dpr,
            color: Rgba8::WHITE.with_alpha(0.7),
        });
    }

    let u = clamp01(sample.t / duration);
    ops.push(DrawOp::FillPath {
        path: circle_path(
            Point::new(u * canvas.w(), pitch_y(canvas, sample.pitch_hz)),
            4.0 * dpr,
        ),
        color: model.point_color().rgba(),
    });
}

fn push_bars(ops: &mut Vec<DrawOp>, canvas: Canvas, dpr: f64, sample: &FrameSample, speed: f64) {
    let (w, h) = (canvas.w(), canvas.h());
    let bw = w / BARS as f64;
    let max_h = h * 0.6;
    let color = Rgba8::WHITE.with_alpha(0.85);
    for i in 0..BARS {
        let n = ((sample.t * 2.0 + i as f64) * 0.7 * speed).sin() * 0.5 + 0.5;
        let bar_h = max_h.min(10.0 + (max_h - 10.0) * clamp01(sample.loudness * (0.6 + 0.7 * n)));
        let x = i as f64 * bw + bw * 0.15;
        let y = h - bar_h - 18.0 * dpr;
        ops.push(DrawOp::FillRect {
            rect: Rect::new(x, y, x + bw * 0.7, y + bar_h),
            color,
        });
    }
}

fn circle_path(center: Point, radius: f64) -> BezPath {
    Circle::new(center, radius.max(0.0)).to_path(CIRCLE_TOLERANCE)
}

fn clamp01(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compile.rs"]
mod tests;
