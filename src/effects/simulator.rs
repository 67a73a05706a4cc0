use std::collections::VecDeque;
use std::ops::Range;

use crate::effects::particle::Particle;
use crate::effects::ring::Ring;
use crate::foundation::core::{Canvas, Point, Rgba8, Vec2};
use crate::foundation::rng::Rng64;
use crate::schema::palette::PaletteColor;

/// Upper bound on a single simulation step, in seconds.
pub const MAX_STEP_SECS: f64 = 0.06;
/// Step used for the first frame after (re)start.
pub const FIRST_STEP_SECS: f64 = 0.016;

const BURST_BASE: f64 = 20.0;
const BURST_Y: f64 = 0.62;
const AMBIENT_MAX: usize = 6;

/// Simulation step for a frame at `ts_ms` after a frame at `prev_ts_ms`.
///
/// The first frame uses [`FIRST_STEP_SECS`]; later steps are clamped to `[0, MAX_STEP_SECS]`.
pub fn step_secs(prev_ts_ms: Option<f64>, ts_ms: f64) -> f64 {
    match prev_ts_ms {
        None => FIRST_STEP_SECS,
        Some(prev) => {
            let dt = (ts_ms - prev) / 1000.0;
            if dt.is_finite() {
                dt.clamp(0.0, MAX_STEP_SECS)
            } else {
                0.0
            }
        }
    }
}

/// Where a beat's burst appears: horizontally at the beat's share of the track, in the lower
/// half of the surface. Tracks shorter than a second are treated as one second long.
pub fn burst_origin(beat: f64, ctx: &SpawnContext<'_>) -> Point {
    Point::new(
        beat / ctx.duration.max(1.0) * ctx.canvas.w(),
        ctx.canvas.h() * BURST_Y,
    )
}

/// Tuning knobs for spawning and capping effects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectParams {
    /// Scales beat bursts and ambient emission.
    pub particle_gain: f64,
    /// Hard cap on live particles.
    pub max_particles: usize,
    /// Scales ring count and size per beat.
    pub ring_gain: f64,
    /// Ring stroke width in CSS pixels.
    pub ring_width: f64,
    /// Ring fade-rate multiplier.
    pub ring_life: f64,
    /// Hard cap on live rings.
    pub max_rings: usize,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            particle_gain: 1.2,
            max_particles: 800,
            ring_gain: 1.0,
            ring_width: 3.0,
            ring_life: 1.0,
            max_rings: 64,
        }
    }
}

/// Per-frame inputs shared by every spawn call.
#[derive(Clone, Copy, Debug)]
pub struct SpawnContext<'a> {
    /// Surface size in device pixels.
    pub canvas: Canvas,
    /// Device pixel ratio.
    pub dpr: f64,
    /// Track duration in seconds.
    pub duration: f64,
    /// Colors to pick from; empty falls back to white.
    pub palette: &'a [PaletteColor],
}

/// Tracks which beats have already fired.
///
/// The cursor only moves forward: seeking backwards never re-fires a beat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BeatCursor {
    next: usize,
}

impl BeatCursor {
    /// Index of the next beat to fire.
    pub fn position(self) -> usize {
        self.next
    }

    /// Advance past every beat `<= t`, returning the index range that just fired.
    ///
    /// `beats` must be sorted ascending.
    pub fn advance(&mut self, beats: &[f64], t: f64) -> Range<usize> {
        let start = self.next.min(beats.len());
        let mut end = start;
        while end < beats.len() && beats[end] <= t {
            end += 1;
        }
        self.next = end;
        start..end
    }

    /// Rewind to the first beat.
    pub fn reset(&mut self) {
        self.next = 0;
    }
}

/// Live particle and ring state driven by beats and loudness.
#[derive(Clone, Debug)]
pub struct EffectSimulator {
    params: EffectParams,
    seed: u64,
    rng: Rng64,
    cursor: BeatCursor,
    particles: VecDeque<Particle>,
    rings: VecDeque<Ring>,
}

impl EffectSimulator {
    /// Create an empty simulator.
    pub fn new(params: EffectParams, seed: u64) -> Self {
        Self {
            params,
            seed,
            rng: Rng64::new(seed),
            cursor: BeatCursor::default(),
            particles: VecDeque::new(),
            rings: VecDeque::new(),
        }
    }

    /// Current tuning.
    pub fn params(&self) -> &EffectParams {
        &self.params
    }

    /// Beat cursor state.
    pub fn cursor(&self) -> BeatCursor {
        self.cursor
    }

    /// Live particles, oldest first.
    pub fn particles(&self) -> impl ExactSizeIterator<Item = &Particle> {
        self.particles.iter()
    }

    /// Live rings, oldest first.
    pub fn rings(&self) -> impl ExactSizeIterator<Item = &Ring> {
        self.rings.iter()
    }

    /// Drop all live effects, rewind the beat cursor and reseed.
    pub fn reset(&mut self) {
        self.particles.clear();
        self.rings.clear();
        self.cursor.reset();
        self.rng = Rng64::new(self.seed);
    }

    /// Fire every pending beat `<= t`, spawning one burst and its rings per beat.
    ///
    /// Returns the number of beats that fired.
    pub fn fire_beats(&mut self, beats: &[f64], t: f64, ctx: &SpawnContext<'_>) -> usize {
        let fired = self.cursor.advance(beats, t);
        let n = fired.len();
        for &beat in &beats[fired] {
            self.spawn_burst(beat, ctx);
            self.spawn_rings(burst_origin(beat, ctx), ctx);
        }
        if n > 0 {
            tracing::trace!(t, fired = n, particles = self.particles.len(), "beats fired");
        }
        n
    }

    /// Burst of sparkles at the beat's horizontal position.
    pub fn spawn_burst(&mut self, beat: f64, ctx: &SpawnContext<'_>) {
        let count = ((BURST_BASE * self.params.particle_gain).round().max(0.0) as usize)
            .min(self.params.max_particles);
        let origin = burst_origin(beat, ctx);
        for _ in 0..count {
            let p = Particle {
                pos: origin,
                vel: Vec2::new(self.rng.range(-2.8, 2.8), self.rng.range(-4.0, -1.2)),
                life: self.rng.range(0.9, 1.3),
                radius: self.rng.range(2.2, 4.6) * ctx.dpr,
                color: self.pick_color(ctx.palette),
            };
            self.particles.push_back(p);
        }
        self.enforce_particle_cap();
    }

    /// Concentric rings expanding from `center`, all sharing one max radius.
    pub fn spawn_rings(&mut self, center: Point, ctx: &SpawnContext<'_>) {
        let gain = self.params.ring_gain;
        let count = ((gain.round() as i64).max(1) as usize).min(self.params.max_rings);
        let r = self.rng.next_f64_01();
        let max_radius = ctx.canvas.min_side() * (0.45 + 0.25 * r) * (0.9 + 0.2 * gain);
        for _ in 0..count {
            let color = self.pick_color(ctx.palette);
            self.rings.push_back(Ring::new(
                center,
                max_radius,
                self.params.ring_width * ctx.dpr,
                color,
                self.params.ring_life,
            ));
        }
        self.enforce_ring_cap();
    }

    /// Loudness-driven trickle of sparkles in the lower band of the surface.
    ///
    /// Returns the number of particles spawned.
    pub fn spawn_ambient(&mut self, loudness: f64, ctx: &SpawnContext<'_>) -> usize {
        let raw = (loudness * 10.0 * self.params.particle_gain).floor();
        let count = if raw.is_finite() && raw > 0.0 {
            (raw as usize).min(AMBIENT_MAX).min(self.params.max_particles)
        } else {
            0
        };
        let (w, h) = (ctx.canvas.w(), ctx.canvas.h());
        for _ in 0..count {
            let p = Particle {
                pos: Point::new(self.rng.range(0.0, w), self.rng.range(h * 0.45, h * 0.85)),
                vel: Vec2::new(self.rng.range(-1.2, 1.2), self.rng.range(-2.0, -0.4)),
                life: self.rng.range(0.6, 1.0),
                radius: self.rng.range(1.6, 3.2) * ctx.dpr,
                color: self.pick_color(ctx.palette),
            };
            self.particles.push_back(p);
        }
        self.enforce_particle_cap();
        count
    }

    /// Advance all live effects by `dt` seconds and drop the dead ones.
    pub fn step(&mut self, dt: f64) {
        self.particles.retain_mut(|p| p.step(dt));
        self.rings.retain_mut(|r| r.step(dt));
    }

    fn pick_color(&mut self, palette: &[PaletteColor]) -> Rgba8 {
        if palette.is_empty() {
            return Rgba8::WHITE;
        }
        palette[self.rng.index(palette.len())].rgba()
    }

    fn enforce_particle_cap(&mut self) {
        let excess = self.particles.len().saturating_sub(self.params.max_particles);
        self.particles.drain(..excess);
    }

    fn enforce_ring_cap(&mut self) {
        let excess = self.rings.len().saturating_sub(self.params.max_rings);
        self.rings.drain(..excess);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/simulator.rs"]
mod tests;
