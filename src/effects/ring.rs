use crate::effects::particle::TIME_BASE;
use crate::foundation::core::{Point, Rgba8};

const GROWTH_RATE: f64 = 0.9 * 2.2;
const FADE_RATE: f64 = 0.015;

/// An expanding stroked circle spawned on a beat.
#[derive(Clone, Debug, PartialEq)]
pub struct Ring {
    /// Center in surface pixels.
    pub center: Point,
    /// Current radius.
    pub radius: f64,
    /// Radius at which the ring is removed.
    pub max_radius: f64,
    /// Stroke width in surface pixels.
    pub width: f64,
    /// Remaining life; the ring dies at `<= 0`.
    pub life: f64,
    /// Stroke color.
    pub color: Rgba8,
    /// Multiplier on the fade rate.
    pub life_scale: f64,
}

impl Ring {
    /// A fresh ring at zero radius with full life.
    pub fn new(center: Point, max_radius: f64, width: f64, color: Rgba8, life_scale: f64) -> Self {
        Self {
            center,
            radius: 0.0,
            max_radius,
            width,
            life: 1.0,
            color,
            life_scale,
        }
    }

    /// Advance by `dt` seconds. Returns `false` once the ring is dead.
    pub fn step(&mut self, dt: f64) -> bool {
        self.radius += self.max_radius * GROWTH_RATE * dt;
        self.life -= FADE_RATE * dt * TIME_BASE * self.life_scale;
        self.life > 0.0 && self.radius < self.max_radius
    }

    /// Stroke opacity for the current life and glow intensity.
    pub fn alpha(&self, glow: f64) -> f64 {
        self.life.clamp(0.0, 1.0) * (0.55 + 0.35 * glow)
    }
}
