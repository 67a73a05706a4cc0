use crate::foundation::core::{Point, Rgba8, Vec2};

/// Velocities are expressed in pixels per 1/60 s frame.
pub(crate) const TIME_BASE: f64 = 60.0;
const GRAVITY: f64 = 0.05;
const DAMPING: f64 = 0.995;
const FADE_RATE: f64 = 0.02;

/// A glowing sparkle with simple ballistic motion.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    /// Position in surface pixels.
    pub pos: Point,
    /// Velocity in pixels per time-base frame.
    pub vel: Vec2,
    /// Remaining life; the particle dies at `<= 0`.
    pub life: f64,
    /// Radius in surface pixels.
    pub radius: f64,
    /// Fill color.
    pub color: Rgba8,
}

impl Particle {
    /// Advance by `dt` seconds. Returns `false` once the particle is dead.
    pub fn step(&mut self, dt: f64) -> bool {
        let k = dt * TIME_BASE;
        self.pos += self.vel * k;
        self.vel.y += GRAVITY * k;
        self.vel *= DAMPING;
        self.life -= FADE_RATE * k;
        self.life > 0.0
    }

    /// Fill opacity for the current life.
    pub fn alpha(&self) -> f64 {
        0.35 + 0.65 * self.life.clamp(0.0, 1.0)
    }
}
