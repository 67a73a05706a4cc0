use std::path::Path;

use crate::effects::simulator::EffectParams;
use crate::foundation::core::Canvas;
use crate::foundation::error::{VizError, VizResult};
use crate::model::ModelOptions;

/// Drawing surface size in CSS pixels plus the device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub css_width: f64,
    pub css_height: f64,
    pub device_pixel_ratio: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            css_width: 800.0,
            css_height: 420.0,
            device_pixel_ratio: 1.0,
        }
    }
}

impl SurfaceConfig {
    /// Device pixel ratio, with non-positive or non-finite values read as `1`.
    pub fn dpr(&self) -> f64 {
        if self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        }
    }

    /// Backing store size: CSS size times DPR, rounded, at least 1x1.
    pub fn pixel_canvas(&self) -> Canvas {
        let dpr = self.dpr();
        Canvas {
            width: to_pixels(self.css_width * dpr),
            height: to_pixels(self.css_height * dpr),
        }
    }
}

fn to_pixels(v: f64) -> u32 {
    if !v.is_finite() {
        return 1;
    }
    v.round().clamp(1.0, f64::from(u16::MAX)) as u32
}

/// Tunables for the visualization, loaded from JSON and overridden by CLI flags.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Loudness multiplier before clamping to `[0, 1]`.
    pub sensitivity: f64,
    /// Bar animation speed.
    pub speed: f64,
    /// Fallback palette theme.
    pub theme: String,
    pub particle_gain: f64,
    /// Glow intensity; `0` disables the blurred glow pass.
    pub glow: f64,
    pub max_particles: usize,
    pub max_rings: usize,
    pub ring_gain: f64,
    pub ring_width: f64,
    pub ring_life: f64,
    /// Seed for effect spawning.
    pub seed: u64,
    /// Base URL for relative audio URLs.
    pub api_base: String,
    pub surface: SurfaceConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let effects = EffectParams::default();
        let model = ModelOptions::default();
        Self {
            sensitivity: 1.0,
            speed: 1.0,
            theme: model.theme,
            particle_gain: effects.particle_gain,
            glow: 1.0,
            max_particles: effects.max_particles,
            max_rings: effects.max_rings,
            ring_gain: effects.ring_gain,
            ring_width: effects.ring_width,
            ring_life: effects.ring_life,
            seed: 0,
            api_base: model.api_base,
            surface: SurfaceConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Load a config from a JSON file. Absent fields take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> VizResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            VizError::validation(format!("failed to read config '{}': {e}", path.display()))
        })?;
        let cfg: Self = serde_json::from_str(&text).map_err(|e| {
            VizError::validation(format!("invalid config '{}': {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject non-finite or negative gains and zero caps.
    pub fn validate(&self) -> VizResult<()> {
        let gains = [
            ("sensitivity", self.sensitivity),
            ("speed", self.speed),
            ("particle_gain", self.particle_gain),
            ("glow", self.glow),
            ("ring_gain", self.ring_gain),
            ("ring_width", self.ring_width),
            ("ring_life", self.ring_life),
        ];
        for (name, v) in gains {
            if !v.is_finite() || v < 0.0 {
                return Err(VizError::validation(format!(
                    "{name} must be finite and >= 0 (got {v})"
                )));
            }
        }
        if self.max_particles == 0 {
            return Err(VizError::validation("max_particles must be > 0"));
        }
        if self.max_rings == 0 {
            return Err(VizError::validation("max_rings must be > 0"));
        }
        let s = &self.surface;
        if !(s.css_width.is_finite() && s.css_width > 0.0 && s.css_height.is_finite() && s.css_height > 0.0)
        {
            return Err(VizError::validation(
                "surface css_width/css_height must be > 0",
            ));
        }
        Ok(())
    }

    /// Spawn and cap parameters for the effect simulator.
    pub fn effect_params(&self) -> EffectParams {
        EffectParams {
            particle_gain: self.particle_gain,
            max_particles: self.max_particles,
            ring_gain: self.ring_gain,
            ring_width: self.ring_width,
            ring_life: self.ring_life,
            max_rings: self.max_rings,
        }
    }

    /// Options for building a model from a descriptor.
    pub fn model_options(&self) -> ModelOptions {
        ModelOptions {
            theme: self.theme.clone(),
            api_base: self.api_base.clone(),
        }
    }
}
