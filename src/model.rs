use serde::Serialize;

use crate::schema::descriptor::DescriptorDef;
use crate::schema::palette::{PaletteColor, color_at, normalize_palette};
use crate::schema::sections::{Section, normalize_sections};
use crate::series::curve::Curve;

/// Options that influence how a descriptor is turned into a model.
#[derive(Clone, Debug)]
pub struct ModelOptions {
    /// Fallback theme name for descriptors without a usable palette.
    pub theme: String,
    /// Base prepended to relative audio URLs.
    pub api_base: String,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            theme: "pastel".to_owned(),
            api_base: "http://localhost:4000".to_owned(),
        }
    }
}

/// Immutable, canonical form of an analysis descriptor.
///
/// All shape dispatch happens in [`VisualizationModel::from_descriptor`]; per-frame code only
/// reads typed fields.
#[derive(Clone, Debug, Serialize)]
pub struct VisualizationModel {
    duration: f64,
    beats: Vec<f64>,
    sections: Vec<Section>,
    palette: Vec<PaletteColor>,
    point_color: PaletteColor,
    loudness: Curve,
    pitch: Curve,
    audio_url: Option<String>,
}

impl VisualizationModel {
    /// Build a model from a parsed descriptor.
    #[tracing::instrument(skip_all, fields(theme = %opts.theme))]
    pub fn from_descriptor(def: &DescriptorDef, opts: &ModelOptions) -> Self {
        let duration = def.duration_secs();
        let beats: Vec<f64> = def
            .beat_times()
            .into_iter()
            .filter(|&b| b >= 0.0 && (duration <= 0.0 || b <= duration))
            .collect();
        let sections = normalize_sections(&def.section_inputs(), duration);
        let palette = normalize_palette(def.palette_input(), &opts.theme);
        let point_color = def
            .point_color
            .0
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .map(PaletteColor::parse)
            .unwrap_or_else(|| palette[0].clone());
        let loudness = Curve::from_input(def.loudness_input());
        let pitch = Curve::from_input(def.pitch_input());
        let audio_url = def
            .audio_url
            .0
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(|u| resolve_audio_url(u, &opts.api_base));

        tracing::debug!(
            duration,
            beats = beats.len(),
            sections = sections.len(),
            palette = palette.len(),
            loudness_keys = loudness.keys().len(),
            pitch_keys = pitch.keys().len(),
            "built visualization model"
        );

        Self {
            duration,
            beats,
            sections,
            palette,
            point_color,
            loudness,
            pitch,
            audio_url,
        }
    }

    /// Track duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Beat timestamps, ascending.
    pub fn beats(&self) -> &[f64] {
        &self.beats
    }

    /// Contiguous sections.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Non-empty palette.
    pub fn palette(&self) -> &[PaletteColor] {
        &self.palette
    }

    /// Accent color (playhead marker).
    pub fn point_color(&self) -> &PaletteColor {
        &self.point_color
    }

    /// Loudness curve.
    pub fn loudness(&self) -> &Curve {
        &self.loudness
    }

    /// Pitch curve in Hz.
    pub fn pitch(&self) -> &Curve {
        &self.pitch
    }

    /// Resolved audio resource, if any.
    pub fn audio_url(&self) -> Option<&str> {
        self.audio_url.as_deref()
    }

    /// Raw loudness at `t` seconds.
    pub fn loudness_at(&self, t: f64) -> f64 {
        self.loudness.sample_secs(t, self.duration)
    }

    /// Pitch in Hz at `t` seconds.
    pub fn pitch_at(&self, t: f64) -> f64 {
        self.pitch.sample_secs(t, self.duration)
    }

    /// Background color at `t` seconds.
    pub fn background_at(&self, t: f64) -> &PaletteColor {
        color_at(t, &self.sections, &self.palette)
    }
}

/// Absolute `http...` URLs pass through; anything else is appended to `api_base`.
pub(crate) fn resolve_audio_url(url: &str, api_base: &str) -> String {
    if url.starts_with("http") {
        url.to_owned()
    } else {
        format!("{api_base}{url}")
    }
}
