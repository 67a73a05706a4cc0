//! Boundary model of the analysis descriptor JSON.
//!
//! Every field is optional and loosely typed upstream. Each one is parsed through an untagged
//! enum whose last variant swallows anything unexpected, so a malformed field degrades to its
//! default instead of failing the whole document.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde::de::IgnoredAny;

use crate::foundation::error::{VizError, VizResult};
use crate::schema::palette::PaletteInput;
use crate::schema::sections::SectionInput;
use crate::series::curve::CurveInput;

/// A field value that is kept only when it has the expected shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Loose<T>(pub Option<T>);

impl<T> Default for Loose<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<'de, T> Deserialize<'de> for Loose<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr<T> {
            Valid(T),
            Invalid(IgnoredAny),
        }

        Ok(match Repr::<T>::deserialize(deserializer)? {
            Repr::Valid(v) => Self(Some(v)),
            Repr::Invalid(_) => Self(None),
        })
    }
}

/// A number that may arrive as a JSON number or numeric string.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LooseF64(pub Option<f64>);

impl<'de> Deserialize<'de> for LooseF64 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(f64),
            Text(String),
            Other(IgnoredAny),
        }

        let v = match Repr::deserialize(deserializer)? {
            Repr::Num(v) => Some(v),
            Repr::Text(s) => s.trim().parse::<f64>().ok(),
            Repr::Other(_) => None,
        };
        Ok(Self(v.filter(|v| v.is_finite())))
    }
}

/// Section entry; `start` presence decides how the whole list is normalized.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SectionDef {
    /// Present when the descriptor uses `{start, end, label}` entries.
    pub start: Option<LooseF64>,
    /// End boundary.
    pub end: LooseF64,
    /// Label text.
    pub label: Loose<String>,
}

/// Palette in one of its accepted shapes.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum PaletteDef {
    /// Ordered color list.
    List(Vec<Loose<String>>),
    /// Object keyed by stringified index.
    Keyed(BTreeMap<String, Loose<String>>),
    /// Anything else.
    Invalid(IgnoredAny),
}

/// `{t, v}` loudness key.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct KeyDef {
    /// Time in seconds.
    pub t: LooseF64,
    /// Value.
    pub v: LooseF64,
}

/// Loudness curve in one of its accepted shapes.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum CurveDef {
    /// Dense values over normalized time.
    Dense(Vec<f64>),
    /// Explicit `{t, v}` pairs.
    Pairs(Vec<KeyDef>),
    /// Anything else.
    Invalid(IgnoredAny),
}

/// `{t, hz}` pitch key.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PitchKeyDef {
    /// Time in seconds.
    pub t: LooseF64,
    /// Frequency in Hz.
    pub hz: LooseF64,
}

/// Analysis descriptor as it appears on the wire.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct DescriptorDef {
    /// Track duration in seconds.
    pub duration: LooseF64,
    /// Beat timestamps in seconds.
    pub beats: Loose<Vec<LooseF64>>,
    /// Section list.
    pub sections: Loose<Vec<Loose<SectionDef>>>,
    /// Palette.
    pub palette: Option<PaletteDef>,
    /// Accent color.
    pub point_color: Loose<String>,
    /// Loudness curve.
    pub rms: Option<CurveDef>,
    /// Pitch curve.
    pub pitch: Loose<Vec<Loose<PitchKeyDef>>>,
    /// Audio resource, absolute or relative to the configured base.
    pub audio_url: Loose<String>,
}

impl DescriptorDef {
    /// Parse a descriptor from JSON text.
    ///
    /// Fails only when the text is not a JSON object; malformed fields resolve to defaults.
    pub fn from_json_str(s: &str) -> VizResult<Self> {
        Self::from_json_slice(s.as_bytes())
    }

    /// Parse a descriptor from JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> VizResult<Self> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| VizError::descriptor(e.to_string()))?;
        Self::from_value(value)
    }

    /// Interpret an already-parsed JSON document.
    pub fn from_value(value: serde_json::Value) -> VizResult<Self> {
        if !value.is_object() {
            return Err(VizError::descriptor("descriptor must be a JSON object"));
        }
        serde_json::from_value(value).map_err(|e| VizError::descriptor(e.to_string()))
    }

    /// Read and parse a descriptor file.
    pub fn from_path(path: impl AsRef<Path>) -> VizResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| VizError::fetch(format!("read '{}': {e}", path.display())))?;
        Self::from_json_slice(&bytes)
    }

    /// Duration in seconds; missing, negative or invalid reads as 0.
    pub fn duration_secs(&self) -> f64 {
        self.duration.0.unwrap_or(0.0).max(0.0)
    }

    /// Valid beat timestamps, sorted ascending.
    pub fn beat_times(&self) -> Vec<f64> {
        let mut beats: Vec<f64> = self
            .beats
            .0
            .iter()
            .flatten()
            .filter_map(|b| b.0)
            .collect();
        beats.sort_by(f64::total_cmp);
        beats
    }

    /// Section entries in canonical input form.
    pub fn section_inputs(&self) -> Vec<SectionInput> {
        self.sections
            .0
            .iter()
            .flatten()
            .map(|s| {
                let s = s.0.clone().unwrap_or_default();
                SectionInput {
                    start: s.start.map(|v| v.0.unwrap_or(0.0)),
                    end: s.end.0,
                    label: s.label.0,
                }
            })
            .collect()
    }

    /// Palette in canonical input form. Non-string entries are dropped.
    pub fn palette_input(&self) -> PaletteInput {
        match &self.palette {
            Some(PaletteDef::List(list)) => {
                PaletteInput::List(list.iter().filter_map(|c| c.0.clone()).collect())
            }
            Some(PaletteDef::Keyed(map)) => PaletteInput::Keyed(
                map.iter()
                    .filter_map(|(k, v)| v.0.clone().map(|v| (k.clone(), v)))
                    .collect(),
            ),
            Some(PaletteDef::Invalid(_)) | None => PaletteInput::Missing,
        }
    }

    /// Loudness curve in canonical input form.
    pub fn loudness_input(&self) -> CurveInput {
        match &self.rms {
            Some(CurveDef::Dense(values)) => CurveInput::Dense(values.clone()),
            Some(CurveDef::Pairs(keys)) => CurveInput::Pairs(
                keys.iter()
                    .filter_map(|k| Some((k.t.0?, k.v.0.unwrap_or(0.0))))
                    .collect(),
            ),
            Some(CurveDef::Invalid(_)) | None => CurveInput::Pairs(Vec::new()),
        }
    }

    /// Pitch curve in canonical input form; a missing `hz` reads as 0.
    pub fn pitch_input(&self) -> CurveInput {
        CurveInput::Pairs(
            self.pitch
                .0
                .iter()
                .flatten()
                .filter_map(|k| {
                    let k = k.0.as_ref()?;
                    Some((k.t.0?, k.hz.0.unwrap_or(0.0)))
                })
                .collect(),
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schema/descriptor.rs"]
mod tests;
