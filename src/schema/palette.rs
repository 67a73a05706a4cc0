use std::cmp::Ordering;

use serde::{Serialize, Serializer};

use crate::foundation::core::Rgba8;
use crate::schema::sections::Section;

/// A palette entry: the color text as supplied plus its parsed RGBA value.
///
/// Parsing happens once when the palette is normalized. Text that is not a recognized hex
/// color keeps its raw form and renders as white.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaletteColor {
    raw: String,
    rgba: Option<Rgba8>,
}

impl PaletteColor {
    /// Parse a color string.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let rgba = parse_hex(&raw);
        Self { raw, rgba }
    }

    /// The color text as supplied.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Return `true` when the text parsed as a hex color.
    pub fn is_valid(&self) -> bool {
        self.rgba.is_some()
    }

    /// Parsed color, white when unparseable.
    pub fn rgba(&self) -> Rgba8 {
        self.rgba.unwrap_or(Rgba8::WHITE)
    }
}

impl Serialize for PaletteColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Built-in palettes used when a descriptor carries no usable palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Theme {
    /// Soft blues and pinks.
    #[default]
    Pastel,
    /// Saturated high-contrast colors.
    Neon,
    /// Dark blues fading into pink.
    Sunset,
}

impl Theme {
    /// Resolve a theme by name. Unrecognized names resolve to [`Theme::Pastel`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "neon" => Self::Neon,
            "sunset" => Self::Sunset,
            _ => Self::Pastel,
        }
    }

    /// Colors of this theme, in order.
    pub fn colors(self) -> &'static [&'static str] {
        match self {
            Self::Pastel => &["#a1c4fd", "#c2e9fb", "#ffdde1", "#b8c6db", "#f5f7fa"],
            Self::Neon => &["#00F5D4", "#9B5DE5", "#F15BB5", "#FEE440", "#00BBF9"],
            Self::Sunset => &["#0b132b", "#1c2541", "#3a506b", "#5bc0be", "#f2b5d4"],
        }
    }
}

/// The accepted palette shapes after tagged parsing of the descriptor.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum PaletteInput {
    /// Ordered color list, used verbatim.
    List(Vec<String>),
    /// Colors keyed by stringified index.
    Keyed(Vec<(String, String)>),
    /// Absent or invalid.
    #[default]
    Missing,
}

/// Normalize a palette into a non-empty ordered color list.
///
/// Keyed palettes are ordered by numeric key ascending; keys that are not numbers sort after
/// numeric ones, lexically. Missing or empty palettes fall back to the named theme.
pub fn normalize_palette(input: PaletteInput, theme: &str) -> Vec<PaletteColor> {
    let colors: Vec<String> = match input {
        PaletteInput::List(list) => list,
        PaletteInput::Keyed(mut entries) => {
            entries.sort_by(|(a, _), (b, _)| compare_keys(a, b));
            entries.into_iter().map(|(_, v)| v).collect()
        }
        PaletteInput::Missing => Vec::new(),
    };

    if colors.is_empty() {
        return Theme::from_name(theme)
            .colors()
            .iter()
            .map(|c| PaletteColor::parse(*c))
            .collect();
    }
    colors.into_iter().map(PaletteColor::parse).collect()
}

fn compare_keys(a: &str, b: &str) -> Ordering {
    let na = a.trim().parse::<f64>().ok().filter(|v| v.is_finite());
    let nb = b.trim().parse::<f64>().ok().filter(|v| v.is_finite());
    match (na, nb) {
        (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Index of the section containing `t` (`start <= t < end`), or the last section when `t`
/// lies past every boundary. `None` when there are no sections.
pub fn section_index_at(t: f64, sections: &[Section]) -> Option<usize> {
    if sections.is_empty() {
        return None;
    }
    let idx = sections
        .iter()
        .position(|s| t >= s.start && t < s.end)
        .unwrap_or(sections.len() - 1);
    Some(idx)
}

/// Color of the section containing `t`; the palette cycles when it has fewer colors than there
/// are sections. With no sections the first palette color is used.
///
/// `palette` must be non-empty, which [`normalize_palette`] guarantees.
pub fn color_at<'a>(t: f64, sections: &[Section], palette: &'a [PaletteColor]) -> &'a PaletteColor {
    let idx = section_index_at(t, sections).unwrap_or(0);
    &palette[idx % palette.len()]
}

fn parse_hex(s: &str) -> Option<Rgba8> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);
    if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    fn hex_byte(pair: &str) -> Option<u8> {
        u8::from_str_radix(pair, 16).ok()
    }
    fn hex_nibble(c: &str) -> Option<u8> {
        u8::from_str_radix(c, 16).ok().map(|n| n * 17)
    }

    match s.len() {
        3 => Some(Rgba8::rgb(
            hex_nibble(&s[0..1])?,
            hex_nibble(&s[1..2])?,
            hex_nibble(&s[2..3])?,
        )),
        6 => Some(Rgba8::rgb(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
        )),
        8 => Some(Rgba8 {
            r: hex_byte(&s[0..2])?,
            g: hex_byte(&s[2..4])?,
            b: hex_byte(&s[4..6])?,
            a: hex_byte(&s[6..8])?,
        }),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schema/palette.rs"]
mod tests;
