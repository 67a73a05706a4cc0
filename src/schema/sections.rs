use serde::Serialize;

/// A contiguous time interval of the track with a display label.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Section {
    /// Inclusive start in seconds.
    pub start: f64,
    /// Exclusive end in seconds.
    pub end: f64,
    /// Display label.
    pub label: String,
}

/// One section entry as it appears in a descriptor, with every field optional.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SectionInput {
    /// Start time, when the entry carries one.
    pub start: Option<f64>,
    /// End time.
    pub end: Option<f64>,
    /// Label.
    pub label: Option<String>,
}

impl SectionInput {
    /// An entry carrying only an end boundary.
    pub fn end_only(end: f64) -> Self {
        Self {
            end: Some(end),
            ..Self::default()
        }
    }
}

/// Canonicalize raw section entries into `{start, end, label}` form.
///
/// When the first entry carries a `start`, entries pass through as supplied (only absent
/// fields are filled). Otherwise entries are successive end boundaries: the first section
/// starts at 0, each next one starts where the previous ended, labels run `A`, `B`, ... and
/// the final end is raised to `duration` when it falls short.
pub fn normalize_sections(raw: &[SectionInput], duration: f64) -> Vec<Section> {
    let Some(first) = raw.first() else {
        return Vec::new();
    };

    if first.start.is_some() {
        let mut prev_end = 0.0;
        return raw
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let start = s.start.unwrap_or(prev_end);
                let end = s.end.unwrap_or(start);
                prev_end = end;
                Section {
                    start,
                    end,
                    label: s.label.clone().unwrap_or_else(|| alpha_label(i)),
                }
            })
            .collect();
    }

    let mut out = Vec::with_capacity(raw.len());
    let mut prev = 0.0;
    for (i, s) in raw.iter().enumerate() {
        let end = s.end.unwrap_or(prev);
        out.push(Section {
            start: prev,
            end,
            label: alpha_label(i),
        });
        prev = end;
    }
    if let Some(last) = out.last_mut()
        && last.end < duration
    {
        last.end = duration;
    }
    out
}

/// Spreadsheet-style label: `A`..`Z`, then `AA`, `AB`, ...
pub(crate) fn alpha_label(mut i: usize) -> String {
    let mut out = Vec::new();
    loop {
        out.push(b'A' + (i % 26) as u8);
        if i < 26 {
            break;
        }
        i = i / 26 - 1;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
#[path = "../../tests/unit/schema/sections.rs"]
mod tests;
