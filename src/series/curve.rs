use serde::Serialize;

/// Smallest time delta used as an interpolation denominator.
const MIN_SPAN: f64 = 1e-6;

/// A `(time, value)` sample point of a piecewise-linear curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Keyframe {
    /// Time in seconds (or normalized time for dense inputs).
    pub t: f64,
    /// Value at `t`.
    pub v: f64,
}

impl Keyframe {
    /// Construct a keyframe.
    pub fn new(t: f64, v: f64) -> Self {
        Self { t, v }
    }
}

/// The two accepted curve input shapes, after the descriptor's loose JSON has been parsed.
#[derive(Clone, Debug, PartialEq)]
pub enum CurveInput {
    /// Values without timestamps, spread uniformly over normalized time `[0, 1]`.
    Dense(Vec<f64>),
    /// Explicit `(t, v)` pairs in any order.
    Pairs(Vec<(f64, f64)>),
}

/// Time domain of a curve's keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBase {
    /// Keys are in seconds.
    #[default]
    Seconds,
    /// Keys span `[0, 1]` over the whole track.
    Normalized,
}

/// A piecewise-linear curve with keys sorted ascending by time.
///
/// Built once at load time; sampling never re-validates the input.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Curve {
    keys: Vec<Keyframe>,
    time_base: TimeBase,
}

impl Curve {
    /// Normalize an input into a sorted curve.
    ///
    /// Dense input of length `N` maps index `i` to `t = i / max(1, N - 1)`. Pair input is
    /// sorted stably by `t`; pairs with a non-finite time are dropped and non-finite values read
    /// as `0`.
    pub fn from_input(input: CurveInput) -> Self {
        let (keys, time_base) = match input {
            CurveInput::Dense(values) => {
                let denom = values.len().saturating_sub(1).max(1) as f64;
                let keys = values
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| Keyframe::new(i as f64 / denom, finite_or_zero(v)))
                    .collect();
                (keys, TimeBase::Normalized)
            }
            CurveInput::Pairs(pairs) => {
                let mut keys: Vec<Keyframe> = pairs
                    .into_iter()
                    .filter(|(t, _)| t.is_finite())
                    .map(|(t, v)| Keyframe::new(t, finite_or_zero(v)))
                    .collect();
                keys.sort_by(|a, b| a.t.total_cmp(&b.t));
                (keys, TimeBase::Seconds)
            }
        };
        Self { keys, time_base }
    }

    /// Sorted keys.
    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Time domain of the keys.
    pub fn time_base(&self) -> TimeBase {
        self.time_base
    }

    /// Return `true` when the curve has no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Sample the curve at `t`.
    ///
    /// Empty curves yield `0`. Times outside the key span clamp to the boundary values.
    pub fn sample(&self, t: f64) -> f64 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if t.is_nan() || t <= first.t {
            return first.v;
        }
        if t >= last.t {
            return last.v;
        }

        // First key at or past `t`; always in 1..len here.
        let idx = self.keys.partition_point(|k| k.t < t);
        let a = &self.keys[idx - 1];
        let b = &self.keys[idx];
        let u = (t - a.t) / (b.t - a.t).max(MIN_SPAN);
        a.v + (b.v - a.v) * u
    }

    /// Sample at a playback position in seconds.
    ///
    /// Normalized curves are sampled at `t / duration` (at 0 when the duration is unknown).
    pub fn sample_secs(&self, t: f64, duration: f64) -> f64 {
        match self.time_base {
            TimeBase::Seconds => self.sample(t),
            TimeBase::Normalized if duration > 0.0 => self.sample(t / duration),
            TimeBase::Normalized => self.sample(0.0),
        }
    }

    /// Sample `segments + 1` evenly spaced playback positions across `[0, duration]`.
    ///
    /// Returns `(u, value)` pairs where `u` is the normalized position in `[0, 1]`.
    pub fn resample(&self, segments: usize, duration: f64) -> Vec<(f64, f64)> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| {
                let u = i as f64 / segments as f64;
                (u, self.sample_secs(u * duration, duration))
            })
            .collect()
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

#[cfg(test)]
#[path = "../../tests/unit/series/curve.rs"]
mod tests;
