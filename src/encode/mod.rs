//! Frame sinks.
//!
//! Sinks consume rendered frames in timeline order and are driven by
//! [`render_timeline`](crate::render_timeline).

/// PNG output.
pub mod png;
/// Sink trait and the in-memory sink.
pub mod sink;
