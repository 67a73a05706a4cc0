//! beatglow renders audio-synchronized visualizations from precomputed analysis descriptors.
//!
//! A descriptor (duration, beats, sections, palette, loudness and pitch series) is normalized once
//! into an immutable [`VisualizationModel`]. A [`RenderLoop`] then samples that model at the
//! playback position on every frame, advances the beat-triggered particle and ring simulation,
//! and draws through a backend-agnostic [`FramePlan`] into premultiplied RGBA pixels.
//!
//! # Pipeline overview
//!
//! 1. **Load**: `DescriptorSource -> DescriptorDef -> VisualizationModel` (tolerant of loose JSON)
//! 2. **Simulate**: fire beats crossed since the last frame, spawn ambient particles, integrate
//! 3. **Compile**: `model + sample + effects -> FramePlan`
//! 4. **Render**: `FramePlan -> FrameRGBA` (CPU backend)
//! 5. **Encode** (optional): write frames as PNG files
//!
//! Live hosts drive [`RenderLoop`] through [`FrameHost`] and [`PlaybackClock`]; offline renders
//! use [`render_timeline`], which drives the same loop at a fixed frame rate.
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod config;
pub(crate) mod effects;
/// Frame sinks (PNG sequences, in-memory).
pub mod encode;
pub(crate) mod model;
pub(crate) mod render;
pub(crate) mod schema;
pub(crate) mod series;
pub(crate) mod session;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, Point, Rect, Rgba8, Vec2};
pub use crate::foundation::error::{VizError, VizResult};

pub use crate::config::{RenderConfig, SurfaceConfig};
pub use crate::effects::particle::Particle;
pub use crate::effects::ring::Ring;
pub use crate::effects::simulator::{
    BeatCursor, EffectParams, EffectSimulator, MAX_STEP_SECS, SpawnContext, burst_origin,
    step_secs,
};
pub use crate::encode::png::{PngSequenceSink, write_png};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::model::{ModelOptions, VisualizationModel};
pub use crate::render::backend::{FrameRGBA, RenderBackend};
pub use crate::render::compile::{
    DrawOp, FramePlan, FrameSample, GlowPass, IDLE_BACKGROUND, compile_frame, compile_idle,
};
pub use crate::render::cpu::CpuBackend;
pub use crate::schema::descriptor::DescriptorDef;
pub use crate::schema::palette::{
    PaletteColor, PaletteInput, Theme, color_at, normalize_palette, section_index_at,
};
pub use crate::schema::sections::{Section, SectionInput, normalize_sections};
pub use crate::series::curve::{Curve, CurveInput, Keyframe, TimeBase};
pub use crate::session::loader::{
    DescriptorSource, ModelSlot, fetch_descriptor, load_model, spawn_fetch,
};
pub use crate::session::offline::{
    OfflineHost, TimelineClock, TimelineStats, render_frame_at, render_timeline, timeline_frames,
};
pub use crate::session::render_loop::{
    FrameHost, FrameRequestId, LoopState, LoopStats, PlaybackClock, RenderLoop,
    ResizeSubscription, read_position,
};
