use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{FrameIndex, Rgba8};
use crate::foundation::error::{VizError, VizResult};
use crate::render::backend::FrameRGBA;
use crate::render::composite::flatten_to_opaque_rgba8;

fn ensure_parent_dir(path: &Path) -> VizResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Write a single frame as an opaque PNG, flattening alpha over black.
pub fn write_png(path: &Path, frame: &FrameRGBA) -> VizResult<()> {
    ensure_parent_dir(path)?;
    let mut straight = vec![0u8; frame.data.len()];
    flatten_to_opaque_rgba8(
        &mut straight,
        &frame.data,
        frame.premultiplied,
        Rgba8::rgb(0, 0, 0),
    )?;
    image::save_buffer_with_format(
        path,
        &straight,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
    .map_err(|e| VizError::encode(format!("{e:#}")))
}

/// Writes each frame to `<dir>/frame_00000.png`, `<dir>/frame_00001.png`, ...
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    overwrite: bool,
    cfg: Option<SinkConfig>,
    written: u64,
}

impl PngSequenceSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            overwrite: true,
            cfg: None,
            written: 0,
        }
    }

    /// Whether existing frame files may be replaced (default `true`).
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Path of the file written for frame `idx`.
    pub fn frame_path(&self, idx: FrameIndex) -> PathBuf {
        self.dir.join(format!("frame_{:05}.png", idx.0))
    }

    /// Number of frames written so far.
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> VizResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(VizError::validation(
                "png sink width/height must be non-zero",
            ));
        }
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            VizError::encode(format!(
                "failed to create output directory '{}': {e}",
                self.dir.display()
            ))
        })?;
        self.cfg = Some(cfg);
        self.written = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> VizResult<()> {
        if self.cfg.is_none() {
            return Err(VizError::encode("png sink not started"));
        }
        let path = self.frame_path(idx);
        if !self.overwrite && path.exists() {
            return Err(VizError::encode(format!(
                "refusing to overwrite '{}'",
                path.display()
            )));
        }
        write_png(&path, frame)?;
        self.written += 1;
        Ok(())
    }

    fn end(&mut self) -> VizResult<()> {
        tracing::info!(frames = self.written, dir = %self.dir.display(), "png sequence written");
        self.cfg = None;
        Ok(())
    }
}
