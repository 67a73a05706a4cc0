/// Convenience result type used across beatglow.
pub type VizResult<T> = Result<T, VizError>;

/// Top-level error taxonomy used by the engine's fallible APIs.
///
/// Per-frame rendering never surfaces these to a frame host; they are returned only by the
/// explicit loading, configuration and encoding entry points.
#[derive(thiserror::Error, Debug)]
pub enum VizError {
    /// Invalid caller-provided configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// A descriptor document that could not be read as JSON at all.
    #[error("descriptor error: {0}")]
    Descriptor(String),

    /// Network or filesystem failure while fetching a descriptor.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Rasterization failure.
    #[error("render error: {0}")]
    Render(String),

    /// Frame sink / encoder failure.
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VizError {
    /// Build a [`VizError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`VizError::Descriptor`] value.
    pub fn descriptor(msg: impl Into<String>) -> Self {
        Self::Descriptor(msg.into())
    }

    /// Build a [`VizError::Fetch`] value.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Build a [`VizError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`VizError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
