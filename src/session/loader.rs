use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use arc_swap::ArcSwapOption;

use crate::foundation::error::{VizError, VizResult};
use crate::model::{ModelOptions, VisualizationModel};
use crate::schema::descriptor::DescriptorDef;

/// Where an analysis descriptor is read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DescriptorSource {
    Url(String),
    Path(PathBuf),
}

impl DescriptorSource {
    /// `http://` and `https://` locations are URLs; anything else is a filesystem path.
    pub fn parse(s: &str) -> Self {
        let t = s.trim();
        let lower = t.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(t.to_owned())
        } else {
            Self::Path(PathBuf::from(t))
        }
    }
}

impl fmt::Display for DescriptorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(u) => f.write_str(u),
            Self::Path(p) => write!(f, "{}", p.display()),
        }
    }
}

/// Read and parse a descriptor.
#[tracing::instrument(skip_all, fields(source = %src))]
pub fn fetch_descriptor(src: &DescriptorSource) -> VizResult<DescriptorDef> {
    match src {
        DescriptorSource::Path(p) => DescriptorDef::from_path(p),
        DescriptorSource::Url(u) => fetch_url(u),
    }
}

#[cfg(feature = "http")]
fn fetch_url(url: &str) -> VizResult<DescriptorDef> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| VizError::fetch(format!("GET {url}: {e}")))?;
    if response.status() != 200 {
        return Err(VizError::fetch(format!(
            "HTTP {} from {url}",
            response.status()
        )));
    }
    let body = response
        .into_string()
        .map_err(|e| VizError::fetch(format!("read body from {url}: {e}")))?;
    DescriptorDef::from_json_str(&body)
}

#[cfg(not(feature = "http"))]
fn fetch_url(url: &str) -> VizResult<DescriptorDef> {
    Err(VizError::fetch(format!(
        "cannot fetch {url}: built without the `http` feature"
    )))
}

/// Fetch a descriptor and build its model.
pub fn load_model(src: &DescriptorSource, opts: &ModelOptions) -> VizResult<VisualizationModel> {
    let def = fetch_descriptor(src)?;
    Ok(VisualizationModel::from_descriptor(&def, opts))
}

/// Shared, atomically replaceable handle to the current model.
///
/// Readers see either the previous complete model or the new one, never a partial state.
#[derive(Clone, Default)]
pub struct ModelSlot {
    inner: Arc<ArcSwapOption<VisualizationModel>>,
}

impl ModelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current model, if any.
    pub fn load(&self) -> Option<Arc<VisualizationModel>> {
        self.inner.load_full()
    }

    /// Replace the current model.
    pub fn publish(&self, model: Arc<VisualizationModel>) {
        self.inner.store(Some(model));
    }

    /// Drop the current model.
    pub fn clear(&self) {
        self.inner.store(None);
    }

    /// Drop `model` if it is still the current one. Returns whether it was removed.
    pub fn retract(&self, model: &Arc<VisualizationModel>) -> bool {
        let expected = Some(Arc::clone(model));
        let prev = self.inner.compare_and_swap(&expected, None::<Arc<VisualizationModel>>);
        matches!(&*prev, Some(p) if Arc::ptr_eq(p, model))
    }
}

impl fmt::Debug for ModelSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSlot")
            .field("loaded", &self.inner.load().is_some())
            .finish()
    }
}

/// Publish `result` into `slot` unless `alive` was cleared. Returns whether it was published.
///
/// Teardown may clear `alive` between the check and the store, so the flag is read again
/// afterwards and a model that lost the race is retracted from the slot.
pub(crate) fn publish_if_alive(
    slot: &ModelSlot,
    alive: &AtomicBool,
    result: VizResult<VisualizationModel>,
) -> bool {
    match result {
        Ok(model) if alive.load(Ordering::Acquire) => {
            let model = Arc::new(model);
            slot.publish(Arc::clone(&model));
            if !alive.load(Ordering::Acquire) {
                slot.retract(&model);
                tracing::debug!("retracted model published during teardown");
                return false;
            }
            tracing::info!("model published");
            true
        }
        Ok(_) => {
            tracing::debug!("discarding model loaded after teardown");
            false
        }
        Err(e) => {
            tracing::warn!(error = %e, "descriptor load failed; staying idle");
            false
        }
    }
}

/// Load a descriptor on a background thread and publish it into `slot`.
///
/// Failures are logged and leave the slot untouched. A result arriving after `alive` was
/// cleared is dropped.
pub fn spawn_fetch(
    src: DescriptorSource,
    opts: ModelOptions,
    slot: ModelSlot,
    alive: Arc<AtomicBool>,
) -> VizResult<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("beatglow-fetch".to_owned())
        .spawn(move || {
            let result = load_model(&src, &opts);
            publish_if_alive(&slot, &alive, result);
        })
        .map_err(|e| VizError::fetch(format!("failed to spawn fetch thread: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/session/loader.rs"]
mod tests;
