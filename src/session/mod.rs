//! Descriptor loading, the per-frame render loop, and offline timeline rendering.

pub(crate) mod loader;
pub(crate) mod offline;
pub(crate) mod render_loop;
