//! Descriptor boundary schema and canonicalization of sections and palettes.

pub(crate) mod descriptor;
pub(crate) mod palette;
pub(crate) mod sections;
