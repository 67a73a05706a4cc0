//! Sparse time-series normalization and sampling.

pub(crate) mod curve;
