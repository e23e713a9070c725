//! Engine backends. `remote` is always available; the accelerator runtimes
//! are opt-in cargo features.

pub mod remote;

#[cfg(feature = "ort")]
pub mod ort;

#[cfg(feature = "tract")]
pub mod tract;
