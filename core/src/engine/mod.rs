//! Engine access.
//!
//! `ffi` holds the raw bridge declarations, `api` the [`Engine`] seam every
//! safe type forwards through, and `linked` (feature `onnxruntime`) the
//! engine backed by the linked ONNX Runtime.

mod api;
pub mod ffi;
#[cfg(feature = "onnxruntime")]
mod linked;

pub use api::{Api, Engine};
#[cfg(feature = "onnxruntime")]
pub use linked::{runtime_version, LinkedEngine};
