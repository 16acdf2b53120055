//! onnx-shim: safe Rust bindings over the ONNX Runtime C API.
//!
//! Every engine call goes through a thin C bridge (`ort_bridge/`) that
//! forwards its arguments to the runtime's function table unchanged. On top
//! of that this crate provides owning handle types that release their engine
//! resource exactly once, and the tensor byte-size computation.
//!
//! # Features
//!
//! - **onnxruntime**: Build the C bridge and link ONNX Runtime. Enables
//!   `Api::linked`, `engine::runtime_version` and the `onnx-shim` binary.
//!
//! Without the feature the crate exposes the [`Engine`] seam only, and an
//! engine must be supplied through [`Api::new`].
//!
//! # Example
//!
//! ```ignore
//! use onnx_shim::{Api, Environment, LoggingLevel, MemoryInfo};
//!
//! let api = Api::linked()?;
//! let env = Environment::new(&api, LoggingLevel::Warning, "example")?;
//! let session = env.session("model.onnx", None)?;
//!
//! let allocator = session.allocator(&MemoryInfo::cpu(&api)?)?;
//! let input_name = allocator.input_name(0)?;
//!
//! let memory = MemoryInfo::cpu(&api)?;
//! let input = memory.tensor_from_vec(vec![1.0f32, 2.0, 3.0], &[1, 3])?;
//! let outputs = session.run(&[(input_name.as_str(), input.value())], &["y"])?;
//! println!("{} bytes", outputs[0].size_in_bytes()?);
//! ```
//!
//! # Building
//!
//! ONNX Runtime is found through `ONNXRUNTIME_DIR` or pkg-config.
//!
//! ```bash
//! # System install
//! cargo build --release --features onnxruntime
//!
//! # Extracted release
//! ONNXRUNTIME_DIR=/opt/onnxruntime-linux-x64-1.20.1 cargo build --release --features onnxruntime
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod memory;
pub mod session;
pub mod status;
pub mod tensor;
pub mod types;

// Re-export commonly used types
pub use engine::{Api, Engine};
pub use error::{OrtError, Result};
pub use memory::{MemoryInfo, DEVICE_CPU, DEVICE_CUDA};
pub use session::{Allocator, Environment, Session, SessionOptions};
pub use status::Status;
pub use tensor::{tensor_size_in_bytes, Tensor, TensorElement, TensorTypeAndShape, Value};
pub use types::{AllocatorType, ElementType, ErrorCode, LoggingLevel, MemType};
