//! Tensor values, descriptors and byte-size computation.

mod info;
mod value;

pub use info::{tensor_size_in_bytes, TensorTypeAndShape};
pub use value::{Tensor, TensorElement, Value};
