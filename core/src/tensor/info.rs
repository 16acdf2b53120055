//! Tensor shape/type descriptors and the byte-size computation.

use std::ptr::{self, NonNull};

use tracing::trace;

use crate::engine::ffi::{ONNXTensorElementDataType, OrtTensorTypeAndShapeInfo, OrtValue};
use crate::engine::Api;
use crate::error::{OrtError, Result};
use crate::status::check;
use crate::types::ElementType;

/// Owned shape/type descriptor of a tensor.
///
/// Released through the engine exactly once, when dropped.
pub struct TensorTypeAndShape {
    api: Api,
    ptr: NonNull<OrtTensorTypeAndShapeInfo>,
}

impl TensorTypeAndShape {
    /// Fetch the descriptor of a tensor value.
    ///
    /// # Safety
    ///
    /// `value` must be a live tensor created by `api`'s engine.
    pub unsafe fn of_value(api: &Api, value: *const OrtValue) -> Result<Self> {
        let mut out = ptr::null_mut();
        check(api, api.engine().get_tensor_type_and_shape(value, &mut out))?;
        let ptr = NonNull::new(out)
            .ok_or_else(|| OrtError::tensor("engine returned a null type-and-shape descriptor"))?;
        Ok(Self {
            api: api.clone(),
            ptr,
        })
    }

    /// Number of dimensions.
    pub fn dimensions_count(&self) -> Result<usize> {
        let mut count = 0usize;
        unsafe {
            check(
                &self.api,
                self.api
                    .engine()
                    .get_dimensions_count(self.ptr.as_ptr(), &mut count),
            )?;
        }
        Ok(count)
    }

    /// Element type as reported by the engine, unmapped.
    pub fn raw_element_type(&self) -> Result<ONNXTensorElementDataType> {
        let mut raw: ONNXTensorElementDataType = 0;
        unsafe {
            check(
                &self.api,
                self.api
                    .engine()
                    .get_tensor_element_type(self.ptr.as_ptr(), &mut raw),
            )?;
        }
        Ok(raw)
    }

    /// Element type of the tensor.
    pub fn element_type(&self) -> Result<ElementType> {
        let raw = self.raw_element_type()?;
        ElementType::from_raw(raw).ok_or_else(|| unknown_element_type(raw))
    }

    /// Dimension values.
    pub fn dimensions(&self) -> Result<Vec<i64>> {
        let count = self.dimensions_count()?;
        self.fill_dimensions(count)
    }

    /// Total number of elements (product of the dimensions).
    pub fn element_count(&self) -> Result<usize> {
        Ok(element_count(&self.dimensions()?))
    }

    fn fill_dimensions(&self, count: usize) -> Result<Vec<i64>> {
        let mut dims = vec![0i64; count];
        unsafe {
            check(
                &self.api,
                self.api
                    .engine()
                    .get_dimensions(self.ptr.as_ptr(), dims.as_mut_ptr(), count),
            )?;
        }
        Ok(dims)
    }
}

impl Drop for TensorTypeAndShape {
    fn drop(&mut self) {
        unsafe {
            self.api
                .engine()
                .release_tensor_type_and_shape_info(self.ptr.as_ptr())
        }
    }
}

/// Number of bytes in the buffer backing a tensor.
///
/// Queries the descriptor, its dimension count, element type and dimension
/// values in that order, then multiplies the element count by the element
/// width. The first failing query aborts the computation; the descriptor is
/// released on every path.
///
/// # Safety
///
/// `value` must be a live tensor created by `api`'s engine.
pub unsafe fn tensor_size_in_bytes(api: &Api, value: *const OrtValue) -> Result<usize> {
    let info = TensorTypeAndShape::of_value(api, value)?;
    let count = info.dimensions_count()?;
    let raw_type = info.raw_element_type()?;
    let dims = info.fill_dimensions(count)?;

    let elements = element_count(&dims);
    let element_type =
        ElementType::from_raw(raw_type).ok_or_else(|| unknown_element_type(raw_type))?;
    let bytes = element_type.bytes_for(elements).unwrap_or(usize::MAX);

    trace!(?dims, %element_type, bytes, "computed tensor size");
    Ok(bytes)
}

/// Product of the dimensions. An empty shape is a scalar with one element.
///
/// The product is accumulated in a signed 64-bit integer without guards, so
/// symbolic (negative) dimensions give a degenerate product. A product that
/// is not positive counts as zero elements.
fn element_count(dims: &[i64]) -> usize {
    let product = dims.iter().fold(1i64, |acc, &dim| acc.wrapping_mul(dim));
    usize::try_from(product).unwrap_or(0)
}

fn unknown_element_type(raw: ONNXTensorElementDataType) -> OrtError {
    OrtError::tensor(format!("unknown element type {}", raw))
}
