//! Owned engine values and tensors backed by Rust buffers.

use ndarray::{ArrayD, IxDyn};
use std::ffi::c_void;
use std::fmt;
use std::mem::{align_of, size_of};
use std::ops::Deref;
use std::ptr::{self, NonNull};

use tracing::trace;

use super::info::{tensor_size_in_bytes, TensorTypeAndShape};
use crate::engine::ffi::OrtValue;
use crate::engine::Api;
use crate::error::{OrtError, Result};
use crate::memory::MemoryInfo;
use crate::status::check;
use crate::types::ElementType;

/// Rust types that map onto a fixed-width engine element type.
pub trait TensorElement: Copy + Send + 'static {
    const ELEMENT_TYPE: ElementType;
}

macro_rules! tensor_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl TensorElement for $ty {
                const ELEMENT_TYPE: ElementType = ElementType::$variant;
            }
        )*
    };
}

tensor_element! {
    f32 => Float,
    f64 => Double,
    i8 => Int8,
    u8 => Uint8,
    i16 => Int16,
    u16 => Uint16,
    i32 => Int32,
    u32 => Uint32,
    i64 => Int64,
    u64 => Uint64,
    bool => Bool,
}

/// An engine value, released when dropped.
///
/// Values returned by [`Session::run`](crate::Session::run) own their data
/// inside the engine; values created from Rust data are wrapped in a
/// [`Tensor`] that also owns the buffer.
pub struct Value {
    api: Api,
    ptr: NonNull<OrtValue>,
}

// SAFETY: a value is only reachable through its owner; the engine does not
// tie values to the creating thread.
unsafe impl Send for Value {}

impl Value {
    /// Take ownership of a raw value.
    ///
    /// Returns `None` for a null pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a value created by `api`'s engine that nothing
    /// else will release.
    pub unsafe fn from_raw(api: &Api, ptr: *mut OrtValue) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self {
            api: api.clone(),
            ptr,
        })
    }

    /// Raw value handle.
    pub fn as_ptr(&self) -> *const OrtValue {
        self.ptr.as_ptr()
    }

    /// Raw value handle, for binding as a run output.
    pub fn as_mut_ptr(&mut self) -> *mut OrtValue {
        self.ptr.as_ptr()
    }

    /// Shape/type descriptor of this tensor.
    pub fn type_and_shape(&self) -> Result<TensorTypeAndShape> {
        unsafe { TensorTypeAndShape::of_value(&self.api, self.as_ptr()) }
    }

    /// Dimension values of this tensor.
    pub fn dimensions(&self) -> Result<Vec<i64>> {
        self.type_and_shape()?.dimensions()
    }

    /// Element type of this tensor.
    pub fn element_type(&self) -> Result<ElementType> {
        self.type_and_shape()?.element_type()
    }

    /// Number of bytes in the buffer backing this tensor.
    pub fn size_in_bytes(&self) -> Result<usize> {
        unsafe { tensor_size_in_bytes(&self.api, self.as_ptr()) }
    }

    /// Pointer to the tensor's data buffer.
    pub fn data_ptr(&self) -> Result<*mut c_void> {
        let mut out = ptr::null_mut();
        unsafe {
            check(
                &self.api,
                self.api
                    .engine()
                    .get_tensor_mutable_data(self.ptr.as_ptr(), &mut out),
            )?;
        }
        Ok(out)
    }

    /// View the tensor's data as a slice of `T`.
    ///
    /// Fails if `T` does not match the tensor's element type.
    pub fn as_slice<T: TensorElement>(&self) -> Result<&[T]> {
        let (data, len) = self.typed_data::<T>()?;
        if len == 0 {
            return Ok(&[]);
        }
        Ok(unsafe { std::slice::from_raw_parts(data.cast::<T>(), len) })
    }

    /// Mutable view of the tensor's data as a slice of `T`.
    pub fn as_mut_slice<T: TensorElement>(&mut self) -> Result<&mut [T]> {
        let (data, len) = self.typed_data::<T>()?;
        if len == 0 {
            return Ok(&mut []);
        }
        Ok(unsafe { std::slice::from_raw_parts_mut(data.cast::<T>(), len) })
    }

    /// Copy the tensor into an `ndarray` array with its shape.
    pub fn to_array<T: TensorElement>(&self) -> Result<ArrayD<T>> {
        let shape = self
            .dimensions()?
            .into_iter()
            .map(|d| {
                usize::try_from(d)
                    .map_err(|_| OrtError::tensor(format!("dimension {} is negative", d)))
            })
            .collect::<Result<Vec<usize>>>()?;
        let data = self.as_slice::<T>()?.to_vec();
        ArrayD::from_shape_vec(IxDyn(&shape), data)
            .map_err(|e| OrtError::tensor(format!("Array shape error: {}", e)))
    }

    fn typed_data<T: TensorElement>(&self) -> Result<(*mut c_void, usize)> {
        let element_type = self.element_type()?;
        if element_type != T::ELEMENT_TYPE {
            return Err(OrtError::tensor(format!(
                "tensor holds {} elements, requested {}",
                element_type,
                T::ELEMENT_TYPE
            )));
        }
        let len = self.size_in_bytes()? / size_of::<T>();
        if len == 0 {
            return Ok((ptr::null_mut(), 0));
        }
        let data = self.data_ptr()?;
        if data.is_null() {
            return Err(OrtError::tensor("null tensor data"));
        }
        if (data as usize) % align_of::<T>() != 0 {
            return Err(OrtError::tensor(format!(
                "tensor data is not aligned for {}",
                T::ELEMENT_TYPE
            )));
        }
        Ok((data, len))
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        trace!("Releasing value {:p}", self.ptr);
        unsafe { self.api.engine().release_value(self.ptr.as_ptr()) }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value").field("ptr", &self.ptr).finish()
    }
}

/// A tensor whose data lives in a Rust buffer.
///
/// The engine does not copy the buffer, so the tensor keeps it alive and
/// releases the engine value before freeing it.
pub struct Tensor<T: TensorElement> {
    // Field order matters: the value is dropped before the buffer.
    value: Value,
    data: Vec<T>,
}

impl<T: TensorElement> Tensor<T> {
    /// Create a tensor over `data` with the given shape.
    ///
    /// The engine validates that the shape matches the data length.
    pub fn from_vec(info: &MemoryInfo, mut data: Vec<T>, shape: &[i64]) -> Result<Self> {
        let api = info.api();
        let data_len = data.len() * size_of::<T>();
        let data_ptr: *mut c_void = if data.is_empty() {
            ptr::null_mut()
        } else {
            data.as_mut_ptr().cast()
        };
        let shape_ptr = if shape.is_empty() {
            ptr::null()
        } else {
            shape.as_ptr()
        };

        let mut out = ptr::null_mut();
        unsafe {
            check(
                api,
                api.engine().create_tensor_with_data_as_ort_value(
                    info.as_ptr(),
                    data_ptr,
                    data_len,
                    shape_ptr,
                    shape.len(),
                    T::ELEMENT_TYPE.to_raw(),
                    &mut out,
                ),
            )?;
        }
        let value = unsafe { Value::from_raw(api, out) }
            .ok_or_else(|| OrtError::tensor("engine returned a null tensor"))?;

        let element_type = T::ELEMENT_TYPE;
        trace!(?shape, %element_type, "created tensor");
        Ok(Self { value, data })
    }

    /// Create a tensor from an `ndarray` array, copying it in logical order.
    pub fn from_array<D: ndarray::Dimension>(
        info: &MemoryInfo,
        array: &ndarray::Array<T, D>,
    ) -> Result<Self> {
        let shape: Vec<i64> = array.shape().iter().map(|&s| s as i64).collect();
        let data: Vec<T> = array.iter().copied().collect();
        Self::from_vec(info, data, &shape)
    }

    /// The Rust buffer backing this tensor.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable access to the backing buffer. Changes are visible to the engine.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// The engine value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Mutable engine value, for binding as a run output.
    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }
}

impl<T: TensorElement> Deref for Tensor<T> {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.value
    }
}

impl<T: TensorElement + fmt::Debug> fmt::Debug for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("value", &self.value)
            .field("len", &self.data.len())
            .finish()
    }
}
