//! Memory descriptions for tensors created from Rust data.

use std::ffi::CString;
use std::ptr::{self, NonNull};

use tracing::debug;

use crate::config::MemoryConfig;
use crate::engine::ffi::OrtMemoryInfo;
use crate::engine::Api;
use crate::error::{OrtError, Result};
use crate::status::check;
use crate::tensor::{Tensor, TensorElement};
use crate::types::{AllocatorType, MemType};

/// Device name for host memory.
pub const DEVICE_CPU: &str = "Cpu";

/// Device name for CUDA memory.
pub const DEVICE_CUDA: &str = "Cuda";

/// Owned `OrtMemoryInfo`.
pub struct MemoryInfo {
    api: Api,
    ptr: NonNull<OrtMemoryInfo>,
}

// SAFETY: memory info is immutable once created.
unsafe impl Send for MemoryInfo {}

impl MemoryInfo {
    /// Describe memory on the named device.
    pub fn new(
        api: &Api,
        name: &str,
        allocator: AllocatorType,
        id: i32,
        mem_type: MemType,
    ) -> Result<Self> {
        let name_cstr = CString::new(name)?;
        let mut out = ptr::null_mut();
        unsafe {
            check(
                api,
                api.engine().create_memory_info(
                    name_cstr.as_ptr(),
                    allocator.to_raw(),
                    id,
                    mem_type.to_raw(),
                    &mut out,
                ),
            )?;
        }
        let ptr = NonNull::new(out)
            .ok_or_else(|| OrtError::config("engine returned a null memory info"))?;
        debug!(name, ?allocator, id, ?mem_type, "Created memory info");
        Ok(Self {
            api: api.clone(),
            ptr,
        })
    }

    /// Arena-backed host memory on device 0.
    pub fn cpu(api: &Api) -> Result<Self> {
        Self::new(api, DEVICE_CPU, AllocatorType::Arena, 0, MemType::Default)
    }

    /// Build from the `memory` section of a config file.
    pub fn from_config(api: &Api, config: &MemoryConfig) -> Result<Self> {
        Self::new(
            api,
            &config.name,
            config.allocator,
            config.device_id,
            config.mem_type,
        )
    }

    /// Create a tensor over `data` in this memory.
    pub fn tensor_from_vec<T: TensorElement>(
        &self,
        data: Vec<T>,
        shape: &[i64],
    ) -> Result<Tensor<T>> {
        Tensor::from_vec(self, data, shape)
    }

    /// Create a tensor from an `ndarray` array in this memory.
    pub fn tensor_from_array<T: TensorElement, D: ndarray::Dimension>(
        &self,
        array: &ndarray::Array<T, D>,
    ) -> Result<Tensor<T>> {
        Tensor::from_array(self, array)
    }

    /// The engine this memory info was created by.
    pub fn api(&self) -> &Api {
        &self.api
    }

    /// Raw memory info handle.
    pub fn as_ptr(&self) -> *const OrtMemoryInfo {
        self.ptr.as_ptr()
    }
}

impl Drop for MemoryInfo {
    fn drop(&mut self) {
        unsafe { self.api.engine().release_memory_info(self.ptr.as_ptr()) }
    }
}
