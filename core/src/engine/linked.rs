//! The engine backed by the linked ONNX Runtime, through the C bridge.

use std::ffi::{c_void, CStr};
use std::os::raw::{c_char, c_int};
use std::sync::OnceLock;

use tracing::debug;

use super::api::{Api, Engine};
use super::ffi::{self, *};
use crate::error::{OrtError, Result};

/// Forwards every call to the bridge with the runtime's function table.
pub struct LinkedEngine {
    api: *const OrtApi,
}

// SAFETY: the function table is immutable for the lifetime of the process and
// the runtime's entry points are callable from any thread.
unsafe impl Send for LinkedEngine {}
unsafe impl Sync for LinkedEngine {}

impl LinkedEngine {
    /// Fetch the function table from the linked runtime.
    pub fn load() -> Result<Self> {
        let api = unsafe { ffi::shim_get_api() };
        if api.is_null() {
            let version = unsafe { ffi::shim_api_version() };
            return Err(OrtError::ApiUnavailable(version));
        }
        debug!("Loaded ONNX Runtime API table, runtime {}", runtime_version());
        Ok(Self { api })
    }
}

static LINKED: OnceLock<Api> = OnceLock::new();

impl Api {
    /// The process-wide handle to the linked runtime.
    ///
    /// The table is fetched on first use and shared afterwards.
    pub fn linked() -> Result<Api> {
        if let Some(api) = LINKED.get() {
            return Ok(api.clone());
        }
        let engine = LinkedEngine::load()?;
        Ok(LINKED.get_or_init(|| Api::new(engine)).clone())
    }
}

/// Version string reported by the linked runtime.
pub fn runtime_version() -> String {
    unsafe {
        let ptr = ffi::shim_version_string();
        if ptr.is_null() {
            "unknown".to_string()
        } else {
            CStr::from_ptr(ptr).to_string_lossy().into_owned()
        }
    }
}

impl Engine for LinkedEngine {
    unsafe fn create_env(
        &self,
        level: OrtLoggingLevel,
        name: *const c_char,
        out: *mut *mut OrtEnv,
    ) -> OrtStatusPtr {
        ffi::shim_create_env(self.api, level, name, out)
    }

    unsafe fn create_session_options(&self, out: *mut *mut OrtSessionOptions) -> OrtStatusPtr {
        ffi::shim_create_session_options(self.api, out)
    }

    unsafe fn create_session(
        &self,
        env: *const OrtEnv,
        model_path: *const OrtChar,
        options: *const OrtSessionOptions,
        out: *mut *mut OrtSession,
    ) -> OrtStatusPtr {
        ffi::shim_create_session(self.api, env, model_path, options, out)
    }

    unsafe fn create_memory_info(
        &self,
        name: *const c_char,
        kind: OrtAllocatorType,
        id: c_int,
        mem_type: OrtMemType,
        out: *mut *mut OrtMemoryInfo,
    ) -> OrtStatusPtr {
        ffi::shim_create_memory_info(self.api, name, kind, id, mem_type, out)
    }

    unsafe fn create_allocator(
        &self,
        session: *const OrtSession,
        mem_info: *const OrtMemoryInfo,
        out: *mut *mut OrtAllocator,
    ) -> OrtStatusPtr {
        ffi::shim_create_allocator(self.api, session, mem_info, out)
    }

    unsafe fn session_get_input_count(
        &self,
        session: *const OrtSession,
        out: *mut usize,
    ) -> OrtStatusPtr {
        ffi::shim_session_get_input_count(self.api, session, out)
    }

    unsafe fn session_get_input_name(
        &self,
        session: *const OrtSession,
        index: usize,
        allocator: *mut OrtAllocator,
        out: *mut *mut c_char,
    ) -> OrtStatusPtr {
        ffi::shim_session_get_input_name(self.api, session, index, allocator, out)
    }

    unsafe fn session_get_output_count(
        &self,
        session: *const OrtSession,
        out: *mut usize,
    ) -> OrtStatusPtr {
        ffi::shim_session_get_output_count(self.api, session, out)
    }

    unsafe fn session_get_output_name(
        &self,
        session: *const OrtSession,
        index: usize,
        allocator: *mut OrtAllocator,
        out: *mut *mut c_char,
    ) -> OrtStatusPtr {
        ffi::shim_session_get_output_name(self.api, session, index, allocator, out)
    }

    unsafe fn create_tensor_with_data_as_ort_value(
        &self,
        info: *const OrtMemoryInfo,
        data: *mut c_void,
        data_len: usize,
        shape: *const i64,
        shape_len: usize,
        element_type: ONNXTensorElementDataType,
        out: *mut *mut OrtValue,
    ) -> OrtStatusPtr {
        ffi::shim_create_tensor_with_data_as_ort_value(
            self.api,
            info,
            data,
            data_len,
            shape,
            shape_len,
            element_type,
            out,
        )
    }

    unsafe fn get_tensor_mutable_data(
        &self,
        value: *mut OrtValue,
        out: *mut *mut c_void,
    ) -> OrtStatusPtr {
        ffi::shim_get_tensor_mutable_data(self.api, value, out)
    }

    unsafe fn get_tensor_type_and_shape(
        &self,
        value: *const OrtValue,
        out: *mut *mut OrtTensorTypeAndShapeInfo,
    ) -> OrtStatusPtr {
        ffi::shim_get_tensor_type_and_shape(self.api, value, out)
    }

    unsafe fn get_tensor_element_type(
        &self,
        info: *const OrtTensorTypeAndShapeInfo,
        out: *mut ONNXTensorElementDataType,
    ) -> OrtStatusPtr {
        ffi::shim_get_tensor_element_type(self.api, info, out)
    }

    unsafe fn get_dimensions_count(
        &self,
        info: *const OrtTensorTypeAndShapeInfo,
        out: *mut usize,
    ) -> OrtStatusPtr {
        ffi::shim_get_dimensions_count(self.api, info, out)
    }

    unsafe fn get_dimensions(
        &self,
        info: *const OrtTensorTypeAndShapeInfo,
        dim_values: *mut i64,
        dim_count: usize,
    ) -> OrtStatusPtr {
        ffi::shim_get_dimensions(self.api, info, dim_values, dim_count)
    }

    unsafe fn run(
        &self,
        session: *mut OrtSession,
        run_options: *const OrtRunOptions,
        input_names: *const *const c_char,
        inputs: *const *const OrtValue,
        input_len: usize,
        output_names: *const *const c_char,
        output_names_len: usize,
        outputs: *mut *mut OrtValue,
    ) -> OrtStatusPtr {
        ffi::shim_run(
            self.api,
            session,
            run_options,
            input_names,
            inputs,
            input_len,
            output_names,
            output_names_len,
            outputs,
        )
    }

    unsafe fn allocator_free(&self, allocator: *mut OrtAllocator, data: *mut c_void) {
        ffi::shim_allocator_free(allocator, data)
    }

    unsafe fn release_tensor_type_and_shape_info(&self, info: *mut OrtTensorTypeAndShapeInfo) {
        ffi::shim_release_tensor_type_and_shape_info(self.api, info)
    }

    unsafe fn release_status(&self, status: OrtStatusPtr) {
        ffi::shim_release_status(self.api, status)
    }

    unsafe fn release_value(&self, value: *mut OrtValue) {
        ffi::shim_release_value(self.api, value)
    }

    unsafe fn release_allocator(&self, allocator: *mut OrtAllocator) {
        ffi::shim_release_allocator(self.api, allocator)
    }

    unsafe fn release_memory_info(&self, mem_info: *mut OrtMemoryInfo) {
        ffi::shim_release_memory_info(self.api, mem_info)
    }

    unsafe fn release_session(&self, session: *mut OrtSession) {
        ffi::shim_release_session(self.api, session)
    }

    unsafe fn release_session_options(&self, options: *mut OrtSessionOptions) {
        ffi::shim_release_session_options(self.api, options)
    }

    unsafe fn release_env(&self, env: *mut OrtEnv) {
        ffi::shim_release_env(self.api, env)
    }

    unsafe fn get_error_message(&self, status: *const OrtStatus) -> *const c_char {
        ffi::shim_get_error_message(self.api, status)
    }

    unsafe fn get_error_code(&self, status: *const OrtStatus) -> OrtErrorCode {
        ffi::shim_get_error_code(self.api, status)
    }
}
