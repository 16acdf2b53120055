//! Raw FFI declarations for the ONNX Runtime C bridge.
//!
//! This module contains opaque handle types, raw enum aliases and the
//! `extern "C"` declarations of the bridge in `ort_bridge/`. Use the safe
//! wrappers at the crate root instead of calling these directly.

#[cfg(feature = "onnxruntime")]
use std::ffi::c_void;
use std::marker::{PhantomData, PhantomPinned};
use std::os::raw::{c_char, c_int, c_uint};

macro_rules! opaque {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[repr(C)]
            pub struct $name {
                _data: [u8; 0],
                _marker: PhantomData<(*mut u8, PhantomPinned)>,
            }
        )*
    };
}

opaque! {
    /// The engine's function table.
    OrtApi,
    /// Process-level runtime environment.
    OrtEnv,
    /// Result of a fallible engine call. Null means success.
    OrtStatus,
    /// Options used when creating a session.
    OrtSessionOptions,
    /// A loaded model.
    OrtSession,
    /// Describes where tensor memory lives.
    OrtMemoryInfo,
    /// An engine-side allocator.
    OrtAllocator,
    /// A tensor (or other engine value).
    OrtValue,
    /// Shape and element type of a tensor.
    OrtTensorTypeAndShapeInfo,
    /// Per-run options.
    OrtRunOptions,
}

/// Status returned by every fallible entry point.
pub type OrtStatusPtr = *mut OrtStatus;

/// `OrtLoggingLevel`.
pub type OrtLoggingLevel = c_uint;
/// `OrtAllocatorType`.
pub type OrtAllocatorType = c_int;
/// `OrtMemType`.
pub type OrtMemType = c_int;
/// `OrtErrorCode`.
pub type OrtErrorCode = c_uint;
/// `ONNXTensorElementDataType`.
pub type ONNXTensorElementDataType = c_uint;

/// `ORTCHAR_T`. Model paths are narrow strings outside Windows.
pub type OrtChar = c_char;

// ORTCHAR_T is wchar_t on Windows; the bridge would take the wrong path type.
#[cfg(all(windows, feature = "onnxruntime"))]
compile_error!("the onnxruntime feature does not support Windows wide-character model paths");

#[cfg(feature = "onnxruntime")]
extern "C" {
    // Table lookup
    pub fn shim_get_api() -> *const OrtApi;
    pub fn shim_api_version() -> u32;
    pub fn shim_version_string() -> *const c_char;

    // Creation
    pub fn shim_create_env(
        api: *const OrtApi,
        level: OrtLoggingLevel,
        name: *const c_char,
        out: *mut *mut OrtEnv,
    ) -> OrtStatusPtr;
    pub fn shim_create_session_options(
        api: *const OrtApi,
        out: *mut *mut OrtSessionOptions,
    ) -> OrtStatusPtr;
    pub fn shim_create_session(
        api: *const OrtApi,
        env: *const OrtEnv,
        model_path: *const OrtChar,
        options: *const OrtSessionOptions,
        out: *mut *mut OrtSession,
    ) -> OrtStatusPtr;
    pub fn shim_create_memory_info(
        api: *const OrtApi,
        name: *const c_char,
        kind: OrtAllocatorType,
        id: c_int,
        mem_type: OrtMemType,
        out: *mut *mut OrtMemoryInfo,
    ) -> OrtStatusPtr;
    pub fn shim_create_allocator(
        api: *const OrtApi,
        session: *const OrtSession,
        mem_info: *const OrtMemoryInfo,
        out: *mut *mut OrtAllocator,
    ) -> OrtStatusPtr;

    // Session introspection
    pub fn shim_session_get_input_count(
        api: *const OrtApi,
        session: *const OrtSession,
        out: *mut usize,
    ) -> OrtStatusPtr;
    pub fn shim_session_get_input_name(
        api: *const OrtApi,
        session: *const OrtSession,
        index: usize,
        allocator: *mut OrtAllocator,
        out: *mut *mut c_char,
    ) -> OrtStatusPtr;
    pub fn shim_session_get_output_count(
        api: *const OrtApi,
        session: *const OrtSession,
        out: *mut usize,
    ) -> OrtStatusPtr;
    pub fn shim_session_get_output_name(
        api: *const OrtApi,
        session: *const OrtSession,
        index: usize,
        allocator: *mut OrtAllocator,
        out: *mut *mut c_char,
    ) -> OrtStatusPtr;

    // Tensors
    pub fn shim_create_tensor_with_data_as_ort_value(
        api: *const OrtApi,
        info: *const OrtMemoryInfo,
        data: *mut c_void,
        data_len: usize,
        shape: *const i64,
        shape_len: usize,
        element_type: ONNXTensorElementDataType,
        out: *mut *mut OrtValue,
    ) -> OrtStatusPtr;
    pub fn shim_get_tensor_mutable_data(
        api: *const OrtApi,
        value: *mut OrtValue,
        out: *mut *mut c_void,
    ) -> OrtStatusPtr;
    pub fn shim_get_tensor_type_and_shape(
        api: *const OrtApi,
        value: *const OrtValue,
        out: *mut *mut OrtTensorTypeAndShapeInfo,
    ) -> OrtStatusPtr;
    pub fn shim_get_tensor_element_type(
        api: *const OrtApi,
        info: *const OrtTensorTypeAndShapeInfo,
        out: *mut ONNXTensorElementDataType,
    ) -> OrtStatusPtr;
    pub fn shim_get_dimensions_count(
        api: *const OrtApi,
        info: *const OrtTensorTypeAndShapeInfo,
        out: *mut usize,
    ) -> OrtStatusPtr;
    pub fn shim_get_dimensions(
        api: *const OrtApi,
        info: *const OrtTensorTypeAndShapeInfo,
        dim_values: *mut i64,
        dim_count: usize,
    ) -> OrtStatusPtr;

    // Inference
    pub fn shim_run(
        api: *const OrtApi,
        session: *mut OrtSession,
        run_options: *const OrtRunOptions,
        input_names: *const *const c_char,
        inputs: *const *const OrtValue,
        input_len: usize,
        output_names: *const *const c_char,
        output_names_len: usize,
        outputs: *mut *mut OrtValue,
    ) -> OrtStatusPtr;

    // Release
    pub fn shim_allocator_free(allocator: *mut OrtAllocator, data: *mut c_void);
    pub fn shim_release_tensor_type_and_shape_info(
        api: *const OrtApi,
        info: *mut OrtTensorTypeAndShapeInfo,
    );
    pub fn shim_release_status(api: *const OrtApi, status: OrtStatusPtr);
    pub fn shim_release_value(api: *const OrtApi, value: *mut OrtValue);
    pub fn shim_release_allocator(api: *const OrtApi, allocator: *mut OrtAllocator);
    pub fn shim_release_memory_info(api: *const OrtApi, mem_info: *mut OrtMemoryInfo);
    pub fn shim_release_session(api: *const OrtApi, session: *mut OrtSession);
    pub fn shim_release_session_options(api: *const OrtApi, options: *mut OrtSessionOptions);
    pub fn shim_release_env(api: *const OrtApi, env: *mut OrtEnv);

    // Status
    pub fn shim_get_error_message(api: *const OrtApi, status: *const OrtStatus) -> *const c_char;
    pub fn shim_get_error_code(api: *const OrtApi, status: *const OrtStatus) -> OrtErrorCode;
}
