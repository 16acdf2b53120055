//! The forwarding seam between the safe layer and the engine.

use std::ffi::c_void;
use std::fmt;
use std::os::raw::{c_char, c_int};
use std::sync::Arc;

use super::ffi::{
    ONNXTensorElementDataType, OrtAllocator, OrtAllocatorType, OrtChar, OrtEnv, OrtErrorCode,
    OrtLoggingLevel, OrtMemType, OrtMemoryInfo, OrtRunOptions, OrtSession, OrtSessionOptions,
    OrtStatus, OrtStatusPtr, OrtTensorTypeAndShapeInfo, OrtValue,
};

/// One method per engine entry point.
///
/// Every method forwards its arguments unchanged and returns the engine's
/// status (or result) unchanged. Implementations must not add behavior of
/// their own: the safe layer relies on the engine's documented contract for
/// each entry.
///
/// # Safety
///
/// All methods take raw handles. Callers must pass pointers that the engine
/// accepts for the corresponding entry (live handles, writable out-params,
/// arrays of the stated length).
pub trait Engine: Send + Sync {
    /// Create an environment with a logging threshold and log id.
    unsafe fn create_env(
        &self,
        level: OrtLoggingLevel,
        name: *const c_char,
        out: *mut *mut OrtEnv,
    ) -> OrtStatusPtr;

    /// Create default session options.
    unsafe fn create_session_options(&self, out: *mut *mut OrtSessionOptions) -> OrtStatusPtr;

    /// Load a model file into a session.
    unsafe fn create_session(
        &self,
        env: *const OrtEnv,
        model_path: *const OrtChar,
        options: *const OrtSessionOptions,
        out: *mut *mut OrtSession,
    ) -> OrtStatusPtr;

    /// Describe memory on a named device.
    unsafe fn create_memory_info(
        &self,
        name: *const c_char,
        kind: OrtAllocatorType,
        id: c_int,
        mem_type: OrtMemType,
        out: *mut *mut OrtMemoryInfo,
    ) -> OrtStatusPtr;

    /// Create an allocator for a session in the given memory.
    unsafe fn create_allocator(
        &self,
        session: *const OrtSession,
        mem_info: *const OrtMemoryInfo,
        out: *mut *mut OrtAllocator,
    ) -> OrtStatusPtr;

    /// Number of model inputs.
    unsafe fn session_get_input_count(
        &self,
        session: *const OrtSession,
        out: *mut usize,
    ) -> OrtStatusPtr;

    /// Input name at `index`, allocated with `allocator`.
    unsafe fn session_get_input_name(
        &self,
        session: *const OrtSession,
        index: usize,
        allocator: *mut OrtAllocator,
        out: *mut *mut c_char,
    ) -> OrtStatusPtr;

    /// Number of model outputs.
    unsafe fn session_get_output_count(
        &self,
        session: *const OrtSession,
        out: *mut usize,
    ) -> OrtStatusPtr;

    /// Output name at `index`, allocated with `allocator`.
    unsafe fn session_get_output_name(
        &self,
        session: *const OrtSession,
        index: usize,
        allocator: *mut OrtAllocator,
        out: *mut *mut c_char,
    ) -> OrtStatusPtr;

    /// Wrap a caller-owned buffer as a tensor value. The buffer is not copied.
    #[allow(clippy::too_many_arguments)]
    unsafe fn create_tensor_with_data_as_ort_value(
        &self,
        info: *const OrtMemoryInfo,
        data: *mut c_void,
        data_len: usize,
        shape: *const i64,
        shape_len: usize,
        element_type: ONNXTensorElementDataType,
        out: *mut *mut OrtValue,
    ) -> OrtStatusPtr;

    /// Pointer to a tensor's data buffer.
    unsafe fn get_tensor_mutable_data(
        &self,
        value: *mut OrtValue,
        out: *mut *mut c_void,
    ) -> OrtStatusPtr;

    /// Shape/type descriptor of a tensor. Released with `release_tensor_type_and_shape_info`.
    unsafe fn get_tensor_type_and_shape(
        &self,
        value: *const OrtValue,
        out: *mut *mut OrtTensorTypeAndShapeInfo,
    ) -> OrtStatusPtr;

    /// Element type recorded in a descriptor.
    unsafe fn get_tensor_element_type(
        &self,
        info: *const OrtTensorTypeAndShapeInfo,
        out: *mut ONNXTensorElementDataType,
    ) -> OrtStatusPtr;

    /// Number of dimensions recorded in a descriptor.
    unsafe fn get_dimensions_count(
        &self,
        info: *const OrtTensorTypeAndShapeInfo,
        out: *mut usize,
    ) -> OrtStatusPtr;

    /// Copy `dim_count` dimension values into `dim_values`.
    unsafe fn get_dimensions(
        &self,
        info: *const OrtTensorTypeAndShapeInfo,
        dim_values: *mut i64,
        dim_count: usize,
    ) -> OrtStatusPtr;

    /// Run a session. Null entries in `outputs` are allocated by the engine.
    #[allow(clippy::too_many_arguments)]
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
    ) -> OrtStatusPtr;

    /// Free memory handed out by an allocator.
    unsafe fn allocator_free(&self, allocator: *mut OrtAllocator, data: *mut c_void);

    /// Release a shape/type descriptor.
    unsafe fn release_tensor_type_and_shape_info(&self, info: *mut OrtTensorTypeAndShapeInfo);
    /// Release a non-null status.
    unsafe fn release_status(&self, status: OrtStatusPtr);
    /// Release a value. Caller-owned buffers behind it are left alone.
    unsafe fn release_value(&self, value: *mut OrtValue);
    /// Release an allocator.
    unsafe fn release_allocator(&self, allocator: *mut OrtAllocator);
    /// Release a memory description.
    unsafe fn release_memory_info(&self, mem_info: *mut OrtMemoryInfo);
    /// Release a session.
    unsafe fn release_session(&self, session: *mut OrtSession);
    /// Release session options.
    unsafe fn release_session_options(&self, options: *mut OrtSessionOptions);
    /// Release an environment. Its sessions must be released first.
    unsafe fn release_env(&self, env: *mut OrtEnv);

    /// Message carried by a status.
    unsafe fn get_error_message(&self, status: *const OrtStatus) -> *const c_char;

    /// Code carried by a status.
    unsafe fn get_error_code(&self, status: *const OrtStatus) -> OrtErrorCode;
}

/// Shared handle to an [`Engine`].
///
/// Every owning type keeps a clone so that it can release its handle through
/// the same engine that created it.
#[derive(Clone)]
pub struct Api {
    engine: Arc<dyn Engine>,
}

impl Api {
    /// Wrap an engine implementation.
    pub fn new(engine: impl Engine + 'static) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Wrap an already shared engine.
    pub fn from_arc(engine: Arc<dyn Engine>) -> Self {
        Self { engine }
    }

    /// The engine calls are forwarded to.
    pub fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("engine", &Arc::as_ptr(&self.engine).cast::<()>())
            .finish()
    }
}
