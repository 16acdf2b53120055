//! Scripted engine used by the integration tests.
//!
//! Handles are heap objects leaked to raw pointers and reclaimed by the
//! matching release call. Every call is logged by name; any call can be made
//! to fail through `fail_on`.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::ffi::{c_void, CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::sync::{Arc, Mutex};

use onnx_shim::engine::ffi::*;
use onnx_shim::{Api, ElementType, Engine};

pub const FAIL_CODE: u32 = 1;
pub const INVALID_ARGUMENT: u32 = 2;

struct FakeStatus {
    code: OrtErrorCode,
    message: CString,
}

struct FakeTensor {
    dims: Vec<i64>,
    element_type: ONNXTensorElementDataType,
    data: *mut c_void,
    len: usize,
    owned: Vec<u64>,
}

struct FakeInfo {
    dims: Vec<i64>,
    element_type: ONNXTensorElementDataType,
}

struct FakeSession {
    inputs: Vec<CString>,
    outputs: Vec<CString>,
}

#[derive(Default)]
struct State {
    calls: Vec<&'static str>,
    fail: HashSet<&'static str>,
    created: HashMap<&'static str, usize>,
    released: HashMap<&'static str, usize>,
    inputs: Vec<String>,
    outputs: Vec<String>,
    skip_output: Option<usize>,
    model_paths: Vec<Vec<u8>>,
    env_names: Vec<String>,
    memory_names: Vec<String>,
}

#[derive(Default)]
pub struct FakeEngine {
    state: Mutex<State>,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        let engine = Self::default();
        engine.set_model(&["x"], &["y"]);
        Arc::new(engine)
    }

    pub fn api(self: &Arc<Self>) -> Api {
        Api::from_arc(self.clone())
    }

    /// Names reported by sessions created after this call.
    pub fn set_model(&self, inputs: &[&str], outputs: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.inputs = inputs.iter().map(|s| s.to_string()).collect();
        state.outputs = outputs.iter().map(|s| s.to_string()).collect();
    }

    /// Make the named engine call return a failure status.
    pub fn fail_on(&self, call: &'static str) {
        self.state.lock().unwrap().fail.insert(call);
    }

    /// Leave the output at `index` null while reporting success from Run.
    pub fn skip_output(&self, index: usize) {
        self.state.lock().unwrap().skip_output = Some(index);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }

    pub fn created(&self, kind: &str) -> usize {
        *self.state.lock().unwrap().created.get(kind).unwrap_or(&0)
    }

    pub fn released(&self, kind: &str) -> usize {
        *self.state.lock().unwrap().released.get(kind).unwrap_or(&0)
    }

    /// Handles of `kind` created and not yet released.
    pub fn live(&self, kind: &str) -> usize {
        self.created(kind) - self.released(kind)
    }

    pub fn model_paths(&self) -> Vec<String> {
        self.model_path_bytes()
            .iter()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .collect()
    }

    /// Model paths exactly as the engine received them.
    pub fn model_path_bytes(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().model_paths.clone()
    }

    pub fn env_names(&self) -> Vec<String> {
        self.state.lock().unwrap().env_names.clone()
    }

    pub fn memory_names(&self) -> Vec<String> {
        self.state.lock().unwrap().memory_names.clone()
    }

    /// A tensor with the given descriptor and no data buffer.
    pub fn raw_value(
        &self,
        dims: &[i64],
        element_type: ONNXTensorElementDataType,
    ) -> *mut OrtValue {
        self.track_create("value");
        Box::into_raw(Box::new(FakeTensor {
            dims: dims.to_vec(),
            element_type,
            data: ptr::null_mut(),
            len: 0,
            owned: Vec::new(),
        }))
        .cast()
    }

    fn enter(&self, call: &'static str) -> OrtStatusPtr {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.fail.contains(call) {
            *state.created.entry("status").or_insert(0) += 1;
            drop(state);
            make_status(FAIL_CODE, &format!("{} failed", call))
        } else {
            ptr::null_mut()
        }
    }

    fn error(&self, code: OrtErrorCode, message: &str) -> OrtStatusPtr {
        self.track_create("status");
        make_status(code, message)
    }

    fn track_create(&self, kind: &'static str) {
        *self.state.lock().unwrap().created.entry(kind).or_insert(0) += 1;
    }

    fn track_release(&self, call: &'static str, kind: &'static str) {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        *state.released.entry(kind).or_insert(0) += 1;
    }

    fn token<T>(&self, kind: &'static str) -> *mut T {
        self.track_create(kind);
        Box::into_raw(Box::new(0u8)).cast()
    }

    unsafe fn drop_token<T>(&self, ptr: *mut T, call: &'static str, kind: &'static str) {
        self.track_release(call, kind);
        drop(Box::from_raw(ptr.cast::<u8>()));
    }
}

fn make_status(code: OrtErrorCode, message: &str) -> OrtStatusPtr {
    Box::into_raw(Box::new(FakeStatus {
        code,
        message: CString::new(message).unwrap(),
    }))
    .cast()
}

fn byte_len(dims: &[i64], element_type: ONNXTensorElementDataType) -> Option<usize> {
    let count = dims
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(usize::try_from(d).ok()?))?;
    ElementType::from_raw(element_type)?.bytes_for(count)
}

macro_rules! forward_status {
    ($status:expr) => {{
        let status = $status;
        if !status.is_null() {
            return status;
        }
    }};
}

impl Engine for FakeEngine {
    unsafe fn create_env(
        &self,
        _level: OrtLoggingLevel,
        name: *const c_char,
        out: *mut *mut OrtEnv,
    ) -> OrtStatusPtr {
        forward_status!(self.enter("create_env"));
        let name = CStr::from_ptr(name).to_string_lossy().into_owned();
        self.state.lock().unwrap().env_names.push(name);
        *out = self.token("env");
        ptr::null_mut()
    }

    unsafe fn create_session_options(&self, out: *mut *mut OrtSessionOptions) -> OrtStatusPtr {
        forward_status!(self.enter("create_session_options"));
        *out = self.token("session_options");
        ptr::null_mut()
    }

    unsafe fn create_session(
        &self,
        _env: *const OrtEnv,
        model_path: *const OrtChar,
        _options: *const OrtSessionOptions,
        out: *mut *mut OrtSession,
    ) -> OrtStatusPtr {
        forward_status!(self.enter("create_session"));
        let path = CStr::from_ptr(model_path).to_bytes().to_vec();
        let session = {
            let mut state = self.state.lock().unwrap();
            state.model_paths.push(path);
            FakeSession {
                inputs: state.inputs.iter().map(|s| CString::new(s.as_str()).unwrap()).collect(),
                outputs: state.outputs.iter().map(|s| CString::new(s.as_str()).unwrap()).collect(),
            }
        };
        self.track_create("session");
        *out = Box::into_raw(Box::new(session)).cast();
        ptr::null_mut()
    }

    unsafe fn create_memory_info(
        &self,
        name: *const c_char,
        _kind: OrtAllocatorType,
        _id: c_int,
        _mem_type: OrtMemType,
        out: *mut *mut OrtMemoryInfo,
    ) -> OrtStatusPtr {
        forward_status!(self.enter("create_memory_info"));
        let name = CStr::from_ptr(name).to_string_lossy().into_owned();
        self.state.lock().unwrap().memory_names.push(name);
        *out = self.token("memory_info");
        ptr::null_mut()
    }

    unsafe fn create_allocator(
        &self,
        _session: *const OrtSession,
        _mem_info: *const OrtMemoryInfo,
        out: *mut *mut OrtAllocator,
    ) -> OrtStatusPtr {
        forward_status!(self.enter("create_allocator"));
        *out = self.token("allocator");
        ptr::null_mut()
    }

    unsafe fn session_get_input_count(
        &self,
        session: *const OrtSession,
        out: *mut usize,
    ) -> OrtStatusPtr {
        forward_status!(self.enter("session_get_input_count"));
        let session = &*session.cast::<FakeSession>();
        *out = session.inputs.len();
        ptr::null_mut()
    }

    unsafe fn session_get_input_name(
        &self,
        session: *const OrtSession,
        index: usize,
        _allocator: *mut OrtAllocator,
        out: *mut *mut c_char,
    ) -> OrtStatusPtr {
        forward_status!(self.enter("session_get_input_name"));
        let session = &*session.cast::<FakeSession>();
        match session.inputs.get(index) {
            Some(name) => {
                self.track_create("name");
                *out = name.clone().into_raw();
                ptr::null_mut()
            }
            None => self.error(INVALID_ARGUMENT, "input index out of range"),
        }
    }

    unsafe fn session_get_output_count(
        &self,
        session: *const OrtSession,
        out: *mut usize,
    ) -> OrtStatusPtr {
        forward_status!(self.enter("session_get_output_count"));
        let session = &*session.cast::<FakeSession>();
        *out = session.outputs.len();
        ptr::null_mut()
    }

    unsafe fn session_get_output_name(
        &self,
        session: *const OrtSession,
        index: usize,
        _allocator: *mut OrtAllocator,
        out: *mut *mut c_char,
    ) -> OrtStatusPtr {
        forward_status!(self.enter("session_get_output_name"));
        let session = &*session.cast::<FakeSession>();
        match session.outputs.get(index) {
            Some(name) => {
                self.track_create("name");
                *out = name.clone().into_raw();
                ptr::null_mut()
            }
            None => self.error(INVALID_ARGUMENT, "output index out of range"),
        }
    }

    unsafe fn create_tensor_with_data_as_ort_value(
        &self,
        _info: *const OrtMemoryInfo,
        data: *mut c_void,
        data_len: usize,
        shape: *const i64,
        shape_len: usize,
        element_type: ONNXTensorElementDataType,
        out: *mut *mut OrtValue,
    ) -> OrtStatusPtr {
        forward_status!(self.enter("create_tensor_with_data_as_ort_value"));
        let dims = if shape_len == 0 {
            Vec::new()
        } else {
            std::slice::from_raw_parts(shape, shape_len).to_vec()
        };
        if byte_len(&dims, element_type) != Some(data_len) {
            return self.error(INVALID_ARGUMENT, "data length does not match shape");
        }
        self.track_create("value");
        *out = Box::into_raw(Box::new(FakeTensor {
            dims,
            element_type,
            data,
            len: data_len,
            owned: Vec::new(),
        }))
        .cast();
        ptr::null_mut()
    }

    unsafe fn get_tensor_mutable_data(
        &self,
        value: *mut OrtValue,
        out: *mut *mut c_void,
    ) -> OrtStatusPtr {
        forward_status!(self.enter("get_tensor_mutable_data"));
        *out = (*value.cast::<FakeTensor>()).data;
        ptr::null_mut()
    }

    unsafe fn get_tensor_type_and_shape(
        &self,
        value: *const OrtValue,
        out: *mut *mut OrtTensorTypeAndShapeInfo,
    ) -> OrtStatusPtr {
        forward_status!(self.enter("get_tensor_type_and_shape"));
        let tensor = &*value.cast::<FakeTensor>();
        self.track_create("type_and_shape");
        *out = Box::into_raw(Box::new(FakeInfo {
            dims: tensor.dims.clone(),
            element_type: tensor.element_type,
        }))
        .cast();
        ptr::null_mut()
    }

    unsafe fn get_tensor_element_type(
        &self,
        info: *const OrtTensorTypeAndShapeInfo,
        out: *mut ONNXTensorElementDataType,
    ) -> OrtStatusPtr {
        forward_status!(self.enter("get_tensor_element_type"));
        *out = (*info.cast::<FakeInfo>()).element_type;
        ptr::null_mut()
    }

    unsafe fn get_dimensions_count(
        &self,
        info: *const OrtTensorTypeAndShapeInfo,
        out: *mut usize,
    ) -> OrtStatusPtr {
        forward_status!(self.enter("get_dimensions_count"));
        let info = &*info.cast::<FakeInfo>();
        *out = info.dims.len();
        ptr::null_mut()
    }

    unsafe fn get_dimensions(
        &self,
        info: *const OrtTensorTypeAndShapeInfo,
        dim_values: *mut i64,
        dim_count: usize,
    ) -> OrtStatusPtr {
        forward_status!(self.enter("get_dimensions"));
        let dims = &(*info.cast::<FakeInfo>()).dims;
        for (i, &d) in dims.iter().take(dim_count).enumerate() {
            *dim_values.add(i) = d;
        }
        ptr::null_mut()
    }

    unsafe fn run(
        &self,
        session: *mut OrtSession,
        _run_options: *const OrtRunOptions,
        input_names: *const *const c_char,
        inputs: *const *const OrtValue,
        input_len: usize,
        output_names: *const *const c_char,
        output_names_len: usize,
        outputs: *mut *mut OrtValue,
    ) -> OrtStatusPtr {
        forward_status!(self.enter("run"));
        let session = &*session.cast::<FakeSession>();

        let mut source: Option<&FakeTensor> = None;
        for i in 0..input_len {
            let name = CStr::from_ptr(*input_names.add(i));
            if !session.inputs.iter().any(|n| n.as_c_str() == name) {
                return self.error(INVALID_ARGUMENT, "invalid input name");
            }
            if source.is_none() {
                source = Some(&*(*inputs.add(i)).cast::<FakeTensor>());
            }
        }
        let Some(source) = source else {
            return self.error(INVALID_ARGUMENT, "no inputs");
        };
        let bytes: &[u8] = if source.len == 0 {
            &[]
        } else {
            std::slice::from_raw_parts(source.data.cast::<u8>(), source.len)
        };

        let skip = self.state.lock().unwrap().skip_output;
        for i in 0..output_names_len {
            let name = CStr::from_ptr(*output_names.add(i));
            if !session.outputs.iter().any(|n| n.as_c_str() == name) {
                return self.error(INVALID_ARGUMENT, "invalid output name");
            }
            let slot = outputs.add(i);
            if !(*slot).is_null() {
                // Bound output: identity copy into the caller's buffer.
                let target = &mut *(*slot).cast::<FakeTensor>();
                let n = target.len.min(bytes.len());
                if n > 0 {
                    ptr::copy_nonoverlapping(bytes.as_ptr(), target.data.cast::<u8>(), n);
                }
                continue;
            }
            if skip == Some(i) {
                continue;
            }
            // u64 backing keeps the copy aligned for every element type.
            let mut owned = vec![0u64; bytes.len().div_ceil(8)];
            let data: *mut c_void = if bytes.is_empty() {
                ptr::null_mut()
            } else {
                let dst = owned.as_mut_ptr().cast::<u8>();
                ptr::copy_nonoverlapping(bytes.as_ptr(), dst, bytes.len());
                owned.as_mut_ptr().cast()
            };
            self.track_create("value");
            *slot = Box::into_raw(Box::new(FakeTensor {
                dims: source.dims.clone(),
                element_type: source.element_type,
                data,
                len: bytes.len(),
                owned,
            }))
            .cast();
        }
        ptr::null_mut()
    }

    unsafe fn allocator_free(&self, _allocator: *mut OrtAllocator, data: *mut c_void) {
        self.track_release("allocator_free", "name");
        drop(CString::from_raw(data.cast()));
    }

    unsafe fn release_tensor_type_and_shape_info(&self, info: *mut OrtTensorTypeAndShapeInfo) {
        self.track_release("release_tensor_type_and_shape_info", "type_and_shape");
        drop(Box::from_raw(info.cast::<FakeInfo>()));
    }

    unsafe fn release_status(&self, status: OrtStatusPtr) {
        self.track_release("release_status", "status");
        drop(Box::from_raw(status.cast::<FakeStatus>()));
    }

    unsafe fn release_value(&self, value: *mut OrtValue) {
        self.track_release("release_value", "value");
        drop(Box::from_raw(value.cast::<FakeTensor>()));
    }

    unsafe fn release_allocator(&self, allocator: *mut OrtAllocator) {
        self.drop_token(allocator, "release_allocator", "allocator");
    }

    unsafe fn release_memory_info(&self, mem_info: *mut OrtMemoryInfo) {
        self.drop_token(mem_info, "release_memory_info", "memory_info");
    }

    unsafe fn release_session(&self, session: *mut OrtSession) {
        self.track_release("release_session", "session");
        drop(Box::from_raw(session.cast::<FakeSession>()));
    }

    unsafe fn release_session_options(&self, options: *mut OrtSessionOptions) {
        self.drop_token(options, "release_session_options", "session_options");
    }

    unsafe fn release_env(&self, env: *mut OrtEnv) {
        self.drop_token(env, "release_env", "env");
    }

    unsafe fn get_error_message(&self, status: *const OrtStatus) -> *const c_char {
        let status = &*status.cast::<FakeStatus>();
        status.message.as_ptr()
    }

    unsafe fn get_error_code(&self, status: *const OrtStatus) -> OrtErrorCode {
        (*status.cast::<FakeStatus>()).code
    }
}

/// An empty file standing in for a model, unique per test.
pub fn model_file(name: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("onnx-shim-{}-{}.onnx", std::process::id(), name));
    std::fs::write(&path, b"").unwrap();
    path
}
