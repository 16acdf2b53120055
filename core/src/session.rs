//! Environments, sessions and allocators.

use std::ffi::{CStr, CString};
use std::fmt;
use std::os::raw::c_char;
use std::path::Path;
use std::ptr::{self, NonNull};
use std::sync::Arc;

use tracing::debug;

use crate::config::{EnvironmentConfig, SessionConfig};
use crate::engine::ffi::{OrtAllocator, OrtEnv, OrtSession, OrtSessionOptions, OrtValue};
use crate::engine::Api;
use crate::error::{OrtError, Result};
use crate::memory::MemoryInfo;
use crate::status::check;
use crate::tensor::Value;
use crate::types::LoggingLevel;

struct EnvHandle {
    api: Api,
    ptr: NonNull<OrtEnv>,
}

// SAFETY: the engine environment is process-wide and thread-safe.
unsafe impl Send for EnvHandle {}
unsafe impl Sync for EnvHandle {}

impl Drop for EnvHandle {
    fn drop(&mut self) {
        debug!("Releasing environment");
        unsafe { self.api.engine().release_env(self.ptr.as_ptr()) }
    }
}

/// Engine environment. Clones share one handle, released with the last clone.
///
/// Sessions keep their environment alive.
#[derive(Clone)]
pub struct Environment {
    inner: Arc<EnvHandle>,
}

impl Environment {
    /// Create an environment with the given logging threshold and log id.
    pub fn new(api: &Api, level: LoggingLevel, name: &str) -> Result<Self> {
        let name_cstr = CString::new(name)?;
        let mut out = ptr::null_mut();
        unsafe {
            check(
                api,
                api.engine()
                    .create_env(level.to_raw(), name_cstr.as_ptr(), &mut out),
            )?;
        }
        let ptr = NonNull::new(out)
            .ok_or_else(|| OrtError::config("engine returned a null environment"))?;
        debug!(name, ?level, "Created environment");
        Ok(Self {
            inner: Arc::new(EnvHandle {
                api: api.clone(),
                ptr,
            }),
        })
    }

    /// Build from the `environment` section of a config file.
    pub fn from_config(api: &Api, config: &EnvironmentConfig) -> Result<Self> {
        Self::new(api, config.log_level, &config.name)
    }

    /// The engine this environment was created by.
    pub fn api(&self) -> &Api {
        &self.inner.api
    }

    /// Raw environment handle, valid while any clone is alive.
    pub fn as_ptr(&self) -> *const OrtEnv {
        self.inner.ptr.as_ptr()
    }

    /// Load a model into a new session.
    pub fn session(
        &self,
        model_path: impl AsRef<Path>,
        options: Option<&SessionOptions>,
    ) -> Result<Session> {
        Session::new(self, model_path, options)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("ptr", &self.inner.ptr)
            .finish()
    }
}

/// Owned session options.
pub struct SessionOptions {
    api: Api,
    ptr: NonNull<OrtSessionOptions>,
}

// SAFETY: options are only read by the engine during session creation.
unsafe impl Send for SessionOptions {}

impl SessionOptions {
    /// Create default session options.
    pub fn new(api: &Api) -> Result<Self> {
        let mut out = ptr::null_mut();
        unsafe {
            check(api, api.engine().create_session_options(&mut out))?;
        }
        let ptr = NonNull::new(out)
            .ok_or_else(|| OrtError::config("engine returned null session options"))?;
        Ok(Self {
            api: api.clone(),
            ptr,
        })
    }

    /// Raw options handle.
    pub fn as_ptr(&self) -> *const OrtSessionOptions {
        self.ptr.as_ptr()
    }
}

impl Drop for SessionOptions {
    fn drop(&mut self) {
        unsafe { self.api.engine().release_session_options(self.ptr.as_ptr()) }
    }
}

/// A loaded model.
///
/// # Example
///
/// ```ignore
/// use onnx_shim::{Api, Environment, LoggingLevel, MemoryInfo};
///
/// let api = Api::linked()?;
/// let env = Environment::new(&api, LoggingLevel::Warning, "example")?;
/// let session = env.session("model.onnx", None)?;
///
/// let memory = MemoryInfo::cpu(&api)?;
/// let input = memory.tensor_from_vec(vec![0.0f32; 4], &[1, 4])?;
/// let outputs = session.run(&[("x", input.value())], &["y"])?;
/// println!("{:?}", outputs[0].as_slice::<f32>()?);
/// ```
pub struct Session {
    env: Environment,
    ptr: NonNull<OrtSession>,
}

// SAFETY: the engine allows concurrent Run calls on one session.
unsafe impl Send for Session {}
unsafe impl Sync for Session {}

impl Session {
    /// Load a model from an .onnx file.
    ///
    /// # Errors
    ///
    /// Returns [`OrtError::FileNotFound`] without calling the engine if the
    /// path does not exist, and the engine's error if loading fails.
    pub fn new(
        env: &Environment,
        model_path: impl AsRef<Path>,
        options: Option<&SessionOptions>,
    ) -> Result<Self> {
        let path = model_path.as_ref();
        if !path.exists() {
            return Err(OrtError::FileNotFound(path.to_path_buf()));
        }

        let path_cstr = path_to_cstring(path)?;
        let options_ptr = options.map_or(ptr::null(), SessionOptions::as_ptr);

        let api = env.api();
        let mut out = ptr::null_mut();
        debug!("Loading model: {}", path.display());
        unsafe {
            check(
                api,
                api.engine()
                    .create_session(env.as_ptr(), path_cstr.as_ptr(), options_ptr, &mut out),
            )?;
        }
        let ptr = NonNull::new(out)
            .ok_or_else(|| OrtError::inference("engine returned a null session"))?;
        Ok(Self {
            env: env.clone(),
            ptr,
        })
    }

    /// Load the model named by the `session` section of a config file.
    pub fn from_config(
        env: &Environment,
        config: &SessionConfig,
        options: Option<&SessionOptions>,
    ) -> Result<Self> {
        let path = config
            .model_path
            .as_ref()
            .ok_or_else(|| OrtError::config("session.model_path is not set"))?;
        Self::new(env, path, options)
    }

    /// The environment this session keeps alive.
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Raw session handle.
    pub fn as_ptr(&self) -> *const OrtSession {
        self.ptr.as_ptr()
    }

    fn api(&self) -> &Api {
        self.env.api()
    }

    /// Number of model inputs.
    pub fn input_count(&self) -> Result<usize> {
        let mut count = 0usize;
        unsafe {
            check(
                self.api(),
                self.api()
                    .engine()
                    .session_get_input_count(self.as_ptr(), &mut count),
            )?;
        }
        Ok(count)
    }

    /// Number of model outputs.
    pub fn output_count(&self) -> Result<usize> {
        let mut count = 0usize;
        unsafe {
            check(
                self.api(),
                self.api()
                    .engine()
                    .session_get_output_count(self.as_ptr(), &mut count),
            )?;
        }
        Ok(count)
    }

    /// Create an allocator for this session in the given memory.
    pub fn allocator(&self, memory: &MemoryInfo) -> Result<Allocator<'_>> {
        let mut out = ptr::null_mut();
        unsafe {
            check(
                self.api(),
                self.api()
                    .engine()
                    .create_allocator(self.as_ptr(), memory.as_ptr(), &mut out),
            )?;
        }
        let ptr = NonNull::new(out)
            .ok_or_else(|| OrtError::config("engine returned a null allocator"))?;
        Ok(Allocator { session: self, ptr })
    }

    /// Run the model. The engine allocates one value per requested output.
    pub fn run(&self, inputs: &[(&str, &Value)], output_names: &[&str]) -> Result<Vec<Value>> {
        let input_names = to_cstrings(inputs.iter().map(|(name, _)| *name))?;
        let input_name_ptrs: Vec<*const c_char> = input_names.iter().map(|n| n.as_ptr()).collect();
        let input_ptrs: Vec<*const OrtValue> = inputs.iter().map(|(_, v)| v.as_ptr()).collect();

        let output_cstrs = to_cstrings(output_names.iter().copied())?;
        let output_name_ptrs: Vec<*const c_char> =
            output_cstrs.iter().map(|n| n.as_ptr()).collect();
        let mut outputs: Vec<*mut OrtValue> = vec![ptr::null_mut(); output_names.len()];

        unsafe {
            check(
                self.api(),
                self.api().engine().run(
                    self.ptr.as_ptr(),
                    ptr::null(),
                    or_null(&input_name_ptrs),
                    or_null(&input_ptrs),
                    inputs.len(),
                    or_null(&output_name_ptrs),
                    output_names.len(),
                    or_null_mut(&mut outputs),
                ),
            )?;
        }

        let values: Vec<Option<Value>> = outputs
            .into_iter()
            .map(|out| unsafe { Value::from_raw(self.api(), out) })
            .collect();
        if let Some(index) = values.iter().position(Option::is_none) {
            return Err(OrtError::inference(format!(
                "output {} ({}) was not produced",
                index, output_names[index]
            )));
        }
        Ok(values.into_iter().flatten().collect())
    }

    /// Run the model, writing into caller-bound output values.
    pub fn run_into(
        &self,
        inputs: &[(&str, &Value)],
        outputs: &mut [(&str, &mut Value)],
    ) -> Result<()> {
        let input_names = to_cstrings(inputs.iter().map(|(name, _)| *name))?;
        let input_name_ptrs: Vec<*const c_char> = input_names.iter().map(|n| n.as_ptr()).collect();
        let input_ptrs: Vec<*const OrtValue> = inputs.iter().map(|(_, v)| v.as_ptr()).collect();

        let output_cstrs = to_cstrings(outputs.iter().map(|(name, _)| *name))?;
        let output_name_ptrs: Vec<*const c_char> =
            output_cstrs.iter().map(|n| n.as_ptr()).collect();
        let mut output_ptrs: Vec<*mut OrtValue> =
            outputs.iter_mut().map(|(_, v)| v.as_mut_ptr()).collect();

        unsafe {
            check(
                self.api(),
                self.api().engine().run(
                    self.ptr.as_ptr(),
                    ptr::null(),
                    or_null(&input_name_ptrs),
                    or_null(&input_ptrs),
                    inputs.len(),
                    or_null(&output_name_ptrs),
                    output_name_ptrs.len(),
                    or_null_mut(&mut output_ptrs),
                ),
            )
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!("Releasing session");
        unsafe { self.api().engine().release_session(self.ptr.as_ptr()) }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("ptr", &self.ptr).finish()
    }
}

/// Engine allocator tied to a session. Used to fetch input and output names.
pub struct Allocator<'s> {
    session: &'s Session,
    ptr: NonNull<OrtAllocator>,
}

impl Allocator<'_> {
    /// Raw allocator handle.
    pub fn as_ptr(&self) -> *mut OrtAllocator {
        self.ptr.as_ptr()
    }

    /// Name of the input at `index`.
    pub fn input_name(&self, index: usize) -> Result<String> {
        let api = self.session.api();
        let mut out = ptr::null_mut();
        unsafe {
            check(
                api,
                api.engine().session_get_input_name(
                    self.session.as_ptr(),
                    index,
                    self.as_ptr(),
                    &mut out,
                ),
            )?;
            self.take_name(out)
        }
    }

    /// Name of the output at `index`.
    pub fn output_name(&self, index: usize) -> Result<String> {
        let api = self.session.api();
        let mut out = ptr::null_mut();
        unsafe {
            check(
                api,
                api.engine().session_get_output_name(
                    self.session.as_ptr(),
                    index,
                    self.as_ptr(),
                    &mut out,
                ),
            )?;
            self.take_name(out)
        }
    }

    /// Names of every input, in model order.
    pub fn input_names(&self) -> Result<Vec<String>> {
        (0..self.session.input_count()?)
            .map(|i| self.input_name(i))
            .collect()
    }

    /// Names of every output, in model order.
    pub fn output_names(&self) -> Result<Vec<String>> {
        (0..self.session.output_count()?)
            .map(|i| self.output_name(i))
            .collect()
    }

    /// Copy an allocator-owned name and hand the buffer back.
    unsafe fn take_name(&self, raw: *mut c_char) -> Result<String> {
        if raw.is_null() {
            return Err(OrtError::inference("engine returned a null name"));
        }
        let name = CStr::from_ptr(raw).to_string_lossy().into_owned();
        self.session
            .api()
            .engine()
            .allocator_free(self.as_ptr(), raw.cast());
        Ok(name)
    }
}

impl Drop for Allocator<'_> {
    fn drop(&mut self) {
        unsafe {
            self.session
                .api()
                .engine()
                .release_allocator(self.ptr.as_ptr())
        }
    }
}

/// Model path as the engine's narrow string, byte for byte.
#[cfg(unix)]
fn path_to_cstring(path: &Path) -> Result<CString> {
    use std::os::unix::ffi::OsStrExt;
    Ok(CString::new(path.as_os_str().as_bytes())?)
}

#[cfg(not(unix))]
fn path_to_cstring(path: &Path) -> Result<CString> {
    let path_str = path.to_str().ok_or_else(|| {
        OrtError::config(format!("model path is not valid UTF-8: {}", path.display()))
    })?;
    Ok(CString::new(path_str)?)
}

fn to_cstrings<'a>(names: impl Iterator<Item = &'a str>) -> Result<Vec<CString>> {
    names
        .map(|name| CString::new(name).map_err(OrtError::from))
        .collect()
}

fn or_null<T>(items: &[T]) -> *const T {
    if items.is_empty() {
        ptr::null()
    } else {
        items.as_ptr()
    }
}

fn or_null_mut<T>(items: &mut [T]) -> *mut T {
    if items.is_empty() {
        ptr::null_mut()
    } else {
        items.as_mut_ptr()
    }
}
