//! Engine status handling.

use std::ffi::CStr;
use std::ptr::NonNull;

use crate::engine::ffi::{OrtStatus, OrtStatusPtr};
use crate::engine::Api;
use crate::error::{OrtError, Result};
use crate::types::ErrorCode;

/// An owned failure status. Released through the engine on drop.
pub struct Status<'a> {
    api: &'a Api,
    ptr: NonNull<OrtStatus>,
}

impl<'a> Status<'a> {
    /// Take ownership of a status returned by the engine.
    ///
    /// Returns `None` for the null (success) status.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a status produced by `api`'s engine that has not
    /// been released yet.
    pub unsafe fn from_raw(api: &'a Api, ptr: OrtStatusPtr) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { api, ptr })
    }

    /// The engine's message for this status.
    pub fn message(&self) -> String {
        unsafe {
            let msg = self.api.engine().get_error_message(self.ptr.as_ptr());
            if msg.is_null() {
                "Unknown error".to_string()
            } else {
                CStr::from_ptr(msg).to_string_lossy().into_owned()
            }
        }
    }

    /// The engine's error code for this status.
    pub fn code(&self) -> ErrorCode {
        ErrorCode::from_raw(unsafe { self.api.engine().get_error_code(self.ptr.as_ptr()) })
    }

    /// Convert into an error. The status is released afterwards.
    pub fn into_error(self) -> OrtError {
        OrtError::engine(self.code(), self.message())
    }
}

impl Drop for Status<'_> {
    fn drop(&mut self) {
        unsafe { self.api.engine().release_status(self.ptr.as_ptr()) }
    }
}

/// Turn an engine status into a `Result`, releasing it if it is a failure.
///
/// # Safety
///
/// Same contract as [`Status::from_raw`].
pub unsafe fn check(api: &Api, status: OrtStatusPtr) -> Result<()> {
    match Status::from_raw(api, status) {
        None => Ok(()),
        Some(status) => Err(status.into_error()),
    }
}
