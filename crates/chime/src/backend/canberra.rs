//! The real driver: libcanberra, via the `chime-sys` declarations.

use core::ffi::{c_int, c_void};
use std::borrow::Cow;
use std::ffi::{CStr, CString};
use std::ptr;

use chime_sys::ffi as sys;

use crate::attr::{Attributes, Value};
use crate::backend::{Backend, FinishCallback};
use crate::{Error, Result};

/// Owns one `ca_context` handle. Created with [`new()`](Self::new),
/// destroyed exactly once on drop.
pub struct CanberraBackend {
    ctx: *mut sys::ca_context,
}

// The handle is only ever driven from behind the context lock, and
// libcanberra confines per-connection state to the handle itself.
unsafe impl Send for CanberraBackend {}

impl CanberraBackend {
    pub fn new() -> Result<Self> {
        let mut ctx = ptr::null_mut();
        let code = unsafe { sys::ca_context_create(&mut ctx) };
        if code != sys::CA_SUCCESS {
            return Err(Error::from_raw(code, strerror(code)));
        }
        Ok(Self { ctx })
    }
}

fn strerror(code: c_int) -> Cow<'static, str> {
    let msg = unsafe { sys::ca_strerror(code) };
    if msg.is_null() {
        return Cow::Borrowed("Unknown error");
    }
    unsafe { CStr::from_ptr(msg) }
        .to_string_lossy()
        .into_owned()
        .into()
}

/// RAII wrapper marshaling an [`Attributes`] set into a `ca_proplist`.
/// Destroyed on every exit path once created.
struct Proplist {
    raw: *mut sys::ca_proplist,
}

impl Proplist {
    fn from_attrs(attrs: &Attributes) -> std::result::Result<Self, c_int> {
        let mut raw = ptr::null_mut();
        let code = unsafe { sys::ca_proplist_create(&mut raw) };
        if code != sys::CA_SUCCESS {
            return Err(code);
        }
        let pl = Proplist { raw };

        for (key, value) in attrs.iter() {
            let key = CString::new(key).map_err(|_| sys::CA_ERROR_INVALID)?;
            let code = match value {
                Value::Text(text) => {
                    let text = CString::new(text.as_str()).map_err(|_| sys::CA_ERROR_INVALID)?;
                    unsafe { sys::ca_proplist_sets(pl.raw, key.as_ptr(), text.as_ptr()) }
                }
                Value::Binary(data) => unsafe {
                    sys::ca_proplist_set(
                        pl.raw,
                        key.as_ptr(),
                        data.as_ptr() as *const c_void,
                        data.len(),
                    )
                },
            };
            if code != sys::CA_SUCCESS {
                return Err(code);
            }
        }
        Ok(pl)
    }
}

impl Drop for Proplist {
    fn drop(&mut self) {
        unsafe {
            sys::ca_proplist_destroy(self.raw);
        }
    }
}

impl Backend for CanberraBackend {
    fn open(&mut self) -> i32 {
        unsafe { sys::ca_context_open(self.ctx) }
    }

    fn set_driver(&mut self, driver: &str) -> i32 {
        let Ok(driver) = CString::new(driver) else {
            return sys::CA_ERROR_INVALID;
        };
        unsafe { sys::ca_context_set_driver(self.ctx, driver.as_ptr()) }
    }

    fn change_props(&mut self, props: &Attributes) -> i32 {
        let pl = match Proplist::from_attrs(props) {
            Ok(pl) => pl,
            Err(code) => return code,
        };
        unsafe { sys::ca_context_change_props_full(self.ctx, pl.raw) }
    }

    fn play(&mut self, id: u32, props: &Attributes, done: Option<FinishCallback>) -> i32 {
        let pl = match Proplist::from_attrs(props) {
            Ok(pl) => pl,
            Err(code) => return code,
        };
        match done {
            None => unsafe {
                sys::ca_context_play_full(self.ctx, id, pl.raw, None, ptr::null_mut())
            },
            Some(done) => {
                let userdata = Box::into_raw(Box::new(done));
                let code = unsafe {
                    sys::ca_context_play_full(
                        self.ctx,
                        id,
                        pl.raw,
                        Some(finish_trampoline),
                        userdata as *mut c_void,
                    )
                };
                if code != sys::CA_SUCCESS {
                    // The library never saw the callback; reclaim it so the
                    // submit error is reported through the usual path
                    // instead of a dangling completion.
                    drop(unsafe { Box::from_raw(userdata) });
                }
                code
            }
        }
    }

    fn cache(&mut self, props: &Attributes) -> i32 {
        let pl = match Proplist::from_attrs(props) {
            Ok(pl) => pl,
            Err(code) => return code,
        };
        unsafe { sys::ca_context_cache_full(self.ctx, pl.raw) }
    }

    fn cancel(&mut self, id: u32) -> i32 {
        unsafe { sys::ca_context_cancel(self.ctx, id) }
    }

    fn strerror(&self, code: i32) -> Cow<'static, str> {
        strerror(code)
    }
}

unsafe extern "C" fn finish_trampoline(
    _ctx: *mut sys::ca_context,
    _id: u32,
    error_code: c_int,
    userdata: *mut c_void,
) {
    if userdata.is_null() {
        return;
    }
    let done = unsafe { Box::from_raw(userdata as *mut FinishCallback) };
    (*done)(error_code);
}

impl Drop for CanberraBackend {
    fn drop(&mut self) {
        // libcanberra fires outstanding completion callbacks with the
        // destroyed code before this returns.
        unsafe {
            sys::ca_context_destroy(self.ctx);
        }
    }
}
