#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(dead_code)]
#![no_std]

//! Raw, hand-written declarations for the parts of the libcanberra API used
//! by the `chime` crate. The header is small and stable, so no bindgen step
//! is involved; the declarations mirror `<canberra.h>` verbatim.

pub mod ffi {
    use core::ffi::{c_char, c_int, c_void};

    /// Opaque connection handle to the sound server client library.
    #[repr(C)]
    pub struct ca_context {
        _unused: [u8; 0],
    }

    /// Opaque property list passed along with play/cache requests.
    #[repr(C)]
    pub struct ca_proplist {
        _unused: [u8; 0],
    }

    /// Playback completion callback. Invoked exactly once per request that
    /// was successfully submitted via `ca_context_play_full`.
    pub type ca_finish_callback_t = Option<
        unsafe extern "C" fn(c: *mut ca_context, id: u32, error_code: c_int, userdata: *mut c_void),
    >;

    pub const CA_SUCCESS: c_int = 0;
    pub const CA_ERROR_NOTSUPPORTED: c_int = -1;
    pub const CA_ERROR_INVALID: c_int = -2;
    pub const CA_ERROR_STATE: c_int = -3;
    pub const CA_ERROR_OOM: c_int = -4;
    pub const CA_ERROR_NODRIVER: c_int = -5;
    pub const CA_ERROR_SYSTEM: c_int = -6;
    pub const CA_ERROR_CORRUPT: c_int = -7;
    pub const CA_ERROR_TOOBIG: c_int = -8;
    pub const CA_ERROR_NOTFOUND: c_int = -9;
    pub const CA_ERROR_DESTROYED: c_int = -10;
    pub const CA_ERROR_CANCELED: c_int = -11;
    pub const CA_ERROR_NOTAVAILABLE: c_int = -12;
    pub const CA_ERROR_ACCESS: c_int = -13;
    pub const CA_ERROR_IO: c_int = -14;
    pub const CA_ERROR_INTERNAL: c_int = -15;
    pub const CA_ERROR_DISABLED: c_int = -16;
    pub const CA_ERROR_FORKED: c_int = -17;
    pub const CA_ERROR_DISCONNECTED: c_int = -18;

    extern "C" {
        pub fn ca_context_create(c: *mut *mut ca_context) -> c_int;
        pub fn ca_context_destroy(c: *mut ca_context) -> c_int;
        pub fn ca_context_open(c: *mut ca_context) -> c_int;
        pub fn ca_context_set_driver(c: *mut ca_context, driver: *const c_char) -> c_int;
        pub fn ca_context_change_props_full(c: *mut ca_context, p: *mut ca_proplist) -> c_int;
        pub fn ca_context_play_full(
            c: *mut ca_context,
            id: u32,
            p: *mut ca_proplist,
            cb: ca_finish_callback_t,
            userdata: *mut c_void,
        ) -> c_int;
        pub fn ca_context_cache_full(c: *mut ca_context, p: *mut ca_proplist) -> c_int;
        pub fn ca_context_cancel(c: *mut ca_context, id: u32) -> c_int;
        pub fn ca_strerror(code: c_int) -> *const c_char;

        pub fn ca_proplist_create(p: *mut *mut ca_proplist) -> c_int;
        pub fn ca_proplist_destroy(p: *mut ca_proplist) -> c_int;
        pub fn ca_proplist_sets(
            p: *mut ca_proplist,
            key: *const c_char,
            value: *const c_char,
        ) -> c_int;
        pub fn ca_proplist_set(
            p: *mut ca_proplist,
            key: *const c_char,
            data: *const c_void,
            nbytes: usize,
        ) -> c_int;
    }
}
