//! The boundary with the wrapped sound library.
//!
//! [`Backend`] mirrors the client library's entry points one for one; all
//! methods speak the library's signed integer result codes, and translation
//! into [`Error`](crate::Error) happens above this trait. Handle creation
//! and destruction map onto construction and `Drop`.
//!
//! Three drivers exist:
//! * [`canberra::CanberraBackend`] — the real libcanberra client library
//!   (feature `canberra`).
//! * [`null::NullBackend`] — accepts everything and completes immediately,
//!   the analog of libcanberra's own null driver.
//! * [`mock::MockBackend`] — records every call and lets tests script
//!   results and completion timing.

use std::borrow::Cow;

use crate::attr::Attributes;
use crate::ErrorCode;

#[cfg(feature = "canberra")]
pub mod canberra;
pub mod mock;
pub mod null;

/// The library's success code.
pub const SUCCESS: i32 = 0;

/// Completion callback handed to [`Backend::play`], invoked with the raw
/// result code of the finished request.
pub type FinishCallback = Box<dyn FnOnce(i32) + Send + 'static>;

/// A driver serving one connection to the sound system.
///
/// Contract for [`play`](Self::play): when the call returns an error code,
/// `done` has not been invoked and never will be; when it returns
/// [`SUCCESS`] and `done` was supplied, `done` is invoked exactly once, on
/// whatever thread the driver uses, with the request's final result —
/// including [`canceled`](ErrorCode::Canceled) for requests aborted through
/// [`cancel`](Self::cancel) and [`destroyed`](ErrorCode::Destroyed) for
/// requests still pending when the driver is dropped.
pub trait Backend: Send {
    /// Open the connection to the sound system. Drivers may also open
    /// lazily on the first play or cache request.
    fn open(&mut self) -> i32;

    /// Select the driver backend by name, e.g. "pulse", "alsa" or "null".
    /// May succeed even if the named backend turns out to be unavailable;
    /// such failures surface on later operations.
    fn set_driver(&mut self, driver: &str) -> i32;

    /// Merge `props` into the connection-wide defaults applied to every
    /// subsequent play and cache request.
    fn change_props(&mut self, props: &Attributes) -> i32;

    /// Submit a play request tagged with the cancellation identity `id`
    /// (0 for "not cancellable").
    fn play(&mut self, id: u32, props: &Attributes, done: Option<FinishCallback>) -> i32;

    /// Ask the sound system to cache the described sample.
    fn cache(&mut self, props: &Attributes) -> i32;

    /// Abort every in-flight play request tagged with `id`. Unknown or
    /// already-finished identities are a no-op.
    fn cancel(&mut self, id: u32) -> i32;

    /// Human-readable message for a raw result code.
    fn strerror(&self, code: i32) -> Cow<'static, str> {
        strerror(code)
    }
}

/// Canonical message table shared by the built-in drivers.
pub(crate) fn strerror(code: i32) -> Cow<'static, str> {
    if code == SUCCESS {
        return Cow::Borrowed("Success");
    }
    match ErrorCode::from_raw(code) {
        Some(code) => Cow::Borrowed(code.message()),
        None => Cow::Borrowed("Unknown error"),
    }
}
