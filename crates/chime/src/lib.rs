//! `chime` is a thin, safe binding layer over the libcanberra event-sound
//! library. It translates calls on a [`Context`] into requests against the
//! underlying sound-server client library: building property lists, tagging
//! requests for cancellation, and routing completion callbacks back to the
//! caller as ordinary Rust futures.
//!
//! The heavy lifting — connecting to a sound server, queueing playback,
//! caching samples, resolving XDG sound themes — happens inside the wrapped
//! driver. This crate only marshals data across that boundary.
//!
//! The typical use pattern is:
//!
//! * Create and initialize a [`Context`]
//! * \[Optional\] Set context-wide attributes with [`Context::set_attributes()`]
//! * \[Optional\] Cache frequently-used sounds with [`Context::cache()`]
//! * Play sounds with [`Context::play_simple()`] or [`Context::play_full()`]
//! * Drop the context to close the connection
//!
//! ```no_run
//! use chime::{attr, Context};
//!
//! fn main() -> chime::Result<()> {
//!     let mut ctx = Context::new()?;
//!     ctx.play_simple([(attr::EVENT_ID, "phone-incoming-call")], None)?;
//!     Ok(())
//! }
//! ```
//!
//! # `play_simple()` versus `play_full()`
//!
//! [`Context::play_simple()`] is fire-and-forget: it submits the request and
//! returns immediately, reporting only errors that occur before the sound is
//! handed to the sound server. [`Context::play_full()`] returns a [`Playing`]
//! token that resolves exactly once when playback finishes, fails, or is
//! canceled — including for failures that occur before the request is even
//! transmitted. Dropping a [`Playing`] without finishing it discards all
//! error visibility, so prefer `play_simple()` when you don't care about
//! completion.
//!
//! # Drivers
//!
//! The connection is served by a driver implementing the [`Backend`] trait.
//! With the `canberra` feature enabled the real libcanberra client library is
//! used; without it the built-in null driver accepts every request and
//! completes it immediately, which keeps the crate usable (and testable) on
//! systems without a sound stack.
//!
//! [`Backend`]: backend::Backend
#![allow(dead_code)]

use std::borrow::Cow;

pub mod attr;
pub mod backend;
mod cancel;
mod context;
mod play;

pub use attr::{Attributes, Value};
pub use cancel::CancelToken;
pub use context::{Context, ContextBuilder};
pub use play::Playing;

/// Result codes mirrored from the wrapped library's error enumeration.
///
/// The discriminants are the library's own signed codes, so a raw result can
/// be round-tripped through [`ErrorCode::raw()`] and [`ErrorCode::from_raw()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    NotSupported = -1,
    Invalid = -2,
    State = -3,
    OutOfMemory = -4,
    NoDriver = -5,
    System = -6,
    Corrupt = -7,
    TooBig = -8,
    NotFound = -9,
    Destroyed = -10,
    Canceled = -11,
    NotAvailable = -12,
    Access = -13,
    Io = -14,
    Internal = -15,
    Disabled = -16,
    Forked = -17,
    Disconnected = -18,
}

impl ErrorCode {
    pub fn raw(self) -> i32 {
        self as i32
    }

    pub fn from_raw(code: i32) -> Option<ErrorCode> {
        match code {
            -1 => Some(ErrorCode::NotSupported),
            -2 => Some(ErrorCode::Invalid),
            -3 => Some(ErrorCode::State),
            -4 => Some(ErrorCode::OutOfMemory),
            -5 => Some(ErrorCode::NoDriver),
            -6 => Some(ErrorCode::System),
            -7 => Some(ErrorCode::Corrupt),
            -8 => Some(ErrorCode::TooBig),
            -9 => Some(ErrorCode::NotFound),
            -10 => Some(ErrorCode::Destroyed),
            -11 => Some(ErrorCode::Canceled),
            -12 => Some(ErrorCode::NotAvailable),
            -13 => Some(ErrorCode::Access),
            -14 => Some(ErrorCode::Io),
            -15 => Some(ErrorCode::Internal),
            -16 => Some(ErrorCode::Disabled),
            -17 => Some(ErrorCode::Forked),
            -18 => Some(ErrorCode::Disconnected),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::NotSupported => "NotSupported",
            ErrorCode::Invalid => "Invalid",
            ErrorCode::State => "State",
            ErrorCode::OutOfMemory => "OutOfMemory",
            ErrorCode::NoDriver => "NoDriver",
            ErrorCode::System => "System",
            ErrorCode::Corrupt => "Corrupt",
            ErrorCode::TooBig => "TooBig",
            ErrorCode::NotFound => "NotFound",
            ErrorCode::Destroyed => "Destroyed",
            ErrorCode::Canceled => "Canceled",
            ErrorCode::NotAvailable => "NotAvailable",
            ErrorCode::Access => "Access",
            ErrorCode::Io => "Io",
            ErrorCode::Internal => "Internal",
            ErrorCode::Disabled => "Disabled",
            ErrorCode::Forked => "Forked",
            ErrorCode::Disconnected => "Disconnected",
        }
    }

    /// Canonical human-readable message, matching the wrapped library's own
    /// `strerror` table. Built-in drivers use these; the libcanberra driver
    /// reports whatever the library supplies.
    pub(crate) fn message(self) -> &'static str {
        match self {
            ErrorCode::NotSupported => "Operation not supported",
            ErrorCode::Invalid => "Invalid argument",
            ErrorCode::State => "Invalid state",
            ErrorCode::OutOfMemory => "Out of memory",
            ErrorCode::NoDriver => "No such driver",
            ErrorCode::System => "System error",
            ErrorCode::Corrupt => "File or data corrupt",
            ErrorCode::TooBig => "File or data too large",
            ErrorCode::NotFound => "File or data not found",
            ErrorCode::Destroyed => "Destroyed",
            ErrorCode::Canceled => "Canceled",
            ErrorCode::NotAvailable => "Not available",
            ErrorCode::Access => "Access forbidden",
            ErrorCode::Io => "IO error",
            ErrorCode::Internal => "Internal error",
            ErrorCode::Disabled => "Sound disabled",
            ErrorCode::Forked => "Process forked",
            ErrorCode::Disconnected => "Disconnected",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.raw())
    }
}

/// A translated error from the wrapped library: the result code plus the
/// library-supplied human-readable message. No operation in this crate
/// retries on error; retry policy belongs to the caller.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    code: ErrorCode,
    message: Cow<'static, str>,
}

impl Error {
    pub(crate) fn new(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Error with the canonical message for `code`.
    pub(crate) fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.message())
    }

    /// Translate a raw driver result. Codes outside the known table are
    /// surfaced as [`ErrorCode::Internal`], keeping the original message.
    pub(crate) fn from_raw(raw: i32, message: impl Into<Cow<'static, str>>) -> Self {
        let code = ErrorCode::from_raw(raw).unwrap_or(ErrorCode::Internal);
        Self::new(code, message)
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl PartialEq<ErrorCode> for Error {
    fn eq(&self, other: &ErrorCode) -> bool {
        self.code == *other
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_codes_round_trip() {
        for raw in -18..=-1 {
            let code = ErrorCode::from_raw(raw).unwrap();
            assert_eq!(code.raw(), raw);
        }
        assert_eq!(ErrorCode::from_raw(0), None);
        assert_eq!(ErrorCode::from_raw(-99), None);
    }

    #[test]
    fn errors_are_readable() {
        let err = Error::from_code(ErrorCode::Invalid);
        assert_eq!(err.to_string(), "Invalid argument");

        let err = Error::from_code(ErrorCode::NoDriver);
        assert_eq!(err.to_string(), "No such driver");

        let err = Error::from_code(ErrorCode::Canceled);
        assert_eq!(err.to_string(), "Canceled");

        assert!(ErrorCode::Disabled.to_string().contains("Disabled"));
    }

    #[test]
    fn unknown_raw_code_maps_to_internal() {
        let err = Error::from_raw(-42, "out of range");
        assert_eq!(err, ErrorCode::Internal);
        assert_eq!(err.message(), "out of range");
    }
}
