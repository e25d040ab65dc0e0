//! The null driver: swallows play requests and completes them on the spot.

use tracing::debug;

use crate::attr::{self, Attributes};
use crate::backend::{Backend, FinishCallback, SUCCESS};
use crate::ErrorCode;

/// A no-op driver, equivalent to the wrapped library's "null" backend.
///
/// Play requests always succeed without touching the sound system, and
/// completion callbacks are invoked immediately on the calling thread.
/// Cache requests report [`ErrorCode::NotSupported`], exactly like the
/// wrapped library's null driver. The one piece of request inspection this
/// driver shares with the real library's common layer is the
/// [`attr::ENABLE`] switch: with the merged attributes carrying `"0"`,
/// play requests fail with [`ErrorCode::Disabled`].
#[derive(Debug, Default)]
pub struct NullBackend {
    opened: bool,
    driver: Option<String>,
    defaults: Attributes,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for NullBackend {
    fn open(&mut self) -> i32 {
        self.opened = true;
        SUCCESS
    }

    fn set_driver(&mut self, driver: &str) -> i32 {
        // Deferred validation, like the wrapped library: any name is
        // accepted here.
        self.driver = Some(driver.to_string());
        SUCCESS
    }

    fn change_props(&mut self, props: &Attributes) -> i32 {
        self.defaults.merge(props);
        SUCCESS
    }

    fn play(&mut self, id: u32, props: &Attributes, done: Option<FinishCallback>) -> i32 {
        let mut merged = self.defaults.clone();
        merged.merge(props);

        if merged.get_text(attr::ENABLE) == Some("0") {
            return ErrorCode::Disabled.raw();
        }

        debug!(id, attrs = merged.len(), "null driver swallowing play request");
        if let Some(done) = done {
            done(SUCCESS);
        }
        SUCCESS
    }

    fn cache(&mut self, _props: &Attributes) -> i32 {
        // There is no sound server to cache into.
        ErrorCode::NotSupported.raw()
    }

    fn cancel(&mut self, _id: u32) -> i32 {
        // Nothing is ever in flight.
        SUCCESS
    }
}
