//! A recording driver for tests. Doesn't play anything.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::attr::Attributes;
use crate::backend::{Backend, FinishCallback, SUCCESS};
use crate::ErrorCode;

/// One recorded play request.
#[derive(Debug, Clone)]
pub struct PlayRecord {
    pub id: u32,
    pub attrs: Attributes,
    pub with_callback: bool,
}

struct PendingPlay {
    id: u32,
    done: FinishCallback,
}

#[derive(Default)]
struct State {
    opens: usize,
    drivers: Vec<String>,
    prop_changes: Vec<Attributes>,
    plays: Vec<PlayRecord>,
    caches: Vec<Attributes>,
    cancels: Vec<u32>,
    pending: Vec<PendingPlay>,
    fail_next: Option<i32>,
}

/// A driver that records every boundary call and lets the test decide when
/// and how pending requests complete.
///
/// Cloning shares the underlying state, so a test typically keeps one clone
/// while handing another to
/// [`ContextBuilder::backend()`](crate::ContextBuilder::backend):
///
/// ```
/// use chime::backend::mock::MockBackend;
/// use chime::Context;
///
/// let mock = MockBackend::new();
/// let ctx = Context::builder()
///     .backend(Box::new(mock.clone()))
///     .create()
///     .unwrap();
/// drop(ctx);
/// assert_eq!(mock.pending(), 0);
/// ```
///
/// Completion callbacks for held requests are released via
/// [`complete_all()`](Self::complete_all) or [`cancel`](Backend::cancel);
/// callbacks still pending when the state is dropped are discarded, which
/// resolves their [`Playing`](crate::Playing) tokens with the destroyed
/// code.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<State>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next boundary call return `code` instead of succeeding.
    pub fn fail_next(&self, code: ErrorCode) {
        self.state.lock().fail_next = Some(code.raw());
    }

    /// Complete every held play request with `code`.
    pub fn complete_all(&self, code: i32) {
        let pending = std::mem::take(&mut self.state.lock().pending);
        for play in pending {
            (play.done)(code);
        }
    }

    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn opens(&self) -> usize {
        self.state.lock().opens
    }

    pub fn drivers(&self) -> Vec<String> {
        self.state.lock().drivers.clone()
    }

    pub fn prop_changes(&self) -> Vec<Attributes> {
        self.state.lock().prop_changes.clone()
    }

    pub fn plays(&self) -> Vec<PlayRecord> {
        self.state.lock().plays.clone()
    }

    pub fn caches(&self) -> Vec<Attributes> {
        self.state.lock().caches.clone()
    }

    pub fn cancels(&self) -> Vec<u32> {
        self.state.lock().cancels.clone()
    }
}

impl Backend for MockBackend {
    fn open(&mut self) -> i32 {
        let mut state = self.state.lock();
        if let Some(code) = state.fail_next.take() {
            return code;
        }
        state.opens += 1;
        SUCCESS
    }

    fn set_driver(&mut self, driver: &str) -> i32 {
        let mut state = self.state.lock();
        if let Some(code) = state.fail_next.take() {
            return code;
        }
        state.drivers.push(driver.to_string());
        SUCCESS
    }

    fn change_props(&mut self, props: &Attributes) -> i32 {
        let mut state = self.state.lock();
        if let Some(code) = state.fail_next.take() {
            return code;
        }
        state.prop_changes.push(props.clone());
        SUCCESS
    }

    fn play(&mut self, id: u32, props: &Attributes, done: Option<FinishCallback>) -> i32 {
        let mut state = self.state.lock();
        if let Some(code) = state.fail_next.take() {
            return code;
        }
        debug!(id, "mock driver recording play request");
        state.plays.push(PlayRecord {
            id,
            attrs: props.clone(),
            with_callback: done.is_some(),
        });
        if let Some(done) = done {
            state.pending.push(PendingPlay { id, done });
        }
        SUCCESS
    }

    fn cache(&mut self, props: &Attributes) -> i32 {
        let mut state = self.state.lock();
        if let Some(code) = state.fail_next.take() {
            return code;
        }
        state.caches.push(props.clone());
        SUCCESS
    }

    fn cancel(&mut self, id: u32) -> i32 {
        let cancelled = {
            let mut state = self.state.lock();
            if let Some(code) = state.fail_next.take() {
                return code;
            }
            state.cancels.push(id);
            let mut cancelled = Vec::new();
            let mut kept = Vec::new();
            for play in state.pending.drain(..) {
                if play.id == id {
                    cancelled.push(play);
                } else {
                    kept.push(play);
                }
            }
            state.pending = kept;
            cancelled
        };
        // Invoke outside the lock; completion may call back into the
        // context.
        for play in cancelled {
            (play.done)(ErrorCode::Canceled.raw());
        }
        SUCCESS
    }
}

#[cfg(test)]
mod test {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn records_and_completes_pending_plays() {
        let mock = MockBackend::new();
        let mut driver = mock.clone();

        let (tx, rx) = mpsc::channel();
        let code = driver.play(
            7,
            &Attributes::new(),
            Some(Box::new(move |code| {
                let _ = tx.send(code);
            })),
        );
        assert_eq!(code, SUCCESS);
        assert_eq!(mock.pending(), 1);

        mock.complete_all(SUCCESS);
        assert_eq!(rx.try_recv(), Ok(SUCCESS));
        assert_eq!(mock.pending(), 0);
    }

    #[test]
    fn cancel_resolves_only_matching_ids() {
        let mock = MockBackend::new();
        let mut driver = mock.clone();

        let (tx_a, rx_a) = mpsc::channel();
        let (tx_b, rx_b) = mpsc::channel();
        driver.play(
            1,
            &Attributes::new(),
            Some(Box::new(move |code| {
                let _ = tx_a.send(code);
            })),
        );
        driver.play(
            2,
            &Attributes::new(),
            Some(Box::new(move |code| {
                let _ = tx_b.send(code);
            })),
        );

        driver.cancel(1);
        assert_eq!(rx_a.try_recv(), Ok(ErrorCode::Canceled.raw()));
        assert!(rx_b.try_recv().is_err());
        assert_eq!(mock.pending(), 1);
    }

    #[test]
    fn scripted_failure_applies_to_the_next_call_only() {
        let mock = MockBackend::new();
        let mut driver = mock.clone();

        mock.fail_next(ErrorCode::NoDriver);
        assert_eq!(driver.open(), ErrorCode::NoDriver.raw());
        assert_eq!(driver.open(), SUCCESS);
        assert_eq!(mock.opens(), 1);
    }
}
