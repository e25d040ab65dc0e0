//! Caller-owned cancellation tokens.
//!
//! A [`CancelToken`] is handed to `play` calls; cancelling it asks the driver
//! to abort every in-flight request tagged with the token's identity. It is
//! the bridge between the caller's world and the driver's cancel-by-id
//! mechanism.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

type ListenerFn = Box<dyn FnOnce() + Send>;

struct Listener {
    handle: u64,
    func: ListenerFn,
}

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    next_handle: AtomicU64,
    listeners: Mutex<Vec<Listener>>,
}

/// A cancellation token correlated with play requests.
///
/// Cloning produces another handle to the same token: clones share one
/// identity, so cancelling any of them cancels every request tagged with
/// that identity. A token stays cancelled once [`cancel()`](Self::cancel)
/// has been called; create a fresh token for later requests.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation. Registered listeners fire exactly once, on the
    /// first call; later calls are no-ops.
    pub fn cancel(&self) {
        let fired = {
            let mut listeners = self.inner.listeners.lock();
            if self.inner.cancelled.swap(true, Ordering::SeqCst) {
                return;
            }
            std::mem::take(&mut *listeners)
        };
        for listener in fired {
            (listener.func)();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// The identity used to tag requests at the driver boundary, derived
    /// from the token's shared allocation. Stable across clones, distinct
    /// between tokens, never 0 (0 is the "no token" identity).
    pub(crate) fn id(&self) -> u32 {
        Arc::as_ptr(&self.inner) as usize as u32
    }

    /// Register `func` to run on cancellation. If the token is already
    /// cancelled, `func` runs immediately on this thread and no handle is
    /// returned.
    pub(crate) fn connect(&self, func: ListenerFn) -> Option<u64> {
        {
            let mut listeners = self.inner.listeners.lock();
            if !self.inner.cancelled.load(Ordering::SeqCst) {
                let handle = self.inner.next_handle.fetch_add(1, Ordering::Relaxed);
                listeners.push(Listener { handle, func });
                return Some(handle);
            }
        }
        func();
        None
    }

    /// Like [`connect()`](Self::connect), returning a guard that detaches
    /// the listener when dropped.
    pub(crate) fn connect_guarded(&self, func: ListenerFn) -> Option<CancelGuard> {
        self.connect(func).map(|handle| CancelGuard {
            token: self.clone(),
            handle,
        })
    }

    pub(crate) fn disconnect(&self, handle: u64) {
        self.inner
            .listeners
            .lock()
            .retain(|listener| listener.handle != handle);
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("id", &self.id())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Detaches one registered listener on drop.
pub(crate) struct CancelGuard {
    token: CancelToken,
    handle: u64,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.token.disconnect(self.handle);
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn counting_listener(count: &Arc<AtomicUsize>) -> ListenerFn {
        let count = count.clone();
        Box::new(move || {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn cancel_fires_listeners_once() {
        let token = CancelToken::new();
        let count = Arc::new(AtomicUsize::new(0));
        token.connect(counting_listener(&count));

        token.cancel();
        token.cancel();

        assert!(token.is_cancelled());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn connect_on_cancelled_token_fires_immediately() {
        let token = CancelToken::new();
        token.cancel();

        let count = Arc::new(AtomicUsize::new(0));
        let handle = token.connect(counting_listener(&count));
        assert!(handle.is_none());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropped_guard_detaches_the_listener() {
        let token = CancelToken::new();
        let count = Arc::new(AtomicUsize::new(0));
        let guard = token.connect_guarded(counting_listener(&count));
        drop(guard);

        token.cancel();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn identity_is_stable_across_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert_eq!(token.id(), clone.id());
        assert_ne!(token.id(), 0);

        let other = CancelToken::new();
        assert_ne!(token.id(), other.id());
    }

    #[test]
    fn cancel_from_another_thread_is_seen() {
        let token = CancelToken::new();
        let count = Arc::new(AtomicUsize::new(0));
        token.connect(counting_listener(&count));

        let remote = token.clone();
        thread::spawn(move || remote.cancel()).join().unwrap();

        assert!(token.is_cancelled());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
