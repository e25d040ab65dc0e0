//! Completion tokens for asynchronous play requests.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use crate::cancel::CancelGuard;
use crate::{Error, ErrorCode, Result};

/// The pending result of a [`Context::play_full()`](crate::Context::play_full)
/// request.
///
/// Resolves exactly once: playback finished, playback failed (with the
/// translated driver error), the request was canceled (as
/// [`ErrorCode::Canceled`]), or the connection was torn down first (as
/// [`ErrorCode::Destroyed`]). Failures that occur before the request reaches
/// the driver resolve through this same path.
///
/// `Playing` is a [`Future`]; callers without an async runtime can block on
/// [`finish()`](Self::finish) instead.
#[must_use = "dropping a Playing discards playback errors; use play_simple() if you don't care"]
pub struct Playing {
    rx: oneshot::Receiver<Result<()>>,
}

impl Playing {
    /// Block until the request resolves and return its result, releasing
    /// the token. Must not be called from async context; `.await` the
    /// `Playing` there instead.
    pub fn finish(self) -> Result<()> {
        self.rx
            .blocking_recv()
            .unwrap_or_else(|_| Err(Error::from_code(ErrorCode::Destroyed)))
    }
}

impl Future for Playing {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.unwrap_or_else(|_| Err(Error::from_code(ErrorCode::Destroyed))))
    }
}

struct CompletionInner {
    tx: Mutex<Option<oneshot::Sender<Result<()>>>>,
    guard: Mutex<Option<CancelGuard>>,
}

/// Resolver half of a [`Playing`] token.
///
/// Allocated before the request is submitted so that every failure path,
/// including pre-transmission ones, funnels into the same resolution.
/// Cloned into the driver's completion callback; whichever side resolves
/// first wins, and later resolutions are no-ops (cancellation racing a
/// natural completion must never double-fire or touch freed state).
#[derive(Clone)]
pub(crate) struct Completion {
    inner: Arc<CompletionInner>,
}

impl Completion {
    pub(crate) fn new() -> (Completion, Playing) {
        let (tx, rx) = oneshot::channel();
        let completion = Completion {
            inner: Arc::new(CompletionInner {
                tx: Mutex::new(Some(tx)),
                guard: Mutex::new(None),
            }),
        };
        (completion, Playing { rx })
    }

    /// Resolve the token. The first call delivers `result` and detaches the
    /// cancellation listener; subsequent calls do nothing.
    pub(crate) fn resolve(&self, result: Result<()>) {
        if let Some(tx) = self.inner.tx.lock().take() {
            debug!(ok = result.is_ok(), "resolving play completion");
            // The receiver may already be gone; resolution is still final.
            let _ = tx.send(result);
        }
        self.inner.guard.lock().take();
    }

    /// Keep the cancellation listener attached until resolution. If the
    /// token already resolved, the guard is dropped (detached) right away.
    pub(crate) fn attach_guard(&self, guard: CancelGuard) {
        let resolved = self.inner.tx.lock().is_none();
        if !resolved {
            *self.inner.guard.lock() = Some(guard);
            // Raced a resolve between the two locks: resolve() may have
            // missed the guard we just stored.
            if self.inner.tx.lock().is_none() {
                self.inner.guard.lock().take();
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn resolves_once_with_success() {
        let (completion, playing) = Completion::new();
        completion.resolve(Ok(()));
        completion.resolve(Err(Error::from_code(ErrorCode::Io)));

        assert!(playing.finish().is_ok());
    }

    #[test]
    fn first_resolution_wins() {
        let (completion, playing) = Completion::new();
        completion.resolve(Err(Error::from_code(ErrorCode::Canceled)));
        completion.resolve(Ok(()));

        assert_eq!(playing.finish().unwrap_err(), ErrorCode::Canceled);
    }

    #[test]
    fn dropped_resolver_surfaces_as_destroyed() {
        let (completion, playing) = Completion::new();
        drop(completion);

        assert_eq!(playing.finish().unwrap_err(), ErrorCode::Destroyed);
    }

    #[tokio::test]
    async fn playing_is_a_future() {
        let (completion, playing) = Completion::new();
        let task = tokio::spawn(playing);
        completion.resolve(Ok(()));

        assert!(task.await.unwrap().is_ok());
    }
}
