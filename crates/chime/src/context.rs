//! The playback context: a single owned connection to the sound system.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use crate::attr::{self, Attributes};
use crate::backend::{Backend, FinishCallback, SUCCESS};
use crate::cancel::CancelToken;
use crate::play::{Completion, Playing};
use crate::{Error, ErrorCode, Result};

struct Shared {
    backend: Option<Box<dyn Backend>>,
    initialized: bool,
    // Whether init() may (re)create the default driver. False once a caller
    // injected their own backend; a failed init discards it for good.
    use_default: bool,
}

/// A connection to the sound system, used for playing event sounds.
///
/// The usual pattern:
///
/// ```no_run
/// use chime::{attr, Context};
///
/// # fn main() -> chime::Result<()> {
/// let mut ctx = Context::new()?;
/// ctx.set_attributes([(attr::MEDIA_ROLE, "game")])?;
/// ctx.cache([(attr::MEDIA_FILENAME, "/usr/share/sounds/laser.ogg")])?;
/// ctx.play_simple([(attr::EVENT_ID, "bell")], None)?;
/// # Ok(())
/// # }
/// ```
///
/// A context built via [`ContextBuilder::build()`] starts uninitialized and
/// must be [`init()`](Self::init)-ed before use; [`Context::new()`] and
/// [`ContextBuilder::create()`] do both steps at once. Every operation on an
/// uninitialized context fails with [`ErrorCode::State`].
///
/// A `Context` is a single-owner object: operations take `&mut self` and are
/// not meant to be issued concurrently. The one exception is cancellation,
/// which may arrive from any thread through a [`CancelToken`]. Dropping the
/// context closes the connection exactly once; play requests still pending
/// at that point resolve with [`ErrorCode::Destroyed`].
pub struct Context {
    shared: Arc<Mutex<Shared>>,
    identity: Attributes,
}

/// Configures and creates a [`Context`].
///
/// Application identity is explicit here rather than scraped from global
/// state: set it with [`app_name()`](Self::app_name) /
/// [`app_id()`](Self::app_id). As a convenience the builder inherits the
/// current executable's name when no name is given; switch that off with
/// [`inherit_process_identity(false)`](Self::inherit_process_identity).
pub struct ContextBuilder {
    app_name: Option<String>,
    app_id: Option<String>,
    inherit_process_identity: bool,
    backend: Option<Box<dyn Backend>>,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self {
            app_name: None,
            app_id: None,
            inherit_process_identity: true,
            backend: None,
        }
    }
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Human-readable application name, attached to the connection as
    /// [`attr::APPLICATION_NAME`] during initialization.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Application id (e.g. "org.gnu.emacs"), attached as
    /// [`attr::APPLICATION_ID`] during initialization.
    pub fn app_id(mut self, id: impl Into<String>) -> Self {
        self.app_id = Some(id.into());
        self
    }

    /// Whether to fall back to the current executable's name when no
    /// explicit application name is configured. On by default.
    pub fn inherit_process_identity(mut self, inherit: bool) -> Self {
        self.inherit_process_identity = inherit;
        self
    }

    /// Use the given driver instead of the default one. Mostly useful for
    /// tests and for embedders with their own sound plumbing.
    pub fn backend(mut self, backend: Box<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Build an uninitialized context. Call [`Context::init()`] before use.
    pub fn build(self) -> Context {
        let mut identity = Attributes::new();
        let name = self.app_name.or_else(|| {
            if self.inherit_process_identity {
                process_name()
            } else {
                None
            }
        });
        if let Some(name) = name {
            identity.set(attr::APPLICATION_NAME, name);
        }
        if let Some(id) = self.app_id {
            identity.set(attr::APPLICATION_ID, id);
        }

        let use_default = self.backend.is_none();
        Context {
            shared: Arc::new(Mutex::new(Shared {
                backend: self.backend,
                initialized: false,
                use_default,
            })),
            identity,
        }
    }

    /// Build and initialize in one step.
    pub fn create(self) -> Result<Context> {
        let mut ctx = self.build();
        ctx.init()?;
        Ok(ctx)
    }
}

impl Context {
    /// Create and initialize a context with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().create()
    }

    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    /// Initialize the context: create the driver handle and attach the
    /// configured application identity to the connection defaults.
    ///
    /// Idempotent: on an already-initialized context this returns `Ok(())`
    /// without creating a second handle or re-applying defaults. If
    /// attaching the identity fails, the handle is torn down again and the
    /// translated error is returned; the context stays uninitialized.
    pub fn init(&mut self) -> Result<()> {
        let mut shared = self.shared.lock();
        if shared.initialized {
            return Ok(());
        }

        let mut backend = match shared.backend.take() {
            Some(backend) => backend,
            None if shared.use_default => default_backend()?,
            None => return Err(Error::from_code(ErrorCode::State)),
        };

        if !self.identity.is_empty() {
            let code = backend.change_props(&self.identity);
            if code != SUCCESS {
                // Drops (and thereby destroys) the fresh handle.
                return Err(translate(&*backend, code));
            }
        }

        debug!(identity = self.identity.len(), "context initialized");
        shared.backend = Some(backend);
        shared.initialized = true;
        Ok(())
    }

    /// Open the connection to the sound system.
    ///
    /// Drivers open automatically before the first play or cache request,
    /// so calling this is rarely necessary. Attributes set beforehand are
    /// part of the connection handshake, so prefer calling
    /// [`set_attributes()`](Self::set_attributes) first.
    pub fn open(&mut self) -> Result<()> {
        debug!("opening connection");
        self.sync_op(|backend| backend.open())
    }

    /// Select the driver backend by name, for example "pulse", "alsa" or
    /// "null".
    ///
    /// Note that this may succeed even when the named driver is
    /// unavailable; such failures are deferred to later operations.
    pub fn set_driver(&mut self, driver: &str) -> Result<()> {
        debug!(driver, "selecting driver");
        self.sync_op(|backend| backend.set_driver(driver))
    }

    /// Merge attributes into the context-wide defaults applied to all
    /// subsequent play and cache requests, unless overridden per call.
    /// Setting a key again overrides the earlier value.
    pub fn set_attributes(&mut self, attrs: impl Into<Attributes>) -> Result<()> {
        let attrs = attrs.into();
        debug!(count = attrs.len(), "merging context attributes");
        self.sync_op(|backend| backend.change_props(&attrs))
    }

    /// The basic "fire-and-forget" play command: submits the request and
    /// returns without waiting for playback.
    ///
    /// Only errors detected while handing the request to the sound system
    /// are reported here; use [`play_full()`](Self::play_full) to learn how
    /// playback actually ended.
    ///
    /// If `cancel` is supplied, cancelling it aborts this request (and any
    /// other request tagged with the same token). The token's listener
    /// stays attached for the token's lifetime, since a fire-and-forget
    /// request has no completion moment to detach on; cancelling after the
    /// sound finished is a no-op in the driver.
    pub fn play_simple(
        &mut self,
        attrs: impl Into<Attributes>,
        cancel: Option<&CancelToken>,
    ) -> Result<()> {
        let attrs = attrs.into();
        let id = cancel.map(CancelToken::id).unwrap_or(0);
        debug!(id, count = attrs.len(), "submitting fire-and-forget play");

        let result = self.sync_op(|backend| backend.play(id, &attrs, None));

        if let Some(token) = cancel {
            let weak = Arc::downgrade(&self.shared);
            token.connect(Box::new(move || cancel_by_id(&weak, id)));
        }

        result
    }

    /// Asynchronously request a sound to be played.
    ///
    /// The returned [`Playing`] resolves exactly once — when playback
    /// finishes, when it fails, or when it is canceled via `cancel` (as
    /// [`ErrorCode::Canceled`]). Failures that occur before the request
    /// reaches the sound system also resolve through the token rather than
    /// being reported here, so a discarded `Playing` loses all error
    /// visibility; prefer [`play_simple()`](Self::play_simple) when
    /// completion doesn't matter.
    ///
    /// The cancellation listener is detached as soon as the request
    /// resolves.
    pub fn play_full(
        &mut self,
        attrs: impl Into<Attributes>,
        cancel: Option<&CancelToken>,
    ) -> Playing {
        let attrs = attrs.into();
        let (completion, playing) = Completion::new();
        let id = cancel.map(CancelToken::id).unwrap_or(0);
        debug!(id, count = attrs.len(), "submitting asynchronous play");

        let submitted: Result<()> = {
            let mut shared = self.shared.lock();
            match require_backend(&mut shared) {
                Err(err) => Err(err),
                Ok(backend) => {
                    let done: FinishCallback = {
                        let completion = completion.clone();
                        Box::new(move |code| {
                            let result = if code == SUCCESS {
                                Ok(())
                            } else {
                                Err(completion_error(code))
                            };
                            completion.resolve(result);
                        })
                    };
                    let code = backend.play(id, &attrs, Some(done));
                    if code == SUCCESS {
                        Ok(())
                    } else {
                        Err(translate(&*backend, code))
                    }
                }
            }
        };

        if let Some(token) = cancel {
            let weak = Arc::downgrade(&self.shared);
            if let Some(guard) = token.connect_guarded(Box::new(move || cancel_by_id(&weak, id))) {
                completion.attach_guard(guard);
            }
        }

        if let Err(err) = submitted {
            completion.resolve(Err(err));
        }

        playing
    }

    /// Request that the sound system cache the described sample.
    ///
    /// Useful for frequently-played sounds such as input feedback or game
    /// effects. The default caching mode for cached samples is "permanent"
    /// (versus "never" for plain play requests); both defaults live in the
    /// wrapped library and can be overridden with [`attr::CACHE_CONTROL`].
    pub fn cache(&mut self, attrs: impl Into<Attributes>) -> Result<()> {
        let attrs = attrs.into();
        debug!(count = attrs.len(), "requesting sample cache");
        self.sync_op(|backend| backend.cache(&attrs))
    }

    fn sync_op<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Backend) -> i32,
    {
        let mut shared = self.shared.lock();
        let backend = require_backend(&mut shared)?;
        let code = f(&mut *backend);
        if code == SUCCESS {
            Ok(())
        } else {
            Err(translate(&*backend, code))
        }
    }
}

fn require_backend(shared: &mut Shared) -> Result<&mut (dyn Backend + 'static)> {
    if !shared.initialized {
        return Err(Error::from_code(ErrorCode::State));
    }
    shared
        .backend
        .as_deref_mut()
        .ok_or_else(|| Error::from_code(ErrorCode::State))
}

fn translate(backend: &dyn Backend, code: i32) -> Error {
    Error::from_raw(code, backend.strerror(code))
}

/// Errors delivered through completion callbacks carry only the raw code;
/// the message comes from the canonical table.
fn completion_error(code: i32) -> Error {
    match ErrorCode::from_raw(code) {
        Some(code) => Error::from_code(code),
        None => Error::from_raw(code, "Unknown error"),
    }
}

fn cancel_by_id(shared: &Weak<Mutex<Shared>>, id: u32) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    let mut shared = shared.lock();
    if let Some(backend) = shared.backend.as_deref_mut() {
        debug!(id, "forwarding cancellation to driver");
        backend.cancel(id);
    }
}

#[cfg(feature = "canberra")]
fn default_backend() -> Result<Box<dyn Backend>> {
    Ok(Box::new(crate::backend::canberra::CanberraBackend::new()?))
}

#[cfg(not(feature = "canberra"))]
fn default_backend() -> Result<Box<dyn Backend>> {
    Ok(Box::new(crate::backend::null::NullBackend::new()))
}

fn process_name() -> Option<String> {
    let exe = std::env::current_exe().ok()?;
    let stem = exe.file_stem()?.to_str()?;
    Some(stem.to_string())
}

#[cfg(test)]
mod test {
    use std::thread;

    use super::*;
    use crate::backend::mock::MockBackend;

    fn quiet_builder(mock: &MockBackend) -> ContextBuilder {
        Context::builder()
            .inherit_process_identity(false)
            .backend(Box::new(mock.clone()))
    }

    #[test]
    fn init_is_idempotent() {
        let mock = MockBackend::new();
        let mut ctx = quiet_builder(&mock).app_name("chime-test").build();

        ctx.init().unwrap();
        ctx.init().unwrap();

        // Identity applied exactly once; no second handle initialization.
        assert_eq!(mock.prop_changes().len(), 1);
        assert_eq!(
            mock.prop_changes()[0].get_text(attr::APPLICATION_NAME),
            Some("chime-test")
        );
    }

    #[test]
    fn identity_includes_app_id_when_configured() {
        let mock = MockBackend::new();
        let mut ctx = quiet_builder(&mock)
            .app_name("chime-test")
            .app_id("dev.chime.test")
            .build();
        ctx.init().unwrap();

        let identity = &mock.prop_changes()[0];
        assert_eq!(identity.get_text(attr::APPLICATION_ID), Some("dev.chime.test"));
    }

    #[test]
    fn operations_before_init_fail_with_state() {
        let mock = MockBackend::new();
        let mut ctx = quiet_builder(&mock).build();

        assert_eq!(ctx.open().unwrap_err(), ErrorCode::State);
        assert_eq!(
            ctx.play_simple([(attr::EVENT_ID, "bell")], None).unwrap_err(),
            ErrorCode::State
        );
        assert!(mock.plays().is_empty());
    }

    #[test]
    fn failed_identity_attachment_leaves_context_uninitialized() {
        let mock = MockBackend::new();
        let mut ctx = quiet_builder(&mock).app_name("chime-test").build();

        mock.fail_next(ErrorCode::Access);
        let err = ctx.init().unwrap_err();
        assert_eq!(err, ErrorCode::Access);

        // The injected driver was discarded; the context stays unusable.
        assert_eq!(ctx.open().unwrap_err(), ErrorCode::State);
        assert_eq!(ctx.init().unwrap_err(), ErrorCode::State);
    }

    #[test]
    fn open_translates_driver_errors() {
        let mock = MockBackend::new();
        let mut ctx = quiet_builder(&mock).create().unwrap();

        ctx.open().unwrap();
        assert_eq!(mock.opens(), 1);

        mock.fail_next(ErrorCode::NoDriver);
        let err = ctx.open().unwrap_err();
        assert_eq!(err, ErrorCode::NoDriver);
        assert_eq!(err.to_string(), "No such driver");
    }

    #[test]
    fn set_driver_forwards_the_name() {
        let mock = MockBackend::new();
        let mut ctx = quiet_builder(&mock).create().unwrap();

        ctx.set_driver("pulse").unwrap();
        assert_eq!(mock.drivers(), vec!["pulse".to_string()]);
    }

    #[test]
    fn set_attributes_reaches_the_connection_defaults() {
        let mock = MockBackend::new();
        let mut ctx = quiet_builder(&mock).create().unwrap();

        ctx.set_attributes([(attr::MEDIA_ROLE, "event")]).unwrap();

        let changes = mock.prop_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].get_text(attr::MEDIA_ROLE), Some("event"));
    }

    #[test]
    fn play_simple_uses_the_null_identity_without_a_token() {
        let mock = MockBackend::new();
        let mut ctx = quiet_builder(&mock).create().unwrap();

        ctx.play_simple([(attr::EVENT_ID, "bell")], None).unwrap();

        let plays = mock.plays();
        assert_eq!(plays.len(), 1);
        assert_eq!(plays[0].id, 0);
        assert!(!plays[0].with_callback);
        assert_eq!(plays[0].attrs.get_text(attr::EVENT_ID), Some("bell"));
    }

    #[test]
    fn play_simple_cancellation_reaches_the_driver() {
        let mock = MockBackend::new();
        let mut ctx = quiet_builder(&mock).create().unwrap();
        let token = CancelToken::new();

        ctx.play_simple([(attr::EVENT_ID, "bell")], Some(&token))
            .unwrap();
        let tagged = mock.plays()[0].id;
        assert_ne!(tagged, 0);

        token.cancel();
        assert_eq!(mock.cancels(), vec![tagged]);
    }

    #[test]
    fn cancelling_with_nothing_in_flight_is_a_noop() {
        let mock = MockBackend::new();
        let mut ctx = quiet_builder(&mock).create().unwrap();
        let token = CancelToken::new();

        // The token was never passed to a play call; nothing listens.
        token.cancel();
        assert!(mock.cancels().is_empty());

        // Still usable for sync ops afterwards.
        ctx.open().unwrap();
    }

    #[test]
    fn play_full_resolves_success() {
        let mock = MockBackend::new();
        let mut ctx = quiet_builder(&mock).create().unwrap();

        let playing = ctx.play_full([(attr::EVENT_ID, "bell")], None);
        assert_eq!(mock.pending(), 1);

        mock.complete_all(SUCCESS);
        assert!(playing.finish().is_ok());
        assert_eq!(mock.pending(), 0);
    }

    #[test]
    fn play_full_reports_playback_failure_through_the_token() {
        let mock = MockBackend::new();
        let mut ctx = quiet_builder(&mock).create().unwrap();

        let playing = ctx.play_full([(attr::EVENT_ID, "bell")], None);
        mock.complete_all(ErrorCode::Io.raw());

        assert_eq!(playing.finish().unwrap_err(), ErrorCode::Io);
    }

    #[test]
    fn play_full_submit_failure_still_resolves_the_token() {
        let mock = MockBackend::new();
        let mut ctx = quiet_builder(&mock).create().unwrap();

        mock.fail_next(ErrorCode::Disconnected);
        let playing = ctx.play_full([(attr::EVENT_ID, "bell")], None);

        assert_eq!(playing.finish().unwrap_err(), ErrorCode::Disconnected);
        assert_eq!(mock.pending(), 0);
    }

    #[test]
    fn play_full_on_uninitialized_context_resolves_with_state() {
        let mock = MockBackend::new();
        let mut ctx = quiet_builder(&mock).build();

        let playing = ctx.play_full([(attr::EVENT_ID, "bell")], None);
        assert_eq!(playing.finish().unwrap_err(), ErrorCode::State);
        assert!(mock.plays().is_empty());
    }

    #[test]
    fn cancelling_an_in_flight_play_resolves_with_canceled() {
        let mock = MockBackend::new();
        let mut ctx = quiet_builder(&mock).create().unwrap();
        let token = CancelToken::new();

        let playing = ctx.play_full([(attr::EVENT_ID, "bell")], Some(&token));
        token.cancel();

        assert_eq!(playing.finish().unwrap_err(), ErrorCode::Canceled);
        assert_eq!(mock.pending(), 0);
    }

    #[test]
    fn cancelling_after_completion_is_a_noop() {
        let mock = MockBackend::new();
        let mut ctx = quiet_builder(&mock).create().unwrap();
        let token = CancelToken::new();

        let playing = ctx.play_full([(attr::EVENT_ID, "bell")], Some(&token));
        mock.complete_all(SUCCESS);
        token.cancel();

        assert!(playing.finish().is_ok());
        // The eager detach means the driver never even saw the cancel.
        assert!(mock.cancels().is_empty());
    }

    #[test]
    fn completion_and_cancellation_race_resolves_exactly_once() {
        let mock = MockBackend::new();
        let mut ctx = quiet_builder(&mock).create().unwrap();
        let token = CancelToken::new();

        let playing = ctx.play_full([(attr::EVENT_ID, "bell")], Some(&token));

        token.cancel();
        mock.complete_all(SUCCESS);

        // First resolution (the cancellation) wins.
        assert_eq!(playing.finish().unwrap_err(), ErrorCode::Canceled);
    }

    #[test]
    fn already_cancelled_token_aborts_the_request() {
        let mock = MockBackend::new();
        let mut ctx = quiet_builder(&mock).create().unwrap();
        let token = CancelToken::new();
        token.cancel();

        let playing = ctx.play_full([(attr::EVENT_ID, "bell")], Some(&token));
        assert_eq!(playing.finish().unwrap_err(), ErrorCode::Canceled);
    }

    #[test]
    fn dropping_everything_resolves_pending_plays_with_destroyed() {
        let mock = MockBackend::new();
        let mut ctx = quiet_builder(&mock).create().unwrap();

        let playing = ctx.play_full([(attr::EVENT_ID, "bell")], None);
        drop(ctx);
        drop(mock);

        assert_eq!(playing.finish().unwrap_err(), ErrorCode::Destroyed);
    }

    #[test]
    fn completion_may_arrive_from_another_thread() {
        let mock = MockBackend::new();
        let mut ctx = quiet_builder(&mock).create().unwrap();

        let playing = ctx.play_full([(attr::EVENT_ID, "bell")], None);
        let remote = mock.clone();
        let handle = thread::spawn(move || remote.complete_all(SUCCESS));

        assert!(playing.finish().is_ok());
        handle.join().unwrap();
    }

    #[test]
    fn cache_forwards_attributes() {
        let mock = MockBackend::new();
        let mut ctx = quiet_builder(&mock).create().unwrap();

        ctx.cache([(attr::MEDIA_FILENAME, "/tmp/a.wav")]).unwrap();

        let caches = mock.caches();
        assert_eq!(caches.len(), 1);
        assert_eq!(caches[0].get_text(attr::MEDIA_FILENAME), Some("/tmp/a.wav"));
    }
}
