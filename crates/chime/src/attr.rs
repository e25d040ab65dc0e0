//! Attribute names recognized by the wrapped library, plus the
//! [`Attributes`] set used to marshal them across the boundary.
//!
//! Attributes can be set context-wide with
//! [`Context::set_attributes()`](crate::Context::set_attributes) or supplied
//! per call to `play`/`cache`. Context-wide attributes apply to every
//! subsequent request unless overridden by that request.
//!
//! Unknown keys pass through unmodified. The `canberra.*` keys are
//! interpreted by the wrapped library itself and stripped before anything is
//! handed to a remote sound server; this crate never inspects them.

use std::collections::{BTreeMap, HashMap};

use crate::{Error, ErrorCode, Result};

/// A name describing the media being played.
pub const MEDIA_NAME: &str = "media.name";
/// A (song) title describing the media being played.
pub const MEDIA_TITLE: &str = "media.title";
/// The artist of this media.
pub const MEDIA_ARTIST: &str = "media.artist";
/// The language of this media as a POSIX locale string, e.g. "de_DE".
pub const MEDIA_LANGUAGE: &str = "media.language";
/// The file name this media was or can be loaded from.
pub const MEDIA_FILENAME: &str = "media.filename";
/// An icon for this media in binary PNG format.
pub const MEDIA_ICON: &str = "media.icon";
/// An icon name as defined in the XDG icon naming specification.
pub const MEDIA_ICON_NAME: &str = "media.icon_name";
/// The "role" this media is played in: "event", "music", "game", ...
pub const MEDIA_ROLE: &str = "media.role";

/// A textual id for an event sound, per the XDG sound naming specification.
pub const EVENT_ID: &str = "event.id";
/// A descriptive string for the sound event.
pub const EVENT_DESCRIPTION: &str = "event.description";
/// X position of the mouse cursor on screen, formatted as a string.
pub const EVENT_MOUSE_X: &str = "event.mouse.x";
/// Y position of the mouse cursor on screen, formatted as a string.
pub const EVENT_MOUSE_Y: &str = "event.mouse.y";
/// Fractional horizontal mouse position between 0 and 1.
pub const EVENT_MOUSE_HPOS: &str = "event.mouse.hpos";
/// Fractional vertical mouse position between 0 and 1.
pub const EVENT_MOUSE_VPOS: &str = "event.mouse.vpos";
/// Number of the mouse button that triggered the event (1 left, 2 middle,
/// 3 right).
pub const EVENT_MOUSE_BUTTON: &str = "event.mouse.button";

/// Human-readable name of the window that triggered the event.
pub const WINDOW_NAME: &str = "window.name";
/// Identification string for the triggering window.
pub const WINDOW_ID: &str = "window.id";
/// Binary PNG icon data for the triggering window.
pub const WINDOW_ICON: &str = "window.icon";
/// XDG icon name for the triggering window.
pub const WINDOW_ICON_NAME: &str = "window.icon_name";
pub const WINDOW_X: &str = "window.x";
pub const WINDOW_Y: &str = "window.y";
pub const WINDOW_WIDTH: &str = "window.width";
pub const WINDOW_HEIGHT: &str = "window.height";
/// Fractional horizontal position of the window center between 0 and 1.
pub const WINDOW_HPOS: &str = "window.hpos";
/// Fractional vertical position of the window center between 0 and 1.
pub const WINDOW_VPOS: &str = "window.vpos";
/// Comma-separated desktop indexes the window is visible on, e.g. "0,2,3".
pub const WINDOW_DESKTOP: &str = "window.desktop";
/// X display name of the window, e.g. ":0".
pub const WINDOW_X11_DISPLAY: &str = "window.x11.display";
/// X screen id of the window, formatted as a string.
pub const WINDOW_X11_SCREEN: &str = "window.x11.screen";
/// X monitor id of the window, formatted as a string.
pub const WINDOW_X11_MONITOR: &str = "window.x11.monitor";
/// XID of the window, formatted as a string.
pub const WINDOW_X11_XID: &str = "window.x11.xid";

/// Human-readable name of the application that triggered the event.
///
/// Attached automatically during context initialization when an application
/// name is configured or inherited; see
/// [`ContextBuilder`](crate::ContextBuilder).
pub const APPLICATION_NAME: &str = "application.name";
/// Identifier of the triggering program, e.g. "org.gnu.emacs".
///
/// Attached automatically during context initialization when configured on
/// the [`ContextBuilder`](crate::ContextBuilder).
pub const APPLICATION_ID: &str = "application.id";
/// Version of the triggering program.
pub const APPLICATION_VERSION: &str = "application.version";
/// Binary PNG icon data for the triggering application.
pub const APPLICATION_ICON: &str = "application.icon";
/// XDG icon name for the triggering application.
pub const APPLICATION_ICON_NAME: &str = "application.icon_name";
/// POSIX locale string the application runs in.
pub const APPLICATION_LANGUAGE: &str = "application.language";
/// Unix PID of the triggering process, formatted as a string.
pub const APPLICATION_PROCESS_ID: &str = "application.process.id";
/// Path to the binary of the triggering process.
pub const APPLICATION_PROCESS_BINARY: &str = "application.process.binary";
/// User owning the triggering process.
pub const APPLICATION_PROCESS_USER: &str = "application.process.user";
/// Host the triggering process runs on.
pub const APPLICATION_PROCESS_HOST: &str = "application.process.host";

/// Sample caching mode: one of "permanent", "volatile", "never".
///
/// Defaults (applied by the wrapped library, not by this crate) differ per
/// operation: "never" for `play`, "permanent" for `cache`.
pub const CACHE_CONTROL: &str = "canberra.cache-control";
/// Decibel multiplier for this sound, as a floating point string. 0 dB is
/// the default gain.
pub const VOLUME: &str = "canberra.volume";
/// XDG sound theme to resolve this sample against.
pub const XDG_THEME_NAME: &str = "canberra.xdg-theme.name";
/// XDG sound theme output profile for this sample.
pub const XDG_THEME_OUTPUT_PROFILE: &str = "canberra.xdg-theme.output-profile";
/// "0" disables playback entirely; requests fail with the disabled code.
pub const ENABLE: &str = "canberra.enable";
/// Force playback onto one channel, e.g. "mono" or "front-left". Honored by
/// some drivers only.
pub const FORCE_CHANNEL: &str = "canberra.force_channel";

/// An attribute value: UTF-8 text or a binary blob (icons are shipped as
/// PNG data).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Binary(Vec<u8>),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Binary(_) => None,
        }
    }

    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Value::Text(_) => None,
            Value::Binary(b) => Some(b),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Text(s.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Binary(b)
    }
}

/// A set of attributes destined for one request or for the context defaults.
///
/// Keys are unique and unordered; setting a key twice keeps the last value.
/// A set is built fresh for each call and never outlives it.
///
/// The usual way to build one is from typed pairs:
///
/// ```
/// use chime::{attr, Attributes};
///
/// let attrs = Attributes::from([
///     (attr::EVENT_ID, "dialog-error"),
///     (attr::EVENT_DESCRIPTION, "Something went wrong"),
/// ]);
/// assert_eq!(attrs.len(), 2);
/// ```
///
/// [`Attributes::from_flat()`] accepts the flat alternating key/value form
/// instead, for callers marshaling an externally supplied list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: BTreeMap<String, Value>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one attribute, replacing any previous value for the key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Build a set from a flat alternating `key, value, key, value, ...`
    /// sequence, the moral equivalent of the C API's null-terminated
    /// variadic pair list. A trailing key with no value fails with
    /// [`ErrorCode::Invalid`].
    pub fn from_flat<I, S>(flat: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut attrs = Attributes::new();
        let mut iter = flat.into_iter();
        while let Some(key) = iter.next() {
            let value = iter
                .next()
                .ok_or_else(|| Error::from_code(ErrorCode::Invalid))?;
            attrs.set(key.as_ref(), value.as_ref());
        }
        Ok(attrs)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_text)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overlay `other` on top of this set, as the wrapped library does when
    /// merging per-request attributes over the connection defaults.
    pub fn merge(&mut self, other: &Attributes) {
        for (k, v) in other.iter() {
            self.entries.insert(k.to_string(), v.clone());
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            attrs.set(k, v);
        }
        attrs
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Attributes
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K, V, S> From<HashMap<K, V, S>> for Attributes
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(map: HashMap<K, V, S>) -> Self {
        map.into_iter().collect()
    }
}

impl<K, V> From<BTreeMap<K, V>> for Attributes
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(map: BTreeMap<K, V>) -> Self {
        map.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
