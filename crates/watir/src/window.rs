//! Browser windows.
//!
//! Window handles are located lazily like elements. A selector may name a
//! window by `handle`, by a fragment of its `title` or `url` (or a regex), by
//! an `element` it contains, and narrow the matches with `index`. Probing
//! title, url or element switches through the candidate windows and returns
//! to the window that was current before.

use crate::context::{window_error, Session};
use crate::driver::DriverError;
use crate::result::{WatirError, WatirResult};
use crate::selector::{Matcher, Selector};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Keys a window selector may use
pub const WINDOW_KEYS: [&str; 5] = ["title", "url", "index", "handle", "element"];

pub(crate) fn validate(selector: &Selector) -> WatirResult<()> {
    for (key, matcher) in selector.iter() {
        if !WINDOW_KEYS.contains(&key) {
            return Err(WatirError::invalid_selector(format!(
                "invalid window selector: {selector}"
            )));
        }
        let ok = match key {
            "index" => matches!(matcher, Matcher::Index(_)),
            "element" => matches!(matcher, Matcher::Element(_)),
            _ => matcher.is_textual(),
        };
        if !ok {
            return Err(WatirError::invalid_selector(format!(
                "expected a different kind of value for window {key}, got {matcher}"
            )));
        }
    }
    Ok(())
}

/// Exact strings match as fragments, like an unanchored pattern
fn fragment_matches(matcher: &Matcher, value: &str) -> bool {
    match matcher {
        Matcher::Exact(fragment) => value.contains(fragment.as_str()),
        Matcher::All(list) => list.iter().all(|m| fragment_matches(m, value)),
        other => other.matches(value),
    }
}

fn needs_switch(selector: &Selector) -> bool {
    ["title", "url", "element"]
        .iter()
        .any(|k| selector.contains_key(k))
}

/// Run `f` in window `handle`, then return to the window that was current
fn within<T>(
    session: &Session,
    handle: &str,
    f: impl FnOnce() -> WatirResult<T>,
) -> WatirResult<T> {
    let driver = session.driver();
    let previous = driver.window_handle().ok();
    driver.switch_to_window(handle).map_err(window_error)?;
    session.reset_context();
    let result = f();
    if let Some(previous) = previous.filter(|p| p != handle) {
        // the previous window may have been closed by `f`
        if driver.switch_to_window(&previous).is_ok() {
            session.reset_context();
        }
    }
    result
}

fn matches(session: &Session, selector: &Selector, handle: &str) -> WatirResult<bool> {
    if let Some(m) = selector.get("handle") {
        if !m.matches(handle) {
            return Ok(false);
        }
    }
    if !needs_switch(selector) {
        return Ok(true);
    }
    let probe = within(session, handle, || {
        let driver = session.driver();
        if let Some(m) = selector.get("title") {
            if !fragment_matches(m, &driver.title()?) {
                return Ok(false);
            }
        }
        if let Some(m) = selector.get("url") {
            if !fragment_matches(m, &driver.current_url()?) {
                return Ok(false);
            }
        }
        if let Some(native) = selector.element() {
            match driver.is_enabled(native) {
                Ok(_) => {}
                Err(DriverError::StaleElementReference | DriverError::NoSuchElement(_)) => {
                    return Ok(false)
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(true)
    });
    match probe {
        // the window closed while we were looking
        Err(WatirError::NoMatchingWindowFound { .. }) => Ok(false),
        Err(WatirError::Driver(DriverError::NoSuchWindow(_))) => Ok(false),
        other => other,
    }
}

fn matching_handles(session: &Session, selector: &Selector) -> WatirResult<Vec<String>> {
    let handles = session.driver().window_handles().map_err(window_error)?;
    let mut found = Vec::new();
    for handle in handles {
        if matches(session, selector, &handle)? {
            found.push(handle);
        }
    }
    Ok(found)
}

// ============================================================================
// Window
// ============================================================================

/// Lazy handle to a browser window
pub struct Window {
    session: Arc<Session>,
    selector: Selector,
    handle: Mutex<Option<String>>,
}

impl Window {
    pub(crate) fn new(session: Arc<Session>, selector: Selector) -> WatirResult<Self> {
        validate(&selector)?;
        Ok(Self {
            session,
            selector,
            handle: Mutex::new(None),
        })
    }

    pub(crate) fn with_handle(session: Arc<Session>, handle: String) -> Self {
        Self {
            session,
            selector: Selector::new().with("handle", handle.as_str()),
            handle: Mutex::new(Some(handle)),
        }
    }

    fn cached(&self) -> MutexGuard<'_, Option<String>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Selector the window was requested with
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    fn locate(&self) -> WatirResult<Option<String>> {
        if let Some(handle) = self.cached().clone() {
            return Ok(Some(handle));
        }
        self.session.assert_open()?;
        let found = if self.selector.is_empty() {
            Some(
                self.session
                    .driver()
                    .window_handle()
                    .map_err(window_error)?,
            )
        } else {
            let matching = matching_handles(&self.session, &self.selector)?;
            match self.selector.index() {
                None => matching.into_iter().next(),
                Some(n) if n >= 0 => usize::try_from(n)
                    .ok()
                    .and_then(|i| matching.into_iter().nth(i)),
                Some(n) => {
                    let position = i64::try_from(matching.len()).unwrap_or(i64::MAX) + n;
                    usize::try_from(position)
                        .ok()
                        .and_then(|i| matching.into_iter().nth(i))
                }
            }
        };
        tracing::debug!(selector = %self.selector, handle = ?found, "locate window");
        self.cached().clone_from(&found);
        Ok(found)
    }

    fn assert_exists(&self) -> WatirResult<String> {
        self.locate()?
            .ok_or_else(|| WatirError::NoMatchingWindowFound {
                message: self.selector.to_string(),
            })
    }

    /// Window handle
    pub fn handle(&self) -> WatirResult<String> {
        self.assert_exists()
    }

    /// Whether the window is open
    pub fn exists(&self) -> WatirResult<bool> {
        let Some(handle) = self.locate()? else {
            return Ok(false);
        };
        let open = self
            .session
            .driver()
            .window_handles()
            .map_err(window_error)?;
        Ok(open.contains(&handle))
    }

    /// Alias of [`exists`](Self::exists); windows have no visibility
    pub fn present(&self) -> WatirResult<bool> {
        self.exists()
    }

    /// Whether the driver is currently in this window
    pub fn is_current(&self) -> WatirResult<bool> {
        let handle = self.assert_exists()?;
        match self.session.driver().window_handle() {
            Ok(current) => Ok(current == handle),
            Err(DriverError::NoSuchWindow(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Make this the driver's current window
    pub fn use_window(&self) -> WatirResult<&Self> {
        self.session.assert_open()?;
        let handle = self.assert_exists()?;
        self.session
            .driver()
            .switch_to_window(&handle)
            .map_err(window_error)?;
        self.session.reset_context();
        tracing::debug!(%handle, "switched window");
        Ok(self)
    }

    /// Close the window, staying in the current one when it is another
    pub fn close(&self) -> WatirResult<()> {
        let handle = self.assert_exists()?;
        within(&self.session, &handle, || {
            Ok(self.session.driver().close_window().map_err(window_error)?)
        })
    }

    /// Window title
    pub fn title(&self) -> WatirResult<String> {
        let handle = self.assert_exists()?;
        within(&self.session, &handle, || {
            Ok(self.session.driver().title().map_err(window_error)?)
        })
    }

    /// Window URL
    pub fn url(&self) -> WatirResult<String> {
        let handle = self.assert_exists()?;
        within(&self.session, &handle, || {
            Ok(self.session.driver().current_url().map_err(window_error)?)
        })
    }
}

impl Clone for Window {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            selector: self.selector.clone(),
            handle: Mutex::new(self.cached().clone()),
        }
    }
}

impl PartialEq for Window {
    fn eq(&self, other: &Self) -> bool {
        match (self.locate(), other.locate()) {
            (Ok(Some(a)), Ok(Some(b))) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("selector", &self.selector.to_string())
            .field("handle", &*self.cached())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<Window: located: {}; {}>", self.cached().is_some(), self.selector)
    }
}

// ============================================================================
// WindowCollection
// ============================================================================

/// Windows matching a selector, memoized on first read
pub struct WindowCollection {
    session: Arc<Session>,
    selector: Selector,
    memo: Mutex<Option<Vec<Window>>>,
}

impl WindowCollection {
    pub(crate) fn new(session: Arc<Session>, selector: Selector) -> WatirResult<Self> {
        validate(&selector)?;
        if selector.contains_key("index") {
            return Err(WatirError::invalid_selector(
                "can't select a window collection by index",
            ));
        }
        Ok(Self {
            session,
            selector,
            memo: Mutex::new(None),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<Vec<Window>>> {
        self.memo.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn materialize(&self) -> WatirResult<Vec<Window>> {
        if let Some(windows) = self.lock().as_ref() {
            return Ok(windows.clone());
        }
        self.session.assert_open()?;
        let windows: Vec<_> = matching_handles(&self.session, &self.selector)?
            .into_iter()
            .map(|handle| Window::with_handle(Arc::clone(&self.session), handle))
            .collect();
        *self.lock() = Some(windows.clone());
        Ok(windows)
    }

    /// Matching windows
    pub fn to_vec(&self) -> WatirResult<Vec<Window>> {
        self.materialize()
    }

    /// Number of matching windows
    pub fn len(&self) -> WatirResult<usize> {
        Ok(self.materialize()?.len())
    }

    /// True when no window matches
    pub fn is_empty(&self) -> WatirResult<bool> {
        Ok(self.materialize()?.is_empty())
    }

    /// Window at `index` (negative counts from the end); windows are unordered
    pub fn at(&self, index: i64) -> WatirResult<Option<Window>> {
        let windows = self.materialize()?;
        let position = if index < 0 {
            i64::try_from(windows.len()).unwrap_or(i64::MAX) + index
        } else {
            index
        };
        Ok(usize::try_from(position)
            .ok()
            .and_then(|i| windows.get(i).cloned()))
    }

    /// Forget the memoized windows
    pub fn reset(&self) {
        *self.lock() = None;
    }
}

impl fmt::Debug for WindowCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowCollection")
            .field("selector", &self.selector.to_string())
            .finish_non_exhaustive()
    }
}
