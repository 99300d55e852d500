//! Browsing context management.
//!
//! A WebDriver session has exactly one current browsing context (a window and,
//! optionally, a frame inside it). Every handle remembers the [`Scope`] it was
//! created in and makes that context current before it touches the wire, since
//! any earlier call may have switched somewhere else.

use crate::config::Config;
use crate::driver::{Driver, DriverError, NativeRef, ScriptArg};
use crate::element::Element;
use crate::elements::IFrame;
use crate::handle_table::HandleTable;
use crate::result::{WatirError, WatirResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

// ============================================================================
// Session
// ============================================================================

/// State shared by a browser and every handle created from it
#[derive(Debug)]
pub(crate) struct Session {
    driver: Arc<dyn Driver>,
    config: RwLock<Config>,
    pub(crate) handles: Arc<HandleTable>,
    in_frame: AtomicBool,
    closed: AtomicBool,
    original_window: Mutex<Option<String>>,
}

impl Session {
    pub(crate) fn new(driver: Arc<dyn Driver>, config: Config) -> Arc<Self> {
        Arc::new(Self {
            driver,
            config: RwLock::new(config),
            handles: HandleTable::new(),
            in_frame: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            original_window: Mutex::new(None),
        })
    }

    pub(crate) fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    pub(crate) fn driver_arc(&self) -> Arc<dyn Driver> {
        Arc::clone(&self.driver)
    }

    pub(crate) fn config(&self) -> Config {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn update_config(&self, f: impl FnOnce(&mut Config)) {
        f(&mut self.config.write().unwrap_or_else(PoisonError::into_inner));
    }

    pub(crate) fn assert_open(&self) -> WatirResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(WatirError::invalid_state("browser was closed"));
        }
        Ok(())
    }

    pub(crate) fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Leave any frame the driver is in
    pub(crate) fn ensure_default_context(&self) -> WatirResult<()> {
        self.assert_open()?;
        if self.in_frame.load(Ordering::SeqCst) {
            self.driver
                .switch_to_default_content()
                .map_err(window_error)?;
            self.in_frame.store(false, Ordering::SeqCst);
            tracing::trace!("switched to default content");
        }
        Ok(())
    }

    pub(crate) fn entered_frame(&self) {
        self.in_frame.store(true, Ordering::SeqCst);
    }

    /// A window switch or navigation lands in a top-level document
    pub(crate) fn reset_context(&self) {
        self.in_frame.store(false, Ordering::SeqCst);
    }

    /// Window the session started in, recorded on first request
    pub(crate) fn original_window(&self) -> WatirResult<String> {
        let mut original = self
            .original_window
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = original.as_ref() {
            return Ok(handle.clone());
        }
        let handle = self.driver.window_handle().map_err(window_error)?;
        *original = Some(handle.clone());
        Ok(handle)
    }

    pub(crate) fn record_original_window(&self) {
        // a driver without a current window simply has no original yet
        let _ = self.original_window();
    }
}

/// Map a vanished window to the DSL error
pub(crate) fn window_error(err: DriverError) -> WatirError {
    match err {
        DriverError::NoSuchWindow(handle) => WatirError::NoMatchingWindowFound {
            message: format!("window {handle} is no longer open"),
        },
        other => other.into(),
    }
}

/// `window_error` for errors already lifted out of the driver
pub(crate) fn closed_window(err: WatirError) -> WatirError {
    match err {
        WatirError::Driver(err @ DriverError::NoSuchWindow(_)) => window_error(err),
        other => other,
    }
}

// ============================================================================
// Scope
// ============================================================================

/// Where a handle's queries run
#[derive(Debug, Clone)]
pub(crate) enum Scope {
    /// Top-level document of the current window
    Browser,
    /// Descendants of an element
    Element(Box<Element>),
    /// Document inside a frame
    Frame(Box<IFrame>),
}

impl Scope {
    /// Make this scope's context current; returns the query root, if any
    pub(crate) fn enter(&self, session: &Session) -> WatirResult<Option<NativeRef>> {
        match self {
            Self::Browser => {
                session.ensure_default_context()?;
                Ok(None)
            }
            Self::Element(parent) => parent.assert_exists().map(Some),
            Self::Frame(frame) => {
                frame.switch_to()?;
                Ok(None)
            }
        }
    }

    /// Wait for every enclosing handle to exist, outermost first
    pub(crate) fn wait_for_exists(&self) -> WatirResult<()> {
        match self {
            Self::Browser => Ok(()),
            Self::Element(parent) => parent.wait_for_exists().map(|_| ()),
            Self::Frame(frame) => frame.wait_for_exists().map(|_| ()),
        }
    }

    /// Wait for every enclosing handle to be present, outermost first
    pub(crate) fn wait_for_present(&self) -> WatirResult<()> {
        match self {
            Self::Browser => Ok(()),
            Self::Element(parent) => parent.wait_for_present().map(|_| ()),
            Self::Frame(frame) => frame.wait_for_exists().map(|_| ()),
        }
    }

    /// Scope of the document that contains this scope's nodes
    pub(crate) fn document(&self) -> Self {
        match self {
            Self::Browser | Self::Frame(_) => self.clone(),
            Self::Element(parent) => parent.scope().document(),
        }
    }

    /// `parent --> ` prefix for selector strings
    pub(crate) fn prefix(&self) -> String {
        match self {
            Self::Browser => String::new(),
            Self::Element(parent) => format!("{} --> ", parent.selector_string()),
            Self::Frame(frame) => format!("{} --> ", frame.selector_string()),
        }
    }
}

// ============================================================================
// Scripts
// ============================================================================

/// Script result with element references turned into handles
#[derive(Debug, Clone)]
pub enum ScriptValue {
    /// `null` / `undefined`
    Null,
    /// Boolean
    Bool(bool),
    /// Number
    Number(serde_json::Number),
    /// String
    String(String),
    /// Element reference
    Element(Element),
    /// Array
    List(Vec<ScriptValue>),
    /// Object
    Map(BTreeMap<String, ScriptValue>),
}

impl ScriptValue {
    pub(crate) fn from_json(value: Value, session: &Arc<Session>, scope: &Scope) -> Self {
        if let Some(native) = NativeRef::from_json(&value) {
            return Self::Element(Element::pinned(Arc::clone(session), scope.clone(), native));
        }
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(
                items
                    .into_iter()
                    .map(|v| Self::from_json(v, session, scope))
                    .collect(),
            ),
            Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_json(v, session, scope)))
                    .collect(),
            ),
        }
    }

    /// String content, if this is a string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean content, if this is a boolean
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric content as `f64`
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Element handle, if this is an element
    #[must_use]
    pub const fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Items, if this is an array
    #[must_use]
    pub fn as_list(&self) -> Option<&[ScriptValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// True for `null`
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Run a script in `scope`'s document and rehydrate element references
pub(crate) fn run_script(
    session: &Arc<Session>,
    scope: &Scope,
    script: &str,
    args: &[ScriptArg],
) -> WatirResult<ScriptValue> {
    let document = scope.document();
    document.enter(session)?;
    let value = session.driver().execute_script(script, args)?;
    Ok(ScriptValue::from_json(value, session, &document))
}
