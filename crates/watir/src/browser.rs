//! Browser root and the element DSL.
//!
//! [`Browser`] wraps one WebDriver session. Everything that can contain
//! elements (the browser, an element, a frame) implements [`Container`], whose
//! methods create lazy handles scoped to it:
//!
//! ```no_run
//! use std::sync::Arc;
//! use watir::prelude::*;
//!
//! # fn run(driver: Arc<dyn Driver>) -> WatirResult<()> {
//! let browser = Browser::new(driver);
//! browser.goto("https://example.com/login")?;
//! browser.text_field(selector!(name: "user")).set("ferris")?;
//! browser.button(selector!(text: "Sign in")).click()?;
//! # Ok(())
//! # }
//! ```

use crate::collection::ElementCollection;
use crate::config::{self, Config};
use crate::context::{run_script, window_error, Scope, ScriptValue, Session};
use crate::driver::{Driver, DriverError, DriverResult, ScriptArg};
use crate::element::{Element, ElementType};
use crate::elements::{
    Anchor, Button, CheckBox, Div, FileField, Form, IFrame, Input, Label, Radio, Select,
    SelectOption, Span, TextArea, TextField,
};
use crate::registry::ElementKind;
use crate::result::{WatirError, WatirResult};
use crate::selector::Selector;
use crate::wait::Wait;
use crate::window::{Window, WindowCollection};
use std::sync::Arc;

// ============================================================================
// Container
// ============================================================================

/// Where a [`Container`] creates its handles
#[derive(Debug, Clone)]
pub struct QueryScope {
    session: Arc<Session>,
    scope: Scope,
}

impl QueryScope {
    pub(crate) const fn new(session: Arc<Session>, scope: Scope) -> Self {
        Self { session, scope }
    }

    fn one<T: ElementType>(self, keyword: &'static str, selector: Selector) -> T {
        T::from_element(Element::new(
            self.session,
            self.scope,
            selector,
            T::KIND,
            Some(keyword),
        ))
    }

    fn many<T: ElementType>(self, keyword: &'static str, selector: Selector) -> ElementCollection<T> {
        ElementCollection::new(self.session, self.scope, selector, T::KIND, Some(keyword))
    }
}

macro_rules! dsl {
    ($($(#[$meta:meta])* $one:ident, $many:ident => $ty:ty;)+) => {
        $(
            $(#[$meta])*
            fn $one(&self, selector: Selector) -> $ty {
                self.query_scope().one(stringify!($one), selector)
            }

            $(#[$meta])*
            fn $many(&self, selector: Selector) -> ElementCollection<$ty> {
                self.query_scope().many(stringify!($many), selector)
            }
        )+
    };
}

/// Element DSL shared by the browser, elements and frames.
///
/// Every method is lazy: it returns a handle without talking to the driver.
pub trait Container {
    /// Session and scope new handles belong to
    #[doc(hidden)]
    fn query_scope(&self) -> QueryScope;

    /// Handle of an explicit kind, without a DSL keyword
    fn element_of(&self, kind: ElementKind, selector: Selector) -> Element {
        let QueryScope { session, scope } = self.query_scope();
        Element::new(session, scope, selector, kind, None)
    }

    /// Collection of an explicit kind
    fn elements_of<T: ElementType>(
        &self,
        kind: ElementKind,
        selector: Selector,
    ) -> ElementCollection<T> {
        let QueryScope { session, scope } = self.query_scope();
        ElementCollection::new(session, scope, selector, kind, None)
    }

    dsl! {
        /// Any element
        element, elements => Element;
        /// `<button>` and button-like inputs
        button, buttons => Button;
        /// Checkboxes
        checkbox, checkboxes => CheckBox;
        /// Radio buttons
        radio, radios => Radio;
        /// Text inputs
        text_field, text_fields => TextField;
        /// `<textarea>`
        textarea, textareas => TextArea;
        /// File inputs
        file_field, file_fields => FileField;
        /// `<select>`
        select_list, select_lists => Select;
        /// `<option>`
        option, options => SelectOption;
        /// Links
        link, links => Anchor;
        /// Inputs of any type
        input, inputs => Input;
        /// `<div>`
        div, divs => Div;
        /// `<span>`
        span, spans => Span;
        /// `<form>`
        form, forms => Form;
        /// `<label>`
        label, labels => Label;
        /// `<iframe>` and `<frame>`
        iframe, iframes => IFrame;
    }

    /// `<a>`, same as [`link`](Container::link)
    fn a(&self, selector: Selector) -> Anchor {
        self.query_scope().one("a", selector)
    }
}

impl Container for Element {
    fn query_scope(&self) -> QueryScope {
        QueryScope::new(
            Arc::clone(self.session()),
            Scope::Element(Box::new(self.clone())),
        )
    }
}

// ============================================================================
// Browser
// ============================================================================

/// One automated browser session
#[derive(Debug, Clone)]
pub struct Browser {
    session: Arc<Session>,
}

impl Container for Browser {
    fn query_scope(&self) -> QueryScope {
        QueryScope::new(Arc::clone(&self.session), Scope::Browser)
    }
}

impl Browser {
    /// Drive `driver` with the process-wide default [`Config`]
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self::with_config(driver, config::defaults())
    }

    /// Drive `driver` with a session-specific [`Config`]
    #[must_use]
    pub fn with_config(driver: Arc<dyn Driver>, config: Config) -> Self {
        let session = Session::new(driver, config);
        session.record_original_window();
        tracing::debug!(config = ?session.config(), "browser session started");
        Self { session }
    }

    pub(crate) fn from_session(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// The underlying driver
    #[must_use]
    pub fn driver(&self) -> Arc<dyn Driver> {
        self.session.driver_arc()
    }

    // ------------------------------------------------------------------
    // Page
    // ------------------------------------------------------------------

    /// Navigate the current window
    pub fn goto(&self, url: &str) -> WatirResult<()> {
        self.session.assert_open()?;
        self.session.driver().navigate(url).map_err(window_error)?;
        self.session.reset_context();
        tracing::debug!(url, "navigated");
        Ok(())
    }

    /// URL of the current window
    pub fn url(&self) -> WatirResult<String> {
        self.session.ensure_default_context()?;
        self.session.driver().current_url().map_err(window_error)
    }

    /// Title of the current window
    pub fn title(&self) -> WatirResult<String> {
        self.session.ensure_default_context()?;
        self.session.driver().title().map_err(window_error)
    }

    /// Go back one page
    pub fn back(&self) -> WatirResult<()> {
        self.navigate_with("back", |driver| driver.back())
    }

    /// Go forward one page
    pub fn forward(&self) -> WatirResult<()> {
        self.navigate_with("forward", |driver| driver.forward())
    }

    /// Reload the current page
    pub fn refresh(&self) -> WatirResult<()> {
        self.navigate_with("refresh", |driver| driver.refresh())
    }

    fn navigate_with(
        &self,
        action: &'static str,
        step: impl FnOnce(&dyn Driver) -> DriverResult<()>,
    ) -> WatirResult<()> {
        self.session.assert_open()?;
        step(self.session.driver()).map_err(window_error)?;
        self.session.reset_context();
        tracing::debug!(action, "navigated");
        Ok(())
    }

    /// Text of the page body
    pub fn text(&self) -> WatirResult<String> {
        self.element_of(ElementKind::Body, Selector::new()).text()
    }

    /// Markup of the current page
    pub fn html(&self) -> WatirResult<String> {
        self.session.ensure_default_context()?;
        self.session.driver().page_source().map_err(window_error)
    }

    /// Run a script in the top-level document.
    ///
    /// Element references in the result come back as [`Element`] handles.
    pub fn execute_script(&self, script: &str, args: &[ScriptArg]) -> WatirResult<ScriptValue> {
        run_script(&self.session, &Scope::Browser, script, args)
    }

    // ------------------------------------------------------------------
    // Windows
    // ------------------------------------------------------------------

    /// Windows matching `selector`
    pub fn windows(&self, selector: Selector) -> WatirResult<WindowCollection> {
        WindowCollection::new(Arc::clone(&self.session), selector)
    }

    /// Window matching `selector`; an empty selector means the current window
    pub fn window(&self, selector: Selector) -> WatirResult<Window> {
        Window::new(Arc::clone(&self.session), selector)
    }

    /// Window the session started in
    pub fn original_window(&self) -> WatirResult<Window> {
        let handle = self.session.original_window()?;
        Ok(Window::with_handle(Arc::clone(&self.session), handle))
    }

    /// Switch to a window other than the current one, waiting for one to open
    pub fn switch_window(&self) -> WatirResult<Window> {
        self.session.assert_open()?;
        let driver = self.session.driver();
        let current = driver.window_handle().ok();
        let options = self.session.config().wait_options();
        let mut other = None;
        let waited = Wait::until_ok(&options, "waiting for another window", || {
            let handles = driver.window_handles().map_err(window_error)?;
            other = handles.into_iter().find(|h| Some(h) != current.as_ref());
            Ok(other.is_some())
        });
        match (waited, other) {
            (Ok(_), Some(handle)) => {
                let window = Window::with_handle(Arc::clone(&self.session), handle);
                window.use_window()?;
                Ok(window)
            }
            (Err(err), _) if !err.is_timeout() => Err(err),
            _ => Err(WatirError::NoMatchingWindowFound {
                message: "no other window to switch to".to_string(),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Snapshot of this session's configuration
    #[must_use]
    pub fn config(&self) -> Config {
        self.session.config()
    }

    /// Replace this session's configuration
    pub fn set_config(&self, config: Config) -> WatirResult<()> {
        config.validate()?;
        self.session.update_config(|c| *c = config);
        Ok(())
    }

    /// Toggle transparent relocation of stale elements
    pub fn set_always_locate(&self, always_locate: bool) {
        self.session.update_config(|c| c.always_locate = always_locate);
    }

    /// Seconds to wait for elements; `0` disables waiting
    pub fn set_default_timeout(&self, seconds: f64) -> WatirResult<()> {
        let config = self.config().with_default_timeout(seconds);
        self.set_config(config)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// End the session; later calls fail with `InvalidState`
    pub fn close(&self) -> WatirResult<()> {
        if self.session.is_closed() {
            return Ok(());
        }
        self.session.driver().quit()?;
        self.session.mark_closed();
        tracing::debug!("browser session closed");
        Ok(())
    }

    /// Whether [`close`](Self::close) was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    /// Open and still showing a window. Never waits.
    pub fn exists(&self) -> WatirResult<bool> {
        if self.session.is_closed() {
            return Ok(false);
        }
        let driver = self.session.driver();
        let current = match driver.window_handle() {
            Ok(handle) => handle,
            Err(DriverError::NoSuchWindow(_)) => return Ok(false),
            Err(err) => return Err(err.into()),
        };
        Ok(driver.window_handles()?.contains(&current))
    }

    /// Wait until `predicate` holds
    pub fn wait_until<F>(&self, message: &str, mut predicate: F) -> WatirResult<&Self>
    where
        F: FnMut(&Self) -> WatirResult<bool>,
    {
        let options = self.session.config().wait_options();
        Wait::until_ok(&options, message, || predicate(self))?;
        Ok(self)
    }

    /// Wait while `predicate` holds
    pub fn wait_while<F>(&self, message: &str, mut predicate: F) -> WatirResult<&Self>
    where
        F: FnMut(&Self) -> WatirResult<bool>,
    {
        let options = self.session.config().wait_options();
        Wait::while_ok(&options, message, || predicate(self))?;
        Ok(self)
    }
}
