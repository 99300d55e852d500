//! Lazy element handles.
//!
//! An [`Element`] is a description of where to find a node, not the node itself.
//! Creating one performs no I/O. The first operation locates it; later
//! operations probe the cached reference and relocate it when the page has
//! replaced the node.
//!
//! ```text
//!   Unlocated ──locate──▶ Located ──probe fails──▶ Stale
//!       ▲                    ▲                       │
//!       │                    └──────relocate─────────┤ (always_locate)
//!       └────────────────────reset───────────────────┘ (otherwise)
//! ```
//!
//! A stale reference hit in the middle of an operation is relocated and the
//! operation retried once; a second stale reference is reported as
//! [`WatirError::UnknownObject`].

use crate::config::Config;
use crate::context::{closed_window, Scope, Session};
use crate::driver::{Action, Driver, DriverError, Modifier, NativeRef, ScriptArg};
use crate::handle_table::Slot;
use crate::locator::SelectorBuilder;
use crate::registry::{ElementKind, TagRegistry};
use crate::result::{WatirError, WatirResult};
use crate::selector::Selector;
use crate::wait::Wait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Relocations allowed when an operation hits a stale reference
pub const MAX_STALE_RETRIES: u32 = 1;

/// Observable lifecycle state of a handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateState {
    /// Never located, or reset
    Unlocated,
    /// Holds a live reference
    Located(NativeRef),
    /// Holds a reference the page no longer contains
    Stale(NativeRef),
}

/// What an operation needs before it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Precondition {
    /// Located now, no waiting
    Exists,
    /// Wait until located
    WaitForExists,
    /// Wait until located and displayed
    WaitForPresent,
}

enum Lookup {
    Found(NativeRef),
    Missing,
    Stale,
}

/// Named attributes readable through [`Element::attribute`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attr {
    /// `id`
    Id,
    /// `class`
    ClassName,
    /// `title`
    Title,
    /// `name`
    Name,
    /// `value`
    Value,
    /// `href`
    Href,
    /// `type`
    Type,
    /// `src`
    Src,
    /// `alt`
    Alt,
    /// `for`
    HtmlFor,
    /// `placeholder`
    Placeholder,
    /// `role`
    Role,
    /// `lang`
    Lang,
    /// `tabindex`
    TabIndex,
    /// `style`
    Style,
}

impl Attr {
    /// HTML attribute name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::ClassName => "class",
            Self::Title => "title",
            Self::Name => "name",
            Self::Value => "value",
            Self::Href => "href",
            Self::Type => "type",
            Self::Src => "src",
            Self::Alt => "alt",
            Self::HtmlFor => "for",
            Self::Placeholder => "placeholder",
            Self::Role => "role",
            Self::Lang => "lang",
            Self::TabIndex => "tabindex",
            Self::Style => "style",
        }
    }
}

/// Options for [`Element::flash_with`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashOptions {
    /// Highlight color
    pub color: String,
    /// Number of on/off cycles
    pub flashes: u32,
    /// Pause between color changes
    pub delay: Duration,
}

impl Default for FlashOptions {
    fn default() -> Self {
        Self {
            color: "red".to_string(),
            flashes: 10,
            delay: Duration::from_millis(100),
        }
    }
}

impl FlashOptions {
    /// Default flash: ten red blinks
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the highlight color
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Set the number of blinks
    #[must_use]
    pub const fn with_flashes(mut self, flashes: u32) -> Self {
        self.flashes = flashes;
        self
    }

    /// Set the pause between color changes
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Typed views over an [`Element`]
pub trait ElementType: Clone + fmt::Debug + Send + Sync + 'static {
    /// Kind used to build queries for this type
    const KIND: ElementKind;

    /// Wrap a handle
    fn from_element(element: Element) -> Self;

    /// The wrapped handle
    fn as_element(&self) -> &Element;
}

// ============================================================================
// Element
// ============================================================================

/// Lazy handle to a DOM element
#[derive(Clone)]
pub struct Element {
    session: Arc<Session>,
    scope: Scope,
    selector: Arc<Selector>,
    kind: ElementKind,
    keyword: Option<&'static str>,
    pinned: bool,
    slot: Arc<Slot>,
}

impl ElementType for Element {
    const KIND: ElementKind = ElementKind::HtmlElement;

    fn from_element(element: Element) -> Self {
        element
    }

    fn as_element(&self) -> &Element {
        self
    }
}

impl Element {
    pub(crate) fn new(
        session: Arc<Session>,
        scope: Scope,
        selector: Selector,
        kind: ElementKind,
        keyword: Option<&'static str>,
    ) -> Self {
        let (selector, native) = selector.split_element();
        let pinned = native.is_some() && selector.is_empty();
        let slot = Arc::new(session.handles.allocate(native));
        Self {
            session,
            scope,
            selector: Arc::new(selector),
            kind,
            keyword,
            pinned,
            slot,
        }
    }

    /// Handle around a node that has no selector to relocate it by
    pub(crate) fn pinned(session: Arc<Session>, scope: Scope, native: NativeRef) -> Self {
        Self::new(
            session,
            scope,
            Selector::with_element(native),
            ElementKind::HtmlElement,
            None,
        )
    }

    /// Same description, different kind, fresh slot pre-filled with `native`
    pub(crate) fn derive(&self, kind: ElementKind, native: NativeRef) -> Self {
        Self {
            session: Arc::clone(&self.session),
            scope: self.scope.clone(),
            selector: Arc::clone(&self.selector),
            kind,
            keyword: self.keyword,
            pinned: self.pinned,
            slot: Arc::new(self.session.handles.allocate(Some(native))),
        }
    }

    pub(crate) fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub(crate) const fn scope(&self) -> &Scope {
        &self.scope
    }

    pub(crate) fn driver(&self) -> &dyn Driver {
        self.session.driver()
    }

    fn config(&self) -> Config {
        self.session.config()
    }

    fn relocatable(&self) -> bool {
        !self.pinned
    }

    // ------------------------------------------------------------------
    // Description
    // ------------------------------------------------------------------

    /// Kind this handle locates
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        self.kind
    }

    /// DSL keyword that created the handle
    #[must_use]
    pub const fn keyword(&self) -> Option<&'static str> {
        self.keyword
    }

    /// Locating selector (without the `element` escape hatch)
    #[must_use]
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Cached native reference, without touching the wire
    #[must_use]
    pub fn native(&self) -> Option<NativeRef> {
        self.slot.get()
    }

    /// Selector with its enclosing scopes, `outer --> inner`
    #[must_use]
    pub fn selector_string(&self) -> String {
        let own = if self.pinned {
            "{element: (native element)}".to_string()
        } else {
            self.selector.to_string()
        };
        format!("{}{own}", self.scope.prefix())
    }

    /// Browser this handle belongs to
    #[must_use]
    pub fn browser(&self) -> crate::browser::Browser {
        crate::browser::Browser::from_session(Arc::clone(&self.session))
    }

    // ------------------------------------------------------------------
    // Location
    // ------------------------------------------------------------------

    fn locate(&self, root: Option<&NativeRef>) -> WatirResult<Option<NativeRef>> {
        if !self.relocatable() {
            return Ok(None);
        }
        let strategy = SelectorBuilder::new(self.kind).build(&self.selector)?;
        let found = strategy.locate(self.driver(), root)?;
        tracing::debug!(
            selector = %self.selector_string(),
            kind = %self.kind,
            found = found.is_some(),
            "locate"
        );
        self.slot.set(found.clone());
        Ok(found)
    }

    /// Liveness probe; `false` means the reference is stale
    fn probe(&self, native: &NativeRef) -> WatirResult<bool> {
        match self.driver().is_enabled(native) {
            Ok(_) => Ok(true),
            Err(DriverError::StaleElementReference | DriverError::NoSuchElement(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn lookup(&self) -> WatirResult<Lookup> {
        self.lookup_in_window().map_err(closed_window)
    }

    fn lookup_in_window(&self) -> WatirResult<Lookup> {
        let root = self.scope.enter(&self.session)?;
        let Some(native) = self.slot.get() else {
            return Ok(self
                .locate(root.as_ref())?
                .map_or(Lookup::Missing, Lookup::Found));
        };

        if self.probe(&native)? {
            return Ok(Lookup::Found(native));
        }

        self.slot.set(None);
        let relocate = self.config().always_locate && self.relocatable();
        tracing::debug!(
            selector = %self.selector_string(),
            element = %native,
            relocate,
            "stale element reference"
        );
        if relocate {
            Ok(self
                .locate(root.as_ref())?
                .map_or(Lookup::Missing, Lookup::Found))
        } else {
            Ok(Lookup::Stale)
        }
    }

    /// `lookup` with a missing parent or frame reported as `Missing`
    fn lookup_quietly(&self) -> WatirResult<Lookup> {
        match self.lookup() {
            Err(err) if err.is_not_found() => Ok(Lookup::Missing),
            other => other,
        }
    }

    fn missing_error(&self) -> WatirError {
        WatirError::unknown_object(self.selector_string())
    }

    fn stale_error(&self) -> WatirError {
        WatirError::unknown_object(format!(
            "{} is stale and relocation is disabled",
            self.selector_string()
        ))
    }

    /// Locate now (relocating if stale) or fail with `UnknownObject`
    pub(crate) fn assert_exists(&self) -> WatirResult<NativeRef> {
        match self.lookup()? {
            Lookup::Found(native) => Ok(native),
            Lookup::Missing => Err(self.missing_error()),
            Lookup::Stale => Err(self.stale_error()),
        }
    }

    /// Wait for the element (and its enclosing scopes) to exist
    pub(crate) fn wait_for_exists(&self) -> WatirResult<NativeRef> {
        self.scope.wait_for_exists()?;

        let config = self.config();
        let options = config.wait_options();
        let mut found = None;
        let waited = Wait::until_ok(&options, "waiting for element to exist", || {
            match self.lookup_quietly()? {
                Lookup::Found(native) => {
                    found = Some(native);
                    Ok(true)
                }
                Lookup::Missing => Ok(false),
                Lookup::Stale => Err(self.stale_error()),
            }
        });

        match (waited, found) {
            (Ok(_), Some(native)) => Ok(native),
            (Ok(_), None) => Err(self.missing_error()),
            (Err(err), _) if err.is_timeout() => {
                if options.timeout_ms > 0 {
                    tracing::warn!(
                        selector = %self.selector_string(),
                        timeout = config.default_timeout,
                        "element did not appear before the timeout"
                    );
                }
                Err(WatirError::unknown_object(format!(
                    "{} after waiting {} seconds",
                    self.selector_string(),
                    config.default_timeout
                )))
            }
            (Err(err), _) => Err(err),
        }
    }

    /// Wait for the element to exist and be displayed
    pub(crate) fn wait_for_present(&self) -> WatirResult<NativeRef> {
        self.scope.wait_for_present()?;

        let config = self.config();
        let options = config.wait_options();
        let mut located = None;
        let mut present = None;
        let waited = Wait::until_ok(&options, "waiting for element to be present", || {
            match self.lookup_quietly()? {
                Lookup::Found(native) => {
                    located = Some(native.clone());
                    match self.driver().is_displayed(&native) {
                        Ok(true) => {
                            present = Some(native);
                            Ok(true)
                        }
                        Ok(false) | Err(DriverError::StaleElementReference) => Ok(false),
                        Err(err) => Err(err.into()),
                    }
                }
                Lookup::Missing => Ok(false),
                Lookup::Stale => Err(self.stale_error()),
            }
        });

        match (waited, present) {
            (Ok(_), Some(native)) => Ok(native),
            (Ok(_), None) => Err(self.missing_error()),
            (Err(err), _) if err.is_timeout() => {
                if options.timeout_ms > 0 {
                    tracing::warn!(
                        selector = %self.selector_string(),
                        timeout = config.default_timeout,
                        "element did not become present before the timeout"
                    );
                }
                let message = if located.is_some() {
                    format!(
                        "element located, but timed out after {} seconds, waiting for {} to be present",
                        config.default_timeout,
                        self.selector_string()
                    )
                } else {
                    format!(
                        "{} after waiting {} seconds",
                        self.selector_string(),
                        config.default_timeout
                    )
                };
                Err(WatirError::unknown_object(message))
            }
            (Err(err), _) => Err(err),
        }
    }

    fn satisfy(&self, precondition: Precondition) -> WatirResult<NativeRef> {
        match precondition {
            Precondition::Exists => self.assert_exists(),
            Precondition::WaitForExists => self.wait_for_exists(),
            Precondition::WaitForPresent => self.wait_for_present(),
        }
    }

    /// Run `op` against the located node, relocating and retrying once when
    /// the node goes stale underneath it.
    pub(crate) fn element_call<T>(
        &self,
        precondition: Precondition,
        mut op: impl FnMut(&NativeRef) -> WatirResult<T>,
    ) -> WatirResult<T> {
        let mut attempt = 0;
        loop {
            let native = self.satisfy(precondition).map_err(closed_window)?;
            match op(&native) {
                Err(err) if err.is_stale() => {
                    self.slot.set(None);
                    let retry = attempt < MAX_STALE_RETRIES
                        && self.config().always_locate
                        && self.relocatable();
                    tracing::debug!(
                        selector = %self.selector_string(),
                        attempt,
                        retry,
                        "element went stale during call"
                    );
                    if !retry {
                        return Err(WatirError::unknown_object(format!(
                            "{} went stale and could not be relocated",
                            self.selector_string()
                        )));
                    }
                    attempt += 1;
                }
                other => return other.map_err(closed_window),
            }
        }
    }

    pub(crate) fn assert_enabled(&self, native: &NativeRef) -> WatirResult<()> {
        if self.driver().is_enabled(native)? {
            Ok(())
        } else {
            Err(WatirError::ObjectDisabled {
                message: self.selector_string(),
            })
        }
    }

    pub(crate) fn assert_writable(&self, native: &NativeRef) -> WatirResult<()> {
        self.assert_enabled(native)?;
        if self.kind.is_user_editable() && self.driver().attribute(native, "readonly")?.is_some() {
            return Err(WatirError::ObjectReadOnly {
                message: self.selector_string(),
            });
        }
        Ok(())
    }

    fn script(&self, native: &NativeRef, script: &str, extra: Vec<ScriptArg>) -> WatirResult<serde_json::Value> {
        let mut args = vec![ScriptArg::Element(native.clone())];
        args.extend(extra);
        Ok(self.driver().execute_script(script, &args)?)
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// Whether the element can be located now. Never waits.
    pub fn exists(&self) -> WatirResult<bool> {
        match self.lookup_quietly() {
            Ok(Lookup::Found(_)) => Ok(true),
            Ok(Lookup::Missing | Lookup::Stale) => Ok(false),
            Err(WatirError::NoMatchingWindowFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Whether the element is displayed; fails when it does not exist
    pub fn visible(&self) -> WatirResult<bool> {
        self.element_call(Precondition::Exists, |n| Ok(self.driver().is_displayed(n)?))
    }

    /// Exists and is displayed. Never waits.
    pub fn present(&self) -> WatirResult<bool> {
        match self.visible() {
            Err(err) if err.is_not_found() => Ok(false),
            other => other,
        }
    }

    /// Whether the element is enabled
    pub fn enabled(&self) -> WatirResult<bool> {
        self.element_call(Precondition::WaitForExists, |n| Ok(self.driver().is_enabled(n)?))
    }

    /// Whether the element is disabled
    pub fn disabled(&self) -> WatirResult<bool> {
        self.enabled().map(|enabled| !enabled)
    }

    /// Whether the cached reference is stale; fails if never located
    pub fn stale(&self) -> WatirResult<bool> {
        let Some(native) = self.slot.get() else {
            return Err(WatirError::unknown_object(format!(
                "{} has not been located",
                self.selector_string()
            )));
        };
        self.scope.enter(&self.session)?;
        self.probe(&native).map(|fresh| !fresh)
    }

    /// Current lifecycle state (probes the cached reference)
    pub fn state(&self) -> WatirResult<LocateState> {
        let Some(native) = self.slot.get() else {
            return Ok(LocateState::Unlocated);
        };
        match self.scope.enter(&self.session) {
            Ok(_) => {}
            Err(err) if err.is_not_found() => return Ok(LocateState::Stale(native)),
            Err(err) => return Err(err),
        }
        if self.probe(&native)? {
            Ok(LocateState::Located(native))
        } else {
            Ok(LocateState::Stale(native))
        }
    }

    /// Drop the cached reference
    pub fn reset(&self) {
        self.slot.set(None);
    }

    /// Whether two handles refer to the same node
    pub fn same_element(&self, other: &Element) -> WatirResult<bool> {
        Ok(self.assert_exists()? == other.assert_exists()?)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Rendered text
    pub fn text(&self) -> WatirResult<String> {
        self.element_call(Precondition::WaitForExists, |n| Ok(self.driver().text(n)?))
    }

    /// Lower-cased tag name
    pub fn tag_name(&self) -> WatirResult<String> {
        self.element_call(Precondition::WaitForExists, |n| {
            Ok(self.driver().tag_name(n)?.to_ascii_lowercase())
        })
    }

    /// Any attribute by name
    pub fn attribute_value(&self, name: &str) -> WatirResult<Option<String>> {
        self.element_call(Precondition::WaitForExists, |n| {
            Ok(self.driver().attribute(n, name)?)
        })
    }

    /// Named attribute
    pub fn attribute(&self, attr: Attr) -> WatirResult<Option<String>> {
        self.attribute_value(attr.name())
    }

    /// `id`, empty when absent
    pub fn id(&self) -> WatirResult<String> {
        Ok(self.attribute(Attr::Id)?.unwrap_or_default())
    }

    /// `class`, empty when absent
    pub fn class_name(&self) -> WatirResult<String> {
        Ok(self.attribute(Attr::ClassName)?.unwrap_or_default())
    }

    /// `title`, empty when absent
    pub fn title(&self) -> WatirResult<String> {
        Ok(self.attribute(Attr::Title)?.unwrap_or_default())
    }

    /// `value`, empty when absent
    pub fn value(&self) -> WatirResult<String> {
        Ok(self.attribute(Attr::Value)?.unwrap_or_default())
    }

    /// Computed style for `property`, or the inline `style` attribute
    pub fn style(&self, property: Option<&str>) -> WatirResult<String> {
        match property {
            Some(property) => self.element_call(Precondition::WaitForExists, |n| {
                Ok(self.driver().css_value(n, property)?)
            }),
            None => Ok(self
                .attribute(Attr::Style)?
                .unwrap_or_default()
                .trim()
                .to_string()),
        }
    }

    /// `innerHTML`
    pub fn inner_html(&self) -> WatirResult<String> {
        self.element_call(Precondition::WaitForExists, |n| {
            let html = self.script(n, "return arguments[0].innerHTML", Vec::new())?;
            Ok(html.as_str().unwrap_or_default().to_string())
        })
    }

    /// `outerHTML`
    pub fn outer_html(&self) -> WatirResult<String> {
        self.element_call(Precondition::WaitForExists, |n| {
            let html = self.script(n, "return arguments[0].outerHTML", Vec::new())?;
            Ok(html.as_str().unwrap_or_default().to_string())
        })
    }

    /// Whether the element has keyboard focus
    pub fn focused(&self) -> WatirResult<bool> {
        self.element_call(Precondition::WaitForExists, |n| {
            match self.driver().active_element() {
                Ok(active) => Ok(&active == n),
                Err(DriverError::NoSuchElement(_)) => Ok(false),
                Err(err) => Err(err.into()),
            }
        })
    }

    // ------------------------------------------------------------------
    // Interactions
    // ------------------------------------------------------------------

    /// Click
    pub fn click(&self) -> WatirResult<()> {
        self.click_with(&[])
    }

    /// Click while holding modifier keys
    pub fn click_with(&self, modifiers: &[Modifier]) -> WatirResult<()> {
        self.element_call(Precondition::WaitForPresent, |n| {
            self.assert_enabled(n)?;
            if modifiers.is_empty() {
                self.driver().click(n)?;
            } else {
                self.driver().perform(&Action::Click {
                    target: n.clone(),
                    modifiers: modifiers.to_vec(),
                })?;
            }
            Ok(())
        })
    }

    /// Double click
    pub fn double_click(&self) -> WatirResult<()> {
        self.element_call(Precondition::WaitForPresent, |n| {
            Ok(self.driver().perform(&Action::DoubleClick(n.clone()))?)
        })
    }

    /// Right click
    pub fn right_click(&self) -> WatirResult<()> {
        self.element_call(Precondition::WaitForPresent, |n| {
            Ok(self.driver().perform(&Action::ContextClick(n.clone()))?)
        })
    }

    /// Move the pointer over the element
    pub fn hover(&self) -> WatirResult<()> {
        self.element_call(Precondition::WaitForPresent, |n| {
            Ok(self.driver().perform(&Action::MoveTo(n.clone()))?)
        })
    }

    /// Drag onto another element
    pub fn drag_and_drop_on(&self, other: &Element) -> WatirResult<()> {
        self.element_call(Precondition::WaitForPresent, |n| {
            let target = other.wait_for_present()?;
            Ok(self.driver().perform(&Action::DragAndDrop {
                source: n.clone(),
                target,
            })?)
        })
    }

    /// Drag by an offset in pixels
    pub fn drag_and_drop_by(&self, right_by: i64, down_by: i64) -> WatirResult<()> {
        self.element_call(Precondition::WaitForPresent, |n| {
            Ok(self.driver().perform(&Action::DragAndDropBy {
                source: n.clone(),
                right_by,
                down_by,
            })?)
        })
    }

    /// Type keys; see [`Key`](crate::driver::Key) for special keys
    pub fn send_keys(&self, keys: impl AsRef<str>) -> WatirResult<()> {
        let keys = keys.as_ref();
        self.element_call(Precondition::WaitForPresent, |n| {
            self.assert_writable(n)?;
            Ok(self.driver().send_keys(n, keys)?)
        })
    }

    /// Give the element keyboard focus
    pub fn focus(&self) -> WatirResult<()> {
        self.element_call(Precondition::WaitForPresent, |n| {
            self.script(n, "return arguments[0].focus()", Vec::new())
                .map(|_| ())
        })
    }

    /// Dispatch a DOM event (`"click"`, `"onchange"`...)
    pub fn fire_event(&self, event: &str) -> WatirResult<()> {
        let event = event
            .strip_prefix("on")
            .unwrap_or(event)
            .to_ascii_lowercase();
        self.element_call(Precondition::WaitForExists, |n| {
            self.script(
                n,
                "return arguments[0].dispatchEvent(new Event(arguments[1], {bubbles: true, cancelable: true}))",
                vec![ScriptArg::from(event.as_str())],
            )
            .map(|_| ())
        })
    }

    /// Scroll the element into view
    pub fn scroll_into_view(&self) -> WatirResult<()> {
        self.element_call(Precondition::WaitForExists, |n| {
            self.script(n, "arguments[0].scrollIntoView();", Vec::new())
                .map(|_| ())
        })
    }

    /// Blink the background color, default options
    pub fn flash(&self) -> WatirResult<&Self> {
        self.flash_with(&FlashOptions::default())
    }

    /// Blink the background color
    pub fn flash_with(&self, options: &FlashOptions) -> WatirResult<&Self> {
        let background = self.style(Some("background-color"))?;
        for i in 0..options.flashes * 2 {
            let color = if i % 2 == 0 { &options.color } else { &background };
            self.element_call(Precondition::WaitForExists, |n| {
                self.script(
                    n,
                    "arguments[0].style.backgroundColor = arguments[1]",
                    vec![ScriptArg::from(color.as_str())],
                )
            })?;
            if !options.delay.is_zero() {
                std::thread::sleep(options.delay);
            }
        }
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Waiting
    // ------------------------------------------------------------------

    /// Wait until the element is present
    pub fn wait_until_present(&self) -> WatirResult<&Self> {
        let options = self.config().wait_options();
        let message = format!("waiting for {} to become present", self.selector_string());
        Wait::until_ok(&options, &message, || self.present())?;
        Ok(self)
    }

    /// Wait until the element is no longer present
    pub fn wait_while_present(&self) -> WatirResult<&Self> {
        let options = self.config().wait_options();
        let message = format!("waiting for {} not to be present", self.selector_string());
        Wait::while_ok(&options, &message, || self.present())?;
        Ok(self)
    }

    /// Wait until `predicate` holds for this element
    pub fn wait_until<F>(&self, message: &str, mut predicate: F) -> WatirResult<&Self>
    where
        F: FnMut(&Self) -> WatirResult<bool>,
    {
        let options = self.config().wait_options();
        Wait::until_ok(&options, message, || predicate(self))?;
        Ok(self)
    }

    /// Wait while `predicate` holds for this element
    pub fn wait_while<F>(&self, message: &str, mut predicate: F) -> WatirResult<&Self>
    where
        F: FnMut(&Self) -> WatirResult<bool>,
    {
        let options = self.config().wait_options();
        Wait::while_ok(&options, message, || predicate(self))?;
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Navigation between handles
    // ------------------------------------------------------------------

    /// Read tag and `type` and resolve the precise kind
    pub(crate) fn resolve_subtype(&self) -> WatirResult<(NativeRef, ElementKind, String)> {
        self.element_call(Precondition::Exists, |n| {
            let tag = self.driver().tag_name(n)?.to_ascii_lowercase();
            let input_type = if tag == "input" {
                self.driver().attribute(n, "type")?
            } else {
                None
            };
            let kind = TagRegistry::standard().subtype_for(&tag, input_type.as_deref());
            Ok((n.clone(), kind, tag))
        })
    }

    /// Handle of the precise kind for the located node (no re-query)
    pub fn to_subtype(&self) -> WatirResult<Element> {
        let (native, kind, _) = self.resolve_subtype()?;
        Ok(self.derive(kind, native))
    }

    /// Nearest ancestor element
    pub fn parent(&self) -> WatirResult<Option<Element>> {
        self.adjacent("./ancestor::*[1]")
    }

    /// Previous sibling element
    pub fn previous_sibling(&self) -> WatirResult<Option<Element>> {
        self.adjacent("./preceding-sibling::*[1]")
    }

    /// Next sibling element
    pub fn next_sibling(&self) -> WatirResult<Option<Element>> {
        self.adjacent("./following-sibling::*[1]")
    }

    fn adjacent(&self, xpath: &str) -> WatirResult<Option<Element>> {
        self.wait_for_exists()?;
        let relative = Self::new(
            Arc::clone(&self.session),
            Scope::Element(Box::new(self.clone())),
            Selector::xpath(xpath),
            ElementKind::HtmlElement,
            None,
        );
        if relative.exists()? {
            relative.to_subtype().map(Some)
        } else {
            Ok(None)
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("kind", &self.kind)
            .field("keyword", &self.keyword)
            .field("selector", &self.selector_string())
            .field("native", &self.slot.get())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<{}: ", self.kind)?;
        if let Some(keyword) = self.keyword {
            write!(f, "keyword: {keyword} ")?;
        }
        write!(
            f,
            "located: {}; {}>",
            self.slot.get().is_some(),
            self.selector_string()
        )
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.same_element(other).unwrap_or(false)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::browser::{Browser, Container};
    use crate::config::Config;
    use crate::driver::How;
    use crate::mock::{MockDriver, MockNode};
    use crate::selector;

    fn setup(config: Config) -> (Arc<MockDriver>, Browser) {
        let mock = Arc::new(MockDriver::new());
        let browser = Browser::with_config(mock.clone(), config);
        (mock, browser)
    }

    fn quick() -> Config {
        Config::new().with_default_timeout(0.0)
    }

    fn xpath_for(kind: ElementKind, selector: &Selector) -> String {
        SelectorBuilder::new(kind)
            .build(selector)
            .unwrap()
            .query()
            .unwrap()
            .1
            .to_string()
    }

    mod creation_tests {
        use super::*;

        #[test]
        fn test_creation_performs_no_io() {
            let (mock, browser) = setup(quick());
            mock.clear_history();
            let el = browser.element(selector!(id: "later"));
            assert!(mock.history().is_empty());
            assert_eq!(el.native(), None);
            assert_eq!(el.state().unwrap(), LocateState::Unlocated);
        }

        #[test]
        fn test_display_and_selector_string() {
            let (_, browser) = setup(quick());
            let button = browser.button(selector!(id: "go"));
            assert_eq!(
                button.to_string(),
                "#<Button: keyword: button located: false; {id: \"go\"}>"
            );
            let nested = browser.div(selector!(id: "outer")).span(selector!(index: 1));
            assert_eq!(nested.selector_string(), "{id: \"outer\"} --> {index: 1}");
        }
    }

    mod existence_tests {
        use super::*;

        #[test]
        fn test_exists_is_false_for_missing_elements() {
            let (_, browser) = setup(quick());
            assert!(!browser.element(selector!(id: "ghost")).exists().unwrap());
        }

        #[test]
        fn test_closed_window_is_reported_as_such() {
            let (mock, browser) = setup(quick());
            let sel = selector!(id: "x");
            let node = mock.add(MockNode::new("div").text("here"));
            mock.respond(How::XPath, xpath_for(ElementKind::HtmlElement, &sel), vec![node]);

            let located = browser.element(sel.clone());
            assert_eq!(located.text().unwrap(), "here");
            mock.close_window().unwrap();

            assert!(!located.exists().unwrap());
            assert!(!browser.element(selector!(id: "other")).exists().unwrap());
            assert!(matches!(
                located.text().unwrap_err(),
                WatirError::NoMatchingWindowFound { .. }
            ));
            assert!(matches!(
                browser.element(sel).click().unwrap_err(),
                WatirError::NoMatchingWindowFound { .. }
            ));
        }

        #[test]
        fn test_repeated_exists_performs_one_lookup() {
            let (mock, browser) = setup(quick());
            let sel = selector!(id: "x");
            let node = mock.add(MockNode::new("div").attr("id", "x"));
            mock.respond(How::XPath, xpath_for(ElementKind::HtmlElement, &sel), vec![node]);

            let el = browser.element(sel);
            assert!(el.exists().unwrap());
            assert!(el.exists().unwrap());
            assert_eq!(mock.call_count("find_element"), 1);
            assert_eq!(mock.call_count("is_enabled"), 1);
        }

        #[test]
        fn test_clones_share_the_located_reference() {
            let (mock, browser) = setup(quick());
            let sel = selector!(id: "x");
            let node = mock.add(MockNode::new("div"));
            mock.respond(How::XPath, xpath_for(ElementKind::HtmlElement, &sel), vec![node.clone()]);

            let el = browser.element(sel);
            let copy = el.clone();
            el.exists().unwrap();
            assert_eq!(copy.native(), Some(node));
        }

        #[test]
        fn test_invalid_selector_surfaces_immediately() {
            let (_, browser) = setup(Config::new().with_default_timeout(30.0));
            let el = browser.element(selector!(xpath: "//p", id: "x"));
            let start = std::time::Instant::now();
            assert!(matches!(
                el.text().unwrap_err(),
                WatirError::InvalidSelector { .. }
            ));
            assert!(start.elapsed() < Duration::from_secs(5));
        }

        #[test]
        fn test_missing_element_reports_selector() {
            let (_, browser) = setup(quick());
            let err = browser.element(selector!(id: "nope")).text().unwrap_err();
            assert!(err.is_not_found());
            assert!(err.to_string().contains("{id: \"nope\"}"));
        }

        #[test]
        fn test_present_and_visible() {
            let (mock, browser) = setup(quick());
            let sel = selector!(id: "h");
            let node = mock.add(MockNode::new("div").hidden());
            mock.respond(How::XPath, xpath_for(ElementKind::HtmlElement, &sel), vec![node]);
            let el = browser.element(sel);
            assert!(el.exists().unwrap());
            assert!(!el.visible().unwrap());
            assert!(!el.present().unwrap());
            assert!(!browser.element(selector!(id: "none")).present().unwrap());
            assert!(browser.element(selector!(id: "none")).visible().unwrap_err().is_not_found());
        }
    }

    mod staleness_tests {
        use super::*;

        fn rerender(mock: &MockDriver, old: &NativeRef, query: &str) -> NativeRef {
            mock.detach(old);
            let fresh = mock.add(MockNode::new("p").text("fresh"));
            mock.respond(How::XPath, query, vec![fresh.clone()]);
            fresh
        }

        #[test]
        fn test_stale_reference_is_relocated() {
            let (mock, browser) = setup(quick());
            let sel = selector!(class: "msg");
            let query = xpath_for(ElementKind::HtmlElement, &sel);
            let r1 = mock.add(MockNode::new("p").text("old"));
            mock.respond(How::XPath, query.clone(), vec![r1.clone()]);

            let el = browser.element(sel);
            assert_eq!(el.text().unwrap(), "old");
            assert_eq!(el.state().unwrap(), LocateState::Located(r1.clone()));

            let r2 = rerender(&mock, &r1, &query);
            assert_eq!(el.state().unwrap(), LocateState::Stale(r1));
            assert!(el.stale().unwrap());
            assert_eq!(el.text().unwrap(), "fresh");
            assert_eq!(el.state().unwrap(), LocateState::Located(r2));
        }

        #[test]
        fn test_stale_without_relocation_fails_then_recovers() {
            let (mock, browser) = setup(quick().with_always_locate(false));
            let sel = selector!(class: "msg");
            let query = xpath_for(ElementKind::HtmlElement, &sel);
            let r1 = mock.add(MockNode::new("p").text("old"));
            mock.respond(How::XPath, query.clone(), vec![r1.clone()]);

            let el = browser.element(sel);
            el.text().unwrap();
            rerender(&mock, &r1, &query);

            assert!(el.text().unwrap_err().is_not_found());
            assert_eq!(el.state().unwrap(), LocateState::Unlocated);
            assert_eq!(el.text().unwrap(), "fresh");
        }

        #[test]
        fn test_stale_during_call_is_retried_once() {
            let (mock, browser) = setup(quick());
            let sel = selector!(id: "b");
            let query = xpath_for(ElementKind::HtmlElement, &sel);
            let node = mock.add(MockNode::new("p").text("hi"));
            mock.respond(How::XPath, query, vec![node]);

            let el = browser.element(sel);
            mock.fail_next("text", DriverError::StaleElementReference);
            assert_eq!(el.text().unwrap(), "hi");
            assert_eq!(mock.call_count("text:"), 2);
        }

        #[test]
        fn test_second_consecutive_stale_is_unknown_object() {
            let (mock, browser) = setup(quick());
            let sel = selector!(id: "b");
            let query = xpath_for(ElementKind::HtmlElement, &sel);
            let node = mock.add(MockNode::new("p").text("hi"));
            mock.respond(How::XPath, query, vec![node]);

            let el = browser.element(sel);
            mock.fail_next("text", DriverError::StaleElementReference);
            mock.fail_next("text", DriverError::StaleElementReference);
            let err = el.text().unwrap_err();
            assert!(matches!(err, WatirError::UnknownObject { .. }));
            assert_eq!(mock.call_count("text:"), 2);
        }

        #[test]
        fn test_stale_during_call_without_relocation_is_not_retried() {
            let (mock, browser) = setup(quick().with_always_locate(false));
            let sel = selector!(id: "b");
            let node = mock.add(MockNode::new("p").text("hi"));
            mock.respond(How::XPath, xpath_for(ElementKind::HtmlElement, &sel), vec![node]);

            let el = browser.element(sel);
            mock.fail_next("text", DriverError::StaleElementReference);
            assert!(el.text().unwrap_err().is_not_found());
            assert_eq!(mock.call_count("text:"), 1);
        }

        #[test]
        fn test_pinned_handles_cannot_relocate() {
            let (mock, browser) = setup(quick());
            let node = mock.add(MockNode::new("p"));
            let el = browser.element(Selector::with_element(node.clone()));
            assert!(el.exists().unwrap());
            mock.detach(&node);
            assert!(!el.exists().unwrap());
            assert_eq!(mock.call_count("find_"), 0);
        }

        #[test]
        fn test_reset_forces_a_new_lookup() {
            let (mock, browser) = setup(quick());
            let sel = selector!(id: "x");
            let node = mock.add(MockNode::new("div"));
            mock.respond(How::XPath, xpath_for(ElementKind::HtmlElement, &sel), vec![node]);
            let el = browser.element(sel);
            el.exists().unwrap();
            el.reset();
            assert_eq!(el.state().unwrap(), LocateState::Unlocated);
            el.exists().unwrap();
            assert_eq!(mock.call_count("find_element"), 2);
        }

        #[test]
        fn test_stale_on_never_located_handle_errors() {
            let (_, browser) = setup(quick());
            assert!(browser.element(selector!(id: "x")).stale().is_err());
        }
    }

    mod interaction_tests {
        use super::*;

        #[test]
        fn test_disabled_button_click() {
            let (mock, browser) = setup(quick());
            let sel = selector!(id: "save");
            let node = mock.add(MockNode::new("button").disabled());
            mock.respond(How::XPath, xpath_for(ElementKind::Button, &sel), vec![node]);

            let err = browser.button(sel).click().unwrap_err();
            assert!(matches!(err, WatirError::ObjectDisabled { .. }));
            assert!(!mock.was_called("click:"));
        }

        #[test]
        fn test_click_with_modifiers_uses_actions() {
            let (mock, browser) = setup(quick());
            let sel = selector!(id: "a");
            let node = mock.add(MockNode::new("a"));
            mock.respond(How::XPath, xpath_for(ElementKind::HtmlElement, &sel), vec![node]);
            browser
                .element(sel)
                .click_with(&[Modifier::Shift])
                .unwrap();
            assert!(mock.was_called("perform:click:"));
        }

        #[test]
        fn test_hidden_element_is_not_clicked() {
            let (mock, browser) = setup(quick());
            let sel = selector!(id: "h");
            let node = mock.add(MockNode::new("div").hidden());
            mock.respond(How::XPath, xpath_for(ElementKind::HtmlElement, &sel), vec![node]);
            let err = browser.element(sel).click().unwrap_err();
            assert!(err.to_string().contains("element located, but timed out"));
        }

        #[test]
        fn test_send_keys_guards() {
            let (mock, browser) = setup(quick());
            let ro = selector!(id: "ro");
            let node = mock.add(MockNode::new("input").attr("readonly", "readonly"));
            mock.respond(How::XPath, xpath_for(ElementKind::TextField, &ro), vec![node]);
            assert!(matches!(
                browser.text_field(ro).send_keys("x").unwrap_err(),
                WatirError::ObjectReadOnly { .. }
            ));

            let off = selector!(id: "off");
            let node = mock.add(MockNode::new("input").disabled());
            mock.respond(How::XPath, xpath_for(ElementKind::TextField, &off), vec![node]);
            assert!(matches!(
                browser.text_field(off).send_keys("x").unwrap_err(),
                WatirError::ObjectDisabled { .. }
            ));
        }

        #[test]
        fn test_pointer_actions() {
            let (mock, browser) = setup(quick());
            let a = selector!(id: "a");
            let b = selector!(id: "b");
            let na = mock.add(MockNode::new("div"));
            let nb = mock.add(MockNode::new("div"));
            mock.respond(How::XPath, xpath_for(ElementKind::HtmlElement, &a), vec![na]);
            mock.respond(How::XPath, xpath_for(ElementKind::HtmlElement, &b), vec![nb]);
            let source = browser.element(a);
            let target = browser.element(b);
            source.double_click().unwrap();
            source.right_click().unwrap();
            source.hover().unwrap();
            source.drag_and_drop_on(&target).unwrap();
            source.drag_and_drop_by(10, -5).unwrap();
            for action in ["double_click", "context_click", "move_to", "drag_and_drop:", "drag_and_drop_by"] {
                assert!(mock.was_called(&format!("perform:{action}")), "{action}");
            }
        }

        #[test]
        fn test_focus_and_focused() {
            let (mock, browser) = setup(quick());
            let sel = selector!(id: "f");
            let node = mock.add(MockNode::new("input"));
            mock.respond(How::XPath, xpath_for(ElementKind::HtmlElement, &sel), vec![node]);
            let el = browser.element(sel);
            assert!(!el.focused().unwrap());
            el.focus().unwrap();
            assert!(el.focused().unwrap());
        }

        #[test]
        fn test_fire_event_strips_on_prefix() {
            let (mock, browser) = setup(quick());
            let sel = selector!(id: "f");
            let node = mock.add(MockNode::new("input"));
            mock.respond(How::XPath, xpath_for(ElementKind::HtmlElement, &sel), vec![node]);
            browser.element(sel).fire_event("onChange").unwrap();
            assert!(mock.was_called("execute_script:return arguments[0].dispatchEvent"));
        }

        #[test]
        fn test_flash_restores_background() {
            let (mock, browser) = setup(quick());
            let sel = selector!(id: "f");
            let node = mock.add(MockNode::new("div").style("background-color", "white"));
            mock.respond(How::XPath, xpath_for(ElementKind::HtmlElement, &sel), vec![node]);
            let el = browser.element(sel);
            el.flash_with(&FlashOptions::new().with_flashes(2).with_delay(Duration::ZERO))
                .unwrap();
            assert_eq!(mock.call_count("execute_script:arguments[0].style.backgroundColor"), 4);
        }
    }

    mod read_tests {
        use super::*;

        #[test]
        fn test_attributes_and_html() {
            let (mock, browser) = setup(quick());
            let sel = selector!(id: "x");
            let node = mock.add(
                MockNode::new("DIV")
                    .attr("id", "x")
                    .attr("class", "a b")
                    .attr("style", " color: red; ")
                    .style("color", "rgb(255, 0, 0)"),
            );
            mock.respond(How::XPath, xpath_for(ElementKind::HtmlElement, &sel), vec![node]);
            mock.set_script_result("innerHTML", serde_json::json!("<b>x</b>"));
            let el = browser.element(sel);
            assert_eq!(el.tag_name().unwrap(), "div");
            assert_eq!(el.id().unwrap(), "x");
            assert_eq!(el.class_name().unwrap(), "a b");
            assert_eq!(el.attribute(Attr::Title).unwrap(), None);
            assert_eq!(el.title().unwrap(), "");
            assert_eq!(el.style(None).unwrap(), "color: red;");
            assert_eq!(el.style(Some("color")).unwrap(), "rgb(255, 0, 0)");
            assert_eq!(el.inner_html().unwrap(), "<b>x</b>");
            assert!(el.enabled().unwrap());
        }
    }

    mod subtype_tests {
        use super::*;

        #[test]
        fn test_to_subtype_shares_reference_without_requery() {
            let (mock, browser) = setup(quick());
            let sel = selector!(name: "agree");
            let node = mock.add(MockNode::new("input").attr("type", "checkbox"));
            mock.respond(How::XPath, xpath_for(ElementKind::HtmlElement, &sel), vec![node.clone()]);

            let el = browser.element(sel);
            el.exists().unwrap();
            let finds = mock.call_count("find_");
            let sub = el.to_subtype().unwrap();
            assert_eq!(sub.kind(), ElementKind::CheckBox);
            assert_eq!(sub.native(), Some(node));
            assert_eq!(mock.call_count("find_"), finds);
        }

        #[test]
        fn test_parent_and_siblings() {
            let (mock, browser) = setup(quick());
            let sel = selector!(id: "mid");
            let mid = mock.add(MockNode::new("span"));
            let parent = mock.add(MockNode::new("div"));
            let next = mock.add(MockNode::new("a"));
            mock.respond(How::XPath, xpath_for(ElementKind::HtmlElement, &sel), vec![mid.clone()]);
            mock.respond_within(&mid, How::XPath, "./ancestor::*[1]", vec![parent.clone()]);
            mock.respond_within(&mid, How::XPath, "./following-sibling::*[1]", vec![next.clone()]);

            let el = browser.element(sel);
            let up = el.parent().unwrap().unwrap();
            assert_eq!(up.kind(), ElementKind::Div);
            assert_eq!(up.native(), Some(parent));
            let right = el.next_sibling().unwrap().unwrap();
            assert_eq!(right.kind(), ElementKind::Anchor);
            assert!(el.previous_sibling().unwrap().is_none());
        }

        #[test]
        fn test_equality_is_same_node() {
            let (mock, browser) = setup(quick());
            let a = selector!(id: "a");
            let b = selector!(name: "a");
            let node = mock.add(MockNode::new("div"));
            mock.respond(How::XPath, xpath_for(ElementKind::HtmlElement, &a), vec![node.clone()]);
            mock.respond(How::XPath, xpath_for(ElementKind::HtmlElement, &b), vec![node]);
            assert_eq!(browser.element(a.clone()), browser.element(b));
            assert_ne!(browser.element(a), browser.element(selector!(id: "other")));
        }
    }

    mod wait_tests {
        use super::*;

        #[test]
        fn test_wait_until_present_times_out_quickly_with_zero_timeout() {
            let (_, browser) = setup(quick());
            let el = browser.element(selector!(id: "never"));
            assert!(el.wait_until_present().unwrap_err().is_timeout());
            assert!(el.wait_while_present().is_ok());
        }

        #[test]
        fn test_wait_until_predicate() {
            let (mock, browser) = setup(quick());
            let sel = selector!(id: "t");
            let node = mock.add(MockNode::new("p").text("done"));
            mock.respond(How::XPath, xpath_for(ElementKind::HtmlElement, &sel), vec![node]);
            let el = browser.element(sel);
            el.wait_until("text to be done", |e| Ok(e.text()? == "done"))
                .unwrap();
            assert!(el
                .wait_while("text to change", |e| Ok(e.text()? == "done"))
                .unwrap_err()
                .is_timeout());
        }

        #[test]
        fn test_element_appearing_during_wait() {
            let (mock, browser) = setup(
                Config::new()
                    .with_default_timeout(5.0)
                    .with_poll_interval(0.01),
            );
            let sel = selector!(id: "late");
            let query = xpath_for(ElementKind::HtmlElement, &sel);
            let el = browser.element(sel);

            let writer = Arc::clone(&mock);
            let handle = std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(50));
                let node = writer.add(MockNode::new("p").text("arrived"));
                writer.respond(How::XPath, query, vec![node]);
            });
            assert_eq!(el.text().unwrap(), "arrived");
            handle.join().unwrap();
        }

        #[test]
        fn test_timed_out_wait_names_the_selector() {
            crate::test_support::init_tracing();
            let (_, browser) = setup(
                Config::new()
                    .with_default_timeout(0.05)
                    .with_poll_interval(0.01),
            );
            let err = browser.element(selector!(id: "absent")).click().unwrap_err();
            assert!(err.is_not_found());
            let message = err.to_string();
            assert!(message.contains("{id: \"absent\"}"));
            assert!(message.contains("after waiting 0.05 seconds"));
        }
    }
}
