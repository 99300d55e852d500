//! Driver - the WebDriver collaborator boundary
//!
//! Everything that crosses the wire goes through the [`Driver`] trait. The DSL
//! never speaks HTTP itself; a WebDriver client (or the scripted
//! [`MockDriver`](crate::mock::MockDriver)) implements this trait.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Browser / Element / ElementCollection (lazy DSL handles)        │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  Driver (synchronous, Send + Sync)                               │
//! │                                                                  │
//! │  ┌──────────────────────┐      ┌──────────────────────────────┐  │
//! │  │  WebDriver client    │      │  MockDriver                  │  │
//! │  │  (W3C wire protocol) │      │  (scripted, in-memory DOM)   │  │
//! │  └──────────────────────┘      └──────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any element operation may fail with [`DriverError::StaleElementReference`];
//! element handles consume that error through their relocation policy.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// JSON key the W3C protocol uses for element references in script results
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

// ============================================================================
// Native references
// ============================================================================

/// Opaque reference to a DOM node, owned by the WebDriver session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NativeRef(String);

impl NativeRef {
    /// Wrap a wire-level element id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The wire-level element id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0
    }

    /// W3C JSON form, suitable as a script argument
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert(ELEMENT_KEY.to_string(), Value::String(self.0.clone()));
        Value::Object(map)
    }

    /// Recognize a W3C element reference inside a script result
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        if map.len() != 1 {
            return None;
        }
        map.get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(Self::new)
    }
}

impl fmt::Display for NativeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(native element {})", self.0)
    }
}

// ============================================================================
// Query and action vocabulary
// ============================================================================

/// Locator strategy understood by the collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum How {
    /// XPath 1.0 expression
    XPath,
    /// CSS selector
    Css,
}

impl How {
    /// W3C strategy name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::XPath => "xpath",
            Self::Css => "css selector",
        }
    }
}

impl fmt::Display for How {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyboard modifier held during a click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    /// Shift
    Shift,
    /// Control
    Control,
    /// Alt / Option
    Alt,
    /// Meta / Command
    Meta,
}

/// Pointer action sequence handed to the collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Click, optionally with modifier keys held down
    Click {
        /// Target element
        target: NativeRef,
        /// Modifiers held for the duration of the click
        modifiers: Vec<Modifier>,
    },
    /// Double click
    DoubleClick(NativeRef),
    /// Right click
    ContextClick(NativeRef),
    /// Move the pointer over an element
    MoveTo(NativeRef),
    /// Drag one element onto another
    DragAndDrop {
        /// Dragged element
        source: NativeRef,
        /// Drop target
        target: NativeRef,
    },
    /// Drag an element by an offset
    DragAndDropBy {
        /// Dragged element
        source: NativeRef,
        /// Horizontal offset in pixels
        right_by: i64,
        /// Vertical offset in pixels
        down_by: i64,
    },
}

/// Argument passed to `execute_script`
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptArg {
    /// Plain JSON value
    Value(Value),
    /// Element reference, sent in W3C form
    Element(NativeRef),
}

impl ScriptArg {
    /// Wire form of the argument
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Value(v) => v.clone(),
            Self::Element(r) => r.to_json(),
        }
    }
}

impl From<NativeRef> for ScriptArg {
    fn from(r: NativeRef) -> Self {
        Self::Element(r)
    }
}

impl From<&str> for ScriptArg {
    fn from(s: &str) -> Self {
        Self::Value(Value::String(s.to_string()))
    }
}

impl From<String> for ScriptArg {
    fn from(s: String) -> Self {
        Self::Value(Value::String(s))
    }
}

impl From<i64> for ScriptArg {
    fn from(n: i64) -> Self {
        Self::Value(Value::from(n))
    }
}

impl From<bool> for ScriptArg {
    fn from(b: bool) -> Self {
        Self::Value(Value::Bool(b))
    }
}

impl From<Value> for ScriptArg {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

/// Special keys, encoded as the W3C private-use code points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Backspace
    Backspace,
    /// Tab
    Tab,
    /// Return
    Return,
    /// Enter
    Enter,
    /// Shift
    Shift,
    /// Control
    Control,
    /// Escape
    Escape,
    /// Space
    Space,
    /// Arrow left
    ArrowLeft,
    /// Arrow up
    ArrowUp,
    /// Arrow right
    ArrowRight,
    /// Arrow down
    ArrowDown,
    /// Delete
    Delete,
}

impl Key {
    /// The code point sent over the wire
    #[must_use]
    pub const fn code_point(self) -> char {
        match self {
            Self::Backspace => '\u{E003}',
            Self::Tab => '\u{E004}',
            Self::Return => '\u{E006}',
            Self::Enter => '\u{E007}',
            Self::Shift => '\u{E008}',
            Self::Control => '\u{E009}',
            Self::Escape => '\u{E00C}',
            Self::Space => '\u{E00D}',
            Self::ArrowLeft => '\u{E012}',
            Self::ArrowUp => '\u{E013}',
            Self::ArrowRight => '\u{E014}',
            Self::ArrowDown => '\u{E015}',
            Self::Delete => '\u{E017}',
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code_point())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors reported by the collaborator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    /// The query matched nothing
    #[error("no such element: {0}")]
    NoSuchElement(String),

    /// The referenced node is no longer attached to the current document
    #[error("stale element reference")]
    StaleElementReference,

    /// The window is gone
    #[error("no such window: {0}")]
    NoSuchWindow(String),

    /// The frame is gone or is not a frame
    #[error("no such frame: {0}")]
    NoSuchFrame(String),

    /// The element cannot accept the operation in its current state
    #[error("invalid element state: {0}")]
    InvalidElementState(String),

    /// Script raised
    #[error("javascript error: {0}")]
    JavaScript(String),

    /// Anything else the wire reported
    #[error("webdriver error: {0}")]
    Other(String),
}

/// Result type for collaborator calls
pub type DriverResult<T> = Result<T, DriverError>;

// ============================================================================
// Driver trait
// ============================================================================

/// Synchronous WebDriver collaborator.
///
/// `root` on the find operations scopes the query to a node; `None` searches the
/// current browsing context's document.
pub trait Driver: fmt::Debug + Send + Sync {
    /// First node matching the query, or [`DriverError::NoSuchElement`]
    fn find_element(&self, how: How, query: &str, root: Option<&NativeRef>)
        -> DriverResult<NativeRef>;

    /// All nodes matching the query, in document order; empty when nothing matches
    fn find_elements(
        &self,
        how: How,
        query: &str,
        root: Option<&NativeRef>,
    ) -> DriverResult<Vec<NativeRef>>;

    /// Click an element
    fn click(&self, element: &NativeRef) -> DriverResult<()>;

    /// Rendered text of an element
    fn text(&self, element: &NativeRef) -> DriverResult<String>;

    /// Tag name of an element
    fn tag_name(&self, element: &NativeRef) -> DriverResult<String>;

    /// Attribute (or property) value
    fn attribute(&self, element: &NativeRef, name: &str) -> DriverResult<Option<String>>;

    /// Computed CSS property value
    fn css_value(&self, element: &NativeRef, property: &str) -> DriverResult<String>;

    /// Whether the element is rendered
    fn is_displayed(&self, element: &NativeRef) -> DriverResult<bool>;

    /// Whether the element is enabled; also the cheapest liveness probe
    fn is_enabled(&self, element: &NativeRef) -> DriverResult<bool>;

    /// Whether an option, checkbox or radio is selected
    fn is_selected(&self, element: &NativeRef) -> DriverResult<bool>;

    /// Type into an element
    fn send_keys(&self, element: &NativeRef, keys: &str) -> DriverResult<()>;

    /// Clear an editable element
    fn clear(&self, element: &NativeRef) -> DriverResult<()>;

    /// Perform a pointer action sequence
    fn perform(&self, action: &Action) -> DriverResult<()>;

    /// Run a script in the current browsing context
    fn execute_script(&self, script: &str, args: &[ScriptArg]) -> DriverResult<Value>;

    /// The focused element
    fn active_element(&self) -> DriverResult<NativeRef>;

    /// Make a window current
    fn switch_to_window(&self, handle: &str) -> DriverResult<()>;

    /// Enter a frame of the current browsing context
    fn switch_to_frame(&self, frame: &NativeRef) -> DriverResult<()>;

    /// Leave all frames
    fn switch_to_default_content(&self) -> DriverResult<()>;

    /// Handles of all open windows
    fn window_handles(&self) -> DriverResult<Vec<String>>;

    /// Handle of the current window
    fn window_handle(&self) -> DriverResult<String>;

    /// Close the current window
    fn close_window(&self) -> DriverResult<()>;

    /// Navigate the current window
    fn navigate(&self, url: &str) -> DriverResult<()>;

    /// Go back in the current window's history
    fn back(&self) -> DriverResult<()>;

    /// Go forward in the current window's history
    fn forward(&self) -> DriverResult<()>;

    /// Reload the current page
    fn refresh(&self) -> DriverResult<()>;

    /// Serialized DOM of the current page
    fn page_source(&self) -> DriverResult<String>;

    /// URL of the current window
    fn current_url(&self) -> DriverResult<String>;

    /// Title of the current window
    fn title(&self) -> DriverResult<String>;

    /// End the session
    fn quit(&self) -> DriverResult<()>;
}
