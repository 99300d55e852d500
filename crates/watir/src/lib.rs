//! Watir: a browser automation DSL over WebDriver.
//!
//! Element handles are lazy. Creating one records *how* to find the element,
//! and the element is located when an operation needs it. Located handles
//! notice when the page replaced their node and relocate transparently.
//! Operations wait for the element to exist or be present before acting.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌────────────┐
//! │ Browser /    │   │ Element /    │   │ Selector     │   │ Driver     │
//! │ Container    │──►│ Collection   │──►│ Builder      │──►│ (WebDriver │
//! │ (DSL)        │   │ (lazy, wait) │   │ (XPath+filt) │   │  client)   │
//! └──────────────┘   └──────────────┘   └──────────────┘   └────────────┘
//! ```
//!
//! The [`Driver`] trait is the only seam to the browser. [`MockDriver`]
//! implements it in memory for tests.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

pub mod browser;
pub mod collection;
pub mod config;
mod context;
pub mod driver;
pub mod element;
pub mod elements;
mod handle_table;
pub mod locator;
pub mod mock;
pub mod registry;
pub mod result;
pub mod selector;
pub mod wait;
pub mod window;
pub mod xpath;

pub use browser::{Browser, Container, QueryScope};
pub use collection::ElementCollection;
pub use config::Config;
pub use context::ScriptValue;
pub use driver::{
    Action, Driver, DriverError, DriverResult, How, Key, Modifier, NativeRef, ScriptArg,
};
pub use element::{Attr, Element, ElementType, FlashOptions, LocateState};
pub use elements::{
    Anchor, Button, CheckBox, Div, FileField, Form, IFrame, Input, Label, Radio, Select,
    SelectOption, Span, TextArea, TextField, UserEditable,
};
pub use locator::{LocateStrategy, SelectorBuilder};
pub use mock::{MockDriver, MockNode};
pub use registry::{ElementKind, TagRegistry};
pub use result::{WatirError, WatirResult};
pub use selector::{Matcher, Selector};
pub use wait::{Wait, WaitOptions};
pub use window::{Window, WindowCollection};

/// Everything a test script usually needs
pub mod prelude {
    pub use super::browser::{Browser, Container};
    pub use super::collection::ElementCollection;
    pub use super::config::Config;
    pub use super::context::ScriptValue;
    pub use super::driver::{Driver, Key, Modifier, ScriptArg};
    pub use super::element::{Attr, Element, ElementType, FlashOptions};
    pub use super::elements::*;
    pub use super::registry::ElementKind;
    pub use super::result::{WatirError, WatirResult};
    pub use super::selector;
    pub use super::selector::{Matcher, Selector};
    pub use super::window::{Window, WindowCollection};
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Once;

    static INIT: Once = Once::new();

    /// Route `tracing` output to the test harness, once per process
    pub(crate) fn init_tracing() {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
                )
                .with_test_writer()
                .try_init();
        });
    }
}
