//! Typed element handles.
//!
//! Each type is a thin wrapper over [`Element`] that dereferences to it and
//! adds the operations specific to its kind. The wrappers are as lazy as the
//! element they wrap.

mod button;
mod checkbox;
mod frame;
mod select;
mod text_field;

pub use button::Button;
pub use checkbox::{CheckBox, Radio};
pub use frame::IFrame;
pub use select::{Select, SelectOption};
pub use text_field::{FileField, TextArea, TextField, UserEditable};

use crate::element::{Attr, Element, ElementType};
use crate::registry::ElementKind;
use crate::result::WatirResult;

/// Declare a newtype handle over [`Element`] for one [`ElementKind`].
macro_rules! element_type {
    ($(#[$meta:meta])* $name:ident => $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(Element);

        impl $crate::element::ElementType for $name {
            const KIND: $crate::registry::ElementKind = $crate::registry::ElementKind::$kind;

            fn from_element(element: Element) -> Self {
                Self(element)
            }

            fn as_element(&self) -> &Element {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = Element;

            fn deref(&self) -> &Element {
                &self.0
            }
        }

        impl From<$name> for Element {
            fn from(handle: $name) -> Element {
                handle.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

pub(crate) use element_type;

element_type! {
    /// `<a>`
    Anchor => Anchor
}

element_type! {
    /// Any `<input>`; collections of inputs resolve each member's subtype
    Input => Input
}

element_type! {
    /// `<div>`
    Div => Div
}

element_type! {
    /// `<span>`
    Span => Span
}

element_type! {
    /// `<form>`
    Form => Form
}

element_type! {
    /// `<label>`
    Label => Label
}

impl Anchor {
    /// Link target
    pub fn href(&self) -> WatirResult<Option<String>> {
        self.attribute(Attr::Href)
    }
}

impl Input {
    /// `type` attribute, lower-cased; `text` when absent
    pub fn input_type(&self) -> WatirResult<String> {
        Ok(self
            .attribute(Attr::Type)?
            .map_or_else(|| "text".to_string(), |t| t.to_ascii_lowercase()))
    }
}

impl Label {
    /// Id of the control the label names
    pub fn html_for(&self) -> WatirResult<Option<String>> {
        self.attribute(Attr::HtmlFor)
    }
}

/// Kind a typed handle was created for
#[must_use]
pub fn kind_of<T: ElementType>() -> ElementKind {
    T::KIND
}
