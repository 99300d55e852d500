//! Tag and subtype registry.
//!
//! Maps HTML tag names, `<input type>` values and DSL keywords to an
//! [`ElementKind`]. The standard table is built once by [`TagRegistryBuilder`]
//! and is read-only afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// `<input type>` values that render as buttons
pub const BUTTON_TYPES: [&str; 4] = ["button", "reset", "submit", "image"];

/// `<input type>` values that are not text fields
pub const NON_TEXT_TYPES: [&str; 8] = [
    "button", "reset", "submit", "image", "checkbox", "radio", "file", "hidden",
];

/// Closed set of element kinds the DSL knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// Any element
    HtmlElement,
    /// `<a>`
    Anchor,
    /// `<body>`
    Body,
    /// `<button>` or a button-like `<input>`
    Button,
    /// `<input type="checkbox">`
    CheckBox,
    /// `<div>`
    Div,
    /// `<input type="file">`
    FileField,
    /// `<form>`
    Form,
    /// `<h1>` to `<h6>`
    Heading,
    /// `<iframe>` or `<frame>`
    IFrame,
    /// `<img>`
    Image,
    /// Any `<input>`
    Input,
    /// `<label>`
    Label,
    /// `<li>`
    ListItem,
    /// `<p>`
    Paragraph,
    /// `<input type="radio">`
    Radio,
    /// `<select>`
    Select,
    /// `<option>`
    SelectOption,
    /// `<span>`
    Span,
    /// `<table>`
    Table,
    /// `<td>` or `<th>`
    TableCell,
    /// `<tr>`
    TableRow,
    /// `<textarea>`
    TextArea,
    /// `<input>` of any text-like type
    TextField,
}

/// How a kind constrains the `type` attribute of `<input>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTypes {
    /// `type` must be one of these
    Include(&'static [&'static str]),
    /// `type` must be absent or none of these
    Exclude(&'static [&'static str]),
}

impl InputTypes {
    /// Whether a (lower-cased) `type` value satisfies the constraint
    #[must_use]
    pub fn accepts(self, input_type: Option<&str>) -> bool {
        match (self, input_type) {
            (Self::Include(list), Some(t)) => list.contains(&t),
            (Self::Include(_), None) => false,
            (Self::Exclude(list), Some(t)) => !list.contains(&t),
            (Self::Exclude(_), None) => true,
        }
    }
}

impl ElementKind {
    /// Human-readable kind name, as printed by `inspect`
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HtmlElement => "HTMLElement",
            Self::Anchor => "Anchor",
            Self::Body => "Body",
            Self::Button => "Button",
            Self::CheckBox => "CheckBox",
            Self::Div => "Div",
            Self::FileField => "FileField",
            Self::Form => "Form",
            Self::Heading => "Heading",
            Self::IFrame => "IFrame",
            Self::Image => "Image",
            Self::Input => "Input",
            Self::Label => "Label",
            Self::ListItem => "ListItem",
            Self::Paragraph => "Paragraph",
            Self::Radio => "Radio",
            Self::Select => "Select",
            Self::SelectOption => "Option",
            Self::Span => "Span",
            Self::Table => "Table",
            Self::TableCell => "TableCell",
            Self::TableRow => "TableRow",
            Self::TextArea => "TextArea",
            Self::TextField => "TextField",
        }
    }

    /// Tag names this kind may carry; empty for [`ElementKind::HtmlElement`]
    #[must_use]
    pub const fn tag_names(self) -> &'static [&'static str] {
        match self {
            Self::HtmlElement => &[],
            Self::Anchor => &["a"],
            Self::Body => &["body"],
            Self::Button => &["button", "input"],
            Self::CheckBox | Self::FileField | Self::Input | Self::Radio | Self::TextField => {
                &["input"]
            }
            Self::Div => &["div"],
            Self::Form => &["form"],
            Self::Heading => &["h1", "h2", "h3", "h4", "h5", "h6"],
            Self::IFrame => &["iframe", "frame"],
            Self::Image => &["img"],
            Self::Label => &["label"],
            Self::ListItem => &["li"],
            Self::Paragraph => &["p"],
            Self::Select => &["select"],
            Self::SelectOption => &["option"],
            Self::Span => &["span"],
            Self::Table => &["table"],
            Self::TableCell => &["td", "th"],
            Self::TableRow => &["tr"],
            Self::TextArea => &["textarea"],
        }
    }

    /// Constraint on `<input type>`, for the kinds realized by `<input>`
    #[must_use]
    pub const fn input_types(self) -> Option<InputTypes> {
        match self {
            Self::Button => Some(InputTypes::Include(&BUTTON_TYPES)),
            Self::CheckBox => Some(InputTypes::Include(&["checkbox"])),
            Self::Radio => Some(InputTypes::Include(&["radio"])),
            Self::FileField => Some(InputTypes::Include(&["file"])),
            Self::TextField => Some(InputTypes::Exclude(&NON_TEXT_TYPES)),
            _ => None,
        }
    }

    /// Generic kinds whose collections resolve each member to a subtype
    #[must_use]
    pub const fn is_generic(self) -> bool {
        matches!(self, Self::HtmlElement | Self::Input)
    }

    /// Kinds that accept typed text and honor `readonly`
    #[must_use]
    pub const fn is_user_editable(self) -> bool {
        matches!(self, Self::TextField | Self::TextArea)
    }

    /// Whether a node with this (lower-cased) tag and `type` belongs to the kind
    #[must_use]
    pub fn accepts(self, tag: &str, input_type: Option<&str>) -> bool {
        let tags = self.tag_names();
        if tags.is_empty() {
            return true;
        }
        if !tags.contains(&tag) {
            return false;
        }
        // a <button> is a Button whatever its type
        if tag != "input" {
            return true;
        }
        self.input_types()
            .map_or(true, |types| types.accepts(input_type))
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Tag, input-type and keyword tables
#[derive(Debug, Clone)]
pub struct TagRegistry {
    by_tag: HashMap<String, ElementKind>,
    by_input_type: HashMap<String, ElementKind>,
    by_keyword: HashMap<String, ElementKind>,
}

/// Builder for [`TagRegistry`]
#[derive(Debug, Clone, Default)]
pub struct TagRegistryBuilder {
    by_tag: HashMap<String, ElementKind>,
    by_input_type: HashMap<String, ElementKind>,
    by_keyword: HashMap<String, ElementKind>,
}

impl TagRegistryBuilder {
    /// Empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a tag name to a kind
    #[must_use]
    pub fn tag(mut self, tag: &str, kind: ElementKind) -> Self {
        self.by_tag.insert(tag.to_ascii_lowercase(), kind);
        self
    }

    /// Map an `<input type>` value to a kind
    #[must_use]
    pub fn input_type(mut self, input_type: &str, kind: ElementKind) -> Self {
        self.by_input_type
            .insert(input_type.to_ascii_lowercase(), kind);
        self
    }

    /// Map a DSL keyword to a kind
    #[must_use]
    pub fn keyword(mut self, keyword: &str, kind: ElementKind) -> Self {
        self.by_keyword.insert(keyword.to_string(), kind);
        self
    }

    /// Freeze the tables
    #[must_use]
    pub fn build(self) -> TagRegistry {
        TagRegistry {
            by_tag: self.by_tag,
            by_input_type: self.by_input_type,
            by_keyword: self.by_keyword,
        }
    }
}

impl TagRegistry {
    /// Start a custom registry
    #[must_use]
    pub fn builder() -> TagRegistryBuilder {
        TagRegistryBuilder::new()
    }

    /// The process-wide standard registry
    pub fn standard() -> &'static Self {
        static STANDARD: OnceLock<TagRegistry> = OnceLock::new();
        STANDARD.get_or_init(Self::build_standard)
    }

    fn build_standard() -> Self {
        use ElementKind as K;

        let mut builder = Self::builder();
        let kinds = [
            K::Anchor,
            K::Body,
            K::Div,
            K::Form,
            K::Heading,
            K::IFrame,
            K::Image,
            K::Input,
            K::Label,
            K::ListItem,
            K::Paragraph,
            K::Select,
            K::SelectOption,
            K::Span,
            K::Table,
            K::TableCell,
            K::TableRow,
            K::TextArea,
        ];
        for kind in kinds {
            for tag in kind.tag_names() {
                builder = builder.tag(tag, kind);
            }
        }

        for t in BUTTON_TYPES {
            builder = builder.input_type(t, K::Button);
        }

        builder
            .tag("button", K::Button)
            .input_type("checkbox", K::CheckBox)
            .input_type("radio", K::Radio)
            .input_type("file", K::FileField)
            .keyword("element", K::HtmlElement)
            .keyword("a", K::Anchor)
            .keyword("link", K::Anchor)
            .keyword("body", K::Body)
            .keyword("button", K::Button)
            .keyword("checkbox", K::CheckBox)
            .keyword("div", K::Div)
            .keyword("file_field", K::FileField)
            .keyword("form", K::Form)
            .keyword("iframe", K::IFrame)
            .keyword("image", K::Image)
            .keyword("input", K::Input)
            .keyword("label", K::Label)
            .keyword("li", K::ListItem)
            .keyword("p", K::Paragraph)
            .keyword("radio", K::Radio)
            .keyword("select_list", K::Select)
            .keyword("option", K::SelectOption)
            .keyword("span", K::Span)
            .keyword("table", K::Table)
            .keyword("td", K::TableCell)
            .keyword("tr", K::TableRow)
            .keyword("textarea", K::TextArea)
            .keyword("text_field", K::TextField)
            .build()
    }

    /// Kind for a tag name; unknown tags are generic elements
    #[must_use]
    pub fn kind_for_tag(&self, tag: &str) -> ElementKind {
        self.by_tag
            .get(&tag.to_ascii_lowercase())
            .copied()
            .unwrap_or(ElementKind::HtmlElement)
    }

    /// Kind for an `<input type>`; unknown or missing types are text fields
    #[must_use]
    pub fn kind_for_input_type(&self, input_type: Option<&str>) -> ElementKind {
        input_type
            .and_then(|t| self.by_input_type.get(&t.to_ascii_lowercase()))
            .copied()
            .unwrap_or(ElementKind::TextField)
    }

    /// Kind registered for a DSL keyword
    #[must_use]
    pub fn kind_for_keyword(&self, keyword: &str) -> Option<ElementKind> {
        self.by_keyword.get(keyword).copied()
    }

    /// Precise kind for a node. Total: every input yields a kind.
    #[must_use]
    pub fn subtype_for(&self, tag: &str, input_type: Option<&str>) -> ElementKind {
        match self.kind_for_tag(tag) {
            ElementKind::Input => self.kind_for_input_type(input_type),
            kind => kind,
        }
    }
}

/// [`TagRegistry::subtype_for`] on the standard registry
#[must_use]
pub fn subtype_for(tag: &str, input_type: Option<&str>) -> ElementKind {
    TagRegistry::standard().subtype_for(tag, input_type)
}
