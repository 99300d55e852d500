//! Locate strategy resolution.
//!
//! [`SelectorBuilder`] turns a [`Selector`] into a [`LocateStrategy`]: one wire
//! query plus the in-process filters the query could not express.
//!
//! # Push-down rules
//!
//! - Exact strings on attributes, `id`, `class`, `tag_name` and `text`, and the
//!   element kind's own tag/type constraints, compile into a single XPath.
//! - `label` matches the text of a `<label for=...>` or an enclosing label
//!   (the `label` attribute for options).
//! - Regular expressions, predicates, `visible` and `visible_text` become
//!   filters over the candidates returned by that XPath.
//! - A non-negative `index` on a pure XPath query becomes `(query)[n+1]`;
//!   negative indices count from the end after filtering.
//! - `xpath`/`css` selectors are used verbatim and may only be combined with
//!   `index`, `visible`, `visible_text` and `tag_name`.

use crate::driver::{Driver, DriverError, How, NativeRef};
use crate::registry::ElementKind;
use crate::result::{WatirError, WatirResult};
use crate::selector::{Matcher, Selector};
use crate::xpath;
use std::fmt;

/// Keys that may accompany `xpath` or `css`
const EXPLICIT_COMPANIONS: [&str; 4] = ["index", "visible", "visible_text", "tag_name"];

/// Map a selector key to the HTML attribute it names.
///
/// `class_name` is `class`, `html_for` is `for`, every other underscore is a
/// hyphen (`data_foo_bar` → `data-foo-bar`).
#[must_use]
pub fn attribute_name(key: &str) -> String {
    match key {
        "class_name" => "class".to_string(),
        "html_for" => "for".to_string(),
        _ => key.replace('_', "-"),
    }
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

// ============================================================================
// Filters
// ============================================================================

/// In-process test applied to candidates after the wire query
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Attribute value against a non-exact matcher
    Attribute {
        /// HTML attribute name
        name: String,
        /// Matcher applied to the value (absent attributes never match)
        matcher: Matcher,
    },
    /// Class list: each member of the matcher must match some class token
    Class(Matcher),
    /// Rendered text
    Text(Matcher),
    /// Rendered text of a displayed element
    VisibleText(Matcher),
    /// Displayed or hidden
    Visible(bool),
    /// Lower-cased tag name
    TagName(Matcher),
    /// Text of the `<label>` naming the element (`for=` or enclosing)
    Label(Matcher),
    /// Tag and `type` must belong to a kind (used with `xpath`/`css`)
    Kind(ElementKind),
}

impl Filter {
    /// Apply the filter to one candidate
    pub fn matches(&self, driver: &dyn Driver, native: &NativeRef) -> Result<bool, DriverError> {
        match self {
            Self::Attribute { name, matcher } => Ok(driver
                .attribute(native, name)?
                .is_some_and(|value| matcher.matches(&value))),
            Self::Class(matcher) => Ok(driver
                .attribute(native, "class")?
                .is_some_and(|value| class_matches(matcher, &value))),
            Self::Text(matcher) => Ok(matcher.matches(&driver.text(native)?)),
            Self::VisibleText(matcher) => {
                Ok(driver.is_displayed(native)? && matcher.matches(&driver.text(native)?))
            }
            Self::Visible(expected) => Ok(driver.is_displayed(native)? == *expected),
            Self::TagName(matcher) => {
                Ok(matcher.matches(&driver.tag_name(native)?.to_ascii_lowercase()))
            }
            Self::Label(matcher) => label_matches(driver, native, matcher),
            Self::Kind(kind) => {
                let tag = driver.tag_name(native)?.to_ascii_lowercase();
                let input_type = if tag == "input" {
                    driver
                        .attribute(native, "type")?
                        .map(|t| t.to_ascii_lowercase())
                } else {
                    None
                };
                Ok(kind.accepts(&tag, input_type.as_deref()))
            }
        }
    }
}

fn label_matches(
    driver: &dyn Driver,
    native: &NativeRef,
    matcher: &Matcher,
) -> Result<bool, DriverError> {
    let labels = match driver.attribute(native, "id")? {
        Some(id) if !id.is_empty() => driver.find_elements(
            How::XPath,
            &format!("//label[@for={}]", xpath::escape(&id)),
            None,
        )?,
        _ => Vec::new(),
    };
    let labels = if labels.is_empty() {
        driver.find_elements(How::XPath, "./ancestor::label", Some(native))?
    } else {
        labels
    };
    for label in &labels {
        if matcher.matches(driver.text(label)?.trim()) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn class_matches(matcher: &Matcher, class_attr: &str) -> bool {
    match matcher {
        Matcher::All(list) => list.iter().all(|m| class_matches(m, class_attr)),
        Matcher::Exact(name) => match name.strip_prefix('!') {
            Some(negated) => !class_attr.split_whitespace().any(|c| c == negated),
            None => class_attr.split_whitespace().any(|c| c == name),
        },
        other => class_attr.split_whitespace().any(|c| other.matches(c)),
    }
}

// ============================================================================
// Strategy
// ============================================================================

/// Where candidates come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// A node the caller already holds
    Element(NativeRef),
    /// A wire query
    Query {
        /// Strategy
        how: How,
        /// Expression
        query: String,
    },
}

/// Resolved way to find the element(s) a selector describes
#[derive(Debug, Clone, PartialEq)]
pub struct LocateStrategy {
    plan: Plan,
    filters: Vec<Filter>,
    index: Option<i64>,
}

impl LocateStrategy {
    /// Candidate source
    #[must_use]
    pub const fn plan(&self) -> &Plan {
        &self.plan
    }

    /// The wire query, unless this strategy wraps a pre-located node
    #[must_use]
    pub fn query(&self) -> Option<(How, &str)> {
        match &self.plan {
            Plan::Query { how, query } => Some((*how, query.as_str())),
            Plan::Element(_) => None,
        }
    }

    /// In-process filters
    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Index still applied in-process (push-down consumes non-negative XPath indices)
    #[must_use]
    pub const fn index(&self) -> Option<i64> {
        self.index
    }

    /// True when the wire query alone decides the result
    #[must_use]
    pub fn is_server_side(&self) -> bool {
        self.filters.is_empty()
    }

    /// First match (or the indexed match), `None` when nothing matches
    pub fn locate(
        &self,
        driver: &dyn Driver,
        root: Option<&NativeRef>,
    ) -> WatirResult<Option<NativeRef>> {
        let (how, query) = match &self.plan {
            Plan::Element(native) => return Ok(Some(native.clone())),
            Plan::Query { how, query } => (*how, query.as_str()),
        };

        match self.index {
            None if self.filters.is_empty() => match driver.find_element(how, query, root) {
                Ok(native) => Ok(Some(native)),
                Err(DriverError::NoSuchElement(_)) => Ok(None),
                Err(err) => Err(err.into()),
            },
            None => self.candidates(driver, how, query, root)?.next().transpose(),
            Some(n) if n >= 0 => {
                let mut remaining = n;
                for candidate in self.candidates(driver, how, query, root)? {
                    let native = candidate?;
                    if remaining == 0 {
                        return Ok(Some(native));
                    }
                    remaining -= 1;
                }
                Ok(None)
            }
            Some(n) => {
                let all = self
                    .candidates(driver, how, query, root)?
                    .collect::<WatirResult<Vec<_>>>()?;
                let position = all.len() as i64 + n;
                Ok(usize::try_from(position)
                    .ok()
                    .and_then(|i| all.into_iter().nth(i)))
            }
        }
    }

    /// Every match, lazily filtered. Each call re-issues the wire query.
    pub fn locate_all<'a>(
        &'a self,
        driver: &'a dyn Driver,
        root: Option<&NativeRef>,
    ) -> WatirResult<Located<'a>> {
        if self.index.is_some() {
            return Err(WatirError::invalid_selector(
                "can't locate all elements by index",
            ));
        }
        match &self.plan {
            Plan::Element(native) => Ok(Located {
                driver,
                candidates: vec![native.clone()].into_iter(),
                filters: &[],
            }),
            Plan::Query { how, query } => self.candidates(driver, *how, query, root),
        }
    }

    fn candidates<'a>(
        &'a self,
        driver: &'a dyn Driver,
        how: How,
        query: &str,
        root: Option<&NativeRef>,
    ) -> WatirResult<Located<'a>> {
        let found = driver.find_elements(how, query, root)?;
        Ok(Located {
            driver,
            candidates: found.into_iter(),
            filters: &self.filters,
        })
    }
}

impl fmt::Display for LocateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.plan {
            Plan::Element(native) => write!(f, "element {native}")?,
            Plan::Query { how, query } => write!(f, "{how}: {query}")?,
        }
        if !self.filters.is_empty() {
            write!(f, " ({} filters)", self.filters.len())?;
        }
        if let Some(n) = self.index {
            write!(f, " [index {n}]")?;
        }
        Ok(())
    }
}

/// Lazy iterator over filtered matches.
///
/// Candidates that go stale while being filtered are skipped.
#[derive(Debug)]
pub struct Located<'a> {
    driver: &'a dyn Driver,
    candidates: std::vec::IntoIter<NativeRef>,
    filters: &'a [Filter],
}

impl Iterator for Located<'_> {
    type Item = WatirResult<NativeRef>;

    fn next(&mut self) -> Option<Self::Item> {
        'candidates: for native in self.candidates.by_ref() {
            for filter in self.filters {
                match filter.matches(self.driver, &native) {
                    Ok(true) => {}
                    Ok(false) => continue 'candidates,
                    Err(DriverError::StaleElementReference) => {
                        tracing::trace!(element = %native, "candidate went stale while filtering");
                        continue 'candidates;
                    }
                    Err(err) => return Some(Err(err.into())),
                }
            }
            return Some(Ok(native));
        }
        None
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Resolves selectors for one element kind
#[derive(Debug, Clone, Copy)]
pub struct SelectorBuilder {
    kind: ElementKind,
}

impl SelectorBuilder {
    /// Builder for `kind`
    #[must_use]
    pub const fn new(kind: ElementKind) -> Self {
        Self { kind }
    }

    /// Check key shapes and value types without building
    pub fn validate(&self, selector: &Selector) -> WatirResult<()> {
        for (key, matcher) in selector.iter() {
            if !is_valid_key(key) {
                return Err(WatirError::invalid_selector(format!(
                    "{key:?} is not a valid selector key"
                )));
            }
            let ok = match key {
                "index" => matches!(matcher, Matcher::Index(_)),
                "visible" => matches!(matcher, Matcher::Flag(_)),
                "element" => matches!(matcher, Matcher::Element(_)),
                "xpath" | "css" => matches!(matcher, Matcher::Exact(_)),
                "text" | "visible_text" | "tag_name" | "class" | "class_name" | "label" => {
                    matcher.is_textual()
                }
                _ => matcher.is_textual() || matches!(matcher, Matcher::Flag(_)),
            };
            if !ok {
                return Err(WatirError::invalid_selector(format!(
                    "expected a different kind of value for {key}, got {matcher}"
                )));
            }
        }

        let xpath = selector.contains_key("xpath");
        let css = selector.contains_key("css");
        if xpath && css {
            return Err(WatirError::invalid_selector(
                ":xpath and :css cannot be combined",
            ));
        }
        if xpath || css {
            let strategy = if xpath { "xpath" } else { "css" };
            if let Some(extra) = selector
                .keys()
                .find(|k| *k != strategy && !EXPLICIT_COMPANIONS.contains(k))
            {
                return Err(WatirError::invalid_selector(format!(
                    "{strategy} cannot be combined with {extra}"
                )));
            }
        }
        Ok(())
    }

    /// Resolve a selector into a strategy
    pub fn build(&self, selector: &Selector) -> WatirResult<LocateStrategy> {
        self.validate(selector)?;

        if let Some(native) = selector.element() {
            return Ok(LocateStrategy {
                plan: Plan::Element(native.clone()),
                filters: Vec::new(),
                index: None,
            });
        }

        let strategy = match (selector.get("xpath"), selector.get("css")) {
            (Some(Matcher::Exact(expr)), _) => self.build_explicit(How::XPath, expr, selector),
            (_, Some(Matcher::Exact(expr))) => self.build_explicit(How::Css, expr, selector),
            _ => self.build_xpath(selector),
        };
        tracing::trace!(kind = %self.kind, %selector, %strategy, "resolved selector");
        Ok(strategy)
    }

    fn build_explicit(&self, how: How, expr: &str, selector: &Selector) -> LocateStrategy {
        let mut filters = Vec::new();
        if !matches!(self.kind, ElementKind::HtmlElement) {
            filters.push(Filter::Kind(self.kind));
        }
        if let Some(m) = selector.get("tag_name") {
            filters.push(Filter::TagName(lowercase_exact(m)));
        }
        push_visibility(selector, &mut filters);
        finish(how, expr.to_string(), filters, selector.index())
    }

    fn build_xpath(&self, selector: &Selector) -> LocateStrategy {
        let mut conditions = Vec::new();
        let mut filters = Vec::new();
        if let Some(condition) = kind_condition(self.kind) {
            conditions.push(condition);
        }

        for (key, matcher) in selector.iter() {
            match key {
                "index" | "element" | "visible" | "visible_text" => {}
                "tag_name" => match matcher.as_exact() {
                    Some(tag) => conditions.push(xpath::tag_equals(tag)),
                    None => filters.push(Filter::TagName(matcher.clone())),
                },
                "text" => split_matcher(
                    matcher,
                    |s| format!("normalize-space()={}", xpath::escape(s)),
                    Filter::Text,
                    &mut conditions,
                    &mut filters,
                ),
                "class" | "class_name" => push_class(matcher, &mut conditions, &mut filters),
                "label" if self.kind == ElementKind::SelectOption => {
                    push_attribute("label", matcher, &mut conditions, &mut filters);
                }
                "label" => split_matcher(
                    matcher,
                    |s| {
                        let text = xpath::escape(s);
                        format!(
                            "(@id=//label[normalize-space()={text}]/@for or parent::label[normalize-space()={text}])"
                        )
                    },
                    Filter::Label,
                    &mut conditions,
                    &mut filters,
                ),
                _ => push_attribute(&attribute_name(key), matcher, &mut conditions, &mut filters),
            }
        }
        push_visibility(selector, &mut filters);

        let query = format!(".//*{}", xpath::and_all(&conditions));
        finish(How::XPath, query, filters, selector.index())
    }
}

fn finish(how: How, query: String, filters: Vec<Filter>, index: Option<i64>) -> LocateStrategy {
    match index {
        Some(n) if n >= 0 && how == How::XPath && filters.is_empty() => LocateStrategy {
            plan: Plan::Query {
                how,
                query: format!("({query})[{}]", n + 1),
            },
            filters,
            index: None,
        },
        _ => LocateStrategy {
            plan: Plan::Query { how, query },
            filters,
            index,
        },
    }
}

fn lowercase_exact(matcher: &Matcher) -> Matcher {
    match matcher {
        Matcher::Exact(s) => Matcher::Exact(s.to_ascii_lowercase()),
        other => other.clone(),
    }
}

fn push_visibility(selector: &Selector, filters: &mut Vec<Filter>) {
    if let Some(Matcher::Flag(visible)) = selector.get("visible") {
        filters.push(Filter::Visible(*visible));
    }
    if let Some(m) = selector.get("visible_text") {
        filters.push(Filter::VisibleText(m.clone()));
    }
}

/// Exact members become XPath conditions, the rest become filters.
fn split_matcher(
    matcher: &Matcher,
    condition: impl Fn(&str) -> String,
    filter: impl Fn(Matcher) -> Filter,
    conditions: &mut Vec<String>,
    filters: &mut Vec<Filter>,
) {
    split_members(matcher, &condition, &filter, conditions, filters);
}

fn split_members(
    matcher: &Matcher,
    condition: &dyn Fn(&str) -> String,
    filter: &dyn Fn(Matcher) -> Filter,
    conditions: &mut Vec<String>,
    filters: &mut Vec<Filter>,
) {
    match matcher {
        Matcher::Exact(s) => conditions.push(condition(s)),
        Matcher::All(list) => {
            for member in list {
                split_members(member, condition, filter, conditions, filters);
            }
        }
        other => filters.push(filter(other.clone())),
    }
}

fn push_class(matcher: &Matcher, conditions: &mut Vec<String>, filters: &mut Vec<Filter>) {
    match matcher {
        Matcher::Exact(s) => {
            for class in s.split_whitespace() {
                match class.strip_prefix('!') {
                    Some(negated) => {
                        conditions.push(format!("not({})", xpath::class_contains(negated)));
                    }
                    None => conditions.push(xpath::class_contains(class)),
                }
            }
        }
        Matcher::All(list) => {
            for member in list {
                push_class(member, conditions, filters);
            }
        }
        other => filters.push(Filter::Class(other.clone())),
    }
}

fn push_attribute(
    name: &str,
    matcher: &Matcher,
    conditions: &mut Vec<String>,
    filters: &mut Vec<Filter>,
) {
    match matcher {
        Matcher::Flag(true) => conditions.push(format!("@{name}")),
        Matcher::Flag(false) => conditions.push(format!("not(@{name})")),
        _ => split_matcher(
            matcher,
            |s| format!("@{name}={}", xpath::escape(s)),
            |m| Filter::Attribute {
                name: name.to_string(),
                matcher: m,
            },
            conditions,
            filters,
        ),
    }
}

/// XPath condition expressing a kind's tag and `type` constraints
fn kind_condition(kind: ElementKind) -> Option<String> {
    let tags = kind.tag_names();
    if tags.is_empty() {
        return None;
    }

    let type_expr = xpath::downcase("@type");
    let type_condition = kind.input_types().map(|types| match types {
        crate::registry::InputTypes::Include(list) => format!(
            "({})",
            list.iter()
                .map(|t| format!("{type_expr}={}", xpath::escape(t)))
                .collect::<Vec<_>>()
                .join(" or ")
        ),
        crate::registry::InputTypes::Exclude(list) => format!(
            "(not(@type) or ({}))",
            list.iter()
                .map(|t| format!("{type_expr}!={}", xpath::escape(t)))
                .collect::<Vec<_>>()
                .join(" and ")
        ),
    });

    let parts: Vec<String> = tags
        .iter()
        .map(|tag| match (&type_condition, *tag) {
            (Some(types), "input") => format!("({} and {types})", xpath::tag_equals(tag)),
            _ => xpath::tag_equals(tag),
        })
        .collect();

    match parts.as_slice() {
        [single] => Some(single.clone()),
        _ => Some(format!("({})", parts.join(" or "))),
    }
}
