//! Selector model: an ordered map of keys to matchers.
//!
//! ```
//! use watir::selector;
//! use regex::Regex;
//!
//! let sel = selector!(id: "submit", class: vec!["btn", "primary"], index: 2);
//! assert_eq!(sel.len(), 3);
//!
//! let re = selector!(text: Regex::new("^Sign").unwrap(), data_role: "login");
//! assert!(re.get("text").unwrap().is_regex());
//! ```

use crate::driver::NativeRef;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Caller-supplied test over a string value
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>);

impl Predicate {
    /// Wrap a closure
    pub fn new(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Apply the predicate
    #[must_use]
    pub fn test(&self, value: &str) -> bool {
        (self.0)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Value side of a selector entry
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Exact string equality
    Exact(String),
    /// Regular expression search
    Regex(Regex),
    /// Arbitrary predicate
    Predicate(Predicate),
    /// Every member must match
    All(Vec<Matcher>),
    /// Integer, used by `index`
    Index(i64),
    /// Boolean, used by `visible` and attribute presence
    Flag(bool),
    /// Pre-located native reference, used by `element`
    Element(NativeRef),
}

impl Matcher {
    /// Build a predicate matcher from a closure
    pub fn predicate(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Predicate::new(f))
    }

    /// Test a string value.
    ///
    /// Non-string matchers (`Index`, `Flag`, `Element`) never match text.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Exact(s) => s == value,
            Self::Regex(re) => re.is_match(value),
            Self::Predicate(p) => p.test(value),
            Self::All(list) => list.iter().all(|m| m.matches(value)),
            Self::Index(_) | Self::Flag(_) | Self::Element(_) => false,
        }
    }

    /// The string, when this is an exact matcher
    #[must_use]
    pub fn as_exact(&self) -> Option<&str> {
        match self {
            Self::Exact(s) => Some(s),
            _ => None,
        }
    }

    /// True for exact strings and lists made only of exact strings
    #[must_use]
    pub fn is_exact(&self) -> bool {
        match self {
            Self::Exact(_) => true,
            Self::All(list) => list.iter().all(Self::is_exact),
            _ => false,
        }
    }

    /// True for regular expressions
    #[must_use]
    pub const fn is_regex(&self) -> bool {
        matches!(self, Self::Regex(_))
    }

    /// True for the matchers that can be applied to text
    #[must_use]
    pub fn is_textual(&self) -> bool {
        match self {
            Self::Exact(_) | Self::Regex(_) | Self::Predicate(_) => true,
            Self::All(list) => list.iter().all(Self::is_textual),
            Self::Index(_) | Self::Flag(_) | Self::Element(_) => false,
        }
    }
}

impl PartialEq for Matcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Exact(a), Self::Exact(b)) => a == b,
            (Self::Regex(a), Self::Regex(b)) => a.as_str() == b.as_str(),
            (Self::Predicate(a), Self::Predicate(b)) => a == b,
            (Self::All(a), Self::All(b)) => a == b,
            (Self::Index(a), Self::Index(b)) => a == b,
            (Self::Flag(a), Self::Flag(b)) => a == b,
            (Self::Element(a), Self::Element(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(s) => write!(f, "{s:?}"),
            Self::Regex(re) => write!(f, "/{}/", re.as_str()),
            Self::Predicate(_) => f.write_str("<predicate>"),
            Self::All(list) => {
                f.write_str("[")?;
                for (i, m) in list.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{m}")?;
                }
                f.write_str("]")
            }
            Self::Index(n) => write!(f, "{n}"),
            Self::Flag(b) => write!(f, "{b}"),
            Self::Element(r) => write!(f, "{r}"),
        }
    }
}

impl From<&str> for Matcher {
    fn from(s: &str) -> Self {
        Self::Exact(s.to_string())
    }
}

impl From<String> for Matcher {
    fn from(s: String) -> Self {
        Self::Exact(s)
    }
}

impl From<&String> for Matcher {
    fn from(s: &String) -> Self {
        Self::Exact(s.clone())
    }
}

impl From<Regex> for Matcher {
    fn from(re: Regex) -> Self {
        Self::Regex(re)
    }
}

impl From<Predicate> for Matcher {
    fn from(p: Predicate) -> Self {
        Self::Predicate(p)
    }
}

impl From<i64> for Matcher {
    fn from(n: i64) -> Self {
        Self::Index(n)
    }
}

impl From<i32> for Matcher {
    fn from(n: i32) -> Self {
        Self::Index(i64::from(n))
    }
}

impl From<usize> for Matcher {
    fn from(n: usize) -> Self {
        Self::Index(n as i64)
    }
}

impl From<bool> for Matcher {
    fn from(b: bool) -> Self {
        Self::Flag(b)
    }
}

impl From<NativeRef> for Matcher {
    fn from(r: NativeRef) -> Self {
        Self::Element(r)
    }
}

impl<T: Into<Matcher>> From<Vec<T>> for Matcher {
    fn from(list: Vec<T>) -> Self {
        Self::All(list.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Matcher>, const N: usize> From<[T; N]> for Matcher {
    fn from(list: [T; N]) -> Self {
        Self::All(list.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// Selector
// ============================================================================

/// Ordered map of selector keys to matchers.
///
/// Immutable once built: every builder method returns a new selector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    entries: Vec<(String, Matcher)>,
}

impl Selector {
    /// Empty selector (matches any element of the requested kind)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selector with a single `xpath` entry
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::new().with("xpath", expr.into())
    }

    /// Selector with a single `css` entry
    #[must_use]
    pub fn css(expr: impl Into<String>) -> Self {
        Self::new().with("css", expr.into())
    }

    /// Selector wrapping an already located node
    #[must_use]
    pub fn with_element(native: NativeRef) -> Self {
        Self::new().with("element", native)
    }

    /// Add or replace an entry; a replaced key keeps its position
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Matcher>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Copy with `index` set
    #[must_use]
    pub fn with_index(&self, index: i64) -> Self {
        self.clone().with("index", index)
    }

    /// Copy with `key` removed
    #[must_use]
    pub fn without(&self, key: &str) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(k, _)| k != key)
                .cloned()
                .collect(),
        }
    }

    /// New selector holding `self`'s entries overridden by `other`'s
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        other
            .entries
            .iter()
            .fold(self.clone(), |acc, (k, v)| acc.with(k.clone(), v.clone()))
    }

    /// Matcher stored under `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Matcher> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    /// Whether `key` is present
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Matcher)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the selector has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Integer `index`, when present
    #[must_use]
    pub fn index(&self) -> Option<i64> {
        match self.get("index") {
            Some(Matcher::Index(n)) => Some(*n),
            _ => None,
        }
    }

    /// Pre-located node, when present
    #[must_use]
    pub fn element(&self) -> Option<&NativeRef> {
        match self.get("element") {
            Some(Matcher::Element(r)) => Some(r),
            _ => None,
        }
    }

    /// Split off the `element` escape hatch, leaving the locating entries
    #[must_use]
    pub(crate) fn split_element(self) -> (Self, Option<NativeRef>) {
        let native = self.element().cloned();
        if native.is_none() {
            return (self, None);
        }
        (self.without("element"), native)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        f.write_str("}")
    }
}

/// Build a [`Selector`] from `key: value` pairs.
///
/// Keys are written bare (`id`, `class`, `type`, `data_foo`); values are
/// anything convertible into a [`Matcher`].
#[macro_export]
macro_rules! selector {
    () => {
        $crate::selector::Selector::new()
    };
    ($($key:tt : $value:expr),+ $(,)?) => {
        $crate::selector::Selector::new()$(.with(stringify!($key), $value))+
    };
}
