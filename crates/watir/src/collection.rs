//! Element collections.
//!
//! A collection is as lazy as a single handle: nothing is queried until the
//! first read. The query result is then memoized; every later read iterates
//! the same handles until [`ElementCollection::reset`].
//!
//! Each materialized handle carries a selector that can find it again on its
//! own. For generic collections (`elements`, `inputs`) the selector names the
//! resolved tag and the position among elements of the same subtype, so a
//! checkbox between two buttons relocates as "the first checkbox", not as
//! "the second input".

use crate::context::{closed_window, Scope, Session};
use crate::driver::{DriverError, NativeRef};
use crate::element::{Element, ElementType};
use crate::locator::SelectorBuilder;
use crate::registry::{ElementKind, TagRegistry};
use crate::result::WatirResult;
use crate::selector::Selector;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lazy, memoized list of handles of type `T`
pub struct ElementCollection<T: ElementType> {
    session: Arc<Session>,
    scope: Scope,
    selector: Selector,
    kind: ElementKind,
    keyword: Option<&'static str>,
    memo: Mutex<Option<Vec<T>>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ElementType> ElementCollection<T> {
    pub(crate) fn new(
        session: Arc<Session>,
        scope: Scope,
        selector: Selector,
        kind: ElementKind,
        keyword: Option<&'static str>,
    ) -> Self {
        Self {
            session,
            scope,
            selector,
            kind,
            keyword,
            memo: Mutex::new(None),
            _marker: PhantomData,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Vec<T>>> {
        self.memo.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Selector shared by every member
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    fn materialize(&self) -> WatirResult<Vec<T>> {
        if let Some(items) = self.lock().as_ref() {
            return Ok(items.clone());
        }
        // never hold the memo lock across driver calls
        let items = self.compute()?;
        *self.lock() = Some(items.clone());
        Ok(items)
    }

    fn compute(&self) -> WatirResult<Vec<T>> {
        self.compute_in_window().map_err(closed_window)
    }

    fn compute_in_window(&self) -> WatirResult<Vec<T>> {
        self.scope.wait_for_exists()?;
        let root = self.scope.enter(&self.session)?;
        let strategy = SelectorBuilder::new(self.kind).build(&self.selector)?;
        let natives = strategy
            .locate_all(self.session.driver(), root.as_ref())?
            .collect::<WatirResult<Vec<_>>>()?;

        let mut seen: HashMap<(ElementKind, String), i64> = HashMap::new();
        let mut items = Vec::with_capacity(natives.len());
        for (position, native) in natives.into_iter().enumerate() {
            let (kind, selector) = if self.kind.is_generic() {
                let Some((subtype, tag, input_type)) = self.subtype_of(&native)? else {
                    continue;
                };
                // a member the subtype's own query would skip relocates under the requested kind
                let kind = if subtype.accepts(&tag, input_type.as_deref()) {
                    subtype
                } else {
                    self.kind
                };
                let counter = seen.entry((kind, tag.clone())).or_insert(0);
                let selector = self
                    .selector
                    .clone()
                    .with("tag_name", tag)
                    .with("index", *counter);
                *counter += 1;
                (kind, selector)
            } else {
                let index = i64::try_from(position).unwrap_or(i64::MAX);
                (self.kind, self.selector.with_index(index))
            };
            let element = Element::new(
                Arc::clone(&self.session),
                self.scope.clone(),
                selector.with("element", native),
                kind,
                self.keyword,
            );
            items.push(T::from_element(element));
        }
        tracing::debug!(
            selector = %self.selector,
            kind = %self.kind,
            count = items.len(),
            "materialized collection"
        );
        Ok(items)
    }

    /// Resolved kind, tag and input type, `None` when the node vanished meanwhile
    fn subtype_of(
        &self,
        native: &NativeRef,
    ) -> WatirResult<Option<(ElementKind, String, Option<String>)>> {
        let driver = self.session.driver();
        let tag = match driver.tag_name(native) {
            Ok(tag) => tag.to_ascii_lowercase(),
            Err(DriverError::StaleElementReference) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let input_type = if tag == "input" {
            match driver.attribute(native, "type") {
                Ok(t) => t.map(|t| t.to_ascii_lowercase()),
                Err(DriverError::StaleElementReference) => return Ok(None),
                Err(err) => return Err(err.into()),
            }
        } else {
            None
        };
        let kind = TagRegistry::standard().subtype_for(&tag, input_type.as_deref());
        Ok(Some((kind, tag, input_type)))
    }

    fn lazy(&self, index: i64) -> T {
        T::from_element(Element::new(
            Arc::clone(&self.session),
            self.scope.clone(),
            self.selector.with_index(index),
            self.kind,
            self.keyword,
        ))
    }

    /// Member at `index` (negative counts from the end).
    ///
    /// Past the end, or when the query cannot run yet, the result is a lazy
    /// handle whose selector carries the index; it fails on first use.
    pub fn at(&self, index: i64) -> T {
        let Ok(items) = self.materialize() else {
            return self.lazy(index);
        };
        let position = if index < 0 {
            i64::try_from(items.len()).unwrap_or(i64::MAX) + index
        } else {
            index
        };
        usize::try_from(position)
            .ok()
            .and_then(|i| items.get(i).cloned())
            .unwrap_or_else(|| self.lazy(index))
    }

    /// First member
    pub fn first(&self) -> T {
        self.at(0)
    }

    /// Last member
    pub fn last(&self) -> T {
        self.at(-1)
    }

    /// Number of members
    pub fn len(&self) -> WatirResult<usize> {
        Ok(self.materialize()?.len())
    }

    /// Alias of [`len`](Self::len)
    pub fn count(&self) -> WatirResult<usize> {
        self.len()
    }

    /// True when nothing matched
    pub fn is_empty(&self) -> WatirResult<bool> {
        Ok(self.materialize()?.is_empty())
    }

    /// True when something matched
    pub fn exists(&self) -> WatirResult<bool> {
        self.is_empty().map(|empty| !empty)
    }

    /// Members, in document order
    pub fn to_vec(&self) -> WatirResult<Vec<T>> {
        self.materialize()
    }

    /// Iterate the memoized members
    pub fn iter(&self) -> WatirResult<std::vec::IntoIter<T>> {
        Ok(self.materialize()?.into_iter())
    }

    /// Forget the memoized members; the next read queries again
    pub fn reset(&self) {
        *self.lock() = None;
    }

    /// Same length and pairwise the same nodes
    pub fn same_elements(&self, other: &Self) -> WatirResult<bool> {
        let ours = self.materialize()?;
        let theirs = other.materialize()?;
        if ours.len() != theirs.len() {
            return Ok(false);
        }
        for (a, b) in ours.iter().zip(&theirs) {
            if !a.as_element().same_element(b.as_element())? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl<T: ElementType> Clone for ElementCollection<T> {
    fn clone(&self) -> Self {
        Self::new(
            Arc::clone(&self.session),
            self.scope.clone(),
            self.selector.clone(),
            self.kind,
            self.keyword,
        )
    }
}

impl<T: ElementType> PartialEq for ElementCollection<T> {
    fn eq(&self, other: &Self) -> bool {
        self.same_elements(other).unwrap_or(false)
    }
}

impl<T: ElementType> fmt::Debug for ElementCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementCollection")
            .field("kind", &self.kind)
            .field("selector", &format!("{}{}", self.scope.prefix(), self.selector))
            .field("materialized", &self.lock().as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}
