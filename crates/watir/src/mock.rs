//! Scripted in-memory [`Driver`] for tests.
//!
//! The mock does not evaluate XPath or CSS. Tests register which nodes a query
//! returns ([`MockDriver::respond`]) and mutate nodes directly to simulate page
//! changes. Every call is recorded in a history so tests can count wire traffic.
//!
//! Nodes belong to the window and frame that were current when they were added.
//! Using a node from another browsing context, or after [`MockDriver::detach`],
//! fails with [`DriverError::StaleElementReference`], as a real browser would.

use crate::driver::{Action, Driver, DriverError, DriverResult, How, NativeRef, ScriptArg};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Node description for the mock DOM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockNode {
    /// Tag name
    pub tag: String,
    /// Attributes (and properties such as `value`)
    pub attributes: BTreeMap<String, String>,
    /// Rendered text
    pub text: String,
    /// Computed styles
    pub styles: BTreeMap<String, String>,
    /// Rendered
    pub displayed: bool,
    /// Enabled
    pub enabled: bool,
    /// Selected / checked
    pub selected: bool,
    /// Radio or option group; clicking one member deselects the others
    pub group: Option<String>,
    /// Member of a multi-select group (clicks toggle instead of replacing)
    pub multiple: bool,
}

impl MockNode {
    /// Visible, enabled node
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            text: String::new(),
            styles: BTreeMap::new(),
            displayed: true,
            enabled: true,
            selected: false,
            group: None,
            multiple: false,
        }
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the rendered text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set a computed style
    #[must_use]
    pub fn style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.insert(property.into(), value.into());
        self
    }

    /// Not rendered
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Disabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Selected / checked
    #[must_use]
    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    /// Join a radio or option group
    #[must_use]
    pub fn group(mut self, name: impl Into<String>) -> Self {
        self.group = Some(name.into());
        self
    }

    /// Mark the group as multi-select
    #[must_use]
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Context {
    window: String,
    frame: Option<NativeRef>,
}

#[derive(Debug)]
struct Entry {
    node: MockNode,
    context: Context,
    attached: bool,
}

#[derive(Debug)]
struct MockWindow {
    handle: String,
    title: String,
    url: String,
    source: String,
    back: Vec<String>,
    forward: Vec<String>,
    open: bool,
}

impl MockWindow {
    fn new(handle: String, title: String, url: String) -> Self {
        Self {
            handle,
            title,
            url,
            source: String::new(),
            back: Vec::new(),
            forward: Vec::new(),
            open: true,
        }
    }
}

type ResponseKey = (Context, Option<NativeRef>, How, String);

#[derive(Debug)]
struct MockState {
    nodes: HashMap<NativeRef, Entry>,
    responses: HashMap<ResponseKey, Vec<NativeRef>>,
    windows: Vec<MockWindow>,
    current_window: String,
    frame: Option<NativeRef>,
    scripts: Vec<(String, Value)>,
    failures: VecDeque<(String, DriverError)>,
    history: Vec<String>,
    active: Option<NativeRef>,
    quit: bool,
}

impl MockState {
    fn context(&self) -> Context {
        Context {
            window: self.current_window.clone(),
            frame: self.frame.clone(),
        }
    }

    fn window(&self) -> DriverResult<&MockWindow> {
        self.windows
            .iter()
            .find(|w| w.handle == self.current_window && w.open)
            .ok_or_else(|| DriverError::NoSuchWindow(self.current_window.clone()))
    }

    fn window_mut(&mut self) -> DriverResult<&mut MockWindow> {
        let current = self.current_window.clone();
        self.windows
            .iter_mut()
            .find(|w| w.handle == current && w.open)
            .ok_or(DriverError::NoSuchWindow(current))
    }

    fn live(&self, native: &NativeRef) -> DriverResult<&MockNode> {
        self.window()?;
        let context = self.context();
        match self.nodes.get(native) {
            Some(entry) if entry.attached && entry.context == context => Ok(&entry.node),
            _ => Err(DriverError::StaleElementReference),
        }
    }

    fn live_mut(&mut self, native: &NativeRef) -> DriverResult<&mut MockNode> {
        self.live(native)?;
        self.nodes
            .get_mut(native)
            .map(|entry| &mut entry.node)
            .ok_or(DriverError::StaleElementReference)
    }

    fn take_failure(&mut self, op: &str) -> DriverResult<()> {
        match self.failures.iter().position(|(name, _)| name == op) {
            Some(i) => Err(self
                .failures
                .remove(i)
                .map_or(DriverError::Other(op.to_string()), |(_, err)| err)),
            None => Ok(()),
        }
    }

    fn matches(&self, how: How, query: &str, root: Option<&NativeRef>) -> DriverResult<Vec<NativeRef>> {
        if let Some(root) = root {
            self.live(root)?;
        } else {
            self.window()?;
        }
        let key = (self.context(), root.cloned(), how, query.to_string());
        Ok(self
            .responses
            .get(&key)
            .map(|refs| {
                refs.iter()
                    .filter(|r| self.nodes.get(*r).is_some_and(|e| e.attached))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn click(&mut self, native: &NativeRef) -> DriverResult<()> {
        let node = self.live(native)?.clone();
        if !node.enabled {
            return Ok(());
        }
        let input_type = node.attributes.get("type").map(|t| t.to_ascii_lowercase());
        let toggles = node.tag == "option" || node.tag == "input";
        if !toggles {
            return Ok(());
        }

        let exclusive = match (node.tag.as_str(), input_type.as_deref()) {
            ("input", Some("checkbox")) => false,
            ("input", Some("radio")) => true,
            ("option", _) => !node.multiple,
            _ => return Ok(()),
        };

        if exclusive {
            if let Some(group) = &node.group {
                for entry in self.nodes.values_mut() {
                    if entry.node.group.as_ref() == Some(group) {
                        entry.node.selected = false;
                    }
                }
            }
            self.live_mut(native)?.selected = true;
        } else {
            let target = self.live_mut(native)?;
            target.selected = !target.selected;
        }
        Ok(())
    }
}

/// Scripted WebDriver collaborator
#[derive(Debug)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    /// Mock with one open, blank window
    #[must_use]
    pub fn new() -> Self {
        let handle = format!("window-{}", Uuid::new_v4());
        Self {
            state: Mutex::new(MockState {
                nodes: HashMap::new(),
                responses: HashMap::new(),
                windows: vec![MockWindow::new(
                    handle.clone(),
                    String::new(),
                    "about:blank".to_string(),
                )],
                current_window: handle,
                frame: None,
                scripts: Vec::new(),
                failures: VecDeque::new(),
                history: Vec::new(),
                active: None,
                quit: false,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, op: &str, detail: impl AsRef<str>) -> DriverResult<MutexGuard<'_, MockState>> {
        let mut state = self.state();
        state.history.push(format!("{op}:{}", detail.as_ref()));
        state.take_failure(op)?;
        Ok(state)
    }

    // ------------------------------------------------------------------
    // DOM setup
    // ------------------------------------------------------------------

    /// Add a node to the current window's top-level document
    pub fn add(&self, node: MockNode) -> NativeRef {
        let mut state = self.state();
        let context = Context {
            window: state.current_window.clone(),
            frame: None,
        };
        Self::insert(&mut state, node, context)
    }

    /// Add a node inside a frame
    pub fn add_in_frame(&self, frame: &NativeRef, node: MockNode) -> NativeRef {
        let mut state = self.state();
        let window = state
            .nodes
            .get(frame)
            .map_or_else(|| state.current_window.clone(), |e| e.context.window.clone());
        let context = Context {
            window,
            frame: Some(frame.clone()),
        };
        Self::insert(&mut state, node, context)
    }

    fn insert(state: &mut MockState, node: MockNode, context: Context) -> NativeRef {
        let native = NativeRef::new(Uuid::new_v4().to_string());
        state.nodes.insert(
            native.clone(),
            Entry {
                node,
                context,
                attached: true,
            },
        );
        native
    }

    /// Register the result of a top-level query in the current window
    pub fn respond(&self, how: How, query: impl Into<String>, refs: Vec<NativeRef>) {
        let mut state = self.state();
        let context = Context {
            window: state.current_window.clone(),
            frame: None,
        };
        state.responses.insert((context, None, how, query.into()), refs);
    }

    /// Register the result of a query scoped to `root`
    pub fn respond_within(
        &self,
        root: &NativeRef,
        how: How,
        query: impl Into<String>,
        refs: Vec<NativeRef>,
    ) {
        let mut state = self.state();
        let context = state.nodes.get(root).map_or_else(
            || Context {
                window: state.current_window.clone(),
                frame: None,
            },
            |e| e.context.clone(),
        );
        state
            .responses
            .insert((context, Some(root.clone()), how, query.into()), refs);
    }

    /// Register the result of a top-level query inside a frame's document
    pub fn respond_in_frame(
        &self,
        frame: &NativeRef,
        how: How,
        query: impl Into<String>,
        refs: Vec<NativeRef>,
    ) {
        let mut state = self.state();
        let window = state
            .nodes
            .get(frame)
            .map_or_else(|| state.current_window.clone(), |e| e.context.window.clone());
        let context = Context {
            window,
            frame: Some(frame.clone()),
        };
        state.responses.insert((context, None, how, query.into()), refs);
    }

    /// Remove a node from the DOM; later use reports a stale reference
    pub fn detach(&self, native: &NativeRef) {
        if let Some(entry) = self.state().nodes.get_mut(native) {
            entry.attached = false;
        }
    }

    /// Mutate a node in place
    pub fn update(&self, native: &NativeRef, f: impl FnOnce(&mut MockNode)) {
        if let Some(entry) = self.state().nodes.get_mut(native) {
            f(&mut entry.node);
        }
    }

    /// Snapshot of a node
    #[must_use]
    pub fn node(&self, native: &NativeRef) -> Option<MockNode> {
        self.state().nodes.get(native).map(|e| e.node.clone())
    }

    /// Result returned by any script containing `fragment`
    pub fn set_script_result(&self, fragment: impl Into<String>, value: Value) {
        self.state().scripts.push((fragment.into(), value));
    }

    /// Make the next call of `op` fail with `err`
    pub fn fail_next(&self, op: impl Into<String>, err: DriverError) {
        self.state().failures.push_back((op.into(), err));
    }

    /// Open another window
    pub fn add_window(&self, handle: impl Into<String>, title: impl Into<String>, url: impl Into<String>) {
        self.state()
            .windows
            .push(MockWindow::new(handle.into(), title.into(), url.into()));
    }

    /// Set the current window's title
    pub fn set_title(&self, title: impl Into<String>) {
        if let Ok(window) = self.state().window_mut() {
            window.title = title.into();
        }
    }

    /// Set the current window's page source
    pub fn set_page_source(&self, source: impl Into<String>) {
        if let Ok(window) = self.state().window_mut() {
            window.source = source.into();
        }
    }

    /// Handle of the window the mock considers current
    #[must_use]
    pub fn current_window(&self) -> String {
        self.state().current_window.clone()
    }

    /// Frame the mock considers current
    #[must_use]
    pub fn current_frame(&self) -> Option<NativeRef> {
        self.state().frame.clone()
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Every recorded call, as `op:detail`
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state().history.clone()
    }

    /// Number of calls whose record starts with `prefix`
    #[must_use]
    pub fn call_count(&self, prefix: &str) -> usize {
        self.state()
            .history
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Whether any call record starts with `prefix`
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.call_count(prefix) > 0
    }

    /// Forget recorded calls
    pub fn clear_history(&self) {
        self.state().history.clear();
    }

    /// Whether `quit` was called
    #[must_use]
    pub fn is_quit(&self) -> bool {
        self.state().quit
    }
}

impl Driver for MockDriver {
    fn find_element(&self, how: How, query: &str, root: Option<&NativeRef>) -> DriverResult<NativeRef> {
        let state = self.record("find_element", format!("{how}:{query}"))?;
        state
            .matches(how, query, root)?
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::NoSuchElement(query.to_string()))
    }

    fn find_elements(
        &self,
        how: How,
        query: &str,
        root: Option<&NativeRef>,
    ) -> DriverResult<Vec<NativeRef>> {
        let state = self.record("find_elements", format!("{how}:{query}"))?;
        state.matches(how, query, root)
    }

    fn click(&self, element: &NativeRef) -> DriverResult<()> {
        let mut state = self.record("click", element.id())?;
        state.click(element)
    }

    fn text(&self, element: &NativeRef) -> DriverResult<String> {
        let state = self.record("text", element.id())?;
        state.live(element).map(|n| n.text.clone())
    }

    fn tag_name(&self, element: &NativeRef) -> DriverResult<String> {
        let state = self.record("tag_name", element.id())?;
        state.live(element).map(|n| n.tag.clone())
    }

    fn attribute(&self, element: &NativeRef, name: &str) -> DriverResult<Option<String>> {
        let state = self.record("attribute", format!("{}:{name}", element.id()))?;
        state.live(element).map(|n| n.attributes.get(name).cloned())
    }

    fn css_value(&self, element: &NativeRef, property: &str) -> DriverResult<String> {
        let state = self.record("css_value", format!("{}:{property}", element.id()))?;
        state
            .live(element)
            .map(|n| n.styles.get(property).cloned().unwrap_or_default())
    }

    fn is_displayed(&self, element: &NativeRef) -> DriverResult<bool> {
        let state = self.record("is_displayed", element.id())?;
        state.live(element).map(|n| n.displayed)
    }

    fn is_enabled(&self, element: &NativeRef) -> DriverResult<bool> {
        let state = self.record("is_enabled", element.id())?;
        state.live(element).map(|n| n.enabled)
    }

    fn is_selected(&self, element: &NativeRef) -> DriverResult<bool> {
        let state = self.record("is_selected", element.id())?;
        state.live(element).map(|n| n.selected)
    }

    fn send_keys(&self, element: &NativeRef, keys: &str) -> DriverResult<()> {
        let mut state = self.record("send_keys", format!("{}:{keys}", element.id()))?;
        let node = state.live_mut(element)?;
        node.attributes
            .entry("value".to_string())
            .or_default()
            .push_str(keys);
        Ok(())
    }

    fn clear(&self, element: &NativeRef) -> DriverResult<()> {
        let mut state = self.record("clear", element.id())?;
        state
            .live_mut(element)?
            .attributes
            .insert("value".to_string(), String::new());
        Ok(())
    }

    fn perform(&self, action: &Action) -> DriverResult<()> {
        let (name, targets): (&str, Vec<&NativeRef>) = match action {
            Action::Click { target, .. } => ("click", vec![target]),
            Action::DoubleClick(target) => ("double_click", vec![target]),
            Action::ContextClick(target) => ("context_click", vec![target]),
            Action::MoveTo(target) => ("move_to", vec![target]),
            Action::DragAndDrop { source, target } => ("drag_and_drop", vec![source, target]),
            Action::DragAndDropBy { source, .. } => ("drag_and_drop_by", vec![source]),
        };
        let detail = targets
            .iter()
            .map(|r| r.id())
            .collect::<Vec<_>>()
            .join(",");
        let mut state = self.record("perform", format!("{name}:{detail}"))?;
        for target in &targets {
            state.live(target)?;
        }
        if let Action::Click { target, .. } = action {
            state.click(target)?;
        }
        Ok(())
    }

    fn execute_script(&self, script: &str, args: &[ScriptArg]) -> DriverResult<Value> {
        let mut state = self.record("execute_script", script)?;
        for arg in args {
            if let ScriptArg::Element(native) = arg {
                state.live(native)?;
            }
        }
        if script.contains(".focus()") {
            if let Some(ScriptArg::Element(native)) = args.first() {
                state.active = Some(native.clone());
            }
        }
        Ok(state
            .scripts
            .iter()
            .find(|(fragment, _)| script.contains(fragment.as_str()))
            .map(|(_, value)| value.clone())
            .unwrap_or(Value::Null))
    }

    fn active_element(&self) -> DriverResult<NativeRef> {
        let state = self.record("active_element", "")?;
        state
            .active
            .clone()
            .ok_or_else(|| DriverError::NoSuchElement("no active element".to_string()))
    }

    fn switch_to_window(&self, handle: &str) -> DriverResult<()> {
        let mut state = self.record("switch_to_window", handle)?;
        if !state.windows.iter().any(|w| w.handle == handle && w.open) {
            return Err(DriverError::NoSuchWindow(handle.to_string()));
        }
        state.current_window = handle.to_string();
        state.frame = None;
        Ok(())
    }

    fn switch_to_frame(&self, frame: &NativeRef) -> DriverResult<()> {
        let mut state = self.record("switch_to_frame", frame.id())?;
        let is_frame = match state.live(frame) {
            Ok(node) => node.tag == "iframe" || node.tag == "frame",
            Err(_) => return Err(DriverError::NoSuchFrame(frame.id().to_string())),
        };
        if !is_frame {
            return Err(DriverError::NoSuchFrame(frame.id().to_string()));
        }
        state.frame = Some(frame.clone());
        Ok(())
    }

    fn switch_to_default_content(&self) -> DriverResult<()> {
        let mut state = self.record("switch_to_default_content", "")?;
        state.window()?;
        state.frame = None;
        Ok(())
    }

    fn window_handles(&self) -> DriverResult<Vec<String>> {
        let state = self.record("window_handles", "")?;
        Ok(state
            .windows
            .iter()
            .filter(|w| w.open)
            .map(|w| w.handle.clone())
            .collect())
    }

    fn window_handle(&self) -> DriverResult<String> {
        let state = self.record("window_handle", "")?;
        state.window().map(|w| w.handle.clone())
    }

    fn close_window(&self) -> DriverResult<()> {
        let mut state = self.record("close_window", "")?;
        state.window_mut()?.open = false;
        Ok(())
    }

    fn navigate(&self, url: &str) -> DriverResult<()> {
        let mut state = self.record("navigate", url)?;
        let window = state.window_mut()?;
        let previous = std::mem::replace(&mut window.url, url.to_string());
        window.back.push(previous);
        window.forward.clear();
        state.frame = None;
        Ok(())
    }

    fn back(&self) -> DriverResult<()> {
        let mut state = self.record("back", "")?;
        let window = state.window_mut()?;
        if let Some(url) = window.back.pop() {
            let current = std::mem::replace(&mut window.url, url);
            window.forward.push(current);
        }
        state.frame = None;
        Ok(())
    }

    fn forward(&self) -> DriverResult<()> {
        let mut state = self.record("forward", "")?;
        let window = state.window_mut()?;
        if let Some(url) = window.forward.pop() {
            let current = std::mem::replace(&mut window.url, url);
            window.back.push(current);
        }
        state.frame = None;
        Ok(())
    }

    fn refresh(&self) -> DriverResult<()> {
        let mut state = self.record("refresh", "")?;
        state.window()?;
        state.frame = None;
        Ok(())
    }

    fn page_source(&self) -> DriverResult<String> {
        let state = self.record("page_source", "")?;
        state.window().map(|w| w.source.clone())
    }

    fn current_url(&self) -> DriverResult<String> {
        let state = self.record("current_url", "")?;
        state.window().map(|w| w.url.clone())
    }

    fn title(&self) -> DriverResult<String> {
        let state = self.record("title", "")?;
        state.window().map(|w| w.title.clone())
    }

    fn quit(&self) -> DriverResult<()> {
        let mut state = self.record("quit", "")?;
        state.quit = true;
        for window in &mut state.windows {
            window.open = false;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod query_tests {
        use super::*;

        #[test]
        fn test_unregistered_query_finds_nothing() {
            let mock = MockDriver::new();
            assert!(matches!(
                mock.find_element(How::XPath, "//x", None),
                Err(DriverError::NoSuchElement(_))
            ));
            assert!(mock.find_elements(How::XPath, "//x", None).unwrap().is_empty());
        }

        #[test]
        fn test_detached_nodes_drop_out_of_results() {
            let mock = MockDriver::new();
            let a = mock.add(MockNode::new("div"));
            let b = mock.add(MockNode::new("div"));
            mock.respond(How::Css, "div", vec![a.clone(), b.clone()]);
            mock.detach(&a);
            assert_eq!(mock.find_elements(How::Css, "div", None).unwrap(), vec![b]);
            assert_eq!(mock.text(&a), Err(DriverError::StaleElementReference));
        }

        #[test]
        fn test_history_records_calls() {
            let mock = MockDriver::new();
            let _ = mock.find_elements(How::Css, "p", None);
            assert!(mock.was_called("find_elements:css selector:p"));
            assert_eq!(mock.call_count("find_"), 1);
            mock.clear_history();
            assert!(mock.history().is_empty());
        }

        #[test]
        fn test_injected_failure_fires_once() {
            let mock = MockDriver::new();
            let a = mock.add(MockNode::new("p"));
            mock.fail_next("click", DriverError::StaleElementReference);
            assert_eq!(mock.click(&a), Err(DriverError::StaleElementReference));
            assert_eq!(mock.click(&a), Ok(()));
        }
    }

    mod context_tests {
        use super::*;

        #[test]
        fn test_frame_nodes_need_the_frame_context() {
            let mock = MockDriver::new();
            let frame = mock.add(MockNode::new("iframe"));
            let inner = mock.add_in_frame(&frame, MockNode::new("p").text("inside"));
            assert_eq!(mock.text(&inner), Err(DriverError::StaleElementReference));
            mock.switch_to_frame(&frame).unwrap();
            assert_eq!(mock.text(&inner).unwrap(), "inside");
            mock.switch_to_default_content().unwrap();
            assert!(mock.text(&inner).is_err());
        }

        #[test]
        fn test_switching_into_a_non_frame_fails() {
            let mock = MockDriver::new();
            let div = mock.add(MockNode::new("div"));
            assert!(matches!(
                mock.switch_to_frame(&div),
                Err(DriverError::NoSuchFrame(_))
            ));
        }

        #[test]
        fn test_windows() {
            let mock = MockDriver::new();
            let main = mock.current_window();
            mock.add_window("popup", "Popup", "https://example.com/popup");
            assert_eq!(mock.window_handles().unwrap().len(), 2);
            mock.switch_to_window("popup").unwrap();
            assert_eq!(mock.title().unwrap(), "Popup");
            mock.close_window().unwrap();
            assert!(matches!(mock.title(), Err(DriverError::NoSuchWindow(_))));
            mock.switch_to_window(&main).unwrap();
            assert_eq!(mock.window_handles().unwrap(), vec![main]);
        }

        #[test]
        fn test_navigation_history() {
            let mock = MockDriver::new();
            mock.navigate("https://a.test/").unwrap();
            mock.navigate("https://b.test/").unwrap();
            mock.back().unwrap();
            assert_eq!(mock.current_url().unwrap(), "https://a.test/");
            mock.forward().unwrap();
            assert_eq!(mock.current_url().unwrap(), "https://b.test/");
            mock.forward().unwrap();
            assert_eq!(mock.current_url().unwrap(), "https://b.test/");
            mock.back().unwrap();
            mock.navigate("https://c.test/").unwrap();
            mock.forward().unwrap();
            assert_eq!(mock.current_url().unwrap(), "https://c.test/");
        }
    }

    mod interaction_tests {
        use super::*;

        #[test]
        fn test_checkbox_toggles_and_radio_is_exclusive() {
            let mock = MockDriver::new();
            let cb = mock.add(MockNode::new("input").attr("type", "checkbox"));
            mock.click(&cb).unwrap();
            assert!(mock.is_selected(&cb).unwrap());
            mock.click(&cb).unwrap();
            assert!(!mock.is_selected(&cb).unwrap());

            let r1 = mock.add(MockNode::new("input").attr("type", "radio").group("g").selected());
            let r2 = mock.add(MockNode::new("input").attr("type", "radio").group("g"));
            mock.click(&r2).unwrap();
            assert!(!mock.is_selected(&r1).unwrap());
            assert!(mock.is_selected(&r2).unwrap());
        }

        #[test]
        fn test_send_keys_and_clear() {
            let mock = MockDriver::new();
            let input = mock.add(MockNode::new("input").attr("value", "ab"));
            mock.send_keys(&input, "c").unwrap();
            assert_eq!(mock.attribute(&input, "value").unwrap().as_deref(), Some("abc"));
            mock.clear(&input).unwrap();
            assert_eq!(mock.attribute(&input, "value").unwrap().as_deref(), Some(""));
        }

        #[test]
        fn test_script_results_and_focus() {
            let mock = MockDriver::new();
            let input = mock.add(MockNode::new("input"));
            mock.set_script_result("outerHTML", Value::String("<input>".into()));
            assert_eq!(
                mock.execute_script("return arguments[0].outerHTML", &[input.clone().into()])
                    .unwrap(),
                Value::String("<input>".into())
            );
            mock.execute_script("arguments[0].focus()", &[input.clone().into()])
                .unwrap();
            assert_eq!(mock.active_element().unwrap(), input);
        }
    }
}
