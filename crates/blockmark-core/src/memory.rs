//! In-memory presentation host.
//!
//! `MemoryHost` implements both `Surface` and `IdleScheduler` over a plain
//! node arena and a virtual millisecond clock. It is the host for native
//! tests: it records focus, control values and row counts, and idle tasks
//! only run when the caller says so (`run_idle` / `advance`).
//!
//! Nodes are never freed. Detached subtrees (a rebuilt heading, replaced list
//! items) stay in the arena for the lifetime of the host, which suits
//! short-lived test hosts and nothing longer-running.
//!
//! Handles from another host, or out of range, never panic: queries answer
//! as for a detached empty node and mutations fail with `PlatformError`.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::rc::Rc;
use std::time::Duration;

use crate::platform::{IdleHandle, IdleScheduler, PlatformError, Surface};

/// Handle to a node in a `MemoryHost` arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemoryNode(usize);

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    parent: Option<usize>,
    children: Vec<usize>,
    value: String,
    placeholder: Option<String>,
    rows: Option<u32>,
}

struct PendingTask {
    deadline_ms: u64,
    task: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct MemoryState {
    nodes: Vec<NodeData>,
    focused: Option<usize>,
    clock_ms: u64,
    next_handle: u32,
    pending: BTreeMap<u32, PendingTask>,
    fired: usize,
}

/// Shared handle onto an in-memory presentation tree and idle queue.
#[derive(Clone, Default)]
pub struct MemoryHost {
    state: Rc<RefCell<MemoryState>>,
}

impl std::fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("MemoryHost")
            .field("nodes", &state.nodes.len())
            .field("pending_idle", &state.pending.len())
            .field("clock_ms", &state.clock_ms)
            .finish()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached `div` to act as the embedding container.
    pub fn create_root(&self) -> MemoryNode {
        let mut state = self.state.borrow_mut();
        state.nodes.push(NodeData {
            tag: "div".to_string(),
            ..NodeData::default()
        });
        MemoryNode(state.nodes.len() - 1)
    }

    /// Node holding input focus, if any.
    pub fn focused(&self) -> Option<MemoryNode> {
        self.state.borrow().focused.map(MemoryNode)
    }

    pub fn placeholder(&self, node: &MemoryNode) -> Option<String> {
        self.read(node, |data| data.placeholder.clone()).flatten()
    }

    pub fn rows(&self, node: &MemoryNode) -> Option<u32> {
        self.read(node, |data| data.rows).flatten()
    }

    pub fn classes(&self, node: &MemoryNode) -> Vec<String> {
        self.read(node, |data| data.classes.clone())
            .unwrap_or_default()
    }

    pub fn attribute(&self, node: &MemoryNode, name: &str) -> Option<String> {
        self.read(node, |data| data.attributes.get(name).cloned())
            .flatten()
    }

    /// Whether `node` is `root` or one of its descendants.
    pub fn is_attached(&self, node: &MemoryNode, root: &MemoryNode) -> bool {
        let state = self.state.borrow();
        let mut current = Some(node.0);
        while let Some(index) = current {
            if index == root.0 {
                return true;
            }
            current = state.nodes.get(index).and_then(|data| data.parent);
        }
        false
    }

    /// Indented dump of the subtree rooted at `node`, one element per line.
    pub fn outline(&self, node: &MemoryNode) -> String {
        let state = self.state.borrow();
        let mut out = String::new();
        if node.0 < state.nodes.len() {
            write_outline(&state, node.0, 0, &mut out);
        }
        out.truncate(out.trim_end().len());
        out
    }

    // === Idle queue ===

    /// Number of idle tasks waiting to run.
    pub fn pending_idle(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Total idle tasks run so far.
    pub fn fired_idle(&self) -> usize {
        self.state.borrow().fired
    }

    /// Simulate an idle period: run every pending task. Returns how many ran.
    pub fn run_idle(&self) -> usize {
        self.run_where(|_| true)
    }

    /// Move the virtual clock forward, running tasks whose timeout elapsed.
    pub fn advance(&self, by: Duration) -> usize {
        let now = {
            let mut state = self.state.borrow_mut();
            state.clock_ms += by.as_millis() as u64;
            state.clock_ms
        };
        self.run_where(|task| task.deadline_ms <= now)
    }

    fn run_where(&self, due: impl Fn(&PendingTask) -> bool) -> usize {
        let mut ran = 0;
        loop {
            // Release the borrow before running: tasks call back into the host.
            let next = {
                let mut state = self.state.borrow_mut();
                let handle = state
                    .pending
                    .iter()
                    .find(|(_, task)| due(task))
                    .map(|(handle, _)| *handle);
                handle.and_then(|h| state.pending.remove(&h))
            };
            let Some(pending) = next else {
                break;
            };
            (pending.task)();
            self.state.borrow_mut().fired += 1;
            ran += 1;
        }
        ran
    }

    fn read<R>(&self, node: &MemoryNode, f: impl FnOnce(&NodeData) -> R) -> Option<R> {
        self.state.borrow().nodes.get(node.0).map(f)
    }

    /// Siblings of `node` (its parent's children) and its index among them.
    fn siblings(state: &MemoryState, node: usize) -> Option<(&[usize], usize)> {
        let parent = state.nodes.get(node)?.parent?;
        let siblings = state.nodes[parent].children.as_slice();
        let position = siblings.iter().position(|c| *c == node)?;
        Some((siblings, position))
    }

    fn with_node<R>(
        &self,
        node: &MemoryNode,
        f: impl FnOnce(&mut NodeData) -> R,
    ) -> Result<R, PlatformError> {
        let mut state = self.state.borrow_mut();
        let data = state
            .nodes
            .get_mut(node.0)
            .ok_or_else(|| PlatformError(format!("unknown node {}", node.0)))?;
        Ok(f(data))
    }

    fn detach(state: &mut MemoryState, child: usize) {
        if let Some(old_parent) = state.nodes[child].parent.take() {
            state.nodes[old_parent].children.retain(|c| *c != child);
        }
    }
}

fn write_outline(state: &MemoryState, index: usize, depth: usize, out: &mut String) {
    let node = &state.nodes[index];
    let _ = write!(out, "{:indent$}{}", "", node.tag, indent = depth * 2);
    for class in &node.classes {
        let _ = write!(out, ".{}", class);
    }
    for (name, value) in &node.attributes {
        if name != crate::types::BLOCK_ID_ATTR {
            let _ = write!(out, " {}={:?}", name, value);
        }
    }
    if matches!(node.tag.as_str(), "input" | "textarea") {
        let _ = write!(out, " value={:?}", node.value);
    }
    if let Some(placeholder) = &node.placeholder {
        let _ = write!(out, " placeholder={:?}", placeholder);
    }
    if let Some(rows) = node.rows {
        let _ = write!(out, " rows={}", rows);
    }
    out.push('\n');
    for child in &node.children {
        write_outline(state, *child, depth + 1, out);
    }
}

impl Surface for MemoryHost {
    type Node = MemoryNode;

    fn create_element(&self, tag: &str) -> Result<MemoryNode, PlatformError> {
        let mut state = self.state.borrow_mut();
        state.nodes.push(NodeData {
            tag: tag.to_ascii_lowercase(),
            ..NodeData::default()
        });
        Ok(MemoryNode(state.nodes.len() - 1))
    }

    fn set_class(&self, node: &MemoryNode, class: &str) -> Result<(), PlatformError> {
        self.with_node(node, |data| {
            data.classes = class.split_whitespace().map(str::to_string).collect();
        })
    }

    fn add_class(&self, node: &MemoryNode, class: &str) -> Result<(), PlatformError> {
        self.with_node(node, |data| {
            if !data.classes.iter().any(|c| c == class) {
                data.classes.push(class.to_string());
            }
        })
    }

    fn set_attribute(
        &self,
        node: &MemoryNode,
        name: &str,
        value: &str,
    ) -> Result<(), PlatformError> {
        self.with_node(node, |data| {
            data.attributes.insert(name.to_string(), value.to_string());
        })
    }

    fn append_child(&self, parent: &MemoryNode, child: &MemoryNode) -> Result<(), PlatformError> {
        self.insert_before(parent, child, None)
    }

    fn insert_before(
        &self,
        parent: &MemoryNode,
        child: &MemoryNode,
        reference: Option<&MemoryNode>,
    ) -> Result<(), PlatformError> {
        if self.is_attached(parent, child) {
            return Err(PlatformError("cannot insert a node into itself".into()));
        }
        let mut state = self.state.borrow_mut();
        if parent.0 >= state.nodes.len() || child.0 >= state.nodes.len() {
            return Err(PlatformError("unknown node".into()));
        }
        Self::detach(&mut state, child.0);
        let children = &mut state.nodes[parent.0].children;
        let position = match reference {
            Some(reference) => children
                .iter()
                .position(|c| *c == reference.0)
                .ok_or_else(|| PlatformError("reference is not a child of parent".into()))?,
            None => children.len(),
        };
        children.insert(position, child.0);
        state.nodes[child.0].parent = Some(parent.0);
        Ok(())
    }

    fn remove_child(&self, parent: &MemoryNode, child: &MemoryNode) -> Result<(), PlatformError> {
        let mut state = self.state.borrow_mut();
        if state.nodes.get(child.0).and_then(|data| data.parent) != Some(parent.0) {
            return Err(PlatformError("node is not a child of parent".into()));
        }
        Self::detach(&mut state, child.0);
        Ok(())
    }

    fn parent(&self, node: &MemoryNode) -> Option<MemoryNode> {
        self.read(node, |data| data.parent).flatten().map(MemoryNode)
    }

    fn next_sibling(&self, node: &MemoryNode) -> Option<MemoryNode> {
        let state = self.state.borrow();
        let (siblings, position) = Self::siblings(&state, node.0)?;
        siblings.get(position + 1).copied().map(MemoryNode)
    }

    fn previous_sibling(&self, node: &MemoryNode) -> Option<MemoryNode> {
        let state = self.state.borrow();
        let (siblings, position) = Self::siblings(&state, node.0)?;
        position
            .checked_sub(1)
            .and_then(|p| siblings.get(p))
            .copied()
            .map(MemoryNode)
    }

    fn children(&self, node: &MemoryNode) -> Vec<MemoryNode> {
        self.read(node, |data| data.children.iter().copied().map(MemoryNode).collect())
            .unwrap_or_default()
    }

    fn tag_name(&self, node: &MemoryNode) -> String {
        self.read(node, |data| data.tag.clone()).unwrap_or_default()
    }

    fn set_value(&self, node: &MemoryNode, value: &str) -> Result<(), PlatformError> {
        self.with_node(node, |data| data.value = value.to_string())
    }

    fn value(&self, node: &MemoryNode) -> String {
        self.read(node, |data| data.value.clone()).unwrap_or_default()
    }

    fn set_placeholder(&self, node: &MemoryNode, placeholder: &str) -> Result<(), PlatformError> {
        self.with_node(node, |data| data.placeholder = Some(placeholder.to_string()))
    }

    fn set_rows(&self, node: &MemoryNode, rows: u32) -> Result<(), PlatformError> {
        self.with_node(node, |data| data.rows = Some(rows))
    }

    fn focus(&self, node: &MemoryNode) -> Result<(), PlatformError> {
        let mut state = self.state.borrow_mut();
        if node.0 >= state.nodes.len() {
            return Err(PlatformError(format!("unknown node {}", node.0)));
        }
        state.focused = Some(node.0);
        Ok(())
    }
}

impl IdleScheduler for MemoryHost {
    fn request_idle(
        &self,
        timeout: Duration,
        task: Box<dyn FnOnce()>,
    ) -> Result<IdleHandle, PlatformError> {
        let mut state = self.state.borrow_mut();
        state.next_handle += 1;
        let handle = state.next_handle;
        let deadline_ms = state.clock_ms + timeout.as_millis() as u64;
        state.pending.insert(handle, PendingTask { deadline_ms, task });
        Ok(IdleHandle(handle))
    }

    fn cancel_idle(&self, handle: IdleHandle) {
        self.state.borrow_mut().pending.remove(&handle.0);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_insert_before_and_after() {
        let host = MemoryHost::new();
        let root = host.create_root();
        let a = host.create_element("p").unwrap();
        let b = host.create_element("p").unwrap();
        let c = host.create_element("p").unwrap();

        host.append_child(&root, &a).unwrap();
        host.append_child(&root, &c).unwrap();
        host.insert_after(&root, &b, &a).unwrap();
        assert_eq!(host.children(&root), vec![a, b, c]);

        assert_eq!(host.next_sibling(&a), Some(b));
        assert_eq!(host.previous_sibling(&a), None);
        assert_eq!(host.next_sibling(&c), None);
        assert_eq!(host.previous_sibling(&c), Some(b));
    }

    #[test]
    fn test_reinserting_moves_node() {
        let host = MemoryHost::new();
        let root = host.create_root();
        let a = host.create_element("p").unwrap();
        let b = host.create_element("p").unwrap();
        host.append_child(&root, &a).unwrap();
        host.append_child(&root, &b).unwrap();

        host.append_child(&root, &a).unwrap();
        assert_eq!(host.children(&root), vec![b, a]);
    }

    #[test]
    fn test_clear_children_detaches() {
        let host = MemoryHost::new();
        let root = host.create_root();
        let a = host.create_element("p").unwrap();
        host.append_child(&root, &a).unwrap();

        host.clear_children(&root).unwrap();
        assert!(host.children(&root).is_empty());
        assert!(!host.is_attached(&a, &root));
        assert_eq!(host.parent(&a), None);
    }

    #[test]
    fn test_cannot_insert_into_descendant() {
        let host = MemoryHost::new();
        let root = host.create_root();
        let child = host.create_element("div").unwrap();
        host.append_child(&root, &child).unwrap();
        assert!(host.append_child(&child, &root).is_err());
    }

    #[test]
    fn test_idle_cancel_and_run() {
        let host = MemoryHost::new();
        let hits = Rc::new(Cell::new(0));

        let first = Rc::clone(&hits);
        let handle = host
            .request_idle(
                Duration::from_millis(250),
                Box::new(move || first.set(first.get() + 1)),
            )
            .unwrap();
        let second = Rc::clone(&hits);
        host.request_idle(
            Duration::from_millis(250),
            Box::new(move || second.set(second.get() + 10)),
        )
        .unwrap();

        host.cancel_idle(handle);
        assert_eq!(host.pending_idle(), 1);
        assert_eq!(host.run_idle(), 1);
        assert_eq!(hits.get(), 10);
        assert_eq!(host.fired_idle(), 1);
    }

    #[test]
    fn test_idle_timeout_runs_on_advance() {
        let host = MemoryHost::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        host.request_idle(Duration::from_millis(250), Box::new(move || counter.set(1)))
            .unwrap();

        assert_eq!(host.advance(Duration::from_millis(249)), 0);
        assert_eq!(hits.get(), 0);
        assert_eq!(host.advance(Duration::from_millis(1)), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_foreign_nodes_do_not_panic() {
        let host = MemoryHost::new();
        let root = host.create_root();
        let other = MemoryHost::new();
        other.create_root();
        let stray = other.create_element("p").unwrap();

        assert_eq!(host.children(&stray), Vec::new());
        assert_eq!(host.parent(&stray), None);
        assert_eq!(host.next_sibling(&stray), None);
        assert_eq!(host.tag_name(&stray), "");
        assert_eq!(host.value(&stray), "");
        assert_eq!(host.placeholder(&stray), None);
        assert_eq!(host.outline(&stray), "");
        assert!(host.set_value(&stray, "x").is_err());
        assert!(host.append_child(&root, &stray).is_err());
        assert!(host.remove_child(&root, &stray).is_err());
        assert!(host.focus(&stray).is_err());
        assert!(host.children(&root).is_empty());
    }

    #[test]
    fn test_outline() {
        let host = MemoryHost::new();
        let root = host.create_root();
        let p = host.create_element("P").unwrap();
        host.set_class(&p, "md-paragraph").unwrap();
        let area = host.create_element("textarea").unwrap();
        host.set_value(&area, "hi").unwrap();
        host.set_rows(&area, 2).unwrap();
        host.append_child(&root, &p).unwrap();
        host.append_child(&p, &area).unwrap();

        insta::assert_snapshot!(host.outline(&root), @r#"
        div
          p.md-paragraph
            textarea value="hi" rows=2
        "#);
    }
}
