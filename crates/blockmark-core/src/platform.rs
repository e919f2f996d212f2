//! Platform abstraction traits for the presentation environment.
//!
//! These traits define the interface between the block model and whatever
//! hosts it (browser DOM, the in-memory tree used by tests, etc.). Blocks
//! only ever talk to their host through these operations, so the same editor
//! logic runs unchanged against any implementation.

use std::time::Duration;

/// Error type for platform operations.
#[derive(Debug, Clone)]
pub struct PlatformError(pub String);

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PlatformError {}

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError(s)
    }
}

/// Presentation tree operations.
///
/// Nodes are cheap handles (`Clone`) compared by identity (`PartialEq`).
/// All operations take `&self`: hosts are shared handles onto a tree owned by
/// the environment, mutated from a single UI thread.
pub trait Surface {
    /// Handle to a node in the presentation tree.
    type Node: Clone + PartialEq + std::fmt::Debug + 'static;

    /// Create a detached element with the given tag name.
    fn create_element(&self, tag: &str) -> Result<Self::Node, PlatformError>;

    /// Replace the node's class list with a single class string.
    fn set_class(&self, node: &Self::Node, class: &str) -> Result<(), PlatformError>;

    /// Add one class to the node's class list.
    fn add_class(&self, node: &Self::Node, class: &str) -> Result<(), PlatformError>;

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str)
    -> Result<(), PlatformError>;

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), PlatformError>;

    /// Insert `child` into `parent` before `reference`, or at the end when
    /// `reference` is `None`.
    fn insert_before(
        &self,
        parent: &Self::Node,
        child: &Self::Node,
        reference: Option<&Self::Node>,
    ) -> Result<(), PlatformError>;

    fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), PlatformError>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

    fn previous_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Element children of `node`, in order.
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Lowercase tag name.
    fn tag_name(&self, node: &Self::Node) -> String;

    /// Set the value of an editable control (input or textarea).
    fn set_value(&self, node: &Self::Node, value: &str) -> Result<(), PlatformError>;

    /// Read the value of an editable control. Non-controls read as empty.
    fn value(&self, node: &Self::Node) -> String;

    fn set_placeholder(&self, node: &Self::Node, placeholder: &str) -> Result<(), PlatformError>;

    /// Set the visible row count of a multi-line control.
    fn set_rows(&self, node: &Self::Node, rows: u32) -> Result<(), PlatformError>;

    /// Move input focus to the node.
    fn focus(&self, node: &Self::Node) -> Result<(), PlatformError>;

    // === Provided ===

    /// Insert `child` into `parent` immediately after `reference`.
    fn insert_after(
        &self,
        parent: &Self::Node,
        child: &Self::Node,
        reference: &Self::Node,
    ) -> Result<(), PlatformError> {
        let next = self.next_sibling(reference);
        self.insert_before(parent, child, next.as_ref())
    }

    /// Remove every child of `node`.
    fn clear_children(&self, node: &Self::Node) -> Result<(), PlatformError> {
        for child in self.children(node) {
            self.remove_child(node, &child)?;
        }
        Ok(())
    }
}

/// Handle to a pending idle task, used to cancel it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IdleHandle(pub u32);

/// Cooperative scheduling of low-priority work on the UI thread.
///
/// Mirrors `requestIdleCallback`: the task runs when the host is idle, or
/// once `timeout` has elapsed, whichever comes first. Cancelled tasks never
/// run.
pub trait IdleScheduler {
    fn request_idle(
        &self,
        timeout: Duration,
        task: Box<dyn FnOnce()>,
    ) -> Result<IdleHandle, PlatformError>;

    /// Cancel a pending task. Unknown or already-run handles are ignored.
    fn cancel_idle(&self, handle: IdleHandle);
}

/// Everything a block needs from its environment.
pub trait Host: Surface + IdleScheduler + Clone + 'static {}

impl<T> Host for T where T: Surface + IdleScheduler + Clone + 'static {}
