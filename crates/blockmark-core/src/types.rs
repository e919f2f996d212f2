//! Core block types: identity, kinds, and key handling outcomes.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_BLOCK_ID: AtomicU64 = AtomicU64::new(1);

/// Prefix used when a block id is written into a presentation node.
const BLOCK_ID_PREFIX: &str = "block-";

/// Name of the attribute carrying a block id on its presentation nodes.
pub const BLOCK_ID_ATTR: &str = "data-block-id";

/// Identity of a block.
///
/// Ids are allocated from a monotonically increasing counter and never
/// reused, so two live blocks never share one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u64);

impl BlockId {
    /// Allocate a fresh id.
    pub fn fresh() -> Self {
        BlockId(NEXT_BLOCK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", BLOCK_ID_PREFIX, self.0)
    }
}

/// Error returned when parsing a malformed block id attribute.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid block id: {0:?}")]
pub struct ParseBlockIdError(pub String);

impl FromStr for BlockId {
    type Err = ParseBlockIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(BLOCK_ID_PREFIX)
            .and_then(|n| n.parse::<u64>().ok())
            .map(BlockId)
            .ok_or_else(|| ParseBlockIdError(s.to_string()))
    }
}

/// The kind of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Header,
    Paragraph,
    ListItem,
    UnorderedList,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Header => "header",
            BlockKind::Paragraph => "paragraph",
            BlockKind::ListItem => "list-item",
            BlockKind::UnorderedList => "unordered-list",
        }
    }
}

/// Result of delivering a key press to a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Key was consumed; the host should prevent its default action.
    Handled,
    /// Key was consumed and the owning container should focus the block
    /// following the target.
    FocusNext,
    /// Key is not ours, let the browser handle it.
    PassThrough,
}

impl KeyOutcome {
    /// Whether the host should call `preventDefault`.
    pub fn prevents_default(self) -> bool {
        !matches!(self, KeyOutcome::PassThrough)
    }
}

/// Key name that triggers creation requests.
pub const ENTER_KEY: &str = "Enter";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_ids_are_monotonic() {
        let a = BlockId::fresh();
        let b = BlockId::fresh();
        assert!(b > a);
        assert_ne!(a, b);
    }

    #[test]
    fn test_block_id_attribute_round_trip() {
        let id = BlockId::fresh();
        let text = id.to_string();
        assert!(text.starts_with("block-"));
        assert_eq!(text.parse::<BlockId>(), Ok(id));
    }

    #[test]
    fn test_block_id_rejects_garbage() {
        assert!("12".parse::<BlockId>().is_err());
        assert!("block-".parse::<BlockId>().is_err());
        assert!("block-x".parse::<BlockId>().is_err());
    }

    #[test]
    fn test_key_outcome_prevent_default() {
        assert!(KeyOutcome::Handled.prevents_default());
        assert!(KeyOutcome::FocusNext.prevents_default());
        assert!(!KeyOutcome::PassThrough.prevents_default());
    }
}
