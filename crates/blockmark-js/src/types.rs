//! Values passed across the JS boundary.

use blockmark_core::{BlockEvent, BlockId, BlockKind};
use serde::Serialize;

/// Payload handed to `onChange` callbacks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsChange {
    /// Block id as it appears in `data-block-id`.
    pub block_id: String,
    pub kind: &'static str,
}

impl JsChange {
    pub fn new(id: BlockId, kind: BlockKind) -> Self {
        Self {
            block_id: id.to_string(),
            kind: kind.as_str(),
        }
    }

    pub fn from_event(event: &BlockEvent) -> Option<Self> {
        match event {
            BlockEvent::Change { id, kind } => Some(Self::new(*id, *kind)),
            BlockEvent::Create(_) => None,
        }
    }
}
