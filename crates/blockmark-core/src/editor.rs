//! The top-level editor container.
//!
//! `Editor<H>` owns the ordered sequence of top-level blocks and mirrors it
//! into a root node in the host's presentation tree. The sequence is the
//! source of truth for document order: the root's children are always the
//! blocks' wrapper nodes, in sequence order.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::rc::Rc;

use crate::block::{Block, Component, RequestQueue, forward_requests};
use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::events::{AfterInsert, BlockEvent, CHANGE_EVENT, EventEmitter, Observable};
use crate::platform::Host;
use crate::types::{BlockId, BlockKind, KeyOutcome};

/// Class of the editor's root node.
pub const EDITOR_CLASS: &str = "md-editor";

/// Run against a freshly inserted block, typically to focus it.
pub type InsertCallback<H> = Box<dyn FnOnce(&mut Block<H>, &H) -> Result<(), EditorError>>;

/// Block editor over a presentation host.
pub struct Editor<H: Host> {
    host: H,
    root: H::Node,
    blocks: Vec<Block<H>>,
    requests: RequestQueue,
    config: EditorConfig,
    emitter: EventEmitter<BlockEvent>,
}

impl<H: Host> std::fmt::Debug for Editor<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("root", &self.root)
            .field("blocks", &self.blocks)
            .finish()
    }
}

impl<H: Host> Editor<H> {
    /// Create an editor inside `container`, seeded from `config`.
    pub fn new(host: H, container: &H::Node, config: EditorConfig) -> Result<Self, EditorError> {
        let root = host.create_element("div")?;
        host.set_class(&root, EDITOR_CLASS)?;
        host.append_child(container, &root)?;

        let mut editor = Self {
            host,
            root,
            blocks: Vec::new(),
            requests: Rc::new(RefCell::new(VecDeque::new())),
            config,
            emitter: EventEmitter::new(),
        };

        let seed = editor.config.seed.clone();
        for entry in &seed {
            let block = Block::from_seed(entry, &editor.config);
            editor.append_component(block)?;
        }
        tracing::debug!(blocks = editor.blocks.len(), "editor created");
        Ok(editor)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The editor's root node inside the container.
    pub fn root(&self) -> &H::Node {
        &self.root
    }

    pub fn blocks(&self) -> &[Block<H>] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, id: BlockId) -> Option<&Block<H>> {
        self.blocks.iter().find(|block| block.id() == id)
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block<H>> {
        self.blocks.iter_mut().find(|block| block.id() == id)
    }

    pub fn previous_sibling(&self, id: BlockId) -> Option<&Block<H>> {
        let index = self.index_of(id)?;
        index.checked_sub(1).and_then(|i| self.blocks.get(i))
    }

    pub fn next_sibling(&self, id: BlockId) -> Option<&Block<H>> {
        let index = self.index_of(id)?;
        self.blocks.get(index + 1)
    }

    /// Focus the first block.
    pub fn focus(&self) -> Result<(), EditorError> {
        match self.blocks.first() {
            Some(block) => block.focus(&self.host),
            None => Ok(()),
        }
    }

    /// Add a block at the end of the document.
    pub fn append_component(&mut self, mut block: Block<H>) -> Result<BlockId, EditorError> {
        let id = block.id();
        let kind = block.kind();
        forward_requests(&mut block, &self.requests);
        let node = block.render(&self.host)?;
        self.host.append_child(&self.root, &node)?;
        self.blocks.push(block);
        tracing::debug!(%id, kind = kind.as_str(), "block appended");
        Ok(id)
    }

    /// Insert `block` immediately after `reference`, in both the sequence and
    /// the presentation tree, then run `callback` on it.
    ///
    /// Fails with `NotFound` without modifying anything when `reference` is
    /// not a top-level block of this editor.
    pub fn insert_component_after(
        &mut self,
        reference: BlockId,
        mut block: Block<H>,
        callback: Option<InsertCallback<H>>,
    ) -> Result<BlockId, EditorError> {
        let index = self
            .index_of(reference)
            .ok_or(EditorError::NotFound(reference))?;
        let reference_node = self.blocks[index]
            .node()
            .cloned()
            .ok_or(EditorError::NotRendered(reference))?;

        let id = block.id();
        forward_requests(&mut block, &self.requests);
        let node = block.render(&self.host)?;
        self.host.insert_after(&self.root, &node, &reference_node)?;
        self.blocks.insert(index + 1, block);
        tracing::debug!(%reference, %id, position = index + 1, "block inserted");

        if let Some(callback) = callback {
            callback(&mut self.blocks[index + 1], &self.host)?;
        }
        Ok(id)
    }

    /// Deliver a key press on block `target` (top-level or list item).
    pub fn handle_key(&mut self, target: BlockId, key: &str) -> Result<KeyOutcome, EditorError> {
        if let Some(index) = self.index_of(target) {
            let has_next = index + 1 < self.blocks.len();
            let outcome = self.blocks[index].on_key_press(key, has_next);
            if outcome == KeyOutcome::FocusNext {
                self.blocks[index + 1].focus(&self.host)?;
            }
            self.process_requests()?;
            return Ok(outcome);
        }

        for block in &mut self.blocks {
            if let Block::List(list) = block {
                if let Some(outcome) = list.handle_key(&self.host, target, key)? {
                    return Ok(outcome);
                }
            }
        }
        Err(EditorError::NotFound(target))
    }

    /// Apply user input to block `target` (top-level or list item), then
    /// notify the editor's `change` listeners.
    pub fn handle_input(&mut self, target: BlockId, value: &str) -> Result<(), EditorError> {
        let kind = self.set_text(target, value)?;
        self.emitter.dispatch(
            CHANGE_EVENT,
            &BlockEvent::Change { id: target, kind },
        );
        Ok(())
    }

    /// Multi-line summary of the document model, for diagnostics.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                Block::Header(header) => {
                    let _ = writeln!(out, "header h{} {:?}", header.level(), header.text());
                }
                Block::Paragraph(paragraph) => {
                    let _ = writeln!(out, "paragraph {:?}", paragraph.text());
                }
                Block::List(list) => {
                    let _ = writeln!(out, "unordered-list");
                    for item in list.items() {
                        let _ = writeln!(out, "  list-item {:?}", item.text());
                    }
                }
            }
        }
        out.truncate(out.trim_end().len());
        out
    }

    fn set_text(&mut self, target: BlockId, value: &str) -> Result<BlockKind, EditorError> {
        for block in &mut self.blocks {
            if block.id() == target {
                if block.set_text(&self.host, value)? {
                    return Ok(block.kind());
                }
                // Lists carry no text of their own.
                return Err(EditorError::NotFound(target));
            }
            if let Block::List(list) = block {
                if list.set_item_text(&self.host, target, value)? {
                    return Ok(BlockKind::ListItem);
                }
            }
        }
        Err(EditorError::NotFound(target))
    }

    fn index_of(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|block| block.id() == id)
    }

    fn process_requests(&mut self) -> Result<(), EditorError> {
        loop {
            let next = self.requests.borrow_mut().pop_front();
            let Some(request) = next else {
                return Ok(());
            };
            let block = Block::from_request(&request.block, &self.config);
            let callback: Option<InsertCallback<H>> = match request.then {
                AfterInsert::Focus => {
                    Some(Box::new(|block: &mut Block<H>, host: &H| block.focus(host)))
                }
                AfterInsert::Nothing => None,
            };
            self.insert_component_after(request.reference, block, callback)?;
        }
    }
}

impl<H: Host> Observable for Editor<H> {
    type Event = BlockEvent;

    fn emitter(&self) -> &EventEmitter<BlockEvent> {
        &self.emitter
    }

    fn emitter_mut(&mut self) -> &mut EventEmitter<BlockEvent> {
        &mut self.emitter
    }
}
