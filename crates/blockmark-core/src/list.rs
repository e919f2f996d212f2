//! Unordered lists and their items.
//!
//! A list owns its items and handles their creation requests itself: an
//! Enter on the last item adds a new item to the same list and never reaches
//! the editor.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::block::{
    COMPONENT_CLASS, Component, RequestQueue, create_control, enter_creates, forward_requests,
    prepare_wrapper,
};
use crate::error::EditorError;
use crate::events::{AfterInsert, BlockEvent, CHANGE_EVENT, EventEmitter, NewBlock, Observable};
use crate::platform::Host;
use crate::types::{BlockId, BlockKind, KeyOutcome};

const LIST_CLASS: &str = "md-unordered-list";
const LIST_ITEM_CLASS: &str = "md-list-item";

/// Item order of a list, shared with its items so they can compute their
/// position. Items only hold a `Weak` to it.
type Roster = Rc<RefCell<Vec<BlockId>>>;

/// A single list entry with a one-line input.
pub struct ListItem<H: Host> {
    id: BlockId,
    text: String,
    list: Weak<RefCell<Vec<BlockId>>>,
    element: Option<H::Node>,
    input: Option<H::Node>,
    emitter: EventEmitter<BlockEvent>,
}

impl<H: Host> std::fmt::Debug for ListItem<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListItem")
            .field("id", &self.id)
            .field("text", &self.text)
            .field("position", &self.position())
            .field("rendered", &self.element.is_some())
            .finish()
    }
}

impl<H: Host> ListItem<H> {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: BlockId::fresh(),
            text: text.into(),
            list: Weak::new(),
            element: None,
            input: None,
            emitter: EventEmitter::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Zero-based position within the owning list, if attached to one.
    pub fn position(&self) -> Option<usize> {
        let roster = self.list.upgrade()?;
        let position = roster.borrow().iter().position(|id| *id == self.id);
        position
    }

    /// `Item {n}` for the 1-based position, recomputed on every call.
    pub fn placeholder(&self) -> String {
        match self.position() {
            Some(position) => format!("Item {}", position + 1),
            None => "Item".to_string(),
        }
    }

    /// The input control, if rendered.
    pub fn input_node(&self) -> Option<&H::Node> {
        self.input.as_ref()
    }

    pub fn set_text(&mut self, host: &H, text: impl Into<String>) -> Result<(), EditorError> {
        self.text = text.into();
        self.on_value_change(host)
    }

    fn attach(&mut self, roster: &Roster) {
        self.list = Rc::downgrade(roster);
    }

    fn refresh_placeholder(&self, host: &H) -> Result<(), EditorError> {
        if let Some(input) = &self.input {
            host.set_placeholder(input, &self.placeholder())?;
        }
        Ok(())
    }

    fn on_value_change(&mut self, host: &H) -> Result<(), EditorError> {
        if let Some(input) = &self.input {
            host.set_value(input, &self.text)?;
        }
        tracing::trace!(id = %self.id, "list item changed");
        self.emitter.dispatch(
            CHANGE_EVENT,
            &BlockEvent::Change {
                id: self.id,
                kind: BlockKind::ListItem,
            },
        );
        Ok(())
    }
}

impl<H: Host> Observable for ListItem<H> {
    type Event = BlockEvent;

    fn emitter(&self) -> &EventEmitter<BlockEvent> {
        &self.emitter
    }

    fn emitter_mut(&mut self) -> &mut EventEmitter<BlockEvent> {
        &mut self.emitter
    }
}

impl<H: Host> Component<H> for ListItem<H> {
    fn id(&self) -> BlockId {
        self.id
    }

    fn kind(&self) -> BlockKind {
        BlockKind::ListItem
    }

    fn node(&self) -> Option<&H::Node> {
        self.element.as_ref()
    }

    fn render(&mut self, host: &H) -> Result<H::Node, EditorError> {
        let element = prepare_wrapper(host, &mut self.element, "li", COMPONENT_CLASS, self.id)?;
        host.add_class(&element, LIST_ITEM_CLASS)?;

        let input = create_control(host, "input", self.id, &self.text, &self.placeholder())?;
        host.append_child(&element, &input)?;

        self.input = Some(input);
        Ok(element)
    }

    fn focus(&self, host: &H) -> Result<(), EditorError> {
        if let Some(input) = &self.input {
            host.focus(input)?;
        }
        Ok(())
    }

    fn on_key_press(&mut self, key: &str, has_next: bool) -> KeyOutcome {
        let id = self.id;
        enter_creates(self, id, key, has_next, NewBlock::ListItem {
            text: String::new(),
        })
    }
}

/// A bulleted list: `div.md-component > ul.md-unordered-list > li...`.
pub struct UnorderedList<H: Host> {
    id: BlockId,
    items: Vec<ListItem<H>>,
    roster: Roster,
    requests: RequestQueue,
    element: Option<H::Node>,
    list: Option<H::Node>,
    emitter: EventEmitter<BlockEvent>,
}

impl<H: Host> std::fmt::Debug for UnorderedList<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnorderedList")
            .field("id", &self.id)
            .field("items", &self.items)
            .field("rendered", &self.element.is_some())
            .finish()
    }
}

impl<H: Host> UnorderedList<H> {
    pub fn new(items: Vec<ListItem<H>>) -> Self {
        let mut list = Self {
            id: BlockId::fresh(),
            items: Vec::new(),
            roster: Rc::new(RefCell::new(Vec::new())),
            requests: Rc::new(RefCell::new(VecDeque::new())),
            element: None,
            list: None,
            emitter: EventEmitter::new(),
        };
        list.adopt_all(items);
        list
    }

    pub fn items(&self) -> &[ListItem<H>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, id: BlockId) -> Option<&ListItem<H>> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn item_mut(&mut self, id: BlockId) -> Option<&mut ListItem<H>> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    pub fn previous_item_of(&self, id: BlockId) -> Option<&ListItem<H>> {
        let index = self.index_of(id)?;
        index.checked_sub(1).and_then(|i| self.items.get(i))
    }

    pub fn next_item_of(&self, id: BlockId) -> Option<&ListItem<H>> {
        let index = self.index_of(id)?;
        self.items.get(index + 1)
    }

    /// The `ul` node, if rendered.
    pub fn list_node(&self) -> Option<&H::Node> {
        self.list.as_ref()
    }

    /// Replace every item and rebuild the list's presentation.
    pub fn set_items(&mut self, host: &H, items: Vec<ListItem<H>>) -> Result<(), EditorError> {
        self.items.clear();
        self.roster.borrow_mut().clear();
        self.adopt_all(items);
        self.on_value_change(host)
    }

    /// Add an item at the end of the list.
    pub fn append_item(&mut self, host: &H, mut item: ListItem<H>) -> Result<(), EditorError> {
        self.adopt(&mut item);
        self.roster.borrow_mut().push(item.id());
        self.items.push(item);
        if let Some(list) = self.list.clone() {
            let index = self.items.len() - 1;
            let node = self.items[index].render(host)?;
            host.append_child(&list, &node)?;
        }
        Ok(())
    }

    /// Insert `item` immediately after the item `reference`, in both the
    /// sequence and the presentation tree.
    pub fn insert_item_after(
        &mut self,
        host: &H,
        reference: BlockId,
        mut item: ListItem<H>,
        then: AfterInsert,
    ) -> Result<BlockId, EditorError> {
        let index = self
            .index_of(reference)
            .ok_or(EditorError::NotFound(reference))?;
        let reference_node = match &self.list {
            Some(_) => Some(
                self.items[index]
                    .node()
                    .cloned()
                    .ok_or(EditorError::NotRendered(reference))?,
            ),
            None => None,
        };

        let id = item.id();
        self.adopt(&mut item);
        self.items.insert(index + 1, item);
        self.roster.borrow_mut().insert(index + 1, id);

        if let (Some(list), Some(reference_node)) = (self.list.clone(), reference_node) {
            let node = self.items[index + 1].render(host)?;
            host.insert_after(&list, &node, &reference_node)?;
            self.refresh_placeholders(host)?;
        }
        tracing::debug!(list = %self.id, %reference, new = %id, "list item inserted");

        if then == AfterInsert::Focus {
            self.items[index + 1].focus(host)?;
        }
        Ok(id)
    }

    /// Deliver a key press to item `target`.
    ///
    /// Returns `None` when the item is not in this list.
    pub fn handle_key(
        &mut self,
        host: &H,
        target: BlockId,
        key: &str,
    ) -> Result<Option<KeyOutcome>, EditorError> {
        let Some(index) = self.index_of(target) else {
            return Ok(None);
        };
        let has_next = index + 1 < self.items.len();
        let outcome = self.items[index].on_key_press(key, has_next);
        if outcome == KeyOutcome::FocusNext {
            self.items[index + 1].focus(host)?;
        }
        self.process_requests(host)?;
        Ok(Some(outcome))
    }

    /// Set the text of item `target`. Returns false when it is not ours.
    pub fn set_item_text(
        &mut self,
        host: &H,
        target: BlockId,
        text: &str,
    ) -> Result<bool, EditorError> {
        match self.item_mut(target) {
            Some(item) => item.set_text(host, text).map(|_| true),
            None => Ok(false),
        }
    }

    fn index_of(&self, id: BlockId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    fn adopt(&self, item: &mut ListItem<H>) {
        item.attach(&self.roster);
        forward_requests(item, &self.requests);
    }

    fn adopt_all(&mut self, items: Vec<ListItem<H>>) {
        for mut item in items {
            self.adopt(&mut item);
            self.roster.borrow_mut().push(item.id());
            self.items.push(item);
        }
    }

    fn refresh_placeholders(&self, host: &H) -> Result<(), EditorError> {
        for item in &self.items {
            item.refresh_placeholder(host)?;
        }
        Ok(())
    }

    fn process_requests(&mut self, host: &H) -> Result<(), EditorError> {
        loop {
            let next = self.requests.borrow_mut().pop_front();
            let Some(request) = next else {
                return Ok(());
            };
            let text = match request.block {
                NewBlock::ListItem { text } | NewBlock::Paragraph { text } => text,
            };
            self.insert_item_after(host, request.reference, ListItem::new(text), request.then)?;
        }
    }

    fn render_items(&mut self, host: &H, list: &H::Node) -> Result<(), EditorError> {
        host.clear_children(list)?;
        for item in &mut self.items {
            let node = item.render(host)?;
            host.append_child(list, &node)?;
        }
        Ok(())
    }

    fn on_value_change(&mut self, host: &H) -> Result<(), EditorError> {
        if let Some(list) = self.list.clone() {
            self.render_items(host, &list)?;
        }
        tracing::trace!(id = %self.id, items = self.items.len(), "list changed");
        self.emitter.dispatch(
            CHANGE_EVENT,
            &BlockEvent::Change {
                id: self.id,
                kind: BlockKind::UnorderedList,
            },
        );
        Ok(())
    }
}

impl<H: Host> Observable for UnorderedList<H> {
    type Event = BlockEvent;

    fn emitter(&self) -> &EventEmitter<BlockEvent> {
        &self.emitter
    }

    fn emitter_mut(&mut self) -> &mut EventEmitter<BlockEvent> {
        &mut self.emitter
    }
}

impl<H: Host> Component<H> for UnorderedList<H> {
    fn id(&self) -> BlockId {
        self.id
    }

    fn kind(&self) -> BlockKind {
        BlockKind::UnorderedList
    }

    fn node(&self) -> Option<&H::Node> {
        self.element.as_ref()
    }

    fn render(&mut self, host: &H) -> Result<H::Node, EditorError> {
        let element = prepare_wrapper(host, &mut self.element, "div", COMPONENT_CLASS, self.id)?;

        let list = host.create_element("ul")?;
        host.set_class(&list, LIST_CLASS)?;
        self.render_items(host, &list)?;
        host.append_child(&element, &list)?;

        self.list = Some(list);
        Ok(element)
    }

    /// Lists have no control of their own; focus goes to the first item.
    fn focus(&self, host: &H) -> Result<(), EditorError> {
        match self.items.first() {
            Some(item) => item.focus(host),
            None => Ok(()),
        }
    }

    fn on_key_press(&mut self, _key: &str, _has_next: bool) -> KeyOutcome {
        KeyOutcome::PassThrough
    }
}
