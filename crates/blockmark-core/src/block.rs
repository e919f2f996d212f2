//! The component contract shared by every block, and the top-level `Block` enum.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::config::{EditorConfig, SeedBlock};
use crate::error::EditorError;
use crate::events::{BlockEvent, CREATE_EVENT, CreateRequest, EventEmitter, NewBlock, Observable};
use crate::header::Header;
use crate::list::{ListItem, UnorderedList};
use crate::paragraph::Paragraph;
use crate::platform::Host;
use crate::types::{BLOCK_ID_ATTR, BlockId, BlockKind, ENTER_KEY, KeyOutcome};

/// Class carried by every block's wrapper node.
pub const COMPONENT_CLASS: &str = "md-component";

/// Creation requests waiting for their container to handle them.
pub(crate) type RequestQueue = Rc<RefCell<VecDeque<CreateRequest>>>;

/// Shared contract of every block kind.
///
/// A component owns at most one wrapper node in the presentation tree,
/// created by the first `render` call and reused from then on.
pub trait Component<H: Host>: Observable<Event = BlockEvent> {
    fn id(&self) -> BlockId;

    fn kind(&self) -> BlockKind;

    /// The wrapper node, if the component has been rendered.
    fn node(&self) -> Option<&H::Node>;

    /// Build the component's presentation.
    ///
    /// The first call creates and caches the wrapper node. Later calls clear
    /// the wrapper's children and rebuild them inside the same wrapper, so a
    /// component never has two wrappers in the tree.
    fn render(&mut self, host: &H) -> Result<H::Node, EditorError>;

    /// Move input focus to the component's editable control.
    fn focus(&self, host: &H) -> Result<(), EditorError>;

    /// Handle a key press on the component's control.
    ///
    /// `has_next` tells the component whether its container holds a block
    /// after it.
    fn on_key_press(&mut self, key: &str, has_next: bool) -> KeyOutcome;
}

/// Create the wrapper on first render, or empty it for a rebuild.
pub(crate) fn prepare_wrapper<H: Host>(
    host: &H,
    slot: &mut Option<H::Node>,
    tag: &str,
    class: &str,
    id: BlockId,
) -> Result<H::Node, EditorError> {
    if let Some(element) = slot.as_ref() {
        host.clear_children(element)?;
        return Ok(element.clone());
    }
    let element = host.create_element(tag)?;
    host.set_class(&element, class)?;
    host.set_attribute(&element, BLOCK_ID_ATTR, &id.to_string())?;
    *slot = Some(element.clone());
    Ok(element)
}

/// Create an editable control tagged with its owner's id.
pub(crate) fn create_control<H: Host>(
    host: &H,
    tag: &str,
    id: BlockId,
    value: &str,
    placeholder: &str,
) -> Result<H::Node, EditorError> {
    let control = host.create_element(tag)?;
    host.set_attribute(&control, BLOCK_ID_ATTR, &id.to_string())?;
    host.set_value(&control, value)?;
    host.set_placeholder(&control, placeholder)?;
    Ok(control)
}

/// The Enter protocol: focus the existing next sibling, or ask the container
/// for a new one built from `template`.
pub(crate) fn enter_creates<C>(
    component: &mut C,
    id: BlockId,
    key: &str,
    has_next: bool,
    template: NewBlock,
) -> KeyOutcome
where
    C: Observable<Event = BlockEvent>,
{
    if key != ENTER_KEY {
        return KeyOutcome::PassThrough;
    }
    if has_next {
        return KeyOutcome::FocusNext;
    }
    let request = CreateRequest {
        reference: id,
        block: template,
        then: Default::default(),
    };
    if component.dispatch(CREATE_EVENT, &BlockEvent::Create(request)) == 0 {
        tracing::warn!(%id, "creation request dispatched with no container listening");
    }
    KeyOutcome::Handled
}

/// Subscribe `queue` to a child's creation requests.
pub(crate) fn forward_requests<C>(child: &mut C, queue: &RequestQueue)
where
    C: Observable<Event = BlockEvent>,
{
    let queue = Rc::clone(queue);
    child.add_listener(CREATE_EVENT, move |event: &BlockEvent| {
        if let BlockEvent::Create(request) = event {
            queue.borrow_mut().push_back(request.clone());
        }
    });
}

/// A top-level document block.
pub enum Block<H: Host> {
    Header(Header<H>),
    Paragraph(Paragraph<H>),
    List(UnorderedList<H>),
}

impl<H: Host> std::fmt::Debug for Block<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Block::Header(header) => std::fmt::Debug::fmt(header, f),
            Block::Paragraph(paragraph) => std::fmt::Debug::fmt(paragraph, f),
            Block::List(list) => std::fmt::Debug::fmt(list, f),
        }
    }
}

impl<H: Host> Block<H> {
    /// Build a block from configured seed content.
    pub fn from_seed(seed: &SeedBlock, config: &EditorConfig) -> Self {
        match seed {
            SeedBlock::Header { level, text } => Block::Header(
                Header::new(*level, text.clone()).with_placeholder(&config.header_placeholder),
            ),
            SeedBlock::Paragraph { text } => {
                Block::Paragraph(Paragraph::from_config(text.clone(), config))
            }
            SeedBlock::UnorderedList { items } => Block::List(UnorderedList::new(
                items.iter().cloned().map(ListItem::new).collect(),
            )),
        }
    }

    /// Build the block a creation request asks for.
    ///
    /// Top-level containers hold no bare list items, so a list item request
    /// becomes a new single-item list.
    pub fn from_request(template: &NewBlock, config: &EditorConfig) -> Self {
        match template {
            NewBlock::Paragraph { text } => {
                Block::Paragraph(Paragraph::from_config(text.clone(), config))
            }
            NewBlock::ListItem { text } => {
                Block::List(UnorderedList::new(vec![ListItem::new(text.clone())]))
            }
        }
    }

    pub fn as_header(&self) -> Option<&Header<H>> {
        match self {
            Block::Header(header) => Some(header),
            _ => None,
        }
    }

    pub fn as_header_mut(&mut self) -> Option<&mut Header<H>> {
        match self {
            Block::Header(header) => Some(header),
            _ => None,
        }
    }

    pub fn as_paragraph(&self) -> Option<&Paragraph<H>> {
        match self {
            Block::Paragraph(paragraph) => Some(paragraph),
            _ => None,
        }
    }

    pub fn as_paragraph_mut(&mut self) -> Option<&mut Paragraph<H>> {
        match self {
            Block::Paragraph(paragraph) => Some(paragraph),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&UnorderedList<H>> {
        match self {
            Block::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut UnorderedList<H>> {
        match self {
            Block::List(list) => Some(list),
            _ => None,
        }
    }

    /// Text of a text-bearing block. Lists have none.
    pub fn text(&self) -> Option<&str> {
        match self {
            Block::Header(header) => Some(header.text()),
            Block::Paragraph(paragraph) => Some(paragraph.text()),
            Block::List(_) => None,
        }
    }

    /// Set the text of a text-bearing block. Returns false for lists.
    pub fn set_text(&mut self, host: &H, text: &str) -> Result<bool, EditorError> {
        match self {
            Block::Header(header) => header.set_text(host, text).map(|_| true),
            Block::Paragraph(paragraph) => paragraph.set_text(host, text).map(|_| true),
            Block::List(_) => Ok(false),
        }
    }
}

impl<H: Host> Observable for Block<H> {
    type Event = BlockEvent;

    fn emitter(&self) -> &EventEmitter<BlockEvent> {
        match self {
            Block::Header(header) => header.emitter(),
            Block::Paragraph(paragraph) => paragraph.emitter(),
            Block::List(list) => list.emitter(),
        }
    }

    fn emitter_mut(&mut self) -> &mut EventEmitter<BlockEvent> {
        match self {
            Block::Header(header) => header.emitter_mut(),
            Block::Paragraph(paragraph) => paragraph.emitter_mut(),
            Block::List(list) => list.emitter_mut(),
        }
    }
}

impl<H: Host> Component<H> for Block<H> {
    fn id(&self) -> BlockId {
        match self {
            Block::Header(header) => header.id(),
            Block::Paragraph(paragraph) => paragraph.id(),
            Block::List(list) => list.id(),
        }
    }

    fn kind(&self) -> BlockKind {
        match self {
            Block::Header(_) => BlockKind::Header,
            Block::Paragraph(_) => BlockKind::Paragraph,
            Block::List(_) => BlockKind::UnorderedList,
        }
    }

    fn node(&self) -> Option<&H::Node> {
        match self {
            Block::Header(header) => header.node(),
            Block::Paragraph(paragraph) => paragraph.node(),
            Block::List(list) => list.node(),
        }
    }

    fn render(&mut self, host: &H) -> Result<H::Node, EditorError> {
        match self {
            Block::Header(header) => header.render(host),
            Block::Paragraph(paragraph) => paragraph.render(host),
            Block::List(list) => list.render(host),
        }
    }

    fn focus(&self, host: &H) -> Result<(), EditorError> {
        match self {
            Block::Header(header) => header.focus(host),
            Block::Paragraph(paragraph) => paragraph.focus(host),
            Block::List(list) => list.focus(host),
        }
    }

    fn on_key_press(&mut self, key: &str, has_next: bool) -> KeyOutcome {
        match self {
            Block::Header(header) => header.on_key_press(key, has_next),
            Block::Paragraph(paragraph) => paragraph.on_key_press(key, has_next),
            Block::List(list) => list.on_key_press(key, has_next),
        }
    }
}

impl<H: Host> From<Header<H>> for Block<H> {
    fn from(header: Header<H>) -> Self {
        Block::Header(header)
    }
}

impl<H: Host> From<Paragraph<H>> for Block<H> {
    fn from(paragraph: Paragraph<H>) -> Self {
        Block::Paragraph(paragraph)
    }
}

impl<H: Host> From<UnorderedList<H>> for Block<H> {
    fn from(list: UnorderedList<H>) -> Self {
        Block::List(list)
    }
}
