//! Header block: a leveled heading with a single-line input.

use crate::block::{COMPONENT_CLASS, Component, create_control, enter_creates, prepare_wrapper};
use crate::config::HEADER_PLACEHOLDER;
use crate::error::EditorError;
use crate::events::{BlockEvent, CHANGE_EVENT, EventEmitter, NewBlock, Observable};
use crate::platform::Host;
use crate::types::{BlockId, BlockKind, KeyOutcome};

const HEADER_CLASS: &str = "md-header";

/// A heading block.
///
/// Rendered as `div.md-component > h{level}.md-header > input`. Tag names
/// cannot change in place, so a level change that alters the tag rebuilds
/// the heading inside the same wrapper.
pub struct Header<H: Host> {
    id: BlockId,
    level: u8,
    text: String,
    placeholder: String,
    element: Option<H::Node>,
    heading: Option<H::Node>,
    input: Option<H::Node>,
    emitter: EventEmitter<BlockEvent>,
}

impl<H: Host> std::fmt::Debug for Header<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Header")
            .field("id", &self.id)
            .field("level", &self.level)
            .field("text", &self.text)
            .field("rendered", &self.element.is_some())
            .finish()
    }
}

impl<H: Host> Header<H> {
    /// Create a header. The level is not validated.
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self {
            id: BlockId::fresh(),
            level,
            text: text.into(),
            placeholder: HEADER_PLACEHOLDER.to_string(),
            element: None,
            heading: None,
            input: None,
            emitter: EventEmitter::new(),
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// The heading node (`h1`..`h6`), if rendered.
    pub fn heading_node(&self) -> Option<&H::Node> {
        self.heading.as_ref()
    }

    /// The input control, if rendered.
    pub fn input_node(&self) -> Option<&H::Node> {
        self.input.as_ref()
    }

    pub fn set_level(&mut self, host: &H, level: u8) -> Result<(), EditorError> {
        self.level = level;
        self.on_value_change(host)
    }

    pub fn set_text(&mut self, host: &H, text: impl Into<String>) -> Result<(), EditorError> {
        self.text = text.into();
        self.on_value_change(host)
    }

    fn tag(&self) -> String {
        format!("h{}", self.level)
    }

    fn on_value_change(&mut self, host: &H) -> Result<(), EditorError> {
        let stale_tag = self
            .heading
            .as_ref()
            .is_some_and(|heading| host.tag_name(heading) != self.tag());
        if stale_tag {
            tracing::debug!(id = %self.id, level = self.level, "header level changed, rebuilding");
            self.render(host)?;
        }
        if let Some(input) = &self.input {
            host.set_value(input, &self.text)?;
        }
        tracing::trace!(id = %self.id, "header changed");
        self.emitter.dispatch(
            CHANGE_EVENT,
            &BlockEvent::Change {
                id: self.id,
                kind: BlockKind::Header,
            },
        );
        Ok(())
    }
}

impl<H: Host> Observable for Header<H> {
    type Event = BlockEvent;

    fn emitter(&self) -> &EventEmitter<BlockEvent> {
        &self.emitter
    }

    fn emitter_mut(&mut self) -> &mut EventEmitter<BlockEvent> {
        &mut self.emitter
    }
}

impl<H: Host> Component<H> for Header<H> {
    fn id(&self) -> BlockId {
        self.id
    }

    fn kind(&self) -> BlockKind {
        BlockKind::Header
    }

    fn node(&self) -> Option<&H::Node> {
        self.element.as_ref()
    }

    fn render(&mut self, host: &H) -> Result<H::Node, EditorError> {
        let element = prepare_wrapper(host, &mut self.element, "div", COMPONENT_CLASS, self.id)?;

        let heading = host.create_element(&self.tag())?;
        host.set_class(&heading, HEADER_CLASS)?;
        let input = create_control(host, "input", self.id, &self.text, &self.placeholder)?;

        host.append_child(&heading, &input)?;
        host.append_child(&element, &heading)?;

        self.heading = Some(heading);
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
        enter_creates(self, id, key, has_next, NewBlock::Paragraph {
            text: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::events::CREATE_EVENT;
    use crate::memory::MemoryHost;
    use crate::platform::Surface;

    fn rendered(level: u8, text: &str) -> (MemoryHost, Header<MemoryHost>) {
        let host = MemoryHost::new();
        let mut header = Header::new(level, text);
        header.render(&host).unwrap();
        (host, header)
    }

    #[test]
    fn test_render_structure() {
        let (host, header) = rendered(2, "Title");
        insta::assert_snapshot!(host.outline(header.node().unwrap()), @r#"
        div.md-component
          h2.md-header
            input value="Title" placeholder="Hello, World!"
        "#);
    }

    #[test]
    fn test_render_reuses_wrapper() {
        let (host, mut header) = rendered(1, "");
        let wrapper = header.node().cloned().unwrap();
        let again = header.render(&host).unwrap();
        assert_eq!(wrapper, again);
        assert_eq!(host.children(&wrapper).len(), 1);
    }

    #[test]
    fn test_level_change_replaces_heading_and_keeps_text() {
        let (host, mut header) = rendered(1, "Keep me");
        let wrapper = header.node().cloned().unwrap();
        let old_heading = header.heading_node().cloned().unwrap();

        header.set_level(&host, 3).unwrap();

        let new_heading = header.heading_node().cloned().unwrap();
        assert_ne!(old_heading, new_heading);
        assert_eq!(host.tag_name(&new_heading), "h3");
        assert!(!host.is_attached(&old_heading, &wrapper));
        assert_eq!(host.children(&wrapper), vec![new_heading]);
        assert_eq!(header.text(), "Keep me");
        assert_eq!(host.value(header.input_node().unwrap()), "Keep me");
        assert_eq!(header.node(), Some(&wrapper));
    }

    #[test]
    fn test_same_level_keeps_heading() {
        let (host, mut header) = rendered(2, "");
        let heading = header.heading_node().cloned().unwrap();
        let input = header.input_node().cloned().unwrap();

        header.set_level(&host, 2).unwrap();

        assert_eq!(header.heading_node(), Some(&heading));
        assert_eq!(header.input_node(), Some(&input));
    }

    #[test]
    fn test_text_change_updates_input_in_place() {
        let (host, mut header) = rendered(1, "");
        let input = header.input_node().cloned().unwrap();
        let changes = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&changes);
        header.add_listener(CHANGE_EVENT, move |event: &BlockEvent| {
            log.borrow_mut().push(event.clone())
        });

        header.set_text(&host, "Hello").unwrap();

        assert_eq!(header.input_node(), Some(&input));
        assert_eq!(host.value(&input), "Hello");
        assert_eq!(
            *changes.borrow(),
            vec![BlockEvent::Change {
                id: header.id(),
                kind: BlockKind::Header
            }]
        );
    }

    #[test]
    fn test_unrendered_setters_still_notify() {
        let host = MemoryHost::new();
        let mut header: Header<MemoryHost> = Header::new(1, "");
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        header.add_listener(CHANGE_EVENT, move |_: &BlockEvent| *counter.borrow_mut() += 1);

        header.set_level(&host, 4).unwrap();
        header.set_text(&host, "x").unwrap();
        assert_eq!(*hits.borrow(), 2);
        assert!(header.node().is_none());
    }

    #[test]
    fn test_enter_without_next_requests_paragraph() {
        let (_host, mut header) = rendered(1, "");
        let requests = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&requests);
        header.add_listener(CREATE_EVENT, move |event: &BlockEvent| {
            log.borrow_mut().push(event.clone())
        });

        assert_eq!(header.on_key_press("Enter", false), KeyOutcome::Handled);
        let requests = requests.borrow();
        assert_eq!(requests.len(), 1);
        match &requests[0] {
            BlockEvent::Create(request) => {
                assert_eq!(request.reference, header.id());
                assert_eq!(
                    request.block,
                    NewBlock::Paragraph {
                        text: String::new()
                    }
                );
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_enter_with_next_focuses_without_request() {
        let (_host, mut header) = rendered(1, "");
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        header.add_listener(CREATE_EVENT, move |_: &BlockEvent| *counter.borrow_mut() += 1);

        assert_eq!(header.on_key_press("Enter", true), KeyOutcome::FocusNext);
        assert_eq!(header.on_key_press("a", false), KeyOutcome::PassThrough);
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn test_focus_targets_input() {
        let (host, header) = rendered(1, "");
        header.focus(&host).unwrap();
        assert_eq!(host.focused().as_ref(), header.input_node());
    }
}
