//! Paragraph block: a textarea sized to its content.
//!
//! Resizing is deferred to idle time so it never competes with typing. Every
//! value change cancels the pending resize and schedules a fresh one, so a
//! burst of keystrokes settles into a single resize.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::block::{COMPONENT_CLASS, Component, create_control, enter_creates, prepare_wrapper};
use crate::config::{EditorConfig, PARAGRAPH_COLUMNS, PARAGRAPH_PLACEHOLDER, RESIZE_TIMEOUT_MS};
use crate::error::EditorError;
use crate::events::{BlockEvent, CHANGE_EVENT, EventEmitter, NewBlock, Observable};
use crate::platform::{Host, IdleHandle};
use crate::types::{BlockId, BlockKind, KeyOutcome};

const PARAGRAPH_CLASS: &str = "md-paragraph";

pub struct Paragraph<H: Host> {
    id: BlockId,
    text: String,
    placeholder: String,
    columns: usize,
    resize_timeout: Duration,
    element: Option<H::Node>,
    input: Option<H::Node>,
    /// Pending resize. Cleared by the task itself when it runs.
    resize_task: Rc<Cell<Option<IdleHandle>>>,
    emitter: EventEmitter<BlockEvent>,
}

impl<H: Host> std::fmt::Debug for Paragraph<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paragraph")
            .field("id", &self.id)
            .field("text", &self.text)
            .field("columns", &self.columns)
            .field("rendered", &self.element.is_some())
            .field("resize_pending", &self.resize_pending())
            .finish()
    }
}

impl<H: Host> Paragraph<H> {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: BlockId::fresh(),
            text: text.into(),
            placeholder: PARAGRAPH_PLACEHOLDER.to_string(),
            columns: PARAGRAPH_COLUMNS,
            resize_timeout: Duration::from_millis(RESIZE_TIMEOUT_MS),
            element: None,
            input: None,
            resize_task: Rc::new(Cell::new(None)),
            emitter: EventEmitter::new(),
        }
    }

    /// Create a paragraph using the configured placeholder, width and timeout.
    pub fn from_config(text: impl Into<String>, config: &EditorConfig) -> Self {
        let mut paragraph = Self::new(text);
        paragraph.placeholder = config.paragraph_placeholder.clone();
        paragraph.columns = config.paragraph_columns;
        paragraph.resize_timeout = config.resize_timeout();
        paragraph
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// The textarea, if rendered.
    pub fn input_node(&self) -> Option<&H::Node> {
        self.input.as_ref()
    }

    pub fn set_text(&mut self, host: &H, text: impl Into<String>) -> Result<(), EditorError> {
        self.text = text.into();
        self.on_value_change(host)
    }

    /// Rows needed to show the text (or the placeholder, when empty) at the
    /// configured wrap width. Length is measured in `char`s.
    pub fn rows(&self) -> u32 {
        let shown = if self.text.is_empty() {
            &self.placeholder
        } else {
            &self.text
        };
        let len = shown.chars().count();
        len.div_ceil(self.columns.max(1)) as u32
    }

    /// Whether a resize is scheduled and has not run yet.
    pub fn resize_pending(&self) -> bool {
        self.resize_task.get().is_some()
    }

    fn on_value_change(&mut self, host: &H) -> Result<(), EditorError> {
        if let Some(input) = &self.input {
            host.set_value(input, &self.text)?;
        }
        self.schedule_resize(host)?;
        tracing::trace!(id = %self.id, "paragraph changed");
        self.emitter.dispatch(
            CHANGE_EVENT,
            &BlockEvent::Change {
                id: self.id,
                kind: BlockKind::Paragraph,
            },
        );
        Ok(())
    }

    /// Replace any pending resize with a new one.
    fn schedule_resize(&self, host: &H) -> Result<(), EditorError> {
        let Some(input) = self.input.clone() else {
            return Ok(());
        };
        if let Some(pending) = self.resize_task.take() {
            host.cancel_idle(pending);
        }

        let rows = self.rows();
        let slot = Rc::clone(&self.resize_task);
        let task_host = host.clone();
        let id = self.id;
        let handle = host.request_idle(
            self.resize_timeout,
            Box::new(move || {
                slot.set(None);
                if let Err(err) = task_host.set_rows(&input, rows) {
                    tracing::warn!(%id, %err, "paragraph resize failed");
                }
            }),
        )?;
        tracing::trace!(%id, rows, ?handle, "paragraph resize scheduled");
        self.resize_task.set(Some(handle));
        Ok(())
    }
}

impl<H: Host> Observable for Paragraph<H> {
    type Event = BlockEvent;

    fn emitter(&self) -> &EventEmitter<BlockEvent> {
        &self.emitter
    }

    fn emitter_mut(&mut self) -> &mut EventEmitter<BlockEvent> {
        &mut self.emitter
    }
}

impl<H: Host> Component<H> for Paragraph<H> {
    fn id(&self) -> BlockId {
        self.id
    }

    fn kind(&self) -> BlockKind {
        BlockKind::Paragraph
    }

    fn node(&self) -> Option<&H::Node> {
        self.element.as_ref()
    }

    fn render(&mut self, host: &H) -> Result<H::Node, EditorError> {
        let element = prepare_wrapper(host, &mut self.element, "div", COMPONENT_CLASS, self.id)?;

        let paragraph = host.create_element("p")?;
        host.set_class(&paragraph, PARAGRAPH_CLASS)?;
        let input = create_control(host, "textarea", self.id, &self.text, &self.placeholder)?;

        host.append_child(&paragraph, &input)?;
        host.append_child(&element, &paragraph)?;

        self.input = Some(input);
        self.schedule_resize(host)?;
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
