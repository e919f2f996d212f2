//! Mounting an editor into a page and routing DOM events to it.
//!
//! Events are delegated: one `input` and one `keypress` listener on the
//! editor's root find the originating block through the `data-block-id`
//! attribute every block control carries.
//!
//! Editor `change` events are queued while the editor is borrowed and handed
//! to `on_change` handlers once the routing listener has released it, so
//! handlers are free to read the editor.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use blockmark_core::{
    BLOCK_ID_ATTR, BlockEvent, BlockId, CHANGE_EVENT, Editor, EditorConfig, EditorError,
    EventEmitter, ListenerId, Observable, PlatformError, Surface,
};
use gloo_events::{EventListener, EventListenerOptions};
use wasm_bindgen::JsCast;

use crate::host::BrowserHost;

/// Shared handle to a browser-hosted editor.
pub type SharedEditor = Rc<RefCell<Editor<BrowserHost>>>;

/// Change events waiting for the editor to be released.
type ChangeQueue = Rc<RefCell<VecDeque<BlockEvent>>>;

type ChangeObservers = Rc<RefCell<EventEmitter<BlockEvent>>>;

/// Read the block id carried by `element`, if any.
pub fn parse_block_id(element: &web_sys::Element) -> Option<BlockId> {
    element.get_attribute(BLOCK_ID_ATTR)?.parse().ok()
}

fn event_target(event: &web_sys::Event) -> Option<web_sys::Element> {
    event.target()?.dyn_into::<web_sys::Element>().ok()
}

/// Hand queued change events to the observers. Runs with the editor released.
fn deliver_changes(queue: &ChangeQueue, observers: &ChangeObservers) {
    loop {
        let next = queue.borrow_mut().pop_front();
        let Some(event) = next else {
            return;
        };
        match observers.try_borrow_mut() {
            Ok(mut observers) => {
                observers.dispatch(CHANGE_EVENT, &event);
            }
            Err(_) => tracing::warn!(?event, "change observers busy, notification dropped"),
        }
    }
}

fn route_input(editor: &SharedEditor, target: &web_sys::Element, id: BlockId) {
    let Ok(mut editor) = editor.try_borrow_mut() else {
        tracing::warn!(%id, "editor busy, input dropped");
        return;
    };
    let value = editor.host().value(target);
    if let Err(err) = editor.handle_input(id, &value) {
        tracing::warn!(%id, %err, "input routing failed");
    }
}

/// Returns whether the browser's default action should be prevented.
fn route_key(editor: &SharedEditor, id: BlockId, key: &str) -> bool {
    let Ok(mut editor) = editor.try_borrow_mut() else {
        tracing::warn!(%id, "editor busy, key press dropped");
        return false;
    };
    match editor.handle_key(id, key) {
        Ok(outcome) => outcome.prevents_default(),
        Err(err) => {
            tracing::warn!(%id, %err, "key routing failed");
            false
        }
    }
}

/// An editor attached to the page. Dropping it removes the event listeners.
pub struct MountedEditor {
    editor: SharedEditor,
    observers: ChangeObservers,
    _listeners: Vec<EventListener>,
}

impl std::fmt::Debug for MountedEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountedEditor")
            .field("editor", &self.editor)
            .field("observers", &self.observers)
            .finish()
    }
}

impl MountedEditor {
    pub fn editor(&self) -> &SharedEditor {
        &self.editor
    }

    /// Register a handler for the editor's `change` events.
    ///
    /// Handlers run after the routing listener has released the editor.
    pub fn on_change<F>(&self, handler: F) -> Result<ListenerId, EditorError>
    where
        F: FnMut(&BlockEvent) + 'static,
    {
        let mut observers = self
            .observers
            .try_borrow_mut()
            .map_err(|_| PlatformError::from("change observers busy"))?;
        Ok(observers.add_listener(CHANGE_EVENT, handler))
    }

    /// Remove a handler added with `on_change`.
    pub fn remove_change_handler(&self, id: ListenerId) -> Result<bool, EditorError> {
        let mut observers = self
            .observers
            .try_borrow_mut()
            .map_err(|_| PlatformError::from("change observers busy"))?;
        Ok(observers.remove_listener(CHANGE_EVENT, id))
    }

    /// Remove the listeners and the editor's root node from the page.
    pub fn unmount(self) {
        let MountedEditor {
            editor,
            observers: _,
            _listeners: listeners,
        } = self;
        drop(listeners);
        match editor.try_borrow() {
            Ok(editor) => editor.root().remove(),
            Err(_) => tracing::warn!("editor busy during unmount, root left in place"),
        }
    }
}

/// Build an editor inside `container` and start routing its events.
pub fn mount(
    container: &web_sys::Element,
    config: EditorConfig,
) -> Result<MountedEditor, EditorError> {
    let host = BrowserHost::new()?;
    let mut editor = Editor::new(host, container, config)?;
    let root = editor.root().clone();

    let queue: ChangeQueue = Rc::new(RefCell::new(VecDeque::new()));
    let observers: ChangeObservers = Rc::new(RefCell::new(EventEmitter::new()));
    {
        let queue = Rc::clone(&queue);
        editor.add_listener(CHANGE_EVENT, move |event: &BlockEvent| {
            queue.borrow_mut().push_back(event.clone());
        });
    }
    let editor = Rc::new(RefCell::new(editor));

    let on_input = {
        let editor = Rc::clone(&editor);
        let queue = Rc::clone(&queue);
        let observers = Rc::clone(&observers);
        EventListener::new(&root, "input", move |event| {
            let Some(target) = event_target(event) else {
                return;
            };
            let Some(id) = parse_block_id(&target) else {
                return;
            };
            route_input(&editor, &target, id);
            deliver_changes(&queue, &observers);
        })
    };

    let on_keypress = {
        let editor = Rc::clone(&editor);
        let queue = Rc::clone(&queue);
        let observers = Rc::clone(&observers);
        let options = EventListenerOptions::enable_prevent_default();
        EventListener::new_with_options(&root, "keypress", options, move |event| {
            let Some(key_event) = event.dyn_ref::<web_sys::KeyboardEvent>() else {
                return;
            };
            let Some(id) = event_target(event).as_ref().and_then(parse_block_id) else {
                return;
            };
            if route_key(&editor, id, &key_event.key()) {
                event.prevent_default();
            }
            deliver_changes(&queue, &observers);
        })
    };

    tracing::debug!("editor mounted");
    Ok(MountedEditor {
        editor,
        observers,
        _listeners: vec![on_input, on_keypress],
    })
}
