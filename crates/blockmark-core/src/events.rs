//! Named-event listener registry shared by every component.
//!
//! Provides:
//! - `EventEmitter<E>` - per-object registry of handlers keyed by event name
//! - `Observable` - trait giving a type the add/remove/dispatch capability
//! - `BlockEvent` / `CreateRequest` - the payloads blocks emit

use std::collections::HashMap;

use smol_str::SmolStr;

use crate::types::{BlockId, BlockKind};

/// Emitted after a block's value changed and its presentation was synced.
pub const CHANGE_EVENT: &str = "change";

/// Emitted when a block asks its container for a new following sibling.
pub const CREATE_EVENT: &str = "create";

/// Identifies a registered listener so it can be removed later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler<E> = Box<dyn FnMut(&E)>;

/// Registry of event handlers keyed by event name.
///
/// Handlers for one name run synchronously in registration order. There is
/// no wildcard matching: a handler only sees events dispatched under the
/// exact name it was registered for.
pub struct EventEmitter<E> {
    listeners: HashMap<SmolStr, Vec<(ListenerId, Handler<E>)>>,
    next_id: u64,
}

impl<E> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&str, usize> = self
            .listeners
            .iter()
            .map(|(name, handlers)| (name.as_str(), handlers.len()))
            .collect();
        f.debug_struct("EventEmitter")
            .field("listeners", &counts)
            .finish()
    }
}

impl<E> EventEmitter<E> {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
            next_id: 0,
        }
    }

    /// Register `handler` for events named `name`.
    pub fn add_listener<F>(&mut self, name: impl Into<SmolStr>, handler: F) -> ListenerId
    where
        F: FnMut(&E) + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners
            .entry(name.into())
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Unregister a handler. Returns false if it was not registered under `name`.
    pub fn remove_listener(&mut self, name: &str, id: ListenerId) -> bool {
        let Some(handlers) = self.listeners.get_mut(name) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        let removed = handlers.len() != before;
        if handlers.is_empty() {
            self.listeners.remove(name);
        }
        removed
    }

    /// Invoke every handler registered for `name`, returning how many ran.
    pub fn dispatch(&mut self, name: &str, payload: &E) -> usize {
        let Some(handlers) = self.listeners.get_mut(name) else {
            return 0;
        };
        for (_, handler) in handlers.iter_mut() {
            handler(payload);
        }
        handlers.len()
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.get(name).map(Vec::len).unwrap_or(0)
    }
}

/// Gives a type the event emitter capability through an owned registry.
pub trait Observable {
    type Event;

    fn emitter(&self) -> &EventEmitter<Self::Event>;

    fn emitter_mut(&mut self) -> &mut EventEmitter<Self::Event>;

    fn add_listener<F>(&mut self, name: impl Into<SmolStr>, handler: F) -> ListenerId
    where
        F: FnMut(&Self::Event) + 'static,
    {
        self.emitter_mut().add_listener(name, handler)
    }

    fn remove_listener(&mut self, name: &str, id: ListenerId) -> bool {
        self.emitter_mut().remove_listener(name, id)
    }

    fn dispatch(&mut self, name: &str, payload: &Self::Event) -> usize {
        self.emitter_mut().dispatch(name, payload)
    }
}

/// What a creation request asks the container to build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NewBlock {
    Paragraph { text: String },
    ListItem { text: String },
}

/// What the container does once the new block is in place.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AfterInsert {
    /// Move input focus to the new block.
    #[default]
    Focus,
    Nothing,
}

/// Request for a new sibling immediately after `reference`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateRequest {
    pub reference: BlockId,
    pub block: NewBlock,
    pub then: AfterInsert,
}

/// Payload carried by block events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockEvent {
    Change { id: BlockId, kind: BlockKind },
    Create(CreateRequest),
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_dispatch_runs_in_registration_order() {
        let mut emitter = EventEmitter::<u32>::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let log = Rc::clone(&log);
            emitter.add_listener("change", move |n: &u32| log.borrow_mut().push((tag, *n)));
        }

        assert_eq!(emitter.dispatch("change", &7), 3);
        assert_eq!(
            *log.borrow(),
            vec![("first", 7), ("second", 7), ("third", 7)]
        );
    }

    #[test]
    fn test_dispatch_without_listeners_is_noop() {
        let mut emitter = EventEmitter::<()>::new();
        assert_eq!(emitter.dispatch("change", &()), 0);
    }

    #[test]
    fn test_names_match_exactly() {
        let mut emitter = EventEmitter::<()>::new();
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        emitter.add_listener("create", move |_| *counter.borrow_mut() += 1);

        emitter.dispatch("change", &());
        emitter.dispatch("creat", &());
        emitter.dispatch("*", &());
        assert_eq!(*hits.borrow(), 0);

        emitter.dispatch("create", &());
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_remove_listener() {
        let mut emitter = EventEmitter::<()>::new();
        let hits = Rc::new(RefCell::new(Vec::new()));

        let a_log = Rc::clone(&hits);
        let a = emitter.add_listener("change", move |_| a_log.borrow_mut().push("a"));
        let b_log = Rc::clone(&hits);
        emitter.add_listener("change", move |_| b_log.borrow_mut().push("b"));

        // Wrong name does not remove anything.
        assert!(!emitter.remove_listener("create", a));
        assert!(emitter.remove_listener("change", a));
        assert!(!emitter.remove_listener("change", a));
        assert_eq!(emitter.listener_count("change"), 1);

        emitter.dispatch("change", &());
        assert_eq!(*hits.borrow(), vec!["b"]);
    }
}
