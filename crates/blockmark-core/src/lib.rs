//! blockmark-core: block editor logic without platform dependencies.
//!
//! This crate provides:
//! - `EventEmitter<E>` and the `Observable` capability for named listeners
//! - `Header`, `Paragraph`, `ListItem` and `UnorderedList` blocks
//! - `Editor<H>` - the top-level container and its insert-after protocol
//! - `Surface` / `IdleScheduler` traits for the presentation host
//! - `MemoryHost` - an in-memory host for tests and headless use

pub mod block;
pub mod config;
pub mod editor;
pub mod error;
pub mod events;
pub mod header;
pub mod list;
pub mod memory;
pub mod paragraph;
pub mod platform;
pub mod types;

pub use block::{Block, COMPONENT_CLASS, Component};
pub use config::{EditorConfig, SeedBlock};
pub use editor::{EDITOR_CLASS, Editor, InsertCallback};
pub use error::EditorError;
pub use events::{
    AfterInsert, BlockEvent, CHANGE_EVENT, CREATE_EVENT, CreateRequest, EventEmitter, ListenerId,
    NewBlock, Observable,
};
pub use header::Header;
pub use list::{ListItem, UnorderedList};
pub use memory::{MemoryHost, MemoryNode};
pub use paragraph::Paragraph;
pub use platform::{Host, IdleHandle, IdleScheduler, PlatformError, Surface};
pub use smol_str::SmolStr;
pub use types::{BLOCK_ID_ATTR, BlockId, BlockKind, ENTER_KEY, KeyOutcome, ParseBlockIdError};
