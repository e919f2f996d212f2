//! Browser DOM layer for the blockmark block editor.
//!
//! This crate implements the core host traits on top of `web-sys` and wires
//! DOM events to an `Editor`. It assumes a `wasm32-unknown-unknown` target
//! environment.
//!
//! # Architecture
//!
//! - `host`: `BrowserHost`, the DOM `Surface` and idle scheduler
//! - `mount`: editor construction in a container, delegated event routing
//!
//! # Re-exports
//!
//! This crate re-exports `blockmark-core` for convenience, so consumers
//! only need to depend on `blockmark-browser`.

// Re-export core crate
pub use blockmark_core;
pub use blockmark_core::*;

pub mod host;
pub mod mount;

pub use host::BrowserHost;
pub use mount::{MountedEditor, SharedEditor, mount, parse_block_id};
