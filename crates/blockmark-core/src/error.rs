use miette::Diagnostic;
use thiserror::Error;

use crate::platform::PlatformError;
use crate::types::BlockId;

#[derive(Debug, Error, Diagnostic)]
pub enum EditorError {
    #[error("block {0} is not part of this container")]
    #[diagnostic(code(blockmark::editor::not_found))]
    NotFound(BlockId),

    #[error("block {0} has not been rendered")]
    #[diagnostic(code(blockmark::block::not_rendered))]
    NotRendered(BlockId),

    #[error("platform error: {0}")]
    #[diagnostic(code(blockmark::platform))]
    Platform(#[from] PlatformError),
}
