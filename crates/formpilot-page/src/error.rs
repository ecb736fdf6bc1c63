//! Page and locator errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("No element matches locator: {0}")]
    NotFound(String),

    #[error("Locator is ambiguous ({count} matches): {locator}")]
    Ambiguous { locator: String, count: usize },

    #[error("Element is outside the visible viewport: {0}")]
    OutOfViewport(String),

    #[error("Mutation rejected by page: {0}")]
    MutationRejected(String),

    #[error("Frame content is inaccessible: {0}")]
    FrameInaccessible(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}
