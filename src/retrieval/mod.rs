//! Asynchronous tile retrieval
//!
//! Layers fill a bounded [`queue::RequestQueue`] during tile selection and
//! hand it to the shared [`service::RetrievalService`] once the frame's tiles
//! are known. Workers fetch payloads through a [`retriever::Retriever`],
//! decode them and publish the textures into the shared texture cache.

pub mod queue;
pub mod retriever;
pub mod service;

pub use queue::{RequestQueue, RequestTask};
pub use retriever::{FileRetriever, HttpRetriever, Retriever};
pub use service::{RetrievalEvent, RetrievalService};

use thiserror::Error;

/// Why a tile payload could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrievalError {
    /// The resource does not exist at the locator.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Transport failure (socket, timeout, file I/O).
    #[error("network error: {0}")]
    Network(String),

    /// The payload arrived but is not a usable image.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("retrieval cancelled")]
    Cancelled,
}

impl RetrievalError {
    /// True when retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Cancelled)
    }
}
