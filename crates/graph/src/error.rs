//! Error types for graph store operations.

use crate::model::{NodeHandle, NodeKey};
use thiserror::Error;

/// Result type alias using our StoreError type.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised at the graph store boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A node with this natural key already exists.
    #[error("Node already exists: {0}")]
    NodeExists(NodeKey),

    /// The handle does not refer to a live node.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeHandle),

    /// The presentation was already loaded and duplicates are rejected.
    #[error("Presentation already loaded: {0}")]
    DuplicatePresentation(String),

    /// The document failed validation; nothing was written.
    #[error("{0}")]
    InvalidPresentation(#[from] deck_core::Error),

    /// Failed to read or write the store snapshot.
    #[error("Store I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The snapshot exists but could not be decoded.
    #[error("Corrupt store snapshot: {0}")]
    CorruptSnapshot(String),

    /// A writer panicked while holding the store lock.
    #[error("Store lock poisoned")]
    Poisoned,
}
