//! Error types for trie operations.

use thiserror::Error;

/// Result type alias for trie operations.
pub type Result<T> = std::result::Result<T, TrieError>;

/// The two expected failure outcomes of a trie operation.
///
/// Neither is fatal. Both leave the trie exactly as it was before the call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrieError {
    /// `insert` found the key already present. Use `update` to replace its value.
    #[error("key already exists")]
    KeyExisted,

    /// The key's byte path is missing, or reaches a node that does not end a key.
    #[error("key does not exist")]
    KeyNotExisted,
}
