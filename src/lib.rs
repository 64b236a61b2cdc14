//! # byte-trie
//!
//! An in-memory prefix tree keyed by arbitrary byte strings.
//!
//! Every edge carries one byte. A key is present when the node reached by
//! following its bytes from the root holds a value. Deleting a key prunes the
//! branch that no other key needs, so insert/delete churn does not leave
//! orphaned chains of nodes behind.
//!
//! ## Example
//!
//! ```rust
//! use byte_trie::{ByteTrie, TrieError};
//!
//! let mut trie: ByteTrie<u64> = ByteTrie::new();
//! trie.insert(b"hello", 1).unwrap();
//! trie.insert(b"help", 2).unwrap();
//!
//! assert_eq!(trie.find(b"hello"), Ok(&1));
//! assert_eq!(trie.insert(b"help", 3), Err(TrieError::KeyExisted));
//! trie.update(b"help", 3).unwrap();
//! assert_eq!(trie.find(b"help"), Ok(&3));
//!
//! assert_eq!(trie.delete(b"hello"), Ok(1));
//! assert_eq!(trie.find(b"hello"), Err(TrieError::KeyNotExisted));
//! assert_eq!(trie.keys(), vec![b"help".to_vec()]);
//! ```
//!
//! ## Threading
//!
//! All mutation goes through `&mut self` and there is no internal locking.
//! Callers that share a trie between threads must synchronize access
//! themselves, for example by wrapping it in a lock.

#![deny(unsafe_code)]

mod error;
mod node;

pub use error::{Result, TrieError};

use node::{NodeArena, NodeRef};
use tracing::trace;

/// Configuration for a [`ByteTrie`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of nodes to reserve up front, root included.
    pub initial_node_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_node_capacity: 1024,
        }
    }
}

/// A map from byte strings to values, stored as a prefix tree.
///
/// Keys are unique: [`insert`](Self::insert) refuses a key that is already
/// present and [`update`](Self::update) is the way to replace a value. The
/// empty byte string is a valid key and lives on the root.
///
/// Enumeration ([`keys`](Self::keys), [`iter`](Self::iter)) visits keys in
/// ascending lexicographic byte order, with the empty key first.
#[derive(Clone)]
pub struct ByteTrie<V> {
    arena: NodeArena<V>,
    count: usize,
}

impl<V> ByteTrie<V> {
    /// Create an empty trie holding only the root.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an empty trie with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            arena: NodeArena::with_capacity(config.initial_node_capacity),
            count: 0,
        }
    }

    /// Number of keys stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of live nodes, root included.
    ///
    /// An empty trie always reports 1, however many keys it has held.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.arena.live_count()
    }

    /// Insert a new key.
    ///
    /// Nodes for a previously unseen path are created while walking the key.
    /// The only check is at the final node: if a key already ends there the
    /// call fails with [`TrieError::KeyExisted`] and the stored value is kept.
    pub fn insert(&mut self, key: &[u8], value: V) -> Result<()> {
        let mut current = NodeRef::ROOT;
        for &b in key {
            current = self.arena.child_or_insert(current, b);
        }

        let node = self.arena.node_mut(current);
        if node.is_terminal() {
            return Err(TrieError::KeyExisted);
        }
        node.set_value(value);
        self.count += 1;
        Ok(())
    }

    /// Replace the value of an existing key.
    ///
    /// Fails with [`TrieError::KeyNotExisted`] if the key is absent, including
    /// when its path exists only as a prefix of longer keys.
    pub fn update(&mut self, key: &[u8], value: V) -> Result<()> {
        let slot = self.find_mut(key)?;
        *slot = value;
        Ok(())
    }

    /// Look up the value stored for `key`.
    pub fn find(&self, key: &[u8]) -> Result<&V> {
        self.arena
            .descend(key)
            .and_then(|r| self.arena.node(r).value())
            .ok_or(TrieError::KeyNotExisted)
    }

    /// Mutable access to the value stored for `key`.
    pub fn find_mut(&mut self, key: &[u8]) -> Result<&mut V> {
        let r = self.arena.descend(key).ok_or(TrieError::KeyNotExisted)?;
        self.arena
            .node_mut(r)
            .value_mut()
            .ok_or(TrieError::KeyNotExisted)
    }

    #[inline]
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.find(key).is_ok()
    }

    /// Remove `key` and return its value.
    ///
    /// After the value is taken, the node and every ancestor left without a
    /// value or children are detached, up to the first node that is still
    /// needed or the root.
    pub fn delete(&mut self, key: &[u8]) -> Result<V> {
        let r = self.arena.descend(key).ok_or(TrieError::KeyNotExisted)?;
        let value = self
            .arena
            .node_mut(r)
            .take_value()
            .ok_or(TrieError::KeyNotExisted)?;
        self.count -= 1;

        let pruned = self.arena.prune(r);
        if pruned > 0 {
            trace!(pruned, key_len = key.len(), "pruned dead branch");
        }
        Ok(value)
    }

    /// All stored keys, in the same order as [`iter`](Self::iter).
    pub fn keys(&self) -> Vec<Vec<u8>> {
        let mut keys = Vec::with_capacity(self.count);
        keys.extend(self.iter().map(|(k, _)| k));
        keys
    }

    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            arena: &self.arena,
            stack: vec![(NodeRef::ROOT, 0)],
            path: Vec::new(),
            remaining: self.count,
        }
    }

    /// Remove every key and every node except the root.
    pub fn clear(&mut self) {
        let removed = self.arena.clear();
        trace!(removed, keys = self.count, "cleared trie");
        self.count = 0;
    }

    /// Rebuild the node arena densely, dropping slots freed by deletes.
    ///
    /// Returns the number of nodes rewritten, or 0 if there were no holes.
    pub fn compact(&mut self) -> usize {
        let rewritten = self.arena.compact();
        if rewritten > 0 {
            trace!(rewritten, "compacted node arena");
        }
        rewritten
    }

    /// Approximate heap bytes held by the trie's nodes.
    pub fn memory_usage(&self) -> usize {
        self.arena.memory_usage()
    }

    pub fn shrink_to_fit(&mut self) {
        let before = self.arena.memory_usage();
        self.arena.shrink_to_fit();
        trace!(before, after = self.arena.memory_usage(), "shrunk node arena");
    }
}

impl<V> Default for ByteTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for ByteTrie<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, V> IntoIterator for &'a ByteTrie<V> {
    type Item = (Vec<u8>, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Pre-order traversal over `(key, value)` pairs.
///
/// One path buffer is shared across the whole walk: popping a node truncates
/// the buffer to the node's depth and writes its label, so only emitted keys
/// are allocated.
pub struct Iter<'a, V> {
    arena: &'a NodeArena<V>,
    /// Nodes still to visit, with the length of the path leading to them.
    stack: Vec<(NodeRef, usize)>,
    path: Vec<u8>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (Vec<u8>, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((r, depth)) = self.stack.pop() {
            let arena = self.arena;
            let node = arena.node(r);
            if depth > 0 {
                self.path.truncate(depth - 1);
                self.path.push(node.label());
            }

            // Reverse so the smallest byte is popped first.
            for &(_, child) in node.children().iter().rev() {
                self.stack.push((child, depth + 1));
            }

            if let Some(value) = node.value() {
                self.remaining -= 1;
                return Some((self.path.clone(), value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}
