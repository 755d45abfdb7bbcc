//! Copy-on-write trie.
//!
//! A persistent map from byte-string keys to heterogeneous values. Every
//! mutating operation returns a *new* [`Trie`] and leaves the receiver
//! untouched; the new version shares every subtree the mutation did not walk
//! through. Versions are cheap handles (one `Option<Arc>`), so keeping many
//! of them alive costs only the nodes that actually differ.
//!
//! ```
//! use ferritedb::trie::Trie;
//!
//! let t1 = Trie::new().put(b"ab", 1u32);
//! let t2 = t1.put(b"ac", 2u32);
//!
//! // t1 is unaffected by the second insert
//! assert_eq!(t1.get::<u32>(b"ab"), Some(&1));
//! assert_eq!(t1.get::<u32>(b"ac"), None);
//! assert_eq!(t2.get::<u32>(b"ac"), Some(&2));
//! ```

mod node;

pub use node::TrieNode;

use std::sync::Arc;

use node::ValueSlot;

/// A handle to one version of the copy-on-write trie.
///
/// The empty trie has no root. Cloning a handle shares the root; handles are
/// plain values and can be passed across threads freely (all reachable nodes
/// are immutable, and stored values are required to be `Send + Sync`).
#[derive(Clone, Default)]
pub struct Trie {
    root: Option<Arc<TrieNode>>,
}

impl Trie {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Whether this trie holds no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// The root node, if any.
    ///
    /// Exposes the `Arc` so structural tests can check version sharing with
    /// [`Arc::ptr_eq`].
    pub fn root(&self) -> Option<&Arc<TrieNode>> {
        self.root.as_ref()
    }

    /// Look up `key` and borrow its value as a `T`.
    ///
    /// Returns `None` when the key is absent, when it maps to no value, or
    /// when the stored value is not a `T` - a type mismatch is an ordinary
    /// miss, not an error. The empty key addresses the root.
    pub fn get<T: 'static>(&self, key: &[u8]) -> Option<&T> {
        let mut node = self.root.as_ref()?;
        for &byte in key {
            node = node.children.get(&byte)?;
        }
        node.value.as_ref()?.downcast_ref::<T>()
    }

    /// Insert or overwrite `key`, returning the new version.
    ///
    /// The value is moved into the trie - it is never cloned, so non-`Clone`
    /// types are fine. Nodes along the path from the root to the key are
    /// copied; everything else is shared with `self`. An existing value at
    /// the key is replaced, and any children hanging below it are kept.
    pub fn put<T: Send + Sync + 'static>(&self, key: &[u8], value: T) -> Trie {
        let value: ValueSlot = Arc::new(value);
        let root = Self::put_walk(self.root.as_deref(), key, value);
        Trie { root: Some(root) }
    }

    /// Remove `key`, returning the new version.
    ///
    /// When the key is absent or maps to no value the operation is a no-op
    /// and the returned handle shares this trie's root - no nodes are copied.
    /// Otherwise the path is copied and the value dropped from it; nodes left
    /// with neither value nor children are pruned on the way back up, so a
    /// trie never keeps a dangling chain of empty interior nodes.
    pub fn remove(&self, key: &[u8]) -> Trie {
        let Some(root) = self.root.as_ref() else {
            return self.clone();
        };

        if key.is_empty() {
            if !root.is_value_node() {
                return self.clone();
            }
            if !root.has_children() {
                return Trie::new();
            }
            let stripped = TrieNode::with_parts(root.children.clone(), None);
            return Trie {
                root: Some(Arc::new(stripped)),
            };
        }

        match Self::remove_walk(root.as_ref(), key) {
            // Key not present: share the original root untouched.
            None => self.clone(),
            Some(new_root) => Trie { root: new_root },
        }
    }

    /// Rebuild the path for `key` below `node`, installing `value` at the end.
    ///
    /// `node` is `None` when the original trie had no node at this position.
    fn put_walk(node: Option<&TrieNode>, key: &[u8], value: ValueSlot) -> Arc<TrieNode> {
        match key.split_first() {
            None => {
                // Terminal position: become a value node, keep any children.
                let children = node.map(|n| n.children.clone()).unwrap_or_default();
                Arc::new(TrieNode::with_parts(children, Some(value)))
            }
            Some((&byte, rest)) => {
                let mut copy = node.cloned().unwrap_or_default();
                let old_child = copy.children.get(&byte).cloned();
                let new_child = Self::put_walk(old_child.as_deref(), rest, value);
                copy.children.insert(byte, new_child);
                Arc::new(copy)
            }
        }
    }

    /// Rebuild the path for a removal below `node`. `key` is non-empty.
    ///
    /// Returns `None` when the key does not name a value (nothing to do),
    /// `Some(None)` when this node pruned itself away, and `Some(Some(n))`
    /// for an ordinary replacement.
    fn remove_walk(node: &TrieNode, key: &[u8]) -> Option<Option<Arc<TrieNode>>> {
        let (&byte, rest) = key.split_first().expect("remove_walk needs a non-empty key");

        let child = node.children.get(&byte)?;

        let replacement: Option<Arc<TrieNode>> = if rest.is_empty() {
            // Target reached: only an actual value node can be removed.
            if !child.is_value_node() {
                return None;
            }
            if child.has_children() {
                Some(Arc::new(TrieNode::with_parts(child.children.clone(), None)))
            } else {
                None
            }
        } else {
            Self::remove_walk(child.as_ref(), rest)?
        };

        let mut copy = node.clone();
        match replacement {
            Some(new_child) => {
                copy.children.insert(byte, new_child);
            }
            None => {
                copy.children.remove(&byte);
            }
        }

        // Prune interior nodes that no longer carry anything.
        if !copy.is_value_node() && !copy.has_children() {
            Some(None)
        } else {
            Some(Some(Arc::new(copy)))
        }
    }
}
