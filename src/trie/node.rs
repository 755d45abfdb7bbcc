//! Trie node - the immutable building block of the copy-on-write trie.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// The type-erased value slot of a trie node.
///
/// Values of any `Send + Sync + 'static` type can be stored; retrieval
/// downcasts back to the concrete type and yields nothing on a mismatch.
pub(crate) type ValueSlot = Arc<dyn Any + Send + Sync>;

/// A node in the copy-on-write trie.
///
/// Nodes are immutable after construction and shared across trie versions
/// via [`Arc`]. A mutation never touches an existing node: it builds new
/// nodes along the affected path and re-points them at the unchanged
/// children of the originals.
///
/// A node is a *value node* when its value slot is occupied; interior nodes
/// that exist only to carry children leave it empty. The trie maintains the
/// invariant that a reachable non-value node always has at least one child
/// (value-less leaves are pruned on removal).
pub struct TrieNode {
    /// One child per distinct next byte.
    pub(crate) children: HashMap<u8, Arc<TrieNode>>,

    /// The stored value, if this node terminates a key.
    pub(crate) value: Option<ValueSlot>,
}

impl TrieNode {
    /// Create an empty interior node.
    pub(crate) fn new() -> Self {
        Self {
            children: HashMap::new(),
            value: None,
        }
    }

    /// Create a node with the given children and value slot.
    pub(crate) fn with_parts(children: HashMap<u8, Arc<TrieNode>>, value: Option<ValueSlot>) -> Self {
        Self { children, value }
    }

    /// Whether this node terminates a key.
    #[inline]
    pub fn is_value_node(&self) -> bool {
        self.value.is_some()
    }

    /// Whether this node has any children.
    #[inline]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Number of children.
    #[inline]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Look up the child for a byte.
    ///
    /// Exposes the `Arc` so callers (and structural tests) can check sharing
    /// across versions with [`Arc::ptr_eq`].
    #[inline]
    pub fn child(&self, byte: u8) -> Option<&Arc<TrieNode>> {
        self.children.get(&byte)
    }

    /// Iterate over the children as `(byte, node)` pairs.
    ///
    /// Order is unspecified. Exposes the `Arc`s for the same reason as
    /// [`child`](Self::child).
    pub fn children(&self) -> impl Iterator<Item = (u8, &Arc<TrieNode>)> {
        self.children.iter().map(|(&byte, node)| (byte, node))
    }
}

// A shallow copy: children and value are shared, not duplicated. This is the
// "clone" in copy-on-write - cloning a node on the mutation path costs one
// map of Arc handles, never the subtrees or the values themselves.
impl Clone for TrieNode {
    fn clone(&self) -> Self {
        Self {
            children: self.children.clone(),
            value: self.value.clone(),
        }
    }
}

impl Default for TrieNode {
    fn default() -> Self {
        Self::new()
    }
}
