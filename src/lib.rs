//! # scapegoat-rs
//!
//! An ordered map backed by a scapegoat tree: a binary search tree that keeps
//! no balance metadata in its nodes and instead rebuilds whole subtrees when
//! an insertion lands too deep or deletions shrink the tree too far.
//!
//! Based on "Scapegoat Trees" (SODA 1993, Galperin and Rivest).
//!
//! ## Example
//!
//! ```rust
//! use scapegoat_rs::ScapegoatTree;
//!
//! let mut tree = ScapegoatTree::with_alpha(0.6).unwrap();
//! for i in 1..=7 {
//!     tree.insert(i, i * 10);
//! }
//!
//! assert_eq!(tree.get(&4), Some(&40));
//! assert!(tree.height() <= 3);
//!
//! assert_eq!(tree.remove(&1), Some(10));
//! assert_eq!(tree.len(), 6);
//! ```

mod arena;
mod balance;
mod error;
mod iter;
mod stats;

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

use arena::{NodeArena, Ptr};

pub use balance::{Config, DEFAULT_ALPHA};
pub use error::{Error, Result};
pub use iter::{IntoIter, Iter, Keys, Values};
pub use stats::RebuildStats;

// =============================================================================
// ScapegoatTree
// =============================================================================

/// An ordered map implemented as a scapegoat tree.
///
/// Keys are ordered by [`Ord`]: smaller keys live in left subtrees, larger keys
/// in right subtrees. The tree guarantees that no node sits deeper than
/// `floor(log(max_size) / log(1 / alpha))`, where `max_size` is the largest
/// size reached since the last whole-tree rebuild.
///
/// Nodes are addressed by 32-bit slot indices, so a tree holds at most
/// `u32::MAX` entries; inserting beyond that panics.
pub struct ScapegoatTree<K, V> {
    nodes: NodeArena<K, V>,
    root: Ptr,
    size: usize,
    /// Largest `size` since the last whole-tree rebuild.
    max_size: usize,
    alpha: f64,
    stats: RebuildStats,
}

/// Ancestor chosen for rebuilding after a deep insertion.
struct Scapegoat {
    /// Index into the recorded insertion path (its depth in the tree).
    depth: usize,
    /// Node count of its subtree, accumulated during the scan.
    size: usize,
}

impl<K, V> ScapegoatTree<K, V> {
    /// Create an empty tree with [`DEFAULT_ALPHA`].
    pub fn new() -> Self {
        Self::from_valid_alpha(DEFAULT_ALPHA)
    }

    /// Create an empty tree with the given balance factor.
    ///
    /// Fails with [`Error::InvalidAlpha`] unless `0.5 < alpha < 1`.
    pub fn with_alpha(alpha: f64) -> Result<Self> {
        Self::with_config(Config::new(alpha))
    }

    /// Create an empty tree from a [`Config`], validating its balance factor.
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_alpha(config.alpha))
    }

    fn from_valid_alpha(alpha: f64) -> Self {
        Self {
            nodes: NodeArena::new(),
            root: Ptr::NULL,
            size: 0,
            max_size: 0,
            alpha,
            stats: RebuildStats::default(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Depth of the deepest node, counting the root as depth 0.
    /// Empty and single-entry trees both report 0.
    pub fn height(&self) -> usize {
        self.nodes.levels(self.root).saturating_sub(1)
    }

    /// Counters of the scapegoat and whole-tree rebuilds performed so far.
    pub fn rebuild_stats(&self) -> RebuildStats {
        self.stats
    }

    /// Remove every entry. The balance factor and rebuild counters are kept.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = Ptr::NULL;
        self.size = 0;
        self.max_size = 0;
    }

    /// Iterate over entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.nodes, self.root, self.size)
    }

    /// Iterate over keys in ascending order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Iterate over values in ascending key order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Linear scan for an entry holding `value`.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.values().any(|v| v == value)
    }

    /// Flatten the whole tree into a balanced shape, compacting the node arena,
    /// and restart the shrink accounting from the current size.
    fn rebuild_all(&mut self) {
        let sorted = self.nodes.flatten(self.root);
        debug_assert_eq!(sorted.len(), self.size);
        self.root = self.nodes.compact_balanced(&sorted);
        tracing::debug!(
            target: "scapegoat_rs::rebuild",
            size = self.size,
            previous_max = self.max_size,
            "rebuilt whole tree after shrinking"
        );
        self.max_size = self.size;
        self.stats.record_global(self.size);
    }
}

// =============================================================================
// Search, insertion, deletion
// =============================================================================

impl<K: Ord, V> ScapegoatTree<K, V> {
    fn find<Q>(&self, key: &Q) -> Ptr
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root;
        while !current.is_null() {
            let node = self.nodes.get(current);
            current = match key.cmp(node.key.borrow()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return current,
            };
        }
        Ptr::NULL
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let ptr = self.find(key);
        (!ptr.is_null()).then(|| &self.nodes.get(ptr).value)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let ptr = self.find(key);
        if ptr.is_null() {
            return None;
        }
        Some(&mut self.nodes.get_mut(ptr).value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        !self.find(key).is_null()
    }

    /// Insert `key -> value`, returning the previous value if the key was
    /// already present. Replacing a value never restructures the tree.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        // Ancestors of the insertion point, root first.
        let mut path: Vec<Ptr> = Vec::with_capacity(64);
        let mut went_left = false;
        let mut current = self.root;
        while !current.is_null() {
            let node = self.nodes.get(current);
            let next = match key.cmp(&node.key) {
                Ordering::Less => {
                    went_left = true;
                    node.left
                }
                Ordering::Greater => {
                    went_left = false;
                    node.right
                }
                Ordering::Equal => {
                    let node = self.nodes.get_mut(current);
                    return Some(std::mem::replace(&mut node.value, value));
                }
            };
            path.push(current);
            current = next;
        }

        let leaf = self.nodes.alloc(key, value);
        match path.last() {
            None => self.root = leaf,
            Some(&parent) => {
                let parent = self.nodes.get_mut(parent);
                if went_left {
                    parent.left = leaf;
                } else {
                    parent.right = leaf;
                }
            }
        }
        self.size += 1;
        self.max_size = self.max_size.max(self.size);

        if path.len() > balance::height_threshold(self.size, self.alpha) {
            self.rebalance_after_insert(&path, leaf);
        }
        None
    }

    /// Walk outward from a freshly inserted `leaf` along its ancestor `path`,
    /// accumulating subtree sizes, and return the nearest ancestor that is not
    /// α-weight-balanced.
    fn find_scapegoat(&self, path: &[Ptr], leaf: Ptr) -> Option<Scapegoat> {
        let mut child = leaf;
        let mut child_size = 1usize;
        for (depth, &ancestor) in path.iter().enumerate().rev() {
            let sibling_size = self
                .nodes
                .subtree_size(self.nodes.sibling_of(ancestor, child));
            let size = child_size + sibling_size + 1;
            if !balance::is_weight_balanced(child_size, sibling_size, size, self.alpha) {
                return Some(Scapegoat { depth, size });
            }
            child = ancestor;
            child_size = size;
        }
        None
    }

    fn rebalance_after_insert(&mut self, path: &[Ptr], leaf: Ptr) {
        let scapegoat = self.find_scapegoat(path, leaf);
        debug_assert!(
            scapegoat.is_some(),
            "insertion exceeded the height threshold without an unbalanced ancestor"
        );
        let Some(Scapegoat { depth, size }) = scapegoat else {
            tracing::error!(
                target: "scapegoat_rs::rebuild",
                depth = path.len(),
                size = self.size,
                "no scapegoat on a path deeper than the height threshold"
            );
            return;
        };

        let old = path[depth];
        let rebuilt = self.nodes.rebuild(old);
        if depth == 0 {
            self.root = rebuilt;
        } else {
            self.nodes.replace_child(path[depth - 1], old, rebuilt);
        }
        self.stats.record_scapegoat(size);
        tracing::trace!(
            target: "scapegoat_rs::rebuild",
            depth,
            size,
            "rebuilt scapegoat subtree"
        );
    }

    /// Remove `key`, returning its value if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Remove `key`, returning the stored key and value if it was present.
    ///
    /// A node with two children takes over its in-order successor's entry and
    /// the successor's slot is unlinked instead. If the tree has shrunk below
    /// `alpha` times its size at the last whole-tree rebuild, the whole tree
    /// is rebuilt.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut parent = Ptr::NULL;
        let mut current = self.root;
        while !current.is_null() {
            let node = self.nodes.get(current);
            let next = match key.cmp(node.key.borrow()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => break,
            };
            parent = current;
            current = next;
        }
        if current.is_null() {
            return None;
        }

        let right = self.nodes.get(current).right;
        let removed = if right.is_null() {
            let left = self.nodes.get(current).left;
            if parent.is_null() {
                self.root = left;
            } else {
                self.nodes.replace_child(parent, current, left);
            }
            let node = self.nodes.free(current);
            (node.key, node.value)
        } else {
            let mut successor_parent = current;
            let mut successor = right;
            loop {
                let left = self.nodes.get(successor).left;
                if left.is_null() {
                    break;
                }
                successor_parent = successor;
                successor = left;
            }

            let successor_right = self.nodes.get(successor).right;
            if successor_parent == current {
                self.nodes.get_mut(current).right = successor_right;
            } else {
                self.nodes.get_mut(successor_parent).left = successor_right;
            }

            let successor = self.nodes.free(successor);
            let node = self.nodes.get_mut(current);
            (
                std::mem::replace(&mut node.key, successor.key),
                std::mem::replace(&mut node.value, successor.value),
            )
        };

        self.size -= 1;
        if balance::needs_global_rebuild(self.size, self.max_size, self.alpha) {
            self.rebuild_all();
        }
        Some(removed)
    }
}

// =============================================================================
// Trait impls
// =============================================================================

impl<K, V> Default for ScapegoatTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone> Clone for ScapegoatTree<K, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
            size: self.size,
            max_size: self.max_size,
            alpha: self.alpha,
            stats: self.stats,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ScapegoatTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> Extend<(K, V)> for ScapegoatTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for ScapegoatTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<'a, K, V> IntoIterator for &'a ScapegoatTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> IntoIterator for ScapegoatTree<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.nodes.into_sorted_entries(self.root).into_iter(),
        }
    }
}


#[cfg(test)]
mod proptests;
