//! Slot arena holding the tree's nodes, plus the subtree helpers the
//! balancing code is built from (size, flatten, balanced rebuild).
//!
//! Nodes refer to their children by [`Ptr`], a 32-bit slot index with a
//! reserved `NULL`. Every live node is reachable from exactly one parent link
//! or the tree root, so the arena never holds cycles or shared children.

/// Slot index into a [`NodeArena`]. `u32::MAX` is reserved as `NULL`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct Ptr(u32);

impl Ptr {
    pub(crate) const NULL: Ptr = Ptr(u32::MAX);

    #[inline]
    pub(crate) fn is_null(self) -> bool {
        self.0 == Self::NULL.0
    }

    #[inline]
    fn idx(self) -> usize {
        debug_assert!(!self.is_null());
        self.0 as usize
    }

    #[inline]
    fn from_idx(idx: usize) -> Self {
        assert!(idx < Self::NULL.0 as usize, "node arena exhausted");
        Self(idx as u32)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) left: Ptr,
    pub(crate) right: Ptr,
}

impl<K, V> Node<K, V> {
    fn leaf(key: K, value: V) -> Self {
        Self {
            key,
            value,
            left: Ptr::NULL,
            right: Ptr::NULL,
        }
    }
}

/// Node storage with a free list of vacated slots.
#[derive(Clone)]
pub(crate) struct NodeArena<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<u32>,
}

impl<K, V> NodeArena<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Number of occupied slots.
    pub(crate) fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    pub(crate) fn alloc(&mut self, key: K, value: V) -> Ptr {
        let node = Some(Node::leaf(key, value));
        match self.free.pop() {
            Some(idx) => {
                debug_assert!(self.slots[idx as usize].is_none());
                self.slots[idx as usize] = node;
                Ptr(idx)
            }
            None => {
                let ptr = Ptr::from_idx(self.slots.len());
                self.slots.push(node);
                ptr
            }
        }
    }

    /// Vacate a slot and hand back its node. The caller must already have
    /// unlinked it from its parent.
    pub(crate) fn free(&mut self, ptr: Ptr) -> Node<K, V> {
        let node = self.slots[ptr.idx()]
            .take()
            .expect("freeing a vacant node slot");
        self.free.push(ptr.0);
        node
    }

    #[inline]
    pub(crate) fn get(&self, ptr: Ptr) -> &Node<K, V> {
        self.slots[ptr.idx()]
            .as_ref()
            .expect("pointer to a vacant node slot")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, ptr: Ptr) -> &mut Node<K, V> {
        self.slots[ptr.idx()]
            .as_mut()
            .expect("pointer to a vacant node slot")
    }

    /// Point whichever child link of `parent` currently holds `old` at `new`.
    pub(crate) fn replace_child(&mut self, parent: Ptr, old: Ptr, new: Ptr) {
        let node = self.get_mut(parent);
        if node.left == old {
            node.left = new;
        } else {
            debug_assert_eq!(node.right, old);
            node.right = new;
        }
    }

    /// The child of `parent` that is not `child`.
    #[inline]
    pub(crate) fn sibling_of(&self, parent: Ptr, child: Ptr) -> Ptr {
        let node = self.get(parent);
        if node.left == child {
            node.right
        } else {
            node.left
        }
    }

    /// Number of nodes in the subtree rooted at `ptr` (0 for `NULL`).
    pub(crate) fn subtree_size(&self, ptr: Ptr) -> usize {
        let mut stack = Vec::new();
        if !ptr.is_null() {
            stack.push(ptr);
        }
        let mut count = 0usize;
        while let Some(ptr) = stack.pop() {
            count += 1;
            let node = self.get(ptr);
            if !node.left.is_null() {
                stack.push(node.left);
            }
            if !node.right.is_null() {
                stack.push(node.right);
            }
        }
        count
    }

    /// Number of nodes on the longest downward path from `ptr` (0 for `NULL`).
    pub(crate) fn levels(&self, ptr: Ptr) -> usize {
        let mut stack: Vec<(Ptr, usize)> = Vec::new();
        if !ptr.is_null() {
            stack.push((ptr, 1));
        }
        let mut deepest = 0usize;
        while let Some((ptr, level)) = stack.pop() {
            deepest = deepest.max(level);
            let node = self.get(ptr);
            if !node.left.is_null() {
                stack.push((node.left, level + 1));
            }
            if !node.right.is_null() {
                stack.push((node.right, level + 1));
            }
        }
        deepest
    }

    /// In-order sequence of the nodes under `ptr`.
    pub(crate) fn flatten(&self, ptr: Ptr) -> Vec<Ptr> {
        let mut out = Vec::new();
        let mut stack = Vec::new();
        let mut current = ptr;
        loop {
            while !current.is_null() {
                stack.push(current);
                current = self.get(current).left;
            }
            let Some(ptr) = stack.pop() else {
                break;
            };
            out.push(ptr);
            current = self.get(ptr).right;
        }
        out
    }

    /// Relink the nodes of `sorted` into a height-balanced subtree and return
    /// its root. The element at `len / 2` becomes the root, so even-length
    /// spans put the extra node on the left.
    pub(crate) fn build_balanced(&mut self, sorted: &[Ptr]) -> Ptr {
        if sorted.is_empty() {
            return Ptr::NULL;
        }
        let mid = sorted.len() / 2;
        let left = self.build_balanced(&sorted[..mid]);
        let right = self.build_balanced(&sorted[mid + 1..]);
        let root = sorted[mid];
        let node = self.get_mut(root);
        node.left = left;
        node.right = right;
        root
    }

    /// Rebuild the subtree under `ptr` into balanced shape, reusing its slots.
    pub(crate) fn rebuild(&mut self, ptr: Ptr) -> Ptr {
        let sorted = self.flatten(ptr);
        self.build_balanced(&sorted)
    }

    /// Move the nodes listed in `sorted` (which must be every live node) into
    /// a fresh dense slot vector and build a balanced tree over them.
    /// Vacated slots are dropped, so the free list ends up empty.
    pub(crate) fn compact_balanced(&mut self, sorted: &[Ptr]) -> Ptr {
        debug_assert_eq!(sorted.len(), self.live());
        let mut old = std::mem::replace(&mut self.slots, Vec::with_capacity(sorted.len()));
        self.free.clear();
        for &ptr in sorted {
            let node = old[ptr.idx()]
                .take()
                .expect("compacting a vacant node slot");
            self.slots.push(Some(Node::leaf(node.key, node.value)));
        }
        let dense: Vec<Ptr> = (0..sorted.len()).map(Ptr::from_idx).collect();
        self.build_balanced(&dense)
    }

    /// Consume the arena, returning the entries under `root` in order.
    pub(crate) fn into_sorted_entries(mut self, root: Ptr) -> Vec<(K, V)> {
        let sorted = self.flatten(root);
        sorted
            .into_iter()
            .map(|ptr| {
                let node = self.free(ptr);
                (node.key, node.value)
            })
            .collect()
    }
}
