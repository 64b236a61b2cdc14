//! Arena-backed trie nodes.
//!
//! Nodes live in a single `Vec` and refer to each other through 32-bit
//! indices. Downward edges (children) are the ownership edges; the upward
//! `parent` index is a plain lookup used by delete-time pruning.

use smallvec::SmallVec;

/// A 32-bit reference to a node in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub(crate) struct NodeRef(u32);

impl NodeRef {
    /// Parent of the root.
    pub const NULL: NodeRef = NodeRef(u32::MAX);
    /// The root always occupies slot 0 and is never freed.
    pub const ROOT: NodeRef = NodeRef(0);

    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    fn new(idx: usize) -> Self {
        debug_assert!(idx < u32::MAX as usize);
        NodeRef(idx as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Child edges sorted by label byte. Most nodes on a byte path have one or
/// two children, so four fit inline before spilling to the heap.
type Children = SmallVec<[(u8, NodeRef); 4]>;

/// One position on some key's byte path.
#[derive(Clone, Debug)]
pub(crate) struct Node<V> {
    /// Byte on the edge from the parent. Meaningless for the root.
    label: u8,
    parent: NodeRef,
    children: Children,
    /// `Some` exactly when a live key ends here.
    value: Option<V>,
}

impl<V> Node<V> {
    #[inline]
    fn new(parent: NodeRef, label: u8) -> Self {
        Self {
            label,
            parent,
            children: SmallVec::new(),
            value: None,
        }
    }

    #[inline]
    pub fn label(&self) -> u8 {
        self.label
    }

    #[inline]
    pub fn parent(&self) -> NodeRef {
        self.parent
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.value.is_some()
    }

    #[inline]
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    #[inline]
    pub fn value_mut(&mut self) -> Option<&mut V> {
        self.value.as_mut()
    }

    /// Store `value`, returning whatever was there before.
    #[inline]
    pub fn set_value(&mut self, value: V) -> Option<V> {
        self.value.replace(value)
    }

    #[inline]
    pub fn take_value(&mut self) -> Option<V> {
        self.value.take()
    }

    #[inline]
    pub fn children(&self) -> &[(u8, NodeRef)] {
        &self.children
    }

    /// Neither terminal nor a path-through point for any live key.
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.value.is_none() && self.children.is_empty()
    }

    #[inline]
    pub fn find_child(&self, byte: u8) -> Option<NodeRef> {
        self.children
            .binary_search_by_key(&byte, |&(b, _)| b)
            .ok()
            .map(|i| self.children[i].1)
    }

    fn insert_child(&mut self, byte: u8, child: NodeRef) {
        match self.children.binary_search_by_key(&byte, |&(b, _)| b) {
            Ok(i) => self.children[i].1 = child,
            Err(i) => self.children.insert(i, (byte, child)),
        }
    }

    fn remove_child(&mut self, byte: u8) -> Option<NodeRef> {
        let i = self
            .children
            .binary_search_by_key(&byte, |&(b, _)| b)
            .ok()?;
        Some(self.children.remove(i).1)
    }

    fn heap_bytes(&self) -> usize {
        if self.children.spilled() {
            self.children.capacity() * std::mem::size_of::<(u8, NodeRef)>()
        } else {
            0
        }
    }
}

/// Node storage with a free list of slots released by pruning.
#[derive(Clone, Debug)]
pub(crate) struct NodeArena<V> {
    nodes: Vec<Node<V>>,
    free: Vec<NodeRef>,
}

impl<V> NodeArena<V> {
    /// Create an arena holding only the root.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.max(1));
        nodes.push(Node::new(NodeRef::NULL, 0));
        Self {
            nodes,
            free: Vec::new(),
        }
    }

    #[inline]
    pub fn node(&self, r: NodeRef) -> &Node<V> {
        &self.nodes[r.index()]
    }

    #[inline]
    pub fn node_mut(&mut self, r: NodeRef) -> &mut Node<V> {
        &mut self.nodes[r.index()]
    }

    /// Number of live nodes, root included.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    fn alloc(&mut self, parent: NodeRef, label: u8) -> NodeRef {
        match self.free.pop() {
            Some(r) => {
                self.nodes[r.index()] = Node::new(parent, label);
                r
            }
            None => {
                let r = NodeRef::new(self.nodes.len());
                self.nodes.push(Node::new(parent, label));
                r
            }
        }
    }

    /// Follow the edge labeled `byte` out of `parent`, creating the child if
    /// it is missing.
    pub fn child_or_insert(&mut self, parent: NodeRef, byte: u8) -> NodeRef {
        if let Some(child) = self.node(parent).find_child(byte) {
            return child;
        }
        let child = self.alloc(parent, byte);
        self.node_mut(parent).insert_child(byte, child);
        child
    }

    /// Walk an existing path without creating anything.
    pub fn descend(&self, key: &[u8]) -> Option<NodeRef> {
        key.iter()
            .try_fold(NodeRef::ROOT, |r, &b| self.node(r).find_child(b))
    }

    /// Remove `start` and then each ancestor that is left non-terminal and
    /// childless, stopping at the first node that must stay or at the root.
    /// Returns the number of nodes removed.
    pub fn prune(&mut self, start: NodeRef) -> usize {
        let mut current = start;
        let mut pruned = 0;
        while current != NodeRef::ROOT && self.node(current).is_dead() {
            let node = self.node(current);
            let (parent, label) = (node.parent(), node.label());
            let detached = self.node_mut(parent).remove_child(label);
            debug_assert_eq!(detached, Some(current), "parent must own the pruned child");
            // Drop any spilled child storage now rather than on reuse.
            self.nodes[current.index()] = Node::new(NodeRef::NULL, 0);
            self.free.push(current);
            current = parent;
            pruned += 1;
        }
        pruned
    }

    /// Drop every node except a fresh root. Returns the number of nodes removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.live_count() - 1;
        self.nodes.truncate(1);
        self.nodes[0] = Node::new(NodeRef::NULL, 0);
        self.free.clear();
        removed
    }

    /// Rebuild live nodes into a dense arena in breadth-first order, closing
    /// the holes left by pruning. Returns the number of nodes rewritten.
    pub fn compact(&mut self) -> usize {
        if self.free.is_empty() {
            return 0;
        }

        let mut old = std::mem::take(&mut self.nodes);
        let mut order: Vec<NodeRef> = Vec::with_capacity(old.len() - self.free.len());
        let mut remap = vec![NodeRef::NULL; old.len()];
        order.push(NodeRef::ROOT);
        let mut i = 0;
        while i < order.len() {
            let r = order[i];
            remap[r.index()] = NodeRef::new(i);
            order.extend(old[r.index()].children.iter().map(|&(_, c)| c));
            i += 1;
        }

        let mut nodes = Vec::with_capacity(order.len());
        for r in order {
            let mut node = std::mem::replace(&mut old[r.index()], Node::new(NodeRef::NULL, 0));
            if !node.parent.is_null() {
                node.parent = remap[node.parent.index()];
            }
            for (_, child) in node.children.iter_mut() {
                *child = remap[child.index()];
            }
            nodes.push(node);
        }

        self.nodes = nodes;
        self.free.clear();
        self.nodes.len()
    }

    /// Approximate heap bytes owned by the arena.
    pub fn memory_usage(&self) -> usize {
        self.nodes.capacity() * std::mem::size_of::<Node<V>>()
            + self.free.capacity() * std::mem::size_of::<NodeRef>()
            + self.nodes.iter().map(Node::heap_bytes).sum::<usize>()
    }

    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
        self.free.shrink_to_fit();
        for node in &mut self.nodes {
            node.children.shrink_to_fit();
        }
    }
}
