//! The ordered binary-search-tree substrate shared by the maps.
//!
//! Nodes live in an arena owned by [`Tree`].  Children are reached through
//! slot indices, and every node keeps a non-owning index of its parent so
//! that rebalancing and iteration can walk upward without a stack.  Nothing
//! here knows about balance factors beyond carrying the field; keeping it in
//! range is the AVL layer's job.

use std::borrow::Borrow;
use std::cmp::Ordering::*;
use std::iter::FusedIterator;

use crate::TreeError;

mod bst_map;
pub use bst_map::BstMap;

/// Index of a node's slot in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

pub(crate) type Link = Option<NodeId>;

/// Which child of its parent a node is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    pub(crate) fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Change in balance factor when this side of a node grows by one level.
    pub(crate) fn sign(self) -> i8 {
        match self {
            Side::Left => -1,
            Side::Right => 1,
        }
    }
}

/// Where a node hangs: its parent and the side it occupies there.  `None`
/// stands for the root slot.
pub(crate) type Position = Option<(NodeId, Side)>;

#[derive(Clone)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) val: V,
    pub(crate) parent: Link,
    pub(crate) left: Link,
    pub(crate) right: Link,
    /// height(right) - height(left)
    pub(crate) bal: i8,
}

impl<K, V> Node<K, V> {
    fn new(key: K, val: V) -> Self {
        Node {
            key,
            val,
            parent: None,
            left: None,
            right: None,
            bal: 0,
        }
    }

    pub(crate) fn child(&self, side: Side) -> Link {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub(crate) fn set_child(&mut self, side: Side, link: Link) {
        match side {
            Side::Left => self.left = link,
            Side::Right => self.right = link,
        }
    }
}

/// Result of searching for a key.
pub(crate) enum Search {
    Found(NodeId),
    /// The key is absent; a new node for it belongs at this position.
    Vacant(Position),
}

#[derive(Clone)]
pub(crate) struct Tree<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<NodeId>,
    root: Link,
    len: usize,
}

impl<K, V> Tree<K, V> {
    pub(crate) fn new() -> Self {
        Tree {
            slots: Vec::new(),
            free: Vec::new(),
            root: None,
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn root(&self) -> Link {
        self.root
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.root = None;
        self.len = 0;
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node<K, V> {
        match &self.slots[id.0] {
            Some(n) => n,
            None => panic!("Attempt to use released node {}", id.0),
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        match &mut self.slots[id.0] {
            Some(n) => n,
            None => panic!("Attempt to use released node {}", id.0),
        }
    }

    /// Number of slots ever handed out, live or free.
    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Creates an unlinked node and returns its slot.
    pub(crate) fn alloc(&mut self, key: K, val: V) -> NodeId {
        self.len += 1;
        let node = Some(Node::new(key, val));
        match self.free.pop() {
            Some(id) => {
                self.slots[id.0] = node;
                id
            }
            None => {
                self.slots.push(node);
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Frees the slot of an already unlinked node, handing back its entry.
    pub(crate) fn release(&mut self, id: NodeId) -> (K, V) {
        let Some(n) = self.slots[id.0].take() else {
            panic!("Attempt to release node {} twice", id.0);
        };
        debug_assert!(self.root != Some(id));
        self.free.push(id);
        self.len -= 1;
        (n.key, n.val)
    }

    pub(crate) fn position(&self, id: NodeId) -> Position {
        let p = self.node(id).parent?;
        if self.node(p).left == Some(id) {
            Some((p, Side::Left))
        } else {
            Some((p, Side::Right))
        }
    }

    /// Points the given position at `link`.  Does not touch `link`'s parent.
    pub(crate) fn set_position(&mut self, pos: Position, link: Link) {
        match pos {
            Some((p, side)) => self.node_mut(p).set_child(side, link),
            None => self.root = link,
        }
    }

    /// Hangs an unlinked node at `pos`.
    pub(crate) fn attach(&mut self, pos: Position, id: NodeId) {
        self.set_position(pos, Some(id));
        self.node_mut(id).parent = pos.map(|(p, _)| p);
    }

    fn adopt(&mut self, parent: NodeId, child: Link) {
        if let Some(c) = child {
            self.node_mut(c).parent = Some(parent);
        }
    }

    fn outermost(&self, mut id: NodeId, side: Side) -> NodeId {
        while let Some(next) = self.node(id).child(side) {
            id = next;
        }
        id
    }

    pub(crate) fn first(&self) -> Link {
        self.root.map(|r| self.outermost(r, Side::Left))
    }

    pub(crate) fn last(&self) -> Link {
        self.root.map(|r| self.outermost(r, Side::Right))
    }

    // The in-order neighbour on `side`: the outermost node of that subtree,
    // or else the first ancestor we reach from the opposite side.
    fn neighbor(&self, id: NodeId, side: Side) -> Link {
        if let Some(c) = self.node(id).child(side) {
            return Some(self.outermost(c, side.opposite()));
        }

        let mut curr = id;
        while let Some((p, s)) = self.position(curr) {
            if s != side {
                return Some(p);
            }
            curr = p;
        }
        None
    }

    pub(crate) fn successor(&self, id: NodeId) -> Link {
        self.neighbor(id, Side::Right)
    }

    pub(crate) fn predecessor(&self, id: NodeId) -> Link {
        self.neighbor(id, Side::Left)
    }

    /// Exchanges the places of two nodes in the tree.  Keys, values and
    /// balance factors stay with their nodes; only the links move.
    pub(crate) fn swap_positions(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }

        let a_pos = self.position(a);
        let b_pos = self.position(b);
        let (pa, la, ra) = self.links(a);
        let (pb, lb, rb) = self.links(b);

        // a link between a and b must turn around instead of becoming a loop
        let flip = |x: Link, from: NodeId, to: NodeId| {
            if x == Some(from) {
                Some(to)
            } else {
                x
            }
        };

        let a_links = (flip(pb, a, b), flip(lb, a, b), flip(rb, a, b));
        let b_links = (flip(pa, b, a), flip(la, b, a), flip(ra, b, a));
        self.set_links(a, a_links);
        self.set_links(b, b_links);

        // fix the outside neighbours; links between a and b are already done
        if a_links.0 != Some(b) {
            self.set_position(b_pos, Some(a));
        }
        if b_links.0 != Some(a) {
            self.set_position(a_pos, Some(b));
        }
        for c in [a_links.1, a_links.2] {
            if c != Some(b) {
                self.adopt(a, c);
            }
        }
        for c in [b_links.1, b_links.2] {
            if c != Some(a) {
                self.adopt(b, c);
            }
        }
    }

    fn links(&self, id: NodeId) -> (Link, Link, Link) {
        let n = self.node(id);
        (n.parent, n.left, n.right)
    }

    fn set_links(&mut self, id: NodeId, (parent, left, right): (Link, Link, Link)) {
        let n = self.node_mut(id);
        n.parent = parent;
        n.left = left;
        n.right = right;
    }

    /// Unlinks a node with at most one child, moving the child (if any) into
    /// its place.  Returns where the node used to hang.  The slot stays
    /// allocated until [`release`](Self::release).
    pub(crate) fn splice_out(&mut self, id: NodeId) -> Position {
        let pos = self.position(id);
        let n = self.node(id);
        debug_assert!(n.left.is_none() || n.right.is_none());
        let child = n.left.or(n.right);

        self.set_position(pos, child);
        if let Some(c) = child {
            self.node_mut(c).parent = pos.map(|(p, _)| p);
        }

        self.set_links(id, (None, None, None));
        pos
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub(crate) fn height(&self) -> usize {
        // explicit stack: an unbalanced tree may be as deep as it is long
        let mut max = 0;
        let mut work: Vec<(NodeId, usize)> = self.root.iter().map(|&r| (r, 1)).collect();
        while let Some((id, depth)) = work.pop() {
            max = max.max(depth);
            let n = self.node(id);
            for c in [n.left, n.right].into_iter().flatten() {
                work.push((c, depth + 1));
            }
        }
        max
    }

    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            tree: self,
            front: self.first(),
            back: self.last(),
            len: self.len,
        }
    }

    /// Applies `f` to each entry in key order.
    pub(crate) fn for_each_mut<F: FnMut((&K, &mut V))>(&mut self, mut f: F) {
        let mut curr = self.first();
        while let Some(id) = curr {
            let n = self.node_mut(id);
            f((&n.key, &mut n.val));
            curr = self.successor(id);
        }
    }

    pub(crate) fn into_entries(mut self) -> IntoIter<K, V> {
        let mut order = Vec::with_capacity(self.len);
        let mut curr = self.first();
        while let Some(id) = curr {
            order.push(id);
            curr = self.successor(id);
        }

        let entries: Vec<(K, V)> = order
            .into_iter()
            .filter_map(|id| self.slots[id.0].take())
            .map(|n| (n.key, n.val))
            .collect();

        IntoIter {
            entries: entries.into_iter(),
        }
    }
}

impl<K: Ord, V> Tree<K, V> {
    pub(crate) fn search<Q>(&self, key: &Q) -> Search
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut pos = None;
        let mut curr = self.root;
        while let Some(id) = curr {
            let side = match key.cmp(self.node(id).key.borrow()) {
                Equal => return Search::Found(id),
                Less => Side::Left,
                Greater => Side::Right,
            };
            pos = Some((id, side));
            curr = self.node(id).child(side);
        }
        Search::Vacant(pos)
    }

    pub(crate) fn find<Q>(&self, key: &Q) -> Link
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.search(key) {
            Search::Found(id) => Some(id),
            Search::Vacant(_) => None,
        }
    }

    /// Verifies the structural invariants shared by every tree: back links,
    /// key order and the entry count.
    pub(crate) fn check_structure(&self) -> Result<(), TreeError> {
        let Some(root) = self.root else {
            return match self.len {
                0 => Ok(()),
                n => Err(TreeError::LenMismatch {
                    reported: n,
                    counted: 0,
                }),
            };
        };

        if self.node(root).parent.is_some() {
            return Err(TreeError::RootHasParent);
        }

        let mut counted = 0;
        let mut work = vec![root];
        while let Some(id) = work.pop() {
            counted += 1;
            let n = self.node(id);
            for c in [n.left, n.right].into_iter().flatten() {
                if self.node(c).parent != Some(id) {
                    return Err(TreeError::BrokenParentLink {
                        parent: id.0,
                        child: c.0,
                    });
                }
                work.push(c);
            }
        }

        if counted != self.len {
            return Err(TreeError::LenMismatch {
                reported: self.len,
                counted,
            });
        }

        let mut prev: Option<&K> = None;
        let mut curr = self.first();
        while let Some(id) = curr {
            let key = &self.node(id).key;
            if prev.is_some_and(|p| p >= key) {
                return Err(TreeError::OutOfOrder(id.0));
            }
            prev = Some(key);
            curr = self.successor(id);
        }

        Ok(())
    }
}

/// An iterator over the entries of a tree, sorted by key.
pub struct Iter<'a, K, V> {
    tree: &'a Tree<K, V>,
    front: Link,
    back: Link,
    len: usize,
}

impl<'a, K, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Self {
        Iter { ..*self }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let id = self.front?;
        self.len -= 1;
        self.front = self.tree.successor(id);
        let n = self.tree.node(id);
        Some((&n.key, &n.val))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let id = self.back?;
        self.len -= 1;
        self.back = self.tree.predecessor(id);
        let n = self.tree.node(id);
        Some((&n.key, &n.val))
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {
    fn len(&self) -> usize {
        self.len
    }
}

impl<'a, K, V> FusedIterator for Iter<'a, K, V> {}

/// An owning iterator over the entries of a map, sorted by key.
pub struct IntoIter<K, V> {
    entries: std::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.entries.next_back()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}
