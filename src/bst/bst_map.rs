use super::{IntoIter, Iter, NodeId, Search, Tree};
use crate::TreeError;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::mem::replace;

/// A map on a plain, unbalanced binary search tree.
///
/// This is the substrate [`AvlMap`](crate::AvlMap) rebalances, offered on its
/// own for comparison and for workloads with random insertion order.  Sorted
/// insertions degrade it to a linked list.
#[derive(Clone)]
pub struct BstMap<K, V> {
    tree: Tree<K, V>,
}

impl<K, V> BstMap<K, V> {
    /// Creates a new, empty map.
    pub fn new() -> Self {
        BstMap { tree: Tree::new() }
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Returns the number of entries in self.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns true if self contains no entries.
    pub fn is_empty(&self) -> bool {
        self.tree.len() == 0
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        self.tree.height()
    }

    /// Tests whether the subtrees of every node differ in height by at most
    /// one.
    ///
    /// # Examples
    /// ```
    /// use avl_bst::BstMap;
    ///
    /// let m = BstMap::from_iter([(2, ()), (1, ()), (3, ())]);
    /// assert!(m.is_balanced());
    ///
    /// let m = BstMap::from_iter([(1, ()), (2, ()), (3, ())]);
    /// assert!(!m.is_balanced());
    /// ```
    pub fn is_balanced(&self) -> bool {
        // post-order over an explicit stack
        let Some(root) = self.tree.root() else {
            return true;
        };

        let mut heights: HashMap<NodeId, i64> = HashMap::new();
        let mut work = vec![(root, false)];
        while let Some((id, expanded)) = work.pop() {
            let n = self.tree.node(id);
            if !expanded {
                work.push((id, true));
                for c in [n.left, n.right].into_iter().flatten() {
                    work.push((c, false));
                }
                continue;
            }

            let ht = |l: Option<NodeId>| l.map_or(0, |c| heights[&c]);
            let (lf, rt) = (ht(n.left), ht(n.right));
            if (lf - rt).abs() > 1 {
                return false;
            }
            heights.insert(id, 1 + lf.max(rt));
        }
        true
    }

    /// Creates an iterator over the entries, sorted by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.tree.iter()
    }
}

impl<K: Ord, V> BstMap<K, V> {
    /// Inserts a key-value pair without any rebalancing and returns the value
    /// it replaced.
    pub fn insert(&mut self, key: K, val: V) -> Option<V> {
        match self.tree.search(&key) {
            Search::Found(id) => Some(replace(&mut self.tree.node_mut(id).val, val)),
            Search::Vacant(pos) => {
                let id = self.tree.alloc(key, val);
                self.tree.attach(pos, id);
                None
            }
        }
    }

    /// Removes a key and returns its value.  A node with two children first
    /// trades places with its in-order predecessor.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.tree.find(key)?;
        let n = self.tree.node(id);
        if n.left.is_some() && n.right.is_some() {
            if let Some(pred) = self.tree.predecessor(id) {
                self.tree.swap_positions(id, pred);
            }
        }
        self.tree.splice_out(id);
        Some(self.tree.release(id).1)
    }

    /// Returns a reference to the value associated with key.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.find(key).map(|id| &self.tree.node(id).val)
    }

    /// Tests if self contains an entry for the given key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.find(key).is_some()
    }

    /// Verifies parent links, key order and the entry count.
    pub fn check(&self) -> Result<(), TreeError> {
        self.tree.check_structure()
    }
}

impl<K, V> Default for BstMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Debug, V: Debug> Debug for BstMap<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> Extend<(K, V)> for BstMap<K, V> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for BstMap<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut m = BstMap::new();
        m.extend(iter);
        m
    }
}

impl<'a, K, V> IntoIterator for &'a BstMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> IntoIterator for BstMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.tree.into_entries()
    }
}
