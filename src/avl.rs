#![warn(missing_docs)]
use std::borrow::Borrow;
use std::fmt::{Debug, Formatter};
use std::mem::replace;

use crate::bst::{IntoIter, Iter, Link, NodeId, Search, Side, Tree};
use crate::TreeError;

mod avl_set;
pub use avl_set::{AvlSet, Difference, Intersection, SetIter, SymmetricDifference, Union};

#[cfg(test)]
macro_rules! chk_map {
    ( $x:expr ) => {{
        if let Err(e) = $x.check() {
            panic!("invariant broken: {}\n{:?}", e, $x.tree.root());
        }
    }};
}

#[cfg(not(test))]
macro_rules! chk_map {
    ( $x:expr ) => {{}};
}

/// A map from keys to values sorted by key.
///
/// We aim for the API to follow the (stable) API of
/// [`std::collections::BTreeMap`] where the two overlap.
///
/// Internally, the map is an [AVL tree](https://en.wikipedia.org/wiki/AVL_tree)
/// whose nodes sit in an arena and keep a link to their parent.  Each node
/// stores its balance factor, `height(right) - height(left)`, which stays in
/// `-1..=1` between operations.  After an insertion or removal the tree is
/// repaired by walking upward from the changed node, rotating where a balance
/// factor reaches ±2, and stopping at the first ancestor whose height did not
/// change.
#[derive(Clone)]
pub struct AvlMap<K, V> {
    tree: Tree<K, V>,
}

// Moves n's child on the `rising` side into n's place; n becomes that child's
// child on the other side, adopting its inner subtree.  Balance factors are
// left for the caller.
fn lift<K, V>(tree: &mut Tree<K, V>, n: NodeId, rising: Side) {
    let Some(c) = tree.node(n).child(rising) else {
        panic!("rotation needs a child on the {:?} side", rising);
    };

    #[cfg(feature = "tracing")]
    tracing::trace!(pivot = n.index(), rising = ?rising, "rotate");

    let pos = tree.position(n);
    let inner = tree.node(c).child(rising.opposite());

    tree.set_position(pos, Some(c));
    tree.node_mut(c).parent = pos.map(|(p, _)| p);

    tree.node_mut(n).set_child(rising, inner);
    if let Some(i) = inner {
        tree.node_mut(i).parent = Some(n);
    }

    tree.node_mut(c).set_child(rising.opposite(), Some(n));
    tree.node_mut(n).parent = Some(c);
}

// We want the following transformation:
//    n(x, r(y, z))   =>   r(n(x, y), z)
fn rotate_left<K, V>(tree: &mut Tree<K, V>, n: NodeId) {
    lift(tree, n, Side::Right)
}

// We want the following transformation:
//    n(l(x, y), z)   =>   l(x, n(y, z))
fn rotate_right<K, V>(tree: &mut Tree<K, V>, n: NodeId) {
    lift(tree, n, Side::Left)
}

// Rotates at n so that its child on the `rising` side takes n's place.
fn rotate<K, V>(tree: &mut Tree<K, V>, n: NodeId, rising: Side) {
    match rising {
        Side::Right => rotate_left(tree, n),
        Side::Left => rotate_right(tree, n),
    }
}

fn set_bal<K, V>(tree: &mut Tree<K, V>, id: NodeId, bal: i8) {
    tree.node_mut(id).bal = bal;
}

// Swaps two nodes' places.  Balance factors describe positions, not entries,
// so they trade places as well.
fn node_swap<K, V>(tree: &mut Tree<K, V>, a: NodeId, b: NodeId) {
    tree.swap_positions(a, b);
    let a_bal = tree.node(a).bal;
    let b_bal = replace(&mut tree.node_mut(b).bal, a_bal);
    set_bal(tree, a, b_bal);
}

// p just went from balanced to leaning toward n, so p's subtree grew by one
// level.  Walk upward until some ancestor absorbs the growth.
fn insert_fix<K, V>(tree: &mut Tree<K, V>, mut p: NodeId, mut n: NodeId) {
    while let Some((g, p_side)) = tree.position(p) {
        let bal = tree.node(g).bal + p_side.sign();
        set_bal(tree, g, bal);

        match bal {
            0 => break,

            -1 | 1 => {
                n = p;
                p = g;
            }

            _ => {
                let s = p_side.sign();
                let n_side = if tree.node(p).left == Some(n) {
                    Side::Left
                } else {
                    Side::Right
                };

                if n_side == p_side {
                    // zig-zig
                    rotate(tree, g, p_side);
                    set_bal(tree, p, 0);
                    set_bal(tree, g, 0);
                } else {
                    // zig-zag: n rises above both p and g
                    let n_bal = tree.node(n).bal;
                    rotate(tree, p, n_side);
                    rotate(tree, g, p_side);

                    let (p_bal, g_bal) = if n_bal == s {
                        (0, -s)
                    } else if n_bal == -s {
                        (s, 0)
                    } else {
                        (0, 0)
                    };
                    set_bal(tree, p, p_bal);
                    set_bal(tree, g, g_bal);
                    set_bal(tree, n, 0);
                }

                // the rotated subtree is back to its height before the insert
                break;
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!(stop = p.index(), "insert fix-up done");
}

// The subtree at n lost a level on one side: diff is +1 when the left side
// shrank and -1 when the right side did.  Walk upward until some ancestor's
// height is unaffected.
fn remove_fix<K, V>(tree: &mut Tree<K, V>, n: Link, diff: i8) {
    let mut curr = n.map(|n| (n, diff));

    while let Some((n, diff)) = curr {
        // read before any rotation moves n
        let up = tree.position(n).map(|(p, side)| (p, -side.sign()));
        let b = tree.node(n).bal + diff;

        curr = match b {
            -2 | 2 => {
                let (heavy, s) = if b > 0 {
                    (Side::Right, 1)
                } else {
                    (Side::Left, -1)
                };
                let Some(c) = tree.node(n).child(heavy) else {
                    panic!("node {} leans toward a missing child", n.index());
                };
                let c_bal = tree.node(c).bal;

                if c_bal == s {
                    rotate(tree, n, heavy);
                    set_bal(tree, n, 0);
                    set_bal(tree, c, 0);
                    up
                } else if c_bal == 0 {
                    // the subtree keeps its height
                    rotate(tree, n, heavy);
                    set_bal(tree, n, s);
                    set_bal(tree, c, -s);
                    None
                } else {
                    let Some(g) = tree.node(c).child(heavy.opposite()) else {
                        panic!("node {} leans toward a missing child", c.index());
                    };
                    let g_bal = tree.node(g).bal;
                    rotate(tree, c, heavy.opposite());
                    rotate(tree, n, heavy);

                    let (n_bal, c_bal) = if g_bal == -s {
                        (0, s)
                    } else if g_bal == s {
                        (-s, 0)
                    } else {
                        (0, 0)
                    };
                    set_bal(tree, n, n_bal);
                    set_bal(tree, c, c_bal);
                    set_bal(tree, g, 0);
                    up
                }
            }

            -1 | 1 => {
                set_bal(tree, n, b);
                None
            }

            _ => {
                set_bal(tree, n, 0);
                up
            }
        };

        #[cfg(feature = "tracing")]
        {
            if curr.is_none() {
                tracing::trace!(stop = n.index(), "remove fix-up done");
            }
        }
    }
}

// Recomputes every subtree height and compares it with the stored balance
// factors.  Returns the height of the subtree at link.
fn chk_bal<K, V>(tree: &Tree<K, V>, link: Link) -> Result<i64, TreeError> {
    let Some(id) = link else {
        return Ok(0);
    };

    let n = tree.node(id);
    let lf = chk_bal(tree, n.left)?;
    let rt = chk_bal(tree, n.right)?;

    if rt - lf != n.bal as i64 {
        return Err(TreeError::BalanceMismatch {
            node: id.index(),
            stored: n.bal,
            actual: rt - lf,
        });
    }

    if !(-1..=1).contains(&n.bal) {
        return Err(TreeError::Unbalanced {
            node: id.index(),
            balance: n.bal as i64,
        });
    }

    Ok(1 + lf.max(rt))
}

impl<K, V> AvlMap<K, V> {
    /// Creates a new, empty map.
    /// # Examples
    /// ```
    /// use avl_bst::AvlMap;
    /// let m: AvlMap<usize, usize> = AvlMap::new();
    /// assert!(m.is_empty());
    /// ```
    pub fn new() -> Self {
        AvlMap { tree: Tree::new() }
    }

    /// Drops all elements from the map.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Returns true if self contains no entries, false otherwise.
    pub fn is_empty(&self) -> bool {
        self.tree.len() == 0
    }

    /// Returns the number of entries in self.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns the number of nodes on the longest root-to-leaf path.
    ///
    /// An AVL tree with `n` entries is never taller than about
    /// `1.44 * log2(n + 2)`.
    pub fn height(&self) -> usize {
        self.tree.height()
    }

    /// Creates an iterator over the map entries, sorted by key.
    ///
    /// Nodes link to their parents, so the iterator needs no stack and can
    /// be driven from both ends.
    ///
    /// # Examples
    /// ```
    /// use avl_bst::AvlMap;
    ///
    /// let m = AvlMap::from([(0,1), (1,2), (2, 3)]);
    /// for (i, (k, v)) in m.iter().enumerate() {
    ///     assert_eq!(&i, k);
    ///     assert_eq!(&(i+1), v);
    /// }
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.tree.iter()
    }

    /// Produces an iterator over the keys of the map, in sorted order.
    ///
    /// # Examples
    /// ```
    /// use avl_bst::AvlMap;
    ///
    /// let m = AvlMap::from([(0,0), (1,1), (2,2)]);
    /// let cnt_even_keys = m.keys().filter(|&k| k % &2 == 0).count();
    /// assert_eq!(cnt_even_keys, 2);
    /// ```
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> {
        self.iter().map(|p| p.0)
    }

    /// Produces an iterator over the values of the map, ordered by their
    /// associated keys.
    ///
    /// # Examples
    /// ```
    /// use avl_bst::AvlMap;
    ///
    /// let m = AvlMap::from([(0,0), (1,1), (2,2)]);
    /// let sum_values: u32 = m.values().sum();
    /// assert_eq!(sum_values, 3);
    /// ```
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> {
        self.iter().map(|p| p.1)
    }

    /// Applies f to each entry of the map in order of the keys.
    pub fn for_each<F: FnMut((&K, &V))>(&self, f: F) {
        self.iter().for_each(f);
    }

    /// Applies a function to every key-value pair in the map, in key order,
    /// with a mutable reference to each value.
    ///
    /// # Examples
    /// ```
    /// use avl_bst::AvlMap;
    ///
    /// let mut m = AvlMap::new();
    /// m.insert(0, "a");
    /// m.for_each_mut(|(_, v)| *v = "b");
    /// assert_eq!(m.get(&0), Some(&"b"));
    /// ```
    pub fn for_each_mut<F: FnMut((&K, &mut V))>(&mut self, f: F) {
        self.tree.for_each_mut(f);
    }

    /// Returns the key-value pair for the least key in the map
    ///
    /// # Examples
    /// ```
    /// use avl_bst::AvlMap;
    ///
    /// let m = AvlMap::from([(2,0), (1,0)]);
    /// assert_eq!(m.first_key_value(), Some((&1, &0)));
    /// ```
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first().map(|id| {
            let n = self.tree.node(id);
            (&n.key, &n.val)
        })
    }

    /// Returns the key-value pair for the greatest key in the map
    ///
    /// # Examples
    /// ```
    /// use avl_bst::AvlMap;
    ///
    /// let m = AvlMap::from([(2,0), (1,0)]);
    /// assert_eq!(m.last_key_value(), Some((&2, &0)));
    /// ```
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last().map(|id| {
            let n = self.tree.node(id);
            (&n.key, &n.val)
        })
    }

    // Unlinks a node, rebalances and hands back its entry.
    fn remove_node(&mut self, id: NodeId) -> (K, V) {
        let n = self.tree.node(id);
        if n.left.is_some() && n.right.is_some() {
            if let Some(pred) = self.tree.predecessor(id) {
                node_swap(&mut self.tree, id, pred);
            }
        }

        let pos = self.tree.splice_out(id);
        let entry = self.tree.release(id);
        if let Some((p, side)) = pos {
            // losing a left child tips the parent right, and vice versa
            remove_fix(&mut self.tree, Some(p), -side.sign());
        }
        entry
    }
}

impl<K: Ord, V> AvlMap<K, V> {
    /// Inserts a key-value pair in the map and returns the value previously
    /// stored under the key.  Replacing a value leaves the tree's shape alone.
    ///
    /// # Examples
    /// ```
    /// use avl_bst::AvlMap;
    ///
    /// let mut m = AvlMap::new();
    /// assert_eq!(m.insert(0, "a"), None);
    /// assert_eq!(m.insert(0, "b"), Some("a"));
    /// assert_eq!(m.get(&0), Some(&"b"));
    /// ```
    pub fn insert(&mut self, key: K, val: V) -> Option<V> {
        let pos = match self.tree.search(&key) {
            Search::Found(id) => {
                return Some(replace(&mut self.tree.node_mut(id).val, val));
            }
            Search::Vacant(pos) => pos,
        };

        let n = self.tree.alloc(key, val);
        self.tree.attach(pos, n);

        if let Some((p, side)) = pos {
            let pn = self.tree.node_mut(p);
            if pn.bal != 0 {
                // p had a single child, on the other side; n evens it out
                pn.bal = 0;
            } else {
                pn.bal = side.sign();
                insert_fix(&mut self.tree, p, n);
            }
        }

        chk_map!(self);
        None
    }

    /// Removes a key from a map and returns the unmapped value.
    ///
    /// # Examples
    /// ```
    /// use avl_bst::AvlMap;
    ///
    /// let mut m = AvlMap::new();
    /// m.insert(1, 2);
    /// m.insert(2, 3);
    /// assert_eq!(m.remove(&2), Some(3));
    /// assert_eq!(m.remove(&2), None);
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove_entry(key).map(|e| e.1)
    }

    /// Removes a key from the map and returns the stored key and value.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.tree.find(key)?;
        let entry = self.remove_node(id);
        chk_map!(self);
        Some(entry)
    }

    /// Removes and returns the entry with the least key.
    ///
    /// # Examples
    /// ```
    /// use avl_bst::AvlMap;
    ///
    /// let mut m = AvlMap::from([(1, 'a'), (0, 'b')]);
    /// assert_eq!(m.pop_first(), Some((0, 'b')));
    /// assert_eq!(m.len(), 1);
    /// ```
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let id = self.tree.first()?;
        let entry = self.remove_node(id);
        chk_map!(self);
        Some(entry)
    }

    /// Removes and returns the entry with the greatest key.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let id = self.tree.last()?;
        let entry = self.remove_node(id);
        chk_map!(self);
        Some(entry)
    }

    /// Returns a reference to the value associated with k.
    ///
    /// # Example
    /// ```
    /// use avl_bst::AvlMap;
    ///
    /// let mut m = AvlMap::new();
    /// m.insert(0, 100);
    ///
    /// assert_eq!(m.get(&0), Some(&100));
    /// assert_eq!(m.get(&1), None);
    /// ```
    pub fn get<Q>(&self, k: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.find(k).map(|id| &self.tree.node(id).val)
    }

    /// Returns the stored key and value matching k.
    pub fn get_key_value<Q>(&self, k: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.find(k).map(|id| {
            let n = self.tree.node(id);
            (&n.key, &n.val)
        })
    }

    /// Returns a mutable reference to the value associated with k.
    ///
    /// # Example
    /// ```
    /// use avl_bst::AvlMap;
    ///
    /// let mut m = AvlMap::new();
    /// m.insert(1, 7);
    ///
    /// *m.get_mut(&1).unwrap() = 2;
    /// assert_eq!(m.get(&1), Some(&2));
    /// ```
    pub fn get_mut<Q>(&mut self, k: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.tree.find(k)?;
        Some(&mut self.tree.node_mut(id).val)
    }

    /// Like [`get`](#method.get), but reports a missing key as an error.
    ///
    /// # Example
    /// ```
    /// use avl_bst::{AvlMap, TreeError};
    ///
    /// let m = AvlMap::from([(1, "one")]);
    /// assert_eq!(m.lookup(&1), Ok(&"one"));
    /// assert_eq!(m.lookup(&2), Err(TreeError::KeyNotFound));
    /// ```
    pub fn lookup<Q>(&self, k: &Q) -> Result<&V, TreeError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(k).ok_or(TreeError::KeyNotFound)
    }

    /// Tests if self contains an entry for the given key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.find(key).is_some()
    }

    /// Verifies every invariant of the tree: parent links, key order, the
    /// entry count, and that each balance factor is in `-1..=1` and matches
    /// the heights of the node's subtrees.
    pub fn check(&self) -> Result<(), TreeError> {
        self.tree.check_structure()?;
        chk_bal(&self.tree, self.tree.root())?;
        Ok(())
    }
}

impl<K, V> Default for AvlMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

fn fmt_node<K: Debug, V: Debug>(
    tree: &Tree<K, V>,
    link: Link,
    f: &mut Formatter<'_>,
) -> std::fmt::Result {
    let Some(id) = link else {
        return f.write_str(".");
    };

    let n = tree.node(id);
    f.write_fmt(format_args!("(bal: {} {{{:?}: {:?}}} ", n.bal, n.key, n.val))?;
    fmt_node(tree, n.left, f)?;
    f.write_str(" ")?;
    fmt_node(tree, n.right, f)?;
    f.write_str(")")
}

impl<K: Debug, V: Debug> Debug for AvlMap<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.tree.root() {
            None => f.write_str("AvlMap(EMPTY)"),
            root => {
                f.write_fmt(format_args!("AvlMap(#{}, ", self.len()))?;
                fmt_node(&self.tree, root, f)?;
                f.write_str(")")
            }
        }
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for AvlMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for AvlMap<K, V> {}

impl<K: PartialOrd, V: PartialOrd> PartialOrd for AvlMap<K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<K: Ord, V: Ord> Ord for AvlMap<K, V> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<K: std::hash::Hash, V: std::hash::Hash> std::hash::Hash for AvlMap<K, V> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        self.for_each(|(k, v)| {
            k.hash(state);
            v.hash(state);
        });
    }
}

impl<K, Q, V> std::ops::Index<&Q> for AvlMap<K, V>
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
{
    type Output = V;

    fn index(&self, index: &Q) -> &Self::Output {
        match self.get(index) {
            Some(v) => v,
            None => panic!("Key not found in AvlMap"),
        }
    }
}

impl<K: Ord, V> Extend<(K, V)> for AvlMap<K, V> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for AvlMap<K, V> {
    fn from(vs: [(K, V); N]) -> Self {
        AvlMap::from_iter(vs)
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlMap<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut m = AvlMap::new();
        m.extend(iter);
        m
    }
}

impl<'a, K, V> IntoIterator for &'a AvlMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> IntoIterator for AvlMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.tree.into_entries()
    }
}
