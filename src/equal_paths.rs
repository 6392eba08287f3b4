//! Path-length queries over plain, owned binary trees.
//!
//! These trees carry no ordering or balance information; they are whatever
//! shape the caller builds.

/// A binary tree node that owns its children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryTree<T> {
    pub val: T,
    pub left: Option<Box<BinaryTree<T>>>,
    pub right: Option<Box<BinaryTree<T>>>,
}

impl<T> BinaryTree<T> {
    /// Creates a tree with a single node.
    pub fn leaf(val: T) -> Self {
        BinaryTree {
            val,
            left: None,
            right: None,
        }
    }

    /// Creates a node over the given subtrees.
    ///
    /// # Examples
    /// ```
    /// use avl_bst::equal_paths::{equal_paths, BinaryTree};
    ///
    /// let t = BinaryTree::node(
    ///     1,
    ///     Some(BinaryTree::leaf(2)),
    ///     Some(BinaryTree::leaf(3)),
    /// );
    /// assert!(equal_paths(Some(&t)));
    /// ```
    pub fn node(val: T, left: Option<BinaryTree<T>>, right: Option<BinaryTree<T>>) -> Self {
        BinaryTree {
            val,
            left: left.map(Box::new),
            right: right.map(Box::new),
        }
    }
}

/// Number of nodes on the longest path from `root` down to a leaf.  The
/// empty tree has height 0.
pub fn height<T>(root: Option<&BinaryTree<T>>) -> usize {
    match root {
        None => 0,
        Some(n) => 1 + height(n.left.as_deref()).max(height(n.right.as_deref())),
    }
}

// Depth shared by every leaf below n, or None if the leaves disagree.
fn leaf_depth<T>(n: &BinaryTree<T>) -> Option<usize> {
    match (n.left.as_deref(), n.right.as_deref()) {
        (None, None) => Some(1),
        (Some(c), None) | (None, Some(c)) => leaf_depth(c).map(|d| d + 1),
        (Some(l), Some(r)) => {
            let d = leaf_depth(l)?;
            (leaf_depth(r)? == d).then_some(d + 1)
        }
    }
}

/// Tests whether every path from `root` to a leaf has the same number of
/// nodes.  The empty tree qualifies.
///
/// A node with a single child is not a leaf; only the paths through that
/// child count.
pub fn equal_paths<T>(root: Option<&BinaryTree<T>>) -> bool {
    root.map_or(true, |n| leaf_depth(n).is_some())
}
