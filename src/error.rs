use thiserror::Error;

/// Errors reported by lookups and by the invariant checks.
///
/// Insertion and removal never fail; these values only come back from
/// [`AvlMap::lookup`](crate::AvlMap::lookup) and the `check` methods.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The requested key is not in the map.
    #[error("key not found")]
    KeyNotFound,

    /// The root node carries a parent link.
    #[error("root node has a parent link")]
    RootHasParent,

    /// A child's parent link does not point back at the node owning it.
    #[error("parent link of node {child} does not point back at node {parent}")]
    BrokenParentLink {
        /// Arena slot of the owning node.
        parent: usize,
        /// Arena slot of the child with the bad back link.
        child: usize,
    },

    /// An in-order traversal met a key not greater than its predecessor.
    #[error("keys out of order at node {0}")]
    OutOfOrder(usize),

    /// A stored balance factor disagrees with the subtree heights.
    #[error("node {node} stores balance {stored} but its subtrees differ by {actual}")]
    BalanceMismatch {
        /// Arena slot of the node.
        node: usize,
        /// The balance factor kept in the node.
        stored: i8,
        /// height(right) - height(left), measured.
        actual: i64,
    },

    /// A balance factor left the range [-1, 1].
    #[error("node {node} has balance {balance}")]
    Unbalanced {
        /// Arena slot of the node.
        node: usize,
        /// The offending balance factor.
        balance: i64,
    },

    /// The entry count disagrees with the number of reachable nodes.
    #[error("map reports {reported} entries but the tree holds {counted}")]
    LenMismatch {
        /// Value returned by `len()`.
        reported: usize,
        /// Nodes reached from the root.
        counted: usize,
    },
}
