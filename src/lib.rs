//! # Ordered collections on parent-linked AVL trees
//!
//! `avl-bst` provides [`AvlMap`] and [`AvlSet`], sorted collections kept
//! balanced by the classic AVL scheme: every node records the height
//! difference of its two subtrees and the tree rotates whenever that
//! difference would reach two.  Nodes link back to their parents, so the
//! repair after an insert or remove walks upward from the change and stops
//! as soon as the height of a subtree is unaffected.
//!
//! The unbalanced search tree underneath is also available as [`BstMap`],
//! and [`equal_paths`] holds a small utility for checking whether all
//! leaves of an arbitrary binary tree sit at the same depth.
//!
//! Cargo features:
//! - `serde`: serialization of maps and sets;
//! - `tracing`: `trace`-level events for rotations and rebalancing walks.

mod avl;
pub use avl::{AvlMap, AvlSet, Difference, Intersection, SetIter, SymmetricDifference, Union};

mod bst;
pub use bst::{BstMap, IntoIter, Iter};

mod error;
pub use error::TreeError;

pub mod equal_paths;

#[cfg(feature = "serde")]
mod serde;
