//! Ordered maps kept as binary search trees, with a choice of rebalancing discipline:
//! none ([`Unbalanced`]), AVL ([`HeightBalanced`]), red-black ([`ColorBalanced`]) or
//! AA ([`LevelBalanced`]).
//!
//! All four share one façade, [`SearchTree`], and one set of navigation primitives; only
//! the fix-up run after each insertion or deletion differs.
//!
//! ```
//! use search_trees::AvlTree;
//!
//! let mut t: AvlTree<u32, &str> = AvlTree::new();
//! assert!(t.insert(2, "two"));
//! assert!(t.insert(1, "one"));
//! assert!(!t.insert(1, "uno"));
//! assert_eq!(t.find(&1), Some(&"one"));
//! assert_eq!(t.erase(&2), 1);
//! assert_eq!(t.size(), 1);
//! ```

pub mod error;
pub mod node;
pub mod strategy;
pub mod tree;
mod navigation;
pub mod unbalanced;
pub mod height_balanced;
pub mod color_balanced;
pub mod level_balanced;
pub mod script;

pub use error::{InvariantViolation, ScriptError};
pub use node::NodeId;
pub use strategy::{Splice, Strategy};
pub use tree::{Iter, QueryBound, Range, SearchTree};
pub use unbalanced::{NoMeta, Unbalanced, UnbalancedTree};
pub use height_balanced::{AvlTree, Balance, HeightBalanced};
pub use color_balanced::{Color, ColorBalanced, RedBlackTree};
pub use level_balanced::{AaTree, Level, LevelBalanced};
