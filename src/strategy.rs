use core::fmt;

use crate::error::InvariantViolation;
use crate::node::NodeId;
use crate::tree::SearchTree;

mod sealed {
    pub trait Sealed {}

    impl Sealed for crate::unbalanced::Unbalanced {}
    impl Sealed for crate::height_balanced::HeightBalanced {}
    impl Sealed for crate::color_balanced::ColorBalanced {}
    impl Sealed for crate::level_balanced::LevelBalanced {}
}

/// What the shared deletion splice leaves behind for the strategy to repair.
#[derive(Clone, Copy, Debug)]
pub struct Splice<M> {
    /// Parent of the node that was unlinked, `None` if it was the root.
    pub parent: Option<NodeId>,
    /// The child that took its place, `None` if it was a leaf.
    pub child: Option<NodeId>,
    /// Whether the unlinked node hung off its parent's left link.
    pub was_left: bool,
    /// Metadata the unlinked node carried.
    pub meta: M,
}

/// A rebalancing discipline. Chosen once, as a type parameter of [`SearchTree`].
///
/// The tree performs the binary-search descent and the splice for both insertion and
/// deletion; the strategy then restores its own invariant along the path from the
/// mutation point to the root.
pub trait Strategy: sealed::Sealed + Sized {
    /// Per-node balancing state.
    type Meta: Copy + PartialEq + fmt::Debug + fmt::Display;

    const NAME: &'static str;

    /// Metadata of the shared terminator slot.
    const SENTINEL: Self::Meta;

    /// Metadata of a freshly spliced leaf.
    const LEAF: Self::Meta;

    /// Called once `node` has been linked in as a new leaf.
    fn rebalance_after_insert<K, V>(tree: &mut SearchTree<K, V, Self>, node: NodeId);

    /// Called once a node with at most one child has been unlinked.
    fn rebalance_after_erase<K, V>(tree: &mut SearchTree<K, V, Self>, splice: Splice<Self::Meta>);

    /// Checks the strategy's balance invariant over the whole tree.
    fn validate<K, V>(tree: &SearchTree<K, V, Self>) -> Result<(), InvariantViolation>;
}
