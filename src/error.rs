use std::io;

use crate::node::NodeId;

/// First broken structural or balance invariant found by [`crate::SearchTree::validate`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("root {root:?} has parent link {parent:?}")]
    RootHasParent { root: NodeId, parent: NodeId },

    #[error("key of {node:?} is not greater than the key of its predecessor {predecessor:?}")]
    OutOfOrder { predecessor: NodeId, node: NodeId },

    #[error("child {child:?} of {parent:?} links back to {linked:?}")]
    BrokenParentLink { parent: NodeId, child: NodeId, linked: NodeId },

    #[error("size is recorded as {recorded} but {reachable} nodes are reachable")]
    SizeMismatch { recorded: usize, reachable: usize },

    #[error("balance factor of {node:?} is {balance}")]
    BalanceOutOfRange { node: NodeId, balance: i8 },

    #[error("{node:?} records balance factor {recorded} but its subtrees differ by {actual}")]
    BalanceMismatch { node: NodeId, recorded: i8, actual: i64 },

    #[error("the sentinel is not black")]
    RedSentinel,

    #[error("root {root:?} is red")]
    RedRoot { root: NodeId },

    #[error("red node {node:?} has red child {child:?}")]
    RedRed { node: NodeId, child: NodeId },

    #[error("subtrees of {node:?} have black heights {left} and {right}")]
    BlackHeightMismatch { node: NodeId, left: usize, right: usize },

    #[error("left child {child:?} of {node:?} is at level {child_level}, expected {expected}")]
    LeftLevel { node: NodeId, child: NodeId, child_level: u32, expected: u32 },

    #[error("right child {child:?} of {node:?} is at level {child_level}, node is at level {level}")]
    RightLevel { node: NodeId, child: NodeId, child_level: u32, level: u32 },

    #[error("{node:?} and its right grandchild {grandchild:?} share level {level}")]
    DoubleHorizontal { node: NodeId, grandchild: NodeId, level: u32 },
}

/// Failures of the command-script driver.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("line {line}: cannot parse `{text}`")]
    Parse { line: usize, text: String },

    #[error("line {line}: key `{text}` is not a 64-bit integer")]
    BadKey { line: usize, text: String },

    #[error("line {line}: {source}")]
    Invariant { line: usize, source: InvariantViolation },

    #[error(transparent)]
    Io(#[from] io::Error),
}
