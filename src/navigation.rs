//! Ordered navigation over parent/child links, shared by every balancing strategy.

use core::borrow::Borrow;
use core::cmp::Ordering;

use crate::node::NodeId;
use crate::strategy::Strategy;
use crate::tree::SearchTree;

impl<K, V, S: Strategy> SearchTree<K, V, S> {
    pub(crate) fn min_of(&self, node: NodeId) -> NodeId {
        let mut x = node;
        if x.is_nil() {
            return x;
        }
        while !self.arena[x].left.is_nil() {
            x = self.arena[x].left;
        }
        x
    }

    pub(crate) fn max_of(&self, node: NodeId) -> NodeId {
        let mut x = node;
        if x.is_nil() {
            return x;
        }
        while !self.arena[x].right.is_nil() {
            x = self.arena[x].right;
        }
        x
    }

    pub(crate) fn next_of(&self, node: NodeId) -> NodeId {
        if node.is_nil() {
            return node;
        }
        if !self.arena[node].right.is_nil() {
            return self.min_of(self.arena[node].right);
        }

        let mut x = node;
        let mut y = self.arena[x].parent;
        while !y.is_nil() && x == self.arena[y].right {
            x = y;
            y = self.arena[y].parent;
        }
        y
    }

    pub(crate) fn prev_of(&self, node: NodeId) -> NodeId {
        if node.is_nil() {
            return node;
        }
        if !self.arena[node].left.is_nil() {
            return self.max_of(self.arena[node].left);
        }

        let mut x = node;
        let mut y = self.arena[x].parent;
        while !y.is_nil() && x == self.arena[y].left {
            x = y;
            y = self.arena[y].parent;
        }
        y
    }

    /// Node holding the smallest key.
    pub fn minimum(&self) -> Option<NodeId> {
        self.min_of(self.root).non_nil()
    }

    /// Node holding the largest key.
    pub fn maximum(&self) -> Option<NodeId> {
        self.max_of(self.root).non_nil()
    }

    // The public walkers below answer `None` (or -1) for handles that are not live
    // nodes of this tree.

    /// Leftmost node of the subtree rooted at `node`.
    pub fn subtree_minimum(&self, node: NodeId) -> Option<NodeId> {
        if !self.arena.is_live(node) {
            return None;
        }
        self.min_of(node).non_nil()
    }

    /// Rightmost node of the subtree rooted at `node`.
    pub fn subtree_maximum(&self, node: NodeId) -> Option<NodeId> {
        if !self.arena.is_live(node) {
            return None;
        }
        self.max_of(node).non_nil()
    }

    /// In-order successor of `node`, `None` past the largest key.
    pub fn successor(&self, node: NodeId) -> Option<NodeId> {
        if !self.arena.is_live(node) {
            return None;
        }
        self.next_of(node).non_nil()
    }

    /// In-order predecessor of `node`, `None` before the smallest key.
    pub fn predecessor(&self, node: NodeId) -> Option<NodeId> {
        if !self.arena.is_live(node) {
            return None;
        }
        self.prev_of(node).non_nil()
    }

    /// Edges on the longest root-to-leaf path; -1 for an empty tree.
    pub fn height(&self) -> isize {
        self.subtree_height(self.root)
    }

    pub fn subtree_height(&self, node: NodeId) -> isize {
        if !self.arena.is_live(node) {
            return -1;
        }

        let mut deepest = 0;
        let mut stack = vec![(node, 0isize)];
        while let Some((x, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            for child in [self.arena[x].left, self.arena[x].right] {
                if !child.is_nil() {
                    stack.push((child, depth + 1));
                }
            }
        }
        deepest
    }

    /// Whether `node` is currently linked into this tree.
    pub fn is_in_tree(&self, node: NodeId) -> bool {
        if !self.arena.is_live(node) {
            return false;
        }

        let mut x = node;
        loop {
            let parent = self.arena[x].parent;
            if parent.is_nil() {
                return x == self.root;
            }
            x = parent;
        }
    }

    pub fn find_node<Q: ?Sized + Ord>(&self, key: &Q) -> Option<NodeId>
    where K: Borrow<Q>
    {
        self.lookup(key).non_nil()
    }

    pub(crate) fn lookup<Q: ?Sized + Ord>(&self, key: &Q) -> NodeId
    where K: Borrow<Q>
    {
        let mut x = self.root;
        while !x.is_nil() {
            match key.cmp(self.arena[x].key().borrow()) {
                Ordering::Less => x = self.arena[x].left,
                Ordering::Greater => x = self.arena[x].right,
                Ordering::Equal => return x,
            }
        }
        x
    }
}
