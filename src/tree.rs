use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use log::{debug, trace};

use crate::error::InvariantViolation;
use crate::node::{Arena, Node, NodeId};
use crate::strategy::{Splice, Strategy};

#[derive(PartialEq, Eq, Debug)]
pub enum QueryBound<Q> {
    Inclusive(Q),
    Exclusive(Q),
}

impl<Q> QueryBound<Q> {
    fn admits_from_below<K>(&self, key: &K) -> bool
    where Q: PartialOrd<K>
    {
        match self {
            Self::Inclusive(lb) => *lb <= *key,
            Self::Exclusive(lb) => *lb < *key,
        }
    }

    fn admits_from_above<K>(&self, key: &K) -> bool
    where Q: PartialOrd<K>
    {
        match self {
            Self::Inclusive(ub) => *ub >= *key,
            Self::Exclusive(ub) => *ub > *key,
        }
    }
}

impl<Q: Clone> Clone for QueryBound<Q> {
    fn clone(&self) -> Self {
        match self {
            Self::Inclusive(b) => Self::Inclusive(b.clone()),
            Self::Exclusive(b) => Self::Exclusive(b.clone()),
        }
    }
}

impl<Q: Clone + Copy> Copy for QueryBound<Q> {}

/// An ordered map kept as a binary search tree, balanced by the strategy `S`.
pub struct SearchTree<K, V, S: Strategy> {
    pub(crate) arena: Arena<K, V, S::Meta>,
    pub(crate) root: NodeId,
    len: usize,
    _strategy: PhantomData<S>,
}

impl<K, V, S: Strategy> SearchTree<K, V, S> {
    pub fn new() -> Self {
        Self{arena: Arena::new(S::SENTINEL), root: NodeId::NIL, len: 0, _strategy: PhantomData}
    }

    /// Number of keys in the map.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Same as [`Self::len`].
    pub fn size(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        debug!("{}: clearing {} nodes", S::NAME, self.len);
        self.arena.reset();
        self.root = NodeId::NIL;
        self.len = 0;
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root.non_nil()
    }

    // Handle-taking accessors panic on a handle that does not refer to a live node of
    // this tree: the sentinel, a vacated slot, or an index this arena never handed out.
    fn live(&self, id: NodeId) -> &Node<K, V, S::Meta> {
        assert!(self.arena.is_live(id), "{:?} is not a live node of this tree", id);
        &self.arena[id]
    }

    pub fn key(&self, id: NodeId) -> &K {
        self.live(id).key()
    }

    pub fn value(&self, id: NodeId) -> &V {
        self.live(id).value()
    }

    pub fn value_mut(&mut self, id: NodeId) -> &mut V {
        assert!(self.arena.is_live(id), "{:?} is not a live node of this tree", id);
        self.arena[id].value_mut()
    }

    /// Balancing metadata stored at `id` (balance factor, color or level).
    pub fn meta(&self, id: NodeId) -> S::Meta {
        self.live(id).meta
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.live(id).parent.non_nil()
    }

    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        self.live(id).left.non_nil()
    }

    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        self.live(id).right.non_nil()
    }

    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.minimum().map(|id| self.arena[id].key_value())
    }

    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.maximum().map(|id| self.arena[id].key_value())
    }

    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter{tree: self, front: self.min_of(self.root), back: self.max_of(self.root), remaining: self.len}
    }

    /// Makes `v` take `u`'s place under `u`'s parent. `v` may be the sentinel, whose
    /// parent link then records where the gap is.
    pub(crate) fn transplant(&mut self, u: NodeId, v: NodeId) {
        let parent = self.arena[u].parent;
        self.replace_child(parent, u, v);
        self.arena[v].parent = parent;
    }

    fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        if parent.is_nil() {
            self.root = new;
        } else if self.arena[parent].left == old {
            self.arena[parent].left = new;
        } else {
            assert_eq!(self.arena[parent].right, old);
            self.arena[parent].right = new;
        }
    }

    /// Lifts `x`'s right child into `x`'s place and returns it. Links only; metadata is
    /// left to the caller.
    pub(crate) fn rotate_left(&mut self, x: NodeId) -> NodeId {
        assert!(!x.is_nil());
        let y = self.arena[x].right;
        assert!(!y.is_nil(), "left rotation at {:?} without a right child", x);
        trace!("{}: rotate left at {:?}", S::NAME, x);

        let yl = self.arena[y].left;
        self.arena[x].right = yl;
        if !yl.is_nil() {
            self.arena[yl].parent = x;
        }

        let parent = self.arena[x].parent;
        self.arena[y].parent = parent;
        self.replace_child(parent, x, y);

        self.arena[y].left = x;
        self.arena[x].parent = y;
        y
    }

    /// Mirror of [`Self::rotate_left`].
    pub(crate) fn rotate_right(&mut self, x: NodeId) -> NodeId {
        assert!(!x.is_nil());
        let y = self.arena[x].left;
        assert!(!y.is_nil(), "right rotation at {:?} without a left child", x);
        trace!("{}: rotate right at {:?}", S::NAME, x);

        let yr = self.arena[y].right;
        self.arena[x].left = yr;
        if !yr.is_nil() {
            self.arena[yr].parent = x;
        }

        let parent = self.arena[x].parent;
        self.arena[y].parent = parent;
        self.replace_child(parent, x, y);

        self.arena[y].right = x;
        self.arena[x].parent = y;
        y
    }
}

impl<K: Ord, V, S: Strategy> SearchTree<K, V, S> {
    /// Adds `key` unless it is already present. Returns whether the map changed; an
    /// existing value is never overwritten.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let mut x = self.root;
        let mut parent = NodeId::NIL;
        let mut go_left = false;
        while !x.is_nil() {
            parent = x;
            match key.cmp(self.arena[x].key()) {
                Ordering::Less => {
                    go_left = true;
                    x = self.arena[x].left;
                },
                Ordering::Greater => {
                    go_left = false;
                    x = self.arena[x].right;
                },
                Ordering::Equal => return false,
            }
        }

        let node = self.arena.alloc(key, value, S::LEAF, parent);
        if parent.is_nil() {
            self.root = node;
        } else if go_left {
            self.arena[parent].left = node;
        } else {
            self.arena[parent].right = node;
        }
        self.len += 1;

        S::rebalance_after_insert(self, node);
        debug!("{}: inserted {:?}, size {}", S::NAME, node, self.len);
        true
    }

    /// Removes `key`, returning its value.
    pub fn remove<Q: ?Sized + Ord>(&mut self, key: &Q) -> Option<V>
    where K: Borrow<Q>
    {
        let found = self.lookup(key);
        if found.is_nil() {
            return None;
        }

        // A node with two children trades entries with its successor, which has no
        // left child, so the node actually unlinked never has more than one child.
        let mut victim = found;
        if !self.arena[found].left.is_nil() && !self.arena[found].right.is_nil() {
            victim = self.min_of(self.arena[found].right);
            self.arena.swap_entries(found, victim);
        }

        let parent = self.arena[victim].parent;
        let was_left = !parent.is_nil() && self.arena[parent].left == victim;
        let child = if self.arena[victim].left.is_nil() {
            self.arena[victim].right
        } else {
            self.arena[victim].left
        };
        let meta = self.arena[victim].meta;
        self.transplant(victim, child);
        let (_, value) = self.arena.release(victim);
        self.len -= 1;

        S::rebalance_after_erase(self, Splice{parent: parent.non_nil(), child: child.non_nil(), was_left, meta});
        debug!("{}: erased {:?}, size {}", S::NAME, victim, self.len);
        Some(value)
    }

    /// Removes `key`, returning how many nodes went away (0 or 1).
    pub fn erase<Q: ?Sized + Ord>(&mut self, key: &Q) -> usize
    where K: Borrow<Q>
    {
        match self.remove(key) {
            Some(_) => 1,
            None => 0,
        }
    }

    pub fn find<Q: ?Sized + Ord>(&self, key: &Q) -> Option<&V>
    where K: Borrow<Q>
    {
        self.lookup(key).non_nil().map(|id| self.arena[id].value())
    }

    pub fn find_mut<Q: ?Sized + Ord>(&mut self, key: &Q) -> Option<&mut V>
    where K: Borrow<Q>
    {
        let id = self.lookup(key).non_nil()?;
        Some(self.arena[id].value_mut())
    }

    pub fn contains_key<Q: ?Sized + Ord>(&self, key: &Q) -> bool
    where K: Borrow<Q>
    {
        !self.lookup(key).is_nil()
    }

    /// Iterates over the keys admitted by both bounds, in order. `None` leaves that side
    /// open.
    pub fn range<Q: PartialOrd<K>>(&self, lb: Option<QueryBound<Q>>, ub: Option<QueryBound<Q>>)
                                   -> Range<'_, K, V, S, Q> {
        let next = match &lb {
            None => self.min_of(self.root),
            Some(lb) => {
                let mut x = self.root;
                let mut first = NodeId::NIL;
                while !x.is_nil() {
                    if lb.admits_from_below(self.arena[x].key()) {
                        first = x;
                        x = self.arena[x].left;
                    } else {
                        x = self.arena[x].right;
                    }
                }
                first
            },
        };
        Range{tree: self, next, ub}
    }

    /// Checks the ordering, linkage and size invariants, then the strategy's balance
    /// invariant.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        if !self.root.is_nil() && !self.arena[self.root].parent.is_nil() {
            return Err(InvariantViolation::RootHasParent{root: self.root, parent: self.arena[self.root].parent});
        }

        let mut reachable = 0;
        let mut prev = NodeId::NIL;
        let mut x = self.min_of(self.root);
        while !x.is_nil() {
            reachable += 1;
            if reachable > self.len {
                return Err(InvariantViolation::SizeMismatch{recorded: self.len, reachable});
            }
            for child in [self.arena[x].left, self.arena[x].right] {
                if !child.is_nil() && self.arena[child].parent != x {
                    return Err(InvariantViolation::BrokenParentLink{parent: x, child,
                                                                    linked: self.arena[child].parent});
                }
            }
            if !prev.is_nil() && self.arena[prev].key() >= self.arena[x].key() {
                return Err(InvariantViolation::OutOfOrder{predecessor: prev, node: x});
            }
            prev = x;
            x = self.next_of(x);
        }
        if reachable != self.len {
            return Err(InvariantViolation::SizeMismatch{recorded: self.len, reachable});
        }

        S::validate(self)
    }
}

impl<K, V, S: Strategy> Default for SearchTree<K, V, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S: Strategy> fmt::Debug for SearchTree<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V, S: Strategy> FromIterator<(K, V)> for SearchTree<K, V, S> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut t = Self::new();
        t.extend(iter);
        t
    }
}

impl<K: Ord, V, S: Strategy> Extend<(K, V)> for SearchTree<K, V, S> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V, S: Strategy> IntoIterator for &'a SearchTree<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator, walking successor links from the front and predecessor links
/// from the back.
pub struct Iter<'a, K, V, S: Strategy> {
    tree: &'a SearchTree<K, V, S>,
    front: NodeId,
    back: NodeId,
    remaining: usize,
}

impl<'a, K, V, S: Strategy> Iterator for Iter<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let x = self.front;
        self.front = self.tree.next_of(x);
        self.remaining -= 1;
        Some(self.tree.arena[x].key_value())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V, S: Strategy> DoubleEndedIterator for Iter<'a, K, V, S> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let x = self.back;
        self.back = self.tree.prev_of(x);
        self.remaining -= 1;
        Some(self.tree.arena[x].key_value())
    }
}

impl<'a, K, V, S: Strategy> ExactSizeIterator for Iter<'a, K, V, S> {}

impl<'a, K, V, S: Strategy> FusedIterator for Iter<'a, K, V, S> {}

pub struct Range<'a, K, V, S: Strategy, Q> {
    tree: &'a SearchTree<K, V, S>,
    next: NodeId,
    ub: Option<QueryBound<Q>>,
}

impl<'a, K, V, S: Strategy, Q: PartialOrd<K>> Iterator for Range<'a, K, V, S, Q> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next.is_nil() {
            return None;
        }
        let x = self.next;
        let (k, v) = self.tree.arena[x].key_value();
        if let Some(ub) = &self.ub {
            if !ub.admits_from_above(k) {
                self.next = NodeId::NIL;
                return None;
            }
        }
        self.next = self.tree.next_of(x);
        Some((k, v))
    }
}
