use core::fmt;

use log::trace;

use crate::error::InvariantViolation;
use crate::node::NodeId;
use crate::strategy::{Splice, Strategy};
use crate::tree::SearchTree;

/// Red-black discipline. Absent children and the root's parent all resolve to the
/// shared black sentinel slot, so the fix-up loops below never test for "no node".
#[derive(Debug)]
pub enum ColorBalanced {}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Color {
    Red,
    Black,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => f.write_str("red"),
            Color::Black => f.write_str("black"),
        }
    }
}

pub type RedBlackTree<K, V> = SearchTree<K, V, ColorBalanced>;

fn color<K, V>(t: &RedBlackTree<K, V>, x: NodeId) -> Color {
    t.arena[x].meta
}

fn paint<K, V>(t: &mut RedBlackTree<K, V>, x: NodeId, c: Color) {
    assert!(!(x.is_nil() && c == Color::Red), "the sentinel stays black");
    t.arena[x].meta = c;
}

fn parent<K, V>(t: &RedBlackTree<K, V>, x: NodeId) -> NodeId {
    t.arena[x].parent
}

fn is_left_child<K, V>(t: &RedBlackTree<K, V>, x: NodeId) -> bool {
    x == t.arena[parent(t, x)].left
}

impl Strategy for ColorBalanced {
    type Meta = Color;

    const NAME: &'static str = "color-balanced";
    const SENTINEL: Color = Color::Black;
    const LEAF: Color = Color::Red;

    fn rebalance_after_insert<K, V>(t: &mut SearchTree<K, V, Self>, node: NodeId) {
        let mut x = node;
        while color(t, parent(t, x)) == Color::Red {
            let p = parent(t, x);
            let g = parent(t, p);
            let p_is_left = is_left_child(t, p);
            let uncle = if p_is_left { t.arena[g].right } else { t.arena[g].left };

            if color(t, uncle) == Color::Red {
                trace!("color-balanced: red uncle {:?}, recoloring {:?}", uncle, g);
                paint(t, p, Color::Black);
                paint(t, uncle, Color::Black);
                paint(t, g, Color::Red);
                x = g;
                continue;
            }

            // Black uncle: turn an inner grandchild into an outer one first.
            if p_is_left != is_left_child(t, x) {
                trace!("color-balanced: inner grandchild {:?}", x);
                x = p;
                if p_is_left {
                    t.rotate_left(x);
                } else {
                    t.rotate_right(x);
                }
            }

            let p = parent(t, x);
            let g = parent(t, p);
            paint(t, p, Color::Black);
            paint(t, g, Color::Red);
            if p_is_left {
                t.rotate_right(g);
            } else {
                t.rotate_left(g);
            }
        }

        let root = t.root;
        paint(t, root, Color::Black);
    }

    fn rebalance_after_erase<K, V>(t: &mut SearchTree<K, V, Self>, splice: Splice<Color>) {
        // Dropping a red node leaves every black height as it was.
        if splice.meta == Color::Red {
            return;
        }

        // When the unlinked node was a leaf, x is the sentinel; the splice left the
        // sentinel's parent link pointing at the gap.
        let mut x = splice.child.unwrap_or(NodeId::NIL);
        let mut x_is_left = splice.was_left;
        while x != t.root && color(t, x) == Color::Black {
            let p = parent(t, x);
            if x_is_left {
                let mut w = t.arena[p].right;
                if color(t, w) == Color::Red {
                    trace!("color-balanced: red sibling {:?}", w);
                    paint(t, w, Color::Black);
                    paint(t, p, Color::Red);
                    t.rotate_left(p);
                    w = t.arena[p].right;
                }

                let wl = t.arena[w].left;
                let wr = t.arena[w].right;
                if color(t, wl) == Color::Black && color(t, wr) == Color::Black {
                    paint(t, w, Color::Red);
                    x = p;
                } else {
                    if color(t, wr) == Color::Black {
                        trace!("color-balanced: near nephew {:?} is red", wl);
                        paint(t, wl, Color::Black);
                        paint(t, w, Color::Red);
                        t.rotate_right(w);
                        w = t.arena[p].right;
                    }
                    let p_color = color(t, p);
                    paint(t, w, p_color);
                    paint(t, p, Color::Black);
                    let wr = t.arena[w].right;
                    paint(t, wr, Color::Black);
                    t.rotate_left(p);
                    x = t.root;
                }
            } else {
                let mut w = t.arena[p].left;
                if color(t, w) == Color::Red {
                    trace!("color-balanced: red sibling {:?}", w);
                    paint(t, w, Color::Black);
                    paint(t, p, Color::Red);
                    t.rotate_right(p);
                    w = t.arena[p].left;
                }

                let wl = t.arena[w].left;
                let wr = t.arena[w].right;
                if color(t, wl) == Color::Black && color(t, wr) == Color::Black {
                    paint(t, w, Color::Red);
                    x = p;
                } else {
                    if color(t, wl) == Color::Black {
                        trace!("color-balanced: near nephew {:?} is red", wr);
                        paint(t, wr, Color::Black);
                        paint(t, w, Color::Red);
                        t.rotate_left(w);
                        w = t.arena[p].left;
                    }
                    let p_color = color(t, p);
                    paint(t, w, p_color);
                    paint(t, p, Color::Black);
                    let wl = t.arena[w].left;
                    paint(t, wl, Color::Black);
                    t.rotate_right(p);
                    x = t.root;
                }
            }

            if x != t.root {
                x_is_left = is_left_child(t, x);
            }
        }

        if !x.is_nil() {
            paint(t, x, Color::Black);
        }
    }

    fn validate<K, V>(t: &SearchTree<K, V, Self>) -> Result<(), InvariantViolation> {
        if t.arena.sentinel_meta() != Color::Black {
            return Err(InvariantViolation::RedSentinel);
        }
        if color(t, t.root) == Color::Red {
            return Err(InvariantViolation::RedRoot{root: t.root});
        }
        checked_black_height(t, t.root).map(|_| ())
    }
}

fn checked_black_height<K, V>(t: &RedBlackTree<K, V>, x: NodeId) -> Result<usize, InvariantViolation> {
    if x.is_nil() {
        return Ok(0);
    }
    let l = t.arena[x].left;
    let r = t.arena[x].right;
    if color(t, x) == Color::Red {
        for child in [l, r] {
            if color(t, child) == Color::Red {
                return Err(InvariantViolation::RedRed{node: x, child});
            }
        }
    }
    let lbh = checked_black_height(t, l)?;
    let rbh = checked_black_height(t, r)?;
    if lbh != rbh {
        return Err(InvariantViolation::BlackHeightMismatch{node: x, left: lbh, right: rbh});
    }
    Ok(lbh + if color(t, x) == Color::Black { 1 } else { 0 })
}

impl<K, V> SearchTree<K, V, ColorBalanced> {
    /// Black nodes on every path from the root down to a sentinel, root included.
    pub fn black_height(&self) -> usize {
        let mut bh = 0;
        let mut x = self.root;
        while !x.is_nil() {
            if color(self, x) == Color::Black {
                bh += 1;
            }
            x = self.arena[x].left;
        }
        bh
    }
}

#[cfg(test)]
fn test_check_tree<K: Ord, V>(t: &RedBlackTree<K, V>) {
    assert_eq!(t.validate(), Ok(()));
    assert_eq!(color(t, NodeId::NIL), Color::Black);
    if let Some(root) = t.root() {
        assert_eq!(checked_black_height(t, root), Ok(t.black_height()));
    }
}

#[test]
fn test_insert_ascending_keeps_colors() {
    let mut t: RedBlackTree<u32, u32> = RedBlackTree::new();

    for i in 1..=7 {
        t.insert(i, i);
        test_check_tree(&t);
    }
    assert_eq!(t.black_height(), 2);
    let root = t.root().unwrap();
    assert_eq!(*t.key(root), 2);
    let n4 = t.find_node(&4).unwrap();
    assert_eq!(t.meta(n4), Color::Red);
    for k in [5, 7] {
        assert_eq!(t.meta(t.find_node(&k).unwrap()), Color::Red);
    }
    for k in [1, 2, 3, 6] {
        assert_eq!(t.meta(t.find_node(&k).unwrap()), Color::Black);
    }
}

#[test]
fn test_insert_delete_same_order() {
    let mut t: RedBlackTree<u32, u32> = RedBlackTree::new();

    for i in 0..128 {
        assert!(t.insert(i, i));
        test_check_tree(&t);
    }
    for i in 0..128 {
        assert_eq!(t.remove(&i), Some(i));
        test_check_tree(&t);
        assert_eq!(t.len(), (127 - i) as usize);
    }
    assert!(t.root().is_none());
}

#[test]
fn test_insert_delete_reverse_order() {
    let mut t: RedBlackTree<u32, u32> = RedBlackTree::new();

    for i in 0..128 {
        assert!(t.insert(i, i));
    }
    for i in (0..128).rev() {
        assert_eq!(t.remove(&i), Some(i));
        test_check_tree(&t);
    }
    assert!(t.is_empty());
}

#[test]
fn test_insert_delete_strided() {
    let mut t: RedBlackTree<u32, u32> = RedBlackTree::new();

    for i in (0..256).step_by(4) {
        for j in [0, 2, 3, 1] {
            assert!(t.insert(i + j, i + j));
            test_check_tree(&t);
            assert!(t.insert(i + 256 + j, i + 256 + j));
            test_check_tree(&t);
        }
    }
    assert!(t.height() <= 2 * 9);

    for i in (0..256).step_by(4) {
        for j in [0, 2, 3, 1] {
            assert_eq!(t.erase(&(i + j)), 1);
            test_check_tree(&t);
        }
    }
    for i in (0..256).step_by(4).rev() {
        for j in [0, 2, 3, 1].iter().rev() {
            assert_eq!(t.erase(&(i + 256 + j)), 1);
            test_check_tree(&t);
        }
    }
    assert!(t.is_empty());
}

#[test]
fn test_erase_interior_nodes() {
    let mut t: RedBlackTree<u32, u32> = RedBlackTree::new();
    for i in 0..64 {
        t.insert(i * 3 % 64, i);
    }
    test_check_tree(&t);

    while let Some(root) = t.root() {
        let k = *t.key(root);
        assert_eq!(t.erase(&k), 1);
        test_check_tree(&t);
        assert!(!t.contains_key(&k));
    }
    assert_eq!(t.black_height(), 0);
}
