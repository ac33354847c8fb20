use core::fmt;

use log::trace;

use crate::error::InvariantViolation;
use crate::node::NodeId;
use crate::strategy::{Splice, Strategy};
use crate::tree::SearchTree;

/// AA discipline: every node has a level, leaves sit at level 1, and a horizontal link
/// (child on the parent's level) may only point right, never twice in a row.
#[derive(Debug)]
pub enum LevelBalanced {}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Level(pub u32);

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level={}", self.0)
    }
}

pub type AaTree<K, V> = SearchTree<K, V, LevelBalanced>;

// The sentinel sits at level 0, one below any leaf, so a missing child never looks
// horizontal.
fn level<K, V>(t: &AaTree<K, V>, x: NodeId) -> u32 {
    t.arena[x].meta.0
}

fn set_level<K, V>(t: &mut AaTree<K, V>, x: NodeId, l: u32) {
    assert!(!x.is_nil());
    t.arena[x].meta = Level(l);
}

/// Removes a left horizontal link at `x` by rotating right. Returns the subtree root.
fn skew<K, V>(t: &mut AaTree<K, V>, x: NodeId) -> NodeId {
    if x.is_nil() {
        return x;
    }
    let l = t.arena[x].left;
    if !l.is_nil() && level(t, l) == level(t, x) {
        trace!("level-balanced: skew at {:?}", x);
        t.rotate_right(x)
    } else {
        x
    }
}

/// Breaks two consecutive right horizontal links at `x` by rotating left and raising
/// the middle node a level. Returns the subtree root.
fn split<K, V>(t: &mut AaTree<K, V>, x: NodeId) -> NodeId {
    if x.is_nil() {
        return x;
    }
    let r = t.arena[x].right;
    if r.is_nil() {
        return x;
    }
    let rr = t.arena[r].right;
    if !rr.is_nil() && level(t, rr) == level(t, x) {
        trace!("level-balanced: split at {:?}", x);
        let top = t.rotate_left(x);
        let raised = level(t, top) + 1;
        set_level(t, top, raised);
        top
    } else {
        x
    }
}

/// Pulls `x` down to one above its lower child, taking a horizontal right child along.
fn decrease_level<K, V>(t: &mut AaTree<K, V>, x: NodeId) {
    let l = t.arena[x].left;
    let r = t.arena[x].right;
    let should_be = level(t, l).min(level(t, r)) + 1;
    if should_be < level(t, x) {
        trace!("level-balanced: {:?} drops to level {}", x, should_be);
        set_level(t, x, should_be);
        if !r.is_nil() && should_be < level(t, r) {
            set_level(t, r, should_be);
        }
    }
}

impl Strategy for LevelBalanced {
    type Meta = Level;

    const NAME: &'static str = "level-balanced";
    const SENTINEL: Level = Level(0);
    const LEAF: Level = Level(1);

    fn rebalance_after_insert<K, V>(t: &mut SearchTree<K, V, Self>, node: NodeId) {
        let mut x = t.arena[node].parent;
        while !x.is_nil() {
            let top = skew(t, x);
            let top = split(t, top);
            x = t.arena[top].parent;
        }
    }

    fn rebalance_after_erase<K, V>(t: &mut SearchTree<K, V, Self>, splice: Splice<Level>) {
        let mut x = match splice.parent {
            None => return,
            Some(p) => p,
        };
        while !x.is_nil() {
            decrease_level(t, x);

            // Lowering levels can leave up to three left horizontal links and two
            // right runs along the right spine; the fixed order below clears them all.
            let top = skew(t, x);
            let r = t.arena[top].right;
            skew(t, r);
            let r = t.arena[top].right;
            if !r.is_nil() {
                let rr = t.arena[r].right;
                skew(t, rr);
            }
            let top = split(t, top);
            let r = t.arena[top].right;
            split(t, r);

            x = t.arena[top].parent;
        }
    }

    fn validate<K, V>(t: &SearchTree<K, V, Self>) -> Result<(), InvariantViolation> {
        let mut stack = Vec::new();
        if !t.root.is_nil() {
            stack.push(t.root);
        }
        while let Some(x) = stack.pop() {
            let lv = level(t, x);
            let l = t.arena[x].left;
            let r = t.arena[x].right;

            if level(t, l) + 1 != lv {
                return Err(InvariantViolation::LeftLevel{node: x, child: l, child_level: level(t, l),
                                                         expected: lv.saturating_sub(1)});
            }
            let rl = level(t, r);
            if rl != lv && rl + 1 != lv {
                return Err(InvariantViolation::RightLevel{node: x, child: r, child_level: rl, level: lv});
            }
            if !r.is_nil() {
                let rr = t.arena[r].right;
                if !rr.is_nil() && level(t, rr) >= lv {
                    return Err(InvariantViolation::DoubleHorizontal{node: x, grandchild: rr, level: lv});
                }
            }

            for child in [l, r] {
                if !child.is_nil() {
                    stack.push(child);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
fn test_check_tree<K: Ord, V>(t: &AaTree<K, V>) {
    assert_eq!(t.validate(), Ok(()));
    assert_eq!(level(t, NodeId::NIL), 0);
    if let Some(root) = t.root() {
        // the root's level bounds the height: at most two edges per level
        assert!(t.height() < 2 * level(t, root) as isize);
    }
}

#[test]
fn test_skew_then_split_on_insert() {
    let mut t: AaTree<u32, u32> = AaTree::new();

    t.insert(10, 10);
    t.insert(5, 5);
    test_check_tree(&t);
    let root = t.root().unwrap();
    assert_eq!(*t.key(root), 5);
    assert_eq!(t.meta(root), Level(1));
    assert_eq!(t.meta(t.right(root).unwrap()), Level(1));

    t.insert(20, 20);
    test_check_tree(&t);
    let root = t.root().unwrap();
    assert_eq!(*t.key(root), 10);
    assert_eq!(t.meta(root), Level(2));
    assert_eq!(t.meta(t.left(root).unwrap()), Level(1));
    assert_eq!(t.meta(t.right(root).unwrap()), Level(1));
}

#[test]
fn test_erase_root_of_pair() {
    for victim in [5, 10] {
        let mut t: AaTree<u32, u32> = AaTree::new();
        t.insert(10, 10);
        t.insert(5, 5);

        assert_eq!(t.erase(&victim), 1);
        test_check_tree(&t);
        let root = t.root().unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.meta(root), Level(1));
        assert_eq!(t.left(root), None);
        assert_eq!(t.right(root), None);
        assert_eq!(*t.key(root), 15 - victim);
    }
}

#[test]
fn test_insert_delete_same_order() {
    let mut t: AaTree<u32, u32> = AaTree::new();

    for i in 0..128 {
        assert!(t.insert(i, i));
        test_check_tree(&t);
    }
    for i in 0..128 {
        assert_eq!(t.remove(&i), Some(i));
        test_check_tree(&t);
    }
    assert!(t.root().is_none());
}

#[test]
fn test_insert_delete_reverse_order() {
    let mut t: AaTree<u32, u32> = AaTree::new();

    for i in (0..128).rev() {
        assert!(t.insert(i, i));
        test_check_tree(&t);
    }
    for i in (0..128).rev() {
        assert_eq!(t.remove(&i), Some(i));
        test_check_tree(&t);
    }
    assert!(t.root().is_none());
}

#[test]
fn test_insert_delete_strided() {
    let mut t: AaTree<u32, u32> = AaTree::new();

    for i in (0..256).step_by(4) {
        for j in [0, 2, 3, 1] {
            assert!(t.insert(i + j, i + j));
            test_check_tree(&t);
            assert!(t.insert(i + 256 + j, i + 256 + j));
            test_check_tree(&t);
        }
    }
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
    let mut t: AaTree<u32, u32> = AaTree::new();
    for i in 0..100 {
        t.insert(i * 7 % 100, i);
    }
    test_check_tree(&t);

    while let Some(root) = t.root() {
        let k = *t.key(root);
        assert_eq!(t.erase(&k), 1);
        test_check_tree(&t);
    }
}

#[test]
fn test_validate_reports_level_zero_node() {
    let mut t: AaTree<u32, u32> = AaTree::new();
    t.insert(1, 1);
    let root = t.root;
    t.arena[root].meta = Level(0);

    assert_eq!(t.validate(), Err(InvariantViolation::LeftLevel{node: root, child: NodeId::NIL, child_level: 0,
                                                                expected: 0}));
}
