use core::fmt;

use log::trace;

use crate::error::InvariantViolation;
use crate::node::NodeId;
use crate::strategy::{Splice, Strategy};
use crate::tree::SearchTree;

/// AVL discipline: every node records height(left) - height(right), kept within
/// [-1, 1] by single and double rotations.
#[derive(Debug)]
pub enum HeightBalanced {}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Balance(pub i8);

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bf={:+}", self.0)
    }
}

pub type AvlTree<K, V> = SearchTree<K, V, HeightBalanced>;

fn bf<K, V>(t: &AvlTree<K, V>, x: NodeId) -> i8 {
    t.arena[x].meta.0
}

fn set_bf<K, V>(t: &mut AvlTree<K, V>, x: NodeId, bf: i8) {
    t.arena[x].meta = Balance(bf);
}

// The rotations derive both new balance factors from the pair's old ones; no subtree
// heights are consulted.

fn rotate_left<K, V>(t: &mut AvlTree<K, V>, x: NodeId) -> NodeId {
    let y = t.arena[x].right;
    let x_bf = bf(t, x);
    let y_bf = bf(t, y);
    assert!(-2 <= x_bf && x_bf <= 2);
    assert!(-2 <= y_bf && y_bf <= 2);

    let r = t.rotate_left(x);
    let x_bf = x_bf + 1 - y_bf.min(0);
    let y_bf = y_bf + 1 + x_bf.max(0);
    set_bf(t, x, x_bf);
    set_bf(t, r, y_bf);
    r
}

fn rotate_right<K, V>(t: &mut AvlTree<K, V>, x: NodeId) -> NodeId {
    let y = t.arena[x].left;
    let x_bf = bf(t, x);
    let y_bf = bf(t, y);
    assert!(-2 <= x_bf && x_bf <= 2);
    assert!(-2 <= y_bf && y_bf <= 2);

    let r = t.rotate_right(x);
    let x_bf = x_bf - 1 - y_bf.max(0);
    let y_bf = y_bf - 1 + x_bf.min(0);
    set_bf(t, x, x_bf);
    set_bf(t, r, y_bf);
    r
}

fn rotate_right_left<K, V>(t: &mut AvlTree<K, V>, x: NodeId) -> NodeId {
    let r = t.arena[x].right;
    rotate_right(t, r);
    rotate_left(t, x)
}

fn rotate_left_right<K, V>(t: &mut AvlTree<K, V>, x: NodeId) -> NodeId {
    let l = t.arena[x].left;
    rotate_left(t, l);
    rotate_right(t, x)
}

/// Repairs a node whose balance factor reached +2 or -2. Returns the new subtree root
/// and whether the subtree ended up as tall as it was before the change that tipped it.
fn rebalance<K, V>(t: &mut AvlTree<K, V>, x: NodeId) -> (NodeId, bool) {
    if bf(t, x) > 0 {
        let l = t.arena[x].left;
        let l_bf = bf(t, l);
        if l_bf >= 0 {
            (rotate_right(t, x), l_bf == 0)
        } else {
            (rotate_left_right(t, x), false)
        }
    } else {
        let r = t.arena[x].right;
        let r_bf = bf(t, r);
        if r_bf <= 0 {
            (rotate_left(t, x), r_bf == 0)
        } else {
            (rotate_right_left(t, x), false)
        }
    }
}

impl Strategy for HeightBalanced {
    type Meta = Balance;

    const NAME: &'static str = "height-balanced";
    const SENTINEL: Balance = Balance(0);
    const LEAF: Balance = Balance(0);

    fn rebalance_after_insert<K, V>(t: &mut SearchTree<K, V, Self>, node: NodeId) {
        let mut child = node;
        let mut x = t.arena[node].parent;
        while !x.is_nil() {
            assert!(-1 <= bf(t, x) && bf(t, x) <= 1);
            let delta = if t.arena[x].left == child { 1 } else { -1 };
            let x_bf = bf(t, x) + delta;
            set_bf(t, x, x_bf);

            match x_bf {
                0 => return,
                1 | -1 => {
                    child = x;
                    x = t.arena[x].parent;
                },
                _ => {
                    trace!("height-balanced: {:?} tipped to {} on insert", x, x_bf);
                    let (r, _) = rebalance(t, x);
                    assert_eq!(bf(t, r), 0);
                    return;
                },
            }
        }
    }

    fn rebalance_after_erase<K, V>(t: &mut SearchTree<K, V, Self>, splice: Splice<Balance>) {
        let mut x = match splice.parent {
            None => return,
            Some(p) => p,
        };
        let mut left_shrank = splice.was_left;
        loop {
            let x_bf = bf(t, x) + if left_shrank { -1 } else { 1 };
            set_bf(t, x, x_bf);

            let top = match x_bf {
                1 | -1 => return,
                0 => x,
                _ => {
                    trace!("height-balanced: {:?} tipped to {} on erase", x, x_bf);
                    let (r, height_kept) = rebalance(t, x);
                    if height_kept {
                        return;
                    }
                    r
                },
            };

            let parent = t.arena[top].parent;
            if parent.is_nil() {
                return;
            }
            left_shrank = t.arena[parent].left == top;
            x = parent;
        }
    }

    fn validate<K, V>(t: &SearchTree<K, V, Self>) -> Result<(), InvariantViolation> {
        checked_height(t, t.root).map(|_| ())
    }
}

fn checked_height<K, V>(t: &AvlTree<K, V>, x: NodeId) -> Result<i64, InvariantViolation> {
    if x.is_nil() {
        return Ok(-1);
    }
    let lh = checked_height(t, t.arena[x].left)?;
    let rh = checked_height(t, t.arena[x].right)?;
    let recorded = bf(t, x);
    if recorded < -1 || recorded > 1 {
        return Err(InvariantViolation::BalanceOutOfRange{node: x, balance: recorded});
    }
    if lh - rh != recorded as i64 {
        return Err(InvariantViolation::BalanceMismatch{node: x, recorded, actual: lh - rh});
    }
    Ok(1 + lh.max(rh))
}

#[cfg(test)]
use crate::tree::QueryBound;

#[cfg(test)]
fn test_check_node<K: Ord, V>(t: &AvlTree<K, V>, x: NodeId) -> i64 {
    if x.is_nil() {
        return -1;
    }
    let lheight = test_check_node(t, t.arena[x].left);
    let rheight = test_check_node(t, t.arena[x].right);
    if lheight < rheight {
        assert_eq!(lheight + 1, rheight);
        assert_eq!(bf(t, x), -1);
    } else if lheight > rheight {
        assert_eq!(lheight, rheight + 1);
        assert_eq!(bf(t, x), 1);
    } else {
        assert_eq!(bf(t, x), 0);
    }

    let mut lneigh = t.arena[x].left;
    while !lneigh.is_nil() {
        assert!(t.arena[lneigh].key() < t.arena[x].key());
        lneigh = t.arena[lneigh].right;
    }
    let mut rneigh = t.arena[x].right;
    while !rneigh.is_nil() {
        assert!(t.arena[x].key() < t.arena[rneigh].key());
        rneigh = t.arena[rneigh].left;
    }

    1 + core::cmp::max(lheight, rheight)
}

#[cfg(test)]
fn test_check_tree<K: Ord, V>(t: &AvlTree<K, V>) {
    let h = test_check_node(t, t.root);
    assert_eq!(h, t.height() as i64);
    assert_eq!(t.validate(), Ok(()));
}

#[test]
fn test_single_rotation_at_root() {
    let mut t: AvlTree<u32, u32> = AvlTree::new();

    t.insert(10, 10);
    t.insert(20, 20);
    let n10 = t.find_node(&10).unwrap();
    assert_eq!(t.meta(n10), Balance(-1));
    t.insert(30, 30);
    test_check_tree(&t);
    let root = t.root().unwrap();
    assert_eq!(*t.key(root), 20);
    assert_eq!(t.left(root), Some(n10));
    assert_eq!(t.parent(n10), Some(root));
    assert_eq!(t.meta(n10), Balance(0));
}

#[test]
fn test_double_rotations() {
    let mut t: AvlTree<u32, ()> = AvlTree::new();
    for k in [30, 10, 20] {
        t.insert(k, ());
    }
    test_check_tree(&t);
    assert_eq!(*t.key(t.root().unwrap()), 20);

    let mut t: AvlTree<u32, ()> = AvlTree::new();
    for k in [10, 30, 20] {
        t.insert(k, ());
    }
    test_check_tree(&t);
    assert_eq!(*t.key(t.root().unwrap()), 20);
}

#[test]
fn test_insert_delete_ascending() {
    let mut t: AvlTree<u32, u32> = AvlTree::new();

    for i in 0..128 {
        assert!(t.insert(i, i));
        test_check_tree(&t);
        assert_eq!(t.len(), (i + 1) as usize);
    }
    assert!(t.height() <= 7);

    for i in 0..128 {
        assert_eq!(t.remove(&i), Some(i));
        test_check_tree(&t);
        assert_eq!(t.len(), (127 - i) as usize);
    }
    assert!(t.root().is_none());
}

#[test]
fn test_insert_delete_ascending_rev() {
    let mut t: AvlTree<u32, u32> = AvlTree::new();

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
    let mut t: AvlTree<u32, u32> = AvlTree::new();

    for i in (0..256).step_by(4) {
        for j in [0, 2, 3, 1] {
            assert!(t.insert(i + j, i + j));
            test_check_tree(&t);
            assert!(t.insert(i + 256 + j, i + 256 + j));
            test_check_tree(&t);
        }
    }
    assert_eq!(t.len(), 512);
    assert_eq!(t.iter().count(), 512);
    assert_eq!(t.range(Some(QueryBound::Inclusive(192u32)), Some(QueryBound::Inclusive(320u32))).count(), 129);
    assert_eq!(t.range(Some(QueryBound::Exclusive(192u32)), Some(QueryBound::Exclusive(320u32))).count(), 127);
    assert_eq!(t.range(None, Some(QueryBound::Inclusive(3u32))).count(), 4);
    assert_eq!(t.range(Some(QueryBound::Inclusive(508u32)), None).count(), 4);
    assert_eq!(t.range(Some(QueryBound::Inclusive(600u32)), None).count(), 0);

    for i in (0..256).step_by(4) {
        for j in [0, 2, 3, 1] {
            assert_eq!(t.remove(&(i + j)), Some(i + j));
            test_check_tree(&t);
            assert!(!t.contains_key(&(i + j)));
        }
    }
    assert_eq!(t.iter().count(), 256);
    assert_eq!(t.range(Some(QueryBound::Inclusive(192u32)), Some(QueryBound::Inclusive(320u32))).count(), 65);

    for i in (0..256).step_by(4).rev() {
        for j in [0, 2, 3, 1].iter().rev() {
            assert_eq!(t.remove(&(i + 256 + j)), Some(i + 256 + j));
            test_check_tree(&t);
        }
    }
    assert_eq!(t.iter().count(), 0);
    assert!(t.root().is_none());
}

#[test]
fn test_delete_cascades_rotations() {
    // Fibonacci-shaped tree: removing the shallowest leaf forces a rotation on every
    // level of the way up.
    let mut t: AvlTree<u32, ()> = AvlTree::new();
    for k in [8, 5, 11, 3, 7, 10, 12, 2, 4, 6, 9, 1] {
        t.insert(k, ());
        test_check_tree(&t);
    }
    assert_eq!(t.height(), 4);
    assert_eq!(t.erase(&12), 1);
    test_check_tree(&t);
    assert_eq!(t.height(), 3);
    assert_eq!(*t.key(t.root().unwrap()), 5);
}

#[test]
fn test_duplicate_insert_leaves_tree_untouched() {
    let mut t: AvlTree<u32, &str> = AvlTree::new();
    for k in 0..32 {
        t.insert(k, "first");
    }
    let shape: Vec<_> = t.iter().map(|(k, _)| (*k, t.meta(t.find_node(k).unwrap()))).collect();
    for k in 0..32 {
        assert!(!t.insert(k, "second"));
    }
    let again: Vec<_> = t.iter().map(|(k, _)| (*k, t.meta(t.find_node(k).unwrap()))).collect();
    assert_eq!(shape, again);
    assert!(t.iter().all(|(_, v)| *v == "first"));
    test_check_tree(&t);
}
