use core::fmt;

use crate::error::InvariantViolation;
use crate::node::NodeId;
use crate::strategy::{Splice, Strategy};
use crate::tree::SearchTree;

/// The plain search tree: leaves go where the descent ends, deletions only splice.
/// Height can degrade to the number of keys.
#[derive(Debug)]
pub enum Unbalanced {}

/// Unbalanced nodes carry no balancing state.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct NoMeta;

impl fmt::Display for NoMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("-")
    }
}

impl Strategy for Unbalanced {
    type Meta = NoMeta;

    const NAME: &'static str = "unbalanced";
    const SENTINEL: NoMeta = NoMeta;
    const LEAF: NoMeta = NoMeta;

    fn rebalance_after_insert<K, V>(_tree: &mut SearchTree<K, V, Self>, _node: NodeId) {}

    fn rebalance_after_erase<K, V>(_tree: &mut SearchTree<K, V, Self>, _splice: Splice<NoMeta>) {}

    fn validate<K, V>(_tree: &SearchTree<K, V, Self>) -> Result<(), InvariantViolation> {
        Ok(())
    }
}

pub type UnbalancedTree<K, V> = SearchTree<K, V, Unbalanced>;

#[cfg(test)]
fn test_check_tree(t: &UnbalancedTree<u32, u32>) {
    assert_eq!(t.validate(), Ok(()));
    assert_eq!(t.iter().count(), t.len());
}

#[test]
fn test_ascending_degenerates_to_list() {
    let mut t: UnbalancedTree<u32, u32> = UnbalancedTree::new();

    for i in 0..64 {
        assert!(t.insert(i, i * 10));
        test_check_tree(&t);
    }
    assert_eq!(t.height(), 63);
    assert_eq!(t.find(&17), Some(&170));
    assert!(!t.insert(17, 0));
    assert_eq!(t.find(&17), Some(&170));
}

#[test]
fn test_erase_leaf_single_child_and_two_children() {
    let mut t: UnbalancedTree<u32, u32> = UnbalancedTree::new();

    for k in [50, 30, 70, 20, 40, 60, 80, 35] {
        t.insert(k, k);
    }
    test_check_tree(&t);

    // leaf
    assert_eq!(t.erase(&20), 1);
    test_check_tree(&t);
    // only a left child (35)
    assert_eq!(t.erase(&40), 1);
    test_check_tree(&t);
    assert_eq!(t.right(t.find_node(&30).unwrap()), t.find_node(&35));
    // two children: 60 moves up into the root slot
    let root = t.root().unwrap();
    assert_eq!(t.erase(&50), 1);
    test_check_tree(&t);
    assert_eq!(t.root(), Some(root));
    assert_eq!(*t.key(root), 60);
    assert_eq!(t.iter().map(|(k, _)| *k).collect::<Vec<_>>(), vec![30, 35, 60, 70, 80]);
    assert_eq!(t.erase(&50), 0);
}

#[test]
fn test_insert_delete_strided() {
    let mut t: UnbalancedTree<u32, u32> = UnbalancedTree::new();

    for i in (0..256).step_by(4) {
        for j in [0, 2, 3, 1] {
            assert!(t.insert(i + j, i + j));
            test_check_tree(&t);
        }
    }
    assert_eq!(t.len(), 256);

    for i in (0..256).step_by(4).rev() {
        for j in [1, 3, 0, 2] {
            assert_eq!(t.remove(&(i + j)), Some(i + j));
            test_check_tree(&t);
        }
    }
    assert!(t.is_empty());
    assert_eq!(t.height(), -1);
    assert_eq!(t.root(), None);
}
