//! Property-based tests for the four balancing strategies.
//!
//! Every strategy is driven through random operation sequences and compared
//! against `BTreeMap`, with a full invariant check after each mutation.

use proptest::prelude::*;
use search_trees::{ColorBalanced, HeightBalanced, LevelBalanced, SearchTree, Unbalanced};
use std::collections::BTreeMap;

/// Operations for random testing.
#[derive(Debug, Clone)]
enum Op {
    Insert(i16, u32),
    Erase(i16),
    Find(i16),
    Clear,
}

/// Small key space so erases and duplicate inserts actually hit.
fn key() -> impl Strategy<Value = i16> {
    -64i16..64
}

fn operations(max_ops: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            6 => (key(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
            4 => key().prop_map(Op::Erase),
            2 => key().prop_map(Op::Find),
            1 => Just(Op::Clear),
        ],
        0..=max_ops,
    )
}

/// Replays `ops` on a tree and on a `BTreeMap`, failing on the first divergence.
fn check_against_oracle<S: search_trees::Strategy>(ops: &[Op]) -> Result<(), TestCaseError> {
    let mut tree: SearchTree<i16, u32, S> = SearchTree::new();
    let mut oracle: BTreeMap<i16, u32> = BTreeMap::new();

    for op in ops {
        match op {
            Op::Insert(k, v) => {
                let expected = !oracle.contains_key(k);
                if expected {
                    oracle.insert(*k, *v);
                }
                prop_assert_eq!(tree.insert(*k, *v), expected, "insert {}", k);
            },
            Op::Erase(k) => {
                let expected = oracle.remove(k).map_or(0, |_| 1);
                prop_assert_eq!(tree.erase(k), expected, "erase {}", k);
            },
            Op::Find(k) => {
                prop_assert_eq!(tree.find(k), oracle.get(k));
            },
            Op::Clear => {
                tree.clear();
                oracle.clear();
            },
        }

        if let Err(violation) = tree.validate() {
            return Err(TestCaseError::fail(format!("{} after {:?}: {}", S::NAME, op, violation)));
        }
        prop_assert_eq!(tree.size(), oracle.len());
    }

    prop_assert!(tree.iter().eq(oracle.iter()));
    prop_assert!(tree.iter().rev().eq(oracle.iter().rev()));
    prop_assert_eq!(tree.first_key_value(), oracle.first_key_value());
    prop_assert_eq!(tree.last_key_value(), oracle.last_key_value());
    Ok(())
}

// ============================================================================
//  Differential Testing Against BTreeMap
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn unbalanced_matches_btreemap(ops in operations(200)) {
        check_against_oracle::<Unbalanced>(&ops)?;
    }

    #[test]
    fn height_balanced_matches_btreemap(ops in operations(200)) {
        check_against_oracle::<HeightBalanced>(&ops)?;
    }

    #[test]
    fn color_balanced_matches_btreemap(ops in operations(200)) {
        check_against_oracle::<ColorBalanced>(&ops)?;
    }

    #[test]
    fn level_balanced_matches_btreemap(ops in operations(200)) {
        check_against_oracle::<LevelBalanced>(&ops)?;
    }
}

// ============================================================================
//  Ordered Queries
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Successor and predecessor walks agree with the sorted key set.
    #[test]
    fn navigation_follows_sorted_order(keys in prop::collection::btree_set(key(), 0..100)) {
        let tree: SearchTree<i16, (), ColorBalanced> = keys.iter().map(|k| (*k, ())).collect();

        let mut forward = Vec::new();
        let mut x = tree.minimum();
        while let Some(id) = x {
            forward.push(*tree.key(id));
            x = tree.successor(id);
        }
        prop_assert_eq!(&forward, &keys.iter().copied().collect::<Vec<_>>());

        let mut backward = Vec::new();
        let mut x = tree.maximum();
        while let Some(id) = x {
            backward.push(*tree.key(id));
            x = tree.predecessor(id);
        }
        forward.reverse();
        prop_assert_eq!(backward, forward);
    }

    /// Range queries return exactly the keys the oracle's range does.
    #[test]
    fn range_matches_btreemap(keys in prop::collection::btree_set(key(), 0..100), lo in key(), hi in key()) {
        use search_trees::QueryBound;
        use std::ops::Bound;

        let tree: SearchTree<i16, (), LevelBalanced> = keys.iter().map(|k| (*k, ())).collect();

        let ours: Vec<i16> = tree.range(Some(QueryBound::Inclusive(lo)), Some(QueryBound::Exclusive(hi)))
            .map(|(k, _)| *k)
            .collect();
        let expected: Vec<i16> = if lo < hi {
            keys.range((Bound::Included(lo), Bound::Excluded(hi))).copied().collect()
        } else {
            Vec::new()
        };
        prop_assert_eq!(ours, expected);

        let ours: Vec<i16> = tree.range(Some(QueryBound::Exclusive(lo)), None).map(|(k, _)| *k).collect();
        let expected: Vec<i16> = keys.range((Bound::Excluded(lo), Bound::Unbounded)).copied().collect();
        prop_assert_eq!(ours, expected);

        let ours: Vec<i16> = tree.range(None, Some(QueryBound::Inclusive(hi))).map(|(k, _)| *k).collect();
        let expected: Vec<i16> = keys.range((Bound::Unbounded, Bound::Included(hi))).copied().collect();
        prop_assert_eq!(ours, expected);
    }

    /// Closed ranges on both ends, on a second strategy.
    #[test]
    fn inclusive_range_matches_btreemap(keys in prop::collection::btree_set(key(), 0..100), lo in key(), hi in key()) {
        use search_trees::QueryBound;
        use std::ops::Bound;

        let tree: SearchTree<i16, (), HeightBalanced> = keys.iter().map(|k| (*k, ())).collect();

        let ours: Vec<i16> = tree.range(Some(QueryBound::Inclusive(lo)), Some(QueryBound::Inclusive(hi)))
            .map(|(k, _)| *k)
            .collect();
        let expected: Vec<i16> = if lo <= hi {
            keys.range((Bound::Included(lo), Bound::Included(hi))).copied().collect()
        } else {
            Vec::new()
        };
        prop_assert_eq!(ours, expected);

        let ours: Vec<i16> = tree.range(None, Some(QueryBound::Exclusive(hi))).map(|(k, _)| *k).collect();
        let expected: Vec<i16> = keys.range((Bound::Unbounded, Bound::Excluded(hi))).copied().collect();
        prop_assert_eq!(ours, expected);
    }
}
