use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use search_trees::{AaTree, AvlTree, Color, ColorBalanced, HeightBalanced, Level, LevelBalanced, NodeId,
                   RedBlackTree, SearchTree, Strategy, Unbalanced, UnbalancedTree};

/// Every node as (key, metadata, parent key, left key, right key), in order.
fn shape<K: Ord + Copy, V, S: Strategy>(t: &SearchTree<K, V, S>) -> Vec<(K, String, Option<K>, Option<K>, Option<K>)> {
    let key_of = |id: Option<NodeId>| id.map(|id| *t.key(id));
    let mut nodes = Vec::new();
    let mut x = t.minimum();
    while let Some(id) = x {
        nodes.push((*t.key(id), t.meta(id).to_string(), key_of(t.parent(id)), key_of(t.left(id)),
                    key_of(t.right(id))));
        x = t.successor(id);
    }
    nodes
}

fn keys<K: Copy, V, S: Strategy>(t: &SearchTree<K, V, S>) -> Vec<K> {
    t.iter().map(|(k, _)| *k).collect()
}

fn shuffled_keys(seed: u64, n: i64) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut keys: Vec<i64> = (0..n).collect();
    keys.shuffle(&mut rng);
    keys
}

#[test]
fn avl_ascending_then_inner_insert() {
    let mut t: AvlTree<i64, i64> = AvlTree::new();
    t.insert(10, 10);
    t.insert(20, 20);
    t.insert(30, 30);

    // left rotation at 10
    let root = t.root().unwrap();
    assert_eq!(*t.key(root), 20);
    assert_eq!(t.left(root).map(|id| *t.key(id)), Some(10));
    assert_eq!(t.right(root).map(|id| *t.key(id)), Some(30));

    for k in [40, 50, 25] {
        assert!(t.insert(k, k));
        assert_eq!(t.validate(), Ok(()));
    }
    assert_eq!(keys(&t), vec![10, 20, 25, 30, 40, 50]);
    assert_eq!(t.height(), 2);
    // 25 lands under 30, the inner grandchild of 20; the right-left rotation at 20
    // lifts 30 to the top.
    assert_eq!(*t.key(t.root().unwrap()), 30);
}

#[test]
fn red_black_ascending_seven() {
    let t: RedBlackTree<i64, ()> = (1..=7).map(|k| (k, ())).collect();

    assert_eq!(t.validate(), Ok(()));
    assert_eq!(t.black_height(), 2);
    let mut x = t.minimum();
    while let Some(id) = x {
        if t.meta(id) == Color::Red {
            for child in [t.left(id), t.right(id)].into_iter().flatten() {
                assert_eq!(t.meta(child), Color::Black);
            }
        }
        x = t.successor(id);
    }
}

#[test]
fn aa_erase_root_of_pair() {
    let mut t: AaTree<i64, &str> = AaTree::new();
    t.insert(5, "five");
    t.insert(10, "ten");
    let root = t.root().unwrap();
    assert_eq!(t.meta(root), Level(1));

    let root_key = *t.key(root);
    assert_eq!(t.erase(&root_key), 1);
    assert_eq!(t.validate(), Ok(()));
    let root = t.root().unwrap();
    assert_eq!(t.size(), 1);
    assert_eq!(t.meta(root), Level(1));
    assert_eq!(t.height(), 0);
}

fn check_round_trip<S: Strategy>() {
    let mut t: SearchTree<i64, String, S> = SearchTree::new();
    for k in shuffled_keys(7, 200) {
        assert!(t.insert(k, format!("v{}", k)));
        assert_eq!(t.find(&k), Some(&format!("v{}", k)));
    }
    for k in shuffled_keys(8, 200) {
        assert_eq!(t.erase(&k), 1);
        assert_eq!(t.find(&k), None);
        assert!(!t.contains_key(&k));
    }
    assert!(t.is_empty());
    assert_eq!(t.height(), -1);
    assert_eq!(t.minimum(), None);
    assert_eq!(t.maximum(), None);
}

#[test]
fn round_trip_every_strategy() {
    check_round_trip::<Unbalanced>();
    check_round_trip::<HeightBalanced>();
    check_round_trip::<ColorBalanced>();
    check_round_trip::<LevelBalanced>();
}

fn check_erase_absent_is_noop<S: Strategy>() {
    let mut t: SearchTree<i64, i64, S> = shuffled_keys(11, 64).into_iter().map(|k| (2 * k, k)).collect();
    let before = shape(&t);
    for k in [-1, 1, 63, 127, 1000] {
        assert_eq!(t.erase(&k), 0);
        assert_eq!(t.remove(&k), None);
    }
    assert_eq!(shape(&t), before);
    assert_eq!(t.size(), 64);
}

#[test]
fn erase_absent_key_leaves_tree_unchanged() {
    check_erase_absent_is_noop::<Unbalanced>();
    check_erase_absent_is_noop::<HeightBalanced>();
    check_erase_absent_is_noop::<ColorBalanced>();
    check_erase_absent_is_noop::<LevelBalanced>();
}

fn max_height<S: Strategy>(c: f64) {
    for (seed, n) in [(1, 1), (2, 10), (3, 100), (4, 1000), (5, 5000)] {
        for keys in [shuffled_keys(seed, n), (0..n).collect(), (0..n).rev().collect()] {
            let t: SearchTree<i64, (), S> = keys.into_iter().map(|k| (k, ())).collect();
            assert_eq!(t.validate(), Ok(()));
            let bound = c * ((n + 1) as f64).log2();
            assert!(t.height() as f64 <= bound, "{}: height {} for {} keys", S::NAME, t.height(), n);
        }
    }
}

#[test]
fn balanced_heights_stay_logarithmic() {
    max_height::<HeightBalanced>(1.44);
    max_height::<ColorBalanced>(2.0);
    max_height::<LevelBalanced>(2.0);
}

#[test]
fn unbalanced_ascending_keys_form_a_list() {
    let n = 5000;
    let mut t: UnbalancedTree<i64, ()> = (0..n).map(|k| (k, ())).collect();
    assert_eq!(t.height(), n as isize - 1);
    assert_eq!(t.validate(), Ok(()));

    for k in 0..n / 2 {
        assert_eq!(t.erase(&k), 1);
    }
    assert_eq!(t.height(), (n - n / 2) as isize - 1);
    assert_eq!(t.first_key_value(), Some((&(n / 2), &())));
}

#[test]
fn handles_of_erased_nodes_leave_the_tree() {
    let mut t: AvlTree<i64, i64> = (0..16).map(|k| (k, k)).collect();
    let leaf = t.find_node(&15).unwrap();
    assert!(t.left(leaf).is_none() && t.right(leaf).is_none());
    assert!(t.is_in_tree(leaf));

    assert_eq!(t.erase(&15), 1);
    assert!(!t.is_in_tree(leaf));
    for k in 0..15 {
        assert!(t.is_in_tree(t.find_node(&k).unwrap()));
    }
}

#[test]
fn subtree_queries() {
    let t: RedBlackTree<i64, ()> = (0..31).map(|k| (k, ())).collect();
    let root = t.root().unwrap();
    let left = t.left(root).unwrap();

    let left_min = t.subtree_minimum(left).unwrap();
    let left_max = t.subtree_maximum(left).unwrap();
    assert_eq!(*t.key(left_min), 0);
    assert!(*t.key(left_max) < *t.key(root));
    assert_eq!(t.successor(left_max), Some(root));
    assert_eq!(t.subtree_minimum(root), t.minimum());
    assert_eq!(t.subtree_maximum(root), t.maximum());
    assert!(t.subtree_height(left) < t.height());
    assert_eq!(t.predecessor(t.minimum().unwrap()), None);
    assert_eq!(t.successor(t.maximum().unwrap()), None);
}

#[test]
fn values_are_never_overwritten() {
    let mut t: SearchTree<String, u32, LevelBalanced> = SearchTree::new();
    assert!(t.insert("b".to_string(), 1));
    assert!(!t.insert("b".to_string(), 2));
    t.extend([("a".to_string(), 3), ("b".to_string(), 4)]);

    assert_eq!(t.find("b"), Some(&1));
    assert_eq!(t.find("a"), Some(&3));
    if let Some(v) = t.find_mut("a") {
        *v += 10;
    }
    assert_eq!(t.remove("a"), Some(13));
    assert_eq!(format!("{:?}", t), r#"{"b": 1}"#);
}

#[test]
fn clear_then_reuse() {
    let mut t: RedBlackTree<i64, i64> = RedBlackTree::new();
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..3 {
        for _ in 0..500 {
            let k = rng.gen_range(0..1000);
            t.insert(k, k);
        }
        assert_eq!(t.validate(), Ok(()));
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.root(), None);
        assert_eq!(t.validate(), Ok(()));
    }
}

#[test]
fn shuffled_workload_every_strategy() {
    fn run<S: Strategy>(seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut t: SearchTree<i64, i64, S> = SearchTree::new();
        let mut present = std::collections::BTreeSet::new();
        for _ in 0..4000 {
            let k = rng.gen_range(0..300);
            if rng.gen_bool(0.55) {
                assert_eq!(t.insert(k, -k), present.insert(k));
            } else {
                assert_eq!(t.erase(&k), present.remove(&k) as usize);
            }
        }
        assert_eq!(t.validate(), Ok(()));
        assert!(keys(&t).into_iter().eq(present.iter().copied()));
        assert_eq!(t.iter().len(), present.len());
    }

    run::<Unbalanced>(100);
    run::<HeightBalanced>(101);
    run::<ColorBalanced>(102);
    run::<LevelBalanced>(103);
}

#[test]
fn handles_from_another_tree_are_not_followed() {
    let big: AvlTree<i64, ()> = (0..100).map(|k| (k, ())).collect();
    let small: AvlTree<i64, ()> = (0..3).map(|k| (k, ())).collect();
    let foreign = big.find_node(&99).unwrap();

    assert!(!small.is_in_tree(foreign));
    assert_eq!(small.successor(foreign), None);
    assert_eq!(small.predecessor(foreign), None);
    assert_eq!(small.subtree_minimum(foreign), None);
    assert_eq!(small.subtree_maximum(foreign), None);
    assert_eq!(small.subtree_height(foreign), -1);
}

#[test]
#[should_panic(expected = "is not a live node")]
fn key_of_foreign_handle_panics() {
    let big: AvlTree<i64, ()> = (0..100).map(|k| (k, ())).collect();
    let small: AvlTree<i64, ()> = (0..3).map(|k| (k, ())).collect();
    small.key(big.find_node(&99).unwrap());
}

#[test]
#[should_panic(expected = "is not a live node")]
fn parent_of_erased_handle_panics() {
    let mut t: RedBlackTree<i64, ()> = (0..8).map(|k| (k, ())).collect();
    let max = t.maximum().unwrap();
    t.erase(&7);
    t.parent(max);
}

#[test]
fn value_mut_through_handle() {
    let mut t: AaTree<i64, String> = (0..10).map(|k| (k, k.to_string())).collect();
    let id = t.find_node(&4).unwrap();
    t.value_mut(id).push_str("!");
    assert_eq!(t.find(&4).map(String::as_str), Some("4!"));
    assert_eq!(t.value(id), "4!");
}
