use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

fn validate_tree<K: Ord + std::fmt::Debug, V>(t: &ScapegoatTree<K, V>) {
    let sorted = t.nodes.flatten(t.root);
    assert_eq!(sorted.len(), t.size, "reachable node count must match len");
    assert_eq!(t.nodes.live(), t.size, "every occupied slot must be reachable");

    for pair in sorted.windows(2) {
        let (a, b) = (&t.nodes.get(pair[0]).key, &t.nodes.get(pair[1]).key);
        assert!(a < b, "in-order keys must strictly increase: {a:?} !< {b:?}");
    }

    assert!(t.max_size >= t.size, "max_size must bound size");
    assert!(
        !balance::needs_global_rebuild(t.size, t.max_size, t.alpha),
        "size {} fell below alpha * max_size {} without a rebuild",
        t.size,
        t.max_size
    );
    assert!(
        t.height() <= balance::height_threshold(t.max_size, t.alpha),
        "height {} exceeds threshold for max_size {}",
        t.height(),
        t.max_size
    );
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 50)]
    Insert(#[proptest(strategy = "0u16..512")] u16, u32),
    #[proptest(weight = 30)]
    Remove(#[proptest(strategy = "0u16..512")] u16),
    #[proptest(weight = 19)]
    Get(#[proptest(strategy = "0u16..512")] u16),
    #[proptest(weight = 1)]
    Clear,
}

fn alpha_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.51), Just(0.6), Just(DEFAULT_ALPHA), 0.51f64..0.99]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(alpha in alpha_strategy(), ops in prop::collection::vec(any::<Op>(), 0..=2000)) {
        let mut t: ScapegoatTree<u16, u32> = ScapegoatTree::with_alpha(alpha).unwrap();
        let mut m: BTreeMap<u16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    prop_assert_eq!(t.insert(key, value), m.insert(key, value));
                }
                Op::Remove(key) => {
                    prop_assert_eq!(t.remove(&key), m.remove(&key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(&key), m.get(&key));
                    prop_assert_eq!(t.contains_key(&key), m.contains_key(&key));
                }
                Op::Clear => {
                    t.clear();
                    m.clear();
                }
            }

            prop_assert_eq!(t.len(), m.len());
            prop_assert!(t.height() <= balance::height_threshold(t.max_size, t.alpha));
        }

        validate_tree(&t);
        let got: Vec<(u16, u32)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u16, u32)> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_round_trip_distinct_keys(alpha in alpha_strategy(), keys in prop::collection::btree_set(any::<i64>(), 0..=1000)) {
        let mut t = ScapegoatTree::with_alpha(alpha).unwrap();
        for (i, &k) in keys.iter().rev().enumerate() {
            prop_assert_eq!(t.insert(k, i), None);
        }
        prop_assert_eq!(t.len(), keys.len());
        for (i, k) in keys.iter().rev().enumerate() {
            prop_assert_eq!(t.get(k), Some(&i));
        }
        validate_tree(&t);
    }

    #[test]
    fn prop_overwrite_keeps_len(keys in prop::collection::vec(0u8..64, 1..200)) {
        let mut t = ScapegoatTree::new();
        for &k in &keys {
            t.insert(k, 0u32);
        }
        let len = t.len();
        let mut overwritten = std::collections::BTreeSet::new();
        for &k in &keys {
            let previous = if overwritten.insert(k) { 0 } else { 1 };
            prop_assert_eq!(t.insert(k, 1), Some(previous));
            prop_assert_eq!(t.len(), len);
            prop_assert_eq!(t.get(&k), Some(&1));
        }
    }

    #[test]
    fn prop_remove_all_collapses(alpha in alpha_strategy(), n in 1usize..800, seed in any::<u64>()) {
        use rand::rngs::StdRng;
        use rand::seq::SliceRandom;
        use rand::SeedableRng;

        let mut keys: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        keys.shuffle(&mut rng);

        let mut t = ScapegoatTree::with_alpha(alpha).unwrap();
        for &k in &keys {
            t.insert(k, k);
        }
        keys.shuffle(&mut rng);
        for (removed, &k) in keys.iter().enumerate() {
            let globals = t.rebuild_stats().global_rebuilds;
            prop_assert_eq!(t.remove(&k), Some(k));
            prop_assert!(!t.contains_key(&k));
            prop_assert_eq!(t.len(), n - removed - 1);
            if t.rebuild_stats().global_rebuilds > globals && !t.is_empty() {
                // A whole-tree rebuild leaves a complete tree.
                prop_assert_eq!(t.height(), t.len().ilog2() as usize);
            }
        }
        validate_tree(&t);
        prop_assert!(t.root.is_null());
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<u8> = (1..=7).collect();

    for alpha in [0.51, 0.6, 0.75] {
        for_each_permutation(&keys, |perm| {
            let mut t = ScapegoatTree::with_alpha(alpha).unwrap();
            let mut m = BTreeMap::new();

            for (i, k) in perm.into_iter().enumerate() {
                assert_eq!(t.insert(k, i), m.insert(k, i));
            }

            validate_tree(&t);
            let got: Vec<(u8, usize)> = t.iter().map(|(k, v)| (*k, *v)).collect();
            let expected: Vec<(u8, usize)> = m.into_iter().collect();
            assert_eq!(got, expected);
        });
    }
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys: Vec<u8> = (1..=7).collect();

    // Insert in a fixed order, then remove in all permutations.
    let mut base_tree = ScapegoatTree::with_alpha(0.6).unwrap();
    let mut base_map = BTreeMap::new();
    for (i, &k) in keys.iter().enumerate() {
        assert_eq!(base_tree.insert(k, i), base_map.insert(k, i));
    }

    for_each_permutation(&keys, |perm| {
        let mut t = base_tree.clone();
        let mut m = base_map.clone();

        for k in perm {
            assert_eq!(t.remove(&k), m.remove(&k));
            assert_eq!(t.len(), m.len());
            validate_tree(&t);
        }
        assert_eq!(t.len(), 0);
        assert!(t.root.is_null());
    });
}
