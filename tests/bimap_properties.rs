//! Property tests for the bidirectional map, driven through its public API.

use std::collections::{BTreeMap, BTreeSet};

use avl_bimap::{AvlBiMap, Duplicated, Error};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert(u8, u8),
    DeleteByKey(u8),
    DeleteByValue(u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (any::<u8>(), any::<u8>()).prop_map(|(k, v)| Op::Insert(k, v)),
        1 => any::<u8>().prop_map(Op::DeleteByKey),
        1 => any::<u8>().prop_map(Op::DeleteByValue),
    ]
}

// Height bound of an AVL tree holding `len` nodes.
fn avl_height_bound(len: usize) -> usize {
    (1.45 * ((len + 2) as f64).log2()) as usize
}

proptest! {
    /// A freshly inserted pair can be found from both sides.
    #[test]
    fn prop_insert_then_find(
        pairs in prop::collection::btree_map(any::<i32>(), any::<i32>(), 0..64),
        key: i32,
        value: i32,
    ) {
        let mut map = AvlBiMap::new();
        let mut values = BTreeSet::new();
        for (k, v) in pairs {
            if values.insert(v) {
                map.insert_pair(k, v).unwrap();
            }
        }
        prop_assume!(!map.contains_key(&key) && !map.contains_value(&value));

        map.insert_pair(key, value).unwrap();
        prop_assert_eq!(map.find_by_key(&key), Some((&key, &value)));
        prop_assert_eq!(map.find_by_value(&value), Some((&key, &value)));
    }

    /// Deleting a pair removes it from both sides and keeps both sides equally sized.
    #[test]
    fn prop_delete_removes_both_sides(
        keys in prop::collection::btree_set(any::<i32>(), 1..64),
        pick in any::<prop::sample::Index>(),
        by_value: bool,
    ) {
        let pairs: Vec<(i32, i64)> = keys.iter().map(|k| (*k, -i64::from(*k))).collect();
        let mut map = AvlBiMap::try_from_pairs(pairs.clone()).unwrap();
        let (key, value) = pairs[pick.index(pairs.len())];

        let removed = if by_value {
            map.delete_by_value(&value)
        } else {
            map.delete_by_key(&key)
        };
        prop_assert_eq!(removed, Ok((key, value)));
        prop_assert!(map.find_by_key(&key).is_none());
        prop_assert!(map.find_by_value(&value).is_none());
        prop_assert_eq!(map.len(), pairs.len() - 1);
        prop_assert_eq!(map.keys().len(), map.values().len());
    }

    /// A second insertion of the same key leaves the map unchanged.
    #[test]
    fn prop_duplicate_key_rejected(
        keys in prop::collection::btree_set(any::<i16>(), 1..32),
        pick in any::<prop::sample::Index>(),
    ) {
        let keys: Vec<i16> = keys.into_iter().collect();
        let mut map = AvlBiMap::try_from_pairs(keys.iter().map(|k| (*k, i32::from(*k)))).unwrap();
        let before = map.clone();
        let key = keys[pick.index(keys.len())];

        prop_assert_eq!(
            map.insert_pair(key, i32::MAX),
            Err(Error::DuplicatePairElement(Duplicated::Key))
        );
        prop_assert_eq!(map, before);
    }

    /// Random operation sequences keep the map a bijection matching a model,
    /// with both trees sorted and logarithmically high.
    #[test]
    fn prop_operations_match_model(ops in prop::collection::vec(op(), 0..200)) {
        let mut map = AvlBiMap::new();
        let mut model: BTreeMap<u8, u8> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let taken = model.contains_key(&k) || model.values().any(|x| *x == v);
                    prop_assert_eq!(map.insert_pair(k, v).is_ok(), !taken);
                    if !taken {
                        model.insert(k, v);
                    }
                }
                Op::DeleteByKey(k) => {
                    let expected = model.remove(&k).map(|v| (k, v)).ok_or(Error::KeyNotFound);
                    prop_assert_eq!(map.delete_by_key(&k), expected);
                }
                Op::DeleteByValue(v) => {
                    let key = model.iter().find(|(_, x)| **x == v).map(|(k, _)| *k);
                    let expected = key.and_then(|k| model.remove(&k).map(|v| (k, v)));
                    prop_assert_eq!(map.delete_by_value(&v), expected.ok_or(Error::ValueNotFound));
                }
            }
            prop_assert_eq!(map.len(), model.len());
        }

        let by_key: Vec<(u8, u8)> = map.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(&by_key, &model.iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>());

        let mut by_value: Vec<(u8, u8)> = map.iter_by_value().map(|(k, v)| (*k, *v)).collect();
        prop_assert!(by_value.windows(2).all(|w| w[0].1 < w[1].1));
        by_value.sort();
        prop_assert_eq!(by_value, by_key);

        prop_assert!(map.keys().zip(map.keys().skip(1)).all(|(a, b)| a < b));
        if let Some(height) = map.key_height() {
            prop_assert!(height <= avl_height_bound(map.len()));
            prop_assert!(map.value_height().unwrap() <= avl_height_bound(map.len()));
        }
        prop_assert_eq!(map.min_by_key().map(|(k, _)| *k), model.keys().next().copied());
        prop_assert_eq!(map.max_by_value().map(|(_, v)| *v), model.values().max().copied());
    }
}
