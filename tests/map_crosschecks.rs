use avl_bst::{AvlMap, BstMap};
use proptest::prelude::*;
use std::collections::BTreeMap as StdMap;

mod common;
use common::*;

#[derive(Clone)]
struct Maps<K, V> {
    avl_map: AvlMap<K, V>, // AvlMap
    bst_map: BstMap<K, V>, // unbalanced BstMap
    std_map: StdMap<K, V>, // std::collections::BTreeMap
}

impl<K, V> Maps<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    fn new(v: Vec<(K, V)>) -> Maps<K, V> {
        Maps {
            avl_map: AvlMap::from_iter(v.clone()),
            bst_map: BstMap::from_iter(v.clone()),
            std_map: StdMap::from_iter(v),
        }
    }

    fn chk(&self)
    where
        K: Eq + std::fmt::Debug,
        V: Eq + std::fmt::Debug,
    {
        assert_eq_all!(self.avl_map.len(), self.bst_map.len(), self.std_map.len());

        assert_eq_iters(self.avl_map.iter(), self.std_map.iter());
        assert_eq_iters(self.bst_map.iter(), self.std_map.iter());

        self.avl_map.check().unwrap();
        self.bst_map.check().unwrap();
    }
}

fn check_contains_key(u: U16Pairs) {
    let maps = Maps::new(u);

    for i in 0..64 {
        assert_eq_all!(
            maps.avl_map.contains_key(&i),
            maps.bst_map.contains_key(&i),
            maps.std_map.contains_key(&i)
        );
        assert_eq_all!(
            maps.avl_map.get(&i),
            maps.bst_map.get(&i),
            maps.std_map.get(&i)
        );
    }
}

fn check_ops(ops: Vec<Op>) {
    let mut m = Maps::new(vec![]);

    for op in ops {
        match op {
            Op::Insert(k, v) => assert_eq_all!(
                m.avl_map.insert(k, v),
                m.bst_map.insert(k, v),
                m.std_map.insert(k, v)
            ),
            Op::Remove(k) => assert_eq_all!(
                m.avl_map.remove(&k),
                m.bst_map.remove(&k),
                m.std_map.remove(&k)
            ),
            Op::PopFirst => {
                let e = m.std_map.pop_first();
                if let Some((k, _)) = &e {
                    m.bst_map.remove(k);
                }
                assert_eq!(m.avl_map.pop_first(), e);
            }
            Op::PopLast => {
                let e = m.std_map.pop_last();
                if let Some((k, _)) = &e {
                    m.bst_map.remove(k);
                }
                assert_eq!(m.avl_map.pop_last(), e);
            }
        }
        m.chk();
    }
}

fn check_remove_all(v: U16Pairs, w: Vec<u16>) {
    let mut m = Maps::new(v);

    for i in w {
        assert_eq_all!(
            m.avl_map.remove(&i),
            m.bst_map.remove(&i),
            m.std_map.remove(&i)
        );
    }
    m.chk();

    // drain whatever is left in key order
    let keys: Vec<u16> = m.std_map.keys().copied().collect();
    for k in keys {
        assert_eq_all!(
            m.avl_map.remove(&k),
            m.bst_map.remove(&k),
            m.std_map.remove(&k)
        );
    }
    m.chk();
    assert!(m.avl_map.is_empty());
    assert_eq!(m.avl_map.height(), 0);
}

fn check_keys_values(v: U16Pairs) {
    let m = Maps::new(v);

    assert_eq_iters(m.avl_map.keys(), m.std_map.keys());
    assert_eq_iters(m.avl_map.values(), m.std_map.values());
    assert_eq_iters_back(m.avl_map.keys(), m.std_map.keys());
    assert_eq_iters_back(m.avl_map.iter(), m.std_map.iter());
    assert_eq_iters_back(m.bst_map.iter(), m.std_map.iter());
}

fn check_into_iter(v: U16Pairs) {
    let m = Maps::new(v);

    assert_eq_iters(m.avl_map.into_iter(), m.std_map.clone().into_iter());
    assert_eq_iters(m.bst_map.into_iter(), m.std_map.into_iter());
}

fn check_for_each_mut(v: U16Pairs) {
    let mut m = Maps::new(v);

    m.avl_map.for_each_mut(|(k, v)| *v ^= *k);
    m.std_map.iter_mut().for_each(|(k, v)| *v ^= *k);
    assert_eq_iters(m.avl_map.iter(), m.std_map.iter());
}

fn check_height(v: U16Pairs) {
    let m = Maps::new(v);
    let n = m.avl_map.len() as f64;

    assert!(m.avl_map.height() as f64 <= 1.44 * (n + 2.0).log2());
    assert!(m.bst_map.height() >= m.bst_map.len().checked_ilog2().map_or(0, |h| h as usize + 1));
}

#[test]
fn test_first_and_last() {
    let mut maps = Maps::new(vec![(4, 0), (2, 0), (3, 0)]);

    assert_eq!(maps.avl_map.first_key_value(), maps.std_map.first_key_value());
    assert_eq!(maps.avl_map.last_key_value(), maps.std_map.last_key_value());
    assert_eq!(maps.avl_map.pop_first(), maps.std_map.pop_first());
    assert_eq!(maps.avl_map.pop_last(), maps.std_map.pop_last());

    maps.avl_map.clear();
    maps.bst_map.clear();
    maps.std_map.clear();
    maps.chk();

    assert_eq!(maps.avl_map.first_key_value(), maps.std_map.first_key_value());
    assert_eq!(maps.avl_map.last_key_value(), maps.std_map.last_key_value());
    assert_eq!(maps.avl_map.pop_first(), maps.std_map.pop_first());
    assert_eq!(maps.avl_map.pop_last(), maps.std_map.pop_last());
}

#[test]
fn test_string_keys() {
    let m: AvlMap<String, u16> = [("b", 1), ("a", 2), ("c", 3)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

    assert_eq!(m["a"], 2);
    assert_eq!(m.get("b"), Some(&1));
    assert!(m.lookup("d").is_err());
    m.check().unwrap();
}

#[test]
fn test_remove_all_regr1() {
    check_remove_all(vec![(3, 0), (1, 0), (2, 0)], vec![2]);
}

#[cfg(feature = "serde")]
mod serde {
    #![allow(unused_imports)]
    use super::*;
    use crate::common::*;
    use proptest::prelude::*;
    use serde_test::{assert_de_tokens, assert_tokens, Token};

    fn make_tokens(m: &StdMap<u16, u16>) -> Vec<Token> {
        let mut ts = vec![Token::Map { len: Some(m.len()) }];
        for (&k, &v) in m.iter() {
            ts.push(Token::U16(k));
            ts.push(Token::U16(v));
        }
        ts.push(Token::MapEnd);
        ts
    }

    fn check_serde(v: U16Pairs) {
        let m = Maps::new(v);

        let ts = make_tokens(&m.std_map);

        assert_tokens(&m.avl_map, &ts);
    }

    fn check_de_short_hint(v: U16Pairs, hint: usize) {
        let m = Maps::new(v);
        let mut ts = make_tokens(&m.std_map);

        // Normalize the hint to something shorter than the map length. NB: we
        // generate a hint < v.len(), but v may contain repeats and
        // m.std_map.len() can be less than v.len().
        let hint = if m.std_map.len() <= 1 {
            0
        } else {
            hint % (m.std_map.len() - 1)
        };
        ts[0] = Token::Map { len: Some(hint) };

        assert_de_tokens(&m.avl_map, &ts);
    }

    fn check_de_unsorted(v: U16Pairs, i: usize, j: usize) {
        let m = Maps::new(v);
        let mut ts = make_tokens(&m.std_map);

        let i = i % m.std_map.len();
        let j = j % m.std_map.len();

        ts.swap(2 * i + 1, 2 * j + 1); // +1 over Token::Map, 2x to a key
        ts.swap(2 * i + 2, 2 * j + 2); // +1 more to get to a value

        assert_de_tokens(&m.avl_map, &ts);
    }

    #[test]
    fn test_de_duplicates() {
        let ts = [
            Token::Map { len: Some(3) },
            Token::U16(1),
            Token::U16(10),
            Token::U16(0),
            Token::U16(5),
            Token::U16(1),
            Token::U16(11),
            Token::MapEnd,
        ];
        assert_de_tokens(&AvlMap::from([(0u16, 5u16), (1, 11)]), &ts);
    }

    #[test]
    fn test_de_short_hint_regr1() {
        check_de_short_hint(vec![(0, 0)], 1);
    }

    proptest! {
        #[test]
        fn test_serde(v in small_int_pairs()) {
            check_serde(v);
        }

        #[test]
        fn test_de_short_hint(
            (v, hint) in
            u16_pairs(0..1024, 1..512).prop_flat_map(|v| {
                let len = v.len();
                (Just(v), 0..len)
            }))
        {
            check_de_short_hint(v, hint);
        }

        #[test]
        fn test_de_unsorted(
            (v, i, j) in
                u16_pairs(0..1024, 2..512).prop_flat_map(|v| {
                    let len = v.len();
                    (Just(v), 0..len, 0..len)
                })
        ) {
            check_de_unsorted(v, i, j);
        }
    }
}

proptest! {
    #[test]
    fn test_contains_key(u in tiny_int_pairs()) {
        check_contains_key(u);
    }

    #[test]
    fn test_ops(script in ops(64, 256)) {
        check_ops(script);
    }

    #[test]
    fn test_remove_all(
        v in small_int_pairs(),
        w in prop::collection::vec(0u16..1024, 0..512)
    ) {
        check_remove_all(v, w);
    }

    #[test]
    fn test_keys_values(u in small_int_pairs()) {
        check_keys_values(u);
    }

    #[test]
    fn test_into_iter(u in small_int_pairs()) {
        check_into_iter(u);
    }

    #[test]
    fn test_for_each_mut(u in small_int_pairs()) {
        check_for_each_mut(u);
    }

    #[test]
    fn test_height(u in small_int_pairs()) {
        check_height(u);
    }
}
