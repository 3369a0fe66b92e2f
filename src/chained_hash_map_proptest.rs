#![cfg(test)]

// Property tests for ChainedHashMap kept inside the crate so they can check
// the structural invariants that are not visible through the public API.

use crate::chained_hash_map::ChainedHashMap;
use crate::error::LookupError;
use hashbrown::HashMap;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::cell::Cell;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{BuildHasher, Hasher};
use std::rc::Rc;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    InsertWith(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::InsertWith(i, v)),
            3 => idx.clone().prop_map(OpI::Remove),
            3 => idx.clone().prop_map(OpI::Get),
            2 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// State-machine equivalence against hashbrown::HashMap. After every op the
// map's structural invariants must hold and `len` must match the model.
fn run_scenario<S: BuildHasher>(
    mut sut: ChainedHashMap<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();
    let default_calls = Rc::new(Cell::new(0));

    for op in ops {
        let capacity_before = sut.capacity();
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let inserted = sut.insert(k.clone(), v);
                prop_assert_eq!(inserted, !already, "insert succeeds iff key is new");
                if inserted {
                    model.insert(k, v);
                }
            }
            OpI::InsertWith(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let counter = default_calls.clone();
                let before = counter.get();
                let inserted = sut.insert_with(k.clone(), move || {
                    counter.set(counter.get() + 1);
                    v
                });
                prop_assert_eq!(inserted, !already);
                if inserted {
                    prop_assert_eq!(default_calls.get(), before + 1, "default must run exactly once on success");
                    model.insert(k, v);
                } else {
                    prop_assert_eq!(default_calls.get(), before, "default must not run on duplicate");
                }
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                let removed = sut.remove_entry(&k);
                let expected = model.remove_entry(&k);
                prop_assert_eq!(removed, expected);
                prop_assert!(!sut.contains_key(&k));
            }
            OpI::Get(i) => {
                let k = key_from(pool, i);
                match model.get(&k) {
                    Some(v) => prop_assert_eq!(sut.get(&k), Ok(v)),
                    None => prop_assert_eq!(sut.get(&k), Err(LookupError::NotFound)),
                }
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                match (sut.get_mut(&k), model.get_mut(&k)) {
                    (Ok(sv), Some(mv)) => {
                        *sv = sv.saturating_add(d);
                        *mv = mv.saturating_add(d);
                    }
                    (Err(LookupError::NotFound), None) => {}
                    (s, m) => prop_assert!(false, "get_mut mismatch: {:?} vs {:?}", s, m),
                }
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.iter().map(|(k, _)| k.clone()).collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(sut.iter().count(), model.len(), "each entry visited once");
                prop_assert_eq!(s_keys, m_keys);
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
            }
        }

        // Post-conditions after each op
        sut.assert_invariants();
        prop_assert!(sut.capacity() >= capacity_before, "capacity never shrinks");
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }

    for (k, v) in &model {
        prop_assert_eq!(sut.get(k), Ok(v));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        // Start tiny so most scenarios cross several growth events.
        run_scenario(ChainedHashMap::with_capacity(1), &pool, ops)?;
    }
}

// Constant hasher: every key shares one chain, stressing equality resolution
// and unlink from arbitrary chain positions.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(ChainedHashMap::with_capacity_and_hasher(1, ConstBuildHasher), &pool, ops)?;
    }
}
