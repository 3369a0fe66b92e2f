//! ChainedHashMap: bucket array of doubly-linked chains with rehash-on-growth.

use crate::chain::{Chains, Node, NodeKey};
use crate::config::{MapConfig, DEFAULT_CAPACITY, DEFAULT_MAX_LOAD_FACTOR};
#[cfg(test)]
use crate::config::MIN_LOAD_FACTOR;
use crate::error::{ConfigError, LookupError};
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use log::{debug, trace};

#[inline]
fn bucket_index(hash: u64, capacity: usize) -> usize {
    (hash % capacity as u64) as usize
}

pub struct ChainedHashMap<K, V, S = DefaultHashBuilder> {
    hasher: S,
    buckets: Vec<Option<NodeKey>>, // chain heads, len == capacity
    chains: Chains<K, V>,
    max_load_factor: f64,
    reentrancy: DebugReentrancy,
}

impl<K, V> ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    /// Empty map with `DEFAULT_CAPACITY` buckets.
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    /// Empty map with `capacity` buckets; zero is bumped to one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }

    pub fn from_config(config: MapConfig) -> Result<Self, ConfigError> {
        Self::from_config_and_hasher(config, Default::default())
    }
}

impl<K, V, S> Default for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

/// Iterator over immutable entries in `ChainedHashMap`.
pub struct Iter<'a, K, V> {
    it: slotmap::basic::Iter<'a, NodeKey, Node<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, n)| (n.key(), n.value()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Iterator over mutable entries in `ChainedHashMap`.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::IterMut<'a, NodeKey, Node<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        // Keys are immutable after insert; only the value is handed out mutably.
        self.it.next().map(|(_, n)| n.key_and_value_mut())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self::build(capacity.max(1), DEFAULT_MAX_LOAD_FACTOR, hasher)
    }

    pub fn from_config_and_hasher(config: MapConfig, hasher: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(
            config.initial_capacity,
            config.max_load_factor,
            hasher,
        ))
    }

    fn build(capacity: usize, max_load_factor: f64, hasher: S) -> Self {
        Self {
            hasher,
            buckets: vec![None; capacity],
            chains: Chains::new(),
            max_load_factor,
            reentrancy: DebugReentrancy::new(),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }
    pub fn is_empty(&self) -> bool {
        self.chains.len() == 0
    }

    /// Number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.capacity() as f64
    }

    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    // Index-first probe: hash once, walk only the owning bucket's chain.
    fn find_node<Q>(&self, q: &Q) -> Option<NodeKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let head = self.buckets[bucket_index(hash, self.capacity())];
        self.chains
            .find(head, |n| n.hash() == hash && n.key().borrow() == q)
    }

    /// Returns a reference to the value stored under `q`.
    pub fn get<Q>(&self, q: &Q) -> Result<&V, LookupError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get");
        let k = self.find_node(q).ok_or(LookupError::NotFound)?;
        Ok(self.chains.node(k).value())
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Result<&mut V, LookupError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get_mut");
        let k = self.find_node(q).ok_or(LookupError::NotFound)?;
        Ok(self.chains.node_mut(k).value_mut())
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("contains_key");
        self.find_node(q).is_some()
    }

    /// Inserts `key -> value` unless an equal key is already present.
    ///
    /// Returns `false`, leaving the map untouched, for a duplicate key. A
    /// successful insert that brings the load factor to the configured
    /// maximum doubles the bucket count and rehashes every entry.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.insert_with(key, || value)
    }

    /// Like `insert`, but only runs `default` when the key is absent.
    pub fn insert_with<F>(&mut self, key: K, default: F) -> bool
    where
        F: FnOnce() -> V,
    {
        {
            let _g = self.reentrancy.enter("insert");
            let hash = self.make_hash(&key);
            let index = bucket_index(hash, self.buckets.len());
            let head = self.buckets[index];
            if self
                .chains
                .find(head, |n| n.hash() == hash && *n.key() == key)
                .is_some()
            {
                return false;
            }

            let value = default();
            self.chains
                .push_back(&mut self.buckets[index], key, value, hash);
            trace!("inserted into bucket {} (len {})", index, self.chains.len());
        }

        // Growth only reads stored hashes, so it runs outside the guarded section.
        while self.load_factor() >= self.max_load_factor {
            self.grow();
        }
        true
    }

    /// Removes `q` and returns its value, or `None` if it was absent.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let node = {
            let _g = self.reentrancy.enter("remove");
            let hash = self.make_hash(q);
            let index = bucket_index(hash, self.buckets.len());
            let k = self
                .chains
                .find(self.buckets[index], |n| n.hash() == hash && n.key().borrow() == q)?;
            trace!("removing from bucket {}", index);
            self.chains.unlink(&mut self.buckets[index], k)
        };
        Some(node.into_parts())
    }

    /// Drops every entry. The bucket count is kept.
    pub fn clear(&mut self) {
        let old = {
            let _g = self.reentrancy.enter("clear");
            self.buckets.fill(None);
            core::mem::take(&mut self.chains)
        };
        debug!(
            "cleared {} entries, keeping {} buckets",
            old.len(),
            self.buckets.len()
        );
        // Entries drop outside the guarded section so their destructors may
        // use this map again.
        drop(old);
    }

    // Doubles the bucket array and moves every node to `hash % new_capacity`,
    // using the stored hash so `K: Hash` is not called again.
    fn grow(&mut self) {
        let old_capacity = self.buckets.len();
        let new_capacity = old_capacity
            .checked_mul(2)
            .expect("bucket count overflows usize");
        let old = core::mem::replace(&mut self.buckets, vec![None; new_capacity]);
        for head in old {
            let mut cur = head;
            while let Some(k) = cur {
                let node = self.chains.node(k);
                let (next, hash) = (node.next(), node.hash());
                self.chains
                    .relink(&mut self.buckets[bucket_index(hash, new_capacity)], k);
                cur = next;
            }
        }
        debug!(
            "grew from {} to {} buckets ({} entries)",
            old_capacity,
            new_capacity,
            self.chains.len()
        );
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.chains.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.chains.iter_mut(),
        }
    }

    /// Panics unless every structural invariant holds: symmetric links, each
    /// node in bucket `hash % capacity`, unique keys per bucket, `len` equal
    /// to the reachable node count, and load factor under the threshold.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let capacity = self.buckets.len();
        let mut reachable = 0;
        for (index, &head) in self.buckets.iter().enumerate() {
            let mut seen: Vec<&K> = Vec::new();
            let mut previous = None;
            let mut cur = head;
            while let Some(k) = cur {
                let node = self.chains.get(k).expect("chain link resolves");
                assert_eq!(node.previous(), previous, "back-link broken in bucket {index}");
                assert_eq!(
                    bucket_index(node.hash(), capacity),
                    index,
                    "node sits in the wrong bucket"
                );
                assert!(
                    !seen.iter().any(|s| *s == node.key()),
                    "duplicate key in bucket {index}"
                );
                seen.push(node.key());
                reachable += 1;
                previous = Some(k);
                cur = node.next();
            }
        }
        assert_eq!(reachable, self.len(), "len must equal reachable node count");
        assert!(
            self.load_factor() < self.max_load_factor,
            "load factor {} not below {}",
            self.load_factor(),
            self.max_load_factor
        );
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> Extend<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Inserts each pair; pairs whose key is already present are dropped.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::with_hasher(S::default());
        m.extend(iter);
        m
    }
}

impl<K, V, S> fmt::Debug for ChainedHashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.chains.iter().map(|(_, n)| (n.key(), n.value())))
            .finish()
    }
}
