//! chain-hashmap: a single-threaded, separate-chaining hash map whose
//! bucket chains are doubly-linked lists stored in a generational arena.
//!
//! Internal Design:
//!
//! Summary
//! - Layers:
//!   - `chain`: the chain node (key, value, stored hash, `next`,
//!     `previous`) and the arena that owns every node. Chain surgery lives
//!     here: append at the tail, walk from the head, and `unlink`, which
//!     repairs the predecessor and the successor in one step.
//!   - `ChainedHashMap<K, V, S>`: the bucket array of chain heads. It hashes
//!     a key once, picks `hash % capacity`, and only ever walks that one
//!     chain.
//!
//! Constraints
//! - Single-threaded: `Send` when the contents are, never `Sync`.
//! - Unique keys; duplicate inserts return `false` and change nothing.
//! - Lookup of an absent key is an error (`LookupError::NotFound`); removal
//!   of an absent key is `None`.
//! - No unsafe code. Links are arena keys, so the arena is the single owner
//!   of every node and back-links never own anything.
//!
//! Growth
//! - After a successful insert, if `len / capacity` reaches the maximum load
//!   factor (0.8 unless configured), the bucket array doubles and every node
//!   moves to `hash % new_capacity`. Nodes are relinked, not reallocated.
//! - Each node keeps the `u64` hash computed at insertion and growth uses
//!   it, so `K: Hash` never runs after insertion.
//! - Capacity never shrinks; `clear` keeps it.
//!
//! Reentrancy policy
//! - Public methods open a debug-only reentrancy section before calling into
//!   `K: Hash`/`K: Eq`. Re-entering the same map from that code panics in
//!   debug builds instead of observing half-spliced chains.
//! - Removed entries are handed back to the caller and cleared entries are
//!   dropped after the section closes, so `Drop` for `K`/`V` may use the map.
//!
//! Notes and non-goals
//! - Iteration order is arena order and carries no guarantee.
//! - No persistence, no concurrent access; wrap in a lock if needed.
//! - The library logs through the `log` facade (`debug!` on growth and
//!   clear, `trace!` per insert/remove) and never installs a logger.

mod chain;
mod chained_hash_map;
mod chained_hash_map_proptest;
pub mod config;
pub mod error;
mod reentrancy;

// Public surface
pub use chained_hash_map::{ChainedHashMap, Iter, IterMut};
pub use config::{MapConfig, DEFAULT_CAPACITY, DEFAULT_MAX_LOAD_FACTOR, MIN_LOAD_FACTOR};
pub use error::{ConfigError, LookupError};
