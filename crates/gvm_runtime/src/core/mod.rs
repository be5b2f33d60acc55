//! Heap, collector and the node-level operations built on them.

pub mod channel;
pub mod env;
pub mod gc;
pub mod heap;
pub mod value;
pub mod waitgroup;

use std::hash::Hash;

use ahash::RandomState;
use hashbrown::HashMap;

pub use heap::{Address, Heap, HeapStats, NoRoots, Roots, Singletons, Tag};
pub use value::Value;

pub type FastHashMap<K, V> = HashMap<K, V, RandomState>;
pub type FastHashSet<K> = hashbrown::HashSet<K, RandomState>;

pub fn fast_hasher() -> RandomState {
    RandomState::with_seeds(0, 0, 0, 0)
}

pub fn fast_map_new<K: Eq + Hash, V>() -> FastHashMap<K, V> {
    HashMap::with_hasher(fast_hasher())
}

pub fn fast_set_new<K: Eq + Hash>() -> FastHashSet<K> {
    hashbrown::HashSet::with_hasher(fast_hasher())
}
