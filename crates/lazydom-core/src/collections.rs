#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::hash_map::RandomState as BuildHasher;
    pub use std::collections::{HashMap, HashSet};
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use rustc_hash::{FxBuildHasher as BuildHasher, FxHashMap as HashMap, FxHashSet as HashSet};
}

/// Insertion-ordered map used for property stores.
pub type OrderedMap<K, V> = indexmap::IndexMap<K, V, map::BuildHasher>;
