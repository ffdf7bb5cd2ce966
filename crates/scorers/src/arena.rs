//! Bidirectional id/index arena backing the similarity matrices.
//!
//! Matrices are addressed by dense row/column positions while the rest of
//! the system speaks in catalog ids. The arena keeps an ordered id list and
//! an id-to-position map so both lookups are O(1), and its length always
//! equals the matrix dimension it was built for.

use std::collections::HashMap;
use std::hash::Hash;

/// Ordered set of ids with O(1) lookup in both directions
#[derive(Debug, Clone)]
pub struct IdArena<K: Copy + Eq + Hash> {
    ids: Vec<K>,
    index: HashMap<K, usize>,
}

impl<K: Copy + Eq + Hash> IdArena<K> {
    /// Build an arena from a list of unique ids. Position i maps to ids[i].
    pub fn from_ids(ids: Vec<K>) -> Self {
        let index = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        Self { ids, index }
    }

    /// Matrix position of an id, if present
    pub fn index_of(&self, id: K) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Id at a matrix position
    pub fn id_at(&self, index: usize) -> Option<K> {
        self.ids.get(index).copied()
    }

    /// All ids in position order
    pub fn ids(&self) -> &[K] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether an id is present
    pub fn contains(&self, id: K) -> bool {
        self.index.contains_key(&id)
    }
}
