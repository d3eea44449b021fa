//! Hash set of owned stat names with handle-based lookup
//!
//! [`StatNameStorageSet`] keys entries on their encoded payload bytes.
//! Lookup accepts a non-owning [`StatName`] without allocating, while
//! insertion takes a [`StatNameStorage`] for persistence. The two forms
//! agree on identity because `Hash`, `Eq` and `Borrow<[u8]>` for the
//! stored entries all go through the payload slice.
//!
//! The set owns its entries' ref counts, so
//! [`free`](StatNameStorageSet::free) must run against the table before
//! the set is dropped.

use std::borrow::Borrow;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHashSet;

use crate::name::StatName;
use crate::storage::StatNameStorage;
use crate::table::SymbolTable;

impl PartialEq for StatNameStorage {
    fn eq(&self, other: &Self) -> bool {
        self.payload() == other.payload()
    }
}

impl Eq for StatNameStorage {}

impl Hash for StatNameStorage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Must match the Hash impl of [u8] for Borrow-based lookup.
        self.payload().hash(state);
    }
}

impl Borrow<[u8]> for StatNameStorage {
    fn borrow(&self) -> &[u8] {
        self.payload()
    }
}

/// Set of owned encoded names, searchable by handle.
#[derive(Debug, Default)]
pub struct StatNameStorageSet {
    hash_set: FxHashSet<StatNameStorage>,
}

impl StatNameStorageSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `storage`, or hand it back if an equal name is already
    /// present. A returned storage still owns its ref counts and must be
    /// freed by the caller.
    pub fn insert(&mut self, storage: StatNameStorage) -> Option<StatNameStorage> {
        if self.hash_set.contains(storage.payload()) {
            return Some(storage);
        }
        self.hash_set.insert(storage);
        None
    }

    /// Look up by non-owning handle without allocating.
    #[must_use]
    pub fn find(&self, name: StatName<'_>) -> Option<&StatNameStorage> {
        self.hash_set.get(name.data())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hash_set.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hash_set.is_empty()
    }

    /// Exchange contents with another set.
    pub fn swap(&mut self, other: &mut StatNameStorageSet) {
        std::mem::swap(&mut self.hash_set, &mut other.hash_set);
    }

    /// Release every contained storage back to the table. Must be called
    /// before the set is dropped.
    pub fn free(&mut self, table: &SymbolTable) {
        for mut storage in self.hash_set.drain() {
            storage.free(table);
        }
    }
}

impl Drop for StatNameStorageSet {
    fn drop(&mut self) {
        debug_assert!(
            self.hash_set.is_empty(),
            "StatNameStorageSet dropped without calling free()"
        );
    }
}
