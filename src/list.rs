//! Byte-packed list of encoded stat names
//!
//! A [`StatNameList`] packs up to 255 encoded names into one allocation:
//! a leading count byte followed by each size-and-data block back to
//! back. Compared to a vector of separately owned storages this drops the
//! per-name allocation, at the cost of random access; the names can only
//! be iterated.
//!
//! Population goes through
//! [`SymbolTable::populate_list`](crate::SymbolTable::populate_list),
//! which takes the ref counts. Like
//! [`StatNameStorage`](crate::StatNameStorage), the list holds no table
//! reference, so the owner must call [`clear`](StatNameList::clear)
//! before dropping it.

use crate::name::StatName;
use crate::table::SymbolTable;
use crate::varint::{read_length_prefix, LENGTH_PREFIX_BYTES};

/// Iterate-only packed sequence of encoded stat names.
#[derive(Debug, Default)]
pub struct StatNameList {
    storage: Option<Box<[u8]>>,
}

impl StatNameList {
    /// Create an empty, unpopulated list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the list has been populated.
    #[must_use]
    pub fn populated(&self) -> bool {
        self.storage.is_some()
    }

    /// Call `f` on each name in insertion order. `f` returns `true` to
    /// keep iterating or `false` to stop early.
    pub fn iterate<F>(&self, mut f: F)
    where
        F: FnMut(StatName<'_>) -> bool,
    {
        let Some(storage) = &self.storage else {
            return;
        };
        let count = storage[0];
        let mut cursor = &storage[1..];
        for _ in 0..count {
            let size = LENGTH_PREFIX_BYTES + read_length_prefix(cursor);
            let name = StatName::new(&cursor[..size]);
            cursor = &cursor[size..];
            if !f(name) {
                break;
            }
        }
    }

    /// Release the ref counts of every contained name and unpopulate the
    /// list. Must be called before drop; the table may already be gone by
    /// destruction time, which is why this is not automatic.
    pub fn clear(&mut self, table: &SymbolTable) {
        let Some(storage) = self.storage.take() else {
            return;
        };
        let count = storage[0];
        let mut cursor = &storage[1..];
        for _ in 0..count {
            let size = LENGTH_PREFIX_BYTES + read_length_prefix(cursor);
            table.free(StatName::new(&cursor[..size]));
            cursor = &cursor[size..];
        }
    }

    pub(crate) fn move_storage_into_list(&mut self, storage: Box<[u8]>) {
        self.storage = Some(storage);
    }
}

impl Drop for StatNameList {
    fn drop(&mut self) {
        debug_assert!(
            self.storage.is_none(),
            "StatNameList dropped without calling clear()"
        );
    }
}
