//! Non-owning views of encoded stat names
//!
//! [`StatName`] is a copyable reference to a size-and-data buffer owned
//! elsewhere (a [`StatNameStorage`](crate::StatNameStorage), a packed
//! [`StatNameList`](crate::StatNameList), or a buffer inlined into a metric
//! object). Handles carry no ref counts and cost one pointer to copy; the
//! holder must keep the backing storage alive for as long as the handle is
//! read.
//!
//! Equality and hashing are defined on the payload bytes. Two encodings of
//! the same dotted string taken across a free/re-encode cycle may use
//! different symbol values and therefore compare unequal; byte identity is
//! the contract, not decoded-string identity.

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

use crate::table::SymbolTable;
use crate::varint::{read_length_prefix, LENGTH_PREFIX_BYTES};

/// Non-owning view of an encoded stat name.
///
/// Internally either a reference to a size-and-data buffer or empty,
/// representing the empty name.
#[derive(Clone, Copy, Default)]
pub struct StatName<'a> {
    size_and_data: Option<&'a [u8]>,
}

impl<'a> StatName<'a> {
    /// View an existing size-and-data buffer.
    #[must_use]
    pub fn new(size_and_data: &'a [u8]) -> Self {
        Self {
            size_and_data: Some(size_and_data),
        }
    }

    /// The empty name.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Payload length in bytes, excluding the 2-byte prefix.
    #[must_use]
    pub fn data_size(&self) -> usize {
        match self.size_and_data {
            Some(bytes) => read_length_prefix(bytes),
            None => 0,
        }
    }

    /// Total length of the backing buffer, including the prefix.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data_size() + LENGTH_PREFIX_BYTES
    }

    /// The varint payload, past the length prefix.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        match self.size_and_data {
            Some(bytes) => &bytes[LENGTH_PREFIX_BYTES..LENGTH_PREFIX_BYTES + read_length_prefix(bytes)],
            None => &[],
        }
    }

    /// The full size-and-data view.
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        match self.size_and_data {
            Some(bytes) => &bytes[..LENGTH_PREFIX_BYTES + read_length_prefix(bytes)],
            None => &[],
        }
    }

    /// True if the payload is empty (the empty name).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data_size() == 0
    }

    /// Stable 64-bit hash of the payload bytes.
    ///
    /// The length prefix is excluded so a joined buffer hashes the same as
    /// its constituents concatenated out-of-band. Note this differs from a
    /// hash of the decoded string.
    #[must_use]
    pub fn hash(&self) -> u64 {
        xxh3_64(self.data())
    }

    /// Copy the size-and-data bytes into a fresh allocation.
    ///
    /// The copy references the same symbols; pair it with
    /// [`SymbolTable::inc_ref`] when the copy takes ownership.
    #[must_use]
    pub fn to_storage_bytes(&self) -> Box<[u8]> {
        match self.size_and_data {
            Some(_) => self.as_bytes().into(),
            None => {
                // An owned empty name still needs its zero length prefix.
                vec![0u8; LENGTH_PREFIX_BYTES].into_boxed_slice()
            }
        }
    }

    /// Log the raw encoded bytes. Diagnostic only.
    pub fn debug_print(&self) {
        debug!("stat name: {} payload bytes {:?}", self.data_size(), self.data());
    }
}

impl PartialEq for StatName<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.data() == other.data()
    }
}

impl Eq for StatName<'_> {}

impl Hash for StatName<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data().hash(state);
    }
}

impl fmt::Debug for StatName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatName")
            .field("data_size", &self.data_size())
            .field("data", &self.data())
            .finish()
    }
}

/// Value-templatized hash map with `StatName` keys.
pub type StatNameHashMap<'a, V> = FxHashMap<StatName<'a>, V>;

/// Hash set of `StatName` handles.
pub type StatNameHashSet<'a> = FxHashSet<StatName<'a>>;

/// Comparator for sorting `StatName`s by their decoded string form.
pub struct StatNameLessThan<'a> {
    symbol_table: &'a SymbolTable,
}

impl<'a> StatNameLessThan<'a> {
    #[must_use]
    pub fn new(symbol_table: &'a SymbolTable) -> Self {
        Self { symbol_table }
    }

    /// Ordering of `a` relative to `b`, for use with `sort_by`.
    pub fn cmp(&self, a: StatName<'_>, b: StatName<'_>) -> std::cmp::Ordering {
        self.symbol_table.compare(a, b)
    }
}
