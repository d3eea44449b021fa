//! Owned backing storage for encoded stat names
//!
//! [`StatNameStorage`] owns one size-and-data buffer and contributes one
//! ref count to each symbol named in it. It deliberately holds no
//! reference to the [`SymbolTable`]: at proxy scale an extra pointer per
//! stat is a significant memory cost. The trade is an explicit teardown
//! protocol: the owner must call [`StatNameStorage::free`] against the
//! table before the storage is dropped, and a debug assertion in `Drop`
//! catches leaks.
//!
//! [`StatNameManagedStorage`] pays the pointer to get normal RAII
//! teardown. Use it for temporaries and in tests; avoid it as a hash map
//! key at scale.

use crate::error::Result;
use crate::name::StatName;
use crate::table::SymbolTable;

/// Owns the byte backing of one encoded stat name.
#[derive(Debug)]
pub struct StatNameStorage {
    bytes: Option<Box<[u8]>>,
}

impl StatNameStorage {
    /// Encode `name` into new storage, interning its tokens in `table`.
    ///
    /// # Errors
    /// Propagates [`EncodeError::NameTooLong`](crate::EncodeError::NameTooLong)
    /// from encoding.
    pub fn new(name: &str, table: &SymbolTable) -> Result<Self> {
        table.encode(name)
    }

    /// Obtain new backing storage for an already encoded name.
    ///
    /// Copies the bytes out of `src` and takes a fresh ref count on each
    /// symbol, so the new storage owns its counts independently of
    /// whatever backs `src`.
    #[must_use]
    pub fn from_stat_name(src: StatName<'_>, table: &SymbolTable) -> Self {
        let bytes = src.to_storage_bytes();
        table.inc_ref(StatName::new(&bytes));
        Self { bytes: Some(bytes) }
    }

    pub(crate) fn from_encoded(bytes: Box<[u8]>) -> Self {
        Self { bytes: Some(bytes) }
    }

    /// A handle over the owned bytes.
    ///
    /// # Panics
    /// Panics if the storage was already freed.
    #[must_use]
    pub fn stat_name(&self) -> StatName<'_> {
        match &self.bytes {
            Some(bytes) => StatName::new(bytes),
            None => panic!("stat name storage used after free"),
        }
    }

    /// Payload bytes, or empty if the storage has been freed. Keyed on by
    /// [`StatNameStorageSet`](crate::StatNameStorageSet).
    pub(crate) fn payload(&self) -> &[u8] {
        match &self.bytes {
            Some(bytes) => StatName::new(bytes).data(),
            None => &[],
        }
    }

    /// Release the ref counts held by this storage.
    ///
    /// Must be called exactly once before the storage is dropped.
    ///
    /// # Panics
    /// Panics if called twice.
    pub fn free(&mut self, table: &SymbolTable) {
        let bytes = self
            .bytes
            .take()
            .expect("stat name storage freed twice");
        table.free(StatName::new(&bytes));
    }
}

impl Drop for StatNameStorage {
    fn drop(&mut self) {
        // The table cannot be reached from here; failing to free leaks
        // symbol ref counts for the life of the table.
        debug_assert!(
            self.bytes.is_none(),
            "StatNameStorage dropped without calling free()"
        );
    }
}

/// Owned storage bundled with its table so teardown happens on drop.
pub struct StatNameManagedStorage<'a> {
    storage: StatNameStorage,
    symbol_table: &'a SymbolTable,
}

impl<'a> StatNameManagedStorage<'a> {
    /// Encode `name` into self-managing storage.
    ///
    /// # Errors
    /// Propagates [`EncodeError::NameTooLong`](crate::EncodeError::NameTooLong)
    /// from encoding.
    pub fn new(name: &str, table: &'a SymbolTable) -> Result<Self> {
        Ok(Self {
            storage: table.encode(name)?,
            symbol_table: table,
        })
    }

    /// Obtain self-managing storage for an already encoded name.
    #[must_use]
    pub fn from_stat_name(src: StatName<'_>, table: &'a SymbolTable) -> Self {
        Self {
            storage: StatNameStorage::from_stat_name(src, table),
            symbol_table: table,
        }
    }

    /// A handle over the owned bytes.
    #[must_use]
    pub fn stat_name(&self) -> StatName<'_> {
        self.storage.stat_name()
    }

    /// The table this storage tears down against.
    #[must_use]
    pub fn symbol_table(&self) -> &SymbolTable {
        self.symbol_table
    }
}

impl Drop for StatNameManagedStorage<'_> {
    fn drop(&mut self) {
        self.storage.free(self.symbol_table);
    }
}
