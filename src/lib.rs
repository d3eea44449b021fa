//! Symbol table for dot-delimited stat names
//!
//! High-volume metric subsystems produce millions of hierarchical names
//! like `cluster.foo.upstream_rq_200` whose dotted tokens overlap heavily.
//! This crate interns each token once in a ref-counted [`SymbolTable`],
//! packs full names as varint symbol sequences behind a 2-byte length
//! prefix, and provides the family of owning and non-owning types that
//! reference those encodings:
//!
//! - [`StatName`] - copyable, non-owning view of an encoded name
//! - [`StatNameStorage`] - owning buffer with explicit teardown
//! - [`StatNameManagedStorage`] - owning buffer with RAII teardown
//! - [`StatNameList`] - packed iterate-only sequence of up to 255 names
//! - [`StatNameStorageSet`] - set keyed on encoded bytes, searchable by handle
//!
//! # Encoding Format
//! ```text
//! [len_lo: u8][len_hi: u8][varint symbol]*     size-and-data buffer
//! [count: u8][size-and-data]*                  name list
//! ```
//!
//! # Ownership
//! Encoding a name takes one ref count per symbol; the resulting storage
//! must be explicitly freed against the table before it is dropped. Owned
//! storage carries no table back-pointer so that per-stat footprint stays
//! at one allocation; see the [`storage`] module docs for the protocol.

pub mod encoding;
pub mod list;
pub mod name;
pub mod set;
pub mod storage;
pub mod table;
pub mod varint;

mod error;

pub use encoding::Encoding;
pub use error::{EncodeError, Result};
pub use list::StatNameList;
pub use name::{StatName, StatNameHashMap, StatNameHashSet, StatNameLessThan};
pub use set::StatNameStorageSet;
pub use storage::{StatNameManagedStorage, StatNameStorage};
pub use table::{Symbol, SymbolTable, MAX_LIST_NAMES};
