//! Ref-counted symbol table for dot-delimited stat names
//!
//! A proxy under load emits millions of hierarchical stat names such as
//! `cluster.foo.upstream_rq_200`. The dotted tokens overlap heavily across
//! names, so storing each full name as a flat string multiplies memory by
//! the number of stats. [`SymbolTable`] instead interns each token once,
//! assigns it a compact integer [`Symbol`], and represents a full name as a
//! packed varint sequence of symbols behind a 2-byte length prefix.
//!
//! Symbols are reference-counted. When the last name using a token is
//! freed the symbol is pushed onto a recycle pool and handed out again
//! before the monotonic counter is advanced, keeping the live symbol set
//! dense over the life of a long-running process. The price is that symbol
//! values are not stable across free/re-encode cycles, so name equality is
//! defined on the encoded byte form, never on symbol identity.
//!
//! # Locking
//!
//! One mutex guards the forward map, reverse map, recycle pool and the
//! symbol counters. Encoding and freeing are rare (names are created at
//! configuration time, not per request); per-request lookup works on
//! pre-built [`StatName`] handles and never touches the table.
//!
//! # Teardown protocol
//!
//! Owned storage deliberately carries no back-reference to the table.
//! Owners must call `free(&table)` before dropping storage so the table
//! can decrement ref counts; see [`StatNameStorage`](crate::StatNameStorage).

use std::cmp::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::encoding::Encoding;
use crate::error::{EncodeError, Result};
use crate::list::StatNameList;
use crate::name::StatName;
use crate::storage::StatNameStorage;
use crate::varint::{write_length_prefix, LENGTH_PREFIX_BYTES, MAX_PAYLOAD_BYTES};

/// A string token with a small index.
pub type Symbol = u32;

/// Maximum number of names a [`StatNameList`] can hold; the list stores
/// its element count in a single byte.
pub const MAX_LIST_NAMES: usize = u8::MAX as usize;

/// A symbol together with the number of live owning references to it.
#[derive(Debug)]
struct SharedSymbol {
    symbol: Symbol,
    ref_count: u32,
}

/// Everything the table mutates, guarded by one mutex.
///
/// The forward map and reverse map share each token's allocation through
/// an `Arc<str>`, so the string bytes are stored once no matter how many
/// names reference the token.
#[derive(Debug)]
struct TableState {
    encode_map: FxHashMap<Arc<str>, SharedSymbol>,
    decode_map: FxHashMap<Symbol, Arc<str>>,
    /// Free pool of symbols for re-use.
    pool: Vec<Symbol>,
    /// The symbol that will be assigned on the next successful insertion.
    /// Staged ahead of time so a failed insertion leaves the state unchanged.
    next_symbol: Symbol,
    /// The next never-yet-used symbol, consulted once the pool runs dry.
    monotonic_counter: Symbol,
}

impl Default for TableState {
    fn default() -> Self {
        Self {
            encode_map: FxHashMap::default(),
            decode_map: FxHashMap::default(),
            pool: Vec::new(),
            // Symbol 0 is staged for the first insertion, so the counter
            // starts one past it.
            next_symbol: 0,
            monotonic_counter: 1,
        }
    }
}

impl TableState {
    /// Find or allocate the symbol for one token, bumping its ref count.
    fn to_symbol(&mut self, token: &str) -> Symbol {
        if let Some(shared) = self.encode_map.get_mut(token) {
            shared.ref_count += 1;
            return shared.symbol;
        }

        let owned: Arc<str> = Arc::from(token);
        let symbol = self.next_symbol;
        self.encode_map
            .insert(Arc::clone(&owned), SharedSymbol { symbol, ref_count: 1 });
        self.decode_map.insert(symbol, owned);
        self.stage_next_symbol();
        symbol
    }

    /// Stage the symbol for the next insertion, preferring recycled ones.
    fn stage_next_symbol(&mut self) {
        self.next_symbol = match self.pool.pop() {
            Some(recycled) => recycled,
            None => {
                let symbol = self.monotonic_counter;
                self.monotonic_counter += 1;
                symbol
            }
        };
    }

    fn from_symbol(&self, symbol: Symbol) -> &str {
        match self.decode_map.get(&symbol) {
            Some(token) => token,
            None => panic!("corrupt symbol table: no token for symbol {symbol}"),
        }
    }

    fn inc_ref_symbol(&mut self, symbol: Symbol) {
        let token = match self.decode_map.get(&symbol) {
            Some(token) => token,
            None => panic!("corrupt symbol table: inc_ref of unknown symbol {symbol}"),
        };
        let shared = self
            .encode_map
            .get_mut(&**token)
            .expect("corrupt symbol table: reverse map entry missing from forward map");
        shared.ref_count += 1;
    }

    fn free_symbol(&mut self, symbol: Symbol) {
        let token = match self.decode_map.get(&symbol) {
            Some(token) => Arc::clone(token),
            None => panic!("corrupt symbol table: free of unknown symbol {symbol}"),
        };
        let shared = self
            .encode_map
            .get_mut(&*token)
            .expect("corrupt symbol table: reverse map entry missing from forward map");
        debug_assert!(shared.ref_count >= 1);
        shared.ref_count -= 1;

        if shared.ref_count == 0 {
            self.encode_map.remove(&*token);
            self.decode_map.remove(&symbol);
            self.pool.push(symbol);
        }
    }

    fn decode_symbol_vec(&self, symbols: &[Symbol]) -> String {
        symbols
            .iter()
            .map(|symbol| self.from_symbol(*symbol))
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Interning table mapping dotted stat names to packed symbol sequences.
///
/// The table is `Send + Sync`; all mutation goes through an internal
/// mutex. See the [module docs](self) for the memory and teardown model.
#[derive(Debug, Default)]
pub struct SymbolTable {
    state: Mutex<TableState>,
}

impl SymbolTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode a dotted name into owned storage, interning each token.
    ///
    /// The empty string encodes to a zero-length payload. Consecutive dots
    /// produce empty tokens, which intern like any other token, so every
    /// input round-trips exactly through [`to_string`](Self::to_string).
    ///
    /// The returned storage owns one ref count per symbol and must be
    /// handed back via [`StatNameStorage::free`] before it is dropped.
    ///
    /// # Errors
    /// Returns [`EncodeError::NameTooLong`] if the payload would not fit
    /// behind the 2-byte length prefix; any symbols interned for the
    /// rejected name are released before returning.
    pub fn encode(&self, name: &str) -> Result<StatNameStorage> {
        Ok(StatNameStorage::from_encoded(self.encode_bytes(name)?))
    }

    pub(crate) fn encode_bytes(&self, name: &str) -> Result<Box<[u8]>> {
        let mut encoding = Encoding::default();
        let mut state = self.state.lock();

        if !name.is_empty() {
            for token in name.split('.') {
                encoding.add_symbol(state.to_symbol(token));
            }
        }

        if encoding.data_bytes_required() >= MAX_PAYLOAD_BYTES {
            let bytes = encoding.data_bytes_required();
            for symbol in encoding.take_staged() {
                state.free_symbol(symbol);
            }
            return Err(EncodeError::NameTooLong {
                bytes,
                max: MAX_PAYLOAD_BYTES - 1,
            });
        }

        drop(state);
        Ok(encoding.move_to_storage())
    }

    /// Release one ref count for every symbol in `name`, recycling symbols
    /// whose count reaches zero.
    ///
    /// # Panics
    /// Panics if any symbol in the payload is unknown to the table, which
    /// means either the buffer is corrupt or the name was already freed.
    pub fn free(&self, name: StatName<'_>) {
        let symbols = Encoding::decode_symbols(name.data());
        let mut state = self.state.lock();
        for symbol in symbols {
            state.free_symbol(symbol);
        }
    }

    /// Add one ref count for every symbol in `name`.
    ///
    /// Called when new owned storage is built around an existing encoded
    /// name, so the new owner contributes its own counts.
    pub fn inc_ref(&self, name: StatName<'_>) {
        let symbols = Encoding::decode_symbols(name.data());
        let mut state = self.state.lock();
        for symbol in symbols {
            state.inc_ref_symbol(symbol);
        }
    }

    /// Splice several encoded names into one size-and-data buffer.
    ///
    /// This is a pure byte copy: the constituent symbols are already owned
    /// by whoever owns the inputs, so no ref counts change. The caller
    /// must either [`inc_ref`](Self::inc_ref) the result before the inputs
    /// are freed, or treat the joined buffer as borrowing from them.
    ///
    /// Empty names contribute no payload, so `join` of `"a.b"` and `"c"`
    /// decodes to `"a.b.c"` while `join` of `""` and `"c"` decodes to `"c"`.
    ///
    /// # Errors
    /// Returns [`EncodeError::NameTooLong`] if the summed payloads would
    /// not fit behind the length prefix.
    pub fn join(&self, names: &[StatName<'_>]) -> Result<Box<[u8]>> {
        let total: usize = names.iter().map(|name| name.data_size()).sum();
        if total >= MAX_PAYLOAD_BYTES {
            return Err(EncodeError::NameTooLong {
                bytes: total,
                max: MAX_PAYLOAD_BYTES - 1,
            });
        }

        let mut bytes = vec![0u8; LENGTH_PREFIX_BYTES + total];
        write_length_prefix(total, &mut bytes);
        let mut offset = LENGTH_PREFIX_BYTES;
        for name in names {
            let data = name.data();
            bytes[offset..offset + data.len()].copy_from_slice(data);
            offset += data.len();
        }
        Ok(bytes.into_boxed_slice())
    }

    /// Decode an encoded name back into its dotted string form.
    ///
    /// # Panics
    /// Panics if any symbol is missing from the reverse map; a corrupt
    /// stats set must not keep running.
    pub fn to_string(&self, name: StatName<'_>) -> String {
        let symbols = Encoding::decode_symbols(name.data());
        self.state.lock().decode_symbol_vec(&symbols)
    }

    /// Invoke `f` with a borrowed view of the decoded string.
    ///
    /// The view is only valid for the duration of the call. `f` must not
    /// re-enter the symbol table.
    pub fn call_with_string_view<F, R>(&self, name: StatName<'_>, f: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        f(&self.to_string(name))
    }

    /// Whether `a` orders before `b` under lexicographic comparison of the
    /// decoded names.
    pub fn less_than(&self, a: StatName<'_>, b: StatName<'_>) -> bool {
        self.compare(a, b) == Ordering::Less
    }

    /// Lexicographic comparison of decoded names, short-circuiting on
    /// symbol equality so only differing tokens are looked up.
    pub(crate) fn compare(&self, a: StatName<'_>, b: StatName<'_>) -> Ordering {
        let a_symbols = Encoding::decode_symbols(a.data());
        let b_symbols = Encoding::decode_symbols(b.data());

        let state = self.state.lock();
        for (sa, sb) in a_symbols.iter().zip(&b_symbols) {
            if sa != sb {
                return state.from_symbol(*sa).cmp(state.from_symbol(*sb));
            }
        }
        // One sequence is a prefix of the other; the shorter orders first.
        a_symbols.len().cmp(&b_symbols.len())
    }

    /// Number of distinct tokens currently interned.
    #[must_use]
    pub fn num_symbols(&self) -> u64 {
        let state = self.state.lock();
        debug_assert_eq!(state.encode_map.len(), state.decode_map.len());
        state.encode_map.len() as u64
    }

    /// Encode up to [`MAX_LIST_NAMES`] dotted names into `list` as one
    /// packed allocation.
    ///
    /// Ref counts are taken as part of encoding; the caller must hand the
    /// list back via [`StatNameList::clear`] before dropping it.
    ///
    /// # Errors
    /// Returns [`EncodeError::TooManyNames`] if more than 255 names are
    /// given, or [`EncodeError::NameTooLong`] if any single name
    /// overflows. On error no ref counts are retained.
    pub fn populate_list(&self, names: &[&str], list: &mut StatNameList) -> Result<()> {
        if names.len() > MAX_LIST_NAMES {
            return Err(EncodeError::TooManyNames {
                count: names.len(),
                max: MAX_LIST_NAMES,
            });
        }
        debug_assert!(!list.populated(), "populating an already populated list");

        let mut encoded: Vec<Box<[u8]>> = Vec::with_capacity(names.len());
        for name in names {
            match self.encode_bytes(name) {
                Ok(bytes) => encoded.push(bytes),
                Err(err) => {
                    // Roll back the names already interned for this list.
                    for bytes in &encoded {
                        self.free(StatName::new(bytes));
                    }
                    return Err(err);
                }
            }
        }

        let total: usize = 1 + encoded.iter().map(|bytes| bytes.len()).sum::<usize>();
        let mut storage = Vec::with_capacity(total);
        storage.push(names.len() as u8);
        for bytes in &encoded {
            storage.extend_from_slice(bytes);
        }
        list.move_storage_into_list(storage.into_boxed_slice());
        Ok(())
    }

    /// Log the current symbol population through `tracing`, sorted by
    /// symbol value. Diagnostic only.
    pub fn debug_print(&self) {
        let state = self.state.lock();
        let mut symbols: Vec<Symbol> = state.decode_map.keys().copied().collect();
        symbols.sort_unstable();
        debug!("symbol table: {} symbols", symbols.len());
        for symbol in symbols {
            debug!("{}: '{}'", symbol, state.from_symbol(symbol));
        }
    }

    /// The next never-yet-used symbol value. Test hook for observing
    /// recycling behavior.
    #[cfg(test)]
    pub(crate) fn monotonic_counter(&self) -> Symbol {
        self.state.lock().monotonic_counter
    }
}
