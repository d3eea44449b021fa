//! Staged builder for encoded stat names
//!
//! [`Encoding`] accumulates varint symbols into a growable byte vector
//! while a name is being interned, then moves the bytes into a single
//! size-and-data allocation. Keeping the intermediate form separate from
//! the final buffer lets `SymbolTable::populate_list` pack several names
//! into one allocation, and gives `encode` a staging area it can roll back
//! if the assembled payload turns out to be too large.
//!
//! Every symbol added to the builder already holds one ref count taken by
//! the caller. `move_to_storage` transfers that obligation to the returned
//! buffer; a builder that still holds staged symbols must have them freed
//! back to the table before it is dropped.

use crate::table::Symbol;
use crate::varint::{
    decode_symbol, encode_symbol, write_length_prefix, LENGTH_PREFIX_BYTES,
};

/// Accumulates the encoded byte form of one stat name.
#[derive(Debug, Default)]
pub struct Encoding {
    vec: Vec<u8>,
    staged: Vec<Symbol>,
}

impl Encoding {
    /// Append one symbol to the encoding.
    pub fn add_symbol(&mut self, symbol: Symbol) {
        encode_symbol(symbol, &mut self.vec);
        self.staged.push(symbol);
    }

    /// Number of payload bytes collected so far.
    #[must_use]
    pub fn data_bytes_required(&self) -> usize {
        self.vec.len()
    }

    /// Total bytes required for the size-and-data buffer, including the
    /// 2-byte length prefix.
    #[must_use]
    pub fn bytes_required(&self) -> usize {
        self.data_bytes_required() + LENGTH_PREFIX_BYTES
    }

    /// Move the staged bytes into a freshly allocated size-and-data buffer.
    ///
    /// The returned buffer carries the ref counts of every staged symbol;
    /// whoever owns it must eventually hand it back to the table.
    #[must_use]
    pub fn move_to_storage(mut self) -> Box<[u8]> {
        let mut bytes = vec![0u8; self.bytes_required()];
        write_length_prefix(self.vec.len(), &mut bytes);
        bytes[LENGTH_PREFIX_BYTES..].copy_from_slice(&self.vec);
        self.vec.clear();
        self.staged.clear();
        bytes.into_boxed_slice()
    }

    /// Take back the staged symbols so the caller can `free` them.
    ///
    /// Used to roll back a partially interned name when the payload
    /// exceeds the length prefix capacity.
    pub(crate) fn take_staged(&mut self) -> Vec<Symbol> {
        self.vec.clear();
        std::mem::take(&mut self.staged)
    }

    /// Decode a payload back into its symbol sequence.
    ///
    /// # Panics
    /// Panics if the varint runs do not consume exactly the payload,
    /// which indicates a corrupt buffer.
    #[must_use]
    pub fn decode_symbols(mut payload: &[u8]) -> Vec<Symbol> {
        let mut symbols = Vec::new();
        while !payload.is_empty() {
            let (symbol, consumed) = decode_symbol(payload);
            symbols.push(symbol);
            payload = &payload[consumed..];
        }
        symbols
    }
}

impl Drop for Encoding {
    fn drop(&mut self) {
        // Staged symbols hold ref counts; they must be moved to storage or
        // returned via take_staged before the builder goes away.
        debug_assert!(
            self.staged.is_empty(),
            "Encoding dropped with {} staged symbols",
            self.staged.len()
        );
    }
}
