//! Symbol table side file: label names mapped to resolved addresses.
//!
//! Serialized as a sequence of records until end of input:
//! a one-byte name length, the name bytes, then a little-endian u32
//! address. Never required for execution; used to enrich disassembly
//! and debugger output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::KasmError;

/// Ordered label-to-address mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    symbols: BTreeMap<String, u32>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    /// Record a label's resolved address. Returns the previous address if
    /// the label was already present.
    pub fn insert(&mut self, label: impl Into<String>, address: u32) -> Option<u32> {
        self.symbols.insert(label.into(), address)
    }

    /// Address of a label, if defined.
    pub fn address_of(&self, label: &str) -> Option<u32> {
        self.symbols.get(label).copied()
    }

    /// Label at an exact address, if any. When several labels share an
    /// address the lexicographically first wins.
    pub fn label_at(&self, address: u32) -> Option<&str> {
        self.symbols
            .iter()
            .find(|(_, &addr)| addr == address)
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Iterate over (label, address) pairs in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.symbols.iter().map(|(name, &addr)| (name.as_str(), addr))
    }

    /// Serialize to the side-file record format.
    ///
    /// Labels longer than 255 bytes cannot be represented.
    pub fn to_bytes(&self) -> Result<Vec<u8>, KasmError> {
        let mut bytes = Vec::new();
        for (label, address) in self.iter() {
            let len = u8::try_from(label.len())
                .map_err(|_| KasmError::LabelTooLong(label.to_string()))?;
            bytes.push(len);
            bytes.extend_from_slice(label.as_bytes());
            bytes.extend_from_slice(&address.to_le_bytes());
        }
        Ok(bytes)
    }

    /// Parse a side file, consuming records until the input ends.
    pub fn from_bytes(bytes: &[u8]) -> Result<SymbolTable, KasmError> {
        let mut table = SymbolTable::new();
        let mut rest = bytes;
        while let Some((&len, tail)) = rest.split_first() {
            let len = len as usize;
            if tail.len() < len + 4 {
                return Err(KasmError::TruncatedSymbolTable);
            }
            let (name_bytes, tail) = tail.split_at(len);
            let name = std::str::from_utf8(name_bytes)
                .map_err(|_| KasmError::TruncatedSymbolTable)?;
            let mut addr = [0u8; 4];
            addr.copy_from_slice(&tail[..4]);
            table.insert(name, u32::from_le_bytes(addr));
            rest = &tail[4..];
        }
        Ok(table)
    }
}
