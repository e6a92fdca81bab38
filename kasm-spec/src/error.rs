//! Errors for the shared specification types.

use thiserror::Error;

/// Errors raised while decoding specification-level values or parsing
/// serialized program artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KasmError {
    #[error("invalid opcode: {0:#04x}")]
    InvalidOpcode(u8),

    #[error("invalid register index: {0}")]
    InvalidRegister(u8),

    #[error("bad magic number: {0:#010x}")]
    BadMagic(u32),

    #[error("unsupported image version: {0:#010x}")]
    UnsupportedVersion(u32),

    #[error("truncated program image: expected at least {expected} bytes, got {actual}")]
    TruncatedImage { expected: usize, actual: usize },

    #[error("truncated symbol table record")]
    TruncatedSymbolTable,

    #[error("label too long for symbol table: {0:?}")]
    LabelTooLong(String),
}
