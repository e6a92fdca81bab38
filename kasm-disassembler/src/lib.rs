//! # KASM Disassembler
//!
//! Decode KASM program images back into readable assembly.
//!
//! ## Example
//!
//! ```rust
//! use kasm_disassembler::decode;
//! use kasm_spec::Instruction;
//!
//! // An all-zero word is `nop`.
//! assert_eq!(decode(0).unwrap(), Instruction::Nop);
//! ```

pub mod decoder;
pub mod disassembler;
pub mod error;
pub mod formatter;

pub use decoder::decode;
pub use disassembler::{disassemble, disassemble_with_symbols};
pub use error::{DisassemblerError, Result};
pub use formatter::{format, format_at};
