//! # KASM Specification
//!
//! Shared binary contract for the KASM toy computing system: a MIPS-like
//! 32-bit instruction set with a 6-bit opcode, up to three 5-bit register
//! fields, and immediate/address fields overlaying the low bits.
//!
//! ## Key Features
//! - 32-bit instruction words, opcode in the top 6 bits
//! - 32 general-purpose registers, register 0 hardwired to zero
//! - Per-opcode operand-format table driving encode, decode, and execution
//! - Two-segment program image (text + data) with a small binary header
//! - Optional symbol-table side file for disassembly and debugging

pub mod encoding;
pub mod error;
pub mod instruction;
pub mod opcode;
pub mod program;
pub mod register;
pub mod symbol;

pub use error::KasmError;
pub use instruction::Instruction;
pub use opcode::{AddressMode, Opcode, OperandFormat, Signedness};
pub use program::{Program, ProgramHeader};
pub use register::{Register, NUM_REGISTERS};
pub use symbol::SymbolTable;

/// Magic number for KASM program images: "KASM" read as a big-endian word.
pub const MAGIC: u32 = 0x4B41_534D;

/// Image format version.
pub const VERSION: u32 = 0x0001_0000;

/// Instruction width in bytes.
pub const INSTRUCTION_SIZE: u32 = 4;

/// Base address of the text segment (code, loaded from the image).
pub const TEXT_BASE: u32 = 0x0000_0000;

/// Base address of the data segment (static data, loaded from the image).
pub const DATA_BASE: u32 = 0x1001_0000;

/// Base address of the heap region (runtime only, backs heap syscalls).
pub const HEAP_BASE: u32 = 0x4000_0000;

/// Base address of the stack region (runtime only, zero-initialized).
pub const STACK_BASE: u32 = 0x8000_0000;

/// Base address of the global region (runtime only, zero-initialized).
pub const GLOBAL_BASE: u32 = 0xFFFF_0000;

/// Stack region size in bytes.
pub const STACK_SIZE: u32 = 256;

/// Global region size in bytes.
pub const GLOBAL_SIZE: u32 = 256;

/// Heap region size in bytes.
pub const HEAP_SIZE: u32 = 64 * 1024;

/// Machine word.
pub type Word = u32;

/// Byte address in the unified address space.
pub type Address = u32;
