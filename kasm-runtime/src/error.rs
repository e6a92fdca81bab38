//! Runtime errors

use thiserror::Error;

/// Fatal conditions raised during loading or execution.
///
/// None of these are recoverable; each one surfaces to the embedding host
/// as-is. A normal EXIT syscall is not an error (see `HaltReason`).
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Illegal opcode {opcode:#04x} at {pc:#010x}")]
    IllegalOpcode { pc: u32, opcode: u8 },

    #[error("Undecodable instruction word {word:#010x} at {pc:#010x}")]
    InvalidInstruction { pc: u32, word: u32 },

    #[error("Illegal syscall id {id} at {pc:#010x}")]
    IllegalSyscall { pc: u32, id: u32 },

    #[error("Memory access out of bounds: {address:#010x}")]
    OutOfBounds { address: u32 },

    #[error("Misaligned word access: {address:#010x}")]
    MisalignedAccess { address: u32 },

    #[error("Program counter misaligned: {pc:#010x}")]
    MisalignedPc { pc: u32 },

    #[error("Division by zero at {pc:#010x}")]
    DivisionByZero { pc: u32 },

    #[error("No breakpoint at {address:#010x}")]
    NoBreakpoint { address: u32 },

    #[error("Breakpoint already set at {address:#010x}")]
    BreakpointExists { address: u32 },

    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Load(#[from] kasm_spec::KasmError),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
