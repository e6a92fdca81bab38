//! Disassembler errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisassemblerError {
    #[error("Unknown opcode: {0:#04x}")]
    UnknownOpcode(u8),

    #[error("Invalid register field: {0}")]
    InvalidRegister(u8),

    #[error("Text segment length {0} is not a whole number of instructions")]
    RaggedTextSegment(usize),

    #[error(transparent)]
    Spec(#[from] kasm_spec::KasmError),
}

pub type Result<T> = std::result::Result<T, DisassemblerError>;
