//! Assembler errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssemblerError {
    #[error("Syntax error at line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("Unknown instruction: {0}")]
    UnknownInstruction(String),

    #[error("Invalid register: {0}")]
    InvalidRegister(String),

    #[error("Immediate value {value} does not fit in {bits} bits")]
    ImmediateOutOfRange { value: i64, bits: u32 },

    #[error("Address {0:#010x} does not fit in the 26-bit address field")]
    AddressOutOfRange(u32),

    #[error("Branch target {target:#010x} is out of range from {from:#010x}")]
    OffsetOutOfRange { from: u32, target: u32 },

    #[error("Unresolved label: {0}")]
    UnresolvedLabel(String),

    #[error("Duplicate label: {0}")]
    DuplicateLabel(String),

    #[error("Invalid directive: .{0}")]
    InvalidDirective(String),

    #[error("Instructions are only allowed in the text segment (line {line})")]
    InstructionOutsideText { line: usize },

    #[error(transparent)]
    Spec(#[from] kasm_spec::KasmError),
}

pub type Result<T> = std::result::Result<T, AssemblerError>;
