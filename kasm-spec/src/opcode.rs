//! Opcode definitions and the operand-format table.
//!
//! Every opcode maps to exactly one [`OperandFormat`] describing which
//! register slots, address field, and immediate field the instruction
//! carries. The assembler, disassembler, and execution engine all consult
//! this single table rather than hard-coding per-instruction shapes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::KasmError;

/// Instruction opcodes, stored in bits 31:26 of the instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    // Control
    Nop = 0x00,
    Sys = 0x01,
    J = 0x02,
    Jr = 0x03,
    Jal = 0x04,
    Jalr = 0x05,
    B = 0x06,
    Beq = 0x07,
    Bne = 0x08,
    Blt = 0x09,
    Bgt = 0x0A,
    Ble = 0x0B,
    Bge = 0x0C,
    // Data movement
    Li = 0x0D,
    La = 0x0E,
    Lw = 0x0F,
    Sw = 0x10,
    Lb = 0x11,
    Sb = 0x12,
    // Arithmetic
    Add = 0x13,
    Addi = 0x14,
    Sub = 0x15,
    Mul = 0x16,
    Div = 0x17,
    Mod = 0x18,
    // Bitwise and comparison
    And = 0x19,
    Andi = 0x1A,
    Or = 0x1B,
    Ori = 0x1C,
    Xor = 0x1D,
    Xori = 0x1E,
    Nor = 0x1F,
    Sll = 0x20,
    Srl = 0x21,
    Sra = 0x22,
    Slt = 0x23,
    Sltu = 0x24,
}

/// How an address operand is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressMode {
    /// 26-bit absolute byte address in bits 25:0.
    DirectAbsolute,
    /// Signed 16-bit byte offset relative to the instruction's own address.
    DirectOffset,
    /// Base register in slot 1 plus a signed 16-bit byte offset.
    IndirectOffset,
}

/// Interpretation of a 16-bit immediate field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signedness {
    /// Sign-extended to 32 bits.
    Signed,
    /// Zero-extended to 32 bits.
    Unsigned,
}

/// Operand shape of an opcode.
///
/// `reg0`..`reg2` flag the three register slots (bits 25:21, 20:16, 15:11).
/// At most one of `address` and `immediate` is present; both overlay the
/// low bits of the word. An [`AddressMode::IndirectOffset`] address consumes
/// register slot 1 for its base, which is not separately flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandFormat {
    pub reg0: bool,
    pub reg1: bool,
    pub reg2: bool,
    pub address: Option<AddressMode>,
    pub immediate: Option<Signedness>,
}

impl OperandFormat {
    const NONE: OperandFormat = OperandFormat {
        reg0: false,
        reg1: false,
        reg2: false,
        address: None,
        immediate: None,
    };

    const R0: OperandFormat = OperandFormat { reg0: true, ..Self::NONE };

    const RRR: OperandFormat = OperandFormat {
        reg0: true,
        reg1: true,
        reg2: true,
        ..Self::NONE
    };

    const fn rr_imm(signedness: Signedness) -> OperandFormat {
        OperandFormat {
            reg0: true,
            reg1: true,
            immediate: Some(signedness),
            ..Self::NONE
        }
    }

    const fn with_address(reg0: bool, reg1: bool, mode: AddressMode) -> OperandFormat {
        OperandFormat {
            reg0,
            reg1,
            address: Some(mode),
            ..Self::NONE
        }
    }
}

impl Opcode {
    /// Decode an opcode from its 6-bit field value.
    pub fn from_u8(value: u8) -> Result<Opcode, KasmError> {
        let opcode = match value {
            0x00 => Opcode::Nop,
            0x01 => Opcode::Sys,
            0x02 => Opcode::J,
            0x03 => Opcode::Jr,
            0x04 => Opcode::Jal,
            0x05 => Opcode::Jalr,
            0x06 => Opcode::B,
            0x07 => Opcode::Beq,
            0x08 => Opcode::Bne,
            0x09 => Opcode::Blt,
            0x0A => Opcode::Bgt,
            0x0B => Opcode::Ble,
            0x0C => Opcode::Bge,
            0x0D => Opcode::Li,
            0x0E => Opcode::La,
            0x0F => Opcode::Lw,
            0x10 => Opcode::Sw,
            0x11 => Opcode::Lb,
            0x12 => Opcode::Sb,
            0x13 => Opcode::Add,
            0x14 => Opcode::Addi,
            0x15 => Opcode::Sub,
            0x16 => Opcode::Mul,
            0x17 => Opcode::Div,
            0x18 => Opcode::Mod,
            0x19 => Opcode::And,
            0x1A => Opcode::Andi,
            0x1B => Opcode::Or,
            0x1C => Opcode::Ori,
            0x1D => Opcode::Xor,
            0x1E => Opcode::Xori,
            0x1F => Opcode::Nor,
            0x20 => Opcode::Sll,
            0x21 => Opcode::Srl,
            0x22 => Opcode::Sra,
            0x23 => Opcode::Slt,
            0x24 => Opcode::Sltu,
            _ => return Err(KasmError::InvalidOpcode(value)),
        };
        Ok(opcode)
    }

    /// The opcode's 6-bit field value.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "nop",
            Opcode::Sys => "sys",
            Opcode::J => "j",
            Opcode::Jr => "jr",
            Opcode::Jal => "jal",
            Opcode::Jalr => "jalr",
            Opcode::B => "b",
            Opcode::Beq => "beq",
            Opcode::Bne => "bne",
            Opcode::Blt => "blt",
            Opcode::Bgt => "bgt",
            Opcode::Ble => "ble",
            Opcode::Bge => "bge",
            Opcode::Li => "li",
            Opcode::La => "la",
            Opcode::Lw => "lw",
            Opcode::Sw => "sw",
            Opcode::Lb => "lb",
            Opcode::Sb => "sb",
            Opcode::Add => "add",
            Opcode::Addi => "addi",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Mod => "mod",
            Opcode::And => "and",
            Opcode::Andi => "andi",
            Opcode::Or => "or",
            Opcode::Ori => "ori",
            Opcode::Xor => "xor",
            Opcode::Xori => "xori",
            Opcode::Nor => "nor",
            Opcode::Sll => "sll",
            Opcode::Srl => "srl",
            Opcode::Sra => "sra",
            Opcode::Slt => "slt",
            Opcode::Sltu => "sltu",
        }
    }

    /// Look up an opcode by its assembly mnemonic.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        Opcode::ALL.iter().copied().find(|op| op.mnemonic() == mnemonic)
    }

    /// The operand shape of this opcode.
    pub const fn format(self) -> OperandFormat {
        match self {
            Opcode::Nop | Opcode::Sys => OperandFormat::NONE,
            Opcode::J | Opcode::Jal => {
                OperandFormat::with_address(false, false, AddressMode::DirectAbsolute)
            }
            Opcode::Jr | Opcode::Jalr => OperandFormat::R0,
            Opcode::B => OperandFormat::with_address(false, false, AddressMode::DirectOffset),
            Opcode::Beq
            | Opcode::Bne
            | Opcode::Blt
            | Opcode::Bgt
            | Opcode::Ble
            | Opcode::Bge => OperandFormat::with_address(true, true, AddressMode::DirectOffset),
            Opcode::Li => OperandFormat {
                reg0: true,
                immediate: Some(Signedness::Unsigned),
                ..OperandFormat::NONE
            },
            // la materializes a PC-relative address so the target fits in 16
            // bits alongside the destination register.
            Opcode::La => OperandFormat::with_address(true, false, AddressMode::DirectOffset),
            Opcode::Lw | Opcode::Sw | Opcode::Lb | Opcode::Sb => {
                OperandFormat::with_address(true, false, AddressMode::IndirectOffset)
            }
            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Mod
            | Opcode::And
            | Opcode::Or
            | Opcode::Xor
            | Opcode::Nor
            | Opcode::Sll
            | Opcode::Srl
            | Opcode::Sra
            | Opcode::Slt
            | Opcode::Sltu => OperandFormat::RRR,
            Opcode::Addi => OperandFormat::rr_imm(Signedness::Signed),
            Opcode::Andi | Opcode::Ori | Opcode::Xori => {
                OperandFormat::rr_imm(Signedness::Unsigned)
            }
        }
    }

    /// True for conditional branches and the unconditional `b`.
    pub const fn is_branch(self) -> bool {
        matches!(
            self,
            Opcode::B
                | Opcode::Beq
                | Opcode::Bne
                | Opcode::Blt
                | Opcode::Bgt
                | Opcode::Ble
                | Opcode::Bge
        )
    }

    /// True for instructions that access data memory.
    pub const fn is_memory(self) -> bool {
        matches!(self, Opcode::Lw | Opcode::Sw | Opcode::Lb | Opcode::Sb)
    }

    /// All opcodes, in encoding order.
    pub const ALL: [Opcode; 37] = [
        Opcode::Nop,
        Opcode::Sys,
        Opcode::J,
        Opcode::Jr,
        Opcode::Jal,
        Opcode::Jalr,
        Opcode::B,
        Opcode::Beq,
        Opcode::Bne,
        Opcode::Blt,
        Opcode::Bgt,
        Opcode::Ble,
        Opcode::Bge,
        Opcode::Li,
        Opcode::La,
        Opcode::Lw,
        Opcode::Sw,
        Opcode::Lb,
        Opcode::Sb,
        Opcode::Add,
        Opcode::Addi,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Mod,
        Opcode::And,
        Opcode::Andi,
        Opcode::Or,
        Opcode::Ori,
        Opcode::Xor,
        Opcode::Xori,
        Opcode::Nor,
        Opcode::Sll,
        Opcode::Srl,
        Opcode::Sra,
        Opcode::Slt,
        Opcode::Sltu,
    ];
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}
