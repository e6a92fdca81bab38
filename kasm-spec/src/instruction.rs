//! Decoded instruction representation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::opcode::Opcode;
use crate::register::Register;

/// A fully decoded instruction.
///
/// Field meanings follow the operand-format table: `rd` occupies register
/// slot 0, `rs` slot 1, and `rt` slot 2. Branch comparisons read `rd` and
/// `rs` as their two inputs. Offsets are signed byte distances relative to
/// the instruction's own address (direct) or to the base register's value
/// (indirect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    Nop,
    Sys,
    J { target: u32 },
    Jr { rd: Register },
    Jal { target: u32 },
    Jalr { rd: Register },
    B { offset: i32 },
    Beq { rd: Register, rs: Register, offset: i32 },
    Bne { rd: Register, rs: Register, offset: i32 },
    Blt { rd: Register, rs: Register, offset: i32 },
    Bgt { rd: Register, rs: Register, offset: i32 },
    Ble { rd: Register, rs: Register, offset: i32 },
    Bge { rd: Register, rs: Register, offset: i32 },
    Li { rd: Register, imm: u32 },
    La { rd: Register, offset: i32 },
    Lw { rd: Register, base: Register, offset: i32 },
    Sw { rd: Register, base: Register, offset: i32 },
    Lb { rd: Register, base: Register, offset: i32 },
    Sb { rd: Register, base: Register, offset: i32 },
    Add { rd: Register, rs: Register, rt: Register },
    Addi { rd: Register, rs: Register, imm: i32 },
    Sub { rd: Register, rs: Register, rt: Register },
    Mul { rd: Register, rs: Register, rt: Register },
    Div { rd: Register, rs: Register, rt: Register },
    Mod { rd: Register, rs: Register, rt: Register },
    And { rd: Register, rs: Register, rt: Register },
    Andi { rd: Register, rs: Register, imm: u32 },
    Or { rd: Register, rs: Register, rt: Register },
    Ori { rd: Register, rs: Register, imm: u32 },
    Xor { rd: Register, rs: Register, rt: Register },
    Xori { rd: Register, rs: Register, imm: u32 },
    Nor { rd: Register, rs: Register, rt: Register },
    Sll { rd: Register, rs: Register, rt: Register },
    Srl { rd: Register, rs: Register, rt: Register },
    Sra { rd: Register, rs: Register, rt: Register },
    Slt { rd: Register, rs: Register, rt: Register },
    Sltu { rd: Register, rs: Register, rt: Register },
}

impl Instruction {
    /// The instruction's opcode.
    pub const fn opcode(&self) -> Opcode {
        match self {
            Instruction::Nop => Opcode::Nop,
            Instruction::Sys => Opcode::Sys,
            Instruction::J { .. } => Opcode::J,
            Instruction::Jr { .. } => Opcode::Jr,
            Instruction::Jal { .. } => Opcode::Jal,
            Instruction::Jalr { .. } => Opcode::Jalr,
            Instruction::B { .. } => Opcode::B,
            Instruction::Beq { .. } => Opcode::Beq,
            Instruction::Bne { .. } => Opcode::Bne,
            Instruction::Blt { .. } => Opcode::Blt,
            Instruction::Bgt { .. } => Opcode::Bgt,
            Instruction::Ble { .. } => Opcode::Ble,
            Instruction::Bge { .. } => Opcode::Bge,
            Instruction::Li { .. } => Opcode::Li,
            Instruction::La { .. } => Opcode::La,
            Instruction::Lw { .. } => Opcode::Lw,
            Instruction::Sw { .. } => Opcode::Sw,
            Instruction::Lb { .. } => Opcode::Lb,
            Instruction::Sb { .. } => Opcode::Sb,
            Instruction::Add { .. } => Opcode::Add,
            Instruction::Addi { .. } => Opcode::Addi,
            Instruction::Sub { .. } => Opcode::Sub,
            Instruction::Mul { .. } => Opcode::Mul,
            Instruction::Div { .. } => Opcode::Div,
            Instruction::Mod { .. } => Opcode::Mod,
            Instruction::And { .. } => Opcode::And,
            Instruction::Andi { .. } => Opcode::Andi,
            Instruction::Or { .. } => Opcode::Or,
            Instruction::Ori { .. } => Opcode::Ori,
            Instruction::Xor { .. } => Opcode::Xor,
            Instruction::Xori { .. } => Opcode::Xori,
            Instruction::Nor { .. } => Opcode::Nor,
            Instruction::Sll { .. } => Opcode::Sll,
            Instruction::Srl { .. } => Opcode::Srl,
            Instruction::Sra { .. } => Opcode::Sra,
            Instruction::Slt { .. } => Opcode::Slt,
            Instruction::Sltu { .. } => Opcode::Sltu,
        }
    }

    /// Assembly mnemonic.
    pub const fn mnemonic(&self) -> &'static str {
        self.opcode().mnemonic()
    }

    /// True if executing this instruction may set pc somewhere other than
    /// the next sequential instruction.
    pub const fn is_control_flow(&self) -> bool {
        matches!(
            self,
            Instruction::J { .. }
                | Instruction::Jr { .. }
                | Instruction::Jal { .. }
                | Instruction::Jalr { .. }
                | Instruction::B { .. }
                | Instruction::Beq { .. }
                | Instruction::Bne { .. }
                | Instruction::Blt { .. }
                | Instruction::Bgt { .. }
                | Instruction::Ble { .. }
                | Instruction::Bge { .. }
        )
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.mnemonic();
        match *self {
            Instruction::Nop | Instruction::Sys => write!(f, "{m}"),
            Instruction::J { target } | Instruction::Jal { target } => {
                write!(f, "{m} {target:#x}")
            }
            Instruction::Jr { rd } | Instruction::Jalr { rd } => write!(f, "{m} {rd}"),
            Instruction::B { offset } => write!(f, "{m} {offset}"),
            Instruction::Beq { rd, rs, offset }
            | Instruction::Bne { rd, rs, offset }
            | Instruction::Blt { rd, rs, offset }
            | Instruction::Bgt { rd, rs, offset }
            | Instruction::Ble { rd, rs, offset }
            | Instruction::Bge { rd, rs, offset } => write!(f, "{m} {rd}, {rs}, {offset}"),
            Instruction::Li { rd, imm } => write!(f, "{m} {rd}, {imm}"),
            Instruction::La { rd, offset } => write!(f, "{m} {rd}, {offset}"),
            Instruction::Lw { rd, base, offset }
            | Instruction::Sw { rd, base, offset }
            | Instruction::Lb { rd, base, offset }
            | Instruction::Sb { rd, base, offset } => {
                write!(f, "{m} {rd}, {offset}({base})")
            }
            Instruction::Add { rd, rs, rt }
            | Instruction::Sub { rd, rs, rt }
            | Instruction::Mul { rd, rs, rt }
            | Instruction::Div { rd, rs, rt }
            | Instruction::Mod { rd, rs, rt }
            | Instruction::And { rd, rs, rt }
            | Instruction::Or { rd, rs, rt }
            | Instruction::Xor { rd, rs, rt }
            | Instruction::Nor { rd, rs, rt }
            | Instruction::Sll { rd, rs, rt }
            | Instruction::Srl { rd, rs, rt }
            | Instruction::Sra { rd, rs, rt }
            | Instruction::Slt { rd, rs, rt }
            | Instruction::Sltu { rd, rs, rt } => write!(f, "{m} {rd}, {rs}, {rt}"),
            Instruction::Addi { rd, rs, imm } => write!(f, "{m} {rd}, {rs}, {imm}"),
            Instruction::Andi { rd, rs, imm }
            | Instruction::Ori { rd, rs, imm }
            | Instruction::Xori { rd, rs, imm } => write!(f, "{m} {rd}, {rs}, {imm}"),
        }
    }
}
