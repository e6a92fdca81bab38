//! Instruction encoder: decoded instruction to packed 32-bit word.
//!
//! Operands that do not fit their field are an assembly-time error, never
//! silently truncated.

use kasm_spec::encoding::{
    encode_address, encode_immediate, encode_opcode, encode_reg0, encode_reg1, encode_reg2,
    MAX_ABSOLUTE_ADDRESS,
};
use kasm_spec::{Instruction, Opcode, Register};

use crate::error::{AssemblerError, Result};

fn unsigned16(value: u32) -> Result<u32> {
    if value > 0xFFFF {
        return Err(AssemblerError::ImmediateOutOfRange {
            value: value as i64,
            bits: 16,
        });
    }
    Ok(encode_immediate(value))
}

fn signed16(value: i32) -> Result<u32> {
    i16::try_from(value)
        .map(|v| encode_immediate(v as u16 as u32))
        .map_err(|_| AssemblerError::ImmediateOutOfRange {
            value: value as i64,
            bits: 16,
        })
}

fn absolute26(address: u32) -> Result<u32> {
    if address > MAX_ABSOLUTE_ADDRESS {
        return Err(AssemblerError::AddressOutOfRange(address));
    }
    Ok(encode_address(address))
}

fn opcode_bits(opcode: Opcode) -> u32 {
    encode_opcode(opcode.as_u8())
}

fn rrr(opcode: Opcode, rd: Register, rs: Register, rt: Register) -> u32 {
    opcode_bits(opcode) | encode_reg0(rd.index()) | encode_reg1(rs.index()) | encode_reg2(rt.index())
}

fn branch(opcode: Opcode, rd: Register, rs: Register, offset: i32) -> Result<u32> {
    Ok(opcode_bits(opcode) | encode_reg0(rd.index()) | encode_reg1(rs.index()) | signed16(offset)?)
}

fn load_store(opcode: Opcode, rd: Register, base: Register, offset: i32) -> Result<u32> {
    Ok(opcode_bits(opcode) | encode_reg0(rd.index()) | encode_reg1(base.index()) | signed16(offset)?)
}

fn reg_imm_unsigned(opcode: Opcode, rd: Register, rs: Register, imm: u32) -> Result<u32> {
    Ok(opcode_bits(opcode) | encode_reg0(rd.index()) | encode_reg1(rs.index()) | unsigned16(imm)?)
}

/// Encode an instruction into its packed word.
pub fn encode(instruction: &Instruction) -> Result<u32> {
    let word = match *instruction {
        Instruction::Nop => opcode_bits(Opcode::Nop),
        Instruction::Sys => opcode_bits(Opcode::Sys),

        Instruction::J { target } => opcode_bits(Opcode::J) | absolute26(target)?,
        Instruction::Jal { target } => opcode_bits(Opcode::Jal) | absolute26(target)?,
        Instruction::Jr { rd } => opcode_bits(Opcode::Jr) | encode_reg0(rd.index()),
        Instruction::Jalr { rd } => opcode_bits(Opcode::Jalr) | encode_reg0(rd.index()),

        Instruction::B { offset } => opcode_bits(Opcode::B) | signed16(offset)?,
        Instruction::Beq { rd, rs, offset } => branch(Opcode::Beq, rd, rs, offset)?,
        Instruction::Bne { rd, rs, offset } => branch(Opcode::Bne, rd, rs, offset)?,
        Instruction::Blt { rd, rs, offset } => branch(Opcode::Blt, rd, rs, offset)?,
        Instruction::Bgt { rd, rs, offset } => branch(Opcode::Bgt, rd, rs, offset)?,
        Instruction::Ble { rd, rs, offset } => branch(Opcode::Ble, rd, rs, offset)?,
        Instruction::Bge { rd, rs, offset } => branch(Opcode::Bge, rd, rs, offset)?,

        Instruction::Li { rd, imm } => {
            opcode_bits(Opcode::Li) | encode_reg0(rd.index()) | unsigned16(imm)?
        }
        Instruction::La { rd, offset } => {
            opcode_bits(Opcode::La) | encode_reg0(rd.index()) | signed16(offset)?
        }
        Instruction::Lw { rd, base, offset } => load_store(Opcode::Lw, rd, base, offset)?,
        Instruction::Sw { rd, base, offset } => load_store(Opcode::Sw, rd, base, offset)?,
        Instruction::Lb { rd, base, offset } => load_store(Opcode::Lb, rd, base, offset)?,
        Instruction::Sb { rd, base, offset } => load_store(Opcode::Sb, rd, base, offset)?,

        Instruction::Add { rd, rs, rt } => rrr(Opcode::Add, rd, rs, rt),
        Instruction::Sub { rd, rs, rt } => rrr(Opcode::Sub, rd, rs, rt),
        Instruction::Mul { rd, rs, rt } => rrr(Opcode::Mul, rd, rs, rt),
        Instruction::Div { rd, rs, rt } => rrr(Opcode::Div, rd, rs, rt),
        Instruction::Mod { rd, rs, rt } => rrr(Opcode::Mod, rd, rs, rt),
        Instruction::And { rd, rs, rt } => rrr(Opcode::And, rd, rs, rt),
        Instruction::Or { rd, rs, rt } => rrr(Opcode::Or, rd, rs, rt),
        Instruction::Xor { rd, rs, rt } => rrr(Opcode::Xor, rd, rs, rt),
        Instruction::Nor { rd, rs, rt } => rrr(Opcode::Nor, rd, rs, rt),
        Instruction::Sll { rd, rs, rt } => rrr(Opcode::Sll, rd, rs, rt),
        Instruction::Srl { rd, rs, rt } => rrr(Opcode::Srl, rd, rs, rt),
        Instruction::Sra { rd, rs, rt } => rrr(Opcode::Sra, rd, rs, rt),
        Instruction::Slt { rd, rs, rt } => rrr(Opcode::Slt, rd, rs, rt),
        Instruction::Sltu { rd, rs, rt } => rrr(Opcode::Sltu, rd, rs, rt),

        Instruction::Addi { rd, rs, imm } => {
            opcode_bits(Opcode::Addi) | encode_reg0(rd.index()) | encode_reg1(rs.index())
                | signed16(imm)?
        }
        Instruction::Andi { rd, rs, imm } => reg_imm_unsigned(Opcode::Andi, rd, rs, imm)?,
        Instruction::Ori { rd, rs, imm } => reg_imm_unsigned(Opcode::Ori, rd, rs, imm)?,
        Instruction::Xori { rd, rs, imm } => reg_imm_unsigned(Opcode::Xori, rd, rs, imm)?,
    };
    Ok(word)
}
