//! Instruction decoder: packed 32-bit word to decoded instruction.

use kasm_spec::encoding::{
    extract_address, extract_immediate, extract_opcode, extract_reg0, extract_reg1, extract_reg2,
    extract_signed_immediate,
};
use kasm_spec::{Instruction, Opcode, Register};

use crate::error::{DisassemblerError, Result};

/// Decode a single instruction word.
///
/// Field extraction is driven by the opcode's operand format; bits outside
/// the flagged fields are ignored, mirroring what the execution engine
/// reads.
pub fn decode(word: u32) -> Result<Instruction> {
    let opcode = Opcode::from_u8(extract_opcode(word))
        .map_err(|_| DisassemblerError::UnknownOpcode(extract_opcode(word)))?;

    let r0 = Register::from_index(extract_reg0(word))?;
    let r1 = Register::from_index(extract_reg1(word))?;
    let r2 = Register::from_index(extract_reg2(word))?;
    let imm = extract_immediate(word);
    let offset = extract_signed_immediate(word);
    let target = extract_address(word);

    let instruction = match opcode {
        Opcode::Nop => Instruction::Nop,
        Opcode::Sys => Instruction::Sys,
        Opcode::J => Instruction::J { target },
        Opcode::Jr => Instruction::Jr { rd: r0 },
        Opcode::Jal => Instruction::Jal { target },
        Opcode::Jalr => Instruction::Jalr { rd: r0 },
        Opcode::B => Instruction::B { offset },
        Opcode::Beq => Instruction::Beq { rd: r0, rs: r1, offset },
        Opcode::Bne => Instruction::Bne { rd: r0, rs: r1, offset },
        Opcode::Blt => Instruction::Blt { rd: r0, rs: r1, offset },
        Opcode::Bgt => Instruction::Bgt { rd: r0, rs: r1, offset },
        Opcode::Ble => Instruction::Ble { rd: r0, rs: r1, offset },
        Opcode::Bge => Instruction::Bge { rd: r0, rs: r1, offset },
        Opcode::Li => Instruction::Li { rd: r0, imm },
        Opcode::La => Instruction::La { rd: r0, offset },
        Opcode::Lw => Instruction::Lw { rd: r0, base: r1, offset },
        Opcode::Sw => Instruction::Sw { rd: r0, base: r1, offset },
        Opcode::Lb => Instruction::Lb { rd: r0, base: r1, offset },
        Opcode::Sb => Instruction::Sb { rd: r0, base: r1, offset },
        Opcode::Add => Instruction::Add { rd: r0, rs: r1, rt: r2 },
        Opcode::Addi => Instruction::Addi { rd: r0, rs: r1, imm: offset },
        Opcode::Sub => Instruction::Sub { rd: r0, rs: r1, rt: r2 },
        Opcode::Mul => Instruction::Mul { rd: r0, rs: r1, rt: r2 },
        Opcode::Div => Instruction::Div { rd: r0, rs: r1, rt: r2 },
        Opcode::Mod => Instruction::Mod { rd: r0, rs: r1, rt: r2 },
        Opcode::And => Instruction::And { rd: r0, rs: r1, rt: r2 },
        Opcode::Andi => Instruction::Andi { rd: r0, rs: r1, imm },
        Opcode::Or => Instruction::Or { rd: r0, rs: r1, rt: r2 },
        Opcode::Ori => Instruction::Ori { rd: r0, rs: r1, imm },
        Opcode::Xor => Instruction::Xor { rd: r0, rs: r1, rt: r2 },
        Opcode::Xori => Instruction::Xori { rd: r0, rs: r1, imm },
        Opcode::Nor => Instruction::Nor { rd: r0, rs: r1, rt: r2 },
        Opcode::Sll => Instruction::Sll { rd: r0, rs: r1, rt: r2 },
        Opcode::Srl => Instruction::Srl { rd: r0, rs: r1, rt: r2 },
        Opcode::Sra => Instruction::Sra { rd: r0, rs: r1, rt: r2 },
        Opcode::Slt => Instruction::Slt { rd: r0, rs: r1, rt: r2 },
        Opcode::Sltu => Instruction::Sltu { rd: r0, rs: r1, rt: r2 },
    };
    Ok(instruction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kasm_spec::encoding;

    #[test]
    fn test_decode_nop() {
        assert_eq!(decode(0).unwrap(), Instruction::Nop);
    }

    #[test]
    fn test_decode_rrr() {
        let word = encoding::encode_opcode(Opcode::Add.as_u8())
            | encoding::encode_reg0(Register::T2.index())
            | encoding::encode_reg1(Register::T0.index())
            | encoding::encode_reg2(Register::T1.index());
        assert_eq!(
            decode(word).unwrap(),
            Instruction::Add {
                rd: Register::T2,
                rs: Register::T0,
                rt: Register::T1,
            }
        );
    }

    #[test]
    fn test_decode_signed_offset() {
        let word = encoding::encode_opcode(Opcode::B.as_u8())
            | encoding::encode_immediate((-8i16) as u16 as u32);
        assert_eq!(decode(word).unwrap(), Instruction::B { offset: -8 });
    }

    #[test]
    fn test_decode_unknown_opcode() {
        let word = encoding::encode_opcode(0x3F);
        assert!(matches!(
            decode(word),
            Err(DisassemblerError::UnknownOpcode(0x3F))
        ));
    }

    #[test]
    fn test_decode_break_word() {
        assert!(decode(encoding::BREAK_WORD).is_err());
    }
}
