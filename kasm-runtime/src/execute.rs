//! Instruction semantics.
//!
//! `execute` performs exactly one decoded instruction against the VM
//! state, including every pc update: control-flow instructions set pc to
//! their resolved target, everything else advances it by one instruction
//! width. Branch and `la` offsets are relative to the instruction's own
//! address; the assembler encodes them with the same convention.

use kasm_spec::{Instruction, Register};

use crate::error::{Result, RuntimeError};
use crate::memory::Memory;
use crate::state::VmState;
use crate::syscall::{handle_syscall, Console, HeapAllocator};

/// Effective address of a PC-relative operand.
fn relative(pc: u32, offset: i32) -> u32 {
    pc.wrapping_add(offset as u32)
}

/// Effective address of an indirect (base register + offset) operand.
fn indirect(state: &VmState, base: Register, offset: i32) -> u32 {
    state.read_reg(base).wrapping_add(offset as u32)
}

/// Execute one instruction.
pub fn execute(
    instruction: &Instruction,
    state: &mut VmState,
    memory: &mut Memory,
    console: &mut dyn Console,
    heap: &mut dyn HeapAllocator,
) -> Result<()> {
    let pc = state.pc();

    // Conditional branches share their taken/not-taken pc discipline.
    let branch = |state: &mut VmState, taken: bool, offset: i32| {
        if taken {
            state.set_pc(relative(pc, offset));
        } else {
            state.advance_pc();
        }
    };

    match *instruction {
        Instruction::Nop => state.advance_pc(),

        Instruction::Sys => {
            handle_syscall(state, memory, console, heap)?;
            if !state.is_halted() {
                state.advance_pc();
            }
        }

        Instruction::J { target } => state.set_pc(target),
        Instruction::Jr { rd } => state.set_pc(state.read_reg(rd)),
        Instruction::Jal { target } => {
            state.write_reg(Register::Ra, pc.wrapping_add(4));
            state.set_pc(target);
        }
        Instruction::Jalr { rd } => {
            let target = state.read_reg(rd);
            state.write_reg(Register::Ra, pc.wrapping_add(4));
            state.set_pc(target);
        }

        Instruction::B { offset } => state.set_pc(relative(pc, offset)),
        Instruction::Beq { rd, rs, offset } => {
            let taken = state.read_reg(rd) == state.read_reg(rs);
            branch(state, taken, offset);
        }
        Instruction::Bne { rd, rs, offset } => {
            let taken = state.read_reg(rd) != state.read_reg(rs);
            branch(state, taken, offset);
        }
        Instruction::Blt { rd, rs, offset } => {
            let taken = (state.read_reg(rd) as i32) < (state.read_reg(rs) as i32);
            branch(state, taken, offset);
        }
        Instruction::Bgt { rd, rs, offset } => {
            let taken = (state.read_reg(rd) as i32) > (state.read_reg(rs) as i32);
            branch(state, taken, offset);
        }
        Instruction::Ble { rd, rs, offset } => {
            let taken = (state.read_reg(rd) as i32) <= (state.read_reg(rs) as i32);
            branch(state, taken, offset);
        }
        Instruction::Bge { rd, rs, offset } => {
            let taken = (state.read_reg(rd) as i32) >= (state.read_reg(rs) as i32);
            branch(state, taken, offset);
        }

        Instruction::Li { rd, imm } => {
            state.write_reg(rd, imm);
            state.advance_pc();
        }
        Instruction::La { rd, offset } => {
            state.write_reg(rd, relative(pc, offset));
            state.advance_pc();
        }

        Instruction::Lw { rd, base, offset } => {
            let value = memory.read_word(indirect(state, base, offset))?;
            state.write_reg(rd, value);
            state.advance_pc();
        }
        Instruction::Sw { rd, base, offset } => {
            memory.write_word(indirect(state, base, offset), state.read_reg(rd))?;
            state.advance_pc();
        }
        Instruction::Lb { rd, base, offset } => {
            let value = memory.read_byte(indirect(state, base, offset))?;
            state.write_reg(rd, value as u32);
            state.advance_pc();
        }
        Instruction::Sb { rd, base, offset } => {
            memory.write_byte(indirect(state, base, offset), state.read_reg(rd) as u8)?;
            state.advance_pc();
        }

        Instruction::Add { rd, rs, rt } => {
            let value = state.read_reg(rs).wrapping_add(state.read_reg(rt));
            state.write_reg(rd, value);
            state.advance_pc();
        }
        Instruction::Addi { rd, rs, imm } => {
            let value = state.read_reg(rs).wrapping_add(imm as u32);
            state.write_reg(rd, value);
            state.advance_pc();
        }
        Instruction::Sub { rd, rs, rt } => {
            let value = state.read_reg(rs).wrapping_sub(state.read_reg(rt));
            state.write_reg(rd, value);
            state.advance_pc();
        }
        Instruction::Mul { rd, rs, rt } => {
            let value = state.read_reg(rs).wrapping_mul(state.read_reg(rt));
            state.write_reg(rd, value);
            state.advance_pc();
        }
        Instruction::Div { rd, rs, rt } => {
            let divisor = state.read_reg(rt) as i32;
            if divisor == 0 {
                return Err(RuntimeError::DivisionByZero { pc });
            }
            let value = (state.read_reg(rs) as i32).wrapping_div(divisor);
            state.write_reg(rd, value as u32);
            state.advance_pc();
        }
        Instruction::Mod { rd, rs, rt } => {
            let divisor = state.read_reg(rt) as i32;
            if divisor == 0 {
                return Err(RuntimeError::DivisionByZero { pc });
            }
            let value = (state.read_reg(rs) as i32).wrapping_rem(divisor);
            state.write_reg(rd, value as u32);
            state.advance_pc();
        }

        Instruction::And { rd, rs, rt } => {
            state.write_reg(rd, state.read_reg(rs) & state.read_reg(rt));
            state.advance_pc();
        }
        Instruction::Andi { rd, rs, imm } => {
            state.write_reg(rd, state.read_reg(rs) & imm);
            state.advance_pc();
        }
        Instruction::Or { rd, rs, rt } => {
            state.write_reg(rd, state.read_reg(rs) | state.read_reg(rt));
            state.advance_pc();
        }
        Instruction::Ori { rd, rs, imm } => {
            state.write_reg(rd, state.read_reg(rs) | imm);
            state.advance_pc();
        }
        Instruction::Xor { rd, rs, rt } => {
            state.write_reg(rd, state.read_reg(rs) ^ state.read_reg(rt));
            state.advance_pc();
        }
        Instruction::Xori { rd, rs, imm } => {
            state.write_reg(rd, state.read_reg(rs) ^ imm);
            state.advance_pc();
        }
        Instruction::Nor { rd, rs, rt } => {
            state.write_reg(rd, !(state.read_reg(rs) | state.read_reg(rt)));
            state.advance_pc();
        }

        Instruction::Sll { rd, rs, rt } => {
            let amount = state.read_reg(rt) & 31;
            state.write_reg(rd, state.read_reg(rs) << amount);
            state.advance_pc();
        }
        Instruction::Srl { rd, rs, rt } => {
            let amount = state.read_reg(rt) & 31;
            state.write_reg(rd, state.read_reg(rs) >> amount);
            state.advance_pc();
        }
        Instruction::Sra { rd, rs, rt } => {
            let amount = state.read_reg(rt) & 31;
            state.write_reg(rd, ((state.read_reg(rs) as i32) >> amount) as u32);
            state.advance_pc();
        }

        Instruction::Slt { rd, rs, rt } => {
            let flag = (state.read_reg(rs) as i32) < (state.read_reg(rt) as i32);
            state.write_reg(rd, flag as u32);
            state.advance_pc();
        }
        Instruction::Sltu { rd, rs, rt } => {
            let flag = state.read_reg(rs) < state.read_reg(rt);
            state.write_reg(rd, flag as u32);
            state.advance_pc();
        }
    }

    Ok(())
}
