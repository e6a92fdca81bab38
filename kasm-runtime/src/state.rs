//! VM state: register file, program counter, halt status.

use kasm_spec::{Register, GLOBAL_BASE, NUM_REGISTERS, STACK_BASE, STACK_SIZE, TEXT_BASE};
use serde::{Deserialize, Serialize};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaltReason {
    /// EXIT syscall with the given code.
    Exit(u32),
    /// The program counter ran past the end of the text segment.
    Completed,
    /// A breakpoint word was fetched; pc is left at the breakpoint.
    Breakpoint(u32),
    /// The configured cycle budget was exhausted.
    CycleLimit,
    /// The host's cooperative stop flag was raised.
    Stopped,
}

impl HaltReason {
    /// The process-style exit code for a normal termination, if this halt
    /// represents one.
    pub fn exit_code(&self) -> Option<u32> {
        match self {
            HaltReason::Exit(code) => Some(*code),
            HaltReason::Completed => Some(0),
            _ => None,
        }
    }
}

/// Register file and program counter.
#[derive(Debug, Clone)]
pub struct VmState {
    registers: [u32; NUM_REGISTERS],
    pc: u32,
    halted: Option<HaltReason>,
}

impl VmState {
    pub fn new() -> VmState {
        let mut state = VmState {
            registers: [0; NUM_REGISTERS],
            pc: TEXT_BASE,
            halted: None,
        };
        state.reset();
        state
    }

    /// Zero every register, point pc at the start of text, and seed the
    /// stack and global pointers.
    pub fn reset(&mut self) {
        self.registers = [0; NUM_REGISTERS];
        self.pc = TEXT_BASE;
        self.halted = None;
        self.registers[Register::Sp.index() as usize] = STACK_BASE + STACK_SIZE;
        self.registers[Register::Gp.index() as usize] = GLOBAL_BASE;
    }

    /// Read a register. Register zero always reads as 0.
    pub fn read_reg(&self, reg: Register) -> u32 {
        if reg == Register::Zero {
            0
        } else {
            self.registers[reg.index() as usize]
        }
    }

    /// Write a register. Writes to register zero are discarded.
    pub fn write_reg(&mut self, reg: Register, value: u32) {
        if reg != Register::Zero {
            self.registers[reg.index() as usize] = value;
        }
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
    }

    /// Advance pc by one instruction width.
    pub fn advance_pc(&mut self) {
        self.pc = self.pc.wrapping_add(kasm_spec::INSTRUCTION_SIZE);
    }

    pub fn halt(&mut self, reason: HaltReason) {
        self.halted = Some(reason);
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    pub fn halt_reason(&self) -> Option<HaltReason> {
        self.halted
    }

    /// Clear a resumable halt (breakpoint, stop flag, cycle limit). A
    /// program that exited stays halted.
    pub fn resume(&mut self) {
        match self.halted {
            Some(HaltReason::Exit(_)) | Some(HaltReason::Completed) => {}
            _ => self.halted = None,
        }
    }
}

impl Default for VmState {
    fn default() -> VmState {
        VmState::new()
    }
}
