//! The virtual machine: load, fetch-decode-execute, and the host-facing
//! peek/poke surface.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use kasm_spec::encoding::BREAK_WORD;
use kasm_spec::{Program, Register, HEAP_BASE, HEAP_SIZE, INSTRUCTION_SIZE};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Result, RuntimeError};
use crate::execute::execute;
use crate::memory::Memory;
use crate::state::{HaltReason, VmState};
use crate::syscall::{BumpAllocator, Console, StdConsole};

/// VM configuration
#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Maximum number of cycles before halting
    pub max_cycles: u64,

    /// Log each executed instruction at trace level
    pub trace: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_cycles: 1_000_000,
            trace: false,
        }
    }
}

/// Outcome of a completed (or interrupted) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Number of cycles executed
    pub cycles: u64,

    /// Reason for halting
    pub halt_reason: HaltReason,
}

impl ExecutionResult {
    /// Exit code for a normal termination (EXIT syscall or running off
    /// the end of text).
    pub fn exit_code(&self) -> Option<u32> {
        self.halt_reason.exit_code()
    }
}

/// KASM virtual machine.
///
/// Generic over the console so hosts and tests can script I/O; the default
/// talks to the process's stdin/stdout.
pub struct Vm<C: Console = StdConsole> {
    state: VmState,
    memory: Memory,
    console: C,
    heap: BumpAllocator,
    program: Program,
    config: VmConfig,
    cycles: u64,
    stop: Arc<AtomicBool>,
}

impl Vm<StdConsole> {
    /// Load a program with the standard console.
    pub fn load(program: Program, config: VmConfig) -> Result<Vm<StdConsole>> {
        Vm::with_console(program, config, StdConsole)
    }

    /// Parse and load a serialized program image.
    pub fn load_image(bytes: &[u8], config: VmConfig) -> Result<Vm<StdConsole>> {
        let program = Program::from_bytes(bytes)?;
        Vm::load(program, config)
    }
}

impl<C: Console> Vm<C> {
    /// Load a program with a caller-supplied console.
    pub fn with_console(program: Program, config: VmConfig, console: C) -> Result<Vm<C>> {
        program.header.validate()?;
        debug!(
            text = program.header.text_length,
            data = program.header.data_length,
            "loading program"
        );

        Ok(Vm {
            state: VmState::new(),
            memory: Memory::new(&program),
            console,
            heap: BumpAllocator::new(HEAP_BASE, HEAP_SIZE),
            program,
            config,
            cycles: 0,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Rewind to the freshly loaded state: registers, pc, memory, heap,
    /// and cycle count.
    pub fn reset(&mut self) {
        self.state.reset();
        self.memory.reset(&self.program);
        self.heap.reset(HEAP_BASE, HEAP_SIZE);
        self.cycles = 0;
        self.stop.store(false, Ordering::Relaxed);
    }

    /// Handle a host can raise from another thread to stop the run at the
    /// next instruction boundary.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Execute one instruction. Does nothing once halted.
    pub fn step(&mut self) -> Result<()> {
        if self.state.is_halted() {
            return Ok(());
        }

        let pc = self.state.pc();
        if pc % INSTRUCTION_SIZE != 0 {
            return Err(RuntimeError::MisalignedPc { pc });
        }
        if pc >= self.memory.text_length() {
            self.state.halt(HaltReason::Completed);
            return Ok(());
        }

        let word = self.memory.read_word(pc)?;
        if word == BREAK_WORD {
            // pc stays at the breakpoint so a debugger can resume it.
            self.state.halt(HaltReason::Breakpoint(pc));
            return Ok(());
        }

        let instruction = kasm_disassembler::decode(word).map_err(|error| match error {
            kasm_disassembler::DisassemblerError::UnknownOpcode(opcode) => {
                RuntimeError::IllegalOpcode { pc, opcode }
            }
            _ => RuntimeError::InvalidInstruction { pc, word },
        })?;

        if self.config.trace {
            trace!(pc = format_args!("{pc:#010x}"), %instruction, "execute");
        }

        execute(
            &instruction,
            &mut self.state,
            &mut self.memory,
            &mut self.console,
            &mut self.heap,
        )?;
        self.cycles += 1;
        Ok(())
    }

    /// Run until the program halts, the cycle budget runs out, or the
    /// stop flag is raised.
    pub fn run(&mut self) -> Result<ExecutionResult> {
        while !self.state.is_halted() {
            if self.cycles >= self.config.max_cycles {
                self.state.halt(HaltReason::CycleLimit);
                break;
            }
            if self.stop.load(Ordering::Relaxed) {
                self.state.halt(HaltReason::Stopped);
                break;
            }
            self.step()?;
        }

        let halt_reason = match self.state.halt_reason() {
            Some(reason) => reason,
            // Unreachable: the loop only exits halted.
            None => HaltReason::Completed,
        };
        debug!(cycles = self.cycles, ?halt_reason, "run finished");
        Ok(ExecutionResult {
            cycles: self.cycles,
            halt_reason,
        })
    }

    /// Clear a resumable halt (breakpoint, stop, cycle limit).
    pub fn resume(&mut self) {
        self.stop.store(false, Ordering::Relaxed);
        self.state.resume();
    }

    pub fn pc(&self) -> u32 {
        self.state.pc()
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.state.set_pc(pc);
    }

    pub fn halt_reason(&self) -> Option<HaltReason> {
        self.state.halt_reason()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Peek a register.
    pub fn register(&self, reg: Register) -> u32 {
        self.state.read_reg(reg)
    }

    /// Poke a register.
    pub fn set_register(&mut self, reg: Register, value: u32) {
        self.state.write_reg(reg, value);
    }

    /// Peek a memory word.
    pub fn read_word(&self, address: u32) -> Result<u32> {
        self.memory.read_word(address)
    }

    /// Poke a memory word. This is the same path store instructions use;
    /// debugger breakpoint patching goes through here too.
    pub fn write_word(&mut self, address: u32, value: u32) -> Result<()> {
        self.memory.write_word(address, value)
    }

    pub fn read_byte(&self, address: u32) -> Result<u8> {
        self.memory.read_byte(address)
    }

    pub fn write_byte(&mut self, address: u32, value: u8) -> Result<()> {
        self.memory.write_byte(address, value)
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syscall::BufferedConsole;
    use kasm_assembler::assemble;

    fn vm(source: &str) -> Vm<BufferedConsole> {
        let program = assemble(source).unwrap();
        Vm::with_console(program, VmConfig::default(), BufferedConsole::new()).unwrap()
    }

    #[test]
    fn running_off_text_end_completes() {
        let mut machine = vm("nop\nnop");
        let result = machine.run().unwrap();
        assert_eq!(result.halt_reason, HaltReason::Completed);
        assert_eq!(result.exit_code(), Some(0));
        assert_eq!(result.cycles, 2);
    }

    #[test]
    fn exit_syscall_reports_code() {
        let source = r#"
            li $v0, 0
            li $a0, 7
            sys
        "#;
        let result = vm(source).run().unwrap();
        assert_eq!(result.halt_reason, HaltReason::Exit(7));
    }

    #[test]
    fn cycle_limit_halts() {
        let mut machine = {
            let program = assemble("loop: b loop").unwrap();
            Vm::with_console(
                program,
                VmConfig {
                    max_cycles: 10,
                    ..VmConfig::default()
                },
                BufferedConsole::new(),
            )
            .unwrap()
        };
        let result = machine.run().unwrap();
        assert_eq!(result.halt_reason, HaltReason::CycleLimit);
    }

    #[test]
    fn stop_flag_halts() {
        let mut machine = vm("loop: b loop");
        machine.stop_handle().store(true, Ordering::Relaxed);
        let result = machine.run().unwrap();
        assert_eq!(result.halt_reason, HaltReason::Stopped);
    }

    #[test]
    fn illegal_opcode_leaves_pc_at_fault() {
        // Word with the reserved-but-not-break opcode 0x25.
        let word: u32 = 0x25 << 26;
        let program = kasm_spec::Program::new(word.to_le_bytes().to_vec(), vec![]);
        let mut machine =
            Vm::with_console(program, VmConfig::default(), BufferedConsole::new()).unwrap();

        let error = machine.run().unwrap_err();
        assert!(matches!(
            error,
            RuntimeError::IllegalOpcode { pc: 0, opcode: 0x25 }
        ));
        assert_eq!(machine.pc(), 0);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut machine = vm("li $t0, 9");
        machine.run().unwrap();
        assert_eq!(machine.register(Register::T0), 9);

        machine.reset();
        assert_eq!(machine.register(Register::T0), 0);
        assert_eq!(machine.pc(), 0);
        assert_eq!(machine.cycles(), 0);
        assert!(machine.halt_reason().is_none());
    }
}
