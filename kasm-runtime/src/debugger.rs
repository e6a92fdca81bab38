//! Breakpoint-driven debugging, layered over [`Vm`] by composition.
//!
//! Breakpoints patch the reserved break word into text and remember the
//! displaced instruction; stepping over one temporarily restores it.

use std::collections::HashMap;

use kasm_spec::encoding::BREAK_WORD;
use kasm_spec::{Register, SymbolTable};
use tracing::debug;

use crate::error::{Result, RuntimeError};
use crate::state::HaltReason;
use crate::syscall::Console;
use crate::vm::{ExecutionResult, Vm};

/// Interactive debugger for a loaded VM.
pub struct Debugger<C: Console> {
    vm: Vm<C>,
    /// Breakpoint address to the instruction word it displaced.
    breakpoints: HashMap<u32, u32>,
    symbols: SymbolTable,
}

impl<C: Console> Debugger<C> {
    /// Wrap a VM. Symbols are optional; without them only raw addresses
    /// work.
    pub fn new(vm: Vm<C>, symbols: SymbolTable) -> Debugger<C> {
        Debugger {
            vm,
            breakpoints: HashMap::new(),
            symbols,
        }
    }

    /// Set a breakpoint by patching the break word over the instruction.
    pub fn add_breakpoint(&mut self, address: u32) -> Result<()> {
        if self.breakpoints.contains_key(&address) {
            return Err(RuntimeError::BreakpointExists { address });
        }
        let saved = self.vm.read_word(address)?;
        self.vm.write_word(address, BREAK_WORD)?;
        self.breakpoints.insert(address, saved);
        debug!(address = format_args!("{address:#010x}"), "breakpoint set");
        Ok(())
    }

    /// Remove a breakpoint, restoring the displaced instruction.
    pub fn remove_breakpoint(&mut self, address: u32) -> Result<()> {
        let saved = self
            .breakpoints
            .remove(&address)
            .ok_or(RuntimeError::NoBreakpoint { address })?;
        self.vm.write_word(address, saved)?;
        Ok(())
    }

    /// Set a breakpoint at a labelled address.
    pub fn break_at_label(&mut self, label: &str) -> Result<()> {
        let address = self
            .symbols
            .address_of(label)
            .ok_or_else(|| RuntimeError::UnknownLabel(label.to_owned()))?;
        self.add_breakpoint(address)
    }

    /// Addresses with an active breakpoint, in ascending order.
    pub fn breakpoints(&self) -> Vec<u32> {
        let mut addresses: Vec<u32> = self.breakpoints.keys().copied().collect();
        addresses.sort_unstable();
        addresses
    }

    /// Execute a single instruction, stepping over a breakpoint if pc sits
    /// on one.
    pub fn step(&mut self) -> Result<()> {
        let pc = self.vm.pc();
        match self.breakpoints.get(&pc).copied() {
            Some(saved) => {
                // Restore the real instruction, run it, re-arm the trap.
                self.vm.write_word(pc, saved)?;
                self.vm.resume();
                let result = self.vm.step();
                self.vm.write_word(pc, BREAK_WORD)?;
                result
            }
            None => {
                self.vm.resume();
                self.vm.step()
            }
        }
    }

    /// Resume execution until the next breakpoint or halt. If pc sits on a
    /// breakpoint, that instruction is stepped over first.
    pub fn continue_run(&mut self) -> Result<ExecutionResult> {
        if self.breakpoints.contains_key(&self.vm.pc()) {
            self.step()?;
            if let Some(reason) = self.vm.halt_reason() {
                if reason.exit_code().is_some() {
                    return Ok(ExecutionResult {
                        cycles: self.vm.cycles(),
                        halt_reason: reason,
                    });
                }
            }
        }
        self.vm.run()
    }

    /// Label at the current pc, if one exists.
    pub fn current_label(&self) -> Option<&str> {
        self.symbols.label_at(self.vm.pc())
    }

    pub fn register(&self, reg: Register) -> u32 {
        self.vm.register(reg)
    }

    pub fn set_register(&mut self, reg: Register, value: u32) {
        self.vm.set_register(reg, value);
    }

    /// Read a word, seeing through any breakpoint patch at that address.
    pub fn read_word(&self, address: u32) -> Result<u32> {
        match self.breakpoints.get(&address) {
            Some(&saved) => Ok(saved),
            None => self.vm.read_word(address),
        }
    }

    pub fn write_word(&mut self, address: u32, value: u32) -> Result<()> {
        if let Some(saved) = self.breakpoints.get_mut(&address) {
            *saved = value;
            return Ok(());
        }
        self.vm.write_word(address, value)
    }

    pub fn halt_reason(&self) -> Option<HaltReason> {
        self.vm.halt_reason()
    }

    pub fn pc(&self) -> u32 {
        self.vm.pc()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn vm(&self) -> &Vm<C> {
        &self.vm
    }

    pub fn vm_mut(&mut self) -> &mut Vm<C> {
        &mut self.vm
    }

    /// Tear down the debugger, restoring every breakpoint's displaced
    /// instruction.
    pub fn into_vm(mut self) -> Result<Vm<C>> {
        let addresses = self.breakpoints();
        for address in addresses {
            self.remove_breakpoint(address)?;
        }
        Ok(self.vm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syscall::BufferedConsole;
    use crate::vm::VmConfig;
    use kasm_assembler::assemble_with_symbols;

    fn debugger(source: &str) -> Debugger<BufferedConsole> {
        let assembly = assemble_with_symbols(source).unwrap();
        let vm = Vm::with_console(assembly.program, VmConfig::default(), BufferedConsole::new())
            .unwrap();
        Debugger::new(vm, assembly.symbols)
    }

    const COUNT_TO_THREE: &str = r#"
        start:
            li $t0, 0
        loop:
            addi $t0, $t0, 1
            blt $t0, $t1, loop
        done:
            nop
    "#;

    #[test]
    fn run_stops_at_breakpoint() {
        let mut dbg = debugger(COUNT_TO_THREE);
        dbg.vm_mut().set_register(Register::T1, 3);
        dbg.break_at_label("done").unwrap();

        let result = dbg.continue_run().unwrap();
        let done = dbg.symbols().address_of("done").unwrap();
        assert_eq!(result.halt_reason, HaltReason::Breakpoint(done));
        assert_eq!(dbg.pc(), done);
        assert_eq!(dbg.register(Register::T0), 3);
        assert_eq!(dbg.current_label(), Some("done"));
    }

    #[test]
    fn continue_steps_over_current_breakpoint() {
        let mut dbg = debugger(COUNT_TO_THREE);
        dbg.vm_mut().set_register(Register::T1, 3);
        dbg.break_at_label("loop").unwrap();

        // First stop at loop, then each continue executes one full
        // iteration back to loop.
        dbg.continue_run().unwrap();
        assert_eq!(dbg.register(Register::T0), 0);
        dbg.continue_run().unwrap();
        assert_eq!(dbg.register(Register::T0), 1);
        dbg.continue_run().unwrap();
        assert_eq!(dbg.register(Register::T0), 2);

        // Final continue: the loop exits and the program completes.
        let result = dbg.continue_run().unwrap();
        assert_eq!(result.halt_reason, HaltReason::Completed);
        assert_eq!(dbg.register(Register::T0), 3);
    }

    #[test]
    fn step_over_breakpoint_keeps_it_armed() {
        let mut dbg = debugger(COUNT_TO_THREE);
        dbg.vm_mut().set_register(Register::T1, 2);
        let start = dbg.symbols().address_of("start").unwrap();
        dbg.add_breakpoint(start).unwrap();

        dbg.step().unwrap();
        assert_eq!(dbg.register(Register::T0), 0);

        // The trap word is back in place underneath.
        assert_eq!(dbg.vm().read_word(start).unwrap(), BREAK_WORD);
        // But reads through the debugger see the real instruction.
        assert_ne!(dbg.read_word(start).unwrap(), BREAK_WORD);
    }

    #[test]
    fn duplicate_and_missing_breakpoints_rejected() {
        let mut dbg = debugger(COUNT_TO_THREE);
        dbg.add_breakpoint(0).unwrap();
        assert!(matches!(
            dbg.add_breakpoint(0),
            Err(RuntimeError::BreakpointExists { address: 0 })
        ));
        assert!(matches!(
            dbg.remove_breakpoint(4),
            Err(RuntimeError::NoBreakpoint { address: 4 })
        ));
        assert!(matches!(
            dbg.break_at_label("nowhere"),
            Err(RuntimeError::UnknownLabel(_))
        ));
    }

    #[test]
    fn into_vm_unpatches_text() {
        let mut dbg = debugger(COUNT_TO_THREE);
        let original = dbg.read_word(4).unwrap();
        dbg.add_breakpoint(4).unwrap();

        let vm = dbg.into_vm().unwrap();
        assert_eq!(vm.read_word(4).unwrap(), original);
    }
}
