//! KASM virtual machine.
//!
//! Executes program images produced by `kasm-assembler`: a fetch-decode-
//! execute loop over a segmented memory model, with console and heap
//! syscalls and a breakpoint debugger layered on top.
//!
//! ```
//! use kasm_assembler::assemble;
//! use kasm_runtime::{BufferedConsole, Vm, VmConfig};
//!
//! let program = assemble("li $v0, 0\nli $a0, 3\nsys").unwrap();
//! let mut vm = Vm::with_console(program, VmConfig::default(), BufferedConsole::new()).unwrap();
//! let result = vm.run().unwrap();
//! assert_eq!(result.exit_code(), Some(3));
//! ```

pub mod debugger;
pub mod error;
pub mod execute;
pub mod memory;
pub mod state;
pub mod syscall;
pub mod vm;

pub use debugger::Debugger;
pub use error::{Result, RuntimeError};
pub use memory::Memory;
pub use state::{HaltReason, VmState};
pub use syscall::{BufferedConsole, BumpAllocator, Console, HeapAllocator, StdConsole};
pub use vm::{ExecutionResult, Vm, VmConfig};
