//! Syscall dispatch and host-service traits.
//!
//! Convention: `$v0` selects the operation, `$a0..$a3` carry arguments,
//! and any result comes back in `$v0`.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use kasm_spec::Register;
use tracing::debug;

use crate::error::{Result, RuntimeError};
use crate::memory::Memory;
use crate::state::{HaltReason, VmState};

/// Syscall ids
pub const SYSCALL_EXIT: u32 = 0;
pub const SYSCALL_READ_INT: u32 = 1;
pub const SYSCALL_WRITE_INT: u32 = 2;
pub const SYSCALL_READ_CHAR: u32 = 3;
pub const SYSCALL_WRITE_CHAR: u32 = 4;
pub const SYSCALL_READ_STRING: u32 = 5;
pub const SYSCALL_WRITE_STRING: u32 = 6;
pub const SYSCALL_ALLOCATE: u32 = 7;
pub const SYSCALL_DEALLOCATE: u32 = 8;

/// Console I/O provider for the READ_*/WRITE_* syscalls.
///
/// Reads may block; the VM is fully synchronous and this is acceptable.
pub trait Console {
    fn read_int(&mut self) -> Result<u32>;
    fn write_int(&mut self, value: u32) -> Result<()>;
    fn read_char(&mut self) -> Result<u8>;
    fn write_char(&mut self, value: u8) -> Result<()>;
    /// Read one line of input, without the trailing newline.
    fn read_line(&mut self) -> Result<String>;
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Console backed by the process's stdin and stdout.
#[derive(Debug, Default)]
pub struct StdConsole;

impl StdConsole {
    fn read_token(&mut self) -> Result<String> {
        // Consume one whitespace-delimited token from stdin.
        let mut token = String::new();
        let stdin = std::io::stdin();
        let mut handle = stdin.lock();
        loop {
            let buf = handle.fill_buf()?;
            if buf.is_empty() {
                break;
            }
            let mut used = 0;
            for &byte in buf {
                used += 1;
                if byte.is_ascii_whitespace() {
                    if !token.is_empty() {
                        break;
                    }
                } else {
                    token.push(byte as char);
                }
            }
            let done = !token.is_empty()
                && buf
                    .get(used - 1)
                    .is_some_and(|b| b.is_ascii_whitespace());
            handle.consume(used);
            if done {
                break;
            }
        }
        Ok(token)
    }
}

impl Console for StdConsole {
    fn read_int(&mut self) -> Result<u32> {
        let token = self.read_token()?;
        let value = token.parse::<i64>().unwrap_or(0);
        Ok(value as u32)
    }

    fn write_int(&mut self, value: u32) -> Result<()> {
        write!(std::io::stdout(), "{value}")?;
        Ok(())
    }

    fn read_char(&mut self) -> Result<u8> {
        let token = self.read_token()?;
        Ok(token.bytes().next().unwrap_or(0))
    }

    fn write_char(&mut self, value: u8) -> Result<()> {
        std::io::stdout().write_all(&[value])?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let mut stdout = std::io::stdout();
        stdout.write_all(bytes)?;
        stdout.flush()?;
        Ok(())
    }
}

/// Scripted console for tests and embedding: reads come from queued
/// values, writes accumulate in a buffer.
#[derive(Debug, Clone, Default)]
pub struct BufferedConsole {
    ints: VecDeque<u32>,
    chars: VecDeque<u8>,
    lines: VecDeque<String>,
    output: Vec<u8>,
}

impl BufferedConsole {
    pub fn new() -> BufferedConsole {
        BufferedConsole::default()
    }

    pub fn push_int(&mut self, value: u32) {
        self.ints.push_back(value);
    }

    pub fn push_char(&mut self, value: u8) {
        self.chars.push_back(value);
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push_back(line.into());
    }

    /// Everything the program has written so far.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl Console for BufferedConsole {
    fn read_int(&mut self) -> Result<u32> {
        Ok(self.ints.pop_front().unwrap_or(0))
    }

    fn write_int(&mut self, value: u32) -> Result<()> {
        self.output.extend_from_slice(value.to_string().as_bytes());
        Ok(())
    }

    fn read_char(&mut self) -> Result<u8> {
        Ok(self.chars.pop_front().unwrap_or(0))
    }

    fn write_char(&mut self, value: u8) -> Result<()> {
        self.output.push(value);
        Ok(())
    }

    fn read_line(&mut self) -> Result<String> {
        Ok(self.lines.pop_front().unwrap_or_default())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.output.extend_from_slice(bytes);
        Ok(())
    }
}

/// Heap backing for the ALLOCATE/DEALLOCATE syscalls.
pub trait HeapAllocator {
    /// Reserve `size` bytes, returning the block's address, or `None` when
    /// the heap is exhausted.
    fn allocate(&mut self, size: u32) -> Option<u32>;
    fn deallocate(&mut self, ptr: u32);
}

/// Bump allocator over the heap region. `deallocate` is accepted and
/// ignored; freed blocks are never reused.
#[derive(Debug, Clone)]
pub struct BumpAllocator {
    next: u32,
    end: u32,
}

impl BumpAllocator {
    pub fn new(base: u32, size: u32) -> BumpAllocator {
        BumpAllocator {
            next: base,
            end: base + size,
        }
    }

    pub fn reset(&mut self, base: u32, size: u32) {
        self.next = base;
        self.end = base + size;
    }
}

impl HeapAllocator for BumpAllocator {
    fn allocate(&mut self, size: u32) -> Option<u32> {
        if size == 0 {
            return None;
        }
        // Keep blocks word-aligned.
        let size = size.checked_add(3)? & !3;
        let ptr = self.next;
        let next = ptr.checked_add(size)?;
        if next > self.end {
            return None;
        }
        self.next = next;
        Some(ptr)
    }

    fn deallocate(&mut self, _ptr: u32) {}
}

/// Dispatch the syscall selected by `$v0`.
pub fn handle_syscall(
    state: &mut VmState,
    memory: &mut Memory,
    console: &mut dyn Console,
    heap: &mut dyn HeapAllocator,
) -> Result<()> {
    let id = state.read_reg(Register::V0);
    let a0 = state.read_reg(Register::A0);
    let a1 = state.read_reg(Register::A1);

    match id {
        SYSCALL_EXIT => {
            debug!(code = a0, "exit syscall");
            state.halt(HaltReason::Exit(a0));
        }

        SYSCALL_READ_INT => {
            let value = console.read_int()?;
            state.write_reg(Register::V0, value);
        }

        SYSCALL_WRITE_INT => console.write_int(a0)?,

        SYSCALL_READ_CHAR => {
            let value = console.read_char()?;
            state.write_reg(Register::V0, value as u32);
        }

        SYSCALL_WRITE_CHAR => console.write_char(a0 as u8)?,

        SYSCALL_READ_STRING => {
            // a0: buffer address, a1: buffer capacity including the null.
            if a1 >= 1 {
                let line = console.read_line()?;
                let max = (a1 - 1) as usize;
                let mut bytes = line.into_bytes();
                bytes.truncate(max);
                bytes.push(0);
                memory.write_bytes(a0, &bytes)?;
            }
        }

        SYSCALL_WRITE_STRING => {
            let bytes = memory.read_cstring(a0)?;
            console.write_bytes(&bytes)?;
        }

        SYSCALL_ALLOCATE => {
            let ptr = heap.allocate(a0).unwrap_or(0);
            state.write_reg(Register::V0, ptr);
        }

        SYSCALL_DEALLOCATE => heap.deallocate(a0),

        id => {
            return Err(RuntimeError::IllegalSyscall {
                pc: state.pc(),
                id,
            })
        }
    }
    Ok(())
}
