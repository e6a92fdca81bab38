//! Whole-program disassembly listing.

use std::fmt::Write;

use kasm_spec::{Program, SymbolTable, DATA_BASE, INSTRUCTION_SIZE, TEXT_BASE};

use crate::decoder::decode;
use crate::error::{DisassemblerError, Result};
use crate::formatter::format_at;

/// Disassemble a program's text segment into a listing.
pub fn disassemble(program: &Program) -> Result<String> {
    disassemble_with_symbols(program, &SymbolTable::new())
}

/// Disassemble with symbolic labels interleaved and substituted for
/// branch/jump targets.
pub fn disassemble_with_symbols(program: &Program, symbols: &SymbolTable) -> Result<String> {
    if program.text.len() % INSTRUCTION_SIZE as usize != 0 {
        return Err(DisassemblerError::RaggedTextSegment(program.text.len()));
    }

    let mut out = String::new();
    writeln!(out, "# {} instructions", program.instruction_count()).ok();

    for index in 0..program.instruction_count() {
        let address = TEXT_BASE + (index as u32) * INSTRUCTION_SIZE;
        if let Some(label) = symbols.label_at(address) {
            writeln!(out, "{label}:").ok();
        }

        // text_word is in range for every index below instruction_count.
        let word = match program.text_word(index) {
            Some(word) => word,
            None => break,
        };
        let text = match decode(word) {
            Ok(instruction) => format_at(&instruction, address, symbols),
            Err(_) => format!(".word {word:#010x}"),
        };
        writeln!(out, "    {address:#010x}: {text}").ok();
    }

    if !program.data.is_empty() {
        writeln!(out, "# {} data bytes", program.data.len()).ok();
        let mut offset = 0;
        while offset < program.data.len() {
            let address = DATA_BASE + offset as u32;
            if let Some(label) = symbols.label_at(address) {
                writeln!(out, "{label}:").ok();
            }
            match program.data.get(offset..offset + 4) {
                Some(bytes) => {
                    let mut buf = [0u8; 4];
                    buf.copy_from_slice(bytes);
                    let word = u32::from_le_bytes(buf);
                    writeln!(out, "    {address:#010x}: .word {word:#010x}").ok();
                    offset += 4;
                }
                // Ragged tail, shorter than a word.
                None => {
                    let byte = program.data[offset];
                    writeln!(out, "    {address:#010x}: .byte {byte:#04x}").ok();
                    offset += 1;
                }
            }
        }
    }

    Ok(out)
}
