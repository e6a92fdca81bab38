//! Two-pass assembly driver.
//!
//! Pass one walks the parsed statements, emitting segment bytes and
//! recording a relocation for every label-valued address operand. Pass two
//! patches each relocated word in place once every label's location is
//! known. All bookkeeping lives in the [`Assembler`] value; nothing is
//! ambient.

use kasm_spec::encoding::{encode_address, encode_immediate, MAX_ABSOLUTE_ADDRESS};
use kasm_spec::{AddressMode, Program, SymbolTable, DATA_BASE, INSTRUCTION_SIZE, TEXT_BASE};

use crate::encoder::encode;
use crate::error::{AssemblerError, Result};
use crate::parser::{parse, ParsedInstruction, Statement, StatementKind};

/// Result of assembly: the program image plus the symbol table that can be
/// written to a side file.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub program: Program,
    pub symbols: SymbolTable,
}

/// Assemble source code into a program image.
pub fn assemble(source: &str) -> Result<Program> {
    Ok(assemble_with_symbols(source)?.program)
}

/// Assemble source code, also returning the symbol table.
pub fn assemble_with_symbols(source: &str) -> Result<Assembly> {
    let statements = parse(source)?;
    let mut assembler = Assembler::default();
    for statement in &statements {
        assembler.emit(statement)?;
    }
    assembler.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Text,
    Data,
}

/// A label reference awaiting its target's address.
#[derive(Debug, Clone)]
struct Relocation {
    /// Byte offset of the instruction word within the text segment.
    text_offset: u32,
    label: String,
    mode: AddressMode,
}

struct Assembler {
    text: Vec<u8>,
    data: Vec<u8>,
    segment: Segment,
    symbols: SymbolTable,
    relocations: Vec<Relocation>,
}

impl Default for Assembler {
    fn default() -> Assembler {
        Assembler {
            text: Vec::new(),
            data: Vec::new(),
            segment: Segment::Text,
            symbols: SymbolTable::new(),
            relocations: Vec::new(),
        }
    }
}

impl Assembler {
    /// Address the next emitted byte will occupy.
    fn location(&self) -> u32 {
        match self.segment {
            Segment::Text => TEXT_BASE + self.text.len() as u32,
            Segment::Data => DATA_BASE + self.data.len() as u32,
        }
    }

    fn buffer(&mut self) -> &mut Vec<u8> {
        match self.segment {
            Segment::Text => &mut self.text,
            Segment::Data => &mut self.data,
        }
    }

    fn align(&mut self, alignment: usize) {
        let buffer = self.buffer();
        while buffer.len() % alignment != 0 {
            buffer.push(0);
        }
    }

    fn emit(&mut self, statement: &Statement) -> Result<()> {
        let line = statement.line;
        match &statement.kind {
            StatementKind::SetText => self.segment = Segment::Text,
            StatementKind::SetData => self.segment = Segment::Data,
            StatementKind::Label(name) => {
                let address = self.location();
                if self.symbols.insert(name.clone(), address).is_some() {
                    return Err(AssemblerError::DuplicateLabel(name.clone()));
                }
            }
            StatementKind::Instruction(parsed) => self.emit_instruction(parsed, line)?,
            StatementKind::Word(value) => {
                if *value < i32::MIN as i64 || *value > u32::MAX as i64 {
                    return Err(AssemblerError::ImmediateOutOfRange {
                        value: *value,
                        bits: 32,
                    });
                }
                self.align(4);
                self.buffer().extend_from_slice(&(*value as u32).to_le_bytes());
            }
            StatementKind::Byte(value) => {
                if *value < i8::MIN as i64 || *value > u8::MAX as i64 {
                    return Err(AssemblerError::ImmediateOutOfRange {
                        value: *value,
                        bits: 8,
                    });
                }
                self.buffer().push(*value as u8);
            }
            StatementKind::Space(count) => {
                let count = *count as usize;
                let buffer = self.buffer();
                buffer.resize(buffer.len() + count, 0);
            }
            StatementKind::Align(power) => self.align(1usize << power),
            StatementKind::Asciiz(text) => {
                let buffer = self.buffer();
                buffer.extend_from_slice(text.as_bytes());
                buffer.push(0);
            }
        }
        Ok(())
    }

    fn emit_instruction(&mut self, parsed: &ParsedInstruction, line: usize) -> Result<()> {
        if self.segment != Segment::Text {
            return Err(AssemblerError::InstructionOutsideText { line });
        }
        self.align(INSTRUCTION_SIZE as usize);

        if let Some(label) = &parsed.label {
            let mode = parsed
                .instruction
                .opcode()
                .format()
                .address
                .ok_or_else(|| AssemblerError::SyntaxError {
                    line,
                    message: "Label operand on an instruction without an address field"
                        .to_string(),
                })?;
            self.relocations.push(Relocation {
                text_offset: self.text.len() as u32,
                label: label.clone(),
                mode,
            });
        }

        let word = encode(&parsed.instruction)?;
        self.text.extend_from_slice(&word.to_le_bytes());
        Ok(())
    }

    fn finish(mut self) -> Result<Assembly> {
        // Second pass: patch every deferred label reference.
        for relocation in &self.relocations {
            let target = self
                .symbols
                .address_of(&relocation.label)
                .ok_or_else(|| AssemblerError::UnresolvedLabel(relocation.label.clone()))?;
            let instruction_address = TEXT_BASE + relocation.text_offset;

            let field = match relocation.mode {
                AddressMode::DirectAbsolute => {
                    if target > MAX_ABSOLUTE_ADDRESS {
                        return Err(AssemblerError::AddressOutOfRange(target));
                    }
                    encode_address(target)
                }
                AddressMode::DirectOffset => {
                    let delta = i64::from(target) - i64::from(instruction_address);
                    let delta =
                        i16::try_from(delta).map_err(|_| AssemblerError::OffsetOutOfRange {
                            from: instruction_address,
                            target,
                        })?;
                    encode_immediate(delta as u16 as u32)
                }
                AddressMode::IndirectOffset => {
                    return Err(AssemblerError::UnresolvedLabel(relocation.label.clone()));
                }
            };

            let offset = relocation.text_offset as usize;
            let mut word_bytes = [0u8; 4];
            word_bytes.copy_from_slice(&self.text[offset..offset + 4]);
            let word = u32::from_le_bytes(word_bytes) | field;
            self.text[offset..offset + 4].copy_from_slice(&word.to_le_bytes());
        }

        // Pad text to a whole number of instructions.
        self.segment = Segment::Text;
        self.align(INSTRUCTION_SIZE as usize);

        Ok(Assembly {
            program: Program::new(self.text, self.data),
            symbols: self.symbols,
        })
    }
}
