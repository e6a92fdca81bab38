//! Assembly parser: token stream to statements.
//!
//! Operand reading is driven by the opcode's operand-format descriptor, so
//! the parser never hard-codes per-instruction shapes. A parsed instruction
//! whose address operand is a label carries the label name alongside an
//! instruction word with a zeroed address field; the assembler patches the
//! field once the label's location is known.

use logos::Logos;

use kasm_spec::{AddressMode, Instruction, Opcode, Register};

use crate::error::{AssemblerError, Result};
use crate::lexer::Token;

/// A parsed instruction, possibly awaiting label resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInstruction {
    /// The instruction with any label-dependent field left at zero.
    pub instruction: Instruction,
    /// Pending label for the address field, if the operand was symbolic.
    pub label: Option<String>,
}

/// One line's worth of assembly meaning.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// Label definition (`name:`).
    Label(String),
    Instruction(ParsedInstruction),
    /// `.text`: subsequent output goes to the text segment.
    SetText,
    /// `.data`: subsequent output goes to the data segment.
    SetData,
    /// `.word n`: emit a 4-aligned little-endian word.
    Word(i64),
    /// `.byte n`: emit a single byte.
    Byte(i64),
    /// `.space n`: emit n zero bytes.
    Space(u32),
    /// `.align p`: pad to a 2^p boundary.
    Align(u32),
    /// `.asciiz "s"`: emit the string bytes plus a null terminator.
    Asciiz(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub line: usize,
}

/// Parse a full source file into statements.
pub fn parse(source: &str) -> Result<Vec<Statement>> {
    let mut statements = Vec::new();
    let mut line = 1usize;
    let mut current: Vec<Token> = Vec::new();

    let mut lexer = Token::lexer(source);
    while let Some(token) = lexer.next() {
        match token {
            Ok(Token::Newline) => {
                parse_line(&current, line, &mut statements)?;
                current.clear();
                line += 1;
            }
            Ok(token) => current.push(token),
            Err(()) => {
                return Err(AssemblerError::SyntaxError {
                    line,
                    message: format!("Unrecognized input: {:?}", lexer.slice()),
                });
            }
        }
    }
    parse_line(&current, line, &mut statements)?;

    Ok(statements)
}

/// Parse a single instruction from assembly text (no labels or directives).
pub fn parse_instruction(text: &str) -> Result<Instruction> {
    let statements = parse(text)?;
    match statements.as_slice() {
        [Statement {
            kind: StatementKind::Instruction(parsed),
            ..
        }] => {
            if let Some(label) = &parsed.label {
                return Err(AssemblerError::UnresolvedLabel(label.clone()));
            }
            Ok(parsed.instruction)
        }
        _ => Err(AssemblerError::SyntaxError {
            line: 1,
            message: "Expected exactly one instruction".to_string(),
        }),
    }
}

/// Parse a register name (without the `$` sigil).
pub fn parse_register(name: &str) -> Result<Register> {
    Register::from_name(name).ok_or_else(|| AssemblerError::InvalidRegister(name.to_string()))
}

fn parse_line(tokens: &[Token], line: usize, out: &mut Vec<Statement>) -> Result<()> {
    let mut cursor = Cursor {
        tokens,
        pos: 0,
        line,
    };

    // Leading label definitions: `name: name2: instr`
    while let (Some(Token::Identifier(name)), Some(Token::Colon)) =
        (cursor.peek(), cursor.peek_at(1))
    {
        let name = name.clone();
        cursor.advance(2);
        out.push(Statement {
            kind: StatementKind::Label(name),
            line,
        });
    }

    match cursor.peek() {
        None => Ok(()),
        Some(Token::Directive(name)) => {
            let name = name.clone();
            cursor.advance(1);
            let kind = parse_directive(&name, &mut cursor)?;
            cursor.expect_end()?;
            out.push(Statement { kind, line });
            Ok(())
        }
        Some(Token::Identifier(mnemonic)) => {
            let mnemonic = mnemonic.clone();
            cursor.advance(1);
            let parsed = parse_operands(&mnemonic, &mut cursor)?;
            cursor.expect_end()?;
            out.push(Statement {
                kind: StatementKind::Instruction(parsed),
                line,
            });
            Ok(())
        }
        Some(other) => Err(AssemblerError::SyntaxError {
            line,
            message: format!("Unexpected token: {other:?}"),
        }),
    }
}

fn parse_directive(name: &str, cursor: &mut Cursor<'_>) -> Result<StatementKind> {
    match name {
        "text" => Ok(StatementKind::SetText),
        "data" => Ok(StatementKind::SetData),
        "word" => Ok(StatementKind::Word(cursor.expect_number()?)),
        "byte" => Ok(StatementKind::Byte(cursor.expect_number()?)),
        "space" => {
            let n = cursor.expect_number()?;
            let n = u32::try_from(n).map_err(|_| cursor.syntax_error("Negative space size"))?;
            Ok(StatementKind::Space(n))
        }
        "align" => {
            let p = cursor.expect_number()?;
            let p = u32::try_from(p)
                .ok()
                .filter(|&p| p < 32)
                .ok_or_else(|| cursor.syntax_error("Alignment power must be in 0..32"))?;
            Ok(StatementKind::Align(p))
        }
        "asciiz" => Ok(StatementKind::Asciiz(cursor.expect_string()?)),
        other => Err(AssemblerError::InvalidDirective(other.to_string())),
    }
}

/// Read the operands dictated by the mnemonic's operand format and build
/// the instruction.
fn parse_operands(mnemonic: &str, cursor: &mut Cursor<'_>) -> Result<ParsedInstruction> {
    let opcode = Opcode::from_mnemonic(mnemonic)
        .ok_or_else(|| AssemblerError::UnknownInstruction(mnemonic.to_string()))?;
    let format = opcode.format();

    let mut regs = [Register::Zero; 3];
    let mut label = None;
    let mut address_value: i64 = 0;
    let mut immediate: i64 = 0;
    let mut first = true;

    for (slot, flagged) in [format.reg0, format.reg1, format.reg2].into_iter().enumerate() {
        if !flagged {
            continue;
        }
        cursor.separator(&mut first)?;
        regs[slot] = cursor.expect_register()?;
    }

    match format.address {
        Some(AddressMode::DirectAbsolute | AddressMode::DirectOffset) => {
            cursor.separator(&mut first)?;
            match cursor.next() {
                Some(Token::Identifier(name)) => label = Some(name.clone()),
                Some(Token::Number(v)) | Some(Token::Hex(v)) | Some(Token::Binary(v)) => {
                    address_value = *v;
                }
                _ => return Err(cursor.syntax_error("Expected label or address operand")),
            }
        }
        Some(AddressMode::IndirectOffset) => {
            // `offset($base)` with the offset optional.
            cursor.separator(&mut first)?;
            if let Some(Token::Number(v) | Token::Hex(v) | Token::Binary(v)) = cursor.peek() {
                address_value = *v;
                cursor.advance(1);
            }
            cursor.expect(&Token::LParen)?;
            regs[1] = cursor.expect_register()?;
            cursor.expect(&Token::RParen)?;
        }
        None => {}
    }

    if format.immediate.is_some() {
        cursor.separator(&mut first)?;
        immediate = cursor.expect_number()?;
    }

    let instruction = build_instruction(opcode, regs, address_value, immediate, cursor)?;
    Ok(ParsedInstruction { instruction, label })
}

fn build_instruction(
    opcode: Opcode,
    regs: [Register; 3],
    address: i64,
    immediate: i64,
    cursor: &Cursor<'_>,
) -> Result<Instruction> {
    let [r0, r1, r2] = regs;

    let target = || {
        u32::try_from(address).map_err(|_| cursor.syntax_error("Jump target cannot be negative"))
    };
    let offset = || {
        i32::try_from(address).map_err(|_| cursor.syntax_error("Offset out of 32-bit range"))
    };
    let unsigned_imm = || {
        u32::try_from(immediate).map_err(|_| AssemblerError::ImmediateOutOfRange {
            value: immediate,
            bits: 16,
        })
    };
    let signed_imm = || {
        i32::try_from(immediate).map_err(|_| AssemblerError::ImmediateOutOfRange {
            value: immediate,
            bits: 16,
        })
    };

    let instruction = match opcode {
        Opcode::Nop => Instruction::Nop,
        Opcode::Sys => Instruction::Sys,
        Opcode::J => Instruction::J { target: target()? },
        Opcode::Jr => Instruction::Jr { rd: r0 },
        Opcode::Jal => Instruction::Jal { target: target()? },
        Opcode::Jalr => Instruction::Jalr { rd: r0 },
        Opcode::B => Instruction::B { offset: offset()? },
        Opcode::Beq => Instruction::Beq { rd: r0, rs: r1, offset: offset()? },
        Opcode::Bne => Instruction::Bne { rd: r0, rs: r1, offset: offset()? },
        Opcode::Blt => Instruction::Blt { rd: r0, rs: r1, offset: offset()? },
        Opcode::Bgt => Instruction::Bgt { rd: r0, rs: r1, offset: offset()? },
        Opcode::Ble => Instruction::Ble { rd: r0, rs: r1, offset: offset()? },
        Opcode::Bge => Instruction::Bge { rd: r0, rs: r1, offset: offset()? },
        Opcode::Li => Instruction::Li { rd: r0, imm: unsigned_imm()? },
        Opcode::La => Instruction::La { rd: r0, offset: offset()? },
        Opcode::Lw => Instruction::Lw { rd: r0, base: r1, offset: offset()? },
        Opcode::Sw => Instruction::Sw { rd: r0, base: r1, offset: offset()? },
        Opcode::Lb => Instruction::Lb { rd: r0, base: r1, offset: offset()? },
        Opcode::Sb => Instruction::Sb { rd: r0, base: r1, offset: offset()? },
        Opcode::Add => Instruction::Add { rd: r0, rs: r1, rt: r2 },
        Opcode::Addi => Instruction::Addi { rd: r0, rs: r1, imm: signed_imm()? },
        Opcode::Sub => Instruction::Sub { rd: r0, rs: r1, rt: r2 },
        Opcode::Mul => Instruction::Mul { rd: r0, rs: r1, rt: r2 },
        Opcode::Div => Instruction::Div { rd: r0, rs: r1, rt: r2 },
        Opcode::Mod => Instruction::Mod { rd: r0, rs: r1, rt: r2 },
        Opcode::And => Instruction::And { rd: r0, rs: r1, rt: r2 },
        Opcode::Andi => Instruction::Andi { rd: r0, rs: r1, imm: unsigned_imm()? },
        Opcode::Or => Instruction::Or { rd: r0, rs: r1, rt: r2 },
        Opcode::Ori => Instruction::Ori { rd: r0, rs: r1, imm: unsigned_imm()? },
        Opcode::Xor => Instruction::Xor { rd: r0, rs: r1, rt: r2 },
        Opcode::Xori => Instruction::Xori { rd: r0, rs: r1, imm: unsigned_imm()? },
        Opcode::Nor => Instruction::Nor { rd: r0, rs: r1, rt: r2 },
        Opcode::Sll => Instruction::Sll { rd: r0, rs: r1, rt: r2 },
        Opcode::Srl => Instruction::Srl { rd: r0, rs: r1, rt: r2 },
        Opcode::Sra => Instruction::Sra { rd: r0, rs: r1, rt: r2 },
        Opcode::Slt => Instruction::Slt { rd: r0, rs: r1, rt: r2 },
        Opcode::Sltu => Instruction::Sltu { rd: r0, rs: r1, rt: r2 },
    };
    Ok(instruction)
}

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, ahead: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + ahead)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    fn syntax_error(&self, message: &str) -> AssemblerError {
        AssemblerError::SyntaxError {
            line: self.line,
            message: message.to_string(),
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            other => Err(AssemblerError::SyntaxError {
                line: self.line,
                message: format!("Expected {expected:?}, found {other:?}"),
            }),
        }
    }

    /// Consume a comma between operands; the first operand takes none.
    fn separator(&mut self, first: &mut bool) -> Result<()> {
        if *first {
            *first = false;
            Ok(())
        } else {
            self.expect(&Token::Comma)
        }
    }

    fn expect_register(&mut self) -> Result<Register> {
        match self.next() {
            Some(Token::Register(name)) => parse_register(name),
            other => Err(AssemblerError::SyntaxError {
                line: self.line,
                message: format!("Expected register, found {other:?}"),
            }),
        }
    }

    fn expect_number(&mut self) -> Result<i64> {
        match self.next() {
            Some(Token::Number(v) | Token::Hex(v) | Token::Binary(v)) => Ok(*v),
            other => Err(AssemblerError::SyntaxError {
                line: self.line,
                message: format!("Expected number, found {other:?}"),
            }),
        }
    }

    fn expect_string(&mut self) -> Result<String> {
        match self.next() {
            Some(Token::Str(s)) => Ok(s.clone()),
            other => Err(AssemblerError::SyntaxError {
                line: self.line,
                message: format!("Expected string literal, found {other:?}"),
            }),
        }
    }

    fn expect_end(&mut self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(AssemblerError::SyntaxError {
                line: self.line,
                message: format!("Trailing input: {token:?}"),
            }),
        }
    }
}
