//! Lexer for KASM assembly source.

use logos::Logos;

fn unescape(raw: &str) -> String {
    // Strip the surrounding quotes, then process escapes.
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Tokens for KASM assembly
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")] // Skip whitespace (not newlines)
#[logos(skip r"#[^\n]*")] // Skip comments
pub enum Token {
    /// Identifier (instruction mnemonics, labels)
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    /// Register ($zero, $t0, $31, ...)
    #[regex(r"\$[a-zA-Z0-9]+", |lex| lex.slice()[1..].to_string())]
    Register(String),

    /// Decimal number
    #[regex(r"-?[0-9]+", |lex| lex.slice().parse().ok())]
    Number(i64),

    /// Hexadecimal number
    #[regex(r"0x[0-9a-fA-F]+", |lex| i64::from_str_radix(&lex.slice()[2..], 16).ok())]
    Hex(i64),

    /// Binary number
    #[regex(r"0b[01]+", |lex| i64::from_str_radix(&lex.slice()[2..], 2).ok())]
    Binary(i64),

    /// String literal with C-style escapes
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unescape(lex.slice()))]
    Str(String),

    /// Directive (.text, .data, .word, etc.)
    #[regex(r"\.[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Directive(String),

    /// Comma
    #[token(",")]
    Comma,

    /// Colon (for labels)
    #[token(":")]
    Colon,

    /// Left parenthesis
    #[token("(")]
    LParen,

    /// Right parenthesis
    #[token(")")]
    RParen,

    /// Newline
    #[regex(r"\n")]
    Newline,
}
