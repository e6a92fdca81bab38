//! # KASM Assembler
//!
//! Assemble KASM assembly language into a binary program image.
//!
//! ## Example
//!
//! ```rust
//! use kasm_assembler::assemble;
//!
//! let source = r#"
//!     li $t0, 5
//!     sys
//! "#;
//!
//! let program = assemble(source).unwrap();
//! assert_eq!(program.instruction_count(), 2);
//! ```

pub mod assembler;
pub mod encoder;
pub mod error;
pub mod lexer;
pub mod parser;

pub use assembler::{assemble, assemble_with_symbols, Assembly};
pub use encoder::encode;
pub use error::{AssemblerError, Result};
pub use parser::{parse_instruction, parse_register};
