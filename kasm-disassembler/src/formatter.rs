//! Instruction formatting helpers.

use kasm_spec::{Instruction, SymbolTable};

/// Format an instruction as assembly text.
pub fn format(instruction: &Instruction) -> String {
    instruction.to_string()
}

/// Format an instruction at a known address, substituting symbolic names
/// for branch and jump targets when the symbol table has one.
pub fn format_at(instruction: &Instruction, address: u32, symbols: &SymbolTable) -> String {
    let target = match *instruction {
        Instruction::J { target } | Instruction::Jal { target } => Some(target),
        Instruction::B { offset }
        | Instruction::Beq { offset, .. }
        | Instruction::Bne { offset, .. }
        | Instruction::Blt { offset, .. }
        | Instruction::Bgt { offset, .. }
        | Instruction::Ble { offset, .. }
        | Instruction::Bge { offset, .. }
        | Instruction::La { offset, .. } => Some(address.wrapping_add(offset as u32)),
        _ => None,
    };

    match target.and_then(|t| symbols.label_at(t)) {
        Some(label) => {
            let text = instruction.to_string();
            // Replace the numeric operand (always last) with the label.
            match text.rsplit_once(' ') {
                Some((head, _)) => format!("{head} {label}"),
                None => text,
            }
        }
        None => instruction.to_string(),
    }
}
