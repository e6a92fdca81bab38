//! Bit-level layout of the 32-bit instruction word.
//!
//! All field placement is done with explicit shifts and masks so the layout
//! is visible at the point of use:
//!
//! ```text
//!  31      26 25     21 20     16 15     11 10           0
//! +----------+---------+---------+---------+--------------+
//! | opcode   |  reg0   |  reg1   |  reg2   |              |
//! +----------+---------+---------+---------+--------------+
//!            |         26-bit absolute address            |
//!            +---------+---------+------------------------+
//!                                | 16-bit immediate/offset |
//!                                +-------------------------+
//! ```
//!
//! The low 26 bits are reinterpreted per opcode: three 5-bit register
//! slots packed most-significant-first, a 16-bit immediate or signed
//! offset in bits 15:0, or a 26-bit absolute address. Register slots 0
//! and 1 never overlap the 16-bit field; the 26-bit address is only
//! used by register-free formats.

/// Shift of the opcode field.
pub const OPCODE_SHIFT: u32 = 26;
/// Mask of the opcode field, after shifting.
pub const OPCODE_MASK: u32 = 0x3F;

/// Shift of register slot 0.
pub const REG0_SHIFT: u32 = 21;
/// Shift of register slot 1.
pub const REG1_SHIFT: u32 = 16;
/// Shift of register slot 2.
pub const REG2_SHIFT: u32 = 11;
/// Mask of any register field, after shifting.
pub const REGISTER_MASK: u32 = 0x1F;

/// Mask of the 16-bit immediate/offset field (bits 15:0).
pub const IMMEDIATE_MASK: u32 = 0xFFFF;

/// Mask of the 26-bit absolute address field (bits 25:0).
pub const ADDRESS_MASK: u32 = 0x03FF_FFFF;

/// Largest value representable in the absolute address field.
pub const MAX_ABSOLUTE_ADDRESS: u32 = ADDRESS_MASK;

/// Word reserved as a debugger breakpoint marker. Its opcode field (0x3F)
/// is never assigned, so it can never collide with a legal instruction.
pub const BREAK_WORD: u32 = 0xFFFF_FFFF;

/// Extract the 6-bit opcode field.
pub const fn extract_opcode(word: u32) -> u8 {
    ((word >> OPCODE_SHIFT) & OPCODE_MASK) as u8
}

/// Extract register slot 0 (bits 25:21).
pub const fn extract_reg0(word: u32) -> u8 {
    ((word >> REG0_SHIFT) & REGISTER_MASK) as u8
}

/// Extract register slot 1 (bits 20:16).
pub const fn extract_reg1(word: u32) -> u8 {
    ((word >> REG1_SHIFT) & REGISTER_MASK) as u8
}

/// Extract register slot 2 (bits 15:11).
pub const fn extract_reg2(word: u32) -> u8 {
    ((word >> REG2_SHIFT) & REGISTER_MASK) as u8
}

/// Extract the 16-bit immediate field, zero-extended.
pub const fn extract_immediate(word: u32) -> u32 {
    word & IMMEDIATE_MASK
}

/// Extract the 16-bit immediate field, sign-extended.
pub const fn extract_signed_immediate(word: u32) -> i32 {
    (word & IMMEDIATE_MASK) as u16 as i16 as i32
}

/// Extract the 26-bit absolute address field.
pub const fn extract_address(word: u32) -> u32 {
    word & ADDRESS_MASK
}

/// Place a 6-bit opcode value.
pub const fn encode_opcode(opcode: u8) -> u32 {
    ((opcode as u32) & OPCODE_MASK) << OPCODE_SHIFT
}

/// Place a register index into slot 0.
pub const fn encode_reg0(index: u8) -> u32 {
    ((index as u32) & REGISTER_MASK) << REG0_SHIFT
}

/// Place a register index into slot 1.
pub const fn encode_reg1(index: u8) -> u32 {
    ((index as u32) & REGISTER_MASK) << REG1_SHIFT
}

/// Place a register index into slot 2.
pub const fn encode_reg2(index: u8) -> u32 {
    ((index as u32) & REGISTER_MASK) << REG2_SHIFT
}

/// Place a 16-bit immediate value (already range-checked by the caller).
pub const fn encode_immediate(value: u32) -> u32 {
    value & IMMEDIATE_MASK
}

/// Place a 26-bit absolute address (already range-checked by the caller).
pub const fn encode_address(address: u32) -> u32 {
    address & ADDRESS_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_do_not_overlap_registers() {
        let word = encode_opcode(0x13) | encode_reg0(31) | encode_reg1(17) | encode_reg2(5);
        assert_eq!(extract_opcode(word), 0x13);
        assert_eq!(extract_reg0(word), 31);
        assert_eq!(extract_reg1(word), 17);
        assert_eq!(extract_reg2(word), 5);
    }

    #[test]
    fn immediate_sign_extension() {
        assert_eq!(extract_signed_immediate(0x0000_7FFF), 32767);
        assert_eq!(extract_signed_immediate(0x0000_8000), -32768);
        assert_eq!(extract_signed_immediate(0x0000_FFFF), -1);
        assert_eq!(extract_immediate(0x0000_FFFF), 0xFFFF);
    }

    #[test]
    fn address_field_width() {
        let word = encode_opcode(0x02) | encode_address(MAX_ABSOLUTE_ADDRESS);
        assert_eq!(extract_address(word), MAX_ABSOLUTE_ADDRESS);
        assert_eq!(extract_opcode(word), 0x02);
    }

    #[test]
    fn break_word_opcode_is_reserved() {
        assert_eq!(extract_opcode(BREAK_WORD), 0x3F);
    }
}
