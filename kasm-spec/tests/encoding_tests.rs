//! Property tests for the instruction word layout.

use kasm_spec::encoding::{
    encode_address, encode_immediate, encode_opcode, encode_reg0, encode_reg1, encode_reg2,
    extract_address, extract_immediate, extract_opcode, extract_reg0, extract_reg1, extract_reg2,
    extract_signed_immediate, BREAK_WORD,
};
use kasm_spec::{Opcode, Register};
use proptest::prelude::*;

proptest! {
    #[test]
    fn fields_round_trip(opcode in 0u8..0x40, r0 in 0u8..32, r2 in 0u8..32, addr in 0u32..0x0400_0000) {
        let word = encode_opcode(opcode) | encode_reg0(r0) | encode_reg2(r2);
        prop_assert_eq!(extract_opcode(word), opcode);
        prop_assert_eq!(extract_reg0(word), r0);
        prop_assert_eq!(extract_reg2(word), r2);

        let word = encode_opcode(opcode) | encode_address(addr);
        prop_assert_eq!(extract_address(word), addr);
    }

    #[test]
    fn reg1_and_immediate_coexist(r1 in 0u8..32, imm in 0u32..0x1_0000) {
        // Register slot 1 sits above the immediate field; packing both
        // must not corrupt either.
        let word = encode_reg1(r1) | encode_immediate(imm);
        prop_assert_eq!(extract_reg1(word), r1);
        prop_assert_eq!(extract_immediate(word), imm);
    }

    #[test]
    fn signed_immediate_round_trips(value in i16::MIN..=i16::MAX) {
        let word = encode_immediate(value as u16 as u32);
        prop_assert_eq!(extract_signed_immediate(word), value as i32);
    }

    #[test]
    fn opcode_survives_any_operand_bits(operands in 0u32..0x0400_0000) {
        for opcode in Opcode::ALL {
            let word = encode_opcode(opcode.as_u8()) | operands;
            prop_assert_eq!(extract_opcode(word), opcode.as_u8());
        }
    }

    #[test]
    fn no_valid_word_collides_with_break(operands in 0u32..0x0400_0000) {
        for opcode in Opcode::ALL {
            let word = encode_opcode(opcode.as_u8()) | operands;
            prop_assert_ne!(word, BREAK_WORD);
        }
    }

    #[test]
    fn register_indices_fit_every_slot(index in 0u8..32) {
        let reg = Register::from_index(index).unwrap();
        prop_assert_eq!(reg.index(), index);
        prop_assert_eq!(extract_reg0(encode_reg0(index)), index);
        prop_assert_eq!(extract_reg1(encode_reg1(index)), index);
        prop_assert_eq!(extract_reg2(encode_reg2(index)), index);
    }
}
