//! Register file definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::KasmError;

/// Number of general-purpose registers.
pub const NUM_REGISTERS: usize = 32;

/// A general-purpose register.
///
/// Register 0 (`$zero`) is hardwired: reads yield zero and writes are
/// discarded by the execution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Register {
    Zero = 0,
    At = 1,
    V0 = 2,
    V1 = 3,
    A0 = 4,
    A1 = 5,
    A2 = 6,
    A3 = 7,
    T0 = 8,
    T1 = 9,
    T2 = 10,
    T3 = 11,
    T4 = 12,
    T5 = 13,
    T6 = 14,
    T7 = 15,
    S0 = 16,
    S1 = 17,
    S2 = 18,
    S3 = 19,
    S4 = 20,
    S5 = 21,
    S6 = 22,
    S7 = 23,
    T8 = 24,
    T9 = 25,
    K0 = 26,
    K1 = 27,
    Gp = 28,
    Sp = 29,
    Fp = 30,
    Ra = 31,
}

impl Register {
    /// All registers in index order.
    pub const ALL: [Register; NUM_REGISTERS] = [
        Register::Zero,
        Register::At,
        Register::V0,
        Register::V1,
        Register::A0,
        Register::A1,
        Register::A2,
        Register::A3,
        Register::T0,
        Register::T1,
        Register::T2,
        Register::T3,
        Register::T4,
        Register::T5,
        Register::T6,
        Register::T7,
        Register::S0,
        Register::S1,
        Register::S2,
        Register::S3,
        Register::S4,
        Register::S5,
        Register::S6,
        Register::S7,
        Register::T8,
        Register::T9,
        Register::K0,
        Register::K1,
        Register::Gp,
        Register::Sp,
        Register::Fp,
        Register::Ra,
    ];

    /// Look up a register by its encoded index.
    pub fn from_index(index: u8) -> Result<Register, KasmError> {
        Register::ALL
            .get(index as usize)
            .copied()
            .ok_or(KasmError::InvalidRegister(index))
    }

    /// The register's encoded index.
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// The canonical assembly name, without the `$` sigil.
    pub const fn name(self) -> &'static str {
        match self {
            Register::Zero => "zero",
            Register::At => "at",
            Register::V0 => "v0",
            Register::V1 => "v1",
            Register::A0 => "a0",
            Register::A1 => "a1",
            Register::A2 => "a2",
            Register::A3 => "a3",
            Register::T0 => "t0",
            Register::T1 => "t1",
            Register::T2 => "t2",
            Register::T3 => "t3",
            Register::T4 => "t4",
            Register::T5 => "t5",
            Register::T6 => "t6",
            Register::T7 => "t7",
            Register::S0 => "s0",
            Register::S1 => "s1",
            Register::S2 => "s2",
            Register::S3 => "s3",
            Register::S4 => "s4",
            Register::S5 => "s5",
            Register::S6 => "s6",
            Register::S7 => "s7",
            Register::T8 => "t8",
            Register::T9 => "t9",
            Register::K0 => "k0",
            Register::K1 => "k1",
            Register::Gp => "gp",
            Register::Sp => "sp",
            Register::Fp => "fp",
            Register::Ra => "ra",
        }
    }

    /// Look up a register by assembly name (without the `$` sigil).
    ///
    /// Accepts both the canonical name and the plain numeric form
    /// (`"8"` for `$t0`).
    pub fn from_name(name: &str) -> Option<Register> {
        if let Some(reg) = Register::ALL.iter().find(|r| r.name() == name) {
            return Some(*reg);
        }
        name.parse::<u8>().ok().and_then(|i| Register::from_index(i).ok())
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trip() {
        for reg in Register::ALL {
            assert_eq!(Register::from_index(reg.index()).unwrap(), reg);
        }
    }

    #[test]
    fn out_of_range_index_rejected() {
        assert!(Register::from_index(32).is_err());
        assert!(Register::from_index(255).is_err());
    }

    #[test]
    fn name_round_trip() {
        for reg in Register::ALL {
            assert_eq!(Register::from_name(reg.name()), Some(reg));
        }
        assert_eq!(Register::from_name("8"), Some(Register::T0));
        assert_eq!(Register::from_name("bogus"), None);
    }

    #[test]
    fn display_uses_sigil() {
        assert_eq!(Register::Sp.to_string(), "$sp");
        assert_eq!(Register::Zero.to_string(), "$zero");
    }
}
