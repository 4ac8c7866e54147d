//! 32-bit instruction words
//!
//! ```text
//!  31        23 22        14 13      6 5     0
//! +------------+------------+---------+-------+
//! |     B      |     C      |    A    |  op   |   iABC
//! +------------+------------+---------+-------+
//! |          Bx / sBx       |    A    |  op   |   iABx / iAsBx
//! +-------------------------+---------+-------+
//! ```

use super::Opcode;
use serde::{Deserialize, Serialize};
use std::fmt;

const SIZE_OP: u32 = 6;
const SIZE_A: u32 = 8;
const SIZE_B: u32 = 9;
const SIZE_C: u32 = 9;
const SIZE_BX: u32 = SIZE_B + SIZE_C;

const POS_A: u32 = SIZE_OP;
const POS_C: u32 = POS_A + SIZE_A;
const POS_B: u32 = POS_C + SIZE_C;
const POS_BX: u32 = POS_C;

const MASK_OP: u32 = (1 << SIZE_OP) - 1;

pub const MAX_A: u32 = (1 << SIZE_A) - 1;
pub const MAX_B: u32 = (1 << SIZE_B) - 1;
pub const MAX_C: u32 = (1 << SIZE_C) - 1;
pub const MAX_BX: u32 = (1 << SIZE_BX) - 1;
/// Bias applied to the signed jump operand
pub const MAX_SBX: i32 = (MAX_BX >> 1) as i32;

/// One encoded instruction
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instruction(pub u32);

impl Instruction {
    pub fn abc(op: Opcode, a: u32, b: u32, c: u32) -> Self {
        debug_assert!(a <= MAX_A && b <= MAX_B && c <= MAX_C);
        Instruction(
            (op as u32)
                | ((a & MAX_A) << POS_A)
                | ((c & MAX_C) << POS_C)
                | ((b & MAX_B) << POS_B),
        )
    }

    pub fn abx(op: Opcode, a: u32, bx: u32) -> Self {
        debug_assert!(a <= MAX_A && bx <= MAX_BX);
        Instruction((op as u32) | ((a & MAX_A) << POS_A) | ((bx & MAX_BX) << POS_BX))
    }

    pub fn asbx(op: Opcode, a: u32, sbx: i32) -> Self {
        debug_assert!((-MAX_SBX..=MAX_SBX + 1).contains(&sbx));
        Self::abx(op, a, (sbx + MAX_SBX) as u32)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    /// Decoded opcode, `None` for an unassigned opcode value
    pub fn opcode(self) -> Option<Opcode> {
        Opcode::from_bits((self.0 & MASK_OP) as u8)
    }

    pub fn a(self) -> u32 {
        (self.0 >> POS_A) & MAX_A
    }

    pub fn b(self) -> u32 {
        (self.0 >> POS_B) & MAX_B
    }

    pub fn c(self) -> u32 {
        (self.0 >> POS_C) & MAX_C
    }

    pub fn bx(self) -> u32 {
        (self.0 >> POS_BX) & MAX_BX
    }

    pub fn sbx(self) -> i32 {
        self.bx() as i32 - MAX_SBX
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode() {
            Some(op) => write!(
                f,
                "Instruction({:?} a={} b={} c={})",
                op,
                self.a(),
                self.b(),
                self.c()
            ),
            None => write!(f, "Instruction(0x{:08x})", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_field_layout() {
        let instr = Instruction::abc(Opcode::Call, 2, 1, 3);
        assert_eq!(instr.0 & 0x3f, Opcode::Call as u32);
        assert_eq!((instr.0 >> 6) & 0xff, 2);
        assert_eq!((instr.0 >> 14) & 0x1ff, 3);
        assert_eq!(instr.0 >> 23, 1);
    }

    #[test]
    fn test_negative_jump() {
        let instr = Instruction::asbx(Opcode::Jmp, 0, -4);
        assert_eq!(instr.sbx(), -4);
        assert_eq!(instr.opcode(), Some(Opcode::Jmp));
    }

    #[test]
    fn test_unassigned_opcode() {
        assert_eq!(Instruction(0x3f).opcode(), None);
    }

    proptest! {
        #[test]
        fn prop_abc_fields_independent(a in 0..=MAX_A, b in 0..=MAX_B, c in 0..=MAX_C) {
            let instr = Instruction::abc(Opcode::SetIndex, a, b, c);
            prop_assert_eq!(instr.opcode(), Some(Opcode::SetIndex));
            prop_assert_eq!((instr.a(), instr.b(), instr.c()), (a, b, c));
        }
    }
}
