//! ALU, ALU-Lite, and ALU-Predicate execution units.
//!
//! Per §1, arithmetic semantics beyond what the dispatch pipeline needs to
//! know are a non-goal: each unit is a pure `(mode, src1, src2) -> u64`
//! function, single-cycle, with no internal state. A full opcode table is
//! not specified; the handful of modes below are what the reservation
//! stations and the Witem Monitor's own address arithmetic need.

/// Operating mode for the full ALU and ALU-Lite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluMode {
    /// `src1 + src2`.
    Add,
    /// `src1 - src2`.
    Sub,
    /// `src1 & src2`.
    And,
    /// `src1 | src2`.
    Or,
    /// `src1 ^ src2`.
    Xor,
    /// `src1 << (src2 & 63)`.
    ShiftLeft,
    /// `src1 >> (src2 & 63)` (logical).
    ShiftRight,
}

/// Operating mode for the predicate ALU: produces a single bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluPredicateMode {
    /// `src1 == src2`.
    Equal,
    /// `src1 != src2`.
    NotEqual,
    /// `src1 < src2` (unsigned).
    LessThan,
    /// `src1 >= src2` (unsigned).
    GreaterOrEqual,
}

/// Evaluates the full ALU or ALU-Lite for one `(mode, src1, src2)` triple.
#[must_use]
pub fn alu(mode: AluMode, src1: u64, src2: u64) -> u64 {
    match mode {
        AluMode::Add => src1.wrapping_add(src2),
        AluMode::Sub => src1.wrapping_sub(src2),
        AluMode::And => src1 & src2,
        AluMode::Or => src1 | src2,
        AluMode::Xor => src1 ^ src2,
        AluMode::ShiftLeft => src1.wrapping_shl((src2 & 63) as u32),
        AluMode::ShiftRight => src1.wrapping_shr((src2 & 63) as u32),
    }
}

/// Evaluates the ALU-Predicate unit, producing a single bit (0 or 1).
#[must_use]
pub fn alu_predicate(mode: AluPredicateMode, src1: u64, src2: u64) -> u64 {
    let result = match mode {
        AluPredicateMode::Equal => src1 == src2,
        AluPredicateMode::NotEqual => src1 != src2,
        AluPredicateMode::LessThan => src1 < src2,
        AluPredicateMode::GreaterOrEqual => src1 >= src2,
    };
    u64::from(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_wraps_on_overflow() {
        assert_eq!(alu(AluMode::Add, u64::MAX, 1), 0);
    }

    #[test]
    fn predicate_produces_single_bit() {
        assert_eq!(alu_predicate(AluPredicateMode::Equal, 5, 5), 1);
        assert_eq!(alu_predicate(AluPredicateMode::Equal, 5, 6), 0);
    }
}
