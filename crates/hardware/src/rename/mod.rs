//! Rename & Dispatch (§4.1, §6.1): turns one VLIW bundle's decoded slots
//! into reservation-station entries, allocating destination tags and
//! reading current operand state (resolved value or pending tag) from
//! the register file.
//!
//! Per §4.1 step 1, register index 0 of any bank reads as the hard-wired
//! constant rather than going through allocation/read at all — that is
//! handled inside [`crate::regfile::RegisterFile::read`] itself, so
//! dispatch here never special-cases it.

use crate::common::tag::{RegKind, TaggedSource};
use crate::common::DesignFault;
use crate::regfile::RegisterFile;
use crate::rs::ResolvingEntry;
use crate::units::{AluMode, AluPredicateMode};

/// Which execution or packet unit a decoded slot targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOp {
    /// Full ALU, a given arithmetic/logic mode.
    Alu(AluMode),
    /// ALU-Predicate, a given comparison mode.
    AluPredicate(AluPredicateMode),
    /// Data-memory access; `is_store` distinguishes a write from a read.
    Memory {
        /// Whether this access writes memory (`true`) or reads it.
        is_store: bool,
    },
    /// Emits an outgoing packet (the in-order Packet-Send unit).
    PacketSend,
    /// Accepts an incoming packet (the Packet-Receive unit).
    PacketRecv,
}

/// A register operand specifier: which bank and index to read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegSpec {
    /// Register bank.
    pub kind: RegKind,
    /// Index within that bank.
    pub index: u32,
}

/// One decoded VLIW slot (§6.1): the unit it targets, its operand
/// specifiers, and an optional immediate substituting for an operand
/// with no register specifier.
#[derive(Debug, Clone, Copy)]
pub struct VliwSlot {
    /// Target unit.
    pub unit: UnitOp,
    /// First source operand register, if any (`None` uses `immediate`).
    pub src1: Option<RegSpec>,
    /// Second source operand register, if any (`None` uses `immediate`).
    pub src2: Option<RegSpec>,
    /// Predicate register gating issue, if this slot is predicated.
    pub predicate: Option<RegSpec>,
    /// Destination register, if this slot writes one.
    pub dest: Option<RegSpec>,
    /// Immediate value substituted for a missing `src1`/`src2` register.
    pub immediate: u64,
}

/// Rename & Dispatch: the stateless step from one [`VliwSlot`] to a
/// reservation-station-ready [`ResolvingEntry`].
#[derive(Debug, Default)]
pub struct RenameUnit;

impl RenameUnit {
    /// Creates the (stateless) rename unit.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Reads `slot`'s operands from `regs`, allocates its destination
    /// tag if it writes one, and returns the resulting entry ready to
    /// insert into the appropriate reservation station.
    ///
    /// # Errors
    ///
    /// Propagates [`DesignFault::TagStillPending`] if `slot.dest` names a
    /// register whose previous write has not yet completed.
    pub fn dispatch(
        &self,
        slot: &VliwSlot,
        regs: &mut RegisterFile,
    ) -> Result<ResolvingEntry<UnitOp>, DesignFault> {
        let src1 = Self::read_operand(slot.src1, slot.immediate, regs);
        let src2 = Self::read_operand(slot.src2, slot.immediate, regs);
        let predicate = slot
            .predicate
            .map(|spec| regs.read(spec.kind, spec.index));
        // Read the destination's pre-execution value before allocating its
        // new tag, so a predicate-false issue can pass it through unchanged.
        let old = match slot.dest {
            Some(spec) => regs.read(spec.kind, spec.index),
            None => TaggedSource::resolved(RegKind::D, 0, 0),
        };
        let dest = slot
            .dest
            .map(|spec| regs.allocate(spec.kind, spec.index))
            .transpose()?;

        Ok(ResolvingEntry {
            src1,
            src2,
            predicate,
            old,
            dest,
            payload: slot.unit,
        })
    }

    fn read_operand(spec: Option<RegSpec>, immediate: u64, regs: &RegisterFile) -> TaggedSource {
        match spec {
            Some(spec) => regs.read(spec.kind, spec.index),
            None => TaggedSource::resolved(RegKind::D, 0, immediate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegisterConfig;

    #[test]
    fn dispatch_allocates_destination_tag() {
        let mut regs = RegisterFile::new(&RegisterConfig::default());
        let rename = RenameUnit::new();
        let slot = VliwSlot {
            unit: UnitOp::Alu(AluMode::Add),
            src1: Some(RegSpec { kind: RegKind::D, index: 1 }),
            src2: None,
            predicate: None,
            dest: Some(RegSpec { kind: RegKind::D, index: 2 }),
            immediate: 7,
        };
        let entry = rename.dispatch(&slot, &mut regs).unwrap();
        assert!(entry.src1.resolved);
        assert_eq!(entry.src2.value, 7);
        assert!(entry.dest.is_some());
    }

    #[test]
    fn dispatch_reads_pending_operand_unresolved() {
        let mut regs = RegisterFile::new(&RegisterConfig::default());
        let tag = regs.allocate(RegKind::D, 3).unwrap();
        let rename = RenameUnit::new();
        let slot = VliwSlot {
            unit: UnitOp::Alu(AluMode::Add),
            src1: Some(RegSpec { kind: RegKind::D, index: 3 }),
            src2: None,
            predicate: None,
            dest: None,
            immediate: 0,
        };
        let entry = rename.dispatch(&slot, &mut regs).unwrap();
        assert!(!entry.src1.resolved);
        assert_eq!(entry.src1.tag, tag);
    }

    #[test]
    fn dispatch_propagates_tag_still_pending() {
        let mut regs = RegisterFile::new(&RegisterConfig::default());
        // Saturate every outstanding tag slot for D-register 3 (tag width
        // 3 bits, 8 values) so the next allocate has nowhere to go.
        for _ in 0..8 {
            let _ = regs.allocate(RegKind::D, 3).unwrap();
        }
        let rename = RenameUnit::new();
        let slot = VliwSlot {
            unit: UnitOp::Alu(AluMode::Add),
            src1: None,
            src2: None,
            predicate: None,
            dest: Some(RegSpec { kind: RegKind::D, index: 3 }),
            immediate: 0,
        };
        let err = rename.dispatch(&slot, &mut regs).unwrap_err();
        assert!(matches!(err, DesignFault::TagStillPending(_)));
    }
}
