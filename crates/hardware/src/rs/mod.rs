//! Reservation stations (§4.2): per-unit queues of instructions waiting
//! on their operands, snooped by the shared result bus every cycle.
//!
//! Every unit but Packet-Send may issue any ready entry out of order; the
//! Packet-Send RS is the one exception (§4.2, §7 "packet ordering"): only
//! the entry at queue position 0 may issue, preserving program order on
//! the wire even though every other unit is free to reorder. This crate
//! models that with one generic [`ReservationStation`] parameterized by
//! an `in_order` flag rather than two separate types, since the queueing
//! and snoop logic is otherwise identical.

use crate::common::tag::{Tag, TaggedSource};
use crate::common::DesignFault;

/// One instruction waiting in a reservation station: up to two data
/// operands, an optional predicate operand, the pre-execution value of
/// the destination register (so a predicate-false write can pass it
/// through unchanged), an optional destination tag (predicate-only
/// instructions like branches write no register), and a unit-specific
/// payload (opcode, immediate, packet fields, whatever the calling unit
/// needs once the entry issues).
#[derive(Debug, Clone)]
pub struct ResolvingEntry<T> {
    /// First source operand.
    pub src1: TaggedSource,
    /// Second source operand.
    pub src2: TaggedSource,
    /// Predicate operand gating issue, if this instruction is predicated.
    pub predicate: Option<TaggedSource>,
    /// Pre-execution value of the destination register, read at dispatch
    /// time. Only consulted when `predicate` resolves `false`.
    pub old: TaggedSource,
    /// Destination tag this instruction will complete, if it writes one.
    pub dest: Option<Tag>,
    /// Unit-specific payload, opaque to the reservation station itself.
    pub payload: T,
}

impl<T> ResolvingEntry<T> {
    /// The §3.2 issue condition: `(operands resolved ∧ predicate resolved
    /// ∧ predicate = true) ∨ (old resolved ∧ predicate resolved ∧
    /// predicate = false)`. An unpredicated entry reduces to the first
    /// branch with no predicate term.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        let operands_resolved = self.src1.resolved && self.src2.resolved;
        match &self.predicate {
            None => operands_resolved,
            Some(predicate) => {
                if !predicate.resolved {
                    return false;
                }
                if predicate.value != 0 {
                    operands_resolved
                } else {
                    self.old.resolved
                }
            }
        }
    }

    /// Selects the value this entry completes its destination tag with:
    /// `computed` if unpredicated or the predicate resolved `true`, or
    /// the unchanged `old` value if the predicate resolved `false`.
    #[must_use]
    pub fn resolved_value(&self, computed: u64) -> u64 {
        match &self.predicate {
            Some(predicate) if predicate.value == 0 => self.old.value,
            _ => computed,
        }
    }

    /// Resolves any unresolved operand matching `produced` against the
    /// result bus this cycle.
    pub fn snoop(&mut self, produced: Tag, value: u64) {
        self.src1.snoop(produced, value);
        self.src2.snoop(produced, value);
        self.old.snoop(produced, value);
        if let Some(predicate) = &mut self.predicate {
            predicate.snoop(produced, value);
        }
    }
}

/// A fixed-capacity queue of [`ResolvingEntry`] values for one execution
/// or packet unit.
#[derive(Debug, Clone)]
pub struct ReservationStation<T> {
    entries: Vec<Option<ResolvingEntry<T>>>,
    in_order: bool,
}

impl<T> ReservationStation<T> {
    /// Creates an empty station with `capacity` slots.
    ///
    /// `in_order` should be `true` only for the Packet-Send RS; every
    /// other unit issues any ready entry regardless of queue position.
    #[must_use]
    pub fn new(capacity: usize, in_order: bool) -> Self {
        Self {
            entries: (0..capacity).map(|_| None).collect(),
            in_order,
        }
    }

    /// Inserts `entry` into the first free slot.
    ///
    /// # Errors
    ///
    /// Returns [`DesignFault::NoFreeSlots`] if every slot is occupied.
    pub fn insert(&mut self, entry: ResolvingEntry<T>) -> Result<(), DesignFault> {
        let slot = self
            .entries
            .iter_mut()
            .find(|slot| slot.is_none())
            .ok_or(DesignFault::NoFreeSlots)?;
        *slot = Some(entry);
        Ok(())
    }

    /// Resolves any entry's operand matching `produced` (§4.2's
    /// every-station-snoops-every-cycle result bus rule).
    pub fn snoop(&mut self, produced: Tag, value: u64) {
        for entry in self.entries.iter_mut().flatten() {
            entry.snoop(produced, value);
        }
    }

    /// Selects the slot that may issue this cycle, if any.
    ///
    /// Out-of-order stations return the lowest-indexed ready entry, an
    /// arbitrary but deterministic tiebreak among several ready entries;
    /// the in-order Packet-Send station returns slot 0 only if it is both
    /// occupied and ready.
    #[must_use]
    pub fn select_issue(&self) -> Option<usize> {
        if self.in_order {
            return self
                .entries
                .first()
                .and_then(Option::as_ref)
                .filter(|entry| entry.is_ready())
                .map(|_| 0);
        }
        self.entries
            .iter()
            .enumerate()
            .find_map(|(slot, entry)| entry.as_ref().filter(|e| e.is_ready()).map(|_| slot))
    }

    /// Removes and returns the entry at `slot`, compacting the in-order
    /// queue so position 0 is always the oldest remaining entry.
    pub fn take(&mut self, slot: usize) -> Option<ResolvingEntry<T>> {
        let taken = self.entries.get_mut(slot)?.take();
        if self.in_order {
            for i in slot..self.entries.len() - 1 {
                self.entries.swap(i, i + 1);
            }
        }
        taken
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Whether no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of free slots.
    #[must_use]
    pub fn free_slots(&self) -> usize {
        self.entries.len() - self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::tag::RegKind;

    fn resolved_entry(value: u64) -> ResolvingEntry<u32> {
        ResolvingEntry {
            src1: TaggedSource::resolved(RegKind::D, 1, value),
            src2: TaggedSource::resolved(RegKind::D, 2, 0),
            predicate: None,
            old: TaggedSource::resolved(RegKind::D, 3, 0),
            dest: None,
            payload: 0,
        }
    }

    fn pending_entry(tag: Tag) -> ResolvingEntry<u32> {
        ResolvingEntry {
            src1: TaggedSource::pending(RegKind::D, 1, tag),
            src2: TaggedSource::resolved(RegKind::D, 2, 0),
            predicate: None,
            old: TaggedSource::resolved(RegKind::D, 3, 0),
            dest: None,
            payload: 0,
        }
    }

    #[test]
    fn out_of_order_station_issues_any_ready_slot() {
        let mut rs: ReservationStation<u32> = ReservationStation::new(4, false);
        let tag = Tag::new(RegKind::D, 1, 0, 3);
        rs.insert(pending_entry(tag)).unwrap();
        rs.insert(resolved_entry(5)).unwrap();

        assert_eq!(rs.select_issue(), Some(1));
        rs.snoop(tag, 42);
        assert_eq!(rs.select_issue(), Some(0));
    }

    #[test]
    fn in_order_station_only_issues_slot_zero() {
        let mut rs: ReservationStation<u32> = ReservationStation::new(4, true);
        let tag = Tag::new(RegKind::D, 1, 0, 3);
        rs.insert(pending_entry(tag)).unwrap();
        rs.insert(resolved_entry(5)).unwrap();

        assert_eq!(rs.select_issue(), None);
        rs.snoop(tag, 1);
        assert_eq!(rs.select_issue(), Some(0));
    }

    #[test]
    fn in_order_take_compacts_queue() {
        let mut rs: ReservationStation<u32> = ReservationStation::new(3, true);
        rs.insert(resolved_entry(1)).unwrap();
        rs.insert(resolved_entry(2)).unwrap();
        rs.take(0);
        assert_eq!(rs.select_issue(), Some(0));
        assert_eq!(rs.len(), 1);
    }

    #[test]
    fn full_station_rejects_insert() {
        let mut rs: ReservationStation<u32> = ReservationStation::new(1, false);
        rs.insert(resolved_entry(1)).unwrap();
        let err = rs.insert(resolved_entry(2)).unwrap_err();
        assert_eq!(err, DesignFault::NoFreeSlots);
    }

    #[test]
    fn predicate_true_needs_only_operands_resolved() {
        let mut entry = resolved_entry(5);
        entry.predicate = Some(TaggedSource::resolved(RegKind::P, 0, 1));
        entry.old = TaggedSource::pending(RegKind::D, 3, Tag::new(RegKind::D, 3, 0, 1));
        assert!(entry.is_ready());
        assert_eq!(entry.resolved_value(99), 99);
    }

    #[test]
    fn predicate_false_needs_old_resolved_not_operands() {
        let old_tag = Tag::new(RegKind::D, 3, 0, 1);
        let mut entry = pending_entry(Tag::new(RegKind::D, 1, 0, 2));
        entry.predicate = Some(TaggedSource::resolved(RegKind::P, 0, 0));
        entry.old = TaggedSource::pending(RegKind::D, 3, old_tag);
        assert!(!entry.is_ready(), "old has not resolved yet");

        entry.snoop(old_tag, 7);
        assert!(entry.is_ready(), "operands may still be unresolved");
        assert_eq!(entry.resolved_value(99), 7, "predicate-false passes old through");
    }

    #[test]
    fn unresolved_predicate_blocks_issue_regardless_of_value() {
        let mut entry = resolved_entry(5);
        let predicate_tag = Tag::new(RegKind::P, 0, 0, 1);
        entry.predicate = Some(TaggedSource::pending(RegKind::P, 0, predicate_tag));
        assert!(!entry.is_ready());
    }
}
