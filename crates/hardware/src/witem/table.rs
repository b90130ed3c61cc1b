//! The per-lane witem table (§3.3, §4.3 contract).
//!
//! A fixed-capacity array of [`WitemEntry`]. `priority` is a dense
//! insertion ordering maintained so S1 can always pick the oldest
//! `valid && ready_for_s1` entry in O(capacity) without a separate queue.

use crate::common::DesignFault;
use crate::witem::state::{ReceiveState, SendState};

/// Identifies one witem (equivalently, the instruction identifier carried
/// in `kamletEntryReq`/`kamletEntryResp`, and the fault-sync group id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WitemId(pub u32);

/// The kind of protocol transfer a witem represents.
///
/// Distinguishes whether the transfer is mediated by a peer jamlet (J2J,
/// which always has a receive role) or addresses memory/registers
/// directly (strided/indexed, which may lack one) — see
/// [`WitemKind::has_receive_role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WitemKind {
    /// Jamlet-to-jamlet load: a peer's cache line is read into this
    /// lane's registers.
    LoadJ2J,
    /// Jamlet-to-jamlet store: this lane's registers are written into a
    /// peer's cache line.
    StoreJ2J,
    /// Strided load from memory directly addressed by this lane (no peer
    /// send-side handshake is needed once the address is computed).
    LoadStride,
    /// Strided store to memory directly addressed by this lane.
    StoreStride,
    /// Indexed (gather) load; per-element addresses come from an index
    /// register and may still need destination-side mask application.
    LoadIndexed,
    /// Indexed (scatter) store.
    StoreIndexed,
}

impl WitemKind {
    /// Whether this kind has a genuine receive role, i.e. some other
    /// principal issues a request that this witem's destination side must
    /// answer. Pure memory-addressed strided transfers resolve entirely on
    /// the send side and never populate a receive state machine, so their
    /// `dstState` is seeded `COMPLETE` per §3.3.
    #[must_use]
    pub fn has_receive_role(self) -> bool {
        !matches!(self, WitemKind::LoadStride | WitemKind::StoreStride)
    }
}

/// One entry in the witem table.
#[derive(Debug, Clone)]
pub struct WitemEntry {
    /// Whether this slot holds a live witem.
    pub valid: bool,
    /// The instruction identifier this witem was created for.
    pub instr_ident: WitemId,
    /// The kind of transfer, used to seed the receive-state default.
    pub kind: WitemKind,
    /// Whether the local cache slot backing this transfer is available.
    pub cache_is_avail: bool,
    /// Dense oldest-first ordering for S1 selection.
    pub priority: u32,
    /// False whenever this entry is waiting on any response or sync event
    /// that would resubmit work; only then may S1 pick it.
    pub ready_for_s1: bool,
    /// Whether `faultReady` has already been raised for this witem.
    pub fault_signaled: bool,
    /// Whether `completeReady` has already been raised for this witem.
    pub complete_signaled: bool,
    /// This lane's locally observed minimum fault element index, valid
    /// once every tag has left `SendState::Initial`.
    pub local_min_fault: Option<u32>,
    /// Per-byte-tag `(SendState, ReceiveState)` pairs, one per
    /// `word_bytes` byte of this lane's memory word.
    pub protocol_states: Vec<(SendState, ReceiveState)>,
    /// The tag iteration cursor S11/S12 advance by `n_bytes` each pass.
    pub current_tag: u32,
}

impl WitemEntry {
    fn new(instr_ident: WitemId, kind: WitemKind, cache_is_avail: bool, priority: u32, word_bytes: u32) -> Self {
        let dst_default = if kind.has_receive_role() {
            ReceiveState::WaitingForRequest
        } else {
            ReceiveState::Complete
        };
        Self {
            valid: true,
            instr_ident,
            kind,
            cache_is_avail,
            priority,
            ready_for_s1: cache_is_avail,
            fault_signaled: false,
            complete_signaled: false,
            local_min_fault: None,
            protocol_states: vec![(SendState::Initial, dst_default); word_bytes as usize],
            current_tag: 0,
        }
    }

    /// An entry is complete iff every tag has reached
    /// `srcState=Complete && dstState=Complete` (§3.3).
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.protocol_states
            .iter()
            .all(|(send, recv)| send.is_complete() && recv.is_complete())
    }

    /// Whether every tag has left `SendState::Initial`, the trigger for
    /// raising `faultReady` at the end of S11/S12's first pass (§4.3 Phase 1).
    #[must_use]
    pub fn all_tags_classified(&self) -> bool {
        self.protocol_states
            .iter()
            .all(|(send, _)| *send != SendState::Initial)
    }
}

/// The fixed-capacity, priority-ordered witem table.
#[derive(Debug)]
pub struct WitemTable {
    entries: Vec<Option<WitemEntry>>,
    word_bytes: u32,
    next_priority: u32,
}

impl WitemTable {
    /// Creates an empty table with `capacity` slots, for a lane whose
    /// memory word is `word_bytes` bytes wide.
    #[must_use]
    pub fn new(capacity: usize, word_bytes: u32) -> Self {
        Self {
            entries: vec![None; capacity],
            word_bytes,
            next_priority: 0,
        }
    }

    /// Allocates a new entry.
    ///
    /// # Errors
    ///
    /// Returns [`DesignFault::WitemTableFull`] if no slot is free.
    pub fn create(
        &mut self,
        id: WitemId,
        kind: WitemKind,
        cache_slot: usize,
        cache_avail: bool,
    ) -> Result<(), DesignFault> {
        let slot = self
            .entries
            .get_mut(cache_slot)
            .ok_or(DesignFault::WitemTableFull)?;
        if slot.is_some() {
            return Err(DesignFault::WitemTableFull);
        }
        let priority = self.next_priority;
        self.next_priority += 1;
        *slot = Some(WitemEntry::new(id, kind, cache_avail, priority, self.word_bytes));
        Ok(())
    }

    /// Flips `cache_is_avail` for the entry at `slot` and sets
    /// `ready_for_s1` (§4.3 `witemCacheAvail`).
    pub fn cache_avail(&mut self, slot: usize) {
        if let Some(entry) = self.entries.get_mut(slot).and_then(Option::as_mut) {
            entry.cache_is_avail = true;
            entry.ready_for_s1 = true;
        }
    }

    /// Frees `slot` and compacts every other entry's `priority` so the
    /// dense ordering has no gap (§3.3 `witemRemove`).
    pub fn remove(&mut self, slot: usize) {
        let removed_priority = match self.entries.get(slot).and_then(Option::as_ref) {
            Some(entry) => entry.priority,
            None => return,
        };
        self.entries[slot] = None;
        for entry in self.entries.iter_mut().flatten() {
            if entry.priority > removed_priority {
                entry.priority -= 1;
            }
        }
        self.next_priority -= 1;
    }

    /// Returns the slot index of the oldest `valid && ready_for_s1` entry,
    /// the S1 selection rule.
    #[must_use]
    pub fn select_oldest_ready(&self) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| entry.as_ref().map(|e| (slot, e)))
            .filter(|(_, entry)| entry.ready_for_s1)
            .min_by_key(|(_, entry)| entry.priority)
            .map(|(slot, _)| slot)
    }

    /// Immutable access to the entry at `slot`, if occupied.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&WitemEntry> {
        self.entries.get(slot).and_then(Option::as_ref)
    }

    /// Mutable access to the entry at `slot`, if occupied.
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut WitemEntry> {
        self.entries.get_mut(slot).and_then(Option::as_mut)
    }

    /// Finds the slot holding the entry created for `id`, if any — the
    /// receive handlers key incoming requests/responses by id, not slot
    /// (§4.5).
    #[must_use]
    pub fn find_by_id(&self, id: WitemId) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .find_map(|(slot, entry)| entry.as_ref().filter(|e| e.instr_ident == id).map(|_| slot))
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

    /// Iterates over occupied `(slot, entry)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &WitemEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| entry.as_ref().map(|e| (slot, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_seeds_receive_state_by_kind() {
        let mut table = WitemTable::new(4, 8);
        table.create(WitemId(1), WitemKind::StoreStride, 0, true).unwrap();
        let entry = table.get(0).unwrap();
        assert!(entry
            .protocol_states
            .iter()
            .all(|(_, recv)| *recv == ReceiveState::Complete));

        table.create(WitemId(2), WitemKind::LoadJ2J, 1, true).unwrap();
        let entry = table.get(1).unwrap();
        assert!(entry
            .protocol_states
            .iter()
            .all(|(_, recv)| *recv == ReceiveState::WaitingForRequest));
    }

    #[test]
    fn priority_compacts_on_remove() {
        let mut table = WitemTable::new(4, 8);
        table.create(WitemId(1), WitemKind::LoadJ2J, 0, true).unwrap();
        table.create(WitemId(2), WitemKind::LoadJ2J, 1, true).unwrap();
        table.create(WitemId(3), WitemKind::LoadJ2J, 2, true).unwrap();
        assert_eq!(table.get(2).unwrap().priority, 2);

        table.remove(1);
        assert_eq!(table.get(2).unwrap().priority, 1);
        assert_eq!(table.get(0).unwrap().priority, 0);
    }

    #[test]
    fn select_oldest_ready_ignores_not_ready_entries() {
        let mut table = WitemTable::new(4, 8);
        table.create(WitemId(1), WitemKind::LoadJ2J, 0, true).unwrap();
        table.create(WitemId(2), WitemKind::LoadJ2J, 1, true).unwrap();
        table.get_mut(0).unwrap().ready_for_s1 = false;
        assert_eq!(table.select_oldest_ready(), Some(1));
    }

    #[test]
    fn full_table_rejects_create() {
        let mut table = WitemTable::new(1, 8);
        table.create(WitemId(1), WitemKind::LoadJ2J, 0, true).unwrap();
        let err = table.create(WitemId(2), WitemKind::LoadJ2J, 0, true).unwrap_err();
        assert_eq!(err, DesignFault::WitemTableFull);
    }
}
