//! Sync Coordinator (KWT): reconciles fault and completion events across
//! the peers of a group before a strided/indexed transfer is declared
//! finished (§3.4, §4.4).
//!
//! One row per active witem id tracks both sync phases — they share a row
//! because they belong to the same logical group, but each phase is
//! addressed with its own disjoint identifier when talking to the
//! external synchronizer (§4.3 "Sync identifier allocation": fault sync
//! uses `id`, completion sync uses `(id + 1) mod max_tags`), so the two
//! phases never collide on the wire even though this crate keeps one row
//! for both.

use std::collections::HashSet;

use crate::common::DesignFault;
use crate::witem::table::WitemId;

/// Lifecycle of one sync phase (fault or completion) for a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhaseState {
    /// No peer has reported in yet.
    NotStarted,
    /// At least one peer has reported; waiting on the rest, or on the
    /// external synchronizer's reply once all have.
    Waiting,
    /// The external synchronizer has replied; the phase is done.
    Complete,
}

/// One row of the Kamlet Witem Table.
#[derive(Debug, Clone)]
pub struct KwtRow {
    id: WitemId,
    num_peers: u32,
    fault_peer_ready: HashSet<u32>,
    completion_peer_ready: HashSet<u32>,
    fault_state: SyncPhaseState,
    completion_state: SyncPhaseState,
    local_min_fault: Option<u32>,
    global_min_fault: Option<u32>,
}

impl KwtRow {
    fn new(id: WitemId, num_peers: u32) -> Self {
        Self {
            id,
            num_peers,
            fault_peer_ready: HashSet::new(),
            completion_peer_ready: HashSet::new(),
            fault_state: SyncPhaseState::NotStarted,
            completion_state: SyncPhaseState::NotStarted,
            local_min_fault: None,
            global_min_fault: None,
        }
    }

    /// Current state of the fault-sync phase.
    #[must_use]
    pub fn fault_state(&self) -> SyncPhaseState {
        self.fault_state
    }

    /// Current state of the completion-sync phase.
    #[must_use]
    pub fn completion_state(&self) -> SyncPhaseState {
        self.completion_state
    }

    /// The reconciled global minimum fault element index, once known.
    #[must_use]
    pub fn global_min_fault(&self) -> Option<u32> {
        self.global_min_fault
    }
}

/// The wire identifier the numeric sync id for the completion phase uses,
/// disjoint from the fault phase's own `id` (§4.3).
#[must_use]
pub fn completion_sync_id(id: WitemId, max_tags: u32) -> WitemId {
    WitemId((id.0 + 1) % max_tags)
}

/// The bounded table of active sync groups.
#[derive(Debug)]
pub struct SyncCoordinator {
    rows: std::collections::HashMap<u32, KwtRow>,
    capacity: usize,
}

impl SyncCoordinator {
    /// Creates an empty coordinator bounded to `capacity` concurrently
    /// active groups (§8 universal invariant 4).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            rows: std::collections::HashMap::new(),
            capacity,
        }
    }

    /// Registers a new active group of `num_peers` lanes.
    ///
    /// # Errors
    ///
    /// Returns [`DesignFault::WitemTableFull`] if `capacity` active groups
    /// already exist — the KWT has no free row, which §8 invariant 4 says
    /// must never legitimately happen.
    pub fn start_group(&mut self, id: WitemId, num_peers: u32) -> Result<(), DesignFault> {
        if self.rows.len() >= self.capacity && !self.rows.contains_key(&id.0) {
            return Err(DesignFault::WitemTableFull);
        }
        self.rows.insert(id.0, KwtRow::new(id, num_peers));
        Ok(())
    }

    /// Removes a finished group's row.
    pub fn remove_group(&mut self, id: WitemId) {
        self.rows.remove(&id.0);
    }

    fn row_mut(&mut self, id: WitemId) -> Option<&mut KwtRow> {
        self.rows.get_mut(&id.0)
    }

    /// Row accessor, for observability/tests.
    #[must_use]
    pub fn row(&self, id: WitemId) -> Option<&KwtRow> {
        self.rows.get(&id.0)
    }

    /// A peer lane reports `faultReady(id, reported_min)` (§4.4).
    ///
    /// Returns `Some(local_min_fault)` exactly once, the cycle every peer
    /// has reported — the caller should forward that value as
    /// `syncLocalEvent` to the external synchronizer.
    pub fn fault_ready(&mut self, id: WitemId, peer: u32, reported_min: u32) -> Option<u32> {
        let row = self.row_mut(id)?;
        row.fault_state = SyncPhaseState::Waiting;
        row.local_min_fault = Some(row.local_min_fault.map_or(reported_min, |m| m.min(reported_min)));
        row.fault_peer_ready.insert(peer);
        if row.fault_peer_ready.len() as u32 >= row.num_peers {
            row.local_min_fault
        } else {
            None
        }
    }

    /// The external synchronizer replies `syncComplete(id, global_min)`
    /// for the fault phase; stores the result and completes the phase.
    pub fn fault_sync_complete(&mut self, id: WitemId, global_min: u32) {
        if let Some(row) = self.row_mut(id) {
            row.global_min_fault = Some(global_min);
            row.fault_state = SyncPhaseState::Complete;
        }
    }

    /// A peer lane reports `completeReady(id)` (§4.4, same shape as fault
    /// sync but with no numeric payload).
    ///
    /// Returns `true` exactly once, the cycle every peer has reported.
    pub fn complete_ready(&mut self, id: WitemId, peer: u32) -> bool {
        let Some(row) = self.row_mut(id) else {
            return false;
        };
        row.completion_state = SyncPhaseState::Waiting;
        row.completion_peer_ready.insert(peer);
        row.completion_peer_ready.len() as u32 >= row.num_peers
    }

    /// The external synchronizer replies `completionSyncComplete(id)`.
    pub fn completion_sync_complete(&mut self, id: WitemId) {
        if let Some(row) = self.row_mut(id) {
            row.completion_state = SyncPhaseState::Complete;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// §8 scenario 6: fault sync reconciliation across two lanes.
    #[test]
    fn fault_sync_reconciles_minimum_across_peers() {
        let mut kwt = SyncCoordinator::new(4);
        let id = WitemId(7);
        kwt.start_group(id, 2).unwrap();

        assert_eq!(kwt.fault_ready(id, 0, 7), None);
        assert_eq!(kwt.fault_ready(id, 1, 5), Some(5));

        kwt.fault_sync_complete(id, 5);
        let row = kwt.row(id).unwrap();
        assert_eq!(row.global_min_fault(), Some(5));
        assert_eq!(row.fault_state(), SyncPhaseState::Complete);
    }

    #[test]
    fn completion_sync_requires_every_peer() {
        let mut kwt = SyncCoordinator::new(4);
        let id = WitemId(1);
        kwt.start_group(id, 3).unwrap();
        assert!(!kwt.complete_ready(id, 0));
        assert!(!kwt.complete_ready(id, 1));
        assert!(kwt.complete_ready(id, 2));
    }

    #[test]
    fn completion_sync_id_is_disjoint_from_fault_id() {
        assert_eq!(completion_sync_id(WitemId(5), 16), WitemId(6));
        assert_eq!(completion_sync_id(WitemId(15), 16), WitemId(0));
    }

    #[test]
    fn full_table_rejects_new_group() {
        let mut kwt = SyncCoordinator::new(1);
        kwt.start_group(WitemId(1), 2).unwrap();
        let err = kwt.start_group(WitemId(2), 2).unwrap_err();
        assert_eq!(err, DesignFault::WitemTableFull);
    }
}
