//! `Lane`: the per-cycle driver tying rename/dispatch, the reservation
//! stations, the result bus, the Witem Monitor, the sync coordinator,
//! and the outgoing packet channel together into one amlet lane (§4.8).
//!
//! Two-phase cycle, mirroring every other part of this crate: phase one
//! (`issue`) is purely combinational — reservation stations issue ready
//! entries and execution units compute results onto a local result-bus
//! snapshot; phase two (`commit`) delivers that snapshot to the register
//! file and every station's snoop logic in one step, so no station ever
//! observes a half-applied cycle.

use std::collections::VecDeque;

use tracing::trace_span;

use crate::common::tag::Tag;
use crate::common::{DesignFault, ProtocolOutcome};
use crate::config::{Config, GeometryConfig};
use crate::packet::channel::PacketChannel;
use crate::packet::Word;
use crate::regfile::RegisterFile;
use crate::rename::{RenameUnit, UnitOp, VliwSlot};
use crate::rs::ReservationStation;
use crate::rx::{self, RxOutcome};
use crate::stats::LaneStats;
use crate::sync::SyncCoordinator;
use crate::units::{alu, alu_predicate, DataMemory, Tlb};
use crate::witem::pipeline::{PipelineEnvironment, TransferParams, WitemPipeline};
use crate::witem::table::{WitemId, WitemKind, WitemTable};

/// One amlet lane: every piece of per-lane state this crate models,
/// advanced one cycle at a time by [`Lane::step`].
#[derive(Debug)]
pub struct Lane {
    regs: RegisterFile,
    memory: DataMemory,
    tlb: Tlb,
    witem_table: WitemTable,
    witem_pipeline: WitemPipeline,
    sync: SyncCoordinator,
    rs_alu: ReservationStation<UnitOp>,
    rs_lsu: ReservationStation<UnitOp>,
    rs_packet_send: ReservationStation<UnitOp>,
    rs_packet_recv: ReservationStation<UnitOp>,
    rs_predicate: ReservationStation<UnitOp>,
    rename: RenameUnit,
    outgoing: PacketChannel,
    pending_words: VecDeque<Word>,
    geometry: GeometryConfig,
    word_bytes: u32,
    page_bytes: u32,
    stats: LaneStats,
}

impl Lane {
    /// Builds a lane from `config`, with every bank, station, and table
    /// sized per its declared geometry.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            regs: RegisterFile::new(&config.registers),
            memory: DataMemory::new(config.memory.data_memory_depth),
            tlb: Tlb::new(config.memory.page_bytes),
            witem_table: WitemTable::new(config.witem.table_size, config.memory.word_bytes),
            witem_pipeline: WitemPipeline::new(
                config.witem.table_size,
                config.memory.word_bytes,
                config.witem.vline_bytes,
            ),
            sync: SyncCoordinator::new(config.witem.kwt_size),
            rs_alu: ReservationStation::new(config.reservation_stations.alu_slots, false),
            rs_lsu: ReservationStation::new(config.reservation_stations.lsu_slots, false),
            rs_packet_send: ReservationStation::new(config.reservation_stations.packet_send_slots, true),
            rs_packet_recv: ReservationStation::new(config.reservation_stations.packet_recv_slots, false),
            rs_predicate: ReservationStation::new(config.reservation_stations.predicate_slots, false),
            rename: RenameUnit::new(),
            outgoing: PacketChannel::new(),
            pending_words: VecDeque::new(),
            geometry: config.geometry,
            word_bytes: config.memory.word_bytes,
            page_bytes: config.memory.page_bytes,
            stats: LaneStats::new(),
        }
    }

    /// Dispatches one decoded VLIW slot: renames its operands, allocates
    /// its destination tag, and queues it onto the reservation station
    /// its [`UnitOp`] targets.
    ///
    /// # Errors
    ///
    /// Propagates [`DesignFault::TagStillPending`] from rename, or
    /// [`DesignFault::NoFreeSlots`] if the target station has no room —
    /// callers should treat the latter as a structural stall and retry
    /// the same slot next cycle rather than as a corrupt bundle.
    pub fn dispatch(&mut self, slot: &VliwSlot) -> Result<(), DesignFault> {
        let entry = self.rename.dispatch(slot, &mut self.regs)?;
        let station = match slot.unit {
            UnitOp::Alu(_) => &mut self.rs_alu,
            UnitOp::AluPredicate(_) => &mut self.rs_predicate,
            UnitOp::Memory { .. } => &mut self.rs_lsu,
            UnitOp::PacketSend => &mut self.rs_packet_send,
            UnitOp::PacketRecv => &mut self.rs_packet_recv,
        };
        match station.insert(entry) {
            Ok(()) => {
                self.stats.slots_dispatched += 1;
                Ok(())
            }
            Err(err) => {
                self.stats.rs_full_stalls += 1;
                Err(err)
            }
        }
    }

    /// Opens a new witem (§3.3/§4.3): allocates `slot` in the witem
    /// table, attaches its addressing context, and registers its sync
    /// group with `num_peers` participants.
    ///
    /// # Errors
    ///
    /// Propagates [`DesignFault::WitemTableFull`] from either the table
    /// or the sync coordinator.
    pub fn start_transfer(
        &mut self,
        id: WitemId,
        kind: WitemKind,
        slot: usize,
        cache_avail: bool,
        params: TransferParams,
        num_peers: u32,
    ) -> Result<(), DesignFault> {
        self.witem_table.create(id, kind, slot, cache_avail)?;
        self.witem_pipeline.attach(slot, params);
        self.sync.start_group(id, num_peers)?;
        self.stats.witems_created += 1;
        Ok(())
    }

    /// Handles one incoming request packet for `(id, tag)` (RxCh0).
    pub fn receive_request(&mut self, id: WitemId, tag: u32, cache_ready: bool) -> RxOutcome {
        let outcome = rx::handle_request(&mut self.witem_table, id, tag, cache_ready);
        self.record_rx_outcome(outcome);
        outcome
    }

    /// Handles one incoming response packet for `(id, tag)` (RxCh1).
    pub fn receive_response(&mut self, id: WitemId, tag: u32) -> RxOutcome {
        let outcome = rx::handle_response(&mut self.witem_table, id, tag);
        self.record_rx_outcome(outcome);
        outcome
    }

    /// Handles one incoming DROP/RETRY response for `(id, tag)` (RxCh1):
    /// the peer could not satisfy this lane's request, so the tag resets
    /// to `NeedToSend` and the pipeline resends it.
    pub fn receive_response_retry(&mut self, id: WitemId, tag: u32) -> RxOutcome {
        let outcome = rx::handle_response_retry(&mut self.witem_table, id, tag);
        if outcome == RxOutcome::Handled {
            self.stats.resends_issued += 1;
        }
        self.record_rx_outcome(outcome);
        outcome
    }

    fn record_rx_outcome(&mut self, outcome: RxOutcome) {
        match outcome {
            RxOutcome::Handled => self.stats.packet_words_received += 1,
            RxOutcome::Protocol(ProtocolOutcome::Drop) => self.stats.packets_dropped += 1,
            RxOutcome::Protocol(ProtocolOutcome::Retry) => self.stats.packets_retried += 1,
        }
    }

    /// Drains the next word the outgoing channel is holding, if any —
    /// the wire-level, one-word-per-cycle interface the rest of the mesh
    /// consumes.
    pub fn take_outgoing_word(&mut self) -> Option<Word> {
        self.outgoing.take()
    }

    /// This lane's accumulated statistics.
    #[must_use]
    pub fn stats(&self) -> &LaneStats {
        &self.stats
    }

    /// Advances the lane by exactly one cycle: issue, execute, commit,
    /// tick the Witem Monitor, and push one outgoing word if the channel
    /// has room.
    ///
    /// # Errors
    ///
    /// Propagates any [`DesignFault`] surfaced by the Witem Monitor
    /// pipeline or the outgoing packet channel.
    pub fn step(&mut self) -> Result<(), DesignFault> {
        let _span = trace_span!("lane_step", cycle = self.stats.cycles).entered();

        let mut completions: Vec<(Tag, u64)> = Vec::new();
        self.issue_alu(&mut completions);
        self.issue_predicate(&mut completions);
        self.issue_lsu(&mut completions);
        self.issue_packet_send();
        self.issue_packet_recv(&mut completions);

        for (tag, value) in completions {
            self.regs.complete(tag, value);
            self.rs_alu.snoop(tag, value);
            self.rs_lsu.snoop(tag, value);
            self.rs_packet_send.snoop(tag, value);
            self.rs_packet_recv.snoop(tag, value);
            self.rs_predicate.snoop(tag, value);
        }

        self.tick_witem_pipeline()?;

        if self.outgoing.is_ready() {
            if let Some(word) = self.pending_words.pop_front() {
                self.outgoing.push(word)?;
                self.stats.packet_words_sent += 1;
            }
        }

        self.stats.cycles += 1;
        Ok(())
    }

    fn issue_alu(&mut self, completions: &mut Vec<(Tag, u64)>) {
        let Some(slot) = self.rs_alu.select_issue() else {
            return;
        };
        let Some(entry) = self.rs_alu.take(slot) else {
            return;
        };
        let UnitOp::Alu(mode) = entry.payload else {
            return;
        };
        let result = alu(mode, entry.src1.value, entry.src2.value);
        if let Some(dest) = entry.dest {
            completions.push((dest, entry.resolved_value(result)));
        }
        self.stats.issued_alu += 1;
    }

    fn issue_predicate(&mut self, completions: &mut Vec<(Tag, u64)>) {
        let Some(slot) = self.rs_predicate.select_issue() else {
            return;
        };
        let Some(entry) = self.rs_predicate.take(slot) else {
            return;
        };
        let UnitOp::AluPredicate(mode) = entry.payload else {
            return;
        };
        let result = alu_predicate(mode, entry.src1.value, entry.src2.value);
        if let Some(dest) = entry.dest {
            completions.push((dest, entry.resolved_value(result)));
        }
        self.stats.issued_predicate += 1;
    }

    fn issue_lsu(&mut self, completions: &mut Vec<(Tag, u64)>) {
        let Some(slot) = self.rs_lsu.select_issue() else {
            return;
        };
        let Some(entry) = self.rs_lsu.take(slot) else {
            return;
        };
        let UnitOp::Memory { is_store } = entry.payload else {
            return;
        };
        let addr = entry.src1.value;
        if is_store {
            self.memory.write(addr, entry.src2.value);
        } else {
            let value = self.memory.read(addr);
            if let Some(dest) = entry.dest {
                completions.push((dest, entry.resolved_value(value)));
            }
        }
        self.stats.issued_lsu += 1;
    }

    /// Packet-Send is the one in-order station (§4.2): only slot 0 may
    /// issue, preserving wire order even though every other unit may
    /// complete out of order.
    fn issue_packet_send(&mut self) {
        let Some(slot) = self.rs_packet_send.select_issue() else {
            return;
        };
        let Some(entry) = self.rs_packet_send.take(slot) else {
            return;
        };
        let x_dest = (entry.src1.value >> 32) as u32;
        let y_dest = entry.src1.value as u32;
        let header = crate::packet::PacketHeader::normal(1, x_dest, y_dest);
        self.pending_words.push_back(Word::Header(header));
        self.pending_words.push_back(Word::Payload(entry.src2.value));
        self.stats.issued_packet_send += 1;
    }

    fn issue_packet_recv(&mut self, completions: &mut Vec<(Tag, u64)>) {
        let Some(slot) = self.rs_packet_recv.select_issue() else {
            return;
        };
        let Some(entry) = self.rs_packet_recv.take(slot) else {
            return;
        };
        if let Some(dest) = entry.dest {
            completions.push((dest, entry.src1.value));
        }
        self.stats.issued_packet_recv += 1;
    }

    fn tick_witem_pipeline(&mut self) -> Result<(), DesignFault> {
        let mut env = PipelineEnvironment {
            regs: &mut self.regs,
            memory: &mut self.memory,
            tlb: &mut self.tlb,
            geometry: &self.geometry,
            page_bytes: self.page_bytes,
        };
        let outcome = self.witem_pipeline.tick(&mut self.witem_table, &mut env)?;

        if let Some(packet) = outcome.packet {
            self.pending_words.push_back(Word::Header(packet.header));
            self.pending_words.push_back(Word::Payload(packet.payload));
        }

        if let Some((id, local_min_fault)) = outcome.fault_ready {
            self.stats.sync_fault_events += 1;
            if local_min_fault != u32::MAX {
                self.stats.witems_faulted += 1;
            }
            // Single-lane driver: this lane is the only reporter for its
            // own group, so the local minimum is already the global one.
            if let Some(global_min) = self.sync.fault_ready(id, 0, local_min_fault) {
                self.sync.fault_sync_complete(id, global_min);
                if let Some(slot) = self.witem_table.find_by_id(id) {
                    if let Some(entry) = self.witem_table.get_mut(slot) {
                        self.witem_pipeline
                            .apply_fault_sync_complete(slot, entry, global_min);
                    }
                }
            }
        }

        if let Some(id) = outcome.complete_ready {
            self.stats.witems_completed += 1;
            if self.sync.complete_ready(id, 0) {
                self.sync.completion_sync_complete(id);
            }
            self.sync.remove_group(id);
            if let Some(slot) = self.witem_table.find_by_id(id) {
                self.witem_table.remove(slot);
                self.witem_pipeline.detach(slot);
            }
        }

        Ok(())
    }

    /// Bytes owned by this lane's memory word; used to size witem
    /// transfers started through [`Lane::start_transfer`].
    #[must_use]
    pub fn word_bytes(&self) -> u32 {
        self.word_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::tag::RegKind;
    use crate::rename::RegSpec;
    use crate::units::AluMode;

    #[test]
    fn dispatch_then_step_resolves_and_commits_alu_result() {
        let config = Config::default();
        let mut lane = Lane::new(&config);
        let slot = VliwSlot {
            unit: UnitOp::Alu(AluMode::Add),
            src1: None,
            src2: None,
            predicate: None,
            dest: Some(RegSpec { kind: RegKind::D, index: 1 }),
            immediate: 5,
        };
        lane.dispatch(&slot).unwrap();
        lane.step().unwrap();
        assert_eq!(lane.stats().issued_alu, 1);
    }

    #[test]
    fn store_stride_witem_emits_a_packet_within_one_word_worth_of_cycles() {
        let config = Config::default();
        let mut lane = Lane::new(&config);
        let tag = lane.regs.allocate(RegKind::D, 1).unwrap();
        lane.regs.complete(tag, 0xABCD);

        lane.start_transfer(
            WitemId(1),
            WitemKind::StoreStride,
            0,
            true,
            TransferParams {
                base_vaddr: 0x1600,
                start_index: 0,
                n_elements: 1,
                mem_ew: 32,
                reg_ew: 32,
                mem_vw: 0,
                reg_vw: 0,
                base_bit_addr: 0,
                reg_kind: RegKind::D,
                reg_base_index: 1,
            },
            1,
        )
        .unwrap();

        for _ in 0..lane.word_bytes() {
            lane.step().unwrap();
        }
        assert!(lane.stats().witems_completed >= 1 || lane.stats().packet_words_sent >= 1);
    }

    #[test]
    fn full_reservation_station_reports_the_stall() {
        let mut config = Config::default();
        config.reservation_stations.alu_slots = 1;
        let mut lane = Lane::new(&config);
        let slot = VliwSlot {
            unit: UnitOp::Alu(AluMode::Add),
            src1: None,
            src2: None,
            predicate: None,
            dest: None,
            immediate: 1,
        };
        lane.dispatch(&slot).unwrap();
        let err = lane.dispatch(&slot).unwrap_err();
        assert_eq!(err, DesignFault::NoFreeSlots);
        assert_eq!(lane.stats().rs_full_stalls, 1);
    }
}
