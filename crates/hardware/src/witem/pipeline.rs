//! The Witem Monitor's packet-building pipeline (§4.3 stages S1-S15).
//!
//! The real pipeline is fifteen elastic stages, each forward/backward
//! registered per [`crate::config::WitemConfig`]; three of them (S5, S9,
//! S14) are pure latency shims with no side effects, per §4.3's own
//! stage-duty table. This crate compresses the chain into one
//! [`WitemPipeline::tick`] call per active witem per cycle, but keeps the
//! two-phase fault sync's three passes distinct rather than collapsing
//! them away:
//!
//! - **Phase 1** (one `tick` per tag run, `SendState::Initial`): entry
//!   lookup (S2/S3), element-index and tag-bounds arithmetic (S4, S11),
//!   address formation (S7) and translation (S8/S10) classify each run
//!   into `WaitingInCaseFault` (or batch-complete it if out of range),
//!   recording any fault into `localMinFault`. No packet is emitted and
//!   no operand is read yet — the tag may still turn out to be on the
//!   far side of the group's eventual fault boundary. Once every tag has
//!   left `Initial`, `readyForS1` clears and `faultReady` is raised
//!   (S12).
//! - **Phase 2** ([`WitemPipeline::apply_fault_sync_complete`], called by
//!   the caller once `faultSyncComplete(id, globalMinFault)` is known):
//!   every tag still `WaitingInCaseFault` is reclassified by comparing
//!   its element index to `globalMinFault` — at or past it, `Complete`;
//!   before it, `NeedToSend` — and `readyForS1` re-arms if anything
//!   became `NeedToSend`.
//! - **Phase 3** (one `tick` per tag run, `SendState::NeedToSend`): only
//!   now do S13/S15 actually read the operand and emit a packet,
//!   transitioning the run to `WaitingForResponse` or `Complete`.
//!
//! See `DESIGN.md` for why the fifteen registers themselves are
//! collapsed into one `tick` per run rather than kept as a fully
//! concurrent chain: none of this crate's callers observe intermediate
//! stage occupancy, and the per-cycle externally visible behavior — one
//! tag run classified or serviced per cycle, in oldest-first order — is
//! unchanged.
//!
//! `tick` does not itself enforce the outgoing channel's one-word-per-
//! cycle cadence; it hands back a completed [`WitemPacket`] and leaves
//! feeding it onto a [`crate::packet::channel::PacketChannel`] one word
//! per cycle to the caller (the lane driver), keeping the wire-level
//! invariant (§5) enforced in exactly one place.

use crate::common::tag::RegKind;
use crate::config::GeometryConfig;
use crate::packet::header::PacketHeader;
use crate::regfile::RegisterFile;
use crate::tagmap::{compute_mem_tag_bounds, compute_mem_tag_target, compute_tag_info, elements_per_vline};
use crate::units::{DataMemory, Tlb, Translation};
use crate::witem::state::{ReceiveState, SendState};
use crate::witem::table::{WitemId, WitemKind, WitemTable};

/// The static parameters of one transfer, the fields `kamletEntryResp`
/// carries alongside the witem table entry itself (§4.3's table only
/// tracks protocol state; this is the addressing context S4-S13 need).
#[derive(Debug, Clone, Copy)]
pub struct TransferParams {
    /// Virtual byte address of element 0 of this lane's share of the
    /// transfer.
    pub base_vaddr: u64,
    /// First element index in range for this transfer (mask/AVL start).
    pub start_index: u32,
    /// Number of elements in range.
    pub n_elements: u32,
    /// Memory-side element width, in bits.
    pub mem_ew: u32,
    /// Register-side element width, in bits.
    pub reg_ew: u32,
    /// This lane's linear position among the `j_in_l` memory-word
    /// participants.
    pub mem_vw: u32,
    /// This lane's linear position among the `j_in_l` register-vline
    /// participants.
    pub reg_vw: u32,
    /// Register-side bit offset the memory word's bit 0 aligns to.
    pub base_bit_addr: u32,
    /// Register bank this transfer reads from (stores) or writes to
    /// (loads).
    pub reg_kind: RegKind,
    /// Base architectural register index within `reg_kind`.
    pub reg_base_index: u32,
}

/// One completed outgoing packet, still to be drained onto the wire one
/// word per cycle by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WitemPacket {
    /// Witem table slot this packet was produced for.
    pub slot: usize,
    /// Byte tag this packet serviced.
    pub tag: u32,
    /// The packet's header.
    pub header: PacketHeader,
    /// The single payload word following the header (requests and
    /// single-tag responses never need more than one in this model).
    pub payload: u64,
}

/// Everything a cycle's work on the pipeline reads or mutates, other than
/// the witem table itself, which the caller threads through explicitly
/// since it is also read by the RS select logic the same cycle.
pub struct PipelineEnvironment<'a> {
    /// This lane's register file, for store-side operand reads.
    pub regs: &'a mut RegisterFile,
    /// This lane's local data memory (also the non-goal-scoped stand-in
    /// for a J2J peer's cache line; see `DESIGN.md`).
    pub memory: &'a mut DataMemory,
    /// This lane's TLB.
    pub tlb: &'a mut Tlb,
    /// Mesh geometry, for target-lane computation.
    pub geometry: &'a GeometryConfig,
    /// Page size in bytes, for page-boundary detection in
    /// `compute_tag_info`.
    pub page_bytes: u32,
}

/// The outcome of one `tick`: at most one packet, plus any fault-sync or
/// completion-sync events this cycle's witem just became eligible for.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOutcome {
    /// A completed request or response packet, ready to drain onto the
    /// wire.
    pub packet: Option<WitemPacket>,
    /// This witem just finished classifying every tag; carries the
    /// witem id and this lane's locally observed minimum fault element
    /// index (`u32::MAX` if none faulted), to report as `faultReady`.
    pub fault_ready: Option<(WitemId, u32)>,
    /// This witem just reached `(Complete, Complete)` on every tag;
    /// carries the witem id, to report as `completeReady`.
    pub complete_ready: Option<WitemId>,
}

/// The packet-building pipeline, keyed by witem-table slot.
#[derive(Debug)]
pub struct WitemPipeline {
    params: Vec<Option<TransferParams>>,
    word_bytes: u32,
    vline_bytes: u32,
}

impl WitemPipeline {
    /// Creates a pipeline for a table of `capacity` slots whose lane word
    /// is `word_bytes` wide, for a mesh whose vline is `vline_bytes` wide.
    #[must_use]
    pub fn new(capacity: usize, word_bytes: u32, vline_bytes: u32) -> Self {
        Self {
            params: vec![None; capacity],
            word_bytes,
            vline_bytes,
        }
    }

    /// Attaches `params` to the entry just created at `slot` (a witem's
    /// addressing context, alongside the table's own protocol state).
    pub fn attach(&mut self, slot: usize, params: TransferParams) {
        if let Some(entry) = self.params.get_mut(slot) {
            *entry = Some(params);
        }
    }

    /// Drops `slot`'s addressing context, mirroring `table.remove`.
    pub fn detach(&mut self, slot: usize) {
        if let Some(entry) = self.params.get_mut(slot) {
            *entry = None;
        }
    }

    /// Runs one cycle's worth of S1-S15 for the oldest ready entry in
    /// `table`: Phase 1 classification for a tag still `Initial`, Phase 3
    /// service for a tag already reclassified `NeedToSend` by
    /// [`Self::apply_fault_sync_complete`], or a silent skip past a run
    /// already `Complete`/`WaitingForResponse`/`WaitingInCaseFault`.
    ///
    /// # Errors
    ///
    /// Propagates a [`crate::common::DesignFault`] from the register file
    /// allocate/complete paths this pipeline may eventually drive; none
    /// of the current stages return one directly, but the signature is
    /// kept fallible so a future stage (e.g. a real multi-word packet
    /// body) can without breaking callers.
    pub fn tick(
        &mut self,
        table: &mut WitemTable,
        env: &mut PipelineEnvironment,
    ) -> Result<PipelineOutcome, crate::common::DesignFault> {
        let Some(slot) = table.select_oldest_ready() else {
            return Ok(PipelineOutcome::default());
        };
        let Some(params) = self.params.get(slot).copied().flatten() else {
            return Ok(PipelineOutcome::default());
        };

        let mut outcome = PipelineOutcome::default();
        let word_bytes = self.word_bytes;

        let Some(entry) = table.get_mut(slot) else {
            return Ok(outcome);
        };
        let tag = entry.current_tag;
        if tag >= word_bytes {
            entry.ready_for_s1 = false;
            if entry.is_complete() && !entry.complete_signaled {
                entry.complete_signaled = true;
                outcome.complete_ready = Some(entry.instr_ident);
            }
            return Ok(outcome);
        }

        let elements_per_vline_reg = elements_per_vline(self.vline_bytes, params.reg_ew);
        let (active, n_bytes, start_vline) = Self::tag_bounds(
            entry.kind,
            tag,
            &params,
            env.geometry.j_in_l,
            env.page_bytes,
            elements_per_vline_reg,
            word_bytes,
        );

        let run_end = (tag + n_bytes).min(word_bytes) as usize;
        let run = tag as usize..run_end;
        let current_send = entry.protocol_states[tag as usize].0;

        match current_send {
            SendState::Initial => {
                if active {
                    let translation = env.tlb.translate(params.base_vaddr + u64::from(tag));
                    if let Translation::Fault = translation {
                        let element_bytes = (params.reg_ew / 8).max(1);
                        let element = params.start_index + tag / element_bytes;
                        entry.local_min_fault =
                            Some(entry.local_min_fault.map_or(element, |m| m.min(element)));
                    }
                    for i in run {
                        if let Some(pair) = entry.protocol_states.get_mut(i) {
                            pair.0 = SendState::WaitingInCaseFault;
                        }
                    }
                } else {
                    for i in run {
                        if let Some(pair) = entry.protocol_states.get_mut(i) {
                            pair.0 = SendState::Complete;
                            pair.1 = ReceiveState::Complete;
                        }
                    }
                }
                entry.current_tag += n_bytes;
                self.check_fault_classification(entry, &mut outcome);
            }
            SendState::NeedToSend => {
                let translation = env.tlb.translate(params.base_vaddr + u64::from(tag));
                let Translation::Hit(paddr) = translation else {
                    // Fault sync already confirmed this tag's element is
                    // before the group's fault boundary; a translation
                    // miss here would be a design-invariant slip, not a
                    // legitimate outcome. Complete rather than spin.
                    for i in run {
                        if let Some(pair) = entry.protocol_states.get_mut(i) {
                            pair.0 = SendState::Complete;
                        }
                    }
                    entry.current_tag += n_bytes;
                    if entry.is_complete() && !entry.complete_signaled {
                        entry.complete_signaled = true;
                        outcome.complete_ready = Some(entry.instr_ident);
                    }
                    return Ok(outcome);
                };

                let has_receive_role = entry.kind.has_receive_role();
                let payload = match entry.kind {
                    WitemKind::StoreJ2J | WitemKind::StoreStride | WitemKind::StoreIndexed => {
                        env.regs
                            .read(params.reg_kind, params.reg_base_index)
                            .value
                    }
                    WitemKind::LoadJ2J | WitemKind::LoadStride | WitemKind::LoadIndexed => {
                        env.memory.read(paddr / u64::from(word_bytes))
                    }
                };

                let target = compute_mem_tag_target(
                    params.reg_vw,
                    start_vline,
                    elements_per_vline_reg,
                    env.geometry.j_in_l,
                    env.geometry,
                );

                for i in run {
                    if let Some(pair) = entry.protocol_states.get_mut(i) {
                        pair.0 = if has_receive_role {
                            SendState::WaitingForResponse
                        } else {
                            SendState::Complete
                        };
                    }
                }
                entry.current_tag += n_bytes;

                outcome.packet = Some(WitemPacket {
                    slot,
                    tag,
                    header: PacketHeader::normal(1, target.x, target.y),
                    payload,
                });
            }
            SendState::WaitingInCaseFault | SendState::WaitingForResponse | SendState::Complete => {
                // Already resolved, or still parked on the fault sync
                // this lane cannot resolve alone; nothing to do this
                // cycle but step the cursor past the run.
                entry.current_tag += n_bytes;
            }
        }

        if entry.is_complete() && !entry.complete_signaled {
            entry.complete_signaled = true;
            outcome.complete_ready = Some(entry.instr_ident);
        }

        Ok(outcome)
    }

    /// Phase 2 of the two-phase fault sync (§4.3): once the caller's
    /// `faultReady` has come back as `faultSyncComplete(id,
    /// globalMinFault)`, reclassify every tag of `entry` still parked in
    /// `WaitingInCaseFault` by comparing its element index to
    /// `global_min_fault` — at or past it, `Complete` (this element is on
    /// the far side of the group's fault boundary and is never sent);
    /// otherwise `NeedToSend`. Re-arms `readyForS1` and rewinds the tag
    /// cursor to the start of the word if anything became `NeedToSend`,
    /// so Phase 3 revisits exactly the re-enabled runs.
    pub fn apply_fault_sync_complete(
        &self,
        slot: usize,
        entry: &mut crate::witem::table::WitemEntry,
        global_min_fault: u32,
    ) {
        let Some(params) = self.params.get(slot).copied().flatten() else {
            return;
        };
        let element_bytes = (params.reg_ew / 8).max(1);
        let mut any_need_to_send = false;
        for (byte, pair) in entry.protocol_states.iter_mut().enumerate() {
            if pair.0 != SendState::WaitingInCaseFault {
                continue;
            }
            let element = params.start_index + byte as u32 / element_bytes;
            if element >= global_min_fault {
                pair.0 = SendState::Complete;
            } else {
                pair.0 = SendState::NeedToSend;
                any_need_to_send = true;
            }
        }
        if any_need_to_send {
            entry.ready_for_s1 = true;
            entry.current_tag = 0;
        }
    }

    /// S4/S11's tag-bounds arithmetic (§4.6), dispatched by witem kind:
    /// `computeMemTagBounds` for J2J transfers, `computeTagInfo` for
    /// direct-addressed strided/indexed ones. Shared by both the Phase 1
    /// classification pass and the Phase 3 service pass, since the
    /// bounds are a pure function of `(tag, params)` and must agree
    /// across both so the tag cursor advances identically either way.
    #[allow(clippy::too_many_arguments)]
    fn tag_bounds(
        kind: WitemKind,
        tag: u32,
        params: &TransferParams,
        j_in_l: u32,
        page_bytes: u32,
        elements_per_vline_reg: u32,
        word_bytes: u32,
    ) -> (bool, u32, u32) {
        match kind {
            WitemKind::LoadJ2J | WitemKind::StoreJ2J => {
                let bounds = compute_mem_tag_bounds(
                    tag,
                    params.mem_ew,
                    params.reg_ew,
                    j_in_l,
                    params.mem_vw,
                    params.base_bit_addr,
                    params.start_index,
                    params.n_elements,
                    elements_per_vline_reg,
                );
                (bounds.active, bounds.n_bytes.max(1), bounds.start_vline)
            }
            WitemKind::LoadStride
            | WitemKind::StoreStride
            | WitemKind::LoadIndexed
            | WitemKind::StoreIndexed => {
                let element_bytes = params.reg_ew / 8;
                let info = compute_tag_info(
                    tag,
                    0,
                    element_bytes,
                    params.reg_ew,
                    params.mem_ew,
                    params.base_vaddr,
                    page_bytes,
                    word_bytes,
                );
                (info.active, info.n_bytes.max(1), 0)
            }
        }
    }

    fn check_fault_classification(
        &self,
        entry: &mut crate::witem::table::WitemEntry,
        outcome: &mut PipelineOutcome,
    ) {
        if entry.all_tags_classified() && !entry.fault_signaled {
            entry.fault_signaled = true;
            entry.ready_for_s1 = false;
            outcome.fault_ready = Some((entry.instr_ident, entry.local_min_fault.unwrap_or(u32::MAX)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, GeometryConfig};
    use crate::regfile::RegisterFile;
    use crate::units::{DataMemory, Tlb};

    fn store_stride_params() -> TransferParams {
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
        }
    }

    #[test]
    fn store_stride_emits_one_packet_then_completes() {
        let config = Config::default();
        let mut table = WitemTable::new(4, 8);
        table
            .create(WitemId(1), WitemKind::StoreStride, 0, true)
            .unwrap();

        let mut pipeline = WitemPipeline::new(4, 8, 64);
        pipeline.attach(0, store_stride_params());

        let mut regs = RegisterFile::new(&config.registers);
        let tag = regs.allocate(RegKind::D, 1).unwrap();
        regs.complete(tag, 0xABCD);
        let mut memory = DataMemory::new(16);
        let mut tlb = Tlb::new(4096);
        let geometry = GeometryConfig::default();
        let mut env = PipelineEnvironment {
            regs: &mut regs,
            memory: &mut memory,
            tlb: &mut tlb,
            geometry: &geometry,
            page_bytes: 4096,
        };

        // Phase 1: the in-element run parks in `WaitingInCaseFault`, the
        // out-of-element run batch-completes, and `faultReady` fires once
        // every byte has left `Initial` — no packet yet.
        let first = pipeline.tick(&mut table, &mut env).unwrap();
        assert!(first.packet.is_none());
        let second = pipeline.tick(&mut table, &mut env).unwrap();
        assert!(second.packet.is_none());
        let (id, global_min_fault) = second.fault_ready.expect("all tags classified");
        assert_eq!(global_min_fault, u32::MAX);

        // Phase 2: no lane faulted, so every parked tag is reclassified
        // `NeedToSend` and the cursor rewinds.
        let slot = table.find_by_id(id).unwrap();
        let entry = table.get_mut(slot).unwrap();
        pipeline.apply_fault_sync_complete(slot, entry, global_min_fault);
        assert_eq!(entry.current_tag, 0);

        // Phase 3: only now does the operand get read and a packet emitted.
        let third = pipeline.tick(&mut table, &mut env).unwrap();
        let packet = third.packet.expect("reclassified tag should emit a packet");
        assert_eq!(packet.payload, 0xABCD);
        assert_eq!(packet.tag, 0);

        let entry = table.get(0).unwrap();
        assert_eq!(entry.current_tag, 4);
        assert!(entry.is_complete());
        assert_eq!(third.complete_ready, Some(id));
    }

    #[test]
    fn tlb_fault_is_recorded_without_emitting_a_packet() {
        let mut table = WitemTable::new(4, 8);
        table
            .create(WitemId(2), WitemKind::LoadStride, 0, true)
            .unwrap();
        let mut pipeline = WitemPipeline::new(4, 8, 64);
        pipeline.attach(
            0,
            TransferParams {
                base_vaddr: 0x1000,
                ..store_stride_params()
            },
        );

        let config = Config::default();
        let mut regs = RegisterFile::new(&config.registers);
        let mut memory = DataMemory::new(16);
        let mut tlb = Tlb::new(4096);
        tlb.inject_fault(0x1000);
        let geometry = GeometryConfig::default();
        let mut env = PipelineEnvironment {
            regs: &mut regs,
            memory: &mut memory,
            tlb: &mut tlb,
            geometry: &geometry,
            page_bytes: 4096,
        };

        let first = pipeline.tick(&mut table, &mut env).unwrap();
        assert!(first.packet.is_none());
        let entry = table.get(0).unwrap();
        assert_eq!(entry.local_min_fault, Some(0));
        assert_eq!(entry.protocol_states[0].0, SendState::WaitingInCaseFault);

        let second = pipeline.tick(&mut table, &mut env).unwrap();
        assert!(second.packet.is_none());
        let (_, global_min_fault) = second.fault_ready.expect("all tags classified");
        assert_eq!(global_min_fault, 0);
    }

    /// §8 scenario 6: a tag that translates cleanly on this lane is still
    /// skipped — never serviced, never sent — once the group's reconciled
    /// global minimum fault element is at or before this lane's element.
    #[test]
    fn element_past_global_min_fault_completes_without_sending() {
        let mut table = WitemTable::new(4, 8);
        table
            .create(WitemId(3), WitemKind::LoadStride, 0, true)
            .unwrap();
        let mut pipeline = WitemPipeline::new(4, 8, 64);
        pipeline.attach(
            0,
            TransferParams {
                base_vaddr: 0x2000,
                start_index: 2,
                ..store_stride_params()
            },
        );

        let config = Config::default();
        let mut regs = RegisterFile::new(&config.registers);
        let mut memory = DataMemory::new(16);
        let mut tlb = Tlb::new(4096);
        let geometry = GeometryConfig::default();
        let mut env = PipelineEnvironment {
            regs: &mut regs,
            memory: &mut memory,
            tlb: &mut tlb,
            geometry: &geometry,
            page_bytes: 4096,
        };

        pipeline.tick(&mut table, &mut env).unwrap();
        let second = pipeline.tick(&mut table, &mut env).unwrap();
        let (id, global_min_fault) = second.fault_ready.expect("all tags classified");
        assert_eq!(global_min_fault, u32::MAX, "this lane itself never faulted");

        // A peer lane faulted at element 0; the reconciled group minimum
        // is behind this lane's element 2.
        let slot = table.find_by_id(id).unwrap();
        let entry = table.get_mut(slot).unwrap();
        pipeline.apply_fault_sync_complete(slot, entry, 0);

        // Nothing became `NeedToSend`, so `readyForS1` never re-arms and
        // S1 will not pick this witem back up.
        assert!(!entry.ready_for_s1);
        assert!(entry.is_complete());

        let third = pipeline.tick(&mut table, &mut env).unwrap();
        assert!(third.packet.is_none());
    }
}
