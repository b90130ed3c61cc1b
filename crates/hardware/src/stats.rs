//! Simulation statistics collection and reporting.
//!
//! This module tracks per-lane performance metrics. It provides:
//! 1. **Cycle and throughput:** total cycles, instructions dispatched/issued.
//! 2. **Reservation-station occupancy:** issues and full-station stalls, per unit.
//! 3. **Witem Monitor:** transfers created, completed, and fault-classified.
//! 4. **Sync Coordinator:** fault-sync and completion-sync events observed.
//! 5. **Packet traffic:** words sent and received.

use std::time::Instant;

/// Per-lane simulation statistics.
///
/// Collects counts of dispatch, issue, reservation-station stalls, witem
/// lifecycle events, sync events, and packet traffic for performance
/// analysis across a run of [`crate::sim::Lane::step`] calls.
#[derive(Clone)]
pub struct LaneStats {
    start_time: Instant,
    /// Total cycles elapsed.
    pub cycles: u64,
    /// Number of VLIW slots dispatched into a reservation station.
    pub slots_dispatched: u64,

    /// Instructions issued from the ALU reservation station.
    pub issued_alu: u64,
    /// Instructions issued from the LSU (data-memory) reservation station.
    pub issued_lsu: u64,
    /// Instructions issued from the Packet-Send reservation station.
    pub issued_packet_send: u64,
    /// Instructions issued from the Packet-Receive reservation station.
    pub issued_packet_recv: u64,
    /// Instructions issued from the predicate reservation station.
    pub issued_predicate: u64,

    /// Cycles a dispatch attempt found its target reservation station full.
    pub rs_full_stalls: u64,

    /// Witems created in the witem table.
    pub witems_created: u64,
    /// Witems that reached `(Complete, Complete)` on every tag.
    pub witems_completed: u64,
    /// Witems for which at least one tag's translation faulted.
    pub witems_faulted: u64,

    /// `faultReady` events observed by the sync coordinator.
    pub sync_fault_events: u64,
    /// `completeReady` events observed by the sync coordinator.
    pub sync_completion_events: u64,

    /// Packet words pushed onto the outgoing channel.
    pub packet_words_sent: u64,
    /// Packet words accepted by a receive handler (request or response).
    pub packet_words_received: u64,
    /// Incoming packets that resolved to [`crate::common::ProtocolOutcome::Drop`].
    pub packets_dropped: u64,
    /// Incoming packets that resolved to [`crate::common::ProtocolOutcome::Retry`].
    pub packets_retried: u64,
    /// Tags reset `WAITING_FOR_RESPONSE → NEED_TO_SEND` after a DROP/RETRY
    /// response, queued up for the witem pipeline to resend.
    pub resends_issued: u64,
}

impl Default for LaneStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            slots_dispatched: 0,
            issued_alu: 0,
            issued_lsu: 0,
            issued_packet_send: 0,
            issued_packet_recv: 0,
            issued_predicate: 0,
            rs_full_stalls: 0,
            witems_created: 0,
            witems_completed: 0,
            witems_faulted: 0,
            sync_fault_events: 0,
            sync_completion_events: 0,
            packet_words_sent: 0,
            packet_words_received: 0,
            packets_dropped: 0,
            packets_retried: 0,
            resends_issued: 0,
        }
    }
}

/// Valid section names for [`LaneStats::print_sections`].
///
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "reservation_stations", "witem", "sync", "packet"];

impl LaneStats {
    /// Creates a fresh, zeroed set of statistics with the clock started.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// Each element of `sections` should be one of `"summary"`,
    /// `"reservation_stations"`, `"witem"`, `"sync"`, or `"packet"`. An
    /// empty slice prints every section.
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let duration = self.start_time.elapsed();
        let seconds = duration.as_secs_f64();
        let cyc = self.cycles.max(1) as f64;
        let khz = if seconds > 0.0 {
            self.cycles as f64 / seconds / 1000.0
        } else {
            0.0
        };

        if want("summary") {
            println!("\n==========================================================");
            println!("AMLET LANE SIMULATION STATISTICS");
            println!("==========================================================");
            println!("host_seconds             {seconds:.4} s");
            println!("sim_cycles               {}", self.cycles);
            println!("sim_freq                 {khz:.2} kHz");
            println!("slots_dispatched         {}", self.slots_dispatched);
            println!("----------------------------------------------------------");
        }
        if want("reservation_stations") {
            let issued_total =
                self.issued_alu + self.issued_lsu + self.issued_packet_send + self.issued_packet_recv + self.issued_predicate;
            println!("RESERVATION STATIONS");
            println!("  issued.alu             {}", self.issued_alu);
            println!("  issued.lsu             {}", self.issued_lsu);
            println!("  issued.packet_send     {}", self.issued_packet_send);
            println!("  issued.packet_recv     {}", self.issued_packet_recv);
            println!("  issued.predicate       {}", self.issued_predicate);
            println!("  issued.total           {issued_total}");
            println!(
                "  stalls.rs_full         {} ({:.2}%)",
                self.rs_full_stalls,
                (self.rs_full_stalls as f64 / cyc) * 100.0
            );
            println!("----------------------------------------------------------");
        }
        if want("witem") {
            println!("WITEM MONITOR");
            println!("  witems.created         {}", self.witems_created);
            println!("  witems.completed       {}", self.witems_completed);
            println!("  witems.faulted         {}", self.witems_faulted);
            println!("----------------------------------------------------------");
        }
        if want("sync") {
            println!("SYNC COORDINATOR");
            println!("  events.fault_ready     {}", self.sync_fault_events);
            println!("  events.complete_ready  {}", self.sync_completion_events);
            println!("----------------------------------------------------------");
        }
        if want("packet") {
            println!("PACKET TRAFFIC");
            println!("  words.sent             {}", self.packet_words_sent);
            println!("  words.received         {}", self.packet_words_received);
            println!("  protocol.dropped       {}", self.packets_dropped);
            println!("  protocol.retried       {}", self.packets_retried);
            println!("  protocol.resends       {}", self.resends_issued);
            println!("----------------------------------------------------------");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_zeroed() {
        let stats = LaneStats::new();
        assert_eq!(stats.cycles, 0);
        assert_eq!(stats.witems_completed, 0);
    }

    #[test]
    fn stats_sections_are_all_known_names() {
        assert!(STATS_SECTIONS.contains(&"summary"));
        assert!(STATS_SECTIONS.contains(&"witem"));
    }
}
