//! Cycle-accurate simulation of one amlet lane's out-of-order issue core
//! and Witem Monitor pipeline.
//!
//! 1. **Common:** shared tag/error types every other module builds on.
//! 2. **Config:** register, reservation-station, witem, geometry, packet,
//!    and memory sizing, with documented defaults.
//! 3. **Regfile:** the A/D/P register banks plus the unified B-reg space,
//!    assembled through a port builder.
//! 4. **Rename:** turns one decoded VLIW slot into a reservation-station
//!    entry, allocating its destination tag.
//! 5. **RS:** the generic reservation station, out-of-order everywhere
//!    except the in-order Packet-Send unit.
//! 6. **Units:** the ALU/ALU-Predicate opaque functions, the data-memory
//!    port, and the TLB.
//! 7. **Witem:** the per-lane witem table and its S1-S15 packet-building
//!    pipeline.
//! 8. **Tagmap:** the Tag Mapping Calculator's pure combinational
//!    functions.
//! 9. **Sync:** the Sync Coordinator (KWT) reconciling fault/completion
//!    events across a group's peer lanes.
//! 10. **Rx:** the RxCh0/RxCh1 incoming-packet handlers.
//! 11. **Packet:** outgoing packet header framing and the wire channel.
//! 12. **Sim:** the `Lane` driver tying every piece together one cycle at
//!     a time.
//! 13. **Stats:** per-lane statistics collection and reporting.

/// Shared tag and error types (`DesignFault`, `ProtocolOutcome`, `Tag`,
/// `RegKind`, `TaggedSource`).
pub mod common;
/// Lane configuration: widths, sizes, slot counts, and mesh geometry.
pub mod config;
/// Rename & Dispatch: VLIW slot decoding into reservation-station entries.
pub mod rename;
/// Register File: A/D/P banks, unified B-reg addressing, port builder.
pub mod regfile;
/// Reservation stations, generic over unit payload and issue order.
pub mod rs;
/// RxCh0/RxCh1 incoming packet handlers.
pub mod rx;
/// The per-lane cycle driver, `Lane`.
pub mod sim;
/// Simulation statistics collection and reporting.
pub mod stats;
/// Sync Coordinator (KWT): fault-sync and completion-sync reconciliation.
pub mod sync;
/// Tag Mapping Calculator: pure combinational tag/target/bounds functions.
pub mod tagmap;
/// Execution units: ALU/ALU-Predicate, data memory, and TLB.
pub mod units;
/// The Witem Monitor: per-lane witem table and its packet-building pipeline.
pub mod witem;
/// Outgoing packet framing: header layout and the ready/valid channel.
pub mod packet;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// The per-cycle lane driver.
pub use crate::sim::Lane;
