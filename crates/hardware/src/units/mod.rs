//! Execution units: opaque single/multi-cycle functions producing results
//! on the result bus, plus the data-memory port and TLB the Witem Monitor
//! pipeline drives (§2.3, §5).
//!
//! Per §1's non-goals, ALU arithmetic semantics beyond what the pipeline
//! needs to know are out of scope: an ALU is modeled as an opaque
//! `(mode, src1, src2) -> value` function.

/// ALU, ALU-Lite, and ALU-Predicate: opaque mode-dispatched functions.
pub mod alu;
/// Word-addressed data memory with one-cycle read/write latency.
pub mod memory;
/// Minimal TLB: one request per cycle, reporting a fault element index on
/// a miss.
pub mod tlb;

pub use alu::{AluMode, AluPredicateMode};
pub use memory::DataMemory;
pub use tlb::{Tlb, Translation};
