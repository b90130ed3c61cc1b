//! Witem Monitor: per-lane protocol witem table and its 15-stage
//! packet-building pipeline (§4.3).
//!
//! 1. **State:** [`state::SendState`]/[`state::ReceiveState`] — the two
//!    independent per-tag state machines every protocol witem drives.
//! 2. **Table:** [`table::WitemTable`] — the fixed array of
//!    [`table::WitemEntry`] with priority-ordered oldest-first selection.
//! 3. **Pipeline:** [`pipeline::WitemPipeline`] — the elastic S1-S15 stage
//!    chain that drains one entry's protocol states into outgoing packets.

/// Send/receive per-tag protocol state machines.
pub mod state;
/// The per-lane witem table.
pub mod table;
/// The 15-stage packet-building pipeline.
pub mod pipeline;

pub use state::{ReceiveState, SendState};
pub use table::{WitemEntry, WitemId, WitemKind, WitemTable};
