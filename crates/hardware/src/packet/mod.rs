//! Outgoing packet framing: header layout and the ready/valid skid-buffer
//! channel S15 drains into (§6.3).
//!
//! 1. **Header:** [`header::PacketHeader`] — the bit-exact, positional
//!    fields every packet starts with.
//! 2. **Word:** [`Word`] — one cycle's worth of channel traffic, either a
//!    header or a payload word.
//! 3. **Channel:** [`channel::PacketChannel`] — a single-element skid
//!    buffer enforcing word-sequential emission and rejecting a header
//!    mid-packet (`DesignFault::HeaderMidPacket`).

/// Packet header fields and the packet `Mode` enum.
pub mod header;
/// The ready/valid outgoing packet channel.
pub mod channel;

pub use header::{Mode, PacketHeader};

/// One word of traffic on the outgoing packet channel: either the header
/// or a payload (address/data) word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Word {
    /// The packet's header word.
    Header(PacketHeader),
    /// A payload word (address or data), carrying a raw value.
    Payload(u64),
}
