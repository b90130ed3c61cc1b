//! Packet header layout (§6.3): bit-exact, positional fields.
//!
//! ```text
//! length : packetLengthWidth
//! xDest  : xPosWidth
//! yDest  : yPosWidth
//! mode   : enum { Normal, Command, Append, Reserved }
//! forward: bool
//! isBroadcast: bool
//! appendLength: packetLengthWidth
//! ```

/// Packet delivery mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// A normal point-to-point packet.
    Normal,
    /// A command packet (control-plane, not data traffic).
    Command,
    /// An append packet: `appendLength` additional words follow the usual
    /// payload, extending the same transfer.
    Append,
    /// Reserved for future protocol extensions.
    Reserved,
}

/// The header every outgoing packet begins with.
///
/// `length` is the number of payload words that follow (§5: "the header's
/// `length` equals the number of payload words that follow" is a universal
/// invariant the channel itself enforces, see [`super::channel`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Number of payload words following this header.
    pub length: u32,
    /// Destination x-coordinate in the mesh.
    pub x_dest: u32,
    /// Destination y-coordinate in the mesh.
    pub y_dest: u32,
    /// Delivery mode.
    pub mode: Mode,
    /// Whether this packet should be forwarded past its immediate target.
    pub forward: bool,
    /// Whether this packet is a broadcast.
    pub is_broadcast: bool,
    /// Additional word count for `Mode::Append` packets.
    pub append_length: u32,
}

impl PacketHeader {
    /// Builds a normal, non-broadcast, non-forwarded header with no append.
    #[must_use]
    pub fn normal(length: u32, x_dest: u32, y_dest: u32) -> Self {
        Self {
            length,
            x_dest,
            y_dest,
            mode: Mode::Normal,
            forward: false,
            is_broadcast: false,
            append_length: 0,
        }
    }
}
