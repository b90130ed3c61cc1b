//! Error taxonomy: design-invariant violations vs. protocol-level outcomes.
//!
//! The two are deliberately different types. A [`DesignFault`] should never
//! legitimately occur in a correct implementation — it is returned as an
//! `Err` so call sites can assert on it in tests, but it is never expected
//! during normal operation. A [`ProtocolOutcome`] (`Drop`/`Retry`) is the
//! opposite: it is ordinary, locally-recoverable control flow that the
//! receive handlers are built to expect and handle every cycle.

use thiserror::Error;

use crate::common::tag::Tag;

/// A violation of a structural invariant the design assumes always holds.
///
/// These are asserted, not recovered from: a correct caller never triggers
/// one. Tests exercise them deliberately to confirm the guard is in place.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DesignFault {
    /// A reservation station had no free slot for a new instruction.
    #[error("reservation station has no free slots")]
    NoFreeSlots,
    /// A tag was about to be reissued while its previous write is still
    /// pending (its bit in `pendingTags` is still set).
    #[error("tag {0:?} reissued while still pending")]
    TagStillPending(Tag),
    /// A packet header arrived while a previous packet's body was still
    /// being received on the same channel.
    #[error("header arrived mid-packet")]
    HeaderMidPacket,
    /// A broadcast targeted a tile position outside the configured mesh
    /// bounds.
    #[error("broadcast target ({x}, {y}) outside mesh bounds")]
    BroadcastOutOfBounds {
        /// Target x position, in mesh tile coordinates.
        x: u32,
        /// Target y position, in mesh tile coordinates.
        y: u32,
    },
    /// The witem table had no free entry for a new transfer.
    #[error("witem table has no free entry")]
    WitemTableFull,
    /// An unexpected data word arrived while no packet body was in flight.
    #[error("unexpected data word during receive")]
    UnexpectedDataWord,
}

/// The outcome of a receive handler processing a request it cannot (yet)
/// satisfy. Unlike [`DesignFault`], these are expected and handled locally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ProtocolOutcome {
    /// The request matched no witem entry; the sender should retry after
    /// the entry is created.
    #[error("DROP")]
    Drop,
    /// The destination cache was not ready; the sender resets to
    /// `NEED_TO_SEND` and retries.
    #[error("RETRY")]
    Retry,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::tag::RegKind;

    #[test]
    fn display_is_human_readable() {
        let fault = DesignFault::TagStillPending(Tag::new(RegKind::D, 1, 0, 3));
        assert!(fault.to_string().contains("reissued"));
        assert_eq!(ProtocolOutcome::Drop.to_string(), "DROP");
        assert_eq!(ProtocolOutcome::Retry.to_string(), "RETRY");
    }
}
