//! Receive-channel handlers: RxCh0 (incoming requests) and RxCh1
//! (incoming responses) (§4.5).
//!
//! Both channels key incoming traffic by witem id, not by table slot — a
//! peer's packet carries the id it was sent against, and the local table
//! has to be searched for a match. A request or response that matches no
//! live entry is [`ProtocolOutcome::Drop`]: the sender will see no
//! response and eventually resend once its own entry is created. A
//! request that matches an entry whose destination cache is not yet
//! available is [`ProtocolOutcome::Retry`]: per §4.5, the sender resets
//! that tag to `NEED_TO_SEND` and tries again later.

use crate::common::ProtocolOutcome;
use crate::witem::state::{ReceiveState, SendState};
use crate::witem::table::{WitemId, WitemTable};

/// The result of handling one incoming packet: either it was applied to
/// a live witem entry, or it fell into one of the two expected protocol
/// outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxOutcome {
    /// The packet matched a live entry and its state was updated.
    Handled,
    /// The packet could not be applied; see [`ProtocolOutcome`].
    Protocol(ProtocolOutcome),
}

/// RxCh0: handles one incoming request for `tag` of witem `id`.
///
/// `cache_ready` reflects whether this lane's destination cache slot for
/// the transfer is currently available to accept the request.
pub fn handle_request(table: &mut WitemTable, id: WitemId, tag: u32, cache_ready: bool) -> RxOutcome {
    let Some(slot) = table.find_by_id(id) else {
        return RxOutcome::Protocol(ProtocolOutcome::Drop);
    };
    let Some(entry) = table.get_mut(slot) else {
        return RxOutcome::Protocol(ProtocolOutcome::Drop);
    };
    let Some(pair) = entry.protocol_states.get_mut(tag as usize) else {
        return RxOutcome::Protocol(ProtocolOutcome::Drop);
    };
    if !cache_ready {
        return RxOutcome::Protocol(ProtocolOutcome::Retry);
    }
    pair.1 = ReceiveState::Complete;
    RxOutcome::Handled
}

/// RxCh1: handles one incoming response for `tag` of witem `id`,
/// carrying `value` to be written back through whichever store `value`
/// belongs to (register file or data memory); that write is the
/// caller's responsibility, this only advances the protocol state.
pub fn handle_response(table: &mut WitemTable, id: WitemId, tag: u32) -> RxOutcome {
    let Some(slot) = table.find_by_id(id) else {
        return RxOutcome::Protocol(ProtocolOutcome::Drop);
    };
    let Some(entry) = table.get_mut(slot) else {
        return RxOutcome::Protocol(ProtocolOutcome::Drop);
    };
    let Some(pair) = entry.protocol_states.get_mut(tag as usize) else {
        return RxOutcome::Protocol(ProtocolOutcome::Drop);
    };
    if pair.0 != SendState::WaitingForResponse {
        return RxOutcome::Protocol(ProtocolOutcome::Drop);
    }
    pair.0 = SendState::Complete;
    RxOutcome::Handled
}

/// RxCh1's other response shape: the peer's own RxCh0 answered this
/// tag's request with a protocol-level `DROP` or `RETRY` rather than
/// data (its entry did not exist yet, or its cache was not ready).
/// Resets `srcState: WAITING_FOR_RESPONSE → NEED_TO_SEND` so the witem
/// pipeline resends the same tag (§4.5, §7 "DROP → NEED_TO_SEND →
/// resend").
pub fn handle_response_retry(table: &mut WitemTable, id: WitemId, tag: u32) -> RxOutcome {
    let Some(slot) = table.find_by_id(id) else {
        return RxOutcome::Protocol(ProtocolOutcome::Drop);
    };
    let Some(entry) = table.get_mut(slot) else {
        return RxOutcome::Protocol(ProtocolOutcome::Drop);
    };
    let Some(pair) = entry.protocol_states.get_mut(tag as usize) else {
        return RxOutcome::Protocol(ProtocolOutcome::Drop);
    };
    if pair.0 != SendState::WaitingForResponse {
        return RxOutcome::Protocol(ProtocolOutcome::Drop);
    }
    pair.0 = SendState::NeedToSend;
    entry.ready_for_s1 = true;
    // The tag cursor may already have walked past this byte while the
    // request was in flight; rewind it so Phase 3 revisits the reset
    // run instead of sitting past the end of the word forever.
    entry.current_tag = entry.current_tag.min(tag);
    RxOutcome::Handled
}

/// A receive-side NACK: the response carried no usable data (the peer's
/// own cache slot was not ready) and this tag must be asked to resend.
pub fn handle_need_resend(table: &mut WitemTable, id: WitemId, tag: u32) -> RxOutcome {
    let Some(slot) = table.find_by_id(id) else {
        return RxOutcome::Protocol(ProtocolOutcome::Drop);
    };
    let Some(entry) = table.get_mut(slot) else {
        return RxOutcome::Protocol(ProtocolOutcome::Drop);
    };
    let Some(pair) = entry.protocol_states.get_mut(tag as usize) else {
        return RxOutcome::Protocol(ProtocolOutcome::Drop);
    };
    pair.1 = ReceiveState::NeedToAskForResend;
    RxOutcome::Handled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::witem::table::WitemKind;

    #[test]
    fn request_to_unknown_id_is_dropped() {
        let mut table = WitemTable::new(4, 8);
        assert_eq!(
            handle_request(&mut table, WitemId(99), 0, true),
            RxOutcome::Protocol(ProtocolOutcome::Drop)
        );
    }

    #[test]
    fn request_with_cache_unready_is_a_retry() {
        let mut table = WitemTable::new(4, 8);
        table.create(WitemId(1), WitemKind::LoadJ2J, 0, true).unwrap();
        assert_eq!(
            handle_request(&mut table, WitemId(1), 0, false),
            RxOutcome::Protocol(ProtocolOutcome::Retry)
        );
    }

    #[test]
    fn request_with_cache_ready_completes_receive_state() {
        let mut table = WitemTable::new(4, 8);
        table.create(WitemId(1), WitemKind::LoadJ2J, 0, true).unwrap();
        assert_eq!(handle_request(&mut table, WitemId(1), 0, true), RxOutcome::Handled);
        let entry = table.get(0).unwrap();
        assert_eq!(entry.protocol_states[0].1, ReceiveState::Complete);
    }

    #[test]
    fn response_completes_send_state_only_when_waiting() {
        let mut table = WitemTable::new(4, 8);
        table.create(WitemId(1), WitemKind::LoadJ2J, 0, true).unwrap();
        table.get_mut(0).unwrap().protocol_states[0].0 = SendState::WaitingForResponse;
        assert_eq!(handle_response(&mut table, WitemId(1), 0), RxOutcome::Handled);
        assert_eq!(table.get(0).unwrap().protocol_states[0].0, SendState::Complete);

        assert_eq!(
            handle_response(&mut table, WitemId(1), 0),
            RxOutcome::Protocol(ProtocolOutcome::Drop)
        );
    }

    /// §7/§8: replaying a DROP/RETRY through to a resend yields exactly
    /// one `COMPLETE` transition for the tag, never two.
    #[test]
    fn dropped_response_resends_then_completes_exactly_once() {
        let mut table = WitemTable::new(4, 8);
        table.create(WitemId(1), WitemKind::LoadJ2J, 0, true).unwrap();
        table.get_mut(0).unwrap().protocol_states[0].0 = SendState::WaitingForResponse;
        table.get_mut(0).unwrap().current_tag = 8;
        table.get_mut(0).unwrap().ready_for_s1 = false;

        assert_eq!(
            handle_response_retry(&mut table, WitemId(1), 0),
            RxOutcome::Handled
        );
        let entry = table.get(0).unwrap();
        assert_eq!(entry.protocol_states[0].0, SendState::NeedToSend);
        assert!(entry.ready_for_s1);
        assert_eq!(entry.current_tag, 0, "cursor rewinds to the resent tag");

        // A second DROP before the resend actually lands is a no-op on an
        // already-NeedToSend tag, not a second recovery.
        assert_eq!(
            handle_response_retry(&mut table, WitemId(1), 0),
            RxOutcome::Protocol(ProtocolOutcome::Drop)
        );

        // Once resent and answered, the tag completes exactly once.
        table.get_mut(0).unwrap().protocol_states[0].0 = SendState::WaitingForResponse;
        assert_eq!(handle_response(&mut table, WitemId(1), 0), RxOutcome::Handled);
        assert_eq!(table.get(0).unwrap().protocol_states[0].0, SendState::Complete);
        assert_eq!(
            handle_response(&mut table, WitemId(1), 0),
            RxOutcome::Protocol(ProtocolOutcome::Drop),
            "completing twice is rejected, not silently repeated"
        );
    }
}
