//! The outgoing packet channel: a one-element skid buffer with explicit
//! ready/valid backpressure (§5, §6.3).
//!
//! At most one word is in flight per cycle. A header opens a packet body of
//! `length` payload words; a payload word arriving with no open body, or a
//! header arriving before the previous body has drained, is a
//! [`DesignFault`] — these are asserted, never silently recovered (§7).

use crate::common::DesignFault;
use crate::packet::Word;

/// A single-element skid buffer enforcing word-sequential packet emission.
#[derive(Debug, Default)]
pub struct PacketChannel {
    slot: Option<Word>,
    words_remaining: u32,
}

impl PacketChannel {
    /// Creates an empty, ready channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the channel can accept a new word this cycle (the skid slot
    /// is empty, i.e. the downstream consumer drained last cycle's word).
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.slot.is_none()
    }

    /// Pushes one word into the channel.
    ///
    /// # Errors
    ///
    /// - [`DesignFault::HeaderMidPacket`] if a header arrives while a
    ///   previous body still has payload words outstanding.
    /// - [`DesignFault::UnexpectedDataWord`] if a payload word arrives with
    ///   no open packet body.
    pub fn push(&mut self, word: Word) -> Result<(), DesignFault> {
        match word {
            Word::Header(header) => {
                if self.words_remaining > 0 {
                    return Err(DesignFault::HeaderMidPacket);
                }
                self.words_remaining = header.length;
                self.slot = Some(word);
            }
            Word::Payload(_) => {
                if self.words_remaining == 0 {
                    return Err(DesignFault::UnexpectedDataWord);
                }
                self.words_remaining -= 1;
                self.slot = Some(word);
            }
        }
        Ok(())
    }

    /// Drains the pending word, freeing the slot for the next cycle.
    pub fn take(&mut self) -> Option<Word> {
        self.slot.take()
    }

    /// Number of payload words still owed before the current body closes.
    #[must_use]
    pub fn words_remaining(&self) -> u32 {
        self.words_remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::PacketHeader;

    #[test]
    fn header_then_payload_drains_in_order() {
        let mut ch = PacketChannel::new();
        ch.push(Word::Header(PacketHeader::normal(1, 0, 1))).unwrap();
        assert!(!ch.is_ready());
        assert_eq!(ch.take(), Some(Word::Header(PacketHeader::normal(1, 0, 1))));
        assert!(ch.is_ready());

        ch.push(Word::Payload(42)).unwrap();
        assert_eq!(ch.take(), Some(Word::Payload(42)));
        assert_eq!(ch.words_remaining(), 0);
    }

    #[test]
    fn header_mid_packet_is_a_design_fault() {
        let mut ch = PacketChannel::new();
        ch.push(Word::Header(PacketHeader::normal(2, 0, 0))).unwrap();
        ch.take();
        let err = ch
            .push(Word::Header(PacketHeader::normal(1, 0, 0)))
            .unwrap_err();
        assert_eq!(err, DesignFault::HeaderMidPacket);
    }

    #[test]
    fn unexpected_payload_with_no_open_body_errors() {
        let mut ch = PacketChannel::new();
        let err = ch.push(Word::Payload(1)).unwrap_err();
        assert_eq!(err, DesignFault::UnexpectedDataWord);
    }
}
