//! Classification of received bytes against the messages a device is currently waiting for.

use super::wire::{LinkMessage, MessageKind};

/// Set of [`MessageKind`]s a device accepts in its current state. Anything else received is noise.
#[derive(Eq, PartialEq, Copy, Clone, Debug, Default)]
pub struct ExpectedSet {
    bits: u8,
}

impl ExpectedSet {
    pub const NONE: ExpectedSet = ExpectedSet { bits: 0 };

    const fn bit(kind: MessageKind) -> u8 {
        match kind {
            MessageKind::RoleClaim => 1 << 0,
            MessageKind::BallHandoff => 1 << 1,
            MessageKind::ScoreReport => 1 << 2,
            MessageKind::RoundReady => 1 << 3,
        }
    }

    pub const fn only(kind: MessageKind) -> Self {
        Self::NONE.with(kind)
    }

    pub const fn with(self, kind: MessageKind) -> Self {
        Self {
            bits: self.bits | Self::bit(kind),
        }
    }

    pub const fn contains(&self, kind: MessageKind) -> bool {
        self.bits & Self::bit(kind) != 0
    }
}

/// Outcome of the classification of a received byte.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum Classified {
    Message(LinkMessage),
    Noise(u8),
}

/// Classify a received byte. This is total : undecodable bytes and well-formed messages the state does not expect are
/// both [`Classified::Noise`].
pub fn classify(byte: u8, expected: ExpectedSet) -> Classified {
    match LinkMessage::decode(byte) {
        Ok(message) if expected.contains(message.kind()) => Classified::Message(message),
        Ok(message) => {
            log::trace!("Unexpected {:?} in byte {byte:#04x}.", message.kind());
            Classified::Noise(byte)
        }
        Err(e) => {
            log::trace!("Undecodable byte : {e}.");
            Classified::Noise(byte)
        }
    }
}
