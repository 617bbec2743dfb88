//! Single-byte encoding and decoding of the [`LinkMessage`]s exchanged between the two devices.
//!
//! A byte is split in a tag (high nibble) and a payload (low nibble). Every message kind owns a distinct tag, so a byte
//! belonging to one kind can never be read as another kind, whatever the receiver's state.

use crate::game::Role;
use crate::protocol::constants::{BALL_THROWS, MAX_DEVICE_ID, NUM_ROWS};

const TAG_MASK: u8 = 0xF0;
const PAYLOAD_MASK: u8 = 0x0F;

const ROLE_CLAIM_TAG: u8 = 0xA0;
const BALL_HANDOFF_TAG: u8 = 0xB0;
const SCORE_REPORT_TAG: u8 = 0xC0;
/// The round ready message has no payload, the whole byte is fixed.
const ROUND_READY_BYTE: u8 = 0xD5;

/// Set in a role claim's payload for a shooter, clear for a catcher. The bits below carry the device id.
const SHOOTER_BIT: u8 = 0x08;

/// Errors encountered when decoding a received byte. They never leave the protocol module : the classification turns
/// them into noise.
#[derive(thiserror::Error, Debug)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub enum DecodeError {
    #[error("Unknown message tag in byte `{0:#04x}`")]
    UnknownTag(u8),

    #[error("Ball handoff row {0} is outside of the matrix")]
    RowOutOfRange(u8),

    #[error("Score report of {0} exceeds the number of throws")]
    ScoreOutOfRange(u8),

    #[error("Round ready byte altered to `{0:#04x}`")]
    CorruptedReady(u8),
}

/// Every message of the link protocol, with its payload.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum LinkMessage {
    /// The sender announces the role it is taking. The device id breaks ties when both devices claim the same role.
    RoleClaim { role: Role, device_id: u8 },
    /// A ball enters the receiver's playfield at this row, as seen from the sender.
    BallHandoff { row: u8 },
    /// The sender's balls caught during the round it just completed as catcher.
    ScoreReport { caught: u8 },
    /// The sender reached the round barrier.
    RoundReady,
}

/// The kinds of [`LinkMessage`], without their payloads.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum MessageKind {
    RoleClaim,
    BallHandoff,
    ScoreReport,
    RoundReady,
}

impl LinkMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::RoleClaim { .. } => MessageKind::RoleClaim,
            Self::BallHandoff { .. } => MessageKind::BallHandoff,
            Self::ScoreReport { .. } => MessageKind::ScoreReport,
            Self::RoundReady => MessageKind::RoundReady,
        }
    }

    /// Decode a received byte. Every byte value either decodes to a message or to a [`DecodeError`].
    pub fn decode(byte: u8) -> Result<Self, DecodeError> {
        let payload = byte & PAYLOAD_MASK;
        match byte & TAG_MASK {
            ROLE_CLAIM_TAG => Ok(Self::RoleClaim {
                role: if payload & SHOOTER_BIT != 0 {
                    Role::Shooter
                } else {
                    Role::Catcher
                },
                device_id: payload & MAX_DEVICE_ID,
            }),
            BALL_HANDOFF_TAG if payload < NUM_ROWS => Ok(Self::BallHandoff { row: payload }),
            BALL_HANDOFF_TAG => Err(DecodeError::RowOutOfRange(payload)),
            SCORE_REPORT_TAG if payload <= BALL_THROWS => Ok(Self::ScoreReport { caught: payload }),
            SCORE_REPORT_TAG => Err(DecodeError::ScoreOutOfRange(payload)),
            tag if tag == ROUND_READY_BYTE & TAG_MASK => match byte {
                ROUND_READY_BYTE => Ok(Self::RoundReady),
                corrupted => Err(DecodeError::CorruptedReady(corrupted)),
            },
            _ => Err(DecodeError::UnknownTag(byte)),
        }
    }
}

impl From<LinkMessage> for u8 {
    /// Payloads are masked into their nibble, the game logic never builds out-of-range payloads.
    fn from(value: LinkMessage) -> Self {
        match value {
            LinkMessage::RoleClaim { role, device_id } => {
                let role_bit = match role {
                    Role::Catcher => 0,
                    Role::Shooter => SHOOTER_BIT,
                };
                ROLE_CLAIM_TAG | role_bit | (device_id & MAX_DEVICE_ID)
            }
            LinkMessage::BallHandoff { row } => BALL_HANDOFF_TAG | (row & PAYLOAD_MASK),
            LinkMessage::ScoreReport { caught } => SCORE_REPORT_TAG | (caught & PAYLOAD_MASK),
            LinkMessage::RoundReady => ROUND_READY_BYTE,
        }
    }
}
