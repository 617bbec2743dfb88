//! Implementation of the device-to-device link protocol
//!
//! This module provides the single-byte messages exchanged over the infrared link and the helpers around them :
//! * [`LinkMessage`], the tagged message enum, converted to a byte with [`u8::from`] and back with
//!   [`LinkMessage::decode`]. This is the only place raw bytes turn into messages.
//! * [`classify`], which checks a received byte against the [`ExpectedSet`] of the receiver's current state, turning
//!   everything unexpected into noise.
//! * [`SerialLink`], the non-blocking byte channel the game talks through.
//!
//! The game constants both devices must agree on live in [`constants`].

pub use link::SerialLink;
pub use messages::{classify, Classified, DecodeError, ExpectedSet, LinkMessage, MessageKind};

pub mod constants;
mod link;
mod messages;
