//! Messages of the link protocol : their byte encoding and their classification on reception.

pub use expected::{classify, Classified, ExpectedSet};
pub use wire::{DecodeError, LinkMessage, MessageKind};

mod expected;
mod wire;
