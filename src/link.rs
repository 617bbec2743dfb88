//! Implementations of [`crate::protocol::SerialLink`] standing in for the infrared transceiver.
//!
//! * [`SimulatedIr`] joins two devices living in the same process, with configurable losses and interference.
//! * [`UdpLink`] joins two devices living in two processes, one datagram per byte.

use rand::distributions::BernoulliError;

pub use simulated::{ir_pair, IrConditions, SimulatedIr};
pub use udp::UdpLink;

mod simulated;
mod udp;

/// Errors encountered while setting up a link. Once a link is up, nothing about it is an error anymore : bytes are
/// simply lost.
#[derive(thiserror::Error, Debug)]
pub enum LinkError {
    /// This error happens when binding or connecting the socket fails.
    #[error("Socket error : {0}")]
    Io(#[from] std::io::Error),

    /// This error happens when a drop or noise chance is not a probability.
    #[error("Invalid link probability : {0}")]
    InvalidProbability(#[from] BernoulliError),

    /// This error happens when the noise chance is so high that draining the link would never end.
    #[error("A noise chance of {0} would never let the link go quiet")]
    NoiseTooHigh(f64),
}
