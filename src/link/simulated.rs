//! In-process infrared link, with losses and spurious bytes.

use rand::distributions::{Bernoulli, Distribution};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use super::LinkError;
use crate::protocol::SerialLink;

/// Highest accepted noise chance.
const MAX_NOISE_CHANCE: f64 = 0.5;

/// How badly the simulated transceivers behave.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IrConditions {
    /// Chance of a sent byte never arriving.
    pub drop_chance: f64,
    /// Chance, on each receive attempt, of picking up a random byte of interference.
    pub noise_chance: f64,
}

impl IrConditions {
    pub const PERFECT: IrConditions = IrConditions {
        drop_chance: 0.0,
        noise_chance: 0.0,
    };
}

/// One end of an in-process link. Bytes arrive in order, unless dropped.
pub struct SimulatedIr {
    outgoing: UnboundedSender<u8>,
    incoming: UnboundedReceiver<u8>,
    drop_distribution: Bernoulli,
    noise_distribution: Bernoulli,
    rng: StdRng,
}

/// Create the two ends of a link under the given conditions.
pub fn ir_pair(conditions: IrConditions, seed: u64) -> Result<(SimulatedIr, SimulatedIr), LinkError> {
    if conditions.noise_chance > MAX_NOISE_CHANCE {
        return Err(LinkError::NoiseTooHigh(conditions.noise_chance));
    }
    let drop_distribution = Bernoulli::new(conditions.drop_chance)?;
    let noise_distribution = Bernoulli::new(conditions.noise_chance)?;
    let (a_to_b_sender, a_to_b_receiver) = unbounded_channel();
    let (b_to_a_sender, b_to_a_receiver) = unbounded_channel();
    let a = SimulatedIr {
        outgoing: a_to_b_sender,
        incoming: b_to_a_receiver,
        drop_distribution,
        noise_distribution,
        rng: StdRng::seed_from_u64(seed),
    };
    let b = SimulatedIr {
        outgoing: b_to_a_sender,
        incoming: a_to_b_receiver,
        drop_distribution,
        noise_distribution,
        rng: StdRng::seed_from_u64(seed.wrapping_add(1)),
    };
    Ok((a, b))
}

impl SerialLink for SimulatedIr {
    fn send(&mut self, byte: u8) {
        if self.drop_distribution.sample(&mut self.rng) {
            log::trace!("Simulated infrared dropped byte {byte:#04x}.");
            return;
        }
        // A closed channel means the other device is gone, the byte is lost like any other.
        let _: Result<_, _> = self.outgoing.send(byte);
    }

    fn try_receive(&mut self) -> Option<u8> {
        if self.noise_distribution.sample(&mut self.rng) {
            return Some(self.rng.gen());
        }
        self.incoming.try_recv().ok()
    }
}
