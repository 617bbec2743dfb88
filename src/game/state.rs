//! Encapsulation of a device's game state, and computation of its evolution on each tick.

use rand::rngs::StdRng;
use rand::SeedableRng;

pub use barrier::BarrierState;
pub use done::{MatchResult, Outcome};
pub use negotiation::NegotiationState;
pub use running::{RoundCounters, RunningState};

use super::engine::BallRedirector;
use super::{DisplaySurface, GameConfig, InputEvents};
use crate::protocol::{classify, Classified, ExpectedSet, LinkMessage, SerialLink};

mod barrier;
mod done;
mod negotiation;
mod running;

/// Current state - or stage - of the match on this device.
///
/// The stages follow each other as `RoleNegotiation -> Playing -> RoundBarrier -> Playing -> RoundBarrier ->
/// MatchOver`, the last one being terminal.
#[derive(Clone, Debug)]
pub(super) enum Phase {
    RoleNegotiation(NegotiationState),
    Playing(RunningState),
    RoundBarrier(BarrierState),
    MatchOver(MatchResult),
}

impl Phase {
    /// Create the phase a device starts in : choosing roles.
    pub(super) fn new() -> Self {
        Self::RoleNegotiation(NegotiationState::new())
    }

    /// Run one tick of the current stage and return the stage to be in for the next tick.
    pub(super) fn on_tick<T, L>(self, input: InputEvents, ctx: &mut TickContext<'_, T, L>) -> Self
    where
        T: super::engine::TrajectoryStepper,
        L: SerialLink + ?Sized,
    {
        match self {
            Self::RoleNegotiation(negotiation) => negotiation.on_tick(input, ctx),
            Self::Playing(running) => running.on_tick(input, ctx),
            Self::RoundBarrier(barrier) => barrier.on_tick(input, ctx),
            Self::MatchOver(result) => Self::MatchOver(result),
        }
    }

    pub(super) fn render<D: DisplaySurface + ?Sized>(&self, display: &mut D) {
        match self {
            Self::RoleNegotiation(negotiation) => display.show_text(negotiation.label()),
            Self::Playing(running) => running.render(display),
            Self::RoundBarrier(_) => display.show_text("CONTINUE"),
            Self::MatchOver(result) => display.show_text(result.outcome.text()),
        }
    }

    pub(super) fn name(&self) -> &'static str {
        match self {
            Self::RoleNegotiation(_) => "role negotiation",
            Self::Playing(_) => "playing",
            Self::RoundBarrier(_) => "round barrier",
            Self::MatchOver(_) => "match over",
        }
    }
}

/// Scores and progress carried across rounds.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct MatchTally {
    pub rounds_played: u8,
    /// Balls this device caught, summed over its catcher rounds.
    pub caught_total: u32,
    /// Sum of every score report received from the other device.
    pub peer_caught_total: u32,
}

/// Everything a stage needs from the coordinator to run a tick, borrowed for the duration of that tick.
pub(super) struct TickContext<'a, T, L: ?Sized> {
    pub log_id: &'a str,
    pub config: &'a GameConfig,
    pub link: &'a mut L,
    pub redirector: &'a BallRedirector<T>,
    pub rng: &'a mut StdRng,
    pub seed_tick: u8,
    pub tally: &'a mut MatchTally,
}

impl<T, L: SerialLink + ?Sized> TickContext<'_, T, L> {
    pub(super) fn send(&mut self, message: LinkMessage) {
        log::debug!("{}: Sending {message:?}.", self.log_id);
        self.link.send(message.into());
    }

    /// Read queued bytes until one classifies as an expected message. Noise is discarded on the way.
    pub(super) fn poll(&mut self, expected: ExpectedSet) -> Option<LinkMessage> {
        while let Some(byte) = self.link.try_receive() {
            match classify(byte, expected) {
                Classified::Message(message) => {
                    log::debug!("{}: Received {message:?}.", self.log_id);
                    return Some(message);
                }
                Classified::Noise(noise) => {
                    log::debug!("{}: Discarded noise byte {noise:#04x}.", self.log_id);
                }
            }
        }
        None
    }

    /// Drop everything received before the exchange about to start.
    pub(super) fn flush(&mut self, before: &str) {
        let discarded = self.link.flush_input();
        if discarded != 0 {
            log::debug!(
                "{}: Flushed {discarded} stale byte(s) before {before}.",
                self.log_id
            );
        }
    }

    /// Reseed the jitter generator from the tick counter, so that the two devices don't share a sequence.
    pub(super) fn reseed(&mut self) {
        *self.rng = StdRng::seed_from_u64(self.config.seed ^ u64::from(self.seed_tick));
    }
}
