use crate::game::engine::TrajectoryStepper;
use crate::game::{InputEvents, Role};
use crate::protocol::constants::ROUNDS_PER_MATCH;
use crate::protocol::{ExpectedSet, LinkMessage, MessageKind, SerialLink};

use super::{MatchResult, Phase, RunningState, TickContext};

/// Rendezvous between two rounds. Both devices must have sent their own [`LinkMessage::RoundReady`] and received the
/// other's, in any order, before roles flip.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BarrierState {
    finished_role: Role,
    sent: bool,
    received_peer: bool,
    dwell_ticks: u32,
}

impl BarrierState {
    pub(super) fn new(finished_role: Role) -> Self {
        Self {
            finished_role,
            sent: false,
            received_peer: false,
            dwell_ticks: 0,
        }
    }

    /// The role this device played in the round that just ended.
    pub fn finished_role(&self) -> Role {
        self.finished_role
    }

    pub fn sent(&self) -> bool {
        self.sent
    }

    pub fn received_peer(&self) -> bool {
        self.received_peer
    }

    pub(super) fn on_tick<T, L>(mut self, input: InputEvents, ctx: &mut TickContext<'_, T, L>) -> Phase
    where
        T: TrajectoryStepper,
        L: SerialLink + ?Sized,
    {
        if let Some(LinkMessage::RoundReady) = ctx.poll(ExpectedSet::only(MessageKind::RoundReady)) {
            if self.received_peer {
                log::debug!("{}: Ignoring a repeated round ready.", ctx.log_id);
            }
            self.received_peer = true;
        }

        self.dwell_ticks = self.dwell_ticks.saturating_add(1);
        let auto_ready = ctx
            .config
            .auto_ready_ticks
            .is_some_and(|ticks| self.dwell_ticks >= ticks);
        if !self.sent && (input.confirm || auto_ready) {
            ctx.send(LinkMessage::RoundReady);
            self.sent = true;
        }

        if !(self.sent && self.received_peer) {
            return Phase::RoundBarrier(self);
        }

        ctx.tally.rounds_played += 1;
        if ctx.tally.rounds_played >= ROUNDS_PER_MATCH {
            ctx.flush("the end screen");
            let result = MatchResult::new(ctx.tally.caught_total, ctx.tally.peer_caught_total);
            log::info!(
                "{}: Match over, {} caught against {} : {}.",
                ctx.log_id,
                result.caught,
                result.peer_caught,
                result.outcome.text()
            );
            Phase::MatchOver(result)
        } else {
            ctx.flush("the next round");
            let role = !self.finished_role;
            log::info!(
                "{}: Round {} done, switching to {role}.",
                ctx.log_id,
                ctx.tally.rounds_played
            );
            Phase::Playing(RunningState::new(role))
        }
    }
}
