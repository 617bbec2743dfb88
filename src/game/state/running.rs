use std::cmp::Ordering;
use std::collections::VecDeque;

use crate::game::engine::{
    BallState, Course, Drift, Heading, Ownership, Position, StepOutcome, TrajectoryStepper,
};
use crate::game::paddle::{Direction, Paddle};
use crate::game::{DisplaySurface, InputEvents, Role};
use crate::protocol::constants::{BALL_THROWS, MIDDLE_ROW, NUM_COLUMNS, NUM_ROWS};
use crate::protocol::{ExpectedSet, LinkMessage, MessageKind, SerialLink};

use super::{BarrierState, Phase, TickContext};

/// Column where a loaded ball waits, right next to the shooter's paddle.
const LOADED_COLUMN: u8 = NUM_COLUMNS - 2;
/// Column where a ball handed off by the other device appears.
const ENTRY_COLUMN: u8 = 0;

/// Per-round counters, reset on every role switch.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RoundCounters {
    pub balls_thrown: u8,
    pub balls_received: u8,
    pub balls_caught: u8,
}

/// This structure encapsulates a round being played : role, paddle, ball and counters.
#[derive(Clone, Debug)]
pub struct RunningState {
    role: Role,
    paddle: Paddle,
    ball: BallState,
    ball_ticks: u32,
    /// Entry rows of balls handed off while the catcher was still simulating another one.
    pending_entries: VecDeque<u8>,
    counters: RoundCounters,
    /// Set when this device took its role by confirming it, until the other device's claim is read. Only then can both
    /// claims have crossed on the air.
    claim_open: bool,
}

impl RunningState {
    /// Creates a [`RunningState`] with the paddle of the given role in the middle of the matrix and no ball in play.
    pub(super) fn new(role: Role) -> Self {
        let paddle = Paddle::new(role);
        RunningState {
            role,
            paddle,
            ball: Self::idle_ball(paddle),
            ball_ticks: 0,
            pending_entries: VecDeque::new(),
            counters: RoundCounters::default(),
            claim_open: false,
        }
    }

    /// Same as [`Self::new`], for a role this device just claimed. A collision with the other device's claim can still
    /// be resolved until the round starts.
    pub(super) fn claimed(role: Role) -> Self {
        RunningState {
            claim_open: true,
            ..Self::new(role)
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn paddle(&self) -> Paddle {
        self.paddle
    }

    pub fn ball(&self) -> BallState {
        self.ball
    }

    pub fn counters(&self) -> RoundCounters {
        self.counters
    }

    /// A shooter's ball is loaded against the paddle. A catcher has no ball until one is handed off.
    fn idle_ball(paddle: Paddle) -> BallState {
        match paddle.aim_row() {
            Some(row) => BallState {
                position: Position::new(LOADED_COLUMN, row),
                heading: Heading::Idle,
                ownership: Ownership::Local,
            },
            None => BallState {
                position: Position::new(ENTRY_COLUMN, MIDDLE_ROW),
                heading: Heading::Idle,
                ownership: Ownership::Remote,
            },
        }
    }

    /// A colliding role claim is only still awaited by a device that claimed its role, while nothing has been played.
    fn expected(&self, rounds_played: u8) -> ExpectedSet {
        let expected = match self.role {
            Role::Shooter => ExpectedSet::only(MessageKind::ScoreReport),
            Role::Catcher => ExpectedSet::only(MessageKind::BallHandoff),
        };
        let untouched = self.counters.balls_thrown == 0
            && self.counters.balls_received == 0
            && self.ball.is_idle()
            && self.pending_entries.is_empty();
        if self.claim_open && rounds_played == 0 && untouched {
            expected.with(MessageKind::RoleClaim)
        } else {
            expected
        }
    }

    pub(super) fn on_tick<T, L>(mut self, input: InputEvents, ctx: &mut TickContext<'_, T, L>) -> Phase
    where
        T: TrajectoryStepper,
        L: SerialLink + ?Sized,
    {
        if input.up {
            if self.role == Role::Shooter {
                ctx.reseed();
            }
            self.paddle = self.paddle.moved(Direction::Up);
        }
        if input.down {
            self.paddle = self.paddle.moved(Direction::Down);
        }
        match self.role {
            Role::Shooter => self.shooter_tick(input, ctx),
            Role::Catcher => self.catcher_tick(ctx),
        }
    }

    fn shooter_tick<T, L>(mut self, input: InputEvents, ctx: &mut TickContext<'_, T, L>) -> Phase
    where
        T: TrajectoryStepper,
        L: SerialLink + ?Sized,
    {
        if self.ball.is_idle() {
            self.ball = Self::idle_ball(self.paddle);
            if input.confirm {
                self.fire(ctx);
            }
        } else {
            self.ball_ticks += 1;
            if self.ball_ticks >= ctx.config.ball_step_ticks {
                self.ball_ticks = 0;
                self.step_shot(ctx);
            }
        }

        match ctx.poll(self.expected(ctx.tally.rounds_played)) {
            Some(LinkMessage::ScoreReport { caught }) => {
                ctx.tally.peer_caught_total += u32::from(caught);
                log::info!(
                    "{}: The catcher reports {caught}/{BALL_THROWS} caught. Round over.",
                    ctx.log_id
                );
                Phase::RoundBarrier(BarrierState::new(Role::Shooter))
            }
            Some(LinkMessage::RoleClaim { role, device_id }) => self.on_role_claim(role, device_id, ctx),
            _ => Phase::Playing(self),
        }
    }

    fn fire<T, L>(&mut self, ctx: &mut TickContext<'_, T, L>)
    where
        T: TrajectoryStepper,
        L: SerialLink + ?Sized,
    {
        if self.counters.balls_thrown >= BALL_THROWS {
            log::trace!("{}: No ball left to throw this round.", ctx.log_id);
            return;
        }
        self.counters.balls_thrown += 1;
        self.ball.heading = Course::Westward.heading(Drift::Straight);
        self.ball_ticks = 0;
        log::debug!(
            "{}: Fired ball {}/{BALL_THROWS} from row {}.",
            ctx.log_id,
            self.counters.balls_thrown,
            self.ball.position.row()
        );
        self.step_shot(ctx);
    }

    /// Advance a fired ball, handing it off to the catcher once it stands on column 0.
    fn step_shot<T, L>(&mut self, ctx: &mut TickContext<'_, T, L>)
    where
        T: TrajectoryStepper,
        L: SerialLink + ?Sized,
    {
        match ctx.redirector.advance(self.ball, Course::Westward, &mut *ctx.rng) {
            StepOutcome::InFlight(ball) | StepOutcome::Arrived(ball) => self.ball = ball,
            StepOutcome::HandoffReady(ball) => {
                ctx.send(LinkMessage::BallHandoff {
                    row: ball.position.row(),
                });
                self.ball = Self::idle_ball(self.paddle);
            }
        }
    }

    fn catcher_tick<T, L>(mut self, ctx: &mut TickContext<'_, T, L>) -> Phase
    where
        T: TrajectoryStepper,
        L: SerialLink + ?Sized,
    {
        match ctx.poll(self.expected(ctx.tally.rounds_played)) {
            Some(LinkMessage::BallHandoff { row }) => {
                ctx.reseed();
                // The matrices face each other.
                let entry_row = NUM_ROWS - 1 - row;
                if self.ball.ownership == Ownership::Remote {
                    self.enter_ball(entry_row, ctx);
                } else if self.pending_entries.len() < usize::from(BALL_THROWS) {
                    self.pending_entries.push_back(entry_row);
                } else {
                    log::warn!("{}: Too many balls queued, dropping a handoff.", ctx.log_id);
                }
            }
            Some(LinkMessage::RoleClaim { role, device_id }) => {
                return self.on_role_claim(role, device_id, ctx);
            }
            _ => {}
        }

        if self.ball.ownership == Ownership::Remote {
            return Phase::Playing(self);
        }
        self.ball_ticks += 1;
        if self.ball_ticks < ctx.config.ball_step_ticks {
            return Phase::Playing(self);
        }
        self.ball_ticks = 0;
        match ctx.redirector.advance(self.ball, Course::Eastward, &mut *ctx.rng) {
            StepOutcome::InFlight(ball) => self.ball = ball,
            StepOutcome::Arrived(ball) => {
                self.ball = ball;
                self.counters.balls_received += 1;
                let caught = self.paddle.caught(&ball);
                if caught {
                    self.counters.balls_caught += 1;
                }
                log::debug!(
                    "{}: Ball {}/{BALL_THROWS} {} on row {}.",
                    ctx.log_id,
                    self.counters.balls_received,
                    if caught { "caught" } else { "missed" },
                    ball.position.row()
                );
                if self.counters.balls_received >= BALL_THROWS {
                    return self.end_round(ctx);
                }
            }
            StepOutcome::HandoffReady(_) => {
                self.ball = Self::idle_ball(self.paddle);
                if let Some(entry_row) = self.pending_entries.pop_front() {
                    self.enter_ball(entry_row, ctx);
                }
            }
        }
        Phase::Playing(self)
    }

    fn enter_ball<T, L>(&mut self, entry_row: u8, ctx: &mut TickContext<'_, T, L>)
    where
        T: TrajectoryStepper,
        L: SerialLink + ?Sized,
    {
        self.ball = ctx.redirector.stepper().init(
            ENTRY_COLUMN,
            entry_row,
            Course::Eastward.heading(Drift::Straight),
        );
        self.ball_ticks = 0;
    }

    /// The catcher received every ball : report the score and wait at the barrier.
    fn end_round<T, L>(self, ctx: &mut TickContext<'_, T, L>) -> Phase
    where
        L: SerialLink + ?Sized,
    {
        let caught = self.counters.balls_caught;
        ctx.flush("the score report");
        ctx.send(LinkMessage::ScoreReport { caught });
        ctx.tally.caught_total += u32::from(caught);
        log::info!(
            "{}: Received every ball, caught {caught}/{BALL_THROWS}. Round over.",
            ctx.log_id
        );
        Phase::RoundBarrier(BarrierState::new(Role::Catcher))
    }

    /// Both operators confirmed before either claim arrived : the lower device id becomes the catcher.
    fn on_role_claim<T, L>(mut self, peer_role: Role, peer_id: u8, ctx: &mut TickContext<'_, T, L>) -> Phase
    where
        L: SerialLink + ?Sized,
    {
        self.claim_open = false;
        if peer_role != self.role {
            log::debug!("{}: Late role claim agrees with ours.", ctx.log_id);
            return Phase::Playing(self);
        }
        let resolved = match ctx.config.device_id.cmp(&peer_id) {
            Ordering::Less => Role::Catcher,
            Ordering::Greater => Role::Shooter,
            Ordering::Equal => {
                log::error!(
                    "{}: Both devices claimed the {peer_role} role with the same id {peer_id}. Cannot break the tie.",
                    ctx.log_id
                );
                return Phase::Playing(self);
            }
        };
        log::warn!(
            "{}: Both devices claimed the {peer_role} role. Device {} plays as {resolved}.",
            ctx.log_id,
            ctx.config.device_id
        );
        if resolved == self.role {
            Phase::Playing(self)
        } else {
            Phase::Playing(RunningState::new(resolved))
        }
    }

    pub(super) fn render<D: DisplaySurface + ?Sized>(&self, display: &mut D) {
        display.clear();
        for cell in self.paddle.cells() {
            display.plot(cell, true);
        }
        if self.ball.ownership == Ownership::Local {
            display.plot(self.ball.position, true);
        }
    }
}
