//! Who pushes the navigation switch. The shipped [`Autopilot`] plays both roles with human-like delays.

use rand::distributions::{Bernoulli, BernoulliError, Distribution};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::game::{InputEvents, Ownership, Paddle, Role, Snapshot};

/// Source of the navigation switch events, asked once per tick.
pub trait Operator {
    fn next_input(&mut self, snapshot: &Snapshot) -> InputEvents;
}

/// Tunables of an [`Autopilot`], all durations in ticks.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OperatorProfile {
    pub preferred_role: Role,
    /// Time spent looking at the role selection before confirming.
    pub claim_delay: u32,
    /// Chance of moving the catcher paddle the right way at each decision.
    pub skill: f64,
    /// Time between two paddle decisions.
    pub reaction_ticks: u32,
    /// Time between a ball being loaded and fired.
    pub fire_cooldown: u32,
    /// Time spent on the barrier screen before confirming.
    pub ready_delay: u32,
}

impl Default for OperatorProfile {
    fn default() -> Self {
        Self {
            preferred_role: Role::Catcher,
            claim_delay: 150,
            skill: 0.7,
            reaction_ticks: 20,
            fire_cooldown: 90,
            ready_delay: 300,
        }
    }
}

/// Same as the `Snapshot` discriminant, plus the role, to notice stage changes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Stage {
    Negotiating,
    Playing(Role),
    AtBarrier,
    Over,
}

impl Stage {
    fn of(snapshot: &Snapshot) -> Self {
        match snapshot {
            Snapshot::Negotiating { .. } => Self::Negotiating,
            Snapshot::Playing { role, .. } => Self::Playing(*role),
            Snapshot::AtBarrier { .. } => Self::AtBarrier,
            Snapshot::Over(_) => Self::Over,
        }
    }
}

/// An operator driven by the device itself.
pub struct Autopilot {
    profile: OperatorProfile,
    skill_distribution: Bernoulli,
    wander_distribution: Bernoulli,
    rng: StdRng,
    stage: Stage,
    ticks_in_stage: u32,
    ticks_since_move: u32,
    ticks_loaded: u32,
}

impl Autopilot {
    pub fn new(profile: OperatorProfile, seed: u64) -> Result<Self, BernoulliError> {
        Ok(Self {
            profile,
            skill_distribution: Bernoulli::new(profile.skill)?,
            wander_distribution: Bernoulli::new(0.3)?,
            rng: StdRng::seed_from_u64(seed),
            stage: Stage::Negotiating,
            ticks_in_stage: 0,
            ticks_since_move: 0,
            ticks_loaded: 0,
        })
    }

    fn negotiate(&mut self, selected: Role) -> InputEvents {
        if selected != self.profile.preferred_role {
            InputEvents::UP
        } else if self.ticks_in_stage >= self.profile.claim_delay {
            InputEvents::CONFIRM
        } else {
            InputEvents::NONE
        }
    }

    /// Aim randomly, and fire once the cooldown is over.
    fn shoot(&mut self, loaded: bool) -> InputEvents {
        if !loaded {
            self.ticks_loaded = 0;
            return InputEvents::NONE;
        }
        self.ticks_loaded += 1;
        if self.ticks_loaded >= self.profile.fire_cooldown {
            self.ticks_loaded = 0;
            return InputEvents::CONFIRM;
        }
        if !self.ready_to_move() || !self.wander_distribution.sample(&mut self.rng) {
            return InputEvents::NONE;
        }
        match self.rng.gen() {
            true => InputEvents::UP,
            false => InputEvents::DOWN,
        }
    }

    /// Follow the ball's row, sometimes the wrong way.
    fn catch(&mut self, paddle: Paddle, ball_row: Option<u8>) -> InputEvents {
        let (Some(ball_row), Paddle::Catcher { top }) = (ball_row, paddle) else {
            return InputEvents::NONE;
        };
        if !self.ready_to_move() {
            return InputEvents::NONE;
        }
        let towards = if ball_row < top {
            InputEvents::UP
        } else if ball_row > top + 1 {
            InputEvents::DOWN
        } else {
            return InputEvents::NONE;
        };
        if self.skill_distribution.sample(&mut self.rng) {
            towards
        } else if towards == InputEvents::UP {
            InputEvents::DOWN
        } else {
            InputEvents::UP
        }
    }

    fn ready_to_move(&mut self) -> bool {
        self.ticks_since_move += 1;
        if self.ticks_since_move >= self.profile.reaction_ticks {
            self.ticks_since_move = 0;
            true
        } else {
            false
        }
    }
}

impl Operator for Autopilot {
    fn next_input(&mut self, snapshot: &Snapshot) -> InputEvents {
        let stage = Stage::of(snapshot);
        if stage != self.stage {
            self.stage = stage;
            self.ticks_in_stage = 0;
            self.ticks_loaded = 0;
        } else {
            self.ticks_in_stage = self.ticks_in_stage.saturating_add(1);
        }
        match *snapshot {
            Snapshot::Negotiating { selected } => self.negotiate(selected),
            Snapshot::Playing {
                role: Role::Shooter,
                ball,
                ..
            } => self.shoot(ball.is_idle()),
            Snapshot::Playing {
                role: Role::Catcher,
                paddle,
                ball,
                ..
            } => {
                let ball_row = (ball.ownership == Ownership::Local).then(|| ball.position.row());
                self.catch(paddle, ball_row)
            }
            Snapshot::AtBarrier { sent: false, .. } if self.ticks_in_stage >= self.profile.ready_delay => {
                InputEvents::CONFIRM
            }
            Snapshot::AtBarrier { .. } | Snapshot::Over(_) => InputEvents::NONE,
        }
    }
}
