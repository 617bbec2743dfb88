//! Implementation of the logic of the catch game on one device.
//!
//! This mod exposes the [`GameCoordinator`], the per-device state machine ticked by the device loop, together with
//! the interfaces it consumes every tick : [`InputEvents`] from the navigation switch, a
//! [`crate::protocol::SerialLink`] to the other device and a [`DisplaySurface`] to draw on. The round logic is
//! implemented below in sub-mods.

use rand::rngs::StdRng;
use rand::SeedableRng;

pub use engine::{
    BallRedirector, BallState, BoingStepper, Heading, Ownership, Position, TrajectoryStepper,
};
pub use paddle::Paddle;
pub use role::Role;
pub use state::{MatchResult, MatchTally, Outcome, RoundCounters};

use state::{Phase, TickContext};

use crate::protocol::constants::{
    ball_step_ticks, DEFAULT_BALL_SPEED, DEFAULT_TICK_RATE, JUMP_CHANCE,
};
use crate::protocol::SerialLink;

mod engine;
mod paddle;
mod role;
mod state;

/// Debounced edge events of the navigation switch during one tick.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct InputEvents {
    pub up: bool,
    pub down: bool,
    pub confirm: bool,
}

impl InputEvents {
    pub const NONE: InputEvents = InputEvents {
        up: false,
        down: false,
        confirm: false,
    };
    pub const UP: InputEvents = InputEvents {
        up: true,
        ..Self::NONE
    };
    pub const DOWN: InputEvents = InputEvents {
        down: true,
        ..Self::NONE
    };
    pub const CONFIRM: InputEvents = InputEvents {
        confirm: true,
        ..Self::NONE
    };
}

/// The LED matrix, as drawn on by the game.
pub trait DisplaySurface {
    fn clear(&mut self);

    fn plot(&mut self, position: Position, on: bool);

    /// Replace the matrix content by a scrolling text.
    fn show_text(&mut self, text: &str);
}

/// Settings of a device, fixed for a whole match.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GameConfig {
    /// Identity sent in role claims, used to break a claim collision.
    pub device_id: u8,
    /// Ticks between two steps of the ball.
    pub ball_step_ticks: u32,
    /// Ticks spent at the round barrier before signalling ready without the operator's confirmation.
    pub auto_ready_ticks: Option<u32>,
    /// Percentage of ball steps jumping to each diagonal heading.
    pub jump_chance: u8,
    /// Mixed into every seed of the jitter generator.
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            ball_step_ticks: ball_step_ticks(DEFAULT_TICK_RATE, DEFAULT_BALL_SPEED),
            auto_ready_ticks: None,
            jump_chance: JUMP_CHANCE,
            seed: 0,
        }
    }
}

/// Read-only picture of the coordinator, taken between two ticks.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Snapshot {
    Negotiating {
        selected: Role,
    },
    Playing {
        role: Role,
        paddle: Paddle,
        ball: BallState,
        counters: RoundCounters,
    },
    AtBarrier {
        finished_role: Role,
        sent: bool,
        received_peer: bool,
    },
    Over(MatchResult),
}

/// The per-device game state machine. It owns every piece of mutable game state and is driven by [`Self::tick`] at a
/// fixed rate.
pub struct GameCoordinator<T = BoingStepper> {
    log_id: String,
    config: GameConfig,
    phase: Phase,
    tally: MatchTally,
    redirector: BallRedirector<T>,
    rng: StdRng,
    seed_tick: u8,
}

impl GameCoordinator<BoingStepper> {
    pub fn new(log_id: impl Into<String>, config: GameConfig) -> Self {
        Self::with_stepper(log_id, config, BoingStepper)
    }
}

impl<T: TrajectoryStepper> GameCoordinator<T> {
    pub fn with_stepper(log_id: impl Into<String>, config: GameConfig, stepper: T) -> Self {
        Self {
            log_id: log_id.into(),
            config,
            phase: Phase::new(),
            tally: MatchTally::default(),
            redirector: BallRedirector::with_jump_chance(stepper, config.jump_chance),
            rng: StdRng::seed_from_u64(config.seed),
            seed_tick: 0,
        }
    }

    /// Run one tick : poll the link, apply the inputs, move the ball and transition if needed. Never blocks.
    pub fn tick<L: SerialLink + ?Sized>(&mut self, input: InputEvents, link: &mut L) {
        self.seed_tick = self.seed_tick.wrapping_add(1);
        let previous = self.phase.name();
        let mut ctx = TickContext {
            log_id: &self.log_id,
            config: &self.config,
            link,
            redirector: &self.redirector,
            rng: &mut self.rng,
            seed_tick: self.seed_tick,
            tally: &mut self.tally,
        };
        // The placeholder is overwritten before anyone can observe it.
        let phase = std::mem::replace(&mut self.phase, Phase::new());
        self.phase = phase.on_tick(input, &mut ctx);
        if self.phase.name() != previous {
            log::trace!("{}: {previous} -> {}.", self.log_id, self.phase.name());
        }
    }

    /// Draw the current state. The whole matrix is redrawn, so nothing trails behind a moving ball.
    pub fn render<D: DisplaySurface + ?Sized>(&self, display: &mut D) {
        self.phase.render(display);
    }

    pub fn snapshot(&self) -> Snapshot {
        match &self.phase {
            Phase::RoleNegotiation(negotiation) => Snapshot::Negotiating {
                selected: negotiation.selected(),
            },
            Phase::Playing(running) => Snapshot::Playing {
                role: running.role(),
                paddle: running.paddle(),
                ball: running.ball(),
                counters: running.counters(),
            },
            Phase::RoundBarrier(barrier) => Snapshot::AtBarrier {
                finished_role: barrier.finished_role(),
                sent: barrier.sent(),
                received_peer: barrier.received_peer(),
            },
            Phase::MatchOver(result) => Snapshot::Over(*result),
        }
    }

    /// The role played in the current round, if a round is being played.
    pub fn role(&self) -> Option<Role> {
        match &self.phase {
            Phase::Playing(running) => Some(running.role()),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<MatchResult> {
        match &self.phase {
            Phase::MatchOver(result) => Some(*result),
            _ => None,
        }
    }

    pub fn tally(&self) -> MatchTally {
        self.tally
    }

    pub fn log_id(&self) -> &str {
        &self.log_id
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;
    use crate::link::{ir_pair, IrConditions, SimulatedIr};
    use crate::protocol::constants::BALL_THROWS;
    use crate::protocol::LinkMessage;

    /// Straight balls, one step per tick.
    fn config(device_id: u8) -> GameConfig {
        GameConfig {
            device_id,
            ball_step_ticks: 1,
            jump_chance: 0,
            seed: u64::from(device_id),
            ..GameConfig::default()
        }
    }

    fn run(coordinator: &mut GameCoordinator, link: &mut SimulatedIr, ticks: usize) {
        for _ in 0..ticks {
            coordinator.tick(InputEvents::NONE, link);
        }
    }

    fn received_bytes(link: &mut SimulatedIr) -> Vec<u8> {
        std::iter::from_fn(|| link.try_receive()).collect()
    }

    fn counters(coordinator: &GameCoordinator) -> RoundCounters {
        match coordinator.snapshot() {
            Snapshot::Playing { counters, .. } => counters,
            snapshot => panic!("Not playing : {snapshot:?}"),
        }
    }

    /// A catcher of id 1 whose other end of the link is driven by hand.
    fn scripted_catcher() -> (GameCoordinator, SimulatedIr, SimulatedIr) {
        let (mut link, mut peer) = ir_pair(IrConditions::PERFECT, 0).unwrap();
        let mut catcher = GameCoordinator::new("catcher", config(1));
        catcher.tick(InputEvents::CONFIRM, &mut link);
        assert_eq!(catcher.role(), Some(Role::Catcher));
        assert_eq!(
            received_bytes(&mut peer),
            vec![u8::from(LinkMessage::RoleClaim {
                role: Role::Catcher,
                device_id: 1
            })]
        );
        (catcher, link, peer)
    }

    fn hand_off(peer: &mut SimulatedIr, rows: &[u8]) {
        for &row in rows {
            peer.send(LinkMessage::BallHandoff { row }.into());
        }
    }

    #[test]
    fn first_claim_decides_both_roles() {
        for first_pick in [Role::Catcher, Role::Shooter] {
            for a_confirms_first in [true, false] {
                let (mut link_a, mut link_b) = ir_pair(IrConditions::PERFECT, 0).unwrap();
                let mut a = GameCoordinator::new("a", config(1));
                let mut b = GameCoordinator::new("b", config(2));
                let (first, first_link, second, second_link) = if a_confirms_first {
                    (&mut a, &mut link_a, &mut b, &mut link_b)
                } else {
                    (&mut b, &mut link_b, &mut a, &mut link_a)
                };
                let first_inputs = match first_pick {
                    Role::Catcher => vec![InputEvents::CONFIRM],
                    Role::Shooter => vec![InputEvents::UP, InputEvents::CONFIRM],
                };
                for input in first_inputs {
                    first.tick(input, &mut *first_link);
                    second.tick(InputEvents::NONE, &mut *second_link);
                }
                assert_eq!(first.role(), Some(first_pick));
                assert_eq!(second.role(), Some(!first_pick));
            }
        }
    }

    #[test]
    fn adopted_role_ignores_a_stray_claim() {
        let (mut link_a, mut link_b) = ir_pair(IrConditions::PERFECT, 0).unwrap();
        let mut a = GameCoordinator::new("a", config(1));
        let mut b = GameCoordinator::new("b", config(2));
        a.tick(InputEvents::CONFIRM, &mut link_a);
        b.tick(InputEvents::NONE, &mut link_b);
        assert_eq!(b.role(), Some(Role::Shooter));

        // Interference reading as a shooter claim from device 3.
        link_a.send(0xAB);
        run(&mut a, &mut link_a, 5);
        run(&mut b, &mut link_b, 5);
        assert_eq!(a.role(), Some(Role::Catcher));
        assert_eq!(b.role(), Some(Role::Shooter));
    }

    #[test]
    fn claim_collision_goes_to_the_lower_id() {
        for claimed in [Role::Catcher, Role::Shooter] {
            let input = match claimed {
                Role::Catcher => InputEvents::NONE,
                Role::Shooter => InputEvents::UP,
            };
            // Two links relayed by hand, so that both claims are in flight at once.
            let (mut link_a, mut air_a) = ir_pair(IrConditions::PERFECT, 0).unwrap();
            let (mut link_b, mut air_b) = ir_pair(IrConditions::PERFECT, 0).unwrap();
            let mut a = GameCoordinator::new("a", config(5));
            let mut b = GameCoordinator::new("b", config(2));
            a.tick(input, &mut link_a);
            b.tick(input, &mut link_b);
            a.tick(InputEvents::CONFIRM, &mut link_a);
            b.tick(InputEvents::CONFIRM, &mut link_b);
            assert_eq!(a.role(), Some(claimed));
            assert_eq!(b.role(), Some(claimed));
            for byte in received_bytes(&mut air_a) {
                air_b.send(byte);
            }
            for byte in received_bytes(&mut air_b) {
                air_a.send(byte);
            }
            a.tick(InputEvents::NONE, &mut link_a);
            b.tick(InputEvents::NONE, &mut link_b);
            assert_eq!(a.role(), Some(Role::Shooter));
            assert_eq!(b.role(), Some(Role::Catcher));

            // Once resolved, a repeated claim from device 0 cannot flip the catcher anymore.
            air_b.send(LinkMessage::RoleClaim {
                role: Role::Catcher,
                device_id: 0,
            }
            .into());
            run(&mut b, &mut link_b, 3);
            assert_eq!(b.role(), Some(Role::Catcher));
        }
    }

    #[test]
    fn catcher_reports_its_score_after_exactly_twelve_balls() {
        let (mut catcher, mut link, mut peer) = scripted_catcher();
        // Row 3 lands on the paddle in the middle, row 0 enters on row 6 and is missed.
        hand_off(&mut peer, &[3, 0, 3, 0, 3, 0, 3, 0, 3, 0, 3]);
        run(&mut catcher, &mut link, 200);
        let counters = counters(&catcher);
        assert_eq!(counters.balls_received, 11);
        assert_eq!(counters.balls_caught, 6);
        assert!(received_bytes(&mut peer).is_empty());

        hand_off(&mut peer, &[3]);
        run(&mut catcher, &mut link, 20);
        assert_eq!(
            catcher.snapshot(),
            Snapshot::AtBarrier {
                finished_role: Role::Catcher,
                sent: false,
                received_peer: false
            }
        );
        assert_eq!(
            received_bytes(&mut peer),
            vec![u8::from(LinkMessage::ScoreReport { caught: 7 })]
        );
        assert_eq!(catcher.tally().caught_total, 7);
    }

    #[test]
    fn any_hit_miss_sequence_ends_on_the_twelfth_ball() {
        let mut rng = rand::thread_rng();
        for _ in 0..10 {
            let hits: Vec<bool> = (0..BALL_THROWS).map(|_| rng.gen()).collect();
            // Row 3 enters on the paddle, row 0 enters on row 6.
            let rows: Vec<u8> = hits.iter().map(|&hit| if hit { 3 } else { 0 }).collect();
            let (mut catcher, mut link, mut peer) = scripted_catcher();
            for (index, &row) in rows.iter().enumerate() {
                assert!(matches!(catcher.snapshot(), Snapshot::Playing { .. }));
                assert_eq!(counters(&catcher).balls_received, index as u8);
                hand_off(&mut peer, &[row]);
                run(&mut catcher, &mut link, 10);
            }
            let caught = hits.iter().filter(|&&hit| hit).count() as u8;
            assert!(matches!(catcher.snapshot(), Snapshot::AtBarrier { .. }));
            assert_eq!(
                received_bytes(&mut peer),
                vec![u8::from(LinkMessage::ScoreReport { caught })]
            );
        }
    }

    #[test]
    fn noise_between_handoffs_is_ignored() {
        let (mut catcher, mut link, mut peer) = scripted_catcher();
        for row in [3, 3, 3] {
            // Ready and score tags, unexpected while catching.
            peer.send(0xD5);
            peer.send(0xC4);
            peer.send(LinkMessage::BallHandoff { row }.into());
            peer.send(0x17);
        }
        run(&mut catcher, &mut link, 100);
        let counters = counters(&catcher);
        assert_eq!(counters.balls_received, 3);
        assert_eq!(counters.balls_caught, 3);
    }

    #[test]
    fn handoff_is_noise_for_a_shooter() {
        let (mut link, mut peer) = ir_pair(IrConditions::PERFECT, 0).unwrap();
        let mut shooter = GameCoordinator::new("shooter", config(1));
        shooter.tick(InputEvents::UP, &mut link);
        shooter.tick(InputEvents::CONFIRM, &mut link);
        assert_eq!(shooter.role(), Some(Role::Shooter));
        let before = shooter.snapshot();
        hand_off(&mut peer, &[3, 3]);
        run(&mut shooter, &mut link, 10);
        assert_eq!(shooter.snapshot(), before);
    }

    #[test]
    fn shooter_throws_twelve_balls_then_waits_for_the_score() {
        let (mut link, mut peer) = ir_pair(IrConditions::PERFECT, 0).unwrap();
        let mut shooter = GameCoordinator::new("shooter", config(1));
        shooter.tick(InputEvents::UP, &mut link);
        shooter.tick(InputEvents::CONFIRM, &mut link);
        received_bytes(&mut peer);
        for _ in 0..20 {
            shooter.tick(InputEvents::CONFIRM, &mut link);
            run(&mut shooter, &mut link, 5);
        }
        assert_eq!(counters(&shooter).balls_thrown, 12);
        let handoffs = received_bytes(&mut peer);
        assert_eq!(handoffs.len(), 12);
        assert!(handoffs
            .iter()
            .all(|&byte| byte == u8::from(LinkMessage::BallHandoff { row: 3 })));

        peer.send(LinkMessage::ScoreReport { caught: 5 }.into());
        shooter.tick(InputEvents::NONE, &mut link);
        assert!(matches!(shooter.snapshot(), Snapshot::AtBarrier { .. }));
        assert_eq!(shooter.tally().peer_caught_total, 5);
    }

    #[test]
    fn barrier_waits_for_the_other_device() {
        let (mut catcher, mut link, mut peer) = scripted_catcher();
        hand_off(&mut peer, &[3; 12]);
        run(&mut catcher, &mut link, 200);
        received_bytes(&mut peer);

        catcher.tick(InputEvents::CONFIRM, &mut link);
        run(&mut catcher, &mut link, 500);
        assert_eq!(
            catcher.snapshot(),
            Snapshot::AtBarrier {
                finished_role: Role::Catcher,
                sent: true,
                received_peer: false
            }
        );
        assert_eq!(received_bytes(&mut peer), vec![u8::from(LinkMessage::RoundReady)]);

        peer.send(LinkMessage::RoundReady.into());
        catcher.tick(InputEvents::NONE, &mut link);
        assert_eq!(catcher.role(), Some(Role::Shooter));
        assert_eq!(catcher.tally().rounds_played, 1);
    }

    #[test]
    fn barrier_accepts_the_other_ready_first() {
        let (mut catcher, mut link, mut peer) = scripted_catcher();
        hand_off(&mut peer, &[3; 12]);
        run(&mut catcher, &mut link, 200);

        peer.send(LinkMessage::RoundReady.into());
        run(&mut catcher, &mut link, 3);
        assert!(matches!(
            catcher.snapshot(),
            Snapshot::AtBarrier {
                sent: false,
                received_peer: true,
                ..
            }
        ));
        catcher.tick(InputEvents::CONFIRM, &mut link);
        assert_eq!(catcher.role(), Some(Role::Shooter));
    }

    #[test]
    fn auto_ready_confirms_the_barrier() {
        let (mut link, mut peer) = ir_pair(IrConditions::PERFECT, 0).unwrap();
        let mut catcher = GameCoordinator::new(
            "catcher",
            GameConfig {
                auto_ready_ticks: Some(10),
                ..config(1)
            },
        );
        catcher.tick(InputEvents::CONFIRM, &mut link);
        hand_off(&mut peer, &[3; 12]);
        run(&mut catcher, &mut link, 200);
        assert!(matches!(
            catcher.snapshot(),
            Snapshot::AtBarrier { sent: true, .. }
        ));
    }

    #[test]
    fn two_scripted_rounds_end_in_a_tie() {
        let (mut link_a, mut link_b) = ir_pair(IrConditions::PERFECT, 0).unwrap();
        let mut a = GameCoordinator::new("a", config(1));
        let mut b = GameCoordinator::new("b", config(2));
        a.tick(InputEvents::CONFIRM, &mut link_a);
        b.tick(InputEvents::NONE, &mut link_b);
        assert_eq!(b.role(), Some(Role::Shooter));

        // Each shooter fires twelve balls straight from the middle row, landing on the catcher's paddle.
        for round in 0..2 {
            let mut guard = 0;
            while a.result().is_none() || b.result().is_none() {
                guard += 1;
                assert!(guard < 10_000, "Stuck in round {round}");
                let confirm = if guard % 8 == 0 {
                    InputEvents::CONFIRM
                } else {
                    InputEvents::NONE
                };
                a.tick(confirm, &mut link_a);
                b.tick(confirm, &mut link_b);
                if a.tally().rounds_played > round && b.tally().rounds_played > round {
                    break;
                }
            }
        }
        let (result_a, result_b) = (a.result().unwrap(), b.result().unwrap());
        assert_eq!(result_a.caught, 12);
        assert_eq!(result_a.peer_caught, 12);
        assert_eq!(result_a.outcome, Outcome::Tie);
        assert_eq!(result_b.outcome, Outcome::Tie);
    }

    #[test]
    fn nothing_but_a_claim_leaves_the_negotiation() {
        let (mut link, mut peer) = ir_pair(IrConditions::PERFECT, 0).unwrap();
        let mut device = GameCoordinator::new("device", config(1));
        for byte in [0xD5, 0xC7, 0xB3, 0x00, 0xFF] {
            peer.send(byte);
        }
        run(&mut device, &mut link, 10);
        assert_eq!(
            device.snapshot(),
            Snapshot::Negotiating {
                selected: Role::Catcher
            }
        );
    }
}
