//! The fixed-rate control loop of one device.
//!
//! A [`Device`] bundles a [`GameCoordinator`] with the peripherals it talks to : a [`SerialLink`] to the other device,
//! an [`Operator`] on the navigation switch and a [`LedMatrix`]. Each tick runs to completion - input, game, display -
//! before the next one starts.

use std::time::Duration;

use tokio::time::MissedTickBehavior;

pub use display::LedMatrix;
pub use operator::{Autopilot, Operator, OperatorProfile};

use crate::game::{GameCoordinator, MatchResult};
use crate::protocol::SerialLink;

mod display;
mod operator;

/// Errors preventing a device from running.
#[derive(thiserror::Error, Debug)]
pub enum DeviceError {
    #[error("The tick rate must be at least 1 Hz - got `{0}`")]
    InvalidTickRate(u32),
}

/// One device of the pair.
pub struct Device<L, O> {
    coordinator: GameCoordinator,
    link: L,
    operator: O,
    display: LedMatrix,
    ticks: u64,
}

impl<L: SerialLink, O: Operator> Device<L, O> {
    pub fn new(coordinator: GameCoordinator, link: L, operator: O) -> Self {
        Self {
            coordinator,
            link,
            operator,
            display: LedMatrix::new(),
            ticks: 0,
        }
    }

    pub fn display(&self) -> &LedMatrix {
        &self.display
    }

    /// Run a single tick. Returns the match result once the match is over.
    pub fn step(&mut self) -> Option<MatchResult> {
        self.ticks += 1;
        let input = self.operator.next_input(&self.coordinator.snapshot());
        self.coordinator.tick(input, &mut self.link);

        let previous_frame = self.display.clone();
        self.coordinator.render(&mut self.display);
        if self.display != previous_frame {
            log::trace!(
                "{}: Frame at tick {}\n{}",
                self.coordinator.log_id(),
                self.ticks,
                self.display
            );
        }
        self.coordinator.result()
    }

    /// Tick at `tick_rate` Hz until the match is over. Waiting for the other device has no timeout : if a message is
    /// lost, this only returns when the task is cancelled.
    pub async fn run(mut self, tick_rate: u32) -> Result<MatchResult, DeviceError> {
        if tick_rate == 0 {
            return Err(DeviceError::InvalidTickRate(tick_rate));
        }
        let mut tick_interval =
            tokio::time::interval(Duration::from_nanos(1_000_000_000 / u64::from(tick_rate)));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        log::info!(
            "{}: Device started, ticking at {tick_rate} Hz.",
            self.coordinator.log_id()
        );
        loop {
            tick_interval.tick().await;
            if let Some(result) = self.step() {
                log::info!(
                    "{}: {} after {} ticks.",
                    self.coordinator.log_id(),
                    result.outcome.text(),
                    self.ticks
                );
                return Ok(result);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameConfig, Outcome, Role};
    use crate::link::{ir_pair, IrConditions};

    fn autopilot(preferred_role: Role, claim_delay: u32, seed: u64) -> Autopilot {
        let profile = OperatorProfile {
            preferred_role,
            claim_delay,
            reaction_ticks: 2,
            fire_cooldown: 30,
            ready_delay: 10,
            ..OperatorProfile::default()
        };
        Autopilot::new(profile, seed).unwrap()
    }

    fn config(device_id: u8) -> GameConfig {
        GameConfig {
            device_id,
            ball_step_ticks: 4,
            seed: u64::from(device_id),
            ..GameConfig::default()
        }
    }

    #[test]
    fn two_autopilots_play_a_full_match() {
        let (link_a, link_b) = ir_pair(IrConditions::PERFECT, 3).unwrap();
        let mut a = Device::new(
            GameCoordinator::new("a", config(1)),
            link_a,
            autopilot(Role::Catcher, 5, 10),
        );
        let mut b = Device::new(
            GameCoordinator::new("b", config(2)),
            link_b,
            autopilot(Role::Shooter, 50, 20),
        );
        let (mut result_a, mut result_b) = (None, None);
        for _ in 0..200_000 {
            result_a = result_a.or_else(|| a.step());
            result_b = result_b.or_else(|| b.step());
            if result_a.is_some() && result_b.is_some() {
                break;
            }
        }
        let (result_a, result_b) = (result_a.unwrap(), result_b.unwrap());
        assert_eq!(result_a.caught, result_b.peer_caught);
        assert_eq!(result_b.caught, result_a.peer_caught);
        assert!(result_a.caught <= 12 && result_b.caught <= 12);
        let expected_b = match result_a.outcome {
            Outcome::Win => Outcome::Lose,
            Outcome::Lose => Outcome::Win,
            Outcome::Tie => Outcome::Tie,
        };
        assert_eq!(result_b.outcome, expected_b);
        assert_eq!(a.display().text(), Some(result_a.outcome.text()));
    }

    #[tokio::test]
    async fn zero_tick_rate_is_refused() {
        let (link, _other) = ir_pair(IrConditions::PERFECT, 0).unwrap();
        let device = Device::new(
            GameCoordinator::new("a", config(1)),
            link,
            autopilot(Role::Catcher, 5, 0),
        );
        assert!(matches!(
            device.run(0).await,
            Err(DeviceError::InvalidTickRate(0))
        ));
    }
}
