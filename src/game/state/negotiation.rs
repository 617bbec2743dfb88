use crate::game::engine::TrajectoryStepper;
use crate::game::{InputEvents, Role};
use crate::protocol::{ExpectedSet, LinkMessage, MessageKind, SerialLink};

use super::{Phase, RunningState, TickContext};

/// Role selection before the first round. The first device to confirm takes the role it shows, the other one takes
/// the complement when the claim reaches it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct NegotiationState {
    selected: Role,
}

impl NegotiationState {
    pub(super) fn new() -> Self {
        Self {
            selected: Role::Catcher,
        }
    }

    pub fn selected(&self) -> Role {
        self.selected
    }

    pub(super) fn label(&self) -> &'static str {
        match self.selected {
            Role::Catcher => "C",
            Role::Shooter => "S",
        }
    }

    pub(super) fn on_tick<T, L>(mut self, input: InputEvents, ctx: &mut TickContext<'_, T, L>) -> Phase
    where
        T: TrajectoryStepper,
        L: SerialLink + ?Sized,
    {
        if let Some(LinkMessage::RoleClaim { role, device_id }) =
            ctx.poll(ExpectedSet::only(MessageKind::RoleClaim))
        {
            log::info!(
                "{}: Device {device_id} claimed the {role} role first. Playing as {}.",
                ctx.log_id,
                !role
            );
            return Phase::Playing(RunningState::new(!role));
        }
        if input.confirm {
            ctx.flush("the role claim");
            ctx.send(LinkMessage::RoleClaim {
                role: self.selected,
                device_id: ctx.config.device_id,
            });
            log::info!("{}: Claimed the {} role.", ctx.log_id, self.selected);
            return Phase::Playing(RunningState::claimed(self.selected));
        }
        if input.up != input.down {
            self.selected = !self.selected;
        }
        Phase::RoleNegotiation(self)
    }
}
