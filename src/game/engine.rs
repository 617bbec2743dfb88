//! Implementation of the ball movement on a device's playfield : trajectory stepping and random redirection.

use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use crate::game::Role;
use crate::protocol::constants::{NUM_COLUMNS, NUM_ROWS};

/// A cell of the LED matrix. Both coordinates are always within the matrix.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct Position {
    column: u8,
    row: u8,
}

impl Position {
    /// Create a [`Position`], clamping both coordinates into the matrix.
    pub fn new(column: u8, row: u8) -> Self {
        Self {
            column: column.min(NUM_COLUMNS - 1),
            row: row.min(NUM_ROWS - 1),
        }
    }

    pub fn column(&self) -> u8 {
        self.column
    }

    pub fn row(&self) -> u8 {
        self.row
    }
}

/// Direction in which the ball moves on each step. North is towards row 0.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum Heading {
    West,
    East,
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
    Idle,
}

impl Heading {
    pub fn column_delta(self) -> i8 {
        match self {
            Self::West | Self::NorthWest | Self::SouthWest => -1,
            Self::East | Self::NorthEast | Self::SouthEast => 1,
            Self::Idle => 0,
        }
    }

    pub fn row_delta(self) -> i8 {
        match self {
            Self::NorthWest | Self::NorthEast => -1,
            Self::SouthWest | Self::SouthEast => 1,
            Self::West | Self::East | Self::Idle => 0,
        }
    }

    /// The same heading with its vertical component reversed, as after a bounce on the top or bottom row.
    pub fn flip_vertical(self) -> Self {
        match self {
            Self::NorthWest => Self::SouthWest,
            Self::SouthWest => Self::NorthWest,
            Self::NorthEast => Self::SouthEast,
            Self::SouthEast => Self::NorthEast,
            other => other,
        }
    }
}

/// The column-wise direction a ball travels on a device, fixed by the device's role.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum Course {
    /// Shooter side : from the shooter's paddle towards column 0, where it leaves for the other device.
    Westward,
    /// Catcher side : from column 0, where it enters, towards the catcher's paddle.
    Eastward,
}

/// Vertical component of a heading chosen by the redirector.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum Drift {
    Straight,
    Up,
    Down,
}

impl Course {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Shooter => Self::Westward,
            Role::Catcher => Self::Eastward,
        }
    }

    /// The column at which a ball travelling this course leaves the playfield.
    pub fn boundary_column(self) -> u8 {
        match self {
            Self::Westward => 0,
            Self::Eastward => NUM_COLUMNS - 1,
        }
    }

    pub fn heading(self, drift: Drift) -> Heading {
        match (self, drift) {
            (Self::Westward, Drift::Straight) => Heading::West,
            (Self::Westward, Drift::Up) => Heading::NorthWest,
            (Self::Westward, Drift::Down) => Heading::SouthWest,
            (Self::Eastward, Drift::Straight) => Heading::East,
            (Self::Eastward, Drift::Up) => Heading::NorthEast,
            (Self::Eastward, Drift::Down) => Heading::SouthEast,
        }
    }
}

/// Which device simulates the ball. A ball is only ever simulated by one device at a time.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum Ownership {
    Local,
    Remote,
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct BallState {
    pub position: Position,
    pub heading: Heading,
    pub ownership: Ownership,
}

impl BallState {
    pub fn is_idle(&self) -> bool {
        self.heading == Heading::Idle
    }
}

/// Moves a ball by exactly one cell, bouncing off the top and bottom rows.
pub trait TrajectoryStepper {
    fn init(&self, column: u8, row: u8, heading: Heading) -> BallState {
        BallState {
            position: Position::new(column, row),
            heading,
            ownership: Ownership::Local,
        }
    }

    fn step(&self, ball: BallState) -> BallState;
}

/// The bouncing stepper of the LED matrix toolkit. Columns saturate at the matrix edges : the owner of the ball
/// repositions it before it could go further.
#[derive(Copy, Clone, Debug, Default)]
pub struct BoingStepper;

impl TrajectoryStepper for BoingStepper {
    fn step(&self, mut ball: BallState) -> BallState {
        let column = match ball.heading.column_delta() {
            -1 => ball.position.column.saturating_sub(1),
            1 => (ball.position.column + 1).min(NUM_COLUMNS - 1),
            _ => ball.position.column,
        };
        let last_row = i16::from(NUM_ROWS - 1);
        let mut row = i16::from(ball.position.row) + i16::from(ball.heading.row_delta());
        if row < 0 {
            row = -row;
            ball.heading = ball.heading.flip_vertical();
        } else if row > last_row {
            row = 2 * last_row - row;
            ball.heading = ball.heading.flip_vertical();
        }
        // Cannot fail, the reflected row is back within the matrix.
        ball.position = Position::new(column, u8::try_from(row).unwrap_or(0));
        ball
    }
}

/// What happened to the ball on a call to [`BallRedirector::advance`].
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum StepOutcome {
    /// The ball moved and is still crossing the playfield.
    InFlight(BallState),
    /// The ball moved onto the boundary column on this step.
    Arrived(BallState),
    /// The ball was already on the boundary column and did not move. The caller must hand it off or retire it.
    HandoffReady(BallState),
}

/// Wraps a [`TrajectoryStepper`] with a random change of heading after each step.
///
/// Keeps the draw distribution around, like the rest of the engine's random generators.
#[derive(Clone)]
pub struct BallRedirector<T> {
    stepper: T,
    draw_distribution: Uniform<u8>,
    jump_chance: u8,
}

impl<T: TrajectoryStepper> BallRedirector<T> {
    /// `jump_chance` is the percentage of steps ending up in each of the two diagonal headings. Capped at 50.
    pub fn with_jump_chance(stepper: T, jump_chance: u8) -> Self {
        Self {
            stepper,
            draw_distribution: Uniform::new_inclusive(1, 100),
            jump_chance: jump_chance.min(50),
        }
    }

    pub fn stepper(&self) -> &T {
        &self.stepper
    }

    /// Advance a locally owned, fired ball by one step along the given course.
    pub fn advance<R: Rng + ?Sized>(&self, ball: BallState, course: Course, rng: &mut R) -> StepOutcome {
        debug_assert_eq!(ball.ownership, Ownership::Local);
        let boundary = course.boundary_column();
        if ball.position.column == boundary {
            return StepOutcome::HandoffReady(ball);
        }
        let mut ball = self.stepper.step(ball);
        if ball.position.column == boundary {
            return StepOutcome::Arrived(ball);
        }
        ball.heading = self.heading_for_draw(course, self.draw_distribution.sample(rng));
        StepOutcome::InFlight(ball)
    }

    /// Map a draw in [1, 100] to the next heading : the lowest draws go up, the highest go down.
    fn heading_for_draw(&self, course: Course, draw: u8) -> Heading {
        if draw <= self.jump_chance {
            course.heading(Drift::Up)
        } else if draw > 100 - self.jump_chance {
            course.heading(Drift::Down)
        } else {
            course.heading(Drift::Straight)
        }
    }
}
