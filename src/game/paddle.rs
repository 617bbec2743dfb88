//! Paddles of the two roles, their movement and the catch test.

use crate::game::engine::{BallState, Position};
use crate::game::Role;
use crate::protocol::constants::{MIDDLE_ROW, NUM_COLUMNS, NUM_ROWS};

/// A move request from the navigation switch. Up is towards row 0.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum Direction {
    Up,
    Down,
}

/// The paddle of the current role. Both paddles live in the last column.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum Paddle {
    /// A single cell.
    Shooter { row: u8 },
    /// Two adjacent cells, `top` and `top + 1`.
    Catcher { top: u8 },
}

impl Paddle {
    pub const COLUMN: u8 = NUM_COLUMNS - 1;

    /// The paddle of the given role at its starting position in the middle of the matrix.
    pub fn new(role: Role) -> Self {
        match role {
            Role::Shooter => Self::Shooter { row: MIDDLE_ROW },
            Role::Catcher => Self::Catcher { top: MIDDLE_ROW },
        }
    }

    /// Move by one row. The shooter wraps around the matrix. The catcher wraps as a pair : past the last row it comes
    /// back on rows {0, 1}, past row 0 it comes back on the two last rows.
    pub fn moved(self, direction: Direction) -> Self {
        match self {
            Self::Shooter { row } => Self::Shooter {
                row: match direction {
                    Direction::Up => (row + NUM_ROWS - 1) % NUM_ROWS,
                    Direction::Down => (row + 1) % NUM_ROWS,
                },
            },
            Self::Catcher { top } => {
                let last_top = NUM_ROWS - 2;
                Self::Catcher {
                    top: match direction {
                        Direction::Up if top == 0 => last_top,
                        Direction::Up => top - 1,
                        Direction::Down if top >= last_top => 0,
                        Direction::Down => top + 1,
                    },
                }
            }
        }
    }

    /// Every cell the paddle lights.
    pub fn cells(&self) -> Vec<Position> {
        match *self {
            Self::Shooter { row } => vec![Position::new(Self::COLUMN, row)],
            Self::Catcher { top } => vec![
                Position::new(Self::COLUMN, top),
                Position::new(Self::COLUMN, top + 1),
            ],
        }
    }

    /// Row a loaded ball sits on, aligned with the shooter. The catcher has none.
    pub fn aim_row(&self) -> Option<u8> {
        match *self {
            Self::Shooter { row } => Some(row),
            Self::Catcher { .. } => None,
        }
    }

    /// Whether the ball is on one of the paddle's cells. Only meaningful when the ball reaches the paddle's column.
    pub fn caught(&self, ball: &BallState) -> bool {
        self.cells().contains(&ball.position)
    }
}
