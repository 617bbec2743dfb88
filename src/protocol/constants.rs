//! Constants corresponding to aspects of the game shared by both devices.

/// Columns of the LED matrix. Column 0 is the edge facing the other device.
pub const NUM_COLUMNS: u8 = 5;
/// Rows of the LED matrix.
pub const NUM_ROWS: u8 = 7;
pub const MIDDLE_ROW: u8 = NUM_ROWS / 2;

/// Balls a shooter throws per round, which is also the number a catcher must receive to end it.
pub const BALL_THROWS: u8 = 12;
/// Rounds each device plays before the match is over.
pub const ROUNDS_PER_MATCH: u8 = 2;

/// Chance, in percent, of the ball jumping to a diagonal heading on each step.
pub const JUMP_CHANCE: u8 = 15;

pub const DEFAULT_TICK_RATE: u32 = 300;
/// Ball steps per second.
pub const DEFAULT_BALL_SPEED: u32 = 8;

/// Highest device id that fits in a role claim.
pub const MAX_DEVICE_ID: u8 = 0x07;

/// Ticks between two ball steps for the given rates. Never zero.
pub const fn ball_step_ticks(tick_rate: u32, ball_speed: u32) -> u32 {
    let ticks = tick_rate / ball_speed;
    if ticks == 0 {
        1
    } else {
        ticks
    }
}
