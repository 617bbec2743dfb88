use std::cmp::Ordering;

/// Result of a match as seen from this device.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MatchResult {
    pub caught: u32,
    pub peer_caught: u32,
    pub outcome: Outcome,
}

impl MatchResult {
    pub(super) fn new(caught: u32, peer_caught: u32) -> Self {
        let outcome = match caught.cmp(&peer_caught) {
            Ordering::Greater => Outcome::Win,
            Ordering::Less => Outcome::Lose,
            Ordering::Equal => Outcome::Tie,
        };
        Self {
            caught,
            peer_caught,
            outcome,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    Win,
    Lose,
    Tie,
}

impl Outcome {
    /// What the matrix scrolls once the match is over.
    pub fn text(&self) -> &'static str {
        match self {
            Self::Win => "WINNER",
            Self::Lose => "LOSER",
            Self::Tie => "TIE",
        }
    }
}
