use std::fmt;

use serde::Serialize;

use crate::cards::Card;
use crate::ranges::RankSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Position {
    #[serde(rename = "first")]
    First,
    #[serde(rename = "second")]
    Second,
}

impl Position {
    pub fn as_str(self) -> &'static str {
        match self {
            Position::First => "first",
            Position::Second => "second",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Alive,
    Folded,
}

/// Per-seat mutable state. `in_chips` is the cumulative contribution across
/// both rounds and never decreases while a game runs; `opponent_range` is
/// this player's belief about the card the other seat holds.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: usize,
    pub hand: Option<Card>,
    pub in_chips: f64,
    pub status: Status,
    pub position: Option<Position>,
    pub opponent_range: RankSet,
}

impl Player {
    pub fn new(id: usize) -> Player {
        Player {
            id,
            hand: None,
            in_chips: 0.0,
            status: Status::Alive,
            position: None,
            opponent_range: RankSet::FULL,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status == Status::Alive
    }
}
