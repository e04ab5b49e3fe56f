use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{PokerError, PokerResult};
use crate::player::{Player, Status};

pub const NUM_PLAYERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Action {
    #[serde(rename = "bet")]
    Bet,
    #[serde(rename = "raise")]
    Raise,
    #[serde(rename = "fold")]
    Fold,
    #[serde(rename = "check")]
    Check,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Bet => "bet",
            Action::Raise => "raise",
            Action::Fold => "fold",
            Action::Check => "check",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = PokerError;

    fn from_str(s: &str) -> PokerResult<Action> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bet" | "b" => Ok(Action::Bet),
            "raise" | "r" => Ok(Action::Raise),
            "fold" | "f" => Ok(Action::Fold),
            "check" | "c" => Ok(Action::Check),
            other => Err(PokerError::InvalidActionNotation(other.to_string())),
        }
    }
}

const FULL_ACTIONS: [Action; 4] = [Action::Bet, Action::Raise, Action::Fold, Action::Check];

/// One betting round. Constructed once per game and re-initialized by
/// `start_new_round` for each of the two rounds; round 1 carries the blind
/// contributions in as the starting committed amounts.
#[derive(Debug, Clone)]
pub struct Round {
    bet_unit: f64,
    max_raises: u8,
    pub player_index: usize,
    pub starting_index: usize,
    /// Chips committed this round, per player.
    pub raised: [f64; NUM_PLAYERS],
    raise_count: u8,
    /// Consecutive actions without a raise. The round is over once every
    /// player has acted since the last raise (or round start).
    non_raise_count: u8,
}

impl Round {
    pub fn new(bet_unit: f64, max_raises: u8) -> Round {
        Round {
            bet_unit,
            max_raises,
            player_index: 0,
            starting_index: 0,
            raised: [0.0; NUM_PLAYERS],
            raise_count: 0,
            non_raise_count: 0,
        }
    }

    pub fn start_new_round(
        &mut self,
        player_index: usize,
        starting_index: usize,
        raised: Option<[f64; NUM_PLAYERS]>,
    ) {
        self.player_index = player_index;
        self.starting_index = starting_index;
        self.raise_count = 0;
        self.non_raise_count = 0;
        self.raised = raised.unwrap_or([0.0; NUM_PLAYERS]);
    }

    /// Legal actions for the player to act.
    pub fn legal_actions(&self) -> Vec<Action> {
        let me = self.player_index;
        let max = self.max_committed();
        let mut actions: Vec<Action> = FULL_ACTIONS.to_vec();

        // The round opener may not raise, and the raise cap is per round.
        if me == self.starting_index || self.raise_count >= self.max_raises {
            actions.retain(|&a| a != Action::Raise);
        }
        // Checking requires matching the highest committed amount.
        if self.raised[me] < max {
            actions.retain(|&a| a != Action::Check);
        }
        // A non-opener who is level must check or raise, not bet.
        if me != self.starting_index && self.raised[me] == max {
            actions.retain(|&a| a != Action::Bet);
        }
        // No folding a decision that costs nothing extra.
        if self.raised[me] == max {
            actions.retain(|&a| a != Action::Fold);
        }
        actions
    }

    /// Apply `action` for the current player and advance the turn to the
    /// next non-folded player. Submitting an illegal action is a caller bug.
    pub fn proceed(&mut self, players: &mut [Player; NUM_PLAYERS], action: Action) -> PokerResult<usize> {
        let legal = self.legal_actions();
        if !legal.contains(&action) {
            return Err(PokerError::IllegalAction {
                action: action.to_string(),
                legal: legal
                    .iter()
                    .map(|a| a.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        let me = self.player_index;
        match action {
            Action::Bet => {
                self.raised[me] += self.bet_unit;
                players[me].in_chips += self.bet_unit;
                self.non_raise_count += 1;
            }
            Action::Raise => {
                let diff = self.max_committed() - self.raised[me] + self.bet_unit;
                self.raised[me] += diff;
                players[me].in_chips += diff;
                self.raise_count += 1;
                // A raise restarts the everyone-must-respond requirement.
                self.non_raise_count = 1;
            }
            Action::Fold => {
                players[me].status = Status::Folded;
            }
            Action::Check => {
                self.non_raise_count += 1;
            }
        }

        self.player_index = (self.player_index + 1) % NUM_PLAYERS;
        while players[self.player_index].status == Status::Folded {
            self.player_index = (self.player_index + 1) % NUM_PLAYERS;
        }
        Ok(self.player_index)
    }

    pub fn is_over(&self) -> bool {
        self.non_raise_count as usize >= NUM_PLAYERS
    }

    fn max_committed(&self) -> f64 {
        self.raised.iter().copied().fold(f64::MIN, f64::max)
    }
}
