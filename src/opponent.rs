use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::cards::{BoardSig, Rank};
use crate::game::PlayerState;
use crate::player::Position;
use crate::probabilities::ProbabilityTables;
use crate::ranges::RankSet;
use crate::round::Action;

/// The betting spot a player acts in. With two seats, a fixed opener, and a
/// raise cap of one, every decision falls into one of four spots, each with
/// a fixed legal-action set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spot {
    /// Round opener, chips level: may bet or check.
    Opening,
    /// Second seat after the opener checked: may raise or check.
    FacingCheck,
    /// Second seat after the opener bet: may raise, call (bet), or fold.
    FacingBet,
    /// Opener after the second seat raised: may call (bet) or fold.
    FacingRaise,
}

impl Spot {
    pub fn legal_actions(self) -> &'static [Action] {
        match self {
            Spot::Opening => &[Action::Bet, Action::Check],
            Spot::FacingCheck => &[Action::Raise, Action::Check],
            Spot::FacingBet => &[Action::Raise, Action::Bet, Action::Fold],
            Spot::FacingRaise => &[Action::Bet, Action::Fold],
        }
    }

    pub fn can_check(self) -> bool {
        matches!(self, Spot::Opening | Spot::FacingCheck)
    }

    pub fn can_raise(self) -> bool {
        matches!(self, Spot::FacingCheck | Spot::FacingBet)
    }

    /// The spot a seat acts in, given its position and whether it trails the
    /// other seat's committed chips.
    pub fn for_actor(position: Position, behind: bool) -> Spot {
        match (position, behind) {
            (Position::First, false) => Spot::Opening,
            (Position::First, true) => Spot::FacingRaise,
            (Position::Second, false) => Spot::FacingCheck,
            (Position::Second, true) => Spot::FacingBet,
        }
    }
}

/// One possible opponent response: the action, the belief about the
/// opponent's card it implies, and its probability given the prior belief.
#[derive(Debug, Clone, Copy)]
pub struct Reply {
    pub action: Action,
    pub range: RankSet,
    pub probability: f64,
}

/// The opponent behavior the MDP is built against. One rule set answers for
/// the model builder (`replies`), the live loop's belief tracking
/// (`narrow`), and live play itself (`decide`).
pub trait OpponentModel {
    fn name(&self) -> &'static str;

    /// Response distribution in `spot`, conditioned on the hero's card, the
    /// board, and the prior belief. Impossible and zero-probability replies
    /// are not returned.
    fn replies(
        &self,
        spot: Spot,
        hand: Rank,
        board: Option<BoardSig>,
        prior: RankSet,
        tables: &ProbabilityTables,
    ) -> Vec<Reply>;

    /// Belief narrowing implied by an observed action. Returns the prior
    /// unchanged when the action carries no information.
    fn narrow(&self, spot: Spot, board: Option<BoardSig>, prior: RankSet, observed: Action)
        -> RankSet;

    /// Live-play decision.
    fn decide(&self, state: &PlayerState, rng: &mut StdRng) -> Action;
}

/// Plays uniformly over its legal actions; its actions reveal nothing, so
/// beliefs never narrow.
pub struct RandomModel;

impl OpponentModel for RandomModel {
    fn name(&self) -> &'static str {
        "random"
    }

    fn replies(
        &self,
        spot: Spot,
        _hand: Rank,
        _board: Option<BoardSig>,
        prior: RankSet,
        _tables: &ProbabilityTables,
    ) -> Vec<Reply> {
        let legal = spot.legal_actions();
        let p = 1.0 / legal.len() as f64;
        legal
            .iter()
            .map(|&action| Reply {
                action,
                range: prior,
                probability: p,
            })
            .collect()
    }

    fn narrow(
        &self,
        _spot: Spot,
        _board: Option<BoardSig>,
        prior: RankSet,
        _observed: Action,
    ) -> RankSet {
        prior
    }

    fn decide(&self, state: &PlayerState, rng: &mut StdRng) -> Action {
        state
            .legal_actions
            .choose(rng)
            .copied()
            .unwrap_or(Action::Check)
    }
}

/// Deterministic rule-based play. Round 1: max bet/raise with K or A,
/// check/bet with Q or J, check/fold with T. Round 2: max bet/raise with
/// any pair, check/bet with A/K/Q, check/fold with J/T. Its actions
/// partition the rank universe, so response probabilities are range-shift
/// weights of those classes.
pub struct ThresholdModel;

impl ThresholdModel {
    fn rule(rank: Rank, board: Option<BoardSig>, can_check: bool, can_raise: bool) -> Action {
        match board {
            None => {
                if rank.value() >= 13 {
                    if can_raise {
                        Action::Raise
                    } else {
                        Action::Bet
                    }
                } else if can_check {
                    Action::Check
                } else if rank.value() > 10 {
                    Action::Bet
                } else {
                    Action::Fold
                }
            }
            Some(sig) => {
                if sig.contains(rank) {
                    if can_raise {
                        Action::Raise
                    } else {
                        Action::Bet
                    }
                } else if can_check {
                    Action::Check
                } else if rank.value() >= 12 {
                    Action::Bet
                } else {
                    Action::Fold
                }
            }
        }
    }

    /// Group the prior's ranks by the action the rule takes in `spot`.
    fn partition(spot: Spot, board: Option<BoardSig>, prior: RankSet) -> Vec<(Action, RankSet)> {
        let mut classes: Vec<(Action, RankSet)> = spot
            .legal_actions()
            .iter()
            .map(|&a| (a, RankSet::EMPTY))
            .collect();
        for rank in prior.iter() {
            let action = Self::rule(rank, board, spot.can_check(), spot.can_raise());
            if let Some(entry) = classes.iter_mut().find(|(a, _)| *a == action) {
                entry.1 = entry.1.with(rank);
            }
        }
        classes
    }
}

impl OpponentModel for ThresholdModel {
    fn name(&self) -> &'static str {
        "threshold"
    }

    fn replies(
        &self,
        spot: Spot,
        hand: Rank,
        board: Option<BoardSig>,
        prior: RankSet,
        tables: &ProbabilityTables,
    ) -> Vec<Reply> {
        Self::partition(spot, board, prior)
            .into_iter()
            .filter(|(_, class)| !class.is_empty())
            .filter_map(|(action, class)| {
                let p = tables.range_shift(hand, board, prior, class);
                (p > 0.0).then_some(Reply {
                    action,
                    range: class,
                    probability: p,
                })
            })
            .collect()
    }

    fn narrow(
        &self,
        spot: Spot,
        board: Option<BoardSig>,
        prior: RankSet,
        observed: Action,
    ) -> RankSet {
        Self::partition(spot, board, prior)
            .into_iter()
            .find(|(a, _)| *a == observed)
            .map(|(_, class)| class)
            .unwrap_or(prior)
    }

    fn decide(&self, state: &PlayerState, _rng: &mut StdRng) -> Action {
        let rank = match state.hand {
            Some(card) => card.rank,
            None => return Action::Check,
        };
        let board = match (state.public_cards[0], state.public_cards[1]) {
            (Some(a), Some(b)) => Some(BoardSig::from_cards(a, b)),
            _ => None,
        };
        let can_check = state.legal_actions.contains(&Action::Check);
        let can_raise = state.legal_actions.contains(&Action::Raise);
        Self::rule(rank, board, can_check, can_raise)
    }
}
