use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;

use serde::ser::{Serialize, SerializeTuple, Serializer};

use crate::cards::{BoardSig, Rank, ALL_RANKS};
use crate::error::{PokerError, PokerResult};
use crate::opponent::{OpponentModel, Spot};
use crate::player::Position;
use crate::probabilities::ProbabilityTables;
use crate::ranges::RankSet;
use crate::round::Action;

const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// Canonical key of one hero decision state: everything the acting player
/// can observe, and nothing more. Chips are tracked in half-units so the
/// key arithmetic stays integral; the string form renders them back as the
/// familiar `0.5`, `1.5`, ... amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateKey {
    pub position: Position,
    /// Hero's cumulative contribution, in half-units.
    pub chips: u32,
    /// Opponent contribution minus hero contribution, in bet units.
    pub diff: i8,
    pub hand: Rank,
    /// `None` until round 1 completes.
    pub board: Option<BoardSig>,
    pub range: RankSet,
}

impl StateKey {
    fn next(&self, chips: u32, diff: i8, board: Option<BoardSig>, range: RankSet) -> StateKey {
        StateKey {
            position: self.position,
            chips,
            diff,
            hand: self.hand,
            board,
            range,
        }
    }
}

fn fmt_chips(halves: u32) -> String {
    if halves % 2 == 0 {
        (halves / 2).to_string()
    } else {
        format!("{}.5", halves / 2)
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}_{}_{}",
            self.position,
            fmt_chips(self.chips),
            self.diff,
            self.hand.to_char(),
            self.board
                .map_or_else(|| "none".to_string(), |sig| sig.to_string()),
            self.range,
        )
    }
}

/// One row of the artifact: serialized as the `[prob, next_key, reward,
/// terminal]` tuple the solvers consume.
#[derive(Debug, Clone)]
pub struct Transition {
    pub probability: f64,
    pub next_state: String,
    pub reward: f64,
    pub terminal: bool,
}

impl Serialize for Transition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(4)?;
        tuple.serialize_element(&self.probability)?;
        tuple.serialize_element(&self.next_state)?;
        tuple.serialize_element(&self.reward)?;
        tuple.serialize_element(&self.terminal)?;
        tuple.end()
    }
}

/// `state key -> action -> transitions`, key-sorted for stable dumps.
pub type StateSpace = BTreeMap<String, BTreeMap<String, Vec<Transition>>>;

/// One enumerated branch before merging. Rewards stay in half-units here;
/// every payoff in this game is a whole number of half-chips.
struct Branch {
    probability: f64,
    next: StateKey,
    reward_halves: i32,
    terminal: bool,
}

/// Builds the exact MDP the live engine induces under a fixed opponent
/// model. Walks forward from the root decision states and chains opponent
/// replies until the hero decides again or the hand ends, so every emitted
/// non-terminal key is itself expanded.
pub struct StateSpaceBuilder<'a> {
    tables: &'a ProbabilityTables,
    model: &'a dyn OpponentModel,
}

impl<'a> StateSpaceBuilder<'a> {
    pub fn new(tables: &'a ProbabilityTables, model: &'a dyn OpponentModel) -> Self {
        StateSpaceBuilder { tables, model }
    }

    pub fn build(&self) -> PokerResult<StateSpace> {
        let mut space = StateSpace::new();
        let mut seen: HashSet<StateKey> = HashSet::new();
        let mut queue: VecDeque<StateKey> = VecDeque::new();

        for root in self.roots() {
            if seen.insert(root) {
                queue.push_back(root);
            }
        }

        while let Some(state) = queue.pop_front() {
            let mut per_action = BTreeMap::new();
            let spot = Spot::for_actor(state.position, state.diff == 1);
            for &action in spot.legal_actions() {
                let branches = self.expand(&state, action);
                for branch in &branches {
                    if branch.probability > 0.0 && !branch.terminal && seen.insert(branch.next) {
                        queue.push_back(branch.next);
                    }
                }
                let transitions = merge(branches);

                let sum: f64 = transitions.iter().map(|t| t.probability).sum();
                if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
                    return Err(PokerError::UnbalancedTransitions {
                        key: state.to_string(),
                        action: action.to_string(),
                        sum,
                    });
                }
                per_action.insert(action.to_string(), transitions);
            }
            space.insert(state.to_string(), per_action);
        }

        Ok(space)
    }

    /// Hero's first decision states. Sitting first, nothing is known yet;
    /// sitting second, the opponent has already opened round 1 and that
    /// opening fixes the initial belief.
    fn roots(&self) -> Vec<StateKey> {
        let mut roots = Vec::new();
        for &hand in &ALL_RANKS {
            roots.push(StateKey {
                position: Position::First,
                chips: 1,
                diff: 0,
                hand,
                board: None,
                range: RankSet::FULL,
            });
            for reply in self
                .model
                .replies(Spot::Opening, hand, None, RankSet::FULL, self.tables)
            {
                let diff = match reply.action {
                    Action::Bet => 1,
                    Action::Check => 0,
                    _ => continue,
                };
                roots.push(StateKey {
                    position: Position::Second,
                    chips: 1,
                    diff,
                    hand,
                    board: None,
                    range: reply.range,
                });
            }
        }
        roots
    }

    fn expand(&self, state: &StateKey, action: Action) -> Vec<Branch> {
        let chips = state.chips;
        let owed = state.diff as u32 * 2;

        match action {
            Action::Fold => vec![Branch {
                probability: 1.0,
                next: state.next(chips, 1, state.board, state.range),
                reward_halves: -(chips as i32),
                terminal: true,
            }],

            Action::Check => match state.position {
                // Second to act and level: the check closes the round.
                Position::Second => self.close_round(state, chips, state.range, 1.0),
                // Opener's check hands the decision to the second seat.
                Position::First => {
                    let mut out = Vec::new();
                    for reply in self.model.replies(
                        Spot::FacingCheck,
                        state.hand,
                        state.board,
                        state.range,
                        self.tables,
                    ) {
                        match reply.action {
                            Action::Check => out.extend(self.close_round(
                                state,
                                chips,
                                reply.range,
                                reply.probability,
                            )),
                            Action::Raise => out.push(Branch {
                                probability: reply.probability,
                                next: state.next(chips, 1, state.board, reply.range),
                                reward_halves: 0,
                                terminal: false,
                            }),
                            _ => {}
                        }
                    }
                    out
                }
            },

            Action::Bet => {
                if state.diff == 1 {
                    // Calling levels the pot and closes the round.
                    self.close_round(state, chips + 2, state.range, 1.0)
                } else {
                    // Opening bet; the second seat replies.
                    let committed = chips + 2;
                    let mut out = Vec::new();
                    for reply in self.model.replies(
                        Spot::FacingBet,
                        state.hand,
                        state.board,
                        state.range,
                        self.tables,
                    ) {
                        match reply.action {
                            Action::Fold => out.push(Branch {
                                probability: reply.probability,
                                next: state.next(committed, -1, state.board, reply.range),
                                reward_halves: chips as i32,
                                terminal: true,
                            }),
                            Action::Bet => out.extend(self.close_round(
                                state,
                                committed,
                                reply.range,
                                reply.probability,
                            )),
                            Action::Raise => out.push(Branch {
                                probability: reply.probability,
                                next: state.next(committed, 1, state.board, reply.range),
                                reward_halves: 0,
                                terminal: false,
                            }),
                            _ => {}
                        }
                    }
                    out
                }
            }

            Action::Raise => {
                // Hero sits second; the opener may only call or fold.
                let committed = chips + 2 + owed;
                let mut out = Vec::new();
                for reply in self.model.replies(
                    Spot::FacingRaise,
                    state.hand,
                    state.board,
                    state.range,
                    self.tables,
                ) {
                    match reply.action {
                        Action::Fold => out.push(Branch {
                            probability: reply.probability,
                            next: state.next(committed, -1, state.board, reply.range),
                            reward_halves: (chips + owed) as i32,
                            terminal: true,
                        }),
                        Action::Bet => out.extend(self.close_round(
                            state,
                            committed,
                            reply.range,
                            reply.probability,
                        )),
                        _ => {}
                    }
                }
                out
            }
        }
    }

    /// Fan out the completion of the current round. Round 1: the board law
    /// over signatures, plus the opponent's round-2 opening move when hero
    /// sits second. Round 2: the showdown outcome law.
    fn close_round(
        &self,
        state: &StateKey,
        leveled: u32,
        range: RankSet,
        prefix: f64,
    ) -> Vec<Branch> {
        match state.board {
            None => {
                let mut out = Vec::new();
                for &(sig, p_sig) in self.tables.board_law(state.hand, range) {
                    match state.position {
                        Position::First => out.push(Branch {
                            probability: prefix * p_sig,
                            next: state.next(leveled, 0, Some(sig), range),
                            reward_halves: 0,
                            terminal: false,
                        }),
                        Position::Second => {
                            for reply in self.model.replies(
                                Spot::Opening,
                                state.hand,
                                Some(sig),
                                range,
                                self.tables,
                            ) {
                                let diff = match reply.action {
                                    Action::Bet => 1,
                                    Action::Check => 0,
                                    _ => continue,
                                };
                                out.push(Branch {
                                    probability: prefix * p_sig * reply.probability,
                                    next: state.next(leveled, diff, Some(sig), reply.range),
                                    reward_halves: 0,
                                    terminal: false,
                                });
                            }
                        }
                    }
                }
                out
            }
            Some(sig) => {
                let Some(outcome) = self.tables.outcome(state.hand, sig, range) else {
                    return Vec::new();
                };
                let next = state.next(leveled, 0, Some(sig), range);
                let stake = leveled as i32;
                [
                    (outcome.win, stake),
                    (outcome.loss, -stake),
                    (outcome.tie, 0),
                ]
                .into_iter()
                .filter(|&(p, _)| p > 0.0)
                .map(|(p, reward_halves)| Branch {
                    probability: prefix * p,
                    next,
                    reward_halves,
                    terminal: true,
                })
                .collect()
            }
        }
    }
}

/// Sum branches that agree on (next state, reward, terminal). Showdown
/// win/loss/tie terminals share a key but differ in reward, so the reward is
/// part of the merge key.
fn merge(branches: Vec<Branch>) -> Vec<Transition> {
    let mut merged: BTreeMap<(String, i32, bool), f64> = BTreeMap::new();
    for branch in branches {
        if branch.probability <= 0.0 {
            continue;
        }
        *merged
            .entry((
                branch.next.to_string(),
                branch.reward_halves,
                branch.terminal,
            ))
            .or_insert(0.0) += branch.probability;
    }
    merged
        .into_iter()
        .map(|((next_state, reward_halves, terminal), probability)| Transition {
            probability,
            next_state,
            reward: reward_halves as f64 / 2.0,
            terminal,
        })
        .collect()
}

/// Re-check the artifact invariants: every (state, action) sums to one and
/// every non-terminal successor is itself expanded.
pub fn validate(space: &StateSpace) -> PokerResult<()> {
    for (key, actions) in space {
        for (action, transitions) in actions {
            let sum: f64 = transitions.iter().map(|t| t.probability).sum();
            if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
                return Err(PokerError::UnbalancedTransitions {
                    key: key.clone(),
                    action: action.clone(),
                    sum,
                });
            }
            for transition in transitions {
                if !transition.terminal && !space.contains_key(&transition.next_state) {
                    return Err(PokerError::DanglingState(transition.next_state.clone()));
                }
            }
        }
    }
    Ok(())
}
