use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;
use rayon::prelude::*;
use serde_json::{json, Value};

use crate::cards::{all_signatures, BoardSig, Card, Deck, Rank, Suit, ALL_RANKS, ALL_SUITS};
use crate::error::PokerResult;
use crate::judger::Judger;
use crate::player::Player;
use crate::ranges::{ranges_containing, RankSet, ALL_RANGES};

/// Showdown outcome law for one (hand rank, board signature, opponent range)
/// key, averaged uniformly over every physically distinct opponent card
/// consistent with the range and with card removal.
#[derive(Debug, Clone, Copy)]
pub struct Outcome {
    pub win: f64,
    pub loss: f64,
    pub tie: f64,
}

/// Exact card-probability tables for the 20-card deck, produced by one
/// exhaustive pass over ordered (hero, opponent, public, public) tuples and
/// kept for the lifetime of the process. Build once with `compute` and pass
/// by reference; the same keys recur across thousands of MDP branches.
pub struct ProbabilityTables {
    outcomes: HashMap<(Rank, BoardSig, RankSet), Outcome>,
    boards: HashMap<(Rank, RankSet), Vec<(BoardSig, f64)>>,
    /// Remaining copies of each rank once hero's card (and the public cards,
    /// when revealed) are removed. Indexed by `Rank::bit`.
    avail: HashMap<(Rank, Option<BoardSig>), [u8; 5]>,
}

#[derive(Default)]
struct Tally {
    /// (hand, sig, range) -> [win, tie, loss] counts over opponent cards.
    outcomes: HashMap<(Rank, BoardSig, RankSet), [u64; 3]>,
    /// (hand, range, sig) -> number of deals producing that signature.
    boards: HashMap<(Rank, RankSet, BoardSig), u64>,
}

impl Tally {
    fn merge(&mut self, other: Tally) {
        for (k, v) in other.outcomes {
            let e = self.outcomes.entry(k).or_insert([0; 3]);
            for i in 0..3 {
                e[i] += v[i];
            }
        }
        for (k, v) in other.boards {
            *self.boards.entry(k).or_insert(0) += v;
        }
    }
}

impl ProbabilityTables {
    /// Brute enumeration over the whole deck; parallel across hero cards.
    pub fn compute() -> PokerResult<ProbabilityTables> {
        let deck = Deck::new().cards;

        let partials: Vec<PokerResult<Tally>> = deck
            .par_iter()
            .map(|&hero| Self::tally_for_hero(&deck, hero))
            .collect();

        let mut tally = Tally::default();
        for partial in partials {
            tally.merge(partial?);
        }

        let mut outcomes = HashMap::new();
        for (key, [win, tie, loss]) in tally.outcomes {
            let total = (win + tie + loss) as f64;
            outcomes.insert(
                key,
                Outcome {
                    win: win as f64 / total,
                    loss: loss as f64 / total,
                    tie: tie as f64 / total,
                },
            );
        }

        let mut boards: HashMap<(Rank, RankSet), Vec<(BoardSig, f64)>> = HashMap::new();
        let mut totals: HashMap<(Rank, RankSet), u64> = HashMap::new();
        for (&(hand, range, _), &count) in &tally.boards {
            *totals.entry((hand, range)).or_insert(0) += count;
        }
        for ((hand, range, sig), count) in tally.boards {
            let total = totals[&(hand, range)] as f64;
            boards
                .entry((hand, range))
                .or_default()
                .push((sig, count as f64 / total));
        }
        for law in boards.values_mut() {
            law.sort_by_key(|&(sig, _)| sig);
        }

        let mut avail = HashMap::new();
        for &hand in &ALL_RANKS {
            let hero = Card::new(hand, Suit::Spades);
            avail.insert((hand, None), remaining_by_rank(&deck, &[hero]));
            for sig in all_signatures() {
                let board = representative_board(hero, sig);
                let dead = [hero, board[0], board[1]];
                avail.insert((hand, Some(sig)), remaining_by_rank(&deck, &dead));
            }
        }

        Ok(ProbabilityTables {
            outcomes,
            boards,
            avail,
        })
    }

    fn tally_for_hero(deck: &[Card], hero: Card) -> PokerResult<Tally> {
        let mut tally = Tally::default();
        let mut players = [Player::new(0), Player::new(1)];
        players[0].in_chips = 0.5;
        players[1].in_chips = 0.5;
        players[0].hand = Some(hero);

        for &opp in deck.iter().filter(|&&c| c != hero) {
            players[1].hand = Some(opp);
            let live: Vec<Card> = deck
                .iter()
                .copied()
                .filter(|&c| c != hero && c != opp)
                .collect();
            for pair in live.iter().permutations(2) {
                let (p1, p2) = (*pair[0], *pair[1]);
                let sig = BoardSig::from_cards(p1, p2);
                let payoffs = Judger::judge(&players, &[Some(p1), Some(p2)])?;
                let slot = if payoffs[0] > 0.0 {
                    0
                } else if payoffs[0] == 0.0 {
                    1
                } else {
                    2
                };
                for range in ranges_containing(opp.rank) {
                    tally.outcomes.entry((hero.rank, sig, range)).or_insert([0; 3])[slot] += 1;
                    *tally.boards.entry((hero.rank, range, sig)).or_insert(0) += 1;
                }
            }
        }
        Ok(tally)
    }

    /// Win/loss/tie law at showdown. `None` when no opponent card is
    /// consistent with the key, i.e. the conditioning branch is impossible.
    pub fn outcome(&self, hand: Rank, sig: BoardSig, range: RankSet) -> Option<Outcome> {
        self.outcomes.get(&(hand, sig, range)).copied()
    }

    /// Distribution of the revealed signature given hero's rank and an
    /// opponent drawn from `range`. Empty when the key is impossible.
    pub fn board_law(&self, hand: Rank, range: RankSet) -> &[(BoardSig, f64)] {
        self.boards
            .get(&(hand, range))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Physical copies of `rank` still unseen by hero.
    pub fn cards_remaining(&self, hand: Rank, board: Option<BoardSig>, rank: Rank) -> u8 {
        self.avail
            .get(&(hand, board))
            .map(|counts| counts[rank.bit() as usize])
            .unwrap_or(0)
    }

    /// Probability that an opponent card consistent with `prior` also lies
    /// in `post`. A zero-card prior makes every refinement impossible (0.0),
    /// never NaN.
    pub fn range_shift(
        &self,
        hand: Rank,
        board: Option<BoardSig>,
        prior: RankSet,
        post: RankSet,
    ) -> f64 {
        let count = |set: RankSet| -> u64 {
            set.iter()
                .map(|r| self.cards_remaining(hand, board, r) as u64)
                .sum()
        };
        let denom = count(prior);
        if denom == 0 {
            return 0.0;
        }
        count(post.intersect(prior)) as f64 / denom as f64
    }

    /// All four tables as one JSON document, keys sorted, for the CLI dump.
    pub fn to_json(&self) -> Value {
        let mut win: BTreeMap<String, BTreeMap<String, BTreeMap<String, f64>>> = BTreeMap::new();
        let mut loss = win.clone();
        for (&(hand, sig, range), outcome) in &self.outcomes {
            let h = hand.to_char().to_string();
            let s = sig.to_string();
            let r = range.to_string();
            win.entry(h.clone())
                .or_default()
                .entry(s.clone())
                .or_default()
                .insert(r.clone(), outcome.win);
            loss.entry(h).or_default().entry(s).or_default().insert(r, outcome.loss);
        }

        let mut flop: BTreeMap<String, BTreeMap<String, BTreeMap<String, f64>>> = BTreeMap::new();
        for (&(hand, range), law) in &self.boards {
            let per_sig = flop
                .entry(hand.to_char().to_string())
                .or_default()
                .entry(range.to_string())
                .or_default();
            for &(sig, p) in law {
                per_sig.insert(sig.to_string(), p);
            }
        }

        let mut rank_probs: BTreeMap<String, BTreeMap<String, BTreeMap<String, BTreeMap<String, f64>>>> =
            BTreeMap::new();
        for &hand in &ALL_RANKS {
            let boards = std::iter::once(None).chain(all_signatures().into_iter().map(Some));
            for board in boards {
                let board_key = board.map_or_else(|| "none".to_string(), |s| s.to_string());
                for &prior in ALL_RANGES.iter() {
                    let mut per_rank = BTreeMap::new();
                    for rank in prior.iter() {
                        let p = self.range_shift(hand, board, prior, RankSet::single(rank));
                        per_rank.insert(rank.to_char().to_string(), p);
                    }
                    rank_probs
                        .entry(hand.to_char().to_string())
                        .or_default()
                        .entry(board_key.clone())
                        .or_default()
                        .insert(prior.to_string(), per_rank);
                }
            }
        }

        json!({
            "win_probabilities": win,
            "loss_probabilities": loss,
            "flop_probabilities": flop,
            "rank_probabilities": rank_probs,
        })
    }
}

fn remaining_by_rank(deck: &[Card], dead: &[Card]) -> [u8; 5] {
    let mut counts = [0u8; 5];
    for &card in deck.iter().filter(|c| !dead.contains(c)) {
        counts[card.rank.bit() as usize] += 1;
    }
    counts
}

/// Two physical cards realizing `sig` without colliding with hero's card.
fn representative_board(hero: Card, sig: BoardSig) -> [Card; 2] {
    let (a, b) = sig.ranks();
    let mut used = vec![hero];
    let mut out = Vec::with_capacity(2);
    for rank in [a, b] {
        for &suit in &ALL_SUITS {
            let candidate = Card::new(rank, suit);
            if !used.contains(&candidate) {
                used.push(candidate);
                out.push(candidate);
                break;
            }
        }
    }
    [out[0], out[1]]
}
