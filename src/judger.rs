use crate::cards::{Card, Rank};
use crate::error::{PokerError, PokerResult};
use crate::player::{Player, Status};

/// Pure showdown judging. With one private card per player and two public
/// cards, the only made hands are three of a kind (private card matching a
/// paired board), one pair (private card matching a board card), and high
/// card. Suits never matter.
pub struct Judger;

impl Judger {
    /// Numeric rank for tie-breaking: T=10 .. A=14. Total over `Rank`; any
    /// out-of-universe character is rejected earlier, at `Rank::from_char`.
    pub fn rank_to_int(rank: Rank) -> u8 {
        rank.value()
    }

    /// Map {players, public cards} to the payoff vector. Must only be called
    /// on a finished game: either one player folded, or both public cards
    /// are revealed.
    pub fn judge(players: &[Player; 2], public_cards: &[Option<Card>; 2]) -> PokerResult<[f64; 2]> {
        let mut winners = [false; 2];

        let mut high_ranks = [0u8; 2];
        let mut alive_idx = 0;
        let mut fold_count = 0;
        for (idx, player) in players.iter().enumerate() {
            let card = player.hand.ok_or(PokerError::MissingHoleCard(idx))?;
            high_ranks[idx] = Judger::rank_to_int(card.rank);
            if player.status == Status::Folded {
                fold_count += 1;
            } else {
                alive_idx = idx;
            }
        }

        // Everyone else folded: the alive player sweeps the pot.
        if fold_count == players.len() - 1 {
            winners[alive_idx] = true;
        }

        if !winners[0] && !winners[1] {
            let (pub0, pub1) = match (public_cards[0], public_cards[1]) {
                (Some(a), Some(b)) => (a, b),
                _ => return Err(PokerError::MissingPublicCards),
            };

            if pub0.rank == pub1.rank {
                // A paired board is the only route to three of a kind.
                for (idx, player) in players.iter().enumerate() {
                    if player.hand.is_some_and(|c| c.rank == pub0.rank) {
                        winners[idx] = true;
                    }
                }
            } else {
                let mut pair_ranks = [0u8; 2];
                for (idx, player) in players.iter().enumerate() {
                    if let Some(card) = player.hand {
                        if card.rank == pub0.rank || card.rank == pub1.rank {
                            pair_ranks[idx] = Judger::rank_to_int(card.rank);
                        }
                    }
                }
                if pair_ranks[0] != pair_ranks[1] {
                    let best = if pair_ranks[0] > pair_ranks[1] { 0 } else { 1 };
                    winners[best] = true;
                }
            }

            if !winners[0] && !winners[1] {
                let max_rank = high_ranks[0].max(high_ranks[1]);
                for idx in 0..players.len() {
                    if high_ranks[idx] == max_rank {
                        winners[idx] = true;
                    }
                }
            }
        }

        let total: f64 = players.iter().map(|p| p.in_chips).sum();
        let num_winners = winners.iter().filter(|&&w| w).count();
        let each_win = total / num_winners as f64;

        let mut payoffs = [0.0; 2];
        for idx in 0..players.len() {
            payoffs[idx] = if winners[idx] {
                each_win - players[idx].in_chips
            } else {
                -players[idx].in_chips
            };
        }
        Ok(payoffs)
    }
}
