use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cards::{Card, Deck};
use crate::error::PokerResult;
use crate::judger::Judger;
use crate::player::{Player, Position};
use crate::ranges::RankSet;
use crate::round::{Action, Round, NUM_PLAYERS};

/// Snapshot of the acting player's view, as handed to agents and the play
/// loop. Carries exactly the raw fields the observation layer projects from.
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub hand: Option<Card>,
    pub public_cards: [Option<Card>; 2],
    pub all_chips: [f64; NUM_PLAYERS],
    pub my_chips: f64,
    pub legal_actions: Vec<Action>,
    pub position: Option<Position>,
    pub opponent_range: RankSet,
    pub current_player: usize,
}

#[derive(Debug, Clone)]
struct Snapshot {
    round: Round,
    deck: Deck,
    public_cards: [Option<Card>; 2],
    players: [Player; NUM_PLAYERS],
    round_counter: u8,
    game_pointer: usize,
}

/// Two betting rounds over a 20-card deck: one private card each, blinds of
/// half a unit, two public cards revealed between the rounds. The same seat
/// acts first in both rounds (deliberately not real heads-up order).
pub struct Game {
    pub small_blind: f64,
    pub big_blind: f64,
    pub bet_unit: f64,
    pub max_raises: u8,
    allow_step_back: bool,
    rng: StdRng,
    deck: Deck,
    pub players: [Player; NUM_PLAYERS],
    pub public_cards: [Option<Card>; 2],
    round: Round,
    pub round_counter: u8,
    game_pointer: usize,
    starting_pointer: usize,
    history: Vec<Snapshot>,
}

impl Game {
    pub fn new(allow_step_back: bool) -> Game {
        Game::with_rng(allow_step_back, StdRng::from_entropy())
    }

    pub fn seeded(allow_step_back: bool, seed: u64) -> Game {
        Game::with_rng(allow_step_back, StdRng::seed_from_u64(seed))
    }

    fn with_rng(allow_step_back: bool, rng: StdRng) -> Game {
        Game {
            small_blind: 0.5,
            big_blind: 0.5,
            bet_unit: 1.0,
            max_raises: 1,
            allow_step_back,
            rng,
            deck: Deck::new(),
            players: [Player::new(0), Player::new(1)],
            public_cards: [None, None],
            round: Round::new(1.0, 1),
            round_counter: 0,
            game_pointer: 0,
            starting_pointer: 0,
            history: Vec::new(),
        }
    }

    /// Deal the hole cards, post the blinds (positions randomized), and open
    /// round 1. Returns the first state and the id of the player to act.
    pub fn init_game(&mut self) -> PokerResult<(PlayerState, usize)> {
        self.deck = Deck::new();
        self.deck.shuffle(&mut self.rng);
        self.players = [Player::new(0), Player::new(1)];
        for player in self.players.iter_mut() {
            player.hand = Some(self.deck.deal()?);
        }

        let s = self.rng.gen_range(0..NUM_PLAYERS);
        let b = (s + 1) % NUM_PLAYERS;
        self.players[s].position = Some(Position::First);
        self.players[s].in_chips = self.small_blind;
        self.players[b].position = Some(Position::Second);
        self.players[b].in_chips = self.big_blind;

        self.public_cards = [None, None];
        self.game_pointer = s;
        self.starting_pointer = s;

        self.round = Round::new(self.bet_unit, self.max_raises);
        self.round.start_new_round(
            self.game_pointer,
            self.starting_pointer,
            Some([self.players[0].in_chips, self.players[1].in_chips]),
        );
        self.round_counter = 0;
        self.history.clear();

        Ok((self.get_state(self.game_pointer), self.game_pointer))
    }

    /// Apply one action for the player to act. When the round completes,
    /// reveal the public cards (after round 1 only) and open the next round
    /// with the same starting actor.
    pub fn step(&mut self, action: Action) -> PokerResult<(PlayerState, usize)> {
        if self.allow_step_back {
            self.history.push(Snapshot {
                round: self.round.clone(),
                deck: self.deck.clone(),
                public_cards: self.public_cards,
                players: self.players.clone(),
                round_counter: self.round_counter,
                game_pointer: self.game_pointer,
            });
        }

        self.game_pointer = self.round.proceed(&mut self.players, action)?;

        if self.round.is_over() {
            if self.round_counter == 0 {
                self.public_cards[0] = Some(self.deck.deal()?);
                self.public_cards[1] = Some(self.deck.deal()?);
            }
            self.round_counter += 1;
            self.game_pointer = self.starting_pointer;
            self.round
                .start_new_round(self.game_pointer, self.starting_pointer, None);
        }

        Ok((self.get_state(self.game_pointer), self.game_pointer))
    }

    /// Restore the state prior to the last `step`. `Ok(false)` when there is
    /// nothing to undo; an error when reversible stepping was never enabled.
    pub fn step_back(&mut self) -> PokerResult<bool> {
        if !self.allow_step_back {
            return Err(crate::error::PokerError::StepBackDisabled);
        }
        match self.history.pop() {
            Some(snap) => {
                self.round = snap.round;
                self.deck = snap.deck;
                self.public_cards = snap.public_cards;
                self.players = snap.players;
                self.round_counter = snap.round_counter;
                self.game_pointer = snap.game_pointer;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn get_state(&self, player: usize) -> PlayerState {
        PlayerState {
            hand: self.players[player].hand,
            public_cards: self.public_cards,
            all_chips: [self.players[0].in_chips, self.players[1].in_chips],
            my_chips: self.players[player].in_chips,
            legal_actions: self.round.legal_actions(),
            position: self.players[player].position,
            opponent_range: self.players[player].opponent_range,
            current_player: self.game_pointer,
        }
    }

    pub fn current_player(&self) -> usize {
        self.game_pointer
    }

    pub fn legal_actions(&self) -> Vec<Action> {
        self.round.legal_actions()
    }

    pub fn is_over(&self) -> bool {
        let alive = self.players.iter().filter(|p| p.is_alive()).count();
        alive == 1 || self.round_counter >= 2
    }

    pub fn get_payoffs(&self) -> PokerResult<[f64; NUM_PLAYERS]> {
        Judger::judge(&self.players, &self.public_cards)
    }
}
