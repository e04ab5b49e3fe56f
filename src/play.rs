use std::io::{self, BufRead, Write};

use colored::Colorize;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cards::BoardSig;
use crate::display::{board_display, card_display, payoff_display, styled_action};
use crate::error::PokerResult;
use crate::game::Game;
use crate::opponent::{OpponentModel, Spot};
use crate::round::Action;

const HUMAN: usize = 0;
const BOT: usize = 1;

/// Play hands against an opponent model until the player quits. The human
/// always holds seat 0; blind positions are still randomized per hand.
pub fn run_play(model: &dyn OpponentModel, seed: Option<u64>) -> PokerResult<()> {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    println!(
        "Two-round limit hold'em vs the {} opponent. Enter an action number, its name, or q to quit.",
        model.name().bold()
    );

    loop {
        let mut game = Game::seeded(false, rng.gen());
        let (_, mut current) = game.init_game()?;
        println!("\n{}", ">> New hand".bold());

        while !game.is_over() {
            let state = game.get_state(current);
            if current == HUMAN {
                println!(
                    "  hand {}  board {}  chips {} vs {}  position {}  opponent range {}",
                    card_display(state.hand),
                    board_display(&state.public_cards),
                    state.my_chips,
                    state.all_chips[BOT],
                    state.position.map_or("?", |p| p.as_str()),
                    state.opponent_range,
                );
                let action = match prompt_action(&mut lines, &state.legal_actions)? {
                    Some(a) => a,
                    None => return Ok(()),
                };
                let (_, next) = game.step(action)?;
                current = next;
            } else {
                let action = model.decide(&state, &mut rng);
                println!("  opponent plays {}", styled_action(action));

                // Narrow our view of the bot's card from what it just did.
                if let Some(position) = state.position {
                    let behind = state.all_chips[HUMAN] > state.my_chips;
                    let spot = Spot::for_actor(position, behind);
                    let board = match (state.public_cards[0], state.public_cards[1]) {
                        (Some(a), Some(b)) => Some(BoardSig::from_cards(a, b)),
                        _ => None,
                    };
                    let narrowed = model.narrow(
                        spot,
                        board,
                        game.players[HUMAN].opponent_range,
                        action,
                    );
                    if !narrowed.is_empty() {
                        game.players[HUMAN].opponent_range = narrowed;
                    }
                }

                let (_, next) = game.step(action)?;
                current = next;
            }
        }

        let payoffs = game.get_payoffs()?;
        println!(
            "  opponent held {}  board {}",
            card_display(game.players[BOT].hand),
            board_display(&game.public_cards),
        );
        println!("  result: {} chips", payoff_display(payoffs[HUMAN]));

        print!("Play another hand? [Y/n] ");
        io::stdout().flush()?;
        match lines.next() {
            Some(line) => {
                let line = line?;
                if line.trim().eq_ignore_ascii_case("n") || line.trim().eq_ignore_ascii_case("q") {
                    return Ok(());
                }
            }
            None => return Ok(()),
        }
    }
}

fn prompt_action(
    lines: &mut io::Lines<io::StdinLock<'_>>,
    legal: &[Action],
) -> PokerResult<Option<Action>> {
    loop {
        let choices: Vec<String> = legal
            .iter()
            .enumerate()
            .map(|(i, &a)| format!("{}: {}", i, styled_action(a)))
            .collect();
        print!("  your move ({}) > ", choices.join(", "));
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => return Ok(None),
        };
        let input = line.trim();
        if input.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        if let Ok(index) = input.parse::<usize>() {
            if let Some(&action) = legal.get(index) {
                return Ok(Some(action));
            }
        }
        if let Ok(action) = input.parse::<Action>() {
            if legal.contains(&action) {
                return Ok(Some(action));
            }
        }
        println!("  not a legal choice");
    }
}
