use colored::Colorize;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use crate::cards::{all_signatures, Card, Rank, ALL_RANKS};
use crate::probabilities::ProbabilityTables;
use crate::ranges::RankSet;
use crate::round::Action;
use crate::state_space::StateSpace;

pub fn styled_action(action: Action) -> String {
    match action {
        Action::Bet => action.as_str().yellow().to_string(),
        Action::Raise => action.as_str().red().bold().to_string(),
        Action::Fold => action.as_str().dimmed().to_string(),
        Action::Check => action.as_str().green().to_string(),
    }
}

pub fn card_display(card: Option<Card>) -> String {
    match card {
        Some(c) => c.pretty(),
        None => "??".dimmed().to_string(),
    }
}

pub fn board_display(public_cards: &[Option<Card>; 2]) -> String {
    format!(
        "{} {}",
        card_display(public_cards[0]),
        card_display(public_cards[1])
    )
}

pub fn payoff_display(payoff: f64) -> String {
    if payoff > 0.0 {
        format!("+{}", payoff).green().bold().to_string()
    } else if payoff < 0.0 {
        format!("{}", payoff).red().to_string()
    } else {
        "0".dimmed().to_string()
    }
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}

/// Per-signature showdown law for one hero rank against the full range.
pub fn outcome_grid(tables: &ProbabilityTables, hand: Rank) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["board", "win", "tie", "lose"]);

    for sig in all_signatures() {
        if let Some(outcome) = tables.outcome(hand, sig, RankSet::FULL) {
            table.add_row(vec![
                Cell::new(sig.to_string()),
                Cell::new(format!("{:.1}%", outcome.win * 100.0)).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.1}%", outcome.tie * 100.0)).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.1}%", outcome.loss * 100.0)).set_alignment(CellAlignment::Right),
            ]);
        }
    }

    format!(
        "  {} {}\n{}",
        "Showdown law for".bold(),
        hand.to_char().to_string().bold(),
        table
    )
}

pub fn state_space_summary(space: &StateSpace, model_name: &str) -> String {
    let states = space.len();
    let decisions: usize = space.values().map(|actions| actions.len()).sum();
    let transitions: usize = space
        .values()
        .flat_map(|actions| actions.values())
        .map(|list| list.len())
        .sum();
    let terminal: usize = space
        .values()
        .flat_map(|actions| actions.values())
        .flatten()
        .filter(|t| t.terminal)
        .count();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["opponent", "states", "decisions", "transitions", "terminal"]);
    table.add_row(vec![
        Cell::new(model_name),
        Cell::new(states).set_alignment(CellAlignment::Right),
        Cell::new(decisions).set_alignment(CellAlignment::Right),
        Cell::new(transitions).set_alignment(CellAlignment::Right),
        Cell::new(terminal).set_alignment(CellAlignment::Right),
    ]);
    table.to_string()
}

/// Round-1 policy at the blind level: one row per hero rank, one column per
/// opening spot.
pub fn policy_grid(policy: &std::collections::BTreeMap<String, String>) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["hand", "first, opening", "second vs check", "second vs bet"]);

    for &hand in ALL_RANKS.iter().rev() {
        let h = hand.to_char();
        let pick = |position: &str, diff: &str| -> String {
            policy
                .iter()
                .find(|(key, _)| {
                    let fields: Vec<&str> = key.split('_').collect();
                    fields.len() == 6
                        && fields[0] == position
                        && fields[1] == "0.5"
                        && fields[2] == diff
                        && fields[3] == h.to_string()
                        && fields[4] == "none"
                })
                .map(|(_, action)| action.clone())
                .unwrap_or_else(|| "-".to_string())
        };
        table.add_row(vec![
            Cell::new(h),
            Cell::new(pick("first", "0")),
            Cell::new(pick("second", "0")),
            Cell::new(pick("second", "1")),
        ]);
    }
    table.to_string()
}
