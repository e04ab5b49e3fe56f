use approx::assert_relative_eq;

use minilimit::cards::{parse_card, Card, Rank};
use minilimit::judger::Judger;
use minilimit::player::{Player, Status};

fn c(notation: &str) -> Card {
    parse_card(notation).unwrap()
}

fn seat(id: usize, card: &str, chips: f64) -> Player {
    let mut p = Player::new(id);
    p.hand = Some(c(card));
    p.in_chips = chips;
    p
}

#[test]
fn test_rank_to_int() {
    assert_eq!(Judger::rank_to_int(Rank::Ten), 10);
    assert_eq!(Judger::rank_to_int(Rank::Ace), 14);
}

#[test]
fn test_fold_out_ignores_public_cards() {
    let mut p0 = seat(0, "As", 1.5);
    let p1 = {
        let mut p = seat(1, "Ks", 0.5);
        p.status = Status::Folded;
        p
    };
    p0.status = Status::Alive;
    // Round 1 fold: no public cards revealed yet.
    let payoffs = Judger::judge(&[p0, p1], &[None, None]).unwrap();
    assert_relative_eq!(payoffs[0], 0.5);
    assert_relative_eq!(payoffs[1], -0.5);
}

#[test]
fn test_public_pair_beats_high_card() {
    // Ace high loses to any king once the board pairs kings.
    let p0 = seat(0, "As", 2.5);
    let p1 = seat(1, "Kc", 2.5);
    let publics = [Some(c("Kh")), Some(c("Kd"))];
    let payoffs = Judger::judge(&[p0, p1], &publics).unwrap();
    assert_relative_eq!(payoffs[0], -2.5);
    assert_relative_eq!(payoffs[1], 2.5);
}

#[test]
fn test_public_pair_no_match_falls_to_high_card() {
    let p0 = seat(0, "As", 0.5);
    let p1 = seat(1, "Qc", 0.5);
    let publics = [Some(c("Kh")), Some(c("Kd"))];
    let payoffs = Judger::judge(&[p0, p1], &publics).unwrap();
    assert_relative_eq!(payoffs[0], 0.5);
    assert_relative_eq!(payoffs[1], -0.5);
}

#[test]
fn test_single_pair_beats_higher_kicker() {
    let p0 = seat(0, "Jc", 1.5);
    let p1 = seat(1, "As", 1.5);
    let publics = [Some(c("Jh")), Some(c("Qd"))];
    let payoffs = Judger::judge(&[p0, p1], &publics).unwrap();
    assert_relative_eq!(payoffs[0], 1.5);
    assert_relative_eq!(payoffs[1], -1.5);
}

#[test]
fn test_higher_pair_wins() {
    let p0 = seat(0, "Jc", 0.5);
    let p1 = seat(1, "Qs", 0.5);
    let publics = [Some(c("Jh")), Some(c("Qd"))];
    let payoffs = Judger::judge(&[p0, p1], &publics).unwrap();
    assert_relative_eq!(payoffs[0], -0.5);
    assert_relative_eq!(payoffs[1], 0.5);
}

#[test]
fn test_full_tie_pays_zero() {
    let p0 = seat(0, "Ts", 1.5);
    let p1 = seat(1, "Tc", 1.5);
    let publics = [Some(c("Jh")), Some(c("Qd"))];
    let payoffs = Judger::judge(&[p0, p1], &publics).unwrap();
    assert_relative_eq!(payoffs[0], 0.0);
    assert_relative_eq!(payoffs[1], 0.0);
}

#[test]
fn test_single_winner_payoffs_negate() {
    let p0 = seat(0, "Ah", 2.5);
    let p1 = seat(1, "Td", 1.5);
    let publics = [Some(c("Jh")), Some(c("Qd"))];
    let payoffs = Judger::judge(&[p0, p1], &publics).unwrap();
    // Uneven contributions: the winner nets exactly the loser's stake.
    assert_relative_eq!(payoffs[0], 1.5);
    assert_relative_eq!(payoffs[1], -1.5);
    assert_relative_eq!(payoffs[0] + payoffs[1], 0.0);
}

#[test]
fn test_showdown_requires_public_cards() {
    let p0 = seat(0, "Ah", 0.5);
    let p1 = seat(1, "Td", 0.5);
    assert!(Judger::judge(&[p0, p1], &[None, None]).is_err());
}

#[test]
fn test_missing_hole_card_is_an_error() {
    let p0 = Player::new(0);
    let p1 = seat(1, "Td", 0.5);
    assert!(Judger::judge(&[p0, p1], &[Some(c("Jh")), Some(c("Qd"))]).is_err());
}
