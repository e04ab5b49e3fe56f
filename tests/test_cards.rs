use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::SeedableRng;

use minilimit::cards::*;

#[test]
fn test_card_creation() {
    let c = Card::new(Rank::Ace, Suit::Spades);
    assert_eq!(c.rank, Rank::Ace);
    assert_eq!(c.suit, Suit::Spades);
    assert_eq!(c.value(), 14);
}

#[test]
fn test_rank_values() {
    assert_eq!(Rank::Ten.value(), 10);
    assert_eq!(Rank::Jack.value(), 11);
    assert_eq!(Rank::Queen.value(), 12);
    assert_eq!(Rank::King.value(), 13);
    assert_eq!(Rank::Ace.value(), 14);
}

#[test]
fn test_invalid_rank() {
    assert!(Rank::from_char('9').is_err());
    assert!(Rank::from_char('X').is_err());
}

#[test]
fn test_invalid_suit() {
    assert!(Suit::from_char('x').is_err());
}

#[test]
fn test_card_str() {
    let c = Card::new(Rank::King, Suit::Diamonds);
    assert_eq!(format!("{}", c), "Kd");
}

#[test]
fn test_card_equality_is_identity() {
    let a1 = Card::new(Rank::Ace, Suit::Spades);
    let a2 = Card::new(Rank::Ace, Suit::Spades);
    let a3 = Card::new(Rank::Ace, Suit::Hearts);
    assert_eq!(a1, a2);
    assert_ne!(a1, a3);
}

#[test]
fn test_deck_has_twenty_distinct_cards() {
    let deck = Deck::new();
    assert_eq!(deck.len(), 20);
    let distinct: HashSet<Card> = deck.cards.iter().copied().collect();
    assert_eq!(distinct.len(), 20);
}

#[test]
fn test_deal_removes_last_card() {
    let mut deck = Deck::new();
    let mut rng = StdRng::seed_from_u64(3);
    deck.shuffle(&mut rng);
    let expected = *deck.cards.last().unwrap();
    let dealt = deck.deal().unwrap();
    assert_eq!(dealt, expected);
    assert_eq!(deck.len(), 19);
}

#[test]
fn test_deal_exhausted_deck() {
    let mut deck = Deck::new();
    for _ in 0..20 {
        deck.deal().unwrap();
    }
    assert!(deck.deal().is_err());
}

#[test]
fn test_parse_card() {
    assert_eq!(parse_card("As").unwrap(), Card::new(Rank::Ace, Suit::Spades));
    assert_eq!(parse_card("Td").unwrap(), Card::new(Rank::Ten, Suit::Diamonds));
    assert!(parse_card("9s").is_err());
    assert!(parse_card("Axs").is_err());
}

#[test]
fn test_signature_sorts_alphabetically() {
    assert_eq!(BoardSig::new(Rank::King, Rank::Ace).to_string(), "AK");
    assert_eq!(BoardSig::new(Rank::Ten, Rank::Queen).to_string(), "QT");
    assert_eq!(BoardSig::new(Rank::Jack, Rank::Ten).to_string(), "JT");
    assert_eq!(BoardSig::new(Rank::King, Rank::King).to_string(), "KK");
}

#[test]
fn test_signature_membership() {
    let sig = BoardSig::new(Rank::King, Rank::King);
    assert!(sig.is_pair());
    assert_eq!(sig.count_of(Rank::King), 2);
    assert_eq!(sig.count_of(Rank::Ace), 0);
    assert!(sig.contains(Rank::King));
    assert!(!sig.contains(Rank::Ten));
}

#[test]
fn test_all_signatures() {
    let sigs = all_signatures();
    assert_eq!(sigs.len(), 15);
    let distinct: HashSet<String> = sigs.iter().map(|s| s.to_string()).collect();
    assert_eq!(distinct.len(), 15);
}
