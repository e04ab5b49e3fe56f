use approx::assert_relative_eq;
use once_cell::sync::Lazy;

use minilimit::cards::{BoardSig, Rank, ALL_RANKS};
use minilimit::opponent::{RandomModel, ThresholdModel};
use minilimit::probabilities::ProbabilityTables;
use minilimit::ranges::RankSet;
use minilimit::state_space::{validate, StateKey, StateSpace, StateSpaceBuilder};

static TABLES: Lazy<ProbabilityTables> =
    Lazy::new(|| ProbabilityTables::compute().expect("enumeration cannot fail"));

static RANDOM_SPACE: Lazy<StateSpace> = Lazy::new(|| {
    StateSpaceBuilder::new(&TABLES, &RandomModel)
        .build()
        .expect("random model space")
});

static THRESHOLD_SPACE: Lazy<StateSpace> = Lazy::new(|| {
    StateSpaceBuilder::new(&TABLES, &ThresholdModel)
        .build()
        .expect("threshold model space")
});

#[test]
fn test_state_key_format() {
    let key = StateKey {
        position: minilimit::player::Position::First,
        chips: 3,
        diff: 1,
        hand: Rank::Ace,
        board: None,
        range: "AK".parse().unwrap(),
    };
    assert_eq!(key.to_string(), "first_1.5_1_A_none_AK");

    let key = StateKey {
        position: minilimit::player::Position::Second,
        chips: 9,
        diff: 0,
        hand: Rank::Ten,
        board: Some(BoardSig::new(Rank::Queen, Rank::Ten)),
        range: RankSet::FULL,
    };
    assert_eq!(key.to_string(), "second_4.5_0_T_QT_AJKQT");
}

#[test]
fn test_both_artifacts_validate() {
    validate(&RANDOM_SPACE).unwrap();
    validate(&THRESHOLD_SPACE).unwrap();
}

#[test]
fn test_probability_conservation() {
    for space in [&*RANDOM_SPACE, &*THRESHOLD_SPACE] {
        for actions in space.values() {
            for transitions in actions.values() {
                let sum: f64 = transitions.iter().map(|t| t.probability).sum();
                assert_relative_eq!(sum, 1.0, epsilon = 1e-9);
                assert!(transitions.iter().all(|t| t.probability > 0.0));
            }
        }
    }
}

#[test]
fn test_random_space_roots() {
    for &hand in &ALL_RANKS {
        let h = hand.to_char();
        assert!(RANDOM_SPACE.contains_key(&format!("first_0.5_0_{}_none_AJKQT", h)));
        assert!(RANDOM_SPACE.contains_key(&format!("second_0.5_0_{}_none_AJKQT", h)));
        assert!(RANDOM_SPACE.contains_key(&format!("second_0.5_1_{}_none_AJKQT", h)));
    }
}

#[test]
fn test_threshold_space_roots_carry_the_opening_inference() {
    for &hand in &ALL_RANKS {
        let h = hand.to_char();
        // An opening bet marks a strong hand; a check marks the rest.
        assert!(THRESHOLD_SPACE.contains_key(&format!("second_0.5_1_{}_none_AK", h)));
        assert!(THRESHOLD_SPACE.contains_key(&format!("second_0.5_0_{}_none_JQT", h)));
    }
}

#[test]
fn test_random_opening_bet_branches() {
    let actions = &RANDOM_SPACE["first_0.5_0_A_none_AJKQT"];
    let transitions = &actions["bet"];

    // A third of the time the opponent folds to the bet, ending the hand
    // with the blind as the reward.
    let fold = transitions
        .iter()
        .find(|t| t.terminal)
        .expect("fold branch present");
    assert_relative_eq!(fold.probability, 1.0 / 3.0, epsilon = 1e-9);
    assert_relative_eq!(fold.reward, 0.5, epsilon = 1e-12);
    assert_eq!(fold.next_state, "first_1.5_-1_A_none_AJKQT");

    // A raise keeps the hand in round 1: the board stays hidden.
    let raise = transitions
        .iter()
        .find(|t| t.next_state == "first_1.5_1_A_none_AJKQT")
        .expect("raise branch present");
    assert!(!raise.terminal);
    assert_relative_eq!(raise.probability, 1.0 / 3.0, epsilon = 1e-9);
    assert!(RANDOM_SPACE.contains_key(&raise.next_state));

    // The remaining third is the call, fanned over the fifteen signatures.
    let called: f64 = transitions
        .iter()
        .filter(|t| !t.next_state.contains("none"))
        .map(|t| t.probability)
        .sum();
    assert_relative_eq!(called, 1.0 / 3.0, epsilon = 1e-9);
}

#[test]
fn test_threshold_opening_bet_branches() {
    let actions = &THRESHOLD_SPACE["first_0.5_0_A_none_AJKQT"];
    let transitions = &actions["bet"];

    // Hero holds an ace, so 19 opponent cards remain: four tens fold,
    // the seven remaining broadways raise, jacks and queens call.
    let fold = transitions
        .iter()
        .find(|t| t.terminal)
        .expect("fold branch present");
    assert_relative_eq!(fold.probability, 4.0 / 19.0, epsilon = 1e-9);
    assert_eq!(fold.next_state, "first_1.5_-1_A_none_T");

    let raise = transitions
        .iter()
        .find(|t| t.next_state == "first_1.5_1_A_none_AK")
        .expect("raise branch present");
    assert_relative_eq!(raise.probability, 7.0 / 19.0, epsilon = 1e-9);
    assert!(!raise.terminal);

    let called: f64 = transitions
        .iter()
        .filter(|t| t.next_state.ends_with("_JQ"))
        .map(|t| t.probability)
        .sum();
    assert_relative_eq!(called, 8.0 / 19.0, epsilon = 1e-9);
}

#[test]
fn test_every_source_state_is_a_decision_state() {
    for space in [&*RANDOM_SPACE, &*THRESHOLD_SPACE] {
        for (key, actions) in space.iter() {
            let fields: Vec<&str> = key.split('_').collect();
            assert_eq!(fields.len(), 6, "malformed key {}", key);
            assert!(fields[0] == "first" || fields[0] == "second");
            // A player never decides while ahead in chips.
            assert!(fields[2] == "0" || fields[2] == "1", "bad diff in {}", key);
            assert!(!actions.is_empty());
            let chips: f64 = fields[1].parse().unwrap();
            assert!((0.5..=4.5).contains(&chips));
        }
    }
}

#[test]
fn test_raise_never_offered_to_the_opener() {
    for space in [&*RANDOM_SPACE, &*THRESHOLD_SPACE] {
        for (key, actions) in space.iter() {
            if key.starts_with("first_") {
                assert!(!actions.contains_key("raise"), "opener raise in {}", key);
            }
        }
    }
}

#[test]
fn test_non_terminal_successors_are_expanded() {
    for space in [&*RANDOM_SPACE, &*THRESHOLD_SPACE] {
        for actions in space.values() {
            for transitions in actions.values() {
                for t in transitions {
                    if !t.terminal {
                        assert!(space.contains_key(&t.next_state), "dangling {}", t.next_state);
                    }
                }
            }
        }
    }
}

#[test]
fn test_second_seat_sees_the_round_two_opening() {
    // After a check-through round 1 against the threshold opponent, hero in
    // the second seat next decides either facing a round-2 bet (the
    // opponent paired the board) or after a round-2 check.
    let actions = &THRESHOLD_SPACE["second_0.5_0_A_none_JQT"];
    let transitions = &actions["check"];
    assert!(transitions
        .iter()
        .any(|t| t.next_state == "second_0.5_1_A_JQ_JQ"));
    assert!(transitions
        .iter()
        .any(|t| t.next_state == "second_0.5_0_A_JQ_T"));
    assert!(transitions.iter().all(|t| !t.terminal));
}

#[test]
fn test_round_two_showdown_rewards_match_the_pot() {
    // Calling a round-2 bet at 3.5 ends in a showdown for 4.5 each way.
    for space in [&*RANDOM_SPACE, &*THRESHOLD_SPACE] {
        for (key, actions) in space.iter() {
            let fields: Vec<&str> = key.split('_').collect();
            if fields[4] == "none" || fields[2] != "1" {
                continue;
            }
            let chips: f64 = fields[1].parse().unwrap();
            let transitions = &actions["bet"];
            for t in transitions {
                assert!(t.terminal);
                assert!(
                    t.reward.abs() == chips + 1.0 || t.reward == 0.0,
                    "unexpected showdown reward {} at {}",
                    t.reward,
                    key
                );
            }
        }
    }
}

#[test]
fn test_artifact_serializes_as_tuples() {
    let json = serde_json::to_value(&*RANDOM_SPACE).unwrap();
    let row = &json["first_0.5_0_A_none_AJKQT"]["bet"][0];
    assert!(row.is_array());
    assert_eq!(row.as_array().unwrap().len(), 4);
    assert!(row[0].is_f64());
    assert!(row[1].is_string());
    assert!(row[3].is_boolean());
}
