use thiserror::Error;

#[derive(Error, Debug)]
pub enum PokerError {
    #[error("Invalid rank: {0}")]
    InvalidRank(char),

    #[error("Invalid suit: {0}")]
    InvalidSuit(char),

    #[error("Invalid card notation: {0}")]
    InvalidCardNotation(String),

    #[error("Invalid action: {0}")]
    InvalidActionNotation(String),

    #[error("{action} is not a legal action. Legal actions: {legal}")]
    IllegalAction { action: String, legal: String },

    #[error("Cannot deal from an empty deck")]
    EmptyDeck,

    #[error("Player {0} has no hole card")]
    MissingHoleCard(usize),

    #[error("Public cards have not been revealed")]
    MissingPublicCards,

    #[error("Step back is off. Enable reversible stepping when creating the game")]
    StepBackDisabled,

    #[error("Transition probabilities for {key}/{action} sum to {sum}, expected 1")]
    UnbalancedTransitions {
        key: String,
        action: String,
        sum: f64,
    },

    #[error("Non-terminal transition targets an unexpanded state: {0}")]
    DanglingState(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type PokerResult<T> = Result<T, PokerError>;
