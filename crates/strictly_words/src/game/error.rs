//! Errors raised by turn operations.

use crate::dictionary::DictionaryError;
use crate::placement::MoveShapeError;
use crate::validator::PlacementError;

/// Everything a turn operation can reject.
///
/// A rejected operation never changes the game.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum TurnError {
    /// The request was malformed.
    #[display("Invalid move: {}", _0)]
    Shape(MoveShapeError),
    /// The move broke a placement rule.
    #[display("{}", _0)]
    Rule(PlacementError),
    /// The dictionary could not answer. The move may be retried.
    #[display("Word validation unavailable: {}", _0)]
    ValidationUnavailable(DictionaryError),
    /// Exchange requested with nothing left to draw.
    #[display("The bag is empty")]
    BagEmpty,
    /// The player is not seated in this game.
    #[display("Unknown player '{}'", _0)]
    UnknownPlayer(String),
    /// Another player holds the turn.
    #[display("It is not {}'s turn", _0)]
    NotYourTurn(String),
    /// Both players have not joined yet.
    #[display("Game has not started")]
    NotStarted,
    /// The game has already ended.
    #[display("Game is over")]
    GameOver,
    /// A rack reorder was not a permutation of the rack.
    #[display("New rack order must contain exactly the current tiles")]
    NotAPermutation,
    /// A postcondition failed.
    #[display("Invariant violation: {}", _0)]
    InvariantViolation(String),
}

impl std::error::Error for TurnError {}

impl TurnError {
    /// True for transient failures a client may retry unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TurnError::ValidationUnavailable(_))
    }

    /// Stable reason code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            TurnError::Shape(err) => err.code(),
            TurnError::Rule(err) => err.code(),
            TurnError::ValidationUnavailable(_) => "validation_unavailable",
            TurnError::BagEmpty => "bag_empty",
            TurnError::UnknownPlayer(_) => "unknown_player",
            TurnError::NotYourTurn(_) => "not_your_turn",
            TurnError::NotStarted => "not_started",
            TurnError::GameOver => "game_over",
            TurnError::NotAPermutation => "not_a_permutation",
            TurnError::InvariantViolation(_) => "invariant_violation",
        }
    }
}

impl From<MoveShapeError> for TurnError {
    fn from(err: MoveShapeError) -> Self {
        TurnError::Shape(err)
    }
}

impl From<PlacementError> for TurnError {
    fn from(err: PlacementError) -> Self {
        TurnError::Rule(err)
    }
}

impl From<DictionaryError> for TurnError {
    fn from(err: DictionaryError) -> Self {
        TurnError::ValidationUnavailable(err)
    }
}
