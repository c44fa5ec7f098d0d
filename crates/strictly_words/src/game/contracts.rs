//! Pre- and postconditions for turn transitions.

use super::GameState;
use super::error::TurnError;
use super::invariants::{InvariantSet, WordGameInvariants};
use tracing::{instrument, warn};

// ─────────────────────────────────────────────────────────────
//  Contract Trait
// ─────────────────────────────────────────────────────────────

/// Preconditions and postconditions for a state transition.
pub trait Contract<S, A: ?Sized> {
    /// Checks preconditions before applying the action.
    fn pre(state: &S, action: &A) -> Result<(), TurnError>;

    /// Checks postconditions after applying the action.
    fn post(before: &S, after: &S) -> Result<(), TurnError>;
}

// ─────────────────────────────────────────────────────────────
//  Turn Contract
// ─────────────────────────────────────────────────────────────

/// Contract for turn-ending operations taken by a player.
///
/// Preconditions:
/// - Game is in progress
/// - Acting player holds the turn
///
/// Postconditions:
/// - All game-state invariants hold
/// - No score went down
/// - A turn that ended passed to the other player
pub struct TurnContract;

impl Contract<GameState, str> for TurnContract {
    fn pre(state: &GameState, player: &str) -> Result<(), TurnError> {
        state.require_turn(player).map(|_| ())
    }

    #[instrument(skip_all, name = "turn_postcondition")]
    fn post(before: &GameState, after: &GameState) -> Result<(), TurnError> {
        let mut failures = Vec::new();

        if let Err(violations) = WordGameInvariants::check_all(after) {
            failures.extend(violations.into_iter().map(|v| v.description));
        }

        let monotonic = before
            .players()
            .iter()
            .zip(after.players())
            .all(|(b, a)| a.score() >= b.score());
        if !monotonic {
            failures.push("Scores never decrease".to_string());
        }

        if after.turn() != before.turn() {
            let alternated =
                after.turn() == before.turn() + 1 && after.current_player() != before.current_player();
            if !alternated {
                failures.push("Turns alternate between players".to_string());
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            let descriptions = failures.join("; ");
            warn!(%descriptions, "Postcondition failed");
            Err(TurnError::InvariantViolation(format!(
                "Postcondition failed: {}",
                descriptions
            )))
        }
    }
}
