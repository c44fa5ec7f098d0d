//! Staged tiles exist only while a turn is being played.

use super::Invariant;
use crate::game::GameState;
use crate::game::Phase;

/// Invariant: uncommitted tiles sit on the board only during play.
pub struct StagedTilesInvariant;

impl Invariant<GameState> for StagedTilesInvariant {
    fn holds(game: &GameState) -> bool {
        game.phase() == Phase::InProgress || game.board().staged_coords().is_empty()
    }

    fn description() -> &'static str {
        "Staged tiles only exist while the game is in progress"
    }
}
