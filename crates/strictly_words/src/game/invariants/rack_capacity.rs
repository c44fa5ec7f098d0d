//! Rack capacity: nobody holds more than seven tiles.

use super::Invariant;
use crate::game::GameState;
use crate::rack::RACK_SIZE;

/// Invariant: every rack holds at most [`RACK_SIZE`] tiles, counting tiles
/// the current player has staged on the board.
pub struct RackCapacityInvariant;

impl Invariant<GameState> for RackCapacityInvariant {
    fn holds(game: &GameState) -> bool {
        let staged = game.board().staged_coords().len();
        game.players().iter().enumerate().all(|(seat, player)| {
            let held = player.rack().len() + if seat == game.current_player() { staged } else { 0 };
            held <= RACK_SIZE
        })
    }

    fn description() -> &'static str {
        "No rack holds more than seven tiles"
    }
}
