//! Tile conservation: no tile is created or lost.

use super::Invariant;
use crate::game::GameState;
use tracing::warn;

/// Invariant: bag, racks and board together hold every tile of the game.
pub struct TileConservationInvariant;

impl Invariant<GameState> for TileConservationInvariant {
    fn holds(game: &GameState) -> bool {
        let accounted = game.tiles_accounted();
        let valid = accounted == game.tile_total();
        if !valid {
            warn!(accounted, expected = game.tile_total(), "Tile conservation violated");
        }
        valid
    }

    fn description() -> &'static str {
        "Bag, racks and board hold every tile exactly once"
    }
}
