//! Player racks.

use crate::bag::TileBag;
use crate::tile::Tile;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Maximum number of tiles a rack holds.
pub const RACK_SIZE: usize = 7;

/// Ordered tiles held by one player.
///
/// Order is visible to the player but has no effect on scoring.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rack(Vec<Tile>);

impl Rack {
    /// Creates a rack holding the given tiles.
    pub fn new(tiles: Vec<Tile>) -> Self {
        Self(tiles)
    }

    /// Tiles on the rack, in display order.
    pub fn tiles(&self) -> &[Tile] {
        &self.0
    }

    /// Number of tiles held.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when the rack holds no tiles.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true when every tile in `tiles` is on the rack, counting
    /// duplicates.
    pub fn contains_all(&self, tiles: &[Tile]) -> bool {
        let mut remaining = self.0.clone();
        tiles.iter().all(|tile| match remaining.iter().position(|t| t == tile) {
            Some(index) => {
                remaining.swap_remove(index);
                true
            }
            None => false,
        })
    }

    /// Removes one copy of `tile`, keeping the order of the others.
    /// Returns false if the tile is not on the rack.
    pub fn remove(&mut self, tile: Tile) -> bool {
        match self.0.iter().position(|t| *t == tile) {
            Some(index) => {
                self.0.remove(index);
                true
            }
            None => false,
        }
    }

    /// Appends a tile to the end of the rack.
    pub fn push(&mut self, tile: Tile) {
        self.0.push(tile);
    }

    /// Draws from the bag until the rack holds [`RACK_SIZE`] tiles or the bag
    /// is empty. Returns the tiles drawn.
    #[instrument(skip(self, bag, rng), fields(rack = self.0.len(), bag = bag.len()))]
    pub fn refill_from<R: Rng + ?Sized>(&mut self, bag: &mut TileBag, rng: &mut R) -> Vec<Tile> {
        let missing = RACK_SIZE.saturating_sub(self.0.len());
        let drawn = bag.draw(missing, rng);
        self.0.extend_from_slice(&drawn);
        drawn
    }

    /// Shuffles the display order.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.0.shuffle(rng);
    }

    /// Returns true if `order` holds exactly the same tiles as this rack.
    pub fn is_permutation(&self, order: &[Tile]) -> bool {
        order.len() == self.0.len() && self.contains_all(order)
    }

    /// Replaces the display order. Returns false, leaving the rack as it
    /// was, unless `order` is a permutation of the current tiles.
    pub fn reorder(&mut self, order: Vec<Tile>) -> bool {
        if !self.is_permutation(&order) {
            return false;
        }
        self.0 = order;
        true
    }
}
