//! The shared tile bag.

use crate::tile::{Tile, standard_tiles};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Multiset of tiles not yet drawn by either player.
///
/// Tiles are stored in no particular order; every draw picks a uniformly
/// random position, so the order never leaks information.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileBag(Vec<Tile>);

impl TileBag {
    /// Creates a bag holding the standard 100-tile distribution.
    #[instrument]
    pub fn standard() -> Self {
        Self(standard_tiles())
    }

    /// Creates a bag holding exactly the given tiles.
    pub fn from_tiles(tiles: Vec<Tile>) -> Self {
        Self(tiles)
    }

    /// Number of tiles remaining.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no tiles remain.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Remaining tiles as a slice.
    pub fn tiles(&self) -> &[Tile] {
        &self.0
    }

    /// Draws up to `count` tiles at random, stopping early if the bag runs out.
    #[instrument(skip(self, rng), fields(remaining = self.0.len()))]
    pub fn draw<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) -> Vec<Tile> {
        let mut drawn = Vec::with_capacity(count.min(self.0.len()));
        for _ in 0..count {
            if self.0.is_empty() {
                break;
            }
            let index = rng.random_range(0..self.0.len());
            drawn.push(self.0.swap_remove(index));
        }
        debug!(drawn = drawn.len(), remaining = self.0.len(), "Tiles drawn");
        drawn
    }

    /// Returns a tile to the bag.
    pub fn put_back(&mut self, tile: Tile) {
        self.0.push(tile);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_draw_removes_tiles() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut bag = TileBag::standard();
        let drawn = bag.draw(7, &mut rng);
        assert_eq!(drawn.len(), 7);
        assert_eq!(bag.len(), 93);
    }

    #[test]
    fn test_draw_stops_when_empty() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut bag = TileBag::from_tiles(vec![Tile::new('A').unwrap(), Tile::new('B').unwrap()]);
        let drawn = bag.draw(5, &mut rng);
        assert_eq!(drawn.len(), 2);
        assert!(bag.is_empty());
        assert!(bag.draw(1, &mut rng).is_empty());
    }

    #[test]
    fn test_draw_is_deterministic_for_a_seed() {
        let first = TileBag::standard().draw(7, &mut StdRng::seed_from_u64(42));
        let second = TileBag::standard().draw(7, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn test_put_back_grows_bag() {
        let mut bag = TileBag::default();
        bag.put_back(Tile::BLANK);
        assert_eq!(bag.tiles(), &[Tile::BLANK]);
    }
}
