//! Tile symbols, letter values and the standard tile distribution.

use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Number of tiles in a standard game.
pub const STANDARD_TILE_COUNT: usize = 100;

/// Standard English distribution: symbol and number of copies.
pub const STANDARD_DISTRIBUTION: [(char, usize); 27] = [
    ('A', 9),
    ('B', 2),
    ('C', 2),
    ('D', 4),
    ('E', 12),
    ('F', 2),
    ('G', 3),
    ('H', 2),
    ('I', 9),
    ('J', 1),
    ('K', 1),
    ('L', 4),
    ('M', 2),
    ('N', 6),
    ('O', 8),
    ('P', 2),
    ('Q', 1),
    ('R', 6),
    ('S', 4),
    ('T', 6),
    ('U', 4),
    ('V', 2),
    ('W', 2),
    ('X', 1),
    ('Y', 2),
    ('Z', 1),
    ('_', 2),
];

/// A tile symbol: one of the letters `A`-`Z` or the blank `_`.
///
/// A blank carries no letter of its own. When it is placed on the board it
/// is given a displayed letter, but it always scores zero.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
#[serde(try_from = "char", into = "char")]
#[display("{_0}")]
pub struct Tile(char);

/// Error for characters that are not tile symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
#[display("'{}' is not a tile symbol (expected A-Z or _)", _0)]
pub struct InvalidTile(pub char);

impl std::error::Error for InvalidTile {}

impl Tile {
    /// The blank (wildcard) tile.
    pub const BLANK: Tile = Tile('_');

    /// Creates a tile from its symbol. Lowercase letters are accepted and
    /// normalised to uppercase.
    pub fn new(symbol: char) -> Result<Self, InvalidTile> {
        match symbol {
            '_' => Ok(Self::BLANK),
            c if c.is_ascii_alphabetic() => Ok(Self(c.to_ascii_uppercase())),
            other => Err(InvalidTile(other)),
        }
    }

    /// Returns the tile symbol.
    pub fn symbol(self) -> char {
        self.0
    }

    /// Returns true for the blank tile.
    pub fn is_blank(self) -> bool {
        self.0 == '_'
    }

    /// Point value of the tile.
    pub fn value(self) -> u32 {
        letter_value(self.0)
    }
}

impl TryFrom<char> for Tile {
    type Error = InvalidTile;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        Tile::new(value)
    }
}

impl From<Tile> for char {
    fn from(tile: Tile) -> Self {
        tile.0
    }
}

/// Point value of a letter. Unknown symbols and the blank are worth 0.
pub fn letter_value(letter: char) -> u32 {
    match letter.to_ascii_uppercase() {
        'A' | 'E' | 'I' | 'L' | 'N' | 'O' | 'R' | 'S' | 'T' | 'U' => 1,
        'D' | 'G' => 2,
        'B' | 'C' | 'M' | 'P' => 3,
        'F' | 'H' | 'V' | 'W' | 'Y' => 4,
        'K' => 5,
        'J' | 'X' => 8,
        'Q' | 'Z' => 10,
        _ => 0,
    }
}

/// Expands [`STANDARD_DISTRIBUTION`] into a flat list of tiles.
#[instrument]
pub fn standard_tiles() -> Vec<Tile> {
    STANDARD_DISTRIBUTION
        .iter()
        .flat_map(|&(symbol, count)| std::iter::repeat_n(Tile(symbol), count))
        .collect()
}
