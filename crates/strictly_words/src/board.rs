//! The 15×15 board, its premium squares and the tiles placed on it.

use crate::tile::{InvalidTile, Tile, letter_value};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::instrument;

/// Width and height of the board.
pub const BOARD_SIZE: usize = 15;

// ─────────────────────────────────────────────────────────────
//  Coordinates
// ─────────────────────────────────────────────────────────────

/// A cell coordinate, row-major, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// Row index (0-14).
    pub row: usize,
    /// Column index (0-14).
    pub col: usize,
}

impl Coord {
    /// The centre cell every opening move must cover.
    pub const CENTER: Coord = Coord { row: 7, col: 7 };

    /// Creates a coordinate, or `None` if it lies off the board.
    pub fn new(row: usize, col: usize) -> Option<Self> {
        (row < BOARD_SIZE && col < BOARD_SIZE).then_some(Self { row, col })
    }

    /// The neighbouring cell one step along `axis`, forwards or backwards.
    pub fn step(self, axis: Axis, forward: bool) -> Option<Self> {
        let (row, col) = match (axis, forward) {
            (Axis::Horizontal, true) => (Some(self.row), self.col.checked_add(1)),
            (Axis::Horizontal, false) => (Some(self.row), self.col.checked_sub(1)),
            (Axis::Vertical, true) => (self.row.checked_add(1), Some(self.col)),
            (Axis::Vertical, false) => (self.row.checked_sub(1), Some(self.col)),
        };
        Coord::new(row?, col?)
    }

    /// Position of this cell along `axis`.
    pub fn along(self, axis: Axis) -> usize {
        match axis {
            Axis::Horizontal => self.col,
            Axis::Vertical => self.row,
        }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Direction a word reads in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Axis {
    /// Left to right along a row.
    Horizontal,
    /// Top to bottom along a column.
    Vertical,
}

impl Axis {
    /// The other axis.
    pub fn perpendicular(self) -> Self {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Premium squares
// ─────────────────────────────────────────────────────────────

/// Premium square type. Fixed when the board is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter)]
pub enum Bonus {
    /// Double letter score.
    #[serde(rename = "dl")]
    DoubleLetter,
    /// Triple letter score.
    #[serde(rename = "tl")]
    TripleLetter,
    /// Double word score.
    #[serde(rename = "dw")]
    DoubleWord,
    /// Triple word score.
    #[serde(rename = "tw")]
    TripleWord,
}

impl Bonus {
    /// Multiplier applied to a newly placed letter on this square.
    pub fn letter_multiplier(self) -> u32 {
        match self {
            Bonus::DoubleLetter => 2,
            Bonus::TripleLetter => 3,
            Bonus::DoubleWord | Bonus::TripleWord => 1,
        }
    }

    /// Multiplier applied to a word containing a newly placed tile on this square.
    pub fn word_multiplier(self) -> u32 {
        match self {
            Bonus::DoubleWord => 2,
            Bonus::TripleWord => 3,
            Bonus::DoubleLetter | Bonus::TripleLetter => 1,
        }
    }
}

const TRIPLE_WORD: [(usize, usize); 8] = [
    (0, 0),
    (0, 7),
    (0, 14),
    (7, 0),
    (7, 14),
    (14, 0),
    (14, 7),
    (14, 14),
];

const DOUBLE_WORD: [(usize, usize); 17] = [
    (7, 7),
    (1, 1),
    (2, 2),
    (3, 3),
    (4, 4),
    (10, 10),
    (11, 11),
    (12, 12),
    (13, 13),
    (1, 13),
    (2, 12),
    (3, 11),
    (4, 10),
    (10, 4),
    (11, 3),
    (12, 2),
    (13, 1),
];

const DOUBLE_LETTER: [(usize, usize); 12] = [
    (1, 5),
    (1, 9),
    (5, 1),
    (5, 5),
    (5, 9),
    (5, 13),
    (9, 1),
    (9, 5),
    (9, 9),
    (9, 13),
    (13, 5),
    (13, 9),
];

const TRIPLE_LETTER: [(usize, usize); 24] = [
    (0, 3),
    (0, 11),
    (2, 6),
    (2, 8),
    (3, 0),
    (3, 7),
    (3, 14),
    (6, 2),
    (6, 6),
    (6, 8),
    (6, 12),
    (7, 3),
    (7, 11),
    (8, 2),
    (8, 6),
    (8, 8),
    (8, 12),
    (11, 0),
    (11, 7),
    (11, 14),
    (12, 6),
    (12, 8),
    (14, 3),
    (14, 11),
];

/// Premium square at `coord` in the standard layout.
pub fn standard_bonus(coord: Coord) -> Option<Bonus> {
    let key = (coord.row, coord.col);
    if TRIPLE_WORD.contains(&key) {
        Some(Bonus::TripleWord)
    } else if DOUBLE_WORD.contains(&key) {
        Some(Bonus::DoubleWord)
    } else if TRIPLE_LETTER.contains(&key) {
        Some(Bonus::TripleLetter)
    } else if DOUBLE_LETTER.contains(&key) {
        Some(Bonus::DoubleLetter)
    } else {
        None
    }
}

// ─────────────────────────────────────────────────────────────
//  Cells
// ─────────────────────────────────────────────────────────────

/// A tile sitting on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlacedTile {
    letter: char,
    blank: bool,
    original: bool,
}

impl PlacedTile {
    /// A regular letter tile placed this turn.
    pub fn letter(tile: Tile) -> Self {
        Self {
            letter: tile.symbol(),
            blank: false,
            original: false,
        }
    }

    /// A blank placed this turn, displayed as `letter`.
    pub fn blank(letter: char) -> Self {
        Self {
            letter: letter.to_ascii_uppercase(),
            blank: true,
            original: false,
        }
    }

    /// The letter shown on the board.
    pub fn display(&self) -> char {
        self.letter
    }

    /// True if this tile is a blank standing in for [`Self::display`].
    pub fn is_blank(&self) -> bool {
        self.blank
    }

    /// True once the tile has survived a committed turn.
    pub fn is_original(&self) -> bool {
        self.original
    }

    /// The rack tile this came from.
    pub fn tile(&self) -> Tile {
        if self.blank {
            Tile::BLANK
        } else {
            Tile::new(self.letter).unwrap_or(Tile::BLANK)
        }
    }

    /// Base point value. Blanks are always worth 0.
    pub fn value(&self) -> u32 {
        if self.blank { 0 } else { letter_value(self.letter) }
    }

    fn committed(self) -> Self {
        Self {
            original: true,
            ..self
        }
    }
}

/// One board square: its immutable bonus and an optional tile.
///
/// Provenance lives on the tile, so an empty cell can never be marked
/// original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "CellRepr", into = "CellRepr")]
pub struct Cell {
    bonus: Option<Bonus>,
    tile: Option<PlacedTile>,
}

impl Cell {
    /// The premium square type, if any.
    pub fn bonus(&self) -> Option<Bonus> {
        self.bonus
    }

    /// The tile on this cell, if any.
    pub fn tile(&self) -> Option<&PlacedTile> {
        self.tile.as_ref()
    }

    /// True if a tile sits on this cell.
    pub fn is_filled(&self) -> bool {
        self.tile.is_some()
    }

    /// True if the tile on this cell is original (committed).
    pub fn is_original(&self) -> bool {
        self.tile.is_some_and(|t| t.original)
    }

    /// True if the tile on this cell was placed but not yet committed.
    pub fn is_staged(&self) -> bool {
        self.tile.is_some_and(|t| !t.original)
    }
}

/// Wire form of a cell: `{tile, bonus, original}` plus `blank` when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CellRepr {
    tile: Option<char>,
    bonus: Option<Bonus>,
    original: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    blank: bool,
}

/// Errors turning a wire cell into a [`Cell`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum CellError {
    /// The tile is not a letter.
    #[display("{}", _0)]
    Tile(InvalidTile),
    /// A cell without a tile was marked original.
    #[display("Empty cell cannot be original")]
    OriginalWithoutTile,
    /// A blank flag was set on an empty cell.
    #[display("Empty cell cannot hold a blank")]
    BlankWithoutTile,
}

impl std::error::Error for CellError {}

impl TryFrom<CellRepr> for Cell {
    type Error = CellError;

    fn try_from(repr: CellRepr) -> Result<Self, Self::Error> {
        let tile = match repr.tile {
            Some(letter) => {
                let tile = Tile::new(letter).map_err(CellError::Tile)?;
                if tile.is_blank() {
                    return Err(CellError::Tile(InvalidTile(letter)));
                }
                Some(PlacedTile {
                    letter: tile.symbol(),
                    blank: repr.blank,
                    original: repr.original,
                })
            }
            None if repr.original => return Err(CellError::OriginalWithoutTile),
            None if repr.blank => return Err(CellError::BlankWithoutTile),
            None => None,
        };
        Ok(Cell {
            bonus: repr.bonus,
            tile,
        })
    }
}

impl From<Cell> for CellRepr {
    fn from(cell: Cell) -> Self {
        CellRepr {
            tile: cell.tile.map(|t| t.letter),
            bonus: cell.bonus,
            original: cell.is_original(),
            blank: cell.tile.is_some_and(|t| t.blank),
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Board
// ─────────────────────────────────────────────────────────────

/// 15×15 grid of cells.
///
/// Bonuses are assigned once at construction; only tiles change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Creates an empty board with the standard premium layout.
    #[instrument]
    pub fn new() -> Self {
        Self::with_layout(standard_bonus)
    }

    /// Creates an empty board with no premium squares.
    pub fn plain() -> Self {
        Self::with_layout(|_| None)
    }

    /// Creates an empty board whose premium squares come from `layout`.
    pub fn with_layout(layout: impl Fn(Coord) -> Option<Bonus>) -> Self {
        let mut cells = [[Cell::default(); BOARD_SIZE]; BOARD_SIZE];
        for (row, line) in cells.iter_mut().enumerate() {
            for (col, cell) in line.iter_mut().enumerate() {
                cell.bonus = layout(Coord { row, col });
            }
        }
        Self { cells }
    }

    /// The cell at `coord`.
    pub fn cell(&self, coord: Coord) -> &Cell {
        &self.cells[coord.row][coord.col]
    }

    /// The tile at `coord`, if any.
    pub fn tile_at(&self, coord: Coord) -> Option<&PlacedTile> {
        self.cell(coord).tile()
    }

    /// True if a tile sits at `coord`.
    pub fn is_filled(&self, coord: Coord) -> bool {
        self.cell(coord).is_filled()
    }

    /// True if at least one committed tile is on the board.
    pub fn has_original_tiles(&self) -> bool {
        self.coords().any(|c| self.cell(c).is_original())
    }

    /// Total number of tiles on the board, committed or staged.
    pub fn tile_count(&self) -> usize {
        self.coords().filter(|&c| self.is_filled(c)).count()
    }

    /// Coordinates of staged (uncommitted) tiles, row-major.
    pub fn staged_coords(&self) -> Vec<Coord> {
        self.coords().filter(|&c| self.cell(c).is_staged()).collect()
    }

    /// Every coordinate, row-major.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + use<> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Coord { row, col }))
    }

    /// Rows of cells, for rendering.
    pub fn rows(&self) -> &[[Cell; BOARD_SIZE]; BOARD_SIZE] {
        &self.cells
    }

    pub(crate) fn place(&mut self, coord: Coord, tile: PlacedTile) {
        self.cells[coord.row][coord.col].tile = Some(tile);
    }

    /// Removes every staged tile, returning the rack tiles they came from.
    pub(crate) fn take_staged(&mut self) -> Vec<Tile> {
        let mut taken = Vec::new();
        for line in self.cells.iter_mut() {
            for cell in line.iter_mut() {
                if let Some(tile) = cell.tile.filter(|t| !t.original) {
                    taken.push(tile.tile());
                    cell.tile = None;
                }
            }
        }
        taken
    }

    /// Marks every staged tile original.
    pub(crate) fn commit_staged(&mut self) {
        for line in self.cells.iter_mut() {
            for cell in line.iter_mut() {
                cell.tile = cell.tile.map(PlacedTile::committed);
            }
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.cells {
            for cell in line {
                let symbol = match (cell.tile, cell.bonus) {
                    (Some(tile), _) if tile.blank => tile.letter.to_ascii_lowercase(),
                    (Some(tile), _) => tile.letter,
                    (None, Some(Bonus::DoubleLetter)) => '2',
                    (None, Some(Bonus::TripleLetter)) => '3',
                    (None, Some(Bonus::DoubleWord)) => '@',
                    (None, Some(Bonus::TripleWord)) => '#',
                    (None, None) => '.',
                };
                write!(f, "{}", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
