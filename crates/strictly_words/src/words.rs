//! Word extraction: which words a move forms.
//!
//! Given a board with this turn's tiles staged on it and the coordinates of
//! those tiles, the extractor derives the primary word (the run along the
//! line of play) and one perpendicular word per new tile.

use crate::board::{Axis, Board, Coord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, instrument};

/// One letter of an extracted word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCell {
    /// Where the letter sits.
    pub coord: Coord,
    /// Displayed letter.
    pub letter: char,
    /// True if the letter is a blank (scores 0).
    pub blank: bool,
    /// True if the tile was placed this turn.
    pub is_new: bool,
}

/// A maximal contiguous run of filled cells along one axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    axis: Axis,
    cells: Vec<WordCell>,
}

impl Word {
    /// Reading direction.
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Letters in reading order.
    pub fn cells(&self) -> &[WordCell] {
        &self.cells
    }

    /// The word as an uppercase string of displayed letters.
    pub fn text(&self) -> String {
        self.cells.iter().map(|c| c.letter).collect()
    }

    /// Number of letters.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false; a word holds at least the cell it was extracted from.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True if at least one letter was placed this turn.
    pub fn has_new_tile(&self) -> bool {
        self.cells.iter().any(|c| c.is_new)
    }

    /// True if at least one letter was already committed.
    pub fn touches_original(&self) -> bool {
        self.cells.iter().any(|c| !c.is_new)
    }

    /// True if the word is long enough to count.
    pub fn is_scorable(&self) -> bool {
        self.len() >= 2
    }
}

/// Words formed by one move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedWords {
    /// The run along the line of play. May be a single letter.
    pub primary: Word,
    /// Cross words of length two or more, one per new tile at most.
    pub perpendicular: Vec<Word>,
}

impl ExtractedWords {
    /// Primary word followed by the perpendicular words.
    pub fn all(&self) -> impl Iterator<Item = &Word> {
        std::iter::once(&self.primary).chain(self.perpendicular.iter())
    }

    /// Words of length two or more.
    pub fn scorable(&self) -> Vec<&Word> {
        self.all().filter(|w| w.is_scorable()).collect()
    }
}

/// The axis along which every coordinate shares a row or column.
///
/// Returns `None` for fewer than two coordinates (no line is implied) and for
/// coordinates that are not collinear.
pub fn line_axis(coords: &[Coord]) -> Option<Axis> {
    let (first, rest) = coords.split_first()?;
    if rest.is_empty() {
        None
    } else if rest.iter().all(|c| c.row == first.row) {
        Some(Axis::Horizontal)
    } else if rest.iter().all(|c| c.col == first.col) {
        Some(Axis::Vertical)
    } else {
        None
    }
}

/// Walks backwards then forwards from `start` along `axis` while cells are
/// filled, collecting the run.
fn run_through(board: &Board, start: Coord, axis: Axis, new_cells: &HashSet<Coord>) -> Word {
    let mut begin = start;
    while let Some(prev) = begin.step(axis, false).filter(|&c| board.is_filled(c)) {
        begin = prev;
    }

    let mut cells = Vec::new();
    let mut cursor = Some(begin);
    while let Some(coord) = cursor {
        let Some(tile) = board.tile_at(coord) else {
            break;
        };
        cells.push(WordCell {
            coord,
            letter: tile.display(),
            blank: tile.is_blank(),
            is_new: new_cells.contains(&coord),
        });
        cursor = coord.step(axis, true);
    }
    Word { axis, cells }
}

/// Number of filled cells in the run through `start` along `axis`.
fn run_length(board: &Board, start: Coord, axis: Axis) -> usize {
    run_through(board, start, axis, &HashSet::new()).len()
}

/// Chooses the primary axis for a move.
///
/// With several tiles the axis is the shared line. A single tile is checked
/// on both axes: horizontal if it forms a horizontal word, else vertical if
/// it forms a vertical one, else horizontal.
fn primary_axis(board: &Board, new_cells: &[Coord]) -> Option<Axis> {
    match new_cells {
        [] => None,
        [only] => {
            if run_length(board, *only, Axis::Horizontal) > 1 {
                Some(Axis::Horizontal)
            } else if run_length(board, *only, Axis::Vertical) > 1 {
                Some(Axis::Vertical)
            } else {
                Some(Axis::Horizontal)
            }
        }
        many => line_axis(many),
    }
}

/// Extracts the words formed by the tiles at `new_cells`.
///
/// The tiles must already be on `board`. Returns `None` if `new_cells` is
/// empty or not collinear.
#[instrument(skip(board), fields(new = new_cells.len()))]
pub fn extract_words(board: &Board, new_cells: &[Coord]) -> Option<ExtractedWords> {
    let axis = primary_axis(board, new_cells)?;
    let new_set: HashSet<Coord> = new_cells.iter().copied().collect();

    let primary = run_through(board, new_cells[0], axis, &new_set);
    let perpendicular: Vec<Word> = new_cells
        .iter()
        .map(|&c| run_through(board, c, axis.perpendicular(), &new_set))
        .filter(Word::is_scorable)
        .collect();

    debug!(
        %axis,
        primary = %primary.text(),
        perpendicular = ?perpendicular.iter().map(Word::text).collect::<Vec<_>>(),
        "Words extracted"
    );
    Some(ExtractedWords {
        primary,
        perpendicular,
    })
}
