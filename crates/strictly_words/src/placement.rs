//! Proposed tile placements and their structural checks.
//!
//! A placement is a player's intent: put this rack tile on that cell. These
//! checks run before any rule is evaluated and reject requests that are
//! malformed rather than illegal.

use crate::board::{Board, Coord, PlacedTile};
use crate::rack::Rack;
use crate::tile::Tile;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

/// One tile a player wants to put on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_new::new)]
pub struct Placement {
    /// Target row.
    pub row: usize,
    /// Target column.
    pub col: usize,
    /// Rack tile being placed.
    pub tile: Tile,
    /// Letter a blank stands for. Required for blanks, forbidden otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter: Option<char>,
}

impl Placement {
    /// A regular letter tile.
    pub fn at(row: usize, col: usize, tile: Tile) -> Self {
        Self::new(row, col, tile, None)
    }

    /// A blank displayed as `letter`.
    pub fn blank(row: usize, col: usize, letter: char) -> Self {
        Self::new(row, col, Tile::BLANK, Some(letter))
    }
}

/// Malformed move requests.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MoveShapeError {
    /// Target cell is off the board.
    #[display("Cell ({}, {}) is off the board", row, col)]
    OutOfBounds {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },
    /// Target cell already holds a committed tile.
    #[display("Cell {} is already occupied", _0)]
    CellOccupied(Coord),
    /// Two placements target the same cell.
    #[display("Cell {} is used twice", _0)]
    DuplicateCell(Coord),
    /// The tile is not on the player's rack.
    #[display("Tile {} is not on your rack", _0)]
    TileNotInRack(Tile),
    /// A blank was placed without choosing its letter.
    #[display("Blank at {} needs a letter", _0)]
    BlankNeedsLetter(Coord),
    /// A letter was supplied for a tile that is not a blank.
    #[display("Only blanks take a letter (at {})", _0)]
    LetterOnlyForBlank(Coord),
    /// The chosen blank letter is not A-Z.
    #[display("'{}' is not a letter", _0)]
    InvalidLetter(char),
}

impl std::error::Error for MoveShapeError {}

impl MoveShapeError {
    /// Stable reason code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            MoveShapeError::OutOfBounds { .. } => "out_of_bounds",
            MoveShapeError::CellOccupied(_) => "cell_occupied",
            MoveShapeError::DuplicateCell(_) => "duplicate_cell",
            MoveShapeError::TileNotInRack(_) => "tile_not_in_rack",
            MoveShapeError::BlankNeedsLetter(_) => "blank_needs_letter",
            MoveShapeError::LetterOnlyForBlank(_) => "letter_only_for_blank",
            MoveShapeError::InvalidLetter(_) => "invalid_letter",
        }
    }
}

/// A board with the requested tiles staged on it, and the rack they left.
#[derive(Debug, Clone)]
pub struct AppliedPlacements {
    /// Board with the new tiles staged.
    pub board: Board,
    /// Rack with the placed tiles removed.
    pub rack: Rack,
    /// Coordinates of the new tiles, in request order.
    pub new_cells: Vec<Coord>,
}

/// Puts `placements` on `board` as staged tiles, taking them from `rack`.
///
/// `board` must not hold staged tiles of its own; callers recall them first.
///
/// # Errors
///
/// Returns the first [`MoveShapeError`] found. Inputs are never modified.
#[instrument(skip(board, rack), fields(count = placements.len()))]
pub fn apply_placements(
    board: &Board,
    rack: &Rack,
    placements: &[Placement],
) -> Result<AppliedPlacements, MoveShapeError> {
    let mut board = board.clone();
    let mut rack = rack.clone();
    let mut seen = HashSet::new();
    let mut new_cells = Vec::with_capacity(placements.len());

    for placement in placements {
        let coord = Coord::new(placement.row, placement.col).ok_or(MoveShapeError::OutOfBounds {
            row: placement.row,
            col: placement.col,
        })?;
        if !seen.insert(coord) {
            warn!(%coord, "Duplicate placement");
            return Err(MoveShapeError::DuplicateCell(coord));
        }
        if board.is_filled(coord) {
            warn!(%coord, "Placement on occupied cell");
            return Err(MoveShapeError::CellOccupied(coord));
        }

        let placed = match (placement.tile.is_blank(), placement.letter) {
            (true, Some(letter)) if letter.is_ascii_alphabetic() => PlacedTile::blank(letter),
            (true, Some(letter)) => return Err(MoveShapeError::InvalidLetter(letter)),
            (true, None) => return Err(MoveShapeError::BlankNeedsLetter(coord)),
            (false, Some(_)) => return Err(MoveShapeError::LetterOnlyForBlank(coord)),
            (false, None) => PlacedTile::letter(placement.tile),
        };

        if !rack.remove(placement.tile) {
            warn!(tile = %placement.tile, "Tile not on rack");
            return Err(MoveShapeError::TileNotInRack(placement.tile));
        }
        board.place(coord, placed);
        new_cells.push(coord);
    }

    debug!(new_cells = new_cells.len(), rack = rack.len(), "Placements applied");
    Ok(AppliedPlacements {
        board,
        rack,
        new_cells,
    })
}

/// Derives placements from a full proposed board: every filled cell that is
/// not committed on `current`.
///
/// # Errors
///
/// [`MoveShapeError::CellOccupied`] if the proposal removes or changes a
/// committed tile.
#[instrument(skip_all)]
pub fn placements_from_proposed_board(current: &Board, proposed: &Board) -> Result<Vec<Placement>, MoveShapeError> {
    let mut placements = Vec::new();
    for coord in proposed.coords() {
        let proposed_tile = proposed.tile_at(coord);
        match current.tile_at(coord).filter(|t| t.is_original()) {
            Some(committed) => {
                let kept = proposed_tile
                    .is_some_and(|t| t.display() == committed.display() && t.is_blank() == committed.is_blank());
                if !kept {
                    warn!(%coord, "Proposed board alters a committed tile");
                    return Err(MoveShapeError::CellOccupied(coord));
                }
            }
            None => {
                if let Some(tile) = proposed_tile {
                    placements.push(if tile.is_blank() {
                        Placement::blank(coord.row, coord.col, tile.display())
                    } else {
                        Placement::at(coord.row, coord.col, tile.tile())
                    });
                }
            }
        }
    }
    Ok(placements)
}
