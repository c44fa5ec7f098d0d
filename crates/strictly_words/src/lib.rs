//! Strictly Words - rules engine for a two-player word-placement game
//!
//! This library decides whether tiles placed on a 15×15 board form legal,
//! connected, dictionary-valid words, scores them under premium squares and
//! advances the per-game turn state.
//!
//! # Architecture
//!
//! - **Tiles, bag, rack, board**: the physical pieces and the standard layout
//! - **Word extraction**: the primary word and cross words a move forms
//! - **Validation**: geometric rules, then dictionary lookups
//! - **Scoring**: letter and word multipliers under newly placed tiles only
//! - **Game**: the turn state machine with its invariants and contracts
//!
//! # Example
//!
//! ```no_run
//! use strictly_words::{GameState, Placement, Tile, WordList};
//! use rand::SeedableRng;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let game = GameState::new("ann", "bob", &mut rng).join("ann")?.join("bob")?;
//! let dictionary = WordList::from_words(["DOG"]);
//! let tiles = [Placement::at(7, 7, Tile::new('D')?), Placement::at(7, 8, Tile::new('O')?)];
//! let played = game.play("ann", &tiles, &dictionary, &mut rng).await?;
//! println!("{} points", played.score.total());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod bag;
mod board;
mod dictionary;
mod game;
mod placement;
mod rack;
mod scoring;
mod snapshot;
mod tile;
mod validator;
mod words;

// Crate-level exports - Pieces
pub use bag::TileBag;
pub use board::{Axis, BOARD_SIZE, Board, Bonus, Cell, CellError, Coord, PlacedTile, standard_bonus};
pub use rack::{RACK_SIZE, Rack};
pub use tile::{InvalidTile, STANDARD_DISTRIBUTION, STANDARD_TILE_COUNT, Tile, letter_value, standard_tiles};

// Crate-level exports - Moves
pub use placement::{AppliedPlacements, MoveShapeError, Placement, apply_placements, placements_from_proposed_board};
pub use words::{ExtractedWords, Word, WordCell, extract_words, line_axis};
pub use validator::{PlacementError, check_words, require_scoring_word, validate_geometry};
pub use scoring::{MoveScore, WordScore, preview, score_word, score_words};

// Crate-level exports - Dictionary oracle
pub use dictionary::{Dictionary, DictionaryError, MIN_WORD_LEN, WordList, is_valid_word};

// Crate-level exports - Turn state machine
pub use game::{
    Contract, GameState, Invariant, InvariantSet, InvariantViolation, Outcome, Phase, PlayOutcome,
    Player, PreparedPlay, TimeoutPolicy, TurnContract, TurnError, WordGameInvariants,
};
pub use game::invariants::{RackCapacityInvariant, StagedTilesInvariant, TileConservationInvariant};

// Crate-level exports - Wire snapshot
pub use snapshot::{GameSnapshot, PlayerSnapshot, SnapshotError};
