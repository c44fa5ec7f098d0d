//! Move scoring.
//!
//! Premium squares count only under tiles placed this turn. Letter bonuses
//! multiply the letter; word bonuses multiply the word once each. Blanks are
//! worth nothing on any square.

use crate::board::Board;
use crate::tile::letter_value;
use crate::validator::{PlacementError, validate_geometry};
use crate::words::Word;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Points earned by one word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new, derive_getters::Getters)]
pub struct WordScore {
    /// The word as displayed.
    word: String,
    /// Points after multipliers.
    score: u32,
}

/// Points earned by a whole move.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, derive_getters::Getters)]
pub struct MoveScore {
    /// Sum of all word scores.
    total: u32,
    /// Per-word breakdown, primary word first.
    words: Vec<WordScore>,
}

/// Scores one word against the board's premium squares.
///
/// A word with no tile placed this turn scores 0.
pub fn score_word(board: &Board, word: &Word) -> u32 {
    if !word.has_new_tile() {
        return 0;
    }
    let mut letters = 0;
    let mut multiplier = 1;
    for cell in word.cells() {
        let base = if cell.blank { 0 } else { letter_value(cell.letter) };
        match board.cell(cell.coord).bonus().filter(|_| cell.is_new) {
            Some(bonus) => {
                letters += base * bonus.letter_multiplier();
                multiplier *= bonus.word_multiplier();
            }
            None => letters += base,
        }
    }
    letters * multiplier
}

/// Scores every word of two or more letters.
#[instrument(skip_all)]
pub fn score_words<'a>(board: &Board, words: impl IntoIterator<Item = &'a Word>) -> MoveScore {
    let words: Vec<WordScore> = words
        .into_iter()
        .filter(|w| w.is_scorable())
        .map(|w| WordScore::new(w.text(), score_word(board, w)))
        .collect();
    let total: u32 = words.iter().map(|w| w.score).sum();
    debug!(total, "Move scored");
    MoveScore { total, words }
}

/// Predicts the score of the tiles currently staged on `board`.
///
/// Runs the geometric rules and the scoring engine but not the dictionary,
/// so a valid preview is not a promise that the move will be accepted.
///
/// # Errors
///
/// The first geometric rule the staged tiles break.
#[instrument(skip_all)]
pub fn preview(board: &Board) -> Result<MoveScore, PlacementError> {
    let staged = board.staged_coords();
    let words = validate_geometry(board, &staged)?;
    Ok(score_words(board, words.all()))
}
