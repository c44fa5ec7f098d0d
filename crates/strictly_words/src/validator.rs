//! Placement rules.
//!
//! Rules run in a fixed order and the first failure wins. Geometry
//! (rules 1-5) is pure; the dictionary check (rule 6) is the only step that
//! waits on an external oracle.

use crate::board::{Axis, Board, Coord};
use crate::dictionary::{Dictionary, is_valid_word};
use crate::game::TurnError;
use crate::words::{ExtractedWords, Word, extract_words, line_axis};
use futures::future::join_all;
use tracing::{debug, instrument, warn};

/// Rule violations. Reported to the submitting player only.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum PlacementError {
    /// The move placed nothing.
    #[display("No tiles were played")]
    NoTilesPlayed,
    /// New tiles are not in a single row or column.
    #[display("Tiles must be placed in a single row or column")]
    NotInLine,
    /// The line of new tiles has an empty cell in it.
    #[display("Tiles must form one continuous line")]
    GapInWord,
    /// Opening move does not cover the centre cell.
    #[display("The first word must cover the centre square")]
    MustStartAtCenter,
    /// New tiles do not touch any committed tile.
    #[display("Tiles must connect to existing words")]
    NotConnected,
    /// A formed word is not in the dictionary.
    #[display("'{}' is not a valid word", _0)]
    InvalidWord(String),
    /// The move forms no word of two or more letters.
    #[display("A move must form a word of at least two letters")]
    NoScoringWord,
}

impl std::error::Error for PlacementError {}

impl PlacementError {
    /// Stable reason code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            PlacementError::NoTilesPlayed => "no_tiles_played",
            PlacementError::NotInLine => "not_in_line",
            PlacementError::GapInWord => "gap_in_word",
            PlacementError::MustStartAtCenter => "must_start_at_center",
            PlacementError::NotConnected => "not_connected",
            PlacementError::InvalidWord(_) => "invalid_word",
            PlacementError::NoScoringWord => "no_scoring_word",
        }
    }
}

/// Applies rules 1-5 to the tiles at `new_cells`, which must already be
/// staged on `board`, and returns the words they form.
///
/// # Errors
///
/// The first geometric rule that fails.
#[instrument(skip(board), fields(new = new_cells.len()))]
pub fn validate_geometry(board: &Board, new_cells: &[Coord]) -> Result<ExtractedWords, PlacementError> {
    if new_cells.is_empty() {
        return Err(PlacementError::NoTilesPlayed);
    }

    if new_cells.len() > 1 {
        let axis = line_axis(new_cells).ok_or(PlacementError::NotInLine)?;
        let fixed = new_cells[0];
        let positions = new_cells.iter().map(|c| c.along(axis));
        let (min, max) = positions.fold((usize::MAX, 0), |(lo, hi), p| (lo.min(p), hi.max(p)));
        let gap = (min..=max).any(|p| {
            let coord = match axis {
                Axis::Horizontal => Coord { row: fixed.row, col: p },
                Axis::Vertical => Coord { row: p, col: fixed.col },
            };
            !board.is_filled(coord)
        });
        if gap {
            return Err(PlacementError::GapInWord);
        }
    }

    let words = extract_words(board, new_cells).ok_or(PlacementError::NotInLine)?;

    if board.has_original_tiles() {
        if !words.all().any(Word::touches_original) {
            return Err(PlacementError::NotConnected);
        }
    } else if !new_cells.contains(&Coord::CENTER) {
        return Err(PlacementError::MustStartAtCenter);
    }

    Ok(words)
}

/// Rule 6: every word of two or more letters must be in the dictionary.
///
/// Lookups for different words run concurrently. Any oracle failure rejects
/// the whole move as [`TurnError::ValidationUnavailable`].
///
/// # Errors
///
/// [`PlacementError::InvalidWord`] for the first rejected word in reading
/// order, or [`TurnError::ValidationUnavailable`].
#[instrument(skip_all)]
pub async fn check_words(words: &ExtractedWords, dictionary: &dyn Dictionary) -> Result<(), TurnError> {
    let candidates: Vec<String> = words.scorable().iter().map(|w| w.text()).collect();
    let lookups = candidates.iter().map(|w| is_valid_word(dictionary, w));
    let results = join_all(lookups).await;

    for (word, result) in candidates.iter().zip(results) {
        match result {
            Ok(true) => debug!(word, "Word accepted"),
            Ok(false) => {
                warn!(word, "Word rejected");
                return Err(PlacementError::InvalidWord(word.clone()).into());
            }
            Err(err) => {
                warn!(word, error = %err, "Dictionary lookup failed");
                return Err(TurnError::ValidationUnavailable(err));
            }
        }
    }
    Ok(())
}

/// Rule 7: the move must form at least one word of two or more letters.
///
/// # Errors
///
/// [`PlacementError::NoScoringWord`] if nothing scorable was formed.
pub fn require_scoring_word(words: &ExtractedWords) -> Result<(), PlacementError> {
    if words.scorable().is_empty() {
        Err(PlacementError::NoScoringWord)
    } else {
        Ok(())
    }
}
