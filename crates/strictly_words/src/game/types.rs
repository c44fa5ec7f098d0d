//! Players, phases and outcomes.

use super::GameState;
use crate::board::Coord;
use crate::rack::Rack;
use crate::scoring::MoveScore;
use crate::tile::Tile;
use serde::{Deserialize, Serialize};

/// One of the two seats in a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Player {
    /// Caller-supplied identity.
    id: String,
    /// Points earned so far. Never decreases.
    score: u32,
    /// Tiles in hand.
    rack: Rack,
    /// True once the player has connected to the game.
    joined: bool,
}

impl Player {
    /// A player who has not yet joined.
    pub fn new(id: impl Into<String>, rack: Rack) -> Self {
        Self {
            id: id.into(),
            score: 0,
            rack,
            joined: false,
        }
    }

    pub(crate) fn with_score(mut self, score: u32) -> Self {
        self.score = score;
        self
    }

    pub(crate) fn rack_mut(&mut self) -> &mut Rack {
        &mut self.rack
    }

    pub(crate) fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    pub(crate) fn mark_joined(&mut self) {
        self.joined = true;
    }
}

/// Result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "camelCase", tag = "kind", content = "player")]
pub enum Outcome {
    /// Seat index of the player with the strictly higher score.
    #[display("Player {} wins", _0)]
    Winner(usize),
    /// Equal scores.
    #[display("Tie")]
    Tie,
}

impl Outcome {
    /// Decides the outcome from the two final scores.
    pub fn from_scores(first: u32, second: u32) -> Self {
        match first.cmp(&second) {
            std::cmp::Ordering::Greater => Outcome::Winner(0),
            std::cmp::Ordering::Less => Outcome::Winner(1),
            std::cmp::Ordering::Equal => Outcome::Tie,
        }
    }

    /// The winning seat, if any.
    pub fn winner(&self) -> Option<usize> {
        match self {
            Outcome::Winner(index) => Some(*index),
            Outcome::Tie => None,
        }
    }
}

/// Lifecycle of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "camelCase", tag = "phase", content = "outcome")]
pub enum Phase {
    /// Created, waiting for both players to join.
    WaitingForPlayers,
    /// Turns are being played.
    InProgress,
    /// Terminal.
    GameOver(Outcome),
}

impl Phase {
    /// True once the game has ended.
    pub fn is_over(&self) -> bool {
        matches!(self, Phase::GameOver(_))
    }

    /// The outcome, once the game has ended.
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            Phase::GameOver(outcome) => Some(*outcome),
            _ => None,
        }
    }
}

/// What the turn timer does when a turn runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimeoutPolicy {
    /// The current player passes.
    #[default]
    Pass,
    /// The game ends and is decided by score.
    EndGame,
}

/// A committed play.
#[derive(Debug, Clone)]
pub struct PlayOutcome {
    /// State after the play.
    pub state: GameState,
    /// Points earned.
    pub score: MoveScore,
    /// Tiles drawn to refill the rack.
    pub drawn: Vec<Tile>,
    /// Coordinates committed by the play.
    pub placed: Vec<Coord>,
}
