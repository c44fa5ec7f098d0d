//! Serializable game snapshot exchanged with connected parties.

use crate::bag::TileBag;
use crate::board::Board;
use crate::game::GameState;
use crate::rack::{RACK_SIZE, Rack};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

/// One player as seen on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Player identity.
    pub id: String,
    /// Points earned so far.
    pub score: u32,
    /// Tiles in hand.
    pub rack: Rack,
}

/// Full serializable game state: board, players, turn owner and bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    /// Game identifier.
    pub game_id: String,
    /// 15×15 cells of `{tile, bonus, original}`.
    pub board: Board,
    /// Both players, in seat order.
    pub players: [PlayerSnapshot; 2],
    /// Seat index of the player to move.
    pub current_player: usize,
    /// Remaining tile symbols.
    pub bag: TileBag,
}

/// Reasons a snapshot cannot be turned back into a game.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum SnapshotError {
    /// `currentPlayer` is not 0 or 1.
    #[display("Current player {} is not a seat", _0)]
    InvalidCurrentPlayer(usize),
    /// A rack holds too many tiles.
    #[display("Rack of '{}' holds {} tiles", _0, _1)]
    RackTooLarge(String, usize),
    /// Both seats carry the same id.
    #[display("Both players are '{}'", _0)]
    DuplicatePlayer(String),
}

impl std::error::Error for SnapshotError {}

impl GameState {
    /// Captures the wire snapshot of this game under `game_id`.
    pub fn snapshot(&self, game_id: impl Into<String>) -> GameSnapshot {
        let players = self.players().clone().map(|p| PlayerSnapshot {
            id: p.id().clone(),
            score: *p.score(),
            rack: p.rack().clone(),
        });
        GameSnapshot {
            game_id: game_id.into(),
            board: self.board().clone(),
            players,
            current_player: self.current_player(),
            bag: self.bag().clone(),
        }
    }

    /// Rebuilds a running game from a snapshot.
    ///
    /// Both players count as joined. The game is over straight away if the
    /// bag and a rack are both empty.
    ///
    /// # Errors
    ///
    /// [`SnapshotError`] when the snapshot is inconsistent.
    #[instrument(skip_all, fields(game_id = %snapshot.game_id))]
    pub fn restore(snapshot: GameSnapshot) -> Result<GameState, SnapshotError> {
        if snapshot.current_player > 1 {
            warn!(current = snapshot.current_player, "Bad snapshot");
            return Err(SnapshotError::InvalidCurrentPlayer(snapshot.current_player));
        }
        let [first, second] = snapshot.players;
        if first.id == second.id {
            return Err(SnapshotError::DuplicatePlayer(first.id));
        }
        for player in [&first, &second] {
            if player.rack.len() > RACK_SIZE {
                return Err(SnapshotError::RackTooLarge(player.id.clone(), player.rack.len()));
            }
        }
        Ok(GameState::from_parts(
            snapshot.board,
            [
                (first.id, first.score, first.rack),
                (second.id, second.score, second.rack),
            ],
            snapshot.current_player,
            snapshot.bag,
        ))
    }
}
