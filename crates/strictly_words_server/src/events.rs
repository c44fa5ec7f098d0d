//! Game views and the events pushed to both players.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use strictly_words::{Coord, GameSnapshot, GameState, MoveScore, Outcome, Phase};
use tokio::sync::broadcast;
use tracing::{debug, instrument, trace};

/// What a connected party sees of a game: the snapshot plus lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    /// Board, players, turn owner and bag.
    #[serde(flatten)]
    pub snapshot: GameSnapshot,
    /// Lifecycle phase.
    pub phase: Phase,
    /// Result once the game is over.
    pub outcome: Option<Outcome>,
    /// Completed turns.
    pub turn: u64,
    /// Cells committed by the latest play.
    pub last_placed: Vec<Coord>,
    /// Cells committed by the play before that.
    pub previous_placed: Vec<Coord>,
}

impl GameView {
    /// Builds the view of `state` under `game_id`.
    pub fn of(game_id: &str, state: &GameState) -> Self {
        Self {
            snapshot: state.snapshot(game_id),
            phase: state.phase(),
            outcome: state.outcome(),
            turn: state.turn(),
            last_placed: state.last_placed().to_vec(),
            previous_placed: state.previous_placed().to_vec(),
        }
    }
}

/// Event pushed to every subscriber of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    /// A transition was committed.
    GameUpdated {
        /// State after the transition.
        view: Box<GameView>,
        /// Points of the play that caused it, if it was a play.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        score: Option<MoveScore>,
    },
    /// The game ended.
    GameOver {
        /// Who won.
        outcome: Outcome,
    },
    /// The game was torn down.
    GameRemoved,
}

/// Per-game broadcast channels.
#[derive(Debug, Clone)]
pub struct EventHub {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<GameEvent>>>>,
    capacity: usize,
}

impl EventHub {
    /// Creates a hub whose channels buffer `capacity` events each.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    fn sender(&self, game_id: &str) -> broadcast::Sender<GameEvent> {
        let mut channels = self.channels.lock().unwrap_or_else(|p| p.into_inner());
        channels
            .entry(game_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Subscribes to a game's events.
    #[instrument(skip(self))]
    pub fn subscribe(&self, game_id: &str) -> broadcast::Receiver<GameEvent> {
        debug!("New subscriber");
        self.sender(game_id).subscribe()
    }

    /// Sends an event to every current subscriber. Returns how many got it.
    #[instrument(skip(self, event))]
    pub fn publish(&self, game_id: &str, event: GameEvent) -> usize {
        let sender = self
            .channels
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(game_id)
            .cloned();
        let delivered = sender.map_or(0, |s| s.send(event).unwrap_or(0));
        trace!(delivered, "Event published");
        delivered
    }

    /// Sends [`GameEvent::GameRemoved`] and drops the game's channel.
    #[instrument(skip(self))]
    pub fn close(&self, game_id: &str) {
        let sender = self
            .channels
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(game_id);
        if let Some(sender) = sender {
            let _ = sender.send(GameEvent::GameRemoved);
            debug!("Channel closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_view_serializes_flat() {
        let state = GameState::new("ann", "bob", &mut StdRng::seed_from_u64(2));
        let value = serde_json::to_value(GameView::of("g1", &state)).unwrap();
        assert_eq!(value["gameId"], "g1");
        assert_eq!(value["phase"]["phase"], "waitingForPlayers");
        assert_eq!(value["turn"], 0);
        assert!(value["lastPlaced"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let hub = EventHub::new(4);
        let mut a = hub.subscribe("g1");
        let mut b = hub.subscribe("g1");
        let event = GameEvent::GameOver { outcome: Outcome::Tie };
        assert_eq!(hub.publish("g1", event.clone()), 2);
        assert_eq!(a.recv().await.unwrap(), event);
        assert_eq!(b.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_close_sends_removed() {
        let hub = EventHub::new(4);
        let mut rx = hub.subscribe("g1");
        hub.close("g1");
        assert_eq!(rx.recv().await.unwrap(), GameEvent::GameRemoved);
        assert!(rx.recv().await.is_err());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let hub = EventHub::new(4);
        assert_eq!(hub.publish("nobody", GameEvent::GameRemoved), 0);
    }
}
