//! Game service: the boundary the transport talks to.
//!
//! Every mutating call takes the game's write gate, runs one turn
//! operation against the committed state, commits the result, reschedules
//! timers and pushes the new view to both players. Rejections are returned
//! to the caller only.

use crate::config::ServerConfig;
use crate::dictionary::TimedDictionary;
use crate::events::{EventHub, GameEvent, GameView};
use crate::session::{GameId, SessionError, SessionStore, WriteGuard};
use crate::timer::{TimerKind, Timers};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strictly_words::{
    Board, Dictionary, DictionaryError, GameState, MoveScore, Phase, Placement, Tile, TurnError, is_valid_word,
    placements_from_proposed_board,
};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

/// Result of a committed play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayReport {
    /// Game after the play.
    pub view: GameView,
    /// Points earned, per word.
    pub score: MoveScore,
    /// Tiles drawn to refill the rack.
    pub drawn: Vec<Tile>,
}

struct Inner {
    store: SessionStore,
    dictionary: Arc<dyn Dictionary>,
    timers: Timers,
    events: EventHub,
    config: ServerConfig,
}

/// Shared handle to all games. Cheap to clone.
#[derive(Clone)]
pub struct GameService {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for GameService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameService")
            .field("games", &self.inner.store.len())
            .field("dictionary_ready", &self.inner.dictionary.is_ready())
            .finish()
    }
}

impl GameService {
    /// Creates a service over `dictionary`. Lookups are bounded by the
    /// configured timeout.
    #[instrument(skip_all)]
    pub fn new(dictionary: Arc<dyn Dictionary>, config: ServerConfig) -> Self {
        info!(
            turn_seconds = config.turn_seconds(),
            game_seconds = config.game_seconds(),
            policy = %config.timeout_policy(),
            "Creating game service"
        );
        let dictionary: Arc<dyn Dictionary> =
            Arc::new(TimedDictionary::new(dictionary, config.lookup_timeout()));
        Self {
            inner: Arc::new(Inner {
                store: SessionStore::new(*config.rng_seed()),
                dictionary,
                timers: Timers::new(),
                events: EventHub::new(*config.event_buffer()),
                config,
            }),
        }
    }

    /// The configuration in effect.
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// True if the dictionary has been loaded.
    pub fn dictionary_ready(&self) -> bool {
        self.inner.dictionary.is_ready()
    }

    // ─────────────────────────────────────────────────────────────
    //  Lifecycle
    // ─────────────────────────────────────────────────────────────

    /// Creates a game for two players. Timers start once both join.
    #[instrument(skip(self))]
    pub fn create_game(&self, first: &str, second: &str) -> Result<GameView, SessionError> {
        let id = self.inner.store.create_game(first, second)?;
        let state = self.inner.store.get_game(&id)?;
        Ok(GameView::of(&id, &state))
    }

    /// Last committed view of a game.
    pub fn get_game(&self, id: &str) -> Result<GameView, SessionError> {
        let state = self.inner.store.get_game(id)?;
        Ok(GameView::of(id, &state))
    }

    /// Ids of all active games.
    pub fn game_ids(&self) -> Vec<GameId> {
        self.inner.store.game_ids()
    }

    /// Marks a player as connected.
    #[instrument(skip(self))]
    pub fn join(&self, id: &str, player: &str) -> Result<GameView, SessionError> {
        let guard = self.inner.store.try_write(id)?;
        let before = guard.state();
        let after = before.join(player)?;
        Ok(self.commit(&guard, &before, after, None))
    }

    /// Tears a game down, stopping its timers and telling subscribers.
    ///
    /// Waits for a move in flight to finish first.
    #[instrument(skip(self))]
    pub async fn remove_game(&self, id: &str) -> Result<GameView, SessionError> {
        let guard = self.inner.store.write(id).await?;
        let state = self.inner.store.remove_game(guard)?;
        self.inner.timers.cancel_all(id);
        self.inner.events.close(id);
        info!("Game torn down");
        Ok(GameView::of(id, &state))
    }

    /// Subscribes to a game's events.
    pub fn subscribe(&self, id: &str) -> Result<broadcast::Receiver<GameEvent>, SessionError> {
        self.inner.store.get_game(id)?;
        Ok(self.inner.events.subscribe(id))
    }

    /// Waits for the next event a subscriber of `id` should see.
    ///
    /// A subscriber that fell behind skips what it missed and gets a fresh
    /// view of the game instead. `None` once the game's channel is closed.
    pub async fn next_event(&self, id: &str, events: &mut broadcast::Receiver<GameEvent>) -> Option<GameEvent> {
        match events.recv().await {
            Ok(event) => Some(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(game_id = id, skipped, "Subscriber lagged, sending current view");
                *events = events.resubscribe();
                Some(match self.get_game(id) {
                    Ok(view) => GameEvent::GameUpdated {
                        view: Box::new(view),
                        score: None,
                    },
                    Err(_) => GameEvent::GameRemoved,
                })
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Turn operations
    // ─────────────────────────────────────────────────────────────

    /// Plays tiles for `player`.
    #[instrument(skip(self, placements), fields(count = placements.len()))]
    pub async fn apply_play(
        &self,
        id: &str,
        player: &str,
        placements: &[Placement],
    ) -> Result<PlayReport, SessionError> {
        let mut guard = self.inner.store.try_write(id)?;
        let before = guard.state();
        self.play_locked(&mut guard, &before, player, placements).await
    }

    /// Plays whatever `proposed` holds beyond the committed board.
    #[instrument(skip(self, proposed))]
    pub async fn apply_play_proposed(
        &self,
        id: &str,
        player: &str,
        proposed: &Board,
    ) -> Result<PlayReport, SessionError> {
        let mut guard = self.inner.store.try_write(id)?;
        let before = guard.state();
        let placements = placements_from_proposed_board(before.board(), proposed).map_err(TurnError::from)?;
        debug!(count = placements.len(), "Placements derived from proposed board");
        self.play_locked(&mut guard, &before, player, &placements).await
    }

    async fn play_locked(
        &self,
        guard: &mut WriteGuard,
        before: &GameState,
        player: &str,
        placements: &[Placement],
    ) -> Result<PlayReport, SessionError> {
        let played = before
            .play(player, placements, self.inner.dictionary.as_ref(), guard.rng())
            .await?;
        let view = self.commit(guard, before, played.state, Some(played.score.clone()));
        Ok(PlayReport {
            view,
            score: played.score,
            drawn: played.drawn,
        })
    }

    /// Swaps one rack tile for a tile from the bag.
    #[instrument(skip(self))]
    pub fn apply_exchange(&self, id: &str, player: &str, tile: Tile) -> Result<GameView, SessionError> {
        let mut guard = self.inner.store.try_write(id)?;
        let before = guard.state();
        let after = before.exchange(player, tile, guard.rng())?;
        Ok(self.commit(&guard, &before, after, None))
    }

    /// Ends `player`'s turn without scoring.
    #[instrument(skip(self))]
    pub fn apply_pass(&self, id: &str, player: &str) -> Result<GameView, SessionError> {
        let guard = self.inner.store.try_write(id)?;
        let before = guard.state();
        let after = before.pass(player)?;
        Ok(self.commit(&guard, &before, after, None))
    }

    /// Times out the current turn under the configured policy.
    #[instrument(skip(self))]
    pub fn apply_timeout(&self, id: &str) -> Result<GameView, SessionError> {
        let guard = self.inner.store.try_write(id)?;
        let before = guard.state();
        let after = before.timeout(*self.inner.config.timeout_policy())?;
        Ok(self.commit(&guard, &before, after, None))
    }

    // ─────────────────────────────────────────────────────────────
    //  Composing a move
    // ─────────────────────────────────────────────────────────────

    /// Puts tiles on the board without ending the turn.
    #[instrument(skip(self, placements), fields(count = placements.len()))]
    pub fn stage(&self, id: &str, player: &str, placements: &[Placement]) -> Result<GameView, SessionError> {
        let guard = self.inner.store.try_write(id)?;
        let before = guard.state();
        let after = before.stage(player, placements)?;
        Ok(self.commit(&guard, &before, after, None))
    }

    /// Takes staged tiles back into the rack.
    #[instrument(skip(self))]
    pub fn recall(&self, id: &str, player: &str) -> Result<GameView, SessionError> {
        let guard = self.inner.store.try_write(id)?;
        let before = guard.state();
        let after = before.recall(player)?;
        Ok(self.commit(&guard, &before, after, None))
    }

    /// Shuffles a player's rack.
    #[instrument(skip(self))]
    pub fn shuffle_rack(&self, id: &str, player: &str) -> Result<GameView, SessionError> {
        let mut guard = self.inner.store.try_write(id)?;
        let before = guard.state();
        let after = before.shuffle_rack(player, guard.rng())?;
        Ok(self.commit(&guard, &before, after, None))
    }

    /// Sets the display order of a player's rack.
    #[instrument(skip(self))]
    pub fn reorder_rack(&self, id: &str, player: &str, order: Vec<Tile>) -> Result<GameView, SessionError> {
        let guard = self.inner.store.try_write(id)?;
        let before = guard.state();
        let after = before.reorder_rack(player, order)?;
        Ok(self.commit(&guard, &before, after, None))
    }

    /// Predicts the score of `placements`. Changes nothing.
    #[instrument(skip(self, placements), fields(count = placements.len()))]
    pub fn preview(&self, id: &str, player: &str, placements: &[Placement]) -> Result<MoveScore, SessionError> {
        let state = self.inner.store.get_game(id)?;
        Ok(state.preview(player, placements)?)
    }

    /// Asks the dictionary about a single word.
    pub async fn check_word(&self, word: &str) -> Result<bool, DictionaryError> {
        is_valid_word(self.inner.dictionary.as_ref(), word).await
    }

    // ─────────────────────────────────────────────────────────────
    //  Commit, timers, events
    // ─────────────────────────────────────────────────────────────

    fn commit(
        &self,
        guard: &WriteGuard,
        before: &GameState,
        after: GameState,
        score: Option<MoveScore>,
    ) -> GameView {
        let id = guard.id();
        guard.commit(after.clone());

        if after.is_over() {
            self.inner.timers.cancel_all(id);
        } else if after.phase() == Phase::InProgress {
            let started = before.phase() == Phase::WaitingForPlayers;
            if started {
                info!(game_id = id, "Both players joined, game started");
                self.schedule_game_clock(id);
            }
            if started || after.turn() != before.turn() {
                self.schedule_turn(id, after.turn());
            }
        }

        let view = GameView::of(id, &after);
        self.inner.events.publish(
            id,
            GameEvent::GameUpdated {
                view: Box::new(view.clone()),
                score,
            },
        );
        if let (Some(outcome), false) = (after.outcome(), before.is_over()) {
            info!(game_id = id, %outcome, "Game over");
            self.inner.events.publish(id, GameEvent::GameOver { outcome });
        }
        view
    }

    fn schedule_turn(&self, id: &str, turn: u64) {
        let service = self.clone();
        let game_id = id.to_string();
        self.inner.timers.schedule(
            id,
            TimerKind::Turn,
            self.inner.config.turn_duration(),
            async move {
                if let Err(err) = service.expire_turn(&game_id, turn).await {
                    warn!(game_id, turn, error = %err, "Turn expiry failed");
                }
            },
        );
    }

    fn schedule_game_clock(&self, id: &str) {
        let service = self.clone();
        let game_id = id.to_string();
        self.inner.timers.schedule(
            id,
            TimerKind::GameClock,
            self.inner.config.game_duration(),
            async move {
                if let Err(err) = service.expire_game(&game_id).await {
                    warn!(game_id, error = %err, "Game clock expiry failed");
                }
            },
        );
    }

    /// Times out turn `turn`, unless the game has moved past it.
    #[instrument(skip(self))]
    async fn expire_turn(&self, id: &str, turn: u64) -> Result<(), SessionError> {
        let guard = self.inner.store.write(id).await?;
        let before = guard.state();
        if before.turn() != turn || before.phase() != Phase::InProgress {
            debug!(current = before.turn(), "Stale turn timer ignored");
            return Ok(());
        }
        let after = before.timeout(*self.inner.config.timeout_policy())?;
        self.commit(&guard, &before, after, None);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn expire_game(&self, id: &str) -> Result<(), SessionError> {
        let guard = self.inner.store.write(id).await?;
        let before = guard.state();
        if before.phase() != Phase::InProgress {
            return Ok(());
        }
        let after = before.expire_game_clock()?;
        self.commit(&guard, &before, after, None);
        Ok(())
    }

    /// True if the game's turn timer is running.
    pub fn turn_timer_running(&self, id: &str) -> bool {
        self.inner.timers.is_scheduled(id, TimerKind::Turn)
    }
}
