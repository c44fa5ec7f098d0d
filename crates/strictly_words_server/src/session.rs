//! Game session store with one writer per game.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use strictly_words::{GameState, TurnError};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, instrument, warn};

/// Unique identifier for a game.
pub type GameId = String;

/// Length of generated game ids.
pub const GAME_ID_LEN: usize = 9;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates a random base-36 game id.
pub fn new_game_id<R: Rng + ?Sized>(rng: &mut R) -> GameId {
    (0..GAME_ID_LEN)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Store-level failures.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum SessionError {
    /// No game with this id.
    #[display("Game '{}' not found", _0)]
    NotFound(GameId),
    /// Another operation on this game is in flight. Retry later.
    #[display("Game '{}' is busy, retry", _0)]
    Conflict(GameId),
    /// Both seats were given the same player.
    #[display("A player cannot play against themself ('{}')", _0)]
    DuplicatePlayers(String),
    /// A player id was empty.
    #[display("Player ids must not be empty")]
    EmptyPlayerId,
    /// The turn machine rejected the operation.
    #[display("{}", _0)]
    Turn(TurnError),
}

impl std::error::Error for SessionError {}

impl From<TurnError> for SessionError {
    fn from(err: TurnError) -> Self {
        SessionError::Turn(err)
    }
}

impl SessionError {
    /// True for transient failures a client may retry unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::Conflict(_) => true,
            SessionError::Turn(err) => err.is_retryable(),
            _ => false,
        }
    }
}

/// One game: its last committed state and the gate writers must hold.
#[derive(Debug)]
struct GameSlot {
    committed: Mutex<GameState>,
    gate: Arc<tokio::sync::Mutex<StdRng>>,
}

/// Locks a std mutex, recovering the data if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Exclusive right to change one game.
///
/// Holds the game's random source. Dropping the guard without
/// [`WriteGuard::commit`] leaves the game as it was.
#[derive(Debug)]
pub struct WriteGuard {
    id: GameId,
    slot: Arc<GameSlot>,
    rng: OwnedMutexGuard<StdRng>,
}

impl WriteGuard {
    /// The game this guard writes to.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// A copy of the last committed state.
    pub fn state(&self) -> GameState {
        lock(&self.slot.committed).clone()
    }

    /// The game's random source.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Publishes `state` as the game's committed state.
    #[instrument(skip_all, fields(game_id = %self.id, turn = state.turn()))]
    pub fn commit(&self, state: GameState) {
        *lock(&self.slot.committed) = state;
        debug!("State committed");
    }
}

/// Holds every active game, keyed by id.
#[derive(Debug, Clone)]
pub struct SessionStore {
    games: Arc<Mutex<HashMap<GameId, Arc<GameSlot>>>>,
    seeds: Arc<Mutex<StdRng>>,
}

impl SessionStore {
    /// Creates an empty store. With a seed, tile draws and ids are
    /// reproducible.
    #[instrument]
    pub fn new(seed: Option<u64>) -> Self {
        info!("Creating session store");
        let seeds = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            games: Arc::new(Mutex::new(HashMap::new())),
            seeds: Arc::new(Mutex::new(seeds)),
        }
    }

    /// Creates a game for two distinct players and returns its id.
    #[instrument(skip(self))]
    pub fn create_game(&self, first: &str, second: &str) -> Result<GameId, SessionError> {
        if first.is_empty() || second.is_empty() {
            return Err(SessionError::EmptyPlayerId);
        }
        if first == second {
            warn!(player = first, "Duplicate players");
            return Err(SessionError::DuplicatePlayers(first.to_string()));
        }

        let mut rng = {
            let mut seeds = lock(&self.seeds);
            StdRng::seed_from_u64(seeds.random())
        };
        let state = GameState::new(first, second, &mut rng);

        let mut games = lock(&self.games);
        let id = loop {
            let candidate = new_game_id(&mut rng);
            if !games.contains_key(&candidate) {
                break candidate;
            }
        };
        games.insert(
            id.clone(),
            Arc::new(GameSlot {
                committed: Mutex::new(state),
                gate: Arc::new(tokio::sync::Mutex::new(rng)),
            }),
        );
        info!(game_id = %id, total_games = games.len(), "Game created");
        Ok(id)
    }

    fn slot(&self, id: &str) -> Result<Arc<GameSlot>, SessionError> {
        lock(&self.games)
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// The last committed state of a game. Never waits for writers.
    #[instrument(skip(self))]
    pub fn get_game(&self, id: &str) -> Result<GameState, SessionError> {
        let slot = self.slot(id)?;
        let state = lock(&slot.committed).clone();
        Ok(state)
    }

    /// Takes the write gate for a game, failing at once if it is held.
    #[instrument(skip(self))]
    pub fn try_write(&self, id: &str) -> Result<WriteGuard, SessionError> {
        let slot = self.slot(id)?;
        let rng = slot.gate.clone().try_lock_owned().map_err(|_| {
            warn!(game_id = id, "Concurrent write rejected");
            SessionError::Conflict(id.to_string())
        })?;
        self.registered(id, slot, rng)
    }

    /// Takes the write gate for a game, waiting for the current writer.
    ///
    /// Used by timers and teardown, which must not be turned away by a move
    /// in flight. Fails with [`SessionError::NotFound`] if the game was
    /// removed while waiting.
    #[instrument(skip(self))]
    pub async fn write(&self, id: &str) -> Result<WriteGuard, SessionError> {
        let slot = self.slot(id)?;
        let rng = slot.gate.clone().lock_owned().await;
        self.registered(id, slot, rng)
    }

    fn registered(
        &self,
        id: &str,
        slot: Arc<GameSlot>,
        rng: OwnedMutexGuard<StdRng>,
    ) -> Result<WriteGuard, SessionError> {
        let current = lock(&self.games).get(id).is_some_and(|s| Arc::ptr_eq(s, &slot));
        if !current {
            debug!(game_id = id, "Game removed while waiting for the gate");
            return Err(SessionError::NotFound(id.to_string()));
        }
        Ok(WriteGuard {
            id: id.to_string(),
            slot,
            rng,
        })
    }

    /// Removes the game `guard` writes to, returning its final state.
    ///
    /// The gate stays held until the guard drops, so no writer can slip in
    /// between the last commit and removal.
    #[instrument(skip_all, fields(game_id = %guard.id))]
    pub fn remove_game(&self, guard: WriteGuard) -> Result<GameState, SessionError> {
        {
            let mut games = lock(&self.games);
            if !games.get(&guard.id).is_some_and(|s| Arc::ptr_eq(s, &guard.slot)) {
                return Err(SessionError::NotFound(guard.id.clone()));
            }
            games.remove(&guard.id);
        }
        info!("Game removed");
        Ok(guard.state())
    }

    /// Ids of all active games.
    pub fn game_ids(&self) -> Vec<GameId> {
        lock(&self.games).keys().cloned().collect()
    }

    /// Number of active games.
    pub fn len(&self) -> usize {
        lock(&self.games).len()
    }

    /// True if no games are active.
    pub fn is_empty(&self) -> bool {
        lock(&self.games).is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_id_shape() {
        let id = new_game_id(&mut StdRng::seed_from_u64(1));
        assert_eq!(id.len(), GAME_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_same_seed_same_game() {
        let a = SessionStore::new(Some(5));
        let b = SessionStore::new(Some(5));
        let id_a = a.create_game("ann", "bob").unwrap();
        let id_b = b.create_game("ann", "bob").unwrap();
        assert_eq!(id_a, id_b);
        assert_eq!(a.get_game(&id_a).unwrap(), b.get_game(&id_b).unwrap());
    }

    #[test]
    fn test_uncommitted_write_is_discarded() {
        let store = SessionStore::new(Some(1));
        let id = store.create_game("ann", "bob").unwrap();
        let before = store.get_game(&id).unwrap();
        {
            let guard = store.try_write(&id).unwrap();
            let _changed = guard.state().join("ann").unwrap();
        }
        assert_eq!(store.get_game(&id).unwrap(), before);
    }
}
