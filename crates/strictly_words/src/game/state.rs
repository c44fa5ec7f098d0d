//! Game state owned by the turn machine.

use super::error::TurnError;
use super::types::{Outcome, Phase, Player};
use crate::bag::TileBag;
use crate::board::{Board, Coord};
use crate::rack::Rack;
use crate::tile::STANDARD_TILE_COUNT;
use rand::Rng;
use tracing::{info, instrument, warn};

/// Complete state of one game.
///
/// Values are never mutated in place by callers: every operation returns a
/// new state and leaves the receiver untouched, so a rejected operation
/// cannot leave partial changes behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub(crate) board: Board,
    pub(crate) players: [Player; 2],
    pub(crate) current: usize,
    pub(crate) bag: TileBag,
    pub(crate) phase: Phase,
    pub(crate) last_placed: Vec<Coord>,
    pub(crate) previous_placed: Vec<Coord>,
    pub(crate) turn: u64,
    pub(crate) tile_total: usize,
}

impl GameState {
    /// Sets up a game: standard board, full bag, seven tiles drawn for
    /// each player from the shared bag. The first player moves first once
    /// both have joined.
    #[instrument(skip(rng))]
    pub fn new<R: Rng + ?Sized>(first: &str, second: &str, rng: &mut R) -> Self {
        let mut bag = TileBag::standard();
        let mut first_rack = Rack::default();
        first_rack.refill_from(&mut bag, rng);
        let mut second_rack = Rack::default();
        second_rack.refill_from(&mut bag, rng);

        info!(bag = bag.len(), "Game created");
        Self {
            board: Board::new(),
            players: [Player::new(first, first_rack), Player::new(second, second_rack)],
            current: 0,
            bag,
            phase: Phase::WaitingForPlayers,
            last_placed: Vec::new(),
            previous_placed: Vec::new(),
            turn: 0,
            tile_total: STANDARD_TILE_COUNT,
        }
    }

    /// Builds an in-progress game from explicit parts.
    ///
    /// The tile total used for conservation checks is whatever the parts
    /// add up to. Scores start at the given values.
    pub fn from_parts(
        board: Board,
        players: [(String, u32, Rack); 2],
        current: usize,
        bag: TileBag,
    ) -> Self {
        let [(first_id, first_score, first_rack), (second_id, second_score, second_rack)] = players;
        let mut players = [
            Player::new(first_id, first_rack).with_score(first_score),
            Player::new(second_id, second_rack).with_score(second_score),
        ];
        players.iter_mut().for_each(Player::mark_joined);
        let tile_total = bag.len() + players.iter().map(|p| p.rack().len()).sum::<usize>() + board.tile_count();
        let mut state = Self {
            board,
            players,
            current: current % 2,
            bag,
            phase: Phase::InProgress,
            last_placed: Vec::new(),
            previous_placed: Vec::new(),
            turn: 0,
            tile_total,
        };
        state.check_game_over();
        state
    }

    // ─────────────────────────────────────────────────────────────
    //  Accessors
    // ─────────────────────────────────────────────────────────────

    /// The board, including any staged tiles.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Both players, in seat order.
    pub fn players(&self) -> &[Player; 2] {
        &self.players
    }

    /// Seat index of the player whose turn it is.
    pub fn current_player(&self) -> usize {
        self.current
    }

    /// The player whose turn it is.
    pub fn current(&self) -> &Player {
        &self.players[self.current]
    }

    /// Tiles remaining in the bag.
    pub fn bag(&self) -> &TileBag {
        &self.bag
    }

    /// Lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The outcome, once the game has ended.
    pub fn outcome(&self) -> Option<Outcome> {
        self.phase.outcome()
    }

    /// True once the game has ended.
    pub fn is_over(&self) -> bool {
        self.phase.is_over()
    }

    /// Cells committed by the most recent play.
    pub fn last_placed(&self) -> &[Coord] {
        &self.last_placed
    }

    /// Cells committed by the play before that.
    pub fn previous_placed(&self) -> &[Coord] {
        &self.previous_placed
    }

    /// Number of completed turns.
    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// Number of tiles in the game.
    pub fn tile_total(&self) -> usize {
        self.tile_total
    }

    /// Tiles currently accounted for across bag, racks and board.
    pub fn tiles_accounted(&self) -> usize {
        self.bag.len() + self.players.iter().map(|p| p.rack().len()).sum::<usize>() + self.board.tile_count()
    }

    /// Seat index of `player`.
    ///
    /// # Errors
    ///
    /// [`TurnError::UnknownPlayer`] if the id is not seated here.
    pub fn seat_of(&self, player: &str) -> Result<usize, TurnError> {
        self.players
            .iter()
            .position(|p| p.id() == player)
            .ok_or_else(|| TurnError::UnknownPlayer(player.to_string()))
    }

    // ─────────────────────────────────────────────────────────────
    //  Guards
    // ─────────────────────────────────────────────────────────────

    pub(crate) fn require_in_progress(&self) -> Result<(), TurnError> {
        match self.phase {
            Phase::InProgress => Ok(()),
            Phase::WaitingForPlayers => Err(TurnError::NotStarted),
            Phase::GameOver(_) => Err(TurnError::GameOver),
        }
    }

    /// Checks the game is running and `player` holds the turn, returning
    /// their seat.
    pub(crate) fn require_turn(&self, player: &str) -> Result<usize, TurnError> {
        self.require_in_progress()?;
        let seat = self.seat_of(player)?;
        if seat != self.current {
            warn!(player, "Out of turn");
            return Err(TurnError::NotYourTurn(player.to_string()));
        }
        Ok(seat)
    }

    // ─────────────────────────────────────────────────────────────
    //  Transitions shared by operations
    // ─────────────────────────────────────────────────────────────

    /// Returns staged tiles to the current player's rack.
    pub(crate) fn recall_staged(&mut self) {
        let tiles = self.board.take_staged();
        let rack = self.players[self.current].rack_mut();
        for tile in tiles {
            rack.push(tile);
        }
    }

    /// Hands the turn to the other player.
    pub(crate) fn advance_turn(&mut self) {
        self.current = 1 - self.current;
        self.turn += 1;
    }

    /// Ends the game, deciding the winner by score.
    pub(crate) fn finish(&mut self) {
        let outcome = Outcome::from_scores(*self.players[0].score(), *self.players[1].score());
        info!(%outcome, turn = self.turn, "Game over");
        self.phase = Phase::GameOver(outcome);
    }

    /// Ends the game if the bag is empty and either rack is empty.
    pub(crate) fn check_game_over(&mut self) -> bool {
        let finished = self.bag.is_empty() && self.players.iter().any(|p| p.rack().is_empty());
        if finished {
            self.finish();
        }
        finished
    }
}
