//! Turn operations.
//!
//! Every operation borrows the current state and returns a new one. On
//! error nothing changes, so repeating a rejected request yields the same
//! error against the same state.

use super::GameState;
use super::contracts::{Contract, TurnContract};
use super::error::TurnError;
use super::types::{Phase, PlayOutcome, TimeoutPolicy};
use crate::board::Coord;
use crate::dictionary::Dictionary;
use crate::placement::{MoveShapeError, Placement, apply_placements};
use crate::scoring::{MoveScore, preview, score_words};
use crate::tile::Tile;
use crate::validator::{check_words, require_scoring_word, validate_geometry};
use crate::words::ExtractedWords;
use rand::Rng;
use tracing::{debug, info, instrument, warn};

/// A play that passed the geometric rules and awaits the dictionary.
#[derive(Debug, Clone)]
pub struct PreparedPlay {
    state: GameState,
    new_cells: Vec<Coord>,
    words: ExtractedWords,
}

impl PreparedPlay {
    /// Words the play forms.
    pub fn words(&self) -> &ExtractedWords {
        &self.words
    }

    /// Coordinates of the tiles being played.
    pub fn new_cells(&self) -> &[Coord] {
        &self.new_cells
    }
}

impl GameState {
    // ─────────────────────────────────────────────────────────────
    //  Lobby
    // ─────────────────────────────────────────────────────────────

    /// Marks `player` as connected. The game starts once both have joined.
    ///
    /// Joining again is a no-op.
    ///
    /// # Errors
    ///
    /// [`TurnError::UnknownPlayer`] or [`TurnError::GameOver`].
    #[instrument(skip(self), fields(phase = %self.phase))]
    pub fn join(&self, player: &str) -> Result<GameState, TurnError> {
        if self.is_over() {
            return Err(TurnError::GameOver);
        }
        let seat = self.seat_of(player)?;
        let mut next = self.clone();
        next.players[seat].mark_joined();
        if next.phase == Phase::WaitingForPlayers && next.players.iter().all(|p| *p.joined()) {
            next.phase = Phase::InProgress;
            info!(first = %next.players[0].id(), second = %next.players[1].id(), "Game started");
        }
        Ok(next)
    }

    // ─────────────────────────────────────────────────────────────
    //  Play
    // ─────────────────────────────────────────────────────────────

    /// Runs every check of a play that does not need the dictionary.
    ///
    /// Staged tiles are returned to the rack before `placements` are applied.
    ///
    /// # Errors
    ///
    /// Turn ownership, structural and geometric failures.
    #[instrument(skip(self, placements), fields(count = placements.len()))]
    pub fn prepare_play(&self, player: &str, placements: &[Placement]) -> Result<PreparedPlay, TurnError> {
        TurnContract::pre(self, player)?;

        let mut state = self.clone();
        state.recall_staged();
        let seat = state.current;
        let applied = apply_placements(&state.board, state.players[seat].rack(), placements)?;
        let words = validate_geometry(&applied.board, &applied.new_cells)?;

        state.board = applied.board;
        *state.players[seat].rack_mut() = applied.rack;
        Ok(PreparedPlay {
            state,
            new_cells: applied.new_cells,
            words,
        })
    }

    /// Commits a prepared play whose words have been accepted: scores it,
    /// refills the rack, passes the turn and checks for game over.
    ///
    /// # Errors
    ///
    /// [`crate::validator::PlacementError::NoScoringWord`] when no word of two
    /// or more letters was formed, or a postcondition failure.
    #[instrument(skip_all, fields(turn = self.turn))]
    pub fn commit_play<R: Rng + ?Sized>(&self, prepared: PreparedPlay, rng: &mut R) -> Result<PlayOutcome, TurnError> {
        require_scoring_word(&prepared.words)?;

        let PreparedPlay {
            mut state,
            new_cells,
            words,
        } = prepared;
        let seat = state.current;
        let score: MoveScore = score_words(&state.board, words.all());

        state.board.commit_staged();
        state.players[seat].add_score(*score.total());
        let drawn = {
            let Self { players, bag, .. } = &mut state;
            players[seat].rack_mut().refill_from(bag, rng)
        };
        state.previous_placed = std::mem::replace(&mut state.last_placed, new_cells.clone());

        state.advance_turn();
        state.check_game_over();

        #[cfg(debug_assertions)]
        TurnContract::post(self, &state)?;

        info!(
            player = %state.players[seat].id(),
            points = score.total(),
            drawn = drawn.len(),
            bag = state.bag.len(),
            "Play committed"
        );
        Ok(PlayOutcome {
            state,
            score,
            drawn,
            placed: new_cells,
        })
    }

    /// Plays tiles for `player`: structural checks, placement rules,
    /// dictionary lookups, scoring and commit.
    ///
    /// # Errors
    ///
    /// The first check that fails. The receiver is never modified.
    #[instrument(skip(self, placements, dictionary, rng), fields(count = placements.len()))]
    pub async fn play<R: Rng + ?Sized>(
        &self,
        player: &str,
        placements: &[Placement],
        dictionary: &dyn Dictionary,
        rng: &mut R,
    ) -> Result<PlayOutcome, TurnError> {
        let prepared = self.prepare_play(player, placements).inspect_err(|err| {
            warn!(player, error = %err, "Play rejected");
        })?;
        check_words(&prepared.words, dictionary).await?;
        self.commit_play(prepared, rng).inspect_err(|err| {
            warn!(player, error = %err, "Play rejected");
        })
    }

    // ─────────────────────────────────────────────────────────────
    //  Exchange, pass, timeout
    // ─────────────────────────────────────────────────────────────

    /// Swaps one rack tile for a random tile from the bag and ends the turn.
    ///
    /// Staged tiles go back to the rack first. The returned tile is put in
    /// the bag before the replacement is drawn.
    ///
    /// # Errors
    ///
    /// [`TurnError::BagEmpty`], or [`MoveShapeError::TileNotInRack`] if the
    /// player does not hold `tile`.
    #[instrument(skip(self, rng), fields(bag = self.bag.len()))]
    pub fn exchange<R: Rng + ?Sized>(&self, player: &str, tile: Tile, rng: &mut R) -> Result<GameState, TurnError> {
        TurnContract::pre(self, player)?;
        if self.bag.is_empty() {
            warn!(player, "Exchange with empty bag");
            return Err(TurnError::BagEmpty);
        }

        let mut next = self.clone();
        next.recall_staged();
        let seat = next.current;
        if !next.players[seat].rack_mut().remove(tile) {
            warn!(player, %tile, "Exchange of tile not on rack");
            return Err(MoveShapeError::TileNotInRack(tile).into());
        }
        next.bag.put_back(tile);
        let drawn = next.bag.draw(1, rng);
        for replacement in drawn {
            next.players[seat].rack_mut().push(replacement);
        }
        next.advance_turn();

        #[cfg(debug_assertions)]
        TurnContract::post(self, &next)?;

        info!(player, turn = next.turn, "Tile exchanged");
        Ok(next)
    }

    /// Ends the turn without scoring. Staged tiles return to the rack.
    ///
    /// # Errors
    ///
    /// Turn ownership failures.
    #[instrument(skip(self))]
    pub fn pass(&self, player: &str) -> Result<GameState, TurnError> {
        TurnContract::pre(self, player)?;
        let mut next = self.clone();
        next.recall_staged();
        next.advance_turn();

        #[cfg(debug_assertions)]
        TurnContract::post(self, &next)?;

        info!(player, turn = next.turn, "Turn passed");
        Ok(next)
    }

    /// The current player ran out of time.
    ///
    /// Under [`TimeoutPolicy::Pass`] this is a pass on their behalf; under
    /// [`TimeoutPolicy::EndGame`] the game ends and is decided by score.
    ///
    /// # Errors
    ///
    /// [`TurnError::NotStarted`] or [`TurnError::GameOver`].
    #[instrument(skip(self), fields(turn = self.turn))]
    pub fn timeout(&self, policy: TimeoutPolicy) -> Result<GameState, TurnError> {
        self.require_in_progress()?;
        match policy {
            TimeoutPolicy::Pass => {
                let player = self.current().id().clone();
                info!(%player, "Turn timed out");
                self.pass(&player)
            }
            TimeoutPolicy::EndGame => {
                info!("Turn timed out, ending game");
                self.end_by_score()
            }
        }
    }

    /// The overall game clock ran out. The game ends and is decided by score.
    ///
    /// # Errors
    ///
    /// [`TurnError::NotStarted`] or [`TurnError::GameOver`].
    #[instrument(skip(self))]
    pub fn expire_game_clock(&self) -> Result<GameState, TurnError> {
        self.require_in_progress()?;
        info!("Game clock expired");
        self.end_by_score()
    }

    fn end_by_score(&self) -> Result<GameState, TurnError> {
        let mut next = self.clone();
        next.recall_staged();
        next.finish();

        #[cfg(debug_assertions)]
        TurnContract::post(self, &next)?;

        Ok(next)
    }

    // ─────────────────────────────────────────────────────────────
    //  Composing a move
    // ─────────────────────────────────────────────────────────────

    /// Puts tiles on the board without ending the turn, replacing whatever
    /// the player had staged before.
    ///
    /// # Errors
    ///
    /// Turn ownership and structural failures.
    #[instrument(skip(self, placements), fields(count = placements.len()))]
    pub fn stage(&self, player: &str, placements: &[Placement]) -> Result<GameState, TurnError> {
        let seat = self.require_turn(player)?;
        let mut next = self.clone();
        next.recall_staged();
        let applied = apply_placements(&next.board, next.players[seat].rack(), placements)?;
        next.board = applied.board;
        *next.players[seat].rack_mut() = applied.rack;
        debug!(player, staged = applied.new_cells.len(), "Tiles staged");
        Ok(next)
    }

    /// Returns every staged tile to the player's rack.
    ///
    /// # Errors
    ///
    /// Turn ownership failures.
    #[instrument(skip(self))]
    pub fn recall(&self, player: &str) -> Result<GameState, TurnError> {
        self.require_turn(player)?;
        let mut next = self.clone();
        next.recall_staged();
        debug!(player, rack = next.current().rack().len(), "Tiles recalled");
        Ok(next)
    }

    /// Predicts the score of `placements` without the dictionary and
    /// without changing anything.
    ///
    /// # Errors
    ///
    /// Turn ownership, structural and geometric failures.
    #[instrument(skip(self, placements), fields(count = placements.len()))]
    pub fn preview(&self, player: &str, placements: &[Placement]) -> Result<MoveScore, TurnError> {
        let staged = self.stage(player, placements)?;
        Ok(preview(&staged.board)?)
    }

    /// Shuffles a player's rack. Either player may do this at any time
    /// during play.
    ///
    /// # Errors
    ///
    /// [`TurnError::UnknownPlayer`] or phase failures.
    #[instrument(skip(self, rng))]
    pub fn shuffle_rack<R: Rng + ?Sized>(&self, player: &str, rng: &mut R) -> Result<GameState, TurnError> {
        self.require_in_progress()?;
        let seat = self.seat_of(player)?;
        let mut next = self.clone();
        next.players[seat].rack_mut().shuffle(rng);
        Ok(next)
    }

    /// Replaces the display order of a player's rack.
    ///
    /// # Errors
    ///
    /// [`TurnError::NotAPermutation`] unless `order` holds exactly the
    /// current rack tiles.
    #[instrument(skip(self))]
    pub fn reorder_rack(&self, player: &str, order: Vec<Tile>) -> Result<GameState, TurnError> {
        self.require_in_progress()?;
        let seat = self.seat_of(player)?;
        let mut next = self.clone();
        if !next.players[seat].rack_mut().reorder(order) {
            warn!(player, "Rack reorder is not a permutation");
            return Err(TurnError::NotAPermutation);
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::TileBag;
    use crate::board::Board;
    use crate::dictionary::WordList;
    use crate::game::Outcome;
    use crate::rack::Rack;
    use crate::validator::PlacementError;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn tiles(symbols: &str) -> Vec<Tile> {
        symbols.chars().map(|c| Tile::new(c).unwrap()).collect()
    }

    fn game(first: &str, second: &str, bag: &str) -> GameState {
        GameState::from_parts(
            Board::new(),
            [
                ("ann".to_string(), 0, Rack::new(tiles(first))),
                ("bob".to_string(), 0, Rack::new(tiles(second))),
            ],
            0,
            TileBag::from_tiles(tiles(bag)),
        )
    }

    fn dog() -> Vec<Placement> {
        vec![
            Placement::at(7, 7, Tile::new('D').unwrap()),
            Placement::at(7, 8, Tile::new('O').unwrap()),
            Placement::at(7, 9, Tile::new('G').unwrap()),
        ]
    }

    #[test]
    fn test_join_starts_game_when_both_present() {
        let game = GameState::new("ann", "bob", &mut StdRng::seed_from_u64(1));
        let one = game.join("ann").unwrap();
        assert_eq!(one.phase(), Phase::WaitingForPlayers);
        let both = one.join("bob").unwrap();
        assert_eq!(both.phase(), Phase::InProgress);
        assert_eq!(both.join("bob").unwrap(), both);
        assert!(matches!(game.join("eve"), Err(TurnError::UnknownPlayer(_))));
    }

    #[tokio::test]
    async fn test_play_commits_and_refills() {
        let game = game("DOGXXXX", "AAAAAAA", "EEEEE");
        let dictionary = WordList::from_words(["DOG"]);
        let mut rng = StdRng::seed_from_u64(2);
        let outcome = game.play("ann", &dog(), &dictionary, &mut rng).await.unwrap();

        // DOG on the centre double word: (2 + 1 + 2) * 2
        assert_eq!(*outcome.score.total(), 10);
        assert_eq!(outcome.drawn.len(), 3);
        let next = outcome.state;
        assert_eq!(*next.players()[0].score(), 10);
        assert_eq!(next.players()[0].rack().len(), 7);
        assert_eq!(next.current_player(), 1);
        assert_eq!(next.turn(), 1);
        assert_eq!(next.last_placed().len(), 3);
        assert!(next.board().cell(Coord::CENTER).is_original());
        assert_eq!(next.tiles_accounted(), next.tile_total());
    }

    #[tokio::test]
    async fn test_invalid_word_leaves_state_unchanged() {
        let game = game("DOGXXXX", "AAAAAAA", "EEEEE");
        let dictionary = WordList::from_words(["CAT"]);
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..2 {
            let err = game.play("ann", &dog(), &dictionary, &mut rng).await.unwrap_err();
            assert_eq!(err, TurnError::Rule(PlacementError::InvalidWord("DOG".to_string())));
        }
        assert_eq!(game, self::game("DOGXXXX", "AAAAAAA", "EEEEE"));
    }

    #[tokio::test]
    async fn test_out_of_turn_play_rejected() {
        let game = game("DOGXXXX", "AAAAAAA", "EEEEE");
        let dictionary = WordList::from_words(["DOG"]);
        let err = game
            .play("bob", &dog(), &dictionary, &mut StdRng::seed_from_u64(2))
            .await
            .unwrap_err();
        assert_eq!(err, TurnError::NotYourTurn("bob".to_string()));
    }

    #[tokio::test]
    async fn test_emptying_bag_and_rack_ends_game() {
        let game = game("DOG", "AAAAAAA", "");
        let dictionary = WordList::from_words(["DOG"]);
        let outcome = game
            .play("ann", &dog(), &dictionary, &mut StdRng::seed_from_u64(2))
            .await
            .unwrap();
        assert_eq!(outcome.state.outcome(), Some(Outcome::Winner(0)));
        assert_eq!(outcome.state.current_player(), 1);
        assert_eq!(outcome.state.turn(), 1);
        assert!(outcome.state.pass("bob").is_err());
    }

    #[test]
    fn test_exchange_swaps_one_tile() {
        let game = game("QXXXXXX", "AAAAAAA", "E");
        let next = game.exchange("ann", Tile::new('Q').unwrap(), &mut StdRng::seed_from_u64(4)).unwrap();
        let rack = next.players()[0].rack();
        assert_eq!(rack.len(), 7);
        assert_eq!(next.bag().len(), 1);
        let mut pooled: Vec<Tile> = rack.tiles().iter().chain(next.bag().tiles()).copied().collect();
        pooled.sort();
        let mut expected = tiles("QXXXXXXE");
        expected.sort();
        assert_eq!(pooled, expected);
        assert_eq!(next.current_player(), 1);
    }

    #[test]
    fn test_exchange_with_empty_bag_rejected() {
        let game = game("QXXXXXX", "AAAAAAA", "");
        assert_eq!(
            game.exchange("ann", Tile::new('Q').unwrap(), &mut StdRng::seed_from_u64(4)),
            Err(TurnError::BagEmpty)
        );
    }

    #[test]
    fn test_exchange_of_missing_tile_rejected() {
        let game = game("QXXXXXX", "AAAAAAA", "E");
        assert_eq!(
            game.exchange("ann", Tile::new('Z').unwrap(), &mut StdRng::seed_from_u64(4)),
            Err(TurnError::Shape(MoveShapeError::TileNotInRack(Tile::new('Z').unwrap())))
        );
    }

    #[test]
    fn test_pass_returns_staged_tiles() {
        let game = game("DOGXXXX", "AAAAAAA", "E");
        let staged = game.stage("ann", &dog()).unwrap();
        assert_eq!(staged.players()[0].rack().len(), 4);
        assert_eq!(staged.board().staged_coords().len(), 3);

        let passed = staged.pass("ann").unwrap();
        assert_eq!(passed.players()[0].rack().len(), 7);
        assert_eq!(passed.board().tile_count(), 0);
        assert_eq!(passed.current_player(), 1);
    }

    #[test]
    fn test_stage_replaces_previous_staging() {
        let game = game("DOGXXXX", "AAAAAAA", "E");
        let once = game.stage("ann", &dog()).unwrap();
        let twice = once.stage("ann", &dog()).unwrap();
        assert_eq!(twice.board().staged_coords().len(), 3);
        assert_eq!(twice.recall("ann").unwrap().players()[0].rack().len(), 7);
    }

    #[test]
    fn test_preview_scores_without_dictionary() {
        let game = game("DOGXXXX", "AAAAAAA", "E");
        let score = game.preview("ann", &dog()).unwrap();
        assert_eq!(*score.total(), 10);
        assert_eq!(game.board().tile_count(), 0);
    }

    #[test]
    fn test_timeout_policies() {
        let game = game("DOGXXXX", "AAAAAAA", "E");
        let passed = game.timeout(TimeoutPolicy::Pass).unwrap();
        assert_eq!(passed.current_player(), 1);
        let ended = game.timeout(TimeoutPolicy::EndGame).unwrap();
        assert_eq!(ended.outcome(), Some(Outcome::Tie));
        assert_eq!(ended.timeout(TimeoutPolicy::Pass), Err(TurnError::GameOver));
    }

    #[test]
    fn test_reorder_rack_any_player() {
        let game = game("DOG", "CAT", "E");
        let next = game.reorder_rack("bob", tiles("TAC")).unwrap();
        assert_eq!(next.players()[1].rack().tiles(), tiles("TAC").as_slice());
        assert_eq!(game.reorder_rack("bob", tiles("TAT")), Err(TurnError::NotAPermutation));
    }
}
