//! Tests for the game service: timers, events and the single-writer rule.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use strictly_words::{
    Board, Dictionary, DictionaryError, MoveShapeError, Outcome, Phase, Placement, TimeoutPolicy, TurnError,
    apply_placements,
};
use strictly_words_server::{GameEvent, GameService, GameView, ServerConfig, SessionError};
use tokio::sync::broadcast::error::TryRecvError;

struct AcceptAll;

#[async_trait]
impl Dictionary for AcceptAll {
    fn is_ready(&self) -> bool {
        true
    }

    async fn contains(&self, _word: &str) -> Result<bool, DictionaryError> {
        Ok(true)
    }
}

struct Slow;

#[async_trait]
impl Dictionary for Slow {
    fn is_ready(&self) -> bool {
        true
    }

    async fn contains(&self, _word: &str) -> Result<bool, DictionaryError> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(true)
    }
}

struct Broken;

#[async_trait]
impl Dictionary for Broken {
    fn is_ready(&self) -> bool {
        true
    }

    async fn contains(&self, _word: &str) -> Result<bool, DictionaryError> {
        Err(DictionaryError::Unavailable("backend down".to_string()))
    }
}

fn service_with(dictionary: impl Dictionary + 'static, config: ServerConfig) -> GameService {
    GameService::new(Arc::new(dictionary), config.with_rng_seed(3))
}

fn started(service: &GameService) -> String {
    let id = service.create_game("ann", "bob").unwrap().snapshot.game_id;
    service.join(&id, "ann").unwrap();
    service.join(&id, "bob").unwrap();
    id
}

/// First two tiles of the mover's rack across the center.
fn opening_tiles(view: &GameView) -> Vec<Placement> {
    let seat = view.snapshot.current_player;
    view.snapshot.players[seat]
        .rack
        .tiles()
        .iter()
        .take(2)
        .zip([7, 8])
        .map(|(&tile, col)| {
            if tile.is_blank() {
                Placement::blank(7, col, 'E')
            } else {
                Placement::at(7, col, tile)
            }
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_game_starts_when_both_join() {
    let service = service_with(AcceptAll, ServerConfig::default());
    let id = service.create_game("ann", "bob").unwrap().snapshot.game_id;

    let view = service.join(&id, "ann").unwrap();
    assert_eq!(view.phase, Phase::WaitingForPlayers);
    assert!(!service.turn_timer_running(&id));

    let view = service.join(&id, "bob").unwrap();
    assert_eq!(view.phase, Phase::InProgress);
    assert!(service.turn_timer_running(&id));
}

#[tokio::test(start_paused = true)]
async fn test_turn_timer_passes_for_idle_player() {
    let service = service_with(AcceptAll, ServerConfig::default());
    let id = started(&service);

    tokio::time::sleep(Duration::from_secs(151)).await;
    let view = service.get_game(&id).unwrap();
    assert_eq!(view.snapshot.current_player, 1);
    assert_eq!(view.turn, 1);

    tokio::time::sleep(Duration::from_secs(150)).await;
    let view = service.get_game(&id).unwrap();
    assert_eq!(view.snapshot.current_player, 0);
    assert_eq!(view.turn, 2);
}

#[tokio::test(start_paused = true)]
async fn test_move_resets_turn_timer() {
    let service = service_with(AcceptAll, ServerConfig::default());
    let id = started(&service);

    tokio::time::sleep(Duration::from_secs(100)).await;
    service.apply_pass(&id, "ann").unwrap();

    // The first timer would have fired at 150s; bob still holds the turn.
    tokio::time::sleep(Duration::from_secs(100)).await;
    let view = service.get_game(&id).unwrap();
    assert_eq!(view.snapshot.current_player, 1);
    assert_eq!(view.turn, 1);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(service.get_game(&id).unwrap().turn, 2);
}

#[tokio::test(start_paused = true)]
async fn test_end_game_policy() {
    let config = ServerConfig::default().with_timeout_policy(TimeoutPolicy::EndGame);
    let service = service_with(AcceptAll, config);
    let id = started(&service);
    let mut events = service.subscribe(&id).unwrap();

    tokio::time::sleep(Duration::from_secs(151)).await;
    let view = service.get_game(&id).unwrap();
    assert_eq!(view.outcome, Some(Outcome::Tie));
    assert!(!service.turn_timer_running(&id));

    assert!(matches!(events.recv().await.unwrap(), GameEvent::GameUpdated { .. }));
    assert_eq!(events.recv().await.unwrap(), GameEvent::GameOver { outcome: Outcome::Tie });
}

#[tokio::test(start_paused = true)]
async fn test_game_clock_ends_game() {
    let config = ServerConfig::default().with_game_seconds(200);
    let service = service_with(AcceptAll, config);
    let id = started(&service);

    tokio::time::sleep(Duration::from_secs(201)).await;
    let view = service.get_game(&id).unwrap();
    assert!(view.phase.is_over());
    assert_eq!(view.turn, 1);
    assert!(!service.turn_timer_running(&id));
    assert_eq!(service.apply_pass(&id, "bob"), Err(SessionError::Turn(TurnError::GameOver)));
}

#[tokio::test]
async fn test_play_is_broadcast() {
    let service = service_with(AcceptAll, ServerConfig::default());
    let id = started(&service);
    let mut events = service.subscribe(&id).unwrap();

    let before = service.get_game(&id).unwrap();
    let tiles = opening_tiles(&before);
    let report = service.apply_play(&id, "ann", &tiles).await.unwrap();

    assert!(*report.score.total() > 0);
    assert_eq!(report.drawn.len(), 2);
    assert_eq!(report.view.turn, 1);
    assert_eq!(report.view.snapshot.players[0].score, *report.score.total());
    assert_eq!(report.view.last_placed.len(), 2);

    match events.recv().await.unwrap() {
        GameEvent::GameUpdated { view, score } => {
            assert_eq!(*view, report.view);
            assert_eq!(score, Some(report.score.clone()));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_rejection_is_not_broadcast() {
    let service = service_with(AcceptAll, ServerConfig::default());
    let id = started(&service);
    let mut events = service.subscribe(&id).unwrap();
    let before = service.get_game(&id).unwrap();

    let err = service.apply_pass(&id, "bob").unwrap_err();
    assert_eq!(err, SessionError::Turn(TurnError::NotYourTurn("bob".to_string())));
    assert_eq!(events.try_recv().unwrap_err(), TryRecvError::Empty);
    assert_eq!(service.get_game(&id).unwrap(), before);
}

#[tokio::test]
async fn test_unavailable_dictionary_is_retryable() {
    let service = service_with(Broken, ServerConfig::default());
    let id = started(&service);
    let before = service.get_game(&id).unwrap();

    let err = service.apply_play(&id, "ann", &opening_tiles(&before)).await.unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(err, SessionError::Turn(TurnError::ValidationUnavailable(_))));
    assert_eq!(service.get_game(&id).unwrap(), before);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_write_conflicts() {
    let service = service_with(Slow, ServerConfig::default());
    let id = started(&service);
    let tiles = opening_tiles(&service.get_game(&id).unwrap());

    let play = {
        let service = service.clone();
        let id = id.clone();
        tokio::spawn(async move { service.apply_play(&id, "ann", &tiles).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    let err = service.apply_pass(&id, "ann").unwrap_err();
    assert_eq!(err, SessionError::Conflict(id.clone()));
    assert!(err.is_retryable());

    let report = play.await.unwrap().unwrap();
    assert_eq!(report.view.turn, 1);
    assert_eq!(service.get_game(&id).unwrap().turn, 1);
}

#[tokio::test]
async fn test_preview_changes_nothing() {
    let service = service_with(AcceptAll, ServerConfig::default());
    let id = started(&service);
    let before = service.get_game(&id).unwrap();

    let score = service.preview(&id, "ann", &opening_tiles(&before)).unwrap();
    assert!(*score.total() > 0);
    assert_eq!(service.get_game(&id).unwrap(), before);
}

#[tokio::test]
async fn test_stage_and_recall_keep_turn() {
    let service = service_with(AcceptAll, ServerConfig::default());
    let id = started(&service);
    let before = service.get_game(&id).unwrap();

    let staged = service.stage(&id, "ann", &opening_tiles(&before)).unwrap();
    assert_eq!(staged.turn, 0);
    assert_eq!(staged.snapshot.players[0].rack.len(), 5);

    let recalled = service.recall(&id, "ann").unwrap();
    assert_eq!(recalled.snapshot.players[0].rack.len(), 7);
    assert_eq!(recalled.snapshot.board, before.snapshot.board);
}

#[tokio::test]
async fn test_remove_game_notifies_subscribers() {
    let service = service_with(AcceptAll, ServerConfig::default());
    let id = started(&service);
    let mut events = service.subscribe(&id).unwrap();

    service.remove_game(&id).await.unwrap();
    assert_eq!(events.recv().await.unwrap(), GameEvent::GameRemoved);
    assert!(!service.turn_timer_running(&id));
    assert!(matches!(service.get_game(&id), Err(SessionError::NotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn test_remove_waits_for_play_in_flight() {
    let service = service_with(Slow, ServerConfig::default());
    let id = started(&service);
    let tiles = opening_tiles(&service.get_game(&id).unwrap());

    let play = {
        let service = service.clone();
        let id = id.clone();
        tokio::spawn(async move { service.apply_play(&id, "ann", &tiles).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let removed = service.remove_game(&id).await.unwrap();
    assert_eq!(removed.turn, 1);
    assert_eq!(play.await.unwrap().unwrap().view, removed);
    assert!(!service.turn_timer_running(&id));
    assert!(matches!(service.get_game(&id), Err(SessionError::NotFound(_))));

    // Nothing re-armed for the removed game fires later.
    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert!(!service.turn_timer_running(&id));
    assert!(service.game_ids().is_empty());
}

#[tokio::test]
async fn test_play_from_proposed_board() {
    let service = service_with(AcceptAll, ServerConfig::default());
    let id = started(&service);
    let before = service.get_game(&id).unwrap();
    let proposed = apply_placements(
        &before.snapshot.board,
        &before.snapshot.players[0].rack,
        &opening_tiles(&before),
    )
    .unwrap()
    .board;

    let report = service.apply_play_proposed(&id, "ann", &proposed).await.unwrap();
    assert_eq!(report.view.turn, 1);
    assert_eq!(report.view.last_placed.len(), 2);
    assert!(*report.score.total() > 0);

    // Bob's proposal drops the committed tiles.
    let err = service.apply_play_proposed(&id, "bob", &Board::new()).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Turn(TurnError::Shape(MoveShapeError::CellOccupied(_)))
    ));
    assert_eq!(service.get_game(&id).unwrap(), report.view);
}

#[tokio::test]
async fn test_lagging_subscriber_gets_current_view() {
    let service = service_with(AcceptAll, ServerConfig::default().with_event_buffer(1));
    let id = started(&service);
    let mut events = service.subscribe(&id).unwrap();

    service.apply_pass(&id, "ann").unwrap();
    service.apply_pass(&id, "bob").unwrap();
    service.apply_pass(&id, "ann").unwrap();

    match service.next_event(&id, &mut events).await {
        Some(GameEvent::GameUpdated { view, score }) => {
            assert_eq!(view.turn, 3);
            assert_eq!(*view, service.get_game(&id).unwrap());
            assert_eq!(score, None);
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(events.try_recv().unwrap_err(), TryRecvError::Empty);
}
