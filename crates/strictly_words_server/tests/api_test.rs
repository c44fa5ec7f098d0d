//! HTTP adapter tests, run in-process against the router.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use strictly_words::WordList;
use strictly_words_server::{GameService, ServerConfig, router};
use tower::ServiceExt;

fn app() -> Router {
    app_with(WordList::from_words(["DOG", "CAT", "QI"]))
}

fn app_with(words: WordList) -> Router {
    let service = GameService::new(Arc::new(words), ServerConfig::default().with_rng_seed(9));
    router(service)
}

/// Every two-letter word, so any opening pair is accepted.
fn two_letter_words() -> WordList {
    let letters = || 'A'..='Z';
    WordList::from_words(letters().flat_map(|a| letters().map(move |b| format!("{a}{b}"))))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn started_game(app: &Router) -> (String, Value) {
    let (status, body) = send(app, "POST", "/games", Some(json!({"playerA": "ann", "playerB": "bob"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["gameId"].as_str().unwrap().to_string();
    send(app, "POST", &format!("/games/{id}/join"), Some(json!({"playerId": "ann"}))).await;
    let (status, view) = send(app, "POST", &format!("/games/{id}/join"), Some(json!({"playerId": "bob"}))).await;
    assert_eq!(status, StatusCode::OK);
    (id, view)
}

/// First two tiles of ann's rack across the center, as request JSON.
fn opening_tiles(view: &Value) -> Value {
    let rack = view["players"][0]["rack"].as_array().unwrap();
    let tiles: Vec<Value> = rack
        .iter()
        .take(2)
        .zip([7, 8])
        .map(|(tile, col)| {
            if tile == "_" {
                json!({"row": 7, "col": col, "tile": "_", "letter": "E"})
            } else {
                json!({"row": 7, "col": col, "tile": tile})
            }
        })
        .collect();
    Value::Array(tiles)
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["dictionaryReady"], true);
}

#[tokio::test]
async fn test_word_lookup() {
    let app = app();
    let (status, body) = send(&app, "GET", "/words/dog", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isValid"], true);

    let (_, body) = send(&app, "GET", "/words/a", None).await;
    assert_eq!(body["isValid"], false);
}

#[tokio::test]
async fn test_create_and_get_game() {
    let app = app();
    let (status, body) = send(&app, "POST", "/games", Some(json!({"playerA": "ann", "playerB": "bob"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["gameId"].as_str().unwrap();
    assert_eq!(id.len(), 9);

    let (status, view) = send(&app, "GET", &format!("/games/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["gameId"], id);
    assert_eq!(view["phase"]["phase"], "waitingForPlayers");
    assert_eq!(view["players"][0]["rack"].as_array().unwrap().len(), 7);
    assert_eq!(view["bag"].as_array().unwrap().len(), 86);
}

#[tokio::test]
async fn test_duplicate_players_bad_request() {
    let app = app();
    let (status, body) = send(&app, "POST", "/games", Some(json!({"playerA": "ann", "playerB": "ann"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "duplicate_players");
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn test_unknown_game_not_found() {
    let app = app();
    let (status, body) = send(&app, "GET", "/games/nosuchgam", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_wrong_player_conflict() {
    let app = app();
    let (id, _) = started_game(&app).await;
    let (status, body) = send(&app, "POST", &format!("/games/{id}/pass"), Some(json!({"playerId": "bob"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "not_your_turn");
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn test_invalid_word_rejected_with_word() {
    let app = app();
    let (id, view) = started_game(&app).await;
    let tiles = opening_tiles(&view);

    let uri = format!("/games/{id}/play");
    let request = json!({"playerId": "ann", "tiles": tiles});
    let (status, body) = send(&app, "POST", &uri, Some(request.clone())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "invalid_word");
    assert_eq!(body["word"].as_str().unwrap().len(), 2);

    // Same request, same answer, nothing changed.
    let (again, body_again) = send(&app, "POST", &uri, Some(request)).await;
    assert_eq!(again, status);
    assert_eq!(body_again, body);
    let (_, after) = send(&app, "GET", &format!("/games/{id}"), None).await;
    assert_eq!(after, view);
}

#[tokio::test]
async fn test_opening_off_center_rejected() {
    let app = app();
    let (id, view) = started_game(&app).await;
    let rack = view["players"][0]["rack"].as_array().unwrap();
    let tiles: Vec<Value> = rack
        .iter()
        .take(2)
        .zip([0, 1])
        .map(|(tile, col)| match tile.as_str() {
            Some("_") => json!({"row": 5, "col": col, "tile": "_", "letter": "E"}),
            _ => json!({"row": 5, "col": col, "tile": tile}),
        })
        .collect();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/games/{id}/play"),
        Some(json!({"playerId": "ann", "tiles": tiles})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "must_start_at_center");
}

#[tokio::test]
async fn test_out_of_bounds_is_structural() {
    let app = app();
    let (id, view) = started_game(&app).await;
    let tile = view["players"][0]["rack"][0].clone();
    let placement = if tile == "_" {
        json!({"row": 20, "col": 7, "tile": "_", "letter": "E"})
    } else {
        json!({"row": 20, "col": 7, "tile": tile})
    };

    let (status, body) = send(
        &app,
        "POST",
        &format!("/games/{id}/play"),
        Some(json!({"playerId": "ann", "tiles": [placement]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "out_of_bounds");
}

#[tokio::test]
async fn test_play_needs_tiles_or_board() {
    let app = app();
    let (id, _) = started_game(&app).await;
    let (status, body) = send(&app, "POST", &format!("/games/{id}/play"), Some(json!({"playerId": "ann"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn test_preview_and_exchange() {
    let app = app();
    let (id, view) = started_game(&app).await;

    let (status, score) = send(
        &app,
        "POST",
        &format!("/games/{id}/preview"),
        Some(json!({"playerId": "ann", "tiles": opening_tiles(&view)})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(score["total"].as_u64().unwrap() > 0);

    let tile = view["players"][0]["rack"][0].clone();
    let (status, after) = send(
        &app,
        "POST",
        &format!("/games/{id}/exchange"),
        Some(json!({"playerId": "ann", "tile": tile})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["currentPlayer"], 1);
    assert_eq!(after["turn"], 1);
    assert_eq!(after["players"][0]["rack"].as_array().unwrap().len(), 7);
    assert_eq!(after["bag"].as_array().unwrap().len(), 86);
}

#[tokio::test]
async fn test_reorder_must_be_permutation() {
    let app = app();
    let (id, view) = started_game(&app).await;
    let mut order = view["players"][1]["rack"].as_array().unwrap().clone();
    order.reverse();

    let uri = format!("/games/{id}/rack");
    let (status, after) = send(&app, "POST", &uri, Some(json!({"playerId": "bob", "order": order}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["players"][1]["rack"], Value::Array(order.clone()));

    order.pop();
    let (status, body) = send(&app, "POST", &uri, Some(json!({"playerId": "bob", "order": order}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "not_a_permutation");
}

#[tokio::test]
async fn test_remove_game() {
    let app = app();
    let (id, _) = started_game(&app).await;
    let (status, _) = send(&app, "DELETE", &format!("/games/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/games/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_play_proposed_board() {
    let app = app_with(two_letter_words());
    let (id, view) = started_game(&app).await;

    let mut board = view["board"].clone();
    for placement in opening_tiles(&view).as_array().unwrap() {
        let cell = &mut board[7][placement["col"].as_u64().unwrap() as usize];
        if placement["tile"] == "_" {
            cell["tile"] = placement["letter"].clone();
            cell["blank"] = json!(true);
        } else {
            cell["tile"] = placement["tile"].clone();
        }
    }

    let uri = format!("/games/{id}/play");
    let (status, report) = send(&app, "POST", &uri, Some(json!({"playerId": "ann", "board": board}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["view"]["turn"], 1);
    assert_eq!(report["view"]["board"][7][7]["original"], true);
    assert!(report["score"]["total"].as_u64().unwrap() > 0);

    // Rewriting one of ann's committed tiles is malformed.
    let mut tampered = report["view"]["board"].clone();
    let replacement = if tampered[7][7]["tile"] == "Z" { "Y" } else { "Z" };
    tampered[7][7]["tile"] = json!(replacement);
    let (status, body) = send(&app, "POST", &uri, Some(json!({"playerId": "bob", "board": tampered}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "cell_occupied");

    let (_, after) = send(&app, "GET", &format!("/games/{id}"), None).await;
    assert_eq!(after, report["view"]);
}
