//! Strictly Words server - authoritative host for `strictly_words` games
//!
//! Holds one turn state machine per game, lets a single writer change a
//! game at a time, runs the turn timer and game clock, and pushes every
//! committed state to both players.
//!
//! # Architecture
//!
//! - **Session store**: games keyed by id, each behind its own write gate
//! - **Service**: turn operations, timers and event publication
//! - **API**: axum REST routes plus a WebSocket event stream
//! - **CLI**: `serve` and `check-word`

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod api;
mod cli;
mod config;
mod dictionary;
mod events;
mod service;
mod session;
mod timer;

// Crate-level exports - Configuration
pub use cli::{Cli, Command, resolve_config};
pub use config::{ConfigError, ServerConfig};

// Crate-level exports - Dictionary
pub use dictionary::{TimedDictionary, load_word_list};

// Crate-level exports - Games
pub use events::{EventHub, GameEvent, GameView};
pub use service::{GameService, PlayReport};
pub use session::{GAME_ID_LEN, GameId, SessionError, SessionStore, WriteGuard, new_game_id};
pub use timer::{TimerKind, Timers};

// Crate-level exports - HTTP
pub use api::{
    ApiError, CreateGameRequest, CreateGameResponse, ErrorBody, ExchangeRequest, PlayerRequest, ReorderRequest,
    TilesRequest, WordCheckResponse, router,
};
