//! The per-game turn state machine.

mod contracts;
mod error;
pub mod invariants;
mod machine;
mod state;
mod types;

pub use contracts::{Contract, TurnContract};
pub use error::TurnError;
pub use invariants::{Invariant, InvariantSet, InvariantViolation, WordGameInvariants};
pub use machine::PreparedPlay;
pub use state::GameState;
pub use types::{Outcome, Phase, PlayOutcome, Player, TimeoutPolicy};
