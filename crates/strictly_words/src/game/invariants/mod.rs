//! Properties every reachable game state satisfies.
//!
//! Each invariant is checked independently and composed into a set that the
//! turn contract verifies after every transition in debug builds.

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
///
/// Implemented for tuples of invariants.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

fn check<S, I: Invariant<S>>(state: &S, violations: &mut Vec<InvariantViolation>) {
    if !I::holds(state) {
        violations.push(InvariantViolation::new(I::description()));
    }
}

impl<S, I1, I2> InvariantSet<S> for (I1, I2)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();
        check::<S, I1>(state, &mut violations);
        check::<S, I2>(state, &mut violations);
        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();
        check::<S, I1>(state, &mut violations);
        check::<S, I2>(state, &mut violations);
        check::<S, I3>(state, &mut violations);
        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }
}

pub mod rack_capacity;
pub mod staged_tiles;
pub mod tile_conservation;

pub use rack_capacity::RackCapacityInvariant;
pub use staged_tiles::StagedTilesInvariant;
pub use tile_conservation::TileConservationInvariant;

/// All game-state invariants as a composable set.
pub type WordGameInvariants = (
    TileConservationInvariant,
    RackCapacityInvariant,
    StagedTilesInvariant,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameState;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_invariant_set_holds_for_new_game() {
        let game = GameState::new("ann", "bob", &mut StdRng::seed_from_u64(3));
        assert!(WordGameInvariants::check_all(&game).is_ok());
    }

    #[test]
    fn test_invariant_set_reports_every_violation() {
        let mut game = GameState::new("ann", "bob", &mut StdRng::seed_from_u64(3));
        game.bag = crate::bag::TileBag::default();
        for _ in 0..3 {
            game.players[0].rack_mut().push(crate::tile::Tile::BLANK);
        }
        let violations = WordGameInvariants::check_all(&game).unwrap_err();
        assert_eq!(violations.len(), 2);
    }
}
