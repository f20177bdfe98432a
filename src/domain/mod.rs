// Domain layer: core simulation types and rules.

pub mod errors;
pub mod match_state;
pub mod state;
pub mod systems;
pub mod tuning;

pub use errors::{RegistrationError, Rejection};
pub use match_state::{MatchState, TickOutcome};
pub use state::{MatchSnapshot, Role, ShotVector, Stone, StoneId, Team, TeamCounts};
