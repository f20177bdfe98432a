// Use cases layer: application workflows for the curling server.

pub mod game;
pub mod match_handle;
pub mod session;
pub mod types;

pub use match_handle::{MatchHandle, MatchSettings};
pub use types::{GameEvent, RegistrationReply};
