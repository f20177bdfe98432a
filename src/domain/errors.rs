// Domain-level outcomes for rejected match commands.

use crate::domain::state::Team;

/// Why a shoot or restart command was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    GameOver,
    NotYourTurn,
    StonesInMotion,
    NoStonesLeft,
    MalformedShot,
    GameInProgress,
}

/// Why a team-slot registration failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationError {
    SlotTaken(Team),
    AlreadyRegistered(Team),
}

impl RegistrationError {
    // Client-facing reason carried in the registration-failed message.
    pub fn reason(&self) -> &'static str {
        match self {
            RegistrationError::SlotTaken(_) => "Slot already taken.",
            RegistrationError::AlreadyRegistered(Team::Home) => "Already registered as HOME.",
            RegistrationError::AlreadyRegistered(Team::Visitor) => {
                "Already registered as VISITOR."
            }
        }
    }
}
