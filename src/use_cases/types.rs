// Use-case level inputs for the match loop.

use crate::domain::{RegistrationError, Role, ShotVector};
use tokio::sync::oneshot;

pub type RegistrationReply = oneshot::Sender<Result<Role, RegistrationError>>;

#[derive(Debug)]
pub enum GameEvent {
    RegisterRole {
        conn_id: u64,
        role: Role,
        reply: RegistrationReply,
    },
    Shoot {
        conn_id: u64,
        shot: ShotVector,
    },
    RequestRestart {
        conn_id: u64,
    },
    Disconnect {
        conn_id: u64,
    },
}
