use crate::use_cases::MatchHandle;

#[derive(Clone)]
pub struct AppState {
    // Channels into and out of the single match task.
    pub game: MatchHandle,
}
