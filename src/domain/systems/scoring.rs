use crate::domain::state::{Stone, Team, TeamCounts};
use crate::domain::tuning::RinkTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreUpdate {
    pub counts: TeamCounts,
    // Counts differ from the previously stored live score.
    pub changed: bool,
}

pub fn in_house(stone: &Stone, tuning: &RinkTuning) -> bool {
    (stone.x - tuning.house_x).hypot(stone.y - tuning.house_y) <= tuning.house_radius
}

/// Counts each team's stones in the house, moving or not.
pub fn live_score(stones: &[Stone], tuning: &RinkTuning) -> TeamCounts {
    let mut counts = TeamCounts::default();
    for s in stones.iter().filter(|s| in_house(s, tuning)) {
        match s.team {
            Team::Home => counts.home += 1,
            Team::Visitor => counts.visitor += 1,
        }
    }
    counts
}

pub fn evaluate(stones: &[Stone], previous: TeamCounts, tuning: &RinkTuning) -> ScoreUpdate {
    let counts = live_score(stones, tuning);
    ScoreUpdate {
        counts,
        changed: counts != previous,
    }
}
