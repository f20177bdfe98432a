// Domain-level simulation entities and snapshot types.

use crate::domain::errors::Rejection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Team {
    Home,
    Visitor,
}

impl Team {
    pub fn other(self) -> Team {
        match self {
            Team::Home => Team::Visitor,
            Team::Visitor => Team::Home,
        }
    }
}

/// Role a connection asks for. Spectators never occupy a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Team(Team),
    Spectator,
}

pub type StoneId = u64;

/// A simulated disc on the rink.
#[derive(Debug, Clone, PartialEq)]
pub struct Stone {
    pub id: StoneId,
    pub team: Team,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub in_motion: bool,
}

impl Stone {
    pub fn speed(&self) -> f32 {
        self.vx.hypot(self.vy)
    }
}

/// Drag vector supplied by a client, already reversed by the client UI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotVector {
    pub start_x: f32,
    pub start_y: f32,
    pub end_x: f32,
    pub end_y: f32,
}

impl ShotVector {
    /// Builds a vector only when all four components and the drag deltas are finite.
    pub fn from_parts(
        start_x: Option<f32>,
        start_y: Option<f32>,
        end_x: Option<f32>,
        end_y: Option<f32>,
    ) -> Result<Self, Rejection> {
        let (Some(start_x), Some(start_y), Some(end_x), Some(end_y)) =
            (start_x, start_y, end_x, end_y)
        else {
            return Err(Rejection::MalformedShot);
        };

        if ![start_x, start_y, end_x, end_y]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(Rejection::MalformedShot);
        }

        let shot = Self {
            start_x,
            start_y,
            end_x,
            end_y,
        };
        // Finite endpoints far apart can still overflow the subtraction.
        if !shot.dx().is_finite() || !shot.dy().is_finite() {
            return Err(Rejection::MalformedShot);
        }
        Ok(shot)
    }

    pub fn dx(&self) -> f32 {
        self.end_x - self.start_x
    }

    pub fn dy(&self) -> f32 {
        self.end_y - self.start_y
    }
}

/// Per-team integer pair used for live and final scores and stone counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamCounts {
    pub home: u32,
    pub visitor: u32,
}

impl TeamCounts {
    pub fn splat(value: u32) -> Self {
        Self {
            home: value,
            visitor: value,
        }
    }

    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::Home => self.home,
            Team::Visitor => self.visitor,
        }
    }

    pub fn get_mut(&mut self, team: Team) -> &mut u32 {
        match team {
            Team::Home => &mut self.home,
            Team::Visitor => &mut self.visitor,
        }
    }
}

/// Full observable match state, cloned out of the match actor for broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSnapshot {
    pub home_player: Option<u64>,
    pub visitor_player: Option<u64>,
    pub current_turn: Team,
    pub stones: Vec<Stone>,
    pub final_score: TeamCounts,
    pub live_score: TeamCounts,
    pub stones_left: TeamCounts,
    pub game_over: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_a_component_is_missing_or_not_finite_then_shot_is_malformed() {
        assert_eq!(
            ShotVector::from_parts(Some(0.0), Some(0.0), None, Some(1.0)),
            Err(Rejection::MalformedShot)
        );
        assert_eq!(
            ShotVector::from_parts(Some(0.0), Some(f32::NAN), Some(1.0), Some(1.0)),
            Err(Rejection::MalformedShot)
        );
    }

    #[test]
    fn when_endpoints_are_finite_but_drag_overflows_then_shot_is_malformed() {
        let result = ShotVector::from_parts(Some(-3e38), Some(0.0), Some(3e38), Some(0.0));

        assert_eq!(result, Err(Rejection::MalformedShot));
    }

    #[test]
    fn when_drag_is_ordinary_then_deltas_are_end_minus_start() {
        let shot = ShotVector::from_parts(Some(10.0), Some(20.0), Some(13.0), Some(16.0))
            .expect("finite shot");

        assert_eq!((shot.dx(), shot.dy()), (3.0, -4.0));
    }
}
