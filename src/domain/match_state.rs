// Turn/match state machine: shots, ticks, end of game and reset.

use crate::domain::errors::Rejection;
use crate::domain::state::{MatchSnapshot, ShotVector, Stone, StoneId, Team, TeamCounts};
use crate::domain::systems::{physics, scoring};
use crate::domain::tuning::RinkTuning;

/// What a tick did to the observable state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    // Snapshot differs from the previous tick and should be broadcast.
    pub changed: bool,
    // This tick moved the match into game over.
    pub game_ended: bool,
}

pub struct MatchState {
    tuning: RinkTuning,

    // Slot occupancy by connection id.
    home_player: Option<u64>,
    visitor_player: Option<u64>,

    current_turn: Team,
    stones: Vec<Stone>,
    stones_left: TeamCounts,
    live_score: TeamCounts,
    final_score: TeamCounts,
    game_over: bool,

    next_stone_id: StoneId,
}

impl MatchState {
    pub fn new(tuning: RinkTuning) -> Self {
        Self {
            tuning,
            home_player: None,
            visitor_player: None,
            current_turn: Team::Home,
            stones: Vec::new(),
            stones_left: TeamCounts::splat(tuning.stones_per_team),
            live_score: TeamCounts::default(),
            final_score: TeamCounts::default(),
            game_over: false,
            next_stone_id: 1,
        }
    }

    pub fn tuning(&self) -> &RinkTuning {
        &self.tuning
    }

    pub fn current_turn(&self) -> Team {
        self.current_turn
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn stones(&self) -> &[Stone] {
        &self.stones
    }

    pub fn stones_left(&self) -> TeamCounts {
        self.stones_left
    }

    pub fn live_score(&self) -> TeamCounts {
        self.live_score
    }

    pub fn final_score(&self) -> TeamCounts {
        self.final_score
    }

    pub fn any_stone_moving(&self) -> bool {
        self.stones.iter().any(|s| s.in_motion)
    }

    pub fn occupant(&self, team: Team) -> Option<u64> {
        match team {
            Team::Home => self.home_player,
            Team::Visitor => self.visitor_player,
        }
    }

    pub fn team_of(&self, conn_id: u64) -> Option<Team> {
        if self.home_player == Some(conn_id) {
            Some(Team::Home)
        } else if self.visitor_player == Some(conn_id) {
            Some(Team::Visitor)
        } else {
            None
        }
    }

    /// Binds `conn_id` to an empty slot. Returns false when the slot is occupied.
    pub fn bind(&mut self, team: Team, conn_id: u64) -> bool {
        let slot = match team {
            Team::Home => &mut self.home_player,
            Team::Visitor => &mut self.visitor_player,
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(conn_id);
        true
    }

    /// Clears whichever slot `conn_id` holds.
    pub fn vacate(&mut self, conn_id: u64) -> Option<Team> {
        let team = self.team_of(conn_id)?;
        match team {
            Team::Home => self.home_player = None,
            Team::Visitor => self.visitor_player = None,
        }
        Some(team)
    }

    /// Places a new stone for `team` if every shot precondition holds.
    pub fn shoot(&mut self, team: Team, shot: ShotVector) -> Result<StoneId, Rejection> {
        if self.game_over {
            return Err(Rejection::GameOver);
        }
        if team != self.current_turn {
            return Err(Rejection::NotYourTurn);
        }
        if self.any_stone_moving() {
            return Err(Rejection::StonesInMotion);
        }
        if self.stones_left.get(team) == 0 {
            return Err(Rejection::NoStonesLeft);
        }

        let vx = shot.dx() * self.tuning.power_factor;
        let vy = shot.dy() * self.tuning.power_factor;
        // A non-finite launch velocity would never come to rest.
        if !vx.is_finite() || !vy.is_finite() {
            return Err(Rejection::MalformedShot);
        }

        let id = self.next_stone_id;
        self.next_stone_id += 1;
        self.stones.push(Stone {
            id,
            team,
            x: self.tuning.launch_x,
            y: self.tuning.launch_y,
            vx,
            vy,
            in_motion: true,
        });

        *self.stones_left.get_mut(team) -= 1;
        // The last team holding stones keeps the turn until the end is detected.
        if self.stones_left.get(team.other()) > 0 {
            self.current_turn = team.other();
        }

        Ok(id)
    }

    /// Advances physics and scoring one tick; no-op once the game is over.
    pub fn tick(&mut self) -> TickOutcome {
        if self.game_over {
            return TickOutcome::default();
        }

        let step = physics::step_stones(&mut self.stones, &self.tuning);
        let score = scoring::evaluate(&self.stones, self.live_score, &self.tuning);
        self.live_score = score.counts;

        let all_shot = self.stones_left == TeamCounts::default();
        let game_ended = all_shot && !step.any_moving;
        if game_ended {
            self.final_score = self.live_score;
            self.game_over = true;
        }

        TickOutcome {
            changed: step.changed || score.changed || game_ended,
            game_ended,
        }
    }

    /// Starts a fresh end. Only allowed after game over; occupancy is kept.
    pub fn reset(&mut self) -> Result<(), Rejection> {
        if !self.game_over {
            return Err(Rejection::GameInProgress);
        }

        self.current_turn = Team::Home;
        self.stones.clear();
        self.stones_left = TeamCounts::splat(self.tuning.stones_per_team);
        self.live_score = TeamCounts::default();
        self.final_score = TeamCounts::default();
        self.game_over = false;
        Ok(())
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            home_player: self.home_player,
            visitor_player: self.visitor_player,
            current_turn: self.current_turn,
            stones: self.stones.clone(),
            final_score: self.final_score,
            live_score: self.live_score,
            stones_left: self.stones_left,
            game_over: self.game_over,
        }
    }

    #[cfg(test)]
    pub(crate) fn stones_mut(&mut self) -> &mut Vec<Stone> {
        &mut self.stones
    }
}
