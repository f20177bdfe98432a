// Connection-to-role bookkeeping in front of the match state machine.

use crate::domain::{
    MatchSnapshot, MatchState, RegistrationError, Rejection, Role, ShotVector, StoneId,
    TickOutcome,
};
use crate::domain::tuning::RinkTuning;
use tracing::{info, trace};

/// Owns the single match and attributes every command to the issuing connection.
pub struct Session {
    state: MatchState,
}

impl Session {
    pub fn new(tuning: RinkTuning) -> Self {
        Self {
            state: MatchState::new(tuning),
        }
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn register(&mut self, conn_id: u64, role: Role) -> Result<Role, RegistrationError> {
        let team = match role {
            Role::Spectator => {
                info!(conn_id, "registered as spectator");
                return Ok(role);
            }
            Role::Team(team) => team,
        };

        // Asking again for the slot already held falls through to `SlotTaken`.
        match self.state.team_of(conn_id) {
            Some(held) if held != team => return Err(RegistrationError::AlreadyRegistered(held)),
            _ => {}
        }

        if !self.state.bind(team, conn_id) {
            return Err(RegistrationError::SlotTaken(team));
        }
        info!(conn_id, ?team, "registered team slot");
        Ok(role)
    }

    /// Returns true when the connection held a slot that is now vacant.
    pub fn disconnect(&mut self, conn_id: u64) -> bool {
        match self.state.vacate(conn_id) {
            Some(team) => {
                info!(conn_id, ?team, "team slot cleared");
                true
            }
            None => false,
        }
    }

    pub fn shoot(&mut self, conn_id: u64, shot: ShotVector) -> Result<StoneId, Rejection> {
        let Some(team) = self.state.team_of(conn_id) else {
            return Err(if self.state.is_game_over() {
                Rejection::GameOver
            } else {
                Rejection::NotYourTurn
            });
        };

        let stone_id = self.state.shoot(team, shot)?;
        info!(
            conn_id,
            ?team,
            stone_id,
            dx = shot.dx(),
            dy = shot.dy(),
            "shot accepted"
        );
        Ok(stone_id)
    }

    pub fn request_restart(&mut self, conn_id: u64) -> Result<(), Rejection> {
        self.state.reset()?;
        info!(conn_id, "match reset");
        Ok(())
    }

    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.state.tick();
        if outcome.game_ended {
            let score = self.state.final_score();
            info!(home = score.home, visitor = score.visitor, "game over");
        }
        outcome
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        let snapshot = self.state.snapshot();
        trace!(stones = snapshot.stones.len(), "snapshot taken");
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Team;

    fn shot() -> ShotVector {
        ShotVector {
            start_x: 0.0,
            start_y: 0.0,
            end_x: 0.0,
            end_y: -20.0,
        }
    }

    #[test]
    fn when_two_connections_request_home_then_second_gets_slot_taken() {
        let mut session = Session::new(RinkTuning::default());

        let first = session.register(1, Role::Team(Team::Home));
        let second = session.register(2, Role::Team(Team::Home));

        assert_eq!(first, Ok(Role::Team(Team::Home)));
        assert_eq!(second, Err(RegistrationError::SlotTaken(Team::Home)));
        assert_eq!(
            second.map_err(|e| e.reason()),
            Err("Slot already taken.")
        );
        assert_eq!(session.state().occupant(Team::Home), Some(1));
    }

    #[test]
    fn when_spectator_registers_then_no_slot_is_taken() {
        let mut session = Session::new(RinkTuning::default());
        session
            .register(1, Role::Team(Team::Home))
            .expect("home slot free");

        assert_eq!(session.register(1, Role::Spectator), Ok(Role::Spectator));
        assert_eq!(session.register(2, Role::Spectator), Ok(Role::Spectator));
        assert_eq!(session.state().occupant(Team::Visitor), None);
        assert_eq!(session.state().occupant(Team::Home), Some(1));
    }

    #[test]
    fn when_slot_holder_requests_their_own_slot_again_then_slot_is_taken() {
        let mut session = Session::new(RinkTuning::default());
        session
            .register(1, Role::Team(Team::Home))
            .expect("home slot free");

        let again = session.register(1, Role::Team(Team::Home));

        assert_eq!(again, Err(RegistrationError::SlotTaken(Team::Home)));
        assert_eq!(again.map_err(|e| e.reason()), Err("Slot already taken."));
        assert_eq!(session.state().occupant(Team::Home), Some(1));
    }

    #[test]
    fn when_home_player_requests_visitor_then_registration_fails() {
        let mut session = Session::new(RinkTuning::default());
        session
            .register(1, Role::Team(Team::Home))
            .expect("home slot free");

        let result = session.register(1, Role::Team(Team::Visitor));

        assert_eq!(result, Err(RegistrationError::AlreadyRegistered(Team::Home)));
        assert_eq!(session.state().occupant(Team::Visitor), None);
    }

    #[test]
    fn when_slot_holder_disconnects_then_slot_can_be_taken_again() {
        let mut session = Session::new(RinkTuning::default());
        session
            .register(1, Role::Team(Team::Visitor))
            .expect("visitor slot free");

        assert!(session.disconnect(1));
        assert!(!session.disconnect(3));
        assert_eq!(
            session.register(2, Role::Team(Team::Visitor)),
            Ok(Role::Team(Team::Visitor))
        );
    }

    #[test]
    fn when_unbound_or_off_turn_connection_shoots_then_state_is_unchanged() {
        let mut session = Session::new(RinkTuning::default());
        session
            .register(1, Role::Team(Team::Home))
            .expect("home slot free");
        session
            .register(2, Role::Team(Team::Visitor))
            .expect("visitor slot free");
        let before = session.snapshot();

        assert_eq!(session.shoot(3, shot()), Err(Rejection::NotYourTurn));
        assert_eq!(session.shoot(2, shot()), Err(Rejection::NotYourTurn));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn when_bound_player_shoots_on_turn_then_shot_is_attributed_to_their_team() {
        let mut session = Session::new(RinkTuning::default());
        session
            .register(1, Role::Team(Team::Home))
            .expect("home slot free");

        session.shoot(1, shot()).expect("shot accepted");

        let snap = session.snapshot();
        assert_eq!(snap.stones.len(), 1);
        assert_eq!(snap.stones[0].team, Team::Home);
        assert_eq!(snap.stones_left.home, 3);
        assert_eq!(snap.current_turn, Team::Visitor);
    }

    #[test]
    fn when_restart_requested_while_playing_then_it_is_rejected() {
        let mut session = Session::new(RinkTuning::default());

        assert_eq!(session.request_restart(1), Err(Rejection::GameInProgress));
    }

    #[test]
    fn when_all_stones_are_played_then_any_connection_can_restart() {
        let mut session = Session::new(RinkTuning::default());
        session
            .register(1, Role::Team(Team::Home))
            .expect("home slot free");
        session
            .register(2, Role::Team(Team::Visitor))
            .expect("visitor slot free");

        for _ in 0..8 {
            let shooter = match session.state().current_turn() {
                Team::Home => 1,
                Team::Visitor => 2,
            };
            session.shoot(shooter, shot()).expect("shot accepted");
            for _ in 0..10_000 {
                session.tick();
                if !session.state().any_stone_moving() {
                    break;
                }
            }
        }
        session.tick();
        assert!(session.state().is_game_over());

        session.request_restart(3).expect("restart allowed");

        let snap = session.snapshot();
        assert!(!snap.game_over);
        assert!(snap.stones.is_empty());
        assert_eq!(snap.stones_left, crate::domain::TeamCounts::splat(4));
        assert_eq!(snap.home_player, Some(1));
        assert_eq!(snap.visitor_player, Some(2));
    }
}
