// Wire protocol DTOs and conversions for the public WebSocket channel.

use crate::domain::{MatchSnapshot, Rejection, Role, ShotVector, Stone, Team};
use serde::{Deserialize, Serialize};

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    // Full authoritative match state.
    GameState(MatchSnapshotDto),
    // Requested slot was bound to this connection.
    RegistrationSuccess { role: RoleDto },
    // Requested slot could not be bound.
    RegistrationFailed { role: RoleDto, reason: String },
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    RegisterRole(RegisterRolePayload),
    Shoot(ShootPayload),
    RequestRestart,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRolePayload {
    pub role: RoleDto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleDto {
    Home,
    Visitor,
    Spectator,
}

impl From<RoleDto> for Role {
    fn from(role: RoleDto) -> Self {
        match role {
            RoleDto::Home => Role::Team(Team::Home),
            RoleDto::Visitor => Role::Team(Team::Visitor),
            RoleDto::Spectator => Role::Spectator,
        }
    }
}

impl From<Role> for RoleDto {
    fn from(role: Role) -> Self {
        match role {
            Role::Team(Team::Home) => RoleDto::Home,
            Role::Team(Team::Visitor) => RoleDto::Visitor,
            Role::Spectator => RoleDto::Spectator,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamDto {
    Home,
    Visitor,
}

impl From<Team> for TeamDto {
    fn from(team: Team) -> Self {
        match team {
            Team::Home => TeamDto::Home,
            Team::Visitor => TeamDto::Visitor,
        }
    }
}

/// Shot drag vector. Fields stay optional so missing ones are rejected, not defaulted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShootPayload {
    #[serde(default)]
    pub start_x: Option<f32>,
    #[serde(default)]
    pub start_y: Option<f32>,
    #[serde(default)]
    pub end_x: Option<f32>,
    #[serde(default)]
    pub end_y: Option<f32>,
}

impl TryFrom<ShootPayload> for ShotVector {
    type Error = Rejection;

    fn try_from(payload: ShootPayload) -> Result<Self, Self::Error> {
        ShotVector::from_parts(
            payload.start_x,
            payload.start_y,
            payload.end_x,
            payload.end_y,
        )
    }
}

/// Snapshot of the match sent to clients after every observable change.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshotDto {
    pub home_player: Option<String>,
    pub visitor_player: Option<String>,
    pub current_turn: TeamDto,
    pub stones: Vec<StoneDto>,
    pub home_score: u32,
    pub visitor_score: u32,
    pub live_home_score: u32,
    pub live_visitor_score: u32,
    pub home_stones_left: u32,
    pub visitor_stones_left: u32,
    pub game_over: bool,
}

impl From<MatchSnapshot> for MatchSnapshotDto {
    fn from(snap: MatchSnapshot) -> Self {
        Self {
            home_player: snap.home_player.map(|id| id.to_string()),
            visitor_player: snap.visitor_player.map(|id| id.to_string()),
            current_turn: snap.current_turn.into(),
            stones: snap.stones.iter().map(StoneDto::from).collect(),
            home_score: snap.final_score.home,
            visitor_score: snap.final_score.visitor,
            live_home_score: snap.live_score.home,
            live_visitor_score: snap.live_score.visitor,
            home_stones_left: snap.stones_left.home,
            visitor_stones_left: snap.stones_left.visitor,
            game_over: snap.game_over,
        }
    }
}

/// Flattened stone state for wire transmission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoneDto {
    pub id: String,
    pub team: TeamDto,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub in_motion: bool,
}

impl From<&Stone> for StoneDto {
    fn from(stone: &Stone) -> Self {
        Self {
            id: stone.id.to_string(),
            team: stone.team.into(),
            x: stone.x,
            y: stone.y,
            vx: stone.vx,
            vy: stone.vy,
            in_motion: stone.in_motion,
        }
    }
}
