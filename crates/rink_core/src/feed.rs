//! Inbound simulation feed.
//!
//! The host samples its scene once per simulation tick and on every
//! stick/puck collision callback, and hands the engine plain values. No host
//! types cross this boundary.

use serde::{Deserialize, Serialize};

use crate::events::{PenaltyHandle, RestartHandle};
use crate::types::{GamePhase, Millis, PlayerId, PlayerRole, Team, Vec3};

/// One player as seen in a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Host identifier.
    pub id: PlayerId,
    /// Team.
    pub team: Team,
    /// Faceoff position / goalie flag.
    pub role: PlayerRole,
    /// Body position.
    pub position: Vec3,
    /// False for spectators and players waiting to spawn.
    pub is_playing: bool,
}

impl PlayerSnapshot {
    /// A playing skater or goalie.
    #[must_use]
    pub const fn new(id: PlayerId, team: Team, role: PlayerRole, position: Vec3) -> Self {
        Self {
            id,
            team,
            role,
            position,
            is_playing: true,
        }
    }

    /// Whether this player is the goalie.
    #[must_use]
    pub const fn is_goalie(&self) -> bool {
        self.role.is_goalie()
    }
}

/// Per-tick telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Host clock.
    pub now: Millis,
    /// Puck position.
    pub puck_position: Vec3,
    /// Puck height above the ice surface.
    pub puck_height: f32,
    /// Every player in the session, playing or not.
    pub players: Vec<PlayerSnapshot>,
}

impl TickInput {
    /// Tick with the puck at `puck_position`, height taken from its `y`.
    #[must_use]
    pub fn new(now: Millis, puck_position: Vec3, players: Vec<PlayerSnapshot>) -> Self {
        Self {
            now,
            puck_position,
            puck_height: puck_position.y,
            players,
        }
    }
}

/// A stick/puck collision callback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StickContact {
    /// Stick owner.
    pub player: PlayerId,
    /// Their team.
    pub team: Team,
    /// Their faceoff position / goalie flag.
    pub role: PlayerRole,
    /// Puck height above the ice at contact.
    pub puck_height: f32,
    /// Height of the stick holder's body above the ice.
    pub stick_holder_body_height: f32,
}

impl StickContact {
    /// Whether the stick belongs to a goalie.
    #[must_use]
    pub const fn is_goalie(&self) -> bool {
        self.role.is_goalie()
    }
}

/// Phase of a stick/puck collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactPhase {
    /// Collision began.
    Enter,
    /// Collision continues.
    Stay,
    /// Collision ended.
    Exit,
}

/// Anything the host can tell the engine, for recording and replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeedEvent {
    /// Simulation tick.
    Tick(TickInput),
    /// Stick/puck collision callback.
    Contact {
        /// Host clock.
        now: Millis,
        /// Enter / stay / exit.
        phase: ContactPhase,
        /// Collision data.
        contact: StickContact,
    },
    /// Goal trigger fired.
    GoalScored {
        /// Host clock.
        now: Millis,
        /// Team credited by the goal trigger.
        team: Team,
    },
    /// Game phase changed.
    PhaseChanged {
        /// Host clock.
        now: Millis,
        /// Previous phase.
        old: GamePhase,
        /// New phase.
        new: GamePhase,
    },
    /// Host timer for a freeze penalty fired.
    PenaltyElapsed(PenaltyHandle),
    /// Host finished performing a requested faceoff restart.
    RestartCompleted(RestartHandle),
}

impl FeedEvent {
    /// Host clock of the event, for events that carry one.
    #[must_use]
    pub const fn timestamp(&self) -> Option<Millis> {
        match self {
            Self::Tick(input) => Some(input.now),
            Self::Contact { now, .. }
            | Self::GoalScored { now, .. }
            | Self::PhaseChanged { now, .. } => Some(*now),
            Self::PenaltyElapsed(_) | Self::RestartCompleted(_) => None,
        }
    }
}
