//! Shared value types: teams, players, phases and positions.
//!
//! These are pure data with no behavior beyond small helpers.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Unique identifier for players, as assigned by the host.
pub type PlayerId = u64;

/// Timestamp in milliseconds on the host's monotonic clock.
pub type Millis = u64;

/// Team membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Team {
    /// Spectators and unassigned objects.
    #[default]
    None,
    /// Team defending the negative end of the long axis.
    Blue,
    /// Team defending the positive end of the long axis.
    Red,
}

impl Team {
    /// Both playing teams, in a fixed order for deterministic iteration.
    pub const PLAYING: [Self; 2] = [Self::Blue, Self::Red];

    /// The opposing team. `None` has no opponent.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Blue => Self::Red,
            Self::Red => Self::Blue,
            Self::None => Self::None,
        }
    }

    /// Whether this is one of the two playing teams.
    #[must_use]
    pub const fn is_playing(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Short display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Blue => "Blue",
            Self::Red => "Red",
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// On-ice position a player has taken for the current faceoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlayerRole {
    /// Takes the draw.
    #[default]
    Center,
    /// Left wing.
    LeftWing,
    /// Right wing.
    RightWing,
    /// Left defense.
    LeftDefense,
    /// Right defense.
    RightDefense,
    /// Goaltender.
    Goalie,
}

impl PlayerRole {
    /// Whether this role is the goaltender.
    #[must_use]
    pub const fn is_goalie(self) -> bool {
        matches!(self, Self::Goalie)
    }

    /// Whether this role takes faceoffs.
    #[must_use]
    pub const fn is_center(self) -> bool {
        matches!(self, Self::Center)
    }
}

/// Game phase as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Before the host has reported anything.
    #[default]
    None,
    /// Pre-game skate.
    Warmup,
    /// Players lined up, puck about to drop.
    FaceOff,
    /// Live play.
    Playing,
    /// Goal celebration for Blue.
    BlueScore,
    /// Goal celebration for Red.
    RedScore,
    /// Goal replay.
    Replay,
    /// Intermission.
    PeriodOver,
    /// Final buzzer.
    GameOver,
}

impl GamePhase {
    /// Entering one of these phases wipes all per-play officiating state.
    #[must_use]
    pub const fn resets_play_state(self) -> bool {
        matches!(
            self,
            Self::FaceOff | Self::Warmup | Self::GameOver | Self::PeriodOver
        )
    }

    /// Entering one of these phases also wipes per-game bookkeeping
    /// (violation counters, outstanding penalties).
    #[must_use]
    pub const fn resets_session_state(self) -> bool {
        matches!(self, Self::Warmup | Self::GameOver | Self::PeriodOver)
    }

    /// Whether rules are enforced during this phase.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Playing | Self::FaceOff)
    }
}

/// World-space position. `y` is height above the ice, `z` runs along the
/// long axis of the rink (Blue end negative), `x` across it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// Cross axis.
    pub x: f32,
    /// Height.
    pub y: f32,
    /// Long axis.
    pub z: f32,
}

impl Vec3 {
    /// Origin.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Whether every component is a finite number.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Hash for Vec3 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.to_bits().hash(state);
        self.y.to_bits().hash(state);
        self.z.to_bits().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_team() {
        assert_eq!(Team::Blue.other(), Team::Red);
        assert_eq!(Team::Red.other(), Team::Blue);
        assert_eq!(Team::None.other(), Team::None);
    }

    #[test]
    fn test_phase_resets() {
        assert!(GamePhase::FaceOff.resets_play_state());
        assert!(GamePhase::Warmup.resets_play_state());
        assert!(!GamePhase::Playing.resets_play_state());
        assert!(!GamePhase::FaceOff.resets_session_state());
        assert!(GamePhase::GameOver.resets_session_state());
    }

    #[test]
    fn test_vec3_finite() {
        assert!(Vec3::new(1.0, 2.0, 3.0).is_finite());
        assert!(!Vec3::new(f32::NAN, 0.0, 0.0).is_finite());
    }
}
