//! Officiating events emitted by the engine.
//!
//! Every engine entry point returns a [`RuleEvents`] batch in emission
//! order. The host forwards them to its scoreboard, chat, audio and
//! network layers; the engine never calls out itself.

use serde::{Deserialize, Serialize};

use crate::rink::{FaceoffSpot, Zone};
use crate::types::{Millis, PlayerId, Team, Vec3};

/// Kind of officiating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CallKind {
    /// Attacker in the offensive zone ahead of the puck.
    Offside,
    /// Puck shot from a team's own half past the far goal line.
    Icing,
    /// Puck played above the crossbar.
    HighStick,
    /// Center touched the puck before it reached the ice on a faceoff.
    FaceoffViolation,
}

impl CallKind {
    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Offside => "offside",
            Self::Icing => "icing",
            Self::HighStick => "high stick",
            Self::FaceoffViolation => "faceoff violation",
        }
    }
}

/// Where the puck was when a call became active.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CallSnapshot {
    /// Puck position at the instant of the call.
    pub puck_position: Vec3,
    /// Puck zone at the instant of the call.
    pub puck_zone: Zone,
    /// Player the call is about, when it is about one player.
    pub player: Option<PlayerId>,
    /// When the call was made.
    pub at: Millis,
}

/// Token for a requested faceoff restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RestartHandle(pub u64);

/// Token for a freeze penalty. Completing a stale handle does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PenaltyHandle {
    /// Penalized player.
    pub player: PlayerId,
    /// Generation the penalty was issued in.
    pub generation: u64,
}

/// A single officiating fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OfficiatingEvent {
    /// A call became active against `team`.
    CallMade {
        /// Call kind.
        kind: CallKind,
        /// Offending team.
        team: Team,
        /// Puck state when the call was made.
        snapshot: CallSnapshot,
    },
    /// An active call against `team` ended, whether waved off or enforced.
    CallCleared {
        /// Call kind.
        kind: CallKind,
        /// Offending team.
        team: Team,
        /// Player the call was about, for per-player calls.
        player: Option<PlayerId>,
    },
    /// Play must stop and resume with a faceoff at `spot`.
    FaceoffRestart {
        /// Where to drop the puck.
        spot: FaceoffSpot,
        /// Why play stopped.
        kind: CallKind,
        /// Offending team.
        team: Team,
        /// Pass back to [`complete_restart`](crate::engine::RuleEngine::complete_restart).
        handle: RestartHandle,
    },
    /// A center's faceoff violation was counted.
    ViolationCounted {
        /// Offending center.
        player: PlayerId,
        /// Their team.
        team: Team,
        /// Violations within the decay window, this one included.
        count: u32,
        /// Count that triggers a penalty.
        threshold: u32,
    },
    /// Freeze a player: push them back along their defensive axis and
    /// disable their movement.
    PlayerPenalty {
        /// Pass back to [`complete_penalty`](crate::engine::RuleEngine::complete_penalty).
        handle: PenaltyHandle,
        /// Team of the penalized player.
        team: Team,
        /// Distance to move the player toward their own end.
        backward_distance: f32,
        /// Freeze duration.
        freeze_seconds: f32,
    },
    /// A goal stands.
    GoalAwarded {
        /// Scoring team.
        team: Team,
        /// Credited scorer, if any player of that team touched the puck.
        scorer: Option<PlayerId>,
        /// Up to two credited assists.
        assists: Vec<PlayerId>,
    },
    /// A goal was waved off because of an active call.
    GoalDisallowed {
        /// Team whose goal was waved off.
        team: Team,
        /// The call that voided it.
        kind: CallKind,
    },
}

/// Ordered batch of events from one engine call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleEvents {
    /// Events in emission order.
    pub events: Vec<OfficiatingEvent>,
}

impl RuleEvents {
    /// Empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&mut self, event: OfficiatingEvent) {
        self.events.push(event);
    }

    /// Append every event of another batch.
    pub fn extend(&mut self, other: Self) {
        self.events.extend(other.events);
    }

    /// Whether nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Iterate in emission order.
    pub fn iter(&self) -> impl Iterator<Item = &OfficiatingEvent> {
        self.events.iter()
    }

    /// Number of `CallMade` events of `kind` against `team`.
    #[must_use]
    pub fn count_made(&self, kind: CallKind, team: Team) -> usize {
        self.iter()
            .filter(|e| matches!(e, OfficiatingEvent::CallMade { kind: k, team: t, .. } if *k == kind && *t == team))
            .count()
    }

    /// Number of `CallCleared` events of `kind` against `team`.
    #[must_use]
    pub fn count_cleared(&self, kind: CallKind, team: Team) -> usize {
        self.iter()
            .filter(|e| matches!(e, OfficiatingEvent::CallCleared { kind: k, team: t, .. } if *k == kind && *t == team))
            .count()
    }

    /// Faceoff restarts requested in this batch.
    pub fn restarts(&self) -> impl Iterator<Item = (FaceoffSpot, CallKind, Team)> + '_ {
        self.iter().filter_map(|e| match e {
            OfficiatingEvent::FaceoffRestart {
                spot, kind, team, ..
            } => Some((*spot, *kind, *team)),
            _ => None,
        })
    }

    /// Penalties issued in this batch.
    pub fn penalties(&self) -> impl Iterator<Item = PenaltyHandle> + '_ {
        self.iter().filter_map(|e| match e {
            OfficiatingEvent::PlayerPenalty { handle, .. } => Some(*handle),
            _ => None,
        })
    }
}

impl IntoIterator for RuleEvents {
    type Item = OfficiatingEvent;
    type IntoIter = std::vec::IntoIter<OfficiatingEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_kind_and_team() {
        let mut events = RuleEvents::new();
        events.push(OfficiatingEvent::CallMade {
            kind: CallKind::Icing,
            team: Team::Blue,
            snapshot: CallSnapshot::default(),
        });
        events.push(OfficiatingEvent::CallCleared {
            kind: CallKind::Icing,
            team: Team::Blue,
            player: None,
        });
        events.push(OfficiatingEvent::CallMade {
            kind: CallKind::Offside,
            team: Team::Red,
            snapshot: CallSnapshot::default(),
        });

        assert_eq!(events.count_made(CallKind::Icing, Team::Blue), 1);
        assert_eq!(events.count_cleared(CallKind::Icing, Team::Blue), 1);
        assert_eq!(events.count_made(CallKind::Icing, Team::Red), 0);
        assert_eq!(events.count_made(CallKind::Offside, Team::Red), 1);
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn test_restart_and_penalty_filters() {
        let mut events = RuleEvents::new();
        events.push(OfficiatingEvent::FaceoffRestart {
            spot: FaceoffSpot::Center,
            kind: CallKind::FaceoffViolation,
            team: Team::Red,
            handle: RestartHandle(1),
        });
        events.push(OfficiatingEvent::PlayerPenalty {
            handle: PenaltyHandle {
                player: 4,
                generation: 1,
            },
            team: Team::Red,
            backward_distance: 3.0,
            freeze_seconds: 3.0,
        });

        assert_eq!(
            events.restarts().collect::<Vec<_>>(),
            vec![(FaceoffSpot::Center, CallKind::FaceoffViolation, Team::Red)]
        );
        assert_eq!(events.penalties().next().map(|h| h.player), Some(4));
    }
}
