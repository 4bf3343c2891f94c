//! Icing monitoring.
//!
//! Icing becomes *possible* for a team when one of its players releases the
//! puck from that team's half of the ice. It becomes *active* (a call) if the
//! puck then reaches the area behind the opposing goal line without anyone
//! else touching it.
//!
//! An active call is resolved by the next touch:
//! - an opposing skater touching the puck confirms it, and play restarts in
//!   the offending team's end;
//! - the opposing goalie playing it, or the offending team reaching it
//!   first, waves it off.

use serde::{Deserialize, Serialize};

use crate::config::RuleConfig;
use crate::events::{CallKind, CallSnapshot, OfficiatingEvent, RuleEvents};
use crate::rink::Zone;
use crate::types::{Millis, Team, Vec3};

/// Icing state of one team.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IcingState {
    /// The puck left this team's half untouched by the opponent.
    pub possible: bool,
    /// The puck reached behind the opposing goal line while possible.
    pub active: bool,
    /// Puck state when the call became active.
    pub snapshot: Option<CallSnapshot>,
}

/// A touch confirmed an active icing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IcingConfirmed {
    /// Team the icing is against.
    pub team: Team,
    /// Puck state when the call became active.
    pub snapshot: CallSnapshot,
}

/// Per-team icing flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IcingMonitor {
    blue: IcingState,
    red: IcingState,
}

impl IcingMonitor {
    /// Create a monitor with nothing possible or active.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self, team: Team) -> Option<&IcingState> {
        match team {
            Team::Blue => Some(&self.blue),
            Team::Red => Some(&self.red),
            Team::None => None,
        }
    }

    fn state_mut(&mut self, team: Team) -> Option<&mut IcingState> {
        match team {
            Team::Blue => Some(&mut self.blue),
            Team::Red => Some(&mut self.red),
            Team::None => None,
        }
    }

    /// A stick of `team` released the puck while it was in `puck_zone`.
    pub fn on_stick_exit(&mut self, config: &RuleConfig, team: Team, puck_zone: Zone) {
        let enabled = config.team_rules(team).icing;
        let Some(state) = self.state_mut(team) else {
            return;
        };
        if state.active {
            return;
        }
        state.possible = enabled && puck_zone.is_half_of(team);
        if state.possible {
            tracing::debug!(team = %team, ?puck_zone, "Icing possible");
        }
    }

    /// Per-tick check for the puck reaching behind a goal line.
    pub fn on_tick(
        &mut self,
        now: Millis,
        puck_position: Vec3,
        puck_zone: Zone,
        events: &mut RuleEvents,
    ) {
        for team in Team::PLAYING {
            let Some(state) = self.state_mut(team) else {
                continue;
            };
            if !state.possible || state.active {
                continue;
            }
            if puck_zone != Zone::behind_goal_line(team.other()) {
                continue;
            }

            let snapshot = CallSnapshot {
                puck_position,
                puck_zone,
                player: None,
                at: now,
            };
            state.active = true;
            state.snapshot = Some(snapshot);
            tracing::info!(team = %team, "Icing called");
            events.push(OfficiatingEvent::CallMade {
                kind: CallKind::Icing,
                team,
                snapshot,
            });
        }
    }

    /// A stick or body of `team` touched the puck.
    ///
    /// Returns the confirmed call when this touch enforces an icing.
    pub fn on_touch(
        &mut self,
        team: Team,
        is_goalie: bool,
        events: &mut RuleEvents,
    ) -> Option<IcingConfirmed> {
        if !team.is_playing() {
            return None;
        }

        if let Some(own) = self.state_mut(team) {
            let was_active = own.active;
            *own = IcingState::default();
            if was_active {
                tracing::info!(team = %team, "Icing waved off, offending team reached the puck");
                events.push(cleared(team));
            }
        }

        let offender = team.other();
        let state = self.state_mut(offender)?;
        if !state.active {
            state.possible = false;
            return None;
        }

        let snapshot = state.snapshot;
        *state = IcingState::default();
        events.push(cleared(offender));

        if is_goalie {
            tracing::info!(team = %offender, "Icing waved off by goalie");
            return None;
        }

        tracing::info!(team = %offender, "Icing confirmed");
        snapshot.map(|snapshot| IcingConfirmed {
            team: offender,
            snapshot,
        })
    }

    /// Wipe both teams, clearing any active calls.
    pub fn reset(&mut self, events: &mut RuleEvents) {
        for team in Team::PLAYING {
            if self.is_active(team) {
                events.push(cleared(team));
            }
        }
        self.blue = IcingState::default();
        self.red = IcingState::default();
    }

    /// Whether icing is possible against `team`.
    #[must_use]
    pub fn is_possible(&self, team: Team) -> bool {
        self.state(team).is_some_and(|s| s.possible)
    }

    /// Whether icing is active against `team`.
    #[must_use]
    pub fn is_active(&self, team: Team) -> bool {
        self.state(team).is_some_and(|s| s.active)
    }

    /// Snapshot of the active call against `team`.
    #[must_use]
    pub fn snapshot(&self, team: Team) -> Option<CallSnapshot> {
        self.state(team).and_then(|s| s.snapshot)
    }

    /// Full state of `team`.
    #[must_use]
    pub fn team_state(&self, team: Team) -> IcingState {
        self.state(team).copied().unwrap_or_default()
    }
}

fn cleared(team: Team) -> OfficiatingEvent {
    OfficiatingEvent::CallCleared {
        kind: CallKind::Icing,
        team,
        player: None,
    }
}
