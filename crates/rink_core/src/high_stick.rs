//! High-stick monitoring.
//!
//! A skater playing the puck above the crossbar (measured from their own
//! body height) puts their team under a high-stick call. The call is
//! enforced when the puck next lands on the ice, or voided if the opposing
//! team plays the puck first.

use serde::{Deserialize, Serialize};

use crate::config::RuleConfig;
use crate::events::{CallKind, CallSnapshot, OfficiatingEvent, RuleEvents};
use crate::feed::StickContact;
use crate::rink::Zone;
use crate::types::{Millis, Team, Vec3};

/// High-stick state of one team.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HighStickState {
    /// A high stick is pending enforcement.
    pub active: bool,
    /// Puck state at the offending touch.
    pub snapshot: Option<CallSnapshot>,
}

/// A pending high stick was enforced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighStickEnforced {
    /// Offending team.
    pub team: Team,
    /// Puck state at the offending touch.
    pub snapshot: CallSnapshot,
}

/// Per-team high-stick flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HighStickMonitor {
    blue: HighStickState,
    red: HighStickState,
}

impl HighStickMonitor {
    /// Create a monitor with no pending calls.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self, team: Team) -> Option<&HighStickState> {
        match team {
            Team::Blue => Some(&self.blue),
            Team::Red => Some(&self.red),
            Team::None => None,
        }
    }

    fn state_mut(&mut self, team: Team) -> Option<&mut HighStickState> {
        match team {
            Team::Blue => Some(&mut self.blue),
            Team::Red => Some(&mut self.red),
            Team::None => None,
        }
    }

    /// A stick touched the puck.
    pub fn on_stick_touch(
        &mut self,
        config: &RuleConfig,
        contact: &StickContact,
        now: Millis,
        puck_position: Vec3,
        puck_zone: Zone,
        events: &mut RuleEvents,
    ) {
        let team = contact.team;
        if !team.is_playing() {
            return;
        }

        let opponent = team.other();
        if let Some(other) = self.state_mut(opponent) {
            if other.active {
                *other = HighStickState::default();
                tracing::info!(team = %opponent, "High stick voided by opposing touch");
                events.push(cleared(opponent));
            }
        }

        if contact.is_goalie() || !config.team_rules(team).high_stick {
            return;
        }

        let threshold = config.heights.crossbar_height + contact.stick_holder_body_height;
        if contact.puck_height <= threshold {
            return;
        }

        let Some(state) = self.state_mut(team) else {
            return;
        };
        if state.active {
            return;
        }

        let snapshot = CallSnapshot {
            puck_position,
            puck_zone,
            player: Some(contact.player),
            at: now,
        };
        state.active = true;
        state.snapshot = Some(snapshot);
        tracing::info!(
            team = %team,
            player = contact.player,
            puck_height = contact.puck_height,
            threshold,
            "High stick"
        );
        events.push(OfficiatingEvent::CallMade {
            kind: CallKind::HighStick,
            team,
            snapshot,
        });
    }

    /// Per-tick grounding check. Returns the enforced call, if the puck
    /// landed while a team was under one.
    pub fn on_tick(
        &mut self,
        config: &RuleConfig,
        puck_height: f32,
        events: &mut RuleEvents,
    ) -> Option<HighStickEnforced> {
        if puck_height > config.heights.puck_grounded_height {
            return None;
        }

        for team in Team::PLAYING {
            let Some(state) = self.state_mut(team) else {
                continue;
            };
            if !state.active {
                continue;
            }
            let snapshot = state.snapshot;
            *state = HighStickState::default();
            events.push(cleared(team));
            if let Some(snapshot) = snapshot {
                tracing::info!(team = %team, "High stick enforced, puck grounded");
                return Some(HighStickEnforced { team, snapshot });
            }
        }
        None
    }

    /// Drop both teams' flags, clearing any pending calls.
    pub fn reset(&mut self, events: &mut RuleEvents) {
        for team in Team::PLAYING {
            if self.is_active(team) {
                events.push(cleared(team));
            }
        }
        self.blue = HighStickState::default();
        self.red = HighStickState::default();
    }

    /// Whether a high stick is pending against `team`.
    #[must_use]
    pub fn is_active(&self, team: Team) -> bool {
        self.state(team).is_some_and(|s| s.active)
    }

    /// Snapshot of the pending call against `team`.
    #[must_use]
    pub fn snapshot(&self, team: Team) -> Option<CallSnapshot> {
        self.state(team).and_then(|s| s.snapshot)
    }
}

fn cleared(team: Team) -> OfficiatingEvent {
    OfficiatingEvent::CallCleared {
        kind: CallKind::HighStick,
        team,
        player: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlayerRole;

    fn contact(team: Team, role: PlayerRole, puck_height: f32) -> StickContact {
        StickContact {
            player: 3,
            team,
            role,
            puck_height,
            stick_holder_body_height: 0.0,
        }
    }

    fn touch(monitor: &mut HighStickMonitor, c: StickContact, events: &mut RuleEvents) {
        monitor.on_stick_touch(
            &RuleConfig::default(),
            &c,
            1_000,
            Vec3::new(1.0, c.puck_height, 20.0),
            Zone::RedZone,
            events,
        );
    }

    #[test]
    fn test_high_touch_activates() {
        let mut monitor = HighStickMonitor::new();
        let mut events = RuleEvents::new();
        touch(&mut monitor, contact(Team::Blue, PlayerRole::Center, 2.5), &mut events);

        assert!(monitor.is_active(Team::Blue));
        assert_eq!(events.count_made(CallKind::HighStick, Team::Blue), 1);
        assert_eq!(monitor.snapshot(Team::Blue).unwrap().player, Some(3));
    }

    #[test]
    fn test_threshold_includes_body_height() {
        let mut monitor = HighStickMonitor::new();
        let mut events = RuleEvents::new();
        let mut c = contact(Team::Blue, PlayerRole::Center, 2.5);
        c.stick_holder_body_height = 1.0;
        touch(&mut monitor, c, &mut events);
        assert!(!monitor.is_active(Team::Blue));
    }

    #[test]
    fn test_low_touch_and_goalie_ignored() {
        let mut monitor = HighStickMonitor::new();
        let mut events = RuleEvents::new();
        touch(&mut monitor, contact(Team::Blue, PlayerRole::Center, 1.0), &mut events);
        touch(&mut monitor, contact(Team::Blue, PlayerRole::Goalie, 3.0), &mut events);
        assert!(!monitor.is_active(Team::Blue));
        assert!(events.is_empty());
    }

    #[test]
    fn test_grounding_enforces_once() {
        let config = RuleConfig::default();
        let mut monitor = HighStickMonitor::new();
        let mut events = RuleEvents::new();
        touch(&mut monitor, contact(Team::Red, PlayerRole::LeftWing, 2.5), &mut events);

        assert!(monitor.on_tick(&config, 1.0, &mut events).is_none());
        let enforced = monitor.on_tick(&config, 0.05, &mut events).unwrap();
        assert_eq!(enforced.team, Team::Red);
        assert!(monitor.on_tick(&config, 0.05, &mut events).is_none());
        assert_eq!(events.count_cleared(CallKind::HighStick, Team::Red), 1);
    }

    #[test]
    fn test_opposing_touch_voids() {
        let config = RuleConfig::default();
        let mut monitor = HighStickMonitor::new();
        let mut events = RuleEvents::new();
        touch(&mut monitor, contact(Team::Red, PlayerRole::LeftWing, 2.5), &mut events);
        touch(&mut monitor, contact(Team::Blue, PlayerRole::Goalie, 0.5), &mut events);

        assert!(!monitor.is_active(Team::Red));
        assert_eq!(events.count_cleared(CallKind::HighStick, Team::Red), 1);
        assert!(monitor.on_tick(&config, 0.0, &mut events).is_none());
    }

    #[test]
    fn test_disabled_team() {
        let mut config = RuleConfig::default();
        config.red.high_stick = false;
        let mut monitor = HighStickMonitor::new();
        let mut events = RuleEvents::new();
        monitor.on_stick_touch(
            &config,
            &contact(Team::Red, PlayerRole::Center, 3.0),
            0,
            Vec3::ZERO,
            Zone::RedCenter,
            &mut events,
        );
        assert!(!monitor.is_active(Team::Red));
    }
}
