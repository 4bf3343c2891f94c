//! Puck possession tracking.
//!
//! Every stick-on-puck contact is timed per player. A short contact is a
//! *tip* and is ignored for possession and assists. Longer contacts
//! compete for possession through a two-tier challenge window:
//!
//! 1. Holds in `[min_possession_ms, max_possession_ms)` are a fresh battle
//!    for the puck. Exactly one such hold wins; two or more mean the puck is
//!    contested and nobody has it.
//! 2. If no hold is in that window, the most recent of the older holds wins.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::PossessionConfig;
use crate::types::{Millis, PlayerId, Team};

/// Touch timing for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerTouchState {
    /// Team the player was on at the last touch.
    pub team: Team,
    /// When the current touch began.
    pub touch_started_at: Millis,
    /// When the stick last left the puck.
    pub last_exit_at: Option<Millis>,
    /// Whether the stick is on the puck right now.
    pub in_contact: bool,
}

impl PlayerTouchState {
    fn new(team: Team, now: Millis) -> Self {
        Self {
            team,
            touch_started_at: now,
            last_exit_at: None,
            in_contact: true,
        }
    }

    /// Elapsed time since the current touch began.
    #[must_use]
    pub fn current_touch_elapsed(&self, now: Millis) -> Millis {
        now.saturating_sub(self.touch_started_at)
    }

    /// Length of the current touch: up to now while in contact, up to the
    /// exit afterwards.
    #[must_use]
    pub fn touch_duration(&self, now: Millis) -> Millis {
        match self.last_exit_at {
            Some(exit) if !self.in_contact && exit >= self.touch_started_at => {
                exit - self.touch_started_at
            }
            _ => self.current_touch_elapsed(now),
        }
    }

    /// Whether the current touch is a tip.
    #[must_use]
    pub fn is_tipped(&self, now: Millis, max_tipped_ms: Millis) -> bool {
        self.touch_duration(now) < max_tipped_ms
    }
}

/// Last tip-excluded possessor of one team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TeamPossession {
    /// Player who last held the puck for longer than a tip.
    pub player: Option<PlayerId>,
    /// When that was recorded.
    pub at: Millis,
}

/// Outcome of a touch beginning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TouchBegin {
    /// The touch clock was restarted (a new touch rather than a continuation).
    pub restarted: bool,
    /// The previous toucher was on this other team.
    pub taken_from: Option<Team>,
    /// The previous toucher, when `taken_from` is set.
    pub previous_player: Option<PlayerId>,
}

/// Per-player touch timers and per-team possession.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PossessionTracker {
    config: PossessionConfig,
    touches: BTreeMap<PlayerId, PlayerTouchState>,
    last_toucher: Option<(PlayerId, Team)>,
    blue: TeamPossession,
    red: TeamPossession,
    last_team: Team,
}

impl PossessionTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new(config: PossessionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Replace the timing windows. Existing timers are kept.
    pub fn set_config(&mut self, config: PossessionConfig) {
        self.config = config;
    }

    /// Forget every timer and possession record.
    pub fn clear(&mut self) {
        let config = self.config;
        *self = Self::new(config);
    }

    /// A stick started touching the puck.
    ///
    /// A quick re-touch by the same player continues the current touch; a
    /// touch after a longer gap, or after someone else touched the puck,
    /// starts a new one.
    pub fn touch_begin(&mut self, player: PlayerId, team: Team, now: Millis) -> TouchBegin {
        let previous = self.last_toucher;
        let different_player = previous.map_or(true, |(p, _)| p != player);
        let max_tipped = self.config.max_tipped_ms;

        let mut outcome = TouchBegin::default();
        match self.touches.get_mut(&player) {
            None => {
                self.touches.insert(player, PlayerTouchState::new(team, now));
                outcome.restarted = true;
            }
            Some(state) => {
                let long_gap = state
                    .last_exit_at
                    .map_or(true, |exit| now.saturating_sub(exit) > max_tipped);
                if long_gap || different_player {
                    state.touch_started_at = now;
                    outcome.restarted = true;
                }
                state.team = team;
                state.in_contact = true;
            }
        }

        if outcome.restarted {
            if let Some((prev_player, prev_team)) = previous {
                if prev_team != team && prev_team.is_playing() && team.is_playing() {
                    outcome.taken_from = Some(prev_team);
                    outcome.previous_player = Some(prev_player);
                }
            }
        }

        self.last_toucher = Some((player, team));
        outcome
    }

    /// The stick is still on the puck. Returns `true` if this touch now
    /// counts as possession (it has outlasted a tip).
    ///
    /// A stay without a preceding begin is treated as a begin.
    pub fn touch_stay(&mut self, player: PlayerId, team: Team, now: Millis) -> bool {
        if !self.touches.get(&player).is_some_and(|s| s.in_contact) {
            self.touch_begin(player, team, now);
        }
        self.record_if_held(player, now)
    }

    /// The stick left the puck. Returns `Some(tipped)` or `None` for a
    /// player with no touch on record.
    pub fn touch_end(&mut self, player: PlayerId, now: Millis) -> Option<bool> {
        let state = self.touches.get_mut(&player)?;
        state.in_contact = false;
        state.last_exit_at = Some(now);
        let tipped = state.is_tipped(now, self.config.max_tipped_ms);
        if !tipped {
            self.record_if_held(player, now);
        }
        Some(tipped)
    }

    fn record_if_held(&mut self, player: PlayerId, now: Millis) -> bool {
        let Some(state) = self.touches.get(&player) else {
            return false;
        };
        if state.is_tipped(now, self.config.max_tipped_ms) {
            return false;
        }
        let team = state.team;
        let record = TeamPossession {
            player: Some(player),
            at: now,
        };
        match team {
            Team::Blue => self.blue = record,
            Team::Red => self.red = record,
            Team::None => return false,
        }
        self.last_team = team;
        true
    }

    /// Whether a player's current touch is a tip. `None` if the player has
    /// never touched the puck.
    #[must_use]
    pub fn is_tipped(&self, player: PlayerId, now: Millis) -> Option<bool> {
        self.touches
            .get(&player)
            .map(|s| s.is_tipped(now, self.config.max_tipped_ms))
    }

    /// Resolve who has the puck right now, if anyone.
    #[must_use]
    pub fn player_in_possession(&self, now: Millis) -> Option<PlayerId> {
        let PossessionConfig {
            max_tipped_ms,
            min_possession_ms,
            max_possession_ms,
        } = self.config;

        let mut challengers = 0usize;
        let mut challenger = None;
        let mut older: Option<(Millis, PlayerId)> = None;

        for (&player, state) in &self.touches {
            if state.is_tipped(now, max_tipped_ms) {
                continue;
            }
            let hold = state.current_touch_elapsed(now);
            if hold >= min_possession_ms && hold < max_possession_ms {
                challengers += 1;
                challenger = Some(player);
            } else if hold >= max_possession_ms && older.map_or(true, |(best, _)| hold < best) {
                older = Some((hold, player));
            }
        }

        match challengers {
            0 => older.map(|(_, player)| player),
            1 => challenger,
            _ => None,
        }
    }

    /// Timing state for one player.
    #[must_use]
    pub fn touch_state(&self, player: PlayerId) -> Option<&PlayerTouchState> {
        self.touches.get(&player)
    }

    /// Last player to touch the puck at all, tips included.
    #[must_use]
    pub fn last_toucher(&self) -> Option<(PlayerId, Team)> {
        self.last_toucher
    }

    /// Last tip-excluded possessor of `team`.
    #[must_use]
    pub fn team_possession(&self, team: Team) -> TeamPossession {
        match team {
            Team::Blue => self.blue,
            Team::Red => self.red,
            Team::None => TeamPossession::default(),
        }
    }

    /// Team that last held the puck for longer than a tip.
    #[must_use]
    pub fn last_possessing_team(&self) -> Team {
        self.last_team
    }

    /// Team of a player, as of their last touch.
    #[must_use]
    pub fn team_of(&self, player: PlayerId) -> Option<Team> {
        self.touches.get(&player).map(|s| s.team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> PossessionTracker {
        PossessionTracker::new(PossessionConfig::default())
    }

    #[test]
    fn test_tip_threshold_flips() {
        let max = PossessionConfig::default().max_tipped_ms;

        let mut t = tracker();
        t.touch_begin(1, Team::Blue, 0);
        assert_eq!(t.touch_end(1, max - 1), Some(true));
        assert_eq!(t.is_tipped(1, max + 500), Some(true));

        let mut t = tracker();
        t.touch_begin(1, Team::Blue, 0);
        assert_eq!(t.touch_end(1, max + 1), Some(false));
        assert_eq!(t.is_tipped(1, max + 500), Some(false));
    }

    #[test]
    fn test_tip_matches_elapsed_difference() {
        // currentTouchElapsed - lastExitElapsed is the touch length.
        let mut t = tracker();
        t.touch_begin(1, Team::Blue, 1_000);
        t.touch_end(1, 1_050);
        let state = t.touch_state(1).unwrap();
        let now = 5_000;
        let current = state.current_touch_elapsed(now);
        let since_exit = now - state.last_exit_at.unwrap();
        assert_eq!(current - since_exit, 50);
        assert!(state.is_tipped(now, 91));
    }

    #[test]
    fn test_unknown_player_is_not_tipped_or_tipped() {
        let t = tracker();
        assert_eq!(t.is_tipped(42, 0), None);
    }

    #[test]
    fn test_quick_retouch_continues_touch() {
        let mut t = tracker();
        t.touch_begin(1, Team::Blue, 0);
        t.touch_end(1, 200);
        let outcome = t.touch_begin(1, Team::Blue, 250);
        assert!(!outcome.restarted);
        assert_eq!(t.touch_state(1).unwrap().touch_started_at, 0);
    }

    #[test]
    fn test_retouch_after_gap_restarts() {
        let mut t = tracker();
        t.touch_begin(1, Team::Blue, 0);
        t.touch_end(1, 200);
        let outcome = t.touch_begin(1, Team::Blue, 1_000);
        assert!(outcome.restarted);
        assert_eq!(t.touch_state(1).unwrap().touch_started_at, 1_000);
    }

    #[test]
    fn test_retouch_after_other_player_restarts() {
        let mut t = tracker();
        t.touch_begin(1, Team::Blue, 0);
        t.touch_end(1, 200);
        t.touch_begin(2, Team::Blue, 210);
        t.touch_end(2, 220);
        let outcome = t.touch_begin(1, Team::Blue, 230);
        assert!(outcome.restarted);
        assert_eq!(outcome.taken_from, None);
    }

    #[test]
    fn test_takeaway_reports_previous_team() {
        let mut t = tracker();
        t.touch_begin(1, Team::Blue, 0);
        t.touch_end(1, 500);
        let outcome = t.touch_begin(7, Team::Red, 600);
        assert_eq!(outcome.taken_from, Some(Team::Blue));
        assert_eq!(outcome.previous_player, Some(1));
    }

    #[test]
    fn test_single_challenger_has_possession() {
        let mut t = tracker();
        t.touch_begin(1, Team::Blue, 0);
        assert_eq!(t.player_in_possession(400), Some(1));
    }

    #[test]
    fn test_three_challengers_are_contested() {
        let mut t = tracker();
        t.touch_begin(1, Team::Blue, 0);
        t.touch_begin(2, Team::Red, 10);
        t.touch_begin(3, Team::Blue, 20);
        assert_eq!(t.player_in_possession(400), None);
    }

    #[test]
    fn test_fresh_touch_has_no_possession_yet() {
        let mut t = tracker();
        t.touch_begin(1, Team::Blue, 0);
        assert_eq!(t.player_in_possession(150), None);
    }

    #[test]
    fn test_fallback_prefers_most_recent_long_hold() {
        let mut t = tracker();
        t.touch_begin(1, Team::Blue, 0);
        t.touch_end(1, 500);
        t.touch_begin(2, Team::Red, 600);
        t.touch_end(2, 900);
        // Both holds are past the challenge window; the newer one wins.
        assert_eq!(t.player_in_possession(5_000), Some(2));
    }

    #[test]
    fn test_tipped_touch_never_has_possession() {
        let mut t = tracker();
        t.touch_begin(1, Team::Blue, 0);
        t.touch_end(1, 30);
        assert_eq!(t.player_in_possession(400), None);
        assert_eq!(t.team_possession(Team::Blue).player, None);
    }

    #[test]
    fn test_team_possession_records_non_tip() {
        let mut t = tracker();
        t.touch_begin(1, Team::Blue, 0);
        assert!(t.touch_stay(1, Team::Blue, 200));
        assert_eq!(t.team_possession(Team::Blue).player, Some(1));
        assert_eq!(t.last_possessing_team(), Team::Blue);
    }

    #[test]
    fn test_stay_without_begin_starts_touch() {
        let mut t = tracker();
        assert!(!t.touch_stay(5, Team::Red, 100));
        assert!(t.touch_state(5).unwrap().in_contact);
    }

    #[test]
    fn test_clear_keeps_config() {
        let mut t = PossessionTracker::new(PossessionConfig {
            max_tipped_ms: 10,
            min_possession_ms: 20,
            max_possession_ms: 30,
        });
        t.touch_begin(1, Team::Blue, 0);
        t.clear();
        assert!(t.touch_state(1).is_none());
        t.touch_begin(1, Team::Blue, 0);
        assert_eq!(t.player_in_possession(25), Some(1));
    }
}
