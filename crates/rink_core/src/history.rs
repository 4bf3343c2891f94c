//! Assist-eligible touch history.
//!
//! The host keeps its own record of which players touched the puck since
//! the last change of possession. The engine reaches it only through the
//! [`CollisionBuffer`] trait: it reports touches, breaks a team's chain on
//! a takeaway, and reads the chain back when a goal is scored.
//!
//! [`TouchHistory`] is the in-crate implementation used when the host does
//! not supply one.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::types::{PlayerId, Team};

/// Host-side record of assist-eligible puck touches.
///
/// The engine clones the buffer alongside its own state before each update
/// so both roll back together.
pub trait CollisionBuffer: Clone {
    /// A non-tipped touch by `player` of `team`.
    fn record_touch(&mut self, player: PlayerId, team: Team);

    /// Forget every touch by `team`'s players. Called on a takeaway.
    fn clear_team(&mut self, team: Team);

    /// Forget everything.
    fn clear(&mut self);

    /// Distinct touchers of `team`, most recent first.
    fn recent_touchers(&self, team: Team) -> Vec<PlayerId>;
}

/// Number of distinct touchers remembered per team.
pub const HISTORY_DEPTH: usize = 8;

/// Default [`CollisionBuffer`]: a short most-recent-first list per team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TouchHistory {
    blue: VecDeque<PlayerId>,
    red: VecDeque<PlayerId>,
}

impl TouchHistory {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn chain(&self, team: Team) -> Option<&VecDeque<PlayerId>> {
        match team {
            Team::Blue => Some(&self.blue),
            Team::Red => Some(&self.red),
            Team::None => None,
        }
    }

    fn chain_mut(&mut self, team: Team) -> Option<&mut VecDeque<PlayerId>> {
        match team {
            Team::Blue => Some(&mut self.blue),
            Team::Red => Some(&mut self.red),
            Team::None => None,
        }
    }
}

impl CollisionBuffer for TouchHistory {
    fn record_touch(&mut self, player: PlayerId, team: Team) {
        let Some(chain) = self.chain_mut(team) else {
            return;
        };
        if chain.front() == Some(&player) {
            return;
        }
        chain.retain(|&p| p != player);
        chain.push_front(player);
        chain.truncate(HISTORY_DEPTH);
    }

    fn clear_team(&mut self, team: Team) {
        if let Some(chain) = self.chain_mut(team) {
            chain.clear();
        }
    }

    fn clear(&mut self) {
        self.blue.clear();
        self.red.clear();
    }

    fn recent_touchers(&self, team: Team) -> Vec<PlayerId> {
        self.chain(team)
            .map(|chain| chain.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_recent_first_and_distinct() {
        let mut history = TouchHistory::new();
        history.record_touch(1, Team::Blue);
        history.record_touch(2, Team::Blue);
        history.record_touch(1, Team::Blue);
        history.record_touch(3, Team::Blue);

        assert_eq!(history.recent_touchers(Team::Blue), vec![3, 1, 2]);
        assert!(history.recent_touchers(Team::Red).is_empty());
    }

    #[test]
    fn test_clear_team_only_touches_that_team() {
        let mut history = TouchHistory::new();
        history.record_touch(1, Team::Blue);
        history.record_touch(9, Team::Red);
        history.clear_team(Team::Blue);

        assert!(history.recent_touchers(Team::Blue).is_empty());
        assert_eq!(history.recent_touchers(Team::Red), vec![9]);
    }

    #[test]
    fn test_depth_is_capped() {
        let mut history = TouchHistory::new();
        for player in 0..20 {
            history.record_touch(player, Team::Red);
        }
        let chain = history.recent_touchers(Team::Red);
        assert_eq!(chain.len(), HISTORY_DEPTH);
        assert_eq!(chain[0], 19);
    }

    #[test]
    fn test_team_none_is_ignored() {
        let mut history = TouchHistory::new();
        history.record_touch(1, Team::None);
        assert!(history.recent_touchers(Team::None).is_empty());
    }
}
