//! Per-player game statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::PlayerId;

/// Counters for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Goals scored.
    pub goals: u32,
    /// Assists credited.
    pub assists: u32,
    /// Possessions won from the other team.
    pub takeaways: u32,
    /// Possessions lost to the other team.
    pub turnovers: u32,
    /// Shots stopped (goalies).
    pub saves: u32,
    /// Goals allowed (goalies).
    pub goals_against: u32,
    /// Shots on goal, goals included.
    pub shots: u32,
}

impl PlayerStats {
    /// `saves / (saves + goals_against)`, or `None` before the first shot
    /// faced.
    #[must_use]
    pub fn save_percentage(&self) -> Option<f32> {
        let faced = self.saves + self.goals_against;
        if faced == 0 {
            return None;
        }
        Some(self.saves as f32 / faced as f32)
    }

    /// Goals plus assists.
    #[must_use]
    pub const fn points(&self) -> u32 {
        self.goals + self.assists
    }
}

/// Statistics for everyone seen this game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatsTracker {
    players: BTreeMap<PlayerId, PlayerStats>,
}

impl StatsTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, player: PlayerId) -> &mut PlayerStats {
        self.players.entry(player).or_default()
    }

    /// Credit a goal, its assists, and charge the conceding goalie.
    pub fn record_goal(
        &mut self,
        scorer: Option<PlayerId>,
        assists: &[PlayerId],
        conceding_goalie: Option<PlayerId>,
    ) {
        if let Some(scorer) = scorer {
            let stats = self.entry(scorer);
            stats.goals += 1;
            stats.shots += 1;
        }
        for &player in assists {
            self.entry(player).assists += 1;
        }
        match conceding_goalie {
            Some(goalie) => self.entry(goalie).goals_against += 1,
            None => tracing::debug!("No goalie on record, goal against not charged"),
        }
    }

    /// A goalie stopped a shot, optionally attributed to `shooter`.
    pub fn record_save(&mut self, goalie: PlayerId, shooter: Option<PlayerId>) {
        self.entry(goalie).saves += 1;
        if let Some(shooter) = shooter {
            self.entry(shooter).shots += 1;
        }
    }

    /// `taker` won the puck from `victim`.
    pub fn record_takeaway(&mut self, taker: PlayerId, victim: Option<PlayerId>) {
        self.entry(taker).takeaways += 1;
        if let Some(victim) = victim {
            self.entry(victim).turnovers += 1;
        }
    }

    /// Counters for one player. Unknown players read as all zero.
    #[must_use]
    pub fn get(&self, player: PlayerId) -> PlayerStats {
        self.players.get(&player).copied().unwrap_or_default()
    }

    /// Every player with at least one recorded event, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &PlayerStats)> {
        self.players.iter().map(|(&id, stats)| (id, stats))
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.players.clear();
    }
}
