//! Offside monitoring.
//!
//! A skater is flagged offside when they are in the opposing team's
//! defensive zone (or behind its goal line) while the puck is not, and they
//! are not the player carrying it. Once flagged they stay flagged, even if
//! the puck follows them in, until they leave those two zones.
//!
//! When a team carries the puck cleanly across the far blue line, any
//! opposing players still lingering in that team's end are cleared and left
//! alone until they skate out.
//!
//! Calls are reported only on edges: `CallMade` when a flag goes up,
//! `CallCleared` when it comes down.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::RuleConfig;
use crate::events::{CallKind, CallSnapshot, OfficiatingEvent, RuleEvents};
use crate::feed::PlayerSnapshot;
use crate::rink::{classify, Zone};
use crate::types::{Millis, PlayerId, Team, Vec3};

/// Offside state of one player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OffsideRecord {
    /// Team at the last update.
    pub team: Team,
    /// Zone at the last update.
    pub zone: Zone,
    /// Whether the player is currently offside.
    pub is_offside: bool,
    /// Cleared by a clean zone entry; not re-flagged until they leave.
    pub exempt: bool,
    /// Puck state when the flag went up.
    pub snapshot: Option<CallSnapshot>,
}

impl OffsideRecord {
    fn new(team: Team) -> Self {
        Self {
            team,
            zone: Zone::None,
            is_offside: false,
            exempt: false,
            snapshot: None,
        }
    }
}

/// Puck and possession context for one offside update.
#[derive(Debug, Clone, Copy)]
pub struct OffsideContext {
    /// Host clock.
    pub now: Millis,
    /// Puck position this tick.
    pub puck_position: Vec3,
    /// Puck zone this tick.
    pub puck_zone: Zone,
    /// Puck zone last tick.
    pub previous_puck_zone: Zone,
    /// Player currently in possession, if any.
    pub in_possession: Option<PlayerId>,
    /// Team of that player.
    pub possessing_team: Option<Team>,
}

/// Per-player offside flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OffsideMonitor {
    records: BTreeMap<PlayerId, OffsideRecord>,
}

impl OffsideMonitor {
    /// Create an empty monitor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one tick of offside checks.
    pub fn update(
        &mut self,
        config: &RuleConfig,
        players: &[PlayerSnapshot],
        ctx: &OffsideContext,
        events: &mut RuleEvents,
    ) {
        self.apply_clean_entry(ctx, events);

        let mut seen = Vec::with_capacity(players.len());
        for player in players {
            if !player.is_playing || !player.team.is_playing() || player.is_goalie() {
                continue;
            }
            seen.push(player.id);
            self.update_player(config, player, ctx, events);
        }

        let gone: Vec<PlayerId> = self
            .records
            .keys()
            .copied()
            .filter(|id| !seen.contains(id))
            .collect();
        for id in gone {
            if let Some(record) = self.records.remove(&id) {
                if record.is_offside {
                    tracing::debug!(player = id, "Offside player left play");
                    events.push(cleared(record.team, id));
                }
            }
        }
    }

    fn apply_clean_entry(&mut self, ctx: &OffsideContext, events: &mut RuleEvents) {
        for attacker in Team::PLAYING {
            let defender = attacker.other();
            let crossed = ctx.previous_puck_zone == Zone::center(defender)
                && ctx.puck_zone == Zone::defensive_zone(defender);
            if !crossed || ctx.possessing_team != Some(attacker) {
                continue;
            }

            tracing::debug!(team = %attacker, "Clean zone entry, clearing trailing opponents");
            for (&id, record) in &mut self.records {
                if record.team != defender || !record.zone.is_defensive_end_of(attacker) {
                    continue;
                }
                record.exempt = true;
                if record.is_offside {
                    record.is_offside = false;
                    record.snapshot = None;
                    events.push(cleared(defender, id));
                }
            }
        }
    }

    fn update_player(
        &mut self,
        config: &RuleConfig,
        player: &PlayerSnapshot,
        ctx: &OffsideContext,
        events: &mut RuleEvents,
    ) {
        let record = self
            .records
            .entry(player.id)
            .or_insert_with(|| OffsideRecord::new(player.team));

        if record.team != player.team {
            if record.is_offside {
                events.push(cleared(record.team, player.id));
            }
            *record = OffsideRecord::new(player.team);
        }

        let team = player.team;
        let opponent = team.other();
        let zone = classify(
            &config.rink.lines,
            player.position,
            record.zone,
            config.radii.player_radius,
        );
        record.zone = zone;

        let in_monitored_zone = zone.is_defensive_end_of(opponent);
        if !in_monitored_zone {
            record.exempt = false;
        }

        let flag = if !config.team_rules(team).offside || !in_monitored_zone || record.exempt {
            false
        } else if record.is_offside {
            true
        } else {
            ctx.in_possession != Some(player.id) && !ctx.puck_zone.is_defensive_end_of(opponent)
        };

        match (record.is_offside, flag) {
            (false, true) => {
                let snapshot = CallSnapshot {
                    puck_position: ctx.puck_position,
                    puck_zone: ctx.puck_zone,
                    player: Some(player.id),
                    at: ctx.now,
                };
                record.is_offside = true;
                record.snapshot = Some(snapshot);
                tracing::info!(player = player.id, team = %team, ?zone, "Offside");
                events.push(OfficiatingEvent::CallMade {
                    kind: CallKind::Offside,
                    team,
                    snapshot,
                });
            }
            (true, false) => {
                record.is_offside = false;
                record.snapshot = None;
                tracing::info!(player = player.id, team = %team, "Offside cleared");
                events.push(cleared(team, player.id));
            }
            _ => {}
        }
    }

    /// Drop every record, clearing any active flags.
    pub fn reset(&mut self, events: &mut RuleEvents) {
        for (&id, record) in &self.records {
            if record.is_offside {
                events.push(cleared(record.team, id));
            }
        }
        self.records.clear();
    }

    /// Whether a player is currently offside.
    #[must_use]
    pub fn is_offside(&self, player: PlayerId) -> bool {
        self.records.get(&player).is_some_and(|r| r.is_offside)
    }

    /// Whether any player of `team` is currently offside.
    #[must_use]
    pub fn team_offside(&self, team: Team) -> bool {
        self.records
            .values()
            .any(|r| r.team == team && r.is_offside)
    }

    /// Players of `team` currently offside, in id order.
    #[must_use]
    pub fn offside_players(&self, team: Team) -> Vec<PlayerId> {
        self.records
            .iter()
            .filter(|(_, r)| r.team == team && r.is_offside)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Snapshot of the earliest active offside flag of `team`.
    #[must_use]
    pub fn team_snapshot(&self, team: Team) -> Option<CallSnapshot> {
        self.records
            .values()
            .filter(|r| r.team == team && r.is_offside)
            .filter_map(|r| r.snapshot)
            .min_by_key(|s| s.at)
    }

    /// Last computed zone of a player.
    #[must_use]
    pub fn player_zone(&self, player: PlayerId) -> Option<Zone> {
        self.records.get(&player).map(|r| r.zone)
    }

    /// Full record of a player.
    #[must_use]
    pub fn record(&self, player: PlayerId) -> Option<&OffsideRecord> {
        self.records.get(&player)
    }
}

fn cleared(team: Team, player: PlayerId) -> OfficiatingEvent {
    OfficiatingEvent::CallCleared {
        kind: CallKind::Offside,
        team,
        player: Some(player),
    }
}
