//! The rule engine.
//!
//! [`RuleEngine`] owns every piece of officiating state for one game session
//! and is driven by the host from two call sites: once per simulation tick
//! ([`RuleEngine::on_tick`]) and once per stick/puck collision callback
//! ([`RuleEngine::on_stick_contact`]). Goal triggers and phase changes come
//! in through their own entry points. Every entry point returns the
//! [`RuleEvents`] it produced; the engine never calls out.
//!
//! ## Tick order
//!
//! 1. Classify the puck zone (with hysteresis against last tick's zone)
//! 2. Advance the faceoff drop state machine
//! 3. Resolve possession, then update offside flags
//! 4. Icing activation
//! 5. High-stick grounding
//!
//! While a restart the engine requested is pending, the puck is dead: only
//! possession timing runs and goals are refused.
//!
//! A tick that leaves the engine in an impossible state is rolled back and
//! reported as [`EngineError::InvariantViolation`].

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::config::RuleConfig;
use crate::error::{EngineError, Result};
use crate::events::{
    CallKind, CallSnapshot, OfficiatingEvent, PenaltyHandle, RestartHandle, RuleEvents,
};
use crate::faceoff::{select_spot, FaceoffStage, FaceoffTracker, ViolationOutcome};
use crate::feed::{ContactPhase, FeedEvent, PlayerSnapshot, StickContact, TickInput};
use crate::high_stick::HighStickMonitor;
use crate::history::{CollisionBuffer, TouchHistory};
use crate::icing::IcingMonitor;
use crate::offside::{OffsideContext, OffsideMonitor};
use crate::possession::PossessionTracker;
use crate::rink::{classify, FaceoffSpot, Zone};
use crate::stats::{PlayerStats, StatsTracker};
use crate::types::{GamePhase, Millis, PlayerId, Team, Vec3};

/// Outcome of a goal trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalRuling {
    /// Whether the goal stands.
    pub allowed: bool,
    /// Events produced while ruling on it.
    pub events: RuleEvents,
}

/// A requested restart the host has not completed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingRestart {
    /// Handle given to the host.
    pub handle: RestartHandle,
    /// Where the puck will be dropped.
    pub spot: FaceoffSpot,
    /// Why play stopped.
    pub kind: CallKind,
}

/// Everything the engine mutates, apart from the collision buffer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RuleState {
    phase: GamePhase,
    now: Millis,
    ticks: u64,
    puck_position: Vec3,
    puck_height: f32,
    puck_zone: Zone,
    previous_puck_zone: Zone,
    players: BTreeMap<PlayerId, PlayerSnapshot>,
    possession: PossessionTracker,
    offside: OffsideMonitor,
    icing: IcingMonitor,
    high_stick: HighStickMonitor,
    faceoff: FaceoffTracker,
    stats: StatsTracker,
    next_faceoff_spot: FaceoffSpot,
    restart_pending: Option<PendingRestart>,
    next_restart_id: u64,
    penalties: BTreeMap<PlayerId, u64>,
    penalty_generation: u64,
}

impl RuleState {
    fn new(config: &RuleConfig) -> Self {
        Self {
            possession: PossessionTracker::new(config.possession),
            faceoff: FaceoffTracker::new(config.faceoff),
            ..Self::default()
        }
    }

    fn snapshot(&self, player: Option<PlayerId>) -> CallSnapshot {
        CallSnapshot {
            puck_position: self.puck_position,
            puck_zone: self.puck_zone,
            player,
            at: self.now,
        }
    }

    fn check_invariants(&self) -> Result<()> {
        for team in Team::PLAYING {
            if self.icing.is_active(team) && self.icing.snapshot(team).is_none() {
                return Err(EngineError::InvariantViolation(format!(
                    "icing active against {team} without a snapshot"
                )));
            }
            if self.high_stick.is_active(team) && self.high_stick.snapshot(team).is_none() {
                return Err(EngineError::InvariantViolation(format!(
                    "high stick active against {team} without a snapshot"
                )));
            }
            for player in self.offside.offside_players(team) {
                let Some(record) = self.offside.record(player) else {
                    continue;
                };
                if record.exempt || !record.zone.is_defensive_end_of(team.other()) {
                    return Err(EngineError::InvariantViolation(format!(
                        "player {player} flagged offside in {:?} (exempt: {})",
                        record.zone, record.exempt
                    )));
                }
            }
        }

        if let Some(pending) = self.restart_pending {
            if pending.handle.0 > self.next_restart_id {
                return Err(EngineError::InvariantViolation(format!(
                    "restart handle {} was never issued",
                    pending.handle.0
                )));
            }
        }

        #[cfg(feature = "debug-validation")]
        if let Some(player) = self.possession.player_in_possession(self.now) {
            if self.possession.team_of(player).is_none() {
                return Err(EngineError::InvariantViolation(format!(
                    "possession resolved to player {player} with no touch record"
                )));
            }
        }

        Ok(())
    }
}

/// Officiating state machine for one game session.
///
/// `B` is the host's assist-eligible touch history; [`TouchHistory`] is used
/// when the host does not supply its own.
#[derive(Debug, Clone)]
pub struct RuleEngine<B: CollisionBuffer = TouchHistory> {
    config: RuleConfig,
    state: RuleState,
    buffer: B,
}

impl RuleEngine<TouchHistory> {
    /// Create an engine with the in-crate touch history.
    #[must_use]
    pub fn new(config: RuleConfig) -> Self {
        Self::with_buffer(config, TouchHistory::new())
    }
}

impl Default for RuleEngine<TouchHistory> {
    fn default() -> Self {
        Self::new(RuleConfig::default())
    }
}

impl<B: CollisionBuffer> RuleEngine<B> {
    /// Create an engine reporting touches to a host-supplied buffer.
    pub fn with_buffer(config: RuleConfig, buffer: B) -> Self {
        Self {
            state: RuleState::new(&config),
            config,
            buffer,
        }
    }

    /// Replace the configuration. Rejected configs leave the engine as it
    /// was.
    pub fn set_config(&mut self, config: RuleConfig) -> Result<()> {
        config.validate()?;
        self.state.possession.set_config(config.possession);
        self.state.faceoff.set_config(config.faceoff);
        self.config = config;
        tracing::info!("Rule config replaced");
        Ok(())
    }

    /// Run `f` against the state, rolling back state and buffer if it breaks
    /// an invariant.
    fn guarded(&mut self, f: impl FnOnce(&mut Self, &mut RuleEvents)) -> Result<RuleEvents> {
        let checkpoint = (self.state.clone(), self.buffer.clone());
        let mut events = RuleEvents::new();
        f(self, &mut events);

        if let Err(err) = self.state.check_invariants() {
            tracing::error!(%err, now = self.state.now, "Aborting update");
            (self.state, self.buffer) = checkpoint;
            return Err(err);
        }
        Ok(events)
    }

    // ------------------------------------------------------------------
    // Inbound feed
    // ------------------------------------------------------------------

    /// Process one simulation tick.
    pub fn on_tick(&mut self, input: &TickInput) -> Result<RuleEvents> {
        if !input.puck_position.is_finite() || !input.puck_height.is_finite() {
            tracing::warn!(now = input.now, "Ignoring tick with non-finite puck state");
            return Ok(RuleEvents::new());
        }
        if input.now < self.state.now {
            tracing::warn!(now = input.now, last = self.state.now, "Tick clock went backwards");
        }

        self.guarded(|engine, events| engine.tick_inner(input, events))
    }

    fn tick_inner(&mut self, input: &TickInput, events: &mut RuleEvents) {
        let config = self.config;
        let state = &mut self.state;

        state.now = input.now;
        state.ticks += 1;
        state.puck_position = input.puck_position;
        state.puck_height = input.puck_height;
        state.players = input.players.iter().map(|p| (p.id, *p)).collect();

        state.previous_puck_zone = state.puck_zone;
        state.puck_zone = classify(
            &config.rink.lines,
            input.puck_position,
            state.puck_zone,
            config.radii.puck_radius,
        );

        state.faceoff.on_puck_height(
            input.puck_height,
            config.heights.faceoff_drop_threshold,
            config.heights.puck_grounded_height,
        );

        if state.phase != GamePhase::Playing || state.restart_pending.is_some() {
            return;
        }

        let in_possession = state.possession.player_in_possession(input.now);
        let ctx = OffsideContext {
            now: input.now,
            puck_position: input.puck_position,
            puck_zone: state.puck_zone,
            previous_puck_zone: state.previous_puck_zone,
            in_possession,
            possessing_team: in_possession.and_then(|p| state.possession.team_of(p)),
        };
        state.offside.update(&config, &input.players, &ctx, events);

        state
            .icing
            .on_tick(input.now, input.puck_position, state.puck_zone, events);

        if let Some(enforced) = state.high_stick.on_tick(&config, input.puck_height, events) {
            let spot = select_spot(enforced.team, false, &enforced.snapshot);
            self.request_restart(spot, CallKind::HighStick, enforced.team, events);
        }
    }

    /// Process a stick/puck collision callback.
    pub fn on_stick_contact(
        &mut self,
        now: Millis,
        phase: ContactPhase,
        contact: &StickContact,
    ) -> Result<RuleEvents> {
        if !contact.team.is_playing() {
            tracing::debug!(player = contact.player, "Ignoring contact from player without a team");
            return Ok(RuleEvents::new());
        }
        if !contact.puck_height.is_finite() || !contact.stick_holder_body_height.is_finite() {
            tracing::warn!(player = contact.player, "Ignoring contact with non-finite heights");
            return Ok(RuleEvents::new());
        }
        if !self.state.phase.is_live() {
            return Ok(RuleEvents::new());
        }

        self.guarded(|engine, events| match phase {
            ContactPhase::Enter => engine.contact_enter(now, contact, events),
            ContactPhase::Stay => engine.contact_stay(now, contact, events),
            ContactPhase::Exit => engine.contact_exit(now, contact),
        })
    }

    /// Shorthand for [`on_stick_contact`](Self::on_stick_contact) with
    /// [`ContactPhase::Enter`].
    pub fn on_stick_enter(&mut self, now: Millis, contact: &StickContact) -> Result<RuleEvents> {
        self.on_stick_contact(now, ContactPhase::Enter, contact)
    }

    /// Shorthand for [`ContactPhase::Stay`].
    pub fn on_stick_stay(&mut self, now: Millis, contact: &StickContact) -> Result<RuleEvents> {
        self.on_stick_contact(now, ContactPhase::Stay, contact)
    }

    /// Shorthand for [`ContactPhase::Exit`].
    pub fn on_stick_exit(&mut self, now: Millis, contact: &StickContact) -> Result<RuleEvents> {
        self.on_stick_contact(now, ContactPhase::Exit, contact)
    }

    fn contact_enter(&mut self, now: Millis, contact: &StickContact, events: &mut RuleEvents) {
        let team = contact.team;

        if self.state.faceoff.stage().is_monitoring() {
            let outcome = self
                .state
                .faceoff
                .on_stick_touch(contact.player, contact.role, now);
            if outcome != ViolationOutcome::Ignored {
                self.faceoff_violation(contact, outcome, events);
                return;
            }
        }

        let officiating =
            self.state.phase == GamePhase::Playing && self.state.restart_pending.is_none();
        if officiating {
            self.check_save(contact);
        }

        let begin = self.state.possession.touch_begin(contact.player, team, now);
        if let Some(loser) = begin.taken_from {
            tracing::debug!(player = contact.player, team = %team, from = %loser, "Takeaway");
            self.buffer.clear_team(loser);
            self.state
                .stats
                .record_takeaway(contact.player, begin.previous_player);
        }

        if !officiating {
            return;
        }

        let config = self.config;
        if let Some(confirmed) = self
            .state
            .icing
            .on_touch(team, contact.is_goalie(), events)
        {
            let spot = select_spot(confirmed.team, true, &confirmed.snapshot);
            self.request_restart(spot, CallKind::Icing, confirmed.team, events);
        }

        let (puck_position, puck_zone) = (self.state.puck_position, self.state.puck_zone);
        self.state.high_stick.on_stick_touch(
            &config,
            contact,
            now,
            puck_position,
            puck_zone,
            events,
        );

        if self.state.offside.team_offside(team) && puck_zone.is_defensive_end_of(team.other()) {
            if let Some(snapshot) = self.state.offside.team_snapshot(team) {
                tracing::info!(team = %team, player = contact.player, "Offside enforced");
                let spot = select_spot(team, false, &snapshot);
                self.request_restart(spot, CallKind::Offside, team, events);
            }
        }
    }

    fn contact_stay(&mut self, now: Millis, contact: &StickContact, events: &mut RuleEvents) {
        let in_contact = self
            .state
            .possession
            .touch_state(contact.player)
            .is_some_and(|s| s.in_contact);
        if !in_contact {
            tracing::debug!(player = contact.player, "Stay without an open touch, treating as enter");
            self.contact_enter(now, contact, events);
            return;
        }

        if self
            .state
            .possession
            .touch_stay(contact.player, contact.team, now)
        {
            self.buffer.record_touch(contact.player, contact.team);
        }
    }

    fn contact_exit(&mut self, now: Millis, contact: &StickContact) {
        match self.state.possession.touch_end(contact.player, now) {
            Some(false) => self.buffer.record_touch(contact.player, contact.team),
            Some(true) => tracing::debug!(player = contact.player, "Tip"),
            None => tracing::debug!(player = contact.player, "Exit without a recorded touch"),
        }

        if self.state.phase == GamePhase::Playing && self.state.restart_pending.is_none() {
            self.state
                .icing
                .on_stick_exit(&self.config, contact.team, self.state.puck_zone);
        }
    }

    /// A goalie touching the puck in their own end stops the last opposing
    /// possessor's shot.
    fn check_save(&mut self, contact: &StickContact) {
        let team = contact.team;
        if !contact.is_goalie() || !self.state.puck_zone.is_defensive_end_of(team) {
            return;
        }
        let shooting = team.other();
        let shooter = (self.state.possession.last_possessing_team() == shooting)
            .then(|| self.state.possession.team_possession(shooting).player)
            .flatten();
        tracing::debug!(goalie = contact.player, ?shooter, "Save");
        self.state.stats.record_save(contact.player, shooter);
    }

    fn faceoff_violation(
        &mut self,
        contact: &StickContact,
        outcome: ViolationOutcome,
        events: &mut RuleEvents,
    ) {
        let team = contact.team;
        let count = match outcome {
            ViolationOutcome::Warned { count } | ViolationOutcome::Penalized { count } => count,
            ViolationOutcome::Ignored => return,
        };

        events.push(OfficiatingEvent::CallMade {
            kind: CallKind::FaceoffViolation,
            team,
            snapshot: self.state.snapshot(Some(contact.player)),
        });
        events.push(OfficiatingEvent::ViolationCounted {
            player: contact.player,
            team,
            count,
            threshold: self.state.faceoff.threshold(),
        });

        if matches!(outcome, ViolationOutcome::Penalized { .. }) {
            self.issue_penalty(contact.player, team, events);
        }

        let spot = self.state.next_faceoff_spot;
        self.request_restart(spot, CallKind::FaceoffViolation, team, events);
        events.push(OfficiatingEvent::CallCleared {
            kind: CallKind::FaceoffViolation,
            team,
            player: Some(contact.player),
        });
    }

    fn issue_penalty(&mut self, player: PlayerId, team: Team, events: &mut RuleEvents) {
        self.state.penalty_generation += 1;
        let handle = PenaltyHandle {
            player,
            generation: self.state.penalty_generation,
        };
        self.state.penalties.insert(player, handle.generation);
        tracing::info!(player, generation = handle.generation, "Freeze penalty");
        events.push(OfficiatingEvent::PlayerPenalty {
            handle,
            team,
            backward_distance: self.config.faceoff.freeze_backward_distance,
            freeze_seconds: self.config.faceoff.freeze_seconds,
        });
    }

    fn request_restart(
        &mut self,
        spot: FaceoffSpot,
        kind: CallKind,
        team: Team,
        events: &mut RuleEvents,
    ) -> Option<RestartHandle> {
        if let Some(pending) = self.state.restart_pending {
            tracing::debug!(?kind, ?pending.kind, "Restart already pending, not requesting another");
            return None;
        }

        self.state.next_restart_id += 1;
        let handle = RestartHandle(self.state.next_restart_id);
        self.state.restart_pending = Some(PendingRestart { handle, spot, kind });
        self.state.next_faceoff_spot = spot;
        tracing::info!(?spot, kind = kind.name(), team = %team, "Faceoff restart requested");
        events.push(OfficiatingEvent::FaceoffRestart {
            spot,
            kind,
            team,
            handle,
        });
        Some(handle)
    }

    /// Rule on a goal trigger. A goal scored while the scoring team is
    /// under an offside, high-stick or icing call is disallowed and play
    /// restarts from the call. A goal scored before a requested restart has
    /// been completed is disallowed for the call that stopped play.
    pub fn on_goal_scored(&mut self, now: Millis, team: Team) -> Result<GoalRuling> {
        if !team.is_playing() {
            tracing::debug!(now, "Goal trigger without a team, allowing");
            return Ok(GoalRuling {
                allowed: true,
                events: RuleEvents::new(),
            });
        }

        let events = self.guarded(|engine, events| {
            engine.state.now = engine.state.now.max(now);
            engine.rule_on_goal(team, events);
        })?;
        let allowed = !events
            .iter()
            .any(|e| matches!(e, OfficiatingEvent::GoalDisallowed { .. }));
        Ok(GoalRuling { allowed, events })
    }

    fn rule_on_goal(&mut self, team: Team, events: &mut RuleEvents) {
        let state = &self.state;
        if let Some(pending) = state.restart_pending {
            tracing::info!(team = %team, kind = pending.kind.name(), "Goal scored on a dead puck");
            events.push(OfficiatingEvent::GoalDisallowed {
                team,
                kind: pending.kind,
            });
            return;
        }

        let offending = if let Some(snapshot) = state.offside.team_snapshot(team) {
            Some((CallKind::Offside, snapshot))
        } else if let Some(snapshot) = state.high_stick.snapshot(team) {
            Some((CallKind::HighStick, snapshot))
        } else {
            state.icing.snapshot(team).map(|s| (CallKind::Icing, s))
        };

        if let Some((kind, snapshot)) = offending {
            tracing::info!(team = %team, kind = kind.name(), "Goal disallowed");
            events.push(OfficiatingEvent::GoalDisallowed { team, kind });
            let spot = select_spot(team, kind == CallKind::Icing, &snapshot);
            self.request_restart(spot, kind, team, events);
            return;
        }

        let touchers = self.buffer.recent_touchers(team);
        let scorer = touchers
            .first()
            .copied()
            .or_else(|| self.state.possession.team_possession(team).player);
        let assists: Vec<PlayerId> = touchers
            .iter()
            .copied()
            .filter(|&p| Some(p) != scorer)
            .take(2)
            .collect();
        let goalie = self.goalie_of(team.other());

        tracing::info!(team = %team, ?scorer, ?assists, "Goal");
        self.state.stats.record_goal(scorer, &assists, goalie);
        self.state.next_faceoff_spot = FaceoffSpot::Center;
        self.buffer.clear();
        events.push(OfficiatingEvent::GoalAwarded {
            team,
            scorer,
            assists,
        });
    }

    fn goalie_of(&self, team: Team) -> Option<PlayerId> {
        self.state
            .players
            .values()
            .find(|p| p.team == team && p.is_playing && p.is_goalie())
            .map(|p| p.id)
    }

    /// The host moved to a new game phase.
    ///
    /// Entering FaceOff, Warmup, PeriodOver or GameOver wipes all per-play
    /// state; active calls are cleared with a `CallCleared` each. Warmup,
    /// PeriodOver and GameOver also drop violation counters and outstanding
    /// penalties; Warmup starts a fresh stat sheet.
    pub fn on_phase_changed(&mut self, old: GamePhase, new: GamePhase) -> Result<RuleEvents> {
        if old != self.state.phase {
            tracing::debug!(?old, tracked = ?self.state.phase, "Phase change from an unexpected phase");
        }

        self.guarded(|engine, events| {
            let state = &mut engine.state;
            state.phase = new;

            if new.resets_play_state() {
                tracing::info!(?new, "Resetting officiating state");
                state.possession.clear();
                state.offside.reset(events);
                state.icing.reset(events);
                state.high_stick.reset(events);
                state.puck_zone = Zone::None;
                state.previous_puck_zone = Zone::None;
                state.restart_pending = None;
                engine.buffer.clear();
            }

            match new {
                GamePhase::FaceOff => state.faceoff.arm(),
                GamePhase::Playing => {}
                _ => state.faceoff.disarm(),
            }

            if new.resets_session_state() {
                state.faceoff.clear_violations();
                state.penalties.clear();
                state.next_faceoff_spot = FaceoffSpot::Center;
            }
            if new == GamePhase::Warmup {
                state.stats.clear();
            }
        })
    }

    /// Dispatch a recorded feed event.
    pub fn apply(&mut self, event: &FeedEvent) -> Result<RuleEvents> {
        match event {
            FeedEvent::Tick(input) => self.on_tick(input),
            FeedEvent::Contact {
                now,
                phase,
                contact,
            } => self.on_stick_contact(*now, *phase, contact),
            FeedEvent::GoalScored { now, team } => Ok(self.on_goal_scored(*now, *team)?.events),
            FeedEvent::PhaseChanged { old, new, .. } => self.on_phase_changed(*old, *new),
            FeedEvent::PenaltyElapsed(handle) => {
                self.complete_penalty(*handle)?;
                Ok(RuleEvents::new())
            }
            FeedEvent::RestartCompleted(handle) => {
                self.complete_restart(*handle)?;
                Ok(RuleEvents::new())
            }
        }
    }

    // ------------------------------------------------------------------
    // Deferred completions
    // ------------------------------------------------------------------

    /// The host finished a requested restart. Returns `false` for a handle
    /// that is no longer pending.
    pub fn complete_restart(&mut self, handle: RestartHandle) -> Result<bool> {
        match self.state.restart_pending {
            Some(pending) if pending.handle == handle => {
                self.state.restart_pending = None;
                tracing::debug!(handle = handle.0, "Restart completed");
                Ok(true)
            }
            _ => {
                tracing::debug!(handle = handle.0, "Stale restart completion");
                Ok(false)
            }
        }
    }

    /// The freeze timer for a penalty fired. Returns `false` for a handle
    /// superseded by a newer penalty or dropped by a phase reset.
    pub fn complete_penalty(&mut self, handle: PenaltyHandle) -> Result<bool> {
        if self.state.penalties.get(&handle.player) == Some(&handle.generation) {
            self.state.penalties.remove(&handle.player);
            tracing::debug!(player = handle.player, "Penalty released");
            Ok(true)
        } else {
            tracing::debug!(player = handle.player, generation = handle.generation, "Stale penalty completion");
            Ok(false)
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Phase as last reported by the host.
    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.state.phase
    }

    /// Host clock of the last processed event.
    #[must_use]
    pub const fn now(&self) -> Millis {
        self.state.now
    }

    /// Ticks processed.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.state.ticks
    }

    /// Puck zone as of the last tick.
    #[must_use]
    pub const fn puck_zone(&self) -> Zone {
        self.state.puck_zone
    }

    /// Puck zone the tick before.
    #[must_use]
    pub const fn previous_puck_zone(&self) -> Zone {
        self.state.previous_puck_zone
    }

    /// Player as seen in the last tick.
    pub fn player(&self, player: PlayerId) -> Result<&PlayerSnapshot> {
        self.state
            .players
            .get(&player)
            .ok_or(EngineError::UnknownPlayer(player))
    }

    /// Zone of a skater as of the last tick.
    #[must_use]
    pub fn player_zone(&self, player: PlayerId) -> Option<Zone> {
        self.state.offside.player_zone(player)
    }

    /// Whether a player is flagged offside.
    #[must_use]
    pub fn is_offside(&self, player: PlayerId) -> bool {
        self.state.offside.is_offside(player)
    }

    /// Whether any player of `team` is flagged offside.
    #[must_use]
    pub fn team_offside(&self, team: Team) -> bool {
        self.state.offside.team_offside(team)
    }

    /// Whether icing is possible against `team`.
    #[must_use]
    pub fn is_icing_possible(&self, team: Team) -> bool {
        self.state.icing.is_possible(team)
    }

    /// Whether icing is active against `team`.
    #[must_use]
    pub fn is_icing_active(&self, team: Team) -> bool {
        self.state.icing.is_active(team)
    }

    /// Whether a high stick is pending against `team`.
    #[must_use]
    pub fn is_high_stick_active(&self, team: Team) -> bool {
        self.state.high_stick.is_active(team)
    }

    /// Player in possession as of the last processed event.
    #[must_use]
    pub fn player_in_possession(&self) -> Option<PlayerId> {
        self.state.possession.player_in_possession(self.state.now)
    }

    /// Whether a player's current touch is a tip.
    #[must_use]
    pub fn is_tipped(&self, player: PlayerId) -> Option<bool> {
        self.state.possession.is_tipped(player, self.state.now)
    }

    /// Possession timers.
    #[must_use]
    pub const fn possession(&self) -> &PossessionTracker {
        &self.state.possession
    }

    /// Where the next faceoff will be.
    #[must_use]
    pub const fn next_faceoff_spot(&self) -> FaceoffSpot {
        self.state.next_faceoff_spot
    }

    /// Restart requested and not yet completed.
    #[must_use]
    pub const fn restart_pending(&self) -> Option<PendingRestart> {
        self.state.restart_pending
    }

    /// Stage of the current faceoff.
    #[must_use]
    pub const fn faceoff_stage(&self) -> FaceoffStage {
        self.state.faceoff.stage()
    }

    /// Faceoff violations of a center within the decay window.
    #[must_use]
    pub fn violation_count(&self, player: PlayerId) -> u32 {
        self.state.faceoff.violation_count(player)
    }

    /// Whether a player is serving a freeze penalty. The host excludes them
    /// from faceoff position enforcement while this holds.
    #[must_use]
    pub fn is_penalized(&self, player: PlayerId) -> bool {
        self.state.penalties.contains_key(&player)
    }

    /// Stat line of one player.
    #[must_use]
    pub fn player_stats(&self, player: PlayerId) -> PlayerStats {
        self.state.stats.get(player)
    }

    /// The whole stat sheet.
    #[must_use]
    pub const fn stats(&self) -> &StatsTracker {
        &self.state.stats
    }

    /// The collision buffer.
    #[must_use]
    pub const fn buffer(&self) -> &B {
        &self.buffer
    }

    /// Digest of the officiating state, equal for equal feeds.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        match bincode::serialize(&self.state) {
            Ok(bytes) => bytes.hash(&mut hasher),
            Err(err) => tracing::warn!(%err, "State not hashable"),
        }
        for team in Team::PLAYING {
            self.buffer.recent_touchers(team).hash(&mut hasher);
        }

        hasher.finish()
    }
}

/// A [`RuleEngine`] behind one mutex, for hosts that call in from more than
/// one thread.
#[derive(Debug)]
pub struct SharedRuleEngine<B: CollisionBuffer = TouchHistory> {
    inner: Arc<Mutex<RuleEngine<B>>>,
}

impl<B: CollisionBuffer> Clone for SharedRuleEngine<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: CollisionBuffer> SharedRuleEngine<B> {
    /// Wrap an engine.
    pub fn new(engine: RuleEngine<B>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with<R>(&self, f: impl FnOnce(&mut RuleEngine<B>) -> R) -> Result<R> {
        let mut engine = self.inner.lock().map_err(|_| EngineError::LockPoisoned)?;
        Ok(f(&mut engine))
    }

    /// See [`RuleEngine::on_tick`].
    pub fn on_tick(&self, input: &TickInput) -> Result<RuleEvents> {
        self.with(|e| e.on_tick(input))?
    }

    /// See [`RuleEngine::on_stick_contact`].
    pub fn on_stick_contact(
        &self,
        now: Millis,
        phase: ContactPhase,
        contact: &StickContact,
    ) -> Result<RuleEvents> {
        self.with(|e| e.on_stick_contact(now, phase, contact))?
    }

    /// See [`RuleEngine::on_goal_scored`].
    pub fn on_goal_scored(&self, now: Millis, team: Team) -> Result<GoalRuling> {
        self.with(|e| e.on_goal_scored(now, team))?
    }

    /// See [`RuleEngine::on_phase_changed`].
    pub fn on_phase_changed(&self, old: GamePhase, new: GamePhase) -> Result<RuleEvents> {
        self.with(|e| e.on_phase_changed(old, new))?
    }

    /// See [`RuleEngine::complete_restart`].
    pub fn complete_restart(&self, handle: RestartHandle) -> Result<bool> {
        self.with(|e| e.complete_restart(handle))?
    }

    /// See [`RuleEngine::complete_penalty`].
    pub fn complete_penalty(&self, handle: PenaltyHandle) -> Result<bool> {
        self.with(|e| e.complete_penalty(handle))?
    }

    /// See [`RuleEngine::apply`].
    pub fn apply(&self, event: &FeedEvent) -> Result<RuleEvents> {
        self.with(|e| e.apply(event))?
    }
}
