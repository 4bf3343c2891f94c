//! Faceoffs: where play resumes, and what happens when a center jumps the
//! drop.
//!
//! # Spot selection
//!
//! [`select_spot`] is a pure function of the offending team, whether the
//! call is icing, and the puck snapshot taken when the call was made.
//!
//! # Violation tracking
//!
//! Each faceoff runs a small state machine driven by the puck height:
//!
//! ```text
//! Idle --FaceOff phase--> Armed --puck falls--> Dropped --puck on ice--> Valid
//!                           |                      |
//!                           +--center touches------+----> Violated
//! ```
//!
//! A violation restarts the faceoff and counts against the center.
//! Violations further apart than the decay window do not accumulate;
//! reaching the threshold issues a freeze penalty and resets the count.
//! Only centers are penalized. Anyone else touching early is logged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::FaceoffConfig;
use crate::events::CallSnapshot;
use crate::rink::{FaceoffSpot, RinkSide, Zone};
use crate::types::{Millis, PlayerId, PlayerRole, Team};

/// Pick the faceoff dot for a call against `team`.
#[must_use]
pub fn select_spot(team: Team, is_icing: bool, snapshot: &CallSnapshot) -> FaceoffSpot {
    let side = RinkSide::of(snapshot.puck_position.x);

    if !team.is_playing() {
        return FaceoffSpot::Center;
    }

    if is_icing {
        return FaceoffSpot::defensive(team, side);
    }

    let zone = snapshot.puck_zone;
    match zone {
        Zone::None => FaceoffSpot::Center,
        Zone::BlueCenter | Zone::RedCenter => FaceoffSpot::blueline(zone.owner(), side),
        _ => {
            let owner = zone.owner();
            if owner == team {
                FaceoffSpot::defensive(team, side)
            } else {
                FaceoffSpot::blueline(owner, side)
            }
        }
    }
}

/// Stage of the current faceoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FaceoffStage {
    /// No faceoff in progress.
    #[default]
    Idle,
    /// Faceoff phase entered, waiting for the puck to fall.
    Armed,
    /// Puck is falling.
    Dropped,
    /// Puck reached the ice; the faceoff is legal.
    Valid,
    /// A center touched the puck before it reached the ice.
    Violated,
}

impl FaceoffStage {
    /// Whether touches still count as violations.
    #[must_use]
    pub const fn is_monitoring(self) -> bool {
        matches!(self, Self::Armed | Self::Dropped)
    }
}

/// Violation count for one center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ViolationRecord {
    /// Violations within the decay window.
    pub count: u32,
    /// When the last one happened.
    pub last_at: Millis,
}

/// Result of an early touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationOutcome {
    /// Nothing to enforce (legal touch, or not a center).
    Ignored,
    /// Counted; restart the faceoff and warn the player.
    Warned {
        /// Violations within the decay window.
        count: u32,
    },
    /// Threshold reached; restart and freeze the player. The count is back
    /// at zero.
    Penalized {
        /// The count that triggered the penalty.
        count: u32,
    },
}

/// Per-faceoff state machine plus per-center violation counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaceoffTracker {
    config: FaceoffConfig,
    stage: FaceoffStage,
    drop_height_at_start: Option<f32>,
    violations: BTreeMap<PlayerId, ViolationRecord>,
}

impl FaceoffTracker {
    /// Create an idle tracker.
    #[must_use]
    pub fn new(config: FaceoffConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Replace the penalty settings. Counters are kept.
    pub fn set_config(&mut self, config: FaceoffConfig) {
        self.config = config;
    }

    /// A faceoff phase began.
    pub fn arm(&mut self) {
        self.stage = FaceoffStage::Armed;
        self.drop_height_at_start = None;
    }

    /// Stop monitoring without touching the counters.
    pub fn disarm(&mut self) {
        self.stage = FaceoffStage::Idle;
        self.drop_height_at_start = None;
    }

    /// Forget every counter.
    pub fn clear_violations(&mut self) {
        self.violations.clear();
    }

    /// Advance the state machine from the puck height.
    pub fn on_puck_height(&mut self, height: f32, drop_threshold: f32, grounded_height: f32) {
        if !self.stage.is_monitoring() || !height.is_finite() {
            return;
        }

        let start = *self.drop_height_at_start.get_or_insert(height);
        if self.stage == FaceoffStage::Armed && height < start - drop_threshold {
            tracing::debug!(start, height, "Faceoff puck dropped");
            self.stage = FaceoffStage::Dropped;
        }
        if height <= grounded_height {
            tracing::debug!(height, "Faceoff puck on ice");
            self.stage = FaceoffStage::Valid;
        }
    }

    /// A stick touched the puck. Counts a violation if a center touched it
    /// before it reached the ice.
    pub fn on_stick_touch(&mut self, player: PlayerId, role: PlayerRole, now: Millis) -> ViolationOutcome {
        if !self.stage.is_monitoring() {
            return ViolationOutcome::Ignored;
        }
        if !role.is_center() {
            tracing::debug!(player, ?role, "Non-center touched puck before faceoff drop");
            return ViolationOutcome::Ignored;
        }

        self.stage = FaceoffStage::Violated;

        let decay = self.config.violation_decay_ms;
        let threshold = self.config.max_violations_before_penalty;
        let record = self.violations.entry(player).or_default();
        if record.count > 0 && now.saturating_sub(record.last_at) > decay {
            record.count = 0;
        }
        record.count += 1;
        record.last_at = now;

        let count = record.count;
        if count >= threshold {
            record.count = 0;
            tracing::info!(player, count, "Faceoff violation penalty");
            ViolationOutcome::Penalized { count }
        } else {
            tracing::info!(player, count, threshold, "Faceoff violation");
            ViolationOutcome::Warned { count }
        }
    }

    /// Current stage.
    #[must_use]
    pub const fn stage(&self) -> FaceoffStage {
        self.stage
    }

    /// Puck height recorded at the start of the faceoff.
    #[must_use]
    pub const fn drop_height_at_start(&self) -> Option<f32> {
        self.drop_height_at_start
    }

    /// Violations of a center within the decay window as of their last one.
    #[must_use]
    pub fn violation_count(&self, player: PlayerId) -> u32 {
        self.violations.get(&player).map_or(0, |r| r.count)
    }

    /// Penalty threshold in effect.
    #[must_use]
    pub const fn threshold(&self) -> u32 {
        self.config.max_violations_before_penalty
    }
}
