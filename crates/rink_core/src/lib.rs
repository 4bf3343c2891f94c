//! # Rink Core
//!
//! Officiating rule engine for a networked hockey game.
//!
//! This crate contains **only** rule logic:
//! - No rendering
//! - No physics
//! - No networking
//! - No timers (deferred actions are completed by the host)
//!
//! The host feeds it puck and player telemetry once per simulation tick and
//! on every stick/puck collision, and receives officiating events back:
//! calls made and cleared, faceoff restarts, freeze penalties, goal rulings.
//!
//! ## Crate Structure
//!
//! - [`rink`] - Ice lines, zones and the zone classifier
//! - [`possession`] - Touch timing, tip filtering, possession arbitration
//! - [`offside`], [`icing`], [`high_stick`] - Infraction monitors
//! - [`faceoff`] - Faceoff spot selection and drop violations
//! - [`engine`] - The orchestrating [`RuleEngine`](engine::RuleEngine)
//! - [`replay`] - Feed recordings

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod faceoff;
pub mod feed;
pub mod high_stick;
pub mod history;
pub mod icing;
pub mod offside;
pub mod possession;
pub mod replay;
pub mod rink;
pub mod stats;
pub mod types;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{
        FaceoffConfig, HeightConfig, PossessionConfig, RadiusConfig, RuleConfig, TeamRules,
    };
    pub use crate::engine::{GoalRuling, PendingRestart, RuleEngine, SharedRuleEngine};
    pub use crate::error::{EngineError, Result};
    pub use crate::events::{
        CallKind, CallSnapshot, OfficiatingEvent, PenaltyHandle, RestartHandle, RuleEvents,
    };
    pub use crate::faceoff::{select_spot, FaceoffStage};
    pub use crate::feed::{ContactPhase, FeedEvent, PlayerSnapshot, StickContact, TickInput};
    pub use crate::history::{CollisionBuffer, TouchHistory};
    pub use crate::replay::{FeedRecording, ReplayOutcome, ReplayPlayer};
    pub use crate::rink::{classify, FaceoffSpot, LineTable, RinkGeometry, RinkSide, Zone};
    pub use crate::stats::PlayerStats;
    pub use crate::types::{GamePhase, Millis, PlayerId, PlayerRole, Team, Vec3};
}
