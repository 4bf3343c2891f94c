//! Rule engine configuration.
//!
//! All tunables are plain data loaded from RON. Every field has a default,
//! so a config file only needs to mention what it changes:
//!
//! ```ron
//! RuleConfig(
//!     red: TeamRules(icing: false),
//!     faceoff: FaceoffConfig(max_violations_before_penalty: 3),
//! )
//! ```
//!
//! The possession windows default to the values used by live servers. Older
//! server configs shipped different numbers; both are plain data here and
//! neither is assumed to be the correct one.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::rink::RinkGeometry;
use crate::types::{Millis, Team};

/// Per-team rule enable flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamRules {
    /// Enforce offside against this team.
    pub offside: bool,
    /// Enforce icing against this team.
    pub icing: bool,
    /// Enforce high stick against this team.
    pub high_stick: bool,
}

impl Default for TeamRules {
    fn default() -> Self {
        Self {
            offside: true,
            icing: true,
            high_stick: true,
        }
    }
}

/// Touch timing windows used for tip filtering and possession.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PossessionConfig {
    /// A touch shorter than this is a tip and never confers possession.
    pub max_tipped_ms: Millis,
    /// Minimum hold before a touch counts toward possession.
    pub min_possession_ms: Millis,
    /// Holds between the minimum and this value compete for possession.
    pub max_possession_ms: Millis,
}

impl Default for PossessionConfig {
    fn default() -> Self {
        Self {
            max_tipped_ms: 91,
            min_possession_ms: 300,
            max_possession_ms: 700,
        }
    }
}

/// Height thresholds, in world units above the ice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightConfig {
    /// Puck contact above this (relative to the stick holder) is a high stick.
    pub crossbar_height: f32,
    /// The puck is on the ice at or below this height.
    pub puck_grounded_height: f32,
    /// The puck counts as dropped once it has fallen this far below its
    /// height at the start of a faceoff.
    pub faceoff_drop_threshold: f32,
}

impl Default for HeightConfig {
    fn default() -> Self {
        Self {
            crossbar_height: 1.8,
            puck_grounded_height: 0.1,
            faceoff_drop_threshold: 0.5,
        }
    }
}

/// Faceoff violation penalties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceoffConfig {
    /// Violations within the decay window before a freeze penalty.
    pub max_violations_before_penalty: u32,
    /// Violations further apart than this do not accumulate.
    pub violation_decay_ms: Millis,
    /// How far a penalized center is pushed back toward their own end.
    pub freeze_backward_distance: f32,
    /// How long a penalized center stays frozen.
    pub freeze_seconds: f32,
}

impl Default for FaceoffConfig {
    fn default() -> Self {
        Self {
            max_violations_before_penalty: 2,
            violation_decay_ms: 10_000,
            freeze_backward_distance: 3.0,
            freeze_seconds: 3.0,
        }
    }
}

/// Object radii used for zone classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusConfig {
    /// Puck radius.
    pub puck_radius: f32,
    /// Player radius.
    pub player_radius: f32,
}

impl Default for RadiusConfig {
    fn default() -> Self {
        Self {
            puck_radius: 0.15,
            player_radius: 0.25,
        }
    }
}

/// Complete rule engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Rules enforced against Blue.
    pub blue: TeamRules,
    /// Rules enforced against Red.
    pub red: TeamRules,
    /// Touch timing windows.
    pub possession: PossessionConfig,
    /// Height thresholds.
    pub heights: HeightConfig,
    /// Faceoff violation penalties.
    pub faceoff: FaceoffConfig,
    /// Object radii.
    pub radii: RadiusConfig,
    /// Rink lines and faceoff dots.
    pub rink: RinkGeometry,
}

impl RuleConfig {
    /// Rules enforced against `team`. `Team::None` has every rule disabled.
    #[must_use]
    pub fn team_rules(&self, team: Team) -> TeamRules {
        match team {
            Team::Blue => self.blue,
            Team::Red => self.red,
            Team::None => TeamRules {
                offside: false,
                icing: false,
                high_stick: false,
            },
        }
    }

    /// Parse a config from RON text and validate it.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Self::parse(text, "<inline>")
    }

    /// Load a config from a RON file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, &path.display().to_string())
    }

    /// Serialize to pretty-printed RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()).map_err(|e| {
            EngineError::ConfigParse {
                path: "<inline>".to_string(),
                message: e.to_string(),
            }
        })
    }

    fn parse(text: &str, origin: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| EngineError::ConfigParse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the config for values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let p = &self.possession;
        if p.min_possession_ms >= p.max_possession_ms {
            return Err(invalid(
                "possession.min_possession_ms",
                format!(
                    "must be below max_possession_ms ({} >= {})",
                    p.min_possession_ms, p.max_possession_ms
                ),
            ));
        }

        let h = &self.heights;
        for (field, value) in [
            ("heights.crossbar_height", h.crossbar_height),
            ("heights.puck_grounded_height", h.puck_grounded_height),
            ("heights.faceoff_drop_threshold", h.faceoff_drop_threshold),
            ("radii.puck_radius", self.radii.puck_radius),
            ("radii.player_radius", self.radii.player_radius),
            (
                "faceoff.freeze_backward_distance",
                self.faceoff.freeze_backward_distance,
            ),
            ("faceoff.freeze_seconds", self.faceoff.freeze_seconds),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, format!("must be a non-negative number, got {value}")));
            }
        }

        if self.faceoff.max_violations_before_penalty == 0 {
            return Err(invalid(
                "faceoff.max_violations_before_penalty",
                "must be at least 1".to_string(),
            ));
        }

        if let Some(line) = self.rink.lines.first_malformed() {
            return Err(invalid(
                "rink.lines",
                format!("{line:?} is empty, reversed or overlaps the previous line"),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, message: String) -> EngineError {
    EngineError::InvalidConfig {
        field: field.to_string(),
        message,
    }
}
