//! Feed recordings for replaying a session through the engine.
//!
//! A recording stores the rule config and every inbound feed event in the
//! order the host delivered them. Replaying it through a fresh engine
//! reproduces the officiating decisions exactly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::RuleConfig;
use crate::engine::RuleEngine;
use crate::error::{EngineError, Result};
use crate::events::{OfficiatingEvent, RuleEvents};
use crate::feed::FeedEvent;

/// Recording file format version for compatibility.
pub const RECORDING_VERSION: u32 = 1;

/// A recorded session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedRecording {
    /// Format version.
    pub version: u32,
    /// Free-form label (server name, match id).
    pub name: String,
    /// Config the session ran with.
    pub config: RuleConfig,
    /// Feed events in delivery order.
    pub events: Vec<FeedEvent>,
    /// Engine state hash after the last event, once finalized.
    pub final_hash: Option<u64>,
}

impl FeedRecording {
    /// Start an empty recording.
    pub fn new(name: impl Into<String>, config: RuleConfig) -> Self {
        Self {
            version: RECORDING_VERSION,
            name: name.into(),
            config,
            events: Vec::new(),
            final_hash: None,
        }
    }

    /// Append a feed event.
    pub fn record(&mut self, event: FeedEvent) {
        self.events.push(event);
    }

    /// Store the state hash the live engine ended with.
    pub fn finalize(&mut self, final_hash: u64) {
        self.final_hash = Some(final_hash);
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn check_version(self) -> Result<Self> {
        if self.version != RECORDING_VERSION {
            return Err(EngineError::Recording(format!(
                "Recording version mismatch: expected {}, got {}",
                RECORDING_VERSION, self.version
            )));
        }
        self.config.validate()?;
        Ok(self)
    }

    /// Encode as bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| EngineError::Recording(format!("Failed to encode recording: {e}")))
    }

    /// Decode from bincode.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let recording: Self = bincode::deserialize(bytes)
            .map_err(|e| EngineError::Recording(format!("Failed to decode recording: {e}")))?;
        recording.check_version()
    }

    /// Encode as pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| EngineError::Recording(format!("Failed to encode recording: {e}")))
    }

    /// Decode from RON.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let recording: Self = ron::from_str(text)
            .map_err(|e| EngineError::Recording(format!("Failed to decode recording: {e}")))?;
        recording.check_version()
    }

    /// Save to a file: RON for a `.ron` extension, bincode otherwise.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if is_ron(path) {
            std::fs::write(path, self.to_ron_string()?)?;
        } else {
            std::fs::write(path, self.to_bytes()?)?;
        }
        Ok(())
    }

    /// Load a file written by [`save`](Self::save).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if is_ron(path) {
            Self::from_ron_str(&std::fs::read_to_string(path)?)
        } else {
            Self::from_bytes(&std::fs::read(path)?)
        }
    }

    /// Run every event through a fresh engine.
    ///
    /// Fails on the first event the engine rejects.
    pub fn replay(&self) -> Result<ReplayOutcome> {
        let mut player = ReplayPlayer::new(self.clone());
        let mut steps = Vec::with_capacity(self.events.len());
        while let Some(step) = player.step()? {
            steps.push(step);
        }
        Ok(ReplayOutcome {
            final_hash: player.engine().state_hash(),
            steps,
        })
    }

    /// Replay and compare against the stored final hash.
    ///
    /// `Ok(None)` if the recording was never finalized.
    pub fn verify(&self) -> Result<Option<bool>> {
        let Some(expected) = self.final_hash else {
            return Ok(None);
        };
        Ok(Some(self.replay()?.final_hash == expected))
    }
}

fn is_ron(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("ron"))
}

/// Events produced by one recorded feed event.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayStep {
    /// Position of the feed event in the recording.
    pub index: usize,
    /// Engine output for it.
    pub events: RuleEvents,
}

/// Result of replaying a whole recording.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOutcome {
    /// Output per feed event, including empty ones.
    pub steps: Vec<ReplayStep>,
    /// Engine state hash after the last event.
    pub final_hash: u64,
}

impl ReplayOutcome {
    /// Every officiating event in emission order.
    pub fn events(&self) -> impl Iterator<Item = &OfficiatingEvent> {
        self.steps.iter().flat_map(|s| s.events.iter())
    }
}

/// Step-by-step playback.
#[derive(Debug)]
pub struct ReplayPlayer {
    recording: FeedRecording,
    engine: RuleEngine,
    cursor: usize,
}

impl ReplayPlayer {
    /// Prepare playback from the start.
    #[must_use]
    pub fn new(recording: FeedRecording) -> Self {
        let engine = RuleEngine::new(recording.config);
        Self {
            recording,
            engine,
            cursor: 0,
        }
    }

    /// Apply the next event. `Ok(None)` once the recording is exhausted.
    pub fn step(&mut self) -> Result<Option<ReplayStep>> {
        let Some(event) = self.recording.events.get(self.cursor) else {
            return Ok(None);
        };
        let events = self.engine.apply(event)?;
        let step = ReplayStep {
            index: self.cursor,
            events,
        };
        self.cursor += 1;
        Ok(Some(step))
    }

    /// Restart from a fresh engine and play up to (not including) `index`.
    pub fn seek(&mut self, index: usize) -> Result<()> {
        self.engine = RuleEngine::new(self.recording.config);
        self.cursor = 0;
        while self.cursor < index.min(self.recording.events.len()) {
            self.step()?;
        }
        Ok(())
    }

    /// Index of the next event to apply.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.cursor
    }

    /// Whether every event has been applied.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.recording.events.len()
    }

    /// The engine being driven.
    #[must_use]
    pub const fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// The recording being played.
    #[must_use]
    pub const fn recording(&self) -> &FeedRecording {
        &self.recording
    }
}
