//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the rule engine produces identical
//! state and identical officiating events given an identical feed.
//!
//! # Testing Strategy
//!
//! A recorded feed must replay to the same calls on every server, or
//! recordings are useless for disputes. Sources of non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Engine state is kept in `BTreeMap`s keyed by player id.
//!
//! - **Wall-clock reads**: The engine only ever sees the host clock passed
//!   in with each event.
//!
//! - **Float classification at band edges**: Zone hysteresis depends on the
//!   previous zone, so a single skipped tick changes later results.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual monitors (offside, icing, high stick)
//! 2. **Property tests**: Random feeds must still replay identically
//! 3. **Parallel tests**: Replaying N copies on N threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use rink_core::prelude::*;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps applied per run.
    pub steps: u64,
}

impl DeterminismResult {
    fn from_hashes(hashes: Vec<u64>, steps: u64) -> Self {
        Self {
            is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
            hashes,
            steps,
        }
    }

    /// Get all unique hashes (should be 1 for a deterministic engine).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Rule engine is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a stateful process multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for i in 0..steps {
            step(&mut state, i);
        }
        hashes.push(hash(&state));
    }

    DeterminismResult::from_hashes(hashes, steps)
}

/// Replay a feed `runs` times through fresh engines and compare the final
/// state hash together with a hash of every emitted event.
pub fn verify_feed_determinism(config: RuleConfig, feed: &[FeedEvent], runs: usize) -> DeterminismResult {
    verify_determinism(
        runs,
        feed.len() as u64,
        || (RuleEngine::new(config), DefaultHasher::new()),
        |state: &mut (RuleEngine, DefaultHasher), i: u64| {
            let (engine, events) = state;
            if let Some(event) = feed.get(i as usize) {
                match engine.apply(event) {
                    Ok(out) => format!("{:?}", out.events).hash(events),
                    Err(err) => err.to_string().hash(events),
                }
            }
        },
        |state: &(RuleEngine, DefaultHasher)| {
            let (engine, events) = state;
            let mut hasher = events.clone();
            engine.state_hash().hash(&mut hasher);
            hasher.finish()
        },
    )
}

/// Replay a recording on `num_runs` threads at once and collect the final
/// state hashes.
///
/// # Panics
///
/// Panics if a replay thread panics.
pub fn run_parallel_replays_scoped(recording: &FeedRecording, num_runs: usize) -> DeterminismResult {
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_runs)
            .map(|_| {
                s.spawn(|| match recording.replay() {
                    Ok(outcome) => outcome.final_hash,
                    Err(err) => compute_hash(&err.to_string()),
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    DeterminismResult::from_hashes(hashes, recording.len() as u64)
}

/// Apply two feeds side by side and report the first event index after
/// which the engines' states differ.
///
/// Useful for narrowing down which event makes two recordings diverge.
///
/// # Returns
///
/// `None` if the feeds keep the engines in lockstep, `Some(index)` at the
/// first divergence. A longer feed diverges at the shorter one's length.
pub fn find_first_divergence(config: RuleConfig, a: &[FeedEvent], b: &[FeedEvent]) -> Option<usize> {
    let mut engine_a = RuleEngine::new(config);
    let mut engine_b = RuleEngine::new(config);

    for (index, (ea, eb)) in a.iter().zip(b).enumerate() {
        let out_a = engine_a.apply(ea).ok();
        let out_b = engine_b.apply(eb).ok();
        if out_a != out_b || engine_a.state_hash() != engine_b.state_hash() {
            tracing::warn!(index, "Feeds diverged");
            return Some(index);
        }
    }

    (a.len() != b.len()).then(|| a.len().min(b.len()))
}

/// Verify that a recording survives both encodings unchanged and replays to
/// the same final hash afterwards.
pub fn verify_serialization_determinism(recording: &FeedRecording) -> bool {
    let Ok(original) = recording.replay() else {
        return false;
    };

    let bincode_ok = recording
        .to_bytes()
        .and_then(|bytes| FeedRecording::from_bytes(&bytes))
        .and_then(|decoded| decoded.replay())
        .is_ok_and(|outcome| outcome.final_hash == original.final_hash);

    let ron_ok = recording
        .to_ron_string()
        .and_then(|text| FeedRecording::from_ron_str(&text))
        .and_then(|decoded| decoded.replay())
        .is_ok_and(|outcome| outcome.final_hash == original.final_hash);

    bincode_ok && ron_ok
}

/// Compute a hash for any hashable value.
#[must_use]
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for engine inputs.
///
/// Values stay within the default rink so that generated feeds exercise
/// every zone and line band.
pub mod strategies {
    use proptest::prelude::*;
    use rink_core::prelude::*;

    use crate::fixtures::TICK_MS;

    /// Long-axis coordinate from beyond one end boards to the other.
    pub fn arb_long_axis() -> impl Strategy<Value = f32> {
        -45.0f32..45.0f32
    }

    /// Cross-axis coordinate.
    pub fn arb_cross_axis() -> impl Strategy<Value = f32> {
        -14.0f32..14.0f32
    }

    /// A position on the ice surface.
    pub fn arb_ice_position() -> impl Strategy<Value = Vec3> {
        (arb_cross_axis(), arb_long_axis()).prop_map(|(x, z)| Vec3::new(x, 0.0, z))
    }

    /// Any zone, `None` included.
    pub fn arb_zone() -> impl Strategy<Value = Zone> {
        prop_oneof![
            Just(Zone::None),
            Just(Zone::BlueBehindGoalLine),
            Just(Zone::BlueZone),
            Just(Zone::BlueCenter),
            Just(Zone::RedCenter),
            Just(Zone::RedZone),
            Just(Zone::RedBehindGoalLine),
        ]
    }

    /// Blue or Red.
    pub fn arb_playing_team() -> impl Strategy<Value = Team> {
        prop_oneof![Just(Team::Blue), Just(Team::Red)]
    }

    /// Any role.
    pub fn arb_role() -> impl Strategy<Value = PlayerRole> {
        prop_oneof![
            Just(PlayerRole::Center),
            Just(PlayerRole::LeftWing),
            Just(PlayerRole::RightWing),
            Just(PlayerRole::LeftDefense),
            Just(PlayerRole::RightDefense),
            Just(PlayerRole::Goalie),
        ]
    }

    /// Puck snapshot taken at a call.
    pub fn arb_snapshot() -> impl Strategy<Value = CallSnapshot> {
        (arb_ice_position(), arb_zone(), 0u64..600_000).prop_map(|(puck_position, puck_zone, at)| {
            CallSnapshot {
                puck_position,
                puck_zone,
                player: None,
                at,
            }
        })
    }

    /// A stick contact by one of ten players.
    pub fn arb_contact() -> impl Strategy<Value = StickContact> {
        (1u64..=10, arb_playing_team(), arb_role(), 0.0f32..3.5).prop_map(
            |(player, team, role, puck_height)| StickContact {
                player,
                team,
                role,
                puck_height,
                stick_holder_body_height: 0.0,
            },
        )
    }

    /// One step of a random live session, before timestamps are assigned.
    #[derive(Debug, Clone)]
    pub enum FeedStep {
        /// Puck moves and a tick fires.
        Tick(Vec3),
        /// A stick touch of the given length.
        Touch(StickContact, Millis),
        /// Goal trigger.
        Goal(Team),
    }

    /// A random step.
    pub fn arb_feed_step() -> impl Strategy<Value = FeedStep> {
        prop_oneof![
            6 => (arb_ice_position(), 0.0f32..3.0).prop_map(|(mut p, h)| {
                p.y = h;
                FeedStep::Tick(p)
            }),
            3 => (arb_contact(), 0u64..900).prop_map(|(c, hold)| FeedStep::Touch(c, hold)),
            1 => arb_playing_team().prop_map(FeedStep::Goal),
        ]
    }

    /// A random live session with a monotonic clock, starting from a
    /// faceoff with a roster of five skaters and a goalie per team.
    pub fn arb_feed(max_steps: usize) -> impl Strategy<Value = Vec<FeedEvent>> {
        proptest::collection::vec(arb_feed_step(), 0..max_steps).prop_map(|steps| {
            let mut builder = crate::fixtures::FeedBuilder::new()
                .player(crate::fixtures::goalie(11, Team::Blue))
                .player(crate::fixtures::goalie(12, Team::Red));
            for id in 1..=10u64 {
                let team = if id <= 5 { Team::Blue } else { Team::Red };
                let z = (id as f32 - 5.5) * 6.0;
                builder = builder.player(crate::fixtures::skater(id, team, PlayerRole::LeftWing, 0.0, z));
            }
            builder = builder.start_play();
            for step in steps {
                builder = match step {
                    FeedStep::Tick(puck) => builder.puck_at(puck).tick(),
                    FeedStep::Touch(contact, hold) => builder.touch(contact, hold).wait(TICK_MS),
                    FeedStep::Goal(team) => builder.goal(team),
                };
            }
            builder.build()
        })
    }
}
