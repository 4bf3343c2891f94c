//! Test fixtures and helpers.
//!
//! Player and contact builders, plus [`FeedBuilder`] for scripting a
//! session as a list of feed events with a running clock.

use rink_core::prelude::*;

/// Tick spacing used by [`FeedBuilder::tick`], in milliseconds.
pub const TICK_MS: Millis = 20;

/// A playing skater at `(x, z)` on the ice.
#[must_use]
pub fn skater(id: PlayerId, team: Team, role: PlayerRole, x: f32, z: f32) -> PlayerSnapshot {
    PlayerSnapshot::new(id, team, role, Vec3::new(x, 0.0, z))
}

/// A playing goalie in front of their own net.
#[must_use]
pub fn goalie(id: PlayerId, team: Team) -> PlayerSnapshot {
    let z = match team {
        Team::Red => 38.0,
        _ => -38.0,
    };
    PlayerSnapshot::new(id, team, PlayerRole::Goalie, Vec3::new(0.0, 0.0, z))
}

/// Puck on the ice at `(x, z)`.
#[must_use]
pub fn puck(x: f32, z: f32) -> Vec3 {
    Vec3::new(x, 0.0, z)
}

/// A stick contact at ice level.
#[must_use]
pub fn contact(player: PlayerId, team: Team, role: PlayerRole) -> StickContact {
    StickContact {
        player,
        team,
        role,
        puck_height: 0.0,
        stick_holder_body_height: 0.0,
    }
}

/// A stick contact with the puck at `puck_height`.
#[must_use]
pub fn raised_contact(player: PlayerId, team: Team, role: PlayerRole, puck_height: f32) -> StickContact {
    StickContact {
        puck_height,
        ..contact(player, team, role)
    }
}

/// Engine with default rules, already in live play with the puck down at
/// center ice.
///
/// # Panics
///
/// Panics if the engine rejects the setup feed.
#[must_use]
pub fn live_engine() -> RuleEngine {
    live_engine_with(RuleConfig::default())
}

/// [`live_engine`] with a custom config.
///
/// # Panics
///
/// Panics if the engine rejects the setup feed.
#[must_use]
pub fn live_engine_with(config: RuleConfig) -> RuleEngine {
    let mut engine = RuleEngine::new(config);
    for event in FeedBuilder::new().start_play().build() {
        engine.apply(&event).expect("setup feed rejected");
    }
    engine
}

/// Apply every event and collect the output.
///
/// # Panics
///
/// Panics if the engine rejects an event.
pub fn run_feed<B: CollisionBuffer>(engine: &mut RuleEngine<B>, feed: &[FeedEvent]) -> RuleEvents {
    let mut out = RuleEvents::new();
    for event in feed {
        out.extend(engine.apply(event).expect("feed event rejected"));
    }
    out
}

/// Scripts a session as feed events.
///
/// The builder keeps a clock, the puck position, the current phase and the
/// roster; every [`tick`](Self::tick) snapshots them.
#[derive(Debug, Clone)]
pub struct FeedBuilder {
    now: Millis,
    phase: GamePhase,
    puck: Vec3,
    players: Vec<PlayerSnapshot>,
    events: Vec<FeedEvent>,
}

impl Default for FeedBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedBuilder {
    /// Empty script at time zero, puck at center ice.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: 0,
            phase: GamePhase::None,
            puck: Vec3::ZERO,
            players: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Current script clock.
    #[must_use]
    pub const fn now(&self) -> Millis {
        self.now
    }

    /// Add a player to the roster, replacing one with the same id.
    #[must_use]
    pub fn player(mut self, player: PlayerSnapshot) -> Self {
        self.players.retain(|p| p.id != player.id);
        self.players.push(player);
        self
    }

    /// Move a rostered player.
    #[must_use]
    pub fn move_player(mut self, id: PlayerId, x: f32, z: f32) -> Self {
        if let Some(p) = self.players.iter_mut().find(|p| p.id == id) {
            p.position = Vec3::new(x, p.position.y, z);
        }
        self
    }

    /// Take a player off the ice.
    #[must_use]
    pub fn bench(mut self, id: PlayerId) -> Self {
        if let Some(p) = self.players.iter_mut().find(|p| p.id == id) {
            p.is_playing = false;
        }
        self
    }

    /// Move the puck.
    #[must_use]
    pub fn puck_at(mut self, position: Vec3) -> Self {
        self.puck = position;
        self
    }

    /// Change phase.
    #[must_use]
    pub fn phase(mut self, new: GamePhase) -> Self {
        self.events.push(FeedEvent::PhaseChanged {
            now: self.now,
            old: self.phase,
            new,
        });
        self.phase = new;
        self
    }

    /// FaceOff, then Playing, then one tick with the puck down at center.
    #[must_use]
    pub fn start_play(self) -> Self {
        self.phase(GamePhase::FaceOff)
            .phase(GamePhase::Playing)
            .puck_at(Vec3::ZERO)
            .tick()
    }

    /// Advance the clock one tick and emit a tick event.
    #[must_use]
    pub fn tick(mut self) -> Self {
        self.now += TICK_MS;
        self.events.push(FeedEvent::Tick(TickInput::new(
            self.now,
            self.puck,
            self.players.clone(),
        )));
        self
    }

    /// Emit `n` ticks.
    #[must_use]
    pub fn ticks(self, n: usize) -> Self {
        (0..n).fold(self, |b, _| b.tick())
    }

    /// Advance the clock without ticking.
    #[must_use]
    pub fn wait(mut self, ms: Millis) -> Self {
        self.now += ms;
        self
    }

    /// Stick begins touching the puck.
    #[must_use]
    pub fn enter(mut self, contact: StickContact) -> Self {
        self.events.push(FeedEvent::Contact {
            now: self.now,
            phase: ContactPhase::Enter,
            contact,
        });
        self
    }

    /// Stick stays on the puck.
    #[must_use]
    pub fn stay(mut self, contact: StickContact) -> Self {
        self.events.push(FeedEvent::Contact {
            now: self.now,
            phase: ContactPhase::Stay,
            contact,
        });
        self
    }

    /// Stick leaves the puck.
    #[must_use]
    pub fn exit(mut self, contact: StickContact) -> Self {
        self.events.push(FeedEvent::Contact {
            now: self.now,
            phase: ContactPhase::Exit,
            contact,
        });
        self
    }

    /// A complete touch lasting `hold_ms`, with a stay at the end.
    #[must_use]
    pub fn touch(self, contact: StickContact, hold_ms: Millis) -> Self {
        self.enter(contact).wait(hold_ms).stay(contact).exit(contact)
    }

    /// Goal trigger.
    #[must_use]
    pub fn goal(mut self, team: Team) -> Self {
        self.events.push(FeedEvent::GoalScored { now: self.now, team });
        self
    }

    /// Arbitrary event.
    #[must_use]
    pub fn event(mut self, event: FeedEvent) -> Self {
        self.events.push(event);
        self
    }

    /// The scripted events.
    #[must_use]
    pub fn build(self) -> Vec<FeedEvent> {
        self.events
    }

    /// The scripted events as a recording.
    #[must_use]
    pub fn into_recording(self, name: &str, config: RuleConfig) -> FeedRecording {
        let mut recording = FeedRecording::new(name, config);
        for event in self.events {
            recording.record(event);
        }
        recording
    }
}
