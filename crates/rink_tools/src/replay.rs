//! Replay a feed recording and report what the referee called.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use rink_core::prelude::*;
use rink_core::stats::PlayerStats;

use crate::error::{Result, ToolError};

/// Stat line of one player.
#[derive(Debug, Clone, Serialize)]
pub struct StatLine {
    /// Player id.
    pub player: PlayerId,
    /// Counters.
    pub stats: PlayerStats,
    /// Save percentage, for players who faced shots.
    pub save_percentage: Option<f32>,
}

/// Aggregate view of a replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    /// Recording label.
    pub name: String,
    /// Feed events replayed.
    pub feed_events: usize,
    /// Officiating events emitted.
    pub officiating_events: usize,
    /// `CallMade` count per call kind.
    pub calls_made: BTreeMap<String, usize>,
    /// Faceoff restarts requested.
    pub restarts: usize,
    /// Freeze penalties issued.
    pub penalties: usize,
    /// Goals that stood.
    pub goals_awarded: usize,
    /// Goals waved off.
    pub goals_disallowed: usize,
    /// Final engine state hash.
    pub final_hash: u64,
    /// Whether the final hash matched the recorded one. `None` if the
    /// recording was not finalized or a different config was used.
    pub verified: Option<bool>,
    /// Stat sheet.
    pub stats: Vec<StatLine>,
}

/// Everything a replay produced.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// Each officiating event with the index of the feed event behind it.
    pub events: Vec<(usize, OfficiatingEvent)>,
    /// Totals.
    pub summary: ReplaySummary,
}

/// Load and replay a recording, optionally under a different config.
///
/// # Errors
///
/// Fails if the recording or config cannot be loaded, the engine rejects an
/// event, or `require_match` is set and the final state differs from the
/// recorded one.
pub fn run_replay(recording: &Path, config: Option<&Path>, require_match: bool) -> Result<ReplayReport> {
    if !recording.exists() {
        return Err(ToolError::NotFound(recording.to_path_buf()));
    }
    let mut feed = FeedRecording::load(recording)?;
    let mut overridden = false;
    if let Some(path) = config {
        feed.config = RuleConfig::load(path)?;
        overridden = true;
        tracing::info!(config = %path.display(), "Replaying under a different config");
    }
    tracing::info!(name = %feed.name, events = feed.len(), "Replaying recording");

    let report = replay_recording(feed, overridden)?;
    if require_match && report.summary.verified == Some(false) {
        return Err(ToolError::Diverged);
    }
    Ok(report)
}

/// Replay an in-memory recording.
///
/// # Errors
///
/// Fails if the engine rejects an event.
pub fn replay_recording(feed: FeedRecording, config_overridden: bool) -> Result<ReplayReport> {
    let name = feed.name.clone();
    let feed_events = feed.len();
    let recorded_hash = feed.final_hash;

    let mut player = ReplayPlayer::new(feed);
    let mut events = Vec::new();
    while let Some(step) = player.step()? {
        events.extend(step.events.into_iter().map(|e| (step.index, e)));
    }

    let mut calls_made = BTreeMap::new();
    let (mut restarts, mut penalties, mut goals_awarded, mut goals_disallowed) = (0, 0, 0, 0);
    for (_, event) in &events {
        match event {
            OfficiatingEvent::CallMade { kind, .. } => {
                *calls_made.entry(kind.name().to_string()).or_insert(0) += 1;
            }
            OfficiatingEvent::FaceoffRestart { .. } => restarts += 1,
            OfficiatingEvent::PlayerPenalty { .. } => penalties += 1,
            OfficiatingEvent::GoalAwarded { .. } => goals_awarded += 1,
            OfficiatingEvent::GoalDisallowed { .. } => goals_disallowed += 1,
            _ => {}
        }
    }

    let engine = player.engine();
    let final_hash = engine.state_hash();
    let verified = if config_overridden {
        None
    } else {
        recorded_hash.map(|expected| expected == final_hash)
    };
    if verified == Some(false) {
        tracing::warn!(final_hash, ?recorded_hash, "Replay diverged from recording");
    }

    let stats = engine
        .stats()
        .iter()
        .map(|(player, stats)| StatLine {
            player,
            stats: *stats,
            save_percentage: stats.save_percentage(),
        })
        .collect();

    Ok(ReplayReport {
        summary: ReplaySummary {
            name,
            feed_events,
            officiating_events: events.len(),
            calls_made,
            restarts,
            penalties,
            goals_awarded,
            goals_disallowed,
            final_hash,
            verified,
            stats,
        },
        events,
    })
}

/// Print a human-readable report.
///
/// # Errors
///
/// Fails if writing to `out` fails.
pub fn write_text<W: Write>(report: &ReplayReport, out: &mut W) -> Result<()> {
    for (index, event) in &report.events {
        writeln!(out, "[{index:>6}] {}", describe(event))?;
    }

    let s = &report.summary;
    writeln!(out)?;
    writeln!(out, "Recording: {} ({} feed events)", s.name, s.feed_events)?;
    for (kind, count) in &s.calls_made {
        writeln!(out, "  {kind} calls: {count}")?;
    }
    writeln!(out, "  restarts: {}, penalties: {}", s.restarts, s.penalties)?;
    writeln!(
        out,
        "  goals: {} awarded, {} disallowed",
        s.goals_awarded, s.goals_disallowed
    )?;
    for line in &s.stats {
        let st = &line.stats;
        write!(
            out,
            "  #{:<4} G {} A {} TK {} TO {} SH {}",
            line.player, st.goals, st.assists, st.takeaways, st.turnovers, st.shots
        )?;
        match line.save_percentage {
            Some(pct) => writeln!(out, "  SV {} GA {} ({:.3})", st.saves, st.goals_against, pct)?,
            None => writeln!(out)?,
        }
    }
    match s.verified {
        Some(true) => writeln!(out, "Final state matches recording ({:016x})", s.final_hash)?,
        Some(false) => writeln!(out, "Final state DIFFERS from recording ({:016x})", s.final_hash)?,
        None => writeln!(out, "Final state {:016x}", s.final_hash)?,
    }
    Ok(())
}

/// Print the report as one JSON document.
///
/// # Errors
///
/// Fails if serialization or writing fails.
pub fn write_json<W: Write>(report: &ReplayReport, out: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

fn describe(event: &OfficiatingEvent) -> String {
    match event {
        OfficiatingEvent::CallMade { kind, team, snapshot } => format!(
            "{} called against {team} (puck in {:?})",
            kind.name(),
            snapshot.puck_zone
        ),
        OfficiatingEvent::CallCleared { kind, team, player } => match player {
            Some(player) => format!("{} cleared for {team} #{player}", kind.name()),
            None => format!("{} cleared for {team}", kind.name()),
        },
        OfficiatingEvent::FaceoffRestart { spot, kind, team, .. } => {
            format!("faceoff at {spot:?} after {} by {team}", kind.name())
        }
        OfficiatingEvent::ViolationCounted {
            player,
            count,
            threshold,
            ..
        } => format!("faceoff violation #{player} ({count}/{threshold})"),
        OfficiatingEvent::PlayerPenalty {
            handle,
            freeze_seconds,
            ..
        } => format!("#{} frozen for {freeze_seconds}s", handle.player),
        OfficiatingEvent::GoalAwarded {
            team,
            scorer,
            assists,
        } => format!("GOAL {team}: scorer {scorer:?}, assists {assists:?}"),
        OfficiatingEvent::GoalDisallowed { team, kind } => {
            format!("goal by {team} disallowed ({})", kind.name())
        }
    }
}
