//! End-to-end officiating scenarios driven through scripted feeds.

use rink_core::prelude::*;
use rink_test_utils::fixtures::{
    contact, goalie, live_engine, live_engine_with, puck, raised_contact, run_feed, skater,
    FeedBuilder,
};

fn restart_handle(events: &RuleEvents) -> Option<RestartHandle> {
    events.iter().find_map(|e| match e {
        OfficiatingEvent::FaceoffRestart { handle, .. } => Some(*handle),
        _ => None,
    })
}

// =============================================================================
// Icing
// =============================================================================

#[test]
fn test_icing_called_then_cleared_by_defenseman() {
    let mut engine = live_engine();
    let shooter = contact(2, Team::Blue, PlayerRole::LeftDefense);
    let defender = contact(7, Team::Red, PlayerRole::RightDefense);

    let feed = FeedBuilder::new()
        .puck_at(puck(3.0, -25.0))
        .tick()
        .touch(shooter, 200)
        .puck_at(puck(3.0, 0.0))
        .tick()
        .puck_at(puck(3.0, 42.0))
        .tick()
        .build();
    let events = run_feed(&mut engine, &feed);
    assert_eq!(events.count_made(CallKind::Icing, Team::Blue), 1);
    assert!(engine.is_icing_active(Team::Blue));

    let feed = FeedBuilder::new()
        .wait(engine.now() + 200)
        .puck_at(puck(3.0, 38.0))
        .tick()
        .enter(defender)
        .build();
    let events = run_feed(&mut engine, &feed);
    assert_eq!(events.count_cleared(CallKind::Icing, Team::Blue), 1);
    assert_eq!(
        events.restarts().collect::<Vec<_>>(),
        vec![(FaceoffSpot::BlueDefensiveRight, CallKind::Icing, Team::Blue)]
    );
    assert!(!engine.is_icing_active(Team::Blue));
}

#[test]
fn test_icing_waved_off_by_goalie() {
    let mut engine = live_engine();
    let feed = FeedBuilder::new()
        .puck_at(puck(-3.0, -25.0))
        .tick()
        .touch(contact(2, Team::Blue, PlayerRole::Center), 200)
        .puck_at(puck(-3.0, 42.0))
        .tick()
        .enter(contact(12, Team::Red, PlayerRole::Goalie))
        .build();
    let events = run_feed(&mut engine, &feed);

    assert_eq!(events.count_made(CallKind::Icing, Team::Blue), 1);
    assert_eq!(events.count_cleared(CallKind::Icing, Team::Blue), 1);
    assert_eq!(events.restarts().count(), 0);
}

#[test]
fn test_no_icing_from_attacking_half() {
    let mut engine = live_engine();
    let feed = FeedBuilder::new()
        .puck_at(puck(0.0, 5.0))
        .tick()
        .touch(contact(2, Team::Blue, PlayerRole::Center), 200)
        .puck_at(puck(0.0, 42.0))
        .tick()
        .build();
    let events = run_feed(&mut engine, &feed);

    assert_eq!(events.count_made(CallKind::Icing, Team::Blue), 0);
    assert!(!engine.is_icing_possible(Team::Blue));
}

// =============================================================================
// Possession and offside
// =============================================================================

#[test]
fn test_contested_possession_does_not_exempt_offside() {
    let mut engine = live_engine();
    let blue = contact(1, Team::Blue, PlayerRole::Center);
    let red = contact(6, Team::Red, PlayerRole::Center);

    let feed = FeedBuilder::new()
        .player(skater(1, Team::Blue, PlayerRole::Center, 0.0, 1.0))
        .player(skater(6, Team::Red, PlayerRole::Center, 0.0, 2.0))
        .player(skater(3, Team::Blue, PlayerRole::RightWing, 5.0, 25.0))
        .puck_at(puck(0.0, 1.5))
        .enter(blue)
        .enter(red)
        .wait(400)
        .stay(blue)
        .stay(red)
        .tick()
        .build();
    let events = run_feed(&mut engine, &feed);

    assert_eq!(engine.player_in_possession(), None);
    assert!(engine.is_offside(3));
    assert_eq!(events.count_made(CallKind::Offside, Team::Blue), 1);
}

#[test]
fn test_three_way_battle_resolves_to_nobody() {
    let mut engine = live_engine();
    let players = [
        contact(1, Team::Blue, PlayerRole::Center),
        contact(2, Team::Blue, PlayerRole::LeftWing),
        contact(6, Team::Red, PlayerRole::Center),
    ];

    let mut builder = FeedBuilder::new();
    for c in players {
        builder = builder.enter(c);
    }
    builder = builder.wait(400);
    for c in players {
        builder = builder.stay(c);
    }
    run_feed(&mut engine, &builder.tick().build());
    assert_eq!(engine.player_in_possession(), None);

    let mut solo = live_engine();
    let c = contact(1, Team::Blue, PlayerRole::Center);
    run_feed(&mut solo, &FeedBuilder::new().enter(c).wait(400).stay(c).tick().build());
    assert_eq!(solo.player_in_possession(), Some(1));
}

#[test]
fn test_puck_carrier_crossing_line_is_not_offside() {
    let mut engine = live_engine();
    let carrier = contact(3, Team::Blue, PlayerRole::Center);

    let feed = FeedBuilder::new()
        .player(skater(3, Team::Blue, PlayerRole::Center, 0.0, 8.0))
        .puck_at(puck(0.0, 8.5))
        .tick()
        .enter(carrier)
        .wait(400)
        .stay(carrier)
        .move_player(3, 0.0, 13.5)
        .puck_at(puck(0.0, 12.0))
        .tick()
        .build();
    let events = run_feed(&mut engine, &feed);

    assert_eq!(engine.player_zone(3), Some(Zone::RedZone));
    assert_eq!(engine.puck_zone(), Zone::RedCenter);
    assert!(!engine.is_offside(3));
    assert_eq!(events.count_made(CallKind::Offside, Team::Blue), 0);
}

#[test]
fn test_offside_cleared_once_on_exit() {
    let mut engine = live_engine();
    let feed = FeedBuilder::new()
        .player(skater(3, Team::Blue, PlayerRole::RightWing, 5.0, 25.0))
        .puck_at(puck(0.0, -5.0))
        .ticks(3)
        .move_player(3, 5.0, 5.0)
        .ticks(3)
        .build();
    let events = run_feed(&mut engine, &feed);

    assert_eq!(events.count_made(CallKind::Offside, Team::Blue), 1);
    assert_eq!(events.count_cleared(CallKind::Offside, Team::Blue), 1);
    assert!(!engine.is_offside(3));
}

#[test]
fn test_offside_stays_flagged_when_puck_follows() {
    let mut engine = live_engine();
    let feed = FeedBuilder::new()
        .player(skater(3, Team::Blue, PlayerRole::RightWing, 5.0, 25.0))
        .puck_at(puck(0.0, -5.0))
        .tick()
        .puck_at(puck(0.0, 20.0))
        .ticks(3)
        .build();
    let events = run_feed(&mut engine, &feed);

    assert!(engine.is_offside(3));
    assert_eq!(events.count_made(CallKind::Offside, Team::Blue), 1);
    assert_eq!(events.count_cleared(CallKind::Offside, Team::Blue), 0);
}

#[test]
fn test_offside_enforced_when_team_plays_puck_in_zone() {
    let mut engine = live_engine();
    let feed = FeedBuilder::new()
        .player(skater(3, Team::Blue, PlayerRole::RightWing, 5.0, 25.0))
        .puck_at(puck(-2.0, 5.0))
        .tick()
        .puck_at(puck(-2.0, 20.0))
        .tick()
        .enter(contact(4, Team::Blue, PlayerRole::LeftWing))
        .build();
    let events = run_feed(&mut engine, &feed);

    assert_eq!(
        events.restarts().collect::<Vec<_>>(),
        vec![(FaceoffSpot::RedBluelineLeft, CallKind::Offside, Team::Blue)]
    );
}

#[test]
fn test_clean_entry_clears_trailing_opponents() {
    let mut engine = live_engine();
    let carrier = contact(2, Team::Blue, PlayerRole::Center);

    let feed = FeedBuilder::new()
        .player(skater(7, Team::Red, PlayerRole::LeftWing, 0.0, -25.0))
        .puck_at(puck(0.0, 5.0))
        .tick()
        .build();
    let events = run_feed(&mut engine, &feed);
    assert_eq!(events.count_made(CallKind::Offside, Team::Red), 1);

    let feed = FeedBuilder::new()
        .wait(engine.now())
        .player(skater(7, Team::Red, PlayerRole::LeftWing, 0.0, -25.0))
        .enter(carrier)
        .wait(400)
        .stay(carrier)
        .puck_at(puck(0.0, 12.0))
        .tick()
        .puck_at(puck(0.0, 16.0))
        .tick()
        .ticks(3)
        .build();
    let events = run_feed(&mut engine, &feed);

    assert_eq!(events.count_cleared(CallKind::Offside, Team::Red), 1);
    assert_eq!(events.count_made(CallKind::Offside, Team::Red), 0);
    assert!(!engine.is_offside(7));
}

#[test]
fn test_goalie_never_offside() {
    let mut engine = live_engine();
    let mut wandering = goalie(11, Team::Blue);
    wandering.position = Vec3::new(0.0, 0.0, 25.0);
    let feed = FeedBuilder::new()
        .player(wandering)
        .puck_at(puck(0.0, -5.0))
        .ticks(2)
        .build();
    let events = run_feed(&mut engine, &feed);
    assert!(events.is_empty());
}

#[test]
fn test_offside_disabled_for_team() {
    let mut config = RuleConfig::default();
    config.blue.offside = false;
    let mut engine = live_engine_with(config);
    let feed = FeedBuilder::new()
        .player(skater(3, Team::Blue, PlayerRole::RightWing, 5.0, 25.0))
        .puck_at(puck(0.0, -5.0))
        .ticks(2)
        .build();
    run_feed(&mut engine, &feed);
    assert!(!engine.is_offside(3));
}

#[test]
fn test_stay_without_enter_takes_puck_away() {
    let mut engine = live_engine();
    let blue = contact(1, Team::Blue, PlayerRole::Center);
    let red = contact(5, Team::Red, PlayerRole::Center);

    let feed = FeedBuilder::new()
        .touch(blue, 300)
        .wait(200)
        .stay(red)
        .build();
    run_feed(&mut engine, &feed);

    assert_eq!(engine.player_stats(5).takeaways, 1);
    assert_eq!(engine.player_stats(1).turnovers, 1);
    assert!(engine.buffer().recent_touchers(Team::Blue).is_empty());
    assert!(engine.possession().touch_state(5).is_some_and(|s| s.in_contact));
}

#[test]
fn test_stay_through_faceoff_reset_is_a_violation() {
    let mut engine = live_engine();
    let center = contact(1, Team::Blue, PlayerRole::Center);
    let feed = FeedBuilder::new()
        .wait(engine.now())
        .enter(center)
        .phase(GamePhase::FaceOff)
        .puck_at(Vec3::new(0.0, 1.5, 0.0))
        .tick()
        .stay(center)
        .build();
    let events = run_feed(&mut engine, &feed);

    assert_eq!(events.count_made(CallKind::FaceoffViolation, Team::Blue), 1);
    assert_eq!(engine.violation_count(1), 1);
}

// =============================================================================
// High stick
// =============================================================================

#[test]
fn test_high_stick_voided_by_opposing_touch() {
    let mut engine = live_engine();
    let feed = FeedBuilder::new()
        .puck_at(Vec3::new(0.0, 2.2, 20.0))
        .tick()
        .enter(raised_contact(4, Team::Blue, PlayerRole::LeftWing, 2.2))
        .enter(contact(8, Team::Red, PlayerRole::LeftDefense))
        .puck_at(puck(0.0, 20.0))
        .tick()
        .build();
    let events = run_feed(&mut engine, &feed);

    assert_eq!(events.count_made(CallKind::HighStick, Team::Blue), 1);
    assert_eq!(events.count_cleared(CallKind::HighStick, Team::Blue), 1);
    assert_eq!(events.restarts().count(), 0);
}

// =============================================================================
// Goals
// =============================================================================

#[test]
fn test_goal_disallowed_while_offside() {
    let mut engine = live_engine();
    let feed = FeedBuilder::new()
        .player(skater(3, Team::Blue, PlayerRole::RightWing, 5.0, 25.0))
        .puck_at(puck(-2.0, 5.0))
        .tick()
        .build();
    run_feed(&mut engine, &feed);

    let ruling = engine.on_goal_scored(engine.now(), Team::Blue).unwrap();
    assert!(!ruling.allowed);
    assert!(ruling.events.iter().any(|e| matches!(
        e,
        OfficiatingEvent::GoalDisallowed {
            team: Team::Blue,
            kind: CallKind::Offside
        }
    )));
    assert_eq!(
        ruling.events.restarts().collect::<Vec<_>>(),
        vec![(FaceoffSpot::RedBluelineLeft, CallKind::Offside, Team::Blue)]
    );
}

#[test]
fn test_goal_without_goalie_skips_goals_against() {
    let mut engine = live_engine();
    let c = contact(1, Team::Red, PlayerRole::Center);
    run_feed(&mut engine, &FeedBuilder::new().touch(c, 200).build());

    let ruling = engine.on_goal_scored(engine.now(), Team::Red).unwrap();
    assert!(ruling.allowed);
    assert_eq!(engine.player_stats(1).goals, 1);
    assert!(engine.stats().iter().all(|(_, s)| s.goals_against == 0));
}

#[test]
fn test_goalie_save_counts_shot() {
    let mut engine = live_engine();
    let shooter = contact(1, Team::Blue, PlayerRole::Center);
    let feed = FeedBuilder::new()
        .player(goalie(12, Team::Red))
        .puck_at(puck(0.0, 30.0))
        .tick()
        .touch(shooter, 400)
        .puck_at(puck(0.0, 37.0))
        .tick()
        .enter(contact(12, Team::Red, PlayerRole::Goalie))
        .build();
    run_feed(&mut engine, &feed);

    assert_eq!(engine.player_stats(12).saves, 1);
    assert_eq!(engine.player_stats(1).shots, 1);
}

#[test]
fn test_goal_refused_while_restart_pending() {
    let mut engine = live_engine();
    let feed = FeedBuilder::new()
        .player(goalie(12, Team::Red))
        .puck_at(Vec3::new(2.0, 3.0, 20.0))
        .tick()
        .enter(raised_contact(4, Team::Blue, PlayerRole::LeftWing, 3.0))
        .puck_at(puck(2.0, 20.0))
        .tick()
        .build();
    let events = run_feed(&mut engine, &feed);
    assert_eq!(
        events.restarts().collect::<Vec<_>>(),
        vec![(FaceoffSpot::RedBluelineRight, CallKind::HighStick, Team::Blue)]
    );
    let pending = engine.restart_pending().unwrap();

    let ruling = engine.on_goal_scored(engine.now() + 50, Team::Blue).unwrap();
    assert!(!ruling.allowed);
    assert_eq!(
        ruling.events.iter().collect::<Vec<_>>(),
        vec![&OfficiatingEvent::GoalDisallowed {
            team: Team::Blue,
            kind: CallKind::HighStick
        }]
    );
    assert_eq!(engine.restart_pending(), Some(pending));
    assert_eq!(engine.player_stats(4).goals, 0);
    assert_eq!(engine.player_stats(12).goals_against, 0);
}

// =============================================================================
// Faceoff violations
// =============================================================================

fn faceoff_drill(gap_ms: Millis, config: RuleConfig) -> (RuleEngine, RuleEvents) {
    let mut engine = RuleEngine::new(config);
    let center = contact(1, Team::Blue, PlayerRole::Center);
    let feed = FeedBuilder::new()
        .phase(GamePhase::FaceOff)
        .puck_at(Vec3::new(0.0, 1.5, 0.0))
        .tick()
        .enter(center)
        .wait(gap_ms)
        .phase(GamePhase::FaceOff)
        .tick()
        .enter(center)
        .build();
    let events = run_feed(&mut engine, &feed);
    (engine, events)
}

#[test]
fn test_second_violation_within_window_penalizes() {
    let (engine, events) = faceoff_drill(4_000, RuleConfig::default());

    let penalties: Vec<_> = events.penalties().collect();
    assert_eq!(penalties.len(), 1);
    assert_eq!(penalties[0].player, 1);
    assert!(engine.is_penalized(1));
    assert_eq!(engine.violation_count(1), 0);
    assert_eq!(
        events.restarts().collect::<Vec<_>>(),
        vec![
            (FaceoffSpot::Center, CallKind::FaceoffViolation, Team::Blue),
            (FaceoffSpot::Center, CallKind::FaceoffViolation, Team::Blue),
        ]
    );
}

#[test]
fn test_violations_far_apart_do_not_accumulate() {
    let (engine, events) = faceoff_drill(11_000, RuleConfig::default());

    assert_eq!(events.penalties().count(), 0);
    assert_eq!(engine.violation_count(1), 1);
    let counts: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            OfficiatingEvent::ViolationCounted { count, .. } => Some(*count),
            _ => None,
        })
        .collect();
    assert_eq!(counts, vec![1, 1]);
}

#[test]
fn test_violation_restarts_at_last_spot() {
    let mut engine = live_engine();
    let feed = FeedBuilder::new()
        .puck_at(Vec3::new(0.0, 2.5, 20.0))
        .tick()
        .enter(raised_contact(4, Team::Red, PlayerRole::LeftWing, 2.5))
        .puck_at(puck(-1.0, 20.0))
        .tick()
        .build();
    let events = run_feed(&mut engine, &feed);
    let handle = restart_handle(&events).unwrap();
    assert!(engine.complete_restart(handle).unwrap());
    assert_eq!(engine.next_faceoff_spot(), FaceoffSpot::RedDefensiveRight);

    let feed = FeedBuilder::new()
        .wait(engine.now())
        .phase(GamePhase::FaceOff)
        .puck_at(Vec3::new(9.5, 1.5, 31.5))
        .tick()
        .enter(contact(6, Team::Red, PlayerRole::Center))
        .build();
    let events = run_feed(&mut engine, &feed);
    assert_eq!(
        events.restarts().collect::<Vec<_>>(),
        vec![(FaceoffSpot::RedDefensiveRight, CallKind::FaceoffViolation, Team::Red)]
    );
}

#[test]
fn test_legal_drop_no_violation() {
    let mut engine = RuleEngine::default();
    let feed = FeedBuilder::new()
        .phase(GamePhase::FaceOff)
        .puck_at(Vec3::new(0.0, 1.5, 0.0))
        .tick()
        .puck_at(Vec3::new(0.0, 0.8, 0.0))
        .tick()
        .puck_at(Vec3::new(0.0, 0.0, 0.0))
        .tick()
        .phase(GamePhase::Playing)
        .enter(contact(1, Team::Blue, PlayerRole::Center))
        .build();
    let events = run_feed(&mut engine, &feed);
    assert!(events.is_empty());
    assert_eq!(engine.faceoff_stage(), FaceoffStage::Valid);
}

#[test]
fn test_winger_early_touch_not_penalized() {
    let mut engine = RuleEngine::default();
    let feed = FeedBuilder::new()
        .phase(GamePhase::FaceOff)
        .puck_at(Vec3::new(0.0, 1.5, 0.0))
        .tick()
        .enter(contact(2, Team::Blue, PlayerRole::LeftWing))
        .build();
    let events = run_feed(&mut engine, &feed);
    assert!(events.is_empty());
}

// =============================================================================
// Penalties and phases
// =============================================================================

#[test]
fn test_penalty_completion_and_stale_handles() {
    let (mut engine, events) = faceoff_drill(1_000, RuleConfig::default());
    let handle = events.penalties().next().unwrap();

    run_feed(
        &mut engine,
        &FeedBuilder::new().phase(GamePhase::FaceOff).phase(GamePhase::Playing).build(),
    );
    assert!(engine.is_penalized(1), "penalty survives a faceoff reset");

    assert!(engine.complete_penalty(handle).unwrap());
    assert!(!engine.is_penalized(1));
    assert!(!engine.complete_penalty(handle).unwrap());
}

#[test]
fn test_period_over_drops_penalties_and_counters() {
    let (mut engine, events) = faceoff_drill(1_000, RuleConfig::default());
    let handle = events.penalties().next().unwrap();

    engine
        .on_phase_changed(GamePhase::FaceOff, GamePhase::PeriodOver)
        .unwrap();
    assert!(!engine.is_penalized(1));
    assert!(!engine.complete_penalty(handle).unwrap());
    assert_eq!(engine.faceoff_stage(), FaceoffStage::Idle);
}

#[test]
fn test_calls_balanced_after_phase_reset() {
    let mut engine = live_engine();
    let feed = FeedBuilder::new()
        .player(skater(3, Team::Blue, PlayerRole::RightWing, 5.0, 25.0))
        .puck_at(Vec3::new(0.0, 2.5, -20.0))
        .tick()
        .enter(raised_contact(7, Team::Red, PlayerRole::LeftWing, 2.5))
        .phase(GamePhase::FaceOff)
        .build();
    let events = run_feed(&mut engine, &feed);

    for kind in [CallKind::Offside, CallKind::HighStick] {
        for team in Team::PLAYING {
            assert_eq!(events.count_made(kind, team), events.count_cleared(kind, team));
        }
    }
}

#[test]
fn test_shared_engine_from_threads() {
    let shared = SharedRuleEngine::new(live_engine());
    std::thread::scope(|s| {
        for id in 1..=4u64 {
            let shared = shared.clone();
            s.spawn(move || {
                let c = contact(id, Team::Blue, PlayerRole::LeftWing);
                shared.on_stick_contact(100, ContactPhase::Enter, &c).unwrap();
                shared.on_stick_contact(300, ContactPhase::Exit, &c).unwrap();
            });
        }
    });
    let touchers = shared.with(|e| e.buffer().recent_touchers(Team::Blue)).unwrap();
    assert_eq!(touchers.len(), 4);
}

// =============================================================================
// Stoppages
// =============================================================================

#[test]
fn test_stoppage_makes_no_new_calls() {
    let mut engine = live_engine();
    let feed = FeedBuilder::new()
        .puck_at(Vec3::new(2.0, 3.0, 20.0))
        .tick()
        .enter(raised_contact(4, Team::Blue, PlayerRole::LeftWing, 3.0))
        .puck_at(puck(2.0, 20.0))
        .tick()
        .build();
    let events = run_feed(&mut engine, &feed);
    let handle = restart_handle(&events).unwrap();

    let stoppage = FeedBuilder::new()
        .wait(engine.now() + 200)
        .player(skater(3, Team::Blue, PlayerRole::RightWing, 5.0, 25.0))
        .puck_at(puck(0.0, -5.0))
        .ticks(2)
        .enter(raised_contact(8, Team::Red, PlayerRole::LeftWing, 3.0))
        .ticks(2)
        .build();
    let events = run_feed(&mut engine, &stoppage);
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, OfficiatingEvent::CallMade { .. })),
        "calls during a stoppage: {events:?}"
    );
    assert!(!engine.is_offside(3));
    assert!(!engine.is_high_stick_active(Team::Red));

    assert!(engine.complete_restart(handle).unwrap());
    let resumed = FeedBuilder::new()
        .wait(engine.now() + 200)
        .player(skater(3, Team::Blue, PlayerRole::RightWing, 5.0, 25.0))
        .puck_at(puck(0.0, -5.0))
        .ticks(2)
        .build();
    let events = run_feed(&mut engine, &resumed);
    assert_eq!(events.count_made(CallKind::Offside, Team::Blue), 1);
}
