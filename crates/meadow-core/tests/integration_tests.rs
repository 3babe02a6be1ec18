//! Integration tests for the Meadow session engine.
//!
//! These tests drive complete sessions from setup through to the final score.

use meadow_core::*;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

/// Set RUST_LOG=meadow_core=debug to see per-turn detail
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn g() -> Edge {
    Edge::open(Terrain::Grass)
}

fn unit_scoring() -> ScoringConfig {
    ScoringConfig {
        exponent: 1.0,
        length_coefficient: 1.0,
        road_weight: 1.0,
        forest_weight: 1.0,
        deep_forest_bonus: 1.0,
        town_weight: 1.0,
        church_weight: 1.0,
        perfect_bonus: 1.0,
        rank_divisor: 1000.0,
    }
}

/// Start tile, a three-tile road, and a two-tile forest, in catalog order
fn small_deck() -> Catalog {
    let rd = Edge::dead_end(Terrain::Road);
    let r = Edge::open(Terrain::Road);
    let fd = Edge::dead_end(Terrain::Forest);
    Catalog::new(vec![
        TileDefinition::new(TileAttributes::START, [g(), g(), g(), g()]),
        TileDefinition::new(TileAttributes::NONE, [g(), g(), rd, g()]),
        TileDefinition::new(TileAttributes::NONE, [r, g(), r, g()]),
        TileDefinition::new(TileAttributes::NONE, [rd, g(), g(), g()]),
        TileDefinition::new(TileAttributes::NONE, [g(), g(), fd, g()]),
        TileDefinition::new(TileAttributes::NONE, [fd, g(), g(), g()]),
    ])
    .unwrap()
}

fn fixed(count: usize) -> SessionConfig {
    SessionConfig {
        force_tile_count: Some(count),
        shuffle: false,
        scoring: unit_scoring(),
        ..SessionConfig::default()
    }
}

fn seeded(seed: u64) -> SessionConfig {
    SessionConfig {
        seed: Some(seed),
        ..SessionConfig::default()
    }
}

/// Every same-terrain side of every tile in a completed feature is either a
/// dead end or leads to another tile of the feature.
fn assert_closed(session: &GameSession, feature: &FeatureCompletion) {
    let Some(terrain) = feature.kind.terrain() else {
        return;
    };
    for coord in &feature.coords {
        let placed = session.grid().tile_at(coord).unwrap();
        let edges = session
            .catalog()
            .rotated_edges(placed.tile, placed.rotation)
            .unwrap();
        for dir in Direction::ALL {
            let edge = edges[dir.index()];
            if edge.terrain == terrain && !edge.dead_end {
                assert!(
                    feature.coords.contains(&coord.neighbor(dir)),
                    "{:?} at {} leaks {:?}",
                    feature.kind,
                    coord,
                    dir
                );
            }
        }
    }
}

/// Play a whole game with a bot, checking every completion on the way
fn play_out(session: &mut GameSession, bot: &mut Bot) -> Vec<SessionEvent> {
    let mut all = session.begin_play().unwrap();
    let mut turns = 0;
    while session.is_playing() {
        let events = bot.play_turn(session).unwrap();
        for event in &events {
            if let SessionEvent::FeatureCompleted { feature } = event {
                assert_closed(session, feature);
            }
        }
        all.extend(events);
        turns += 1;
        assert!(turns <= session.catalog().len(), "game did not terminate");
    }
    all
}

#[test]
fn test_fixed_deck_perfect_game() {
    let mut session = create_session(fixed(5), small_deck(), false).unwrap();
    session.begin_play().unwrap();

    // Road hangs off the start tile's east side, forest off its west side
    let moves = [
        Coord::new(1, 0),
        Coord::new(1, -1),
        Coord::new(1, -2),
        Coord::new(-1, 0),
        Coord::new(-1, -1),
    ];
    let mut events = Vec::new();
    for coord in moves {
        events.extend(session.place_hand_tile(coord).unwrap());
    }

    let completed: Vec<&FeatureCompletion> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::FeatureCompleted { feature } => Some(feature),
            _ => None,
        })
        .collect();
    assert_eq!(completed.len(), 2);
    assert_eq!(completed[0].kind, FeatureKind::Road);
    assert_eq!(
        completed[0].coords,
        BTreeSet::from([Coord::new(1, 0), Coord::new(1, -1), Coord::new(1, -2)])
    );
    assert_eq!(completed[1].kind, FeatureKind::Forest);
    assert_eq!(completed[1].size(), 2);

    assert!(session.is_finished());
    let result = session.result().unwrap();
    assert!(result.perfect);
    assert_eq!(result.reason, FinishReason::DeckExhausted);
    // 3 road tiles + 2 forest tiles
    assert_eq!(result.total_score, 5);
    assert_eq!(result.rank, 1);
    assert_eq!(result.counters.roads, 1);
    assert_eq!(result.counters.road_length, 3);
    assert_eq!(result.counters.forests, 1);
}

#[test]
fn test_perfect_bonus_applies_only_at_the_end() {
    let config = SessionConfig {
        scoring: ScoringConfig {
            perfect_bonus: 2.0,
            ..unit_scoring()
        },
        ..fixed(5)
    };
    let mut session = create_session(config, small_deck(), false).unwrap();
    session.begin_play().unwrap();
    for coord in [Coord::new(1, 0), Coord::new(1, -1), Coord::new(1, -2)] {
        session.place_hand_tile(coord).unwrap();
    }
    assert_eq!(session.running_score(), 3);

    session.place_hand_tile(Coord::new(-1, 0)).unwrap();
    let events = session.place_hand_tile(Coord::new(-1, -1)).unwrap();
    assert!(events.contains(&SessionEvent::ScoreUpdated {
        total_score: 5,
        counters: session.counters(),
    }));
    assert_eq!(session.result().unwrap().total_score, 10);
}

#[test]
fn test_forced_tile_count_truncates_deck() {
    let mut session = create_session(fixed(2), small_deck(), false).unwrap();
    session.begin_play().unwrap();
    session.place_hand_tile(Coord::new(1, 0)).unwrap();
    let events = session.place_hand_tile(Coord::new(1, -1)).unwrap();

    assert!(session.is_finished());
    let result = session.result().unwrap();
    assert!(result.perfect);
    // The road is still open at its south end
    assert_eq!(result.total_score, 0);
    assert!(matches!(
        events.last(),
        Some(SessionEvent::PlayFinished { perfect: true, .. })
    ));
}

#[test]
fn test_two_caps_close_a_road() {
    let rd = Edge::dead_end(Terrain::Road);
    let catalog = Catalog::new(vec![
        TileDefinition::new(TileAttributes::START, [g(), g(), g(), g()]),
        TileDefinition::new(TileAttributes::NONE, [rd, rd, g(), g()]),
        TileDefinition::new(TileAttributes::NONE, [rd, rd, g(), g()]),
    ])
    .unwrap();
    let mut session = create_session(fixed(2), catalog, false).unwrap();
    session.begin_play().unwrap();

    // First cap east of the start, roads north and east
    session.place_hand_tile(Coord::new(1, 0)).unwrap();
    // Second cap turned a half turn sits above it: roads south and west
    session.rotate_hand_tile().unwrap();
    session.rotate_hand_tile().unwrap();
    let events = session.place_hand_tile(Coord::new(1, 1)).unwrap();

    let roads: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::FeatureCompleted { feature } if feature.kind == FeatureKind::Road => {
                Some(feature.size())
            }
            _ => None,
        })
        .collect();
    assert_eq!(roads, vec![2]);
}

#[test]
fn test_deck_jam_ends_game() {
    let water = Edge::open(Terrain::Water);
    let catalog = Catalog::new(vec![
        TileDefinition::new(TileAttributes::START, [g(), g(), g(), g()]),
        TileDefinition::new(TileAttributes::NONE, [g(), g(), g(), g()]),
        TileDefinition::new(TileAttributes::NONE, [water, water, water, water]),
    ])
    .unwrap();
    let mut session = create_session(fixed(2), catalog, false).unwrap();
    session.begin_play().unwrap();

    let events = session.place_hand_tile(Coord::new(0, 1)).unwrap();
    let result = session.result().unwrap();
    assert_eq!(result.reason, FinishReason::DeckJammed);
    assert!(!result.perfect);
    assert_eq!(session.deck(), &[2]);
    assert!(matches!(
        events.last(),
        Some(SessionEvent::PlayFinished {
            reason: FinishReason::DeckJammed,
            ..
        })
    ));
}

#[test]
fn test_unplaceable_tiles_are_skipped_in_order() {
    let water = Edge::open(Terrain::Water);
    let catalog = Catalog::new(vec![
        TileDefinition::new(TileAttributes::START, [g(), g(), g(), g()]),
        TileDefinition::new(TileAttributes::NONE, [water, water, water, water]),
        TileDefinition::new(TileAttributes::NONE, [g(), g(), g(), g()]),
        TileDefinition::new(TileAttributes::NONE, [g(), g(), g(), water]),
    ])
    .unwrap();
    let session = create_session(fixed(3), catalog, false).unwrap();
    assert_eq!(session.hand().map(|h| h.tile), Some(2));
    assert_eq!(session.deck(), &[1, 3]);
}

#[test]
fn test_time_runs_out_on_one_tick() {
    let config = SessionConfig {
        play_time: 0.05,
        ..seeded(9)
    };
    let mut session = create_session(config, Catalog::standard(), false).unwrap();
    session.begin_play().unwrap();
    assert!(!session.deck().is_empty());

    let events = session.tick(0.1);
    assert!(session.is_finished());
    assert_eq!(
        events,
        vec![SessionEvent::PlayFinished {
            total_score: 0,
            rank: 1,
            perfect: false,
            reason: FinishReason::TimeUp,
        }]
    );
}

#[test]
fn test_bot_games_on_standard_deck_finish() {
    init_tracing();
    for seed in 0..8 {
        let mut session = create_session(seeded(seed), Catalog::standard(), false).unwrap();
        let difficulty = if seed % 2 == 0 {
            BotDifficulty::Easy
        } else {
            BotDifficulty::Medium
        };
        let mut bot = Bot::with_seed(difficulty, seed);
        let events = play_out(&mut session, &mut bot);

        let result = session.result().unwrap().clone();
        assert!(matches!(
            events.last(),
            Some(SessionEvent::PlayFinished { .. })
        ));
        assert_eq!(result.perfect, result.reason == FinishReason::DeckExhausted);
        assert!(result.rank >= 1);

        // The final score is a pure function of the completion history
        let expected = score(
            session.history(),
            result.counters.towns as usize,
            result.perfect,
            &session.config().scoring,
        );
        assert_eq!(result.breakdown, expected);
        assert_eq!(result.rank, rank(expected.total, &session.config().scoring));

        // Running score never goes down
        let mut last = 0;
        for event in &events {
            if let SessionEvent::ScoreUpdated { total_score, .. } = event {
                assert!(*total_score >= last);
                last = *total_score;
            }
        }
    }
}

#[test]
fn test_same_seed_same_game() {
    let play = || {
        let mut session = create_session(seeded(42), Catalog::standard(), false).unwrap();
        let mut bot = Bot::with_seed(BotDifficulty::Easy, 42);
        play_out(&mut session, &mut bot);
        session.to_record()
    };
    assert_eq!(play(), play());
}

#[test]
fn test_save_and_resume_mid_game() {
    init_tracing();
    let mut session = create_session(seeded(3), Catalog::standard(), false).unwrap();
    let mut bot = Bot::with_seed(BotDifficulty::Medium, 3);
    session.begin_play().unwrap();
    for _ in 0..12 {
        if !session.is_playing() {
            break;
        }
        bot.play_turn(&mut session).unwrap();
    }
    session.tick(30.0);

    let json = session.to_record().to_json().unwrap();
    let record = SessionRecord::from_json(&json).unwrap();
    let mut restored =
        GameSession::from_record(seeded(3), Catalog::standard(), &record, false).unwrap();

    assert_eq!(restored.phase(), SessionPhase::NotStarted);
    assert_eq!(restored.running_score(), session.running_score());
    assert_eq!(restored.counters(), session.counters());
    assert_eq!(restored.remaining_time(), session.remaining_time());
    assert_eq!(restored.to_record(), session.to_record());

    if session.is_playing() {
        restored.begin_play().unwrap();
        let mut twin = Bot::with_seed(BotDifficulty::Medium, 99);
        let mut again = Bot::with_seed(BotDifficulty::Medium, 99);
        twin.play_turn(&mut session).unwrap();
        again.play_turn(&mut restored).unwrap();
        assert_eq!(restored.grid().len(), session.grid().len());
        assert_eq!(restored.running_score(), session.running_score());
    }
}

#[test]
fn test_commands_drive_session() {
    let mut session = create_session(fixed(5), small_deck(), false).unwrap();
    let commands = [
        SessionCommand::BeginPlay,
        SessionCommand::Tick(1.5),
        SessionCommand::MoveHandTile(Coord::new(1, 0)),
        SessionCommand::PlaceHandTile(Coord::new(1, 0)),
        SessionCommand::Abort,
    ];
    let mut events = Vec::new();
    for command in commands {
        events.extend(session.apply(command).unwrap());
    }
    assert_eq!(session.phase(), SessionPhase::Aborted);
    assert_eq!(events.last(), Some(&SessionEvent::PlayAborted));
    assert_eq!(session.elapsed_time(), 1.5);
    assert!(session.result().is_none());
}

#[test]
fn test_open_coordinates_stable_between_placements() {
    let mut session = create_session(seeded(1), Catalog::standard(), false).unwrap();
    let mut bot = Bot::with_seed(BotDifficulty::Easy, 1);
    session.begin_play().unwrap();
    for _ in 0..5 {
        bot.play_turn(&mut session).unwrap();
        assert_eq!(session.open_coordinates(), session.open_coordinates());
    }
}

#[test]
fn test_statistics_accumulate_finished_games() {
    let mut stats = PlayStats::new();
    for seed in 0..3 {
        let mut session = create_session(seeded(seed), Catalog::standard(), false).unwrap();
        let mut bot = Bot::with_seed(BotDifficulty::Medium, seed);
        play_out(&mut session, &mut bot);
        stats.record(session.result().unwrap());
    }
    assert_eq!(stats.games_played, 3);
    assert!(stats.best_rank >= 1);
    assert!(stats.average_score() <= stats.best_score as f64);
}
