use glam::Vec2;

use torus_arena::consts::*;
use torus_arena::persistence::MemoryStorage;
use torus_arena::sim::state::{AiState, BossMode, BossState};
use torus_arena::sim::Body;
use torus_arena::sim::{
    EnemyBullet, ExplosiveBarrel, GameState, Monster, MonsterKind, TickInput, ai, director, tick,
};
use torus_arena::{Session, Settings};

fn far_from_player(state: &GameState) -> Vec2 {
    state.player.pos + Vec2::new(900.0, 0.0)
}

#[test]
fn test_shield_absorbs_part_of_a_hit() {
    let mut state = GameState::empty(3);
    state.player.max_shield = 50.0;
    state.player.shield = 50.0;
    state.player.shield_absorption = 0.75;

    let id = state.next_entity_id();
    let center = state.player.center();
    state
        .enemy_bullets
        .push(EnemyBullet::new(id, center, Vec2::ZERO, 40.0, 0.0));
    tick(&mut state, &TickInput::default(), TICK_MS);

    assert!(state.enemy_bullets.is_empty());
    assert_eq!(state.player.shield, 10.0);
    assert_eq!(state.player.health, PLAYER_MAX_HEALTH - 10.0);
}

#[test]
fn test_barrel_chain_goes_off_one_tick_later() {
    let mut state = GameState::empty(3);
    let origin = far_from_player(&state);
    for offset in [0.0, 60.0] {
        let id = state.next_entity_id();
        state
            .barrels
            .push(ExplosiveBarrel::new(id, origin + Vec2::new(offset, 0.0)));
    }
    state.barrels[0].health = 0.0;

    tick(&mut state, &TickInput::default(), TICK_MS);
    assert_eq!(state.explosions.len(), 1);
    assert_eq!(state.barrels.len(), 1);

    tick(&mut state, &TickInput::default(), 2.0 * TICK_MS);
    assert_eq!(state.explosions.len(), 2);
    assert!(state.barrels.is_empty());
}

#[test]
fn test_spawning_stops_at_the_kill_threshold() {
    let mut state = GameState::empty(3);
    let id = state.next_entity_id();
    let pos = far_from_player(&state);
    state
        .monsters
        .push(Monster::new(id, MonsterKind::Normal, pos, 30.0, 0.0));
    let threshold = state.wave.monsters_to_kill_for_next_wave;
    assert_eq!(threshold, 10);

    // One kill short: regular spawning carries on
    state.wave.monsters_killed_this_wave = threshold - 1;
    director::run(&mut state, 10_000.0);
    assert!(!state.wave.is_waiting_for_boss_clear);
    assert_eq!(state.monsters.len(), 2);
    assert_eq!(state.last_spawn_at, 10_000.0);

    // The tenth kill starts the boss wait and nothing else spawns
    state.wave.monsters_killed_this_wave = threshold;
    director::run(&mut state, 20_000.0);
    assert!(state.wave.is_waiting_for_boss_clear);
    assert!(!state.wave.is_boss_wave);
    assert_eq!(state.monsters.len(), 2);
    assert_eq!(state.last_spawn_at, 10_000.0);
    assert!(state.monsters.iter().all(|m| m.kind != MonsterKind::Boss));
}

#[test]
fn test_boss_waits_for_the_field_to_clear() {
    let mut state = GameState::empty(3);
    let id = state.next_entity_id();
    let pos = far_from_player(&state);
    state
        .monsters
        .push(Monster::new(id, MonsterKind::Normal, pos, 30.0, 0.0));
    state.wave.monsters_killed_this_wave = state.wave.monsters_to_kill_for_next_wave;

    director::run(&mut state, 10_000.0);
    assert!(state.wave.is_waiting_for_boss_clear);
    assert!(!state.wave.is_boss_wave);
    // Regular spawning is suspended even though the interval has elapsed
    assert_eq!(state.monsters.len(), 1);

    state.monsters.clear();
    director::run(&mut state, 10_016.0);
    assert!(state.wave.is_boss_wave);
    assert!(!state.wave.is_waiting_for_boss_clear);
    assert_eq!(state.monsters.len(), 1);
    assert_eq!(state.monsters[0].kind, MonsterKind::Boss);
}

#[test]
fn test_boss_dash_halves_health_and_relocates() {
    let mut state = GameState::empty(3);
    let start = state.player.pos;
    let id = state.next_entity_id();
    let mut boss = Monster::new(id, MonsterKind::Boss, start - Vec2::splat(20.0), 5000.0, 0.0);
    let mut ai_state = BossState::new(0.0);
    ai_state.enter(BossMode::Dashing, 0.0);
    ai_state.dash_dir = Vec2::X;
    boss.ai = AiState::Boss(ai_state);
    state.monsters.push(boss);

    ai::update_monsters(&mut state, TICK_MS);

    assert_eq!(state.player.health, PLAYER_MAX_HEALTH / 2.0);
    assert_ne!(state.player.pos, start);
    assert_eq!(state.monsters[0].boss_phase(), Some(1));
    match state.monsters[0].ai {
        AiState::Boss(boss) => assert_eq!(boss.mode, BossMode::Hesitate),
        other => panic!("unexpected ai state {other:?}"),
    }
}

#[test]
fn test_boss_kill_advances_the_wave() {
    let mut state = GameState::empty(3);
    state.wave.is_boss_wave = true;
    state.wave.boss_defeated = true;
    director::run(&mut state, 5000.0);
    assert_eq!(state.wave.wave, 2);
    assert_eq!(state.wave.monsters_to_kill_for_next_wave, 17);
    assert!(!state.wave.is_boss_wave);
    assert!(!state.obstacles.is_empty());
}

fn play(seed: u64, ticks: usize) -> Session<MemoryStorage> {
    let mut session = Session::start_with(MemoryStorage::default(), seed, Settings::default());
    let input = TickInput {
        autopilot: true,
        ..TickInput::default()
    };
    let mut last_wave = session.state().wave.wave;
    for _ in 0..ticks {
        if session.state().is_leveling_up {
            session.choose_upgrade(0);
        }
        if !session.advance(&input) {
            break;
        }
        let state = session.state();
        assert!(state.wave.wave >= last_wave);
        assert!(state.player.health >= 0.0 && state.player.health <= state.player.max_health);
        assert!(state.player.shield >= 0.0 && state.player.shield <= state.player.max_shield);
        last_wave = state.wave.wave;
    }
    session
}

#[test]
fn test_autopilot_run_keeps_invariants() {
    let session = play(11, 3000);
    assert!(session.state().tick_count > 0);
}

#[test]
fn test_same_seed_replays_identically() {
    let a = serde_json::to_string(play(5, 1500).state()).unwrap();
    let b = serde_json::to_string(play(5, 1500).state()).unwrap();
    assert_eq!(a, b);

    let c = serde_json::to_string(play(6, 1500).state()).unwrap();
    assert_ne!(a, c);
}
