//! Wave and spawn director
//!
//! Drives spawn cadence and composition, the kill-threshold to boss
//! transition, wave advancement (field regeneration, themes, timed events)
//! and ally arrivals.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::events::{AchievementId, DialogueLine, FlavorId, UiEventKind};
use super::geometry::{Body, Rect, toroidal_distance};
use super::state::{
    Ally, AllyBehavior, EnemyBullet, ExplosiveBarrel, GameState, Monster, MonsterKind, Obstacle,
    Pickup, PickupKind,
};
use super::weapon::ImpactEffect;
use crate::consts::*;
use crate::direction_from_angle;

pub const INITIAL_KILL_THRESHOLD: u32 = 10;
pub const OBSTACLE_COUNT: usize = 36;
pub const BARREL_COUNT: usize = 12;
pub const OBSTACLE_HEALTH: f32 = 200.0;
/// Regenerated obstacles keep this much room around the player
const FIELD_CLEARANCE: f32 = 150.0;
pub const BOSS_HEALTH_MULTIPLIER: f32 = 5.0;
pub const TIMED_EVENT_CHANCE: f32 = 0.3;
pub const FLAVOR_CHANCE: f32 = 0.3;
const METEOR_FALL_HEIGHT: f32 = 200.0;
const METEOR_SPEED: f32 = 8.0;
const METEOR_SCATTER: f32 = 250.0;
const METEOR_DAMAGE: f32 = 15.0;

/// Visual and compositional theme; rotates every five waves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThemeId {
    Crimson,
    Frost,
    Plague,
    Void,
}

impl ThemeId {
    const CYCLE: [ThemeId; 4] = [ThemeId::Crimson, ThemeId::Frost, ThemeId::Plague, ThemeId::Void];

    pub fn for_wave(wave: u32) -> Self {
        let index = (wave.saturating_sub(1) / 5) as usize % Self::CYCLE.len();
        Self::CYCLE[index]
    }

    /// Divides the spawn interval
    pub fn spawn_rate_multiplier(self) -> f64 {
        match self {
            ThemeId::Crimson => 1.0,
            ThemeId::Frost => 0.85,
            ThemeId::Plague => 1.15,
            ThemeId::Void => 1.25,
        }
    }

    pub fn weight_multiplier(self, kind: MonsterKind) -> f32 {
        let favored = match self {
            ThemeId::Crimson => matches!(kind, MonsterKind::Normal | MonsterKind::Elite),
            ThemeId::Frost => matches!(kind, MonsterKind::Shooter | MonsterKind::ShotgunShooter),
            ThemeId::Plague => matches!(
                kind,
                MonsterKind::Bloater | MonsterKind::Summoner | MonsterKind::Healer
            ),
            ThemeId::Void => matches!(kind, MonsterKind::Wisp | MonsterKind::LichGuard),
        };
        if favored { 1.5 } else { 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimedEventKind {
    MeteorShower,
    TreasureTrove,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub kind: TimedEventKind,
    pub started_at: f64,
    pub ends_at: f64,
    pub last_meteor_at: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveState {
    pub wave: u32,
    pub monsters_killed_this_wave: u32,
    pub monsters_to_kill_for_next_wave: u32,
    pub is_waiting_for_boss_clear: bool,
    pub is_boss_wave: bool,
    pub boss_defeated: bool,
    pub theme: ThemeId,
}

impl WaveState {
    pub fn new() -> Self {
        Self {
            wave: 1,
            monsters_killed_this_wave: 0,
            monsters_to_kill_for_next_wave: INITIAL_KILL_THRESHOLD,
            is_waiting_for_boss_clear: false,
            is_boss_wave: false,
            boss_defeated: false,
            theme: ThemeId::for_wave(1),
        }
    }

    /// Regular spawning is suspended from the kill threshold until the boss dies
    pub fn spawning_suspended(&self) -> bool {
        self.is_waiting_for_boss_clear || self.is_boss_wave
    }
}

impl Default for WaveState {
    fn default() -> Self {
        Self::new()
    }
}

/// Extra health granted from wave 2 onward
pub fn wave_health_bonus(wave: u32) -> f32 {
    if wave <= 1 {
        0.0
    } else {
        200.0 + (wave - 2) as f32 * 150.0
    }
}

/// Spawn health for a director-spawned monster
pub fn scaled_health(kind: MonsterKind, wave: u32, difficulty_modifier: f32) -> f32 {
    (kind.stats().health + wave as f32 * 15.0 + wave_health_bonus(wave)) * difficulty_modifier
}

/// Milliseconds between regular spawns; never below 200 whatever the theme
pub fn spawn_interval_ms(wave: u32, theme: ThemeId) -> f64 {
    ((3000.0 - wave as f64 * 100.0) / theme.spawn_rate_multiplier()).max(200.0)
}

pub fn max_live_monsters(wave: u32) -> usize {
    15 + wave as usize * 3
}

/// Threshold for the wave after one with `current`
pub fn next_kill_threshold(current: u32) -> u32 {
    (current as f32 * 1.2 + 5.0).floor() as u32
}

/// Archetype weights unlocked at `wave`, skewed by the theme
pub fn spawn_weights(wave: u32, theme: ThemeId) -> Vec<(MonsterKind, f32)> {
    let table: [(MonsterKind, u32, f32); 9] = [
        (MonsterKind::Normal, 1, 10.0),
        (MonsterKind::Shooter, 2, 4.0),
        (MonsterKind::Elite, 3, 2.0),
        (MonsterKind::ShotgunShooter, 3, 3.0),
        (MonsterKind::Healer, 4, 2.0),
        (MonsterKind::Bloater, 4, 3.0),
        (MonsterKind::Summoner, 5, 2.0),
        (MonsterKind::Wisp, 6, 2.0),
        (MonsterKind::LichGuard, 8, 2.0),
    ];
    table
        .iter()
        .filter(|(_, min_wave, _)| wave >= *min_wave)
        .map(|&(kind, _, weight)| (kind, weight * theme.weight_multiplier(kind)))
        .collect()
}

/// Random point at least `SPAWN_MIN_DISTANCE` from the player and off obstacles
///
/// After `SPAWN_PLACEMENT_ATTEMPTS` failures the last sample is accepted.
fn spawn_position(state: &mut GameState, size: Vec2) -> Vec2 {
    let player_center = state.player.center();
    let obstacles = state.obstacle_rects();
    let mut candidate = Vec2::ZERO;
    for _ in 0..SPAWN_PLACEMENT_ATTEMPTS {
        candidate = Vec2::new(
            state.rng.range(0.0, WORLD_WIDTH - size.x),
            state.rng.range(0.0, WORLD_HEIGHT - size.y),
        );
        let rect = Rect::new(candidate, size);
        let far = toroidal_distance(rect.center(), player_center) >= SPAWN_MIN_DISTANCE;
        if far && !obstacles.iter().any(|o| rect.intersects(o)) {
            return candidate;
        }
    }
    log::debug!("Spawn placement exhausted, accepting {candidate}");
    candidate
}

fn roll_empowerment(state: &mut GameState) -> u32 {
    let wave = state.wave.wave;
    if wave < 3 || !state.rng.chance((wave as f32 * 0.02).min(0.25)) {
        return 0;
    }
    if wave >= 8 && state.rng.chance(0.3) { 2 } else { 1 }
}

fn spawn_regular(state: &mut GameState, now: f64) {
    let wave = state.wave.wave;
    let weights = spawn_weights(wave, state.wave.theme);
    let Some(kind) = state.rng.weighted(&weights) else {
        return;
    };
    let size = Vec2::splat(kind.stats().size);
    let pos = spawn_position(state, size);
    let health = scaled_health(kind, wave, state.difficulty_modifier);
    let id = state.next_entity_id();
    let mut monster = Monster::new(id, kind, pos, health, now);
    monster.empower(roll_empowerment(state));
    state.monsters.push(monster);
}

fn spawn_boss(state: &mut GameState, now: f64) {
    let wave = state.wave.wave;
    let size = Vec2::splat(MonsterKind::Boss.stats().size);
    let pos = spawn_position(state, size);
    let health =
        scaled_health(MonsterKind::Boss, wave, state.difficulty_modifier) * BOSS_HEALTH_MULTIPLIER;
    let id = state.next_entity_id();
    state
        .monsters
        .push(Monster::new(id, MonsterKind::Boss, pos, health, now));
    state.wave.is_waiting_for_boss_clear = false;
    state.wave.is_boss_wave = true;
    log::info!("Boss {id} spawned for wave {wave} with {health:.0} hp");
    state.push_event(UiEventKind::BossSpawned { wave }, now);
}

/// Rebuild obstacles and barrels, keeping clear of live entities
pub fn regenerate_field(state: &mut GameState) {
    let mut keep_clear: Vec<Rect> = vec![Rect::around(state.player.center(), FIELD_CLEARANCE)];
    keep_clear.extend(state.allies.iter().map(Body::rect));
    keep_clear.extend(state.monsters.iter().filter(|m| !m.is_dying()).map(Body::rect));
    keep_clear.extend(state.pickups.iter().map(Body::rect));

    state.obstacles.clear();
    state.barrels.clear();

    for _ in 0..OBSTACLE_COUNT {
        let size = Vec2::new(state.rng.range(60.0, 180.0), state.rng.range(60.0, 180.0));
        if let Some(pos) = place_clear(state, size, &keep_clear) {
            let id = state.next_entity_id();
            keep_clear.push(Rect::new(pos, size));
            state.obstacles.push(Obstacle {
                id,
                pos,
                size,
                health: OBSTACLE_HEALTH,
                max_health: OBSTACLE_HEALTH,
            });
        }
    }

    let barrel_size = Vec2::splat(BARREL_SIZE);
    for _ in 0..BARREL_COUNT {
        if let Some(pos) = place_clear(state, barrel_size, &keep_clear) {
            let id = state.next_entity_id();
            keep_clear.push(Rect::new(pos, barrel_size));
            state.barrels.push(ExplosiveBarrel::new(id, pos));
        }
    }
    log::debug!(
        "Field regenerated: {} obstacles, {} barrels",
        state.obstacles.len(),
        state.barrels.len()
    );
}

fn place_clear(state: &mut GameState, size: Vec2, keep_clear: &[Rect]) -> Option<Vec2> {
    (0..SPAWN_PLACEMENT_ATTEMPTS).find_map(|_| {
        let pos = Vec2::new(
            state.rng.range(0.0, WORLD_WIDTH - size.x),
            state.rng.range(0.0, WORLD_HEIGHT - size.y),
        );
        let rect = Rect::new(pos, size);
        (!keep_clear.iter().any(|r| rect.intersects(r))).then_some(pos)
    })
}

/// Queue the wave announcement, sometimes with flavor text
pub fn announce_wave(state: &mut GameState, now: f64) {
    const FLAVORS: [FlavorId; 4] = [
        FlavorId::Ominous,
        FlavorId::Restless,
        FlavorId::Hungry,
        FlavorId::Silent,
    ];
    let flavor = if state.rng.chance(FLAVOR_CHANCE) {
        state.rng.pick(&FLAVORS).copied()
    } else {
        None
    };
    let wave = state.wave.wave;
    let theme = state.wave.theme;
    state.push_event(UiEventKind::WaveAnnouncement { wave, theme, flavor }, now);
}

/// Count a kill toward the wave; a boss kill flags the wave for advancing
pub fn record_kill(state: &mut GameState, kind: MonsterKind) {
    if kind.is_boss() {
        state.wave.boss_defeated = true;
    } else {
        state.wave.monsters_killed_this_wave += 1;
    }
}

fn advance_wave(state: &mut GameState, now: f64) {
    let threshold = next_kill_threshold(state.wave.monsters_to_kill_for_next_wave);
    let wave = state.wave.wave + 1;
    state.wave = WaveState {
        wave,
        monsters_killed_this_wave: 0,
        monsters_to_kill_for_next_wave: threshold,
        is_waiting_for_boss_clear: false,
        is_boss_wave: false,
        boss_defeated: false,
        theme: ThemeId::for_wave(wave),
    };
    state.last_spawn_at = now;
    log::info!(
        "Wave {wave} begins ({:?}), {threshold} kills to the boss",
        state.wave.theme
    );

    regenerate_field(state);
    announce_wave(state, now);

    if wave >= 5 {
        state.unlock(AchievementId::SurvivorWave5, now);
    }
    if wave >= 10 {
        state.unlock(AchievementId::SurvivorWave10, now);
    }

    if state.rng.chance(TIMED_EVENT_CHANCE) {
        let kind = if state.rng.chance(0.5) {
            TimedEventKind::MeteorShower
        } else {
            TimedEventKind::TreasureTrove
        };
        start_timed_event(state, kind, now);
    }
}

pub fn start_timed_event(state: &mut GameState, kind: TimedEventKind, now: f64) {
    state.timed_event = Some(TimedEvent {
        kind,
        started_at: now,
        ends_at: now + TIMED_EVENT_DURATION_MS,
        last_meteor_at: now,
    });
    log::info!("Timed event {kind:?} started");
    state.push_event(UiEventKind::TimedEventStarted(kind), now);

    if kind == TimedEventKind::TreasureTrove {
        let obstacles = state.obstacle_rects();
        for _ in 0..TREASURE_CHEST_COUNT {
            let size = Vec2::splat(36.0);
            let pos = super::geometry::find_safe_teleport_location(size, &obstacles, &mut state.rng);
            let id = state.next_entity_id();
            state
                .pickups
                .push(Pickup::new(id, pos + size / 2.0, PickupKind::Chest));
        }
    }
}

fn update_timed_event(state: &mut GameState, now: f64) {
    let Some(mut event) = state.timed_event else {
        return;
    };
    if now >= event.ends_at {
        log::info!("Timed event {:?} ended", event.kind);
        state.timed_event = None;
        return;
    }
    if event.kind == TimedEventKind::MeteorShower && now - event.last_meteor_at >= METEOR_INTERVAL_MS {
        event.last_meteor_at = now;
        let offset = direction_from_angle(state.rng.angle()) * state.rng.range(0.0, METEOR_SCATTER);
        let impact = state.player.center() + offset;
        let id = state.next_entity_id();
        let mut meteor = EnemyBullet::new(
            id,
            impact - Vec2::new(0.0, METEOR_FALL_HEIGHT),
            Vec2::new(0.0, METEOR_SPEED),
            METEOR_DAMAGE,
            now,
        );
        // Lands (and retires into a fire zone) at the impact point
        meteor.lifespan_ms = (METEOR_FALL_HEIGHT / METEOR_SPEED) as f64 * TICK_MS;
        meteor.on_impact = Some(ImpactEffect::fire(METEOR_DAMAGE / 3.0));
        state.enemy_bullets.push(meteor);
    }
    state.timed_event = Some(event);
}

fn maybe_summon_ally(state: &mut GameState, now: f64) {
    if state.wave.wave < 2
        || !state.allies.is_empty()
        || now - state.last_ally_at < ALLY_INTERVAL_MS
    {
        return;
    }
    let behavior = state
        .rng
        .pick(&AllyBehavior::ALL)
        .copied()
        .unwrap_or(AllyBehavior::ResoluteRecruit);
    let offset = direction_from_angle(state.rng.angle()) * 80.0;
    let id = state.next_entity_id();
    let mut ally = Ally::new(id, state.player.pos + offset, behavior, now);
    ally.dialogue = Some(DialogueLine::AllyArrives);
    state.allies.push(ally);
    state.last_ally_at = now;
    log::info!("Ally {id} ({behavior:?}) joined");
    state.push_event(
        UiEventKind::Dialogue {
            speaker: id,
            line: DialogueLine::AllyArrives,
        },
        now,
    );
}

/// One director pass: wave transitions, spawning, timed events, allies
pub fn run(state: &mut GameState, now: f64) {
    if state.wave.boss_defeated {
        advance_wave(state, now);
    }

    let wave = &state.wave;
    if !wave.spawning_suspended()
        && wave.monsters_killed_this_wave >= wave.monsters_to_kill_for_next_wave
    {
        state.wave.is_waiting_for_boss_clear = true;
        log::info!("Wave {} threshold reached, clearing for the boss", state.wave.wave);
    }

    if state.wave.is_waiting_for_boss_clear
        && !state.wave.is_boss_wave
        && state.live_non_boss_count() == 0
    {
        spawn_boss(state, now);
    }

    if !state.wave.spawning_suspended()
        && now - state.last_spawn_at >= spawn_interval_ms(state.wave.wave, state.wave.theme)
        && state.live_monster_count() < max_live_monsters(state.wave.wave)
    {
        spawn_regular(state, now);
        state.last_spawn_at = now;
    }

    update_timed_event(state, now);
    maybe_summon_ally(state, now);
}
