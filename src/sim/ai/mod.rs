//! Monster AI dispatch
//!
//! `MonsterKind::behavior` maps every archetype onto one `Behavior`, and a
//! single exhaustive match routes the monster to its handler. Handlers mutate
//! only their own monster; everything they create or affect elsewhere goes
//! into an `AiOutput` that is applied after the pass.

pub mod ally;
pub mod boss;
pub mod pursuit;
pub mod ranged;
pub mod support;
pub mod wisp;

use glam::Vec2;

use super::events::{DialogueLine, UiEventKind};
use super::geometry::{
    Body, Rect, find_safe_teleport_location, sliding_move, toroidal_distance, wrap_around,
};
use super::rng::SimRng;
use super::state::{
    EffectKind, EnemyBullet, EntityId, ExplosiveBarrel, GameState, HomingEnemyBullet, IdAllocator,
    Monster, MonsterKind,
};

/// Cooldown between shooter volleys
pub const SHOOTER_COOLDOWN_MS: f64 = 2000.0;
pub const SHOTGUN_COOLDOWN_MS: f64 = 1500.0;

/// Handler selected for an archetype
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behavior {
    Pursue,
    Kite { cooldown_ms: f64 },
    Heal,
    Summon,
    Wisp,
    Boss,
}

impl MonsterKind {
    pub fn behavior(self) -> Behavior {
        match self {
            MonsterKind::Normal
            | MonsterKind::Elite
            | MonsterKind::Minion
            | MonsterKind::Bloater
            | MonsterKind::LichGuard => Behavior::Pursue,
            MonsterKind::Shooter => Behavior::Kite {
                cooldown_ms: SHOOTER_COOLDOWN_MS,
            },
            MonsterKind::ShotgunShooter => Behavior::Kite {
                cooldown_ms: SHOTGUN_COOLDOWN_MS,
            },
            MonsterKind::Healer => Behavior::Heal,
            MonsterKind::Summoner => Behavior::Summon,
            MonsterKind::Wisp => Behavior::Wisp,
            MonsterKind::Boss => Behavior::Boss,
        }
    }
}

/// Something monsters chase (the player or an ally)
#[derive(Debug, Clone, Copy)]
pub struct Target {
    pub id: EntityId,
    pub center: Vec2,
}

/// Read-only snapshot of a monster for handlers that look at their peers
#[derive(Debug, Clone, Copy)]
pub struct MonsterView {
    pub id: EntityId,
    pub center: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub dying: bool,
}

/// World as seen by the AI during one pass
pub struct AiContext<'a> {
    pub now: f64,
    pub wave: u32,
    pub difficulty_modifier: f32,
    pub player: Target,
    pub player_rect: Rect,
    /// Player first, then live allies
    pub targets: &'a [Target],
    pub obstacles: &'a [Rect],
    pub monsters: &'a [MonsterView],
}

/// Side effects requested by handlers
#[derive(Debug, Default)]
pub struct AiOutput {
    pub enemy_bullets: Vec<EnemyBullet>,
    pub homing_bullets: Vec<HomingEnemyBullet>,
    pub monsters: Vec<Monster>,
    pub barrels: Vec<ExplosiveBarrel>,
    pub heals: Vec<(EntityId, f32)>,
    pub effects: Vec<(EffectKind, Vec2, f64)>,
    pub dialogue: Vec<(EntityId, DialogueLine)>,
    /// A dashing boss struck the player this tick
    pub dash_hit: bool,
}

/// Spawn-time health for monsters created by other monsters
///
/// Same scaling as director spawns but without the per-wave bonus, so
/// summoned swarms stay killable.
pub fn summoned_health(kind: MonsterKind, ctx: &AiContext<'_>) -> f32 {
    (kind.stats().health + ctx.wave as f32 * 15.0) * ctx.difficulty_modifier
}

/// Nearest chase target by toroidal distance
pub fn nearest_target<'a>(from: Vec2, targets: &'a [Target]) -> Option<&'a Target> {
    targets.iter().min_by(|a, b| {
        toroidal_distance(from, a.center).total_cmp(&toroidal_distance(from, b.center))
    })
}

/// Slide the monster along `dir` at its current (possibly slowed) speed
pub fn step(monster: &mut Monster, dir: Vec2, speed_scale: f32, ctx: &AiContext<'_>) {
    let speed = monster.effective_speed(ctx.now) * speed_scale;
    monster.pos = sliding_move(monster.rect(), dir.normalize_or_zero(), speed, ctx.obstacles);
}

fn dispatch(
    monster: &mut Monster,
    ctx: &AiContext<'_>,
    rng: &mut SimRng,
    ids: &mut IdAllocator,
    out: &mut AiOutput,
) {
    match monster.kind.behavior() {
        Behavior::Pursue => pursuit::pursue(monster, ctx),
        Behavior::Kite { cooldown_ms } => ranged::kite(monster, ctx, cooldown_ms, ids, out),
        Behavior::Heal => support::heal(monster, ctx, out),
        Behavior::Summon => support::summon(monster, ctx, ids, out),
        Behavior::Wisp => wisp::update(monster, ctx, rng, ids, out),
        Behavior::Boss => boss::update(monster, ctx, rng, ids, out),
    }
}

/// Run every non-dying monster's handler, then apply the collected output
pub fn update_monsters(state: &mut GameState, now: f64) {
    let obstacles = state.obstacle_rects();
    let player = Target {
        id: state.player.id,
        center: state.player.center(),
    };
    let mut targets = vec![player];
    targets.extend(
        state
            .allies
            .iter()
            .filter(|a| !a.is_gone(now))
            .map(|a| Target {
                id: a.id,
                center: a.center(),
            }),
    );
    let views: Vec<MonsterView> = state
        .monsters
        .iter()
        .map(|m| MonsterView {
            id: m.id,
            center: m.center(),
            health: m.health,
            max_health: m.max_health,
            dying: m.is_dying(),
        })
        .collect();

    let ctx = AiContext {
        now,
        wave: state.wave.wave,
        difficulty_modifier: state.difficulty_modifier,
        player,
        player_rect: state.player.rect(),
        targets: &targets,
        obstacles: &obstacles,
        monsters: &views,
    };

    let mut out = AiOutput::default();
    let GameState {
        monsters, rng, ids, ..
    } = state;
    for monster in monsters.iter_mut() {
        if monster.is_dying() {
            continue;
        }
        dispatch(monster, &ctx, rng, ids, &mut out);
        monster.pos = wrap_around(monster.pos, monster.size);
    }

    apply_output(state, out, &obstacles, now);
}

fn apply_output(state: &mut GameState, out: AiOutput, obstacles: &[Rect], now: f64) {
    for (target_id, amount) in out.heals {
        if let Some(patient) = state
            .monsters
            .iter_mut()
            .find(|m| m.id == target_id && !m.is_dying())
        {
            let healed = patient.heal(amount);
            let pos = patient.center();
            if healed > 0.0 {
                state.push_event(UiEventKind::HealPopup { pos, amount: healed }, now);
            }
        }
    }

    if out.dash_hit {
        let player = &mut state.player;
        player.health = (player.health / 2.0).max(0.0);
        player.pos = find_safe_teleport_location(player.size, obstacles, &mut state.rng);
        log::info!("Boss dash connected, player relocated with {:.0} hp", state.player.health);
    }

    for (speaker, line) in out.dialogue {
        state.push_event(UiEventKind::Dialogue { speaker, line }, now);
    }
    for (kind, pos, duration) in out.effects {
        state.add_effect(kind, pos, duration, now);
    }

    state.enemy_bullets.extend(out.enemy_bullets);
    state.homing_bullets.extend(out.homing_bullets);
    state.monsters.extend(out.monsters);
    state.barrels.extend(out.barrels);
}
