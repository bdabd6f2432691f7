//! Boss state machine
//!
//! Modes cycle `Hesitate -> {Barrage | Charging -> Dashing | Throwing} ->
//! Hesitate`. A separate phase counter (1..=3) tracks lost health; it only
//! rises, and each rise grants a short invincibility window.

use std::f32::consts::TAU;

use glam::Vec2;

use super::{AiContext, AiOutput, step, summoned_health};
use crate::consts::*;
use crate::sim::events::DialogueLine;
use crate::sim::geometry::{Body, toroidal_delta};
use crate::sim::rng::SimRng;
use crate::sim::state::{
    AiState, BossMode, BossState, EffectKind, EnemyBullet, ExplosiveBarrel, IdAllocator, Monster,
    MonsterKind,
};
use crate::direction_from_angle;

pub const HESITATE_MS: f64 = 2000.0;
pub const BARRAGE_MS: f64 = 3000.0;
pub const CHARGE_MS: f64 = 1500.0;
pub const DASH_MS: f64 = 1000.0;
pub const THROW_MS: f64 = 2500.0;
pub const THROW_INTERVAL_MS: f64 = 800.0;
pub const PHASE_INVINCIBILITY_MS: f64 = 2000.0;

const HESITATE_SPEED_SCALE: f32 = 0.5;
const DASH_SPEED_SCALE: f32 = 3.0;
const BARRAGE_ROTATION: f32 = 0.15;
const BARRAGE_BULLET_SPEED: f32 = 4.0;
/// Barrel flight: velocity = distance / this, capped at `THROW_MAX_SPEED`
const THROW_DIVISOR: f32 = 12.5;
const THROW_MAX_SPEED: f32 = 18.0;

/// Phase implied by the remaining health fraction
pub fn phase_for(health_ratio: f32) -> u8 {
    if health_ratio < 0.4 {
        3
    } else if health_ratio < 0.75 {
        2
    } else {
        1
    }
}

fn minion_interval_ms(phase: u8) -> f64 {
    8000.0 - phase as f64 * 1000.0
}

/// Raise the phase if health dropped past a threshold; returns true on a rise
fn update_phase(monster: &mut Monster, boss: &mut BossState, now: f64) -> bool {
    let ratio = monster.health / monster.max_health.max(1.0);
    let target = phase_for(ratio);
    if target <= boss.phase {
        return false;
    }
    boss.phase = target;
    boss.enter(BossMode::Hesitate, now);
    monster.invincible_until = now + PHASE_INVINCIBILITY_MS;
    log::info!("Boss {} entered phase {}", monster.id, target);
    true
}

fn spawn_minions(
    monster: &Monster,
    boss: &mut BossState,
    ctx: &AiContext<'_>,
    rng: &mut SimRng,
    ids: &mut IdAllocator,
    out: &mut AiOutput,
) {
    if ctx.now - boss.last_minion_spawn_at < minion_interval_ms(boss.phase) {
        return;
    }
    boss.last_minion_spawn_at = ctx.now;
    let center = monster.center();
    let health = summoned_health(MonsterKind::Minion, ctx);
    for _ in 0..(1 + boss.phase) {
        let offset = direction_from_angle(rng.angle()) * (monster.size.x * 0.75);
        let pos = center + offset - Vec2::splat(MonsterKind::Minion.stats().size / 2.0);
        out.monsters
            .push(Monster::new(ids.next_id(), MonsterKind::Minion, pos, health, ctx.now));
    }
    out.effects.push((EffectKind::Summon, center, 400.0));
}

fn hesitate(
    monster: &mut Monster,
    boss: &mut BossState,
    ctx: &AiContext<'_>,
    rng: &mut SimRng,
    out: &mut AiOutput,
) {
    let to_player = toroidal_delta(monster.center(), ctx.player.center);
    step(monster, to_player, HESITATE_SPEED_SCALE, ctx);
    if ctx.now - boss.mode_started_at < HESITATE_MS {
        return;
    }
    let roll = rng.unit();
    if roll < 0.4 {
        boss.enter(BossMode::Barrage, ctx.now);
    } else if roll < 0.7 && boss.phase >= 2 {
        boss.enter(BossMode::Charging, ctx.now);
        out.effects
            .push((EffectKind::BossTelegraph, monster.center(), CHARGE_MS));
    } else {
        boss.enter(BossMode::Throwing, ctx.now);
        out.dialogue.push((monster.id, DialogueLine::BossTaunt));
    }
}

fn barrage(
    monster: &Monster,
    boss: &mut BossState,
    ctx: &AiContext<'_>,
    ids: &mut IdAllocator,
    out: &mut AiOutput,
) {
    if ctx.now - boss.mode_started_at >= BARRAGE_MS {
        boss.enter(BossMode::Hesitate, ctx.now);
        return;
    }
    let count = if boss.phase < 3 { 2 } else { 3 };
    let center = monster.center();
    for i in 0..count {
        let angle = boss.barrage_angle + TAU * i as f32 / count as f32;
        out.enemy_bullets.push(EnemyBullet::new(
            ids.next_id(),
            center,
            direction_from_angle(angle) * BARRAGE_BULLET_SPEED,
            monster.damage * 0.5,
            ctx.now,
        ));
    }
    boss.barrage_angle = crate::normalize_angle(boss.barrage_angle + BARRAGE_ROTATION);
}

fn dash(monster: &mut Monster, boss: &mut BossState, ctx: &AiContext<'_>, out: &mut AiOutput) {
    step(monster, boss.dash_dir, DASH_SPEED_SCALE, ctx);
    if monster.rect().intersects(&ctx.player_rect) {
        out.dash_hit = true;
        boss.enter(BossMode::Hesitate, ctx.now);
    } else if ctx.now - boss.mode_started_at >= DASH_MS {
        boss.enter(BossMode::Hesitate, ctx.now);
    }
}

fn throw(
    monster: &Monster,
    boss: &mut BossState,
    ctx: &AiContext<'_>,
    ids: &mut IdAllocator,
    out: &mut AiOutput,
) {
    if ctx.now - boss.mode_started_at >= THROW_MS {
        boss.enter(BossMode::Hesitate, ctx.now);
        return;
    }
    if ctx.now - boss.last_throw_at < THROW_INTERVAL_MS {
        return;
    }
    let center = monster.center();
    let delta = toroidal_delta(center, ctx.player.center);
    let mut barrel = ExplosiveBarrel::new(ids.next_id(), center - Vec2::splat(BARREL_SIZE / 2.0));
    barrel.vel = (delta / THROW_DIVISOR).clamp_length_max(THROW_MAX_SPEED);
    barrel.armed_at = ctx.now + BARREL_ARM_DELAY_MS;
    out.barrels.push(barrel);
    boss.last_throw_at = ctx.now;
}

pub fn update(
    monster: &mut Monster,
    ctx: &AiContext<'_>,
    rng: &mut SimRng,
    ids: &mut IdAllocator,
    out: &mut AiOutput,
) {
    let mut boss = match monster.ai {
        AiState::Boss(boss) => boss,
        _ => BossState::new(ctx.now),
    };

    if update_phase(monster, &mut boss, ctx.now) {
        out.dialogue.push((monster.id, DialogueLine::BossEnraged));
    }
    spawn_minions(monster, &mut boss, ctx, rng, ids, out);

    match boss.mode {
        BossMode::Hesitate => hesitate(monster, &mut boss, ctx, rng, out),
        BossMode::Barrage => barrage(monster, &mut boss, ctx, ids, out),
        BossMode::Charging => {
            if ctx.now - boss.mode_started_at >= CHARGE_MS {
                boss.dash_dir = toroidal_delta(monster.center(), ctx.player.center).normalize_or_zero();
                boss.enter(BossMode::Dashing, ctx.now);
            }
        }
        BossMode::Dashing => dash(monster, &mut boss, ctx, out),
        BossMode::Throwing => throw(monster, &mut boss, ctx, ids, out),
    }

    monster.ai = AiState::Boss(boss);
}
