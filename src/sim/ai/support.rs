//! Support archetypes: healer and summoner

use super::{AiContext, AiOutput, summoned_health, step};
use crate::sim::geometry::{Body, toroidal_delta, toroidal_distance};
use crate::sim::state::{EffectKind, IdAllocator, Monster, MonsterKind};

pub const HEAL_RANGE: f32 = 160.0;
pub const HEAL_AMOUNT: f32 = 50.0;
pub const HEAL_COOLDOWN_MS: f64 = 3000.0;
/// Patients are monsters below this health fraction
pub const HEAL_THRESHOLD: f32 = 0.8;
pub const SUMMON_INTERVAL_MS: f64 = 5000.0;

fn flee_player(monster: &mut Monster, ctx: &AiContext<'_>) {
    let away = -toroidal_delta(monster.center(), ctx.player.center);
    step(monster, away, 1.0, ctx);
}

/// Approach the nearest wounded peer and heal it, else keep away from the player
pub fn heal(monster: &mut Monster, ctx: &AiContext<'_>, out: &mut AiOutput) {
    let center = monster.center();
    let patient = ctx
        .monsters
        .iter()
        .filter(|v| v.id != monster.id && !v.dying && v.health < v.max_health * HEAL_THRESHOLD)
        .min_by(|a, b| {
            toroidal_distance(center, a.center).total_cmp(&toroidal_distance(center, b.center))
        });

    let Some(patient) = patient else {
        flee_player(monster, ctx);
        return;
    };

    let to_patient = toroidal_delta(center, patient.center);
    if to_patient.length() > HEAL_RANGE {
        step(monster, to_patient, 1.0, ctx);
    } else if ctx.now - monster.last_special_at >= HEAL_COOLDOWN_MS {
        out.heals.push((patient.id, HEAL_AMOUNT));
        out.effects.push((EffectKind::Heal, patient.center, 500.0));
        monster.last_special_at = ctx.now;
    }
}

/// Keep away from the player and call minions on a timer
pub fn summon(
    monster: &mut Monster,
    ctx: &AiContext<'_>,
    ids: &mut IdAllocator,
    out: &mut AiOutput,
) {
    flee_player(monster, ctx);

    if ctx.now - monster.last_special_at < SUMMON_INTERVAL_MS {
        return;
    }
    let health = summoned_health(MonsterKind::Minion, ctx);
    let minion = Monster::new(ids.next_id(), MonsterKind::Minion, monster.pos, health, ctx.now);
    out.effects.push((EffectKind::Summon, monster.center(), 400.0));
    out.monsters.push(minion);
    monster.last_special_at = ctx.now;
}
